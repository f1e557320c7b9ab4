//! duoshell control CLI
//!
//! Thin control surface over the daemon socket: trigger gestures and
//! captures, flip interception, answer consent prompts, query status.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use duoshell_rpc::{
    client::{RpcClient, socket_path},
    protocol::ClientRole,
};
use duoshell_types::Gesture;
use serde_json::json;
use std::path::PathBuf;
use std::process::Command;

/// Find a binary, preferring the dev build in target/debug if it exists
fn find_binary(name: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let dev_binary = dir.join(name);
        if dev_binary.exists() {
            return dev_binary;
        }
    }
    PathBuf::from(name)
}

/// Run a binary in the foreground, bailing on failure
fn run_foreground(name: &str) -> Result<()> {
    let binary = find_binary(name);
    let status = Command::new(&binary)
        .status()
        .with_context(|| format!("Failed to start {}. Is it installed?", binary.display()))?;
    if !status.success() {
        bail!("{name} exited with status: {status}");
    }
    Ok(())
}

/// duoshell control CLI
#[derive(Parser)]
#[command(name = "duoshell")]
#[command(about = "duoshell - dual-display launcher shell control")]
#[command(version)]
#[command(after_help = "\
Examples:
  duoshell daemon                Run daemon in foreground (for init/systemd)
  duoshell gesture single        Dispatch a single home press
  duoshell capture               Capture both panels into one composite
  duoshell toggle                Toggle gesture interception
  duoshell delete <uri> <id>     Delete a captured artifact
  duoshell consent --deny        Answer a pending deletion consent prompt
  duoshell status                Check daemon status
  duoshell shutdown              Stop the daemon

Gesture listener wiring:
  The accessibility listener fires `duoshell gesture <kind>` (or the
  equivalent RPC notification) on each recognized home-key press.
")]
struct Cli {
    /// Custom daemon socket path
    #[arg(long, value_name = "PATH", global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon in foreground (for init/systemd or manual use)
    Daemon,

    /// Dispatch a home gesture
    Gesture {
        /// One of: single, double, triple, long
        gesture: Gesture,
    },

    /// Capture both displays into one composite screenshot
    Capture,

    /// Toggle gesture interception on/off
    Toggle,

    /// Delete a captured artifact (may require user consent)
    Delete {
        /// Artifact URI, e.g. file:///.../DualShot_20250101_120000.png
        uri: String,
        /// Notification id the artifact was published under
        notification_id: u64,
    },

    /// Answer the pending deletion consent prompt
    Consent {
        /// Deny instead of granting
        #[arg(long)]
        deny: bool,
    },

    /// Show daemon status
    Status,

    /// Shutdown the daemon
    Shutdown,
}

async fn connect(socket: Option<PathBuf>) -> Result<RpcClient> {
    let path = socket.unwrap_or_else(socket_path);
    let mut client = RpcClient::connect_to(path)
        .await
        .context("Failed to connect to duoshell daemon. Is it running?")?;
    client.register(ClientRole::Control).await?;
    Ok(client)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon => run_foreground("duoshell-daemon"),

        Commands::Gesture { gesture } => {
            let client = connect(cli.socket).await?;
            let result: serde_json::Value = client
                .request("gesture", Some(json!({ "gesture": gesture })))
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Capture => {
            let client = connect(cli.socket).await?;
            let result: serde_json::Value = client.request("trigger_capture", None).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Toggle => {
            let client = connect(cli.socket).await?;
            let result: serde_json::Value = client.request("toggle_interception", None).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Delete {
            uri,
            notification_id,
        } => {
            let client = connect(cli.socket).await?;
            let result: serde_json::Value = client
                .request(
                    "delete_artifact",
                    Some(json!({ "uri": uri, "notificationId": notification_id })),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Consent { deny } => {
            let client = connect(cli.socket).await?;
            let result: serde_json::Value = client
                .request("consent", Some(json!({ "granted": !deny })))
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Status => {
            let client = connect(cli.socket).await?;
            let result: serde_json::Value = client.request("status", None).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Shutdown => {
            let client = connect(cli.socket).await?;
            let result: serde_json::Value = client.request("shutdown", None).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
    }
}
