//! Request handlers for the daemon.
//!
//! RPC methods by category:
//! - Registration (`register`)
//! - Gesture input (`gesture` - request or notification)
//! - Quick-toggle surface (`toggle_interception`, `trigger_capture`)
//! - Deletion handshake (`delete_artifact`, `consent`)
//! - Daemon management (`status`, `shutdown`)

use duoshell_rpc::protocol::{
    ClientRole, Message, Notification, RegisterParams, RegisterResult, Request, RequestId,
    Response, RpcError,
};
use duoshell_types::{ConsentParams, DeleteParams, GestureParams, ShellUpdate};
use serde_json::{Value, json};
use std::sync::atomic::Ordering;
use tracing::{debug, info, warn};

use crate::error::{DaemonError, Result};
use crate::server::DaemonState;
use crate::session::{ClientInfo, ControlSession, Session, SessionId, UiSession};

pub struct HandlerContext<'a> {
    pub state: &'a mut DaemonState,
    pub client_id: &'a SessionId,
}

impl HandlerContext<'_> {
    pub fn current_session(&self) -> Option<&Session> {
        self.state.clients.get(self.client_id)
    }

    pub fn is_registered(&self) -> bool {
        self.current_session().is_some_and(Session::is_registered)
    }

    pub fn is_control_or_ui(&self) -> bool {
        self.current_session()
            .is_some_and(|s| s.is_control() || s.is_ui())
    }
}

pub async fn handle_request(
    ctx: &mut HandlerContext<'_>,
    request: &Request,
) -> std::result::Result<Response, RpcError> {
    let id = request.id.clone().unwrap_or(RequestId::Number(0));

    let result = match request.method.as_str() {
        "register" => handle_register(ctx, request.params.as_ref()),

        "gesture" => {
            require_registered(ctx)?;
            handle_gesture(ctx, request.params.as_ref())
        }
        "toggle_interception" => {
            require_control_or_ui(ctx)?;
            handle_toggle_interception(ctx)
        }
        "trigger_capture" => {
            require_control_or_ui(ctx)?;
            handle_trigger_capture(ctx)
        }
        "delete_artifact" => {
            require_control_or_ui(ctx)?;
            handle_delete_artifact(ctx, request.params.as_ref())
        }
        "consent" => {
            require_control_or_ui(ctx)?;
            handle_consent(ctx, request.params.as_ref())
        }
        "status" => {
            require_registered(ctx)?;
            handle_status(ctx)
        }
        "shutdown" => {
            require_control_or_ui(ctx)?;
            handle_shutdown(ctx)
        }
        method => Err(DaemonError::MethodNotFound(method.to_string())),
    };

    match result {
        Ok(value) => Ok(Response::success(id, value)),
        Err(e) => Ok(Response::error(id, e.into())),
    }
}

pub fn handle_notification(ctx: &mut HandlerContext<'_>, notification: &Notification) {
    match notification.method.as_str() {
        // The accessibility listener fires gestures without waiting for a
        // response.
        "gesture" => {
            if let Err(e) = handle_gesture(ctx, notification.params.as_ref()) {
                warn!("Gesture notification failed: {e}");
            }
        }
        method => {
            warn!("Unknown notification method: {method}");
        }
    }
}

fn require_registered(ctx: &HandlerContext<'_>) -> Result<()> {
    if ctx.is_registered() {
        Ok(())
    } else {
        Err(DaemonError::NotRegistered)
    }
}

fn require_control_or_ui(ctx: &HandlerContext<'_>) -> Result<()> {
    if ctx.is_control_or_ui() {
        Ok(())
    } else {
        Err(DaemonError::ControlRequired)
    }
}

fn handle_register(ctx: &mut HandlerContext<'_>, params: Option<&Value>) -> Result<Value> {
    let params = params.ok_or_else(|| DaemonError::InvalidParams("missing params".to_string()))?;
    let register: RegisterParams = serde_json::from_value(params.clone())
        .map_err(|e| DaemonError::InvalidParams(e.to_string()))?;

    let session = ctx
        .state
        .clients
        .get(ctx.client_id)
        .ok_or(DaemonError::NotRegistered)?;
    if session.is_registered() {
        return Err(DaemonError::AlreadyRegistered);
    }

    let mut info = ClientInfo::with_id(ctx.client_id.clone());
    info.register(register.role.clone());

    let session = match register.role {
        ClientRole::Ui { name } => {
            if ctx.state.active_ui.is_some() {
                return Err(DaemonError::UiOccupied);
            }
            ctx.state.active_ui = Some(ctx.client_id.clone());
            info!("UI client registered: {name} ({})", ctx.client_id);
            Session::Ui(UiSession::new(info, name))
        }
        ClientRole::Control => {
            debug!("Control client registered: {}", ctx.client_id);
            Session::Control(ControlSession::new(info))
        }
    };

    ctx.state.clients.insert(ctx.client_id.clone(), session);

    let result = RegisterResult {
        session_id: ctx.client_id.to_string(),
    };
    Ok(serde_json::to_value(result)?)
}

fn handle_gesture(ctx: &mut HandlerContext<'_>, params: Option<&Value>) -> Result<Value> {
    let params = params.ok_or_else(|| DaemonError::InvalidParams("missing params".to_string()))?;
    let gesture: GestureParams = serde_json::from_value(params.clone())
        .map_err(|e| DaemonError::InvalidParams(e.to_string()))?;

    let outcome = ctx.state.dispatcher.on_gesture(gesture.gesture);

    Ok(json!({
        "dispatched": outcome.is_some(),
        "outcome": outcome,
    }))
}

fn handle_toggle_interception(ctx: &mut HandlerContext<'_>) -> Result<Value> {
    let active = ctx.state.prefs.toggle_interception();

    // Mirror the runtime flag into the persisted preferences.
    if let Err(e) = ctx.state.prefs.save(&ctx.state.prefs_path) {
        warn!("Failed to persist interception flag: {e}");
    }

    let _ = ctx
        .state
        .updates
        .send(ShellUpdate::InterceptionChanged { active });

    info!("Interception {}", if active { "enabled" } else { "disabled" });
    Ok(json!({ "active": active }))
}

fn handle_trigger_capture(ctx: &mut HandlerContext<'_>) -> Result<Value> {
    // Single-flight: a second trigger while one runs is rejected, not
    // queued.
    if ctx
        .state
        .capture_in_flight
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(DaemonError::CaptureBusy);
    }

    let orchestrator = ctx.state.orchestrator.clone();
    let in_flight = ctx.state.capture_in_flight.clone();
    tokio::spawn(async move {
        let report = orchestrator.run().await;
        info!("Capture finished: {:?}", report.stage);
        in_flight.store(false, Ordering::SeqCst);
    });

    Ok(json!({ "started": true }))
}

fn handle_delete_artifact(ctx: &mut HandlerContext<'_>, params: Option<&Value>) -> Result<Value> {
    let params = params.ok_or_else(|| DaemonError::InvalidParams("missing params".to_string()))?;
    let delete: DeleteParams = serde_json::from_value(params.clone())
        .map_err(|e| DaemonError::InvalidParams(e.to_string()))?;

    let handshake = ctx.state.handshake.clone();
    let updates = ctx.state.updates.clone();
    tokio::spawn(async move {
        let report = handshake
            .request_delete(&delete.uri, delete.notification_id)
            .await;
        info!("Deletion finished: {:?}", report.phase);
        let _ = updates.send(ShellUpdate::DeletionFinished { report });
    });

    Ok(json!({ "started": true }))
}

fn handle_consent(ctx: &mut HandlerContext<'_>, params: Option<&Value>) -> Result<Value> {
    let params = params.ok_or_else(|| DaemonError::InvalidParams("missing params".to_string()))?;
    let consent: ConsentParams = serde_json::from_value(params.clone())
        .map_err(|e| DaemonError::InvalidParams(e.to_string()))?;

    if !ctx.state.broker.resolve(consent.granted) {
        return Err(DaemonError::NoPendingConsent);
    }

    Ok(json!({ "resolved": true }))
}

fn handle_status(ctx: &mut HandlerContext<'_>) -> Result<Value> {
    let prefs = ctx.state.prefs.snapshot();
    Ok(json!({
        "interceptionActive": prefs.interception_active,
        "captureInFlight": ctx.state.capture_in_flight.load(Ordering::SeqCst),
        "awaitingConsent": ctx.state.broker.has_pending(),
        "slots": {
            "top": prefs.slot_assignment(duoshell_types::Slot::Top),
            "bottom": prefs.slot_assignment(duoshell_types::Slot::Bottom),
        },
        "mainScreen": prefs.main_screen,
        "clients": ctx.state.clients.len(),
        "activeUi": ctx.state.active_ui.as_ref().map(ToString::to_string),
    }))
}

fn handle_shutdown(ctx: &mut HandlerContext<'_>) -> Result<Value> {
    info!("Shutdown requested by {}", ctx.client_id);
    ctx.state.shutdown = true;
    Ok(json!({ "ok": true }))
}

/// Route an incoming message to its handler and produce the reply, if any.
pub async fn process_message(
    client_id: &SessionId,
    message: Message,
    state: &mut DaemonState,
) -> Option<Message> {
    let mut ctx = HandlerContext { state, client_id };

    match message {
        Message::Request(request) if request.id.is_some() => {
            match handle_request(&mut ctx, &request).await {
                Ok(response) => Some(Message::Response(response)),
                Err(e) => Some(Message::Response(Response::error(
                    request.id.unwrap_or(RequestId::Number(0)),
                    e,
                ))),
            }
        }
        Message::Request(request) => {
            // A request without an id is a notification.
            let notification = Notification::new(request.method, request.params);
            handle_notification(&mut ctx, &notification);
            None
        }
        Message::Notification(notification) => {
            handle_notification(&mut ctx, &notification);
            None
        }
        Message::Response(response) => {
            debug!("Ignoring unexpected response: {:?}", response.id);
            None
        }
    }
}
