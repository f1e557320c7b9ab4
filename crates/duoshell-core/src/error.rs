use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Preferences error: {0}")]
    Prefs(String),

    #[error("Shell error: {0}")]
    Shell(String),

    #[error("Shell command timed out after {0} seconds")]
    ShellTimeout(u64),

    #[error("Display unavailable: {0}")]
    DisplayUnavailable(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Persistence error: {0}")]
    Persist(String),
}

pub type Result<T> = std::result::Result<T, Error>;
