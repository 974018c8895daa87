use radiko_client::{CaptureError, RadikoError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("radiko api error: {0}")]
    Radiko(#[from] RadikoError),

    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("cannot login to Radiko premium")]
    LoginRejected,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
