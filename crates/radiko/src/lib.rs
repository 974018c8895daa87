pub mod auth;
pub mod config;
mod default;
pub mod error;
pub mod session;
pub mod timeshift;

pub use auth::{AuthClient, AuthSession, ChallengeResponse};
pub use config::RadikoConfig;
pub use default::default_client;
pub use error::RadikoError;
pub use session::{PremiumSession, SessionManager};
pub use timeshift::{CaptureError, FfmpegCapturer, MediaCapturer, playlist_url};
