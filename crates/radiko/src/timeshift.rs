use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Header carrying the validated token, passed through to the media tool.
pub const AUTH_TOKEN_HEADER: &str = "X-Radiko-Authtoken";

// Chunk-list length requested from the time-shift playlist endpoint.
const PLAYLIST_LENGTH: u32 = 15;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Builds the time-shift playlist URL for a station and time window. The
/// minute-precision stamps are suffixed with seconds "00" as the endpoint
/// expects full timestamps.
pub fn playlist_url(api_base: &str, station_id: &str, fromtime: &str, totime: &str) -> String {
    format!(
        "{api_base}/v2/api/ts/playlist.m3u8?station_id={station_id}&ft={fromtime}00&to={totime}00&l={PLAYLIST_LENGTH}"
    )
}

/// Capability seam for the external capture step, so the auth pipeline can
/// be exercised without spawning a real process.
#[async_trait]
pub trait MediaCapturer: Send + Sync {
    async fn capture(
        &self,
        playlist_url: &str,
        auth_token: &str,
        output: &Path,
    ) -> Result<(), CaptureError>;
}

/// Captures the playlist with an external ffmpeg process. A single blocking
/// invocation; ffmpeg's exit status is the only success signal and the
/// produced file is never inspected.
pub struct FfmpegCapturer {
    program: PathBuf,
}

impl FfmpegCapturer {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegCapturer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl MediaCapturer for FfmpegCapturer {
    async fn capture(
        &self,
        playlist_url: &str,
        auth_token: &str,
        output: &Path,
    ) -> Result<(), CaptureError> {
        let program = self.program.display().to_string();
        info!(playlist_url, output = %output.display(), "starting capture");

        // Argument vector, not a shell string: the token and output path
        // reach the process verbatim.
        let result = Command::new(&self.program)
            .arg("-loglevel")
            .arg("quiet")
            .arg("-headers")
            .arg(format!("{AUTH_TOKEN_HEADER}: {auth_token}\r\n"))
            .arg("-i")
            .arg(playlist_url)
            .arg("-vn")
            .arg("-c")
            .arg("copy")
            .arg("-bsf:a")
            .arg("aac_adtstoasc")
            .arg(output)
            .output()
            .await
            .map_err(|source| CaptureError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(CaptureError::ExitStatus {
                program,
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        debug!(output = %output.display(), "capture process finished");
        Ok(())
    }
}
