use std::path::{Path, PathBuf};

use radiko_client::{AuthClient, MediaCapturer, PremiumSession, RadikoConfig, SessionManager};
use reqwest::Client;
use tracing::info;

use crate::cli::Args;
use crate::error::{AppError, Result};
use crate::utils::program_url::parse_program_url;
use crate::utils::time::{INVALID_TIME, to_datetime, to_unixtime};

const OUTPUT_EXTENSION: &str = "m4a";

/// Fully resolved user intent. Derived and validated before any network
/// call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRequest {
    pub station_id: String,
    pub fromtime: String,
    pub totime: String,
    pub output: PathBuf,
}

/// Merges explicit flags with fields pattern-matched out of a program-page
/// URL (explicit flags win), computes the end time from the duration when no
/// end time is given, and settles the output file name.
pub fn resolve_request(args: &Args) -> Result<RecordingRequest> {
    let program = args.url.as_deref().and_then(parse_program_url);

    let station_id = args
        .station_id
        .clone()
        .or_else(|| program.as_ref().map(|p| p.station_id.clone()))
        .ok_or_else(|| {
            AppError::InvalidInput("station id is required (use --station-id or --url)".to_string())
        })?;

    let fromtime = args
        .fromtime
        .clone()
        .or_else(|| program.as_ref().map(|p| p.fromtime.clone()))
        .ok_or_else(|| {
            AppError::InvalidInput(
                "start datetime is required (use --fromtime or --url)".to_string(),
            )
        })?;

    let utime_from = to_unixtime(&fromtime);
    if utime_from == INVALID_TIME {
        return Err(AppError::InvalidInput(format!(
            "malformed start datetime: {fromtime}"
        )));
    }

    let totime = match (&args.totime, args.duration) {
        (Some(totime), _) => {
            if to_unixtime(totime) == INVALID_TIME {
                return Err(AppError::InvalidInput(format!(
                    "malformed end datetime: {totime}"
                )));
            }
            totime.clone()
        }
        (None, Some(minutes)) => {
            let totime = to_datetime(utime_from + minutes * 60);
            if totime.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "end datetime out of range for duration {minutes}"
                )));
            }
            totime
        }
        (None, None) => {
            return Err(AppError::InvalidInput(
                "either --totime or --duration is required".to_string(),
            ));
        }
    };

    let output = match &args.output {
        Some(name) => normalize_output(name),
        None => PathBuf::from(format!("{station_id}_{fromtime}_{totime}.{OUTPUT_EXTENSION}")),
    };

    Ok(RecordingRequest {
        station_id,
        fromtime,
        totime,
        output,
    })
}

fn normalize_output(name: &Path) -> PathBuf {
    if name.extension().is_some_and(|ext| ext == OUTPUT_EXTENSION) {
        return name.to_path_buf();
    }
    let mut name = name.as_os_str().to_os_string();
    name.push(".");
    name.push(OUTPUT_EXTENSION);
    PathBuf::from(name)
}

/// Runs one recording: resolve the request, optionally acquire a premium
/// session, authenticate, capture. The premium session must be released on
/// every path once a login was attempted, so the pipeline result is held and
/// [`SessionManager::finalize`] runs from this single call site before the
/// result propagates.
pub async fn run(args: Args, config: RadikoConfig, capturer: &dyn MediaCapturer) -> Result<()> {
    let request = resolve_request(&args)?;
    info!(
        station = %request.station_id,
        from = %request.fromtime,
        to = %request.totime,
        "resolved recording request"
    );

    let client = radiko_client::default_client();
    let sessions = SessionManager::new(client.clone(), config.clone());

    let mut premium = None;
    let result = login_and_record(&args, &client, &config, &sessions, &request, capturer, &mut premium).await;
    sessions.finalize(premium).await;
    result
}

/// The fallible part of the run. Writes the premium session through an out
/// parameter so it reaches the caller's finalize even when an error is on
/// its way up.
async fn login_and_record(
    args: &Args,
    client: &Client,
    config: &RadikoConfig,
    sessions: &SessionManager,
    request: &RecordingRequest,
    capturer: &dyn MediaCapturer,
    premium: &mut Option<PremiumSession>,
) -> Result<()> {
    if let (Some(mail), Some(password)) = (&args.mail, &args.password) {
        *premium = sessions.login(mail, password).await?;
        if premium.is_none() {
            return Err(AppError::LoginRejected);
        }
        info!("premium login succeeded");
    }

    let auth = AuthClient::new(client.clone(), config.clone());
    let session = auth.authenticate().await?;
    info!("stream authorization acquired");

    let playlist = radiko_client::playlist_url(
        &config.api_base,
        &request.station_id,
        &request.fromtime,
        &request.totime,
    );
    capturer
        .capture(&playlist, &session.token, &request.output)
        .await?;
    info!(output = %request.output.display(), "recording finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clap::Parser;
    use radiko_client::CaptureError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn parse_args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("radikorec").chain(argv.iter().copied()))
    }

    #[test]
    fn totime_computed_from_duration() {
        let args = parse_args(&["-s", "TBS", "-f", "202401010900", "-d", "30"]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(request.totime, "202401010930");
    }

    #[test]
    fn explicit_totime_wins_over_duration() {
        let args = parse_args(&["-s", "TBS", "-f", "202401010900", "-t", "202401011000", "-d", "30"]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(request.totime, "202401011000");
    }

    #[test]
    fn duration_across_midnight() {
        let args = parse_args(&["-s", "TBS", "-f", "202401012350", "-d", "20"]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(request.totime, "202401020010");
    }

    #[test]
    fn station_and_fromtime_fall_back_to_program_url() {
        let args = parse_args(&[
            "-u",
            "https://radiko.jp/share/TBS/2024010109/202401010900",
            "-d",
            "30",
        ]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(request.station_id, "TBS");
        assert_eq!(request.fromtime, "202401010900");
    }

    #[test]
    fn explicit_station_wins_over_program_url() {
        let args = parse_args(&[
            "-s",
            "QRR",
            "-u",
            "https://radiko.jp/share/TBS/2024010109/202401010900",
            "-d",
            "30",
        ]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(request.station_id, "QRR");
    }

    #[test]
    fn default_output_name_carries_window() {
        let args = parse_args(&["-s", "TBS", "-f", "202401010900", "-d", "30"]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(
            request.output,
            PathBuf::from("TBS_202401010900_202401010930.m4a")
        );
    }

    #[test]
    fn user_output_name_gains_extension() {
        let args = parse_args(&["-s", "TBS", "-f", "202401010900", "-d", "30", "-o", "show"]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(request.output, PathBuf::from("show.m4a"));

        let args = parse_args(&["-s", "TBS", "-f", "202401010900", "-d", "30", "-o", "show.m4a"]);
        let request = resolve_request(&args).unwrap();
        assert_eq!(request.output, PathBuf::from("show.m4a"));
    }

    #[test]
    fn missing_fields_are_rejected() {
        let args = parse_args(&["-f", "202401010900", "-d", "30"]);
        assert!(matches!(
            resolve_request(&args),
            Err(AppError::InvalidInput(_))
        ));

        let args = parse_args(&["-s", "TBS", "-d", "30"]);
        assert!(matches!(
            resolve_request(&args),
            Err(AppError::InvalidInput(_))
        ));

        let args = parse_args(&["-s", "TBS", "-f", "202401010900"]);
        assert!(matches!(
            resolve_request(&args),
            Err(AppError::InvalidInput(_))
        ));

        let args = parse_args(&["-s", "TBS", "-f", "notadate", "-d", "30"]);
        assert!(matches!(
            resolve_request(&args),
            Err(AppError::InvalidInput(_))
        ));
    }

    struct FakeCapturer {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FakeCapturer {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl MediaCapturer for FakeCapturer {
        async fn capture(
            &self,
            _playlist_url: &str,
            _auth_token: &str,
            _output: &Path,
        ) -> std::result::Result<(), CaptureError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(CaptureError::Spawn {
                    program: "fake".to_string(),
                    source: std::io::Error::other("boom"),
                })
            } else {
                Ok(())
            }
        }
    }

    async fn mount_handshake(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v2/api/auth1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Radiko-AuthToken", "token")
                    .insert_header("X-Radiko-KeyOffset", "0")
                    .insert_header("X-Radiko-KeyLength", "8"),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/api/auth2"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    async fn mount_login(server: &MockServer, areafree: i64) {
        Mock::given(method("POST"))
            .and(path("/v4/api/member/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "radiko_session": "session-abc",
                "areafree": areafree,
            })))
            .mount(server)
            .await;
    }

    async fn mount_logout(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/v4/api/member/logout"))
            .respond_with(ResponseTemplate::new(200))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    fn premium_args() -> Args {
        parse_args(&[
            "-s",
            "TBS",
            "-f",
            "202401010900",
            "-d",
            "30",
            "-m",
            "user@example.com",
            "-p",
            "hunter2",
        ])
    }

    #[tokio::test]
    async fn premium_run_logs_out_after_capture() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        mount_login(&server, 1).await;
        mount_logout(&server, 1).await;

        let config = RadikoConfig::default().with_api_base(server.uri());
        let capturer = FakeCapturer::new(false);
        run(premium_args(), config, &capturer).await.unwrap();
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn premium_run_logs_out_even_when_capture_fails() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        mount_login(&server, 1).await;
        mount_logout(&server, 1).await;

        let config = RadikoConfig::default().with_api_base(server.uri());
        let capturer = FakeCapturer::new(true);
        let err = run(premium_args(), config, &capturer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Capture(_)));
    }

    #[tokio::test]
    async fn rejected_login_skips_handshake_and_logout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/api/auth1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_login(&server, 0).await;
        mount_logout(&server, 0).await;

        let config = RadikoConfig::default().with_api_base(server.uri());
        let capturer = FakeCapturer::new(false);
        let err = run(premium_args(), config, &capturer)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::LoginRejected));
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn anonymous_run_never_touches_member_endpoints() {
        let server = MockServer::start().await;
        mount_handshake(&server).await;
        Mock::given(method("POST"))
            .and(path("/v4/api/member/login"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_logout(&server, 0).await;

        let config = RadikoConfig::default().with_api_base(server.uri());
        let capturer = FakeCapturer::new(false);
        let args = parse_args(&["-s", "TBS", "-f", "202401010900", "-d", "30"]);
        run(args, config, &capturer).await.unwrap();
        assert_eq!(capturer.calls.load(Ordering::SeqCst), 1);
    }
}
