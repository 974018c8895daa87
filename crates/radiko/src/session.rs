use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{config::RadikoConfig, error::RadikoError};

/// Entitlement session unlocking area-restricted time-shift content.
/// Separate from the per-request auth token, and the one remote resource
/// this process owns: once created it must be released with
/// [`SessionManager::finalize`] before the run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremiumSession {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    radiko_session: Option<String>,
    // Left untyped so a string "1" stays distinguishable from the number 1.
    #[serde(default)]
    areafree: Option<serde_json::Value>,
}

/// Premium login lifecycle: acquire with [`login`](Self::login), release
/// with [`finalize`](Self::finalize).
pub struct SessionManager {
    client: Client,
    config: RadikoConfig,
}

impl SessionManager {
    pub fn new(client: Client, config: RadikoConfig) -> Self {
        Self { client, config }
    }

    /// Exchanges credentials for a premium session. `Ok(None)` means the
    /// server rejected the login or the account lacks the area-free
    /// entitlement; only transport failures are errors. The caller decides
    /// whether a rejection aborts the run.
    pub async fn login(
        &self,
        mail: &str,
        password: &str,
    ) -> Result<Option<PremiumSession>, RadikoError> {
        let url = format!("{}/v4/api/member/login", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .form(&[("mail", mail), ("pass", password)])
            .send()
            .await?;
        let body: LoginResponse = response.json().await?;

        let session_id = match body.radiko_session {
            Some(id) if !id.is_empty() => id,
            _ => {
                debug!("login response carried no session id");
                return Ok(None);
            }
        };
        // Area-free entitlement is mandatory, not just authentication. The
        // flag must be exactly the number 1.
        if body.areafree.as_ref().and_then(|v| v.as_i64()) != Some(1) {
            debug!(areafree = ?body.areafree, "account lacks area-free entitlement");
            return Ok(None);
        }

        debug!("premium login accepted");
        Ok(Some(PremiumSession { session_id }))
    }

    /// Terminates the session server-side. The response body is ignored.
    pub async fn logout(&self, session: &PremiumSession) -> Result<(), RadikoError> {
        let url = format!("{}/v4/api/member/logout", self.config.api_base);
        self.client
            .post(&url)
            .form(&[("radiko_session", session.session_id.as_str())])
            .send()
            .await?;
        Ok(())
    }

    /// Releases the premium session if one exists. Logout failures are
    /// logged and swallowed so the run's own result is what propagates;
    /// the attempt itself is still mandatory on every exit path.
    pub async fn finalize(&self, session: Option<PremiumSession>) {
        let Some(session) = session else {
            return;
        };
        if let Err(e) = self.logout(&session).await {
            warn!(error = %e, "failed to log out premium session");
        }
    }
}
