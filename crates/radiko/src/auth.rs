use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::{config::RadikoConfig, error::RadikoError};

const HEADER_APP: &str = "X-Radiko-App";
const HEADER_APP_VERSION: &str = "X-Radiko-App-Version";
const HEADER_DEVICE: &str = "X-Radiko-Device";
const HEADER_USER: &str = "X-Radiko-User";
const HEADER_AUTH_TOKEN: &str = "X-Radiko-AuthToken";
const HEADER_KEY_OFFSET: &str = "X-Radiko-KeyOffset";
const HEADER_KEY_LENGTH: &str = "X-Radiko-KeyLength";
const HEADER_PARTIAL_KEY: &str = "X-Radiko-PartialKey";

// Identity presented to both handshake steps. The html5 player identity is
// accepted for time-shift playback without a registered device.
const APP: &str = "pc_html5";
const APP_VERSION: &str = "0.0.1";
const DEVICE: &str = "pc";
const USER: &str = "dummy_user";

/// Challenge issued by auth1: the provisional token plus the slice of the
/// shared secret the server wants echoed back. Consumed immediately by auth2,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub auth_token: String,
    pub key_offset: usize,
    pub key_length: usize,
}

/// Validated stream authorization, good for one recording operation. Expiry
/// is server-side and not tracked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token: String,
}

/// Encodes the secret slice the server asked for. Bounds are checked before
/// slicing; the server is trusted to stay within the secret, but this guards
/// a keyed step and must never read out of range.
pub fn derive_partial_key(
    secret: &[u8],
    offset: usize,
    length: usize,
) -> Result<String, RadikoError> {
    let end = offset
        .checked_add(length)
        .filter(|&end| end <= secret.len())
        .ok_or(RadikoError::InvalidDerivationParameters {
            offset,
            length,
            secret_len: secret.len(),
        })?;
    Ok(BASE64.encode(&secret[offset..end]))
}

/// Two-step challenge/response handshake against the auth endpoints.
/// auth1 hands out a token and a key slice designation, auth2 validates the
/// derived partial key. Single attempt per step, no retries.
pub struct AuthClient {
    client: Client,
    config: RadikoConfig,
}

impl AuthClient {
    pub fn new(client: Client, config: RadikoConfig) -> Self {
        Self { client, config }
    }

    /// Runs both handshake steps and returns the validated session.
    pub async fn authenticate(&self) -> Result<AuthSession, RadikoError> {
        let challenge = self.challenge().await?;
        self.authorize(&challenge).await
    }

    /// Step 1: obtain the provisional token and the key slice designation
    /// from the auth1 response headers.
    pub async fn challenge(&self) -> Result<ChallengeResponse, RadikoError> {
        let url = format!("{}/v2/api/auth1", self.config.api_base);
        let response = self
            .client
            .get(&url)
            .header(HEADER_APP, APP)
            .header(HEADER_APP_VERSION, APP_VERSION)
            .header(HEADER_DEVICE, DEVICE)
            .header(HEADER_USER, USER)
            .send()
            .await?;

        let headers = response.headers();
        let auth_token = required_header(headers, HEADER_AUTH_TOKEN)?.to_string();
        // A malformed offset or length fails the handshake instead of being
        // coerced to 0; a wrong slice would only be rejected later by auth2.
        let key_offset = numeric_header(headers, HEADER_KEY_OFFSET)?;
        let key_length = numeric_header(headers, HEADER_KEY_LENGTH)?;

        debug!(key_offset, key_length, "received auth challenge");
        Ok(ChallengeResponse {
            auth_token,
            key_offset,
            key_length,
        })
    }

    /// Step 2: echo the derived partial key back through auth2. Only a 200
    /// validates the token; any other status is a rejection.
    pub async fn authorize(
        &self,
        challenge: &ChallengeResponse,
    ) -> Result<AuthSession, RadikoError> {
        let partial_key = derive_partial_key(
            &self.config.auth_key,
            challenge.key_offset,
            challenge.key_length,
        )?;

        let url = format!("{}/v2/api/auth2", self.config.api_base);
        let response = self
            .client
            .get(&url)
            .header(HEADER_DEVICE, DEVICE)
            .header(HEADER_USER, USER)
            .header(HEADER_AUTH_TOKEN, &challenge.auth_token)
            .header(HEADER_PARTIAL_KEY, partial_key)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RadikoError::AuthRejected(status.as_u16()));
        }

        debug!("auth token accepted");
        Ok(AuthSession {
            token: challenge.auth_token.clone(),
        })
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, RadikoError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| RadikoError::ChallengeError(format!("missing response header {name}")))
}

fn numeric_header(headers: &HeaderMap, name: &str) -> Result<usize, RadikoError> {
    let value = required_header(headers, name)?;
    value.trim().parse().map_err(|_| {
        RadikoError::ChallengeError(format!("non-numeric response header {name}: {value:?}"))
    })
}
