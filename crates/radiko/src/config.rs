/// Shared secret distributed with Radiko's html5 player. auth1 designates a
/// slice of it and auth2 expects that slice back, base64-encoded, as proof of
/// possession without ever transmitting the whole key.
pub const AUTH_KEY: &[u8] = b"bcd151073c03b352e1ef2fd66c32209da9ca0afa";

const API_BASE: &str = "https://radiko.jp";

/// Endpoint base and auth secret used by every API call. [`Default`] carries
/// the production values; tests substitute a local server and a known secret.
#[derive(Debug, Clone)]
pub struct RadikoConfig {
    pub api_base: String,
    pub auth_key: Vec<u8>,
}

impl Default for RadikoConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            auth_key: AUTH_KEY.to_vec(),
        }
    }
}

impl RadikoConfig {
    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_auth_key<K: Into<Vec<u8>>>(mut self, auth_key: K) -> Self {
        self.auth_key = auth_key.into();
        self
    }
}
