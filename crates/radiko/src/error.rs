use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadikoError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("auth challenge error: {0}")]
    ChallengeError(String),
    #[error("authorization rejected with status {0}")]
    AuthRejected(u16),
    #[error(
        "invalid key derivation parameters: offset={offset} length={length} secret_len={secret_len}"
    )]
    InvalidDerivationParameters {
        offset: usize,
        length: usize,
        secret_len: usize,
    },
}
