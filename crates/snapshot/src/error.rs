use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapshotError>;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("missing credentials: {0}")]
    Credentials(String),
    #[error("remote storage error: {0}")]
    Remote(String),
    #[error("encryption error: {0}")]
    Cipher(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SnapshotError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}
