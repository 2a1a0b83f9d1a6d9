use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("malformed frame input: {0}")]
    MalformedInput(String),

    #[error("a track id is required to follow a single track")]
    MissingTrackId,

    #[error("detector error: {0}")]
    Detector(String),

    #[error("embedder error: {0}")]
    Embedder(String),
}

impl Error {
    pub(crate) fn config<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedInput(msg.into())
    }
}
