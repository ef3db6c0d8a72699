use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("unknown counting direction `{0}`, expected one of up/down/left/right")]
    UnknownDirection(String),

    #[error("invalid track id `{0}`, expected `obj_<n>`")]
    InvalidTrackId(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
