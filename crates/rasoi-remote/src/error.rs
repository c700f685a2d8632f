use thiserror::Error;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, RemoteError>;
