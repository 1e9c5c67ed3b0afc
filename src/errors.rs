use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtendedError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to encode payload: {0}")]
    EncodingError(String),

    #[error("Failed to compress payload: {0}")]
    CompressionError(String),

    #[error("Failed to decode message: {0}")]
    DecodeError(String),

    #[error("Failed to interact with the queue transport: {0}")]
    TransportError(String),

    #[error("Failed to interact with the overflow store: {0}")]
    StoreError(String),

    #[error("Gave up waiting: {0}")]
    TimeoutError(String),
}

impl ExtendedError {
    /// True for failures raised by the queue transport or the overflow store.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ExtendedError::TransportError(_) | ExtendedError::StoreError(_)
        )
    }
}

impl From<base64::DecodeError> for ExtendedError {
    fn from(error: base64::DecodeError) -> Self {
        ExtendedError::DecodeError(format!("invalid base64 body: {error}"))
    }
}
