/// Result alias used throughout the crate.
pub type MaskplayResult<T> = Result<T, MaskplayError>;

/// Error type for configuration, asset and evaluation failures.
///
/// Per-asset load failures never surface through this type; the asset cache absorbs them and
/// records the asset as absent.
#[derive(thiserror::Error, Debug)]
pub enum MaskplayError {
    /// Invalid configuration or input value.
    #[error("validation error: {0}")]
    Validation(String),

    /// Asset read or decode failure.
    #[error("asset error: {0}")]
    Asset(String),

    /// Failure while composing or sampling pixels.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error, source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MaskplayError {
    /// Build a [`MaskplayError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MaskplayError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`MaskplayError::Evaluation`].
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`MaskplayError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for MaskplayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}
