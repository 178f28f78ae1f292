/// Result alias used across the crate.
pub type FolioResult<T> = Result<T, FolioError>;

/// Crate error type.
///
/// Only configuration, serialization and host-element writes surface these to callers.
/// Animation and transport failures are recovered where they happen and show up as
/// events or state transitions instead.
#[derive(thiserror::Error, Debug)]
pub enum FolioError {
    /// Invalid configuration or input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Typed animation engine failure.
    #[error("animation error: {0}")]
    Animation(String),

    /// A host element rejected a read or write.
    #[error("element error: {0}")]
    Element(String),

    /// Contact transport failure (network, non-2xx, undecodable body).
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON encoding or decoding failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source chain intact.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FolioError {
    /// Build a [`FolioError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FolioError::Animation`].
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`FolioError::Element`].
    pub fn element(msg: impl Into<String>) -> Self {
        Self::Element(msg.into())
    }

    /// Build a [`FolioError::Transport`].
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Build a [`FolioError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
