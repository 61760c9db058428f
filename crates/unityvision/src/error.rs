//! Error types for UnityVision.
//!
//! Registry code logs and degrades rather than propagating (discovery is
//! best-effort); dispatch code converts everything into error envelopes.
//! These variants cover the places where a typed error does cross an API
//! boundary.

/// Bridge error types covering catalog misuse, persistence, and tool faults.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A fault raised by a tool handler. Carries the bare message so the
    /// dispatcher can forward it verbatim in an `execution_error` envelope.
    #[error("{0}")]
    Execution(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, VisionError>;
