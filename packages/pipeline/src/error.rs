//! Typed errors for the pipeline library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur while driving a results page.
#[derive(Debug, Error)]
pub enum DriverError {
    /// A selector matched nothing on the page or element.
    #[error("selector matched nothing: {selector}")]
    NotFound { selector: String },

    /// Interacting with the page failed (click, scroll, wait).
    #[error("page interaction failed: {0}")]
    Interaction(String),

    /// The underlying transport failed.
    #[error("driver transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The fetched document could not be parsed.
    #[error("document parse error: {0}")]
    Parse(String),
}

/// Errors from the model capability.
#[derive(Debug, Error)]
pub enum ModelError {
    /// HTTP request failed (connect, timeout, TLS).
    #[error("model request error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The provider returned an error payload.
    #[error("model API error: {0}")]
    Api(String),

    /// The response carried no completion content.
    #[error("empty model response")]
    EmptyResponse,
}

/// Errors from the persistence layer.
///
/// `Unavailable` and `Query` are deliberately distinct so callers can tell
/// "store down" apart from "no data" instead of conflating both into an
/// empty result set.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A connection could not be established.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A statement failed after the connection was established.
    #[error("store query failed: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A row could not be decoded into its domain type.
    #[error("row decode failed: {0}")]
    Decode(String),
}

/// Configuration errors surfaced at startup, before any pipeline runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing required configuration: {key}")]
    Missing { key: String },

    /// A variable is present but unusable.
    #[error("invalid configuration for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Top-level error for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Result type alias for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
