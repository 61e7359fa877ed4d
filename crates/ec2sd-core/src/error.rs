// ── Discovery error types ──
//
// `InventoryError` is whatever the query seam reports; the engine never
// inspects it beyond wrapping. `DiscoveryError` is what the reporter sees.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single `DescribeInstances` page request.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The API rejected or failed the request (auth, throttling, bad filter, ...).
    #[error("request failed: {message}")]
    Request { message: String },

    /// A pagination token the inventory did not hand out.
    #[error("invalid pagination token: {token}")]
    InvalidToken { token: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON deserialization failed.
    #[error("malformed describe-instances output in {}: {source}", path.display())]
    Deserialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl InventoryError {
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }
}

/// A refresh that produced no snapshot.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("could not describe instances: {0}")]
    Describe(#[source] InventoryError),
}
