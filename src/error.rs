//! Error taxonomy for tool execution
//!
//! Every failure a tool can hit maps onto one of the `ToolError` variants,
//! and every variant renders to the `{error: ...}` envelope the chat layer
//! expects. Nothing here is allowed to cross the router boundary as an
//! unstructured failure.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// A disambiguation candidate surfaced alongside an `Ambiguous` error.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
}

/// Fixed message for callers whose chat identity has no member record.
pub const IDENTITY_UNLINKED: &str =
    "Could not find your member record. Your chat account may not be linked yet.";

/// Errors surfaced by tool operations.
#[derive(Error, Debug)]
pub enum ToolError {
    /// An identifier or name resolved to zero rows.
    #[error("Could not find a {entity} matching '{input}'")]
    NotFound { entity: &'static str, input: String },

    /// An identifier or name resolved to two or more rows. Not fatal: the
    /// caller is expected to retry with one of the listed candidates.
    #[error("{message}")]
    Ambiguous {
        message: String,
        matches: Vec<Candidate>,
    },

    /// Malformed input, rejected before any storage access.
    #[error("{0}")]
    Validation(String),

    /// Duplicate creation, duplicate link, or removal of a missing link.
    #[error("{0}")]
    Conflict(String),

    /// The caller's chat identity does not resolve to a linked member.
    #[error("{IDENTITY_UNLINKED}")]
    IdentityUnlinked,

    /// Tool name outside the recognized catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Anything unexpected (storage unavailable, programming error). The
    /// only variant logged as a server-side fault.
    #[error("Tool execution failed: {0}")]
    Store(#[from] StoreError),
}

impl ToolError {
    /// Render this error as the uniform response envelope.
    pub fn into_envelope(self) -> Value {
        match self {
            ToolError::Ambiguous {
                ref message,
                ref matches,
            } => json!({ "error": message, "matches": matches }),
            other => json!({ "error": other.to_string() }),
        }
    }

    /// True for the variants that indicate a server-side fault rather than
    /// a conversational miss.
    pub fn is_server_fault(&self) -> bool {
        matches!(self, ToolError::Store(_))
    }
}

/// Errors from the storage seam.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}
