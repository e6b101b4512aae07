//! Conversational data-access layer for a meeting/task tracker.
//!
//! A chat model picks a tool from [`tools::tool_definitions`] and sends a
//! name plus a JSON argument object; [`tools::ToolExecutor`] routes it,
//! resolves the human-supplied identifiers in its arguments (fuzzy member
//! names, ID-or-title references), runs the operation against a
//! [`store::Store`], and returns a JSON envelope the model can relay.
//! Failures never propagate: every miss, conflict, and fault renders as
//! an `{"error": ...}` payload.
//!
//! Member-name resolution runs against a cached in-memory index that is
//! built lazily and only refreshed on explicit
//! [`resolver::MemberResolver::invalidate`]; member rows added out of
//! band are invisible until then.

pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod store;
pub mod tools;

pub use config::ResolverConfig;
pub use error::{StoreError, ToolError};
pub use store::{MemStore, PgStore, Store};
pub use tools::{tool_definitions, ToolExecutor};
