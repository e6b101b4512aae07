//! Tunable heuristics for entity resolution.
//!
//! The fuzzy cutoff and the first-name shortcut are heuristics whose sweet
//! spot depends on a deployment's member-name distribution, so they are
//! configuration rather than constants.

use serde::{Deserialize, Serialize};

/// Default minimum similarity (0-1) for a fuzzy full-name match.
pub const DEFAULT_FUZZY_CUTOFF: f64 = 0.6;

/// Knobs for [`crate::resolver::MemberResolver`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Minimum normalized similarity a full name must reach before a fuzzy
    /// match is accepted.
    pub fuzzy_cutoff: f64,
    /// When true, a single-word query that matches exactly one member's
    /// first name resolves to that member without fuzzy scoring.
    pub first_name_shortcut: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_cutoff: DEFAULT_FUZZY_CUTOFF,
            first_name_shortcut: true,
        }
    }
}
