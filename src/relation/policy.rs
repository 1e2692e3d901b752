//! Knobs for the cases the service's data does not settle on its own.

use serde::{Deserialize, Serialize};

/// What expansion does when a referenced id has no fetched record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingMatch {
    /// Single references become `null`; unmatched ids drop out of lists.
    #[default]
    Omit,
    /// Fail the whole expansion with `NotFound`.
    Fail,
}

/// What metadata discovery does when several catalog rows match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Use the first row in the order the service returned them.
    #[default]
    FirstMatch,
    /// Fail with `AmbiguousMetadata`.
    Reject,
}

/// The `[resolution]` settings table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    pub on_missing_match: MissingMatch,
    pub on_ambiguous_metadata: AmbiguityPolicy,
}

impl ResolutionPolicy {
    /// Fail on every missing match and every ambiguity.
    pub fn strict() -> Self {
        Self {
            on_missing_match: MissingMatch::Fail,
            on_ambiguous_metadata: AmbiguityPolicy::Reject,
        }
    }
}
