//! Load-time validation errors.
//!
//! Runtime trigger and formula failures are deliberately *not* errors:
//! per the engine's failure contract they degrade to a zero contribution
//! so a bad rule can never abort combat resolution. Only configuration
//! problems detected while building the catalog or state library are
//! surfaced, and those fail fast.

use crate::battler::StateId;

/// Errors raised while assembling designer-authored configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// Two stack-state definitions share the same status id. Silent
    /// last-wins would mask an authoring bug, so this is fatal at load.
    #[error("duplicate stack state definition for state {0}")]
    DuplicateState(StateId),

    /// Two state-library records share the same status id.
    #[error("duplicate state library record for state {0}")]
    DuplicateSpec(StateId),
}
