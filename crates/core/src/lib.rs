//! Rule-driven stacking status effects for turn-based battles.
//!
//! `stack-core` defines the stacking model (counted status effects with
//! per-stack stat rules, event triggers and lifecycle automation) and
//! exposes pure APIs the host battle system drives. All stack mutation
//! flows through [`ledger::StackContext`], stat queries go through
//! [`aggregate::StatEngine`], and battle events enter via
//! [`events::EventBinder`].
pub mod aggregate;
pub mod battler;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod formula;
pub mod ledger;
pub mod triggers;

pub use aggregate::{StackModifiers, StatEngine, StatModifierProvider};
pub use battler::{
    ActiveState, BaseTraits, Battler, ElementId, Equipment, ParamId, SParamId, StateId,
    StateLibrary, StateSpec, XParamId,
};
pub use catalog::{ModifierRule, StackStateDef, StateCatalog};
pub use config::{EngineConfig, ParamBounds};
pub use error::CatalogError;
pub use events::{DamageEvent, DamageKind, DamageResource, EventBinder};
pub use formula::{EvalContext, Formula, FormulaError, StackValue};
pub use ledger::{StackContext, StackLedger};
pub use triggers::{StackGain, Trigger, TriggerEvent, TriggerMatch, TriggerSelector, UseEffect};
