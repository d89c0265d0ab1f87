//! Data-driven definitions and loaders for the stack system.
//!
//! This crate reads designer-authored TOML files into `stack-core`
//! types:
//! - stack rule catalogs (per-status bounds, flags and modifier rules)
//! - status libraries (lifecycle data plus note-tag triggers)
//! - equipment (stat bonuses plus note-tag triggers)
//! - usable items (stack gain effects)
//!
//! Note tags are parsed exactly once at load time by [`notes`]; the
//! core only ever sees typed trigger lists.

pub mod formats;
pub mod loaders;
pub mod notes;

pub use formats::{
    EquipmentEntry, EquipmentFile, ItemEntry, ItemFile, RuleEntry, StackStateEntry, StackStateFile,
    StateEntry, StateFile,
};
pub use loaders::{CatalogLoader, EquipmentLoader, ItemLoader, StackItem, StateLoader};
pub use notes::{parse_triggers, parse_use_effect};
