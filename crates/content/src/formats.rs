//! TOML data formats.
//!
//! These structs mirror the designer-authored data files one-to-one;
//! the loaders in [`crate::loaders`] convert them into core types.
//! Parameter and rule targets are carried as plain strings here so data
//! files can use the short stat names (`atk`, `cri`, `pdr`, ...) and
//! validation happens in one place during conversion.

use serde::{Deserialize, Serialize};

/// Top-level stack rule file: a list of stack status definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackStateFile {
    #[serde(default)]
    pub stack_states: Vec<StackStateEntry>,
}

/// One stack status definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackStateEntry {
    pub id: u16,
    /// 0 means unbounded.
    #[serde(default)]
    pub max_stack: u32,
    #[serde(default)]
    pub initial_stack: i32,
    #[serde(default)]
    pub auto_add: bool,
    #[serde(default)]
    pub auto_remove: bool,
    #[serde(default)]
    pub sync_duration: bool,
    #[serde(default = "default_true")]
    pub show_stack: bool,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// One per-stack modifier rule. `value` is a number or a formula over
/// the evaluation context (`a.atk / 10`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleEntry {
    ElementRate { element: u8, value: String },
    DebuffRate { param: String, value: String },
    StateRate { state: u16, value: String },
    ParamAdd { param: String, value: String },
    ParamRate { param: String, value: String },
    ExtraParam { xparam: String, value: String },
    SpecialParam { sparam: String, value: String },
    AttackState { state: u16, value: String },
    AttackSpeed { value: String },
    AttackTimes { value: String },
}

/// Top-level status file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub states: Vec<StateEntry>,
}

/// One status definition: identity, lifecycle data and the note text
/// holding its trigger tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub battle_scoped: bool,
    /// Turns until expiry; 0 means no countdown.
    #[serde(default)]
    pub turns: u16,
    #[serde(default)]
    pub note: String,
}

/// Top-level equipment file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentFile {
    #[serde(default)]
    pub equipment: Vec<EquipmentEntry>,
}

/// One piece of equipment: stat bonuses keyed by short parameter name,
/// plus trigger tags in the note text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentEntry {
    pub name: String,
    #[serde(default)]
    pub params: std::collections::HashMap<String, i64>,
    #[serde(default)]
    pub note: String,
}

/// Top-level item file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFile {
    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

/// One usable item; its note text carries `GainStack` / `GainStackOwn`
/// tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemEntry {
    pub name: String,
    #[serde(default)]
    pub note: String,
}

fn default_true() -> bool {
    true
}
