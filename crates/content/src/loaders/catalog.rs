//! Stack rule catalog loader.

use std::path::Path;

use stack_core::{
    ElementId, ModifierRule, ParamId, SParamId, StackStateDef, StackValue, StateCatalog, StateId,
    XParamId,
};

use crate::formats::{RuleEntry, StackStateEntry, StackStateFile};
use crate::loaders::{LoadResult, read_file};

/// Loader for the stack rule catalog from TOML files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load the catalog from a TOML file.
    ///
    /// Duplicate status ids and unknown rule targets are load errors.
    /// A rule value that neither parses as a number nor compiles as a
    /// formula is kept as a constant 0 so one bad entry cannot take
    /// the whole catalog down.
    pub fn load(path: &Path) -> LoadResult<StateCatalog> {
        let content = read_file(path)?;
        let file: StackStateFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse stack state TOML: {}", e))?;
        Self::build(file)
    }

    /// Build the catalog from already-parsed file data.
    pub fn build(file: StackStateFile) -> LoadResult<StateCatalog> {
        let mut defs = Vec::with_capacity(file.stack_states.len());
        for entry in file.stack_states {
            defs.push(convert_entry(entry)?);
        }
        StateCatalog::from_defs(defs)
            .map_err(|e| anyhow::anyhow!("Invalid stack state catalog: {}", e))
    }
}

fn convert_entry(entry: StackStateEntry) -> LoadResult<StackStateDef> {
    let id = StateId(entry.id);
    let mut def = StackStateDef::new(id);
    def.max_stack = entry.max_stack;
    def.initial_stack = entry.initial_stack;
    def.auto_add = entry.auto_add;
    def.auto_remove = entry.auto_remove;
    def.sync_duration = entry.sync_duration;
    def.show_stack = entry.show_stack;
    for rule in entry.rules {
        def.rules.push(convert_rule(id, rule)?);
    }
    Ok(def)
}

fn convert_rule(owner: StateId, rule: RuleEntry) -> LoadResult<ModifierRule> {
    Ok(match rule {
        RuleEntry::ElementRate { element, value } => ModifierRule::ElementRate {
            element: ElementId(element),
            value: stack_value(owner, &value),
        },
        RuleEntry::DebuffRate { param, value } => ModifierRule::DebuffRate {
            param: parse_param(owner, &param)?,
            value: stack_value(owner, &value),
        },
        RuleEntry::StateRate { state, value } => ModifierRule::StateRate {
            state: StateId(state),
            value: stack_value(owner, &value),
        },
        RuleEntry::ParamAdd { param, value } => ModifierRule::ParamAdd {
            param: parse_param(owner, &param)?,
            value: stack_value(owner, &value),
        },
        RuleEntry::ParamRate { param, value } => ModifierRule::ParamRate {
            param: parse_param(owner, &param)?,
            value: stack_value(owner, &value),
        },
        RuleEntry::ExtraParam { xparam, value } => ModifierRule::ExtraParam {
            xparam: xparam.parse::<XParamId>().map_err(|_| {
                anyhow::anyhow!("Unknown extra parameter '{}' in stack state {}", xparam, owner)
            })?,
            value: stack_value(owner, &value),
        },
        RuleEntry::SpecialParam { sparam, value } => ModifierRule::SpecialParam {
            sparam: sparam.parse::<SParamId>().map_err(|_| {
                anyhow::anyhow!(
                    "Unknown special parameter '{}' in stack state {}",
                    sparam,
                    owner
                )
            })?,
            value: stack_value(owner, &value),
        },
        RuleEntry::AttackState { state, value } => ModifierRule::AttackState {
            state: StateId(state),
            value: stack_value(owner, &value),
        },
        RuleEntry::AttackSpeed { value } => ModifierRule::AttackSpeed {
            value: stack_value(owner, &value),
        },
        RuleEntry::AttackTimes { value } => ModifierRule::AttackTimes {
            value: stack_value(owner, &value),
        },
    })
}

fn parse_param(owner: StateId, raw: &str) -> LoadResult<ParamId> {
    raw.parse::<ParamId>()
        .map_err(|_| anyhow::anyhow!("Unknown parameter '{}' in stack state {}", raw, owner))
}

/// Compile a rule value. Values that neither parse as numbers nor
/// compile as formulas degrade to a constant 0.
fn stack_value(owner: StateId, raw: &str) -> StackValue {
    match StackValue::from_source(raw) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(state = %owner, value = raw, %error, "unparsable rule value, using 0");
            StackValue::from(0.0)
        }
    }
}
