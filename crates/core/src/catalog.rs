//! Rule catalog: designer-authored stack-state definitions.
//!
//! Each definition couples a status id with stack bounds, lifecycle
//! flags and an ordered list of typed modifier rules. The catalog is
//! immutable after load and consulted by the ledger (bounds, flags) and
//! the aggregator (rules).

use std::collections::HashMap;

use crate::battler::{ElementId, ParamId, SParamId, StateId, XParamId};
use crate::error::CatalogError;
use crate::formula::StackValue;

/// One typed modifier rule: which derived statistic the stack scales,
/// and the per-stack value (number or formula).
#[derive(Clone, Debug, PartialEq)]
pub enum ModifierRule {
    /// Elemental damage rate delta, percentage units per stack.
    ElementRate { element: ElementId, value: StackValue },
    /// Debuff susceptibility delta, percentage units per stack.
    DebuffRate { param: ParamId, value: StackValue },
    /// Status susceptibility delta, percentage units per stack.
    StateRate { state: StateId, value: StackValue },
    /// Flat base-parameter addition per stack.
    ParamAdd { param: ParamId, value: StackValue },
    /// Multiplicative base-parameter delta, percentage units per stack.
    ParamRate { param: ParamId, value: StackValue },
    /// Extra-parameter delta, percentage units per stack.
    ExtraParam { xparam: XParamId, value: StackValue },
    /// Special-parameter delta, percentage units per stack.
    SpecialParam { sparam: SParamId, value: StackValue },
    /// Grants `state` on normal attacks; application rate in percentage
    /// units per stack.
    AttackState { state: StateId, value: StackValue },
    /// Attack speed correction per stack.
    AttackSpeed { value: StackValue },
    /// Extra attack count per stack.
    AttackTimes { value: StackValue },
}

/// Authored definition of one stack state.
#[derive(Clone, Debug, PartialEq)]
pub struct StackStateDef {
    pub id: StateId,
    /// Upper stack bound; 0 means unbounded.
    pub max_stack: u32,
    /// Stack count seeded when the status is newly applied.
    pub initial_stack: i32,
    /// Gaining a positive delta while the status is absent applies it.
    pub auto_add: bool,
    /// Stack reaching zero removes the status.
    pub auto_remove: bool,
    /// Stack count mirrors the remaining-turn counter.
    pub sync_duration: bool,
    /// Presentation hint: show the stack count on the status icon.
    pub show_stack: bool,
    pub rules: Vec<ModifierRule>,
}

impl StackStateDef {
    pub fn new(id: StateId) -> Self {
        Self {
            id,
            max_stack: 0,
            initial_stack: 0,
            auto_add: false,
            auto_remove: false,
            sync_duration: false,
            show_stack: true,
            rules: Vec::new(),
        }
    }
}

/// Immutable mapping from status id to stack-state definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateCatalog {
    defs: HashMap<StateId, StackStateDef>,
}

impl StateCatalog {
    /// Build a catalog, rejecting duplicate status ids at load time.
    pub fn from_defs(
        defs: impl IntoIterator<Item = StackStateDef>,
    ) -> Result<Self, CatalogError> {
        let mut map = HashMap::new();
        for def in defs {
            let id = def.id;
            if map.insert(id, def).is_some() {
                return Err(CatalogError::DuplicateState(id));
            }
        }
        Ok(Self { defs: map })
    }

    pub fn definition(&self, id: StateId) -> Option<&StackStateDef> {
        self.defs.get(&id)
    }

    pub fn is_stack_state(&self, id: StateId) -> bool {
        self.defs.contains_key(&id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &StackStateDef> {
        self.defs.values()
    }

    fn rules(&self) -> impl Iterator<Item = (StateId, &ModifierRule)> {
        self.defs
            .values()
            .flat_map(|def| def.rules.iter().map(move |rule| (def.id, rule)))
    }

    /// All element-rate rules targeting `element`, as (owner, value).
    pub fn element_rules(&self, element: ElementId) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::ElementRate { element: e, value } if *e == element => {
                Some((owner, value))
            }
            _ => None,
        })
    }

    pub fn debuff_rules(&self, param: ParamId) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::DebuffRate { param: p, value } if *p == param => Some((owner, value)),
            _ => None,
        })
    }

    pub fn state_rate_rules(&self, state: StateId) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::StateRate { state: s, value } if *s == state => Some((owner, value)),
            _ => None,
        })
    }

    pub fn param_add_rules(&self, param: ParamId) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::ParamAdd { param: p, value } if *p == param => Some((owner, value)),
            _ => None,
        })
    }

    pub fn param_rate_rules(&self, param: ParamId) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::ParamRate { param: p, value } if *p == param => Some((owner, value)),
            _ => None,
        })
    }

    pub fn xparam_rules(&self, xparam: XParamId) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::ExtraParam { xparam: x, value } if *x == xparam => Some((owner, value)),
            _ => None,
        })
    }

    pub fn sparam_rules(&self, sparam: SParamId) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::SpecialParam { sparam: s, value } if *s == sparam => Some((owner, value)),
            _ => None,
        })
    }

    /// Attack-state grant rules for a specific granted status.
    pub fn attack_state_rules(
        &self,
        granted: StateId,
    ) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(move |(owner, rule)| match rule {
            ModifierRule::AttackState { state, value } if *state == granted => {
                Some((owner, value))
            }
            _ => None,
        })
    }

    /// Every attack-state grant as (owner, granted status).
    pub fn attack_state_grants(&self) -> impl Iterator<Item = (StateId, StateId)> + '_ {
        self.rules().filter_map(|(owner, rule)| match rule {
            ModifierRule::AttackState { state, .. } => Some((owner, *state)),
            _ => None,
        })
    }

    pub fn attack_speed_rules(&self) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(|(owner, rule)| match rule {
            ModifierRule::AttackSpeed { value } => Some((owner, value)),
            _ => None,
        })
    }

    pub fn attack_times_rules(&self) -> impl Iterator<Item = (StateId, &StackValue)> {
        self.rules().filter_map(|(owner, rule)| match rule {
            ModifierRule::AttackTimes { value } => Some((owner, value)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_definition_fails_fast() {
        let err =
            StateCatalog::from_defs([StackStateDef::new(StateId(5)), StackStateDef::new(StateId(5))])
                .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateState(StateId(5)));
    }

    #[test]
    fn rule_queries_filter_by_target() {
        let mut def_a = StackStateDef::new(StateId(1));
        def_a.rules.push(ModifierRule::ElementRate {
            element: ElementId(2),
            value: StackValue::Number(10.0),
        });
        def_a.rules.push(ModifierRule::ParamAdd {
            param: ParamId::Atk,
            value: StackValue::Number(5.0),
        });

        let mut def_b = StackStateDef::new(StateId(2));
        def_b.rules.push(ModifierRule::ElementRate {
            element: ElementId(3),
            value: StackValue::Number(20.0),
        });
        def_b.rules.push(ModifierRule::AttackState {
            state: StateId(9),
            value: StackValue::Number(50.0),
        });

        let catalog = StateCatalog::from_defs([def_a, def_b]).unwrap();

        let fire: Vec<_> = catalog.element_rules(ElementId(2)).collect();
        assert_eq!(fire.len(), 1);
        assert_eq!(fire[0].0, StateId(1));

        assert_eq!(catalog.element_rules(ElementId(4)).count(), 0);
        assert_eq!(catalog.param_add_rules(ParamId::Atk).count(), 1);
        assert_eq!(catalog.param_add_rules(ParamId::Def).count(), 0);

        let grants: Vec<_> = catalog.attack_state_grants().collect();
        assert_eq!(grants, vec![(StateId(2), StateId(9))]);
    }

    #[test]
    fn lookup_and_membership() {
        let catalog = StateCatalog::from_defs([StackStateDef::new(StateId(7))]).unwrap();
        assert!(catalog.is_stack_state(StateId(7)));
        assert!(!catalog.is_stack_state(StateId(8)));
        assert!(catalog.definition(StateId(7)).is_some());
    }
}
