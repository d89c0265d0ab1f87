//! Battler model: the slice of the host's combatant state the stack
//! engine reads and mutates.
//!
//! The host battle system owns far more than this (sprites, AI, action
//! queues); what lives here is exactly what the stack subsystem needs —
//! base parameters, gauges, buff levels, equipment trigger sources, the
//! active status list with turn counters, and the embedded
//! [`StackLedger`].

use std::collections::HashMap;
use std::str::FromStr;

use arrayvec::ArrayVec;

use crate::catalog::StateCatalog;
use crate::config::EngineConfig;
use crate::error::CatalogError;
use crate::ledger::StackLedger;
use crate::triggers::Trigger;

/// Unique identifier of a status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateId(pub u16);

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a damage element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementId(pub u8);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Base parameters, in the host's canonical order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "lowercase")]
pub enum ParamId {
    #[strum(serialize = "mhp")]
    MaxHp,
    #[strum(serialize = "mmp")]
    MaxMp,
    Atk,
    Def,
    Mat,
    Mdf,
    Agi,
    Luk,
}

impl ParamId {
    pub const ALL: [Self; 8] = [
        Self::MaxHp,
        Self::MaxMp,
        Self::Atk,
        Self::Def,
        Self::Mat,
        Self::Mdf,
        Self::Agi,
        Self::Luk,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Extra parameters: percentage-unit derived rates (hit, evasion, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "lowercase")]
pub enum XParamId {
    Hit,
    Eva,
    Cri,
    Cev,
    Mev,
    Mrf,
    Cnt,
    Hrg,
    Mrg,
    Trg,
}

impl XParamId {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Special parameters: multiplicative derived rates (target rate,
/// guard effect, recovery effect, ...). Native baseline is 1.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[strum(serialize_all = "lowercase")]
pub enum SParamId {
    Tgr,
    Grd,
    Rec,
    Pha,
    Mcp,
    Tcr,
    Pdr,
    Mdr,
    Fdr,
    Exr,
}

impl SParamId {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Library record for one status effect.
///
/// This is the host-side status database entry: scope, base duration and
/// the typed triggers parsed from its descriptive text. Stack behavior
/// lives separately in the [`StateCatalog`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateSpec {
    pub id: StateId,
    pub name: String,
    /// Battle-scoped statuses are stripped when battle ends and cannot
    /// be auto-added outside battle.
    pub battle_scoped: bool,
    /// Turns assigned when the status is applied; 0 means no duration
    /// countdown (the status persists until removed explicitly).
    pub default_turns: u16,
    pub triggers: Vec<Trigger>,
}

impl StateSpec {
    pub fn new(id: StateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            battle_scoped: false,
            default_turns: 0,
            triggers: Vec::new(),
        }
    }
}

/// Status database keyed by status id.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateLibrary {
    specs: HashMap<StateId, StateSpec>,
}

impl StateLibrary {
    /// Build a library, rejecting duplicate status ids.
    pub fn from_specs(specs: impl IntoIterator<Item = StateSpec>) -> Result<Self, CatalogError> {
        let mut map = HashMap::new();
        for spec in specs {
            let id = spec.id;
            if map.insert(id, spec).is_some() {
                return Err(CatalogError::DuplicateSpec(id));
            }
        }
        Ok(Self { specs: map })
    }

    pub fn get(&self, id: StateId) -> Option<&StateSpec> {
        self.specs.get(&id)
    }

    /// Whether the status is stripped at battle end. Unknown statuses
    /// are treated as persistent.
    pub fn is_battle_scoped(&self, id: StateId) -> bool {
        self.get(id).is_some_and(|spec| spec.battle_scoped)
    }

    pub fn default_turns(&self, id: StateId) -> u16 {
        self.get(id).map_or(0, |spec| spec.default_turns)
    }

    pub fn triggers_of(&self, id: StateId) -> &[Trigger] {
        self.get(id).map_or(&[], |spec| spec.triggers.as_slice())
    }
}

/// One equipped item, as a source of base-parameter additions and
/// trigger declarations. Adversarial battlers carry an empty list.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Equipment {
    pub name: String,
    /// Additive base-parameter contributions, indexed by [`ParamId::index`].
    pub params: [i64; 8],
    pub triggers: Vec<Trigger>,
}

impl Equipment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// One currently active status with its remaining-turn counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveState {
    pub id: StateId,
    pub turns: u16,
}

/// Native trait values the host computes for a battler before any stack
/// contribution: resistance rates, derived-parameter baselines and the
/// base attack-granted status list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseTraits {
    /// Elemental damage rates; absent elements default to 1.0.
    pub element_rates: HashMap<ElementId, f64>,
    /// Debuff susceptibility per parameter; baseline 1.0.
    pub debuff_rates: [f64; 8],
    /// Status susceptibility; absent statuses default to 1.0.
    pub state_rates: HashMap<StateId, f64>,
    /// Multiplicative parameter rates; baseline 1.0.
    pub param_rates: [f64; 8],
    /// Extra-parameter baselines; 0.0 unless granted.
    pub xparams: [f64; 10],
    /// Special-parameter baselines; 1.0 unless modified.
    pub sparams: [f64; 10],
    /// Statuses applied by normal attacks, with their application rates.
    pub attack_states: Vec<(StateId, f64)>,
    pub attack_speed: i32,
    pub attack_times: i32,
}

impl Default for BaseTraits {
    fn default() -> Self {
        Self {
            element_rates: HashMap::new(),
            debuff_rates: [1.0; 8],
            state_rates: HashMap::new(),
            param_rates: [1.0; 8],
            xparams: [0.0; 10],
            sparams: [1.0; 10],
            attack_states: Vec::new(),
            attack_speed: 0,
            attack_times: 0,
        }
    }
}

impl BaseTraits {
    pub fn element_rate(&self, element: ElementId) -> f64 {
        self.element_rates.get(&element).copied().unwrap_or(1.0)
    }

    pub fn state_rate(&self, state: StateId) -> f64 {
        self.state_rates.get(&state).copied().unwrap_or(1.0)
    }
}

/// A combat participant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Battler {
    pub name: String,
    param_base: [i64; 8],
    pub hp: i64,
    pub mp: i64,
    pub tp: i64,
    /// Buff levels per parameter, each in [-2, 2]; one level is ±25%.
    buffs: [i8; 8],
    pub traits: BaseTraits,
    pub equips: Vec<Equipment>,
    states: ArrayVec<ActiveState, { EngineConfig::MAX_STATUS_EFFECTS }>,
    pub stacks: StackLedger,
}

impl Battler {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_base: [1; 8],
            hp: 1,
            mp: 0,
            tp: 0,
            buffs: [0; 8],
            traits: BaseTraits::default(),
            equips: Vec::new(),
            states: ArrayVec::new(),
            stacks: StackLedger::default(),
        }
    }

    pub fn param_base(&self, param: ParamId) -> i64 {
        self.param_base[param.index()]
    }

    pub fn set_param_base(&mut self, param: ParamId, value: i64) {
        self.param_base[param.index()] = value;
    }

    /// Base value plus equipment contributions.
    pub fn param_base_plus(&self, param: ParamId) -> i64 {
        let equip_sum: i64 = self.equips.iter().map(|e| e.params[param.index()]).sum();
        self.param_base(param) + equip_sum
    }

    pub fn buff_level(&self, param: ParamId) -> i8 {
        self.buffs[param.index()]
    }

    pub fn set_buff_level(&mut self, param: ParamId, level: i8) {
        self.buffs[param.index()] = level.clamp(-2, 2);
    }

    /// Buff multiplier: 1.0 plus 25% per buff level.
    pub fn buff_rate(&self, param: ParamId) -> f64 {
        1.0 + 0.25 * f64::from(self.buff_level(param))
    }

    /// The unclamped native product: `(base + equips) × trait rate ×
    /// buff rate`. Stat layers that add their own factors build on this
    /// so clamping and rounding happen exactly once, at the end.
    pub fn param_product(&self, param: ParamId) -> f64 {
        self.param_base_plus(param) as f64
            * self.traits.param_rates[param.index()]
            * self.buff_rate(param)
    }

    /// The host's own parameter pipeline, before any stack contribution:
    /// [`Self::param_product`] clamped and rounded.
    pub fn native_param(&self, config: &EngineConfig, param: ParamId) -> i64 {
        let bounds = config.param_bounds(param);
        self.param_product(param)
            .clamp(bounds.min as f64, bounds.max as f64)
            .round() as i64
    }

    pub fn states(&self) -> &[ActiveState] {
        &self.states
    }

    pub fn is_state_active(&self, id: StateId) -> bool {
        self.states.iter().any(|s| s.id == id)
    }

    pub fn state_turns(&self, id: StateId) -> Option<u16> {
        self.states.iter().find(|s| s.id == id).map(|s| s.turns)
    }

    pub fn set_state_turns(&mut self, id: StateId, turns: u16) {
        if let Some(state) = self.states.iter_mut().find(|s| s.id == id) {
            state.turns = turns;
        }
    }

    /// Push a newly applied status. Returns false when the status is
    /// already active or the status list is full.
    pub(crate) fn push_state(&mut self, state: ActiveState) -> bool {
        if self.is_state_active(state.id) || self.states.is_full() {
            return false;
        }
        self.states.push(state);
        true
    }

    /// Erase an active status. Returns whether it was present.
    pub(crate) fn erase_state(&mut self, id: StateId) -> bool {
        let before = self.states.len();
        self.states.retain(|s| s.id != id);
        self.states.len() != before
    }

    /// Whether any active status is a configured stack status. Gates the
    /// aggregation fast path.
    pub fn has_stack_state(&self, catalog: &StateCatalog) -> bool {
        self.states.iter().any(|s| catalog.is_stack_state(s.id))
    }

    /// Stack counts for statuses whose definition asks for on-icon
    /// display. Presentation data only; the rendering layer consumes it.
    pub fn visible_stacks(&self, catalog: &StateCatalog) -> Vec<(StateId, i32)> {
        self.states
            .iter()
            .filter(|s| {
                catalog
                    .definition(s.id)
                    .is_some_and(|def| def.show_stack)
            })
            .map(|s| (s.id, self.stacks.stack_of(s.id)))
            .collect()
    }
}

impl FromStr for StateId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u16>().map(Self)
    }
}

impl FromStr for ElementId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u8>().map(Self)
    }
}
