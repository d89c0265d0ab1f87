//! Typed stack triggers.
//!
//! Triggers are declared on equipment and status effects (authored as
//! `<EventName[StateId]: delta[, selector]>` note tags, parsed once at
//! load by the content layer) and fire when the owning battler is party
//! to the matching combat event. The enum variants carry the original
//! tag names so the loader can round-trip them with `from_str`.

use crate::battler::{Battler, ElementId, StateId, StateLibrary};

/// Combat events a trigger can react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerEvent {
    /// HP increased by any means.
    #[strum(serialize = "StackHpGain")]
    HpGain,
    /// HP decreased by any means.
    #[strum(serialize = "StackHpLoss")]
    HpLoss,
    #[strum(serialize = "StackMpGain")]
    MpGain,
    #[strum(serialize = "StackMpLoss")]
    MpLoss,
    #[strum(serialize = "StackTpGain")]
    TpGain,
    #[strum(serialize = "StackTpLoss")]
    TpLoss,
    /// Took HP damage from a damage-type action. Optional element selector.
    #[strum(serialize = "StackHpDamageReceive")]
    HpDamageReceived,
    /// Dealt HP damage with a damage-type action. Optional element selector.
    #[strum(serialize = "StackHpDamageDeal")]
    HpDamageDealt,
    /// Was healed by a recover-type action.
    #[strum(serialize = "StackHpDamageRecover")]
    HpRecovered,
    #[strum(serialize = "StackMpDamageReceive")]
    MpDamageReceived,
    #[strum(serialize = "StackMpDamageDeal")]
    MpDamageDealt,
    /// Landed a critical hit.
    #[strum(serialize = "StackCritical")]
    Critical,
    /// Was party to an evaded action (either side).
    #[strum(serialize = "StackEvaded")]
    Evaded,
    /// Performed a counter-attack.
    #[strum(serialize = "StackCounter")]
    Counter,
    /// Reflected a magic action.
    #[strum(serialize = "StackReflection")]
    Reflection,
    /// Took a hit as a substitute.
    #[strum(serialize = "StackSubstitute")]
    Substitute,
    /// Newly applied a status to a target. Optional status selector; no
    /// selector means any of the user's attack-granted statuses.
    #[strum(serialize = "StackStateApply")]
    StateApplied,
}

/// Event-specific trigger condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TriggerSelector {
    /// Damage events: fire only when the action carries this element.
    Element(ElementId),
    /// Status-applied events: fire only for this status.
    State(StateId),
}

/// One trigger declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trigger {
    pub event: TriggerEvent,
    /// The stack status the trigger mutates.
    pub state: StateId,
    pub delta: i32,
    pub selector: Option<TriggerSelector>,
}

impl Trigger {
    pub fn new(event: TriggerEvent, state: StateId, delta: i32) -> Self {
        Self {
            event,
            state,
            delta,
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: TriggerSelector) -> Self {
        self.selector = Some(selector);
        self
    }
}

/// One merged scan result: the accumulated delta for a target status
/// under one selector condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerMatch {
    pub state: StateId,
    pub delta: i32,
    pub selector: Option<TriggerSelector>,
}

/// Collect every trigger for `event` declared on the battler's equipped
/// items or active statuses.
///
/// Contributions from distinct sources targeting the same status under
/// the same selector are summed, never overwritten: two equipped items
/// both declaring `StackCritical[7]: 2` yield a single match of 4.
pub fn scan(battler: &Battler, library: &StateLibrary, event: TriggerEvent) -> Vec<TriggerMatch> {
    let mut matches: Vec<TriggerMatch> = Vec::new();

    let mut accumulate = |trigger: &Trigger| {
        if trigger.event != event {
            return;
        }
        if let Some(existing) = matches
            .iter_mut()
            .find(|m| m.state == trigger.state && m.selector == trigger.selector)
        {
            existing.delta += trigger.delta;
        } else {
            matches.push(TriggerMatch {
                state: trigger.state,
                delta: trigger.delta,
                selector: trigger.selector,
            });
        }
    };

    for equip in &battler.equips {
        for trigger in &equip.triggers {
            accumulate(trigger);
        }
    }
    for active in battler.states() {
        for trigger in library.triggers_of(active.id) {
            accumulate(trigger);
        }
    }

    matches
}

/// Stack delta granted by using an item or skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackGain {
    pub state: StateId,
    pub delta: i32,
}

/// Stack effects attached to an item or skill, applied when its use
/// effects resolve: `target_gains` to the action target, `user_gains`
/// to the user (the `GainStack` / `GainStackOwn` tags).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UseEffect {
    pub target_gains: Vec<StackGain>,
    pub user_gains: Vec<StackGain>,
}
