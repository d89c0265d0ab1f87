//! Battle-event dispatch.
//!
//! [`EventBinder`] is the seam the host wires its battle flow into:
//! instead of patching engine internals, the host calls one method per
//! observable event (damage resolved, critical landed, evasion, turn
//! end, ...). Each method scans the relevant battlers' trigger
//! declarations and applies the merged deltas through the ledger rules,
//! so auto-apply, clamping and auto-removal all hold on every path.

use crate::battler::{Battler, ElementId, StateId};
use crate::ledger::StackContext;
use crate::triggers::{self, TriggerEvent, TriggerSelector, UseEffect};

/// Which resource an action damaged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageResource {
    Hp,
    Mp,
}

/// Direction of a damage effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageKind {
    Damage,
    Drain,
    Recover,
}

/// One resolved damage application.
#[derive(Clone, Debug, PartialEq)]
pub struct DamageEvent {
    pub resource: DamageResource,
    pub kind: DamageKind,
    /// Magnitude after all mitigation; zero means nothing happened.
    pub amount: i64,
    /// Elements carried by the action, for element-selected triggers.
    pub elements: Vec<ElementId>,
    pub critical: bool,
}

impl DamageEvent {
    pub fn new(resource: DamageResource, kind: DamageKind, amount: i64) -> Self {
        Self {
            resource,
            kind,
            amount,
            elements: Vec::new(),
            critical: false,
        }
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = ElementId>) -> Self {
        self.elements.extend(elements);
        self
    }
}

/// Routes host battle events into trigger scans and stack mutations.
#[derive(Clone, Copy)]
pub struct EventBinder<'a> {
    ctx: StackContext<'a>,
}

impl<'a> EventBinder<'a> {
    pub fn new(ctx: StackContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> StackContext<'a> {
        self.ctx
    }

    /// Scan `battler` for `event` triggers and apply every match whose
    /// selector `accept`s.
    fn dispatch(
        &self,
        battler: &mut Battler,
        event: TriggerEvent,
        accept: impl Fn(Option<TriggerSelector>) -> bool,
    ) {
        let matches = triggers::scan(battler, self.ctx.library, event);
        for m in matches {
            if !accept(m.selector) {
                continue;
            }
            self.ctx.gain_stack(battler, m.state, m.delta);
        }
    }

    /// Events that carry no selector context.
    fn dispatch_plain(&self, battler: &mut Battler, event: TriggerEvent) {
        self.dispatch(battler, event, |selector| selector.is_none());
    }

    /// HP changed outside damage resolution (regeneration, scripted
    /// gains). Sign picks the gain or loss event; zero is silent.
    pub fn on_hp_change(&self, battler: &mut Battler, delta: i64) {
        match delta {
            0 => {}
            d if d > 0 => self.dispatch_plain(battler, TriggerEvent::HpGain),
            _ => self.dispatch_plain(battler, TriggerEvent::HpLoss),
        }
    }

    pub fn on_mp_change(&self, battler: &mut Battler, delta: i64) {
        match delta {
            0 => {}
            d if d > 0 => self.dispatch_plain(battler, TriggerEvent::MpGain),
            _ => self.dispatch_plain(battler, TriggerEvent::MpLoss),
        }
    }

    pub fn on_tp_change(&self, battler: &mut Battler, delta: i64) {
        match delta {
            0 => {}
            d if d > 0 => self.dispatch_plain(battler, TriggerEvent::TpGain),
            _ => self.dispatch_plain(battler, TriggerEvent::TpLoss),
        }
    }

    /// A damage effect resolved from `attacker` onto `target`.
    ///
    /// Zero-amount applications fire nothing. Damage and drains notify
    /// the target's "received" triggers and the attacker's "dealt"
    /// triggers; recoveries notify the target's recovery triggers.
    /// Element-selected triggers fire only when the action carries the
    /// element; selector-less triggers always fire.
    pub fn on_damage_applied(
        &self,
        attacker: &mut Battler,
        target: &mut Battler,
        event: &DamageEvent,
    ) {
        if event.amount == 0 {
            return;
        }
        let accept = |selector: Option<TriggerSelector>| match selector {
            None => true,
            Some(TriggerSelector::Element(e)) => event.elements.contains(&e),
            Some(TriggerSelector::State(_)) => false,
        };
        match (event.resource, event.kind) {
            (DamageResource::Hp, DamageKind::Damage | DamageKind::Drain) => {
                self.dispatch(target, TriggerEvent::HpDamageReceived, accept);
                self.dispatch(attacker, TriggerEvent::HpDamageDealt, accept);
            }
            (DamageResource::Hp, DamageKind::Recover) => {
                self.dispatch(target, TriggerEvent::HpRecovered, accept);
            }
            (DamageResource::Mp, DamageKind::Damage | DamageKind::Drain) => {
                self.dispatch(target, TriggerEvent::MpDamageReceived, accept);
                self.dispatch(attacker, TriggerEvent::MpDamageDealt, accept);
            }
            (DamageResource::Mp, DamageKind::Recover) => {}
        }
    }

    /// The attacker landed a critical hit.
    pub fn on_critical(&self, attacker: &mut Battler) {
        self.dispatch_plain(attacker, TriggerEvent::Critical);
    }

    /// The evader dodged the attacker's action. Both sides' triggers
    /// fire independently; a declaration on either battler observes the
    /// same evasion.
    pub fn on_evaded(&self, attacker: &mut Battler, evader: &mut Battler) {
        self.dispatch_plain(evader, TriggerEvent::Evaded);
        self.dispatch_plain(attacker, TriggerEvent::Evaded);
    }

    /// The battler counter-attacked.
    pub fn on_counter(&self, battler: &mut Battler) {
        self.dispatch_plain(battler, TriggerEvent::Counter);
    }

    /// The battler reflected a magic action.
    pub fn on_reflection(&self, battler: &mut Battler) {
        self.dispatch_plain(battler, TriggerEvent::Reflection);
    }

    /// The battler took a hit in another's place.
    pub fn on_substitute(&self, substitute: &mut Battler) {
        self.dispatch_plain(substitute, TriggerEvent::Substitute);
    }

    /// An item or skill's stack effects resolved against a target.
    pub fn on_use_effect(&self, user: &mut Battler, target: &mut Battler, effect: &UseEffect) {
        for gain in &effect.target_gains {
            self.ctx.gain_stack(target, gain.state, gain.delta);
        }
        for gain in &effect.user_gains {
            self.ctx.gain_stack(user, gain.state, gain.delta);
        }
    }

    /// Self-targeted variant: both gain lists land on the user.
    pub fn on_self_use_effect(&self, user: &mut Battler, effect: &UseEffect) {
        for gain in effect.target_gains.iter().chain(&effect.user_gains) {
            self.ctx.gain_stack(user, gain.state, gain.delta);
        }
    }

    /// The user's action applied statuses to the target; `before` is
    /// the target's active-status set prior to the action.
    ///
    /// Only statuses the action newly applied count. State-selected
    /// triggers fire for their named status; selector-less triggers
    /// fire when a newly applied status belongs to the user's
    /// attack-granted set.
    pub fn on_states_applied(
        &self,
        user: &mut Battler,
        target: &Battler,
        before: &[StateId],
    ) {
        let newly: Vec<StateId> = target
            .states()
            .iter()
            .map(|s| s.id)
            .filter(|id| !before.contains(id))
            .collect();
        if newly.is_empty() {
            return;
        }

        let mut attack_granted: Vec<StateId> = user
            .traits
            .attack_states
            .iter()
            .map(|(id, _)| *id)
            .collect();
        attack_granted.extend(
            self.ctx
                .catalog
                .attack_state_grants()
                .filter(|(owner, _)| user.stacks.stack_of(*owner) > 0)
                .map(|(_, granted)| granted),
        );

        self.dispatch(user, TriggerEvent::StateApplied, |selector| match selector {
            Some(TriggerSelector::State(s)) => newly.contains(&s),
            None => newly.iter().any(|id| attack_granted.contains(id)),
            Some(TriggerSelector::Element(_)) => false,
        });
    }

    /// End-of-turn housekeeping for one battler: duration countdown,
    /// synced stack decay and expiry.
    pub fn on_turn_end(&self, battler: &mut Battler) {
        self.ctx.tick_turns(battler);
    }

    /// Battle ended: battle-scoped statuses and their stacks are
    /// stripped.
    pub fn on_battle_end(&self, battler: &mut Battler) {
        self.ctx.end_battle(battler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battler::{Equipment, StateLibrary, StateSpec};
    use crate::catalog::{StackStateDef, StateCatalog};
    use crate::triggers::{StackGain, Trigger};

    fn stack_def(id: u16) -> StackStateDef {
        let mut def = StackStateDef::new(StateId(id));
        def.auto_add = true;
        def.auto_remove = true;
        def
    }

    fn equip_with(trigger: Trigger) -> Equipment {
        let mut equip = Equipment::new("test gear");
        equip.triggers.push(trigger);
        equip
    }

    #[test]
    fn hp_change_routes_by_sign() {
        let catalog = StateCatalog::from_defs([stack_def(5), stack_def(6)]).unwrap();
        let library = StateLibrary::from_specs([
            StateSpec::new(StateId(5), "surge"),
            StateSpec::new(StateId(6), "wound"),
        ])
        .unwrap();
        let binder = EventBinder::new(StackContext::new(&catalog, &library));

        let mut b = Battler::new("hero");
        b.equips
            .push(equip_with(Trigger::new(TriggerEvent::HpGain, StateId(5), 1)));
        b.equips
            .push(equip_with(Trigger::new(TriggerEvent::HpLoss, StateId(6), 2)));

        binder.on_hp_change(&mut b, 30);
        binder.on_hp_change(&mut b, -10);
        binder.on_hp_change(&mut b, 0);

        let ctx = binder.context();
        assert_eq!(ctx.stack_of(&b, StateId(5)), 1);
        assert_eq!(ctx.stack_of(&b, StateId(6)), 2);
    }

    #[test]
    fn damage_attribution_separates_received_and_dealt() {
        let catalog = StateCatalog::from_defs([stack_def(5), stack_def(6)]).unwrap();
        let library = StateLibrary::from_specs([
            StateSpec::new(StateId(5), "bulwark"),
            StateSpec::new(StateId(6), "bloodlust"),
        ])
        .unwrap();
        let binder = EventBinder::new(StackContext::new(&catalog, &library));

        let mut attacker = Battler::new("attacker");
        attacker.equips.push(equip_with(Trigger::new(
            TriggerEvent::HpDamageDealt,
            StateId(6),
            1,
        )));
        let mut target = Battler::new("target");
        target.equips.push(equip_with(Trigger::new(
            TriggerEvent::HpDamageReceived,
            StateId(5),
            1,
        )));

        let event = DamageEvent::new(DamageResource::Hp, DamageKind::Damage, 120);
        binder.on_damage_applied(&mut attacker, &mut target, &event);

        let ctx = binder.context();
        assert_eq!(ctx.stack_of(&attacker, StateId(6)), 1);
        assert_eq!(ctx.stack_of(&target, StateId(5)), 1);
        // Receiver's trigger never fires on the attacker.
        assert_eq!(ctx.stack_of(&attacker, StateId(5)), 0);
    }

    #[test]
    fn zero_amount_damage_is_silent() {
        let catalog = StateCatalog::from_defs([stack_def(5)]).unwrap();
        let library = StateLibrary::from_specs([StateSpec::new(StateId(5), "bulwark")]).unwrap();
        let binder = EventBinder::new(StackContext::new(&catalog, &library));

        let mut attacker = Battler::new("attacker");
        let mut target = Battler::new("target");
        target.equips.push(equip_with(Trigger::new(
            TriggerEvent::HpDamageReceived,
            StateId(5),
            1,
        )));

        let event = DamageEvent::new(DamageResource::Hp, DamageKind::Damage, 0);
        binder.on_damage_applied(&mut attacker, &mut target, &event);
        assert_eq!(binder.context().stack_of(&target, StateId(5)), 0);
    }

    #[test]
    fn element_selector_gates_damage_triggers() {
        let catalog = StateCatalog::from_defs([stack_def(5)]).unwrap();
        let library = StateLibrary::from_specs([StateSpec::new(StateId(5), "frostbite")]).unwrap();
        let binder = EventBinder::new(StackContext::new(&catalog, &library));

        let mut attacker = Battler::new("attacker");
        let mut target = Battler::new("target");
        target.equips.push(equip_with(
            Trigger::new(TriggerEvent::HpDamageReceived, StateId(5), 1)
                .with_selector(TriggerSelector::Element(ElementId(3))),
        ));

        let fire = DamageEvent::new(DamageResource::Hp, DamageKind::Damage, 50)
            .with_elements([ElementId(2)]);
        binder.on_damage_applied(&mut attacker, &mut target, &fire);
        assert_eq!(binder.context().stack_of(&target, StateId(5)), 0);

        let ice = DamageEvent::new(DamageResource::Hp, DamageKind::Damage, 50)
            .with_elements([ElementId(3)]);
        binder.on_damage_applied(&mut attacker, &mut target, &ice);
        assert_eq!(binder.context().stack_of(&target, StateId(5)), 1);
    }

    #[test]
    fn recovery_notifies_target_only() {
        let catalog = StateCatalog::from_defs([stack_def(5)]).unwrap();
        let library = StateLibrary::from_specs([StateSpec::new(StateId(5), "blessing")]).unwrap();
        let binder = EventBinder::new(StackContext::new(&catalog, &library));

        let mut healer = Battler::new("healer");
        let mut target = Battler::new("target");
        target.equips.push(equip_with(Trigger::new(
            TriggerEvent::HpRecovered,
            StateId(5),
            1,
        )));

        let event = DamageEvent::new(DamageResource::Hp, DamageKind::Recover, 80);
        binder.on_damage_applied(&mut healer, &mut target, &event);
        assert_eq!(binder.context().stack_of(&target, StateId(5)), 1);
    }

    #[test]
    fn evasion_fires_for_both_sides_independently() {
        let catalog = StateCatalog::from_defs([stack_def(5), stack_def(6)]).unwrap();
        let library = StateLibrary::from_specs([
            StateSpec::new(StateId(5), "frustration"),
            StateSpec::new(StateId(6), "momentum"),
        ])
        .unwrap();
        let binder = EventBinder::new(StackContext::new(&catalog, &library));

        let mut attacker = Battler::new("attacker");
        attacker
            .equips
            .push(equip_with(Trigger::new(TriggerEvent::Evaded, StateId(5), 1)));
        let mut evader = Battler::new("evader");
        evader
            .equips
            .push(equip_with(Trigger::new(TriggerEvent::Evaded, StateId(6), 2)));

        binder.on_evaded(&mut attacker, &mut evader);
        let ctx = binder.context();
        assert_eq!(ctx.stack_of(&attacker, StateId(5)), 1);
        assert_eq!(ctx.stack_of(&evader, StateId(6)), 2);
    }

    #[test]
    fn use_effect_routes_target_and_user_gains() {
        let catalog = StateCatalog::from_defs([stack_def(5), stack_def(6)]).unwrap();
        let library = StateLibrary::from_specs([
            StateSpec::new(StateId(5), "mark"),
            StateSpec::new(StateId(6), "focus"),
        ])
        .unwrap();
        let binder = EventBinder::new(StackContext::new(&catalog, &library));

        let mut user = Battler::new("user");
        let mut target = Battler::new("target");
        let effect = UseEffect {
            target_gains: vec![StackGain {
                state: StateId(5),
                delta: 3,
            }],
            user_gains: vec![StackGain {
                state: StateId(6),
                delta: 1,
            }],
        };

        binder.on_use_effect(&mut user, &mut target, &effect);
        let ctx = binder.context();
        assert_eq!(ctx.stack_of(&target, StateId(5)), 3);
        assert_eq!(ctx.stack_of(&target, StateId(6)), 0);
        assert_eq!(ctx.stack_of(&user, StateId(6)), 1);
    }

    #[test]
    fn state_applied_counts_only_new_statuses() {
        let catalog = StateCatalog::from_defs([stack_def(5)]).unwrap();
        let library = StateLibrary::from_specs([
            StateSpec::new(StateId(5), "sadist"),
            StateSpec::new(StateId(9), "poison"),
        ])
        .unwrap();
        let ctx = StackContext::new(&catalog, &library);
        let binder = EventBinder::new(ctx);

        let mut user = Battler::new("user");
        user.equips.push(equip_with(
            Trigger::new(TriggerEvent::StateApplied, StateId(5), 1)
                .with_selector(TriggerSelector::State(StateId(9))),
        ));
        let mut target = Battler::new("target");

        // Already present before the action: no trigger.
        ctx.add_state(&mut target, StateId(9));
        let before: Vec<StateId> = target.states().iter().map(|s| s.id).collect();
        binder.on_states_applied(&mut user, &target, &before);
        assert_eq!(ctx.stack_of(&user, StateId(5)), 0);

        // Newly applied by the action: trigger fires.
        ctx.remove_state(&mut target, StateId(9));
        let before: Vec<StateId> = target.states().iter().map(|s| s.id).collect();
        ctx.add_state(&mut target, StateId(9));
        binder.on_states_applied(&mut user, &target, &before);
        assert_eq!(ctx.stack_of(&user, StateId(5)), 1);
    }

    #[test]
    fn selectorless_state_applied_requires_attack_grant() {
        let catalog = StateCatalog::from_defs([stack_def(5)]).unwrap();
        let library = StateLibrary::from_specs([
            StateSpec::new(StateId(5), "venom edge"),
            StateSpec::new(StateId(9), "poison"),
            StateSpec::new(StateId(10), "sleep"),
        ])
        .unwrap();
        let ctx = StackContext::new(&catalog, &library);
        let binder = EventBinder::new(ctx);

        let mut user = Battler::new("user");
        user.equips.push(equip_with(Trigger::new(
            TriggerEvent::StateApplied,
            StateId(5),
            1,
        )));
        user.traits.attack_states.push((StateId(9), 0.4));

        // Applied status outside the attack-granted set: silent.
        let mut target = Battler::new("target");
        let before: Vec<StateId> = Vec::new();
        ctx.add_state(&mut target, StateId(10));
        binder.on_states_applied(&mut user, &target, &before);
        assert_eq!(ctx.stack_of(&user, StateId(5)), 0);

        // Attack-granted status newly applied: trigger fires.
        ctx.add_state(&mut target, StateId(9));
        let before = vec![StateId(10)];
        binder.on_states_applied(&mut user, &target, &before);
        assert_eq!(ctx.stack_of(&user, StateId(5)), 1);
    }

    #[test]
    fn turn_end_decays_synced_stacks() {
        let mut def = stack_def(5);
        def.sync_duration = true;
        def.initial_stack = 2;
        let catalog = StateCatalog::from_defs([def]).unwrap();
        let mut spec = StateSpec::new(StateId(5), "burn");
        spec.default_turns = 3;
        let library = StateLibrary::from_specs([spec]).unwrap();
        let ctx = StackContext::new(&catalog, &library);
        let binder = EventBinder::new(ctx);

        let mut b = Battler::new("hero");
        ctx.add_state(&mut b, StateId(5));
        binder.on_turn_end(&mut b);
        assert_eq!(ctx.stack_of(&b, StateId(5)), 1);
        assert_eq!(b.state_turns(StateId(5)), Some(1));

        binder.on_turn_end(&mut b);
        assert!(!b.is_state_active(StateId(5)));
    }

    #[test]
    fn battle_end_delegates_scoped_cleanup() {
        let catalog = StateCatalog::from_defs([stack_def(5)]).unwrap();
        let mut spec = StateSpec::new(StateId(5), "adrenaline");
        spec.battle_scoped = true;
        let library = StateLibrary::from_specs([spec]).unwrap();
        let ctx = StackContext::new(&catalog, &library).in_battle(true);
        let binder = EventBinder::new(ctx);

        let mut b = Battler::new("hero");
        binder.context().gain_stack(&mut b, StateId(5), 4);
        assert_eq!(ctx.stack_of(&b, StateId(5)), 4);

        binder.on_battle_end(&mut b);
        assert!(!b.is_state_active(StateId(5)));
        assert_eq!(ctx.stack_of(&b, StateId(5)), 0);
    }
}
