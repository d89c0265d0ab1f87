//! End-to-end flows through the public API: event dispatch feeding the
//! ledger, the ledger feeding stat aggregation, and the turn/battle
//! lifecycle tying them together.

use stack_core::{
    Battler, DamageEvent, DamageKind, DamageResource, EngineConfig, Equipment, EvalContext,
    EventBinder, ModifierRule, ParamId, StackContext, StackModifiers, StackStateDef, StackValue,
    StatEngine, StateCatalog, StateId, StateLibrary, StateSpec, Trigger, TriggerEvent, XParamId,
};

const CHARGE: StateId = StateId(21);
const FRENZY: StateId = StateId(22);

fn catalog() -> StateCatalog {
    let mut charge = StackStateDef::new(CHARGE);
    charge.max_stack = 10;
    charge.initial_stack = 1;
    charge.auto_add = true;
    charge.auto_remove = true;
    charge.rules = vec![
        ModifierRule::ParamRate {
            param: ParamId::Atk,
            value: StackValue::from(5.0),
        },
        ModifierRule::ExtraParam {
            xparam: XParamId::Cri,
            value: StackValue::from(2.0),
        },
    ];

    let mut frenzy = StackStateDef::new(FRENZY);
    frenzy.max_stack = 5;
    frenzy.auto_add = true;
    frenzy.auto_remove = true;
    frenzy.rules = vec![ModifierRule::ParamAdd {
        param: ParamId::Atk,
        value: StackValue::from_source("a.atk / 20").unwrap(),
    }];

    StateCatalog::from_defs([charge, frenzy]).unwrap()
}

fn library() -> StateLibrary {
    let mut frenzy = StateSpec::new(FRENZY, "frenzy");
    frenzy.battle_scoped = true;
    StateLibrary::from_specs([StateSpec::new(CHARGE, "charge"), frenzy]).unwrap()
}

fn hero() -> Battler {
    let mut hero = Battler::new("hero");
    hero.set_param_base(ParamId::Atk, 100);
    let mut blade = Equipment::new("storm blade");
    blade
        .triggers
        .push(Trigger::new(TriggerEvent::HpDamageDealt, CHARGE, 1));
    blade
        .triggers
        .push(Trigger::new(TriggerEvent::Critical, FRENZY, 2));
    hero.equips.push(blade);
    hero
}

#[test]
fn dealing_damage_builds_stacks_and_raises_stats() {
    let catalog = catalog();
    let library = library();
    let ctx = StackContext::new(&catalog, &library).in_battle(true);
    let binder = EventBinder::new(ctx);
    let config = EngineConfig::new();

    let mut hero = hero();
    let mut foe = Battler::new("foe");

    // First hit auto-applies the status: initial 1 plus the trigger's 1.
    let hit = DamageEvent::new(DamageResource::Hp, DamageKind::Damage, 40);
    binder.on_damage_applied(&mut hero, &mut foe, &hit);
    assert_eq!(ctx.stack_of(&hero, CHARGE), 2);

    binder.on_damage_applied(&mut hero, &mut foe, &hit);
    assert_eq!(ctx.stack_of(&hero, CHARGE), 3);

    let stacks = StackModifiers::new(&catalog);
    let engine = StatEngine::new().with_provider(&stacks);
    let eval = EvalContext::new(&config, &hero);

    // 100 × (1 + 15/100) = 115 attack, 6% bonus crit.
    assert_eq!(engine.param(&eval, ParamId::Atk), 115);
    assert!((engine.xparam(&eval, XParamId::Cri) - 0.06).abs() < 1e-9);
}

#[test]
fn stack_cap_holds_across_repeated_events() {
    let catalog = catalog();
    let library = library();
    let ctx = StackContext::new(&catalog, &library).in_battle(true);
    let binder = EventBinder::new(ctx);

    let mut hero = hero();
    let mut foe = Battler::new("foe");
    let hit = DamageEvent::new(DamageResource::Hp, DamageKind::Damage, 40);
    for _ in 0..20 {
        binder.on_damage_applied(&mut hero, &mut foe, &hit);
    }
    assert_eq!(ctx.stack_of(&hero, CHARGE), 10);
}

#[test]
fn formula_rules_scale_with_native_attack() {
    let catalog = catalog();
    let library = library();
    let ctx = StackContext::new(&catalog, &library).in_battle(true);
    let binder = EventBinder::new(ctx);
    let config = EngineConfig::new();

    let mut hero = hero();
    binder.on_critical(&mut hero);
    binder.on_critical(&mut hero);
    assert_eq!(ctx.stack_of(&hero, FRENZY), 4);

    let stacks = StackModifiers::new(&catalog);
    let engine = StatEngine::new().with_provider(&stacks);
    let eval = EvalContext::new(&config, &hero);

    // Native attack (100) feeds the formula, so the flat bonus is
    // trunc(100/20 × 4) = 20 regardless of the rate channel.
    assert_eq!(engine.param(&eval, ParamId::Atk), 120);
}

#[test]
fn spending_all_stacks_removes_the_status() {
    let catalog = catalog();
    let library = library();
    let ctx = StackContext::new(&catalog, &library).in_battle(true);

    let mut hero = hero();
    ctx.gain_stack(&mut hero, CHARGE, 4);
    assert_eq!(ctx.stack_of(&hero, CHARGE), 5);

    ctx.gain_stack(&mut hero, CHARGE, -15);
    assert_eq!(ctx.stack_of(&hero, CHARGE), 0);
    assert!(!hero.is_state_active(CHARGE));

    // Stats fall back to native values once the status is gone.
    let config = EngineConfig::new();
    let stacks = StackModifiers::new(&catalog);
    let engine = StatEngine::new().with_provider(&stacks);
    let eval = EvalContext::new(&config, &hero);
    assert_eq!(engine.param(&eval, ParamId::Atk), 100);
}

#[test]
fn battle_scoped_stacks_do_not_survive_the_battle() {
    let catalog = catalog();
    let library = library();
    let ctx = StackContext::new(&catalog, &library).in_battle(true);
    let binder = EventBinder::new(ctx);

    let mut hero = hero();
    binder.on_critical(&mut hero);
    ctx.gain_stack(&mut hero, CHARGE, 3);
    assert_eq!(ctx.stack_of(&hero, FRENZY), 2);
    assert_eq!(ctx.stack_of(&hero, CHARGE), 4);

    binder.on_battle_end(&mut hero);
    // Frenzy is battle-scoped, charge persists.
    assert!(!hero.is_state_active(FRENZY));
    assert_eq!(ctx.stack_of(&hero, CHARGE), 4);

    // Outside battle the scoped status cannot be auto-applied again.
    let outside = EventBinder::new(StackContext::new(&catalog, &library));
    outside.on_critical(&mut hero);
    assert!(!hero.is_state_active(FRENZY));
}

#[test]
fn synced_status_counts_down_with_its_stacks() {
    let mut venom = StackStateDef::new(StateId(30));
    venom.max_stack = 9;
    venom.initial_stack = 3;
    venom.auto_add = true;
    venom.auto_remove = true;
    venom.sync_duration = true;
    let catalog = StateCatalog::from_defs([venom]).unwrap();
    let mut spec = StateSpec::new(StateId(30), "venom");
    spec.default_turns = 5;
    let library = StateLibrary::from_specs([spec]).unwrap();
    let ctx = StackContext::new(&catalog, &library).in_battle(true);
    let binder = EventBinder::new(ctx);

    let mut hero = Battler::new("hero");
    ctx.gain_stack(&mut hero, StateId(30), 1);
    // Initial 3 plus the applying delta.
    assert_eq!(ctx.stack_of(&hero, StateId(30)), 4);
    assert_eq!(hero.state_turns(StateId(30)), Some(4));

    for remaining in (0..4).rev() {
        binder.on_turn_end(&mut hero);
        assert_eq!(ctx.stack_of(&hero, StateId(30)), remaining);
    }
    assert!(!hero.is_state_active(StateId(30)));
}

#[test]
fn visible_stacks_reports_display_eligible_counts() {
    let mut shown = StackStateDef::new(StateId(40));
    shown.auto_add = true;
    let mut hidden = StackStateDef::new(StateId(41));
    hidden.auto_add = true;
    hidden.show_stack = false;
    let catalog = StateCatalog::from_defs([shown, hidden]).unwrap();
    let library = StateLibrary::from_specs([
        StateSpec::new(StateId(40), "shown"),
        StateSpec::new(StateId(41), "hidden"),
    ])
    .unwrap();
    let ctx = StackContext::new(&catalog, &library);

    let mut hero = Battler::new("hero");
    ctx.gain_stack(&mut hero, StateId(40), 2);
    ctx.gain_stack(&mut hero, StateId(41), 7);

    assert_eq!(hero.visible_stacks(&catalog), vec![(StateId(40), 2)]);
}
