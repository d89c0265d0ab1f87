//! Note-tag mini-language.
//!
//! Designer data carries trigger declarations in free-text note fields
//! as `<EventName[StatusId]: value>` or `<EventName[StatusId]: value,
//! selector>`, plus `<GainStack[StatusId]: value>` /
//! `<GainStackOwn[StatusId]: value>` on usable items. Parsing happens
//! once at load time and produces the typed trigger lists the core
//! scans, so no free-text matching remains on the event path.
//!
//! Parsing is defensive throughout: unknown tag names and malformed
//! declarations are skipped, and a missing, non-numeric or zero value
//! means 1 (tag presence alone implies a unit delta).

use stack_core::{
    ElementId, StackGain, StateId, Trigger, TriggerEvent, TriggerSelector, UseEffect,
};

/// Parse every trigger declaration in a note field.
pub fn parse_triggers(note: &str) -> Vec<Trigger> {
    let mut triggers = Vec::new();
    for tag in tags(note) {
        if let Some(trigger) = parse_trigger(tag) {
            triggers.push(trigger);
        }
    }
    triggers
}

/// Parse the item-use stack effects (`GainStack` targets the action
/// target, `GainStackOwn` the user).
pub fn parse_use_effect(note: &str) -> UseEffect {
    let mut effect = UseEffect::default();
    for tag in tags(note) {
        let Some((head, value)) = split_tag(tag) else {
            continue;
        };
        let Some((name, id)) = split_head(head) else {
            continue;
        };
        let Ok(state) = id.parse::<StateId>() else {
            continue;
        };
        let gain = StackGain {
            state,
            delta: parse_delta(value),
        };
        match name {
            "GainStack" => effect.target_gains.push(gain),
            "GainStackOwn" => effect.user_gains.push(gain),
            _ => {}
        }
    }
    effect
}

/// Iterate over the bodies of `<...>` tags in a note field.
fn tags(note: &str) -> impl Iterator<Item = &str> {
    note.split('<').skip(1).filter_map(|rest| {
        let end = rest.find('>')?;
        Some(&rest[..end])
    })
}

/// Split a tag body into its head (`Name[Id]`) and argument text.
fn split_tag(tag: &str) -> Option<(&str, &str)> {
    let (head, args) = tag.split_once(':')?;
    Some((head.trim(), args))
}

/// Split `Name[Id]` into the name and the bracketed id text.
fn split_head(head: &str) -> Option<(&str, &str)> {
    let open = head.find('[')?;
    let close = head.rfind(']')?;
    if close <= open {
        return None;
    }
    Some((head[..open].trim(), head[open + 1..close].trim()))
}

fn parse_trigger(tag: &str) -> Option<Trigger> {
    let (head, args) = split_tag(tag)?;
    let (name, id) = split_head(head)?;
    let event = name.parse::<TriggerEvent>().ok()?;
    let state = id.parse::<StateId>().ok()?;

    let mut parts = args.splitn(2, ',');
    let delta = parse_delta(parts.next().unwrap_or(""));
    let mut trigger = Trigger::new(event, state, delta);
    if let Some(raw) = parts.next() {
        if let Some(selector) = parse_selector(event, raw.trim()) {
            trigger = trigger.with_selector(selector);
        }
    }
    Some(trigger)
}

/// Selectors are event-specific: damage events take an element id,
/// status application takes a status id, and everything else ignores
/// the extra argument.
fn parse_selector(event: TriggerEvent, raw: &str) -> Option<TriggerSelector> {
    match event {
        TriggerEvent::HpDamageReceived
        | TriggerEvent::HpDamageDealt
        | TriggerEvent::HpRecovered
        | TriggerEvent::MpDamageReceived
        | TriggerEvent::MpDamageDealt => raw.parse::<ElementId>().ok().map(TriggerSelector::Element),
        TriggerEvent::StateApplied => raw.parse::<StateId>().ok().map(TriggerSelector::State),
        _ => None,
    }
}

/// Numeric tag argument with the unit-delta fallback: non-numeric or
/// zero reads as 1.
fn parse_delta(raw: &str) -> i32 {
    match raw.trim().parse::<i32>() {
        Ok(0) | Err(_) => 1,
        Ok(value) => value,
    }
}
