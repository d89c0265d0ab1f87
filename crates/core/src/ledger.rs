//! Per-battler stack ledger and its lifecycle rules.
//!
//! [`StackLedger`] is the raw status-id → stack-count map embedded in a
//! [`Battler`]. All mutation goes through [`StackContext`], which owns
//! the invariants:
//!
//! - stacks exist only while the coupled status is active;
//! - counts are clamped to `[0, max_stack]` (unbounded when 0);
//! - a positive delta on an absent status applies it first when
//!   `auto_add` is set and the status is eligible in the current mode;
//! - a count reaching zero removes the status when `auto_remove` is set;
//! - with `sync_duration`, the stack count mirrors the remaining-turn
//!   counter, and the per-turn countdown decays the stack through the
//!   same path, so duration expiry and stack exhaustion cannot diverge.

use std::collections::HashMap;

use crate::battler::{ActiveState, Battler, StateId, StateLibrary};
use crate::catalog::StateCatalog;

/// Status-id → current stack count for one battler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackLedger {
    stacks: HashMap<StateId, i32>,
}

impl StackLedger {
    /// Current stack count; 0 when no entry exists.
    pub fn stack_of(&self, id: StateId) -> i32 {
        self.stacks.get(&id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateId, i32)> + '_ {
        self.stacks.iter().map(|(id, count)| (*id, *count))
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub(crate) fn set(&mut self, id: StateId, count: i32) {
        self.stacks.insert(id, count);
    }

    pub(crate) fn remove(&mut self, id: StateId) {
        self.stacks.remove(&id);
    }

    pub(crate) fn clear(&mut self) {
        self.stacks.clear();
    }
}

/// Execution context for ledger mutations: the rule catalog, the status
/// library, and whether a battle is in progress (battle-scoped statuses
/// cannot be auto-added outside one).
/// Mirror a stack count into the u16 turn counter without wrapping;
/// unbounded statuses can exceed the counter's range.
fn saturate_turns(stack: i32) -> u16 {
    u16::try_from(stack).unwrap_or(u16::MAX)
}

#[derive(Clone, Copy)]
pub struct StackContext<'a> {
    pub catalog: &'a StateCatalog,
    pub library: &'a StateLibrary,
    pub in_battle: bool,
}

impl<'a> StackContext<'a> {
    pub fn new(catalog: &'a StateCatalog, library: &'a StateLibrary) -> Self {
        Self {
            catalog,
            library,
            in_battle: false,
        }
    }

    pub fn in_battle(mut self, in_battle: bool) -> Self {
        self.in_battle = in_battle;
        self
    }

    /// Current stack count for a battler.
    pub fn stack_of(&self, battler: &Battler, id: StateId) -> i32 {
        battler.stacks.stack_of(id)
    }

    /// Apply a stack delta.
    ///
    /// A zero delta is a strict no-op: it neither auto-adds nor
    /// auto-removes. A delta on a status with no catalog definition is
    /// ignored; the ledger never holds entries for non-stack statuses.
    pub fn gain_stack(&self, battler: &mut Battler, id: StateId, delta: i32) {
        if delta == 0 {
            return;
        }
        let Some(def) = self.catalog.definition(id) else {
            return;
        };

        if !battler.is_state_active(id) {
            let eligible = self.in_battle || !self.library.is_battle_scoped(id);
            if delta > 0 && def.auto_add && eligible {
                self.add_state(battler, id);
            }
            // Auto-add declined, ineligible, or the status list was full:
            // stacks cannot exist without the coupled status.
            if !battler.is_state_active(id) {
                return;
            }
        }

        let current = battler.stacks.stack_of(id);
        let mut next = current.saturating_add(delta);
        if def.max_stack > 0 {
            next = next.min(def.max_stack as i32);
        }
        next = next.max(0);

        battler.stacks.set(id, next);
        if def.sync_duration {
            battler.set_state_turns(id, saturate_turns(next));
        }
        tracing::debug!(battler = %battler.name, state = %id, from = current, to = next, "stack changed");

        if next == 0 && def.auto_remove {
            self.remove_state(battler, id);
        }
    }

    /// Apply a status to the battler.
    ///
    /// Newly applied stack statuses seed their ledger entry at
    /// `initial_stack`. Re-applying an active status refreshes its turn
    /// counter instead (and re-mirrors it from the stack when synced).
    pub fn add_state(&self, battler: &mut Battler, id: StateId) {
        let turns = self.library.default_turns(id);
        if battler.is_state_active(id) {
            battler.set_state_turns(id, turns);
            if let Some(def) = self.catalog.definition(id) {
                if def.sync_duration {
                    let stack = battler.stacks.stack_of(id);
                    battler.set_state_turns(id, saturate_turns(stack));
                }
            }
            return;
        }

        if !battler.push_state(ActiveState { id, turns }) {
            return;
        }
        if let Some(def) = self.catalog.definition(id) {
            let initial = def.initial_stack.max(0);
            battler.stacks.set(id, initial);
            if def.sync_duration {
                battler.set_state_turns(id, saturate_turns(initial));
            }
        }
    }

    /// Remove a status. The ledger entry is deleted with it, so
    /// `stack_of` reads 0 immediately after removal by any path.
    pub fn remove_state(&self, battler: &mut Battler, id: StateId) {
        if battler.erase_state(id) {
            tracing::debug!(battler = %battler.name, state = %id, "state removed");
        }
        battler.stacks.remove(id);
    }

    /// Per-turn duration countdown.
    ///
    /// Synced stack statuses decay through [`Self::gain_stack`] so
    /// removal-by-duration and removal-by-stack-exhaustion share the
    /// auto-remove path; everything else decrements its counter
    /// directly. Statuses without a duration never tick. Whatever is
    /// left at zero turns afterwards expires.
    pub fn tick_turns(&self, battler: &mut Battler) {
        let active: Vec<StateId> = battler.states().iter().map(|s| s.id).collect();
        for id in active {
            if self.library.default_turns(id) == 0 {
                continue;
            }
            let synced = self
                .catalog
                .definition(id)
                .is_some_and(|def| def.sync_duration);
            if synced {
                self.gain_stack(battler, id, -1);
            } else if let Some(turns) = battler.state_turns(id) {
                battler.set_state_turns(id, turns.saturating_sub(1));
            }
        }

        let expired: Vec<StateId> = battler
            .states()
            .iter()
            .filter(|s| s.turns == 0 && self.library.default_turns(s.id) > 0)
            .map(|s| s.id)
            .collect();
        for id in expired {
            self.remove_state(battler, id);
        }
    }

    /// Battle-end cleanup: battle-scoped statuses (and their ledger
    /// entries) are stripped.
    pub fn end_battle(&self, battler: &mut Battler) {
        let scoped: Vec<StateId> = battler
            .states()
            .iter()
            .filter(|s| self.library.is_battle_scoped(s.id))
            .map(|s| s.id)
            .collect();
        for id in scoped {
            self.remove_state(battler, id);
        }
    }
}
