//! Stat aggregation: native baselines folded with pluggable modifier
//! providers.
//!
//! [`StatEngine`] never reaches into rule storage itself. Each source of
//! stat adjustments implements [`StatModifierProvider`]; the engine folds
//! every registered provider over the battler's native values. The stack
//! system ships [`StackModifiers`], which scales each catalog rule by the
//! owner's current stack count.
//!
//! Percentage-unit rules (rates, extra and special parameters) contribute
//! `trunc(value × stack) / 100` per status; flat rules (parameter adds,
//! attack speed and times) contribute `trunc(value × stack)` directly.
//! Truncation happens per status before summing, so three stacks of a
//! 1.7-point rule yield 5, not 3.

use crate::battler::{ElementId, ParamId, SParamId, StateId, XParamId};
use crate::catalog::StateCatalog;
use crate::formula::{EvalContext, StackValue};

/// One source of stat adjustments, folded by [`StatEngine`].
///
/// Every method has a neutral default, so a provider only overrides the
/// channels it actually touches. The subject battler is `ctx.actor`.
pub trait StatModifierProvider {
    /// Additive delta to the elemental damage rate.
    fn element_rate_delta(&self, _ctx: &EvalContext<'_>, _element: ElementId) -> f64 {
        0.0
    }

    /// Additive delta to debuff susceptibility for one parameter.
    fn debuff_rate_delta(&self, _ctx: &EvalContext<'_>, _param: ParamId) -> f64 {
        0.0
    }

    /// Additive delta to susceptibility to one status.
    fn state_rate_delta(&self, _ctx: &EvalContext<'_>, _state: StateId) -> f64 {
        0.0
    }

    /// Multiplicative factor applied to a parameter; neutral is 1.0.
    fn param_rate_factor(&self, _ctx: &EvalContext<'_>, _param: ParamId) -> f64 {
        1.0
    }

    /// Flat addition to a parameter, applied after all rate factors.
    fn param_flat(&self, _ctx: &EvalContext<'_>, _param: ParamId) -> f64 {
        0.0
    }

    /// Additive delta to an extra parameter (hit, evasion, ...).
    fn xparam_delta(&self, _ctx: &EvalContext<'_>, _xparam: XParamId) -> f64 {
        0.0
    }

    /// Additive delta to a special parameter (target rate, recovery, ...).
    fn sparam_delta(&self, _ctx: &EvalContext<'_>, _sparam: SParamId) -> f64 {
        0.0
    }

    /// Extra statuses granted to normal attacks.
    fn attack_states(&self, _ctx: &EvalContext<'_>) -> Vec<StateId> {
        Vec::new()
    }

    /// Additive delta to the application rate of one attack-granted status.
    fn attack_state_rate_delta(&self, _ctx: &EvalContext<'_>, _granted: StateId) -> f64 {
        0.0
    }

    fn attack_speed_delta(&self, _ctx: &EvalContext<'_>) -> i32 {
        0
    }

    fn attack_times_delta(&self, _ctx: &EvalContext<'_>) -> i32 {
        0
    }
}

/// The stack system's provider: every catalog rule owned by one of the
/// battler's active statuses contributes, scaled by its stack count.
#[derive(Clone, Copy)]
pub struct StackModifiers<'a> {
    catalog: &'a StateCatalog,
}

impl<'a> StackModifiers<'a> {
    pub fn new(catalog: &'a StateCatalog) -> Self {
        Self { catalog }
    }

    /// Sum `trunc(value × stack)` over the rules the subject currently
    /// owns. Entries only exist in the ledger while the status is
    /// active, so the stack lookup doubles as the ownership check.
    fn summed<'r>(
        &self,
        ctx: &EvalContext<'_>,
        rules: impl Iterator<Item = (StateId, &'r StackValue)>,
    ) -> f64 {
        let mut total = 0.0;
        for (owner, value) in rules {
            let stack = ctx.actor.stacks.stack_of(owner);
            if stack == 0 {
                continue;
            }
            total += (value.evaluate(ctx) * f64::from(stack)).trunc();
        }
        total
    }

    fn percent<'r>(
        &self,
        ctx: &EvalContext<'_>,
        rules: impl Iterator<Item = (StateId, &'r StackValue)>,
    ) -> f64 {
        self.summed(ctx, rules) / 100.0
    }

    fn idle(&self, ctx: &EvalContext<'_>) -> bool {
        !ctx.actor.has_stack_state(self.catalog)
    }
}

impl StatModifierProvider for StackModifiers<'_> {
    fn element_rate_delta(&self, ctx: &EvalContext<'_>, element: ElementId) -> f64 {
        if self.idle(ctx) {
            return 0.0;
        }
        self.percent(ctx, self.catalog.element_rules(element))
    }

    fn debuff_rate_delta(&self, ctx: &EvalContext<'_>, param: ParamId) -> f64 {
        if self.idle(ctx) {
            return 0.0;
        }
        self.percent(ctx, self.catalog.debuff_rules(param))
    }

    fn state_rate_delta(&self, ctx: &EvalContext<'_>, state: StateId) -> f64 {
        if self.idle(ctx) {
            return 0.0;
        }
        self.percent(ctx, self.catalog.state_rate_rules(state))
    }

    fn param_rate_factor(&self, ctx: &EvalContext<'_>, param: ParamId) -> f64 {
        if self.idle(ctx) {
            return 1.0;
        }
        1.0 + self.percent(ctx, self.catalog.param_rate_rules(param))
    }

    fn param_flat(&self, ctx: &EvalContext<'_>, param: ParamId) -> f64 {
        if self.idle(ctx) {
            return 0.0;
        }
        self.summed(ctx, self.catalog.param_add_rules(param))
    }

    fn xparam_delta(&self, ctx: &EvalContext<'_>, xparam: XParamId) -> f64 {
        if self.idle(ctx) {
            return 0.0;
        }
        self.percent(ctx, self.catalog.xparam_rules(xparam))
    }

    fn sparam_delta(&self, ctx: &EvalContext<'_>, sparam: SParamId) -> f64 {
        if self.idle(ctx) {
            return 0.0;
        }
        self.percent(ctx, self.catalog.sparam_rules(sparam))
    }

    fn attack_states(&self, ctx: &EvalContext<'_>) -> Vec<StateId> {
        if self.idle(ctx) {
            return Vec::new();
        }
        self.catalog
            .attack_state_grants()
            .filter(|(owner, _)| ctx.actor.stacks.stack_of(*owner) > 0)
            .map(|(_, granted)| granted)
            .collect()
    }

    fn attack_state_rate_delta(&self, ctx: &EvalContext<'_>, granted: StateId) -> f64 {
        if self.idle(ctx) {
            return 0.0;
        }
        self.percent(ctx, self.catalog.attack_state_rules(granted))
    }

    fn attack_speed_delta(&self, ctx: &EvalContext<'_>) -> i32 {
        if self.idle(ctx) {
            return 0;
        }
        self.summed(ctx, self.catalog.attack_speed_rules()) as i32
    }

    fn attack_times_delta(&self, ctx: &EvalContext<'_>) -> i32 {
        if self.idle(ctx) {
            return 0;
        }
        self.summed(ctx, self.catalog.attack_times_rules()) as i32
    }
}

/// Folds providers over a battler's native values.
///
/// Rates compose additively across providers; parameter rate factors
/// compose multiplicatively, with flat additions applied afterwards and
/// the result clamped to the configured bounds.
pub struct StatEngine<'a> {
    providers: Vec<&'a dyn StatModifierProvider>,
}

impl<'a> StatEngine<'a> {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: &'a dyn StatModifierProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Final parameter value:
    /// `base × trait rate × buff rate × Π rate factors + Σ flats`,
    /// clamped and rounded exactly once at the end.
    pub fn param(&self, ctx: &EvalContext<'_>, param: ParamId) -> i64 {
        let base = ctx.actor.param_product(param);
        let rate: f64 = self
            .providers
            .iter()
            .map(|p| p.param_rate_factor(ctx, param))
            .product();
        let flat: f64 = self.providers.iter().map(|p| p.param_flat(ctx, param)).sum();
        let bounds = ctx.config.param_bounds(param);
        (base * rate + flat)
            .clamp(bounds.min as f64, bounds.max as f64)
            .round() as i64
    }

    pub fn element_rate(&self, ctx: &EvalContext<'_>, element: ElementId) -> f64 {
        ctx.actor.traits.element_rate(element)
            + self
                .providers
                .iter()
                .map(|p| p.element_rate_delta(ctx, element))
                .sum::<f64>()
    }

    pub fn debuff_rate(&self, ctx: &EvalContext<'_>, param: ParamId) -> f64 {
        ctx.actor.traits.debuff_rates[param.index()]
            + self
                .providers
                .iter()
                .map(|p| p.debuff_rate_delta(ctx, param))
                .sum::<f64>()
    }

    pub fn state_rate(&self, ctx: &EvalContext<'_>, state: StateId) -> f64 {
        ctx.actor.traits.state_rate(state)
            + self
                .providers
                .iter()
                .map(|p| p.state_rate_delta(ctx, state))
                .sum::<f64>()
    }

    pub fn xparam(&self, ctx: &EvalContext<'_>, xparam: XParamId) -> f64 {
        ctx.actor.traits.xparams[xparam.index()]
            + self
                .providers
                .iter()
                .map(|p| p.xparam_delta(ctx, xparam))
                .sum::<f64>()
    }

    pub fn sparam(&self, ctx: &EvalContext<'_>, sparam: SParamId) -> f64 {
        ctx.actor.traits.sparams[sparam.index()]
            + self
                .providers
                .iter()
                .map(|p| p.sparam_delta(ctx, sparam))
                .sum::<f64>()
    }

    /// Statuses a normal attack can apply, with their effective rates:
    /// the union of the battler's base grants and every provider's
    /// additions, deduplicated, with rate deltas summed per status.
    pub fn attack_states(&self, ctx: &EvalContext<'_>) -> Vec<(StateId, f64)> {
        let mut granted: Vec<StateId> = ctx
            .actor
            .traits
            .attack_states
            .iter()
            .map(|(id, _)| *id)
            .collect();
        for provider in &self.providers {
            for id in provider.attack_states(ctx) {
                if !granted.contains(&id) {
                    granted.push(id);
                }
            }
        }
        granted
            .into_iter()
            .map(|id| {
                let base = ctx
                    .actor
                    .traits
                    .attack_states
                    .iter()
                    .find(|(s, _)| *s == id)
                    .map(|(_, rate)| *rate)
                    .unwrap_or(0.0);
                let delta: f64 = self
                    .providers
                    .iter()
                    .map(|p| p.attack_state_rate_delta(ctx, id))
                    .sum();
                (id, base + delta)
            })
            .collect()
    }

    pub fn attack_speed(&self, ctx: &EvalContext<'_>) -> i32 {
        ctx.actor.traits.attack_speed
            + self
                .providers
                .iter()
                .map(|p| p.attack_speed_delta(ctx))
                .sum::<i32>()
    }

    pub fn attack_times(&self, ctx: &EvalContext<'_>) -> i32 {
        ctx.actor.traits.attack_times
            + self
                .providers
                .iter()
                .map(|p| p.attack_times_delta(ctx))
                .sum::<i32>()
    }
}

impl Default for StatEngine<'_> {
    fn default() -> Self {
        Self::new()
    }
}
