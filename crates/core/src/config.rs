//! Engine configuration constants and tunable parameters.

use crate::battler::ParamId;

/// Clamp bounds for one base parameter.
///
/// Every parameter query, stacked or not, is clamped to the same bounds,
/// so stack modifiers can never push a value outside the range the host
/// would allow on its unmodified path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamBounds {
    pub min: i64,
    pub max: i64,
}

impl ParamBounds {
    /// Max HP bounds. A battler's maximum HP never drops below 1.
    pub const MAX_HP: Self = Self { min: 1, max: 999_999 };

    /// Max MP bounds. Zero is a legal maximum (pure physical battlers).
    pub const MAX_MP: Self = Self { min: 0, max: 9_999 };

    /// Bounds for the six combat parameters (atk, def, mat, mdf, agi, luk).
    pub const COMBAT: Self = Self { min: 1, max: 9_999 };
}

/// Engine configuration constants and per-parameter clamp bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Clamp bounds indexed by [`ParamId::index`].
    pub param_bounds: [ParamBounds; 8],
}

impl EngineConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of simultaneously active status effects per battler.
    pub const MAX_STATUS_EFFECTS: usize = 16;

    pub fn new() -> Self {
        Self {
            param_bounds: [
                ParamBounds::MAX_HP,
                ParamBounds::MAX_MP,
                ParamBounds::COMBAT,
                ParamBounds::COMBAT,
                ParamBounds::COMBAT,
                ParamBounds::COMBAT,
                ParamBounds::COMBAT,
                ParamBounds::COMBAT,
            ],
        }
    }

    /// Clamp bounds for the given parameter.
    pub fn param_bounds(&self, param: ParamId) -> ParamBounds {
        self.param_bounds[param.index()]
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
