//! Coefficient scaling for numerical conditioning.
//!
//! Every flow-carrying variable and right-hand side is divided by a single
//! scale factor before reaching the solver; cost coefficients are multiplied
//! by it so total cost is unchanged. Integer variables (mix counts, pallet
//! counts, binaries) stay in their natural units. The factor is the only
//! tunable: doubling it halves every flow coefficient and doubles every cost
//! coefficient without moving any decision.

use coldchain_core::constants::UNITS_PER_PALLET;
use coldchain_core::{PlanError, PlanResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    pub fn new(factor: f64) -> PlanResult<Self> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(PlanError::input(
                "scale_factor",
                format!("scale factor must be positive and finite, got {}", factor),
            ));
        }
        Ok(Self(factor))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Physical units -> solver units.
    #[inline]
    pub fn flow(&self, units: f64) -> f64 {
        units / self.0
    }

    /// Solver units -> physical units.
    #[inline]
    pub fn unscale(&self, value: f64) -> f64 {
        value * self.0
    }

    /// Per-unit cost -> per-solver-unit cost.
    #[inline]
    pub fn cost(&self, per_unit: f64) -> f64 {
        per_unit * self.0
    }

    /// Pallet conversion in solver units (320 / S).
    #[inline]
    pub fn units_per_pallet(&self) -> f64 {
        UNITS_PER_PALLET / self.0
    }
}

impl Default for ScaleFactor {
    fn default() -> Self {
        Self(coldchain_core::constants::DEFAULT_SCALE_FACTOR)
    }
}
