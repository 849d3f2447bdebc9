//! Cost structure consumed by the objective builder.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{RouteId, StorageState};

/// Holding rates per pallet per day, by storage state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HoldingRates {
    pub ambient: f64,
    pub frozen: f64,
    pub thawed: f64,
}

impl HoldingRates {
    pub fn rate(&self, state: StorageState) -> f64 {
        match state {
            StorageState::Ambient => self.ambient,
            StorageState::Frozen => self.frozen,
            StorageState::Thawed => self.thawed,
        }
    }
}

/// All unit costs the plan is scored against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostStructure {
    /// Per-unit transport rate per route.
    pub transport_rates: HashMap<RouteId, f64>,
    /// Per-pallet-day holding rates by state.
    pub holding: HoldingRates,
    /// Fixed cost per product production-start (changeover indicator).
    pub changeover_cost: f64,
    /// Penalty per unit of unmet demand.
    pub shortage_penalty: f64,
    /// Optional fixed charge the first day a pallet appears in storage.
    pub pallet_entry_charge: Option<f64>,
    /// Per-unit disposal cost. Defaults to zero: disposal is the
    /// pressure-relief channel for aged stock, and expired units must exit
    /// through it whatever it costs. A policy layer may raise it here to
    /// discourage plans that accept aged intake.
    pub disposal_cost: f64,
}

impl CostStructure {
    pub fn transport_rate(&self, route: RouteId) -> f64 {
        self.transport_rates.get(&route).copied().unwrap_or(0.0)
    }
}
