//! # coldchain-core: Supply-Chain Planning Data Model
//!
//! Provides the fundamental data structures for planning production and
//! distribution of perishable goods over a hub-and-spoke network.
//!
//! ## Design Philosophy
//!
//! The distribution network is modeled as a **directed multigraph** where:
//! - **Nodes**: plants, frozen buffers, regional hubs, demand spokes
//! - **Edges**: transport legs (ambient or frozen mode, with transit days)
//!
//! Nodes are described by *capabilities* rather than fixed roles: a node may
//! simultaneously produce, store, and serve demand. Which inventory states a
//! node owns (ambient / frozen / thawed) is derived from its capability set,
//! and every downstream component (index builder, constraint builder, FEFO
//! allocator) keys off that derivation.
//!
//! ## ID System
//!
//! Every element has a unique ID (newtype wrapper around `usize`):
//! - **Node IDs**: plant, buffer, hub and spoke nodes
//! - **Product IDs**: canonical SKUs after alias resolution
//! - **Route IDs**: leg sequences between a fixed origin/destination pair
//! - **Truck IDs**: scheduled vehicles
//! - **Batch IDs**: FEFO batch records (allocated by the model crate)
//!
//! IDs enable type safety (a truck id cannot be confused with a node id) and
//! stable references without lifetimes: routes and trucks hold `NodeId`s and
//! are resolved against the node table, never by pointer.
//!
//! ## Modules
//!
//! - [`constants`] - Packaging, shelf-life and scaling constants
//! - [`network`] - Nodes, legs, routes, trucks and the network container
//! - [`calendar`] - Labour calendar (fixed vs non-fixed days, rates)
//! - [`costs`] - Cost structure consumed by the objective builder
//! - [`forecast`] - Demand forecast and initial inventory snapshot
//! - [`dataset`] - The full typed planning dataset handed to the model crate
//! - [`error`] - Unified error taxonomy ([`PlanError`])

use serde::{Deserialize, Serialize};

pub mod calendar;
pub mod constants;
pub mod costs;
pub mod dataset;
pub mod error;
pub mod forecast;
pub mod network;

pub use calendar::{DayKind, LaborCalendar, LaborDay};
pub use costs::{CostStructure, HoldingRates};
pub use dataset::{PlanningHorizon, PlanningInput, ProductSpec};
pub use error::{PlanError, PlanResult};
pub use forecast::{ForecastEntry, InventoryEntry};
pub use network::{
    Capability, Leg, ManufacturingData, Network, NodeSpec, Route, TransportMode, Truck,
};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TruckId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(usize);

macro_rules! impl_id {
    ($type:ty) => {
        impl $type {
            #[inline]
            pub fn new(value: usize) -> Self {
                Self(value)
            }

            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_id!(NodeId);
impl_id!(ProductId);
impl_id!(RouteId);
impl_id!(TruckId);
impl_id!(BatchId);

/// Physical state of inventory. Each state carries its own shelf life;
/// transitions between states reset the shelf-life clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StorageState {
    Ambient,
    Frozen,
    Thawed,
}

impl StorageState {
    /// Shelf life in days for goods held in this state.
    pub fn shelf_life_days(&self) -> i64 {
        match self {
            StorageState::Ambient => constants::AMBIENT_SHELF_LIFE_DAYS,
            StorageState::Frozen => constants::FROZEN_SHELF_LIFE_DAYS,
            StorageState::Thawed => constants::THAWED_SHELF_LIFE_DAYS,
        }
    }

    /// Whether demand can be satisfied directly from this state.
    /// Frozen stock must thaw before consumption.
    pub fn consumable(&self) -> bool {
        matches!(self, StorageState::Ambient | StorageState::Thawed)
    }
}

impl std::fmt::Display for StorageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StorageState::Ambient => "ambient",
            StorageState::Frozen => "frozen",
            StorageState::Thawed => "thawed",
        };
        write!(f, "{}", s)
    }
}
