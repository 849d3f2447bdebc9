//! Packaging, shelf-life and conditioning constants.
//!
//! Single source for the physical facts the planner depends on. Anything a
//! deployment might tune (the scale factor, truck capacity) is also
//! overridable through the planning inputs; the values here are the defaults.

/// Units per pallet, the granularity of storage and truck accounting.
pub const UNITS_PER_PALLET: f64 = 320.0;

/// Default pallet capacity of a scheduled truck.
pub const DEFAULT_TRUCK_PALLETS: u32 = 44;

/// Shelf life of ambient stock, in days from state entry.
pub const AMBIENT_SHELF_LIFE_DAYS: i64 = 17;

/// Shelf life of frozen stock, in days from state entry.
pub const FROZEN_SHELF_LIFE_DAYS: i64 = 120;

/// Shelf life of thawed stock. The clock restarts when frozen goods thaw.
pub const THAWED_SHELF_LIFE_DAYS: i64 = 14;

/// Default coefficient scale factor: flows are divided and cost coefficients
/// multiplied by this value before the matrix reaches the solver, keeping the
/// coefficient range near 10^3 instead of 10^8.
pub const DEFAULT_SCALE_FACTOR: f64 = 1000.0;

/// Absolute tolerance for the FEFO mass-balance reconciliation, in units.
pub const MASS_BALANCE_TOLERANCE: f64 = 0.01;

/// Relative tolerance for cross-field cost and production sums in the
/// validated result.
pub const SUM_TOLERANCE: f64 = 0.01;
