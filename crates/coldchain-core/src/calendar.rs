//! Labour calendar: day classification and rates per node per date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};
use crate::NodeId;

/// Classification of a working day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DayKind {
    /// A fixed weekday: paid hours track used hours, split into a regular
    /// bucket (up to `fixed_hours`) and an overtime bucket beyond it.
    Fixed {
        fixed_hours: f64,
        regular_rate: f64,
        overtime_rate: f64,
    },
    /// Weekend or holiday: any production incurs at least
    /// `minimum_paid_hours`, all paid at the premium rate.
    NonFixed {
        minimum_paid_hours: f64,
        premium_rate: f64,
    },
}

impl DayKind {
    pub fn is_fixed(&self) -> bool {
        matches!(self, DayKind::Fixed { .. })
    }
}

/// One calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaborDay {
    pub date: NaiveDate,
    pub kind: DayKind,
}

/// Labour calendar keyed by (node, date). Only manufacturing nodes need
/// entries; coverage over the planning horizon is validated up front.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaborCalendar {
    days: BTreeMap<(NodeId, NaiveDate), LaborDay>,
}

impl LaborCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, day: LaborDay) {
        self.days.insert((node, day.date), day);
    }

    pub fn day(&self, node: NodeId, date: NaiveDate) -> Option<&LaborDay> {
        self.days.get(&(node, date))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Fail fast if any manufacturing node lacks an entry for a horizon date.
    pub fn validate_coverage(
        &self,
        manufacturers: &[NodeId],
        dates: &[NaiveDate],
    ) -> PlanResult<()> {
        for &node in manufacturers {
            for &date in dates {
                if !self.days.contains_key(&(node, date)) {
                    return Err(PlanError::input(
                        "calendar",
                        format!("labour calendar missing node {} on {}", node, date),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Convenience: a fixed day with common defaults.
pub fn fixed_day(date: NaiveDate, fixed_hours: f64, regular_rate: f64, overtime_rate: f64) -> LaborDay {
    LaborDay {
        date,
        kind: DayKind::Fixed {
            fixed_hours,
            regular_rate,
            overtime_rate,
        },
    }
}

/// Convenience: a weekend/holiday day.
pub fn non_fixed_day(date: NaiveDate, minimum_paid_hours: f64, premium_rate: f64) -> LaborDay {
    LaborDay {
        date,
        kind: DayKind::NonFixed {
            minimum_paid_hours,
            premium_rate,
        },
    }
}
