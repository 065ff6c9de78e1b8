//! Result types produced by the aggregation and violation passes.
//!
//! Every value here is full precision; rounding to one decimal happens in
//! [`crate::output`] only.

use serde::Serialize;

use crate::analyzers::utility::{pct, round1};
use crate::periods::{MonthRange, Period};

/// Mean day and night levels of a non-empty record set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelMeans {
    pub day: f64,
    pub night: f64,
}

impl LevelMeans {
    /// Copy rounded to one decimal, for display.
    pub fn rounded(&self) -> Self {
        Self {
            day: round1(self.day),
            night: round1(self.night),
        }
    }
}

/// Change of the mean levels from the previous month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelDelta {
    pub day: f64,
    pub night: f64,
}

/// One row of a grouped mean table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean<K> {
    pub key: K,
    pub records: usize,
    pub levels: LevelMeans,
}

/// Day and night values of one zone type, the input of a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneDistribution {
    pub zone_type: String,
    pub day: Vec<f64>,
    pub night: Vec<f64>,
}

/// Counts behind both violation statistics.
///
/// `day_violations + night_violations` counts events (a record can add two),
/// while `violating_records` counts records breaching at least one limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViolationCounts {
    pub records: usize,
    pub day_violations: usize,
    pub night_violations: usize,
    pub violating_records: usize,
}

impl ViolationCounts {
    /// Violation events over `2 × records`, as a percentage. `None` with no records.
    pub fn rate(&self) -> Option<f64> {
        pct(self.day_violations + self.night_violations, self.records * 2)
    }
}

/// Violation sums of one zone type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneViolations {
    pub zone_type: String,
    pub day_violations: usize,
    pub night_violations: usize,
    pub total_violations: usize,
}

/// Headline figures over a record set. Levels are absent for an empty set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub avg_day: Option<f64>,
    pub avg_night: Option<f64>,
    pub max_day: Option<f64>,
    pub max_night: Option<f64>,
    pub total_day_violations: usize,
    pub total_night_violations: usize,
    pub violation_rate: Option<f64>,
}

/// Per-period table shown under a before/selected/after summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "by", content = "rows", rename_all = "snake_case")]
pub enum Breakdown {
    Month(Vec<GroupMean<u8>>),
    Zone(Vec<GroupMean<String>>),
}

impl Breakdown {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Month(rows) => rows.is_empty(),
            Self::Zone(rows) => rows.is_empty(),
        }
    }
}

/// Summary of one comparison window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub months: MonthRange,
    pub means: Option<LevelMeans>,
    pub violations: ViolationCounts,
    pub breakdown: Breakdown,
}

/// One point of the comparison trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComparisonPoint {
    pub month: u8,
    pub period: Period,
    pub levels: LevelMeans,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_counts_events_over_twice_the_records() {
        let counts = ViolationCounts {
            records: 2,
            day_violations: 1,
            night_violations: 1,
            violating_records: 1,
        };
        assert_eq!(counts.rate(), Some(50.0));
    }

    #[test]
    fn test_rate_absent_without_records() {
        assert_eq!(ViolationCounts::default().rate(), None);
    }

    #[test]
    fn test_level_means_rounded() {
        let means = LevelMeans {
            day: 61.26,
            night: 50.04,
        };
        assert_eq!(
            means.rounded(),
            LevelMeans {
                day: 61.3,
                night: 50.0
            }
        );
    }
}
