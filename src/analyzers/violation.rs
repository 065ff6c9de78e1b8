//! Day/night limit breaches and their roll-ups.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::analyzers::types::{SummaryStatistics, ViolationCounts, ZoneViolations};
use crate::analyzers::utility::{max, mean};
use crate::loader::JoinedRecord;

/// A joined record annotated with its limit breaches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViolationRecord<'a> {
    #[serde(flatten)]
    pub record: &'a JoinedRecord,
    pub day_violation: bool,
    pub night_violation: bool,
    pub total_violations: u8,
}

impl<'a> ViolationRecord<'a> {
    /// Limits are inclusive: a level equal to its limit is compliant.
    pub fn classify(record: &'a JoinedRecord) -> Self {
        let day_violation = record.day > record.day_limit;
        let night_violation = record.night > record.night_limit;
        Self {
            record,
            day_violation,
            night_violation,
            total_violations: u8::from(day_violation) + u8::from(night_violation),
        }
    }

    pub fn is_violating(&self) -> bool {
        self.day_violation || self.night_violation
    }
}

/// Classifies every record, keeping input order.
pub fn classify_all<'a>(records: &[&'a JoinedRecord]) -> Vec<ViolationRecord<'a>> {
    records.iter().map(|&r| ViolationRecord::classify(r)).collect()
}

/// Event and record counts over a classified set.
pub fn count(violations: &[ViolationRecord<'_>]) -> ViolationCounts {
    violations
        .iter()
        .fold(ViolationCounts::default(), |mut counts, v| {
            counts.records += 1;
            counts.day_violations += usize::from(v.day_violation);
            counts.night_violations += usize::from(v.night_violation);
            counts.violating_records += usize::from(v.is_violating());
            counts
        })
}

/// Violation sums per zone type, ascending by type.
pub fn by_zone(violations: &[ViolationRecord<'_>]) -> Vec<ZoneViolations> {
    let mut zones: BTreeMap<&str, ZoneViolations> = BTreeMap::new();
    for v in violations {
        let zone = zones
            .entry(v.record.zone_type.as_str())
            .or_insert_with(|| ZoneViolations {
                zone_type: v.record.zone_type.clone(),
                day_violations: 0,
                night_violations: 0,
                total_violations: 0,
            });
        zone.day_violations += usize::from(v.day_violation);
        zone.night_violations += usize::from(v.night_violation);
        zone.total_violations += usize::from(v.total_violations);
    }
    zones.into_values().collect()
}

/// Detailed report order: most violations first, ties in input order.
pub fn report<'a>(violations: &[ViolationRecord<'a>]) -> Vec<ViolationRecord<'a>> {
    let mut rows = violations.to_vec();
    rows.sort_by(|a, b| b.total_violations.cmp(&a.total_violations));
    rows
}

/// Averages, maxima and violation totals of a classified set.
pub fn summary(violations: &[ViolationRecord<'_>]) -> SummaryStatistics {
    let day: Vec<f64> = violations.iter().map(|v| v.record.day).collect();
    let night: Vec<f64> = violations.iter().map(|v| v.record.night).collect();
    let counts = count(violations);

    SummaryStatistics {
        avg_day: mean(&day),
        avg_night: mean(&night),
        max_day: max(&day),
        max_night: max(&night),
        total_day_violations: counts.day_violations,
        total_night_violations: counts.night_violations,
        violation_rate: counts.rate(),
    }
}
