use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::types::{
    ComparisonPoint, GroupMean, LevelDelta, LevelMeans, ZoneDistribution,
};
use crate::analyzers::utility::mean;
use crate::loader::JoinedRecord;
use crate::periods::{FIRST_MONTH, ResolvedPeriods};

/// Conjunctive filter over the joined table.
///
/// A record passes when its city equals `city`, its zone type is in
/// `zone_types` and its month is in `months`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub city: String,
    pub zone_types: BTreeSet<String>,
    pub months: BTreeSet<u8>,
}

impl RecordFilter {
    pub fn new<S: Into<String>>(
        city: impl Into<String>,
        zone_types: impl IntoIterator<Item = S>,
        months: impl IntoIterator<Item = u8>,
    ) -> Self {
        Self {
            city: city.into(),
            zone_types: zone_types.into_iter().map(Into::into).collect(),
            months: months.into_iter().collect(),
        }
    }

    /// Same city and zone types, different months.
    pub fn with_months(&self, months: impl IntoIterator<Item = u8>) -> Self {
        Self {
            city: self.city.clone(),
            zone_types: self.zone_types.clone(),
            months: months.into_iter().collect(),
        }
    }

    pub fn matches(&self, record: &JoinedRecord) -> bool {
        record.city == self.city
            && self.zone_types.contains(&record.zone_type)
            && self.months.contains(&record.month)
    }

    /// Matching records in table order.
    pub fn apply<'a>(&self, records: &'a [JoinedRecord]) -> Vec<&'a JoinedRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Mean day and night levels. `None` for an empty set.
pub fn mean_levels(records: &[&JoinedRecord]) -> Option<LevelMeans> {
    let day: Vec<f64> = records.iter().map(|r| r.day).collect();
    let night: Vec<f64> = records.iter().map(|r| r.night).collect();
    Some(LevelMeans {
        day: mean(&day)?,
        night: mean(&night)?,
    })
}

fn group_by<K: Ord + Clone>(
    records: &[&JoinedRecord],
    key: impl Fn(&JoinedRecord) -> K,
) -> Vec<GroupMean<K>> {
    let mut groups: BTreeMap<K, Vec<&JoinedRecord>> = BTreeMap::new();
    for &record in records {
        groups.entry(key(record)).or_default().push(record);
    }

    groups
        .into_iter()
        .filter_map(|(key, members)| {
            mean_levels(&members).map(|levels| GroupMean {
                key,
                records: members.len(),
                levels,
            })
        })
        .collect()
}

/// Mean levels per month, ascending. Months without records are omitted.
pub fn group_by_month(records: &[&JoinedRecord]) -> Vec<GroupMean<u8>> {
    group_by(records, |r| r.month)
}

/// Mean levels per zone type, ascending. Types without records are omitted.
pub fn group_by_zone(records: &[&JoinedRecord]) -> Vec<GroupMean<String>> {
    group_by(records, |r| r.zone_type.clone())
}

/// Mean of `month` minus mean of `month - 1` for the city and zone types of
/// `filter` (its months are ignored).
///
/// `None` for January, or when either month has no matching records.
pub fn month_over_month(
    records: &[JoinedRecord],
    filter: &RecordFilter,
    month: u8,
) -> Option<LevelDelta> {
    if month <= FIRST_MONTH {
        return None;
    }

    let current = mean_levels(&filter.with_months([month]).apply(records))?;
    let previous = mean_levels(&filter.with_months([month - 1]).apply(records))?;

    Some(LevelDelta {
        day: current.day - previous.day,
        night: current.night - previous.night,
    })
}

/// Raw day and night values per zone type, ascending by type.
pub fn zone_distribution(records: &[&JoinedRecord]) -> Vec<ZoneDistribution> {
    let mut zones: BTreeMap<&str, ZoneDistribution> = BTreeMap::new();
    for record in records {
        let zone = zones
            .entry(record.zone_type.as_str())
            .or_insert_with(|| ZoneDistribution {
                zone_type: record.zone_type.clone(),
                day: Vec::new(),
                night: Vec::new(),
            });
        zone.day.push(record.day);
        zone.night.push(record.night);
    }
    zones.into_values().collect()
}

/// Records sorted by day level, loudest first. Ties keep input order.
pub fn station_levels<'a>(records: &[&'a JoinedRecord]) -> Vec<&'a JoinedRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.day.total_cmp(&a.day));
    sorted
}

/// Per-month means over the comparison months, each tagged with its window.
pub fn comparison_trend(
    records: &[JoinedRecord],
    filter: &RecordFilter,
    periods: &ResolvedPeriods,
) -> Vec<ComparisonPoint> {
    let scoped = filter
        .with_months(periods.comparison_months())
        .apply(records);

    group_by_month(&scoped)
        .into_iter()
        .filter_map(|group| {
            periods.period_of(group.key).map(|period| ComparisonPoint {
                month: group.key,
                period,
                levels: group.levels,
            })
        })
        .collect()
}
