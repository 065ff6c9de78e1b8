//! One full recomputation pass for a parameter set.
//!
//! [`render`] is a pure function of the joined table and the parameters; it
//! is invoked afresh whenever a parameter changes.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analyzers::aggregate::{
    RecordFilter, comparison_trend, group_by_month, group_by_zone, mean_levels,
    month_over_month, station_levels, zone_distribution,
};
use crate::analyzers::display::{CellStyle, style};
use crate::analyzers::types::{
    Breakdown, ComparisonPoint, GroupMean, LevelDelta, LevelMeans, PeriodSummary,
    SummaryStatistics, ViolationCounts, ZoneDistribution, ZoneViolations,
};
use crate::analyzers::violation::{ViolationRecord, by_zone, classify_all, count, report, summary};
use crate::error::Result;
use crate::loader::{Dataset, JoinedRecord};
use crate::periods::{
    FIRST_MONTH, LAST_MONTH, MonthRange, Period, PeriodBounds, ResolvedPeriods, month_name,
    resolve,
};

pub const DEFAULT_MONTH: u8 = 6;

/// Everything the user can select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardParams {
    pub city: String,
    pub selected_month: u8,
    /// `None` selects every zone type present in the data.
    pub zone_types: Option<Vec<String>>,
    pub bounds: PeriodBounds,
}

impl DashboardParams {
    pub fn new(city: impl Into<String>, selected_month: u8) -> Self {
        Self {
            city: city.into(),
            selected_month,
            zone_types: None,
            bounds: PeriodBounds::default(),
        }
    }

    pub fn with_zone_types<S: Into<String>>(mut self, zone_types: impl IntoIterator<Item = S>) -> Self {
        self.zone_types = Some(zone_types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_bounds(mut self, bounds: PeriodBounds) -> Self {
        self.bounds = bounds;
        self
    }
}

/// Current-month headline figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub month: u8,
    pub month_name: &'static str,
    pub means: Option<LevelMeans>,
    pub delta: Option<LevelDelta>,
    pub violation_rate: Option<f64>,
    pub zone_distribution: Vec<ZoneDistribution>,
    pub yearly_trend: Vec<GroupMean<u8>>,
}

/// Before / selected / after comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub periods: ResolvedPeriods,
    pub before: PeriodSummary,
    pub selected: PeriodSummary,
    pub after: PeriodSummary,
    pub trend: Vec<ComparisonPoint>,
}

/// A detailed-report row with its display attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportRow<'a> {
    #[serde(flatten)]
    pub violation: ViolationRecord<'a>,
    pub style: CellStyle,
}

/// Selected-month violation analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationAnalysis<'a> {
    pub counts: ViolationCounts,
    pub report: Vec<ReportRow<'a>>,
    pub summary: SummaryStatistics,
    pub by_zone: Vec<ZoneViolations>,
}

/// The full set of outputs for one parameter set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView<'a> {
    pub city: String,
    pub zone_types: Vec<String>,
    pub overview: Overview,
    pub comparison: Comparison,
    pub stations: Vec<&'a JoinedRecord>,
    pub violations: ViolationAnalysis<'a>,
}

/// Computes every dashboard output for `params`.
///
/// # Errors
///
/// Returns [`crate::error::DashboardError::InvalidPeriodBounds`] before any
/// aggregation when the period parameters are invalid.
#[tracing::instrument(skip_all, fields(city = %params.city, month = params.selected_month))]
pub fn render<'a>(dataset: &'a Dataset, params: &DashboardParams) -> Result<DashboardView<'a>> {
    let periods = resolve(params.selected_month, &params.bounds)?;
    let records = dataset.records();

    let zone_types = params
        .zone_types
        .clone()
        .unwrap_or_else(|| dataset.zone_types());
    let base = RecordFilter::new(params.city.as_str(), &zone_types, [periods.selected]);

    if !records.iter().any(|r| r.city == params.city) {
        warn!("City has no records; every figure will be empty");
    }

    let month_rows = base.apply(records);
    debug!(
        records = month_rows.len(),
        before = %periods.before,
        after = %periods.after,
        "Selected month filtered"
    );

    let classified = classify_all(&month_rows);
    let counts = count(&classified);

    let overview = Overview {
        month: periods.selected,
        month_name: month_name(periods.selected).unwrap_or_default(),
        means: mean_levels(&month_rows),
        delta: month_over_month(records, &base, periods.selected),
        violation_rate: counts.rate(),
        zone_distribution: zone_distribution(&month_rows),
        yearly_trend: group_by_month(&base.with_months(FIRST_MONTH..=LAST_MONTH).apply(records)),
    };

    let comparison = Comparison {
        before: summarize(records, &base, Period::Before, periods.before),
        selected: summarize(records, &base, Period::Selected, periods.selected_range()),
        after: summarize(records, &base, Period::After, periods.after),
        trend: comparison_trend(records, &base, &periods),
        periods,
    };

    let ordered = report(&classified);
    let max_total = ordered.first().map_or(0, |row| row.total_violations);
    let violations = ViolationAnalysis {
        counts,
        report: ordered
            .into_iter()
            .map(|violation| ReportRow {
                style: style(&violation, max_total),
                violation,
            })
            .collect(),
        summary: summary(&classified),
        by_zone: by_zone(&classified),
    };

    Ok(DashboardView {
        city: params.city.clone(),
        zone_types,
        overview,
        comparison,
        stations: station_levels(&month_rows),
        violations,
    })
}

/// Means, violating-record count and breakdown of one window.
///
/// The selected month is broken down by zone type, the other windows by month.
pub fn summarize(
    records: &[JoinedRecord],
    filter: &RecordFilter,
    period: Period,
    months: MonthRange,
) -> PeriodSummary {
    let rows = filter.with_months(months.months()).apply(records);
    let breakdown = match period {
        Period::Selected => Breakdown::Zone(group_by_zone(&rows)),
        Period::Before | Period::After => Breakdown::Month(group_by_month(&rows)),
    };

    PeriodSummary {
        period,
        months,
        means: mean_levels(&rows),
        violations: count(&classify_all(&rows)),
        breakdown,
    }
}
