//! Rendering of dashboard views.
//!
//! Supports plain-text sections, JSON serialization, and CSV export of the
//! detailed violation report. Figures are rounded to one decimal here and
//! nowhere else.

use std::fmt::{self, Write as _};
use std::fs::File;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::{Breakdown, LevelDelta, LevelMeans, PeriodSummary};
use crate::analyzers::utility::round1;
use crate::dashboard::{DashboardView, ReportRow};
use crate::periods::month_name;

/// Part of the view to render as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overview,
    Comparison,
    Stations,
    Violations,
    All,
}

/// Serializes any view component as pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn db(value: Option<f64>) -> String {
    value.map_or_else(|| "no data".to_string(), |v| format!("{:.1} dB", round1(v)))
}

fn signed_db(value: f64) -> String {
    format!("{:+.1} dB", round1(value))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "no data".to_string(), |v| format!("{:.1}%", round1(v)))
}

fn month_label(month: u8) -> &'static str {
    month_name(month).unwrap_or("?")
}

fn levels_row(out: &mut String, label: &str, records: usize, levels: &LevelMeans) -> fmt::Result {
    let shown = levels.rounded();
    writeln!(
        out,
        "  {label:<14} {:>5.1} {:>7.1}   ({records} readings)",
        shown.day, shown.night
    )
}

fn period_block(out: &mut String, title: &str, summary: &PeriodSummary) -> fmt::Result {
    writeln!(out, "{title}: {}", summary.months)?;
    if summary.means.is_none() {
        writeln!(out, "  no data")?;
        return Ok(());
    }
    writeln!(out, "  Avg Day Noise    {}", db(summary.means.map(|m| m.day)))?;
    writeln!(out, "  Avg Night Noise  {}", db(summary.means.map(|m| m.night)))?;
    writeln!(out, "  Violations       {}", summary.violations.violating_records)?;
    writeln!(out, "  {:<14} {:>5} {:>7}", "", "Day", "Night")?;
    match &summary.breakdown {
        Breakdown::Month(rows) => {
            for row in rows {
                levels_row(out, month_label(row.key), row.records, &row.levels)?;
            }
        }
        Breakdown::Zone(rows) => {
            for row in rows {
                levels_row(out, &row.key, row.records, &row.levels)?;
            }
        }
    }
    Ok(())
}

fn overview(out: &mut String, view: &DashboardView<'_>) -> fmt::Result {
    let o = &view.overview;
    writeln!(out, "== Current Month Overview: {}, {} ==", view.city, o.month_name)?;
    let delta = |pick: fn(&LevelDelta) -> f64| {
        o.delta
            .as_ref()
            .map(|d| format!(" ({})", signed_db(pick(d))))
            .unwrap_or_default()
    };
    writeln!(
        out,
        "Average Day Noise Level    {}{}",
        db(o.means.map(|m| m.day)),
        delta(|d| d.day)
    )?;
    writeln!(
        out,
        "Average Night Noise Level  {}{}",
        db(o.means.map(|m| m.night)),
        delta(|d| d.night)
    )?;
    writeln!(out, "Violations Percentage      {}", percent(o.violation_rate))?;

    writeln!(out, "\nNoise by zone type:")?;
    for zone in &o.zone_distribution {
        let day: Vec<String> = zone.day.iter().map(|v| format!("{:.1}", round1(*v))).collect();
        let night: Vec<String> = zone.night.iter().map(|v| format!("{:.1}", round1(*v))).collect();
        writeln!(
            out,
            "  {:<14} day [{}] night [{}]",
            zone.zone_type,
            day.join(", "),
            night.join(", ")
        )?;
    }

    writeln!(out, "\nMonthly trend:")?;
    writeln!(out, "  {:<14} {:>5} {:>7}", "", "Day", "Night")?;
    for row in &o.yearly_trend {
        levels_row(out, month_label(row.key), row.records, &row.levels)?;
    }
    Ok(())
}

fn comparison(out: &mut String, view: &DashboardView<'_>) -> fmt::Result {
    let c = &view.comparison;
    writeln!(out, "== Before-During-After Analysis: {} ==", view.city)?;
    period_block(out, "Before Period", &c.before)?;
    period_block(out, "Selected Month", &c.selected)?;
    period_block(out, "After Period", &c.after)?;

    writeln!(out, "\nComparative trend:")?;
    for point in &c.trend {
        let shown = point.levels.rounded();
        writeln!(
            out,
            "  {:<10} {:<8} {:>5.1} {:>7.1}",
            month_label(point.month),
            point.period.to_string(),
            shown.day,
            shown.night
        )?;
    }
    Ok(())
}

fn stations(out: &mut String, view: &DashboardView<'_>) -> fmt::Result {
    writeln!(out, "== Station-wise Noise Levels: {} ==", view.overview.month_name)?;
    if view.stations.is_empty() {
        writeln!(out, "  no data")?;
        return Ok(());
    }
    writeln!(
        out,
        "  {:<28} {:>6} {:>6} {:>9} {:>10}",
        "Station", "Day", "Night", "DayLimit", "NightLimit"
    )?;
    for record in &view.stations {
        writeln!(
            out,
            "  {:<28} {:>6.1} {:>6.1} {:>9.1} {:>10.1}",
            record.name,
            round1(record.day),
            round1(record.night),
            round1(record.day_limit),
            round1(record.night_limit)
        )?;
    }
    Ok(())
}

fn violations(out: &mut String, view: &DashboardView<'_>) -> fmt::Result {
    let v = &view.violations;
    writeln!(out, "== Violation Analysis ==")?;
    writeln!(out, "Day Violations    {}", v.counts.day_violations)?;
    writeln!(out, "Night Violations  {}", v.counts.night_violations)?;
    writeln!(out, "Violation Rate    {}", percent(v.counts.rate()))?;

    writeln!(out, "\nDetailed Violation Report:")?;
    writeln!(
        out,
        "  {:<28} {:<12} {:>6} {:>6} {:>5} {:>5} {:>5}",
        "Name", "Type", "Day", "Night", "DayV", "NgtV", "Total"
    )?;
    for row in &v.report {
        let r = row.violation.record;
        writeln!(
            out,
            "  {:<28} {:<12} {:>6.1} {:>6.1} {:>5} {:>5} {:>5}",
            r.name,
            r.zone_type,
            round1(r.day),
            round1(r.night),
            row.style.day.marker(),
            row.style.night.marker(),
            row.violation.total_violations
        )?;
    }

    let s = &v.summary;
    writeln!(out, "\nSummary Statistics:")?;
    writeln!(out, "  Average Day Level       {}", db(s.avg_day))?;
    writeln!(out, "  Average Night Level     {}", db(s.avg_night))?;
    writeln!(out, "  Maximum Day Level       {}", db(s.max_day))?;
    writeln!(out, "  Maximum Night Level     {}", db(s.max_night))?;
    writeln!(out, "  Total Day Violations    {}", s.total_day_violations)?;
    writeln!(out, "  Total Night Violations  {}", s.total_night_violations)?;
    writeln!(out, "  Overall Violation Rate  {}", percent(s.violation_rate))?;

    writeln!(out, "\nZone-wise Violations:")?;
    for zone in &v.by_zone {
        writeln!(
            out,
            "  {:<14} day {:>3}  night {:>3}  total {:>3}",
            zone.zone_type, zone.day_violations, zone.night_violations, zone.total_violations
        )?;
    }
    Ok(())
}

/// Renders one section (or all of them) as plain text.
pub fn render_text(view: &DashboardView<'_>, section: Section) -> Result<String> {
    const ALL: [Section; 4] = [
        Section::Overview,
        Section::Comparison,
        Section::Stations,
        Section::Violations,
    ];
    let sections = if section == Section::All {
        &ALL[..]
    } else {
        std::slice::from_ref(&section)
    };

    let mut out = String::new();
    for (idx, part) in sections.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        match part {
            Section::Overview => overview(&mut out, view)?,
            Section::Comparison => comparison(&mut out, view)?,
            Section::Stations => stations(&mut out, view)?,
            Section::Violations => violations(&mut out, view)?,
            Section::All => {}
        }
    }
    Ok(out)
}

/// Flat, display-rounded CSV shape of a report row.
#[derive(Debug, Serialize)]
struct ReportCsvRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Type")]
    zone_type: &'a str,
    #[serde(rename = "Day")]
    day: f64,
    #[serde(rename = "Night")]
    night: f64,
    #[serde(rename = "DayLimit")]
    day_limit: f64,
    #[serde(rename = "NightLimit")]
    night_limit: f64,
    #[serde(rename = "Day Violation")]
    day_violation: bool,
    #[serde(rename = "Night Violation")]
    night_violation: bool,
    #[serde(rename = "Total Violations")]
    total_violations: u8,
}

/// Writes the detailed violation report to a CSV file, replacing it.
pub fn write_violation_report(path: &Path, rows: &[ReportRow<'_>]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing violation report");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        let r = row.violation.record;
        writer.serialize(ReportCsvRow {
            name: &r.name,
            zone_type: &r.zone_type,
            day: round1(r.day),
            night: round1(r.night),
            day_limit: round1(r.day_limit),
            night_limit: round1(r.night_limit),
            day_violation: row.violation.day_violation,
            night_violation: row.violation.night_violation,
            total_violations: row.violation.total_violations,
        })?;
    }
    writer.flush()?;

    Ok(())
}
