use std::path::PathBuf;

use noise_dashboard::analyzers::types::Breakdown;
use noise_dashboard::cache::load_cached;
use noise_dashboard::dashboard::{DashboardParams, render};
use noise_dashboard::error::{DashboardError, PeriodBound};
use noise_dashboard::loader::{Dataset, load_dataset};
use noise_dashboard::output::{Section, render_text, to_json, write_violation_report};
use noise_dashboard::periods::{Period, PeriodBounds};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load_fixtures() -> Dataset {
    load_dataset(&fixture("stations.csv"), &fixture("station_month.csv"))
        .expect("Failed to load fixtures")
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_join_drops_unmatched_rows() {
    let data = load_fixtures();

    // XYZ99 has no station row, CHN01 has no readings.
    assert_eq!(data.len(), 12);
    assert_eq!(data.cities(), vec!["Delhi", "Mumbai"]);
    assert_eq!(data.zone_types(), vec!["Commercial", "Residential", "Silence"]);
    assert!(data.duplicate_readings().is_empty());
    assert_eq!(data.records()[0].station, "DEL01");
    assert_eq!(data.records()[0].month_name, "April");
}

#[test]
fn test_full_pipeline_june() {
    let data = load_fixtures();
    let view = render(&data, &DashboardParams::new("Delhi", 6)).expect("render failed");

    let means = view.overview.means.expect("June has data");
    assert_close(means.day, 172.0 / 3.0);
    assert_close(means.night, 145.0 / 3.0);

    // Against May: day 60, night 50.
    let delta = view.overview.delta.expect("May has data");
    assert_close(delta.day, 172.0 / 3.0 - 60.0);
    assert_close(delta.night, 145.0 / 3.0 - 50.0);

    // DEL01 breaches both, DEL02 night only, DEL03 sits exactly on its limits.
    assert_eq!(view.overview.violation_rate, Some(50.0));
    assert_eq!(view.violations.counts.day_violations, 1);
    assert_eq!(view.violations.counts.night_violations, 2);
    assert_eq!(view.violations.counts.violating_records, 2);

    let order: Vec<&str> = view
        .violations
        .report
        .iter()
        .map(|row| row.violation.record.station.as_str())
        .collect();
    assert_eq!(order, vec!["DEL01", "DEL02", "DEL03"]);

    let loudest: Vec<&str> = view.stations.iter().map(|r| r.station.as_str()).collect();
    assert_eq!(loudest, vec!["DEL01", "DEL02", "DEL03"]);

    let trend: Vec<u8> = view.overview.yearly_trend.iter().map(|g| g.key).collect();
    assert_eq!(trend, vec![4, 5, 6, 7]);
}

#[test]
fn test_default_comparison_windows() {
    let data = load_fixtures();
    let view = render(&data, &DashboardParams::new("Delhi", 6)).expect("render failed");
    let comparison = &view.comparison;

    assert_eq!(comparison.before.months.months(), vec![3, 4, 5]);
    assert_eq!(comparison.after.months.months(), vec![7, 8, 9]);

    let before = comparison.before.means.expect("April and May have data");
    assert_close(before.day, 60.0);
    assert_close(before.night, 50.0);
    assert_eq!(comparison.before.violations.violating_records, 2);
    match &comparison.before.breakdown {
        Breakdown::Month(rows) => {
            let months: Vec<u8> = rows.iter().map(|g| g.key).collect();
            assert_eq!(months, vec![4, 5]);
        }
        other => panic!("expected month breakdown, got {other:?}"),
    }

    let after = comparison.after.means.expect("July has data");
    assert_close(after.day, 56.0);
    assert_close(after.night, 139.0 / 3.0);
    assert_eq!(comparison.after.violations.violating_records, 1);

    let points: Vec<(u8, Period)> = comparison.trend.iter().map(|p| (p.month, p.period)).collect();
    assert_eq!(
        points,
        vec![
            (4, Period::Before),
            (5, Period::Before),
            (6, Period::Selected),
            (7, Period::After),
        ]
    );
}

#[test]
fn test_zone_filter_narrows_every_figure() {
    let data = load_fixtures();
    let params = DashboardParams::new("Delhi", 6).with_zone_types(["Residential"]);
    let view = render(&data, &params).expect("render failed");

    let means = view.overview.means.expect("DEL02 has a June reading");
    assert_close(means.day, 55.0);
    assert_close(means.night, 47.0);
    assert_eq!(view.overview.violation_rate, Some(50.0));
    assert_eq!(view.violations.by_zone.len(), 1);
    assert_eq!(view.violations.by_zone[0].zone_type, "Residential");
}

#[test]
fn test_month_without_data_is_absent() {
    let data = load_fixtures();
    let view = render(&data, &DashboardParams::new("Mumbai", 1)).expect("render failed");

    assert_eq!(view.overview.means, None);
    assert_eq!(view.overview.delta, None);
    assert_eq!(view.overview.violation_rate, None);
    assert!(view.comparison.periods.before.is_empty());
    assert!(view.violations.report.is_empty());
    assert_eq!(view.violations.summary.max_day, None);
}

#[test]
fn test_december_has_no_after_period() {
    let data = load_fixtures();
    let view = render(&data, &DashboardParams::new("Delhi", 12)).expect("render failed");
    assert!(view.comparison.periods.after.is_empty());
    assert_eq!(view.comparison.after.means, None);

    let params = DashboardParams::new("Delhi", 12).with_bounds(PeriodBounds {
        after_start: Some(12),
        ..PeriodBounds::default()
    });
    assert!(matches!(
        render(&data, &params),
        Err(DashboardError::InvalidPeriodBounds {
            bound: PeriodBound::AfterStart,
            ..
        })
    ));
}

#[test]
fn test_out_of_range_bound_is_rejected() {
    let data = load_fixtures();
    let params = DashboardParams::new("Delhi", 6).with_bounds(PeriodBounds {
        after_start: Some(13),
        ..PeriodBounds::default()
    });

    assert!(matches!(
        render(&data, &params),
        Err(DashboardError::InvalidPeriodBounds {
            bound: PeriodBound::AfterStart,
            value: 13,
            ..
        })
    ));
}

#[test]
fn test_cached_load_matches_direct_load() {
    let cached = load_cached(&fixture("stations.csv"), &fixture("station_month.csv"))
        .expect("Failed to load fixtures");
    assert_eq!(cached.records(), load_fixtures().records());
}

#[test]
fn test_missing_readings_file() {
    let err = load_dataset(&fixture("stations.csv"), &fixture("missing.csv")).unwrap_err();
    let message = err.to_string();

    assert!(matches!(err, DashboardError::DataUnavailable { .. }));
    assert!(message.contains("stations.csv"));
    assert!(message.contains("station_month.csv"));
}

#[test]
fn test_outputs() {
    let data = load_fixtures();
    let view = render(&data, &DashboardParams::new("Delhi", 6)).expect("render failed");

    let text = render_text(&view, Section::All).expect("render_text failed");
    assert!(text.contains("Anand Vihar"));
    assert!(text.contains("June"));

    let json: serde_json::Value =
        serde_json::from_str(&to_json(&view).expect("serialize failed")).expect("invalid JSON");
    assert_eq!(json["city"], "Delhi");
    assert_eq!(json["violations"]["report"][0]["station"], "DEL01");

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("violations.csv");
    write_violation_report(&path, &view.violations.report).expect("write failed");

    let mut reader = csv::Reader::from_path(&path).expect("open report");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(&headers[0], "Name");
    assert_eq!(&headers[8], "Total Violations");
    let first = reader.records().next().expect("a row").expect("valid row");
    assert_eq!(&first[0], "Anand Vihar");
    assert_eq!(&first[8], "2");
}
