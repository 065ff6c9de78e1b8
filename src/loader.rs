//! CSV loader for station metadata and monthly readings.
//!
//! Both tables are read with `csv` + `serde`, validated for their required
//! columns, and inner-joined on `Station` into a [`Dataset`]. Paths ending in
//! `.gz` are decompressed on the fly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};
use crate::periods::month_name;

pub const STATIONS_FILE: &str = "stations.csv";
pub const READINGS_FILE: &str = "station_month.csv";

const STATION_COLUMNS: &[&str] = &["Station", "Name", "Type", "City", "DayLimit", "NightLimit"];
const READING_COLUMNS: &[&str] = &["Station", "Month", "Day", "Night"];

/// A monitoring station row from `stations.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Station {
    pub station: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub zone_type: String,
    pub city: String,
    pub day_limit: f64,
    pub night_limit: f64,
}

/// A monthly reading row from `station_month.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reading {
    pub station: String,
    pub month: u8,
    pub day: f64,
    pub night: f64,
}

/// A reading enriched with the attributes of its station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub station: String,
    pub name: String,
    pub zone_type: String,
    pub city: String,
    pub day_limit: f64,
    pub night_limit: f64,
    pub month: u8,
    pub month_name: &'static str,
    pub day: f64,
    pub night: f64,
}

/// A `(Station, Month)` key that appeared more than once in the readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateReading {
    pub station: String,
    pub month: u8,
    pub occurrences: usize,
}

/// The joined table. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<JoinedRecord>,
    duplicate_readings: Vec<DuplicateReading>,
}

impl Dataset {
    /// Inner-joins readings with stations on `Station`.
    ///
    /// Output rows follow the order of `readings`; a reading whose station
    /// id appears on several station rows yields one row per match.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::DataUnavailable`] if a reading carries a
    /// month outside `1..=12`.
    pub fn join(stations: Vec<Station>, readings: Vec<Reading>) -> Result<Self> {
        let mut by_id: HashMap<&str, Vec<&Station>> = HashMap::new();
        for station in &stations {
            by_id.entry(station.station.as_str()).or_default().push(station);
        }

        let mut key_counts: HashMap<(&str, u8), usize> = HashMap::new();
        let mut records = Vec::with_capacity(readings.len());
        let mut unmatched = 0usize;

        for reading in &readings {
            let month_label = month_name(reading.month).ok_or_else(|| {
                DashboardError::data_unavailable(format!(
                    "{READINGS_FILE}: station '{}' has month {} outside 1..=12",
                    reading.station, reading.month
                ))
            })?;

            *key_counts
                .entry((reading.station.as_str(), reading.month))
                .or_default() += 1;

            let Some(matches) = by_id.get(reading.station.as_str()) else {
                unmatched += 1;
                continue;
            };

            for station in matches {
                records.push(JoinedRecord {
                    station: station.station.clone(),
                    name: station.name.clone(),
                    zone_type: station.zone_type.clone(),
                    city: station.city.clone(),
                    day_limit: station.day_limit,
                    night_limit: station.night_limit,
                    month: reading.month,
                    month_name: month_label,
                    day: reading.day,
                    night: reading.night,
                });
            }
        }

        let mut duplicate_readings: Vec<DuplicateReading> = key_counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((station, month), occurrences)| DuplicateReading {
                station: station.to_string(),
                month,
                occurrences,
            })
            .collect();
        duplicate_readings.sort_by(|a, b| (&a.station, a.month).cmp(&(&b.station, b.month)));

        for dup in &duplicate_readings {
            warn!(
                station = %dup.station,
                month = dup.month,
                occurrences = dup.occurrences,
                "Duplicate reading key; every copy is kept in the joined table"
            );
        }

        if unmatched > 0 {
            debug!(unmatched, "Readings without a matching station were dropped");
        }

        Ok(Self {
            records,
            duplicate_readings,
        })
    }

    pub fn records(&self) -> &[JoinedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Readings keys seen more than once, sorted by station then month.
    pub fn duplicate_readings(&self) -> &[DuplicateReading] {
        &self.duplicate_readings
    }

    /// Distinct cities, sorted.
    pub fn cities(&self) -> Vec<String> {
        self.distinct(|r| &r.city)
    }

    /// Distinct zone types, sorted.
    pub fn zone_types(&self) -> Vec<String> {
        self.distinct(|r| &r.zone_type)
    }

    fn distinct(&self, key: impl Fn(&JoinedRecord) -> &String) -> Vec<String> {
        let mut values: Vec<String> = self.records.iter().map(|r| key(r).clone()).collect();
        values.sort();
        values.dedup();
        values
    }
}

/// Loads and joins the two input tables.
///
/// # Errors
///
/// Returns [`DashboardError::DataUnavailable`] if either file cannot be
/// opened, lacks a required column, or holds a malformed row.
#[tracing::instrument(skip_all, fields(stations = %stations_path.display(), readings = %readings_path.display()))]
pub fn load_dataset(stations_path: &Path, readings_path: &Path) -> Result<Dataset> {
    let stations: Vec<Station> = read_table(stations_path, STATION_COLUMNS)?;
    let readings: Vec<Reading> = read_table(readings_path, READING_COLUMNS)?;
    debug!(
        stations = stations.len(),
        readings = readings.len(),
        "Input tables read"
    );

    let dataset = Dataset::join(stations, readings)?;
    info!(
        records = dataset.len(),
        duplicates = dataset.duplicate_readings().len(),
        "Dataset joined"
    );
    Ok(dataset)
}

fn read_table<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>> {
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| {
        DashboardError::data_unavailable(format!("cannot open {source}: {e}"))
    })?;

    let gzipped = path.extension().and_then(|e| e.to_str()) == Some("gz");
    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    read_rows(reader, &source, required)
}

/// Deserializes every row of a CSV stream after checking that all
/// `required` columns are present in its header.
///
/// # Errors
///
/// Returns [`DashboardError::DataUnavailable`] naming `source` on a missing
/// column or an unparsable row.
pub fn read_rows<R: Read, T: DeserializeOwned>(
    reader: R,
    source: &str,
    required: &[&str],
) -> Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::data_unavailable(format!("cannot read {source}: {e}")))?
        .clone();

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::data_unavailable(format!(
            "{source} is missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.deserialize().enumerate() {
        let row: T = result.map_err(|e| {
            DashboardError::data_unavailable(format!("{source}: malformed row {}: {e}", idx + 1))
        })?;
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn station(id: &str, zone_type: &str, city: &str) -> Station {
        Station {
            station: id.to_string(),
            name: format!("{id} name"),
            zone_type: zone_type.to_string(),
            city: city.to_string(),
            day_limit: 55.0,
            night_limit: 45.0,
        }
    }

    fn reading(id: &str, month: u8, day: f64, night: f64) -> Reading {
        Reading {
            station: id.to_string(),
            month,
            day,
            night,
        }
    }

    #[test]
    fn test_join_is_inner() {
        let stations = vec![
            station("S1", "Residential", "Delhi"),
            station("S2", "Commercial", "Delhi"),
            station("S3", "Industrial", "Mumbai"),
        ];
        let readings = vec![
            reading("S1", 1, 50.0, 40.0),
            reading("S9", 1, 70.0, 60.0),
            reading("S2", 2, 60.0, 50.0),
            reading("S1", 2, 52.0, 41.0),
        ];

        let dataset = Dataset::join(stations, readings).unwrap();

        assert_eq!(dataset.len(), 3);
        let ids: Vec<_> = dataset.records().iter().map(|r| r.station.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2", "S1"]);
        assert!(dataset.records().iter().all(|r| r.station != "S3"));
    }

    #[test]
    fn test_join_attaches_station_attributes_and_month_name() {
        let dataset = Dataset::join(
            vec![station("S1", "Silence", "Pune")],
            vec![reading("S1", 12, 48.5, 39.0)],
        )
        .unwrap();

        let record = &dataset.records()[0];
        assert_eq!(record.zone_type, "Silence");
        assert_eq!(record.city, "Pune");
        assert_eq!(record.day_limit, 55.0);
        assert_eq!(record.month_name, "December");
        assert_eq!(record.day, 48.5);
    }

    #[test]
    fn test_join_rejects_month_out_of_range() {
        let result = Dataset::join(
            vec![station("S1", "Silence", "Pune")],
            vec![reading("S1", 13, 48.5, 39.0)],
        );
        assert!(matches!(result, Err(DashboardError::DataUnavailable { .. })));
    }

    #[test]
    fn test_join_flags_duplicate_readings() {
        let dataset = Dataset::join(
            vec![station("S1", "Silence", "Pune")],
            vec![
                reading("S1", 3, 48.0, 39.0),
                reading("S1", 3, 50.0, 41.0),
                reading("S1", 4, 50.0, 41.0),
            ],
        )
        .unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(
            dataset.duplicate_readings(),
            &[DuplicateReading {
                station: "S1".to_string(),
                month: 3,
                occurrences: 2,
            }]
        );
    }

    #[test]
    fn test_distinct_cities_and_types_are_sorted() {
        let dataset = Dataset::join(
            vec![
                station("S1", "Residential", "Mumbai"),
                station("S2", "Commercial", "Delhi"),
                station("S3", "Residential", "Delhi"),
            ],
            vec![
                reading("S1", 1, 50.0, 40.0),
                reading("S2", 1, 50.0, 40.0),
                reading("S3", 1, 50.0, 40.0),
            ],
        )
        .unwrap();

        assert_eq!(dataset.cities(), vec!["Delhi", "Mumbai"]);
        assert_eq!(dataset.zone_types(), vec!["Commercial", "Residential"]);
    }

    #[test]
    fn test_read_rows_reports_missing_columns() {
        let csv = "Station,Month,Day\nS1,1,50.0\n";
        let result: Result<Vec<Reading>> =
            read_rows(csv.as_bytes(), READINGS_FILE, READING_COLUMNS);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Night"));
    }

    #[test]
    fn test_read_rows_ignores_extra_columns_and_order() {
        let csv = "Night,Extra,Day,Month,Station\n40.5,x,55.0,2,S1\n";
        let rows: Vec<Reading> = read_rows(csv.as_bytes(), READINGS_FILE, READING_COLUMNS).unwrap();
        assert_eq!(rows, vec![reading("S1", 2, 55.0, 40.5)]);
    }

    #[test]
    fn test_read_rows_rejects_malformed_value() {
        let csv = "Station,Month,Day,Night\nS1,1,loud,40\n";
        let result: Result<Vec<Reading>> =
            read_rows(csv.as_bytes(), READINGS_FILE, READING_COLUMNS);
        assert!(matches!(result, Err(DashboardError::DataUnavailable { .. })));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dataset(
            &dir.path().join(STATIONS_FILE),
            &dir.path().join(READINGS_FILE),
        );
        assert!(matches!(result, Err(DashboardError::DataUnavailable { .. })));
    }

    #[test]
    fn test_load_dataset_reads_gzip_input() {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let dir = tempfile::tempdir().unwrap();
        let stations_path = dir.path().join(STATIONS_FILE);
        std::fs::write(
            &stations_path,
            "Station,Name,Type,City,DayLimit,NightLimit\nS1,Anand Vihar,Commercial,Delhi,65,55\n",
        )
        .unwrap();

        let readings_path = dir.path().join("station_month.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(b"Station,Month,Day,Night\nS1,5,70.2,60.1\n")
            .unwrap();
        std::fs::write(&readings_path, encoder.finish().unwrap()).unwrap();

        let dataset = load_dataset(&stations_path, &readings_path).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].month_name, "May");
    }
}
