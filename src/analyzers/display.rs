//! Display attributes for the detailed violation report.
//!
//! Pure functions of a [`ViolationRecord`]; nothing here feeds back into the
//! computed figures.

use serde::Serialize;

use crate::analyzers::violation::ViolationRecord;

/// Tone of a boolean violation cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Violation,
    Compliant,
}

impl Tone {
    pub fn from_flag(violated: bool) -> Self {
        if violated { Self::Violation } else { Self::Compliant }
    }

    /// Short marker used by the text renderer.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Violation => "YES",
            Self::Compliant => "no",
        }
    }
}

/// Styling of one report row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellStyle {
    pub day: Tone,
    pub night: Tone,
    /// Shade of the total column in `0.0..=1.0`.
    pub total_shade: f64,
}

/// Shade of a total relative to the largest total in the report.
///
/// | total / max | shade |
/// |-------------|-------|
/// | max == 0    | 0.0   |
/// | otherwise   | ratio |
pub fn shade(total: u8, max_total: u8) -> f64 {
    match max_total {
        0 => 0.0,
        max => f64::from(total.min(max)) / f64::from(max),
    }
}

pub fn style(row: &ViolationRecord<'_>, max_total: u8) -> CellStyle {
    CellStyle {
        day: Tone::from_flag(row.day_violation),
        night: Tone::from_flag(row.night_violation),
        total_shade: shade(row.total_violations, max_total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::JoinedRecord;

    #[test]
    fn test_shade_boundaries() {
        assert_eq!(shade(0, 0), 0.0);
        assert_eq!(shade(0, 2), 0.0);
        assert_eq!(shade(1, 2), 0.5);
        assert_eq!(shade(2, 2), 1.0);
        assert_eq!(shade(1, 1), 1.0);
    }

    #[test]
    fn test_style_follows_flags() {
        let record = JoinedRecord {
            station: "S1".to_string(),
            name: "Connaught Place".to_string(),
            zone_type: "Commercial".to_string(),
            city: "Delhi".to_string(),
            day_limit: 65.0,
            night_limit: 55.0,
            month: 6,
            month_name: "June",
            day: 66.0,
            night: 50.0,
        };
        let row = ViolationRecord::classify(&record);
        let attrs = style(&row, 2);

        assert_eq!(attrs.day, Tone::Violation);
        assert_eq!(attrs.night, Tone::Compliant);
        assert_eq!(attrs.total_shade, 0.5);
        assert_eq!(attrs.day.marker(), "YES");
    }
}
