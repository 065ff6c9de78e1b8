//! Before / selected / after month windows.
//!
//! [`resolve`] turns a selected month plus four optional boundaries into a
//! [`ResolvedPeriods`]. Out-of-domain or mis-ordered bounds are rejected
//! with [`DashboardError::InvalidPeriodBounds`]; nothing is clamped.

use std::fmt;

use chrono::Month;
use serde::Serialize;

use crate::error::{DashboardError, PeriodBound, Result};

pub const FIRST_MONTH: u8 = 1;
pub const LAST_MONTH: u8 = 12;

/// Default width of the before and after windows.
const DEFAULT_SPAN: u8 = 3;

/// Full English month name for `1..=12`.
pub fn month_name(month: u8) -> Option<&'static str> {
    Month::try_from(month).ok().map(|m| m.name())
}

/// An inclusive range of months inside one calendar year. May be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthRange {
    bounds: Option<(u8, u8)>,
}

impl MonthRange {
    pub const fn empty() -> Self {
        Self { bounds: None }
    }

    /// `start..=end`, or empty when `start > end`.
    pub const fn new(start: u8, end: u8) -> Self {
        if start > end {
            Self::empty()
        } else {
            Self {
                bounds: Some((start, end)),
            }
        }
    }

    pub const fn single(month: u8) -> Self {
        Self::new(month, month)
    }

    pub const fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn len(&self) -> usize {
        self.bounds
            .map_or(0, |(start, end)| usize::from(end - start) + 1)
    }

    pub fn contains(&self, month: u8) -> bool {
        self.bounds
            .is_some_and(|(start, end)| (start..=end).contains(&month))
    }

    pub fn months(&self) -> Vec<u8> {
        self.bounds
            .map_or_else(Vec::new, |(start, end)| (start..=end).collect())
    }

    /// "January - March", "June" for a singleton, "None" when empty.
    pub fn label(&self) -> String {
        match self.bounds {
            None => "None".to_string(),
            Some((start, end)) if start == end => month_name(start).unwrap_or("?").to_string(),
            Some((start, end)) => format!(
                "{} - {}",
                month_name(start).unwrap_or("?"),
                month_name(end).unwrap_or("?")
            ),
        }
    }
}

impl fmt::Display for MonthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for MonthRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.months().serialize(serializer)
    }
}

/// Which window a month belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Before,
    Selected,
    After,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "Before"),
            Self::Selected => write!(f, "Selected"),
            Self::After => write!(f, "After"),
        }
    }
}

/// Caller-supplied window boundaries. `None` means "use the default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodBounds {
    pub before_start: Option<u8>,
    pub before_end: Option<u8>,
    pub after_start: Option<u8>,
    pub after_end: Option<u8>,
}

/// The three resolved windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedPeriods {
    pub before: MonthRange,
    pub selected: u8,
    pub after: MonthRange,
}

impl ResolvedPeriods {
    pub fn selected_range(&self) -> MonthRange {
        MonthRange::single(self.selected)
    }

    /// `before ∪ selected ∪ after`, ascending.
    pub fn comparison_months(&self) -> Vec<u8> {
        let mut months = self.before.months();
        months.push(self.selected);
        months.extend(self.after.months());
        months
    }

    pub fn period_of(&self, month: u8) -> Option<Period> {
        if month == self.selected {
            Some(Period::Selected)
        } else if self.before.contains(month) {
            Some(Period::Before)
        } else if self.after.contains(month) {
            Some(Period::After)
        } else {
            None
        }
    }
}

/// Default `(start, end)` of the before window, `None` when `selected` is January.
pub fn default_before(selected: u8) -> Option<(u8, u8)> {
    (selected > FIRST_MONTH).then(|| {
        (
            selected.saturating_sub(DEFAULT_SPAN).max(FIRST_MONTH),
            selected - 1,
        )
    })
}

/// Default `(start, end)` of the after window, `None` when `selected` is December.
pub fn default_after(selected: u8) -> Option<(u8, u8)> {
    (selected < LAST_MONTH).then(|| (selected + 1, (selected + DEFAULT_SPAN).min(LAST_MONTH)))
}

/// Resolves the before/selected/after windows for `selected`.
///
/// # Errors
///
/// Returns [`DashboardError::InvalidPeriodBounds`] when `selected` is not a
/// month, when a bound falls outside its side's domain, when a start comes
/// after its end, or when a bound is given for a side whose domain is empty.
pub fn resolve(selected: u8, bounds: &PeriodBounds) -> Result<ResolvedPeriods> {
    if !(FIRST_MONTH..=LAST_MONTH).contains(&selected) {
        return Err(DashboardError::invalid_bound(
            PeriodBound::SelectedMonth,
            selected,
            format!("must be within {FIRST_MONTH}..={LAST_MONTH}"),
        ));
    }

    let before = resolve_side(
        default_before(selected),
        FIRST_MONTH,
        selected - 1,
        (bounds.before_start, PeriodBound::BeforeStart),
        (bounds.before_end, PeriodBound::BeforeEnd),
    )?;
    let after = resolve_side(
        default_after(selected),
        selected + 1,
        LAST_MONTH,
        (bounds.after_start, PeriodBound::AfterStart),
        (bounds.after_end, PeriodBound::AfterEnd),
    )?;

    Ok(ResolvedPeriods {
        before,
        selected,
        after,
    })
}

fn resolve_side(
    defaults: Option<(u8, u8)>,
    lo: u8,
    hi: u8,
    start: (Option<u8>, PeriodBound),
    end: (Option<u8>, PeriodBound),
) -> Result<MonthRange> {
    let Some((default_start, default_end)) = defaults else {
        // Empty domain: only an omitted bound is acceptable.
        for (value, bound) in [start, end] {
            if let Some(value) = value {
                return Err(DashboardError::invalid_bound(
                    bound,
                    value,
                    "no month is available on this side of the selected month",
                ));
            }
        }
        return Ok(MonthRange::empty());
    };

    let check_domain = |value: u8, bound: PeriodBound| {
        if (lo..=hi).contains(&value) {
            Ok(value)
        } else {
            Err(DashboardError::invalid_bound(
                bound,
                value,
                format!("must be within {lo}..={hi}"),
            ))
        }
    };

    let start_month = check_domain(start.0.unwrap_or(default_start), start.1)?;
    let end_month = check_domain(end.0.unwrap_or(default_end), end.1)?;

    if start_month > end_month {
        return Err(DashboardError::invalid_bound(
            end.1,
            end_month,
            format!("must not precede the start month {start_month}"),
        ));
    }

    Ok(MonthRange::new(start_month, end_month))
}
