//! Error types shared by the loader, the period resolver and the dashboard pipeline.

use std::fmt;

use thiserror::Error;

/// The period boundary that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodBound {
    SelectedMonth,
    BeforeStart,
    BeforeEnd,
    AfterStart,
    AfterEnd,
}

impl fmt::Display for PeriodBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectedMonth => write!(f, "selected month"),
            Self::BeforeStart => write!(f, "before-period start"),
            Self::BeforeEnd => write!(f, "before-period end"),
            Self::AfterStart => write!(f, "after-period start"),
            Self::AfterEnd => write!(f, "after-period end"),
        }
    }
}

/// Errors produced while loading data or resolving dashboard parameters.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// One or both input tables are missing, unreadable or malformed.
    #[error(
        "data unavailable: {reason}. Both stations.csv and station_month.csv must be present and well-formed"
    )]
    DataUnavailable { reason: String },

    /// A period boundary violates its domain or ordering constraint.
    #[error("invalid {bound} ({value}): {constraint}")]
    InvalidPeriodBounds {
        bound: PeriodBound,
        value: u8,
        constraint: String,
    },
}

impl DashboardError {
    pub(crate) fn data_unavailable(reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_bound(
        bound: PeriodBound,
        value: u8,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidPeriodBounds {
            bound,
            value,
            constraint: constraint.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
