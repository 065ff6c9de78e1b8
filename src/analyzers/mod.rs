//! Noise aggregation and limit-violation analysis.
//!
//! This module filters the joined table by city, zone type and month,
//! computes mean levels and their groupings, classifies day/night limit
//! breaches, and derives the styling used by the violation report.

pub mod aggregate;
pub mod display;
pub mod types;
pub mod utility;
pub mod violation;
