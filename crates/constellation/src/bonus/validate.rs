//! Sanity checks on a finished bonus result.

use serde::Serialize;
use thiserror::Error;

use super::BonusResult;

/// Multipliers above this are suspicious but allowed.
pub const SANITY_BOUND: f64 = 1000.0;
const NEUTRAL_EPS: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Error, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("multiplier {value} is below 1")]
    BelowOne { value: f64 },
    #[error("multiplier is not finite")]
    NonFinite,
    #[error("multiplier is neutral despite {contributions} contributing nodes")]
    Neutral { contributions: usize },
    #[error("multiplier {value} exceeds the sanity bound {bound}")]
    Excessive { value: f64, bound: f64 },
}

/// Errors are hard failures; warnings are advisory.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BonusValidation {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl BonusValidation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub fn validate(result: &BonusResult) -> BonusValidation {
    let mut v = BonusValidation::default();
    let m = result.multiplier;
    if !m.is_finite() {
        v.errors.push(ValidationIssue::NonFinite);
        return v;
    }
    if m < 1.0 {
        v.errors.push(ValidationIssue::BelowOne { value: m });
    }
    if (m - 1.0).abs() < NEUTRAL_EPS && !result.contributions.is_empty() {
        v.warnings.push(ValidationIssue::Neutral {
            contributions: result.contributions.len(),
        });
    }
    if m > SANITY_BOUND {
        v.warnings.push(ValidationIssue::Excessive {
            value: m,
            bound: SANITY_BOUND,
        });
    }
    v
}
