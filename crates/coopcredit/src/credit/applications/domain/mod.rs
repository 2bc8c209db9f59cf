//! Domain aggregates for cooperative credit decisioning.
//!
//! Every aggregate is an immutable value type produced by a validating
//! constructor. Invalid attribute combinations fail construction with a
//! [`ValidationError`]; a half-built instance is never observable. Updates
//! replace the whole instance instead of mutating in place.

mod affiliate;
mod application;
mod risk;

pub use affiliate::{Affiliate, AffiliateStatus, MINIMUM_SENIORITY_MONTHS};
pub use application::{
    ApplicationStatus, CreditApplication, MAX_TERM_MONTHS, MIN_TERM_MONTHS,
};
pub use risk::{RiskEvaluation, RiskLevel, MAX_SCORE, MIN_SCORE};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier wrapper for persisted affiliates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AffiliateId(pub i64);

/// Identifier wrapper for persisted credit applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub i64);

/// Identifier wrapper for persisted risk evaluations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RiskEvaluationId(pub i64);

impl fmt::Display for AffiliateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RiskEvaluationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raised when a constructor receives malformed or out-of-range input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("document cannot be empty")]
    EmptyDocument,
    #[error("name cannot be empty")]
    EmptyName,
    #[error("salary must be greater than zero")]
    NonPositiveSalary,
    #[error("affiliation date cannot be in the future")]
    AffiliationDateInFuture,
    #[error("affiliate must be ACTIVE to apply for credit")]
    InactiveAffiliate,
    #[error("requested amount must be greater than zero")]
    NonPositiveAmount,
    #[error("term must be between {MIN_TERM_MONTHS} and {MAX_TERM_MONTHS} months")]
    TermOutOfRange,
    #[error("interest rate must be between 0 and 100 percent")]
    RateOutOfRange,
    #[error("application date cannot be in the future")]
    ApplicationDateInFuture,
    #[error("decision reason required for non-pending applications")]
    MissingDecisionReason,
    #[error("score must be between {MIN_SCORE} and {MAX_SCORE}")]
    ScoreOutOfRange,
    #[error("score {score} does not match risk level {level}")]
    InconsistentRiskLevel { score: u16, level: RiskLevel },
    #[error("rejection reason must be provided when not approved")]
    MissingRejectionReason,
    #[error("evaluation date cannot be in the future")]
    EvaluationDateInFuture,
}

/// Raised when an operation is requested on an aggregate outside the state
/// the operation requires.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidState(pub String);

/// Whole calendar months between two dates, truncating partial months.
///
/// Jan 31 to Mar 1 counts one month; Jan 31 to Feb 28 counts zero.
pub(crate) fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let mut months =
        (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32);
    if end.day() < start.day() {
        months -= 1;
    }
    months
}
