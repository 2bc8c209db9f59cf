use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RiskEvaluationId, ValidationError};

/// Lowest score a risk bureau can report.
pub const MIN_SCORE: u16 = 300;
/// Highest score a risk bureau can report.
pub const MAX_SCORE: u16 = 950;

const HIGH_RISK_CEILING: u16 = 500;
const MEDIUM_RISK_CEILING: u16 = 700;

/// Three-bucket risk classification derived from a bureau score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Total function from score to level. Fails outside [300, 950].
    pub fn for_score(score: u16) -> Result<Self, ValidationError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange);
        }
        Ok(if score <= HIGH_RISK_CEILING {
            RiskLevel::High
        } else if score <= MEDIUM_RISK_CEILING {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        })
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable record of one risk assessment for a credit application.
///
/// The score and the level are validated for mutual consistency at every
/// construction site, so the pair can never drift apart. Each instance is
/// owned by exactly one application once attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskEvaluation {
    id: Option<RiskEvaluationId>,
    score: u16,
    risk_level: RiskLevel,
    detail: String,
    evaluated_at: DateTime<Utc>,
    approved: bool,
    rejection_reason: Option<String>,
}

impl RiskEvaluation {
    /// Builds an evaluation deriving the risk level from the score. The
    /// evaluation timestamp defaults to now when unspecified.
    pub fn new(
        score: u16,
        detail: impl Into<String>,
        evaluated_at: Option<DateTime<Utc>>,
        approved: bool,
        rejection_reason: Option<String>,
    ) -> Result<Self, ValidationError> {
        let risk_level = RiskLevel::for_score(score)?;
        Self::from_parts(
            None,
            score,
            risk_level,
            detail,
            evaluated_at.unwrap_or_else(Utc::now),
            approved,
            rejection_reason,
        )
    }

    /// Validating constructor over the full field set, including an
    /// explicitly supplied risk level.
    pub fn from_parts(
        id: Option<RiskEvaluationId>,
        score: u16,
        risk_level: RiskLevel,
        detail: impl Into<String>,
        evaluated_at: DateTime<Utc>,
        approved: bool,
        rejection_reason: Option<String>,
    ) -> Result<Self, ValidationError> {
        if RiskLevel::for_score(score)? != risk_level {
            return Err(ValidationError::InconsistentRiskLevel {
                score,
                level: risk_level,
            });
        }
        if evaluated_at > Utc::now() {
            return Err(ValidationError::EvaluationDateInFuture);
        }
        let rejection_reason = rejection_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        if !approved && rejection_reason.is_none() {
            return Err(ValidationError::MissingRejectionReason);
        }

        Ok(Self {
            id,
            score,
            risk_level,
            detail: detail.into(),
            evaluated_at,
            approved,
            rejection_reason,
        })
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_level == RiskLevel::High
    }

    /// LOW and MEDIUM risk are acceptable; only HIGH is not.
    pub fn is_acceptable_risk(&self) -> bool {
        matches!(self.risk_level, RiskLevel::Low | RiskLevel::Medium)
    }

    pub fn id(&self) -> Option<RiskEvaluationId> {
        self.id
    }

    pub fn score(&self) -> u16 {
        self.score
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }
}
