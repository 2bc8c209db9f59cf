//! Risk-scoring port, the deterministic offline fallback, and the resilience
//! wrapper that keeps evaluation available when the bureau is not.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::warn;

use super::domain::{RiskEvaluation, RiskLevel, ValidationError};

/// Error enumeration for scoring failures. `Unavailable` never reaches the
/// orchestrator when the resilient wrapper is in front of the transport.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid scoring request: {0}")]
    InvalidRequest(String),
    #[error("risk bureau unavailable: {0}")]
    Unavailable(String),
    #[error("malformed bureau response: {0}")]
    MalformedResponse(String),
}

/// Port for pricing the risk of a document/amount/term triple.
///
/// For a fixed document the returned score must be deterministic and stable
/// across calls: bureaus price risk per identity, not per request.
#[async_trait]
pub trait RiskScoringService: Send + Sync {
    async fn score(
        &self,
        document: &str,
        requested_amount: Decimal,
        term_months: u32,
    ) -> Result<RiskEvaluation, ScoringError>;
}

/// Fail-fast precondition check shared by every implementation, run before
/// any transport work.
pub fn validate_score_request(
    document: &str,
    requested_amount: Decimal,
    term_months: u32,
) -> Result<(), ScoringError> {
    if document.trim().is_empty() {
        return Err(ScoringError::InvalidRequest(
            "document cannot be empty".to_string(),
        ));
    }
    if requested_amount <= Decimal::ZERO {
        return Err(ScoringError::InvalidRequest(
            "requested amount must be positive".to_string(),
        ));
    }
    if term_months == 0 {
        return Err(ScoringError::InvalidRequest(
            "term must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Pure, reproducible scorer used when the live bureau cannot be reached.
///
/// The score is a function of the document string alone: an FNV-1a hash
/// bucketed so roughly 20% of documents land HIGH, 30% MEDIUM, and 50% LOW.
/// The risk level is always derived from the score, never assigned
/// independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackRiskScorer;

impl FallbackRiskScorer {
    pub fn score_for_document(document: &str) -> u16 {
        let hash = fnv1a64(document);
        match hash % 10 {
            0 | 1 => MIN_HIGH + (hash % 201) as u16,
            2..=4 => MIN_MEDIUM + (hash % 200) as u16,
            _ => MIN_LOW + (hash % 250) as u16,
        }
    }

    fn evaluation_for(document: &str) -> Result<RiskEvaluation, ValidationError> {
        let score = Self::score_for_document(document);
        let level = RiskLevel::for_score(score)?;
        let high = level == RiskLevel::High;
        let detail = match level {
            RiskLevel::High => "High risk history reported for this document (offline assessment)",
            RiskLevel::Medium => "Mixed repayment history (offline assessment)",
            RiskLevel::Low => "Excellent repayment history (offline assessment)",
        };
        RiskEvaluation::new(
            score,
            detail,
            None,
            !high,
            high.then(|| "High risk level from credit bureau".to_string()),
        )
    }
}

const MIN_HIGH: u16 = 300;
const MIN_MEDIUM: u16 = 501;
const MIN_LOW: u16 = 701;

#[async_trait]
impl RiskScoringService for FallbackRiskScorer {
    async fn score(
        &self,
        document: &str,
        requested_amount: Decimal,
        term_months: u32,
    ) -> Result<RiskEvaluation, ScoringError> {
        validate_score_request(document, requested_amount, term_months)?;
        Self::evaluation_for(document.trim())
            .map_err(|err| ScoringError::MalformedResponse(err.to_string()))
    }
}

/// Wraps a live bureau implementation with a bounded timeout and the
/// deterministic fallback, so the orchestrator never branches on transport
/// concerns and evaluation always completes.
pub struct ResilientRiskScorer<P> {
    primary: Option<P>,
    fallback: FallbackRiskScorer,
    timeout: Duration,
}

impl<P> ResilientRiskScorer<P> {
    /// When no primary is configured the scorer runs on the fallback alone.
    pub fn new(primary: Option<P>, timeout: Duration) -> Self {
        Self {
            primary,
            fallback: FallbackRiskScorer,
            timeout,
        }
    }
}

#[async_trait]
impl<P> RiskScoringService for ResilientRiskScorer<P>
where
    P: RiskScoringService,
{
    async fn score(
        &self,
        document: &str,
        requested_amount: Decimal,
        term_months: u32,
    ) -> Result<RiskEvaluation, ScoringError> {
        validate_score_request(document, requested_amount, term_months)?;

        let Some(primary) = &self.primary else {
            return self.fallback.score(document, requested_amount, term_months).await;
        };

        match tokio::time::timeout(
            self.timeout,
            primary.score(document, requested_amount, term_months),
        )
        .await
        {
            Ok(Ok(evaluation)) => Ok(evaluation),
            Ok(Err(ScoringError::InvalidRequest(message))) => {
                Err(ScoringError::InvalidRequest(message))
            }
            Ok(Err(err)) => {
                warn!(%err, document, "risk bureau call failed, using deterministic fallback");
                self.fallback.score(document, requested_amount, term_months).await
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    document, "risk bureau call timed out, using deterministic fallback"
                );
                self.fallback.score(document, requested_amount, term_months).await
            }
        }
    }
}

fn fnv1a64(input: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    input
        .bytes()
        .fold(OFFSET_BASIS, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}
