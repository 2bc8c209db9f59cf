//! Credit application intake, risk scoring, and the approve/reject decision.
//!
//! The aggregates own the business rules, the scoring module owns the bureau
//! contract and its deterministic fallback, the evaluation module owns the
//! decision policy, and the service ties them together behind the persistence
//! ports. The router is a thin HTTP veneer over the service.

pub mod domain;
pub mod evaluation;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Affiliate, AffiliateId, AffiliateStatus, ApplicationId, ApplicationStatus,
    CreditApplication, InvalidState, RiskEvaluation, RiskEvaluationId, RiskLevel,
    ValidationError, MAX_SCORE, MAX_TERM_MONTHS, MINIMUM_SENIORITY_MONTHS, MIN_SCORE,
    MIN_TERM_MONTHS,
};
pub use evaluation::EvaluationOutcome;
pub use repository::{AffiliateRepository, CreditApplicationRepository, RepositoryError};
pub use router::{credit_router, AffiliateView, ApplicationView, RiskEvaluationView};
pub use scoring::{
    validate_score_request, FallbackRiskScorer, ResilientRiskScorer, RiskScoringService,
    ScoringError,
};
pub use service::{
    CreditApplicationService, CreditServiceError, RegisterAffiliateRequest,
    SubmitApplicationRequest, UpdateAffiliateRequest,
};
