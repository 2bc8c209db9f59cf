mod policy;

pub(crate) use policy::decide;
pub use policy::ratio_as_percent;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{ApplicationId, ApplicationStatus, CreditApplication, RiskLevel};

/// Full decision output of one evaluation, ready for callers such as an HTTP
/// layer: every value is already computed by the aggregates and the policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationOutcome {
    pub application_id: Option<ApplicationId>,
    pub affiliate_document: String,
    pub affiliate_name: String,
    pub requested_amount: Decimal,
    pub term_months: u32,
    pub monthly_payment: Decimal,
    pub status: ApplicationStatus,
    pub approved: bool,
    pub reason: String,
    pub risk_score: u16,
    pub risk_level: RiskLevel,
    pub risk_detail: String,
    pub payment_to_income_ratio: Decimal,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationOutcome {
    /// Projects a decided application into the outcome view. Returns `None`
    /// while the application is still undecided or carries no risk
    /// evaluation.
    pub fn from_application(application: &CreditApplication) -> Option<Self> {
        let evaluation = application.risk_evaluation()?;
        let reason = application.decision_reason()?;
        Some(Self {
            application_id: application.id(),
            affiliate_document: application.affiliate().document().to_string(),
            affiliate_name: application.affiliate().name().to_string(),
            requested_amount: application.requested_amount(),
            term_months: application.term_months(),
            monthly_payment: application.monthly_payment(),
            status: application.status(),
            approved: application.is_approved(),
            reason: reason.to_string(),
            risk_score: evaluation.score(),
            risk_level: evaluation.risk_level(),
            risk_detail: evaluation.detail().to_string(),
            payment_to_income_ratio: application.payment_to_income_ratio(),
            evaluated_at: evaluation.evaluated_at(),
        })
    }
}
