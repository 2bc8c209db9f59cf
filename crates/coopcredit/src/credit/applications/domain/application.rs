use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::{Affiliate, ApplicationId, InvalidState, RiskEvaluation, ValidationError};

/// Shortest repayment term accepted.
pub const MIN_TERM_MONTHS: u32 = 1;
/// Longest repayment term accepted.
pub const MAX_TERM_MONTHS: u32 = 360;

/// Lifecycle status of a credit application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(ApplicationStatus::Pending),
            "APPROVED" => Some(ApplicationStatus::Approved),
            "REJECTED" => Some(ApplicationStatus::Rejected),
            "CANCELLED" => Some(ApplicationStatus::Cancelled),
            _ => None,
        }
    }
}

/// Aggregate root tying an affiliate, a requested loan, and (once evaluated)
/// a risk evaluation.
///
/// Owns the amortization math and the affordability rules. An application is
/// created PENDING and transitions exactly once to APPROVED or REJECTED; the
/// transition is performed only through [`CreditApplication::decided`]. A
/// non-PENDING instance always carries a decision reason.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditApplication {
    id: Option<ApplicationId>,
    affiliate: Affiliate,
    requested_amount: Decimal,
    term_months: u32,
    interest_rate: Decimal,
    submitted_at: DateTime<Utc>,
    status: ApplicationStatus,
    risk_evaluation: Option<RiskEvaluation>,
    decision_reason: Option<String>,
}

impl CreditApplication {
    /// Submission entry point: a PENDING application dated now.
    pub fn submit(
        affiliate: Affiliate,
        requested_amount: Decimal,
        term_months: u32,
        interest_rate: Decimal,
    ) -> Result<Self, ValidationError> {
        Self::from_parts(
            None,
            affiliate,
            requested_amount,
            term_months,
            interest_rate,
            Utc::now(),
            ApplicationStatus::Pending,
            None,
            None,
        )
    }

    /// Validating constructor over the full field set, used when rehydrating
    /// persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Option<ApplicationId>,
        affiliate: Affiliate,
        requested_amount: Decimal,
        term_months: u32,
        interest_rate: Decimal,
        submitted_at: DateTime<Utc>,
        status: ApplicationStatus,
        risk_evaluation: Option<RiskEvaluation>,
        decision_reason: Option<String>,
    ) -> Result<Self, ValidationError> {
        if !affiliate.is_active() {
            return Err(ValidationError::InactiveAffiliate);
        }
        if requested_amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        if !(MIN_TERM_MONTHS..=MAX_TERM_MONTHS).contains(&term_months) {
            return Err(ValidationError::TermOutOfRange);
        }
        if interest_rate < Decimal::ZERO || interest_rate > Decimal::ONE_HUNDRED {
            return Err(ValidationError::RateOutOfRange);
        }
        if submitted_at > Utc::now() {
            return Err(ValidationError::ApplicationDateInFuture);
        }
        let decision_reason = decision_reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        if status != ApplicationStatus::Pending && decision_reason.is_none() {
            return Err(ValidationError::MissingDecisionReason);
        }

        Ok(Self {
            id,
            affiliate,
            requested_amount,
            term_months,
            interest_rate,
            submitted_at,
            status,
            risk_evaluation,
            decision_reason,
        })
    }

    /// Replacement carrying the persistence-assigned identifier.
    pub fn with_id(self, id: ApplicationId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Monthly payment under the standard amortizing-loan formula.
    ///
    /// The monthly rate is the annual percentage divided by 100 and then by
    /// 12, each step rounded half-up to six fractional digits. A zero rate
    /// degenerates to straight-line principal over the term. The payment is
    /// rounded half-up to two fractional digits.
    pub fn monthly_payment(&self) -> Decimal {
        if self.interest_rate.is_zero() {
            return (self.requested_amount / Decimal::from(self.term_months))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        }

        let monthly_rate = self.monthly_rate();
        let factor = compound_factor(Decimal::ONE + monthly_rate, self.term_months);
        let numerator = self.requested_amount * monthly_rate * factor;
        let denominator = factor - Decimal::ONE;

        (numerator / denominator).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    fn monthly_rate(&self) -> Decimal {
        let annual = (self.interest_rate / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero);
        (annual / Decimal::from(12u32))
            .round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Monthly payment divided by the affiliate's salary, rounded half-up to
    /// four fractional digits.
    pub fn payment_to_income_ratio(&self) -> Decimal {
        (self.monthly_payment() / self.affiliate.salary())
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    }

    /// The monthly payment may not exceed 40% of the salary, inclusive.
    pub fn has_acceptable_payment_to_income_ratio(&self) -> bool {
        self.payment_to_income_ratio() <= Decimal::new(40, 2)
    }

    /// The requested principal may not exceed ten monthly salaries, inclusive.
    pub fn has_acceptable_amount(&self) -> bool {
        self.requested_amount <= self.affiliate.max_credit_amount(10)
    }

    pub fn can_be_evaluated(&self) -> bool {
        self.status == ApplicationStatus::Pending && self.affiliate.can_apply_for_credit()
    }

    /// All approval rules at once: affiliate eligibility, payment ratio,
    /// amount cap, and (when a risk evaluation is attached) its approved flag.
    pub fn meets_approval_criteria(&self) -> bool {
        if !self.affiliate.can_apply_for_credit() {
            return false;
        }
        if !self.has_acceptable_payment_to_income_ratio() {
            return false;
        }
        if !self.has_acceptable_amount() {
            return false;
        }
        match &self.risk_evaluation {
            Some(evaluation) => evaluation.is_approved(),
            None => true,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == ApplicationStatus::Approved
    }

    pub fn is_rejected(&self) -> bool {
        self.status == ApplicationStatus::Rejected
    }

    /// The single legal transition: PENDING to APPROVED or REJECTED, carrying
    /// the risk evaluation and the decision reason. Any other source status
    /// fails with an invalid-state error.
    pub fn decided(
        self,
        risk_evaluation: RiskEvaluation,
        approved: bool,
        reason: impl Into<String>,
    ) -> Result<Self, InvalidState> {
        if self.status != ApplicationStatus::Pending {
            return Err(InvalidState(format!(
                "application is already {} and cannot be decided again",
                self.status.label()
            )));
        }
        let reason = reason.into().trim().to_string();
        if reason.is_empty() {
            return Err(InvalidState(
                "a decision requires a non-empty reason".to_string(),
            ));
        }

        Ok(Self {
            status: if approved {
                ApplicationStatus::Approved
            } else {
                ApplicationStatus::Rejected
            },
            risk_evaluation: Some(risk_evaluation),
            decision_reason: Some(reason),
            ..self
        })
    }

    pub fn id(&self) -> Option<ApplicationId> {
        self.id
    }

    pub fn affiliate(&self) -> &Affiliate {
        &self.affiliate
    }

    pub fn requested_amount(&self) -> Decimal {
        self.requested_amount
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn interest_rate(&self) -> Decimal {
        self.interest_rate
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn risk_evaluation(&self) -> Option<&RiskEvaluation> {
        self.risk_evaluation.as_ref()
    }

    pub fn decision_reason(&self) -> Option<&str> {
        self.decision_reason.as_deref()
    }
}

/// (1 + r)^n by repeated multiplication, keeping everything in fixed-point.
fn compound_factor(base: Decimal, exponent: u32) -> Decimal {
    let mut factor = Decimal::ONE;
    for _ in 0..exponent {
        factor *= base;
    }
    factor
}
