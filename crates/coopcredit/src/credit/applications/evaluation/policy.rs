use rust_decimal::{Decimal, RoundingStrategy};

use super::super::domain::{CreditApplication, RiskEvaluation};

/// Outcome of the policy step: the verdict plus a self-explaining reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decision {
    pub(crate) approved: bool,
    pub(crate) reason: String,
}

/// Applies the approval rules in strict order, short-circuiting at the first
/// failing rule.
///
/// HIGH risk is an unconditional rejection. MEDIUM risk is not: it runs
/// through the same eligibility, ratio, and amount checks as LOW risk. The
/// eligibility re-check guards against the affiliate's standing changing
/// between load and decision.
pub(crate) fn decide(application: &CreditApplication, risk: &RiskEvaluation) -> Decision {
    if risk.is_high_risk() {
        return Decision {
            approved: false,
            reason: format!("High risk level detected (score: {})", risk.score()),
        };
    }

    if !application.affiliate().can_apply_for_credit() {
        return Decision {
            approved: false,
            reason: "Affiliate does not meet eligibility requirements".to_string(),
        };
    }

    if !application.has_acceptable_payment_to_income_ratio() {
        return Decision {
            approved: false,
            reason: format!(
                "Payment-to-income ratio ({}%) exceeds maximum (40%)",
                ratio_as_percent(application.payment_to_income_ratio())
            ),
        };
    }

    if !application.has_acceptable_amount() {
        return Decision {
            approved: false,
            reason: "Requested amount exceeds maximum allowed (10x monthly salary)".to_string(),
        };
    }

    Decision {
        approved: true,
        reason: format!(
            "Approved - Risk level: {}, Score: {}, Payment ratio: {}%",
            risk.risk_level(),
            risk.score(),
            ratio_as_percent(application.payment_to_income_ratio())
        ),
    }
}

/// A four-digit ratio expressed as a two-digit percentage, half-up.
pub fn ratio_as_percent(ratio: Decimal) -> Decimal {
    (ratio * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
