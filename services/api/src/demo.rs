use crate::infra::{InMemoryAffiliateRepository, InMemoryApplicationRepository};
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

use coopcredit::credit::applications::{
    CreditApplicationService, CreditServiceError, FallbackRiskScorer,
    RegisterAffiliateRequest, SubmitApplicationRequest,
};
use coopcredit::error::AppError;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Identification document of the demo affiliate
    #[arg(long, default_value = "1002003001")]
    document: String,
    /// Monthly salary of the demo affiliate
    #[arg(long, default_value = "3000000")]
    salary: Decimal,
    /// Requested principal
    #[arg(long, default_value = "5000000")]
    amount: Decimal,
    /// Term in months
    #[arg(long, default_value_t = 36)]
    term: u32,
    /// Nominal annual interest rate, percent
    #[arg(long, default_value = "12.5")]
    rate: Decimal,
}

/// Walks one register/submit/evaluate cycle against in-memory adapters and
/// the deterministic fallback scorer, printing the decision.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let affiliates = Arc::new(InMemoryAffiliateRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let service = CreditApplicationService::new(
        affiliates,
        applications,
        Arc::new(FallbackRiskScorer),
    );

    let affiliate = service
        .register_affiliate(RegisterAffiliateRequest {
            document: args.document.clone(),
            name: "Demo Affiliate".to_string(),
            salary: args.salary,
            affiliation_date: chrono::Utc::now()
                .date_naive()
                .checked_sub_months(chrono::Months::new(24)),
            status: None,
        })
        .map_err(demo_error)?;

    println!(
        "Registered affiliate {} (document {}, salary {})",
        affiliate.name(),
        affiliate.document(),
        affiliate.salary()
    );

    let affiliate_id = affiliate
        .id()
        .ok_or_else(|| AppError::Startup("saved affiliate has no id".to_string()))?;
    let application = service
        .submit_application(SubmitApplicationRequest {
            affiliate_id: affiliate_id.0,
            requested_amount: args.amount,
            term_months: args.term,
            interest_rate: args.rate,
        })
        .map_err(demo_error)?;

    println!(
        "Submitted application for {} over {} months at {}% (monthly payment {})",
        application.requested_amount(),
        application.term_months(),
        application.interest_rate(),
        application.monthly_payment()
    );

    let application_id = application
        .id()
        .ok_or_else(|| AppError::Startup("saved application has no id".to_string()))?;
    let outcome = service.evaluate(application_id).await.map_err(demo_error)?;

    println!();
    println!(
        "Decision: {} (risk {} / score {})",
        outcome.status.label(),
        outcome.risk_level,
        outcome.risk_score
    );
    println!("Reason: {}", outcome.reason);
    println!(
        "Payment-to-income ratio: {}",
        outcome.payment_to_income_ratio
    );

    Ok(())
}

fn demo_error(err: CreditServiceError) -> AppError {
    AppError::Startup(format!("demo scenario failed: {err}"))
}
