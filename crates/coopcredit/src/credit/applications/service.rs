use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::domain::{
    Affiliate, AffiliateId, AffiliateStatus, ApplicationId, ApplicationStatus,
    CreditApplication, InvalidState, ValidationError,
};
use super::evaluation::{decide, EvaluationOutcome};
use super::repository::{AffiliateRepository, CreditApplicationRepository, RepositoryError};
use super::scoring::{RiskScoringService, ScoringError};

/// Service composing the persistence ports and the risk-scoring port into the
/// affiliate and credit-application use cases.
///
/// Every evaluation is one logical unit of work against a single application:
/// one load, one scoring call, one conditional write. Aggregates are
/// immutable, so requests for different application ids share no mutable
/// state; for the same id the repository's conditional write guarantees at
/// most one successful transition out of PENDING.
pub struct CreditApplicationService<A, R, S> {
    affiliates: Arc<A>,
    applications: Arc<R>,
    scorer: Arc<S>,
}

/// Registration payload for a new affiliate. Status defaults to ACTIVE and
/// the affiliation date to today when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAffiliateRequest {
    pub document: String,
    pub name: String,
    pub salary: Decimal,
    #[serde(default)]
    pub affiliation_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<AffiliateStatus>,
}

/// Whole-instance replacement payload for an existing affiliate. The document
/// and the affiliation date are identity and never change.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAffiliateRequest {
    pub name: String,
    pub salary: Decimal,
    pub status: AffiliateStatus,
}

/// Submission payload for a new credit application.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitApplicationRequest {
    pub affiliate_id: i64,
    pub requested_amount: Decimal,
    pub term_months: u32,
    pub interest_rate: Decimal,
}

/// Error raised by the credit application service.
#[derive(Debug, thiserror::Error)]
pub enum CreditServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("affiliate with document {0} already exists")]
    DuplicateDocument(String),
    #[error("affiliate {0} not found")]
    AffiliateNotFound(AffiliateId),
    #[error("credit application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("{0}")]
    InvalidState(#[from] InvalidState),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl<A, R, S> CreditApplicationService<A, R, S>
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    pub fn new(affiliates: Arc<A>, applications: Arc<R>, scorer: Arc<S>) -> Self {
        Self {
            affiliates,
            applications,
            scorer,
        }
    }

    /// Register a new affiliate, enforcing document uniqueness.
    pub fn register_affiliate(
        &self,
        request: RegisterAffiliateRequest,
    ) -> Result<Affiliate, CreditServiceError> {
        let affiliate = Affiliate::register(
            request.document,
            request.name,
            request.salary,
            request.affiliation_date,
            request.status,
        )?;

        if self.affiliates.exists_by_document(affiliate.document())? {
            return Err(CreditServiceError::DuplicateDocument(
                affiliate.document().to_string(),
            ));
        }

        let saved = self.affiliates.save(affiliate)?;
        info!(document = saved.document(), "affiliate registered");
        Ok(saved)
    }

    pub fn get_affiliate(&self, id: AffiliateId) -> Result<Affiliate, CreditServiceError> {
        self.affiliates
            .find_by_id(id)?
            .ok_or(CreditServiceError::AffiliateNotFound(id))
    }

    pub fn find_affiliate_by_document(
        &self,
        document: &str,
    ) -> Result<Option<Affiliate>, CreditServiceError> {
        Ok(self.affiliates.find_by_document(document)?)
    }

    /// Replace the mutable attributes of an affiliate with a freshly
    /// validated instance.
    pub fn update_affiliate(
        &self,
        id: AffiliateId,
        request: UpdateAffiliateRequest,
    ) -> Result<Affiliate, CreditServiceError> {
        let current = self.get_affiliate(id)?;
        let updated = current.updated(request.name, request.salary, request.status)?;
        Ok(self.affiliates.save(updated)?)
    }

    /// Administrative removal of an affiliate.
    pub fn remove_affiliate(&self, id: AffiliateId) -> Result<(), CreditServiceError> {
        self.get_affiliate(id)?;
        Ok(self.affiliates.delete_by_id(id)?)
    }

    /// Submit a new credit application for a registered affiliate.
    ///
    /// Eligibility is gated here, at submission time: an inactive affiliate
    /// or one short of the minimum seniority never produces a PENDING
    /// application.
    pub fn submit_application(
        &self,
        request: SubmitApplicationRequest,
    ) -> Result<CreditApplication, CreditServiceError> {
        let affiliate_id = AffiliateId(request.affiliate_id);
        let affiliate = self.get_affiliate(affiliate_id)?;

        if !affiliate.is_active() {
            return Err(InvalidState(
                "only ACTIVE affiliates can apply for credit".to_string(),
            )
            .into());
        }
        if !affiliate.has_minimum_seniority() {
            return Err(InvalidState(format!(
                "affiliate must have at least {} months of seniority",
                super::domain::MINIMUM_SENIORITY_MONTHS
            ))
            .into());
        }

        let application = CreditApplication::submit(
            affiliate,
            request.requested_amount,
            request.term_months,
            request.interest_rate,
        )?;

        let saved = self.applications.save(application)?;
        info!(
            affiliate = %affiliate_id,
            amount = %saved.requested_amount(),
            "credit application submitted"
        );
        Ok(saved)
    }

    /// Evaluate a pending application and persist the terminal decision.
    ///
    /// Loads the application, gates on `can_be_evaluated`, obtains a risk
    /// evaluation through the scoring port, applies the policy, and records
    /// the PENDING to APPROVED/REJECTED transition through the repository's
    /// conditional write. A lost race surfaces as a conflict for the caller
    /// to retry; it is never retried here.
    pub async fn evaluate(
        &self,
        application_id: ApplicationId,
    ) -> Result<EvaluationOutcome, CreditServiceError> {
        let application = self
            .applications
            .find_by_id(application_id)?
            .ok_or(CreditServiceError::ApplicationNotFound(application_id))?;

        if !application.can_be_evaluated() {
            return Err(InvalidState(format!(
                "application cannot be evaluated (status: {}, affiliate eligible: {})",
                application.status().label(),
                application.affiliate().can_apply_for_credit()
            ))
            .into());
        }

        let risk = self
            .scorer
            .score(
                application.affiliate().document(),
                application.requested_amount(),
                application.term_months(),
            )
            .await?;

        let decision = decide(&application, &risk);
        let decided = application.decided(risk, decision.approved, decision.reason)?;
        let saved = self.applications.record_decision(decided)?;

        info!(
            application = %application_id,
            approved = saved.is_approved(),
            "credit application decided"
        );

        EvaluationOutcome::from_application(&saved).ok_or_else(|| {
            RepositoryError::Unavailable(
                "stored application is missing its risk evaluation".to_string(),
            )
            .into()
        })
    }

    pub fn get_application(
        &self,
        id: ApplicationId,
    ) -> Result<CreditApplication, CreditServiceError> {
        self.applications
            .find_by_id(id)?
            .ok_or(CreditServiceError::ApplicationNotFound(id))
    }

    pub fn applications_for_affiliate(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<CreditApplication>, CreditServiceError> {
        Ok(self.applications.find_by_affiliate(affiliate_id)?)
    }

    pub fn applications_with_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<CreditApplication>, CreditServiceError> {
        Ok(self.applications.find_by_status(status)?)
    }

    pub fn list_applications(&self) -> Result<Vec<CreditApplication>, CreditServiceError> {
        Ok(self.applications.find_all()?)
    }
}
