use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::credit::applications::domain::{
    Affiliate, AffiliateId, AffiliateStatus, ApplicationId, ApplicationStatus,
    CreditApplication, RiskEvaluation, RiskLevel,
};
use crate::credit::applications::repository::{
    AffiliateRepository, CreditApplicationRepository, RepositoryError,
};
use crate::credit::applications::scoring::{
    validate_score_request, RiskScoringService, ScoringError,
};
use crate::credit::applications::service::{
    CreditApplicationService, RegisterAffiliateRequest, SubmitApplicationRequest,
};

pub(super) type TestService<S> =
    CreditApplicationService<InMemoryAffiliateRepository, InMemoryApplicationRepository, S>;

pub(super) fn months_ago(months: u32) -> NaiveDate {
    Utc::now()
        .date_naive()
        .checked_sub_months(Months::new(months))
        .expect("date stays in range")
}

pub(super) fn eligible_affiliate(document: &str) -> Affiliate {
    affiliate_with(document, dec!(3_000_000), 24, AffiliateStatus::Active)
}

pub(super) fn affiliate_with(
    document: &str,
    salary: Decimal,
    seniority_months: u32,
    status: AffiliateStatus,
) -> Affiliate {
    Affiliate::new(
        None,
        document,
        "Maria Fernanda Rojas",
        salary,
        months_ago(seniority_months),
        status,
    )
    .expect("fixture affiliate is valid")
}

pub(super) fn pending_application(
    affiliate: Affiliate,
    amount: Decimal,
    term_months: u32,
    rate: Decimal,
) -> CreditApplication {
    CreditApplication::submit(affiliate, amount, term_months, rate)
        .expect("fixture application is valid")
}

pub(super) fn approved_evaluation(score: u16) -> RiskEvaluation {
    RiskEvaluation::new(score, "stub bureau detail", None, true, None)
        .expect("fixture evaluation is valid")
}

pub(super) fn high_risk_evaluation(score: u16) -> RiskEvaluation {
    RiskEvaluation::new(
        score,
        "stub bureau detail",
        None,
        false,
        Some("High risk level from credit bureau".to_string()),
    )
    .expect("fixture evaluation is valid")
}

pub(super) fn register_request(document: &str) -> RegisterAffiliateRequest {
    RegisterAffiliateRequest {
        document: document.to_string(),
        name: "Maria Fernanda Rojas".to_string(),
        salary: dec!(3_000_000),
        affiliation_date: Some(months_ago(24)),
        status: None,
    }
}

pub(super) fn submit_request(affiliate_id: i64) -> SubmitApplicationRequest {
    SubmitApplicationRequest {
        affiliate_id,
        requested_amount: dec!(5_000_000),
        term_months: 36,
        interest_rate: dec!(12.5),
    }
}

pub(super) fn build_service<S>(
    scorer: S,
) -> (
    Arc<TestService<S>>,
    Arc<InMemoryAffiliateRepository>,
    Arc<InMemoryApplicationRepository>,
)
where
    S: RiskScoringService + 'static,
{
    let affiliates = Arc::new(InMemoryAffiliateRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let service = Arc::new(CreditApplicationService::new(
        affiliates.clone(),
        applications.clone(),
        Arc::new(scorer),
    ));
    (service, affiliates, applications)
}

#[derive(Default)]
pub(super) struct InMemoryAffiliateRepository {
    rows: Mutex<HashMap<i64, Affiliate>>,
    sequence: AtomicI64,
}

impl AffiliateRepository for InMemoryAffiliateRepository {
    fn save(&self, affiliate: Affiliate) -> Result<Affiliate, RepositoryError> {
        let mut rows = self.rows.lock().expect("affiliate mutex poisoned");
        match affiliate.id() {
            Some(id) => {
                if !rows.contains_key(&id.0) {
                    return Err(RepositoryError::NotFound);
                }
                rows.insert(id.0, affiliate.clone());
                Ok(affiliate)
            }
            None => {
                if rows
                    .values()
                    .any(|row| row.document() == affiliate.document())
                {
                    return Err(RepositoryError::Conflict);
                }
                let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                let saved = affiliate.with_id(AffiliateId(id));
                rows.insert(id, saved.clone());
                Ok(saved)
            }
        }
    }

    fn find_by_id(&self, id: AffiliateId) -> Result<Option<Affiliate>, RepositoryError> {
        let rows = self.rows.lock().expect("affiliate mutex poisoned");
        Ok(rows.get(&id.0).cloned())
    }

    fn find_by_document(&self, document: &str) -> Result<Option<Affiliate>, RepositoryError> {
        let rows = self.rows.lock().expect("affiliate mutex poisoned");
        Ok(rows.values().find(|row| row.document() == document).cloned())
    }

    fn exists_by_document(&self, document: &str) -> Result<bool, RepositoryError> {
        let rows = self.rows.lock().expect("affiliate mutex poisoned");
        Ok(rows.values().any(|row| row.document() == document))
    }

    fn delete_by_id(&self, id: AffiliateId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().expect("affiliate mutex poisoned");
        rows.remove(&id.0)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub(super) struct InMemoryApplicationRepository {
    rows: Mutex<HashMap<i64, CreditApplication>>,
    sequence: AtomicI64,
}

impl CreditApplicationRepository for InMemoryApplicationRepository {
    fn save(
        &self,
        application: CreditApplication,
    ) -> Result<CreditApplication, RepositoryError> {
        let mut rows = self.rows.lock().expect("application mutex poisoned");
        match application.id() {
            Some(id) => {
                if !rows.contains_key(&id.0) {
                    return Err(RepositoryError::NotFound);
                }
                rows.insert(id.0, application.clone());
                Ok(application)
            }
            None => {
                let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                let saved = application.with_id(ApplicationId(id));
                rows.insert(id, saved.clone());
                Ok(saved)
            }
        }
    }

    fn find_by_id(
        &self,
        id: ApplicationId,
    ) -> Result<Option<CreditApplication>, RepositoryError> {
        let rows = self.rows.lock().expect("application mutex poisoned");
        Ok(rows.get(&id.0).cloned())
    }

    fn find_by_affiliate(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<CreditApplication>, RepositoryError> {
        let rows = self.rows.lock().expect("application mutex poisoned");
        Ok(rows
            .values()
            .filter(|row| row.affiliate().id() == Some(affiliate_id))
            .cloned()
            .collect())
    }

    fn find_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<CreditApplication>, RepositoryError> {
        let rows = self.rows.lock().expect("application mutex poisoned");
        Ok(rows
            .values()
            .filter(|row| row.status() == status)
            .cloned()
            .collect())
    }

    fn find_all(&self) -> Result<Vec<CreditApplication>, RepositoryError> {
        let rows = self.rows.lock().expect("application mutex poisoned");
        Ok(rows.values().cloned().collect())
    }

    fn record_decision(
        &self,
        application: CreditApplication,
    ) -> Result<CreditApplication, RepositoryError> {
        let id = application.id().ok_or(RepositoryError::NotFound)?;
        let mut rows = self.rows.lock().expect("application mutex poisoned");
        match rows.get(&id.0) {
            Some(stored) if stored.is_pending() => {
                rows.insert(id.0, application.clone());
                Ok(application)
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }
}

/// Scorer double returning a fixed score for every document.
pub(super) struct FixedScorer {
    pub(super) score: u16,
}

#[async_trait]
impl RiskScoringService for FixedScorer {
    async fn score(
        &self,
        document: &str,
        requested_amount: Decimal,
        term_months: u32,
    ) -> Result<RiskEvaluation, ScoringError> {
        validate_score_request(document, requested_amount, term_months)?;
        let level = RiskLevel::for_score(self.score)
            .map_err(|err| ScoringError::MalformedResponse(err.to_string()))?;
        let high = level == RiskLevel::High;
        RiskEvaluation::new(
            self.score,
            "stub bureau detail",
            None,
            !high,
            high.then(|| "High risk level from credit bureau".to_string()),
        )
        .map_err(|err| ScoringError::MalformedResponse(err.to_string()))
    }
}

/// Scorer double that always fails like an unreachable transport.
pub(super) struct UnavailableScorer;

#[async_trait]
impl RiskScoringService for UnavailableScorer {
    async fn score(
        &self,
        _document: &str,
        _requested_amount: Decimal,
        _term_months: u32,
    ) -> Result<RiskEvaluation, ScoringError> {
        Err(ScoringError::Unavailable("connection refused".to_string()))
    }
}

/// Scorer double that answers after a delay, for timeout coverage.
pub(super) struct SlowScorer {
    pub(super) delay: Duration,
    pub(super) score: u16,
}

#[async_trait]
impl RiskScoringService for SlowScorer {
    async fn score(
        &self,
        document: &str,
        requested_amount: Decimal,
        term_months: u32,
    ) -> Result<RiskEvaluation, ScoringError> {
        tokio::time::sleep(self.delay).await;
        FixedScorer { score: self.score }
            .score(document, requested_amount, term_months)
            .await
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
