use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{
    Affiliate, AffiliateId, ApplicationId, ApplicationStatus, CreditApplication,
};
use super::repository::{AffiliateRepository, CreditApplicationRepository, RepositoryError};
use super::scoring::{RiskScoringService, ScoringError};
use super::service::{
    CreditApplicationService, CreditServiceError, RegisterAffiliateRequest,
    SubmitApplicationRequest, UpdateAffiliateRequest,
};

/// Router builder exposing HTTP endpoints for affiliates, application intake,
/// and evaluation.
pub fn credit_router<A, R, S>(service: Arc<CreditApplicationService<A, R, S>>) -> Router
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    Router::new()
        .route("/api/v1/affiliates", post(register_affiliate_handler::<A, R, S>))
        .route(
            "/api/v1/affiliates/:affiliate_id",
            get(get_affiliate_handler::<A, R, S>)
                .put(update_affiliate_handler::<A, R, S>)
                .delete(delete_affiliate_handler::<A, R, S>),
        )
        .route(
            "/api/v1/applications",
            post(submit_application_handler::<A, R, S>)
                .get(list_applications_handler::<A, R, S>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(get_application_handler::<A, R, S>),
        )
        .route(
            "/api/v1/applications/:application_id/evaluate",
            post(evaluate_application_handler::<A, R, S>),
        )
        .with_state(service)
}

/// Sanitized representation of an affiliate for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AffiliateView {
    pub id: Option<i64>,
    pub document: String,
    pub name: String,
    pub salary: Decimal,
    pub affiliation_date: NaiveDate,
    pub status: &'static str,
    pub months_of_seniority: i32,
    pub eligible_for_credit: bool,
}

impl AffiliateView {
    pub fn from_affiliate(affiliate: &Affiliate) -> Self {
        Self {
            id: affiliate.id().map(|id| id.0),
            document: affiliate.document().to_string(),
            name: affiliate.name().to_string(),
            salary: affiliate.salary(),
            affiliation_date: affiliate.affiliation_date(),
            status: affiliate.status().label(),
            months_of_seniority: affiliate.months_of_seniority(),
            eligible_for_credit: affiliate.can_apply_for_credit(),
        }
    }
}

/// Sanitized representation of a credit application for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub id: Option<i64>,
    pub affiliate_document: String,
    pub affiliate_name: String,
    pub requested_amount: Decimal,
    pub term_months: u32,
    pub interest_rate: Decimal,
    pub monthly_payment: Decimal,
    pub submitted_at: DateTime<Utc>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskEvaluationView>,
}

/// Risk evaluation fields embedded in an application view.
#[derive(Debug, Clone, Serialize)]
pub struct RiskEvaluationView {
    pub score: u16,
    pub risk_level: &'static str,
    pub detail: String,
    pub approved: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl ApplicationView {
    pub fn from_application(application: &CreditApplication) -> Self {
        Self {
            id: application.id().map(|id| id.0),
            affiliate_document: application.affiliate().document().to_string(),
            affiliate_name: application.affiliate().name().to_string(),
            requested_amount: application.requested_amount(),
            term_months: application.term_months(),
            interest_rate: application.interest_rate(),
            monthly_payment: application.monthly_payment(),
            submitted_at: application.submitted_at(),
            status: application.status().label(),
            decision_reason: application.decision_reason().map(str::to_string),
            risk: application.risk_evaluation().map(|evaluation| RiskEvaluationView {
                score: evaluation.score(),
                risk_level: evaluation.risk_level().label(),
                detail: evaluation.detail().to_string(),
                approved: evaluation.is_approved(),
                evaluated_at: evaluation.evaluated_at(),
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApplicationsQuery {
    status: Option<String>,
    affiliate_id: Option<i64>,
}

pub(crate) async fn register_affiliate_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    axum::Json(request): axum::Json<RegisterAffiliateRequest>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    match service.register_affiliate(request) {
        Ok(affiliate) => (
            StatusCode::CREATED,
            axum::Json(AffiliateView::from_affiliate(&affiliate)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_affiliate_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    Path(affiliate_id): Path<i64>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    match service.get_affiliate(AffiliateId(affiliate_id)) {
        Ok(affiliate) => (
            StatusCode::OK,
            axum::Json(AffiliateView::from_affiliate(&affiliate)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_affiliate_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    Path(affiliate_id): Path<i64>,
    axum::Json(request): axum::Json<UpdateAffiliateRequest>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    match service.update_affiliate(AffiliateId(affiliate_id), request) {
        Ok(affiliate) => (
            StatusCode::OK,
            axum::Json(AffiliateView::from_affiliate(&affiliate)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_affiliate_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    Path(affiliate_id): Path<i64>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    match service.remove_affiliate(AffiliateId(affiliate_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_application_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    axum::Json(request): axum::Json<SubmitApplicationRequest>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    match service.submit_application(request) {
        Ok(application) => (
            StatusCode::CREATED,
            axum::Json(ApplicationView::from_application(&application)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_application_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    Path(application_id): Path<i64>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    match service.get_application(ApplicationId(application_id)) {
        Ok(application) => (
            StatusCode::OK,
            axum::Json(ApplicationView::from_application(&application)),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_applications_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    Query(query): Query<ApplicationsQuery>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    let result = match (&query.status, query.affiliate_id) {
        (Some(raw), _) => match ApplicationStatus::from_label(raw) {
            Some(status) => service.applications_with_status(status),
            None => {
                let payload = json!({ "error": format!("unknown application status '{raw}'") });
                return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
            }
        },
        (None, Some(affiliate_id)) => {
            service.applications_for_affiliate(AffiliateId(affiliate_id))
        }
        (None, None) => service.list_applications(),
    };

    match result {
        Ok(applications) => {
            let views: Vec<ApplicationView> = applications
                .iter()
                .map(ApplicationView::from_application)
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn evaluate_application_handler<A, R, S>(
    State(service): State<Arc<CreditApplicationService<A, R, S>>>,
    Path(application_id): Path<i64>,
) -> Response
where
    A: AffiliateRepository + 'static,
    R: CreditApplicationRepository + 'static,
    S: RiskScoringService + 'static,
{
    match service.evaluate(ApplicationId(application_id)).await {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: CreditServiceError) -> Response {
    let status = match &err {
        CreditServiceError::Validation(_)
        | CreditServiceError::Scoring(ScoringError::InvalidRequest(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CreditServiceError::DuplicateDocument(_) | CreditServiceError::InvalidState(_) => {
            StatusCode::CONFLICT
        }
        CreditServiceError::AffiliateNotFound(_)
        | CreditServiceError::ApplicationNotFound(_) => StatusCode::NOT_FOUND,
        CreditServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        CreditServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        CreditServiceError::Repository(RepositoryError::Unavailable(_))
        | CreditServiceError::Scoring(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = axum::Json(json!({ "error": err.to_string() }));
    (status, body).into_response()
}
