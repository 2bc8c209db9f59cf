use crate::bureau::HttpBureauClient;
use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryAffiliateRepository, InMemoryApplicationRepository};
use crate::routes::with_credit_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use coopcredit::config::AppConfig;
use coopcredit::credit::applications::{CreditApplicationService, ResilientRiskScorer};
use coopcredit::error::AppError;
use coopcredit::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let bureau = config
        .scoring
        .bureau_base_url
        .clone()
        .map(|base_url| HttpBureauClient::new(base_url, config.scoring.timeout()))
        .transpose()
        .map_err(|err| AppError::Startup(format!("bureau client: {err}")))?;
    if bureau.is_none() {
        info!("no RISK_BUREAU_URL configured, scoring with the deterministic fallback");
    }
    let scorer = ResilientRiskScorer::new(bureau, config.scoring.timeout());

    let affiliates = Arc::new(InMemoryAffiliateRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let service = Arc::new(CreditApplicationService::new(
        affiliates,
        applications,
        Arc::new(scorer),
    ));

    let app = with_credit_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "credit decision service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
