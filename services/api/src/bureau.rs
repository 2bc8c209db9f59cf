use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use coopcredit::credit::applications::{
    validate_score_request, RiskEvaluation, RiskLevel, RiskScoringService, ScoringError,
};

const RISK_EVALUATION_ENDPOINT: &str = "/risk-evaluation";

/// HTTP adapter for the external risk bureau.
///
/// Translates the scoring port into a POST against the bureau's evaluation
/// endpoint and maps the response back into the domain. Transport failures
/// surface as `ScoringError::Unavailable` for the resilient wrapper to
/// absorb.
pub(crate) struct HttpBureauClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct BureauRequest<'a> {
    document: &'a str,
    requested_amount: Decimal,
    term_months: u32,
}

#[derive(Debug, Deserialize)]
struct BureauResponse {
    score: u16,
    risk_level: String,
    detail: String,
}

impl HttpBureauClient {
    pub(crate) fn new(base_url: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl RiskScoringService for HttpBureauClient {
    async fn score(
        &self,
        document: &str,
        requested_amount: Decimal,
        term_months: u32,
    ) -> Result<RiskEvaluation, ScoringError> {
        validate_score_request(document, requested_amount, term_months)?;

        let url = format!("{}{}", self.base_url, RISK_EVALUATION_ENDPOINT);
        debug!(%url, document, "requesting bureau risk evaluation");

        let response = self
            .http
            .post(&url)
            .json(&BureauRequest {
                document,
                requested_amount,
                term_months,
            })
            .send()
            .await
            .map_err(|err| ScoringError::Unavailable(err.to_string()))?
            .error_for_status()
            .map_err(|err| ScoringError::Unavailable(err.to_string()))?;

        let body: BureauResponse = response
            .json()
            .await
            .map_err(|err| ScoringError::MalformedResponse(err.to_string()))?;

        let reported_level = parse_risk_level(&body.risk_level)?;
        let high = reported_level == RiskLevel::High;

        // The level is recomputed from the score during construction; a
        // bureau answer whose pair disagrees is rejected as malformed.
        RiskEvaluation::from_parts(
            None,
            body.score,
            reported_level,
            body.detail,
            chrono::Utc::now(),
            !high,
            high.then(|| "High risk level from credit bureau".to_string()),
        )
        .map_err(|err| ScoringError::MalformedResponse(err.to_string()))
    }
}

fn parse_risk_level(raw: &str) -> Result<RiskLevel, ScoringError> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HIGH" => Ok(RiskLevel::High),
        "MEDIUM" => Ok(RiskLevel::Medium),
        "LOW" => Ok(RiskLevel::Low),
        other => Err(ScoringError::MalformedResponse(format!(
            "unknown risk level '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use rust_decimal_macros::dec;

    fn client_for(server: &MockServer) -> HttpBureauClient {
        HttpBureauClient::new(server.base_url(), Duration::from_millis(500))
            .expect("client builds")
    }

    #[tokio::test]
    async fn maps_a_bureau_answer_into_the_domain() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/risk-evaluation");
                then.status(200).json_body(serde_json::json!({
                    "document": "900123456",
                    "score": 812,
                    "risk_level": "LOW",
                    "detail": "Clean bureau history"
                }));
            })
            .await;

        let evaluation = client_for(&server)
            .score("900123456", dec!(1000), 12)
            .await
            .expect("bureau answer maps");

        mock.assert();
        assert_eq!(evaluation.score(), 812);
        assert_eq!(evaluation.risk_level(), RiskLevel::Low);
        assert!(evaluation.is_approved());
    }

    #[tokio::test]
    async fn inconsistent_pairs_are_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/risk-evaluation");
                then.status(200).json_body(serde_json::json!({
                    "document": "900123456",
                    "score": 812,
                    "risk_level": "HIGH",
                    "detail": "Contradictory answer"
                }));
            })
            .await;

        match client_for(&server).score("900123456", dec!(1000), 12).await {
            Err(ScoringError::MalformedResponse(_)) => {}
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_errors_surface_as_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/risk-evaluation");
                then.status(503);
            })
            .await;

        match client_for(&server).score("900123456", dec!(1000), 12).await {
            Err(ScoringError::Unavailable(_)) => {}
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn preconditions_fail_before_any_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/risk-evaluation");
                then.status(200);
            })
            .await;

        match client_for(&server).score("", dec!(1000), 12).await {
            Err(ScoringError::InvalidRequest(_)) => {}
            other => panic!("expected invalid request, got {other:?}"),
        }
        mock.assert_hits(0);
    }
}
