use super::common::*;
use crate::credit::applications::domain::RiskLevel;
use crate::credit::applications::scoring::{
    FallbackRiskScorer, ResilientRiskScorer, RiskScoringService, ScoringError,
};

use rust_decimal_macros::dec;
use std::time::Duration;

#[tokio::test]
async fn fallback_is_deterministic_per_document() {
    let scorer = FallbackRiskScorer;

    let first = scorer
        .score("1002003001", dec!(5_000_000), 36)
        .await
        .expect("fallback always scores");
    let second = scorer
        .score("1002003001", dec!(1_000), 6)
        .await
        .expect("fallback always scores");

    assert_eq!(first.score(), second.score());
    assert_eq!(first.risk_level(), second.risk_level());
    assert_eq!(first.detail(), second.detail());
}

#[tokio::test]
async fn fallback_buckets_known_documents() {
    // Precomputed FNV-1a buckets: 20% HIGH, 30% MEDIUM, 50% LOW.
    assert_eq!(FallbackRiskScorer::score_for_document("1002003001"), 799);
    assert_eq!(FallbackRiskScorer::score_for_document("CC-100200300"), 336);
    assert_eq!(FallbackRiskScorer::score_for_document("900123456"), 504);

    let low = FallbackRiskScorer
        .score("1002003001", dec!(1000), 12)
        .await
        .expect("scores");
    assert_eq!(low.risk_level(), RiskLevel::Low);
    assert!(low.is_approved());

    let high = FallbackRiskScorer
        .score("CC-100200300", dec!(1000), 12)
        .await
        .expect("scores");
    assert_eq!(high.risk_level(), RiskLevel::High);
    assert!(!high.is_approved());
    assert!(high.rejection_reason().is_some());

    let medium = FallbackRiskScorer
        .score("900123456", dec!(1000), 12)
        .await
        .expect("scores");
    assert_eq!(medium.risk_level(), RiskLevel::Medium);
    assert!(medium.is_approved());
}

#[tokio::test]
async fn preconditions_fail_fast() {
    let scorer = FallbackRiskScorer;

    for (document, amount, term) in [
        ("   ", dec!(1000), 12),
        ("900", dec!(0), 12),
        ("900", dec!(-5), 12),
        ("900", dec!(1000), 0),
    ] {
        match scorer.score(document, amount, term).await {
            Err(ScoringError::InvalidRequest(_)) => {}
            other => panic!(
                "expected invalid request for ({document:?}, {amount}, {term}), got {other:?}"
            ),
        }
    }
}

#[tokio::test]
async fn resilient_scorer_prefers_the_primary() {
    let scorer = ResilientRiskScorer::new(
        Some(FixedScorer { score: 820 }),
        Duration::from_millis(200),
    );

    let evaluation = scorer
        .score("900123456", dec!(1000), 12)
        .await
        .expect("primary scores");
    assert_eq!(evaluation.score(), 820);
}

#[tokio::test]
async fn resilient_scorer_falls_back_when_primary_errors() {
    let scorer = ResilientRiskScorer::new(Some(UnavailableScorer), Duration::from_millis(200));

    let evaluation = scorer
        .score("1002003001", dec!(1000), 12)
        .await
        .expect("fallback absorbs the outage");
    assert_eq!(
        evaluation.score(),
        FallbackRiskScorer::score_for_document("1002003001")
    );
}

#[tokio::test]
async fn resilient_scorer_falls_back_on_timeout() {
    let scorer = ResilientRiskScorer::new(
        Some(SlowScorer {
            delay: Duration::from_millis(250),
            score: 820,
        }),
        Duration::from_millis(20),
    );

    let evaluation = scorer
        .score("1002003001", dec!(1000), 12)
        .await
        .expect("fallback answers within the bound");
    assert_eq!(
        evaluation.score(),
        FallbackRiskScorer::score_for_document("1002003001")
    );
}

#[tokio::test]
async fn resilient_scorer_runs_fallback_alone_without_a_primary() {
    let scorer =
        ResilientRiskScorer::<FixedScorer>::new(None, Duration::from_millis(200));

    let evaluation = scorer
        .score("1002003001", dec!(1000), 12)
        .await
        .expect("fallback scores");
    assert_eq!(
        evaluation.score(),
        FallbackRiskScorer::score_for_document("1002003001")
    );
}

#[tokio::test]
async fn resilient_scorer_propagates_invalid_requests() {
    let scorer = ResilientRiskScorer::new(
        Some(FixedScorer { score: 820 }),
        Duration::from_millis(200),
    );

    match scorer.score("", dec!(1000), 12).await {
        Err(ScoringError::InvalidRequest(_)) => {}
        other => panic!("expected invalid request, got {other:?}"),
    }
}
