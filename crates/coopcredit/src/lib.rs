//! Cooperative credit decisioning: affiliate eligibility, amortization math,
//! bureau risk scoring with a deterministic offline fallback, and the atomic
//! approve/reject orchestration.

pub mod config;
pub mod credit;
pub mod error;
pub mod telemetry;
