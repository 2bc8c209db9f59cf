use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use coopcredit::credit::applications::{
    Affiliate, AffiliateId, AffiliateRepository, ApplicationId, ApplicationStatus,
    CreditApplication, CreditApplicationRepository, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory affiliate store. Ids come from a process-local sequence and the
/// document column behaves as a unique key.
#[derive(Default)]
pub(crate) struct InMemoryAffiliateRepository {
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

/// In-memory application store. The decision write is conditional on the
/// stored row still being PENDING, so concurrent evaluations of the same id
/// cannot both transition it.
#[derive(Default)]
pub(crate) struct InMemoryApplicationRepository {
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, Utc};
    use rust_decimal_macros::dec;

    fn eligible_affiliate(document: &str) -> Affiliate {
        Affiliate::register(
            document,
            "Maria Fernanda Rojas",
            dec!(3_000_000),
            Utc::now()
                .date_naive()
                .checked_sub_months(Months::new(24)),
            None,
        )
        .expect("fixture affiliate is valid")
    }

    fn pending_application(repo: &InMemoryApplicationRepository) -> CreditApplication {
        let affiliate = InMemoryAffiliateRepository::default()
            .save(eligible_affiliate("600"))
            .expect("affiliate saved");
        let application =
            CreditApplication::submit(affiliate, dec!(5_000_000), 36, dec!(12.5))
                .expect("application is valid");
        repo.save(application).expect("application saved")
    }

    #[test]
    fn save_assigns_sequential_ids() {
        let repo = InMemoryAffiliateRepository::default();
        let first = repo.save(eligible_affiliate("601")).expect("saves");
        let second = repo.save(eligible_affiliate("602")).expect("saves");
        assert_eq!(first.id(), Some(AffiliateId(1)));
        assert_eq!(second.id(), Some(AffiliateId(2)));
    }

    #[test]
    fn save_rejects_duplicate_documents() {
        let repo = InMemoryAffiliateRepository::default();
        repo.save(eligible_affiliate("603")).expect("saves");
        match repo.save(eligible_affiliate("603")) {
            Err(RepositoryError::Conflict) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn record_decision_is_conditional_on_pending() {
        let repo = InMemoryApplicationRepository::default();
        let application = pending_application(&repo);

        let decided = application
            .clone()
            .decided(
                coopcredit::credit::applications::RiskEvaluation::new(
                    810,
                    "stub bureau detail",
                    None,
                    true,
                    None,
                )
                .expect("evaluation is valid"),
                true,
                "Approved - Risk level: LOW",
            )
            .expect("pending application can be decided");

        repo.record_decision(decided.clone())
            .expect("first decision wins");

        // The second writer lost the race: the stored row is no longer
        // PENDING.
        match repo.record_decision(decided) {
            Err(RepositoryError::Conflict) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
