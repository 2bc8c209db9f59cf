use super::domain::{
    Affiliate, AffiliateId, ApplicationId, ApplicationStatus, CreditApplication,
};

/// Storage abstraction for affiliates so the service module can be exercised
/// in isolation. Saving assigns the numeric id and surfaces duplicate
/// documents as [`RepositoryError::Conflict`].
pub trait AffiliateRepository: Send + Sync {
    fn save(&self, affiliate: Affiliate) -> Result<Affiliate, RepositoryError>;
    fn find_by_id(&self, id: AffiliateId) -> Result<Option<Affiliate>, RepositoryError>;
    fn find_by_document(&self, document: &str) -> Result<Option<Affiliate>, RepositoryError>;
    fn exists_by_document(&self, document: &str) -> Result<bool, RepositoryError>;
    fn delete_by_id(&self, id: AffiliateId) -> Result<(), RepositoryError>;
}

/// Storage abstraction for credit applications.
///
/// `record_decision` is a conditional write: the stored row is replaced only
/// while its status is still PENDING, so at most one concurrent evaluation
/// can move an application out of PENDING. A losing attempt fails with
/// [`RepositoryError::Conflict`] instead of double-evaluating.
pub trait CreditApplicationRepository: Send + Sync {
    fn save(&self, application: CreditApplication)
        -> Result<CreditApplication, RepositoryError>;
    fn find_by_id(&self, id: ApplicationId)
        -> Result<Option<CreditApplication>, RepositoryError>;
    fn find_by_affiliate(
        &self,
        affiliate_id: AffiliateId,
    ) -> Result<Vec<CreditApplication>, RepositoryError>;
    fn find_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<CreditApplication>, RepositoryError>;
    fn find_all(&self) -> Result<Vec<CreditApplication>, RepositoryError>;
    fn record_decision(
        &self,
        application: CreditApplication,
    ) -> Result<CreditApplication, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or was decided concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
