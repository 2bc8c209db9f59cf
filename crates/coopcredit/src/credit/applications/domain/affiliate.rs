use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{whole_months_between, AffiliateId, ValidationError};

/// Seniority an affiliate must accumulate before applying for credit.
pub const MINIMUM_SENIORITY_MONTHS: i32 = 6;

/// Membership status of a cooperative affiliate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AffiliateStatus {
    Active,
    Inactive,
    Suspended,
}

impl AffiliateStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AffiliateStatus::Active => "ACTIVE",
            AffiliateStatus::Inactive => "INACTIVE",
            AffiliateStatus::Suspended => "SUSPENDED",
        }
    }
}

/// A cooperative member who can request credit products.
///
/// The document string is the unique business key; the numeric id is assigned
/// by the persistence collaborator on first save. Eligibility combines the
/// ACTIVE status with the minimum-seniority rule. All date checks use UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct Affiliate {
    id: Option<AffiliateId>,
    document: String,
    name: String,
    salary: Decimal,
    affiliation_date: NaiveDate,
    status: AffiliateStatus,
}

impl Affiliate {
    /// Validating constructor over the full field set.
    pub fn new(
        id: Option<AffiliateId>,
        document: impl Into<String>,
        name: impl Into<String>,
        salary: Decimal,
        affiliation_date: NaiveDate,
        status: AffiliateStatus,
    ) -> Result<Self, ValidationError> {
        let document = document.into().trim().to_string();
        let name = name.into().trim().to_string();

        if document.is_empty() {
            return Err(ValidationError::EmptyDocument);
        }
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if salary <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveSalary);
        }
        if affiliation_date > Utc::now().date_naive() {
            return Err(ValidationError::AffiliationDateInFuture);
        }

        Ok(Self {
            id,
            document,
            name,
            salary,
            affiliation_date,
            status,
        })
    }

    /// Registration entry point: status defaults to ACTIVE and the
    /// affiliation date defaults to today when unspecified.
    pub fn register(
        document: impl Into<String>,
        name: impl Into<String>,
        salary: Decimal,
        affiliation_date: Option<NaiveDate>,
        status: Option<AffiliateStatus>,
    ) -> Result<Self, ValidationError> {
        Self::new(
            None,
            document,
            name,
            salary,
            affiliation_date.unwrap_or_else(|| Utc::now().date_naive()),
            status.unwrap_or(AffiliateStatus::Active),
        )
    }

    /// Replacement carrying the persistence-assigned identifier.
    pub fn with_id(self, id: AffiliateId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }

    /// Replacement with updated mutable attributes; the document and the
    /// affiliation date are part of the member's identity and do not change.
    pub fn updated(
        &self,
        name: impl Into<String>,
        salary: Decimal,
        status: AffiliateStatus,
    ) -> Result<Self, ValidationError> {
        Self::new(
            self.id,
            self.document.clone(),
            name,
            salary,
            self.affiliation_date,
            status,
        )
    }

    pub fn is_active(&self) -> bool {
        self.status == AffiliateStatus::Active
    }

    pub fn has_minimum_seniority(&self) -> bool {
        self.has_minimum_seniority_as_of(Utc::now().date_naive())
    }

    pub fn has_minimum_seniority_as_of(&self, today: NaiveDate) -> bool {
        self.months_of_seniority_as_of(today) >= MINIMUM_SENIORITY_MONTHS
    }

    pub fn months_of_seniority(&self) -> i32 {
        self.months_of_seniority_as_of(Utc::now().date_naive())
    }

    pub fn months_of_seniority_as_of(&self, today: NaiveDate) -> i32 {
        whole_months_between(self.affiliation_date, today)
    }

    pub fn can_apply_for_credit(&self) -> bool {
        self.is_active() && self.has_minimum_seniority()
    }

    pub fn can_apply_for_credit_as_of(&self, today: NaiveDate) -> bool {
        self.is_active() && self.has_minimum_seniority_as_of(today)
    }

    /// Maximum credit this affiliate can request for the given salary
    /// multiplier. No rounding is applied beyond the decimal's own precision.
    pub fn max_credit_amount(&self, multiplier: u32) -> Decimal {
        self.salary * Decimal::from(multiplier)
    }

    pub fn id(&self) -> Option<AffiliateId> {
        self.id
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn salary(&self) -> Decimal {
        self.salary
    }

    pub fn affiliation_date(&self) -> NaiveDate {
        self.affiliation_date
    }

    pub fn status(&self) -> AffiliateStatus {
        self.status
    }
}
