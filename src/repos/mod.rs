//! Persistence seams consumed by the sync engine. Each store is a trait so
//! the engine can be exercised against in-memory doubles; the Postgres
//! implementations live in the sibling repo modules.

pub mod company_config_repo;
pub mod credential_repo;
pub mod record_repo;

pub use company_config_repo::PgCompanyConfigStore;
pub use credential_repo::PgCredentialStore;
pub use record_repo::PgRecordStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CompanyConfig, InvoiceRecord, QboCredential, RecordStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    NotFound(String),
}

/// Durable record of the current token pair for one QuickBooks connection.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<QboCredential, StoreError>;

    /// Persist a refreshed token pair and its new expiry in one write.
    async fn save_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: &str,
        token_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Local mirror of submission outcomes, keyed by (work order, company).
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find(
        &self,
        work_order_id: &str,
        company_config_code: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError>;

    #[allow(clippy::too_many_arguments)]
    async fn upsert_success(
        &self,
        work_order_id: &str,
        company_config_code: &str,
        qbo_invoice_id: &str,
        doc_number: Option<&str>,
        status: RecordStatus,
        invoice_date: NaiveDate,
    ) -> Result<(), StoreError>;

    async fn upsert_failure(
        &self,
        work_order_id: &str,
        company_config_code: &str,
        error_message: &str,
        invoice_date: NaiveDate,
    ) -> Result<(), StoreError>;
}

/// Per-company connector settings, supplied by the configuration collaborator.
#[async_trait]
pub trait CompanyConfigStore: Send + Sync {
    async fn find(&self, config_code: &str) -> Result<Option<CompanyConfig>, StoreError>;
}
