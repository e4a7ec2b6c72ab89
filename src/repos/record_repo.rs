//! Postgres-backed invoice record store. Every submission attempt upserts
//! against the (work_order_id, company_config_code) key so retries overwrite
//! rather than accumulate; rows are never deleted here.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use super::{RecordStore, StoreError};
use crate::models::{InvoiceRecord, RecordStatus};

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        PgRecordStore { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find(
        &self,
        work_order_id: &str,
        company_config_code: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        let record = sqlx::query_as::<_, InvoiceRecord>(
            r#"
            SELECT id, work_order_id, company_config_code, qbo_invoice_id,
                   doc_number, status, invoice_date, processed_at, error_message
            FROM qbo_invoice_records
            WHERE work_order_id = $1 AND company_config_code = $2
            "#,
        )
        .bind(work_order_id)
        .bind(company_config_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert_success(
        &self,
        work_order_id: &str,
        company_config_code: &str,
        qbo_invoice_id: &str,
        doc_number: Option<&str>,
        status: RecordStatus,
        invoice_date: NaiveDate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO qbo_invoice_records
                (work_order_id, company_config_code, qbo_invoice_id, doc_number,
                 status, invoice_date, processed_at, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), '')
            ON CONFLICT (work_order_id, company_config_code) DO UPDATE
            SET qbo_invoice_id = EXCLUDED.qbo_invoice_id,
                doc_number = EXCLUDED.doc_number,
                status = EXCLUDED.status,
                invoice_date = EXCLUDED.invoice_date,
                processed_at = NOW(),
                error_message = '',
                updated_at = NOW()
            "#,
        )
        .bind(work_order_id)
        .bind(company_config_code)
        .bind(qbo_invoice_id)
        .bind(doc_number)
        .bind(status.as_str())
        .bind(invoice_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn upsert_failure(
        &self,
        work_order_id: &str,
        company_config_code: &str,
        error_message: &str,
        invoice_date: NaiveDate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO qbo_invoice_records
                (work_order_id, company_config_code, status, invoice_date,
                 processed_at, error_message)
            VALUES ($1, $2, $3, $4, NOW(), $5)
            ON CONFLICT (work_order_id, company_config_code) DO UPDATE
            SET status = EXCLUDED.status,
                invoice_date = EXCLUDED.invoice_date,
                processed_at = NOW(),
                error_message = EXCLUDED.error_message,
                updated_at = NOW()
            "#,
        )
        .bind(work_order_id)
        .bind(company_config_code)
        .bind(RecordStatus::Failure.as_str())
        .bind(invoice_date)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
