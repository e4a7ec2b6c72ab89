//! Read-only access to per-company connector settings.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{CompanyConfigStore, StoreError};
use crate::models::CompanyConfig;

#[derive(Clone)]
pub struct PgCompanyConfigStore {
    pool: PgPool,
}

impl PgCompanyConfigStore {
    pub fn new(pool: PgPool) -> Self {
        PgCompanyConfigStore { pool }
    }
}

#[async_trait]
impl CompanyConfigStore for PgCompanyConfigStore {
    async fn find(&self, config_code: &str) -> Result<Option<CompanyConfig>, StoreError> {
        let config = sqlx::query_as::<_, CompanyConfig>(
            r#"
            SELECT config_code, display_name, terms, keep_qb_invoice_number,
                   sales_tax_agency
            FROM qbo_company_configs
            WHERE config_code = $1
            "#,
        )
        .bind(config_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }
}
