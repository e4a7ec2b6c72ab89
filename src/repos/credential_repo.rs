//! Postgres-backed credential store. One logical row per ledger connection;
//! only the token manager writes here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::QboCredential;

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        PgCredentialStore { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn load(&self) -> Result<QboCredential, StoreError> {
        let credential = sqlx::query_as::<_, QboCredential>(
            r#"
            SELECT id, realm_id, access_token, refresh_token, token_expiry,
                   minor_version, refresh_token_expired
            FROM qbo_credentials
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        credential.ok_or_else(|| {
            StoreError::NotFound("no QuickBooks credential stored; connect the company first".to_string())
        })
    }

    async fn save_tokens(
        &self,
        id: Uuid,
        access_token: &str,
        refresh_token: &str,
        token_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE qbo_credentials
            SET access_token = $2,
                refresh_token = $3,
                token_expiry = $4,
                access_token_refreshed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
