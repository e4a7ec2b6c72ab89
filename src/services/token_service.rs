//! Token lifecycle management.
//!
//! Every batch obtains its session through [`TokenManager::ensure_session`],
//! which refreshes the stored credential when it is inside the expiry buffer.
//! Refreshes are single-flight: concurrent callers serialize on one lock so
//! the refresh token is never presented to the authorization server twice.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::error::SyncError;
use crate::qbo::api::QboApi;
use crate::qbo::QboSession;
use crate::repos::CredentialStore;

/// Refresh proactively when the access token expires within this window.
pub const REFRESH_BUFFER_SECS: i64 = 120;

/// Interval for the background refresh loop.
const BACKGROUND_REFRESH_SECS: u64 = 30 * 60;

pub struct TokenManager<L, S> {
    ledger: Arc<L>,
    store: Arc<S>,
    refresh_lock: Mutex<()>,
}

impl<L, S> TokenManager<L, S>
where
    L: QboApi,
    S: CredentialStore,
{
    pub fn new(ledger: Arc<L>, store: Arc<S>) -> Self {
        TokenManager {
            ledger,
            store,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Return a session backed by an unexpired access token, refreshing it
    /// first if the stored one expires within the buffer window. On refresh
    /// failure the stored credential is left untouched.
    pub async fn ensure_session(&self) -> Result<QboSession, SyncError> {
        let _guard = self.refresh_lock.lock().await;

        let credential = self.store.load().await?;

        if credential.token_expiry - Utc::now() > Duration::seconds(REFRESH_BUFFER_SECS) {
            return Ok(QboSession {
                realm_id: credential.realm_id,
                access_token: credential.access_token,
            });
        }

        tracing::info!(realm_id = %credential.realm_id, "access token near expiry, refreshing");

        let token = self
            .ledger
            .refresh_token(&credential.refresh_token)
            .await
            .map_err(|e| SyncError::TokenRefresh(e.to_string()))?;

        let expiry = Utc::now() + Duration::seconds(token.expires_in);
        self.store
            .save_tokens(
                credential.id,
                &token.access_token,
                &token.refresh_token,
                expiry,
            )
            .await?;

        tracing::info!(realm_id = %credential.realm_id, %expiry, "access token refreshed");

        Ok(QboSession {
            realm_id: credential.realm_id,
            access_token: token.access_token,
        })
    }
}

impl<L, S> TokenManager<L, S>
where
    L: QboApi + 'static,
    S: CredentialStore + 'static,
{
    /// Keep the access token warm between batches. Failures are logged and
    /// retried on the next tick; the next batch surfaces them if they persist.
    pub fn spawn_refresh_loop(self: Arc<Self>) {
        let manager = self;
        tokio::spawn(async move {
            let mut ticker =
                tokio::time::interval(std::time::Duration::from_secs(BACKGROUND_REFRESH_SECS));
            loop {
                ticker.tick().await;
                if let Err(e) = manager.ensure_session().await {
                    tracing::warn!(error = %e, "background token refresh failed");
                }
            }
        });
    }
}
