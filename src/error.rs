//! Error taxonomy for the sync engine.
//!
//! Batch-fatal variants (`Configuration`, `TokenRefresh`, `Store`, and any
//! error raised before the per-invoice loop) abort the whole batch; everything
//! else is caught at the invoice boundary and recorded as a FAILURE row.

use thiserror::Error;

use crate::qbo::error::QboError;
use crate::repos::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("catalog resolution failed: {0}")]
    CatalogResolution(String),

    /// Remote call failed; the QuickBooks error text is preserved verbatim
    /// for operator diagnosis.
    #[error("{0}")]
    RemoteSubmission(#[from] QboError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
