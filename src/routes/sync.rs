//! Batch invoice submission endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::sync::Arc;

use crate::error::SyncError;
use crate::models::{SyncBatchRequest, SyncBatchResponse};
use crate::qbo::api::QboApi;
use crate::repos::{CompanyConfigStore, CredentialStore, RecordStore};
use crate::services::sync_service::SyncEngine;

/// Error response wrapper
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub struct SyncHttpError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for SyncHttpError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Map batch-fatal engine errors to HTTP status codes. Per-invoice failures
/// never reach this point; they ride inside the 201 response body.
fn map_error(error: SyncError) -> SyncHttpError {
    match error {
        SyncError::Configuration(_) => SyncHttpError {
            status: StatusCode::NOT_FOUND,
            message: error.to_string(),
        },
        SyncError::CatalogResolution(_) => SyncHttpError {
            status: StatusCode::BAD_REQUEST,
            message: error.to_string(),
        },
        SyncError::TokenRefresh(_) | SyncError::RemoteSubmission(_) => SyncHttpError {
            status: StatusCode::BAD_GATEWAY,
            message: error.to_string(),
        },
        SyncError::Store(_) => SyncHttpError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Database error".to_string(), // Don't leak internal details
        },
    }
}

pub fn sync_router<L, CS, RS, CC>(engine: Arc<SyncEngine<L, CS, RS, CC>>) -> Router
where
    L: QboApi + 'static,
    CS: CredentialStore + 'static,
    RS: RecordStore + 'static,
    CC: CompanyConfigStore + 'static,
{
    Router::new()
        .route("/api/qbo/invoices", post(submit_invoices::<L, CS, RS, CC>))
        .with_state(engine)
}

/// Handler for POST /api/qbo/invoices
///
/// Accepts a batch of invoice requests plus a company selector and responds
/// 201 with a per-invoice result list.
async fn submit_invoices<L, CS, RS, CC>(
    State(engine): State<Arc<SyncEngine<L, CS, RS, CC>>>,
    Json(batch): Json<SyncBatchRequest>,
) -> Result<(StatusCode, Json<SyncBatchResponse>), SyncHttpError>
where
    L: QboApi + 'static,
    CS: CredentialStore + 'static,
    RS: RecordStore + 'static,
    CC: CompanyConfigStore + 'static,
{
    let invoices = engine.process_batch(&batch).await.map_err(map_error)?;

    Ok((
        StatusCode::CREATED,
        Json(SyncBatchResponse {
            message: "Invoices processed".to_string(),
            invoices,
        }),
    ))
}
