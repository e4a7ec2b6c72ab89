//! Domain models: the incoming invoice payload from the work-order system,
//! the persisted rows, and the per-invoice batch results.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================
// INCOMING INVOICE PAYLOAD
// ============================================================

/// One invoice request generated from a work order. Immutable for the
/// duration of processing; amounts are computed by the caller and trusted
/// as-is apart from display rounding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRequest {
    pub work_order_id: String,
    /// Billed party ("to" in the work-order system's payload).
    pub to: BilledParty,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    #[serde(default)]
    pub parts_tax: Vec<DeclaredTax>,
    #[serde(default = "default_true")]
    pub labor_tax_same_as_part: bool,
    #[serde(default)]
    pub labor_tax_percentage: Option<f64>,
    /// Labor tax amount, used for the synthetic Labor Tax line.
    #[serde(default)]
    pub labor_tax: Option<f64>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub discount_amount: Option<f64>,
    pub invoice_date: NaiveDate,
    pub final_total: f64,
    /// Remote invoice id from an earlier submission the caller knows about.
    /// The local record, when present, always wins over this hint.
    #[serde(default)]
    pub prior_invoice_id: Option<String>,
    #[serde(default)]
    pub po_number: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BilledParty {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub address: Option<PostalAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostalAddress {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A work-order invoice line groups the billable entries for one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    #[serde(default)]
    pub parts: Vec<PartLine>,
    #[serde(default)]
    pub labor: Vec<LaborLine>,
    #[serde(default)]
    pub misc_charges: Vec<MiscChargeLine>,
    #[serde(default)]
    pub disposal_fees: Vec<DisposalFeeLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartLine {
    pub name: String,
    pub quantity: f64,
    pub selling_price: f64,
    pub total_amount: f64,
    #[serde(default)]
    pub tax_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaborLine {
    #[serde(default)]
    pub description: Option<String>,
    pub hours: f64,
    pub rate: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiscChargeLine {
    #[serde(default)]
    pub description: Option<String>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisposalFeeLine {
    pub amount: f64,
    pub total_amount: f64,
}

/// A tax the work-order system declared on the invoice (rate in percent).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclaredTax {
    pub name: String,
    pub code: String,
    pub tax: f64,
    #[serde(default)]
    pub tax_amount: Option<f64>,
}

// ============================================================
// TAX VALIDATION OUTPUT
// ============================================================

/// Produced by the tax validator; reported to the caller, never persisted
/// as its own entity. Field names match the wire format the work-order
/// system already consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxMismatch {
    pub name: String,
    pub code: String,
    /// Declared rate, formatted to two decimals ("5.00 %").
    pub tax: String,
    /// Active QuickBooks rate when the rates disagree; absent when the tax
    /// was not found at all.
    #[serde(rename = "taxInQB", skip_serializing_if = "Option::is_none")]
    pub tax_in_qb: Option<String>,
    pub description: String,
}

// ============================================================
// PERSISTED ROWS
// ============================================================

/// Stored OAuth credential for one QuickBooks connection.
#[derive(Debug, Clone, FromRow)]
pub struct QboCredential {
    pub id: Uuid,
    pub realm_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expiry: DateTime<Utc>,
    pub minor_version: i32,
    pub refresh_token_expired: bool,
}

/// Per-company connector settings, read-only during a batch.
#[derive(Debug, Clone, FromRow)]
pub struct CompanyConfig {
    pub config_code: String,
    pub display_name: String,
    pub terms: String,
    pub keep_qb_invoice_number: bool,
    pub sales_tax_agency: String,
}

/// Local mirror of the last submission outcome for one work order. At most
/// one row per (work_order_id, company_config_code); every attempt upserts.
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRecord {
    pub id: Uuid,
    pub work_order_id: String,
    pub company_config_code: String,
    pub qbo_invoice_id: Option<String>,
    pub doc_number: Option<String>,
    pub status: String,
    pub invoice_date: Option<NaiveDate>,
    pub processed_at: DateTime<Utc>,
    pub error_message: String,
}

/// Resolved status of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Created,
    Updated,
    OldInvoiceNotFound,
    DuplicateOldInvoicesFound,
    Failure,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Created => "CREATED",
            RecordStatus::Updated => "UPDATED",
            RecordStatus::OldInvoiceNotFound => "OLD INVOICE NOT FOUND",
            RecordStatus::DuplicateOldInvoicesFound => "DUPLICATE OLD INVOICES FOUND",
            RecordStatus::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// BATCH REQUEST / RESPONSE
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatchRequest {
    pub company_config_code: String,
    pub invoices: Vec<InvoiceRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatchResponse {
    pub message: String,
    pub invoices: Vec<InvoiceOutcome>,
}

/// Per-invoice result element; either the persisted success record or the
/// persisted failure record with its diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceOutcome {
    pub work_order_id: String,
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tax_details: Vec<TaxMismatch>,
}

impl InvoiceOutcome {
    pub fn success(
        work_order_id: &str,
        status: RecordStatus,
        invoice_id: String,
        doc_number: Option<String>,
    ) -> Self {
        InvoiceOutcome {
            work_order_id: work_order_id.to_string(),
            status: status.as_str().to_string(),
            message: "Invoice created successfully.".to_string(),
            invoice_id: Some(invoice_id),
            doc_number,
            error_message: None,
            tax_details: Vec::new(),
        }
    }

    pub fn failure(work_order_id: &str, message: &str, error_message: String) -> Self {
        InvoiceOutcome {
            work_order_id: work_order_id.to_string(),
            status: RecordStatus::Failure.as_str().to_string(),
            message: message.to_string(),
            invoice_id: None,
            doc_number: None,
            error_message: Some(error_message),
            tax_details: Vec::new(),
        }
    }

    pub fn tax_failure(work_order_id: &str, mismatches: Vec<TaxMismatch>) -> Self {
        InvoiceOutcome {
            work_order_id: work_order_id.to_string(),
            status: RecordStatus::Failure.as_str().to_string(),
            message: "Sales tax does not match for company".to_string(),
            invoice_id: None,
            doc_number: None,
            error_message: None,
            tax_details: mismatches,
        }
    }
}
