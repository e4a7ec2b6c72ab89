use serde::Serialize;

use super::error::QboError;
use super::types::{Invoice, NamedRef, PhysicalAddress};
use super::{escape_query_value, QboClient, QboSession};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateInvoiceRequest {
    pub line: Vec<InvoiceLineItem>,
    pub customer_ref: NamedRef,
    pub txn_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_term_ref: Option<NamedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txn_tax_detail: Option<TxnTaxDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
}

/// One invoice line; either a sales item line or the trailing discount line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InvoiceLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub detail_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_item_line_detail: Option<SalesItemLineDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_line_detail: Option<DiscountLineDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesItemLineDetail {
    pub item_ref: NamedRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code_ref: Option<NamedRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DiscountLineDetail {
    pub percent_based: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
}

/// Aggregate tax block used when the tenant's jurisdiction does not address
/// tax through per-line codes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TxnTaxDetail {
    pub tax_line: Vec<TaxLine>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxLine {
    pub detail_type: String,
    pub tax_line_detail: TaxLineDetail,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxLineDetail {
    pub tax_rate_ref: NamedRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteInvoiceRequest {
    id: String,
    sync_token: String,
}

impl QboClient {
    /// Create an invoice
    pub async fn create_invoice(
        &self,
        session: &QboSession,
        request: &CreateInvoiceRequest,
    ) -> Result<Invoice, QboError> {
        self.create_entity(session, "Invoice", "invoice", request)
            .await
    }

    /// Look up a single invoice by remote id. A miss is `None`, not an error.
    pub async fn get_invoice(
        &self,
        session: &QboSession,
        invoice_id: &str,
    ) -> Result<Option<Invoice>, QboError> {
        let query = format!(
            "select * from Invoice where Id = '{}'",
            escape_query_value(invoice_id)
        );
        let mut found: Vec<Invoice> = self.query(session, "Invoice", &query).await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.remove(0))
        })
    }

    /// Find invoices carrying the given document number.
    pub async fn find_invoices_by_doc_number(
        &self,
        session: &QboSession,
        doc_number: &str,
    ) -> Result<Vec<Invoice>, QboError> {
        let query = format!(
            "select * from Invoice where DocNumber = '{}'",
            escape_query_value(doc_number)
        );
        self.query(session, "Invoice", &query).await
    }

    /// Hard-delete an invoice. QBO has no atomic replace; callers treat this
    /// as best effort before re-creating.
    pub async fn delete_invoice(
        &self,
        session: &QboSession,
        invoice_id: &str,
        sync_token: &str,
    ) -> Result<(), QboError> {
        let body = DeleteInvoiceRequest {
            id: invoice_id.to_string(),
            sync_token: sync_token.to_string(),
        };
        self.post_json(session, "invoice", &body, &[("operation", "delete")])
            .await?;
        Ok(())
    }
}
