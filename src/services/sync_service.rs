//! Invoice reconciliation and submission engine.
//!
//! Orchestrates one batch: company config and session are resolved up front
//! (batch-fatal on failure), tax rates are fetched once and held for the
//! whole batch, then each invoice runs the full pipeline inside its own
//! failure boundary. Every invoice that passes tax validation ends in exactly
//! one remote create call and exactly one upsert into the local mirror.

use std::sync::Arc;

use crate::error::SyncError;
use crate::models::{CompanyConfig, InvoiceOutcome, InvoiceRequest, SyncBatchRequest};
use crate::qbo::api::QboApi;
use crate::qbo::invoice::CreateInvoiceRequest;
use crate::qbo::types::{NamedRef, PhysicalAddress, TaxRate};
use crate::qbo::QboSession;
use crate::repos::{CompanyConfigStore, CredentialStore, RecordStore};

use super::catalog_service;
use super::customer_service;
use super::line_item_service;
use super::reconcile::{self, RemoteLookup};
use super::tax_service;
use super::token_service::TokenManager;

pub struct SyncEngine<L, CS, RS, CC> {
    ledger: Arc<L>,
    tokens: Arc<TokenManager<L, CS>>,
    records: Arc<RS>,
    configs: Arc<CC>,
}

impl<L, CS, RS, CC> SyncEngine<L, CS, RS, CC>
where
    L: QboApi,
    CS: CredentialStore,
    RS: RecordStore,
    CC: CompanyConfigStore,
{
    pub fn new(
        ledger: Arc<L>,
        tokens: Arc<TokenManager<L, CS>>,
        records: Arc<RS>,
        configs: Arc<CC>,
    ) -> Self {
        SyncEngine {
            ledger,
            tokens,
            records,
            configs,
        }
    }

    /// Process a batch of invoice requests sequentially. Batch-fatal errors
    /// (missing config, token refresh, the batch tax fetch) abort before any
    /// invoice is attempted; per-invoice errors are recorded and isolated.
    pub async fn process_batch(
        &self,
        batch: &SyncBatchRequest,
    ) -> Result<Vec<InvoiceOutcome>, SyncError> {
        let config = self
            .configs
            .find(&batch.company_config_code)
            .await?
            .ok_or_else(|| {
                SyncError::Configuration(format!(
                    "company config not found: {}",
                    batch.company_config_code
                ))
            })?;

        let session = self.tokens.ensure_session().await?;

        let tax_rates = self.ledger.find_tax_rates(&session).await?;
        tracing::info!(
            company = %config.config_code,
            rates = tax_rates.len(),
            invoices = batch.invoices.len(),
            "processing invoice batch"
        );

        let term_id = catalog_service::resolve_term_id(&*self.ledger, &session, &config.terms).await?;

        // Missing terms or tax-agency mappings are configuration defects;
        // surface them before any invoice is attempted.
        catalog_service::resolve_tax_agency_id(&*self.ledger, &session, &config.sales_tax_agency)
            .await?;

        let mut outcomes = Vec::with_capacity(batch.invoices.len());
        for invoice in &batch.invoices {
            let outcome = self
                .process_invoice(&session, &config, &term_id, &tax_rates, invoice)
                .await;

            match outcome {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    // The invoice boundary: record the failure and move on.
                    let message = e.to_string();
                    tracing::error!(
                        work_order_id = %invoice.work_order_id,
                        error = %message,
                        "invoice submission failed"
                    );
                    if let Err(store_err) = self
                        .records
                        .upsert_failure(
                            &invoice.work_order_id,
                            &config.config_code,
                            &message,
                            invoice.invoice_date,
                        )
                        .await
                    {
                        tracing::error!(
                            work_order_id = %invoice.work_order_id,
                            error = %store_err,
                            "failed to record invoice failure"
                        );
                    }
                    outcomes.push(InvoiceOutcome::failure(
                        &invoice.work_order_id,
                        "Invoice submission failed.",
                        message,
                    ));
                }
            }
        }

        Ok(outcomes)
    }

    async fn process_invoice(
        &self,
        session: &QboSession,
        config: &CompanyConfig,
        term_id: &str,
        tax_rates: &[TaxRate],
        invoice: &InvoiceRequest,
    ) -> Result<InvoiceOutcome, SyncError> {
        // Tax validation gates everything: a mismatch means no customer
        // lookup, no line construction, no remote mutation.
        let declared = tax_service::effective_taxes(invoice);
        let mismatches = tax_service::find_mismatches(&declared, tax_rates);
        if !mismatches.is_empty() {
            tracing::warn!(
                work_order_id = %invoice.work_order_id,
                mismatches = mismatches.len(),
                "sales tax mismatch, invoice blocked"
            );
            let detail = serde_json::to_string(&mismatches).unwrap_or_default();
            self.records
                .upsert_failure(
                    &invoice.work_order_id,
                    &config.config_code,
                    &format!("Sales tax does not match for company: {}", detail),
                    invoice.invoice_date,
                )
                .await?;
            return Ok(InvoiceOutcome::tax_failure(
                &invoice.work_order_id,
                mismatches,
            ));
        }

        let customer =
            customer_service::resolve_or_create(&*self.ledger, session, &invoice.to).await?;

        let decision = self.decide_submission(session, config, invoice).await?;

        let company = self.ledger.get_company_info(session).await?;
        let addressing = line_item_service::tax_addressing(&company);

        let lines = line_item_service::build_line_items(
            &*self.ledger,
            session,
            config,
            invoice,
            addressing,
        )
        .await?;

        if let Some(prior_id) = &decision.delete_target {
            self.delete_prior_invoice(session, prior_id).await;
        }

        let request = CreateInvoiceRequest {
            line: lines,
            customer_ref: NamedRef::id(customer.id),
            txn_date: invoice.invoice_date.format("%Y-%m-%d").to_string(),
            doc_number: if config.keep_qb_invoice_number {
                None
            } else {
                Some(invoice.work_order_id.clone())
            },
            sales_term_ref: Some(NamedRef::id(term_id)),
            total_amt: Some(invoice.final_total),
            bill_addr: invoice.to.address.as_ref().map(|address| PhysicalAddress {
                line1: address.line1.clone(),
                line2: address.line2.clone(),
                city: address.city.clone(),
                country_sub_division_code: address.state.clone(),
                postal_code: address.zipcode.clone(),
                country: address.country.clone(),
            }),
            due_date: Some(invoice.invoice_date.format("%Y-%m-%d").to_string()),
            txn_tax_detail: line_item_service::aggregate_tax_detail(invoice, addressing),
            private_note: invoice.po_number.clone(),
        };

        let created = self.ledger.create_invoice(session, &request).await?;
        tracing::info!(
            work_order_id = %invoice.work_order_id,
            invoice_id = %created.id,
            status = %decision.status,
            "invoice submitted to QuickBooks"
        );

        self.records
            .upsert_success(
                &invoice.work_order_id,
                &config.config_code,
                &created.id,
                created.doc_number.as_deref(),
                decision.status,
                invoice.invoice_date,
            )
            .await?;

        Ok(InvoiceOutcome::success(
            &invoice.work_order_id,
            decision.status,
            created.id,
            created.doc_number,
        ))
    }

    /// Run the pure decision table, performing the remote lookup only when a
    /// caller-supplied hint is the sole evidence of a prior invoice.
    async fn decide_submission(
        &self,
        session: &QboSession,
        config: &CompanyConfig,
        invoice: &InvoiceRequest,
    ) -> Result<reconcile::SubmissionDecision, SyncError> {
        let prior = self
            .records
            .find(&invoice.work_order_id, &config.config_code)
            .await?;

        let record_has_invoice = prior
            .as_ref()
            .map(|r| r.qbo_invoice_id.is_some())
            .unwrap_or(false);

        let lookup = match &invoice.prior_invoice_id {
            Some(prior_id) if !record_has_invoice => {
                if self.ledger.get_invoice(session, prior_id).await?.is_some() {
                    RemoteLookup::Found
                } else {
                    // The id may be stale; an old invoice can still be
                    // sitting under this work order's document number.
                    let by_doc = self
                        .ledger
                        .find_invoices_by_doc_number(session, &invoice.work_order_id)
                        .await?;
                    if by_doc.is_empty() {
                        RemoteLookup::NotFound
                    } else {
                        RemoteLookup::Found
                    }
                }
            }
            _ => RemoteLookup::NotAttempted,
        };

        Ok(reconcile::decide(
            prior.as_ref(),
            invoice.prior_invoice_id.as_deref(),
            lookup,
        ))
    }

    /// QuickBooks has no atomic replace: delete the superseded invoice best
    /// effort and leave any failure for manual cleanup.
    async fn delete_prior_invoice(&self, session: &QboSession, prior_id: &str) {
        match self.ledger.get_invoice(session, prior_id).await {
            Ok(Some(prior)) => {
                let sync_token = prior.sync_token.unwrap_or_else(|| "0".to_string());
                if let Err(e) = self
                    .ledger
                    .delete_invoice(session, prior_id, &sync_token)
                    .await
                {
                    tracing::warn!(
                        invoice_id = prior_id,
                        error = %e,
                        "failed to delete superseded invoice, leaving for manual cleanup"
                    );
                }
            }
            Ok(None) => {
                tracing::warn!(invoice_id = prior_id, "superseded invoice no longer exists");
            }
            Err(e) => {
                tracing::warn!(
                    invoice_id = prior_id,
                    error = %e,
                    "could not fetch superseded invoice before delete"
                );
            }
        }
    }
}
