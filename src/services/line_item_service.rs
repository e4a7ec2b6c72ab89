//! Line item construction.
//!
//! Flattens the work-order invoice lines (parts, labor, misc charges,
//! disposal fees) into QuickBooks sales item lines, appends the synthetic
//! labor tax line and the trailing percent discount, and applies the
//! jurisdiction rule for how tax is addressed.

use std::collections::HashMap;

use crate::error::SyncError;
use crate::models::{CompanyConfig, InvoiceRequest};
use crate::qbo::api::QboApi;
use crate::qbo::invoice::{
    DiscountLineDetail, InvoiceLineItem, SalesItemLineDetail, TaxLine, TaxLineDetail,
    TxnTaxDetail,
};
use crate::qbo::types::{CompanyInfo, NamedRef};
use crate::qbo::QboSession;

use super::catalog_service::{
    self, ITEM_DISPOSAL_FEE, ITEM_LABOR, ITEM_LABOR_TAX, ITEM_MISC_CHARGES, ITEM_PARTS,
    ZERO_RATED_NON_TAX_CODE, ZERO_RATED_TAX_CODE,
};

/// Global pseudo tax codes accepted by US company files.
const GLOBAL_TAXABLE_CODE: &str = "TAX";
const GLOBAL_NON_TAXABLE_CODE: &str = "NON";

/// How the tenant's jurisdiction addresses tax on invoice lines.
///
/// US company files take the flat "TAX"/"NON" markers per line plus one
/// aggregate tax-detail block; everywhere else each line references a named
/// tax code and no aggregate block is sent. Decided once per invoice from a
/// single company-info lookup and applied to every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxAddressing {
    FlatMarker,
    ItemizedCodes,
}

pub fn tax_addressing(company: &CompanyInfo) -> TaxAddressing {
    match company.country.as_deref() {
        // US files frequently omit Country entirely.
        Some("US") | Some("United States") | None => TaxAddressing::FlatMarker,
        Some(_) => TaxAddressing::ItemizedCodes,
    }
}

/// Build the complete line list for one invoice.
pub async fn build_line_items<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    config: &CompanyConfig,
    invoice: &InvoiceRequest,
    addressing: TaxAddressing,
) -> Result<Vec<InvoiceLineItem>, SyncError> {
    let mut items = ItemCache::default();
    let mut codes = TaxCodeCache::default();
    let mut lines = Vec::new();

    // Parts tax entries share one code per invoice in code-addressed files.
    let default_part_code = invoice
        .parts_tax
        .first()
        .map(|tax| tax.code.clone())
        .unwrap_or_else(|| ZERO_RATED_TAX_CODE.to_string());

    for line in &invoice.lines {
        for part in &line.parts {
            let code_name = part.tax_code.clone().unwrap_or_else(|| default_part_code.clone());
            lines.push(InvoiceLineItem {
                amount: Some(round2(part.total_amount)),
                detail_type: "SalesItemLineDetail".to_string(),
                description: Some(part.name.clone()),
                sales_item_line_detail: Some(SalesItemLineDetail {
                    item_ref: items.get(ledger, session, config, ITEM_PARTS).await?,
                    unit_price: Some(part.selling_price),
                    qty: Some(part.quantity),
                    tax_code_ref: Some(
                        codes
                            .taxable(ledger, session, config, addressing, &code_name)
                            .await?,
                    ),
                }),
                discount_line_detail: None,
            });
        }

        for labor in &line.labor {
            let code_ref = if invoice.labor_tax_same_as_part {
                codes
                    .taxable(ledger, session, config, addressing, &default_part_code)
                    .await?
            } else {
                codes.non_taxable(ledger, session, config, addressing).await?
            };
            lines.push(InvoiceLineItem {
                amount: Some(round2(labor.total_amount)),
                detail_type: "SalesItemLineDetail".to_string(),
                description: labor.description.clone(),
                sales_item_line_detail: Some(SalesItemLineDetail {
                    item_ref: items.get(ledger, session, config, ITEM_LABOR).await?,
                    unit_price: Some(labor.rate),
                    qty: Some(labor.hours),
                    tax_code_ref: Some(code_ref),
                }),
                discount_line_detail: None,
            });
        }

        for charge in &line.misc_charges {
            lines.push(InvoiceLineItem {
                amount: Some(round2(charge.total_amount)),
                detail_type: "SalesItemLineDetail".to_string(),
                description: charge.description.clone(),
                sales_item_line_detail: Some(SalesItemLineDetail {
                    item_ref: items.get(ledger, session, config, ITEM_MISC_CHARGES).await?,
                    unit_price: None,
                    qty: Some(1.0),
                    tax_code_ref: Some(
                        codes
                            .taxable(ledger, session, config, addressing, &default_part_code)
                            .await?,
                    ),
                }),
                discount_line_detail: None,
            });
        }

        for fee in &line.disposal_fees {
            lines.push(InvoiceLineItem {
                amount: Some(round2(fee.total_amount)),
                detail_type: "SalesItemLineDetail".to_string(),
                description: None,
                sales_item_line_detail: Some(SalesItemLineDetail {
                    item_ref: items.get(ledger, session, config, ITEM_DISPOSAL_FEE).await?,
                    unit_price: Some(fee.amount),
                    qty: Some(1.0),
                    tax_code_ref: Some(
                        codes
                            .taxable(ledger, session, config, addressing, &default_part_code)
                            .await?,
                    ),
                }),
                discount_line_detail: None,
            });
        }
    }

    // Labor taxed separately from parts posts as its own line.
    let labor_tax = invoice.labor_tax.unwrap_or(0.0);
    if !invoice.labor_tax_same_as_part && labor_tax > 0.0 {
        lines.push(InvoiceLineItem {
            amount: Some(round2(labor_tax)),
            detail_type: "SalesItemLineDetail".to_string(),
            description: None,
            sales_item_line_detail: Some(SalesItemLineDetail {
                item_ref: items.get(ledger, session, config, ITEM_LABOR_TAX).await?,
                unit_price: Some(labor_tax),
                qty: Some(1.0),
                tax_code_ref: Some(codes.non_taxable(ledger, session, config, addressing).await?),
            }),
            discount_line_detail: None,
        });
    }

    // Percent discount goes last so it applies to everything above it.
    if let Some(percent) = invoice.discount_percentage {
        if percent.is_finite() && percent > 0.0 {
            lines.push(InvoiceLineItem {
                amount: None,
                detail_type: "DiscountLineDetail".to_string(),
                description: None,
                sales_item_line_detail: None,
                discount_line_detail: Some(DiscountLineDetail {
                    percent_based: true,
                    discount_percent: Some(percent),
                }),
            });
        }
    }

    Ok(lines)
}

/// Aggregate tax block for flat-marker invoices; code-addressed invoices
/// carry their tax on the lines instead.
pub fn aggregate_tax_detail(invoice: &InvoiceRequest, addressing: TaxAddressing) -> Option<TxnTaxDetail> {
    if addressing != TaxAddressing::FlatMarker || invoice.parts_tax.is_empty() {
        return None;
    }

    Some(TxnTaxDetail {
        tax_line: invoice
            .parts_tax
            .iter()
            .map(|tax| TaxLine {
                detail_type: "TaxLineDetail".to_string(),
                tax_line_detail: TaxLineDetail {
                    tax_rate_ref: NamedRef::id(tax.code.clone()),
                },
            })
            .collect(),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-invoice cache so each structural item is resolved at most once.
#[derive(Default)]
struct ItemCache {
    ids: HashMap<&'static str, String>,
}

impl ItemCache {
    async fn get<L: QboApi + ?Sized>(
        &mut self,
        ledger: &L,
        session: &QboSession,
        config: &CompanyConfig,
        name: &'static str,
    ) -> Result<NamedRef, SyncError> {
        if let Some(id) = self.ids.get(name) {
            return Ok(NamedRef::id(id.clone()));
        }
        let id = catalog_service::resolve_service_item_id(ledger, session, config, name).await?;
        self.ids.insert(name, id.clone());
        Ok(NamedRef::id(id))
    }
}

/// Per-invoice cache for tax-code resolution in code-addressed files.
#[derive(Default)]
struct TaxCodeCache {
    ids: HashMap<String, String>,
}

impl TaxCodeCache {
    async fn taxable<L: QboApi + ?Sized>(
        &mut self,
        ledger: &L,
        session: &QboSession,
        config: &CompanyConfig,
        addressing: TaxAddressing,
        code_name: &str,
    ) -> Result<NamedRef, SyncError> {
        match addressing {
            TaxAddressing::FlatMarker => Ok(NamedRef::id(GLOBAL_TAXABLE_CODE)),
            TaxAddressing::ItemizedCodes => self.resolve(ledger, session, config, code_name).await,
        }
    }

    async fn non_taxable<L: QboApi + ?Sized>(
        &mut self,
        ledger: &L,
        session: &QboSession,
        config: &CompanyConfig,
        addressing: TaxAddressing,
    ) -> Result<NamedRef, SyncError> {
        match addressing {
            TaxAddressing::FlatMarker => Ok(NamedRef::id(GLOBAL_NON_TAXABLE_CODE)),
            TaxAddressing::ItemizedCodes => {
                self.resolve(ledger, session, config, ZERO_RATED_NON_TAX_CODE).await
            }
        }
    }

    async fn resolve<L: QboApi + ?Sized>(
        &mut self,
        ledger: &L,
        session: &QboSession,
        config: &CompanyConfig,
        code_name: &str,
    ) -> Result<NamedRef, SyncError> {
        if let Some(id) = self.ids.get(code_name) {
            return Ok(NamedRef::id(id.clone()));
        }
        let id = catalog_service::resolve_tax_code_id(ledger, session, config, code_name).await?;
        self.ids.insert(code_name.to_string(), id.clone());
        Ok(NamedRef::id(id))
    }
}
