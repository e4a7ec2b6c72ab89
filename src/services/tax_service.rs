//! Sales tax validation.
//!
//! Compares the taxes declared on an incoming invoice against the active tax
//! rates in the company file. Any mismatch blocks that invoice before a
//! single remote mutation happens. Rates are matched by tax-rate *name*; the
//! declared code is carried through for reporting only.

use crate::models::{DeclaredTax, InvoiceRequest, TaxMismatch};
use crate::qbo::types::TaxRate;

/// Name used for the synthetic labor tax entry and its invoice line.
pub const LABOR_TAX_NAME: &str = "Labor Tax";

/// The invoice's effective tax list: declared part taxes, plus a synthetic
/// labor tax entry when labor is taxed separately at a positive rate.
pub fn effective_taxes(invoice: &InvoiceRequest) -> Vec<DeclaredTax> {
    let mut taxes = invoice.parts_tax.clone();

    if !invoice.labor_tax_same_as_part {
        if let Some(percentage) = invoice.labor_tax_percentage {
            if percentage > 0.0 {
                taxes.push(DeclaredTax {
                    name: LABOR_TAX_NAME.to_string(),
                    code: LABOR_TAX_NAME.to_string(),
                    tax: percentage,
                    tax_amount: invoice.labor_tax,
                });
            }
        }
    }

    taxes
}

/// Compare declared taxes against the active ledger rates. An empty result
/// authorizes submission.
pub fn find_mismatches(declared: &[DeclaredTax], ledger_rates: &[TaxRate]) -> Vec<TaxMismatch> {
    let active: Vec<&TaxRate> = ledger_rates.iter().filter(|rate| rate.active).collect();

    let mut mismatches = Vec::new();
    for tax in declared {
        match active.iter().find(|rate| rate.name == tax.name) {
            None => mismatches.push(TaxMismatch {
                name: tax.name.clone(),
                code: tax.code.clone(),
                tax: format_rate(tax.tax),
                tax_in_qb: None,
                description: format!("{} not found in QuickBooks.", tax.code),
            }),
            Some(rate) => {
                let remote = rate.rate_value.unwrap_or(0.0);
                // Two-decimal string comparison absorbs float noise.
                if format_rate(tax.tax) != format_rate(remote) {
                    mismatches.push(TaxMismatch {
                        name: tax.name.clone(),
                        code: tax.code.clone(),
                        tax: format_rate(tax.tax),
                        tax_in_qb: Some(format_rate(remote)),
                        description:
                            "Tax rate mismatch between the work-order system and QuickBooks."
                                .to_string(),
                    });
                }
            }
        }
    }

    mismatches
}

fn format_rate(value: f64) -> String {
    format!("{:.2} %", value)
}
