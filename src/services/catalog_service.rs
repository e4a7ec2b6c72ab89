//! Name-to-id resolution against the QuickBooks catalog, with idempotent
//! creation of the structural objects the connector owns (service items,
//! income account, zero-rate tax codes).
//!
//! Creation always follows a lookup miss, and a create conflict falls back to
//! a re-lookup, so concurrent bootstraps converge instead of duplicating.

use crate::error::SyncError;
use crate::models::CompanyConfig;
use crate::qbo::api::QboApi;
use crate::qbo::catalog::{CreateAccountRequest, CreateItemRequest};
use crate::qbo::error::QboError;
use crate::qbo::tax::{CreateTaxCodeRequest, TaxRateDetail};
use crate::qbo::types::NamedRef;
use crate::qbo::QboSession;

pub const SERVICE_INCOME_ACCOUNT: &str = "Service Income";

/// Zero-rate tax codes used for lines that carry no tax of their own.
pub const ZERO_RATED_TAX_CODE: &str = "FX";
pub const ZERO_RATED_NON_TAX_CODE: &str = "FXN";

/// Parent category item; the per-category service items are its sub-items.
pub const SERVICE_CATEGORY_ITEM: &str = "Field Service";
pub const ITEM_PARTS: &str = "Parts";
pub const ITEM_LABOR: &str = "Labor";
pub const ITEM_MISC_CHARGES: &str = "Miscellaneous Charges";
pub const ITEM_DISPOSAL_FEE: &str = "Disposal Fee";
pub const ITEM_LABOR_TAX: &str = "Labor Tax";

/// Resolve an item by exact name. Does not create.
pub async fn resolve_item_id<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    name: &str,
) -> Result<String, SyncError> {
    let found = ledger.find_items_by_name(session, name).await?;
    found
        .into_iter()
        .next()
        .map(|item| item.id)
        .ok_or_else(|| SyncError::CatalogResolution(format!("item not found: {}", name)))
}

/// Resolve one of the connector's structural service items, bootstrapping the
/// whole set on the first miss.
pub async fn resolve_service_item_id<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    config: &CompanyConfig,
    name: &str,
) -> Result<String, SyncError> {
    if let Ok(id) = resolve_item_id(ledger, session, name).await {
        return Ok(id);
    }

    tracing::info!(item = name, "service item missing, bootstrapping catalog");
    ensure_service_items(ledger, session, config).await?;
    resolve_item_id(ledger, session, name).await
}

/// Resolve a payment term by name. Terms come from company configuration, so
/// a miss is a configuration error (batch-fatal).
pub async fn resolve_term_id<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    name: &str,
) -> Result<String, SyncError> {
    let term = ledger.find_term_by_name(session, name).await?;
    term.map(|t| t.id)
        .ok_or_else(|| SyncError::Configuration(format!("payment term not found: {}", name)))
}

/// Resolve the configured sales tax agency by display name.
pub async fn resolve_tax_agency_id<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    name: &str,
) -> Result<String, SyncError> {
    let agencies = ledger.find_tax_agencies(session).await?;
    agencies
        .into_iter()
        .find(|agency| agency.display_name == name)
        .map(|agency| agency.id)
        .ok_or_else(|| SyncError::Configuration(format!("tax agency not found: {}", name)))
}

/// Resolve an income account by name, creating it on a lookup miss.
pub async fn resolve_account_id<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    name: &str,
) -> Result<String, SyncError> {
    if let Some(account) = ledger.find_account_by_name(session, name).await? {
        return Ok(account.id);
    }

    let request = CreateAccountRequest {
        name: name.to_string(),
        account_type: "Income".to_string(),
        account_sub_type: Some("ServiceFeeIncome".to_string()),
    };

    match ledger.create_account(session, &request).await {
        Ok(account) => Ok(account.id),
        Err(e) if e.is_client_error() => {
            // Lost a create race; the account should be there now.
            let again = ledger.find_account_by_name(session, name).await?;
            again
                .map(|account| account.id)
                .ok_or(SyncError::RemoteSubmission(e))
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve a tax code by name, creating a zero-rate code against the
/// configured agency on a lookup miss.
pub async fn resolve_tax_code_id<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    config: &CompanyConfig,
    name: &str,
) -> Result<String, SyncError> {
    if let Some(code) = ledger.find_tax_code_by_name(session, name).await? {
        return Ok(code.id);
    }

    let agency_id = resolve_tax_agency_id(ledger, session, &config.sales_tax_agency).await?;
    let request = CreateTaxCodeRequest {
        tax_code: name.to_string(),
        tax_rate_details: vec![TaxRateDetail {
            tax_rate_name: format!("{} rate", name),
            rate_value: 0.0,
            tax_agency_id: agency_id,
            tax_applicable_on: "Sales".to_string(),
        }],
    };

    match ledger.create_tax_code(session, &request).await {
        Ok(code) => Ok(code.id),
        Err(e) if e.is_client_error() => {
            let again = ledger.find_tax_code_by_name(session, name).await?;
            again
                .map(|code| code.id)
                .ok_or(SyncError::RemoteSubmission(e))
        }
        Err(e) => Err(e.into()),
    }
}

/// Create the connector's zero-rate tax codes if they are missing.
pub async fn ensure_default_tax_codes<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    config: &CompanyConfig,
) -> Result<(), SyncError> {
    resolve_tax_code_id(ledger, session, config, ZERO_RATED_TAX_CODE).await?;
    resolve_tax_code_id(ledger, session, config, ZERO_RATED_NON_TAX_CODE).await?;
    Ok(())
}

/// Create the structural service items: the parent category first, then each
/// child as a sub-item referencing it, with the income account resolved
/// transitively. Safe to call repeatedly.
pub async fn ensure_service_items<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    config: &CompanyConfig,
) -> Result<(), SyncError> {
    let income_account_id = resolve_account_id(ledger, session, SERVICE_INCOME_ACCOUNT).await?;

    let parent_id = ensure_item(
        ledger,
        session,
        CreateItemRequest {
            name: SERVICE_CATEGORY_ITEM.to_string(),
            item_type: "Service".to_string(),
            income_account_ref: Some(NamedRef::id(income_account_id.clone())),
            sub_item: None,
            parent_ref: None,
            taxable: None,
        },
    )
    .await?;

    let children = [
        (ITEM_PARTS, true),
        (ITEM_LABOR, false),
        (ITEM_MISC_CHARGES, true),
        (ITEM_DISPOSAL_FEE, true),
        (ITEM_LABOR_TAX, false),
    ];

    for (name, taxable) in children {
        ensure_item(
            ledger,
            session,
            CreateItemRequest {
                name: name.to_string(),
                item_type: "Service".to_string(),
                income_account_ref: Some(NamedRef::id(income_account_id.clone())),
                sub_item: Some(true),
                parent_ref: Some(NamedRef::id(parent_id.clone())),
                taxable: Some(taxable),
            },
        )
        .await?;
    }

    // Zero-rate codes back the non-taxable lines in code-addressed files.
    ensure_default_tax_codes(ledger, session, config).await?;

    Ok(())
}

async fn ensure_item<L: QboApi + ?Sized>(
    ledger: &L,
    session: &QboSession,
    request: CreateItemRequest,
) -> Result<String, SyncError> {
    let found = ledger.find_items_by_name(session, &request.name).await?;
    if let Some(item) = found.into_iter().next() {
        return Ok(item.id);
    }

    match ledger.create_item(session, &request).await {
        Ok(item) => Ok(item.id),
        Err(e) if matches!(e, QboError::ApiError { .. }) && e.is_client_error() => {
            let again = ledger.find_items_by_name(session, &request.name).await?;
            again
                .into_iter()
                .next()
                .map(|item| item.id)
                .ok_or(SyncError::RemoteSubmission(e))
        }
        Err(e) => Err(e.into()),
    }
}
