//! Shared test doubles: an in-memory QuickBooks ledger with call counters,
//! in-memory stores, and fixture builders.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use qbo_sync_rs::models::{
    BilledParty, CompanyConfig, DeclaredTax, InvoiceLine, InvoiceRecord, InvoiceRequest,
    PartLine, PostalAddress, QboCredential, RecordStatus, SyncBatchRequest,
};
use qbo_sync_rs::qbo::api::QboApi;
use qbo_sync_rs::qbo::auth::BearerToken;
use qbo_sync_rs::qbo::catalog::{CreateAccountRequest, CreateItemRequest};
use qbo_sync_rs::qbo::customer::CreateCustomerRequest;
use qbo_sync_rs::qbo::error::QboError;
use qbo_sync_rs::qbo::invoice::CreateInvoiceRequest;
use qbo_sync_rs::qbo::tax::CreateTaxCodeRequest;
use qbo_sync_rs::qbo::types::{
    Account, CompanyInfo, Customer, Invoice, Item, TaxAgency, TaxCode, TaxRate, Term,
};
use qbo_sync_rs::qbo::QboSession;
use qbo_sync_rs::repos::{
    CompanyConfigStore, CredentialStore, RecordStore, StoreError,
};
use qbo_sync_rs::services::sync_service::SyncEngine;
use qbo_sync_rs::services::token_service::TokenManager;

pub const COMPANY_CODE: &str = "company1";

// ============================================================
// MOCK LEDGER
// ============================================================

#[derive(Debug, Default, Clone)]
pub struct CallCounts {
    pub refresh_token: usize,
    pub find_customers: usize,
    pub create_customer: usize,
    pub create_invoice: usize,
    pub get_invoice: usize,
    pub delete_invoice: usize,
    pub find_tax_rates: usize,
    pub find_items: usize,
    pub create_item: usize,
    pub create_account: usize,
    pub create_tax_code: usize,
    pub company_info: usize,
}

pub struct MockLedger {
    pub tax_rates: Mutex<Vec<TaxRate>>,
    pub terms: Vec<Term>,
    pub agencies: Vec<TaxAgency>,
    pub country: Option<String>,
    pub customers: Mutex<Vec<Customer>>,
    pub items: Mutex<Vec<Item>>,
    pub accounts: Mutex<Vec<Account>>,
    pub tax_codes: Mutex<Vec<TaxCode>>,
    pub remote_invoices: Mutex<Vec<Invoice>>,
    /// Captured create-invoice payloads, in submission order.
    pub submitted: Mutex<Vec<CreateInvoiceRequest>>,
    pub deleted_invoice_ids: Mutex<Vec<String>>,
    /// Doc numbers whose create-invoice call should fail.
    pub fail_create_for: Mutex<HashSet<String>>,
    pub fail_delete: Mutex<bool>,
    pub fail_refresh: Mutex<bool>,
    pub calls: Mutex<CallCounts>,
    next_id: AtomicUsize,
}

impl MockLedger {
    /// An empty company file: active "ST" 5% rate, "Net 30" terms, one tax
    /// agency, no items or codes.
    pub fn bare() -> Self {
        MockLedger {
            tax_rates: Mutex::new(vec![tax_rate("ST", 5.0, true)]),
            terms: vec![Term {
                id: "3".to_string(),
                name: "Net 30".to_string(),
            }],
            agencies: vec![TaxAgency {
                id: "7".to_string(),
                display_name: "State Board".to_string(),
            }],
            country: Some("CA".to_string()),
            customers: Mutex::new(Vec::new()),
            items: Mutex::new(Vec::new()),
            accounts: Mutex::new(Vec::new()),
            tax_codes: Mutex::new(Vec::new()),
            remote_invoices: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            deleted_invoice_ids: Mutex::new(Vec::new()),
            fail_create_for: Mutex::new(HashSet::new()),
            fail_delete: Mutex::new(false),
            fail_refresh: Mutex::new(false),
            calls: Mutex::new(CallCounts::default()),
            next_id: AtomicUsize::new(100),
        }
    }

    /// A company file with the connector's service items and tax codes
    /// already bootstrapped.
    pub fn seeded() -> Self {
        let ledger = Self::bare();
        {
            let mut items = ledger.items.lock().unwrap();
            for (id, name) in [
                ("10", "Field Service"),
                ("11", "Parts"),
                ("12", "Labor"),
                ("13", "Miscellaneous Charges"),
                ("14", "Disposal Fee"),
                ("15", "Labor Tax"),
            ] {
                items.push(Item {
                    id: id.to_string(),
                    name: name.to_string(),
                    item_type: Some("Service".to_string()),
                    income_account_ref: None,
                    parent_ref: None,
                });
            }
        }
        {
            // Tax code ids mirror their names to keep assertions readable.
            let mut codes = ledger.tax_codes.lock().unwrap();
            for name in ["ST", "FX", "FXN"] {
                codes.push(TaxCode {
                    id: name.to_string(),
                    name: name.to_string(),
                    description: None,
                });
            }
        }
        ledger
    }

    pub fn set_active_rate(&self, name: &str, value: f64) {
        let mut rates = self.tax_rates.lock().unwrap();
        rates.retain(|r| r.name != name);
        rates.push(tax_rate(name, value, true));
    }

    pub fn add_remote_invoice(&self, id: &str, doc_number: Option<&str>) {
        self.remote_invoices.lock().unwrap().push(Invoice {
            id: id.to_string(),
            doc_number: doc_number.map(str::to_string),
            sync_token: Some("0".to_string()),
            total_amt: None,
            txn_date: None,
        });
    }

    pub fn counts(&self) -> CallCounts {
        self.calls.lock().unwrap().clone()
    }

    fn alloc_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

pub fn tax_rate(name: &str, value: f64, active: bool) -> TaxRate {
    TaxRate {
        id: format!("rate-{name}"),
        name: name.to_string(),
        rate_value: Some(value),
        active,
    }
}

#[async_trait]
impl QboApi for MockLedger {
    async fn refresh_token(&self, _refresh_token: &str) -> Result<BearerToken, QboError> {
        self.calls.lock().unwrap().refresh_token += 1;
        if *self.fail_refresh.lock().unwrap() {
            return Err(QboError::TokenRefresh("invalid_grant".to_string()));
        }
        Ok(BearerToken {
            access_token: "access-refreshed".to_string(),
            refresh_token: "refresh-rotated".to_string(),
            expires_in: 3600,
            x_refresh_token_expires_in: Some(8_726_400),
            token_type: Some("bearer".to_string()),
        })
    }

    async fn find_customers_by_name(
        &self,
        _session: &QboSession,
        display_name: &str,
    ) -> Result<Vec<Customer>, QboError> {
        self.calls.lock().unwrap().find_customers += 1;
        Ok(self
            .customers
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.display_name == display_name)
            .cloned()
            .collect())
    }

    async fn create_customer(
        &self,
        _session: &QboSession,
        request: &CreateCustomerRequest,
    ) -> Result<Customer, QboError> {
        self.calls.lock().unwrap().create_customer += 1;
        let customer = Customer {
            id: self.alloc_id(),
            display_name: request.display_name.clone(),
            sync_token: Some("0".to_string()),
        };
        self.customers.lock().unwrap().push(customer.clone());
        Ok(customer)
    }

    async fn create_invoice(
        &self,
        _session: &QboSession,
        request: &CreateInvoiceRequest,
    ) -> Result<Invoice, QboError> {
        self.calls.lock().unwrap().create_invoice += 1;
        if let Some(doc) = &request.doc_number {
            if self.fail_create_for.lock().unwrap().contains(doc) {
                return Err(QboError::ApiError {
                    status_code: 400,
                    message: "Business Validation Error: invoice rejected".to_string(),
                });
            }
        }
        let invoice = Invoice {
            id: format!("qb-{}", self.alloc_id()),
            doc_number: request.doc_number.clone(),
            sync_token: Some("0".to_string()),
            total_amt: request.total_amt,
            txn_date: Some(request.txn_date.clone()),
        };
        self.remote_invoices.lock().unwrap().push(invoice.clone());
        self.submitted.lock().unwrap().push(request.clone());
        Ok(invoice)
    }

    async fn get_invoice(
        &self,
        _session: &QboSession,
        invoice_id: &str,
    ) -> Result<Option<Invoice>, QboError> {
        self.calls.lock().unwrap().get_invoice += 1;
        Ok(self
            .remote_invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == invoice_id)
            .cloned())
    }

    async fn find_invoices_by_doc_number(
        &self,
        _session: &QboSession,
        doc_number: &str,
    ) -> Result<Vec<Invoice>, QboError> {
        Ok(self
            .remote_invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.doc_number.as_deref() == Some(doc_number))
            .cloned()
            .collect())
    }

    async fn delete_invoice(
        &self,
        _session: &QboSession,
        invoice_id: &str,
        _sync_token: &str,
    ) -> Result<(), QboError> {
        self.calls.lock().unwrap().delete_invoice += 1;
        self.deleted_invoice_ids
            .lock()
            .unwrap()
            .push(invoice_id.to_string());
        if *self.fail_delete.lock().unwrap() {
            return Err(QboError::ApiError {
                status_code: 400,
                message: "Stale Object Error".to_string(),
            });
        }
        self.remote_invoices
            .lock()
            .unwrap()
            .retain(|i| i.id != invoice_id);
        Ok(())
    }

    async fn find_tax_rates(&self, _session: &QboSession) -> Result<Vec<TaxRate>, QboError> {
        self.calls.lock().unwrap().find_tax_rates += 1;
        Ok(self.tax_rates.lock().unwrap().clone())
    }

    async fn find_tax_code_by_name(
        &self,
        _session: &QboSession,
        name: &str,
    ) -> Result<Option<TaxCode>, QboError> {
        Ok(self
            .tax_codes
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn create_tax_code(
        &self,
        _session: &QboSession,
        request: &CreateTaxCodeRequest,
    ) -> Result<TaxCode, QboError> {
        self.calls.lock().unwrap().create_tax_code += 1;
        let code = TaxCode {
            id: request.tax_code.clone(),
            name: request.tax_code.clone(),
            description: None,
        };
        self.tax_codes.lock().unwrap().push(code.clone());
        Ok(code)
    }

    async fn find_tax_agencies(&self, _session: &QboSession) -> Result<Vec<TaxAgency>, QboError> {
        Ok(self.agencies.clone())
    }

    async fn find_items_by_name(
        &self,
        _session: &QboSession,
        name: &str,
    ) -> Result<Vec<Item>, QboError> {
        self.calls.lock().unwrap().find_items += 1;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.name == name)
            .cloned()
            .collect())
    }

    async fn create_item(
        &self,
        _session: &QboSession,
        request: &CreateItemRequest,
    ) -> Result<Item, QboError> {
        self.calls.lock().unwrap().create_item += 1;
        let item = Item {
            id: self.alloc_id(),
            name: request.name.clone(),
            item_type: Some(request.item_type.clone()),
            income_account_ref: request.income_account_ref.clone(),
            parent_ref: request.parent_ref.clone(),
        };
        self.items.lock().unwrap().push(item.clone());
        Ok(item)
    }

    async fn find_account_by_name(
        &self,
        _session: &QboSession,
        name: &str,
    ) -> Result<Option<Account>, QboError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.name == name)
            .cloned())
    }

    async fn create_account(
        &self,
        _session: &QboSession,
        request: &CreateAccountRequest,
    ) -> Result<Account, QboError> {
        self.calls.lock().unwrap().create_account += 1;
        let account = Account {
            id: self.alloc_id(),
            name: request.name.clone(),
            account_type: Some(request.account_type.clone()),
        };
        self.accounts.lock().unwrap().push(account.clone());
        Ok(account)
    }

    async fn find_term_by_name(
        &self,
        _session: &QboSession,
        name: &str,
    ) -> Result<Option<Term>, QboError> {
        Ok(self.terms.iter().find(|t| t.name == name).cloned())
    }

    async fn get_company_info(&self, _session: &QboSession) -> Result<CompanyInfo, QboError> {
        self.calls.lock().unwrap().company_info += 1;
        Ok(CompanyInfo {
            company_name: "Test Company".to_string(),
            country: self.country.clone(),
        })
    }
}

// ============================================================
// IN-MEMORY STORES
// ============================================================

pub struct MemCredentialStore {
    pub credential: Mutex<QboCredential>,
    pub save_count: Mutex<usize>,
}

impl MemCredentialStore {
    pub fn new(credential: QboCredential) -> Self {
        MemCredentialStore {
            credential: Mutex::new(credential),
            save_count: Mutex::new(0),
        }
    }

    pub fn current(&self) -> QboCredential {
        self.credential.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialStore for MemCredentialStore {
    async fn load(&self) -> Result<QboCredential, StoreError> {
        Ok(self.credential.lock().unwrap().clone())
    }

    async fn save_tokens(
        &self,
        _id: Uuid,
        access_token: &str,
        refresh_token: &str,
        token_expiry: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut credential = self.credential.lock().unwrap();
        credential.access_token = access_token.to_string();
        credential.refresh_token = refresh_token.to_string();
        credential.token_expiry = token_expiry;
        *self.save_count.lock().unwrap() += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemRecordStore {
    pub records: Mutex<HashMap<(String, String), InvoiceRecord>>,
}

impl MemRecordStore {
    pub fn seed(&self, record: InvoiceRecord) {
        self.records.lock().unwrap().insert(
            (
                record.work_order_id.clone(),
                record.company_config_code.clone(),
            ),
            record,
        );
    }

    pub fn get(&self, work_order_id: &str) -> Option<InvoiceRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(work_order_id.to_string(), COMPANY_CODE.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl RecordStore for MemRecordStore {
    async fn find(
        &self,
        work_order_id: &str,
        company_config_code: &str,
    ) -> Result<Option<InvoiceRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(work_order_id.to_string(), company_config_code.to_string()))
            .cloned())
    }

    async fn upsert_success(
        &self,
        work_order_id: &str,
        company_config_code: &str,
        qbo_invoice_id: &str,
        doc_number: Option<&str>,
        status: RecordStatus,
        invoice_date: NaiveDate,
    ) -> Result<(), StoreError> {
        let key = (work_order_id.to_string(), company_config_code.to_string());
        let mut records = self.records.lock().unwrap();
        let entry = records.entry(key).or_insert_with(|| InvoiceRecord {
            id: Uuid::new_v4(),
            work_order_id: work_order_id.to_string(),
            company_config_code: company_config_code.to_string(),
            qbo_invoice_id: None,
            doc_number: None,
            status: String::new(),
            invoice_date: None,
            processed_at: Utc::now(),
            error_message: String::new(),
        });
        entry.qbo_invoice_id = Some(qbo_invoice_id.to_string());
        entry.doc_number = doc_number.map(str::to_string);
        entry.status = status.as_str().to_string();
        entry.invoice_date = Some(invoice_date);
        entry.processed_at = Utc::now();
        entry.error_message = String::new();
        Ok(())
    }

    async fn upsert_failure(
        &self,
        work_order_id: &str,
        company_config_code: &str,
        error_message: &str,
        invoice_date: NaiveDate,
    ) -> Result<(), StoreError> {
        let key = (work_order_id.to_string(), company_config_code.to_string());
        let mut records = self.records.lock().unwrap();
        let entry = records.entry(key).or_insert_with(|| InvoiceRecord {
            id: Uuid::new_v4(),
            work_order_id: work_order_id.to_string(),
            company_config_code: company_config_code.to_string(),
            qbo_invoice_id: None,
            doc_number: None,
            status: String::new(),
            invoice_date: None,
            processed_at: Utc::now(),
            error_message: String::new(),
        });
        // Failure overwrites the outcome but keeps the last known invoice id.
        entry.status = RecordStatus::Failure.as_str().to_string();
        entry.invoice_date = Some(invoice_date);
        entry.processed_at = Utc::now();
        entry.error_message = error_message.to_string();
        Ok(())
    }
}

pub struct MemConfigStore {
    pub configs: HashMap<String, CompanyConfig>,
}

#[async_trait]
impl CompanyConfigStore for MemConfigStore {
    async fn find(&self, config_code: &str) -> Result<Option<CompanyConfig>, StoreError> {
        Ok(self.configs.get(config_code).cloned())
    }
}

// ============================================================
// FIXTURES
// ============================================================

pub fn credential(expires_in_secs: i64) -> QboCredential {
    QboCredential {
        id: Uuid::new_v4(),
        realm_id: "realm-1".to_string(),
        access_token: "access-0".to_string(),
        refresh_token: "refresh-0".to_string(),
        token_expiry: Utc::now() + Duration::seconds(expires_in_secs),
        minor_version: 65,
        refresh_token_expired: false,
    }
}

pub fn company_config(config_code: &str) -> CompanyConfig {
    CompanyConfig {
        config_code: config_code.to_string(),
        display_name: "Acme Field Services".to_string(),
        terms: "Net 30".to_string(),
        keep_qb_invoice_number: false,
        sales_tax_agency: "State Board".to_string(),
    }
}

pub fn billed_party(name: &str) -> BilledParty {
    BilledParty {
        name: name.to_string(),
        email: Some("billing@example.com".to_string()),
        mobile_phone: Some("555-0100".to_string()),
        first_name: Some("Pat".to_string()),
        last_name: Some("Jones".to_string()),
        address: Some(PostalAddress {
            line1: Some("1 Main St".to_string()),
            line2: None,
            city: Some("Springfield".to_string()),
            state: Some("IL".to_string()),
            zipcode: Some("62701".to_string()),
            country: Some("US".to_string()),
        }),
    }
}

/// One-part invoice matching the canonical example: qty 2 at 10.00 under tax
/// code "ST" declared at 5%.
pub fn part_invoice(work_order_id: &str) -> InvoiceRequest {
    InvoiceRequest {
        work_order_id: work_order_id.to_string(),
        to: billed_party("Acme Customer"),
        lines: vec![InvoiceLine {
            parts: vec![PartLine {
                name: "Oil filter".to_string(),
                quantity: 2.0,
                selling_price: 10.0,
                total_amount: 20.0,
                tax_code: Some("ST".to_string()),
            }],
            labor: Vec::new(),
            misc_charges: Vec::new(),
            disposal_fees: Vec::new(),
        }],
        parts_tax: vec![DeclaredTax {
            name: "ST".to_string(),
            code: "ST".to_string(),
            tax: 5.0,
            tax_amount: Some(1.0),
        }],
        labor_tax_same_as_part: true,
        labor_tax_percentage: None,
        labor_tax: None,
        discount_percentage: None,
        discount_amount: None,
        invoice_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        final_total: 21.0,
        prior_invoice_id: None,
        po_number: None,
    }
}

pub fn batch(invoices: Vec<InvoiceRequest>) -> SyncBatchRequest {
    SyncBatchRequest {
        company_config_code: COMPANY_CODE.to_string(),
        invoices,
    }
}

pub fn record_with_invoice(work_order_id: &str, qbo_invoice_id: &str) -> InvoiceRecord {
    InvoiceRecord {
        id: Uuid::new_v4(),
        work_order_id: work_order_id.to_string(),
        company_config_code: COMPANY_CODE.to_string(),
        qbo_invoice_id: Some(qbo_invoice_id.to_string()),
        doc_number: Some(work_order_id.to_string()),
        status: RecordStatus::Created.as_str().to_string(),
        invoice_date: NaiveDate::from_ymd_opt(2026, 1, 1),
        processed_at: Utc::now(),
        error_message: String::new(),
    }
}

// ============================================================
// HARNESS
// ============================================================

pub type TestEngine = SyncEngine<MockLedger, MemCredentialStore, MemRecordStore, MemConfigStore>;

pub struct Harness {
    pub ledger: Arc<MockLedger>,
    pub credentials: Arc<MemCredentialStore>,
    pub records: Arc<MemRecordStore>,
    pub engine: Arc<TestEngine>,
}

pub fn harness(ledger: MockLedger) -> Harness {
    let ledger = Arc::new(ledger);
    let credentials = Arc::new(MemCredentialStore::new(credential(3600)));
    let records = Arc::new(MemRecordStore::default());

    let mut configs = HashMap::new();
    configs.insert(COMPANY_CODE.to_string(), company_config(COMPANY_CODE));
    let configs = Arc::new(MemConfigStore { configs });

    let tokens = Arc::new(TokenManager::new(
        Arc::clone(&ledger),
        Arc::clone(&credentials),
    ));
    let engine = Arc::new(SyncEngine::new(
        Arc::clone(&ledger),
        tokens,
        Arc::clone(&records),
        configs,
    ));

    Harness {
        ledger,
        credentials,
        records,
        engine,
    }
}

pub fn session() -> QboSession {
    QboSession {
        realm_id: "realm-1".to_string(),
        access_token: "access-0".to_string(),
    }
}
