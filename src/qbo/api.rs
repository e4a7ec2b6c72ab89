//! Uniform asynchronous abstraction over the QuickBooks Online surface the
//! sync engine consumes. Production code goes through [`QboClient`]; tests
//! substitute an in-memory double.

use async_trait::async_trait;

use super::auth::BearerToken;
use super::catalog::{CreateAccountRequest, CreateItemRequest};
use super::customer::CreateCustomerRequest;
use super::error::QboError;
use super::invoice::CreateInvoiceRequest;
use super::tax::CreateTaxCodeRequest;
use super::types::{
    Account, CompanyInfo, Customer, Invoice, Item, TaxAgency, TaxCode, TaxRate, Term,
};
use super::{QboClient, QboSession};

#[async_trait]
pub trait QboApi: Send + Sync {
    async fn refresh_token(&self, refresh_token: &str) -> Result<BearerToken, QboError>;

    async fn find_customers_by_name(
        &self,
        session: &QboSession,
        display_name: &str,
    ) -> Result<Vec<Customer>, QboError>;

    async fn create_customer(
        &self,
        session: &QboSession,
        request: &CreateCustomerRequest,
    ) -> Result<Customer, QboError>;

    async fn create_invoice(
        &self,
        session: &QboSession,
        request: &CreateInvoiceRequest,
    ) -> Result<Invoice, QboError>;

    async fn get_invoice(
        &self,
        session: &QboSession,
        invoice_id: &str,
    ) -> Result<Option<Invoice>, QboError>;

    async fn find_invoices_by_doc_number(
        &self,
        session: &QboSession,
        doc_number: &str,
    ) -> Result<Vec<Invoice>, QboError>;

    async fn delete_invoice(
        &self,
        session: &QboSession,
        invoice_id: &str,
        sync_token: &str,
    ) -> Result<(), QboError>;

    async fn find_tax_rates(&self, session: &QboSession) -> Result<Vec<TaxRate>, QboError>;

    async fn find_tax_code_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<TaxCode>, QboError>;

    async fn create_tax_code(
        &self,
        session: &QboSession,
        request: &CreateTaxCodeRequest,
    ) -> Result<TaxCode, QboError>;

    async fn find_tax_agencies(&self, session: &QboSession) -> Result<Vec<TaxAgency>, QboError>;

    async fn find_items_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Vec<Item>, QboError>;

    async fn create_item(
        &self,
        session: &QboSession,
        request: &CreateItemRequest,
    ) -> Result<Item, QboError>;

    async fn find_account_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<Account>, QboError>;

    async fn create_account(
        &self,
        session: &QboSession,
        request: &CreateAccountRequest,
    ) -> Result<Account, QboError>;

    async fn find_term_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<Term>, QboError>;

    async fn get_company_info(&self, session: &QboSession) -> Result<CompanyInfo, QboError>;
}

#[async_trait]
impl QboApi for QboClient {
    async fn refresh_token(&self, refresh_token: &str) -> Result<BearerToken, QboError> {
        self.refresh_bearer_token(refresh_token).await
    }

    async fn find_customers_by_name(
        &self,
        session: &QboSession,
        display_name: &str,
    ) -> Result<Vec<Customer>, QboError> {
        QboClient::find_customers_by_name(self, session, display_name).await
    }

    async fn create_customer(
        &self,
        session: &QboSession,
        request: &CreateCustomerRequest,
    ) -> Result<Customer, QboError> {
        QboClient::create_customer(self, session, request).await
    }

    async fn create_invoice(
        &self,
        session: &QboSession,
        request: &CreateInvoiceRequest,
    ) -> Result<Invoice, QboError> {
        QboClient::create_invoice(self, session, request).await
    }

    async fn get_invoice(
        &self,
        session: &QboSession,
        invoice_id: &str,
    ) -> Result<Option<Invoice>, QboError> {
        QboClient::get_invoice(self, session, invoice_id).await
    }

    async fn find_invoices_by_doc_number(
        &self,
        session: &QboSession,
        doc_number: &str,
    ) -> Result<Vec<Invoice>, QboError> {
        QboClient::find_invoices_by_doc_number(self, session, doc_number).await
    }

    async fn delete_invoice(
        &self,
        session: &QboSession,
        invoice_id: &str,
        sync_token: &str,
    ) -> Result<(), QboError> {
        QboClient::delete_invoice(self, session, invoice_id, sync_token).await
    }

    async fn find_tax_rates(&self, session: &QboSession) -> Result<Vec<TaxRate>, QboError> {
        QboClient::find_tax_rates(self, session).await
    }

    async fn find_tax_code_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<TaxCode>, QboError> {
        QboClient::find_tax_code_by_name(self, session, name).await
    }

    async fn create_tax_code(
        &self,
        session: &QboSession,
        request: &CreateTaxCodeRequest,
    ) -> Result<TaxCode, QboError> {
        QboClient::create_tax_code(self, session, request).await
    }

    async fn find_tax_agencies(&self, session: &QboSession) -> Result<Vec<TaxAgency>, QboError> {
        QboClient::find_tax_agencies(self, session).await
    }

    async fn find_items_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Vec<Item>, QboError> {
        QboClient::find_items_by_name(self, session, name).await
    }

    async fn create_item(
        &self,
        session: &QboSession,
        request: &CreateItemRequest,
    ) -> Result<Item, QboError> {
        QboClient::create_item(self, session, request).await
    }

    async fn find_account_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<Account>, QboError> {
        QboClient::find_account_by_name(self, session, name).await
    }

    async fn create_account(
        &self,
        session: &QboSession,
        request: &CreateAccountRequest,
    ) -> Result<Account, QboError> {
        QboClient::create_account(self, session, request).await
    }

    async fn find_term_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<Term>, QboError> {
        QboClient::find_term_by_name(self, session, name).await
    }

    async fn get_company_info(&self, session: &QboSession) -> Result<CompanyInfo, QboError> {
        QboClient::get_company_info(self, session).await
    }
}
