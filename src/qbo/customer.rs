use serde::Serialize;

use super::error::QboError;
use super::types::{Customer, EmailAddress, PhysicalAddress, TelephoneNumber};
use super::{escape_query_value, QboClient, QboSession};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateCustomerRequest {
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_email_addr: Option<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_phone: Option<TelephoneNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_addr: Option<PhysicalAddress>,
    pub given_name: String,
    pub family_name: String,
}

impl QboClient {
    /// Find customers by exact display name match.
    pub async fn find_customers_by_name(
        &self,
        session: &QboSession,
        display_name: &str,
    ) -> Result<Vec<Customer>, QboError> {
        let query = format!(
            "select * from Customer where DisplayName = '{}'",
            escape_query_value(display_name)
        );
        self.query(session, "Customer", &query).await
    }

    /// Create a new customer
    pub async fn create_customer(
        &self,
        session: &QboSession,
        request: &CreateCustomerRequest,
    ) -> Result<Customer, QboError> {
        self.create_entity(session, "Customer", "customer", request)
            .await
    }
}
