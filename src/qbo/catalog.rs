//! Catalog entities: items, income accounts, and payment terms.

use serde::Serialize;

use super::error::QboError;
use super::types::{Account, Item, NamedRef, Term};
use super::{escape_query_value, QboClient, QboSession};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_account_ref: Option<NamedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_item: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_ref: Option<NamedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taxable: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAccountRequest {
    pub name: String,
    pub account_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_sub_type: Option<String>,
}

impl QboClient {
    /// Find items by exact name match.
    pub async fn find_items_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Vec<Item>, QboError> {
        let query = format!(
            "select * from Item where Name = '{}'",
            escape_query_value(name)
        );
        self.query(session, "Item", &query).await
    }

    /// Create a service item (optionally as a sub-item of a category).
    pub async fn create_item(
        &self,
        session: &QboSession,
        request: &CreateItemRequest,
    ) -> Result<Item, QboError> {
        self.create_entity(session, "Item", "item", request).await
    }

    /// Find an account by exact name match.
    pub async fn find_account_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<Account>, QboError> {
        let query = format!(
            "select * from Account where Name = '{}'",
            escape_query_value(name)
        );
        let mut found: Vec<Account> = self.query(session, "Account", &query).await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.remove(0))
        })
    }

    /// Create an account
    pub async fn create_account(
        &self,
        session: &QboSession,
        request: &CreateAccountRequest,
    ) -> Result<Account, QboError> {
        self.create_entity(session, "Account", "account", request)
            .await
    }

    /// Find a payment term by exact name match.
    pub async fn find_term_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<Term>, QboError> {
        let query = format!(
            "select * from Term where Name = '{}'",
            escape_query_value(name)
        );
        let mut found: Vec<Term> = self.query(session, "Term", &query).await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.remove(0))
        })
    }
}
