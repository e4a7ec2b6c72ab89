pub mod api;
pub mod auth;
pub mod catalog;
pub mod company;
pub mod customer;
pub mod error;
pub mod invoice;
pub mod tax;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use error::QboError;
use reqwest::Client;
use serde_json::Value;

const QBO_BASE_URL: &str = "https://quickbooks.api.intuit.com";
const QBO_SANDBOX_BASE_URL: &str = "https://sandbox-quickbooks.api.intuit.com";
const QBO_TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";

/// Configuration for the QuickBooks Online API client
#[derive(Debug, Clone)]
pub struct QboConfig {
    pub client_id: String,
    pub client_secret: String,
    pub sandbox: bool,
    pub base_url: String,
    pub token_url: String,
    pub minor_version: u32,
}

impl QboConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, QboError> {
        let client_id = std::env::var("QBO_CLIENT_ID")
            .map_err(|_| QboError::ConfigError("Missing QBO_CLIENT_ID".to_string()))?;
        let client_secret = std::env::var("QBO_CLIENT_SECRET")
            .map_err(|_| QboError::ConfigError("Missing QBO_CLIENT_SECRET".to_string()))?;

        let sandbox = std::env::var("QBO_SANDBOX")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let base_url = if sandbox {
            QBO_SANDBOX_BASE_URL.to_string()
        } else {
            QBO_BASE_URL.to_string()
        };

        let minor_version = std::env::var("QBO_MINOR_VERSION")
            .unwrap_or_else(|_| "65".to_string())
            .parse::<u32>()
            .unwrap_or(65);

        Ok(QboConfig {
            client_id,
            client_secret,
            sandbox,
            base_url,
            token_url: QBO_TOKEN_URL.to_string(),
            minor_version,
        })
    }
}

/// Short-lived session value for one authorized connection. Obtained from the
/// token manager at the start of a batch and passed explicitly to every call;
/// the client itself carries no per-tenant state.
#[derive(Debug, Clone)]
pub struct QboSession {
    pub realm_id: String,
    pub access_token: String,
}

/// QuickBooks Online API client
#[derive(Clone)]
pub struct QboClient {
    config: Arc<QboConfig>,
    http_client: Client,
}

impl QboClient {
    /// Create a new client with the given configuration
    pub fn new(config: QboConfig) -> Result<Self, QboError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| QboError::HttpError(e.to_string()))?;

        Ok(QboClient {
            config: Arc::new(config),
            http_client,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self, QboError> {
        Self::new(QboConfig::from_env()?)
    }

    pub fn config(&self) -> &QboConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http_client
    }

    /// Run a QBO data query and return the entity array from the response
    /// envelope. A miss is an empty vector, not an error.
    pub(crate) async fn query<T: serde::de::DeserializeOwned>(
        &self,
        session: &QboSession,
        entity: &str,
        query: &str,
    ) -> Result<Vec<T>, QboError> {
        let url = format!("{}/v3/company/{}/query", self.config.base_url, session.realm_id);
        let minor = self.config.minor_version.to_string();

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .header("Accept", "application/json")
            .query(&[("query", query), ("minorversion", minor.as_str())])
            .send()
            .await
            .map_err(|e| QboError::HttpError(e.to_string()))?;

        let body = self.handle_response(response).await?;
        let entities = body
            .get("QueryResponse")
            .and_then(|q| q.get(entity))
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));

        serde_json::from_value(entities).map_err(|e| QboError::ParseError(e.to_string()))
    }

    /// POST an entity payload and unwrap the created object from the
    /// response envelope (`{"Invoice": {...}, "time": ...}`).
    pub(crate) async fn create_entity<T, B>(
        &self,
        session: &QboSession,
        entity: &str,
        path: &str,
        body: &B,
    ) -> Result<T, QboError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let value = self.post_json(session, path, body, &[]).await?;
        let created = value
            .get(entity)
            .cloned()
            .ok_or_else(|| QboError::ParseError(format!("response missing {} object", entity)))?;

        serde_json::from_value(created).map_err(|e| QboError::ParseError(e.to_string()))
    }

    /// POST a JSON body to a company-scoped path with extra query params.
    pub(crate) async fn post_json<B: serde::Serialize>(
        &self,
        session: &QboSession,
        path: &str,
        body: &B,
        params: &[(&str, &str)],
    ) -> Result<Value, QboError> {
        let url = format!(
            "{}/v3/company/{}/{}",
            self.config.base_url, session.realm_id, path
        );
        let minor = self.config.minor_version.to_string();

        let mut query: Vec<(&str, &str)> = vec![("minorversion", minor.as_str())];
        query.extend_from_slice(params);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .header("Accept", "application/json")
            .query(&query)
            .json(body)
            .send()
            .await
            .map_err(|e| QboError::HttpError(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle HTTP response, preserving the remote error body verbatim.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, QboError> {
        let status = response.status();

        if status.is_success() {
            response
                .json::<Value>()
                .await
                .map_err(|e| QboError::ParseError(e.to_string()))
        } else {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            Err(QboError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            })
        }
    }
}

/// Escape a value for interpolation into a QBO query string.
pub(crate) fn escape_query_value(value: &str) -> String {
    value.replace('\'', "\\'")
}
