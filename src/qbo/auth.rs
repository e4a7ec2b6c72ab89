//! OAuth token refresh against the Intuit bearer-token endpoint. Only the
//! refresh grant lives here; the consent/redirect flow is handled elsewhere.

use base64::Engine;
use serde::Deserialize;

use super::error::QboError;
use super::QboClient;

/// Bearer token response from the OAuth refresh grant.
#[derive(Debug, Clone, Deserialize)]
pub struct BearerToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub x_refresh_token_expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl QboClient {
    /// Exchange a refresh token for a new access/refresh token pair.
    pub async fn refresh_bearer_token(&self, refresh_token: &str) -> Result<BearerToken, QboError> {
        let basic = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config().client_id,
            self.config().client_secret
        ));

        let response = self
            .http()
            .post(&self.config().token_url)
            .header("Authorization", format!("Basic {}", basic))
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| QboError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(QboError::TokenRefresh(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<BearerToken>()
            .await
            .map_err(|e| QboError::ParseError(e.to_string()))
    }
}
