//! Tax configuration: rates, codes, and agencies. Tax codes are created
//! through the dedicated taxservice endpoint rather than the generic entity
//! path.

use serde::{Deserialize, Serialize};

use super::error::QboError;
use super::types::{TaxAgency, TaxCode, TaxRate};
use super::{escape_query_value, QboClient, QboSession};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateTaxCodeRequest {
    pub tax_code: String,
    pub tax_rate_details: Vec<TaxRateDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaxRateDetail {
    pub tax_rate_name: String,
    pub rate_value: f64,
    pub tax_agency_id: String,
    /// "Sales" for rates applied on sales transactions.
    pub tax_applicable_on: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TaxServiceResponse {
    #[serde(default)]
    tax_code_id: Option<String>,
    tax_code: String,
}

impl QboClient {
    /// Fetch every tax rate defined in the company file. The caller filters
    /// on `Active`.
    pub async fn find_tax_rates(&self, session: &QboSession) -> Result<Vec<TaxRate>, QboError> {
        self.query(session, "TaxRate", "select * from TaxRate")
            .await
    }

    /// Find a tax code by exact name match.
    pub async fn find_tax_code_by_name(
        &self,
        session: &QboSession,
        name: &str,
    ) -> Result<Option<TaxCode>, QboError> {
        let query = format!(
            "select * from TaxCode where Name = '{}'",
            escape_query_value(name)
        );
        let mut found: Vec<TaxCode> = self.query(session, "TaxCode", &query).await?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.remove(0))
        })
    }

    /// Create a tax code (with its rate) via the taxservice endpoint.
    pub async fn create_tax_code(
        &self,
        session: &QboSession,
        request: &CreateTaxCodeRequest,
    ) -> Result<TaxCode, QboError> {
        let value = self
            .post_json(session, "taxservice/taxcode", request, &[])
            .await?;
        let created: TaxServiceResponse =
            serde_json::from_value(value).map_err(|e| QboError::ParseError(e.to_string()))?;

        Ok(TaxCode {
            id: created.tax_code_id.unwrap_or_default(),
            name: created.tax_code,
            description: None,
        })
    }

    /// Fetch the tax agencies defined in the company file.
    pub async fn find_tax_agencies(
        &self,
        session: &QboSession,
    ) -> Result<Vec<TaxAgency>, QboError> {
        self.query(session, "TaxAgency", "select * from TaxAgency")
            .await
    }
}
