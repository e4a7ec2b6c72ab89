use super::error::QboError;
use super::types::CompanyInfo;
use super::{QboClient, QboSession};

impl QboClient {
    /// Fetch the tenant's company info (used for the jurisdiction branch in
    /// line-item tax addressing).
    pub async fn get_company_info(&self, session: &QboSession) -> Result<CompanyInfo, QboError> {
        let mut found: Vec<CompanyInfo> = self
            .query(session, "CompanyInfo", "select * from CompanyInfo")
            .await?;
        if found.is_empty() {
            return Err(QboError::ParseError(
                "company info query returned no rows".to_string(),
            ));
        }
        Ok(found.remove(0))
    }
}
