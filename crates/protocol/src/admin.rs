use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::company::{CompanyRecord, PortfolioEntry, UNKNOWN};
use crate::MAX_SCORE;

/// Body accepted by `POST /api/companies`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompanyRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub portfolio: Vec<PortfolioInput>,
}

/// A portfolio row as typed into the admin form; every field may be blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub announcement_date: Option<String>,
    #[serde(default)]
    pub investment_type: Option<String>,
}

/// `{"error": "..."}` body returned by the admin API on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum AdminRequestError {
    #[error("Name and score are required")]
    MissingNameOrScore,

    #[error("Score must be between 0 and {max}, got {0}", max = MAX_SCORE)]
    ScoreOutOfRange(f64),

    #[error("Invalid logo URL: {0}")]
    InvalidLogoUrl(String),
}

impl NewCompanyRequest {
    /// Validate and normalize into the record that gets persisted.
    pub fn into_record(self) -> Result<CompanyRecord, AdminRequestError> {
        let name = self
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(AdminRequestError::MissingNameOrScore)?;
        let score = self.score.ok_or(AdminRequestError::MissingNameOrScore)?;
        if !(0.0..=MAX_SCORE).contains(&score) {
            return Err(AdminRequestError::ScoreOutOfRange(score));
        }

        let logo_url = match non_blank(self.logo_url) {
            Some(raw) => {
                url::Url::parse(&raw).map_err(|_| AdminRequestError::InvalidLogoUrl(raw.clone()))?;
                Some(raw)
            }
            None => None,
        };

        let portfolio = self
            .portfolio
            .into_iter()
            .filter_map(PortfolioInput::into_entry)
            .collect();

        let mut record = CompanyRecord::new(name, score).with_portfolio(portfolio);
        record.logo_url = logo_url;
        Ok(record)
    }
}

impl PortfolioInput {
    /// Rows without a company name are dropped; blank date/type become `"Unknown"`.
    pub fn into_entry(self) -> Option<PortfolioEntry> {
        let name = non_blank(self.name)?;
        Some(PortfolioEntry {
            name,
            announcement_date: non_blank(self.announcement_date).unwrap_or_else(|| UNKNOWN.into()),
            investment_type: non_blank(self.investment_type).unwrap_or_else(|| UNKNOWN.into()),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
