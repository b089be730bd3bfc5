use anyhow::Result;
use serde::Serialize;

pub mod admin;
pub mod company;

pub use admin::{AdminRequestError, ApiError, NewCompanyRequest, PortfolioInput};
pub use company::{slugify, CompanyRecord, PortfolioEntry, UNKNOWN};

/// Maximum score accepted through the admin write path.
pub const MAX_SCORE: f64 = 100.0;

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
