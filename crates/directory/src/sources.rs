use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use vcscore_protocol::CompanyRecord;

use crate::config::SourceLocation;
use crate::error::{DirectoryError, Result};

/// Records maintained outside the seed list (the admin store).
#[async_trait]
pub trait DynamicCompanies: Send + Sync {
    async fn fetch(&self) -> Result<Vec<CompanyRecord>>;

    fn describe(&self) -> String;
}

/// Raw text of the portfolio CSV export.
#[async_trait]
pub trait PortfolioFeed: Send + Sync {
    async fn fetch_csv(&self) -> Result<String>;

    fn describe(&self) -> String;
}

/// `GET <url>` returning a JSON array of records.
pub struct HttpDynamicCompanies {
    client: reqwest::Client,
    url: String,
}

impl HttpDynamicCompanies {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DynamicCompanies for HttpDynamicCompanies {
    async fn fetch(&self) -> Result<Vec<CompanyRecord>> {
        let resp = self.client.get(&self.url).send().await?;
        if !resp.status().is_success() {
            return Err(DirectoryError::Status {
                status: resp.status().as_u16(),
                url: self.url.clone(),
            });
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// The admin store's JSON file read directly.
pub struct FileDynamicCompanies {
    path: PathBuf,
}

impl FileDynamicCompanies {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DynamicCompanies for FileDynamicCompanies {
    async fn fetch(&self) -> Result<Vec<CompanyRecord>> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// No dynamic records at all.
pub struct NoDynamicCompanies;

#[async_trait]
impl DynamicCompanies for NoDynamicCompanies {
    async fn fetch(&self) -> Result<Vec<CompanyRecord>> {
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

/// Fixed records; handy for tests and embedding.
pub struct StaticDynamicCompanies(pub Vec<CompanyRecord>);

#[async_trait]
impl DynamicCompanies for StaticDynamicCompanies {
    async fn fetch(&self) -> Result<Vec<CompanyRecord>> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("{} inline records", self.0.len())
    }
}

/// Portfolio CSV read from a file or fetched over HTTP.
pub struct LocationPortfolioFeed {
    client: reqwest::Client,
    location: SourceLocation,
}

impl LocationPortfolioFeed {
    pub fn new(client: reqwest::Client, location: SourceLocation) -> Self {
        Self { client, location }
    }
}

#[async_trait]
impl PortfolioFeed for LocationPortfolioFeed {
    async fn fetch_csv(&self) -> Result<String> {
        match &self.location {
            SourceLocation::File(path) => Ok(tokio::fs::read_to_string(path).await?),
            SourceLocation::Url(url) => {
                let resp = self.client.get(url).send().await?;
                if !resp.status().is_success() {
                    return Err(DirectoryError::Status {
                        status: resp.status().as_u16(),
                        url: url.clone(),
                    });
                }
                Ok(resp.text().await?)
            }
        }
    }

    fn describe(&self) -> String {
        self.location.to_string()
    }
}

/// Inline CSV text.
pub struct StaticPortfolioFeed(pub String);

#[async_trait]
impl PortfolioFeed for StaticPortfolioFeed {
    async fn fetch_csv(&self) -> Result<String> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "inline csv".to_string()
    }
}

pub fn dynamic_source_for(
    client: &reqwest::Client,
    location: Option<SourceLocation>,
) -> Arc<dyn DynamicCompanies> {
    match location {
        Some(SourceLocation::Url(url)) => Arc::new(HttpDynamicCompanies::new(client.clone(), url)),
        Some(SourceLocation::File(path)) => Arc::new(FileDynamicCompanies::new(path)),
        None => Arc::new(NoDynamicCompanies),
    }
}
