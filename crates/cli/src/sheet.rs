//! Published spreadsheet export → `{id, name, score}` list and `/vcs/<id>` routes.

use anyhow::{Context as AnyhowContext, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use vcscore_directory::SourceLocation;
use vcscore_protocol::{serialize_json_pretty, slugify};

pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSx9KNUnaX7Yfx7nj5l76YRD_7db6LG10fYjkiCbjyEFyQlzZv_ksy0AFz7K5Y7nEHy9XQhZS-UEYqv/pub?gid=0&single=true&output=csv";
pub const DEFAULT_SHEET_OUTPUT: &str = "src/data/vcs.json";

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid number regex")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub id: String,
    pub name: String,
    pub score: f64,
}

impl SheetEntry {
    pub fn route(&self) -> String {
        format!("/vcs/{}", self.id)
    }
}

/// Header row skipped; column 0 is the name, column 1 the score.
pub fn parse_sheet_csv(text: &str) -> Vec<SheetEntry> {
    text.trim()
        .lines()
        .skip(1)
        .filter_map(|row| {
            let mut cells = row.split(',');
            let name = cells.next().unwrap_or_default();
            let score = cells.next().unwrap_or_default();
            let entry = SheetEntry {
                id: slugify(name),
                name: name.trim().to_string(),
                score: parse_score(score),
            };
            (!entry.name.is_empty()).then_some(entry)
        })
        .collect()
}

/// Leading numeric prefix of `raw`; anything unparseable scores 0.
pub fn parse_score(raw: &str) -> f64 {
    LEADING_NUMBER
        .find(raw.trim())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|score| score.is_finite())
        .unwrap_or(0.0)
}

/// Fetch and parse the sheet. Failures are logged and yield an empty list.
pub async fn fetch_sheet(client: &reqwest::Client, location: &SourceLocation) -> Vec<SheetEntry> {
    log::info!("Fetching VC data from {location}");
    match fetch_text(client, location).await {
        Ok(text) => parse_sheet_csv(&text),
        Err(err) => {
            log::error!("Error fetching VC data: {err:#}");
            Vec::new()
        }
    }
}

async fn fetch_text(client: &reqwest::Client, location: &SourceLocation) -> Result<String> {
    match location {
        SourceLocation::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        SourceLocation::Url(url) => {
            let resp = client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Request to {url} failed"))?
                .error_for_status()?;
            Ok(resp.text().await?)
        }
    }
}

pub async fn write_sheet(entries: &[SheetEntry], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, serialize_json_pretty(&entries)?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub async fn read_sheet(path: &Path) -> Result<Vec<SheetEntry>> {
    let raw = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("Invalid sheet JSON in {}", path.display()))
}

pub fn routes(entries: &[SheetEntry]) -> Vec<String> {
    entries.iter().map(SheetEntry::route).collect()
}
