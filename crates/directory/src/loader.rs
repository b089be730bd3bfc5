use std::collections::HashMap;
use std::sync::Arc;
use vcscore_protocol::{slugify, CompanyRecord, PortfolioEntry};

use crate::config::DirectoryConfig;
use crate::error::Result;
use crate::portfolio_csv::{parse_portfolio_csv_with, PortfolioCsvSchema, PortfolioParse, RowIssue};
use crate::seed;
use crate::sources::{dynamic_source_for, DynamicCompanies, LocationPortfolioFeed, PortfolioFeed};

/// Where the static records come from.
#[derive(Debug, Clone)]
pub enum SeedSource {
    /// The embedded firm list, avatars colored from `palette`
    Builtin { palette: Vec<String> },
    /// A `[{name, score}]` JSON document, e.g. read from disk
    Document { raw: String, palette: Vec<String> },
    Records(Vec<CompanyRecord>),
}

impl SeedSource {
    fn records(&self) -> Result<Vec<CompanyRecord>> {
        match self {
            Self::Builtin { palette } => seed::builtin_seed(palette),
            Self::Document { raw, palette } => seed::parse_seed(raw, palette),
            Self::Records(records) => Ok(records.clone()),
        }
    }
}

/// Counts describing one load, for logs and `--json` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LoadReport {
    pub seed: usize,
    pub dynamic: usize,
    pub discarded: usize,
    pub portfolio_firms: usize,
    pub csv_issues: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedDirectory {
    pub companies: Vec<CompanyRecord>,
    pub report: LoadReport,
    pub csv_issues: Vec<RowIssue>,
}

/// Builds the merged, score-ordered directory from its three sources.
pub struct DirectoryLoader {
    seed: SeedSource,
    dynamic: Arc<dyn DynamicCompanies>,
    portfolio: Arc<dyn PortfolioFeed>,
    schema: PortfolioCsvSchema,
}

impl DirectoryLoader {
    pub fn new(
        seed: SeedSource,
        dynamic: Arc<dyn DynamicCompanies>,
        portfolio: Arc<dyn PortfolioFeed>,
    ) -> Self {
        Self {
            seed,
            dynamic,
            portfolio,
            schema: PortfolioCsvSchema::default(),
        }
    }

    pub fn from_config(config: &DirectoryConfig) -> Self {
        let client = reqwest::Client::new();
        Self::new(
            SeedSource::Builtin {
                palette: config.logo.palette.clone(),
            },
            dynamic_source_for(&client, config.dynamic_location()),
            Arc::new(LocationPortfolioFeed::new(client, config.portfolio_location())),
        )
    }

    pub fn with_schema(mut self, schema: PortfolioCsvSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Full rebuild. Only a broken seed list is fatal; the dynamic source and
    /// the CSV degrade to empty with a warning.
    pub async fn load(&self) -> Result<LoadedDirectory> {
        let seed = self.seed.records()?;

        let dynamic = match self.dynamic.fetch().await {
            Ok(records) => records,
            Err(err) => {
                log::warn!(
                    "Dynamic companies unavailable from {}, using static data only: {err}",
                    self.dynamic.describe()
                );
                Vec::new()
            }
        };

        let parsed = self.load_portfolio().await;

        let mut report = LoadReport {
            seed: seed.len(),
            dynamic: dynamic.len(),
            portfolio_firms: parsed.portfolios.len(),
            csv_issues: parsed.issues.len(),
            ..Default::default()
        };
        let total_in = seed.len() + dynamic.len();
        let companies = merge_directory(seed, dynamic, &parsed.portfolios);
        report.discarded = total_in - companies.len();

        log::info!(
            "Loaded {} companies ({} static, {} dynamic, {} with CSV portfolios)",
            companies.len(),
            report.seed,
            report.dynamic,
            report.portfolio_firms
        );
        if report.csv_issues > 0 {
            log::warn!(
                "{} portfolio CSV rows did not match schema v{}",
                report.csv_issues,
                self.schema.version
            );
        }

        Ok(LoadedDirectory {
            companies,
            report,
            csv_issues: parsed.issues,
        })
    }

    async fn load_portfolio(&self) -> PortfolioParse {
        match self.portfolio.fetch_csv().await {
            Ok(text) => parse_portfolio_csv_with(&text, &self.schema),
            Err(err) => {
                log::warn!(
                    "Error fetching portfolio data from {}: {err}",
                    self.portfolio.describe()
                );
                PortfolioParse::default()
            }
        }
    }
}

/// Seed records followed by dynamic ones, blank names dropped, portfolios
/// filled from the CSV where a record has none of its own, sorted by score.
pub fn merge_directory(
    seed: Vec<CompanyRecord>,
    dynamic: Vec<CompanyRecord>,
    portfolios: &HashMap<String, Vec<PortfolioEntry>>,
) -> Vec<CompanyRecord> {
    let mut merged: Vec<CompanyRecord> = seed
        .into_iter()
        .chain(dynamic)
        .filter(|record| !record.name.trim().is_empty())
        .map(|mut record| {
            if record.id.is_empty() {
                record.id = slugify(&record.name);
            }
            if record.portfolio.is_empty() {
                if let Some(csv) = portfolios.get(&record.name) {
                    record.portfolio = csv.clone();
                }
            }
            record
        })
        .collect();
    sort_by_score(&mut merged);
    merged
}

/// Score descending; equal scores keep their relative order.
pub fn sort_by_score(records: &mut [CompanyRecord]) {
    records.sort_by(|a, b| b.score.total_cmp(&a.score));
}
