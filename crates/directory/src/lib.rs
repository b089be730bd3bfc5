//! # VC Score Directory
//!
//! Score-ordered directory of venture-capital firms.
//!
//! ## Pipeline
//!
//! ```text
//! Static seed ──────┐
//!                   │
//! Dynamic source ───┼──> merge (own portfolio > CSV portfolio) ──> sort by score
//!                   │                                                   │
//! Portfolio CSV ────┘                                                   v
//!                                             DirectoryController (pages, search)
//! ```
//!
//! Logos are resolved separately by [`LogoResolver`].
//!
//! ## Example
//!
//! ```no_run
//! use vcscore_directory::{DirectoryConfig, DirectoryLoader, DirectorySession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DirectoryConfig::load(None)?;
//!     let session = DirectorySession::new(DirectoryLoader::from_config(&config), config.page_size);
//!     session.load().await;
//!
//!     for company in session.visible().await {
//!         println!("{:>5} {}", company.score, company.name);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod controller;
mod error;
mod loader;
pub mod logo;
mod portfolio_csv;
mod seed;
mod session;
mod sources;

pub use config::{DirectoryConfig, LogoConfig, SourceLocation, DEFAULT_CONFIG_FILE};
pub use controller::{
    DirectoryController, LoadKind, LoadTicket, PageState, DEFAULT_PAGE_SIZE, LOAD_FAILED,
    REFRESH_FAILED,
};
pub use error::{DirectoryError, Result};
pub use loader::{
    merge_directory, sort_by_score, DirectoryLoader, LoadReport, LoadedDirectory, SeedSource,
};
pub use logo::{LogoCache, LogoProbe, LogoResolver};
pub use portfolio_csv::{
    parse_portfolio_csv, parse_portfolio_csv_with, PortfolioCsvSchema, PortfolioParse, RowIssue,
    PORTFOLIO_CSV_SCHEMA_VERSION,
};
pub use seed::{builtin_seed, parse_seed};
pub use session::{DirectorySession, LoadOutcome};
pub use sources::{
    dynamic_source_for, DynamicCompanies, FileDynamicCompanies, HttpDynamicCompanies,
    LocationPortfolioFeed, NoDynamicCompanies, PortfolioFeed, StaticDynamicCompanies,
    StaticPortfolioFeed,
};
pub use vcscore_protocol::{slugify, CompanyRecord, PortfolioEntry, UNKNOWN};
