use serde::{Deserialize, Serialize};

/// Sentinel used for portfolio dates and round types that were not supplied.
pub const UNKNOWN: &str = "Unknown";

fn unknown() -> String {
    UNKNOWN.to_string()
}

/// A single investment made by a firm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub name: String,
    #[serde(default = "unknown")]
    pub announcement_date: String,
    #[serde(default = "unknown")]
    pub investment_type: String,
}

impl PortfolioEntry {
    pub fn new(
        name: impl Into<String>,
        announcement_date: impl Into<String>,
        investment_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            announcement_date: announcement_date.into(),
            investment_type: investment_type.into(),
        }
    }
}

/// A firm in the directory.
///
/// `id` may be absent on the wire; ingestion fills it from [`slugify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub portfolio: Vec<PortfolioEntry>,
}

impl CompanyRecord {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        let name = name.into();
        Self {
            id: slugify(&name),
            name,
            score,
            logo_url: None,
            portfolio: Vec::new(),
        }
    }

    pub fn with_logo(mut self, logo_url: impl Into<String>) -> Self {
        self.logo_url = Some(logo_url.into());
        self
    }

    pub fn with_portfolio(mut self, portfolio: Vec<PortfolioEntry>) -> Self {
        self.portfolio = portfolio;
        self
    }

    /// Route of the statically generated page for this firm.
    pub fn route(&self) -> String {
        format!("/vcs/{}", self.id)
    }
}

/// URL-safe identifier for a display name.
///
/// Lowercases, drops everything except ASCII word characters, whitespace and
/// `-`, trims, then joins on single hyphens.
pub fn slugify(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_' || *ch == '-' || ch.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    for ch in kept.trim().chars() {
        let ch = if ch.is_whitespace() { '-' } else { ch };
        if ch == '-' && out.ends_with('-') {
            continue;
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn slug_strips_punctuation_and_joins_words() {
        assert_eq!(slugify("OpenAI"), "openai");
        assert_eq!(slugify("Other People's Capital (OPC)"), "other-peoples-capital-opc");
        assert_eq!(slugify("  Breed   VC  "), "breed-vc");
        assert_eq!(slugify("A - B"), "a-b");
        assert_eq!(slugify("M33 Growth"), "m33-growth");
    }

    #[test]
    fn slug_of_symbols_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn record_defaults_missing_fields() {
        let record: CompanyRecord =
            serde_json::from_str(r#"{"name":"Acme Ventures","score":12}"#).unwrap();
        assert_eq!(record.id, "");
        assert_eq!(record.logo_url, None);
        assert!(record.portfolio.is_empty());

        let entry: PortfolioEntry = serde_json::from_str(r#"{"name":"Widget"}"#).unwrap();
        assert_eq!(entry.announcement_date, UNKNOWN);
        assert_eq!(entry.investment_type, UNKNOWN);
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = CompanyRecord::new("Breed VC", 86.0)
            .with_portfolio(vec![PortfolioEntry::new("Widget", "2024-01-01", "Seed")]);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "breed-vc");
        assert!(value["logoUrl"].is_null());
        assert_eq!(value["portfolio"][0]["announcementDate"], "2024-01-01");
        assert_eq!(value["portfolio"][0]["investmentType"], "Seed");
        assert_eq!(record.route(), "/vcs/breed-vc");
    }
}
