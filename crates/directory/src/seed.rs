use serde::Deserialize;
use vcscore_protocol::CompanyRecord;

use crate::error::{DirectoryError, Result};
use crate::logo::fallback_avatar;

const BUILTIN_SEED: &str = include_str!("../data/seed_companies.json");

#[derive(Debug, Deserialize)]
struct SeedRow {
    name: String,
    score: f64,
}

/// The built-in firm list, each record carrying its generated avatar.
pub fn builtin_seed(palette: &[String]) -> Result<Vec<CompanyRecord>> {
    parse_seed(BUILTIN_SEED, palette)
}

/// Parse a `[{name, score}]` seed document.
pub fn parse_seed(raw: &str, palette: &[String]) -> Result<Vec<CompanyRecord>> {
    let rows: Vec<SeedRow> =
        serde_json::from_str(raw).map_err(|err| DirectoryError::Seed(err.to_string()))?;
    Ok(rows
        .into_iter()
        .filter(|row| !row.name.trim().is_empty())
        .map(|row| {
            let logo = fallback_avatar(&row.name, palette);
            CompanyRecord::new(row.name, row.score).with_logo(logo)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogoConfig;

    #[test]
    fn builtin_seed_parses() {
        let palette = LogoConfig::default().palette;
        let seed = builtin_seed(&palette).unwrap();
        assert!(seed.len() > 1000);
        let openai = seed.iter().find(|c| c.name == "OpenAI").unwrap();
        assert_eq!(openai.id, "openai");
        assert_eq!(openai.score, 100.0);
        assert!(openai
            .logo_url
            .as_deref()
            .is_some_and(|url| url.starts_with("data:image/svg+xml,")));
        assert!(seed.iter().all(|c| c.portfolio.is_empty()));
    }

    #[test]
    fn blank_names_dropped() {
        let seed = parse_seed(
            r#"[{"name":"  ","score":3},{"name":"Acme","score":4}]"#,
            &["#000000".to_string()],
        )
        .unwrap();
        assert_eq!(seed.len(), 1);
    }

    #[test]
    fn malformed_seed_is_an_error() {
        assert!(matches!(
            parse_seed("{", &["#000000".to_string()]),
            Err(DirectoryError::Seed(_))
        ));
    }
}
