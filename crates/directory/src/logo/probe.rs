use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

static CORPORATE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(inc|llc|corp|corporation|ltd|limited|ventures|capital|partners|group|holdings)$",
    )
    .expect("valid corporate suffix regex")
});

/// External logo lookup. Implementations never fail: anything that is not a
/// confirmed logo is `None`.
#[async_trait]
pub trait LogoProbe: Send + Sync {
    async fn probe(&self, company_name: &str) -> Option<String>;
}

/// Guess the company's `.com` domain from its display name.
///
/// `"Breed Ventures"` → `breed.com`. Returns `None` when nothing is left
/// after stripping punctuation and the corporate suffix.
pub fn guess_domain(company_name: &str) -> Option<String> {
    let compact: String = company_name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect();
    let stem = CORPORATE_SUFFIX_RE.replace(&compact, "");
    if stem.is_empty() {
        return None;
    }
    Some(format!("{stem}.com"))
}

/// Probes `<base>/<domain>` with a `HEAD` request; any 2xx counts as a logo.
pub struct HttpLogoProbe {
    client: reqwest::Client,
    base: String,
}

impl HttpLogoProbe {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(client: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn logo_url(&self, company_name: &str) -> Option<String> {
        guess_domain(company_name).map(|domain| format!("{}/{domain}", self.base))
    }
}

#[async_trait]
impl LogoProbe for HttpLogoProbe {
    async fn probe(&self, company_name: &str) -> Option<String> {
        let url = self.logo_url(company_name)?;
        match self.client.head(&url).send().await {
            Ok(resp) if resp.status().is_success() => Some(url),
            Ok(resp) => {
                log::debug!("No logo at {url} ({})", resp.status());
                None
            }
            Err(err) => {
                log::debug!("Logo service unavailable for {url}: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn domain_strips_punctuation_space_and_suffix() {
        assert_eq!(guess_domain("Breed Ventures").as_deref(), Some("breed.com"));
        assert_eq!(guess_domain("Acme, Inc.").as_deref(), Some("acme.com"));
        assert_eq!(guess_domain("M33 Growth").as_deref(), Some("m33growth.com"));
        assert_eq!(
            guess_domain("Capital Partners").as_deref(),
            Some("capital.com")
        );
        assert_eq!(guess_domain("Capital"), None);
        assert_eq!(guess_domain("!!!"), None);
    }

    #[test]
    fn logo_url_joins_base() {
        let probe = HttpLogoProbe::new("https://logo.example.com/");
        assert_eq!(
            probe.logo_url("Stripe").as_deref(),
            Some("https://logo.example.com/stripe.com")
        );
    }
}
