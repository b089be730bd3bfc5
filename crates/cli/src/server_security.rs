//! Admin write-path guards: the bearer secret and the bind policy for `serve`.

use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

pub const ADMIN_TOKEN_ENV: &str = "VCSCORE_ADMIN_TOKEN";

/// Secret a `POST` must present as `Authorization: Bearer <secret>`.
#[derive(Clone, Debug)]
pub struct AdminToken(String);

impl AdminToken {
    pub fn new(raw: &str) -> Result<Self> {
        let secret = raw.trim();
        if secret.is_empty() {
            anyhow::bail!("admin token must be non-empty")
        }
        Ok(Self(secret.to_string()))
    }

    /// `--auth-token` wins over the environment; having neither is an error.
    pub fn from_sources(flag: Option<String>, env: Option<String>) -> Result<Self> {
        match flag.or(env) {
            Some(raw) => Self::new(&raw),
            None => anyhow::bail!(
                "serve requires an admin token: set --auth-token or export {ADMIN_TOKEN_ENV}"
            ),
        }
    }

    pub fn authorizes(&self, authorization: &str) -> bool {
        match authorization.split_once(' ') {
            Some(("Bearer", presented)) => same_secret(presented.as_bytes(), self.0.as_bytes()),
            _ => false,
        }
    }
}

/// Socket addresses for `bind`; anything off loopback needs `public`.
pub async fn admin_bind_addrs(bind: &str, public: bool) -> Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Failed to resolve bind address: {bind}"))?
        .collect();
    if addrs.is_empty() {
        anyhow::bail!("Bind address {bind} resolved to nothing")
    }
    if !public && !loopback_only(&addrs) {
        anyhow::bail!(
            "Refusing to bind {bind}: the admin API only listens on loopback unless --public is given"
        )
    }
    Ok(addrs)
}

fn loopback_only(addrs: &[SocketAddr]) -> bool {
    addrs.iter().all(|addr| addr.ip().is_loopback())
}

/// Runtime depends on `expected` alone, not on where `presented` diverges.
fn same_secret(presented: &[u8], expected: &[u8]) -> bool {
    let mut mismatch = presented.len() ^ expected.len();
    for (idx, byte) in expected.iter().enumerate() {
        let other = presented.get(idx).copied().unwrap_or(!byte);
        mismatch |= usize::from(byte ^ other);
    }
    mismatch == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_exact_bearer_secret_authorizes() {
        let token = AdminToken::new("  mvp-secret  ").unwrap();
        assert!(token.authorizes("Bearer mvp-secret"));
        assert!(!token.authorizes("Bearer  mvp-secret"));
        assert!(!token.authorizes("bearer mvp-secret"));
        assert!(!token.authorizes("mvp-secret"));
        assert!(!token.authorizes("Bearer mvp-secre"));
        assert!(!token.authorizes("Bearer mvp-secret!"));
        assert!(!token.authorizes("Bearer "));
    }

    #[test]
    fn flag_beats_env_and_blank_is_rejected() {
        let token = AdminToken::from_sources(Some("flag".into()), Some("env".into())).unwrap();
        assert!(token.authorizes("Bearer flag"));
        let token = AdminToken::from_sources(None, Some("env".into())).unwrap();
        assert!(token.authorizes("Bearer env"));

        let missing = AdminToken::from_sources(None, None).unwrap_err();
        assert!(missing.to_string().contains("serve requires an admin token"));
        assert!(AdminToken::new("   ").is_err());
    }

    #[test]
    fn mixed_loopback_and_wildcard_is_not_loopback_only() {
        let local: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let local_v6: SocketAddr = "[::1]:8080".parse().unwrap();
        let wildcard: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert!(loopback_only(&[local, local_v6]));
        assert!(!loopback_only(&[local, wildcard]));
    }

    #[tokio::test]
    async fn non_loopback_bind_needs_public() {
        admin_bind_addrs("127.0.0.1:0", false).await.unwrap();
        let refused = admin_bind_addrs("0.0.0.0:0", false).await.unwrap_err();
        assert!(refused.to_string().starts_with("Refusing to bind"));
        admin_bind_addrs("0.0.0.0:0", true).await.unwrap();
    }
}
