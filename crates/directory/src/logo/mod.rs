//! Company name → display logo.
//!
//! Resolution order: manual table, external probe, generated avatar. Results
//! (including "no logo") are cached per lowercase-trimmed name for the
//! configured TTL, and concurrent lookups of one name share a single probe.

mod avatar;
mod cache;
mod probe;

pub use avatar::{fallback_avatar, initials, palette_index};
pub use cache::{unix_ms_now, CacheSnapshot, LogoCache, LogoCacheEntry};
pub use probe::{guess_domain, HttpLogoProbe, LogoProbe};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use tokio::task::JoinSet;

use crate::config::LogoConfig;

type InFlight = Arc<OnceCell<Option<String>>>;

pub struct LogoResolver {
    config: LogoConfig,
    cache: Mutex<LogoCache>,
    probe: Arc<dyn LogoProbe>,
    inflight: Mutex<HashMap<String, InFlight>>,
    /// Serializes cache file writes; each writer snapshots under it.
    persist: AsyncMutex<()>,
    clock: fn() -> u64,
}

impl LogoResolver {
    pub fn new(config: LogoConfig, cache: LogoCache, probe: Arc<dyn LogoProbe>) -> Self {
        Self {
            config,
            cache: Mutex::new(cache),
            probe,
            inflight: Mutex::new(HashMap::new()),
            persist: AsyncMutex::new(()),
            clock: unix_ms_now,
        }
    }

    /// Resolver backed by the configured cache file and the HTTP probe.
    pub fn from_config(config: LogoConfig) -> Self {
        let cache = match &config.cache_path {
            Some(path) => LogoCache::open(path, config.ttl()),
            None => LogoCache::in_memory(config.ttl()),
        };
        let probe = Arc::new(HttpLogoProbe::new(config.probe_base.clone()));
        Self::new(config, cache, probe)
    }

    /// Replace the wall clock (milliseconds since the epoch).
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &LogoConfig {
        &self.config
    }

    /// Logo URL for `company_name`, falling back to the generated avatar.
    pub async fn resolve(&self, company_name: &str) -> String {
        match self.lookup(company_name).await {
            Some(url) => url,
            None => fallback_avatar(company_name, &self.config.palette),
        }
    }

    /// Manual table or probe result, `None` when neither has a logo.
    pub async fn lookup(&self, company_name: &str) -> Option<String> {
        let key = cache_key(company_name);

        let cell = {
            let mut inflight = lock(&self.inflight);
            match inflight.get(&key) {
                Some(pending) => Arc::clone(pending),
                None => {
                    if let Some(hit) = lock(&self.cache).get(&key, (self.clock)()) {
                        return hit;
                    }
                    let cell: InFlight = Arc::new(OnceCell::new());
                    inflight.insert(key.clone(), Arc::clone(&cell));
                    cell
                }
            }
        };

        let value = cell
            .get_or_init(|| self.resolve_uncached(company_name))
            .await
            .clone();
        if self.settle(&key, &cell, &value) {
            self.write_cache().await;
        }
        value
    }

    /// Resolve names in groups of `batch_size`, pausing between groups.
    ///
    /// Output keeps the input order.
    pub async fn resolve_batch(self: &Arc<Self>, names: &[String]) -> Vec<(String, Option<String>)> {
        let mut results: Vec<(String, Option<String>)> =
            names.iter().map(|name| (name.clone(), None)).collect();
        let batch_size = self.config.batch_size.max(1);

        for (batch_idx, batch) in names.chunks(batch_size).enumerate() {
            let offset = batch_idx * batch_size;
            let mut join = JoinSet::new();
            for (idx, name) in batch.iter().enumerate() {
                let resolver = Arc::clone(self);
                let name = name.clone();
                join.spawn(async move { (offset + idx, resolver.lookup(&name).await) });
            }
            while let Some(joined) = join.join_next().await {
                match joined {
                    Ok((idx, logo)) => results[idx].1 = logo,
                    Err(err) => log::warn!("Logo lookup task failed: {err}"),
                }
            }

            if offset + batch_size < names.len() {
                tokio::time::sleep(self.config.batch_pause()).await;
            }
        }
        results
    }

    /// Drop every cached resolution, including the persisted copy.
    pub fn clear_cache(&self) {
        lock(&self.cache).clear();
    }

    pub fn cached_entries(&self) -> usize {
        lock(&self.cache).len()
    }

    async fn resolve_uncached(&self, company_name: &str) -> Option<String> {
        log::debug!("Fetching logo for: {company_name}");
        if let Some(url) = self.config.manual_logos.get(&manual_key(company_name)) {
            log::debug!("Using manual logo mapping for {company_name}");
            return Some(url.clone());
        }
        let found = self.probe.probe(company_name).await;
        match &found {
            Some(_) => log::debug!("Found logo for {company_name}"),
            None => log::debug!("No logo found for {company_name}"),
        }
        found
    }

    /// First finisher records the result and retires the in-flight slot.
    /// Returns whether this call did so.
    fn settle(&self, key: &str, cell: &InFlight, value: &Option<String>) -> bool {
        let mut inflight = lock(&self.inflight);
        let ours = inflight
            .get(key)
            .is_some_and(|pending| Arc::ptr_eq(pending, cell));
        if ours {
            lock(&self.cache).insert(key, value.clone(), (self.clock)());
            inflight.remove(key);
        }
        ours
    }

    /// Snapshot taken after the write lock so the last writer holds the newest state.
    async fn write_cache(&self) {
        let _writing = self.persist.lock().await;
        let snapshot = lock(&self.cache).snapshot();
        if let Some(snapshot) = snapshot {
            snapshot.write().await;
        }
    }
}

pub fn cache_key(company_name: &str) -> String {
    company_name.trim().to_lowercase()
}

fn manual_key(company_name: &str) -> String {
    company_name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
