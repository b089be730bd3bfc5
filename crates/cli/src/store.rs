use anyhow::{Context as AnyhowContext, Result};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use vcscore_protocol::{serialize_json_pretty, CompanyRecord};

/// Flat JSON file holding the admin-created companies.
pub struct CompanyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CompanyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored record; a missing or unreadable file reads as empty.
    pub async fn read_all(&self) -> Vec<CompanyRecord> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) => {
                log::debug!("Company store {} not readable: {err}", self.path.display());
                return Vec::new();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(records) => records,
            Err(err) => {
                log::warn!(
                    "Company store {} corrupted ({err}); treating as empty",
                    self.path.display()
                );
                Vec::new()
            }
        }
    }

    /// Append one record and rewrite the file. Writers are serialized.
    pub async fn append(&self, record: CompanyRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await;
        records.push(record);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serialize_json_pretty(&records)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
