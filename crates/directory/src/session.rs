use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use vcscore_protocol::CompanyRecord;

use crate::controller::{DirectoryController, LoadKind, PageState};
use crate::loader::{DirectoryLoader, LoadReport};

/// What happened to one load or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(LoadReport),
    /// Recorded as the controller's error; previous data kept
    Failed,
    /// Superseded by a newer load before it finished
    Stale,
}

/// A controller shared across tasks, reloaded through a [`DirectoryLoader`].
///
/// The lock is held only to issue a ticket and to apply the result, never
/// while the sources are being fetched, so overlapping reloads race freely and
/// the generation check keeps the newest one.
#[derive(Clone)]
pub struct DirectorySession {
    controller: Arc<Mutex<DirectoryController>>,
    loader: Arc<DirectoryLoader>,
}

impl DirectorySession {
    pub fn new(loader: DirectoryLoader, page_size: usize) -> Self {
        Self {
            controller: Arc::new(Mutex::new(DirectoryController::new(page_size))),
            loader: Arc::new(loader),
        }
    }

    pub async fn load(&self) -> LoadOutcome {
        self.run(LoadKind::Initial).await
    }

    /// Same merge as [`Self::load`]; pagination restarts at the first page.
    pub async fn refresh(&self) -> LoadOutcome {
        self.run(LoadKind::Refresh).await
    }

    pub async fn load_more(&self) -> usize {
        self.controller.lock().await.load_more()
    }

    pub async fn search(&self, term: &str) -> Vec<CompanyRecord> {
        self.controller
            .lock()
            .await
            .search(term)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn visible(&self) -> Vec<CompanyRecord> {
        self.controller.lock().await.visible().to_vec()
    }

    pub async fn state(&self) -> PageState {
        self.controller.lock().await.state()
    }

    pub async fn controller(&self) -> MutexGuard<'_, DirectoryController> {
        self.controller.lock().await
    }

    async fn run(&self, kind: LoadKind) -> LoadOutcome {
        let ticket = self.controller.lock().await.begin_load(kind);
        let result = self.loader.load().await;

        let (companies, outcome) = match result {
            Ok(loaded) => (Ok(loaded.companies), LoadOutcome::Applied(loaded.report)),
            Err(err) => (Err(err), LoadOutcome::Failed),
        };
        if self.controller.lock().await.complete(ticket, companies) {
            outcome
        } else {
            LoadOutcome::Stale
        }
    }
}
