use serde::Serialize;
use vcscore_protocol::CompanyRecord;

use crate::error::DirectoryError;
use crate::loader::sort_by_score;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const LOAD_FAILED: &str = "Failed to load company data";
pub const REFRESH_FAILED: &str = "Failed to refresh company data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    Initial,
    Refresh,
}

/// Issued by [`DirectoryController::begin_load`]; only the newest ticket may
/// complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    kind: LoadKind,
}

/// Snapshot of the pagination flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageState {
    pub is_loading: bool,
    pub has_more: bool,
    pub total_count: usize,
    pub loaded_count: usize,
    pub page_size: usize,
    pub error: Option<String>,
}

/// Paged, searchable view over the merged directory.
///
/// The visible page is always `all[..loaded_count]`.
#[derive(Debug)]
pub struct DirectoryController {
    page_size: usize,
    all: Vec<CompanyRecord>,
    loaded: usize,
    is_loading: bool,
    error: Option<String>,
    issued: u64,
}

impl Default for DirectoryController {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl DirectoryController {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            all: Vec::new(),
            loaded: 0,
            is_loading: false,
            error: None,
            issued: 0,
        }
    }

    /// Controller already holding `companies`, first page visible.
    pub fn with_companies(page_size: usize, companies: Vec<CompanyRecord>) -> Self {
        let mut controller = Self::new(page_size);
        controller.install(companies);
        controller
    }

    pub fn begin_load(&mut self, kind: LoadKind) -> LoadTicket {
        self.issued += 1;
        self.is_loading = true;
        LoadTicket {
            generation: self.issued,
            kind,
        }
    }

    /// Apply a finished load. Returns `false` (and changes nothing) when a
    /// newer load has been started since `ticket` was issued.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<CompanyRecord>, DirectoryError>,
    ) -> bool {
        if ticket.generation != self.issued {
            log::debug!(
                "Dropping stale {:?} load (generation {} < {})",
                ticket.kind,
                ticket.generation,
                self.issued
            );
            return false;
        }

        self.is_loading = false;
        match result {
            Ok(companies) => {
                self.install(companies);
                self.error = None;
            }
            Err(err) => {
                let message = match ticket.kind {
                    LoadKind::Initial => LOAD_FAILED,
                    LoadKind::Refresh => REFRESH_FAILED,
                };
                log::error!("{message}: {err}");
                self.error = Some(message.to_string());
            }
        }
        true
    }

    /// Append the next page. No-op once everything is loaded; returns the
    /// number of records added.
    pub fn load_more(&mut self) -> usize {
        if !self.has_more() {
            return 0;
        }
        let start = self.loaded;
        let end = (start + self.page_size).min(self.all.len());
        self.loaded = end;
        log::debug!(
            "Loaded page {}..{} of {} companies",
            start,
            end,
            self.all.len()
        );
        end - start
    }

    /// Blank term: the visible page. Otherwise every record in the full
    /// directory whose name contains `term` (untrimmed), ignoring case.
    pub fn search(&self, term: &str) -> Vec<&CompanyRecord> {
        if term.trim().is_empty() {
            return self.visible().iter().collect();
        }
        let needle = term.to_lowercase();
        self.all
            .iter()
            .filter(|company| company.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Record by slug; with duplicate slugs the last one wins.
    pub fn find(&self, id: &str) -> Option<&CompanyRecord> {
        self.all.iter().rev().find(|company| company.id == id)
    }

    pub fn visible(&self) -> &[CompanyRecord] {
        &self.all[..self.loaded]
    }

    pub fn all(&self) -> &[CompanyRecord] {
        &self.all
    }

    pub fn has_more(&self) -> bool {
        self.loaded < self.all.len()
    }

    pub fn total_count(&self) -> usize {
        self.all.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn state(&self) -> PageState {
        PageState {
            is_loading: self.is_loading,
            has_more: self.has_more(),
            total_count: self.total_count(),
            loaded_count: self.loaded,
            page_size: self.page_size,
            error: self.error.clone(),
        }
    }

    fn install(&mut self, mut companies: Vec<CompanyRecord>) {
        sort_by_score(&mut companies);
        self.loaded = companies.len().min(self.page_size);
        self.all = companies;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn companies(n: usize) -> Vec<CompanyRecord> {
        (0..n)
            .map(|i| CompanyRecord::new(format!("Firm {i}"), (n - i) as f64))
            .collect()
    }

    #[test]
    fn first_page_then_load_more() {
        let mut controller = DirectoryController::with_companies(50, companies(120));
        assert_eq!(controller.loaded_count(), 50);
        assert!(controller.has_more());

        assert_eq!(controller.load_more(), 50);
        assert_eq!(controller.load_more(), 20);
        assert!(!controller.has_more());
        assert_eq!(controller.loaded_count(), 120);
        assert_eq!(controller.load_more(), 0);
        assert_eq!(controller.loaded_count(), 120);
    }

    #[test]
    fn small_directory_has_no_more() {
        let controller = DirectoryController::with_companies(50, companies(3));
        assert_eq!(controller.state().loaded_count, 3);
        assert!(!controller.state().has_more);
    }

    #[test]
    fn blank_search_returns_page_not_corpus() {
        let controller = DirectoryController::with_companies(10, companies(30));
        assert_eq!(controller.search("   ").len(), 10);
        assert_eq!(controller.search("").len(), 10);
    }

    #[test]
    fn search_spans_unloaded_records_without_paging() {
        let controller = DirectoryController::with_companies(10, companies(30));
        let hits = controller.search("FIRM 2");
        let names: Vec<&str> = hits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Firm 2", "Firm 20", "Firm 21", "Firm 22", "Firm 23", "Firm 24", "Firm 25", "Firm 26", "Firm 27", "Firm 28", "Firm 29"]
        );
        assert_eq!(controller.loaded_count(), 10);
    }

    #[test]
    fn search_keeps_surrounding_spaces() {
        let controller = DirectoryController::with_companies(
            5,
            vec![CompanyRecord::new("Breed VC", 2.0), CompanyRecord::new("AVCX", 1.0)],
        );
        let names: Vec<&str> = controller
            .search(" VC")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Breed VC"]);
        assert_eq!(controller.search("vc").len(), 2);
    }

    #[test]
    fn stale_load_is_dropped() {
        let mut controller = DirectoryController::new(5);
        let first = controller.begin_load(LoadKind::Initial);
        let second = controller.begin_load(LoadKind::Refresh);

        assert!(controller.complete(second, Ok(companies(2))));
        assert!(!controller.complete(first, Ok(companies(40))));
        assert_eq!(controller.total_count(), 2);
        assert!(!controller.is_loading());
    }

    #[test]
    fn refresh_resets_to_first_page() {
        let mut controller = DirectoryController::with_companies(5, companies(20));
        controller.load_more();
        controller.load_more();
        assert_eq!(controller.loaded_count(), 15);

        let ticket = controller.begin_load(LoadKind::Refresh);
        assert!(controller.is_loading());
        controller.complete(ticket, Ok(companies(20)));
        assert_eq!(controller.loaded_count(), 5);
    }

    #[test]
    fn failed_load_reports_and_keeps_data() {
        let mut controller = DirectoryController::with_companies(5, companies(8));
        let ticket = controller.begin_load(LoadKind::Refresh);
        controller.complete(ticket, Err(DirectoryError::Seed("broken".into())));
        assert_eq!(controller.error(), Some(REFRESH_FAILED));
        assert_eq!(controller.total_count(), 8);

        let ticket = controller.begin_load(LoadKind::Initial);
        controller.complete(ticket, Err(DirectoryError::Seed("broken".into())));
        assert_eq!(controller.error(), Some(LOAD_FAILED));

        let ticket = controller.begin_load(LoadKind::Refresh);
        controller.complete(ticket, Ok(companies(1)));
        assert_eq!(controller.error(), None);
    }

    #[test]
    fn find_prefers_last_duplicate() {
        let controller = DirectoryController::with_companies(
            5,
            vec![CompanyRecord::new("Acme", 9.0), CompanyRecord::new("ACME", 1.0)],
        );
        assert_eq!(controller.find("acme").map(|c| c.score), Some(1.0));
        assert!(controller.find("missing").is_none());
    }
}
