use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{
    resolve_context, ProjectSummary, SearchContext, SearchOutcome, SearchRemote, SearchResults,
};
use crate::config::SearchConfig;
use crate::signals::{Signal, SignalBus, SignalEnvelope};

/// Routes the global search input and keeps the latest result set.
///
/// Every call takes a sequence token when it is issued. A response is only
/// accepted if its token is still the newest one, so a slow response to an
/// older query can never overwrite the results of a newer query.
pub struct SearchDispatcher {
    remote: Arc<dyn SearchRemote>,
    bus: Arc<SignalBus>,
    config: SearchConfig,
    issued: AtomicU64,
    results: Mutex<SearchResults>,
}

impl SearchDispatcher {
    /// Create a dispatcher publishing on `bus`.
    pub fn new(remote: Arc<dyn SearchRemote>, bus: Arc<SignalBus>, config: SearchConfig) -> Self {
        Self {
            remote,
            bus,
            config,
            issued: AtomicU64::new(0),
            results: Mutex::new(SearchResults::Empty),
        }
    }

    /// Run a search in `context` right away.
    pub async fn search(&self, context: SearchContext, query: &str) -> SearchOutcome {
        let token = self.issue();
        self.run(token, context, query).await
    }

    /// Run a search after the debounce window, unless a newer call arrives
    /// first, in which case no remote call is made at all.
    pub async fn search_debounced(&self, context: SearchContext, query: &str) -> SearchOutcome {
        let token = self.issue();
        tokio::time::sleep(Duration::from_millis(self.config.debounce_ms)).await;
        if !self.is_latest(token) {
            debug!(token, "Debounced search superseded");
            return SearchOutcome::Stale;
        }
        self.run(token, context, query).await
    }

    /// Resolve the context from `pathname` and search in it.
    pub async fn search_at(&self, pathname: &str, query: &str) -> SearchOutcome {
        self.search(resolve_context(pathname), query).await
    }

    /// Publish a dropdown pick so the mounted feed filters by it.
    pub fn select_project(&self, project: &ProjectSummary) -> SignalEnvelope {
        let token = self.issue();
        self.accept(token, SearchResults::Empty);
        info!(project_id = %project.id, "Project filter selected from search");
        self.bus.publish(Signal::ProjectFilterSelected {
            project_id: project.id.clone(),
        })
    }

    /// Clear the input: drop results and tell the hosting screen.
    pub fn clear(&self, context: SearchContext) {
        let token = self.issue();
        self.accept(token, SearchResults::Empty);
        if context == SearchContext::Feed {
            self.bus.publish(Signal::ProjectFilterCleared);
        }
        self.bus.publish(Signal::GlobalSearchCleared);
    }

    /// Latest accepted result set.
    pub fn results(&self) -> SearchResults {
        self.lock_results().clone()
    }

    async fn run(&self, token: u64, context: SearchContext, query: &str) -> SearchOutcome {
        let query = query.trim();
        if !context.is_searchable() || query.chars().count() < self.config.min_query_len {
            debug!(context = %context, token, "Search gated out");
            self.accept(token, SearchResults::Empty);
            return SearchOutcome::Rejected;
        }

        let start = Instant::now();
        let response = match context {
            SearchContext::MyReports => {
                self.bus.publish(Signal::MyReportsSearch {
                    query: query.to_string(),
                });
                self.accept(
                    token,
                    SearchResults::Delegated {
                        query: query.to_string(),
                    },
                );
                return SearchOutcome::Delegated;
            }
            SearchContext::Feed | SearchContext::Projects => self
                .remote
                .search_projects(query)
                .await
                .map(SearchResults::Projects),
            SearchContext::Strategists => self
                .remote
                .search_strategists(query, 0, self.config.page_size)
                .await
                .map(SearchResults::Strategists),
            SearchContext::Profile | SearchContext::Disabled => return SearchOutcome::Rejected,
        };

        match response {
            Ok(results) => {
                let hits = results.len();
                if !self.accept(token, results.clone()) {
                    debug!(token, context = %context, "Discarding stale search response");
                    return SearchOutcome::Stale;
                }
                info!(
                    context = %context,
                    hits,
                    latency_ms = start.elapsed().as_millis(),
                    "Search completed"
                );
                SearchOutcome::Applied(results)
            }
            Err(e) => {
                if !self.accept(token, SearchResults::Empty) {
                    return SearchOutcome::Stale;
                }
                warn!(context = %context, error = %e, "Search failed");
                SearchOutcome::Failed
            }
        }
    }

    fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, token: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == token
    }

    /// Store `results` if `token` is still the newest call.
    fn accept(&self, token: u64, results: SearchResults) -> bool {
        let mut current = self.lock_results();
        if !self.is_latest(token) {
            return false;
        }
        *current = results;
        true
    }

    fn lock_results(&self) -> MutexGuard<'_, SearchResults> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
