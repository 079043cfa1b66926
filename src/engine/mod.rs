//! Engine wiring.
//!
//! Builds one REST client and one signal bus and shares them into every
//! component, so a consumer holds a single [`Engine`] for the lifetime of
//! the dashboard.

use std::sync::Arc;

use tracing::info;

use crate::api::ApiClient;
use crate::comments::CommentThreadStore;
use crate::config::Config;
use crate::error::AppResult;
use crate::feed::{FeedListener, ReportFeed, ReportQuery};
use crate::filter::CascadingFilter;
use crate::hierarchy::HierarchyCache;
use crate::reactions::ReactionLedger;
use crate::search::SearchDispatcher;
use crate::signals::SignalBus;

/// Components shared across the dashboard.
#[derive(Clone)]
pub struct Engine {
    /// Application configuration.
    pub config: Config,
    /// REST client backing every remote trait.
    pub client: Arc<ApiClient>,
    /// Cross-component signal bus.
    pub bus: Arc<SignalBus>,
    /// Category/project/field taxonomy.
    pub hierarchy: Arc<HierarchyCache>,
    /// Per-user reactions and aggregates.
    pub reactions: Arc<ReactionLedger>,
    /// Comment threads by content item.
    pub comments: Arc<CommentThreadStore>,
    /// Global search bar.
    pub search: Arc<SearchDispatcher>,
    /// Report list of the mounted screen.
    pub reports: Arc<ReportFeed>,
}

impl Engine {
    /// Create the engine from configuration
    pub fn new(config: Config) -> AppResult<Self> {
        let client = Arc::new(ApiClient::new(&config.api, config.request.clone())?);
        let bus = Arc::new(SignalBus::new(&config.signals));

        let hierarchy = Arc::new(HierarchyCache::new(client.clone()));
        let reactions = Arc::new(ReactionLedger::new(client.clone()));
        let comments = Arc::new(CommentThreadStore::new(client.clone()));
        let search = Arc::new(SearchDispatcher::new(
            client.clone(),
            bus.clone(),
            config.search.clone(),
        ));
        let reports = Arc::new(ReportFeed::new(client.clone()));

        info!(
            base_url = %client.base_url(),
            signal_buffer = config.signals.buffer_capacity,
            "Engine initialized"
        );

        Ok(Self {
            config,
            client,
            bus,
            hierarchy,
            reactions,
            comments,
            search,
            reports,
        })
    }

    /// A fresh filter for one hosting screen. Instances never share a
    /// selection.
    pub fn filter(&self) -> CascadingFilter {
        CascadingFilter::new(self.hierarchy.clone())
    }

    /// Attach a content list to the bus.
    pub fn feed_listener(&self, initial: ReportQuery) -> FeedListener {
        FeedListener::mount(&self.bus, initial)
    }
}
