//! Context-aware global search.
//!
//! One input, many meanings: [`resolve_context`] maps the current location
//! to a [`SearchContext`], and the [`SearchDispatcher`] routes the query to
//! the matching lookup, or hands it to the hosting screen over the signal
//! bus, accepting only the newest call's response.

mod context;
mod dispatcher;

pub use context::{resolve_context, SearchContext};
pub use dispatcher::SearchDispatcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::types::{optional_string_id, string_id};
use crate::error::ApiResult;

/// Project hit from the name lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "optional_string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
}

/// Strategist hit from the paged user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategistSummary {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
}

/// One page of a paged lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    /// Zero-based page index.
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
}

/// Classified result set of the latest accepted search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchResults {
    /// Nothing to show.
    #[default]
    Empty,
    /// Project dropdown (feed and project directory).
    Projects(Vec<ProjectSummary>),
    /// Strategist dropdown.
    Strategists(Page<StrategistSummary>),
    /// Query handed to the hosting screen over the bus.
    Delegated { query: String },
}

/// How the search bar should present a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRender {
    /// No dropdown.
    Hidden,
    /// Dropdown of hits under the input.
    Dropdown,
    /// Results live in the hosting screen; nothing under the input.
    Broadcast,
}

impl SearchResults {
    /// Presentation hint.
    pub fn render(&self) -> SearchRender {
        match self {
            SearchResults::Empty => SearchRender::Hidden,
            SearchResults::Projects(_) | SearchResults::Strategists(_) => SearchRender::Dropdown,
            SearchResults::Delegated { .. } => SearchRender::Broadcast,
        }
    }

    /// Number of dropdown entries.
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Projects(hits) => hits.len(),
            SearchResults::Strategists(page) => page.content.len(),
            SearchResults::Empty | SearchResults::Delegated { .. } => 0,
        }
    }

    /// Whether there is nothing to show in a dropdown.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What happened to one `search` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response was accepted as the current results.
    Applied(SearchResults),
    /// The query was published to the hosting screen.
    Delegated,
    /// Gated out before any remote call; results cleared.
    Rejected,
    /// A newer call was issued first; the response was discarded.
    Stale,
    /// The remote call failed; results cleared.
    Failed,
}

/// Remote lookups behind the search bar.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchRemote: Send + Sync {
    /// Projects whose name contains `name`.
    async fn search_projects(&self, name: &str) -> ApiResult<Vec<ProjectSummary>>;
    /// One page of strategists whose name contains `name`.
    async fn search_strategists(
        &self,
        name: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<StrategistSummary>>;
}
