//! In-process publish/subscribe between components that share no parent.
//!
//! The search bar lives in the persistent page frame; the content list lives
//! in the per-route page body. Neither holds a reference to the other, so
//! they coordinate only through [`Signal`]s on a [`SignalBus`].

mod bus;

pub use bus::{SignalBus, SignalEnvelope, Subscription};

use serde::{Deserialize, Serialize};

/// Cross-component signal. Never serialized across a network boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum Signal {
    /// A project was picked in the search dropdown.
    ProjectFilterSelected {
        /// Project to filter the content list by.
        project_id: String,
    },
    /// The project filter was removed.
    ProjectFilterCleared,
    /// Free-text search delegated to the "my reports" screen.
    MyReportsSearch {
        /// Raw query text.
        query: String,
    },
    /// The global search input was cleared.
    GlobalSearchCleared,
}

impl Signal {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::ProjectFilterSelected { .. } => "project-filter-selected",
            Signal::ProjectFilterCleared => "project-filter-cleared",
            Signal::MyReportsSearch { .. } => "my-reports-search",
            Signal::GlobalSearchCleared => "global-search-cleared",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
