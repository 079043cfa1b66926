//! Content list side of the search/list handshake.
//!
//! The list is mounted per route and never sees the search bar. It attaches
//! a [`FeedListener`] to the signal bus on mount, folds incoming signals
//! into its [`ReportQuery`], and re-queries through [`ReportFeed`] whenever
//! the query actually changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::types::{optional_string_id, string_id};
use crate::error::ApiResult;
use crate::signals::{Signal, SignalBus, Subscription};

/// A report as shown in a content list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "optional_string_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,
    #[serde(deserialize_with = "string_id")]
    pub author_id: String,
    pub created_at: DateTime<Utc>,
}

/// Filter a content list queries with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Free-text filter.
    #[serde(rename = "q", skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Restrict to one author (the "my reports" screen).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl ReportQuery {
    /// Query for one author's reports.
    pub fn by_author(author_id: impl Into<String>) -> Self {
        Self {
            author_id: Some(author_id.into()),
            ..Default::default()
        }
    }

    /// Fold a signal into the query. Returns whether anything changed, so
    /// repeated or late signals are harmless.
    pub fn apply(&mut self, signal: &Signal) -> bool {
        let before = self.clone();
        match signal {
            Signal::ProjectFilterSelected { project_id } => {
                self.project_id = Some(project_id.clone());
                self.text = None;
            }
            Signal::ProjectFilterCleared => self.project_id = None,
            Signal::MyReportsSearch { query } => self.text = Some(query.clone()),
            Signal::GlobalSearchCleared => self.text = None,
        }
        *self != before
    }
}

/// Remote content list endpoint.
#[async_trait]
pub trait ReportSource: Send + Sync {
    /// Reports matching `query`, newest first.
    async fn fetch_reports(&self, query: &ReportQuery) -> ApiResult<Vec<ReportSummary>>;
}

/// A mounted list's bus subscription plus its current query.
///
/// Dropping the listener detaches it; signals published afterwards are
/// never observed.
pub struct FeedListener {
    subscription: Subscription,
    query: ReportQuery,
}

impl FeedListener {
    /// Attach to `bus` starting from `initial`.
    pub fn mount(bus: &SignalBus, initial: ReportQuery) -> Self {
        Self {
            subscription: bus.subscribe(),
            query: initial,
        }
    }

    /// Current query.
    pub fn query(&self) -> &ReportQuery {
        &self.query
    }

    /// Wait until a signal changes the query. `None` once the bus is gone.
    pub async fn next_change(&mut self) -> Option<ReportQuery> {
        loop {
            let envelope = self.subscription.recv().await?;
            if self.query.apply(&envelope.signal) {
                debug!(signal = envelope.signal.name(), "Feed query changed");
                return Some(self.query.clone());
            }
        }
    }

    /// Apply every already-published signal without waiting.
    pub fn drain(&mut self) -> Option<ReportQuery> {
        let mut changed = false;
        while let Some(envelope) = self.subscription.try_recv() {
            changed |= self.query.apply(&envelope.signal);
        }
        changed.then(|| self.query.clone())
    }
}

/// Report list state for one mounted screen.
pub struct ReportFeed {
    source: Arc<dyn ReportSource>,
    issued: AtomicU64,
    reports: RwLock<Vec<ReportSummary>>,
}

impl ReportFeed {
    /// Create an empty feed.
    pub fn new(source: Arc<dyn ReportSource>) -> Self {
        Self {
            source,
            issued: AtomicU64::new(0),
            reports: RwLock::new(Vec::new()),
        }
    }

    /// Re-query the list. A response overtaken by a newer refresh is
    /// returned to the caller but not stored.
    pub async fn refresh(&self, query: &ReportQuery) -> ApiResult<Vec<ReportSummary>> {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let reports = self.source.fetch_reports(query).await?;

        let mut current = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        if self.issued.load(Ordering::SeqCst) == token {
            *current = reports.clone();
            info!(count = reports.len(), query = ?query, "Report feed refreshed");
        }
        Ok(reports)
    }

    /// Refresh on every query change until the bus goes away.
    pub async fn follow(&self, mut listener: FeedListener) {
        while let Some(query) = listener.next_change().await {
            if let Err(e) = self.refresh(&query).await {
                warn!(error = %e, "Report feed refresh failed");
            }
        }
    }

    /// Reports from the latest refresh.
    pub fn reports(&self) -> Vec<ReportSummary> {
        self.reports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
