//! Per-user reactions and the shared per-item aggregate.
//!
//! The user's own reaction is tracked optimistically; the aggregate counts
//! are only ever replaced by a fresh copy from the server, never adjusted
//! locally, because other users may react at the same time.

mod ledger;

pub use ledger::ReactionLedger;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// Kind of reaction a user can leave on a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionKind {
    /// General approval.
    Like,
    /// Strong approval.
    Love,
    /// Marks the item as informative.
    Insightful,
    /// Disapproval.
    Dislike,
}

impl ReactionKind {
    /// All kinds in display order.
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Like,
        ReactionKind::Love,
        ReactionKind::Insightful,
        ReactionKind::Dislike,
    ];

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Like => "like",
            ReactionKind::Love => "love",
            ReactionKind::Insightful => "insightful",
            ReactionKind::Dislike => "dislike",
        }
    }
}

impl std::fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "like" => Ok(ReactionKind::Like),
            "love" => Ok(ReactionKind::Love),
            "insightful" => Ok(ReactionKind::Insightful),
            "dislike" => Ok(ReactionKind::Dislike),
            _ => Err(format!("Unknown reaction kind: {}", s)),
        }
    }
}

/// One user's reaction on one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRecord {
    /// Item reacted on.
    pub content_id: String,
    /// User who reacted.
    pub user_id: String,
    /// The single reaction this user holds on the item.
    pub kind: ReactionKind,
}

/// Server-computed reaction totals per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    #[serde(default)]
    pub like: u64,
    #[serde(default)]
    pub love: u64,
    #[serde(default)]
    pub insightful: u64,
    #[serde(default)]
    pub dislike: u64,
}

impl ReactionCounts {
    /// Count for one kind.
    pub fn get(&self, kind: ReactionKind) -> u64 {
        match kind {
            ReactionKind::Like => self.like,
            ReactionKind::Love => self.love,
            ReactionKind::Insightful => self.insightful,
            ReactionKind::Dislike => self.dislike,
        }
    }

    /// Sum across all kinds.
    pub fn total(&self) -> u64 {
        self.like + self.love + self.insightful + self.dislike
    }
}

/// Aggregate counts mirrored for one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionAggregate {
    pub content_id: String,
    pub counts: ReactionCounts,
}

/// What a reaction control needs to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionView {
    pub aggregate: ReactionAggregate,
    /// The viewing user's current reaction.
    pub mine: Option<ReactionKind>,
    /// A toggle for this user is in flight; the control should be disabled.
    pub pending: bool,
}

/// Remote reaction endpoints.
#[async_trait]
pub trait ReactionRemote: Send + Sync {
    /// The user's reaction on an item.
    ///
    /// An item the user never reacted to may come back either as `Ok(None)`
    /// or as [`ApiError::NotFound`](crate::error::ApiError::NotFound).
    async fn fetch_reaction(&self, content_id: &str, user_id: &str)
        -> ApiResult<Option<ReactionKind>>;
    /// Add a reaction or replace the user's existing one.
    async fn put_reaction(&self, record: &ReactionRecord) -> ApiResult<()>;
    /// Remove the user's reaction.
    async fn delete_reaction(&self, content_id: &str, user_id: &str) -> ApiResult<()>;
    /// Current aggregate counts for an item.
    async fn fetch_counts(&self, content_id: &str) -> ApiResult<ReactionCounts>;
}
