//! Lazily loaded, server-authoritative comment threads.

mod store;

pub use store::CommentThreadStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;

/// A comment on a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    /// Server-assigned identifier.
    pub id: String,
    /// Content item the comment belongs to.
    pub content_id: String,
    /// User who wrote the comment.
    pub author_id: String,
    /// Author name as shown next to the comment.
    pub author_display_name: String,
    /// Trimmed, non-empty comment text.
    pub body: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A comment about to be posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content_id: String,
    pub author_id: String,
    pub body: String,
}

/// Remote comment endpoints.
#[async_trait]
pub trait CommentRemote: Send + Sync {
    /// Full thread for a content item, oldest first.
    async fn fetch_comments(&self, content_id: &str) -> ApiResult<Vec<CommentRecord>>;
    /// Create a comment; returns the server's copy.
    async fn create_comment(&self, comment: &NewComment) -> ApiResult<CommentRecord>;
    /// Delete a comment on behalf of `requester_id`.
    async fn delete_comment(&self, comment_id: &str, requester_id: &str) -> ApiResult<()>;
}
