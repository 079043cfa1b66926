use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::{CommentRecord, CommentRemote, NewComment};
use crate::error::{CommentResult, ValidationError};

/// Per-item comment threads for mounted content views.
///
/// The server copy is always authoritative: posting refreshes the whole
/// thread instead of appending locally, and deletion only touches the local
/// thread after the server confirmed it.
///
/// Only the newest load of an item may replace its cached thread; a load that
/// resolves after a newer one, a delete, or a release is returned but not
/// cached.
pub struct CommentThreadStore {
    remote: Arc<dyn CommentRemote>,
    threads: RwLock<HashMap<String, Vec<CommentRecord>>>,
    issued: AtomicU64,
    /// Newest load token per mounted item. Lock after `threads`.
    latest: Mutex<HashMap<String, u64>>,
}

impl CommentThreadStore {
    /// Create an empty store.
    pub fn new(remote: Arc<dyn CommentRemote>) -> Self {
        Self {
            remote,
            threads: RwLock::new(HashMap::new()),
            issued: AtomicU64::new(0),
            latest: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch an item's thread and replace the cached copy.
    pub async fn load_thread(&self, content_id: &str) -> CommentResult<Vec<CommentRecord>> {
        let token = self.next_token(content_id);
        let thread = self.remote.fetch_comments(content_id).await?;

        let mut threads = self.threads.write().unwrap_or_else(PoisonError::into_inner);
        let current = self
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(content_id)
            == Some(&token);
        if current {
            debug!(content_id = %content_id, count = thread.len(), "Comment thread loaded");
            threads.insert(content_id.to_string(), thread.clone());
        } else {
            debug!(content_id = %content_id, token, "Discarding superseded comment thread");
        }

        Ok(thread)
    }

    /// Post a comment and refresh the thread from the server.
    pub async fn post(
        &self,
        content_id: &str,
        author_id: &str,
        body: &str,
    ) -> CommentResult<CommentRecord> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ValidationError::invalid("body", "Comment cannot be empty").into());
        }

        let created = self
            .remote
            .create_comment(&NewComment {
                content_id: content_id.to_string(),
                author_id: author_id.to_string(),
                body: body.to_string(),
            })
            .await?;

        info!(
            content_id = %content_id,
            comment_id = %created.id,
            "Comment posted"
        );

        if let Err(e) = self.load_thread(content_id).await {
            warn!(
                content_id = %content_id,
                error = %e,
                "Comment posted but thread refresh failed"
            );
        }

        Ok(created)
    }

    /// Delete a comment; the local copy goes only once the server agrees.
    pub async fn delete(&self, comment_id: &str, requester_id: &str) -> CommentResult<()> {
        self.remote.delete_comment(comment_id, requester_id).await?;

        let mut threads = self.threads.write().unwrap_or_else(PoisonError::into_inner);
        for (content_id, thread) in threads.iter_mut() {
            let before = thread.len();
            thread.retain(|c| c.id != comment_id);
            if thread.len() != before {
                // Loads issued before the delete may still carry the comment.
                self.next_token(content_id);
            }
        }

        info!(comment_id = %comment_id, requester_id = %requester_id, "Comment deleted");
        Ok(())
    }

    /// Cached thread; `None` until the first load.
    pub fn thread(&self, content_id: &str) -> Option<Vec<CommentRecord>> {
        self.threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(content_id)
            .cloned()
    }

    /// Number of cached comments for an item.
    pub fn comment_count(&self, content_id: &str) -> usize {
        self.threads
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(content_id)
            .map_or(0, Vec::len)
    }

    /// Drop an item's thread once its view unmounts.
    pub fn release(&self, content_id: &str) {
        let mut threads = self.threads.write().unwrap_or_else(PoisonError::into_inner);
        threads.remove(content_id);
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(content_id);
    }

    fn next_token(&self, content_id: &str) -> u64 {
        let token = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(content_id.to_string(), token);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult, CommentError};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeComments {
        rows: Mutex<Vec<CommentRecord>>,
        next_id: AtomicUsize,
        fetches: AtomicUsize,
        creates: AtomicUsize,
        fail_delete: AtomicBool,
        /// Holds the next fetch after it has read the rows.
        fetch_gate: Mutex<Option<Arc<Notify>>>,
        fetches_parked: AtomicUsize,
    }

    impl FakeComments {
        fn seeded(rows: Vec<CommentRecord>) -> Self {
            Self {
                next_id: AtomicUsize::new(rows.len()),
                rows: Mutex::new(rows),
                ..Default::default()
            }
        }

        fn hold_next_fetch(&self, gate: Arc<Notify>) {
            *self.fetch_gate.lock().unwrap() = Some(gate);
        }

        async fn wait_for_parked_fetch(&self) {
            while self.fetches_parked.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
        }
    }

    fn comment(id: &str, content_id: &str, body: &str) -> CommentRecord {
        CommentRecord {
            id: id.to_string(),
            content_id: content_id.to_string(),
            author_id: "u-1".to_string(),
            author_display_name: "Ada".to_string(),
            body: body.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[async_trait]
    impl CommentRemote for FakeComments {
        async fn fetch_comments(&self, content_id: &str) -> ApiResult<Vec<CommentRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let thread: Vec<CommentRecord> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.content_id == content_id)
                .cloned()
                .collect();
            let gate = self.fetch_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                self.fetches_parked.fetch_add(1, Ordering::SeqCst);
                gate.notified().await;
            }
            Ok(thread)
        }

        async fn create_comment(&self, new: &NewComment) -> ApiResult<CommentRecord> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let created = comment(&format!("c-{}", id), &new.content_id, &new.body);
            self.rows.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn delete_comment(&self, comment_id: &str, _requester_id: &str) -> ApiResult<()> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(ApiError::Api {
                    status: 403,
                    message: "forbidden".to_string(),
                });
            }
            self.rows.lock().unwrap().retain(|c| c.id != comment_id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_thread_absent_until_loaded() {
        let store = CommentThreadStore::new(Arc::new(FakeComments::default()));
        assert!(store.thread("r-1").is_none());
        assert_eq!(store.comment_count("r-1"), 0);

        store.load_thread("r-1").await.unwrap();
        assert_eq!(store.thread("r-1"), Some(vec![]));
    }

    #[tokio::test]
    async fn test_load_thread_replaces_cached_copy() {
        let remote = Arc::new(FakeComments::seeded(vec![comment("c-1", "r-1", "first")]));
        let store = CommentThreadStore::new(remote.clone());
        store.load_thread("r-1").await.unwrap();

        remote.rows.lock().unwrap().push(comment("c-9", "r-1", "moderated in"));
        let thread = store.load_thread("r-1").await.unwrap();

        assert_eq!(thread.len(), 2);
        assert_eq!(store.comment_count("r-1"), 2);
    }

    #[tokio::test]
    async fn test_post_refreshes_thread_from_server() {
        let remote = Arc::new(FakeComments::default());
        let store = CommentThreadStore::new(remote.clone());

        let created = store.post("r-1", "u-1", "  Great report  ").await.unwrap();

        assert_eq!(created.body, "Great report");
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(store.thread("r-1").unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_blank_body_rejected_before_remote() {
        let remote = Arc::new(FakeComments::default());
        let store = CommentThreadStore::new(remote.clone());

        for body in ["", "   ", "\n\t"] {
            let err = store.post("r-1", "u-1", body).await.unwrap_err();
            assert!(matches!(err, CommentError::Validation(_)));
        }
        assert_eq!(remote.creates.load(Ordering::SeqCst), 0);
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_after_success_only() {
        let remote = Arc::new(FakeComments::seeded(vec![
            comment("c-1", "r-1", "keep"),
            comment("c-2", "r-1", "remove"),
        ]));
        let store = CommentThreadStore::new(remote.clone());
        store.load_thread("r-1").await.unwrap();

        remote.fail_delete.store(true, Ordering::SeqCst);
        assert!(store.delete("c-2", "admin").await.is_err());
        assert_eq!(store.comment_count("r-1"), 2);

        remote.fail_delete.store(false, Ordering::SeqCst);
        store.delete("c-2", "admin").await.unwrap();
        let ids: Vec<_> = store.thread("r-1").unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c-1"]);
    }

    #[tokio::test]
    async fn test_release_drops_thread() {
        let store = CommentThreadStore::new(Arc::new(FakeComments::default()));
        store.load_thread("r-1").await.unwrap();
        store.release("r-1");
        assert!(store.thread("r-1").is_none());
    }

    #[tokio::test]
    async fn test_late_initial_load_does_not_replace_refreshed_thread() {
        let remote = Arc::new(FakeComments::default());
        let gate = Arc::new(Notify::new());
        remote.hold_next_fetch(gate.clone());
        let store = Arc::new(CommentThreadStore::new(remote.clone()));

        let initial = tokio::spawn({
            let store = store.clone();
            async move { store.load_thread("r-1").await }
        });
        remote.wait_for_parked_fetch().await;

        store.post("r-1", "u-1", "hello").await.unwrap();
        assert_eq!(store.comment_count("r-1"), 1);

        gate.notify_one();
        let stale = initial.await.unwrap().unwrap();

        assert!(stale.is_empty());
        assert_eq!(store.comment_count("r-1"), 1);
        assert_eq!(store.thread("r-1").unwrap()[0].body, "hello");
    }

    #[tokio::test]
    async fn test_load_resolving_after_release_is_not_cached() {
        let remote = Arc::new(FakeComments::seeded(vec![comment("c-1", "r-1", "first")]));
        let gate = Arc::new(Notify::new());
        remote.hold_next_fetch(gate.clone());
        let store = Arc::new(CommentThreadStore::new(remote.clone()));

        let load = tokio::spawn({
            let store = store.clone();
            async move { store.load_thread("r-1").await }
        });
        remote.wait_for_parked_fetch().await;

        store.release("r-1");
        gate.notify_one();
        assert_eq!(load.await.unwrap().unwrap().len(), 1);

        assert!(store.thread("r-1").is_none());
    }

    #[tokio::test]
    async fn test_load_issued_before_delete_does_not_restore_comment() {
        let remote = Arc::new(FakeComments::seeded(vec![
            comment("c-1", "r-1", "keep"),
            comment("c-2", "r-1", "remove"),
        ]));
        let store = Arc::new(CommentThreadStore::new(remote.clone()));
        store.load_thread("r-1").await.unwrap();

        let gate = Arc::new(Notify::new());
        remote.hold_next_fetch(gate.clone());
        let load = tokio::spawn({
            let store = store.clone();
            async move { store.load_thread("r-1").await }
        });
        remote.wait_for_parked_fetch().await;

        store.delete("c-2", "admin").await.unwrap();
        gate.notify_one();
        load.await.unwrap().unwrap();

        let ids: Vec<_> = store.thread("r-1").unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c-1"]);
    }
}
