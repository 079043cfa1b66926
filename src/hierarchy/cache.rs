use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{HierarchyNode, HierarchySource, Rank, Taxonomy};
use crate::error::HierarchyResult;

/// Session-wide, read-shared taxonomy cache.
///
/// `children_of` and friends are pure reads of the last good snapshot.
/// Before the first successful [`load_all`](Self::load_all) they return
/// empty results, which callers must read as "still loading".
pub struct HierarchyCache {
    source: Arc<dyn HierarchySource>,
    snapshot: RwLock<Option<Arc<Taxonomy>>>,
}

impl HierarchyCache {
    /// Create an empty cache backed by `source`.
    pub fn new(source: Arc<dyn HierarchySource>) -> Self {
        Self {
            source,
            snapshot: RwLock::new(None),
        }
    }

    /// Fetch the whole taxonomy and replace the cached snapshot.
    ///
    /// On any failure the previous snapshot is left untouched.
    pub async fn load_all(&self) -> HierarchyResult<Vec<HierarchyNode>> {
        let start = Instant::now();

        let categories: Vec<HierarchyNode> = self
            .source
            .fetch_categories()
            .await?
            .into_iter()
            .map(|mut c| {
                c.rank = Rank::Category;
                c.parent_id = None;
                c
            })
            .collect();

        let mut projects = Vec::new();
        for category in &categories {
            let fetched = self.source.fetch_projects(&category.id).await?;
            debug!(category_id = %category.id, count = fetched.len(), "Fetched projects");
            projects.extend(fetched.into_iter().map(|mut p| {
                p.rank = Rank::Project;
                p.parent_id.get_or_insert_with(|| category.id.clone());
                p
            }));
        }

        let mut fields = Vec::new();
        for project in &projects {
            let fetched = self.source.fetch_fields(&project.id).await?;
            debug!(project_id = %project.id, count = fetched.len(), "Fetched fields");
            fields.extend(fetched.into_iter().map(|mut f| {
                f.rank = Rank::Field;
                f.parent_id.get_or_insert_with(|| project.id.clone());
                f
            }));
        }

        let mut nodes = categories;
        nodes.extend(projects);
        nodes.extend(fields);

        let taxonomy = Taxonomy::new(nodes).inspect_err(|e| {
            warn!(error = %e, "Rejected taxonomy; keeping previous snapshot");
        })?;
        let loaded = taxonomy.nodes().to_vec();

        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(taxonomy));

        info!(
            nodes = loaded.len(),
            latency_ms = start.elapsed().as_millis(),
            "Taxonomy loaded"
        );

        Ok(loaded)
    }

    /// Current snapshot, if one has been loaded.
    pub fn snapshot(&self) -> Option<Arc<Taxonomy>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a snapshot is available.
    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Direct children of `parent_id`. Never triggers a remote call.
    pub fn children_of(&self, parent_id: &str) -> Vec<HierarchyNode> {
        self.snapshot()
            .map(|t| t.children_of(parent_id))
            .unwrap_or_default()
    }

    /// Root categories of the current snapshot.
    pub fn categories(&self) -> Vec<HierarchyNode> {
        self.snapshot()
            .map(|t| t.categories())
            .unwrap_or_default()
    }

    /// Look up a single node.
    pub fn node(&self, id: &str) -> Option<HierarchyNode> {
        self.snapshot().and_then(|t| t.node(id).cloned())
    }

    /// Drop the snapshot once no consumer needs it.
    pub fn clear(&self) {
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult, HierarchyError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory taxonomy backend.
    pub(crate) struct FakeSource {
        nodes: Mutex<Vec<HierarchyNode>>,
        pub(crate) fail: AtomicBool,
    }

    impl FakeSource {
        pub(crate) fn new(nodes: Vec<HierarchyNode>) -> Self {
            Self {
                nodes: Mutex::new(nodes),
                fail: AtomicBool::new(false),
            }
        }

        pub(crate) fn replace(&self, nodes: Vec<HierarchyNode>) {
            *self.nodes.lock().unwrap() = nodes;
        }

        fn by_parent(&self, rank: Rank, parent: Option<&str>) -> ApiResult<Vec<HierarchyNode>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ApiError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(self
                .nodes
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.rank == rank && n.parent_id.as_deref() == parent)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl HierarchySource for FakeSource {
        async fn fetch_categories(&self) -> ApiResult<Vec<HierarchyNode>> {
            self.by_parent(Rank::Category, None)
        }

        async fn fetch_projects(&self, category_id: &str) -> ApiResult<Vec<HierarchyNode>> {
            self.by_parent(Rank::Project, Some(category_id))
        }

        async fn fetch_fields(&self, project_id: &str) -> ApiResult<Vec<HierarchyNode>> {
            self.by_parent(Rank::Field, Some(project_id))
        }
    }

    pub(crate) fn energy_taxonomy() -> Vec<HierarchyNode> {
        vec![
            HierarchyNode::category("energy", "Energy"),
            HierarchyNode::category("health", "Health"),
            HierarchyNode::project("grid", "Grid", "energy"),
            HierarchyNode::project("solar", "Solar", "energy"),
            HierarchyNode::project("clinics", "Clinics", "health"),
            HierarchyNode::field("transmission", "Transmission", "grid"),
            HierarchyNode::field("storage", "Storage", "grid"),
            HierarchyNode::field("panels", "Panels", "solar"),
        ]
    }

    #[tokio::test]
    async fn test_children_empty_before_load() {
        let cache = HierarchyCache::new(Arc::new(FakeSource::new(energy_taxonomy())));
        assert!(!cache.is_loaded());
        assert!(cache.children_of("energy").is_empty());
        assert!(cache.categories().is_empty());
    }

    #[tokio::test]
    async fn test_load_all_walks_every_level() {
        let cache = HierarchyCache::new(Arc::new(FakeSource::new(energy_taxonomy())));
        let nodes = cache.load_all().await.unwrap();
        assert_eq!(nodes.len(), 8);

        let grid_fields: Vec<_> = cache
            .children_of("grid")
            .into_iter()
            .map(|n| n.id)
            .collect();
        assert_eq!(grid_fields, vec!["transmission", "storage"]);
        assert_eq!(cache.categories().len(), 2);
        assert_eq!(cache.node("panels").unwrap().parent_id.as_deref(), Some("solar"));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_snapshot() {
        let source = Arc::new(FakeSource::new(energy_taxonomy()));
        let cache = HierarchyCache::new(source.clone());
        cache.load_all().await.unwrap();

        source.fail.store(true, Ordering::SeqCst);
        let err = cache.load_all().await.unwrap_err();
        assert!(matches!(err, HierarchyError::Remote(_)));
        assert_eq!(cache.children_of("energy").len(), 2);
    }

    #[tokio::test]
    async fn test_reload_replaces_whole_snapshot() {
        let source = Arc::new(FakeSource::new(energy_taxonomy()));
        let cache = HierarchyCache::new(source.clone());
        cache.load_all().await.unwrap();
        let before = cache.snapshot().unwrap();

        source.replace(vec![HierarchyNode::category("water", "Water")]);
        cache.load_all().await.unwrap();

        assert!(cache.children_of("energy").is_empty());
        assert_eq!(cache.categories()[0].id, "water");
        // Readers holding the old snapshot still see a complete tree.
        assert_eq!(before.children_of("energy").len(), 2);
    }

    #[tokio::test]
    async fn test_clear_discards_snapshot() {
        let cache = HierarchyCache::new(Arc::new(FakeSource::new(energy_taxonomy())));
        cache.load_all().await.unwrap();
        cache.clear();
        assert!(!cache.is_loaded());
        assert!(cache.children_of("energy").is_empty());
    }
}
