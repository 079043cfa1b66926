//! Category -> project -> field taxonomy.
//!
//! The taxonomy is fetched once per session through a [`HierarchySource`]
//! and held as an immutable [`Taxonomy`] snapshot. Readers always see a
//! complete snapshot: a refresh builds and validates a new one off to the
//! side and swaps it in, so no consumer can observe a half-updated tree.

pub(crate) mod cache;

pub use cache::HierarchyCache;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ApiResult, HierarchyError, HierarchyResult};

/// Rank of a node in the three-level taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    /// Root level.
    Category,
    /// Child of a category.
    Project,
    /// Child of a project.
    Field,
}

impl Rank {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Category => "category",
            Rank::Project => "project",
            Rank::Field => "field",
        }
    }

    /// Rank a node of this rank must hang under, if any.
    pub fn parent_rank(&self) -> Option<Rank> {
        match self {
            Rank::Category => None,
            Rank::Project => Some(Rank::Category),
            Rank::Field => Some(Rank::Project),
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A category, project or field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    /// Node identifier, unique across all ranks.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent node id; `None` only for categories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Level of the node.
    pub rank: Rank,
}

impl HierarchyNode {
    /// Create a root category node.
    pub fn category(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            rank: Rank::Category,
        }
    }

    /// Create a project under `category_id`.
    pub fn project(
        id: impl Into<String>,
        name: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: Some(category_id.into()),
            rank: Rank::Project,
        }
    }

    /// Create a field under `project_id`.
    pub fn field(
        id: impl Into<String>,
        name: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: Some(project_id.into()),
            rank: Rank::Field,
        }
    }
}

/// Remote lookups used to populate the cache, one level at a time.
#[async_trait]
pub trait HierarchySource: Send + Sync {
    /// Fetch every category.
    async fn fetch_categories(&self) -> ApiResult<Vec<HierarchyNode>>;
    /// Fetch the projects of one category.
    async fn fetch_projects(&self, category_id: &str) -> ApiResult<Vec<HierarchyNode>>;
    /// Fetch the fields of one project.
    async fn fetch_fields(&self, project_id: &str) -> ApiResult<Vec<HierarchyNode>>;
}

/// Validated, immutable taxonomy snapshot.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    nodes: Vec<HierarchyNode>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl Taxonomy {
    /// Build a snapshot, checking every parent link.
    pub fn new(nodes: Vec<HierarchyNode>) -> HierarchyResult<Self> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(HierarchyError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }

        let mut children: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, node) in nodes.iter().enumerate() {
            match (node.rank.parent_rank(), node.parent_id.as_deref()) {
                (None, None) => {}
                (None, Some(_)) => {
                    return Err(HierarchyError::InvalidParent {
                        rank: node.rank.to_string(),
                        id: node.id.clone(),
                        reason: "categories cannot have a parent".to_string(),
                    });
                }
                (Some(_), None) => {
                    return Err(HierarchyError::InvalidParent {
                        rank: node.rank.to_string(),
                        id: node.id.clone(),
                        reason: "parent id is required".to_string(),
                    });
                }
                (Some(expected), Some(parent_id)) => {
                    let parent = index.get(parent_id).map(|&p| &nodes[p]).ok_or_else(|| {
                        HierarchyError::OrphanNode {
                            rank: node.rank.to_string(),
                            id: node.id.clone(),
                            parent_id: parent_id.to_string(),
                        }
                    })?;
                    if parent.rank != expected {
                        return Err(HierarchyError::InvalidParent {
                            rank: node.rank.to_string(),
                            id: node.id.clone(),
                            reason: format!(
                                "parent {} is a {}, expected a {}",
                                parent.id, parent.rank, expected
                            ),
                        });
                    }
                    children.entry(parent_id.to_string()).or_default().push(i);
                }
            }
        }

        Ok(Self {
            nodes,
            index,
            children,
        })
    }

    /// All nodes in load order.
    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&HierarchyNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Root categories.
    pub fn categories(&self) -> Vec<HierarchyNode> {
        self.nodes
            .iter()
            .filter(|n| n.rank == Rank::Category)
            .cloned()
            .collect()
    }

    /// Direct children of `parent_id`, in load order.
    pub fn children_of(&self, parent_id: &str) -> Vec<HierarchyNode> {
        self.children
            .get(parent_id)
            .map(|ids| ids.iter().map(|&i| self.nodes[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Whether `child_id` hangs directly under `parent_id`.
    pub fn is_child_of(&self, child_id: &str, parent_id: &str) -> bool {
        self.node(child_id)
            .and_then(|n| n.parent_id.as_deref())
            .is_some_and(|p| p == parent_id)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
