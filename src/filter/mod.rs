//! Cascading category -> project -> field selection.
//!
//! [`CascadingFilter`] is the single state machine behind every screen that
//! picks a taxonomy position: report creation, report filtering and field
//! management each instantiate their own, and none of them know which
//! screen hosts them. Transitions are synchronous, so they are strictly
//! ordered by call order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FilterError, FilterResult};
use crate::hierarchy::{HierarchyCache, HierarchyNode, Rank, Taxonomy};

/// Current position in the taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    /// Selected category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    /// Selected project, always a child of `category_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Selected field, always a child of `project_id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
}

/// How many levels of the selection are pinned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterLevel {
    /// Nothing selected.
    None,
    /// Only a category.
    Category,
    /// Category and project.
    CategoryProject,
    /// Category, project and field.
    CategoryProjectField,
}

impl FilterSelection {
    /// Derive the state from which ids are set.
    pub fn level(&self) -> FilterLevel {
        match (&self.category_id, &self.project_id, &self.field_id) {
            (Some(_), Some(_), Some(_)) => FilterLevel::CategoryProjectField,
            (Some(_), Some(_), None) => FilterLevel::CategoryProject,
            (Some(_), None, None) => FilterLevel::Category,
            _ => FilterLevel::None,
        }
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.level() == FilterLevel::None
    }
}

/// Option lists for each dependent select, computed from the live cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Every category.
    pub categories: Vec<HierarchyNode>,
    /// Projects of the selected category.
    pub projects: Vec<HierarchyNode>,
    /// Fields of the selected project.
    pub fields: Vec<HierarchyNode>,
}

/// Three-level dependent selection over a [`HierarchyCache`].
pub struct CascadingFilter {
    cache: Arc<HierarchyCache>,
    selection: FilterSelection,
}

impl CascadingFilter {
    /// Create a filter with nothing selected.
    pub fn new(cache: Arc<HierarchyCache>) -> Self {
        Self {
            cache,
            selection: FilterSelection::default(),
        }
    }

    /// Current selection.
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// Current state.
    pub fn level(&self) -> FilterLevel {
        self.selection.level()
    }

    /// Select a category, unconditionally dropping project and field.
    ///
    /// Re-selecting the already selected category still resets its
    /// descendants. Returns the project options for the new category.
    pub fn set_category(&mut self, id: &str) -> FilterResult<Vec<HierarchyNode>> {
        let taxonomy = self.taxonomy()?;
        match taxonomy.node(id) {
            Some(node) if node.rank == Rank::Category => {}
            _ => return Err(FilterError::UnknownCategory { id: id.to_string() }),
        }

        self.selection = FilterSelection {
            category_id: Some(id.to_string()),
            project_id: None,
            field_id: None,
        };
        debug!(category_id = %id, "Filter category selected");

        Ok(taxonomy.children_of(id))
    }

    /// Select a project of the current category and drop the field.
    ///
    /// Returns the field options for the new project.
    pub fn set_project(&mut self, id: &str) -> FilterResult<Vec<HierarchyNode>> {
        let taxonomy = self.taxonomy()?;
        let category_id = self
            .selection
            .category_id
            .as_deref()
            .ok_or_else(|| FilterError::NoParentSelected {
                level: Rank::Category.to_string(),
            })?;

        if !taxonomy.is_child_of(id, category_id) {
            return Err(FilterError::NotAChild {
                id: id.to_string(),
                parent_id: category_id.to_string(),
            });
        }

        self.selection.project_id = Some(id.to_string());
        self.selection.field_id = None;
        debug!(project_id = %id, "Filter project selected");

        Ok(taxonomy.children_of(id))
    }

    /// Select a field of the current project.
    ///
    /// Fields are the last level, so the returned option list is always
    /// empty.
    pub fn set_field(&mut self, id: &str) -> FilterResult<Vec<HierarchyNode>> {
        let taxonomy = self.taxonomy()?;
        let project_id = self
            .selection
            .project_id
            .as_deref()
            .ok_or_else(|| FilterError::NoParentSelected {
                level: Rank::Project.to_string(),
            })?;

        if !taxonomy.is_child_of(id, project_id) {
            return Err(FilterError::NotAChild {
                id: id.to_string(),
                parent_id: project_id.to_string(),
            });
        }

        self.selection.field_id = Some(id.to_string());
        debug!(field_id = %id, "Filter field selected");

        Ok(taxonomy.children_of(id))
    }

    /// Drop the project and, with it, the field.
    pub fn clear_project(&mut self) {
        self.selection.project_id = None;
        self.selection.field_id = None;
    }

    /// Drop only the field.
    pub fn clear_field(&mut self) {
        self.selection.field_id = None;
    }

    /// Return to the empty state.
    pub fn clear(&mut self) {
        self.selection = FilterSelection::default();
    }

    /// Option lists for all three selects, read fresh from the cache.
    pub fn options(&self) -> FilterOptions {
        let projects = self
            .selection
            .category_id
            .as_deref()
            .map(|id| self.cache.children_of(id))
            .unwrap_or_default();
        let fields = self
            .selection
            .project_id
            .as_deref()
            .map(|id| self.cache.children_of(id))
            .unwrap_or_default();

        FilterOptions {
            categories: self.cache.categories(),
            projects,
            fields,
        }
    }

    fn taxonomy(&self) -> FilterResult<Arc<Taxonomy>> {
        self.cache.snapshot().ok_or(FilterError::NotLoaded)
    }
}
