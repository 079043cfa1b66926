use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::comments::{CommentRecord, NewComment};
use crate::hierarchy::HierarchyNode;
use crate::reactions::ReactionKind;

/// Identifier that the backend may send as either a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Deserialize a numeric or string id into a `String`.
pub fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

/// Deserialize an optional numeric or string id.
pub fn optional_string_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

/// Category as returned by `GET /categories`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDto {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub name: String,
}

/// Project as returned by `GET /projects/category/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_id")]
    pub category_id: Option<String>,
}

/// Field as returned by `GET /fields/project/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDto {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "optional_string_id")]
    pub project_id: Option<String>,
}

/// The requesting user's reaction on a content item
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionDto {
    pub kind: ReactionKind,
}

/// Body of `POST /reactions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionPayload<'a> {
    pub content_id: &'a str,
    pub user_id: &'a str,
    pub kind: ReactionKind,
}

/// Comment as returned by the comment endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    #[serde(deserialize_with = "string_id")]
    pub id: String,
    #[serde(deserialize_with = "string_id")]
    pub report_id: String,
    #[serde(deserialize_with = "string_id")]
    pub author_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /comments`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPayload<'a> {
    pub report_id: &'a str,
    pub author_id: &'a str,
    pub body: &'a str,
}

impl From<CategoryDto> for HierarchyNode {
    fn from(dto: CategoryDto) -> Self {
        HierarchyNode::category(dto.id, dto.name)
    }
}

impl ProjectDto {
    /// Convert, defaulting the parent to the category it was fetched under.
    pub fn into_node(self, category_id: &str) -> HierarchyNode {
        let parent = self.category_id.unwrap_or_else(|| category_id.to_string());
        HierarchyNode::project(self.id, self.name, parent)
    }
}

impl FieldDto {
    /// Convert, defaulting the parent to the project it was fetched under.
    pub fn into_node(self, project_id: &str) -> HierarchyNode {
        let parent = self.project_id.unwrap_or_else(|| project_id.to_string());
        HierarchyNode::field(self.id, self.name, parent)
    }
}

impl From<CommentDto> for CommentRecord {
    fn from(dto: CommentDto) -> Self {
        CommentRecord {
            author_display_name: dto.author_name.unwrap_or_else(|| dto.author_id.clone()),
            id: dto.id,
            content_id: dto.report_id,
            author_id: dto.author_id,
            body: dto.body,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

impl<'a> From<&'a NewComment> for CommentPayload<'a> {
    fn from(comment: &'a NewComment) -> Self {
        CommentPayload {
            report_id: &comment.content_id,
            author_id: &comment.author_id,
            body: &comment.body,
        }
    }
}
