//! Remote trait implementations backed by [`ApiClient`].

use async_trait::async_trait;
use reqwest::Method;

use super::client::ApiClient;
use super::types::{
    CategoryDto, CommentDto, CommentPayload, FieldDto, ProjectDto, ReactionDto, ReactionPayload,
};
use crate::comments::{CommentRecord, CommentRemote, NewComment};
use crate::error::ApiResult;
use crate::feed::{ReportQuery, ReportSource, ReportSummary};
use crate::hierarchy::{HierarchyNode, HierarchySource};
use crate::reactions::{ReactionCounts, ReactionKind, ReactionRecord, ReactionRemote};
use crate::search::{Page, ProjectSummary, SearchRemote, StrategistSummary};

#[async_trait]
impl HierarchySource for ApiClient {
    async fn fetch_categories(&self) -> ApiResult<Vec<HierarchyNode>> {
        let url = self.endpoint(&["categories"])?;
        let categories: Vec<CategoryDto> = self.get_json(url).await?;
        Ok(categories.into_iter().map(HierarchyNode::from).collect())
    }

    async fn fetch_projects(&self, category_id: &str) -> ApiResult<Vec<HierarchyNode>> {
        let url = self.endpoint(&["projects", "category", category_id])?;
        let projects: Vec<ProjectDto> = self.get_json(url).await?;
        Ok(projects
            .into_iter()
            .map(|p| p.into_node(category_id))
            .collect())
    }

    async fn fetch_fields(&self, project_id: &str) -> ApiResult<Vec<HierarchyNode>> {
        let url = self.endpoint(&["fields", "project", project_id])?;
        let fields: Vec<FieldDto> = self.get_json(url).await?;
        Ok(fields.into_iter().map(|f| f.into_node(project_id)).collect())
    }
}

#[async_trait]
impl ReactionRemote for ApiClient {
    async fn fetch_reaction(
        &self,
        content_id: &str,
        user_id: &str,
    ) -> ApiResult<Option<ReactionKind>> {
        let url = self.endpoint(&["reactions", content_id, "user", user_id])?;
        let resource = format!("reaction {}/{}", content_id, user_id);
        let reaction: Option<ReactionDto> = self.lookup_json(url, &resource).await?;
        Ok(reaction.map(|r| r.kind))
    }

    async fn put_reaction(&self, record: &ReactionRecord) -> ApiResult<()> {
        let url = self.endpoint(&["reactions"])?;
        let payload = ReactionPayload {
            content_id: &record.content_id,
            user_id: &record.user_id,
            kind: record.kind,
        };
        self.send(self.request(Method::POST, url).json(&payload))
            .await
    }

    async fn delete_reaction(&self, content_id: &str, user_id: &str) -> ApiResult<()> {
        let url = self.endpoint(&["reactions", content_id, "user", user_id])?;
        self.send(self.request(Method::DELETE, url)).await
    }

    async fn fetch_counts(&self, content_id: &str) -> ApiResult<ReactionCounts> {
        let url = self.endpoint(&["reactions", content_id, "counts"])?;
        self.get_json(url).await
    }
}

#[async_trait]
impl CommentRemote for ApiClient {
    async fn fetch_comments(&self, content_id: &str) -> ApiResult<Vec<CommentRecord>> {
        let url = self.endpoint(&["comments", "report", content_id])?;
        let comments: Vec<CommentDto> = self.get_json(url).await?;
        Ok(comments.into_iter().map(CommentRecord::from).collect())
    }

    async fn create_comment(&self, comment: &NewComment) -> ApiResult<CommentRecord> {
        let url = self.endpoint(&["comments"])?;
        let created: CommentDto = self
            .send_json(Method::POST, url, &CommentPayload::from(comment))
            .await?;
        Ok(created.into())
    }

    async fn delete_comment(&self, comment_id: &str, requester_id: &str) -> ApiResult<()> {
        let url = self.endpoint(&["comments", comment_id])?;
        self.send(
            self.request(Method::DELETE, url)
                .query(&[("requesterId", requester_id)]),
        )
        .await
    }
}

#[async_trait]
impl SearchRemote for ApiClient {
    async fn search_projects(&self, name: &str) -> ApiResult<Vec<ProjectSummary>> {
        let url = self.endpoint(&["projects", "search"])?;
        self.fetch_json(self.request(Method::GET, url).query(&[("name", name)]))
            .await
    }

    async fn search_strategists(
        &self,
        name: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<StrategistSummary>> {
        let url = self.endpoint(&["users", "search"])?;
        self.fetch_json(
            self.request(Method::GET, url)
                .query(&[("name", name)])
                .query(&[("page", page), ("size", size)]),
        )
        .await
    }
}

#[async_trait]
impl ReportSource for ApiClient {
    async fn fetch_reports(&self, query: &ReportQuery) -> ApiResult<Vec<ReportSummary>> {
        let url = self.endpoint(&["reports"])?;
        self.fetch_json(self.request(Method::GET, url).query(query))
            .await
    }
}
