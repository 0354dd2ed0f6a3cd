//! Content service endpoints: posts, comments, likes.

use crate::api::listed_items;
use crate::error::ClientError;
use crate::http::{HttpClient, RequestSpec};
use dailyfeed_core::types::{Comment, Post, PostDetail};
use serde_json::{json, Value};

impl HttpClient {
    pub async fn create_post(&self, content: &str) -> Result<Value, ClientError> {
        let url = format!("{}/api/posts", self.services().content);
        self.execute_value(RequestSpec::post_json(url, json!({"content": content})))
            .await
    }

    /// The signed-in member's own posts.
    pub async fn posts(&self, page: u32, size: u32) -> Result<Vec<Post>, ClientError> {
        let url = format!(
            "{}/api/posts?page={page}&size={size}",
            self.services().content
        );
        let value = self.execute_value(RequestSpec::get(url)).await?;
        let posts: Vec<Post> = listed_items(value)?;
        Ok(posts.into_iter().map(Post::normalized).collect())
    }

    pub async fn post_detail(&self, post_id: i64) -> Result<PostDetail, ClientError> {
        let url = format!("{}/api/posts/{post_id}", self.services().content);
        let value = self.execute_value(RequestSpec::get(url)).await?;
        let node = value.get("data").cloned().unwrap_or(value);

        let detail: PostDetail = serde_json::from_value(node)?;
        Ok(detail.normalized())
    }

    pub async fn post_comments(&self, post_id: i64) -> Result<Vec<Comment>, ClientError> {
        let url = format!("{}/api/comments/post/{post_id}", self.services().content);
        let value = self.execute_value(RequestSpec::get(url)).await?;
        listed_items(value)
    }

    /// Like a post; returns the updated like count when the backend
    /// supplies one.
    pub async fn like_post(&self, post_id: i64) -> Result<Option<i64>, ClientError> {
        let url = format!("{}/api/posts/{post_id}/like", self.services().content);
        let value = self
            .execute_value(RequestSpec::new(reqwest::Method::POST, url))
            .await?;
        Ok(value.get("data").and_then(Value::as_i64))
    }

    /// Remove a like; returns the updated like count when the backend
    /// supplies one.
    pub async fn unlike_post(&self, post_id: i64) -> Result<Option<i64>, ClientError> {
        let url = format!("{}/api/posts/{post_id}/like", self.services().content);
        let value = self.execute_value(RequestSpec::delete(url)).await?;
        Ok(value.get("data").and_then(Value::as_i64))
    }
}
