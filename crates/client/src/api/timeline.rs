//! Timeline service endpoints: the feeds.

use crate::api::listed_items;
use crate::error::ClientError;
use crate::http::{HttpClient, RequestSpec};
use dailyfeed_core::types::Post;

impl HttpClient {
    /// Posts from members the signed-in member follows.
    pub async fn following_timeline(&self, page: u32, size: u32) -> Result<Vec<Post>, ClientError> {
        self.timeline_posts("followings", page, size).await
    }

    pub async fn most_popular(&self, page: u32, size: u32) -> Result<Vec<Post>, ClientError> {
        self.timeline_posts("most-popular", page, size).await
    }

    pub async fn most_commented(&self, page: u32, size: u32) -> Result<Vec<Post>, ClientError> {
        self.timeline_posts("most-commented", page, size).await
    }

    async fn timeline_posts(
        &self,
        feed: &str,
        page: u32,
        size: u32,
    ) -> Result<Vec<Post>, ClientError> {
        let url = format!(
            "{}/api/timeline/posts/{feed}?page={page}&size={size}",
            self.services().timeline
        );
        let value = self.execute_value(RequestSpec::get(url)).await?;
        let posts: Vec<Post> = listed_items(value)?;
        Ok(posts.into_iter().map(Post::normalized).collect())
    }
}
