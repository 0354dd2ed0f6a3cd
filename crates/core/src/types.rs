use serde::{Deserialize, Serialize};

/// Credentials submitted to the member service login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrivacyLevel {
    Public,
    Private,
    FriendsOnly,
}

/// Denormalized snapshot of the signed-in member, cached alongside the token.
///
/// Display data only; authorization is carried entirely by the bearer token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub member_name: String,
    pub handle: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub member_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub privacy_level: Option<PrivacyLevel>,
    #[serde(default)]
    pub followers_count: Option<i64>,
    #[serde(default)]
    pub following_count: Option<i64>,
}

/// Profile fields editable through the member service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub member_name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy_level: Option<PrivacyLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_avatar_url: Option<Vec<String>>,
}

/// Envelope the backend services wrap their payloads in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: Option<i32>,
    #[serde(default)]
    pub result: Option<String>,
    pub data: T,
}

/// A page of results as returned by the backend services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
}

/// A post as rendered in feeds and timelines.
///
/// The content and timeline services disagree on author/count field names;
/// aliases absorb the variance so callers see one shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(alias = "_id")]
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default, alias = "authorName", alias = "writerName", alias = "userName")]
    pub member_name: Option<String>,
    #[serde(default, alias = "authorHandle", alias = "writerHandle", alias = "userHandle", alias = "handle")]
    pub member_handle: Option<String>,
    #[serde(default, alias = "displayName")]
    pub member_display_name: Option<String>,
    #[serde(default, alias = "createdDate", alias = "timestamp")]
    pub created_at: Option<String>,
    #[serde(default, alias = "updatedDate")]
    pub updated_at: Option<String>,
    #[serde(default, alias = "likeCount")]
    pub likes_count: Option<i64>,
    #[serde(default, alias = "commentCount")]
    pub comments_count: Option<i64>,
    #[serde(default, alias = "shareCount")]
    pub shares_count: Option<i64>,
    #[serde(default)]
    pub is_liked: Option<bool>,
}

impl Post {
    /// Fill in display fields the backend left empty, falling back to the
    /// author id when no name is available at all.
    pub fn normalized(mut self) -> Self {
        let author_id = self.author_id;
        let by_id = |prefix: &str| author_id.map(|id| format!("{prefix}{id}"));
        if self.member_name.is_none() {
            self.member_name = by_id("User ").or(Some("Unknown User".into()));
        }
        if self.member_handle.is_none() {
            self.member_handle = by_id("user").or(Some("unknown".into()));
        }
        if self.member_display_name.is_none() {
            self.member_display_name = self.member_name.clone();
        }
        self.likes_count = Some(self.likes_count.unwrap_or(0));
        self.comments_count = Some(self.comments_count.unwrap_or(0));
        self.shares_count = Some(self.shares_count.unwrap_or(0));
        self.is_liked = Some(self.is_liked.unwrap_or(false));
        self
    }
}

/// Post detail view, with author avatar and member id resolved.
///
/// No alias on `member_id`: an outer alias for `authorId` would consume the
/// key before the flattened [`Post`] gets to read it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    #[serde(default)]
    pub member_id: Option<i64>,
    #[serde(default)]
    pub member_avatar_url: Option<String>,
}

impl PostDetail {
    /// Normalize the embedded post and resolve the member id from the
    /// author id when the response carries only the latter.
    pub fn normalized(mut self) -> Self {
        self.post = self.post.normalized();
        if self.member_id.is_none() {
            self.member_id = self.post.author_id;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    #[serde(default)]
    pub member_name: Option<String>,
    #[serde(default)]
    pub member_handle: Option<String>,
    #[serde(default)]
    pub member_display_name: Option<String>,
    #[serde(default)]
    pub member_avatar_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A member suggested in the "who to follow" list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedMember {
    pub id: String,
    pub member_name: String,
    #[serde(default, alias = "memberHandle")]
    pub handle: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub followers_count: Option<i64>,
    #[serde(default)]
    pub is_following: Option<bool>,
}

impl RecommendedMember {
    /// Handle with the original's fallback to the member name.
    pub fn handle_or_name(&self) -> &str {
        self.handle.as_deref().unwrap_or(&self.member_name)
    }
}

/// A member in a followers or followings list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowingMember {
    pub id: String,
    pub member_name: String,
    #[serde(default, alias = "memberHandle")]
    pub handle: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub followers_count: Option<i64>,
}

/// Both sides of the follow graph for the signed-in member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowersFollowings {
    pub followers: Page<FollowingMember>,
    pub followings: Page<FollowingMember>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_aliases_absorb_timeline_field_names() {
        let post: Post = serde_json::from_str(
            r#"{"id": 7, "content": "hi", "authorName": "kim", "likeCount": 3, "authorId": 12}"#,
        )
        .unwrap();
        assert_eq!(post.member_name.as_deref(), Some("kim"));
        assert_eq!(post.likes_count, Some(3));
    }

    #[test]
    fn normalized_falls_back_to_author_id() {
        let post = Post {
            id: 1,
            content: "x".into(),
            author_id: Some(42),
            ..Default::default()
        }
        .normalized();
        assert_eq!(post.member_name.as_deref(), Some("User 42"));
        assert_eq!(post.member_handle.as_deref(), Some("user42"));
        assert_eq!(post.likes_count, Some(0));
        assert_eq!(post.is_liked, Some(false));
    }

    #[test]
    fn normalized_without_author_uses_placeholders() {
        let post = Post {
            id: 2,
            content: "y".into(),
            ..Default::default()
        }
        .normalized();
        assert_eq!(post.member_name.as_deref(), Some("Unknown User"));
        assert_eq!(post.member_handle.as_deref(), Some("unknown"));
    }

    #[test]
    fn post_detail_leaves_author_id_to_the_flattened_post() {
        let detail: PostDetail = serde_json::from_str(
            r#"{"id": 9, "content": "hi", "authorId": 7, "memberAvatarUrl": "http://img/7"}"#,
        )
        .unwrap();
        assert_eq!(detail.post.author_id, Some(7));
        assert_eq!(detail.member_id, None);

        let detail = detail.normalized();
        assert_eq!(detail.member_id, Some(7));
        assert_eq!(detail.post.member_name.as_deref(), Some("User 7"));
    }

    #[test]
    fn envelope_round_trips_paged_posts() {
        let body = r#"{"status": 200, "result": "SUCCESS", "data": {"content": [{"id": 1, "content": "a"}], "page": 0, "size": 20}}"#;
        let envelope: ApiEnvelope<Page<Post>> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.content.len(), 1);
        assert_eq!(envelope.data.size, 20);
    }
}
