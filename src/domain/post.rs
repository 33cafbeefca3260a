use serde::Serialize;
use time::OffsetDateTime;

/// Feed projection: post plus author name, likes, comments, and the
/// viewer-relative annotations.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub title: String,
    pub content: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub likes_count: i64,
    pub likers: Vec<String>,
    pub comments: Vec<CommentView>,
    /// Whether the requesting user has liked this post.
    pub liked: bool,
    /// Whether the requesting user may delete this post (is the owner).
    pub can_delete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub username: String,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
