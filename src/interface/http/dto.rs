//! HTTP 线格式
//!
//! 字段名与既有客户端约定一致：id 类字段用 `...ID`，其余 camelCase。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::{
    EnrichedComment, EnrichedLike, EnrichedPost, JoydropSession, UserProfile,
};

// ---- 请求 ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJoydropRequest {
    pub session_id: String,
    #[serde(rename = "receiverID", default)]
    pub receiver_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSessionStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[serde(rename = "receiverID", default)]
    pub receiver_id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub media_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct ListPostsParams {
    #[serde(rename = "userID", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct DeletePostParams {
    #[serde(rename = "userID", default)]
    pub user_id: Option<String>,
}

// ---- 响应 ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub session_id: String,
    pub post_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub session_id: String,
    pub sender_id: String,
    pub status: String,
    pub post_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JoydropSession> for SessionDto {
    fn from(session: JoydropSession) -> Self {
        Self {
            session_id: session.session_id,
            sender_id: session.sender_id,
            status: session.status.as_str().to_string(),
            post_id: session.post_id,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionDto>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    pub uid: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl From<UserProfile> for UserProfileDto {
    fn from(user: UserProfile) -> Self {
        Self {
            uid: user.uid,
            display_name: user.display_name,
            username: user.username,
            email: user.email,
            photo_url: user.photo_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: String,
    #[serde(rename = "senderID")]
    pub sender_id: String,
    #[serde(rename = "receiverID")]
    pub receiver_id: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub tags: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sender: Option<UserProfileDto>,
    pub receiver: Option<UserProfileDto>,
}

impl From<EnrichedPost> for PostDto {
    fn from(enriched: EnrichedPost) -> Self {
        let post = enriched.post;
        Self {
            id: post.id,
            sender_id: post.sender_id,
            receiver_id: post.receiver_id,
            content: post.content,
            media_urls: post.media_urls,
            tags: post.tags,
            likes_count: post.likes_count,
            comments_count: post.comments_count,
            is_public: post.is_public,
            created_at: post.created_at,
            updated_at: post.updated_at,
            sender: enriched.sender.map(Into::into),
            receiver: enriched.receiver.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListResponse {
    pub posts: Vec<PostDto>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeDto {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub liked_at: DateTime<Utc>,
    pub user: Option<UserProfileDto>,
}

impl From<EnrichedLike> for LikeDto {
    fn from(enriched: EnrichedLike) -> Self {
        Self {
            id: enriched.like.id,
            user_id: enriched.like.user_id,
            liked_at: enriched.like.liked_at,
            user: enriched.user.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeListResponse {
    pub likes: Vec<LikeDto>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub comment: String,
    pub commented_at: DateTime<Utc>,
    pub user: Option<UserProfileDto>,
}

impl From<EnrichedComment> for CommentDto {
    fn from(enriched: EnrichedComment) -> Self {
        Self {
            id: enriched.comment.id,
            user_id: enriched.comment.user_id,
            comment: enriched.comment.comment,
            commented_at: enriched.comment.commented_at,
            user: enriched.user.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListResponse {
    pub comments: Vec<CommentDto>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
