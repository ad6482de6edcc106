use anyhow::Result;
use async_trait::async_trait;

use crate::domain::error::JoydropResult;
use crate::domain::model::{Comment, JoydropSession, Like, NewPost, Post, UserProfile};

/// 会话完成的提交结果
///
/// 帖子创建与会话状态翻转必须在同一个存储事务中提交；
/// 状态翻转带 `in-progress` 条件过滤，重复提交的败者拿到 `NotInProgress`。
#[derive(Clone, Debug)]
pub enum SessionCompletion {
    Completed { post_id: String },
    NotInProgress,
}

/// 点赞写入结果
///
/// 点赞记录插入与计数自增为一个原子单元；
/// (postId, userID) 唯一索引在并发写下兜底查重。
#[derive(Clone, Debug)]
pub enum LikeInsert {
    Created(Like),
    AlreadyLiked,
    PostMissing,
}

/// 会话仓储接口（作为 trait 对象使用，保留 async-trait）
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create_session(&self, session: &JoydropSession) -> Result<()>;
    async fn get_session(&self, session_id: &str) -> Result<Option<JoydropSession>>;
    /// 按创建时间倒序返回某用户的会话
    async fn list_by_sender(&self, sender_id: &str, limit: i64) -> Result<Vec<JoydropSession>>;
    /// 原子提交：插入帖子 + 会话置为 completed 并关联 postId
    async fn complete_with_post(
        &self,
        session_id: &str,
        post: &NewPost,
    ) -> Result<SessionCompletion>;
    /// 会话置为 cancelled；返回 false 表示会话已不在 in-progress
    async fn mark_cancelled(&self, session_id: &str) -> Result<bool>;
}

/// 帖子仓储接口（作为 trait 对象使用，保留 async-trait）
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: &NewPost) -> Result<Post>;
    async fn get_post(&self, post_id: &str) -> Result<Option<Post>>;
    /// sender 为空时仅返回公开帖；按创建时间倒序
    async fn list_posts(
        &self,
        sender_id: Option<&str>,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Post>>;

    async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>>;
    /// 原子单元：插入点赞记录 + likesCount 自增
    async fn insert_like(&self, post_id: &str, user_id: &str) -> Result<LikeInsert>;
    /// 原子单元：删除点赞记录 + likesCount 自减；返回 false 表示记录已不存在
    async fn remove_like(&self, post_id: &str, like_id: &str) -> Result<bool>;
    /// 原子单元：插入评论 + commentsCount 自增；None 表示帖子不存在
    async fn insert_comment(
        &self,
        post_id: &str,
        user_id: &str,
        comment: &str,
    ) -> Result<Option<Comment>>;

    async fn list_likes(&self, post_id: &str, limit: i64) -> Result<Vec<Like>>;
    async fn list_comments(&self, post_id: &str, limit: i64) -> Result<Vec<Comment>>;

    /// 级联删除帖子及其点赞/评论子集合；分块提交，失败时错误需指明阶段
    async fn delete_post_cascade(&self, post_id: &str) -> Result<()>;

    /// 私密 joydrop 在接收者资料下登记引用（尽力而为，调用方自行吞错）
    async fn save_profile_ref(&self, user_id: &str, post_id: &str) -> Result<()>;
}

/// 用户公开资料读取接口
#[async_trait]
pub trait UserProfileProvider: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>>;
}

/// 身份校验接口：凭 bearer 凭证换取已验证的调用者 uid
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> JoydropResult<String>;
}
