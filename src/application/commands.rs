use crate::domain::model::SessionStatus;

/// 发起会话命令
#[derive(Debug, Clone)]
pub struct InitiateJoydropCommand {
    pub sender_id: String,
}

/// 提交会话命令
#[derive(Debug, Clone)]
pub struct SubmitJoydropCommand {
    pub sender_id: String,
    pub session_id: String,
    pub receiver_id: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub tags: Vec<String>,
}

/// 取消会话命令
#[derive(Debug, Clone)]
pub struct CancelSessionCommand {
    pub user_id: String,
    pub session_id: String,
}

/// 更新会话状态命令
#[derive(Debug, Clone)]
pub struct UpdateSessionStatusCommand {
    pub user_id: String,
    pub session_id: String,
    pub target: SessionStatus,
}

/// 直接创建帖子命令
#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub tags: Vec<String>,
}

/// 点赞命令
#[derive(Debug, Clone)]
pub struct LikePostCommand {
    pub post_id: String,
    pub user_id: String,
}

/// 取消点赞命令
#[derive(Debug, Clone)]
pub struct UnlikePostCommand {
    pub post_id: String,
    pub user_id: String,
}

/// 评论命令
#[derive(Debug, Clone)]
pub struct CommentPostCommand {
    pub post_id: String,
    pub user_id: String,
    pub comment: String,
}

/// 删除帖子命令
#[derive(Debug, Clone)]
pub struct DeletePostCommand {
    pub post_id: String,
    pub user_id: String,
}
