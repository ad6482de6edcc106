use chrono::{DateTime, Utc};

/// 帖子内容长度上限
pub const MAX_CONTENT_LEN: usize = 500;
/// 单帖媒体链接数量上限
pub const MAX_MEDIA_URLS: usize = 5;
/// 单帖标签数量上限
pub const MAX_TAGS: usize = 10;
/// 评论长度上限
pub const MAX_COMMENT_LEN: usize = 300;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in-progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in-progress" => Some(SessionStatus::InProgress),
            "completed" => Some(SessionStatus::Completed),
            "cancelled" => Some(SessionStatus::Cancelled),
            _ => None,
        }
    }

    /// 终态不可再迁移
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

#[derive(Clone, Debug)]
pub struct JoydropSession {
    pub session_id: String,
    pub sender_id: String,
    pub status: SessionStatus,
    /// 仅在会话完成时设置，且只设置一次
    pub post_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待创建帖子（计数器由存储侧置零）
#[derive(Clone, Debug)]
pub struct NewPost {
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub tags: Vec<String>,
}

impl NewPost {
    /// 无接收者即公开帖
    pub fn is_public(&self) -> bool {
        self.receiver_id.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.content.is_empty() {
            return Err("content must not be empty".to_string());
        }
        if self.content.chars().count() > MAX_CONTENT_LEN {
            return Err(format!("content exceeds {} characters", MAX_CONTENT_LEN));
        }
        if self.media_urls.len() > MAX_MEDIA_URLS {
            return Err(format!("at most {} media urls allowed", MAX_MEDIA_URLS));
        }
        if self.tags.len() > MAX_TAGS {
            return Err(format!("at most {} tags allowed", MAX_TAGS));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Post {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub tags: Vec<String>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub liked_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub comment: String,
    pub commented_at: DateTime<Utc>,
}

/// 用户公开资料（仅用于读侧补全，本服务不写入）
#[derive(Clone, Debug)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EnrichedPost {
    pub post: Post,
    pub sender: Option<UserProfile>,
    pub receiver: Option<UserProfile>,
}

#[derive(Clone, Debug)]
pub struct EnrichedLike {
    pub like: Like,
    pub user: Option<UserProfile>,
}

#[derive(Clone, Debug)]
pub struct EnrichedComment {
    pub comment: Comment,
    pub user: Option<UserProfile>,
}

/// 提交会话的结果
#[derive(Clone, Debug)]
pub struct SubmitOutcome {
    pub session_id: String,
    pub post_id: String,
    pub status: SessionStatus,
}

/// 会话领域配置值对象
#[derive(Clone, Debug)]
pub struct SessionDomainConfig {
    /// 单用户会话列表上限
    pub list_limit: i64,
}

impl Default for SessionDomainConfig {
    fn default() -> Self {
        Self { list_limit: 50 }
    }
}

/// 互动领域配置值对象
#[derive(Clone, Debug)]
pub struct EngagementDomainConfig {
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

impl Default for EngagementDomainConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 20,
            max_page_limit: 100,
        }
    }
}

/// Feed 领域配置值对象
#[derive(Clone, Debug)]
pub struct FeedDomainConfig {
    pub default_page_limit: i64,
    pub max_page_limit: i64,
}

impl Default for FeedDomainConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 10,
            max_page_limit: 50,
        }
    }
}
