/// 查询单个会话
#[derive(Debug, Clone)]
pub struct GetSessionQuery {
    pub session_id: String,
}

/// 查询某用户的会话列表
#[derive(Debug, Clone)]
pub struct ListSessionsQuery {
    pub sender_id: String,
}

/// 查询帖子列表
#[derive(Debug, Clone)]
pub struct ListPostsQuery {
    pub sender_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<u64>,
}

/// 查询单个帖子
#[derive(Debug, Clone)]
pub struct GetPostQuery {
    pub post_id: String,
}

/// 查询帖子评论
#[derive(Debug, Clone)]
pub struct ListCommentsQuery {
    pub post_id: String,
    pub limit: Option<i64>,
}

/// 查询帖子点赞
#[derive(Debug, Clone)]
pub struct ListLikesQuery {
    pub post_id: String,
    pub limit: Option<i64>,
}
