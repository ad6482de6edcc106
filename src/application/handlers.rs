use std::sync::Arc;

use tracing::debug;

use crate::application::commands::{
    CancelSessionCommand, CommentPostCommand, CreatePostCommand, DeletePostCommand,
    InitiateJoydropCommand, LikePostCommand, SubmitJoydropCommand, UnlikePostCommand,
    UpdateSessionStatusCommand,
};
use crate::application::queries::{
    GetPostQuery, GetSessionQuery, ListCommentsQuery, ListLikesQuery, ListPostsQuery,
    ListSessionsQuery,
};
use crate::domain::error::JoydropResult;
use crate::domain::model::{
    Comment, EnrichedComment, EnrichedLike, EnrichedPost, JoydropSession, Like, NewPost, Post,
    SubmitOutcome,
};
use crate::domain::service::engagement_domain_service::EngagementDomainService;
use crate::domain::service::feed_domain_service::FeedDomainService;
use crate::domain::service::session_domain_service::SessionDomainService;

/// 会话命令处理器
pub struct SessionCommandHandler {
    domain_service: Arc<SessionDomainService>,
}

impl SessionCommandHandler {
    pub fn new(domain_service: Arc<SessionDomainService>) -> Self {
        Self { domain_service }
    }

    /// 处理发起会话命令
    pub async fn handle_initiate(&self, command: InitiateJoydropCommand) -> JoydropResult<String> {
        debug!(sender_id = %command.sender_id, "Handling initiate joydrop command");
        self.domain_service.initiate(&command.sender_id).await
    }

    /// 处理提交会话命令
    pub async fn handle_submit(
        &self,
        command: SubmitJoydropCommand,
    ) -> JoydropResult<SubmitOutcome> {
        debug!(
            session_id = %command.session_id,
            sender_id = %command.sender_id,
            "Handling submit joydrop command"
        );
        self.domain_service
            .submit(
                &command.sender_id,
                &command.session_id,
                command.receiver_id,
                command.content,
                command.media_urls,
                command.tags,
            )
            .await
    }

    /// 处理取消会话命令
    pub async fn handle_cancel(&self, command: CancelSessionCommand) -> JoydropResult<()> {
        debug!(session_id = %command.session_id, "Handling cancel session command");
        self.domain_service
            .cancel(&command.user_id, &command.session_id)
            .await
    }

    /// 处理状态更新命令
    pub async fn handle_update_status(
        &self,
        command: UpdateSessionStatusCommand,
    ) -> JoydropResult<()> {
        debug!(
            session_id = %command.session_id,
            target = command.target.as_str(),
            "Handling update session status command"
        );
        self.domain_service
            .update_status(&command.user_id, &command.session_id, command.target)
            .await
    }
}

/// 会话查询处理器
pub struct SessionQueryHandler {
    domain_service: Arc<SessionDomainService>,
}

impl SessionQueryHandler {
    pub fn new(domain_service: Arc<SessionDomainService>) -> Self {
        Self { domain_service }
    }

    /// 处理单会话查询
    pub async fn handle_get_session(
        &self,
        query: GetSessionQuery,
    ) -> JoydropResult<Option<JoydropSession>> {
        self.domain_service.get_session(&query.session_id).await
    }

    /// 处理会话列表查询
    pub async fn handle_list_sessions(
        &self,
        query: ListSessionsQuery,
    ) -> JoydropResult<Vec<JoydropSession>> {
        self.domain_service.list_by_user(&query.sender_id).await
    }
}

/// 帖子命令处理器
pub struct PostCommandHandler {
    domain_service: Arc<EngagementDomainService>,
}

impl PostCommandHandler {
    pub fn new(domain_service: Arc<EngagementDomainService>) -> Self {
        Self { domain_service }
    }

    /// 处理创建帖子命令
    pub async fn handle_create_post(&self, command: CreatePostCommand) -> JoydropResult<Post> {
        debug!(sender_id = %command.sender_id, "Handling create post command");
        self.domain_service
            .create_post(NewPost {
                sender_id: command.sender_id,
                receiver_id: command.receiver_id,
                content: command.content,
                media_urls: command.media_urls,
                tags: command.tags,
            })
            .await
    }

    /// 处理点赞命令
    pub async fn handle_like(&self, command: LikePostCommand) -> JoydropResult<Like> {
        debug!(post_id = %command.post_id, "Handling like command");
        self.domain_service
            .like(&command.post_id, &command.user_id)
            .await
    }

    /// 处理取消点赞命令
    pub async fn handle_unlike(&self, command: UnlikePostCommand) -> JoydropResult<()> {
        debug!(post_id = %command.post_id, "Handling unlike command");
        self.domain_service
            .unlike(&command.post_id, &command.user_id)
            .await
    }

    /// 处理评论命令
    pub async fn handle_comment(&self, command: CommentPostCommand) -> JoydropResult<Comment> {
        debug!(post_id = %command.post_id, "Handling comment command");
        self.domain_service
            .comment(&command.post_id, &command.user_id, &command.comment)
            .await
    }

    /// 处理删除帖子命令
    pub async fn handle_delete_post(&self, command: DeletePostCommand) -> JoydropResult<()> {
        debug!(post_id = %command.post_id, "Handling delete post command");
        self.domain_service
            .delete_post(&command.post_id, &command.user_id)
            .await
    }
}

/// 帖子查询处理器
pub struct PostQueryHandler {
    feed_service: Arc<FeedDomainService>,
    engagement_service: Arc<EngagementDomainService>,
}

impl PostQueryHandler {
    pub fn new(
        feed_service: Arc<FeedDomainService>,
        engagement_service: Arc<EngagementDomainService>,
    ) -> Self {
        Self {
            feed_service,
            engagement_service,
        }
    }

    /// 处理帖子列表查询
    pub async fn handle_list_posts(
        &self,
        query: ListPostsQuery,
    ) -> JoydropResult<(Vec<EnrichedPost>, bool)> {
        self.feed_service
            .list_posts(query.sender_id.as_deref(), query.limit, query.offset)
            .await
    }

    /// 处理单帖查询
    pub async fn handle_get_post(&self, query: GetPostQuery) -> JoydropResult<EnrichedPost> {
        self.feed_service.get_post(&query.post_id).await
    }

    /// 处理评论列表查询
    pub async fn handle_list_comments(
        &self,
        query: ListCommentsQuery,
    ) -> JoydropResult<(Vec<EnrichedComment>, bool)> {
        self.engagement_service
            .list_comments(&query.post_id, query.limit)
            .await
    }

    /// 处理点赞列表查询
    pub async fn handle_list_likes(
        &self,
        query: ListLikesQuery,
    ) -> JoydropResult<(Vec<EnrichedLike>, bool)> {
        self.engagement_service
            .list_likes(&query.post_id, query.limit)
            .await
    }
}
