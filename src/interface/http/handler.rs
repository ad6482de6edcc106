//! HTTP 处理器
//!
//! 鉴权由 `AuthUser` 提取器完成；领域错误在 `JoydropError` 的
//! `IntoResponse` 实现里统一映射为状态码。

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::application::commands::{
    CancelSessionCommand, CommentPostCommand, CreatePostCommand, DeletePostCommand,
    InitiateJoydropCommand, LikePostCommand, SubmitJoydropCommand, UnlikePostCommand,
    UpdateSessionStatusCommand,
};
use crate::application::queries::{
    GetPostQuery, GetSessionQuery, ListCommentsQuery, ListLikesQuery, ListPostsQuery,
    ListSessionsQuery,
};
use crate::domain::error::{JoydropError, JoydropResult};
use crate::domain::model::SessionStatus;
use crate::interface::http::dto::{
    CommentDto, CommentListResponse, CommentRequest, CreatePostRequest, DeletePostParams,
    ErrorResponse, InitiateResponse, LikeDto, LikeListResponse, LikeRequest, ListPostsParams,
    MessageResponse, PageParams, PostDto, PostListResponse, SessionDto, SessionListResponse,
    SubmitJoydropRequest, SubmitResponse, UpdateSessionStatusRequest,
};
use crate::interface::http::AppState;

/// 已验证的调用方身份
pub struct AuthUser(pub String);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = JoydropError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                JoydropError::Unauthorized("Missing authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            JoydropError::Unauthorized("Invalid authorization header".to_string())
        })?;

        let user_id = state.verifier.verify_token(token).await?;
        Ok(AuthUser(user_id))
    }
}

impl IntoResponse for JoydropError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            JoydropError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            JoydropError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            JoydropError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            JoydropError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            JoydropError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            JoydropError::Internal(err) => {
                error!(error = ?err, "Internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// ---- 会话 ----

pub async fn initiate_joydrop(
    State(state): State<Arc<AppState>>,
    AuthUser(sender_id): AuthUser,
) -> JoydropResult<(StatusCode, Json<InitiateResponse>)> {
    let session_id = state
        .session_commands
        .handle_initiate(InitiateJoydropCommand { sender_id })
        .await?;
    Ok((StatusCode::CREATED, Json(InitiateResponse { session_id })))
}

pub async fn submit_joydrop(
    State(state): State<Arc<AppState>>,
    AuthUser(sender_id): AuthUser,
    Json(request): Json<SubmitJoydropRequest>,
) -> JoydropResult<(StatusCode, Json<SubmitResponse>)> {
    let outcome = state
        .session_commands
        .handle_submit(SubmitJoydropCommand {
            sender_id,
            session_id: request.session_id,
            receiver_id: request.receiver_id,
            content: request.content,
            media_urls: request.media_urls,
            tags: request.tags,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            session_id: outcome.session_id,
            post_id: outcome.post_id,
            status: outcome.status.as_str().to_string(),
        }),
    ))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(session_id): Path<String>,
) -> JoydropResult<Json<SessionDto>> {
    let session = state
        .session_queries
        .handle_get_session(GetSessionQuery { session_id })
        .await?
        .ok_or_else(|| JoydropError::NotFound("Joydrop session not found".to_string()))?;
    Ok(Json(session.into()))
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    AuthUser(sender_id): AuthUser,
) -> JoydropResult<Json<SessionListResponse>> {
    let sessions = state
        .session_queries
        .handle_list_sessions(ListSessionsQuery { sender_id })
        .await?;
    let sessions: Vec<SessionDto> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(SessionListResponse {
        total: sessions.len(),
        sessions,
    }))
}

pub async fn update_session_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
    Json(request): Json<UpdateSessionStatusRequest>,
) -> JoydropResult<Json<MessageResponse>> {
    let target = SessionStatus::parse(&request.status).ok_or_else(|| {
        JoydropError::BadRequest(format!("Invalid session status: {}", request.status))
    })?;

    state
        .session_commands
        .handle_update_status(UpdateSessionStatusCommand {
            user_id,
            session_id,
            target,
        })
        .await?;
    Ok(Json(MessageResponse {
        message: "Session status updated".to_string(),
    }))
}

pub async fn cancel_session(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(session_id): Path<String>,
) -> JoydropResult<StatusCode> {
    state
        .session_commands
        .handle_cancel(CancelSessionCommand {
            user_id,
            session_id,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- 帖子 ----

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(sender_id): AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> JoydropResult<(StatusCode, Json<PostDto>)> {
    let post = state
        .post_commands
        .handle_create_post(CreatePostCommand {
            sender_id,
            receiver_id: request.receiver_id,
            content: request.content,
            media_urls: request.media_urls,
            tags: request.tags,
        })
        .await?;

    let enriched = state
        .post_queries
        .handle_get_post(GetPostQuery { post_id: post.id })
        .await?;
    Ok((StatusCode::CREATED, Json(enriched.into())))
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Query(params): Query<ListPostsParams>,
) -> JoydropResult<Json<PostListResponse>> {
    let (posts, has_more) = state
        .post_queries
        .handle_list_posts(ListPostsQuery {
            sender_id: params.user_id,
            limit: params.limit,
            offset: params.offset,
        })
        .await?;
    let posts: Vec<PostDto> = posts.into_iter().map(Into::into).collect();
    Ok(Json(PostListResponse {
        total: posts.len(),
        posts,
        has_more,
    }))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(post_id): Path<String>,
) -> JoydropResult<Json<PostDto>> {
    let post = state
        .post_queries
        .handle_get_post(GetPostQuery { post_id })
        .await?;
    Ok(Json(post.into()))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(caller_id): AuthUser,
    Path(post_id): Path<String>,
    Query(params): Query<DeletePostParams>,
) -> JoydropResult<Json<MessageResponse>> {
    let user_id = params.user_id.unwrap_or(caller_id);
    state
        .post_commands
        .handle_delete_post(DeletePostCommand { post_id, user_id })
        .await?;
    Ok(Json(MessageResponse {
        message: "Post deleted successfully".to_string(),
    }))
}

// ---- 互动 ----

pub async fn like_post(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(post_id): Path<String>,
    Json(request): Json<LikeRequest>,
) -> JoydropResult<Json<MessageResponse>> {
    state
        .post_commands
        .handle_like(LikePostCommand {
            post_id,
            user_id: request.user_id,
        })
        .await?;
    Ok(Json(MessageResponse {
        message: "Post liked successfully".to_string(),
    }))
}

pub async fn unlike_post(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path((post_id, user_id)): Path<(String, String)>,
) -> JoydropResult<Json<MessageResponse>> {
    state
        .post_commands
        .handle_unlike(UnlikePostCommand { post_id, user_id })
        .await?;
    Ok(Json(MessageResponse {
        message: "Like removed successfully".to_string(),
    }))
}

pub async fn comment_post(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(post_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> JoydropResult<(StatusCode, Json<CommentDto>)> {
    let comment = state
        .post_commands
        .handle_comment(CommentPostCommand {
            post_id,
            user_id: request.user_id,
            comment: request.comment,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentDto {
            id: comment.id,
            user_id: comment.user_id,
            comment: comment.comment,
            commented_at: comment.commented_at,
            user: None,
        }),
    ))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(post_id): Path<String>,
    Query(params): Query<PageParams>,
) -> JoydropResult<Json<CommentListResponse>> {
    let (comments, has_more) = state
        .post_queries
        .handle_list_comments(ListCommentsQuery {
            post_id,
            limit: params.limit,
        })
        .await?;
    let comments: Vec<CommentDto> = comments.into_iter().map(Into::into).collect();
    Ok(Json(CommentListResponse {
        total: comments.len(),
        comments,
        has_more,
    }))
}

pub async fn list_likes(
    State(state): State<Arc<AppState>>,
    AuthUser(_): AuthUser,
    Path(post_id): Path<String>,
    Query(params): Query<PageParams>,
) -> JoydropResult<Json<LikeListResponse>> {
    let (likes, has_more) = state
        .post_queries
        .handle_list_likes(ListLikesQuery {
            post_id,
            limit: params.limit,
        })
        .await?;
    let likes: Vec<LikeDto> = likes.into_iter().map(Into::into).collect();
    Ok(Json(LikeListResponse {
        total: likes.len(),
        likes,
        has_more,
    }))
}
