//! HTTP 接口层

pub mod dto;
pub mod handler;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::application::handlers::{
    PostCommandHandler, PostQueryHandler, SessionCommandHandler, SessionQueryHandler,
};
use crate::domain::repository::IdentityVerifier;

/// 路由共享状态
pub struct AppState {
    pub session_commands: SessionCommandHandler,
    pub session_queries: SessionQueryHandler,
    pub post_commands: PostCommandHandler,
    pub post_queries: PostQueryHandler,
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// 构建完整路由表
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/joydrop/initiate", post(handler::initiate_joydrop))
        .route("/joydrop/submit", post(handler::submit_joydrop))
        .route("/joydrop/sessions", get(handler::list_sessions))
        .route(
            "/joydrop/sessions/{session_id}",
            get(handler::get_session).delete(handler::cancel_session),
        )
        .route(
            "/joydrop/sessions/{session_id}/status",
            put(handler::update_session_status),
        )
        .route("/posts", post(handler::create_post).get(handler::list_posts))
        .route(
            "/posts/{post_id}",
            get(handler::get_post).delete(handler::delete_post),
        )
        .route("/posts/{post_id}/like", post(handler::like_post))
        .route(
            "/posts/{post_id}/like/{user_id}",
            delete(handler::unlike_post),
        )
        .route("/posts/{post_id}/comment", post(handler::comment_post))
        .route("/posts/{post_id}/comments", get(handler::list_comments))
        .route("/posts/{post_id}/likes", get(handler::list_likes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
