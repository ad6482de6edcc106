//! Wire 风格的依赖注入模块
//!
//! 按依赖顺序构建仓储、领域服务、处理器与路由。

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::application::handlers::{
    PostCommandHandler, PostQueryHandler, SessionCommandHandler, SessionQueryHandler,
};
use crate::config::JoydropConfig;
use crate::domain::repository::{
    IdentityVerifier, PostRepository, SessionRepository, UserProfileProvider,
};
use crate::domain::service::{
    EngagementDomainService, FeedDomainService, SessionDomainService, UserEnricher,
};
use crate::infrastructure::auth::JwtIdentityVerifier;
use crate::infrastructure::persistence::{MemoryJoydropStore, MongoJoydropStore};
use crate::interface::http::{router, AppState};

/// 在已选定的仓储与校验器之上装配路由（测试可直接注入内存实现）
pub fn assemble(
    session_repo: Arc<dyn SessionRepository>,
    post_repo: Arc<dyn PostRepository>,
    users: Arc<dyn UserProfileProvider>,
    verifier: Arc<dyn IdentityVerifier>,
    config: &JoydropConfig,
) -> Router {
    let enricher = Arc::new(UserEnricher::new(users));

    let session_service = Arc::new(SessionDomainService::new(
        session_repo,
        config.session.clone(),
    ));
    let engagement_service = Arc::new(EngagementDomainService::new(
        post_repo.clone(),
        enricher.clone(),
        config.engagement.clone(),
    ));
    let feed_service = Arc::new(FeedDomainService::new(
        post_repo,
        enricher,
        config.feed.clone(),
    ));

    let state = Arc::new(AppState {
        session_commands: SessionCommandHandler::new(session_service.clone()),
        session_queries: SessionQueryHandler::new(session_service),
        post_commands: PostCommandHandler::new(engagement_service.clone()),
        post_queries: PostQueryHandler::new(feed_service, engagement_service),
        verifier,
    });

    router(state)
}

/// 构建应用路由
///
/// 配置了 Mongo URL 时使用文档存储，否则回退到进程内存储。
pub async fn initialize(config: &JoydropConfig) -> Result<Router> {
    let verifier: Arc<dyn IdentityVerifier> =
        Arc::new(JwtIdentityVerifier::new(&config.jwt_secret));

    let (session_repo, post_repo, users): (
        Arc<dyn SessionRepository>,
        Arc<dyn PostRepository>,
        Arc<dyn UserProfileProvider>,
    ) = match MongoJoydropStore::new(config)
        .await
        .context("Failed to initialize MongoDB store")?
    {
        Some(store) => {
            info!(database = %config.mongo_database, "Using MongoDB store");
            let store = Arc::new(store);
            (store.clone(), store.clone(), store)
        }
        None => {
            info!("Mongo URL not configured, using in-memory store");
            let store = Arc::new(MemoryJoydropStore::new());
            (store.clone(), store.clone(), store)
        }
    };

    Ok(assemble(session_repo, post_repo, users, verifier, config))
}
