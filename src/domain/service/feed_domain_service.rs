//! Feed 领域服务 - 帖子列表与用户资料补全
//!
//! hasMore 以「页长等于请求 limit」近似，页边界处可能误判，
//! 属于已知限制而非缺陷。

use std::sync::Arc;

use tracing::debug;

use crate::domain::error::{JoydropError, JoydropResult};
use crate::domain::model::{EnrichedPost, FeedDomainConfig, Post};
use crate::domain::repository::PostRepository;
use crate::domain::service::enrichment::UserEnricher;

/// Feed 领域服务
pub struct FeedDomainService {
    post_repo: Arc<dyn PostRepository>,
    enricher: Arc<UserEnricher>,
    config: FeedDomainConfig,
}

impl FeedDomainService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        enricher: Arc<UserEnricher>,
        config: FeedDomainConfig,
    ) -> Self {
        Self {
            post_repo,
            enricher,
            config,
        }
    }

    /// 帖子列表：指定用户时返回其全部帖子，否则只返回公开帖
    pub async fn list_posts(
        &self,
        sender_id: Option<&str>,
        limit: Option<i64>,
        offset: Option<u64>,
    ) -> JoydropResult<(Vec<EnrichedPost>, bool)> {
        let limit = limit
            .unwrap_or(self.config.default_page_limit)
            .clamp(1, self.config.max_page_limit);
        let posts = self
            .post_repo
            .list_posts(sender_id, limit, offset.unwrap_or(0))
            .await?;
        debug!(
            filter = sender_id.unwrap_or("<public>"),
            count = posts.len(),
            "Listing posts"
        );

        let has_more = posts.len() as i64 == limit;
        Ok((self.enrich(posts).await, has_more))
    }

    /// 单帖查询，带补全
    pub async fn get_post(&self, post_id: &str) -> JoydropResult<EnrichedPost> {
        let post = self
            .post_repo
            .get_post(post_id)
            .await?
            .ok_or_else(|| JoydropError::NotFound("Post not found".to_string()))?;

        let mut enriched = self.enrich(vec![post]).await;
        Ok(enriched.remove(0))
    }

    /// 收集整页的去重 sender/receiver id，批量解析后挂载到各帖
    async fn enrich(&self, posts: Vec<Post>) -> Vec<EnrichedPost> {
        let ids = posts.iter().flat_map(|post| {
            std::iter::once(post.sender_id.clone()).chain(post.receiver_id.clone())
        });
        let users = self.enricher.lookup(ids).await;

        posts
            .into_iter()
            .map(|post| {
                let sender = users.get(&post.sender_id).cloned();
                let receiver = post
                    .receiver_id
                    .as_ref()
                    .and_then(|id| users.get(id).cloned());
                EnrichedPost {
                    post,
                    sender,
                    receiver,
                }
            })
            .collect()
    }
}
