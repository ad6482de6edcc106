//! 互动领域服务 - 点赞/评论与反范式化计数
//!
//! 计数自增/自减与子集合写入捆绑为同一原子单元提交，
//! likesCount / commentsCount 不允许偏离子集合的真实基数。

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::error::{JoydropError, JoydropResult};
use crate::domain::model::{
    Comment, EngagementDomainConfig, EnrichedComment, EnrichedLike, Like, NewPost, Post,
    MAX_COMMENT_LEN,
};
use crate::domain::repository::{LikeInsert, PostRepository};
use crate::domain::service::enrichment::UserEnricher;

/// 互动领域服务
pub struct EngagementDomainService {
    post_repo: Arc<dyn PostRepository>,
    enricher: Arc<UserEnricher>,
    config: EngagementDomainConfig,
}

impl EngagementDomainService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        enricher: Arc<UserEnricher>,
        config: EngagementDomainConfig,
    ) -> Self {
        Self {
            post_repo,
            enricher,
            config,
        }
    }

    /// 直接创建帖子（不经会话工作流）
    pub async fn create_post(&self, post: NewPost) -> JoydropResult<Post> {
        post.validate().map_err(JoydropError::BadRequest)?;

        let created = self.post_repo.create_post(&post).await?;

        // 私密 joydrop 在接收者资料下登记引用，失败不影响帖子创建
        if let Some(receiver_id) = &post.receiver_id {
            if let Err(err) = self
                .post_repo
                .save_profile_ref(receiver_id, &created.id)
                .await
            {
                warn!(
                    post_id = %created.id,
                    receiver_id = %receiver_id,
                    error = %err,
                    "Failed to save received-joydrop reference"
                );
            }
        }

        info!(post_id = %created.id, public = created.is_public, "Post created");
        Ok(created)
    }

    /// 点赞：同一用户重复点赞返回 Conflict，而非幂等成功
    pub async fn like(&self, post_id: &str, user_id: &str) -> JoydropResult<Like> {
        if self.post_repo.find_like(post_id, user_id).await?.is_some() {
            return Err(JoydropError::Conflict(
                "Post already liked by this user".to_string(),
            ));
        }

        match self.post_repo.insert_like(post_id, user_id).await? {
            LikeInsert::Created(like) => {
                info!(post_id = %post_id, user_id = %user_id, "Post liked");
                Ok(like)
            }
            // 并发点赞穿过了上面的预查，由存储的唯一索引兜住
            LikeInsert::AlreadyLiked => Err(JoydropError::Conflict(
                "Post already liked by this user".to_string(),
            )),
            LikeInsert::PostMissing => {
                Err(JoydropError::NotFound("Post not found".to_string()))
            }
        }
    }

    /// 取消点赞：记录不存在返回 NotFound，计数不变
    pub async fn unlike(&self, post_id: &str, user_id: &str) -> JoydropResult<()> {
        let like = self
            .post_repo
            .find_like(post_id, user_id)
            .await?
            .ok_or_else(|| JoydropError::NotFound("Like not found".to_string()))?;

        if !self.post_repo.remove_like(post_id, &like.id).await? {
            return Err(JoydropError::NotFound("Like not found".to_string()));
        }

        info!(post_id = %post_id, user_id = %user_id, "Post unliked");
        Ok(())
    }

    /// 评论：同一用户可多次评论，无查重
    pub async fn comment(
        &self,
        post_id: &str,
        user_id: &str,
        text: &str,
    ) -> JoydropResult<Comment> {
        if text.is_empty() {
            return Err(JoydropError::BadRequest(
                "comment must not be empty".to_string(),
            ));
        }
        if text.chars().count() > MAX_COMMENT_LEN {
            return Err(JoydropError::BadRequest(format!(
                "comment exceeds {} characters",
                MAX_COMMENT_LEN
            )));
        }

        let comment = self
            .post_repo
            .insert_comment(post_id, user_id, text)
            .await?
            .ok_or_else(|| JoydropError::NotFound("Post not found".to_string()))?;

        info!(post_id = %post_id, user_id = %user_id, "Comment added");
        Ok(comment)
    }

    /// 评论列表，按时间倒序，附带尽力而为的用户资料补全
    pub async fn list_comments(
        &self,
        post_id: &str,
        limit: Option<i64>,
    ) -> JoydropResult<(Vec<EnrichedComment>, bool)> {
        let limit = self.clamp_limit(limit);
        let comments = self.post_repo.list_comments(post_id, limit).await?;
        debug!(post_id = %post_id, count = comments.len(), "Listing comments");

        let users = self
            .enricher
            .lookup(comments.iter().map(|c| c.user_id.clone()))
            .await;

        let has_more = comments.len() as i64 == limit;
        let enriched = comments
            .into_iter()
            .map(|comment| {
                let user = users.get(&comment.user_id).cloned();
                EnrichedComment { comment, user }
            })
            .collect();
        Ok((enriched, has_more))
    }

    /// 点赞列表，按时间倒序，附带尽力而为的用户资料补全
    pub async fn list_likes(
        &self,
        post_id: &str,
        limit: Option<i64>,
    ) -> JoydropResult<(Vec<EnrichedLike>, bool)> {
        let limit = self.clamp_limit(limit);
        let likes = self.post_repo.list_likes(post_id, limit).await?;
        debug!(post_id = %post_id, count = likes.len(), "Listing likes");

        let users = self
            .enricher
            .lookup(likes.iter().map(|l| l.user_id.clone()))
            .await;

        let has_more = likes.len() as i64 == limit;
        let enriched = likes
            .into_iter()
            .map(|like| {
                let user = users.get(&like.user_id).cloned();
                EnrichedLike { like, user }
            })
            .collect();
        Ok((enriched, has_more))
    }

    /// 删除帖子：仅所有者可删，级联清空点赞/评论子集合
    pub async fn delete_post(&self, post_id: &str, user_id: &str) -> JoydropResult<()> {
        let post = self
            .post_repo
            .get_post(post_id)
            .await?
            .ok_or_else(|| JoydropError::NotFound("Post not found".to_string()))?;

        if post.sender_id != user_id {
            return Err(JoydropError::Forbidden(
                "Unauthorized to delete this post".to_string(),
            ));
        }

        self.post_repo.delete_post_cascade(post_id).await?;
        info!(post_id = %post_id, "Post deleted with subcollections");
        Ok(())
    }

    fn clamp_limit(&self, limit: Option<i64>) -> i64 {
        limit
            .unwrap_or(self.config.default_page_limit)
            .clamp(1, self.config.max_page_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::UserProfile;
    use crate::infrastructure::persistence::memory_store::MemoryJoydropStore;

    fn new_post(sender: &str, receiver: Option<&str>) -> NewPost {
        NewPost {
            sender_id: sender.to_string(),
            receiver_id: receiver.map(str::to_string),
            content: "You're doing amazing work!".to_string(),
            media_urls: vec![],
            tags: vec![],
        }
    }

    fn service(store: Arc<MemoryJoydropStore>) -> EngagementDomainService {
        let enricher = Arc::new(UserEnricher::new(store.clone()));
        EngagementDomainService::new(store, enricher, EngagementDomainConfig::default())
    }

    #[tokio::test]
    async fn like_unlike_keeps_counter_in_sync() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;

        svc.like(&post.id, "u2").await?;
        svc.like(&post.id, "u3").await?;
        assert_eq!(store.get_post(&post.id).await?.unwrap().likes_count, 2);

        svc.unlike(&post.id, "u2").await?;
        let reloaded = store.get_post(&post.id).await?.unwrap();
        assert_eq!(reloaded.likes_count, 1);
        assert_eq!(store.list_likes(&post.id, 100).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_like_is_conflict_and_counts_once() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;

        svc.like(&post.id, "u2").await?;
        let err = svc.like(&post.id, "u2").await.unwrap_err();
        assert!(matches!(err, JoydropError::Conflict(_)));
        assert_eq!(store.get_post(&post.id).await?.unwrap().likes_count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn unlike_without_like_is_not_found() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;

        let err = svc.unlike(&post.id, "u2").await.unwrap_err();
        assert!(matches!(err, JoydropError::NotFound(_)));
        assert_eq!(store.get_post(&post.id).await?.unwrap().likes_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn like_missing_post_is_not_found() {
        let svc = service(Arc::new(MemoryJoydropStore::new()));
        let err = svc.like("missing", "u2").await.unwrap_err();
        assert!(matches!(err, JoydropError::NotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_likes_from_distinct_users_all_count() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = Arc::new(service(store.clone()));
        let post = svc.create_post(new_post("u1", None)).await?;

        let mut handles = Vec::new();
        for i in 0..20 {
            let svc = svc.clone();
            let post_id = post.id.clone();
            handles.push(tokio::spawn(async move {
                svc.like(&post_id, &format!("user-{i}")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap()?;
        }

        let reloaded = store.get_post(&post.id).await?.unwrap();
        assert_eq!(reloaded.likes_count, 20);
        assert_eq!(store.list_likes(&post.id, 100).await?.len(), 20);
        Ok(())
    }

    #[tokio::test]
    async fn comments_allow_duplicates_and_increment_counter() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;

        svc.comment(&post.id, "u2", "So inspiring!").await?;
        svc.comment(&post.id, "u2", "Reading it again!").await?;

        let reloaded = store.get_post(&post.id).await?.unwrap();
        assert_eq!(reloaded.comments_count, 2);

        let (comments, has_more) = svc.list_comments(&post.id, None).await?;
        assert_eq!(comments.len(), 2);
        assert!(!has_more);
        // 倒序：最新的在前
        assert_eq!(comments[0].comment.comment, "Reading it again!");
        Ok(())
    }

    #[tokio::test]
    async fn comment_validation_rejects_empty_and_oversized() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;

        let err = svc.comment(&post.id, "u2", "").await.unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        let oversized = "x".repeat(MAX_COMMENT_LEN + 1);
        let err = svc.comment(&post.id, "u2", &oversized).await.unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        assert_eq!(store.get_post(&post.id).await?.unwrap().comments_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn listing_enriches_known_users_and_nulls_unknown() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        store
            .insert_user(UserProfile {
                uid: "u2".into(),
                display_name: Some("Jamie".into()),
                username: Some("jamie".into()),
                email: None,
                photo_url: None,
            })
            .await;
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;

        svc.like(&post.id, "u2").await?;
        svc.like(&post.id, "ghost").await?;

        let (likes, _) = svc.list_likes(&post.id, None).await?;
        let by_user: Vec<_> = likes
            .iter()
            .map(|l| (l.like.user_id.as_str(), l.user.is_some()))
            .collect();
        assert!(by_user.contains(&("u2", true)));
        assert!(by_user.contains(&("ghost", false)));
        Ok(())
    }

    #[tokio::test]
    async fn list_limit_is_clamped_and_drives_has_more() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;

        for i in 0..5 {
            svc.like(&post.id, &format!("user-{i}")).await?;
        }

        let (likes, has_more) = svc.list_likes(&post.id, Some(5)).await?;
        assert_eq!(likes.len(), 5);
        assert!(has_more);

        let (likes, has_more) = svc.list_likes(&post.id, Some(500)).await?;
        assert_eq!(likes.len(), 5);
        assert!(!has_more);
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_forbidden_and_leaves_data() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;
        svc.like(&post.id, "u2").await?;
        svc.comment(&post.id, "u3", "nice").await?;

        let err = svc.delete_post(&post.id, "u2").await.unwrap_err();
        assert!(matches!(err, JoydropError::Forbidden(_)));

        assert!(store.get_post(&post.id).await?.is_some());
        assert_eq!(store.list_likes(&post.id, 100).await?.len(), 1);
        assert_eq!(store.list_comments(&post.id, 100).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_owner_cascades_subcollections() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let post = svc.create_post(new_post("u1", None)).await?;
        svc.like(&post.id, "u2").await?;
        svc.like(&post.id, "u3").await?;
        svc.comment(&post.id, "u4", "keep going").await?;

        svc.delete_post(&post.id, "u1").await?;

        assert!(store.get_post(&post.id).await?.is_none());
        assert!(store.list_likes(&post.id, 100).await?.is_empty());
        assert!(store.list_comments(&post.id, 100).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn delete_missing_post_is_not_found() {
        let svc = service(Arc::new(MemoryJoydropStore::new()));
        let err = svc.delete_post("missing", "u1").await.unwrap_err();
        assert!(matches!(err, JoydropError::NotFound(_)));
    }

    #[tokio::test]
    async fn private_post_records_profile_reference() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());

        let post = svc.create_post(new_post("u1", Some("u2"))).await?;
        assert_eq!(store.profile_refs("u2").await, vec![post.id.clone()]);
        Ok(())
    }

    #[tokio::test]
    async fn post_validation_rejects_excess_media_and_tags() -> anyhow::Result<()> {
        use crate::domain::model::{MAX_MEDIA_URLS, MAX_TAGS};

        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());

        let mut post = new_post("u1", None);
        post.media_urls = (0..=MAX_MEDIA_URLS)
            .map(|i| format!("https://cdn.example.com/{i}.png"))
            .collect();
        let err = svc.create_post(post).await.unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        let mut post = new_post("u1", None);
        post.tags = (0..=MAX_TAGS).map(|i| format!("tag-{i}")).collect();
        let err = svc.create_post(post).await.unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        assert!(store.list_posts(Some("u1"), 50, 0).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_likes_from_same_user_count_once() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = Arc::new(service(store.clone()));
        let post = svc.create_post(new_post("u1", None)).await?;

        // 同一用户并发点赞：预查可能同时放行，由存储层兜底查重
        let mut handles = Vec::new();
        for _ in 0..10 {
            let svc = svc.clone();
            let post_id = post.id.clone();
            handles.push(tokio::spawn(async move { svc.like(&post_id, "u2").await }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(JoydropError::Conflict(_)) => {}
                Err(err) => return Err(err.into()),
            }
        }
        assert_eq!(created, 1);

        let reloaded = store.get_post(&post.id).await?.unwrap();
        assert_eq!(reloaded.likes_count, 1);
        assert_eq!(store.list_likes(&post.id, 100).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_unlikes_and_likes_keep_counter_in_sync() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = Arc::new(service(store.clone()));
        let post = svc.create_post(new_post("u1", None)).await?;

        for i in 0..20 {
            svc.like(&post.id, &format!("user-{i}")).await?;
        }

        // 10 个并发取消点赞与 5 个新点赞交错执行
        let mut handles = Vec::new();
        for i in 0..10 {
            let svc = svc.clone();
            let post_id = post.id.clone();
            handles.push(tokio::spawn(async move {
                svc.unlike(&post_id, &format!("user-{i}")).await
            }));
        }
        for i in 0..5 {
            let svc = svc.clone();
            let post_id = post.id.clone();
            handles.push(tokio::spawn(async move {
                svc.like(&post_id, &format!("late-{i}")).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap()?;
        }

        let reloaded = store.get_post(&post.id).await?.unwrap();
        let surviving = store.list_likes(&post.id, 100).await?;
        assert_eq!(reloaded.likes_count, 15);
        assert_eq!(surviving.len() as i64, reloaded.likes_count);
        Ok(())
    }
}
