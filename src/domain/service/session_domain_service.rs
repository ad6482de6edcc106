//! Joydrop 会话领域服务 - 会话生命周期状态机
//!
//! 状态机：in-progress（初始）-> completed | cancelled（终态）。
//! 终态不可再迁移；postId 当且仅当会话完成时设置。

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::error::{JoydropError, JoydropResult};
use crate::domain::model::{
    JoydropSession, NewPost, SessionDomainConfig, SessionStatus, SubmitOutcome,
};
use crate::domain::repository::{SessionCompletion, SessionRepository};

/// 会话领域服务 - 包含所有生命周期业务逻辑
pub struct SessionDomainService {
    session_repo: Arc<dyn SessionRepository>,
    config: SessionDomainConfig,
}

impl SessionDomainService {
    pub fn new(session_repo: Arc<dyn SessionRepository>, config: SessionDomainConfig) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// 发起会话：生成新 id，状态置为 in-progress
    pub async fn initiate(&self, sender_id: &str) -> JoydropResult<String> {
        let session_id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now();
        let session = JoydropSession {
            session_id: session_id.clone(),
            sender_id: sender_id.to_string(),
            status: SessionStatus::InProgress,
            post_id: None,
            created_at: now,
            updated_at: now,
        };

        self.session_repo.create_session(&session).await?;
        info!(session_id = %session_id, sender_id = %sender_id, "Joydrop session initiated");
        Ok(session_id)
    }

    /// 查询会话（只读，无副作用）
    pub async fn get_session(&self, session_id: &str) -> JoydropResult<Option<JoydropSession>> {
        Ok(self.session_repo.get_session(session_id).await?)
    }

    /// 提交会话：校验归属与状态后，在同一事务内创建帖子并完成会话
    pub async fn submit(
        &self,
        sender_id: &str,
        session_id: &str,
        receiver_id: Option<String>,
        content: String,
        media_urls: Vec<String>,
        tags: Vec<String>,
    ) -> JoydropResult<SubmitOutcome> {
        let session = self
            .session_repo
            .get_session(session_id)
            .await?
            .ok_or_else(|| JoydropError::NotFound("Joydrop session not found".to_string()))?;

        if session.sender_id != sender_id {
            return Err(JoydropError::BadRequest(
                "You can only submit your own joydrop sessions".to_string(),
            ));
        }

        if session.status != SessionStatus::InProgress {
            return Err(JoydropError::BadRequest(format!(
                "Cannot submit session with status: {}",
                session.status.as_str()
            )));
        }

        let post = NewPost {
            sender_id: sender_id.to_string(),
            receiver_id,
            content,
            media_urls,
            tags,
        };
        post.validate().map_err(JoydropError::BadRequest)?;

        // 状态翻转在事务内带 in-progress 条件过滤，重复提交竞争的败者在此出局
        match self
            .session_repo
            .complete_with_post(session_id, &post)
            .await?
        {
            SessionCompletion::Completed { post_id } => {
                info!(
                    session_id = %session_id,
                    post_id = %post_id,
                    public = post.is_public(),
                    "Joydrop session submitted"
                );
                Ok(SubmitOutcome {
                    session_id: session_id.to_string(),
                    post_id,
                    status: SessionStatus::Completed,
                })
            }
            SessionCompletion::NotInProgress => Err(JoydropError::BadRequest(
                "Session is no longer in progress".to_string(),
            )),
        }
    }

    /// 取消会话：同样的归属与状态校验，不关联 postId
    pub async fn cancel(&self, user_id: &str, session_id: &str) -> JoydropResult<()> {
        let session = self
            .session_repo
            .get_session(session_id)
            .await?
            .ok_or_else(|| JoydropError::NotFound("Joydrop session not found".to_string()))?;

        if session.sender_id != user_id {
            return Err(JoydropError::BadRequest(
                "You can only cancel your own joydrop sessions".to_string(),
            ));
        }

        if session.status != SessionStatus::InProgress {
            return Err(JoydropError::BadRequest(format!(
                "Cannot cancel session with status: {}",
                session.status.as_str()
            )));
        }

        if !self.session_repo.mark_cancelled(session_id).await? {
            return Err(JoydropError::BadRequest(
                "Session is no longer in progress".to_string(),
            ));
        }

        info!(session_id = %session_id, "Joydrop session cancelled");
        Ok(())
    }

    /// 显式状态更新
    ///
    /// completed 只能通过 submit 达成（否则会出现无帖子的完成态会话），
    /// in-progress 不允许回迁。
    pub async fn update_status(
        &self,
        user_id: &str,
        session_id: &str,
        target: SessionStatus,
    ) -> JoydropResult<()> {
        match target {
            SessionStatus::InProgress => Err(JoydropError::BadRequest(
                "Sessions cannot return to in-progress".to_string(),
            )),
            SessionStatus::Completed => Err(JoydropError::BadRequest(
                "Sessions are completed by submitting them".to_string(),
            )),
            SessionStatus::Cancelled => self.cancel(user_id, session_id).await,
        }
    }

    /// 某用户的会话列表，按创建时间倒序
    pub async fn list_by_user(&self, sender_id: &str) -> JoydropResult<Vec<JoydropSession>> {
        debug!(sender_id = %sender_id, "Listing joydrop sessions");
        Ok(self
            .session_repo
            .list_by_sender(sender_id, self.config.list_limit)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::PostRepository;
    use crate::infrastructure::persistence::memory_store::MemoryJoydropStore;

    fn service(store: Arc<MemoryJoydropStore>) -> SessionDomainService {
        SessionDomainService::new(store, SessionDomainConfig::default())
    }

    #[tokio::test]
    async fn submit_completes_session_and_creates_post() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());

        let session_id = svc.initiate("u1").await?;
        let session = svc.get_session(&session_id).await?.unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        assert!(session.post_id.is_none());

        let outcome = svc
            .submit("u1", &session_id, None, "Great job!".into(), vec![], vec![])
            .await?;
        assert_eq!(outcome.session_id, session_id);
        assert_eq!(outcome.status, SessionStatus::Completed);

        let session = svc.get_session(&session_id).await?.unwrap();
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.post_id.as_deref(), Some(outcome.post_id.as_str()));

        let post = store.get_post(&outcome.post_id).await?.unwrap();
        assert_eq!(post.sender_id, "u1");
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.comments_count, 0);
        assert!(post.is_public);
        Ok(())
    }

    #[tokio::test]
    async fn submit_with_receiver_creates_private_post() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());

        let session_id = svc.initiate("u1").await?;
        let outcome = svc
            .submit(
                "u1",
                &session_id,
                Some("u2".into()),
                "You rock".into(),
                vec![],
                vec!["teamwork".into()],
            )
            .await?;

        let post = store.get_post(&outcome.post_id).await?.unwrap();
        assert!(!post.is_public);
        assert_eq!(post.receiver_id.as_deref(), Some("u2"));
        Ok(())
    }

    #[tokio::test]
    async fn double_submit_fails_and_creates_single_post() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());

        let session_id = svc.initiate("u1").await?;
        svc.submit("u1", &session_id, None, "first".into(), vec![], vec![])
            .await?;

        let err = svc
            .submit("u1", &session_id, None, "second".into(), vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        let posts = store.list_posts(Some("u1"), 50, 0).await?;
        assert_eq!(posts.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn submit_unknown_session_is_not_found() {
        let svc = service(Arc::new(MemoryJoydropStore::new()));
        let err = svc
            .submit("u1", "missing", None, "hi".into(), vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, JoydropError::NotFound(_)));
    }

    #[tokio::test]
    async fn ownership_is_enforced_on_submit_and_cancel() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let session_id = svc.initiate("u1").await?;

        let err = svc
            .submit("u2", &session_id, None, "hi".into(), vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        let err = svc.cancel("u2", &session_id).await.unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        // 归属校验失败不得改变状态
        let session = svc.get_session(&session_id).await?.unwrap();
        assert_eq!(session.status, SessionStatus::InProgress);
        Ok(())
    }

    #[tokio::test]
    async fn cancelled_session_rejects_submit_without_post() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let session_id = svc.initiate("u1").await?;

        svc.cancel("u1", &session_id).await?;

        let err = svc
            .submit("u1", &session_id, None, "late".into(), vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        let session = svc.get_session(&session_id).await?.unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
        assert!(session.post_id.is_none());
        assert!(store.list_posts(Some("u1"), 50, 0).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn terminal_sessions_cannot_be_cancelled_again() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());

        let completed = svc.initiate("u1").await?;
        svc.submit("u1", &completed, None, "done".into(), vec![], vec![])
            .await?;
        let err = svc.cancel("u1", &completed).await.unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        let cancelled = svc.initiate("u1").await?;
        svc.cancel("u1", &cancelled).await?;
        let err = svc.cancel("u1", &cancelled).await.unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));
        Ok(())
    }

    #[tokio::test]
    async fn update_status_only_allows_cancellation() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());
        let session_id = svc.initiate("u1").await?;

        let err = svc
            .update_status("u1", &session_id, SessionStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        let err = svc
            .update_status("u1", &session_id, SessionStatus::InProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, JoydropError::BadRequest(_)));

        svc.update_status("u1", &session_id, SessionStatus::Cancelled)
            .await?;
        let session = svc.get_session(&session_id).await?.unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
        Ok(())
    }

    #[tokio::test]
    async fn list_by_user_returns_own_sessions_newest_first() -> anyhow::Result<()> {
        let store = Arc::new(MemoryJoydropStore::new());
        let svc = service(store.clone());

        let first = svc.initiate("u1").await?;
        let second = svc.initiate("u1").await?;
        svc.initiate("u2").await?;

        let sessions = svc.list_by_user("u1").await?;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, second);
        assert_eq!(sessions[1].session_id, first);
        Ok(())
    }
}
