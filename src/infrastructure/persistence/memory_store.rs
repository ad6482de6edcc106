//! 进程内存储实现
//!
//! 未配置 Mongo URL 时的开发/测试后端。全部写操作在同一把锁内完成，
//! 计数器与子集合天然一致；对外语义与 Mongo 实现保持一致。

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::model::{
    Comment, JoydropSession, Like, NewPost, Post, SessionStatus, UserProfile,
};
use crate::domain::repository::{
    LikeInsert, PostRepository, SessionCompletion, SessionRepository, UserProfileProvider,
};

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, (JoydropSession, u64)>,
    posts: HashMap<String, (Post, u64)>,
    likes: HashMap<String, Vec<(Like, u64)>>,
    comments: HashMap<String, Vec<(Comment, u64)>>,
    users: HashMap<String, UserProfile>,
    profile_refs: HashMap<String, Vec<String>>,
    /// 单调序号，用于同刻创建记录的稳定倒序
    seq: u64,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn make_post(&mut self, post: &NewPost) -> (Post, u64) {
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4().to_string(),
            sender_id: post.sender_id.clone(),
            receiver_id: post.receiver_id.clone(),
            content: post.content.clone(),
            media_urls: post.media_urls.clone(),
            tags: post.tags.clone(),
            likes_count: 0,
            comments_count: 0,
            is_public: post.is_public(),
            created_at: now,
            updated_at: now,
        };
        (created, self.next_seq())
    }
}

pub struct MemoryJoydropStore {
    inner: RwLock<Inner>,
}

impl MemoryJoydropStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// 写入一条用户公开资料（开发/测试用）
    pub async fn insert_user(&self, profile: UserProfile) {
        let mut inner = self.inner.write().await;
        inner.users.insert(profile.uid.clone(), profile);
    }

    /// 某用户收到的私密 joydrop 引用
    pub async fn profile_refs(&self, user_id: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        inner.profile_refs.get(user_id).cloned().unwrap_or_default()
    }
}

impl Default for MemoryJoydropStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionRepository for MemoryJoydropStore {
    async fn create_session(&self, session: &JoydropSession) -> Result<()> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq();
        inner
            .sessions
            .insert(session.session_id.clone(), (session.clone(), seq));
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<JoydropSession>> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.get(session_id).map(|(s, _)| s.clone()))
    }

    async fn list_by_sender(&self, sender_id: &str, limit: i64) -> Result<Vec<JoydropSession>> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<_> = inner
            .sessions
            .values()
            .filter(|(s, _)| s.sender_id == sender_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.1.cmp(&a.1));
        sessions.truncate(limit.max(0) as usize);
        Ok(sessions.into_iter().map(|(s, _)| s).collect())
    }

    async fn complete_with_post(
        &self,
        session_id: &str,
        post: &NewPost,
    ) -> Result<SessionCompletion> {
        let mut inner = self.inner.write().await;

        match inner.sessions.get(session_id) {
            Some((s, _)) if s.status == SessionStatus::InProgress => {}
            _ => return Ok(SessionCompletion::NotInProgress),
        }

        let (created, seq) = inner.make_post(post);
        let post_id = created.id.clone();
        inner.posts.insert(post_id.clone(), (created, seq));

        let entry = inner
            .sessions
            .get_mut(session_id)
            .expect("session checked above");
        entry.0.status = SessionStatus::Completed;
        entry.0.post_id = Some(post_id.clone());
        entry.0.updated_at = Utc::now();

        Ok(SessionCompletion::Completed { post_id })
    }

    async fn mark_cancelled(&self, session_id: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.sessions.get_mut(session_id) {
            Some((s, _)) if s.status == SessionStatus::InProgress => {
                s.status = SessionStatus::Cancelled;
                s.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl PostRepository for MemoryJoydropStore {
    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let mut inner = self.inner.write().await;
        let (created, seq) = inner.make_post(post);
        inner
            .posts
            .insert(created.id.clone(), (created.clone(), seq));
        Ok(created)
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(post_id).map(|(p, _)| p.clone()))
    }

    async fn list_posts(
        &self,
        sender_id: Option<&str>,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        let mut posts: Vec<_> = inner
            .posts
            .values()
            .filter(|(p, _)| match sender_id {
                Some(sender) => p.sender_id == sender,
                None => p.is_public,
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit.max(0) as usize)
            .map(|(p, _)| p)
            .collect())
    }

    async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>> {
        let inner = self.inner.read().await;
        Ok(inner.likes.get(post_id).and_then(|likes| {
            likes
                .iter()
                .find(|(l, _)| l.user_id == user_id)
                .map(|(l, _)| l.clone())
        }))
    }

    async fn insert_like(&self, post_id: &str, user_id: &str) -> Result<LikeInsert> {
        let mut inner = self.inner.write().await;

        if !inner.posts.contains_key(post_id) {
            return Ok(LikeInsert::PostMissing);
        }
        if inner
            .likes
            .get(post_id)
            .is_some_and(|likes| likes.iter().any(|(l, _)| l.user_id == user_id))
        {
            return Ok(LikeInsert::AlreadyLiked);
        }

        let like = Like {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            liked_at: Utc::now(),
        };
        let seq = inner.next_seq();
        inner
            .likes
            .entry(post_id.to_string())
            .or_default()
            .push((like.clone(), seq));

        let (post, _) = inner.posts.get_mut(post_id).expect("post checked above");
        post.likes_count += 1;
        post.updated_at = Utc::now();

        Ok(LikeInsert::Created(like))
    }

    async fn remove_like(&self, post_id: &str, like_id: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;

        let removed = match inner.likes.get_mut(post_id) {
            Some(likes) => {
                let before = likes.len();
                likes.retain(|(l, _)| l.id != like_id);
                before != likes.len()
            }
            None => false,
        };

        if removed {
            if let Some((post, _)) = inner.posts.get_mut(post_id) {
                post.likes_count -= 1;
                post.updated_at = Utc::now();
            }
        }
        Ok(removed)
    }

    async fn insert_comment(
        &self,
        post_id: &str,
        user_id: &str,
        comment: &str,
    ) -> Result<Option<Comment>> {
        let mut inner = self.inner.write().await;

        if !inner.posts.contains_key(post_id) {
            return Ok(None);
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            comment: comment.to_string(),
            commented_at: Utc::now(),
        };
        let seq = inner.next_seq();
        inner
            .comments
            .entry(post_id.to_string())
            .or_default()
            .push((comment.clone(), seq));

        let (post, _) = inner.posts.get_mut(post_id).expect("post checked above");
        post.comments_count += 1;
        post.updated_at = Utc::now();

        Ok(Some(comment))
    }

    async fn list_likes(&self, post_id: &str, limit: i64) -> Result<Vec<Like>> {
        let inner = self.inner.read().await;
        let mut likes = inner.likes.get(post_id).cloned().unwrap_or_default();
        likes.sort_by(|a, b| b.1.cmp(&a.1));
        likes.truncate(limit.max(0) as usize);
        Ok(likes.into_iter().map(|(l, _)| l).collect())
    }

    async fn list_comments(&self, post_id: &str, limit: i64) -> Result<Vec<Comment>> {
        let inner = self.inner.read().await;
        let mut comments = inner.comments.get(post_id).cloned().unwrap_or_default();
        comments.sort_by(|a, b| b.1.cmp(&a.1));
        comments.truncate(limit.max(0) as usize);
        Ok(comments.into_iter().map(|(c, _)| c).collect())
    }

    async fn delete_post_cascade(&self, post_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.likes.remove(post_id);
        inner.comments.remove(post_id);
        inner.posts.remove(post_id);
        Ok(())
    }

    async fn save_profile_ref(&self, user_id: &str, post_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .profile_refs
            .entry(user_id.to_string())
            .or_default()
            .push(post_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl UserProfileProvider for MemoryJoydropStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(user_id).cloned())
    }
}
