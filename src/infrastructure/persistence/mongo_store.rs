//! MongoDB 文档存储实现
//!
//! 子集合（点赞/评论）建模为带 postId 的顶层集合；
//! 计数器更新通过 `$inc` 与记录写入在同一多文档事务中提交。
//! (postId, userID) 唯一索引在并发点赞下兜底查重。

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{Client, ClientSession, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JoydropConfig;
use crate::domain::model::{
    Comment, JoydropSession, Like, NewPost, Post, SessionStatus, UserProfile,
};
use crate::domain::repository::{
    LikeInsert, PostRepository, SessionCompletion, SessionRepository, UserProfileProvider,
};

/// 单批删除的写入上限，超过则分块、逐块独立提交
const MAX_DELETE_BATCH: usize = 500;

const SESSIONS_COLLECTION: &str = "joydropSessions";
const POSTS_COLLECTION: &str = "posts";
const LIKES_COLLECTION: &str = "postLikes";
const COMMENTS_COLLECTION: &str = "postComments";
const USERS_COLLECTION: &str = "users";
const PROFILE_REFS_COLLECTION: &str = "userReceivedPosts";

#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "senderId")]
    sender_id: String,
    status: String,
    #[serde(rename = "postId", default, skip_serializing_if = "Option::is_none")]
    post_id: Option<String>,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl SessionDocument {
    fn from_domain(session: &JoydropSession) -> Self {
        Self {
            id: session.session_id.clone(),
            sender_id: session.sender_id.clone(),
            status: session.status.as_str().to_string(),
            post_id: session.post_id.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }

    fn into_domain(self) -> Result<JoydropSession> {
        let status = SessionStatus::parse(&self.status)
            .with_context(|| format!("unknown session status: {}", self.status))?;
        Ok(JoydropSession {
            session_id: self.id,
            sender_id: self.sender_id,
            status,
            post_id: self.post_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PostDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "senderID")]
    sender_id: String,
    /// 公开帖显式存 null，与既有数据保持一致
    #[serde(rename = "receiverID")]
    receiver_id: Option<String>,
    content: String,
    #[serde(rename = "mediaUrls")]
    media_urls: Vec<String>,
    tags: Vec<String>,
    #[serde(rename = "likesCount")]
    likes_count: i64,
    #[serde(rename = "commentsCount")]
    comments_count: i64,
    #[serde(rename = "isPublic")]
    is_public: bool,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl PostDocument {
    fn from_new(post: &NewPost) -> Self {
        let now = Utc::now();
        Self {
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
        }
    }

    fn into_domain(self) -> Post {
        Post {
            id: self.id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            content: self.content,
            media_urls: self.media_urls,
            tags: self.tags,
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            is_public: self.is_public,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LikeDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "postId")]
    post_id: String,
    #[serde(rename = "userID")]
    user_id: String,
    #[serde(rename = "likedAt", with = "chrono_datetime_as_bson_datetime")]
    liked_at: DateTime<Utc>,
}

impl LikeDocument {
    fn into_domain(self) -> Like {
        Like {
            id: self.id,
            user_id: self.user_id,
            liked_at: self.liked_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommentDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "postId")]
    post_id: String,
    #[serde(rename = "userID")]
    user_id: String,
    comment: String,
    #[serde(rename = "commentedAt", with = "chrono_datetime_as_bson_datetime")]
    commented_at: DateTime<Utc>,
}

impl CommentDocument {
    fn into_domain(self) -> Comment {
        Comment {
            id: self.id,
            user_id: self.user_id,
            comment: self.comment,
            commented_at: self.commented_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(rename = "photoURL", default)]
    photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProfileRefDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "postId")]
    post_id: String,
    #[serde(rename = "type")]
    ref_type: &'static str,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

pub struct MongoJoydropStore {
    sessions: Collection<SessionDocument>,
    posts: Collection<PostDocument>,
    likes: Collection<LikeDocument>,
    comments: Collection<CommentDocument>,
    users: Collection<UserDocument>,
    profile_refs: Collection<ProfileRefDocument>,
    client: Arc<Client>,
}

impl MongoJoydropStore {
    pub async fn new(config: &JoydropConfig) -> Result<Option<Self>> {
        let uri = match &config.mongo_url {
            Some(url) => url,
            None => return Ok(None),
        };

        let options = ClientOptions::parse(uri).await?;
        let client = Arc::new(Client::with_options(options)?);
        let database = client.database(&config.mongo_database);

        let store = Self {
            sessions: database.collection(SESSIONS_COLLECTION),
            posts: database.collection(POSTS_COLLECTION),
            likes: database.collection(LIKES_COLLECTION),
            comments: database.collection(COMMENTS_COLLECTION),
            users: database.collection(USERS_COLLECTION),
            profile_refs: database.collection(PROFILE_REFS_COLLECTION),
            client,
        };
        store.ensure_indexes().await?;

        Ok(Some(store))
    }

    async fn ensure_indexes(&self) -> Result<()> {
        let unique_like = IndexModel::builder()
            .keys(doc! {"postId": 1, "userID": 1})
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(Some("uid_post_like".to_string()))
                    .build(),
            )
            .build();
        self.likes
            .create_index(unique_like, None::<mongodb::options::CreateIndexOptions>)
            .await?;

        let like_recency = IndexModel::builder()
            .keys(doc! {"postId": 1, "likedAt": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("idx_post_liked_at".to_string()))
                    .build(),
            )
            .build();
        self.likes
            .create_index(like_recency, None::<mongodb::options::CreateIndexOptions>)
            .await?;

        let comment_recency = IndexModel::builder()
            .keys(doc! {"postId": 1, "commentedAt": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("idx_post_commented_at".to_string()))
                    .build(),
            )
            .build();
        self.comments
            .create_index(comment_recency, None::<mongodb::options::CreateIndexOptions>)
            .await?;

        let public_feed = IndexModel::builder()
            .keys(doc! {"isPublic": 1, "createdAt": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("idx_public_created_at".to_string()))
                    .build(),
            )
            .build();
        self.posts
            .create_index(public_feed, None::<mongodb::options::CreateIndexOptions>)
            .await?;

        let sender_feed = IndexModel::builder()
            .keys(doc! {"senderID": 1, "createdAt": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("idx_sender_created_at".to_string()))
                    .build(),
            )
            .build();
        self.posts
            .create_index(sender_feed, None::<mongodb::options::CreateIndexOptions>)
            .await?;

        let session_owner = IndexModel::builder()
            .keys(doc! {"senderId": 1, "createdAt": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("idx_sender_sessions".to_string()))
                    .build(),
            )
            .build();
        self.sessions
            .create_index(session_owner, None::<mongodb::options::CreateIndexOptions>)
            .await?;

        Ok(())
    }

    /// 事务体：插入帖子 + 条件翻转会话状态
    async fn submit_txn(
        &self,
        txn: &mut ClientSession,
        session_id: &str,
        post: &PostDocument,
    ) -> mongodb::error::Result<bool> {
        self.posts.insert_one_with_session(post, None, txn).await?;

        let updated = self
            .sessions
            .update_one_with_session(
                doc! {"_id": session_id, "status": SessionStatus::InProgress.as_str()},
                doc! {"$set": {
                    "status": SessionStatus::Completed.as_str(),
                    "postId": &post.id,
                    "updatedAt": mongodb::bson::DateTime::now(),
                }},
                None,
                txn,
            )
            .await?;

        Ok(updated.modified_count == 1)
    }

    /// 事务体：插入点赞记录 + likesCount 自增
    async fn like_txn(
        &self,
        txn: &mut ClientSession,
        like: &LikeDocument,
    ) -> mongodb::error::Result<bool> {
        self.likes.insert_one_with_session(like, None, txn).await?;

        let updated = self
            .posts
            .update_one_with_session(
                doc! {"_id": &like.post_id},
                doc! {
                    "$inc": {"likesCount": 1},
                    "$set": {"updatedAt": mongodb::bson::DateTime::now()},
                },
                None,
                txn,
            )
            .await?;

        Ok(updated.matched_count == 1)
    }

    /// 事务体：删除点赞记录 + likesCount 自减
    async fn unlike_txn(
        &self,
        txn: &mut ClientSession,
        post_id: &str,
        like_id: &str,
    ) -> mongodb::error::Result<bool> {
        let deleted = self
            .likes
            .delete_one_with_session(doc! {"_id": like_id, "postId": post_id}, None, txn)
            .await?;
        if deleted.deleted_count == 0 {
            return Ok(false);
        }

        self.posts
            .update_one_with_session(
                doc! {"_id": post_id},
                doc! {
                    "$inc": {"likesCount": -1},
                    "$set": {"updatedAt": mongodb::bson::DateTime::now()},
                },
                None,
                txn,
            )
            .await?;

        Ok(true)
    }

    /// 事务体：插入评论 + commentsCount 自增
    async fn comment_txn(
        &self,
        txn: &mut ClientSession,
        comment: &CommentDocument,
    ) -> mongodb::error::Result<bool> {
        self.comments
            .insert_one_with_session(comment, None, txn)
            .await?;

        let updated = self
            .posts
            .update_one_with_session(
                doc! {"_id": &comment.post_id},
                doc! {
                    "$inc": {"commentsCount": 1},
                    "$set": {"updatedAt": mongodb::bson::DateTime::now()},
                },
                None,
                txn,
            )
            .await?;

        Ok(updated.matched_count == 1)
    }

    async fn start_txn(&self) -> Result<ClientSession> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        Ok(session)
    }

    /// 分块删除某帖在一个子集合下的全部记录，每块独立提交
    async fn clear_subcollection<T: Send + Sync>(
        collection: &Collection<T>,
        post_id: &str,
        stage: &str,
    ) -> Result<()> {
        let ids = collection
            .distinct("_id", doc! {"postId": post_id}, None)
            .await
            .with_context(|| format!("enumerating {stage} for post {post_id}"))?;

        for chunk in ids.chunks(MAX_DELETE_BATCH) {
            collection
                .delete_many(doc! {"_id": {"$in": chunk.to_vec()}}, None)
                .await
                .with_context(|| format!("clearing {stage} for post {post_id}"))?;
        }
        Ok(())
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_err)) => write_err.code == 11000,
        ErrorKind::Command(command_err) => command_err.code == 11000,
        _ => false,
    }
}

#[async_trait]
impl SessionRepository for MongoJoydropStore {
    async fn create_session(&self, session: &JoydropSession) -> Result<()> {
        self.sessions
            .insert_one(SessionDocument::from_domain(session), None)
            .await
            .context("creating joydrop session")?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<JoydropSession>> {
        let doc = self
            .sessions
            .find_one(doc! {"_id": session_id}, None)
            .await
            .context("loading joydrop session")?;
        doc.map(SessionDocument::into_domain).transpose()
    }

    async fn list_by_sender(&self, sender_id: &str, limit: i64) -> Result<Vec<JoydropSession>> {
        let options = FindOptions::builder()
            .sort(doc! {"createdAt": -1})
            .limit(limit)
            .build();
        let docs: Vec<SessionDocument> = self
            .sessions
            .find(doc! {"senderId": sender_id}, options)
            .await
            .context("listing joydrop sessions")?
            .try_collect()
            .await
            .context("reading joydrop session page")?;
        docs.into_iter()
            .map(SessionDocument::into_domain)
            .collect()
    }

    async fn complete_with_post(
        &self,
        session_id: &str,
        post: &NewPost,
    ) -> Result<SessionCompletion> {
        let post_doc = PostDocument::from_new(post);
        let mut txn = self.start_txn().await?;

        match self.submit_txn(&mut txn, session_id, &post_doc).await {
            Ok(true) => {
                txn.commit_transaction()
                    .await
                    .context("committing joydrop submission")?;
                Ok(SessionCompletion::Completed {
                    post_id: post_doc.id,
                })
            }
            Ok(false) => {
                txn.abort_transaction()
                    .await
                    .context("aborting joydrop submission")?;
                Ok(SessionCompletion::NotInProgress)
            }
            Err(err) => {
                let _ = txn.abort_transaction().await;
                Err(err).context("submitting joydrop session")
            }
        }
    }

    async fn mark_cancelled(&self, session_id: &str) -> Result<bool> {
        let updated = self
            .sessions
            .update_one(
                doc! {"_id": session_id, "status": SessionStatus::InProgress.as_str()},
                doc! {"$set": {
                    "status": SessionStatus::Cancelled.as_str(),
                    "updatedAt": mongodb::bson::DateTime::now(),
                }},
                None,
            )
            .await
            .context("cancelling joydrop session")?;
        Ok(updated.modified_count == 1)
    }
}

#[async_trait]
impl PostRepository for MongoJoydropStore {
    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let doc = PostDocument::from_new(post);
        self.posts
            .insert_one(&doc, None)
            .await
            .context("creating post")?;
        Ok(doc.into_domain())
    }

    async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
        let doc = self
            .posts
            .find_one(doc! {"_id": post_id}, None)
            .await
            .context("loading post")?;
        Ok(doc.map(PostDocument::into_domain))
    }

    async fn list_posts(
        &self,
        sender_id: Option<&str>,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<Post>> {
        let filter = match sender_id {
            Some(sender) => doc! {"senderID": sender},
            None => doc! {"isPublic": true},
        };
        let options = FindOptions::builder()
            .sort(doc! {"createdAt": -1})
            .skip(offset)
            .limit(limit)
            .build();
        let docs: Vec<PostDocument> = self
            .posts
            .find(filter, options)
            .await
            .context("listing posts")?
            .try_collect()
            .await
            .context("reading post page")?;
        Ok(docs.into_iter().map(PostDocument::into_domain).collect())
    }

    async fn find_like(&self, post_id: &str, user_id: &str) -> Result<Option<Like>> {
        let doc = self
            .likes
            .find_one(doc! {"postId": post_id, "userID": user_id}, None)
            .await
            .context("looking up like")?;
        Ok(doc.map(LikeDocument::into_domain))
    }

    async fn insert_like(&self, post_id: &str, user_id: &str) -> Result<LikeInsert> {
        let like = LikeDocument {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            liked_at: Utc::now(),
        };
        let mut txn = self.start_txn().await?;

        match self.like_txn(&mut txn, &like).await {
            Ok(true) => {
                txn.commit_transaction().await.context("committing like")?;
                Ok(LikeInsert::Created(like.into_domain()))
            }
            Ok(false) => {
                txn.abort_transaction().await.context("aborting like")?;
                Ok(LikeInsert::PostMissing)
            }
            Err(err) if is_duplicate_key(&err) => {
                let _ = txn.abort_transaction().await;
                Ok(LikeInsert::AlreadyLiked)
            }
            Err(err) => {
                let _ = txn.abort_transaction().await;
                Err(err).context("liking post")
            }
        }
    }

    async fn remove_like(&self, post_id: &str, like_id: &str) -> Result<bool> {
        let mut txn = self.start_txn().await?;

        match self.unlike_txn(&mut txn, post_id, like_id).await {
            Ok(removed) => {
                if removed {
                    txn.commit_transaction()
                        .await
                        .context("committing unlike")?;
                } else {
                    txn.abort_transaction().await.context("aborting unlike")?;
                }
                Ok(removed)
            }
            Err(err) => {
                let _ = txn.abort_transaction().await;
                Err(err).context("unliking post")
            }
        }
    }

    async fn insert_comment(
        &self,
        post_id: &str,
        user_id: &str,
        comment: &str,
    ) -> Result<Option<Comment>> {
        let doc = CommentDocument {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            comment: comment.to_string(),
            commented_at: Utc::now(),
        };
        let mut txn = self.start_txn().await?;

        match self.comment_txn(&mut txn, &doc).await {
            Ok(true) => {
                txn.commit_transaction()
                    .await
                    .context("committing comment")?;
                Ok(Some(doc.into_domain()))
            }
            Ok(false) => {
                txn.abort_transaction().await.context("aborting comment")?;
                Ok(None)
            }
            Err(err) => {
                let _ = txn.abort_transaction().await;
                Err(err).context("commenting on post")
            }
        }
    }

    async fn list_likes(&self, post_id: &str, limit: i64) -> Result<Vec<Like>> {
        let options = FindOptions::builder()
            .sort(doc! {"likedAt": -1})
            .limit(limit)
            .build();
        let docs: Vec<LikeDocument> = self
            .likes
            .find(doc! {"postId": post_id}, options)
            .await
            .context("listing likes")?
            .try_collect()
            .await
            .context("reading like page")?;
        Ok(docs.into_iter().map(LikeDocument::into_domain).collect())
    }

    async fn list_comments(&self, post_id: &str, limit: i64) -> Result<Vec<Comment>> {
        let options = FindOptions::builder()
            .sort(doc! {"commentedAt": -1})
            .limit(limit)
            .build();
        let docs: Vec<CommentDocument> = self
            .comments
            .find(doc! {"postId": post_id}, options)
            .await
            .context("listing comments")?
            .try_collect()
            .await
            .context("reading comment page")?;
        Ok(docs.into_iter().map(CommentDocument::into_domain).collect())
    }

    async fn delete_post_cascade(&self, post_id: &str) -> Result<()> {
        // 子集合先清，帖子文档最后删；中途失败时错误指明所在阶段
        Self::clear_subcollection(&self.likes, post_id, "like records").await?;
        Self::clear_subcollection(&self.comments, post_id, "comment records").await?;

        self.posts
            .delete_one(doc! {"_id": post_id}, None)
            .await
            .with_context(|| format!("deleting post document {post_id}"))?;
        Ok(())
    }

    async fn save_profile_ref(&self, user_id: &str, post_id: &str) -> Result<()> {
        let doc = ProfileRefDocument {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            ref_type: "received_joydrop",
            created_at: Utc::now(),
        };
        self.profile_refs
            .insert_one(doc, None)
            .await
            .context("saving received-joydrop reference")?;
        Ok(())
    }
}

#[async_trait]
impl UserProfileProvider for MongoJoydropStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>> {
        let doc = self
            .users
            .find_one(doc! {"_id": user_id}, None)
            .await
            .context("loading user profile")?;
        Ok(doc.map(|user| UserProfile {
            uid: user.id,
            display_name: user.display_name,
            username: user.username,
            email: user.email,
            photo_url: user.photo_url,
        }))
    }
}
