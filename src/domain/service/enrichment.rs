//! 读侧用户资料补全
//!
//! 批量解析用户 id 到公开资料。单个查询失败只记日志不终止整批，
//! 未解析到的 id 在结果中缺席（调用方补 null）。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tracing::warn;

use crate::domain::model::UserProfile;
use crate::domain::repository::UserProfileProvider;

/// 批量查询的分块大小（底层存储的扇出限制）
const LOOKUP_CHUNK_SIZE: usize = 10;

pub struct UserEnricher {
    users: Arc<dyn UserProfileProvider>,
}

impl UserEnricher {
    pub fn new(users: Arc<dyn UserProfileProvider>) -> Self {
        Self { users }
    }

    /// 解析一组用户 id，返回 uid -> 资料 的映射
    pub async fn lookup<I>(&self, ids: I) -> HashMap<String, UserProfile>
    where
        I: IntoIterator<Item = String>,
    {
        let distinct: Vec<String> = ids
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut resolved = HashMap::new();
        for chunk in distinct.chunks(LOOKUP_CHUNK_SIZE) {
            let lookups = chunk.iter().map(|uid| {
                let users = self.users.clone();
                let uid = uid.clone();
                async move { (uid.clone(), users.get_user(&uid).await) }
            });

            for (uid, result) in join_all(lookups).await {
                match result {
                    Ok(Some(profile)) => {
                        resolved.insert(uid, profile);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(user_id = %uid, error = %err, "User lookup failed during enrichment");
                    }
                }
            }
        }

        resolved
    }
}
