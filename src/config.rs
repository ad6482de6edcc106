//! 服务配置
//!
//! 全部来自环境变量，带开发环境可用的默认值。

use std::env;

use crate::domain::model::{EngagementDomainConfig, FeedDomainConfig, SessionDomainConfig};

#[derive(Clone, Debug)]
pub struct JoydropConfig {
    /// HTTP 监听地址
    pub server_addr: String,
    /// 未配置时回退到进程内存储（仅限开发/测试）
    pub mongo_url: Option<String>,
    pub mongo_database: String,
    /// HS256 对称密钥
    pub jwt_secret: String,
    pub session: SessionDomainConfig,
    pub engagement: EngagementDomainConfig,
    pub feed: FeedDomainConfig,
}

impl JoydropConfig {
    pub fn from_env() -> Self {
        let server_addr =
            env::var("JOYDROP_SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let mongo_url = env::var("JOYDROP_MONGO_URL")
            .ok()
            .filter(|url| !url.is_empty());

        let mongo_database =
            env::var("JOYDROP_MONGO_DATABASE").unwrap_or_else(|_| "joydrop".to_string());

        let jwt_secret =
            env::var("JOYDROP_JWT_SECRET").unwrap_or_else(|_| "joydrop-dev-secret".to_string());

        Self {
            server_addr,
            mongo_url,
            mongo_database,
            jwt_secret,
            session: SessionDomainConfig::default(),
            engagement: EngagementDomainConfig::default(),
            feed: FeedDomainConfig::default(),
        }
    }
}
