//! Joydrop 服务错误类型定义

use thiserror::Error;

/// Joydrop 服务错误类型
#[derive(Debug, Error)]
pub enum JoydropError {
    /// 会话/帖子/点赞记录未找到
    #[error("Not found: {0}")]
    NotFound(String),

    /// 重复点赞、重复提交
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 非法状态迁移、会话归属校验失败、参数校验失败
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// 非帖子所有者执行删除
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 身份校验失败
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 存储/传输层错误
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Joydrop 服务结果类型
pub type JoydropResult<T> = Result<T, JoydropError>;
