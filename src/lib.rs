//! Joydrop 核心服务
//!
//! 提供 joydrop 会话状态机、互动子系统（点赞/评论与反范式化计数）
//! 以及读侧的 Feed 组装与用户信息补全。

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;
pub mod service;
