//! Host Runtime Port - 后台宿主上下文管理
//!
//! 对应扩展运行时的 offscreen document API：查询已存在的上下文、创建新上下文

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Host context already exists: {0}")]
    AlreadyExists(String),

    #[error("Failed to create host context: {0}")]
    CreationFailed(String),
}

/// Host Runtime Port
#[async_trait]
pub trait HostRuntimePort: Send + Sync {
    /// 指定文档的 Host 上下文是否存活
    async fn has_host(&self, document: &str) -> bool;

    /// 创建 Host 上下文；同一时刻只允许存在一个
    async fn create_host(&self, document: &str) -> Result<(), HostError>;
}
