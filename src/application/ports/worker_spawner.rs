//! Worker Spawner Port - 隔离执行单元的创建
//!
//! Host 通过直接通道（没有总线语义）与 Worker 通信：
//! 发送方向是未经类型检查的结构化数据，接收方向是 Worker 发出的消息或致命崩溃

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::task::BusMessage;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to spawn worker: {0}")]
    SpawnFailed(String),
}

/// Worker 发往 Host 的事件
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// Worker 发出的消息（原样转发到总线）
    Message(BusMessage),
    /// Worker 内部未捕获的致命错误
    Crashed(String),
}

/// 与单个 Worker 的直接通道
pub struct WorkerChannel {
    pub inbox: mpsc::UnboundedSender<serde_json::Value>,
    pub events: mpsc::UnboundedReceiver<WorkerEvent>,
}

/// Worker Spawner Port
#[async_trait]
pub trait WorkerSpawnerPort: Send + Sync {
    async fn spawn(&self) -> Result<WorkerChannel, WorkerError>;
}
