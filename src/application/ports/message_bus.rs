//! Message Bus Port - 共享消息总线
//!
//! 发布/订阅语义：没有送达保证，不同发送方之间没有顺序保证。
//! 所有跨上下文通信都是发送后继续，结果靠消息中的关联 ID 路由。

use thiserror::Error;
use tokio::sync::broadcast;

use crate::domain::task::BusMessage;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("Could not establish connection. Receiving end does not exist.")]
    NoReceivers,
}

/// 总线订阅
pub struct BusSubscription {
    receiver: broadcast::Receiver<BusMessage>,
}

impl BusSubscription {
    pub fn new(receiver: broadcast::Receiver<BusMessage>) -> Self {
        Self { receiver }
    }

    /// 接收下一条消息；总线关闭时返回 None
    ///
    /// 订阅者处理过慢时会丢失旧消息（记录警告后继续）
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Bus subscriber lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Message Bus Port
pub trait MessageBusPort: Send + Sync {
    /// 发布消息，返回接收方数量
    fn publish(&self, message: BusMessage) -> Result<usize, BusError>;

    /// 订阅总线
    fn subscribe(&self) -> BusSubscription;
}
