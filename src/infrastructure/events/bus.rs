//! Message Bus Implementation
//!
//! 基于 tokio broadcast 的进程内消息总线，每个上下文持有自己的订阅

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{BusError, BusSubscription, MessageBusPort};
use crate::domain::task::BusMessage;

/// 广播消息总线
pub struct BroadcastMessageBus {
    channel: broadcast::Sender<BusMessage>,
}

impl BroadcastMessageBus {
    pub fn new(capacity: usize) -> Self {
        let (channel, _) = broadcast::channel(capacity.max(1));
        Self { channel }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for BroadcastMessageBus {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MessageBusPort for BroadcastMessageBus {
    fn publish(&self, message: BusMessage) -> Result<usize, BusError> {
        let kind = message.type_name();
        match self.channel.send(message) {
            Ok(receivers) => {
                tracing::trace!(message_type = kind, receivers = receivers, "Message published");
                Ok(receivers)
            }
            Err(_) => {
                tracing::debug!(message_type = kind, "Failed to publish message (no receivers)");
                Err(BusError::NoReceivers)
            }
        }
    }

    fn subscribe(&self) -> BusSubscription {
        BusSubscription::new(self.channel.subscribe())
    }
}
