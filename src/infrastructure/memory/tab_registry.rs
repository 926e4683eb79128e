//! In-Memory Tab Registry Implementation
//!
//! 每个打开的标签页对应一个接收通道；标签页关闭后投递失败

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{TabError, TabMessengerPort};
use crate::domain::task::{DisplayResult, TabId};

/// 内存标签页注册表
pub struct InMemoryTabRegistry {
    tabs: DashMap<TabId, mpsc::UnboundedSender<DisplayResult>>,
}

impl InMemoryTabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 打开标签页，返回其接收端
    pub fn open_tab(&self, tab_id: TabId) -> mpsc::UnboundedReceiver<DisplayResult> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.tabs.insert(tab_id, tx);
        tracing::debug!(tab_id = %tab_id, "Tab opened");
        rx
    }

    pub fn close_tab(&self, tab_id: TabId) -> bool {
        let closed = self.tabs.remove(&tab_id).is_some();
        if closed {
            tracing::debug!(tab_id = %tab_id, "Tab closed");
        }
        closed
    }

    pub fn is_open(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }
}

impl Default for InMemoryTabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TabMessengerPort for InMemoryTabRegistry {
    async fn send_to_tab(&self, tab_id: TabId, message: DisplayResult) -> Result<(), TabError> {
        let sender = self
            .tabs
            .get(&tab_id)
            .map(|entry| entry.clone())
            .ok_or(TabError::NotFound(tab_id))?;

        sender.send(message).map_err(|_| {
            // 接收端已丢弃（页面跳转）
            self.tabs.remove(&tab_id);
            TabError::Closed(tab_id)
        })
    }
}
