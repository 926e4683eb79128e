//! Tab Messenger Port - 向指定标签页发送消息
//!
//! 尽力投递：标签页已关闭或已跳转时发送失败

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::task::{DisplayResult, TabId};

#[derive(Debug, Error)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(TabId),

    #[error("Tab closed: {0}")]
    Closed(TabId),
}

/// Tab Messenger Port
#[async_trait]
pub trait TabMessengerPort: Send + Sync {
    async fn send_to_tab(&self, tab_id: TabId, message: DisplayResult) -> Result<(), TabError>;
}
