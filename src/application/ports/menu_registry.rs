//! Menu Registry Port - 选区右键菜单注册

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::task::{TabId, TaskKind};

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Menu registration failed: {0}")]
    RegistrationFailed(String),
}

/// 菜单项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: String,
    pub title: String,
    /// 仅在有选中文本时显示
    pub selection_only: bool,
}

impl MenuItem {
    pub fn for_task(kind: TaskKind) -> Self {
        Self {
            id: kind.menu_item_id().to_string(),
            title: kind.menu_title().to_string(),
            selection_only: true,
        }
    }
}

/// 菜单点击事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuClick {
    pub menu_item_id: String,
    pub selection_text: Option<String>,
    pub tab_id: Option<TabId>,
}

/// Menu Registry Port
#[async_trait]
pub trait MenuRegistryPort: Send + Sync {
    /// 移除所有已注册菜单项并注册新的菜单项
    async fn replace_all(&self, items: Vec<MenuItem>) -> Result<(), MenuError>;
}
