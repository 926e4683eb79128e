//! In-Memory Menu Registry Implementation

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{MenuError, MenuItem, MenuRegistryPort};

/// 内存菜单注册表
pub struct InMemoryMenuRegistry {
    items: DashMap<String, MenuItem>,
}

impl InMemoryMenuRegistry {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    pub fn items(&self) -> Vec<MenuItem> {
        let mut items: Vec<MenuItem> = self.items.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }
}

impl Default for InMemoryMenuRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MenuRegistryPort for InMemoryMenuRegistry {
    async fn replace_all(&self, items: Vec<MenuItem>) -> Result<(), MenuError> {
        self.items.clear();
        for item in items {
            if self.items.contains_key(&item.id) {
                return Err(MenuError::RegistrationFailed(format!(
                    "duplicate menu id: {}",
                    item.id
                )));
            }
            self.items.insert(item.id.clone(), item);
        }
        tracing::debug!(count = self.items.len(), "Menu items registered");
        Ok(())
    }
}
