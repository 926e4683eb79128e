//! Memory Layer - In-Memory Runtime Collaborators
//!
//! 实现标签页消息、设置存储和菜单注册的内存版本

mod menu_registry;
mod settings_store;
mod tab_registry;

pub use menu_registry::InMemoryMenuRegistry;
pub use settings_store::InMemorySettingsStore;
pub use tab_registry::InMemoryTabRegistry;
