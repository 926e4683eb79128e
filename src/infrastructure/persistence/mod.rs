//! Persistence Layer - 数据持久化
//!
//! 用户设置的 TOML 文件存储

mod settings_file;

pub use settings_file::FileSettingsStore;
