//! TextLens - 浏览器扩展的跨上下文任务分发
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Task Context: 任务类型、线上消息、输入准备与结果提取
//!
//! 应用层 (application/):
//! - Ports: 端口定义（InferenceEngine, HostRuntime, WorkerSpawner, TabMessenger, Settings, Menus）
//! - Coordinator: Host 生命周期、任务分发、结果路由
//! - Host: 总线与 Worker 之间的转发桥
//!
//! 基础设施层 (infrastructure/):
//! - Worker: ModelWorker 与 Pipeline 缓存
//! - Runtime: 进程内 Host 上下文与整体组装
//! - Events: 广播消息总线
//! - Memory: 标签页、设置、菜单内存实现
//! - Persistence: TOML 设置文件
//! - Adapters: HTTP / Fake 推理引擎

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

pub use config::{load_config, AppConfig};
