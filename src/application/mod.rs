//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（InferenceEngine、HostRuntime、WorkerSpawner、TabMessenger 等）
//! - coordinator: 进程级协调者（Host 生命周期、任务分发、结果路由）
//! - host: Host 上下文中的总线/Worker 转发桥
//! - lifecycle: 单次执行与懒加载槽位
//! - error: 应用层错误定义

pub mod coordinator;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod ports;

// Re-exports
pub use coordinator::{Coordinator, CoordinatorConfig, ERROR_LABEL};
pub use error::RelayError;
pub use host::{HostBridge, WorkerHandle};
pub use lifecycle::{LazySlot, SingleFlight, SlotStatus};

pub use ports::{
    // Bus
    BusError,
    BusSubscription,
    MessageBusPort,
    // Host runtime
    HostError,
    HostRuntimePort,
    // Inference engine
    InferenceEnginePort,
    InferenceError,
    Pipeline,
    PipelineOptions,
    PipelineSpec,
    // Menus
    MenuClick,
    MenuError,
    MenuItem,
    MenuRegistryPort,
    // Settings
    Settings,
    SettingsError,
    SettingsStorePort,
    // Tabs
    TabError,
    TabMessengerPort,
    // Worker
    WorkerChannel,
    WorkerError,
    WorkerEvent,
    WorkerSpawnerPort,
};
