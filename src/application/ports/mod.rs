//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层（扩展运行时、推理引擎）的抽象接口

mod host_runtime;
mod inference_engine;
mod menu_registry;
mod message_bus;
mod settings_store;
mod tab_messenger;
mod worker_spawner;

pub use host_runtime::{HostError, HostRuntimePort};
pub use inference_engine::{
    InferenceEnginePort, InferenceError, Pipeline, PipelineOptions, PipelineSpec,
};
pub use menu_registry::{MenuClick, MenuError, MenuItem, MenuRegistryPort};
pub use message_bus::{BusError, BusSubscription, MessageBusPort};
pub use settings_store::{
    Settings, SettingsError, SettingsStorePort, EXTRACT_QA_QUESTION_KEY, SUMMARIZE_PROMPT_KEY,
};
pub use tab_messenger::{TabError, TabMessengerPort};
pub use worker_spawner::{WorkerChannel, WorkerError, WorkerEvent, WorkerSpawnerPort};
