//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;
pub mod memory;
pub mod persistence;
pub mod runtime;
pub mod worker;

pub use events::BroadcastMessageBus;
pub use memory::{InMemoryMenuRegistry, InMemorySettingsStore, InMemoryTabRegistry};
pub use persistence::FileSettingsStore;
pub use runtime::{ExtensionRuntime, InProcessHostRuntime, LaunchReason};
pub use worker::{ModelCatalog, ModelWorker, TokioWorkerSpawner};
