//! Worker Layer - 推理 Worker
//!
//! 实现合并的 ModelWorker、Pipeline 缓存和 Worker 的创建/崩溃监督

mod catalog;
mod model_worker;
mod pipeline_cache;
mod spawner;

pub use catalog::{ModelCatalog, ModelEntry};
pub use model_worker::{IncomingTask, ModelWorker, WorkerOutbox};
pub use pipeline_cache::PipelineCache;
pub use spawner::TokioWorkerSpawner;
