//! Worker Spawner - 在 tokio 任务中运行 ModelWorker
//!
//! 每个 Worker 有一个监督任务：Worker panic 时发出 Crashed 事件

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{
    InferenceEnginePort, WorkerChannel, WorkerError, WorkerEvent, WorkerSpawnerPort,
};

use super::catalog::ModelCatalog;
use super::model_worker::{ModelWorker, WorkerOutbox};

pub struct TokioWorkerSpawner {
    engine: Arc<dyn InferenceEnginePort>,
    catalog: Arc<ModelCatalog>,
}

impl TokioWorkerSpawner {
    pub fn new(engine: Arc<dyn InferenceEnginePort>, catalog: Arc<ModelCatalog>) -> Self {
        Self { engine, catalog }
    }
}

#[async_trait]
impl WorkerSpawnerPort for TokioWorkerSpawner {
    async fn spawn(&self) -> Result<WorkerChannel, WorkerError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| WorkerError::SpawnFailed(e.to_string()))?;

        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let worker = ModelWorker::new(
            self.engine.clone(),
            self.catalog.clone(),
            WorkerOutbox::new(event_tx.clone()),
        );
        let task = runtime.spawn(worker.run(inbox_rx));

        runtime.spawn(async move {
            if let Err(e) = task.await {
                let reason = if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    "worker task cancelled".to_string()
                };
                let _ = event_tx.send(WorkerEvent::Crashed(reason));
            }
        });

        Ok(WorkerChannel {
            inbox: inbox_tx,
            events: event_rx,
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Worker error occurred".to_string()
    }
}
