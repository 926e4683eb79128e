//! In-Process Host Runtime - 在当前进程内托管 Host 上下文
//!
//! 每个 Host 上下文是一个运行 HostBridge 的 tokio 任务，
//! 同一时刻最多存在一个；任务结束（或被关闭）后视为不存在

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::{HostError, HostRuntimePort, MessageBusPort, WorkerSpawnerPort};
use crate::application::HostBridge;

struct HostContext {
    id: Uuid,
    document: String,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl HostContext {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }
}

pub struct InProcessHostRuntime {
    bus: Arc<dyn MessageBusPort>,
    spawner: Arc<dyn WorkerSpawnerPort>,
    context: Mutex<Option<HostContext>>,
    creations: AtomicUsize,
}

impl InProcessHostRuntime {
    pub fn new(bus: Arc<dyn MessageBusPort>, spawner: Arc<dyn WorkerSpawnerPort>) -> Self {
        Self {
            bus,
            spawner,
            context: Mutex::new(None),
            creations: AtomicUsize::new(0),
        }
    }

    /// 已创建过的 Host 数量
    pub fn creation_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    /// 关闭当前 Host，等待其退出；没有 Host 时返回 false
    pub async fn close_host(&self) -> bool {
        let context = self.lock().take();
        let Some(context) = context else {
            return false;
        };

        tracing::info!(host_id = %context.id, document = %context.document, "Closing host context");
        context.shutdown.cancel();
        if let Err(e) = context.task.await {
            tracing::warn!(host_id = %context.id, error = %e, "Host task ended abnormally");
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, Option<HostContext>> {
        self.context
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HostRuntimePort for InProcessHostRuntime {
    async fn has_host(&self, document: &str) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|context| context.document == document && context.is_alive())
    }

    async fn create_host(&self, document: &str) -> Result<(), HostError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| HostError::CreationFailed(e.to_string()))?;

        let mut guard = self.lock();
        if let Some(existing) = guard.as_ref().filter(|context| context.is_alive()) {
            return Err(HostError::AlreadyExists(existing.document.clone()));
        }

        // 先订阅再启动，创建返回后发布的消息都能被 Host 收到
        let subscription = self.bus.subscribe();
        let bridge = HostBridge::new(self.bus.clone(), self.spawner.clone());
        let shutdown = CancellationToken::new();
        let task = runtime.spawn(bridge.run(subscription, shutdown.clone()));

        let id = Uuid::new_v4();
        self.creations.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(host_id = %id, document = %document, "Host context spawned");

        *guard = Some(HostContext {
            id,
            document: document.to_string(),
            shutdown,
            task,
        });
        Ok(())
    }
}
