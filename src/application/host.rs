//! Host Bridge - 后台宿主上下文
//!
//! 总线（Coordinator 侧）与 Worker 直接通道之间的转发桥，不承载业务逻辑：
//! - 把发给 Host 的任务消息转发给 Worker（按需创建）
//! - 把 Worker 发出的消息原样发布到总线
//! - Worker 崩溃时发布 transport 错误并清空句柄，下一个请求会重建 Worker

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::error::RelayError;
use crate::application::lifecycle::{LazySlot, SlotStatus};
use crate::application::ports::{
    BusSubscription, MessageBusPort, WorkerEvent, WorkerSpawnerPort,
};
use crate::domain::task::{BusMessage, ErrorNotice};

/// Worker 句柄
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    pub id: Uuid,
    inbox: mpsc::UnboundedSender<serde_json::Value>,
}

impl WorkerHandle {
    /// 向 Worker 投递消息；Worker 已退出时失败
    pub fn post(&self, message: serde_json::Value) -> Result<(), RelayError> {
        self.inbox
            .send(message)
            .map_err(|_| RelayError::transport("Error posting message to worker: worker is gone"))
    }
}

pub struct HostBridge {
    bus: Arc<dyn MessageBusPort>,
    spawner: Arc<dyn WorkerSpawnerPort>,
    worker: Arc<LazySlot<WorkerHandle>>,
}

impl HostBridge {
    pub fn new(bus: Arc<dyn MessageBusPort>, spawner: Arc<dyn WorkerSpawnerPort>) -> Self {
        Self {
            bus,
            spawner,
            worker: Arc::new(LazySlot::new()),
        }
    }

    pub fn worker_status(&self) -> SlotStatus {
        self.worker.status()
    }

    /// 获取 Worker，不存在时创建
    pub async fn get_or_create_worker(&self) -> Result<WorkerHandle, RelayError> {
        let bus = self.bus.clone();
        let spawner = self.spawner.clone();
        let slot = Arc::downgrade(&self.worker);

        self.worker
            .get_or_init(move || async move {
                tracing::info!("Creating model worker...");
                let channel = spawner.spawn().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to create model worker");
                    format!("Failed to create worker in host context: {}", e)
                })?;

                let id = Uuid::new_v4();
                tokio::spawn(forward_worker_events(id, channel.events, bus, slot));

                tracing::info!(worker_id = %id, "Model worker created and listeners attached");
                Ok(WorkerHandle {
                    id,
                    inbox: channel.inbox,
                })
            })
            .await
            .map_err(RelayError::Transport)
    }

    /// 处理总线消息：只转发明确发给 Host 的任务消息
    pub async fn on_message(&self, message: BusMessage) {
        let BusMessage::ProcessText(task) = &message else {
            return;
        };
        if !task.is_for_host() {
            return;
        }

        let worker = match self.get_or_create_worker().await {
            Ok(worker) => worker,
            Err(e) => {
                tracing::error!(error = %e, "Model worker instance not available");
                self.publish(ErrorNotice::transport(format!(
                    "Worker instance not available in host context: {}",
                    e
                )));
                return;
            }
        };

        let payload = match serde_json::to_value(&message) {
            Ok(payload) => payload,
            Err(e) => {
                self.publish(ErrorNotice::transport(format!(
                    "Error encoding message for worker: {}",
                    e
                )));
                return;
            }
        };

        if let Err(e) = worker.post(payload) {
            tracing::error!(worker_id = %worker.id, error = %e, "Error posting message to model worker");
            self.worker.invalidate_if(|current| current.id == worker.id);
            self.publish(e.to_notice(Some(task.tab_id)));
        }
    }

    fn publish(&self, notice: ErrorNotice) {
        if let Err(e) = self.bus.publish(BusMessage::Error(notice)) {
            tracing::warn!(error = %e, "Failed to publish error notice");
        }
    }

    /// 订阅总线直到关闭；退出时释放 Worker
    pub async fn run(self, mut subscription: BusSubscription, shutdown: CancellationToken) {
        tracing::info!("Host started and listening");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                message = subscription.recv() => match message {
                    Some(message) => self.on_message(message).await,
                    None => break,
                },
            }
        }

        // 丢弃句柄会关闭 Worker 的收件箱，Worker 随之退出
        if let Some(worker) = self.worker.invalidate() {
            tracing::debug!(worker_id = %worker.id, "Releasing model worker");
        }
        tracing::info!("Host stopped");
    }
}

/// 把 Worker 事件转发到总线，直到 Worker 退出
async fn forward_worker_events(
    id: Uuid,
    mut events: mpsc::UnboundedReceiver<WorkerEvent>,
    bus: Arc<dyn MessageBusPort>,
    slot: std::sync::Weak<LazySlot<WorkerHandle>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            WorkerEvent::Message(message) => {
                if let Err(e) = bus.publish(message) {
                    tracing::warn!(worker_id = %id, error = %e, "Failed to forward worker message");
                }
            }
            WorkerEvent::Crashed(reason) => {
                tracing::error!(worker_id = %id, reason = %reason, "Model worker crashed");
                if let Some(slot) = slot.upgrade() {
                    slot.invalidate_if(|current| current.id == id);
                }
                let notice = ErrorNotice::transport(format!("Worker onerror: {}", reason));
                if let Err(e) = bus.publish(BusMessage::Error(notice)) {
                    tracing::warn!(worker_id = %id, error = %e, "Failed to publish worker crash");
                }
                break;
            }
        }
    }
    tracing::debug!(worker_id = %id, "Worker event stream closed");
}
