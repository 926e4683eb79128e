//! Extension Runtime - 组装并驱动整个扩展
//!
//! 持有消息总线、Host 运行时、标签页、设置与菜单，
//! 负责启动 Coordinator 的总线循环以及关闭时的清理

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    InferenceEnginePort, InferenceError, MenuClick, MessageBusPort, Settings, SettingsError,
    SettingsStorePort,
};
use crate::application::{Coordinator, CoordinatorConfig};
use crate::config::{AppConfig, InferenceBackend, InferenceConfig};
use crate::domain::task::{TabId, TaskKind};
use crate::infrastructure::adapters::{
    FakeInferenceEngine, FakeInferenceEngineConfig, HttpInferenceEngine,
    HttpInferenceEngineConfig,
};
use crate::infrastructure::events::BroadcastMessageBus;
use crate::infrastructure::memory::{InMemoryMenuRegistry, InMemoryTabRegistry};
use crate::infrastructure::persistence::FileSettingsStore;
use crate::infrastructure::worker::{ModelCatalog, TokioWorkerSpawner};

use super::offscreen::InProcessHostRuntime;

/// 启动原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchReason {
    /// 首次安装或更新：注册菜单并预创建 Host
    Installed,
    /// 浏览器启动：只预创建 Host
    Startup,
}

/// 按配置构建推理引擎
pub fn build_engine(config: &InferenceConfig) -> Result<Arc<dyn InferenceEnginePort>, InferenceError> {
    match config.backend {
        InferenceBackend::Http => {
            let engine = HttpInferenceEngine::new(
                HttpInferenceEngineConfig::new(config.url.clone())
                    .with_timeout(config.timeout_secs),
            )?;
            Ok(Arc::new(engine))
        }
        InferenceBackend::Fake => Ok(Arc::new(FakeInferenceEngine::new(
            FakeInferenceEngineConfig {
                load_delay: Duration::from_millis(config.load_delay_ms),
                ..Default::default()
            },
        ))),
    }
}

pub struct ExtensionRuntime {
    bus: Arc<BroadcastMessageBus>,
    host_runtime: Arc<InProcessHostRuntime>,
    tabs: Arc<InMemoryTabRegistry>,
    settings: Arc<dyn SettingsStorePort>,
    menus: Arc<InMemoryMenuRegistry>,
    coordinator: Arc<Coordinator>,
    shutdown: CancellationToken,
    coordinator_task: Mutex<Option<JoinHandle<()>>>,
}

impl ExtensionRuntime {
    pub fn new(
        config: &AppConfig,
        engine: Arc<dyn InferenceEnginePort>,
        settings: Arc<dyn SettingsStorePort>,
    ) -> Self {
        let bus = BroadcastMessageBus::new(config.runtime.bus_capacity).arc();
        let catalog = Arc::new(ModelCatalog::from_config(&config.models));
        let spawner = Arc::new(TokioWorkerSpawner::new(engine, catalog));
        let host_runtime = Arc::new(InProcessHostRuntime::new(bus.clone(), spawner));
        let tabs = InMemoryTabRegistry::new().arc();
        let menus = Arc::new(InMemoryMenuRegistry::new());

        let coordinator = Arc::new(Coordinator::new(
            CoordinatorConfig {
                host_document: config.runtime.host_document.clone(),
                surface_errors: config.runtime.surface_errors,
            },
            bus.clone(),
            host_runtime.clone(),
            tabs.clone(),
            settings.clone(),
            menus.clone(),
        ));

        Self {
            bus,
            host_runtime,
            tabs,
            settings,
            menus,
            coordinator,
            shutdown: CancellationToken::new(),
            coordinator_task: Mutex::new(None),
        }
    }

    /// 使用配置中的设置文件
    pub fn with_file_settings(config: &AppConfig, engine: Arc<dyn InferenceEnginePort>) -> Self {
        let settings = Arc::new(FileSettingsStore::new(
            config.settings.path.clone(),
            config.settings.defaults(),
        ));
        Self::new(config, engine, settings)
    }

    /// 启动 Coordinator 的总线循环，并执行对应的生命周期钩子
    pub async fn start(&self, reason: LaunchReason) {
        {
            let mut task = self
                .coordinator_task
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if task.is_none() {
                let subscription = self.bus.subscribe();
                *task = Some(tokio::spawn(
                    self.coordinator
                        .clone()
                        .run(subscription, self.shutdown.child_token()),
                ));
            }
        }

        tracing::info!(reason = ?reason, "Extension runtime started");
        match reason {
            LaunchReason::Installed => self.coordinator.on_installed().await,
            LaunchReason::Startup => self.coordinator.on_startup().await,
        }
    }

    /// 模拟用户在选区右键菜单上点击
    pub async fn click_menu(&self, kind: TaskKind, selection: impl Into<String>, tab_id: TabId) {
        self.coordinator
            .on_menu_click(MenuClick {
                menu_item_id: kind.menu_item_id().to_string(),
                selection_text: Some(selection.into()),
                tab_id: Some(tab_id),
            })
            .await;
    }

    /// 设置页保存
    pub async fn save_settings(&self, settings: Settings) -> Result<(), SettingsError> {
        self.settings.save(settings).await
    }

    pub fn bus(&self) -> &Arc<BroadcastMessageBus> {
        &self.bus
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn tabs(&self) -> &Arc<InMemoryTabRegistry> {
        &self.tabs
    }

    pub fn menus(&self) -> &Arc<InMemoryMenuRegistry> {
        &self.menus
    }

    pub fn host_runtime(&self) -> &Arc<InProcessHostRuntime> {
        &self.host_runtime
    }

    /// 停止 Coordinator 并关闭 Host（Worker 随之释放）
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down extension runtime...");
        self.shutdown.cancel();

        let task = self
            .coordinator_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Coordinator task ended abnormally");
            }
        }

        self.host_runtime.close_host().await;
        tracing::info!("Extension runtime stopped");
    }
}
