//! Coordinator - 进程级单例协调者
//!
//! UI 触发任务的唯一入口：
//! - 管理 Host 上下文的生命周期（并发安全的 ensure-exists）
//! - 把任务消息发往 Host（发送后继续，不等待回复）
//! - 按消息中的关联 ID 把结果路由回原标签页

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::error::RelayError;
use crate::application::lifecycle::SingleFlight;
use crate::application::ports::{
    BusSubscription, HostRuntimePort, MenuClick, MenuItem, MenuRegistryPort, MessageBusPort,
    SettingsStorePort, TabMessengerPort,
};
use crate::domain::task::{BusMessage, DisplayResult, ErrorNotice, TabId, TaskKind, TaskRequest};

/// 错误展示时使用的标题
pub const ERROR_LABEL: &str = "Error";

/// Coordinator 配置
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Host 上下文的文档路径
    pub host_document: String,
    /// 是否把 error 消息展示给原标签页（默认只记录日志）
    pub surface_errors: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host_document: "/offscreen.html".to_string(),
            surface_errors: false,
        }
    }
}

pub struct Coordinator {
    config: CoordinatorConfig,
    bus: Arc<dyn MessageBusPort>,
    runtime: Arc<dyn HostRuntimePort>,
    tabs: Arc<dyn TabMessengerPort>,
    settings: Arc<dyn SettingsStorePort>,
    menus: Arc<dyn MenuRegistryPort>,
    host_creation: SingleFlight<()>,
}

impl Coordinator {
    pub fn new(
        config: CoordinatorConfig,
        bus: Arc<dyn MessageBusPort>,
        runtime: Arc<dyn HostRuntimePort>,
        tabs: Arc<dyn TabMessengerPort>,
        settings: Arc<dyn SettingsStorePort>,
        menus: Arc<dyn MenuRegistryPort>,
    ) -> Self {
        Self {
            config,
            bus,
            runtime,
            tabs,
            settings,
            menus,
            host_creation: SingleFlight::new(),
        }
    }

    /// 确保 Host 上下文存在
    ///
    /// 幂等且并发安全：已有创建在进行时等待同一个创建，不会重复创建。
    /// 失败只记录，不自动重试，下一个调用者会重新尝试。
    pub async fn ensure_host(&self) -> Result<(), RelayError> {
        let document = self.config.host_document.clone();
        if self.runtime.has_host(&document).await {
            return Ok(());
        }

        let runtime = self.runtime.clone();
        self.host_creation
            .run(move || async move {
                // 上一次创建可能刚刚完成
                if runtime.has_host(&document).await {
                    return Ok(());
                }

                tracing::info!(document = %document, "Creating host context...");
                match runtime.create_host(&document).await {
                    Ok(()) => {
                        tracing::info!(document = %document, "Host context created");
                        Ok(())
                    }
                    Err(e) => {
                        tracing::error!(document = %document, error = %e, "Error creating host context");
                        Err(e.to_string())
                    }
                }
            })
            .await
            .map_err(RelayError::Transport)
    }

    /// 分发任务
    ///
    /// 对 UI 来说是发送后即忘：所有失败都在这里记录并吞掉
    pub async fn dispatch(&self, request: TaskRequest) {
        let kind = request.kind();
        let tab_id = request.correlation_id();

        if let Err(e) = self.ensure_host().await {
            tracing::warn!(task = %kind, tab_id = %tab_id, error = %e, "Host unavailable, sending anyway");
        }

        tracing::info!(task = %kind, tab_id = %tab_id, "Requesting task");
        if let Err(e) = self.bus.publish(request.into_message()) {
            tracing::error!(task = %kind, tab_id = %tab_id, error = %e, "Error sending message to host");
        }
    }

    /// 处理总线消息
    pub async fn on_message(&self, message: BusMessage) {
        match message {
            BusMessage::TaskComplete(done) => match done.tab_id {
                Some(tab_id) => self.forward_to_tab(tab_id, done.to_display()).await,
                None => {
                    tracing::warn!(task = %done.task, "Task completed without tabId, dropping result");
                }
            },
            BusMessage::ModelLoading(loading) => match loading.task {
                Some(task) => tracing::info!(task = %task, "Model is loading..."),
                None => tracing::info!("Model is loading..."),
            },
            BusMessage::Error(notice) => self.on_error(notice).await,
            // 自己发出的任务消息
            BusMessage::ProcessText(_) => {}
        }
    }

    async fn on_error(&self, notice: ErrorNotice) {
        tracing::error!(
            phase = %notice.phase,
            tab_id = ?notice.tab_id,
            error = %notice.error,
            "Received error from host/worker"
        );

        if !self.config.surface_errors {
            return;
        }
        if let Some(tab_id) = notice.tab_id {
            let display = DisplayResult {
                label: ERROR_LABEL.to_string(),
                result: notice.error,
                duration_ms: None,
            };
            self.forward_to_tab(tab_id, display).await;
        }
    }

    async fn forward_to_tab(&self, tab_id: TabId, display: DisplayResult) {
        match self.tabs.send_to_tab(tab_id, display).await {
            Ok(()) => tracing::debug!(tab_id = %tab_id, "Result forwarded to tab"),
            Err(e) => {
                tracing::error!(tab_id = %tab_id, error = %e, "Could not send message to tab");
            }
        }
    }

    /// 处理右键菜单点击
    pub async fn on_menu_click(&self, click: MenuClick) {
        let (Some(tab_id), Some(text)) = (
            click.tab_id,
            click.selection_text.filter(|text| !text.is_empty()),
        ) else {
            tracing::debug!(menu_item_id = %click.menu_item_id, "Menu click without tab or selection, ignoring");
            return;
        };

        let Some(kind) = TaskKind::from_menu_item(&click.menu_item_id) else {
            tracing::debug!(menu_item_id = %click.menu_item_id, "Unknown menu item, ignoring");
            return;
        };

        let settings = match self.settings.load().await {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load settings, using worker defaults");
                None
            }
        };

        let request = match kind {
            TaskKind::Summarize => TaskRequest::summarize(
                text,
                tab_id,
                settings.map(|s| s.summarize_prompt),
            ),
            TaskKind::ExtractEvent => TaskRequest::extract_event(
                text,
                tab_id,
                settings.map(|s| s.extract_qa_question),
            ),
        };

        self.dispatch(request).await;
    }

    /// 扩展安装：注册菜单并预先创建 Host
    pub async fn on_installed(&self) {
        let items = TaskKind::ALL.into_iter().map(MenuItem::for_task).collect();
        match self.menus.replace_all(items).await {
            Ok(()) => tracing::info!("Context menus created/updated"),
            Err(e) => tracing::error!(error = %e, "Failed to register context menus"),
        }

        if let Err(e) = self.ensure_host().await {
            tracing::warn!(error = %e, "Host not ready after install");
        }
    }

    /// 扩展启动：预先创建 Host，掩盖首次使用的延迟
    pub async fn on_startup(&self) {
        if let Err(e) = self.ensure_host().await {
            tracing::warn!(error = %e, "Host not ready after startup");
        }
    }

    /// 订阅总线直到关闭
    pub async fn run(self: Arc<Self>, mut subscription: BusSubscription, shutdown: CancellationToken) {
        tracing::info!("Coordinator started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                message = subscription.recv() => match message {
                    Some(message) => self.on_message(message).await,
                    None => break,
                },
            }
        }

        tracing::info!("Coordinator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Settings;
    use crate::domain::task::{ErrorPhase, TaskComplete};
    use crate::infrastructure::events::BroadcastMessageBus;
    use crate::infrastructure::memory::{
        InMemoryMenuRegistry, InMemorySettingsStore, InMemoryTabRegistry,
    };
    use crate::test_support::CountingHostRuntime;
    use std::time::Duration;

    struct Fixture {
        coordinator: Arc<Coordinator>,
        bus: Arc<BroadcastMessageBus>,
        runtime: Arc<CountingHostRuntime>,
        tabs: Arc<InMemoryTabRegistry>,
        settings: Arc<InMemorySettingsStore>,
        menus: Arc<InMemoryMenuRegistry>,
    }

    fn fixture(config: CoordinatorConfig) -> Fixture {
        let bus = Arc::new(BroadcastMessageBus::new(16));
        let runtime = Arc::new(CountingHostRuntime::with_delay(Duration::from_millis(30)));
        let tabs = Arc::new(InMemoryTabRegistry::new());
        let settings = Arc::new(InMemorySettingsStore::default());
        let menus = Arc::new(InMemoryMenuRegistry::new());
        let coordinator = Arc::new(Coordinator::new(
            config,
            bus.clone(),
            runtime.clone(),
            tabs.clone(),
            settings.clone(),
            menus.clone(),
        ));
        Fixture {
            coordinator,
            bus,
            runtime,
            tabs,
            settings,
            menus,
        }
    }

    fn completed(tab: i64) -> BusMessage {
        BusMessage::TaskComplete(TaskComplete {
            task: TaskKind::Summarize,
            result: "A cat sits.".to_string(),
            label: "Summary (DistilBART)".to_string(),
            duration_ms: 42.5,
            tab_id: Some(TabId::new(tab)),
        })
    }

    #[tokio::test]
    async fn test_concurrent_ensure_host_creates_once() {
        let f = fixture(CoordinatorConfig::default());

        let results =
            futures_util::future::join_all((0..10).map(|_| f.coordinator.ensure_host())).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(f.runtime.creations(), 1);
    }

    #[tokio::test]
    async fn test_ensure_host_failure_is_retried_by_next_caller() {
        let f = fixture(CoordinatorConfig::default());
        f.runtime.fail_next_creations(1);

        let (a, b) = tokio::join!(f.coordinator.ensure_host(), f.coordinator.ensure_host());
        assert!(matches!(a, Err(RelayError::Transport(_))));
        assert!(matches!(b, Err(RelayError::Transport(_))));
        assert_eq!(f.runtime.creations(), 1);

        assert!(f.coordinator.ensure_host().await.is_ok());
        assert_eq!(f.runtime.creations(), 2);
    }

    #[tokio::test]
    async fn test_ensure_host_recreates_after_teardown() {
        let f = fixture(CoordinatorConfig::default());
        f.coordinator.ensure_host().await.unwrap();
        f.coordinator.ensure_host().await.unwrap();
        assert_eq!(f.runtime.creations(), 1);

        f.runtime.tear_down();
        f.coordinator.ensure_host().await.unwrap();
        assert_eq!(f.runtime.creations(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_publishes_task_for_host() {
        let f = fixture(CoordinatorConfig::default());
        let mut observer = f.bus.subscribe();

        f.coordinator
            .dispatch(TaskRequest::summarize(
                "The cat sat on the mat.",
                TabId::new(5),
                Some("summarize: {text}".to_string()),
            ))
            .await;

        match observer.recv().await {
            Some(BusMessage::ProcessText(task)) => {
                assert!(task.is_for_host());
                assert_eq!(task.tab_id, TabId::new(5));
                assert_eq!(task.prompt_template.as_deref(), Some("summarize: {text}"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(f.runtime.creations(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_listeners_does_not_fail() {
        let f = fixture(CoordinatorConfig::default());
        f.runtime.fail_next_creations(1);

        // Host 创建失败且总线无人订阅：只记录日志
        f.coordinator
            .dispatch(TaskRequest::extract_event("x", TabId::new(1), None))
            .await;
    }

    #[tokio::test]
    async fn test_task_complete_is_routed_by_tab_id() {
        let f = fixture(CoordinatorConfig::default());
        let mut tab_one = f.tabs.open_tab(TabId::new(1));
        let mut tab_two = f.tabs.open_tab(TabId::new(2));

        f.coordinator.on_message(completed(2)).await;

        let display = tab_two.recv().await.unwrap();
        assert_eq!(display.result, "A cat sits.");
        assert_eq!(display.duration_ms, Some(42.5));
        assert!(tab_one.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_result_for_closed_tab_is_swallowed() {
        let f = fixture(CoordinatorConfig::default());
        let _rx = f.tabs.open_tab(TabId::new(1));
        f.tabs.close_tab(TabId::new(1));

        f.coordinator.on_message(completed(1)).await;
        assert!(!f.tabs.is_open(TabId::new(1)));
    }

    #[tokio::test]
    async fn test_errors_are_log_only_by_default() {
        let f = fixture(CoordinatorConfig::default());
        let mut tab = f.tabs.open_tab(TabId::new(1));

        f.coordinator
            .on_message(BusMessage::Error(ErrorNotice::new(
                ErrorPhase::Inference,
                "boom",
                Some(TabId::new(1)),
            )))
            .await;

        assert!(tab.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_errors_can_be_surfaced_to_tab() {
        let f = fixture(CoordinatorConfig {
            surface_errors: true,
            ..Default::default()
        });
        let mut tab = f.tabs.open_tab(TabId::new(1));

        f.coordinator
            .on_message(BusMessage::Error(ErrorNotice::new(
                ErrorPhase::InputPrep,
                "bad input",
                Some(TabId::new(1)),
            )))
            .await;

        let display = tab.try_recv().unwrap();
        assert_eq!(display.label, ERROR_LABEL);
        assert_eq!(display.result, "bad input");
    }

    #[tokio::test]
    async fn test_menu_click_uses_saved_settings() {
        let f = fixture(CoordinatorConfig::default());
        f.settings
            .save(Settings {
                summarize_prompt: "tl;dr: {text}".to_string(),
                extract_qa_question: "When is it?".to_string(),
            })
            .await
            .unwrap();
        let mut observer = f.bus.subscribe();

        f.coordinator
            .on_menu_click(MenuClick {
                menu_item_id: "extractEventFromText".to_string(),
                selection_text: Some("Meet Monday at 5pm.".to_string()),
                tab_id: Some(TabId::new(4)),
            })
            .await;

        match observer.recv().await {
            Some(BusMessage::ProcessText(task)) => {
                assert_eq!(task.task, TaskKind::ExtractEvent);
                assert_eq!(task.prompt_question.as_deref(), Some("When is it?"));
                assert_eq!(task.prompt_template, None);
                assert_eq!(task.text, "Meet Monday at 5pm.");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_menu_click_without_selection_is_ignored() {
        let f = fixture(CoordinatorConfig::default());

        f.coordinator
            .on_menu_click(MenuClick {
                menu_item_id: "summarizeSelectedText".to_string(),
                selection_text: None,
                tab_id: Some(TabId::new(4)),
            })
            .await;
        f.coordinator
            .on_menu_click(MenuClick {
                menu_item_id: "unknown".to_string(),
                selection_text: Some("text".to_string()),
                tab_id: Some(TabId::new(4)),
            })
            .await;

        assert_eq!(f.runtime.creations(), 0);
    }

    #[tokio::test]
    async fn test_install_registers_menus_and_host() {
        let f = fixture(CoordinatorConfig::default());

        f.coordinator.on_installed().await;
        f.coordinator.on_startup().await;

        let ids: Vec<_> = f.menus.items().into_iter().map(|item| item.id).collect();
        assert_eq!(ids, vec!["extractEventFromText", "summarizeSelectedText"]);
        assert_eq!(f.runtime.creations(), 1);
    }
}
