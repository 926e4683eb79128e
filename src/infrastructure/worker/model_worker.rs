//! Model Worker - 合并的推理 Worker
//!
//! 持有按任务类型惰性构造的 Pipeline，每条消息执行一个任务：
//! 消息按到达顺序逐条处理，上一条（包括等待模型加载）完成后才读取下一条。
//! 任务中的任何失败都转换为 error 消息发出，不影响后续任务。

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::application::error::RelayError;
use crate::application::ports::{InferenceEnginePort, Pipeline, WorkerEvent};
use crate::domain::task::{
    extract_result, prepare_input, BusMessage, InputError, ModelLoading, TabId, TaskComplete,
    TaskKind,
};

use super::catalog::ModelCatalog;
use super::pipeline_cache::PipelineCache;

/// Worker 发往 Host 的出口
#[derive(Clone)]
pub struct WorkerOutbox {
    events: mpsc::UnboundedSender<WorkerEvent>,
}

impl WorkerOutbox {
    pub fn new(events: mpsc::UnboundedSender<WorkerEvent>) -> Self {
        Self { events }
    }

    pub fn post(&self, message: BusMessage) {
        let kind = message.type_name();
        if self.events.send(WorkerEvent::Message(message)).is_err() {
            tracing::warn!(message_type = kind, "Host channel closed, dropping worker message");
        }
    }
}

/// Worker 收到的任务消息
///
/// 直接通道上的数据没有经过类型检查，字段类型在准备输入时校验
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingTask {
    pub task: String,
    pub text: Value,
    pub tab_id: Option<TabId>,
    pub prompt_template: Option<Value>,
    pub prompt_question: Option<Value>,
}

impl IncomingTask {
    /// 解析 processText 消息；缺少 task / text 时返回 None
    pub fn parse(raw: &Value) -> Option<Self> {
        if raw.get("type").and_then(Value::as_str) != Some("processText") {
            return None;
        }

        let task = raw
            .get("task")
            .and_then(Value::as_str)
            .filter(|task| !task.is_empty())?;
        let text = raw.get("text").filter(|text| is_present(text))?;
        let tab_id = raw
            .get("tabId")
            .and_then(Value::as_i64)
            .map(TabId::new);

        Some(Self {
            task: task.to_string(),
            text: text.clone(),
            tab_id,
            prompt_template: raw.get("promptTemplate").cloned(),
            prompt_question: raw.get("promptQuestion").cloned(),
        })
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

pub struct ModelWorker {
    engine: Arc<dyn InferenceEnginePort>,
    catalog: Arc<ModelCatalog>,
    cache: PipelineCache,
    outbox: WorkerOutbox,
}

impl ModelWorker {
    pub fn new(
        engine: Arc<dyn InferenceEnginePort>,
        catalog: Arc<ModelCatalog>,
        outbox: WorkerOutbox,
    ) -> Self {
        Self {
            engine,
            catalog,
            cache: PipelineCache::new(),
            outbox,
        }
    }

    pub fn cache(&self) -> &PipelineCache {
        &self.cache
    }

    /// 获取任务类型对应的 Pipeline，首次访问时构造
    ///
    /// 只有发起构造的调用会发出 modelLoading 通知；构造期间到达的调用等待同一个构造
    pub async fn get_pipeline(&self, kind: TaskKind) -> Result<Arc<dyn Pipeline>, RelayError> {
        let entry = self
            .catalog
            .get(kind)
            .ok_or_else(|| RelayError::PipelineInit(format!("Unsupported task: {}", kind)))?;

        let spec = entry.spec.clone();
        let engine = self.engine.clone();
        let outbox = self.outbox.clone();

        self.cache
            .get_or_load(kind, move || async move {
                tracing::info!(task = %kind, model = %spec.model, "Initializing pipeline...");
                outbox.post(BusMessage::ModelLoading(ModelLoading { task: Some(kind) }));

                let started = Instant::now();
                match engine.construct_pipeline(&spec).await {
                    Ok(pipeline) => {
                        tracing::info!(
                            task = %kind,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Pipeline initialized"
                        );
                        Ok(pipeline)
                    }
                    Err(e) => {
                        tracing::error!(task = %kind, error = %e, "Pipeline initialization failed");
                        Err(format!("Failed to load model for task '{}': {}", kind, e))
                    }
                }
            })
            .await
            .map_err(RelayError::PipelineInit)
    }

    /// 执行单个任务
    pub async fn handle_task(&self, task: &IncomingTask) -> Result<TaskComplete, RelayError> {
        let kind = TaskKind::parse(&task.task)
            .ok_or_else(|| InputError::UnsupportedTask(task.task.clone()))?;

        // 先校验输入：非法请求不会触发模型加载
        let prepared = prepare_input(
            kind,
            &task.text,
            task.prompt_template.as_ref(),
            task.prompt_question.as_ref(),
        )?;
        if let Some(reason) = prepared.fallback {
            tracing::warn!(task = %kind, reason = %reason, "Prompt template unusable, using raw text");
        }

        let pipeline = self.get_pipeline(kind).await?;
        let label = self
            .catalog
            .get(kind)
            .map(|entry| entry.label.clone())
            .unwrap_or_else(|| "Result".to_string());

        tracing::debug!(task = %kind, input = ?prepared.input, "Starting task");
        let started = Instant::now();

        let output = pipeline.run(prepared.input).await.map_err(|e| {
            RelayError::Inference(format!(
                "Task execution failed inside worker ({}): {}",
                kind, e
            ))
        })?;

        let duration_ms = (started.elapsed().as_secs_f64() * 100_000.0).round() / 100.0;
        tracing::info!(task = %kind, tab_id = ?task.tab_id, duration_ms = duration_ms, "Task completed");
        tracing::debug!(task = %kind, output = ?output, "Raw output");

        Ok(TaskComplete {
            task: kind,
            result: extract_result(kind, &output),
            label,
            duration_ms,
            tab_id: task.tab_id,
        })
    }

    /// 处理一条消息，对合法的任务消息恰好发出一条终态消息
    pub async fn on_message(&self, raw: Value) {
        let Some(task) = IncomingTask::parse(&raw) else {
            tracing::warn!(message = %raw, "Received message missing required fields");
            return;
        };

        let terminal = match self.handle_task(&task).await {
            Ok(done) => BusMessage::TaskComplete(done),
            Err(e) => {
                tracing::error!(
                    task = %task.task,
                    tab_id = ?task.tab_id,
                    phase = %e.phase(),
                    error = %e,
                    "Error during task"
                );
                BusMessage::Error(e.to_notice(task.tab_id))
            }
        };
        self.outbox.post(terminal);
    }

    /// 逐条处理收件箱中的消息，收件箱关闭时退出
    pub async fn run(self, mut inbox: mpsc::UnboundedReceiver<Value>) {
        tracing::info!("Model worker ready and listening");
        while let Some(raw) = inbox.recv().await {
            self.on_message(raw).await;
        }
        tracing::info!("Model worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::SlotStatus;
    use crate::domain::task::{ErrorPhase, PipelineInput};
    use crate::test_support::MockEngine;
    use serde_json::json;
    use std::time::Duration;

    fn worker(engine: MockEngine) -> (Arc<ModelWorker>, mpsc::UnboundedReceiver<WorkerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = ModelWorker::new(
            Arc::new(engine),
            Arc::new(ModelCatalog::default()),
            WorkerOutbox::new(tx),
        );
        (Arc::new(worker), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<WorkerEvent>) -> Vec<BusMessage> {
        let mut messages = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                WorkerEvent::Message(message) => messages.push(message),
                WorkerEvent::Crashed(reason) => panic!("unexpected crash: {}", reason),
            }
        }
        messages
    }

    #[tokio::test]
    async fn test_concurrent_get_pipeline_constructs_once() {
        let engine = MockEngine::new().with_load_delay(Duration::from_millis(30));
        let (worker, mut rx) = worker(engine.clone());

        let (a, b) = tokio::join!(
            worker.get_pipeline(TaskKind::Summarize),
            worker.get_pipeline(TaskKind::Summarize)
        );

        assert!(a.is_ok());
        assert!(b.is_ok());
        assert_eq!(engine.construct_count(), 1);
        assert_eq!(worker.cache().status(TaskKind::Summarize), SlotStatus::Ready);

        let loading: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|m| matches!(m, BusMessage::ModelLoading(_)))
            .collect();
        assert_eq!(loading.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_construction_is_shared_then_retried() {
        let engine = MockEngine::new().with_load_delay(Duration::from_millis(30));
        engine.fail_next_loads(1);
        let (worker, _rx) = worker(engine.clone());

        let (a, b) = tokio::join!(
            worker.get_pipeline(TaskKind::ExtractEvent),
            worker.get_pipeline(TaskKind::ExtractEvent)
        );
        assert!(matches!(a, Err(RelayError::PipelineInit(_))));
        assert!(matches!(b, Err(RelayError::PipelineInit(_))));
        assert_eq!(engine.construct_count(), 1);
        assert_eq!(worker.cache().status(TaskKind::ExtractEvent), SlotStatus::Empty);

        assert!(worker.get_pipeline(TaskKind::ExtractEvent).await.is_ok());
        assert_eq!(engine.construct_count(), 2);
    }

    #[tokio::test]
    async fn test_summarize_task_round_trip() {
        let engine = MockEngine::new();
        let (worker, mut rx) = worker(engine.clone());

        worker
            .on_message(json!({
                "type": "processText",
                "target": "offscreen",
                "task": "summarize",
                "text": "The cat sat on the mat.",
                "tabId": 12,
                "promptTemplate": "summarize: {text}"
            }))
            .await;

        assert_eq!(
            engine.inputs(),
            vec![PipelineInput::Text("summarize: The cat sat on the mat.".to_string())]
        );

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], BusMessage::ModelLoading(_)));
        match &messages[1] {
            BusMessage::TaskComplete(done) => {
                assert_eq!(done.result, "A cat sits.");
                assert!(done.label.contains("Summary"));
                assert_eq!(done.tab_id, Some(TabId::new(12)));
                assert!(done.duration_ms >= 0.0);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extract_event_task_round_trip() {
        let engine = MockEngine::new();
        let (worker, mut rx) = worker(engine.clone());

        worker
            .on_message(json!({
                "type": "processText",
                "task": "extract_event",
                "text": "Meet Monday at 5pm.",
                "tabId": 3,
                "promptQuestion": "Is there an event?"
            }))
            .await;

        assert_eq!(
            engine.inputs(),
            vec![PipelineInput::QuestionAnswer {
                question: "Is there an event?".to_string(),
                context: "Meet Monday at 5pm.".to_string(),
            }]
        );
        match drain(&mut rx).last() {
            Some(BusMessage::TaskComplete(done)) => {
                assert_eq!(done.result, "Monday at 5pm");
                assert_eq!(done.label, "Event QA Result");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_string_question_is_rejected_before_inference() {
        let engine = MockEngine::new();
        let (worker, mut rx) = worker(engine.clone());

        worker
            .on_message(json!({
                "type": "processText",
                "task": "extract_event",
                "text": "Meet Monday at 5pm.",
                "tabId": 9,
                "promptQuestion": {"nested": true}
            }))
            .await;

        assert!(engine.inputs().is_empty());
        assert_eq!(engine.construct_count(), 0);

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            BusMessage::Error(notice) => {
                assert_eq!(notice.phase, ErrorPhase::InputPrep);
                assert_eq!(notice.tab_id, Some(TabId::new(9)));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pipeline_init_failure_reports_once_with_tab() {
        let engine = MockEngine::new();
        engine.fail_next_loads(1);
        let (worker, mut rx) = worker(engine.clone());

        worker
            .on_message(json!({
                "type": "processText",
                "task": "summarize",
                "text": "abc",
                "tabId": 5
            }))
            .await;

        let errors: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|m| match m {
                BusMessage::Error(notice) => Some(notice),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].phase, ErrorPhase::PipelineInit);
        assert_eq!(errors[0].tab_id, Some(TabId::new(5)));
        assert!(errors[0].error.contains("Failed to load model"));
    }

    #[tokio::test]
    async fn test_inference_failure_keeps_worker_usable() {
        let engine = MockEngine::new();
        engine.fail_runs();
        let (worker, mut rx) = worker(engine.clone());

        let task = json!({"type": "processText", "task": "summarize", "text": "abc", "tabId": 1});
        worker.on_message(task.clone()).await;
        worker.on_message(task).await;

        let errors: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter_map(|m| match m {
                BusMessage::Error(notice) => Some(notice.phase),
                _ => None,
            })
            .collect();
        assert_eq!(errors, vec![ErrorPhase::Inference, ErrorPhase::Inference]);
        assert_eq!(engine.construct_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_task_is_input_error() {
        let (worker, mut rx) = worker(MockEngine::new());

        worker
            .on_message(json!({"type": "processText", "task": "translate", "text": "abc", "tabId": 2}))
            .await;

        match drain(&mut rx).as_slice() {
            [BusMessage::Error(notice)] => {
                assert_eq!(notice.phase, ErrorPhase::InputPrep);
                assert_eq!(notice.error, "Unsupported task: translate");
            }
            other => panic!("unexpected messages: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_messages_missing_fields_are_dropped() {
        let (worker, mut rx) = worker(MockEngine::new());

        worker
            .on_message(json!({"type": "processText", "task": "summarize", "text": ""}))
            .await;
        worker.on_message(json!({"type": "modelLoading"})).await;

        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_parse_incoming_task() {
        let task = IncomingTask::parse(&json!({
            "type": "processText",
            "task": "summarize",
            "text": "hi",
            "tabId": 44
        }))
        .unwrap();

        assert_eq!(task.task, "summarize");
        assert_eq!(task.tab_id, Some(TabId::new(44)));
        assert_eq!(task.prompt_template, None);
    }
}
