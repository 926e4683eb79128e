//! Test doubles shared by unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::application::ports::{
    HostError, HostRuntimePort, InferenceEnginePort, InferenceError, Pipeline, PipelineSpec,
};
use crate::domain::task::{Answer, PipelineInput, PipelineOutput, Summary};

#[derive(Default)]
struct MockState {
    constructs: AtomicUsize,
    failing_loads: AtomicUsize,
    fail_runs: AtomicBool,
    panic_next_run: AtomicBool,
    inputs: Mutex<Vec<PipelineInput>>,
}

/// 可编排的推理引擎
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<MockState>,
    load_delay: Duration,
    summary: String,
    answer: String,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState::default()),
            load_delay: Duration::from_millis(0),
            summary: "A cat sits.".to_string(),
            answer: "Monday at 5pm".to_string(),
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// 接下来 n 次构造失败
    pub fn fail_next_loads(&self, n: usize) {
        self.state.failing_loads.store(n, Ordering::SeqCst);
    }

    pub fn fail_runs(&self) {
        self.state.fail_runs.store(true, Ordering::SeqCst);
    }

    /// 下一次调用 Pipeline 时 panic（模拟 Worker 崩溃）
    pub fn panic_next_run(&self) {
        self.state.panic_next_run.store(true, Ordering::SeqCst);
    }

    pub fn construct_count(&self) -> usize {
        self.state.constructs.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<PipelineInput> {
        self.state.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceEnginePort for MockEngine {
    async fn construct_pipeline(
        &self,
        spec: &PipelineSpec,
    ) -> Result<Arc<dyn Pipeline>, InferenceError> {
        self.state.constructs.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.load_delay).await;

        let failing = self.state.failing_loads.load(Ordering::SeqCst);
        if failing > 0 {
            self.state.failing_loads.store(failing - 1, Ordering::SeqCst);
            return Err(InferenceError::LoadFailed("model asset corrupt".to_string()));
        }

        let output = match spec.task.as_str() {
            "summarization" => PipelineOutput::Summaries(vec![Summary::new(self.summary.clone())]),
            "question-answering" => PipelineOutput::Answer(Answer::new(self.answer.clone())),
            other => return Err(InferenceError::UnsupportedTask(other.to_string())),
        };

        Ok(Arc::new(MockPipeline {
            state: self.state.clone(),
            output,
        }))
    }
}

struct MockPipeline {
    state: Arc<MockState>,
    output: PipelineOutput,
}

#[async_trait]
impl Pipeline for MockPipeline {
    async fn run(&self, input: PipelineInput) -> Result<PipelineOutput, InferenceError> {
        self.state.inputs.lock().unwrap().push(input);
        if self.state.panic_next_run.swap(false, Ordering::SeqCst) {
            panic!("out of memory in inference");
        }
        if self.state.fail_runs.load(Ordering::SeqCst) {
            return Err(InferenceError::ServiceError("tensor shape mismatch".to_string()));
        }
        Ok(self.output.clone())
    }
}

/// 计数的 Host 运行时（创建有延迟，可配置失败）
#[derive(Default)]
pub struct CountingHostRuntime {
    alive: AtomicBool,
    creations: AtomicUsize,
    failing_creations: AtomicUsize,
    delay: Duration,
}

impl CountingHostRuntime {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn fail_next_creations(&self, n: usize) {
        self.failing_creations.store(n, Ordering::SeqCst);
    }

    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    pub fn tear_down(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl HostRuntimePort for CountingHostRuntime {
    async fn has_host(&self, _document: &str) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn create_host(&self, document: &str) -> Result<(), HostError> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let failing = self.failing_creations.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_creations.store(failing - 1, Ordering::SeqCst);
            return Err(HostError::CreationFailed("renderer refused".to_string()));
        }
        if self.alive.swap(true, Ordering::SeqCst) {
            return Err(HostError::AlreadyExists(document.to_string()));
        }
        Ok(())
    }
}
