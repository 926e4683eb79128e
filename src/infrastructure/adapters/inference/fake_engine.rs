//! Fake Inference Engine - 离线可用的确定性推理引擎
//!
//! 不加载任何模型：摘要返回输入的第一句话，问答返回上下文中的第一句话。
//! 用于本地联调和没有推理服务的环境。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{InferenceEnginePort, InferenceError, Pipeline, PipelineSpec};
use crate::domain::task::{Answer, PipelineInput, PipelineOutput, Summary};

/// Fake 推理引擎配置
#[derive(Debug, Clone)]
pub struct FakeInferenceEngineConfig {
    /// 模拟模型加载耗时
    pub load_delay: Duration,
    /// 模拟推理耗时
    pub run_delay: Duration,
}

impl Default for FakeInferenceEngineConfig {
    fn default() -> Self {
        Self {
            load_delay: Duration::from_millis(500),
            run_delay: Duration::from_millis(200),
        }
    }
}

pub struct FakeInferenceEngine {
    config: FakeInferenceEngineConfig,
}

impl FakeInferenceEngine {
    pub fn new(config: FakeInferenceEngineConfig) -> Self {
        tracing::info!(
            load_delay_ms = config.load_delay.as_millis() as u64,
            "FakeInferenceEngine initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeInferenceEngineConfig::default())
    }
}

#[async_trait]
impl InferenceEnginePort for FakeInferenceEngine {
    async fn construct_pipeline(
        &self,
        spec: &PipelineSpec,
    ) -> Result<Arc<dyn Pipeline>, InferenceError> {
        let mode = match spec.task.as_str() {
            "summarization" => FakeMode::Summarize {
                max_words: spec.options.max_length.map(|n| n as usize),
            },
            "question-answering" => FakeMode::Answer,
            other => return Err(InferenceError::UnsupportedTask(other.to_string())),
        };

        tokio::time::sleep(self.config.load_delay).await;
        tracing::debug!(model = %spec.model, "FakeInferenceEngine: pipeline ready");

        Ok(Arc::new(FakePipeline {
            mode,
            run_delay: self.config.run_delay,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum FakeMode {
    Summarize { max_words: Option<usize> },
    Answer,
}

struct FakePipeline {
    mode: FakeMode,
    run_delay: Duration,
}

#[async_trait]
impl Pipeline for FakePipeline {
    async fn run(&self, input: PipelineInput) -> Result<PipelineOutput, InferenceError> {
        tokio::time::sleep(self.run_delay).await;

        match (self.mode, input) {
            (FakeMode::Summarize { max_words }, PipelineInput::Text(text)) => {
                let sentence = first_sentence(&text);
                let summary = match max_words {
                    Some(limit) => sentence.split_whitespace().take(limit).collect::<Vec<_>>().join(" "),
                    None => sentence.to_string(),
                };
                Ok(PipelineOutput::Summaries(vec![Summary::new(summary)]))
            }
            (FakeMode::Answer, PipelineInput::QuestionAnswer { context, .. }) => {
                Ok(PipelineOutput::Answer(Answer {
                    answer: first_sentence(&context).to_string(),
                    score: Some(1.0),
                }))
            }
            (mode, input) => Err(InferenceError::InvalidResponse(format!(
                "{:?} pipeline cannot take {:?}",
                mode, input
            ))),
        }
    }
}

fn first_sentence(text: &str) -> &str {
    let text = text.trim();
    match text.find(['.', '!', '?']) {
        Some(end) => &text[..=end],
        None => text,
    }
}
