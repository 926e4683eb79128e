//! Inference Engine Port - 推理引擎抽象
//!
//! 推理引擎是外部协作者：`construct_pipeline` 构造开销大（网络/磁盘加载），
//! 构造出的 Pipeline 是一个把任务输入映射为任务输出的异步可调用对象

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::task::{PipelineInput, PipelineOutput};

/// 推理错误
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Model load failed: {0}")]
    LoadFailed(String),

    #[error("Unsupported task: {0}")]
    UnsupportedTask(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 生成参数（摘要类模型使用）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_beams: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stopping: Option<bool>,
}

/// Pipeline 构造参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// 引擎侧的任务名（如 `summarization`、`question-answering`）
    pub task: String,
    /// 固定的模型标识
    pub model: String,
    #[serde(default)]
    pub options: PipelineOptions,
}

/// 已构造的 Pipeline
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn run(&self, input: PipelineInput) -> Result<PipelineOutput, InferenceError>;
}

/// Inference Engine Port
#[async_trait]
pub trait InferenceEnginePort: Send + Sync {
    /// 构造 Pipeline（慢且可能失败）
    async fn construct_pipeline(
        &self,
        spec: &PipelineSpec,
    ) -> Result<Arc<dyn Pipeline>, InferenceError>;

    /// 检查推理引擎是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
