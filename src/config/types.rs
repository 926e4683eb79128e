//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::{PipelineOptions, PipelineSpec, Settings};
use crate::domain::task::{DEFAULT_QA_QUESTION, DEFAULT_SUMMARIZE_TEMPLATE};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 运行时配置
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// 推理引擎配置
    #[serde(default)]
    pub inference: InferenceConfig,

    /// 模型配置
    #[serde(default)]
    pub models: ModelsConfig,

    /// 用户设置
    #[serde(default)]
    pub settings: SettingsConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 运行时配置
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Host 上下文的文档路径
    #[serde(default = "default_host_document")]
    pub host_document: String,

    /// 消息总线缓冲容量
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// 是否把 error 消息展示给原标签页（默认只记录日志）
    #[serde(default)]
    pub surface_errors: bool,
}

fn default_host_document() -> String {
    "/offscreen.html".to_string()
}

fn default_bus_capacity() -> usize {
    100
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            host_document: default_host_document(),
            bus_capacity: default_bus_capacity(),
            surface_errors: false,
        }
    }
}

/// 推理后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceBackend {
    /// 本地 HTTP 推理服务
    #[default]
    Http,
    /// 离线的确定性引擎
    Fake,
}

/// 推理引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub backend: InferenceBackend,

    /// 推理服务基础 URL
    #[serde(default = "default_inference_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,

    /// Fake 引擎的模拟加载耗时（毫秒）
    #[serde(default = "default_load_delay")]
    pub load_delay_ms: u64,
}

fn default_inference_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_inference_timeout() -> u64 {
    120
}

fn default_load_delay() -> u64 {
    500
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::default(),
            url: default_inference_url(),
            timeout_secs: default_inference_timeout(),
            load_delay_ms: default_load_delay(),
        }
    }
}

/// 单个模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// 引擎侧任务名
    pub task: String,
    /// 模型标识
    pub model: String,
    /// 结果标题
    pub label: String,
    #[serde(default)]
    pub options: PipelineOptions,
}

impl ModelConfig {
    pub fn pipeline_spec(&self) -> PipelineSpec {
        PipelineSpec {
            task: self.task.clone(),
            model: self.model.clone(),
            options: self.options.clone(),
        }
    }
}

/// 模型配置（每个任务类型一个固定模型）
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_summarize_model")]
    pub summarize: ModelConfig,

    #[serde(default = "default_extract_event_model")]
    pub extract_event: ModelConfig,
}

fn default_summarize_model() -> ModelConfig {
    ModelConfig {
        task: "summarization".to_string(),
        model: "Xenova/distilbart-cnn-6-6".to_string(),
        label: "Summary (DistilBART)".to_string(),
        options: PipelineOptions {
            max_length: Some(150),
            min_length: Some(30), // 摘要保持较长的最小长度
            num_beams: Some(4),
            early_stopping: Some(true),
        },
    }
}

fn default_extract_event_model() -> ModelConfig {
    ModelConfig {
        task: "question-answering".to_string(),
        model: "Xenova/distilbert-base-uncased-distilled-squad".to_string(),
        label: "Event QA Result".to_string(),
        options: PipelineOptions::default(),
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            summarize: default_summarize_model(),
            extract_event: default_extract_event_model(),
        }
    }
}

/// 用户设置配置
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    /// 设置文件路径
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,

    /// 默认摘要模板
    #[serde(default = "default_summarize_prompt")]
    pub summarize_prompt: String,

    /// 默认事件问题
    #[serde(default = "default_extract_qa_question")]
    pub extract_qa_question: String,
}

fn default_settings_path() -> PathBuf {
    PathBuf::from("data/settings.toml")
}

fn default_summarize_prompt() -> String {
    DEFAULT_SUMMARIZE_TEMPLATE.to_string()
}

fn default_extract_qa_question() -> String {
    DEFAULT_QA_QUESTION.to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
            summarize_prompt: default_summarize_prompt(),
            extract_qa_question: default_extract_qa_question(),
        }
    }
}

impl SettingsConfig {
    /// 设置默认值
    pub fn defaults(&self) -> Settings {
        Settings {
            summarize_prompt: self.summarize_prompt.clone(),
            extract_qa_question: self.extract_qa_question.clone(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
