//! Task Context - Pipeline input / output shapes
//!
//! Pipeline 是外部推理引擎提供的不透明可调用对象，这里只固定它的输入输出契约

use serde::{Deserialize, Serialize};

/// Pipeline 输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineInput {
    /// 文本生成类任务（摘要）
    Text(String),
    /// 问答类任务
    QuestionAnswer { question: String, context: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary_text: String,
}

impl Summary {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            summary_text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Answer {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            score: None,
        }
    }
}

/// Pipeline 输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineOutput {
    Summaries(Vec<Summary>),
    Answer(Answer),
    Raw(serde_json::Value),
}
