//! Settings Store Port - 用户设置
//!
//! 键值存储，读取时与默认值合并

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::task::{DEFAULT_QA_QUESTION, DEFAULT_SUMMARIZE_TEMPLATE};

pub const SUMMARIZE_PROMPT_KEY: &str = "summarizePrompt";
pub const EXTRACT_QA_QUESTION_KEY: &str = "extractQaQuestion";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Failed to parse settings: {0}")]
    Parse(String),

    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

/// 用户设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub summarize_prompt: String,
    pub extract_qa_question: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            summarize_prompt: DEFAULT_SUMMARIZE_TEMPLATE.to_string(),
            extract_qa_question: DEFAULT_QA_QUESTION.to_string(),
        }
    }
}

impl Settings {
    /// 空值回退到默认值（与设置页保存逻辑一致）
    pub fn or_defaults(self, defaults: &Settings) -> Settings {
        Settings {
            summarize_prompt: non_empty_or(self.summarize_prompt, &defaults.summarize_prompt),
            extract_qa_question: non_empty_or(
                self.extract_qa_question,
                &defaults.extract_qa_question,
            ),
        }
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Settings Store Port
#[async_trait]
pub trait SettingsStorePort: Send + Sync {
    /// 读取设置（缺失的键使用默认值）
    async fn load(&self) -> Result<Settings, SettingsError>;

    /// 保存设置
    async fn save(&self, settings: Settings) -> Result<(), SettingsError>;
}
