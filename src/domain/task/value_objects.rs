//! Task Context - Value Objects

use serde::{Deserialize, Serialize};

/// 任务类型
///
/// 一个合并的 Worker 按任务类型分发到对应的 Pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 文本摘要
    Summarize,
    /// 事件抽取（问答）
    ExtractEvent,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::Summarize, TaskKind::ExtractEvent];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Summarize => "summarize",
            TaskKind::ExtractEvent => "extract_event",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "summarize" => Some(TaskKind::Summarize),
            "extract_event" => Some(TaskKind::ExtractEvent),
            _ => None,
        }
    }

    /// 右键菜单项 ID
    pub fn menu_item_id(&self) -> &'static str {
        match self {
            TaskKind::Summarize => "summarizeSelectedText",
            TaskKind::ExtractEvent => "extractEventFromText",
        }
    }

    /// 右键菜单项标题
    pub fn menu_title(&self) -> &'static str {
        match self {
            TaskKind::Summarize => "Summarize (Local T5)",
            TaskKind::ExtractEvent => "Extract Event Info (Local T5)",
        }
    }

    pub fn from_menu_item(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.menu_item_id() == id)
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 关联 ID（发起请求的标签页）
///
/// 结果通过消息总线异步返回，Coordinator 只依赖这个字段把结果路由回原标签页
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(i64);

impl TabId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for TabId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务参数（可选的模板 / 问题覆盖）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_question: Option<String>,
}

impl TaskParameters {
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            prompt_template: Some(template.into()),
            prompt_question: None,
        }
    }

    pub fn with_question(question: impl Into<String>) -> Self {
        Self {
            prompt_template: None,
            prompt_question: Some(question.into()),
        }
    }
}

/// 错误发生的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPhase {
    PipelineInit,
    InputPrep,
    Inference,
    Transport,
}

impl ErrorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPhase::PipelineInit => "pipeline-init",
            ErrorPhase::InputPrep => "input-prep",
            ErrorPhase::Inference => "inference",
            ErrorPhase::Transport => "transport",
        }
    }
}

impl std::fmt::Display for ErrorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
