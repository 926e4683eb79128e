//! Task Context - Wire Messages
//!
//! 所有跨上下文的消息都是带 `type` 判别字段的结构化记录，
//! 关联 ID (`tabId`) 显式地出现在每一条需要路由的消息中

use serde::{Deserialize, Serialize};

use super::{ErrorPhase, TabId, TaskKind};

/// Host 的消息目标标识
pub const HOST_TARGET: &str = "offscreen";

/// 消息总线上的消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BusMessage {
    /// 发起任务 (Coordinator → Host → Worker)
    ProcessText(ProcessText),
    /// 任务成功 (Worker → Host → Coordinator)
    TaskComplete(TaskComplete),
    /// 任务失败或初始化失败 (Worker/Host → Coordinator)
    Error(ErrorNotice),
    /// 模型加载中（仅通知）
    ModelLoading(ModelLoading),
}

impl BusMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            BusMessage::ProcessText(_) => "processText",
            BusMessage::TaskComplete(_) => "taskComplete",
            BusMessage::Error(_) => "error",
            BusMessage::ModelLoading(_) => "modelLoading",
        }
    }

    /// 关联 ID（如果消息携带）
    pub fn tab_id(&self) -> Option<TabId> {
        match self {
            BusMessage::ProcessText(m) => Some(m.tab_id),
            BusMessage::TaskComplete(m) => m.tab_id,
            BusMessage::Error(m) => m.tab_id,
            BusMessage::ModelLoading(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessText {
    pub target: String,
    pub task: TaskKind,
    pub text: String,
    pub tab_id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_question: Option<String>,
}

impl ProcessText {
    pub fn is_for_host(&self) -> bool {
        self.target == HOST_TARGET
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComplete {
    pub task: TaskKind,
    pub result: String,
    pub label: String,
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
}

impl TaskComplete {
    pub fn to_display(&self) -> DisplayResult {
        DisplayResult {
            label: self.label.clone(),
            result: self.result.clone(),
            duration_ms: Some(self.duration_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotice {
    pub error: String,
    pub phase: ErrorPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
}

impl ErrorNotice {
    pub fn new(phase: ErrorPhase, error: impl Into<String>, tab_id: Option<TabId>) -> Self {
        Self {
            error: error.into(),
            phase,
            tab_id,
        }
    }

    pub fn transport(error: impl Into<String>) -> Self {
        Self::new(ErrorPhase::Transport, error, None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelLoading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskKind>,
}

/// 发往标签页的展示消息 (Coordinator → Tab)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "displayResult", rename_all = "camelCase")]
pub struct DisplayResult {
    pub label: String,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl DisplayResult {
    /// 渲染为弹窗文本
    pub fn render(&self) -> String {
        let title = if self.label.is_empty() {
            "Result"
        } else {
            &self.label
        };
        let mut text = format!("{}:\n\n{}", title, self.result);
        if let Some(ms) = self.duration_ms.filter(|ms| *ms > 0.0) {
            text.push_str(&format!("\n\n(Processed in {:.2} seconds)", ms / 1000.0));
        }
        text
    }
}
