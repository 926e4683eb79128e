//! Task Context - TaskRequest

use super::messages::{BusMessage, ProcessText, HOST_TARGET};
use super::{TabId, TaskKind, TaskParameters};

/// 任务请求
///
/// 在 UI 触发时创建，之后不可变，由 Worker 恰好消费一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    kind: TaskKind,
    text: String,
    correlation_id: TabId,
    parameters: TaskParameters,
}

impl TaskRequest {
    pub fn new(
        kind: TaskKind,
        text: impl Into<String>,
        correlation_id: TabId,
        parameters: TaskParameters,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            correlation_id,
            parameters,
        }
    }

    pub fn summarize(text: impl Into<String>, tab_id: TabId, template: Option<String>) -> Self {
        Self::new(
            TaskKind::Summarize,
            text,
            tab_id,
            template
                .map(TaskParameters::with_template)
                .unwrap_or_default(),
        )
    }

    pub fn extract_event(text: impl Into<String>, tab_id: TabId, question: Option<String>) -> Self {
        Self::new(
            TaskKind::ExtractEvent,
            text,
            tab_id,
            question
                .map(TaskParameters::with_question)
                .unwrap_or_default(),
        )
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn correlation_id(&self) -> TabId {
        self.correlation_id
    }

    /// 转换为发往 Host 的 processText 消息
    pub fn into_message(self) -> BusMessage {
        BusMessage::ProcessText(ProcessText {
            target: HOST_TARGET.to_string(),
            task: self.kind,
            text: self.text,
            tab_id: self.correlation_id,
            prompt_template: self.parameters.prompt_template,
            prompt_question: self.parameters.prompt_question,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_message_targets_host() {
        let request = TaskRequest::extract_event(
            "Meet Monday at 5pm.",
            TabId::new(3),
            Some("Is there an event?".to_string()),
        );

        match request.into_message() {
            BusMessage::ProcessText(m) => {
                assert!(m.is_for_host());
                assert_eq!(m.task, TaskKind::ExtractEvent);
                assert_eq!(m.tab_id, TabId::new(3));
                assert_eq!(m.prompt_question.as_deref(), Some("Is there an event?"));
                assert_eq!(m.prompt_template, None);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_summarize_without_template_carries_no_parameters() {
        match TaskRequest::summarize("Text.", TabId::new(1), None).into_message() {
            BusMessage::ProcessText(m) => {
                assert_eq!(m.prompt_template, None);
                assert_eq!(m.prompt_question, None);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
