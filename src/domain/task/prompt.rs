//! Task Context - Input preparation and result extraction
//!
//! 把请求文本整理成任务形状的 Pipeline 输入，并从输出中取出任务相关的字段。
//! Worker 收到的是未经类型检查的结构化数据，所以这里对字段类型做显式校验。

use serde_json::Value;

use super::errors::InputError;
use super::pipeline_io::{PipelineInput, PipelineOutput};
use super::TaskKind;

pub const TEXT_PLACEHOLDER: &str = "{text}";
pub const DEFAULT_SUMMARIZE_TEMPLATE: &str = "summarize: {text}";
pub const DEFAULT_QA_QUESTION: &str = "Is there an event in the text? If yes, give me details";
pub const NO_SUMMARY: &str = "[!] No summary text generated.";
pub const NO_ANSWER: &str = "[!] No answer found.";

/// 模板回退原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFallback {
    /// 模板不是字符串
    NotText,
    /// 模板中没有 `{text}` 占位符
    MissingPlaceholder,
}

impl std::fmt::Display for TemplateFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateFallback::NotText => f.write_str("template is not a string"),
            TemplateFallback::MissingPlaceholder => {
                write!(f, "template has no {} placeholder", TEXT_PLACEHOLDER)
            }
        }
    }
}

/// 准备好的 Pipeline 输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedInput {
    pub input: PipelineInput,
    /// 摘要模板不可用时记录回退原因（警告，不是错误）
    pub fallback: Option<TemplateFallback>,
}

/// 按任务类型准备 Pipeline 输入
///
/// - 摘要：把文本代入模板中的第一个 `{text}`，模板缺失时使用默认模板，
///   模板格式错误时回退到原文
/// - 问答：构造 `{question, context}`，两者都必须是字符串
pub fn prepare_input(
    kind: TaskKind,
    text: &Value,
    template: Option<&Value>,
    question: Option<&Value>,
) -> Result<PreparedInput, InputError> {
    match kind {
        TaskKind::Summarize => {
            let text = text
                .as_str()
                .ok_or_else(|| InputError::TextNotString(json_type(text)))?;
            Ok(fill_template(template, text))
        }
        TaskKind::ExtractEvent => {
            let question = match question {
                None | Some(Value::Null) => Value::String(DEFAULT_QA_QUESTION.to_string()),
                Some(Value::String(q)) if q.is_empty() => {
                    Value::String(DEFAULT_QA_QUESTION.to_string())
                }
                Some(q) => q.clone(),
            };
            match (question.as_str(), text.as_str()) {
                (Some(question), Some(context)) => Ok(PreparedInput {
                    input: PipelineInput::QuestionAnswer {
                        question: question.to_string(),
                        context: context.to_string(),
                    },
                    fallback: None,
                }),
                _ => Err(InputError::QaTypeMismatch {
                    question: json_type(&question),
                    context: json_type(text),
                }),
            }
        }
    }
}

fn fill_template(template: Option<&Value>, text: &str) -> PreparedInput {
    let template = match template {
        None | Some(Value::Null) => DEFAULT_SUMMARIZE_TEMPLATE,
        Some(Value::String(t)) if t.is_empty() => DEFAULT_SUMMARIZE_TEMPLATE,
        Some(Value::String(t)) => t.as_str(),
        Some(_) => return raw_text(text, TemplateFallback::NotText),
    };

    if !template.contains(TEXT_PLACEHOLDER) {
        return raw_text(text, TemplateFallback::MissingPlaceholder);
    }

    PreparedInput {
        input: PipelineInput::Text(template.replacen(TEXT_PLACEHOLDER, text, 1)),
        fallback: None,
    }
}

fn raw_text(text: &str, reason: TemplateFallback) -> PreparedInput {
    PreparedInput {
        input: PipelineInput::Text(text.to_string()),
        fallback: Some(reason),
    }
}

/// 从 Pipeline 输出中取出任务相关的结果文本
pub fn extract_result(kind: TaskKind, output: &PipelineOutput) -> String {
    match (kind, output) {
        (TaskKind::Summarize, PipelineOutput::Summaries(summaries)) => summaries
            .first()
            .map(|s| s.summary_text.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NO_SUMMARY.to_string()),
        (TaskKind::Summarize, _) => NO_SUMMARY.to_string(),
        (TaskKind::ExtractEvent, PipelineOutput::Answer(answer)) if !answer.answer.is_empty() => {
            answer.answer.clone()
        }
        (TaskKind::ExtractEvent, _) => NO_ANSWER.to_string(),
    }
}

/// JSON 值的类型名（用于错误信息）
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
