//! Task Context - 任务限界上下文
//!
//! 职责:
//! - 任务请求与关联 ID
//! - 跨上下文消息格式
//! - Pipeline 输入准备与结果提取

mod errors;
mod messages;
mod pipeline_io;
mod prompt;
mod request;
mod value_objects;

pub use errors::InputError;
pub use messages::{
    BusMessage, DisplayResult, ErrorNotice, ModelLoading, ProcessText, TaskComplete, HOST_TARGET,
};
pub use pipeline_io::{Answer, PipelineInput, PipelineOutput, Summary};
pub use prompt::{
    extract_result, json_type, prepare_input, PreparedInput, TemplateFallback,
    DEFAULT_QA_QUESTION, DEFAULT_SUMMARIZE_TEMPLATE, NO_ANSWER, NO_SUMMARY, TEXT_PLACEHOLDER,
};
pub use request::TaskRequest;
pub use value_objects::{ErrorPhase, TabId, TaskKind, TaskParameters};
