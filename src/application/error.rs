//! 应用层错误定义
//!
//! 每个变体对应一个错误阶段，最终都会被转换为 `error` 消息，而不是让上下文崩溃

use thiserror::Error;

use crate::domain::task::{ErrorNotice, ErrorPhase, InputError, TabId};

/// 应用层错误
#[derive(Debug, Clone, Error)]
pub enum RelayError {
    /// 模型构造失败（网络、资源损坏、不支持的任务）
    #[error("{0}")]
    PipelineInit(String),

    /// 任务输入不合法
    #[error("{0}")]
    InputPrep(#[from] InputError),

    /// Pipeline 调用失败
    #[error("{0}")]
    Inference(String),

    /// Host / Worker 不可达或已崩溃
    #[error("{0}")]
    Transport(String),
}

impl RelayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn phase(&self) -> ErrorPhase {
        match self {
            RelayError::PipelineInit(_) => ErrorPhase::PipelineInit,
            RelayError::InputPrep(_) => ErrorPhase::InputPrep,
            RelayError::Inference(_) => ErrorPhase::Inference,
            RelayError::Transport(_) => ErrorPhase::Transport,
        }
    }

    /// 转换为总线上的 error 消息
    pub fn to_notice(&self, tab_id: Option<TabId>) -> ErrorNotice {
        ErrorNotice::new(self.phase(), self.to_string(), tab_id)
    }
}
