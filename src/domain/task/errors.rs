//! Task Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Input text must be a string, got {0}")]
    TextNotString(&'static str),

    #[error("QA input type error: question is {question}, context is {context}")]
    QaTypeMismatch {
        question: &'static str,
        context: &'static str,
    },

    #[error("Unsupported task: {0}")]
    UnsupportedTask(String),
}
