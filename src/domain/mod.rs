//! Domain Layer - 领域层
//!
//! Task Context: 任务类型、关联 ID、线上消息格式、输入准备与结果提取

pub mod task;
