//! Runtime Layer - 进程内的扩展运行时
//!
//! Host 上下文的托管与整体组装

mod extension;
mod offscreen;

pub use extension::{build_engine, ExtensionRuntime, LaunchReason};
pub use offscreen::InProcessHostRuntime;
