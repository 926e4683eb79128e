//! TextLens - 本地联调入口
//!
//! 启动完整的 Coordinator → Host → Worker 链路，打开一个控制台标签页，
//! 从标准输入读取选中文本：
//! - `summarize: <text>` 或普通文本：摘要
//! - `event: <text>`：提取事件信息

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use textlens::config::{load_config, print_config};
use textlens::domain::task::{TabId, TaskKind};
use textlens::infrastructure::runtime::{build_engine, ExtensionRuntime, LaunchReason};

/// 控制台标签页
const CONSOLE_TAB: i64 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},textlens={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("TextLens - local text tasks");
    print_config(&config);

    // 创建推理引擎
    let engine = build_engine(&config.inference)?;
    if !engine.health_check().await {
        tracing::warn!(url = %config.inference.url, "Inference engine is not reachable, tasks will fail until it is");
    }

    let runtime = Arc::new(ExtensionRuntime::with_file_settings(&config, engine));
    runtime.start(LaunchReason::Installed).await;

    // 控制台标签页：打印收到的结果
    let tab_id = TabId::new(CONSOLE_TAB);
    let mut tab = runtime.tabs().open_tab(tab_id);
    let printer = tokio::spawn(async move {
        while let Some(display) = tab.recv().await {
            println!("\n{}\n", display.render());
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tracing::info!("Type text to summarize, or prefix with 'event:' to extract event info");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received shutdown signal");
                break;
            }
            line = lines.next_line() => match read_input(line) {
                Input::Task(kind, text) => runtime.click_menu(kind, text, tab_id).await,
                Input::Empty => continue,
                // 读取失败也走关闭流程
                Input::Closed => break,
            },
        }
    }

    runtime.shutdown().await;
    runtime.tabs().close_tab(tab_id);
    printer.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// 一行标准输入的处理结果
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Task(TaskKind, String),
    Empty,
    Closed,
}

fn read_input(line: std::io::Result<Option<String>>) -> Input {
    match line {
        Ok(Some(line)) => {
            let (kind, text) = parse_line(&line);
            if text.is_empty() {
                Input::Empty
            } else {
                Input::Task(kind, text.to_string())
            }
        }
        Ok(None) => Input::Closed,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read from stdin");
            Input::Closed
        }
    }
}

fn parse_line(line: &str) -> (TaskKind, &str) {
    let line = line.trim();
    if let Some(text) = line.strip_prefix("event:") {
        (TaskKind::ExtractEvent, text.trim())
    } else if let Some(text) = line.strip_prefix("summarize:") {
        (TaskKind::Summarize, text.trim())
    } else {
        (TaskKind::Summarize, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_select_task() {
        assert_eq!(
            read_input(Ok(Some("event: Lunch on Friday".to_string()))),
            Input::Task(TaskKind::ExtractEvent, "Lunch on Friday".to_string())
        );
        assert_eq!(
            read_input(Ok(Some("The cat sat.".to_string()))),
            Input::Task(TaskKind::Summarize, "The cat sat.".to_string())
        );
        assert_eq!(read_input(Ok(Some("summarize:   ".to_string()))), Input::Empty);
    }

    #[test]
    fn test_read_error_closes_input() {
        let err = std::io::Error::new(std::io::ErrorKind::InvalidData, "stream did not contain valid UTF-8");
        assert_eq!(read_input(Err(err)), Input::Closed);
        assert_eq!(read_input(Ok(None)), Input::Closed);
    }
}
