//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（textlens.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, InferenceBackend};
use crate::domain::task::TEXT_PLACEHOLDER;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["textlens", "textlens.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `TEXTLENS_INFERENCE__URL=http://127.0.0.1:8000`
/// - `TEXTLENS_INFERENCE__BACKEND=fake`
/// - `TEXTLENS_RUNTIME__SURFACE_ERRORS=true`
/// - `TEXTLENS_LOG__LEVEL=debug`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）；嵌套的模型配置由 serde 默认值补齐
    builder = builder
        .set_default("runtime.host_document", "/offscreen.html")?
        .set_default("runtime.bus_capacity", 100)?
        .set_default("runtime.surface_errors", false)?
        .set_default("inference.backend", "http")?
        .set_default("inference.url", "http://localhost:8000")?
        .set_default("inference.timeout_secs", 120)?
        .set_default("inference.load_delay_ms", 500)?
        .set_default("settings.path", "data/settings.toml")?
        .set_default("log.level", "info")?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），层级分隔符 __
    builder = builder.add_source(
        Environment::with_prefix("TEXTLENS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.runtime.host_document.is_empty() {
        return Err(ConfigError::ValidationError(
            "Host document cannot be empty".to_string(),
        ));
    }

    if config.runtime.bus_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Bus capacity cannot be 0".to_string(),
        ));
    }

    if config.inference.backend == InferenceBackend::Http && config.inference.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Inference URL cannot be empty".to_string(),
        ));
    }

    for (name, model) in [
        ("summarize", &config.models.summarize),
        ("extract_event", &config.models.extract_event),
    ] {
        if model.model.is_empty() || model.task.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "Model for {} must have a task and a model id",
                name
            )));
        }
    }

    if !config.settings.summarize_prompt.contains(TEXT_PLACEHOLDER) {
        tracing::warn!(
            template = %config.settings.summarize_prompt,
            "Default summarize prompt has no {} placeholder, raw text will be used",
            TEXT_PLACEHOLDER
        );
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Host Document: {}", config.runtime.host_document);
    tracing::info!("Bus Capacity: {}", config.runtime.bus_capacity);
    tracing::info!("Surface Errors: {}", config.runtime.surface_errors);
    tracing::info!("Inference Backend: {:?}", config.inference.backend);
    if config.inference.backend == InferenceBackend::Http {
        tracing::info!("Inference URL: {}", config.inference.url);
        tracing::info!("Inference Timeout: {}s", config.inference.timeout_secs);
    }
    tracing::info!("Summarize Model: {}", config.models.summarize.model);
    tracing::info!("Extract Event Model: {}", config.models.extract_event.model);
    tracing::info!("Settings File: {:?}", config.settings.path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_bus_capacity() {
        let mut config = AppConfig::default();
        config.runtime.bus_capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_url_with_http_backend() {
        let mut config = AppConfig::default();
        config.inference.url = String::new();
        assert!(validate_config(&config).is_err());

        config.inference.backend = InferenceBackend::Fake;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_model() {
        let mut config = AppConfig::default();
        config.models.extract_event.model = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[inference]
backend = "fake"

[models.summarize]
task = "summarization"
model = "Xenova/t5-small"
label = "Summary (T5)"

[settings]
summarize_prompt = "summarize: {{text}}"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.inference.backend, InferenceBackend::Fake);
        assert_eq!(config.models.summarize.model, "Xenova/t5-small");
        assert_eq!(config.models.summarize.options.num_beams, None);
        assert_eq!(
            config.models.extract_event.model,
            "Xenova/distilbert-base-uncased-distilled-squad"
        );
        assert_eq!(config.settings.summarize_prompt, "summarize: {text}");
    }
}
