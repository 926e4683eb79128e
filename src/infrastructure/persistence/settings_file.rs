//! File Settings Store - TOML 文件持久化的用户设置
//!
//! 文件中缺失的键在读取时使用默认值；文件不存在视为全部使用默认值

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::application::ports::{Settings, SettingsError, SettingsStorePort};

/// 文件中的设置（所有键可选）
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summarize_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extract_qa_question: Option<String>,
}

/// TOML 文件设置存储
pub struct FileSettingsStore {
    path: PathBuf,
    defaults: Settings,
    /// 串行化读改写
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, defaults: Settings) -> Self {
        Self {
            path: path.into(),
            defaults,
            write_lock: Mutex::new(()),
        }
    }

    async fn read_stored(&self) -> Result<StoredSettings, SettingsError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredSettings::default()),
            Err(e) => Err(SettingsError::Io(e.to_string())),
        }
    }
}

#[async_trait]
impl SettingsStorePort for FileSettingsStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        let stored = self.read_stored().await?;
        Ok(Settings {
            summarize_prompt: stored
                .summarize_prompt
                .unwrap_or_else(|| self.defaults.summarize_prompt.clone()),
            extract_qa_question: stored
                .extract_qa_question
                .unwrap_or_else(|| self.defaults.extract_qa_question.clone()),
        })
    }

    async fn save(&self, settings: Settings) -> Result<(), SettingsError> {
        let _guard = self.write_lock.lock().await;
        let settings = settings.or_defaults(&self.defaults);
        let stored = StoredSettings {
            summarize_prompt: Some(settings.summarize_prompt),
            extract_qa_question: Some(settings.extract_qa_question),
        };
        let content =
            toml::to_string_pretty(&stored).map_err(|e| SettingsError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SettingsError::Io(e.to_string()))?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| SettingsError::Io(e.to_string()))?;

        tracing::info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.toml"), Settings::default());

        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let store = FileSettingsStore::new(&path, Settings::default());

        store
            .save(Settings {
                summarize_prompt: "Summarize briefly: {text}".to_string(),
                extract_qa_question: "".to_string(),
            })
            .await
            .unwrap();

        let reopened = FileSettingsStore::new(&path, Settings::default());
        let loaded = reopened.load().await.unwrap();
        assert_eq!(loaded.summarize_prompt, "Summarize briefly: {text}");
        assert_eq!(
            loaded.extract_qa_question,
            Settings::default().extract_qa_question
        );
    }

    #[tokio::test]
    async fn test_partial_file_merges_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(&path, "extractQaQuestion = \"Where?\"\n")
            .await
            .unwrap();

        let store = FileSettingsStore::new(&path, Settings::default());
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.extract_qa_question, "Where?");
        assert_eq!(loaded.summarize_prompt, Settings::default().summarize_prompt);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        tokio::fs::write(&path, "summarizePrompt = [").await.unwrap();

        let store = FileSettingsStore::new(&path, Settings::default());
        assert!(matches!(store.load().await, Err(SettingsError::Parse(_))));
    }
}
