//! In-Memory Settings Store Implementation

use async_trait::async_trait;
use dashmap::DashMap;

use crate::application::ports::{
    Settings, SettingsError, SettingsStorePort, EXTRACT_QA_QUESTION_KEY, SUMMARIZE_PROMPT_KEY,
};

/// 内存设置存储（键值对，读取时与默认值合并）
pub struct InMemorySettingsStore {
    values: DashMap<String, String>,
    defaults: Settings,
}

impl InMemorySettingsStore {
    pub fn new(defaults: Settings) -> Self {
        Self {
            values: DashMap::new(),
            defaults,
        }
    }

    fn value_or(&self, key: &str, default: &str) -> String {
        self.values
            .get(key)
            .map(|v| v.clone())
            .unwrap_or_else(|| default.to_string())
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

#[async_trait]
impl SettingsStorePort for InMemorySettingsStore {
    async fn load(&self) -> Result<Settings, SettingsError> {
        Ok(Settings {
            summarize_prompt: self.value_or(SUMMARIZE_PROMPT_KEY, &self.defaults.summarize_prompt),
            extract_qa_question: self
                .value_or(EXTRACT_QA_QUESTION_KEY, &self.defaults.extract_qa_question),
        })
    }

    async fn save(&self, settings: Settings) -> Result<(), SettingsError> {
        let settings = settings.or_defaults(&self.defaults);
        self.values
            .insert(SUMMARIZE_PROMPT_KEY.to_string(), settings.summarize_prompt);
        self.values
            .insert(EXTRACT_QA_QUESTION_KEY.to_string(), settings.extract_qa_question);
        tracing::info!("Settings saved");
        Ok(())
    }
}
