//! Model Catalog - 任务类型到固定模型的映射

use std::collections::HashMap;

use crate::application::ports::PipelineSpec;
use crate::config::{ModelConfig, ModelsConfig};
use crate::domain::task::TaskKind;

/// 单个任务类型的模型条目
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub spec: PipelineSpec,
    /// 结果标题
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: HashMap<TaskKind, ModelEntry>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_entry(mut self, kind: TaskKind, entry: ModelEntry) -> Self {
        self.entries.insert(kind, entry);
        self
    }

    pub fn get(&self, kind: TaskKind) -> Option<&ModelEntry> {
        self.entries.get(&kind)
    }
}

impl ModelCatalog {
    /// 从模型配置构建
    pub fn from_config(models: &ModelsConfig) -> Self {
        Self::new()
            .with_entry(TaskKind::Summarize, entry(&models.summarize))
            .with_entry(TaskKind::ExtractEvent, entry(&models.extract_event))
    }
}

fn entry(model: &ModelConfig) -> ModelEntry {
    ModelEntry {
        spec: model.pipeline_spec(),
        label: model.label.clone(),
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::from_config(&ModelsConfig::default())
    }
}
