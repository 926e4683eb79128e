//! Pipeline Cache - 按任务类型缓存已构造的 Pipeline
//!
//! 每个任务类型一个 LazySlot：未初始化 / 初始化中（共享的构造 future）/ 就绪。
//! 构造失败回到未初始化，不会卡在初始化中。生命周期与所属 Worker 相同。

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;

use crate::application::lifecycle::{LazySlot, SlotStatus};
use crate::application::ports::Pipeline;
use crate::domain::task::TaskKind;

pub struct PipelineCache {
    slots: DashMap<TaskKind, Arc<LazySlot<Arc<dyn Pipeline>>>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    fn slot(&self, kind: TaskKind) -> Arc<LazySlot<Arc<dyn Pipeline>>> {
        self.slots
            .entry(kind)
            .or_insert_with(|| Arc::new(LazySlot::new()))
            .clone()
    }

    /// 获取 Pipeline；初始化中时等待同一个构造
    pub async fn get_or_load<F, Fut>(&self, kind: TaskKind, load: F) -> Result<Arc<dyn Pipeline>, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn Pipeline>, String>> + Send + 'static,
    {
        self.slot(kind).get_or_init(load).await
    }

    pub fn status(&self, kind: TaskKind) -> SlotStatus {
        self.slots
            .get(&kind)
            .map(|slot| slot.status())
            .unwrap_or(SlotStatus::Empty)
    }
}

impl Default for PipelineCache {
    fn default() -> Self {
        Self::new()
    }
}
