//! Inference Adapter - 推理引擎实现

mod fake_engine;
mod http_engine;

pub use fake_engine::{FakeInferenceEngine, FakeInferenceEngineConfig};
pub use http_engine::{HttpInferenceEngine, HttpInferenceEngineConfig};
