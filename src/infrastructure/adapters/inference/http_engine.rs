//! HTTP Inference Engine - 调用本地模型服务
//!
//! 实现 InferenceEnginePort，通过 HTTP 调用本机运行的推理服务
//!
//! 本地推理 API:
//! POST {base_url}/api/pipelines            {"task": "...", "model": "...", "options": {...}}
//!   -> {"pipeline_id": "..."}              (模型加载完成后返回)
//! POST {base_url}/api/pipelines/{id}/run   "text" | {"question": "...", "context": "..."}
//!   -> [{"summary_text": "..."}] | {"answer": "...", "score": 0.9}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{InferenceEnginePort, InferenceError, Pipeline, PipelineSpec};
use crate::domain::task::{PipelineInput, PipelineOutput};

/// Pipeline 构造响应
#[derive(Debug, Deserialize)]
struct ConstructResponse {
    pipeline_id: String,
}

/// HTTP 推理引擎配置
#[derive(Debug, Clone)]
pub struct HttpInferenceEngineConfig {
    /// 推理服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒），模型加载可能很慢
    pub timeout_secs: u64,
}

impl Default for HttpInferenceEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpInferenceEngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 推理引擎
pub struct HttpInferenceEngine {
    client: Client,
    config: HttpInferenceEngineConfig,
}

impl HttpInferenceEngine {
    pub fn new(config: HttpInferenceEngineConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn construct_url(&self) -> String {
        format!("{}/api/pipelines", self.base_url())
    }

    fn run_url(&self, pipeline_id: &str) -> String {
        format!("{}/api/pipelines/{}/run", self.base_url(), pipeline_id)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.base_url())
    }
}

fn map_send_error(e: reqwest::Error) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout
    } else if e.is_connect() {
        InferenceError::NetworkError(format!("Cannot connect to inference service: {}", e))
    } else {
        InferenceError::NetworkError(e.to_string())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, InferenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(InferenceError::ServiceError(format!(
        "HTTP {}: {}",
        status, error_text
    )))
}

#[async_trait]
impl InferenceEnginePort for HttpInferenceEngine {
    async fn construct_pipeline(
        &self,
        spec: &PipelineSpec,
    ) -> Result<Arc<dyn Pipeline>, InferenceError> {
        tracing::debug!(
            url = %self.construct_url(),
            task = %spec.task,
            model = %spec.model,
            "Sending pipeline construct request"
        );

        let response = self
            .client
            .post(self.construct_url())
            .json(spec)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await.map_err(|e| match e {
            InferenceError::ServiceError(msg) => InferenceError::LoadFailed(msg),
            other => other,
        })?;

        let constructed: ConstructResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            pipeline_id = %constructed.pipeline_id,
            model = %spec.model,
            "Pipeline constructed by inference service"
        );

        Ok(Arc::new(HttpPipeline {
            client: self.client.clone(),
            url: self.run_url(&constructed.pipeline_id),
        }))
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

/// 远端 Pipeline
struct HttpPipeline {
    client: Client,
    url: String,
}

#[async_trait]
impl Pipeline for HttpPipeline {
    async fn run(&self, input: PipelineInput) -> Result<PipelineOutput, InferenceError> {
        let response = self
            .client
            .post(&self.url)
            .json(&input)
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))
    }
}
