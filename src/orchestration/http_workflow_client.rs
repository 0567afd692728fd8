//! # HTTP Workflow Client
//!
//! [`WorkflowClient`] over the workflow service's REST API:
//!
//! ```text
//! POST {base_url}/v1/workflows/{workflow_id}/executions
//! {"name": "<execution name>", "input": {"patientId": "...", "data": ...}}
//! ```
//!
//! | Response                     | Result                          |
//! |------------------------------|---------------------------------|
//! | 200/201 `{"execution_id"}`   | `StartOutcome::Started`         |
//! | 409                          | `StartOutcome::AlreadyExists`   |
//! | 408, 429, 5xx, network       | transient `WorkflowError`       |
//! | other 4xx, undecodable body  | permanent `WorkflowError`       |
//!
//! No retries happen here; an unstarted message is retried by redelivery.

use super::errors::{WorkflowError, WorkflowResult};
use super::workflow_client::{DispatchRequest, ExecutionInput, StartOutcome, WorkflowClient};
use crate::config::WorkflowConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Longest error body kept from a failed response
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone)]
pub struct HttpWorkflowClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub bearer_token: Option<String>,
}

impl std::fmt::Debug for HttpWorkflowClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWorkflowClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("auth_enabled", &self.bearer_token.is_some())
            .finish()
    }
}

impl From<&WorkflowConfig> for HttpWorkflowClientConfig {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_ms: config.timeout_ms,
            bearer_token: config
                .bearer_token
                .clone()
                .filter(|token| !token.trim().is_empty()),
        }
    }
}

#[derive(Serialize)]
struct StartExecutionBody<'a> {
    name: &'a str,
    input: &'a ExecutionInput,
}

#[derive(Deserialize)]
struct StartExecutionResponse {
    #[serde(alias = "executionArn", alias = "executionId")]
    execution_id: String,
}

#[derive(Clone)]
pub struct HttpWorkflowClient {
    client: Client,
    base_url: Url,
    config: HttpWorkflowClientConfig,
}

impl std::fmt::Debug for HttpWorkflowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpWorkflowClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("auth_enabled", &self.config.bearer_token.is_some())
            .finish()
    }
}

impl HttpWorkflowClient {
    pub fn new(config: HttpWorkflowClientConfig) -> WorkflowResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| WorkflowError::configuration(format!("Invalid base URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(WorkflowError::configuration(format!(
                "Base URL cannot carry a path: {base_url}"
            )));
        }

        let mut builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("telemetry-dispatch/{}", env!("CARGO_PKG_VERSION")));

        if let Some(token) = &config.bearer_token {
            let mut headers = reqwest::header::HeaderMap::new();
            let mut value: reqwest::header::HeaderValue = format!("Bearer {token}")
                .parse()
                .map_err(|e| WorkflowError::configuration(format!("Invalid bearer token: {e}")))?;
            value.set_sensitive(true);
            headers.insert(reqwest::header::AUTHORIZATION, value);
            builder = builder.default_headers(headers);
            debug!("Configured bearer token authentication");
        }

        let client = builder
            .build()
            .map_err(|e| WorkflowError::configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn executions_url(&self, workflow_id: &str) -> WorkflowResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| WorkflowError::configuration("Base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["v1", "workflows", workflow_id, "executions"]);
        Ok(url)
    }
}

#[async_trait]
impl WorkflowClient for HttpWorkflowClient {
    async fn start_execution(&self, request: &DispatchRequest) -> WorkflowResult<StartOutcome> {
        let url = self.executions_url(&request.workflow_id)?;
        debug!(
            url = %url,
            execution_name = %request.execution_name,
            "Starting workflow execution"
        );

        let response = self
            .client
            .post(url)
            .json(&StartExecutionBody {
                name: &request.execution_name,
                input: &request.input,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            return Ok(StartOutcome::AlreadyExists);
        }

        if status.is_success() {
            let body: StartExecutionResponse = response.json().await.map_err(|e| {
                WorkflowError::invalid_response(format!("Failed to parse start response: {e}"))
            })?;
            return Ok(StartOutcome::Started {
                execution_id: body.execution_id,
            });
        }

        let error_text: String = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect();
        Err(WorkflowError::from_status(status.as_u16(), error_text))
    }
}
