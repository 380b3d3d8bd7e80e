//! HTTP call-log repository backed by the external message API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::ApiSettings;
use crate::domain::{CallLog, CallLogRepository};
use crate::shared::error::AppError;

const LOG_CALL_PATH: &str = "/api/message/logcall";

/// Posts call logs to `{base_url}/api/message/logcall` on behalf of one user.
#[derive(Debug, Clone)]
pub struct HttpCallLogRepository {
    client: Client,
    endpoint: String,
    token: String,
}

impl HttpCallLogRepository {
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), LOG_CALL_PATH),
            token: token.into(),
        })
    }

    pub fn from_settings(settings: &ApiSettings, token: impl Into<String>) -> Result<Self, AppError> {
        Self::new(&settings.base_url, token, settings.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CallLogRepository for HttpCallLogRepository {
    async fn log_call(&self, log: &CallLog) -> Result<Option<Value>, AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(log)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), chat_id = %log.chat_id, "Call log rejected by API");
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        let message: Value = serde_json::from_slice(&body)?;
        Ok((!message.is_null()).then_some(message))
    }
}
