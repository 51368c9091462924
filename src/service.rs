use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;

use crate::error::{Result, ServiceError};

/// A document the user picked. Contents are read when it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub file_name: String,
}

impl SelectedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        SelectedFile { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// `None` when the response had no usable `answer` field.
    pub text: Option<String>,
}

impl Answer {
    pub fn from_body(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        let text = match value.get("answer") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Ok(Answer { text })
    }
}

#[async_trait]
pub trait AnsweringService: Send + Sync {
    async fn answer(&self, file: &SelectedFile, prompt: &str) -> Result<Answer>;
}

pub struct HttpAnsweringService {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAnsweringService {
    pub fn with_config(endpoint: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(HttpAnsweringService {
            endpoint,
            client: builder.build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnsweringService for HttpAnsweringService {
    async fn answer(&self, file: &SelectedFile, prompt: &str) -> Result<Answer> {
        let bytes = tokio::fs::read(file.path())
            .await
            .map_err(|source| ServiceError::ReadFile {
                path: file.path().display().to_string(),
                source,
            })?;

        tracing::debug!(
            endpoint = %self.endpoint,
            file = %file.file_name,
            size = bytes.len(),
            prompt_len = prompt.len(),
            "uploading document"
        );

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file.file_name.clone()))
            .text("prompt", prompt.to_string());

        let response = self.client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }

        let body = response.text().await?;
        Answer::from_body(&body)
    }
}
