#[cfg(test)]
#[path = "docqa_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendResult;
use crate::domain::models::FileHandle;
use crate::domain::models::SessionId;
use crate::domain::models::UploadReceipt;

fn convert_err(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout;
    }

    if err.is_connect() {
        return BackendError::Unreachable(err.to_string());
    }

    if err.is_decode() {
        return BackendError::Decode(err.to_string());
    }

    return BackendError::Transport(err.to_string());
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SessionResponse {
    session_id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    uploaded_files: Option<Vec<String>>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FilesResponse {
    files: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AskRequest {
    session_id: String,
    question: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AskResponse {
    answer: String,
}

/// Error body. `detail` is a plain message for application errors, or a list of
/// field errors when the request itself failed validation.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn message(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(detail)) => return Some(detail.to_string()),
            Some(serde_json::Value::Array(entries)) => {
                let messages = entries
                    .iter()
                    .filter_map(|entry| {
                        return entry
                            .get("msg")
                            .and_then(|e| return e.as_str())
                            .map(|e| return e.to_string());
                    })
                    .collect::<Vec<String>>();

                if messages.is_empty() {
                    return None;
                }
                return Some(messages.join("; "));
            }
            _ => return None,
        }
    }
}

async fn parse_error(res: reqwest::Response) -> BackendError {
    let status = res.status().as_u16();
    let detail = match res.json::<ErrorResponse>().await {
        Ok(body) => body.message(),
        Err(_) => None,
    };

    tracing::error!(status = status, detail = ?detail, "Backend returned an error");
    return BackendError::Api { status, detail };
}

async fn json_response<T: serde::de::DeserializeOwned>(res: reqwest::Response) -> BackendResult<T> {
    if !res.status().is_success() {
        return Err(parse_error(res).await);
    }

    return res.json::<T>().await.map_err(convert_err);
}

async fn file_part(file: &FileHandle) -> BackendResult<multipart::Part> {
    let bytes = fs::read(&file.path).await.map_err(|err| {
        return BackendError::File {
            name: file.name.to_string(),
            message: err.to_string(),
        };
    })?;

    return multipart::Part::bytes(bytes)
        .file_name(file.name.to_string())
        .mime_str(file.document_type.mime())
        .map_err(convert_err);
}

/// Client for the document question-answering HTTP service.
pub struct DocQA {
    url: String,
    client: reqwest::Client,
    health_check_timeout: Duration,
    request_timeout: Duration,
    ask_timeout: Duration,
}

impl DocQA {
    pub fn new(
        url: &str,
        health_check_timeout: Duration,
        request_timeout: Duration,
        ask_timeout: Duration,
    ) -> DocQA {
        return DocQA {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            health_check_timeout,
            request_timeout,
            ask_timeout,
        };
    }

    pub fn from_config() -> Result<DocQA> {
        return Ok(DocQA::new(
            &Config::get(ConfigKey::BackendURL),
            Config::duration(ConfigKey::BackendHealthCheckTimeout)?,
            Config::duration(ConfigKey::RequestTimeout)?,
            Config::duration(ConfigKey::AskTimeout)?,
        ));
    }
}

#[async_trait]
impl Backend for DocQA {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> BackendResult<()> {
        let res = match self
            .client
            .get(format!("{url}/", url = self.url))
            .timeout(self.health_check_timeout)
            .send()
            .await
        {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Backend is not reachable");
                return Err(convert_err(err));
            }
        };

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Backend health check failed");
            return Err(BackendError::Api {
                status: res.status().as_u16(),
                detail: None,
            });
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_session(&self) -> BackendResult<SessionId> {
        let res = self
            .client
            .post(format!("{url}/session", url = self.url))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(convert_err)?;

        let body = json_response::<SessionResponse>(res).await?;
        tracing::debug!(body = ?body, "Session response");

        if body.session_id.is_empty() {
            return Err(BackendError::Decode(
                "session response carried an empty session_id".to_string(),
            ));
        }

        return Ok(SessionId::new(&body.session_id));
    }

    #[allow(clippy::implicit_return)]
    async fn upload(&self, session_id: &SessionId, files: &[FileHandle]) -> BackendResult<UploadReceipt> {
        let mut form = multipart::Form::new().text("session_id", session_id.to_string());
        for file in files {
            form = form.part("files", file_part(file).await?);
        }

        let res = self
            .client
            .post(format!("{url}/upload", url = self.url))
            .timeout(self.request_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(convert_err)?;

        let status = res.status().as_u16();
        let body = json_response::<UploadResponse>(res).await?;
        tracing::debug!(body = ?body, "Upload response");

        if !body.success {
            let mut detail = None;
            if !body.message.is_empty() {
                detail = Some(body.message);
            }
            return Err(BackendError::Api { status, detail });
        }

        return Ok(UploadReceipt {
            message: body.message,
            uploaded_files: body.uploaded_files,
        });
    }

    #[allow(clippy::implicit_return)]
    async fn list_files(&self, session_id: &SessionId) -> BackendResult<Vec<String>> {
        let res = self
            .client
            .get(format!("{url}/session_files", url = self.url))
            .query(&[("session_id", session_id.as_str())])
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(convert_err)?;

        let body = json_response::<FilesResponse>(res).await?;
        return Ok(body.files);
    }

    #[allow(clippy::implicit_return)]
    async fn ask(&self, session_id: &SessionId, question: &str) -> BackendResult<String> {
        let req = AskRequest {
            session_id: session_id.to_string(),
            question: question.to_string(),
        };

        let res = self
            .client
            .post(format!("{url}/ask", url = self.url))
            .timeout(self.ask_timeout)
            .json(&req)
            .send()
            .await
            .map_err(convert_err)?;

        let body = json_response::<AskResponse>(res).await?;
        return Ok(body.answer);
    }

    #[allow(clippy::implicit_return)]
    async fn clear_session(&self, session_id: &SessionId) -> BackendResult<()> {
        let res = self
            .client
            .post(format!("{url}/clear_session", url = self.url))
            .query(&[("session_id", session_id.as_str())])
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(convert_err)?;

        if !res.status().is_success() {
            return Err(parse_error(res).await);
        }

        return Ok(());
    }
}
