use crate::error::{Result, UploadError};
use crate::upload::types::{SelectedImage, StatusResponse, UploadResult};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::future::Future;

/// The two server calls the workflow needs. `UploadClient` talks HTTP;
/// tests substitute a scripted backend.
pub trait UploadBackend: Send + Sync + 'static {
    fn upload(&self, file: &SelectedImage) -> impl Future<Output = Result<UploadResult>> + Send;

    fn check_status(&self, image_id: &str)
        -> impl Future<Output = Result<StatusResponse>> + Send;
}

#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UploadClient {
    pub fn new(base_url: Url, headers: HeaderMap) -> Result<Self> {
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(UploadError::Network)?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn upload_url(&self) -> Result<Url> {
        self.base_url
            .join("upload")
            .map_err(|e| UploadError::Config(format!("cannot build upload url: {}", e)))
    }

    fn status_url(&self, image_id: &str) -> Result<Url> {
        let mut url = self
            .base_url
            .join("check-status/")
            .map_err(|e| UploadError::Config(format!("cannot build status url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| UploadError::Config("base url cannot hold a path".to_string()))?
            .pop_if_empty()
            .push(image_id);
        Ok(url)
    }
}

impl UploadBackend for UploadClient {
    async fn upload(&self, file: &SelectedImage) -> Result<UploadResult> {
        let url = self.upload_url()?;
        let content = file.read_content().await?;
        log::info!(
            "Uploading '{}' ({} bytes) to {}",
            file.name,
            content.len(),
            url
        );

        let part = Part::bytes(content)
            .file_name(file.name.clone())
            .mime_str(file.mime_type.unwrap_or("application/octet-stream"))
            .map_err(UploadError::Network)?;
        let form = Form::new().part("image", part);

        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Upload request for '{}' failed: {}", file.name, e);
                UploadError::Network(e)
            })?;

        let status = response.status();
        let content_type = content_type_of(response.headers());
        let body = response.text().await.map_err(UploadError::Network)?;

        interpret_upload(status, content_type.as_deref(), &body)
    }

    async fn check_status(&self, image_id: &str) -> Result<StatusResponse> {
        let url = self.status_url(image_id)?;
        log::debug!("Checking status at {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(UploadError::Network)?;

        let status = response.status();
        let content_type = content_type_of(response.headers());
        let body = response.text().await.map_err(UploadError::Network)?;

        interpret_status(status, content_type.as_deref(), &body)
    }
}

fn content_type_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn text_or(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_json<T: DeserializeOwned>(content_type: Option<&str>, body: &str) -> Result<T> {
    let is_json = content_type.map_or(false, |ct| ct.contains("application/json"));
    if !is_json {
        log::warn!("Expected JSON, got {:?}", content_type);
        return Err(UploadError::InvalidResponse(text_or(
            body,
            "Invalid response format",
        )));
    }

    serde_json::from_str(body).map_err(|e| {
        log::warn!("Failed to parse JSON response: {}", e);
        UploadError::InvalidResponse(text_or(body, "Invalid response"))
    })
}

/// Turns a raw `/upload` response into a result, or the message to show.
pub fn interpret_upload(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> Result<UploadResult> {
    let result: UploadResult = parse_json(content_type, body)?;

    if !status.is_success() || !result.success {
        let message = result
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "Upload failed".to_string());
        log::error!("Upload rejected ({}): {}", status, message);
        return Err(UploadError::Server(message));
    }

    Ok(result)
}

/// Non-2xx is an error; a 2xx body with `success: false` is handed to the
/// poller, which treats it as terminal.
pub fn interpret_status(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> Result<StatusResponse> {
    let response: StatusResponse = parse_json(content_type, body)?;

    if !status.is_success() {
        let message = response
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| format!("Status check failed with status: {}", status));
        return Err(UploadError::Server(message));
    }

    Ok(response)
}
