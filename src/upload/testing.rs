use crate::error::{Result, UploadError};
use crate::upload::client::UploadBackend;
use crate::upload::types::{ImageSet, ProcessingStatus, SelectedImage, StatusResponse, UploadResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted status replies. Once the script runs out, every check reports
/// `processing` with no images.
#[derive(Debug, Clone)]
pub enum StatusReply {
    Processing(ImageSet),
    Complete(ImageSet),
    Rejected(String),
    ServerError(String),
}

impl StatusReply {
    fn into_result(self) -> Result<StatusResponse> {
        match self {
            StatusReply::Processing(images) => Ok(StatusResponse {
                success: true,
                status: Some(ProcessingStatus::Processing),
                images,
                error: None,
            }),
            StatusReply::Complete(images) => Ok(StatusResponse {
                success: true,
                status: Some(ProcessingStatus::Complete),
                images,
                error: None,
            }),
            StatusReply::Rejected(message) => Ok(StatusResponse {
                success: false,
                error: Some(message),
                ..Default::default()
            }),
            StatusReply::ServerError(message) => Err(UploadError::Server(message)),
        }
    }
}

#[derive(Default)]
pub struct FakeBackend {
    upload_reply: Mutex<Option<std::result::Result<UploadResult, String>>>,
    status_script: Mutex<VecDeque<StatusReply>>,
    uploads: AtomicUsize,
    status_checks: AtomicUsize,
    polled: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn with_upload(result: UploadResult) -> Self {
        let backend = Self::default();
        *backend.upload_reply.lock().unwrap() = Some(Ok(result));
        backend
    }

    pub fn failing_upload(message: &str) -> Self {
        let backend = Self::default();
        *backend.upload_reply.lock().unwrap() = Some(Err(message.to_string()));
        backend
    }

    pub fn script_status(&self, replies: impl IntoIterator<Item = StatusReply>) {
        self.status_script.lock().unwrap().extend(replies);
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    pub fn polled_ids(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }
}

impl UploadBackend for FakeBackend {
    async fn upload(&self, _file: &SelectedImage) -> Result<UploadResult> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        match self.upload_reply.lock().unwrap().clone() {
            Some(Ok(result)) => Ok(result),
            Some(Err(message)) => Err(UploadError::Server(message)),
            None => Err(UploadError::Server("no upload scripted".to_string())),
        }
    }

    async fn check_status(&self, image_id: &str) -> Result<StatusResponse> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        self.polled.lock().unwrap().push(image_id.to_string());
        let reply = self
            .status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StatusReply::Processing(ImageSet::default()));
        reply.into_result()
    }
}
