use crate::error::{Result, UploadError};
use crate::upload::client::UploadBackend;
use crate::upload::events::{EventSink, WorkflowEvent};
use crate::upload::poller::{spawn_poll, PollConfig, PollHandle};
use crate::upload::types::SelectedImage;
use crate::upload::validator::Validator;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Validate, submit, and (when the server is still working) poll.
///
/// Each upload gets its own poll loop; a new upload does not cancel the
/// loops of earlier ones. All loops are cancelled by [`cancel_all`] or
/// when the workflow is dropped.
///
/// [`cancel_all`]: UploadWorkflow::cancel_all
pub struct UploadWorkflow<B: UploadBackend> {
    backend: Arc<B>,
    validator: Validator,
    poll_config: PollConfig,
    runtime: Handle,
    events: EventSink,
    polls: Arc<Mutex<Vec<PollHandle>>>,
}

impl<B: UploadBackend> UploadWorkflow<B> {
    pub fn new(
        backend: B,
        validator: Validator,
        poll_config: PollConfig,
        runtime: Handle,
        events: EventSink,
    ) -> Self {
        Self {
            backend: Arc::new(backend),
            validator,
            poll_config,
            runtime,
            events,
            polls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Runs the client-side checks and, if they pass, starts the upload in
    /// the background. Validation failures return before any request.
    pub fn submit(&self, file: Option<&SelectedImage>) -> Result<JoinHandle<()>> {
        let file = self.validator.validate(file).map_err(|e| {
            log::warn!("Rejected selection: {}", e);
            e
        })?;

        log::info!("Submitting '{}'", file.name);
        let task = self.runtime.spawn(submit_and_track(
            self.backend.clone(),
            file.clone(),
            self.poll_config,
            self.events.clone(),
            self.polls.clone(),
        ));
        Ok(task)
    }

    pub fn active_polls(&self) -> usize {
        let mut polls = self.polls.lock().unwrap_or_else(PoisonError::into_inner);
        polls.retain(|poll| !poll.is_finished());
        polls.len()
    }

    pub fn cancel_all(&self) {
        let mut polls = self.polls.lock().unwrap_or_else(PoisonError::into_inner);
        for poll in polls.iter_mut() {
            log::debug!("Cancelling poll for '{}'", poll.image_id());
            poll.cancel();
        }
        polls.clear();
    }
}

impl<B: UploadBackend> Drop for UploadWorkflow<B> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn submit_and_track<B: UploadBackend>(
    backend: Arc<B>,
    file: SelectedImage,
    poll_config: PollConfig,
    events: EventSink,
    polls: Arc<Mutex<Vec<PollHandle>>>,
) {
    let result = match backend.upload(&file).await {
        Ok(result) => result,
        Err(e) => {
            log::error!("Upload of '{}' failed: {}", file.name, e);
            events.send(WorkflowEvent::SubmitFailed(e.to_string()));
            return;
        }
    };

    let poll_id = if result.is_processing() {
        match result.image_id.clone() {
            Some(image_id) => Some(image_id),
            None => {
                let e = UploadError::MissingImageId;
                log::error!("Upload of '{}' failed: {}", file.name, e);
                events.send(WorkflowEvent::SubmitFailed(e.to_string()));
                return;
            }
        }
    } else {
        None
    };

    log::info!(
        "Upload of '{}' accepted (breed: {}, processing: {})",
        file.name,
        result.breed_or_unknown(),
        poll_id.is_some()
    );
    events.send(WorkflowEvent::Submitted(result));

    if let Some(image_id) = poll_id {
        let handle = spawn_poll(backend, image_id, poll_config, events);
        let mut polls = polls.lock().unwrap_or_else(PoisonError::into_inner);
        polls.retain(|poll| !poll.is_finished());
        polls.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::testing::{FakeBackend, StatusReply};
    use crate::upload::types::{ImageSet, ProcessingStatus, Stage, UploadResult};
    use std::sync::mpsc;
    use std::time::Duration;

    fn workflow(backend: FakeBackend) -> (UploadWorkflow<FakeBackend>, mpsc::Receiver<WorkflowEvent>) {
        let (tx, rx) = mpsc::channel();
        let workflow = UploadWorkflow::new(
            backend,
            Validator::default(),
            PollConfig::default(),
            Handle::current(),
            EventSink::new(tx, None),
        );
        (workflow, rx)
    }

    fn png(size: usize) -> SelectedImage {
        SelectedImage::from_bytes("dog.png", vec![0u8; size])
    }

    fn processing_result() -> UploadResult {
        UploadResult {
            success: true,
            status: Some(ProcessingStatus::Processing),
            breed: Some("Golden Retriever".into()),
            image_id: Some("abc".into()),
            images: ImageSet {
                original: Some("/img/abc_o.png".into()),
                ..Default::default()
            },
            error: None,
        }
    }

    #[tokio::test]
    async fn invalid_type_never_reaches_the_backend() {
        let (workflow, rx) = workflow(FakeBackend::with_upload(processing_result()));
        let file = SelectedImage::from_bytes("dog.bmp", vec![0u8; 16]);

        let err = workflow.submit(Some(&file)).unwrap_err();

        assert!(matches!(err, UploadError::InvalidFileType { .. }));
        assert_eq!(workflow.backend.upload_calls(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn oversized_file_never_reaches_the_backend() {
        let (workflow, _rx) = workflow(FakeBackend::with_upload(processing_result()));
        let file = png(10 * 1024 * 1024 + 1);

        let err = workflow.submit(Some(&file)).unwrap_err();

        assert!(matches!(err, UploadError::FileTooLarge { .. }));
        assert_eq!(workflow.backend.upload_calls(), 0);
    }

    #[tokio::test]
    async fn complete_result_is_reported_without_polling() {
        let result = UploadResult {
            success: true,
            breed: Some("Pug".into()),
            image_id: Some("9".into()),
            ..Default::default()
        };
        let (workflow, rx) = workflow(FakeBackend::with_upload(result.clone()));

        workflow.submit(Some(&png(2048))).unwrap().await.unwrap();

        assert_eq!(rx.try_recv().unwrap(), WorkflowEvent::Submitted(result));
        assert_eq!(workflow.active_polls(), 0);
        assert_eq!(workflow.backend.status_calls(), 0);
    }

    #[tokio::test]
    async fn server_failure_is_reported() {
        let (workflow, rx) = workflow(FakeBackend::failing_upload("Upload failed"));

        workflow.submit(Some(&png(2048))).unwrap().await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            WorkflowEvent::SubmitFailed("Upload failed".into())
        );
    }

    #[tokio::test]
    async fn processing_without_id_is_an_error() {
        let mut result = processing_result();
        result.image_id = None;
        let (workflow, rx) = workflow(FakeBackend::with_upload(result));

        workflow.submit(Some(&png(2048))).unwrap().await.unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            WorkflowEvent::SubmitFailed(UploadError::MissingImageId.to_string())
        );
        assert_eq!(workflow.active_polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn processing_result_polls_until_complete() {
        let backend = FakeBackend::with_upload(processing_result());
        backend.script_status([
            StatusReply::Processing(ImageSet::default()),
            StatusReply::Complete(ImageSet {
                original: Some("/img/abc_o.png".into()),
                transition1: Some("/img/abc_t1.png".into()),
                final_image: Some("/img/abc_f.png".into()),
                full_dog: Some("/img/abc_d.png".into()),
                ..Default::default()
            }),
        ]);
        let (workflow, rx) = workflow(backend);

        workflow.submit(Some(&png(2 * 1024 * 1024))).unwrap().await.unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            WorkflowEvent::Submitted(processing_result())
        );
        assert_eq!(workflow.active_polls(), 1);

        tokio::time::sleep(Duration::from_millis(3000 * 2 + 1)).await;

        match rx.try_recv().unwrap() {
            WorkflowEvent::Completed { image_id, images } => {
                assert_eq!(image_id, "abc");
                assert_eq!(images.get(Stage::FullDog), Some("/img/abc_d.png"));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(workflow.backend.status_calls(), 2);
        assert_eq!(workflow.active_polls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_stops_every_loop() {
        let (workflow, _rx) = workflow(FakeBackend::with_upload(processing_result()));

        workflow.submit(Some(&png(1024))).unwrap().await.unwrap();
        workflow.submit(Some(&png(1024))).unwrap().await.unwrap();
        assert_eq!(workflow.active_polls(), 2);

        workflow.cancel_all();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(workflow.active_polls(), 0);
        assert_eq!(workflow.backend.status_calls(), 0);
    }
}
