use super::gallery::Gallery;
use crate::error::UploadError;
use crate::upload::{SelectedImage, StageLayout, WorkflowEvent};
use derivative::Derivative;
use std::sync::mpsc::Receiver;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Submitting {
        file_name: String,
    },
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct UploadState {
    pub phase: SubmitPhase,
    pub selected: Option<SelectedImage>,
    pub error_message: Option<String>,
    pub gallery: Gallery,
    #[derivative(Debug = "ignore")]
    pub event_receiver: Option<Receiver<WorkflowEvent>>,
}

impl UploadState {
    pub fn new(layout: StageLayout, event_receiver: Receiver<WorkflowEvent>) -> Self {
        Self {
            phase: SubmitPhase::Idle,
            selected: None,
            error_message: None,
            gallery: Gallery::new(layout),
            event_receiver: Some(event_receiver),
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, SubmitPhase::Submitting { .. })
    }

    pub fn begin_submit(&mut self) {
        self.error_message = None;
        if let Some(file) = &self.selected {
            self.phase = SubmitPhase::Submitting {
                file_name: file.name.clone(),
            };
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Drains pending events. Returns true if anything changed.
    pub fn drain_events(&mut self) -> bool {
        let events: Vec<WorkflowEvent> = match &self.event_receiver {
            Some(receiver) => receiver.try_iter().collect(),
            None => return false,
        };
        let changed = !events.is_empty();
        for event in events {
            self.apply(event);
        }
        changed
    }

    pub fn apply(&mut self, event: WorkflowEvent) {
        match event {
            WorkflowEvent::Submitted(result) => {
                self.phase = SubmitPhase::Idle;
                self.selected = None;
                self.gallery.add_upload(&result);
            }
            WorkflowEvent::SubmitFailed(message) => {
                self.phase = SubmitPhase::Idle;
                self.show_error(message);
            }
            WorkflowEvent::Progress { image_id, images } => {
                self.gallery.apply_progress(&image_id, &images);
            }
            WorkflowEvent::Completed { image_id, images } => {
                self.gallery.mark_complete(&image_id, &images);
            }
            WorkflowEvent::TimedOut { image_id, attempts } => {
                self.gallery.mark_timed_out(&image_id, attempts);
                self.show_error(UploadError::PollTimeout { attempts }.to_string());
            }
            WorkflowEvent::PollFailed { image_id, message } => {
                self.gallery.mark_failed(&image_id, &message);
                self.show_error(message);
            }
        }
    }

    pub fn status_text(&self) -> String {
        match &self.phase {
            SubmitPhase::Idle => match &self.selected {
                Some(file) => format!("Ready to upload {}", file.name),
                None => String::new(),
            },
            SubmitPhase::Submitting { file_name } => format!("📤 Uploading: {}", file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::gallery::{EntryStatus, RenderMode};
    use crate::upload::UploadResult;
    use std::sync::mpsc;

    fn state() -> (UploadState, mpsc::Sender<WorkflowEvent>) {
        let (tx, rx) = mpsc::channel();
        (UploadState::new(StageLayout::FullBody, rx), tx)
    }

    fn processing(id: &str) -> UploadResult {
        serde_json::from_value(serde_json::json!({
            "success": true,
            "status": "processing",
            "image_id": id,
            "images": { "original": "/images/o.png" }
        }))
        .unwrap()
    }

    #[test]
    fn submit_then_success_resets_the_form() {
        let (mut state, tx) = state();
        state.selected = Some(SelectedImage::from_bytes("dog.png", vec![1, 2, 3]));
        state.show_error("old error");

        state.begin_submit();
        assert!(state.is_submitting());
        assert!(state.error_message.is_none());
        assert_eq!(state.status_text(), "📤 Uploading: dog.png");

        tx.send(WorkflowEvent::Submitted(processing("abc"))).unwrap();
        assert!(state.drain_events());

        assert!(!state.is_submitting());
        assert!(state.selected.is_none());
        assert_eq!(state.gallery.len(), 1);
    }

    #[test]
    fn submit_failure_shows_message_and_unlocks_form() {
        let (mut state, tx) = state();
        state.selected = Some(SelectedImage::from_bytes("dog.png", vec![1]));
        state.begin_submit();

        tx.send(WorkflowEvent::SubmitFailed("Upload failed".into()))
            .unwrap();
        state.drain_events();

        assert!(!state.is_submitting());
        assert!(state.selected.is_some());
        assert_eq!(state.error_message.as_deref(), Some("Upload failed"));
    }

    #[test]
    fn timeout_marks_entry_and_shows_message() {
        let (mut state, tx) = state();
        tx.send(WorkflowEvent::Submitted(processing("abc"))).unwrap();
        tx.send(WorkflowEvent::TimedOut {
            image_id: "abc".into(),
            attempts: 60,
        })
        .unwrap();
        state.drain_events();

        let entry = state.gallery.visible(RenderMode::Placeholder).next().unwrap();
        assert_eq!(entry.status, EntryStatus::TimedOut { attempts: 60 });
        assert_eq!(
            state.error_message.as_deref(),
            Some("Processing timed out after 60 checks. Please try again later.")
        );
    }

    #[test]
    fn poll_failure_marks_entry_failed() {
        let (mut state, tx) = state();
        tx.send(WorkflowEvent::Submitted(processing("abc"))).unwrap();
        tx.send(WorkflowEvent::PollFailed {
            image_id: "abc".into(),
            message: "Image not found".into(),
        })
        .unwrap();
        state.drain_events();

        let entry = state.gallery.visible(RenderMode::Placeholder).next().unwrap();
        assert_eq!(entry.status, EntryStatus::Failed("Image not found".into()));
        assert_eq!(state.error_message.as_deref(), Some("Image not found"));
    }

    #[test]
    fn no_events_means_no_change() {
        let (mut state, _tx) = state();
        assert!(!state.drain_events());
    }
}
