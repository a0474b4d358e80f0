use crate::upload::types::{ImageSet, UploadResult};
use eframe::egui;
use std::sync::mpsc::Sender;

/// What background tasks report back to the window.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    Submitted(UploadResult),
    SubmitFailed(String),
    Progress { image_id: String, images: ImageSet },
    Completed { image_id: String, images: ImageSet },
    TimedOut { image_id: String, attempts: u32 },
    PollFailed { image_id: String, message: String },
}

/// Sending half of the event channel. Wakes the UI after every event so
/// results show up without user input.
#[derive(Clone)]
pub struct EventSink {
    sender: Sender<WorkflowEvent>,
    repaint: Option<egui::Context>,
}

impl EventSink {
    pub fn new(sender: Sender<WorkflowEvent>, repaint: Option<egui::Context>) -> Self {
        Self { sender, repaint }
    }

    pub fn send(&self, event: WorkflowEvent) {
        if self.sender.send(event).is_err() {
            log::debug!("Event receiver dropped, discarding event");
        }
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
    }
}
