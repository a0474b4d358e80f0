mod client;
mod events;
mod poller;
#[cfg(test)]
mod testing;
mod types;
mod validator;
mod workflow;

pub use client::UploadClient;
pub use events::{EventSink, WorkflowEvent};
pub use poller::PollConfig;
pub use types::{ImageSet, SelectedImage, Stage, StageLayout, UploadResult};
pub use validator::Validator;
pub use workflow::UploadWorkflow;
