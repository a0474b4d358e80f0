use crate::error::{Result, UploadError};
use crate::upload::client::UploadBackend;
use crate::upload::events::{EventSink, WorkflowEvent};
use crate::upload::types::{ImageSet, StatusResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling,
    Complete,
    Timeout,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Complete(ImageSet),
    TimedOut { attempts: u32 },
    Failed(String),
    Cancelled,
}

/// What the loop should do after one status response.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Keep polling; carries any stages the server already produced.
    Continue(Option<ImageSet>),
    Finished(PollOutcome),
}

/// Per-upload poll bookkeeping, owned by exactly one poll task.
#[derive(Debug)]
pub struct PollState {
    pub image_id: String,
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub interval: Duration,
    phase: PollPhase,
}

impl PollState {
    pub fn new(image_id: impl Into<String>, config: PollConfig) -> Self {
        Self {
            image_id: image_id.into(),
            attempts_made: 0,
            max_attempts: config.max_attempts,
            interval: config.interval,
            phase: PollPhase::Idle,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn start(&mut self) {
        if self.phase == PollPhase::Idle {
            self.phase = PollPhase::Polling;
        }
    }

    pub fn advance(&mut self, response: Result<StatusResponse>) -> PollStep {
        if self.phase != PollPhase::Polling {
            log::warn!(
                "Ignoring status for '{}' in phase {:?}",
                self.image_id,
                self.phase
            );
            return PollStep::Continue(None);
        }

        let progress = match response {
            Ok(response) if !response.success => {
                self.phase = PollPhase::Error;
                let message = response
                    .error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "Processing failed".to_string());
                return PollStep::Finished(PollOutcome::Failed(message));
            }
            Ok(response) if response.is_complete() => {
                self.phase = PollPhase::Complete;
                return PollStep::Finished(PollOutcome::Complete(response.images));
            }
            Ok(response) => Some(response.images).filter(|images| !images.is_empty()),
            Err(e) => {
                log::warn!(
                    "Status check {} for '{}' failed: {}",
                    self.attempts_made + 1,
                    self.image_id,
                    e
                );
                None
            }
        };

        self.attempts_made += 1;
        if self.attempts_made >= self.max_attempts {
            self.phase = PollPhase::Timeout;
            return PollStep::Finished(PollOutcome::TimedOut {
                attempts: self.attempts_made,
            });
        }

        PollStep::Continue(progress)
    }
}

/// A running poll loop. Dropping the handle also stops the loop.
pub struct PollHandle {
    image_id: String,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

/// Starts polling on the current tokio runtime.
pub fn spawn_poll<B: UploadBackend>(
    backend: Arc<B>,
    image_id: String,
    config: PollConfig,
    events: EventSink,
) -> PollHandle {
    let (cancel_tx, cancel_rx) = oneshot::channel();
    let state = PollState::new(image_id.clone(), config);
    let task = tokio::spawn(run_poll(backend, state, cancel_rx, events));

    PollHandle {
        image_id,
        cancel: Some(cancel_tx),
        task,
    }
}

/// One status request per interval, the first one interval after start.
/// A slow request delays the next tick instead of overlapping it.
pub async fn run_poll<B: UploadBackend>(
    backend: Arc<B>,
    mut state: PollState,
    mut cancel: oneshot::Receiver<()>,
    events: EventSink,
) -> PollOutcome {
    let mut ticker = time::interval_at(Instant::now() + state.interval, state.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    state.start();
    log::info!(
        "Polling '{}' every {:?} (max {} attempts)",
        state.image_id,
        state.interval,
        state.max_attempts
    );

    loop {
        tokio::select! {
            _ = &mut cancel => return cancelled(&state),
            _ = ticker.tick() => {}
        }

        log::debug!(
            "Poll attempt {} for '{}'",
            state.attempts_made + 1,
            state.image_id
        );
        let response = tokio::select! {
            _ = &mut cancel => return cancelled(&state),
            response = backend.check_status(&state.image_id) => response,
        };

        match state.advance(response) {
            PollStep::Continue(Some(images)) => events.send(WorkflowEvent::Progress {
                image_id: state.image_id.clone(),
                images,
            }),
            PollStep::Continue(None) => {}
            PollStep::Finished(outcome) => {
                report(&state, &outcome, &events);
                return outcome;
            }
        }
    }
}

fn cancelled(state: &PollState) -> PollOutcome {
    log::info!(
        "Polling for '{}' cancelled after {} attempts ({:?})",
        state.image_id,
        state.attempts_made,
        state.phase()
    );
    PollOutcome::Cancelled
}

fn report(state: &PollState, outcome: &PollOutcome, events: &EventSink) {
    let image_id = state.image_id.clone();
    match outcome {
        PollOutcome::Complete(images) => {
            log::info!("Processing for '{}' complete", image_id);
            events.send(WorkflowEvent::Completed {
                image_id,
                images: images.clone(),
            });
        }
        PollOutcome::TimedOut { attempts } => {
            let message = UploadError::PollTimeout {
                attempts: *attempts,
            };
            log::warn!("'{}': {}", image_id, message);
            events.send(WorkflowEvent::TimedOut {
                image_id,
                attempts: *attempts,
            });
        }
        PollOutcome::Failed(message) => {
            log::error!("Processing for '{}' failed: {}", image_id, message);
            events.send(WorkflowEvent::PollFailed {
                image_id,
                message: message.clone(),
            });
        }
        PollOutcome::Cancelled => {}
    }
}
