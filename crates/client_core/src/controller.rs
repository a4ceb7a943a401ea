//! Form submission controller: one submit handler bound to one page.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use shared::protocol::PayloadEncoding;
use tokio::{
    sync::broadcast,
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::ClientSettings,
    error::{MissingElement, SubmitError},
    page::{DisplayTargets, Page, SubmitEvent},
    payload::FormPayload,
    transport::{interpret_response, HttpPredictionEndpoint, PredictionEndpoint},
};

pub const PROCESSING_TEXT: &str = "Processing...";
const EVENT_CAPACITY: usize = 64;

/// `Succeeded` and `Failed` are resting states: like `Idle` they accept the
/// next submission, they only remember how the last one ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Processing { generation: u64 },
    Succeeded { generation: u64 },
    Failed { generation: u64 },
}

impl SubmissionPhase {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Processing { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Predicted { generation: u64, text: String },
    Failed { generation: u64, text: String },
    /// A newer submission or a cancel took over; the display was left alone.
    Superseded { generation: u64 },
}

impl SubmitOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Predicted { generation, .. }
            | Self::Failed { generation, .. }
            | Self::Superseded { generation } => *generation,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Started { generation: u64 },
    Finished(SubmitOutcome),
    Cancelled { generation: u64 },
}

struct ControllerState {
    generation: u64,
    phase: SubmissionPhase,
    in_flight: Option<AbortHandle>,
}

struct Inner<P> {
    page: Arc<P>,
    endpoint: Arc<dyn PredictionEndpoint>,
    targets: DisplayTargets,
    encoding: PayloadEncoding,
    result_label: String,
    state: Mutex<ControllerState>,
    events: broadcast::Sender<SubmissionEvent>,
}

impl<P: Page> Inner<P> {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_loading(&self, enabled: bool) {
        if let Some(container) = &self.targets.container {
            self.page
                .set_class(container, &self.targets.loading_class, enabled);
        }
    }

    fn publish(&self, event: SubmissionEvent) {
        let _ = self.events.send(event);
    }
}

/// Clears the loading class when its submission ends, however it ends, as
/// long as no newer submission owns the display.
struct LoadingGuard<'a, P: Page> {
    inner: &'a Inner<P>,
    generation: u64,
}

impl<P: Page> Drop for LoadingGuard<'_, P> {
    fn drop(&mut self) {
        let state = self.inner.lock();
        if state.generation == self.generation {
            self.inner.set_loading(false);
        }
    }
}

pub struct SubmissionController<P: Page + 'static> {
    inner: Arc<Inner<P>>,
}

impl<P: Page + 'static> Clone for SubmissionController<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Page + 'static> SubmissionController<P> {
    /// Binds to `page` once it is ready. Every element in `targets` must
    /// already exist.
    pub fn attach(
        page: Arc<P>,
        targets: DisplayTargets,
        endpoint: Arc<dyn PredictionEndpoint>,
        settings: &ClientSettings,
    ) -> Result<Self, MissingElement> {
        if let Some(missing) = targets
            .required_elements()
            .find(|element| !page.has_element(element))
        {
            return Err(MissingElement(missing.clone()));
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        info!(
            form = %targets.form,
            result = %targets.result,
            encoding = %settings.encoding,
            "prediction form controller attached"
        );
        Ok(Self {
            inner: Arc::new(Inner {
                page,
                endpoint,
                targets,
                encoding: settings.encoding,
                result_label: settings.result_label.clone(),
                state: Mutex::new(ControllerState {
                    generation: 0,
                    phase: SubmissionPhase::Idle,
                    in_flight: None,
                }),
                events,
            }),
        })
    }

    /// Attaches with an HTTP endpoint built from `settings`.
    pub fn connect(
        page: Arc<P>,
        targets: DisplayTargets,
        settings: &ClientSettings,
    ) -> Result<Self> {
        let endpoint = HttpPredictionEndpoint::new(settings)?;
        Ok(Self::attach(page, targets, Arc::new(endpoint), settings)?)
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.inner.lock().phase
    }

    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    pub fn targets(&self) -> &DisplayTargets {
        &self.inner.targets
    }

    pub fn page(&self) -> &Arc<P> {
        &self.inner.page
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.inner.events.subscribe()
    }

    /// Runs one submission to completion. Failures end up as page text and a
    /// `Failed` outcome; nothing is returned as an error.
    pub async fn handle_submit(&self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();
        let generation = {
            let mut state = self.inner.lock();
            self.begin(&mut state)
        };
        self.run(generation).await
    }

    /// Spawns a submission onto the current tokio runtime, aborting the one
    /// still in flight. The generation is taken before the task starts.
    pub fn submit(&self) -> JoinHandle<SubmitOutcome> {
        let mut state = self.inner.lock();
        let generation = self.begin(&mut state);

        let this = self.clone();
        let handle = tokio::spawn(async move { this.run(generation).await });

        if let Some(previous) = state.in_flight.replace(handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Drops whatever submission is in flight and returns to idle. Returns
    /// whether one was running.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.lock();
        if let Some(task) = state.in_flight.take() {
            task.abort();
        }
        let was_processing = matches!(state.phase, SubmissionPhase::Processing { .. });
        state.generation += 1;
        state.phase = SubmissionPhase::Idle;
        let inner = &self.inner;
        inner.set_loading(false);
        if was_processing {
            inner.page.set_text(&inner.targets.result, "");
            if let Some(error) = &inner.targets.error {
                inner.page.set_text(error, "");
            }
        }
        let generation = state.generation;
        drop(state);

        if was_processing {
            info!(generation, "prediction request cancelled");
            self.inner.publish(SubmissionEvent::Cancelled { generation });
        }
        was_processing
    }

    /// Claims the next generation and shows the processing state. Runs under
    /// the caller's lock so generations reach the page in order.
    fn begin(&self, state: &mut ControllerState) -> u64 {
        let inner = &self.inner;
        state.generation += 1;
        let generation = state.generation;
        state.phase = SubmissionPhase::Processing { generation };

        inner.page.set_text(&inner.targets.result, PROCESSING_TEXT);
        if let Some(error) = &inner.targets.error {
            inner.page.set_text(error, "");
        }
        inner.set_loading(true);

        info!(generation, "submitting prediction request");
        inner.publish(SubmissionEvent::Started { generation });
        generation
    }

    async fn run(&self, generation: u64) -> SubmitOutcome {
        let _loading = LoadingGuard {
            inner: &self.inner,
            generation,
        };

        let result = self.exchange().await;
        self.finish(generation, result)
    }

    async fn exchange(&self) -> Result<String, SubmitError> {
        let inner = &self.inner;
        let form = inner
            .page
            .read_form(&inner.targets.form)
            .ok_or_else(|| SubmitError::MissingForm(inner.targets.form.clone()))?;
        let payload = FormPayload::build(&form, inner.encoding);
        let raw = inner.endpoint.post(payload).await?;
        interpret_response(&raw)
    }

    fn finish(&self, generation: u64, result: Result<String, SubmitError>) -> SubmitOutcome {
        let inner = &self.inner;
        let mut state = inner.lock();
        if state.generation != generation {
            debug!(
                generation,
                current = state.generation,
                "discarding stale prediction response"
            );
            return SubmitOutcome::Superseded { generation };
        }

        let outcome = match result {
            Ok(prediction) => {
                let text = format!("{}{prediction}", inner.result_label);
                inner.page.set_text(&inner.targets.result, &text);
                if let Some(error) = &inner.targets.error {
                    inner.page.set_text(error, "");
                }
                state.phase = SubmissionPhase::Succeeded { generation };
                info!(generation, %prediction, "prediction received");
                SubmitOutcome::Predicted { generation, text }
            }
            Err(err) => {
                log_failure(generation, &err);
                let text = err.display_text();
                match &inner.targets.error {
                    Some(error) => {
                        inner.page.set_text(&inner.targets.result, "");
                        inner.page.set_text(error, &text);
                    }
                    None => inner.page.set_text(&inner.targets.result, &text),
                }
                state.phase = SubmissionPhase::Failed { generation };
                SubmitOutcome::Failed { generation, text }
            }
        };
        drop(state);

        inner.publish(SubmissionEvent::Finished(outcome.clone()));
        outcome
    }
}

fn log_failure(generation: u64, err: &SubmitError) {
    match err {
        SubmitError::Http { status, .. } => {
            warn!(generation, status, "prediction endpoint returned an error: {err}")
        }
        SubmitError::Rejected(_) => {
            warn!(generation, "prediction endpoint declined the request: {err}")
        }
        SubmitError::Network(_) | SubmitError::Payload(_) | SubmitError::MissingForm(_) => {
            error!(generation, "prediction request failed: {err}")
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
