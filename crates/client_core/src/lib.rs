use shared::error::FieldError;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

pub mod config;
pub mod download;
pub mod form;
pub mod transport;
pub mod workflow;

pub use config::{load_settings, ServiceEndpoint, Settings, SettingsError};
pub use download::{DownloadRequest, SaveAsTrigger};
pub use form::FormInput;
pub use transport::{HttpUpdateService, TransportError, UpdateTransport};
pub use workflow::{
    submit_enabled, StatusMessage, SubmissionPhase, SubmissionResult, WorkflowState,
    TRANSPORT_FAILURE_MESSAGE,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SubmitRejected {
    #[error("a submission is already in flight")]
    InFlight,
    #[error(transparent)]
    InvalidForm(#[from] FieldError),
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    StateChanged(WorkflowState),
}

struct ControllerInner {
    form: FormInput,
    state: WorkflowState,
}

/// Owns the flap form and its submission lifecycle against one service
/// endpoint. At most one submission is in flight at a time.
pub struct UpdateWorkflowController<T: UpdateTransport = HttpUpdateService> {
    endpoint: ServiceEndpoint,
    transport: T,
    inner: Mutex<ControllerInner>,
    events: broadcast::Sender<ControllerEvent>,
}

impl UpdateWorkflowController<HttpUpdateService> {
    pub fn over_http(endpoint: ServiceEndpoint) -> Self {
        Self::new(endpoint, HttpUpdateService::new())
    }
}

impl<T: UpdateTransport> UpdateWorkflowController<T> {
    pub fn new(endpoint: ServiceEndpoint, transport: T) -> Self {
        Self::with_form(endpoint, transport, FormInput::default())
    }

    pub fn with_form(endpoint: ServiceEndpoint, transport: T, form: FormInput) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            endpoint,
            transport,
            inner: Mutex::new(ControllerInner {
                form,
                state: WorkflowState::default(),
            }),
            events,
        }
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowState {
        self.inner.lock().await.state.clone()
    }

    pub async fn form(&self) -> FormInput {
        self.inner.lock().await.form.clone()
    }

    pub async fn submit_enabled(&self) -> bool {
        let guard = self.inner.lock().await;
        submit_enabled(&guard.form, &guard.state)
    }

    pub async fn set_length(&self, raw: &str) {
        self.inner.lock().await.form.set_length(raw);
    }

    pub async fn set_drawn_by(&self, raw: &str) {
        self.inner.lock().await.form.set_drawn_by(raw);
    }

    pub async fn set_checked_by(&self, raw: &str) {
        self.inner.lock().await.form.set_checked_by(raw);
    }

    pub async fn set_approved(&self, raw: &str) {
        self.inner.lock().await.form.set_approved(raw);
    }

    pub async fn set_date(&self, raw: &str) {
        self.inner.lock().await.form.set_date(raw);
    }

    pub async fn replace_form(&self, form: FormInput) {
        self.inner.lock().await.form = form;
    }

    /// Submits the current form.
    ///
    /// The returned future must be driven to completion: the loading flag is
    /// only cleared once the request has finished or failed.
    pub async fn submit(&self) -> Result<(), SubmitRejected> {
        self.run_submission(None).await
    }

    /// Stores `form` and submits it under the same lock, so no other edit or
    /// submission can interleave between the two.
    pub async fn submit_form(&self, form: FormInput) -> Result<(), SubmitRejected> {
        self.run_submission(Some(form)).await
    }

    async fn run_submission(&self, form: Option<FormInput>) -> Result<(), SubmitRejected> {
        let request = {
            let mut guard = self.inner.lock().await;
            if guard.state.loading() {
                warn!("submission rejected: another submission is in flight");
                return Err(SubmitRejected::InFlight);
            }
            if let Some(form) = form {
                guard.form = form;
            }
            let request = guard.form.to_request()?;
            guard.state.begin_submission();
            self.publish(&guard.state);
            request
        };

        let url = self.endpoint.update_url();
        info!(
            length = request.length,
            drawn_by = %request.drawn_by,
            checked_by = %request.checked_by,
            approved = %request.approved,
            "submitting flap update"
        );

        let result = match self.transport.post_update(&url, &request).await {
            Ok(reply) => {
                if reply.is_success() {
                    info!(
                        status = reply.status,
                        preview = reply.body.preview_path().is_some(),
                        pdf_ready = reply.body.ready_pdf_path().is_some(),
                        "flap update accepted"
                    );
                } else {
                    warn!(
                        status = reply.status,
                        message = %reply.body.message,
                        "flap update rejected by service"
                    );
                }
                SubmissionResult::from_reply(reply, &self.endpoint)
            }
            Err(err) => {
                error!("flap update transport failure: {err}");
                SubmissionResult::transport_failure()
            }
        };

        let mut guard = self.inner.lock().await;
        guard.state.apply_result(result);
        self.publish(&guard.state);
        Ok(())
    }

    /// Hands the ready PDF to `trigger`. Returns false when no PDF is ready.
    pub async fn download_pdf(&self, trigger: &dyn SaveAsTrigger) -> bool {
        let pdf_url = {
            let guard = self.inner.lock().await;
            match guard.state.pdf_url() {
                Some(url) => url.to_string(),
                None => return false,
            }
        };

        match DownloadRequest::for_pdf(&pdf_url) {
            Ok(request) => {
                info!(url = %request.url, "starting drawing download");
                trigger.save_as(request);
                true
            }
            Err(err) => {
                warn!(pdf_url = %pdf_url, "cannot build download url: {err}");
                false
            }
        }
    }

    fn publish(&self, state: &WorkflowState) {
        // No subscribers is fine.
        let _ = self
            .events
            .send(ControllerEvent::StateChanged(state.clone()));
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
