//! Submission lifecycle state and its transitions.
//!
//! `Idle -> Submitting -> {Succeeded, Failed}`; starting a new submission
//! drops every artifact of the previous result before the request is sent.

use shared::{domain::StatusKind, protocol::UpdateModelResponse};

use crate::{config::ServiceEndpoint, form::FormInput};

pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Could not connect to server. Make sure the API is running.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// What the service answered, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    pub body: UpdateModelResponse,
}

impl ServiceReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Interpreted outcome of one submission attempt. URLs are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Success {
        message: String,
        preview_url: Option<String>,
        pdf_url: Option<String>,
    },
    Failure {
        message: String,
    },
}

impl SubmissionResult {
    pub fn from_reply(reply: ServiceReply, endpoint: &ServiceEndpoint) -> Self {
        if !reply.is_success() {
            return Self::Failure {
                message: reply.body.message,
            };
        }

        let preview_url = reply.body.preview_path().map(|path| endpoint.resolve(path));
        let pdf_url = reply.body.ready_pdf_path().map(|path| endpoint.resolve(path));
        Self::Success {
            message: reply.body.message,
            preview_url,
            pdf_url,
        }
    }

    pub fn transport_failure() -> Self {
        Self::Failure {
            message: TRANSPORT_FAILURE_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Submitting,
    Succeeded { has_preview: bool, has_pdf: bool },
    Failed,
}

/// Everything the form renders from. `pdf_ready` holds exactly when a PDF
/// URL from the latest successful result is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowState {
    loading: bool,
    preview_url: Option<String>,
    pdf_url: Option<String>,
    last_message: Option<StatusMessage>,
}

impl WorkflowState {
    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn preview_url(&self) -> Option<&str> {
        self.preview_url.as_deref()
    }

    pub fn pdf_ready(&self) -> bool {
        self.pdf_url.is_some()
    }

    pub fn pdf_url(&self) -> Option<&str> {
        self.pdf_url.as_deref()
    }

    pub fn last_message(&self) -> Option<&StatusMessage> {
        self.last_message.as_ref()
    }

    pub fn phase(&self) -> SubmissionPhase {
        if self.loading {
            return SubmissionPhase::Submitting;
        }
        match &self.last_message {
            None => SubmissionPhase::Idle,
            Some(message) if message.kind.is_success() => SubmissionPhase::Succeeded {
                has_preview: self.preview_url.is_some(),
                has_pdf: self.pdf_url.is_some(),
            },
            Some(_) => SubmissionPhase::Failed,
        }
    }

    pub fn begin_submission(&mut self) {
        self.loading = true;
        self.preview_url = None;
        self.pdf_url = None;
        self.last_message = None;
    }

    pub fn apply_result(&mut self, result: SubmissionResult) {
        match result {
            SubmissionResult::Success {
                message,
                preview_url,
                pdf_url,
            } => {
                self.last_message = Some(StatusMessage::success(message));
                if preview_url.is_some() {
                    self.preview_url = preview_url;
                }
                if pdf_url.is_some() {
                    self.pdf_url = pdf_url;
                }
            }
            SubmissionResult::Failure { message } => {
                self.last_message = Some(StatusMessage::error(message));
            }
        }
        self.loading = false;
    }
}

/// Whether the submit trigger may fire.
pub fn submit_enabled(form: &FormInput, state: &WorkflowState) -> bool {
    !state.loading() && form.has_valid_length()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> ServiceEndpoint {
        ServiceEndpoint::parse("http://svc:5075").expect("endpoint")
    }

    fn reply(status: u16, json: &str) -> ServiceReply {
        ServiceReply {
            status,
            body: serde_json::from_str(json).expect("body"),
        }
    }

    #[test]
    fn success_reply_resolves_paths() {
        let result = SubmissionResult::from_reply(
            reply(
                200,
                r#"{"message":"OK","previewUrl":"/p.png","pdfReady":true,"pdfUrl":"/d.pdf"}"#,
            ),
            &endpoint(),
        );
        assert_eq!(
            result,
            SubmissionResult::Success {
                message: "OK".into(),
                preview_url: Some("http://svc:5075/p.png".into()),
                pdf_url: Some("http://svc:5075/d.pdf".into()),
            }
        );
    }

    #[test]
    fn failure_status_ignores_artifacts() {
        let result = SubmissionResult::from_reply(
            reply(
                409,
                r#"{"message":"Model locked","previewUrl":"/p.png","pdfReady":true,"pdfUrl":"/d.pdf"}"#,
            ),
            &endpoint(),
        );
        assert_eq!(
            result,
            SubmissionResult::Failure {
                message: "Model locked".into()
            }
        );
    }

    #[test]
    fn begin_clears_previous_artifacts() {
        let mut state = WorkflowState::default();
        state.begin_submission();
        state.apply_result(SubmissionResult::Success {
            message: "OK".into(),
            preview_url: Some("http://svc/p.png".into()),
            pdf_url: Some("http://svc/d.pdf".into()),
        });
        assert!(state.pdf_ready());
        assert_eq!(
            state.phase(),
            SubmissionPhase::Succeeded {
                has_preview: true,
                has_pdf: true
            }
        );

        state.begin_submission();
        assert!(state.loading());
        assert!(!state.pdf_ready());
        assert_eq!(state.pdf_url(), None);
        assert_eq!(state.preview_url(), None);
        assert_eq!(state.last_message(), None);
        assert_eq!(state.phase(), SubmissionPhase::Submitting);
    }

    #[test]
    fn transport_failure_sets_fixed_error() {
        let mut state = WorkflowState::default();
        state.begin_submission();
        state.apply_result(SubmissionResult::transport_failure());
        assert!(!state.loading());
        assert_eq!(
            state.last_message(),
            Some(&StatusMessage::error(TRANSPORT_FAILURE_MESSAGE))
        );
        assert_eq!(state.phase(), SubmissionPhase::Failed);
    }

    #[test]
    fn submit_enabled_requires_idle_and_numeric_length() {
        let mut form = FormInput::default();
        let mut state = WorkflowState::default();
        assert!(!submit_enabled(&form, &state));

        form.set_length("12.5");
        assert!(submit_enabled(&form, &state));

        form.set_length("twelve");
        assert!(!submit_enabled(&form, &state));

        form.set_length("12.5");
        state.begin_submission();
        assert!(!submit_enabled(&form, &state));
    }
}
