//! View state of the flap window and the transitions driven by UI events.

use client_core::{submit_enabled, FormInput, WorkflowState};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiEvent},
    media::PreviewImage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerSeverity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBanner {
    pub severity: BannerSeverity,
    pub message: String,
}

impl StatusBanner {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: BannerSeverity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: BannerSeverity::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub enum PreviewState {
    #[default]
    Empty,
    Loading {
        url: String,
    },
    Ready {
        url: String,
        image: PreviewImage,
    },
    Failed {
        url: String,
        reason: String,
    },
}

impl PreviewState {
    pub fn url(&self) -> Option<&str> {
        match self {
            PreviewState::Empty => None,
            PreviewState::Loading { url }
            | PreviewState::Ready { url, .. }
            | PreviewState::Failed { url, .. } => Some(url),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub form: FormInput,
    pub workflow: WorkflowState,
    /// A submit was queued but the backend has not picked it up yet.
    pub submit_queued: bool,
    pub preview: PreviewState,
    pub banner: Option<StatusBanner>,
    pub backend_ready: bool,
}

impl ViewState {
    pub fn submit_enabled(&self) -> bool {
        self.backend_ready && !self.submit_queued && submit_enabled(&self.form, &self.workflow)
    }

    pub fn busy(&self) -> bool {
        self.submit_queued || self.workflow.loading()
    }

    /// The submit trigger; `None` while it is disabled.
    pub fn request_submit(&mut self) -> Option<BackendCommand> {
        if !self.submit_enabled() {
            return None;
        }
        self.submit_queued = true;
        self.banner = None;
        Some(BackendCommand::Submit {
            form: self.form.clone(),
        })
    }

    pub fn request_download(&self) -> Option<BackendCommand> {
        self.workflow
            .pdf_ready()
            .then_some(BackendCommand::DownloadPdf)
    }

    /// Applies one backend event; may ask for a follow-up command.
    pub fn apply(&mut self, event: UiEvent) -> Option<BackendCommand> {
        match event {
            UiEvent::BackendReady => {
                self.backend_ready = true;
                None
            }
            UiEvent::Info(message) => {
                self.banner = Some(StatusBanner::info(message));
                None
            }
            UiEvent::Error(err) => {
                log_ui_error(&err);
                self.banner = Some(StatusBanner::error(err.display_text()));
                None
            }
            UiEvent::SubmitRejected(err) => {
                log_ui_error(&err);
                self.submit_queued = false;
                self.banner = Some(StatusBanner::error(err.display_text()));
                None
            }
            UiEvent::WorkflowChanged(state) => {
                // Any snapshot means the backend has taken the queued submit.
                self.submit_queued = false;
                let follow_up = self.sync_preview(state.preview_url());
                self.workflow = state;
                follow_up
            }
            UiEvent::PreviewLoaded { url, image } => {
                if self.preview.url() == Some(url.as_str()) {
                    self.preview = PreviewState::Ready { url, image };
                } else {
                    tracing::debug!(url = %url, "discarding stale preview image");
                }
                None
            }
            UiEvent::PreviewFailed { url, error } => {
                log_ui_error(&error);
                if self.preview.url() == Some(url.as_str()) {
                    self.preview = PreviewState::Failed {
                        url,
                        reason: error.message().to_string(),
                    };
                }
                None
            }
        }
    }

    fn sync_preview(&mut self, preview_url: Option<&str>) -> Option<BackendCommand> {
        match preview_url {
            None => {
                self.preview = PreviewState::Empty;
                None
            }
            Some(url) if self.preview.url() == Some(url) => None,
            Some(url) => {
                self.preview = PreviewState::Loading {
                    url: url.to_string(),
                };
                Some(BackendCommand::FetchPreview {
                    url: url.to_string(),
                })
            }
        }
    }
}

fn log_ui_error(err: &UiError) {
    tracing::warn!(
        context = ?err.context(),
        category = ?err.category(),
        "{}",
        err.message()
    );
}

#[cfg(test)]
mod tests {
    use client_core::SubmissionResult;

    use super::*;
    use crate::controller::events::UiErrorContext;

    fn ready_view() -> ViewState {
        let mut view = ViewState::default();
        view.apply(UiEvent::BackendReady);
        view.form.set_length("42");
        view
    }

    fn finished(result: SubmissionResult) -> WorkflowState {
        let mut state = WorkflowState::default();
        state.begin_submission();
        state.apply_result(result);
        state
    }

    fn loading() -> WorkflowState {
        let mut state = WorkflowState::default();
        state.begin_submission();
        state
    }

    fn tiny_image() -> PreviewImage {
        PreviewImage {
            width: 1,
            height: 1,
            rgba: vec![0, 0, 0, 255],
        }
    }

    #[test]
    fn submit_waits_for_backend_and_valid_length() {
        let mut view = ViewState::default();
        view.form.set_length("42");
        assert!(view.request_submit().is_none());

        view.apply(UiEvent::BackendReady);
        view.form.set_length("");
        assert!(view.request_submit().is_none());

        view.form.set_length("42");
        assert!(matches!(
            view.request_submit(),
            Some(BackendCommand::Submit { .. })
        ));
    }

    #[test]
    fn queued_submit_disables_trigger_until_backend_reports() {
        let mut view = ready_view();
        assert!(view.request_submit().is_some());
        assert!(view.busy());
        assert!(view.request_submit().is_none());

        view.apply(UiEvent::WorkflowChanged(loading()));
        assert!(!view.submit_queued);
        assert!(view.busy());
        assert!(!view.submit_enabled());
    }

    #[test]
    fn rejection_reenables_submit_and_shows_reason() {
        let mut view = ready_view();
        view.request_submit();
        view.apply(UiEvent::SubmitRejected(UiError::from_message(
            UiErrorContext::Submit,
            "a submission is already in flight",
        )));
        assert!(view.submit_enabled());
        assert_eq!(
            view.banner,
            Some(StatusBanner::error(
                "Check the form: a submission is already in flight"
            ))
        );
    }

    #[test]
    fn finished_snapshot_alone_releases_queued_submit() {
        let mut view = ready_view();
        assert!(view.request_submit().is_some());

        view.apply(UiEvent::WorkflowChanged(finished(SubmissionResult::Success {
            message: "OK".into(),
            preview_url: None,
            pdf_url: None,
        })));
        assert!(!view.busy());
        assert!(view.submit_enabled());
    }

    #[test]
    fn preview_failure_keeps_reason_for_current_url() {
        let mut view = ready_view();
        view.apply(UiEvent::WorkflowChanged(finished(SubmissionResult::Success {
            message: "OK".into(),
            preview_url: Some("http://svc/p.png".into()),
            pdf_url: None,
        })));

        view.apply(UiEvent::PreviewFailed {
            url: "http://svc/p.png".into(),
            error: UiError::from_message(UiErrorContext::Preview, "unsupported image format"),
        });
        assert!(matches!(
            view.preview,
            PreviewState::Failed { ref reason, .. } if reason == "unsupported image format"
        ));
    }

    #[test]
    fn new_preview_url_requests_fetch_once() {
        let mut view = ready_view();
        let state = finished(SubmissionResult::Success {
            message: "OK".into(),
            preview_url: Some("http://svc/p.png".into()),
            pdf_url: None,
        });

        let follow_up = view.apply(UiEvent::WorkflowChanged(state.clone()));
        assert!(matches!(
            follow_up,
            Some(BackendCommand::FetchPreview { ref url }) if url == "http://svc/p.png"
        ));
        assert!(view.apply(UiEvent::WorkflowChanged(state)).is_none());
    }

    #[test]
    fn stale_preview_images_are_discarded() {
        let mut view = ready_view();
        view.apply(UiEvent::WorkflowChanged(finished(SubmissionResult::Success {
            message: "OK".into(),
            preview_url: Some("http://svc/new.png".into()),
            pdf_url: None,
        })));

        view.apply(UiEvent::PreviewLoaded {
            url: "http://svc/old.png".into(),
            image: tiny_image(),
        });
        assert!(matches!(view.preview, PreviewState::Loading { .. }));

        view.apply(UiEvent::PreviewLoaded {
            url: "http://svc/new.png".into(),
            image: tiny_image(),
        });
        assert!(matches!(view.preview, PreviewState::Ready { .. }));
    }

    #[test]
    fn resubmission_clears_preview_and_download() {
        let mut view = ready_view();
        view.apply(UiEvent::WorkflowChanged(finished(SubmissionResult::Success {
            message: "OK".into(),
            preview_url: Some("http://svc/p.png".into()),
            pdf_url: Some("http://svc/d.pdf".into()),
        })));
        assert!(view.request_download().is_some());

        view.apply(UiEvent::WorkflowChanged(loading()));
        assert!(view.request_download().is_none());
        assert!(matches!(view.preview, PreviewState::Empty));
    }

    #[test]
    fn transport_failure_keeps_download_hidden() {
        let mut view = ready_view();
        view.apply(UiEvent::WorkflowChanged(finished(
            SubmissionResult::transport_failure(),
        )));
        assert!(view.request_download().is_none());
        assert!(view.submit_enabled());
    }

    #[test]
    fn errors_become_banners() {
        let mut view = ready_view();
        view.apply(UiEvent::Error(UiError::from_message(
            UiErrorContext::Download,
            "failed to write /x: Permission denied",
        )));
        let banner = view.banner.expect("banner");
        assert_eq!(banner.severity, BannerSeverity::Error);
        assert!(banner.message.contains("Permission denied"));
    }
}
