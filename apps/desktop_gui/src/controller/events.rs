//! UI/backend events and error modeling for the flap controller window.

use client_core::WorkflowState;

use crate::media::PreviewImage;

#[derive(Debug)]
pub enum UiEvent {
    BackendReady,
    Info(String),
    Error(UiError),
    WorkflowChanged(WorkflowState),
    SubmitRejected(UiError),
    PreviewLoaded { url: String, image: PreviewImage },
    PreviewFailed { url: String, error: UiError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
    Filesystem,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Submit,
    Preview,
    Download,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Connection problem",
        UiErrorCategory::Validation => "Check the form",
        UiErrorCategory::Filesystem => "Could not save",
        UiErrorCategory::Unknown => "Error",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("must be")
            || lower.contains("invalid")
            || lower.contains("already in flight")
        {
            UiErrorCategory::Validation
        } else if lower.contains("permission denied")
            || lower.contains("failed to write")
            || lower.contains("read-only")
        {
            UiErrorCategory::Filesystem
        } else if lower.contains("timed out")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("failed to reach")
            || lower.contains("error sending request")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn display_text(&self) -> String {
        format!("{}: {}", err_label(self.category), self.message)
    }
}
