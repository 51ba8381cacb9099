//! Backend commands queued from UI to backend worker.

use client_core::FormInput;

#[derive(Debug)]
pub enum BackendCommand {
    Submit { form: FormInput },
    FetchPreview { url: String },
    DownloadPdf,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Submit { .. } => "submit",
            BackendCommand::FetchPreview { .. } => "fetch_preview",
            BackendCommand::DownloadPdf => "download_pdf",
        }
    }
}
