use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use client_core::{
    config::LOCAL_DEV_API_URL, load_settings, DownloadRequest, FormInput, SaveAsTrigger,
    ServiceEndpoint, Settings, UpdateWorkflowController,
};
use shared::domain::StatusKind;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "flap-cli",
    about = "Update the flap length on the model service and fetch the drawing"
)]
struct Args {
    /// Flap length, as a number.
    #[arg(long, allow_hyphen_values = true)]
    length: String,
    #[arg(long, default_value = "")]
    drawn_by: String,
    #[arg(long, default_value = "")]
    checked_by: String,
    #[arg(long, default_value = "")]
    approved: String,
    /// Sign-off date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date: Option<String>,
    #[arg(long, conflicts_with = "local")]
    api_url: Option<String>,
    /// Use the service on this machine.
    #[arg(long)]
    local: bool,
    /// Save the generated PDF here (file or directory).
    #[arg(long)]
    download: Option<PathBuf>,
}

/// Keeps the save-as request so it can be awaited before the process exits.
#[derive(Default)]
struct DeferredDownload {
    request: Mutex<Option<DownloadRequest>>,
}

impl DeferredDownload {
    fn take(&self) -> Option<DownloadRequest> {
        self.request.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl SaveAsTrigger for DeferredDownload {
    fn save_as(&self, request: DownloadRequest) {
        if let Ok(mut slot) = self.request.lock() {
            *slot = Some(request);
        }
    }
}

fn resolve_api_url(args: &Args, settings: Settings) -> String {
    if args.local {
        return LOCAL_DEV_API_URL.to_string();
    }
    args.api_url.clone().unwrap_or(settings.api_url)
}

fn build_form(args: &Args) -> FormInput {
    let mut form = FormInput::default();
    form.set_length(args.length.as_str());
    form.set_drawn_by(&args.drawn_by);
    form.set_checked_by(&args.checked_by);
    form.set_approved(&args.approved);
    if let Some(date) = &args.date {
        form.set_date(date.as_str());
    }
    form
}

fn download_target(path: &Path, suggested_filename: &str) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_filename)
    } else {
        path.to_path_buf()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let api_url = resolve_api_url(&args, load_settings());
    let endpoint = ServiceEndpoint::parse(&api_url)?;
    let controller = UpdateWorkflowController::over_http(endpoint);

    controller
        .submit_form(build_form(&args))
        .await
        .context("update not submitted")?;

    let state = controller.snapshot().await;
    let message = state
        .last_message()
        .ok_or_else(|| anyhow!("submission finished without a status"))?;
    if message.kind == StatusKind::Error {
        bail!("update failed: {}", message.text);
    }
    println!("{}", message.text);
    if let Some(preview_url) = state.preview_url() {
        println!("preview: {preview_url}");
    }

    let Some(path) = args.download.as_deref() else {
        if let Some(pdf_url) = state.pdf_url() {
            println!("pdf: {pdf_url}");
        }
        return Ok(());
    };

    let deferred = DeferredDownload::default();
    if !controller.download_pdf(&deferred).await {
        bail!("the service did not report a ready PDF drawing");
    }
    let request = deferred
        .take()
        .ok_or_else(|| anyhow!("download was not started"))?;

    let bytes = controller
        .transport()
        .download(&request)
        .await
        .with_context(|| format!("failed to download {}", request.url))?;
    let target = download_target(path, &request.suggested_filename);
    tokio::fs::write(&target, bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("saved drawing to {}", target.display());

    Ok(())
}
