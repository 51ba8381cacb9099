//! Runtime bridge between UI command queue and backend event intake.

use std::{path::PathBuf, sync::Arc, thread};

use anyhow::Context;
use client_core::{
    ControllerEvent, DownloadRequest, HttpUpdateService, SaveAsTrigger, ServiceEndpoint,
    UpdateWorkflowController,
};
use crossbeam_channel::{Receiver, Sender};
use tokio::{runtime::Handle, sync::broadcast::error::RecvError};
use tracing::{info, warn};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorContext, UiEvent},
    media::decode_preview_image,
};

/// Fetches the drawing, then asks where to put it with a native save dialog.
struct NativeSaveAs {
    runtime: Handle,
    http: HttpUpdateService,
    ui_tx: Sender<UiEvent>,
}

impl SaveAsTrigger for NativeSaveAs {
    fn save_as(&self, request: DownloadRequest) {
        let http = self.http.clone();
        let ui_tx = self.ui_tx.clone();
        self.runtime.spawn(async move {
            let event = match save_drawing(&http, request).await {
                Ok(Some(path)) => UiEvent::Info(format!("Saved drawing to {}", path.display())),
                Ok(None) => return,
                Err(err) => UiEvent::Error(UiError::from_message(
                    UiErrorContext::Download,
                    format!("{err:#}"),
                )),
            };
            let _ = ui_tx.try_send(event);
        });
    }
}

async fn save_drawing(
    http: &HttpUpdateService,
    request: DownloadRequest,
) -> anyhow::Result<Option<PathBuf>> {
    let bytes = http
        .download(&request)
        .await
        .with_context(|| format!("failed to download {}", request.url))?;

    let filename = request.suggested_filename.clone();
    let target = tokio::task::spawn_blocking(move || {
        rfd::FileDialog::new()
            .set_file_name(&filename)
            .add_filter("PDF", &["pdf"])
            .save_file()
    })
    .await?;
    let Some(path) = target else {
        return Ok(None);
    };

    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(Some(path))
}

pub fn launch(endpoint: ServiceEndpoint, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_backend(endpoint, cmd_rx, ui_tx));
    });
}

async fn run_backend(
    endpoint: ServiceEndpoint,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let http = HttpUpdateService::new();
    let controller = Arc::new(UpdateWorkflowController::new(endpoint, http.clone()));

    let mut events = controller.subscribe();
    let events_tx = ui_tx.clone();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(ControllerEvent::StateChanged(state)) => {
                    if let Err(err) = events_tx.try_send(UiEvent::WorkflowChanged(state)) {
                        warn!("dropped workflow update for the ui: {err}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "ui forwarder lagged behind workflow events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let save_as = NativeSaveAs {
        runtime: Handle::current(),
        http: http.clone(),
        ui_tx: ui_tx.clone(),
    };
    info!(endpoint = %controller.endpoint(), "backend worker ready");
    let _ = ui_tx.try_send(UiEvent::BackendReady);

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Submit { form } => {
                let controller = Arc::clone(&controller);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = controller.submit_form(form).await {
                        let _ = ui_tx.try_send(UiEvent::SubmitRejected(UiError::from_message(
                            UiErrorContext::Submit,
                            err.to_string(),
                        )));
                    }
                });
            }
            BackendCommand::FetchPreview { url } => {
                let http = http.clone();
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let event = match fetch_preview(&http, &url).await {
                        Ok(image) => UiEvent::PreviewLoaded { url, image },
                        Err(reason) => UiEvent::PreviewFailed {
                            url,
                            error: UiError::from_message(UiErrorContext::Preview, reason),
                        },
                    };
                    let _ = ui_tx.try_send(event);
                });
            }
            BackendCommand::DownloadPdf => {
                if !controller.download_pdf(&save_as).await {
                    let _ = ui_tx.try_send(UiEvent::Info(
                        "No drawing is ready to download yet".to_string(),
                    ));
                }
            }
        }
    }
    info!("ui command queue closed; backend worker stopping");
}

async fn fetch_preview(
    http: &HttpUpdateService,
    url: &str,
) -> Result<crate::media::PreviewImage, String> {
    let bytes = http
        .fetch_preview(url)
        .await
        .map_err(|err| format!("Failed to download preview: {err}"))?;
    tokio::task::spawn_blocking(move || decode_preview_image(&bytes))
        .await
        .map_err(|err| format!("Preview decoder stopped: {err}"))?
}
