mod backend_bridge;
mod controller;
mod media;
mod ui;

use clap::Parser;
use client_core::{config::LOCAL_DEV_API_URL, load_settings, ServiceEndpoint, Settings};
use crossbeam_channel::bounded;
use tracing_subscriber::EnvFilter;

use crate::{backend_bridge::commands::BackendCommand, controller::events::UiEvent};

#[derive(Parser, Debug)]
#[command(name = "flap-controller", about = "Desktop window for flap model updates")]
struct Args {
    #[arg(long, conflicts_with = "local")]
    api_url: Option<String>,
    /// Use the service on this machine.
    #[arg(long)]
    local: bool,
}

fn resolve_api_url(args: &Args, settings: Settings) -> String {
    if args.local {
        return LOCAL_DEV_API_URL.to_string();
    }
    args.api_url.clone().unwrap_or(settings.api_url)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let endpoint = ServiceEndpoint::parse(&resolve_api_url(&args, load_settings()))?;
    let endpoint_label = endpoint.to_string();
    tracing::info!(endpoint = %endpoint_label, "starting flap controller window");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(endpoint, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Flap Controller")
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flap Controller",
        options,
        Box::new(|_cc| {
            Ok(Box::new(ui::FlapControllerApp::new(
                cmd_tx,
                ui_rx,
                endpoint_label,
            )))
        }),
    )
    .map_err(|err| anyhow::anyhow!("flap controller window failed: {err}"))
}
