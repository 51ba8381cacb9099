//! The flap controller window: form, status line, live preview and drawing download.

use crossbeam_channel::{Receiver, Sender};
use egui::TextureHandle;
use shared::domain::{Initials, MAX_INITIALS_CHARS};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::UiEvent,
        orchestration::dispatch_backend_command,
        reducer::{BannerSeverity, PreviewState, StatusBanner, ViewState},
    },
    media::PreviewImage,
};

const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(46, 160, 67);
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(218, 54, 51);
const FORM_WIDTH: f32 = 320.0;
const PREVIEW_MAX_WIDTH: f32 = 560.0;

/// A click collected while drawing; handled once the frame's borrows end.
enum FormAction {
    Submit,
    Download,
}

pub struct FlapControllerApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    endpoint_label: String,
    view: ViewState,
    preview_texture: Option<(String, TextureHandle)>,
}

impl FlapControllerApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        endpoint_label: String,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            endpoint_label,
            view: ViewState::default(),
            preview_texture: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            if let Some(cmd) = self.view.apply(event) {
                self.queue(cmd);
            }
        }
    }

    fn queue(&mut self, cmd: BackendCommand) {
        if let Err(reason) = dispatch_backend_command(&self.cmd_tx, cmd) {
            tracing::warn!(%reason, "backend command not queued");
            self.view.submit_queued = false;
            self.view.banner = Some(StatusBanner::error(reason));
        }
    }

    fn handle(&mut self, action: FormAction) {
        let cmd = match action {
            FormAction::Submit => self.view.request_submit(),
            FormAction::Download => self.view.request_download(),
        };
        if let Some(cmd) = cmd {
            self.queue(cmd);
        }
    }

    fn show_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.view.banner.clone() else {
            return;
        };
        let (fill, stroke) = match banner.severity {
            BannerSeverity::Info => (
                egui::Color32::from_rgb(40, 70, 110),
                egui::Stroke::new(1.0, egui::Color32::from_rgb(90, 130, 180)),
            ),
            BannerSeverity::Error => (
                egui::Color32::from_rgb(111, 53, 53),
                egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
            ),
        };

        egui::Frame::NONE
            .fill(fill)
            .stroke(stroke)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Dismiss").clicked() {
                            self.view.banner = None;
                        }
                    });
                });
            });
        ui.add_space(8.0);
    }

    fn show_form(&mut self, ui: &mut egui::Ui) -> Option<FormAction> {
        let mut action = None;

        ui.label(egui::RichText::new("Flap length").strong());
        let mut length = self.view.form.length().to_string();
        let length_field = egui::TextEdit::singleline(&mut length)
            .hint_text("e.g. 120.5")
            .desired_width(f32::INFINITY);
        if ui.add(length_field).changed() {
            self.view.form.set_length(length);
        }
        ui.add_space(8.0);

        egui::Grid::new("sign_off_fields")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .show(ui, |ui| {
                ui.label("Date");
                let mut date = self.view.form.date().to_string();
                if ui
                    .add(egui::TextEdit::singleline(&mut date).hint_text("YYYY-MM-DD"))
                    .changed()
                {
                    self.view.form.set_date(date);
                }
                ui.end_row();

                ui.label("Drawn by");
                if let Some(raw) = initials_field(ui, self.view.form.drawn_by()) {
                    self.view.form.set_drawn_by(&raw);
                }
                ui.end_row();

                ui.label("Checked by");
                if let Some(raw) = initials_field(ui, self.view.form.checked_by()) {
                    self.view.form.set_checked_by(&raw);
                }
                ui.end_row();

                ui.label("Approved");
                if let Some(raw) = initials_field(ui, self.view.form.approved()) {
                    self.view.form.set_approved(&raw);
                }
                ui.end_row();
            });
        ui.add_space(12.0);

        ui.horizontal(|ui| {
            let busy = self.view.busy();
            let label = if busy { "Processing..." } else { "Update Model" };
            let button = egui::Button::new(egui::RichText::new(label).strong())
                .min_size(egui::vec2(180.0, 32.0));
            if ui.add_enabled(self.view.submit_enabled(), button).clicked() {
                action = Some(FormAction::Submit);
            }
            if busy {
                ui.spinner();
            }
        });

        if let Some(status) = self.view.workflow.last_message() {
            ui.add_space(8.0);
            let color = if status.kind.is_success() {
                SUCCESS_COLOR
            } else {
                ERROR_COLOR
            };
            ui.colored_label(color, status.text.as_str());
        }

        if self.view.workflow.pdf_ready() {
            ui.add_space(8.0);
            if ui.button("Download Drawing PDF").clicked() {
                action = Some(FormAction::Download);
            }
        }

        action
    }

    fn show_preview(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("LIVE PREVIEW").small().weak());
        ui.add_space(4.0);

        match &self.view.preview {
            PreviewState::Empty => {
                ui.weak("Submit an update to see the model preview.");
            }
            PreviewState::Loading { .. } => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading preview...");
                });
            }
            PreviewState::Ready { url, image } => {
                let texture = preview_texture(&mut self.preview_texture, ui.ctx(), url, image);
                ui.add(egui::Image::new(&texture).max_width(PREVIEW_MAX_WIDTH));
            }
            PreviewState::Failed { reason, .. } => {
                ui.colored_label(ERROR_COLOR, format!("Preview unavailable: {reason}"));
            }
        }
    }
}

/// Draws a single initials box; returns the raw text when the user edited it.
fn initials_field(ui: &mut egui::Ui, current: &Initials) -> Option<String> {
    let mut raw = current.as_str().to_string();
    let field = egui::TextEdit::singleline(&mut raw)
        .char_limit(MAX_INITIALS_CHARS)
        .desired_width(60.0);
    ui.add(field).changed().then_some(raw)
}

fn preview_texture(
    cache: &mut Option<(String, TextureHandle)>,
    ctx: &egui::Context,
    url: &str,
    image: &PreviewImage,
) -> TextureHandle {
    if let Some((cached_url, texture)) = cache {
        if cached_url == url {
            return texture.clone();
        }
    }
    let color_image =
        egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
    let texture = ctx.load_texture(
        format!("flap-preview:{url}"),
        color_image,
        egui::TextureOptions::LINEAR,
    );
    *cache = Some((url.to_string(), texture.clone()));
    texture
}

impl eframe::App for FlapControllerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Flap Controller");
            ui.weak("Update flap dimensions directly from the desktop.");
            ui.small(egui::RichText::new(format!("Service: {}", self.endpoint_label)).weak());
            ui.add_space(12.0);

            self.show_banner(ui);

            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(FORM_WIDTH);
                    action = self.show_form(ui);
                });
                ui.separator();
                ui.vertical(|ui| self.show_preview(ui));
            });
        });

        if let Some(action) = action {
            self.handle(action);
        }

        if self.view.busy() || matches!(self.view.preview, PreviewState::Loading { .. }) {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
