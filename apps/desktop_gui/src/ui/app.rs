use std::path::{Path, PathBuf};

use client_core::{
    ArtifactKind, CandidateFile, DownloadArtifact, FileSource, Session, Settings, UploadIntake,
    ViewAction, ViewState,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::{GenerationResult, ImagePreview};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{events::UiEvent, orchestration::start_generation, reducer::apply_event};

pub const APP_TITLE: &str = "Memoji Magic AI";
pub const SETTINGS_STORAGE_KEY: &str = "memoji_desktop_settings";

const TAGLINE: &str = "Turn Your Photo into a Unique 3D Avatar";
const CONTENT_WIDTH: f32 = 720.0;
const IMAGE_SIZE: f32 = 300.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDesktopSettings {
    pub last_save_dir: Option<PathBuf>,
}

/// Textures for the success view, decoded once per attempt.
struct ResultTextures {
    preview: egui::TextureHandle,
    avatar: egui::TextureHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiAction {
    PickPhoto,
    Reset,
    Save(ArtifactKind),
}

pub struct MemojiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    session: Session,
    intake: UploadIntake,
    status: String,
    textures: Option<ResultTextures>,
    last_save_dir: Option<PathBuf>,
}

impl MemojiApp {
    pub fn new(
        settings: &Settings,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        persisted: Option<PersistedDesktopSettings>,
        startup_status: Option<String>,
    ) -> Self {
        let persisted = persisted.unwrap_or_default();
        let status = match startup_status {
            Some(status) => status,
            None if !settings.has_api_key() => {
                "No API key configured; set GEMINI_API_KEY before generating".to_string()
            }
            None => String::new(),
        };

        Self {
            cmd_tx,
            ui_rx,
            session: Session::new(),
            intake: UploadIntake::from_settings(settings),
            status,
            textures: None,
            last_save_dir: persisted.last_save_dir,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            apply_event(&mut self.session, &mut self.status, event);
        }
    }

    fn submit(&mut self, files: Vec<CandidateFile>) {
        match self.intake.accept(files) {
            Ok(None) => {}
            Ok(Some(upload)) => {
                self.status.clear();
                if let Err(err) = start_generation(&self.cmd_tx, &mut self.session, upload) {
                    self.status = err.to_string();
                }
            }
            Err(err) => {
                tracing::info!(error = %err, "rejected upload");
                if let Err(err) = self.session.reject_upload(&err) {
                    self.status = err.to_string();
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        self.handle_drops(dropped);
    }

    /// Drops count as an upload only while the session offers one.
    fn handle_drops(&mut self, dropped: Vec<egui::DroppedFile>) {
        if dropped.is_empty() {
            return;
        }
        if !self.session.state().allows(ViewAction::Upload) {
            tracing::debug!(state = self.session.state().name(), "ignoring dropped files");
            return;
        }

        let files = dropped.into_iter().filter_map(candidate_from_dropped).collect();
        self.submit(files);
    }

    fn pick_photo(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Select a Photo")
            .add_filter("PNG or JPG", &["png", "jpg", "jpeg"])
            .pick_file();
        if let Some(path) = picked {
            self.submit(vec![CandidateFile::from_path(path)]);
        }
    }

    fn save_artifact(&mut self, kind: ArtifactKind) {
        let Some(artifact) = DownloadArtifact::from_state(self.session.state(), kind) else {
            return;
        };

        let mut dialog = rfd::FileDialog::new().set_file_name(artifact.file_name());
        if let Some(dir) = self.last_save_dir.clone().or_else(dirs::download_dir) {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        match artifact.save_to(&path) {
            Ok(()) => {
                self.status = format!("Saved {}", path.display());
                self.last_save_dir = path.parent().map(Path::to_path_buf);
            }
            Err(err) => {
                self.status = format!("Failed to save {}: {err:#}", artifact.file_name());
            }
        }
    }

    fn reset(&mut self) {
        match self.session.reset() {
            Ok(()) => {
                self.textures = None;
                self.status.clear();
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn perform(&mut self, action: UiAction) {
        match action {
            UiAction::PickPhoto => self.pick_photo(),
            UiAction::Reset => self.reset(),
            UiAction::Save(kind) => self.save_artifact(kind),
        }
    }

    /// Decodes the success view's images the first time it is shown. A result
    /// that cannot be decoded never stays on screen.
    fn prepare_result_textures(&mut self, ctx: &egui::Context) {
        let loaded = match self.session.state() {
            ViewState::Success { result, preview } if self.textures.is_none() => {
                Some(load_result_textures(ctx, preview, result))
            }
            ViewState::Success { .. } => None,
            _ => {
                self.textures = None;
                None
            }
        };

        match loaded {
            Some(Ok(textures)) => self.textures = Some(textures),
            Some(Err(reason)) => {
                tracing::warn!("{reason}");
                self.session.invalidate_result();
            }
            None => {}
        }
    }
}

impl eframe::App for MemojiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_dropped_files(ctx);
        self.prepare_result_textures(ctx);

        egui::TopBottomPanel::top("app_header").show(ctx, |ui| {
            ui.add_space(10.0);
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new(APP_TITLE).strong().size(26.0));
                ui.weak(TAGLINE);
            });
            ui.add_space(10.0);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            if !self.status.is_empty() {
                ui.small(egui::RichText::new(&self.status).weak());
            }
        });

        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(CONTENT_WIDTH);
                    ui.add_space(16.0);

                    let state = self.session.state();
                    action = match state {
                        ViewState::Idle => {
                            show_upload_card(ui, hovering, state.allows(ViewAction::Upload))
                        }
                        ViewState::Loading { progress, .. } => {
                            show_loading(ui, progress.label());
                            None
                        }
                        ViewState::Success { result, .. } => match &self.textures {
                            Some(textures) => show_result(ui, textures, result, state.actions()),
                            None => {
                                ui.spinner();
                                None
                            }
                        },
                        ViewState::Error { message } => show_error(ui, message),
                    };
                });
            });
        });

        if let Some(action) = action {
            self.perform(action);
        }

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedDesktopSettings {
            last_save_dir: self.last_save_dir.clone(),
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

fn show_upload_card(ui: &mut egui::Ui, hovering: bool, enabled: bool) -> Option<UiAction> {
    let visuals = ui.visuals();
    let (fill, stroke_color) = if hovering {
        (
            visuals.selection.bg_fill.gamma_multiply(0.25),
            visuals.selection.stroke.color,
        )
    } else {
        (
            visuals.faint_bg_color,
            visuals.widgets.noninteractive.bg_stroke.color,
        )
    };

    let card = egui::Frame::NONE
        .fill(fill)
        .corner_radius(14.0)
        .stroke(egui::Stroke::new(1.5, stroke_color))
        .inner_margin(egui::Margin::symmetric(24, 36))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Click to upload or drag and drop")
                        .strong()
                        .size(18.0),
                );
                ui.weak("PNG or JPG");
                ui.add_space(14.0);
                ui.add_enabled(
                    enabled,
                    egui::Button::new(egui::RichText::new("Select a Photo").strong()),
                )
                .clicked()
            })
            .inner
        });

    let card_clicked = enabled && card.response.interact(egui::Sense::click()).clicked();
    (card.inner || card_clicked).then_some(UiAction::PickPhoto)
}

fn show_loading(ui: &mut egui::Ui, label: &str) {
    ui.add_space(48.0);
    ui.add(egui::Spinner::new().size(40.0));
    ui.add_space(14.0);
    ui.label(egui::RichText::new(label).size(16.0));
}

fn show_image_tile(ui: &mut egui::Ui, caption: &str, texture: &egui::TextureHandle) {
    ui.vertical_centered(|ui| {
        ui.strong(caption);
        ui.add(egui::Image::new(texture).max_size(egui::vec2(IMAGE_SIZE, IMAGE_SIZE)));
    });
}

fn show_result(
    ui: &mut egui::Ui,
    textures: &ResultTextures,
    result: &GenerationResult,
    actions: &[ViewAction],
) -> Option<UiAction> {
    ui.columns(2, |columns| {
        show_image_tile(&mut columns[0], "Your Photo", &textures.preview);
        show_image_tile(&mut columns[1], "Your Memoji", &textures.avatar);
    });

    ui.add_space(16.0);
    egui::Frame::NONE
        .fill(ui.visuals().faint_bg_color)
        .corner_radius(12.0)
        .inner_margin(egui::Margin::symmetric(16, 14))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new("Character Bio").strong().size(18.0));
            ui.add_space(6.0);
            ui.label(result.bio());
        });

    ui.add_space(14.0);
    let mut action = None;
    ui.horizontal(|ui| {
        let buttons = [
            (ViewAction::DownloadImage, "Download Memoji", UiAction::Save(ArtifactKind::Image)),
            (ViewAction::DownloadBio, "Download Bio", UiAction::Save(ArtifactKind::Bio)),
            (ViewAction::Reset, "Try Again", UiAction::Reset),
        ];
        for (view_action, label, ui_action) in buttons {
            if ui
                .add_enabled(actions.contains(&view_action), egui::Button::new(label))
                .clicked()
            {
                action = Some(ui_action);
            }
        }
    });
    action
}

fn show_error(ui: &mut egui::Ui, message: &str) -> Option<UiAction> {
    ui.add_space(24.0);
    egui::Frame::NONE
        .fill(egui::Color32::from_rgb(92, 38, 38))
        .corner_radius(12.0)
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
        .inner_margin(egui::Margin::symmetric(16, 14))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
        });
    ui.add_space(14.0);
    ui.button("Try Again").clicked().then_some(UiAction::Reset)
}

fn load_result_textures(
    ctx: &egui::Context,
    preview: &ImagePreview,
    result: &GenerationResult,
) -> Result<ResultTextures, String> {
    let original = preview
        .decode()
        .map_err(|err| format!("upload preview is not valid base64: {err}"))?;
    let preview = decode_color_image(&original)
        .map_err(|err| format!("upload preview could not be decoded: {err}"))?;
    let avatar = decode_color_image(result.avatar_image())
        .map_err(|err| format!("generated avatar could not be decoded: {err}"))?;

    Ok(ResultTextures {
        preview: ctx.load_texture("memoji-upload-preview", preview, egui::TextureOptions::LINEAR),
        avatar: ctx.load_texture("memoji-avatar", avatar, egui::TextureOptions::LINEAR),
    })
}

fn decode_color_image(bytes: &[u8]) -> Result<egui::ColorImage, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

/// Dropped files arrive with bytes (web, some platforms) or a path (native).
fn candidate_from_dropped(file: egui::DroppedFile) -> Option<CandidateFile> {
    let egui::DroppedFile {
        path,
        name,
        mime,
        bytes,
        ..
    } = file;
    let declared_mime = Some(mime).filter(|mime| !mime.is_empty());
    let name = if name.is_empty() {
        path.as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        name
    };

    match (bytes, path) {
        (Some(bytes), _) => Some(CandidateFile::from_bytes(name, declared_mime, bytes)),
        (None, Some(path)) => Some(CandidateFile::new(name, declared_mime, FileSource::Path(path))),
        (None, None) => None,
    }
}
