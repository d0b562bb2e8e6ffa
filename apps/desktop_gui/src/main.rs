use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, Settings};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{app::APP_TITLE, MemojiApp, PersistedDesktopSettings};

#[derive(Parser, Debug)]
struct Args {
    /// Settings file; defaults to memoji.toml in the working directory, then
    /// the per-user config directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        if PathBuf::from(client_core::config::DEFAULT_CONFIG_FILE).exists() {
            return None;
        }
        dirs::config_dir()
            .map(|dir| dir.join("memoji").join(client_core::config::DEFAULT_CONFIG_FILE))
            .filter(|path| path.exists())
    })
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let (settings, startup_status) = match load_settings(config_path(args.config).as_deref()) {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::error!("failed to load settings: {err:#}");
            (
                Settings::default(),
                Some(format!("Failed to load settings, using defaults: {err:#}")),
            )
        }
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(16);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(64);
    backend_bridge::runtime::launch(settings.clone(), cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([640.0, 520.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        APP_TITLE,
        options,
        Box::new(move |cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(ui::app::SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedDesktopSettings>(&text).ok())
            });
            Ok(Box::new(MemojiApp::new(
                &settings,
                cmd_tx,
                ui_rx,
                persisted,
                startup_status,
            )))
        }),
    )
}
