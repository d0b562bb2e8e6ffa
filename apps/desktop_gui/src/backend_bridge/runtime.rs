//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{run_generation, GeminiClient, GenerationService, Settings};
use crossbeam_channel::{Receiver, Sender};
use shared::GenerationError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::BackendUnavailable(format!(
                    "backend worker startup failure: {err}"
                )));
                return;
            }
        };

        let service: Result<Arc<dyn GenerationService>, String> =
            match GeminiClient::new(&settings) {
                Ok(client) => Ok(Arc::new(client)),
                Err(err) => {
                    tracing::error!("failed to build generation client: {err:#}");
                    Err(format!("generation client unavailable: {err:#}"))
                }
            };

        runtime.block_on(serve_commands(service, cmd_rx, ui_tx));
        tracing::debug!("backend command queue closed");
    });
}

/// Handles commands until the UI side drops its sender. Attempts are served
/// one at a time.
pub async fn serve_commands(
    service: Result<Arc<dyn GenerationService>, String>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::Generate { upload } => {
                let outcome = match &service {
                    Ok(service) => {
                        let progress_tx = ui_tx.clone();
                        run_generation(Arc::clone(service), &upload, move |progress| {
                            tracing::info!(progress = progress.label(), "generation progress");
                            let _ = progress_tx.try_send(UiEvent::Progress(progress));
                        })
                        .await
                    }
                    Err(reason) => Err(GenerationError::service(reason.clone())),
                };

                if ui_tx.send(UiEvent::Finished(outcome)).is_err() {
                    tracing::warn!("ui event queue closed; dropping generation outcome");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use client_core::Progress;
    use crossbeam_channel::bounded;
    use shared::{Description, MediaType, UploadedImage};

    struct EchoService;

    #[async_trait]
    impl GenerationService for EchoService {
        async fn describe(&self, image: &UploadedImage) -> Result<Description, GenerationError> {
            Ok(Description::new(format!("person from {}", image.file_name())))
        }

        async fn synthesize_image(
            &self,
            _description: &Description,
        ) -> Result<Vec<u8>, GenerationError> {
            Ok(b"\x89PNG\r\n\x1a\navatar".to_vec())
        }

        async fn synthesize_bio(
            &self,
            description: &Description,
        ) -> Result<String, GenerationError> {
            Ok(format!("Bio of {description}"))
        }
    }

    fn upload() -> UploadedImage {
        UploadedImage::new("me.png", MediaType::Png, b"\x89PNG\r\n\x1a\nme".to_vec())
    }

    fn run(service: Result<Arc<dyn GenerationService>, String>) -> Vec<UiEvent> {
        let (cmd_tx, cmd_rx) = bounded(4);
        let (ui_tx, ui_rx) = bounded(16);
        cmd_tx
            .send(BackendCommand::Generate { upload: upload() })
            .expect("queue command");
        drop(cmd_tx);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(serve_commands(service, cmd_rx, ui_tx));
        ui_rx.try_iter().collect()
    }

    #[test]
    fn generate_reports_progress_then_outcome() {
        let events = run(Ok(Arc::new(EchoService)));

        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], UiEvent::Progress(Progress::Analyzing)));
        assert!(matches!(events[1], UiEvent::Progress(Progress::Crafting)));
        match &events[2] {
            UiEvent::Finished(Ok(result)) => assert_eq!(result.bio(), "Bio of person from me.png"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unavailable_client_fails_each_attempt() {
        let events = run(Err("generation client unavailable: bad proxy".to_string()));

        match events.as_slice() {
            [UiEvent::Finished(Err(err))] => {
                assert!(err.user_message().contains("bad proxy"));
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }
}
