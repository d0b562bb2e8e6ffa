use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    load_settings, ArtifactKind, CandidateFile, DownloadArtifact, GeminiClient, Orchestrator,
    Settings, UploadIntake, ViewState,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memoji", about = "Turn a photo into a 3D avatar and a short character bio")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an avatar and bio from a PNG or JPEG photo.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    photo: PathBuf,
    /// Directory that receives memoji.png and memoji-bio.txt.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the key from the config file and environment.
    #[arg(long)]
    api_key: Option<String>,
}

impl GenerateArgs {
    fn settings(&self) -> Result<Settings> {
        let mut settings = load_settings(self.config.as_deref())?;
        if let Some(key) = self.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty()) {
            settings.api_key = Some(key.to_string());
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => generate(args).await,
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let settings = args.settings()?;
    let intake = UploadIntake::from_settings(&settings);
    let upload = match intake.validate(CandidateFile::from_path(&args.photo)) {
        Ok(upload) => upload,
        Err(err) => bail!("{}", err.user_message()),
    };

    let service = Arc::new(GeminiClient::new(&settings)?);
    let mut orchestrator = Orchestrator::new(service);
    let state = orchestrator.generate(upload).await?;

    let saved = write_artifacts(state, &args.out_dir)?;
    for path in &saved {
        tracing::info!(path = %path.display(), "artifact written");
        println!("Saved {}", path.display());
    }
    if let Some(result) = state.result() {
        println!("\nCharacter Bio\n{}", result.bio());
    }
    Ok(())
}

fn write_artifacts(state: &ViewState, out_dir: &std::path::Path) -> Result<Vec<PathBuf>> {
    match state {
        ViewState::Success { .. } => [ArtifactKind::Image, ArtifactKind::Bio]
            .into_iter()
            .filter_map(|kind| DownloadArtifact::from_state(state, kind))
            .map(|artifact| artifact.save_to_dir(out_dir))
            .collect(),
        ViewState::Error { message } => bail!("{message}"),
        other => bail!("generation ended in unexpected {} state", other.name()),
    }
}
