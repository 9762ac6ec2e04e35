mod api;
mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::application::{ArtifactSink, DialogSink, DirectorySink, DownloadCoordinator};
use crate::config::AppConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    tracing::info!(api = %config.api.base_url, "Starting Video Vault");

    let sink: Arc<dyn ArtifactSink> = match &config.download_dir {
        Some(dir) => Arc::new(DirectorySink::new(dir.clone())),
        None => Arc::new(DialogSink),
    };
    let api_client = ApiClient::new(config.api.clone())?;
    let coordinator = DownloadCoordinator::new(api_client, sink, config.progress.clone());
    let default_format = config.default_format;

    iced::application(
        move || app::DownloadApp::new(coordinator.clone(), default_format),
        app::update,
        app::view,
    )
    .title("Video Vault")
    .subscription(app::subscription)
    .run()?;

    Ok(())
}
