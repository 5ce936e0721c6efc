//! castsink - play notification audio on a cast device
//!
//! Remote URLs are handed to the device as-is. Local files are served by the
//! embedded audio server until Ctrl+C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;

use castsink::audio::{AudioFormat, AudioStream, FixedLengthAudioStream, UrlAudioStream};
use castsink::cli::{Action, CliOptions, USAGE};
use castsink::config::Config;
use castsink::services::{
    AudioServer, AudioSink, CastCommander, ChromecastAudioSink, HttpServerConfig,
    HttpServerService, init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so the log format is known before tracing starts
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.log_format)?;

    let options = CliOptions::from_args().context(USAGE)?;

    let target = options
        .device
        .clone()
        .or_else(|| config.cast_device.clone())
        .context("No cast device given; use --device or CAST_DEVICE")?;

    tracing::info!("Starting castsink");
    tracing::info!(device = %target, callback_url = ?config.callback_url, "Configuration loaded");

    let audio_server = Arc::new(AudioServer::new());
    let commander = Arc::new(CastCommander::new(target));
    let sink = ChromecastAudioSink::new(
        commander,
        audio_server.clone(),
        config.callback_url.clone(),
    );

    if let Some(percent) = options.volume {
        sink.set_volume(percent).await;
    }

    match options.action {
        Action::Stop => {
            sink.process(None).await?;
        }
        Action::PlayUrl(url) => {
            let format = AudioFormat::from_path(&url).unwrap_or_else(AudioFormat::mp3);
            let stream = AudioStream::Url(UrlAudioStream::new(url, format));
            sink.process(Some(stream)).await?;
        }
        Action::PlayFile(path) => {
            let format = AudioFormat::from_path(&path)
                .with_context(|| format!("Cannot tell the audio format of {}", path.display()))?;
            if !sink.supported_formats().iter().any(|f| format.is_compatible(f)) {
                tracing::warn!(%format, "Format is not one the device is known to play");
            }

            let http = HttpServerService::new(
                HttpServerConfig {
                    host: config.host.clone(),
                    port: config.port,
                },
                audio_server,
            );
            http.start().await?;

            let stream = FixedLengthAudioStream::from_file(&path, format)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            sink.process(Some(stream.into())).await?;

            tracing::info!("Serving until Ctrl+C");
            signal::ctrl_c().await?;
            http.stop().await?;
        }
    }

    Ok(())
}
