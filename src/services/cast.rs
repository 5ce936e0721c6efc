//! Chromecast/Google Cast commander
//!
//! This module issues play, stop and volume commands to a single cast device
//! using the rust_cast library for CASTV2 protocol communication.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_cast::CastDevice as RustCastDevice;
use rust_cast::channels::media::{GenericMediaMetadata, Media, Metadata, StreamType};
use rust_cast::channels::receiver::CastDeviceApp;
use tracing::{debug, error, info};

/// Default Chromecast port
pub const DEFAULT_CAST_PORT: u16 = 8009;

/// Issues commands to the target device.
///
/// Commanders own their failures: problems talking to the device are logged,
/// not returned.
#[async_trait]
pub trait Commander: Send + Sync {
    /// Stop whatever the device is currently playing
    async fn handle_stop(&self);

    /// Load and play the media at `url`
    async fn play_media(&self, title: &str, url: &str, mime_type: &str);

    /// Set the device volume, 0-100
    async fn handle_volume(&self, percent: u8);
}

/// Network address of a cast device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastTarget {
    pub address: String,
    pub port: u16,
}

impl CastTarget {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// Parses `host` or `host:port`, using `default_port` when none is given
    pub fn parse_with_port(s: &str, default_port: u16) -> Result<Self> {
        let s = s.trim();
        anyhow::ensure!(!s.is_empty(), "Empty cast device address");

        match s.rsplit_once(':') {
            // bare IPv6 addresses contain colons too
            Some((host, port)) if !host.contains(':') => {
                let port = port.parse().context("Invalid cast device port")?;
                Ok(Self::new(host, port))
            }
            _ => Ok(Self::new(s, default_port)),
        }
    }
}

impl fmt::Display for CastTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl FromStr for CastTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with_port(s, DEFAULT_CAST_PORT)
    }
}

/// Commander backed by a real cast device
pub struct CastCommander {
    target: CastTarget,
}

impl CastCommander {
    pub fn new(target: CastTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &CastTarget {
        &self.target
    }

    /// Load media (blocking, runs in spawn_blocking)
    fn play_media_blocking(
        addr: &str,
        port: u16,
        title: &str,
        url: &str,
        content_type: &str,
    ) -> Result<()> {
        let device = RustCastDevice::connect_without_host_verification(addr, port)
            .context("Failed to connect to cast device")?;

        device
            .connection
            .connect("receiver-0")
            .context("Failed to connect to receiver")?;

        let app = device
            .receiver
            .launch_app(&CastDeviceApp::DefaultMediaReceiver)
            .context("Failed to launch media receiver")?;

        device
            .connection
            .connect(app.transport_id.as_str())
            .context("Failed to connect to media app")?;

        let media = Media {
            content_id: url.to_string(),
            content_type: content_type.to_string(),
            stream_type: StreamType::Buffered,
            duration: None,
            metadata: Some(Metadata::Generic(GenericMediaMetadata {
                title: Some(title.to_string()),
                subtitle: None,
                images: Vec::new(),
                release_date: None,
            })),
        };

        device
            .media
            .load(app.transport_id.as_str(), app.session_id.as_str(), &media)
            .context("Failed to load media")?;

        Ok(())
    }

    /// Stop the running application (blocking)
    fn stop_blocking(addr: &str, port: u16) -> Result<()> {
        let device = RustCastDevice::connect_without_host_verification(addr, port)
            .context("Failed to connect to cast device")?;

        device.connection.connect("receiver-0")?;

        let status = device.receiver.get_status()?;
        match status.applications.first() {
            Some(app) => {
                device
                    .receiver
                    .stop_app(app.session_id.as_str())
                    .context("Failed to stop application")?;
            }
            None => debug!("No running application, nothing to stop"),
        }

        Ok(())
    }

    /// Control volume (blocking)
    fn volume_blocking(addr: &str, port: u16, level: f32) -> Result<()> {
        let device = RustCastDevice::connect_without_host_verification(addr, port)
            .context("Failed to connect to cast device")?;

        device.connection.connect("receiver-0")?;
        device.receiver.set_volume(level)?;

        Ok(())
    }
}

#[async_trait]
impl Commander for CastCommander {
    async fn handle_stop(&self) {
        let addr = self.target.address.clone();
        let port = self.target.port;

        match tokio::task::spawn_blocking(move || Self::stop_blocking(&addr, port)).await {
            Ok(Ok(())) => info!("Stopped playback on {}", self.target),
            Ok(Err(e)) => error!("Failed to stop playback on {}: {:#}", self.target, e),
            Err(e) => error!("Stop task for {} panicked: {}", self.target, e),
        }
    }

    async fn play_media(&self, title: &str, url: &str, mime_type: &str) {
        let addr = self.target.address.clone();
        let port = self.target.port;
        let title = title.to_string();
        let stream_url = url.to_string();
        let content_type = mime_type.to_string();

        debug!(url = %stream_url, mime_type = %content_type, "Casting media to {}", self.target);

        let result = tokio::task::spawn_blocking(move || {
            Self::play_media_blocking(&addr, port, &title, &stream_url, &content_type)
        })
        .await;

        match result {
            Ok(Ok(())) => info!("Started casting {} to {}", url, self.target),
            Ok(Err(e)) => error!("Failed to cast media to {}: {:#}", self.target, e),
            Err(e) => error!("Cast task for {} panicked: {}", self.target, e),
        }
    }

    async fn handle_volume(&self, percent: u8) {
        let addr = self.target.address.clone();
        let port = self.target.port;
        let level = f32::from(percent.min(100)) / 100.0;

        match tokio::task::spawn_blocking(move || Self::volume_blocking(&addr, port, level)).await {
            Ok(Ok(())) => debug!("Set volume on {} to {}%", self.target, percent),
            Ok(Err(e)) => error!("Failed to set volume on {}: {:#}", self.target, e),
            Err(e) => error!("Volume task for {} panicked: {}", self.target, e),
        }
    }
}
