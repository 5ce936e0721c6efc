//! Audio sink for cast devices
//!
//! Turns an [AudioStream] into something a cast device can fetch and asks the
//! commander to play it. Streams with their own URL are passed through as-is;
//! everything else goes through the audio HTTP server and is addressed via the
//! callback URL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::audio::{AudioError, AudioFormat, AudioStream, StreamKind};
use crate::services::audio_server::AudioHttpServer;
use crate::services::cast::Commander;

/// Title shown on the device for notification playback
pub const NOTIFICATION_TITLE: &str = "Notification";

/// How long a buffered stream stays fetchable
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_SINK_ID: &str = "chromecast";

/// A destination for audio streams
#[async_trait]
pub trait AudioSink: Send + Sync {
    fn id(&self) -> &str;

    fn label(&self) -> Option<&str>;

    fn supported_formats(&self) -> Vec<AudioFormat>;

    fn supported_streams(&self) -> Vec<StreamKind>;

    /// Play `audio_stream`, or stop playback when it is `None`
    async fn process(&self, audio_stream: Option<AudioStream>) -> Result<(), AudioError>;

    /// Set the output volume, 0-100
    async fn set_volume(&self, percent: u8);
}

/// MIME type announced to the device for a stream format.
///
/// Anything that is not MP3 is announced as WAV.
pub fn mime_type_for(format: &AudioFormat) -> &'static str {
    if format.codec() == Some(AudioFormat::CODEC_MP3) {
        "audio/mpeg"
    } else {
        "audio/wav"
    }
}

/// Audio sink that plays notifications on a cast device
pub struct ChromecastAudioSink {
    id: String,
    label: Option<String>,
    commander: Arc<dyn Commander>,
    audio_server: Arc<dyn AudioHttpServer>,
    callback_url: Option<String>,
}

impl ChromecastAudioSink {
    pub fn new(
        commander: Arc<dyn Commander>,
        audio_server: Arc<dyn AudioHttpServer>,
        callback_url: Option<String>,
    ) -> Self {
        Self {
            id: DEFAULT_SINK_ID.to_string(),
            label: None,
            commander,
            audio_server,
            callback_url,
        }
    }

    pub fn with_identity(mut self, id: impl Into<String>, label: Option<String>) -> Self {
        self.id = id.into();
        self.label = label;
        self
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref()
    }

    /// Resolve the URL the device should fetch, registering the stream with
    /// the audio server when needed. `Ok(None)` means there is no way to
    /// reach the stream.
    fn resolve_url(&self, audio_stream: AudioStream) -> Result<Option<String>, AudioError> {
        if let AudioStream::Url(stream) = audio_stream {
            return Ok(Some(stream.url().to_string()));
        }

        let Some(callback_url) = self.callback_url.as_deref() else {
            warn!("No callback url configured, cast device cannot fetch the audio stream");
            return Ok(None);
        };

        let relative_url = match audio_stream {
            AudioStream::FixedLength(stream) => {
                self.audio_server.serve_for(stream, STREAM_TIMEOUT)?
            }
            other => self.audio_server.serve(other)?,
        };

        Ok(Some(format!("{}{}", callback_url, relative_url)))
    }
}

#[async_trait]
impl AudioSink for ChromecastAudioSink {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn supported_formats(&self) -> Vec<AudioFormat> {
        vec![AudioFormat::wav(), AudioFormat::mp3()]
    }

    fn supported_streams(&self) -> Vec<StreamKind> {
        vec![StreamKind::Url, StreamKind::FixedLength, StreamKind::Unbounded]
    }

    async fn process(&self, audio_stream: Option<AudioStream>) -> Result<(), AudioError> {
        let Some(audio_stream) = audio_stream else {
            // no stream means: end whatever is playing
            trace!("Stop currently playing stream");
            self.commander.handle_stop().await;
            return Ok(());
        };

        let mime_type = mime_type_for(audio_stream.format());

        let Some(url) = self.resolve_url(audio_stream)? else {
            return Ok(());
        };

        debug!(sink = %self.id, url = %url, mime_type, "Playing notification");
        self.commander
            .play_media(NOTIFICATION_TITLE, &url, mime_type)
            .await;
        Ok(())
    }

    async fn set_volume(&self, percent: u8) {
        self.commander.handle_volume(percent.min(100)).await;
    }
}
