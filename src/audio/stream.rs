//! Audio stream handles
//!
//! A stream is either backed by a URL the receiver can fetch on its own, or it
//! carries local content that has to be served over HTTP first. Local content
//! is either fully buffered (known length) or an open reader of unknown length.

use std::fmt;

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use super::AudioFormat;

/// Stream variants a sink can accept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Url,
    FixedLength,
    Unbounded,
}

/// Audio that lives at a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAudioStream {
    url: String,
    format: AudioFormat,
}

impl UrlAudioStream {
    pub fn new(url: impl Into<String>, format: AudioFormat) -> Self {
        Self {
            url: url.into(),
            format,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }
}

/// Fully buffered audio of known length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLengthAudioStream {
    data: Bytes,
    format: AudioFormat,
}

impl FixedLengthAudioStream {
    pub fn new(data: impl Into<Bytes>, format: AudioFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    /// Read a whole file into memory
    pub async fn from_file(
        path: impl AsRef<std::path::Path>,
        format: AudioFormat,
    ) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(Self::new(data, format))
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }
}

/// Audio read from an open source of unknown length
pub struct UnboundedAudioStream {
    reader: Box<dyn AsyncRead + Send + Unpin>,
    format: AudioFormat,
}

impl UnboundedAudioStream {
    pub fn new(reader: impl AsyncRead + Send + Unpin + 'static, format: AudioFormat) -> Self {
        Self {
            reader: Box::new(reader),
            format,
        }
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }

    pub fn into_reader(self) -> Box<dyn AsyncRead + Send + Unpin> {
        self.reader
    }
}

impl fmt::Debug for UnboundedAudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnboundedAudioStream")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// A playable audio source handed to a sink
#[derive(Debug)]
pub enum AudioStream {
    Url(UrlAudioStream),
    FixedLength(FixedLengthAudioStream),
    Unbounded(UnboundedAudioStream),
}

impl AudioStream {
    pub fn format(&self) -> &AudioFormat {
        match self {
            Self::Url(s) => s.format(),
            Self::FixedLength(s) => s.format(),
            Self::Unbounded(s) => s.format(),
        }
    }

    /// The intrinsic URL, if the stream has one
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(s) => Some(s.url()),
            _ => None,
        }
    }

    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Url(_) => StreamKind::Url,
            Self::FixedLength(_) => StreamKind::FixedLength,
            Self::Unbounded(_) => StreamKind::Unbounded,
        }
    }
}

impl From<UrlAudioStream> for AudioStream {
    fn from(stream: UrlAudioStream) -> Self {
        Self::Url(stream)
    }
}

impl From<FixedLengthAudioStream> for AudioStream {
    fn from(stream: FixedLengthAudioStream) -> Self {
        Self::FixedLength(stream)
    }
}

impl From<UnboundedAudioStream> for AudioStream {
    fn from(stream: UnboundedAudioStream) -> Self {
        Self::Unbounded(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_accessor_only_for_url_streams() {
        let url: AudioStream =
            UrlAudioStream::new("http://radio.local/chime.mp3", AudioFormat::mp3()).into();
        assert_eq!(url.url(), Some("http://radio.local/chime.mp3"));
        assert_eq!(url.kind(), StreamKind::Url);

        let fixed: AudioStream = FixedLengthAudioStream::new(vec![0u8; 4], AudioFormat::wav()).into();
        assert_eq!(fixed.url(), None);
        assert_eq!(fixed.kind(), StreamKind::FixedLength);
        assert!(fixed.format().is_pcm());
    }

    #[test]
    fn test_unbounded_stream_debug_hides_reader() {
        let stream = UnboundedAudioStream::new(tokio::io::empty(), AudioFormat::mp3());
        let debug = format!("{:?}", stream);
        assert!(debug.contains("UnboundedAudioStream"));
        assert!(debug.contains("MP3"));
    }

    #[tokio::test]
    async fn test_fixed_length_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beep.wav");
        std::fs::write(&path, b"RIFF0000WAVE").unwrap();

        let stream = FixedLengthAudioStream::from_file(&path, AudioFormat::wav())
            .await
            .unwrap();
        assert_eq!(stream.len(), 12);
        assert!(!stream.is_empty());
    }
}
