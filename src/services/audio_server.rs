//! Audio HTTP server: makes local audio reachable for cast devices.
//!
//! Streams are registered under a random id and fetched through
//! `GET /audio/{id}` (see [crate::api::audio]). Registration only touches the
//! in-memory registry; the axum handlers take entries out of it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use parking_lot::Mutex;
use tokio::io::AsyncRead;
use tracing::debug;
use uuid::Uuid;

use crate::audio::{AudioError, AudioFormat, AudioStream, FixedLengthAudioStream};

/// Path prefix of served streams
pub const AUDIO_PATH_PREFIX: &str = "/audio";

/// How long a one-time entry waits for its fetch before it is dropped
pub const ONE_TIME_TIMEOUT: Duration = Duration::from_secs(300);

/// Registers audio streams for serving and hands back their relative path.
pub trait AudioHttpServer: Send + Sync {
    /// Serve a stream once. The entry is dropped after the first fetch.
    fn serve(&self, stream: AudioStream) -> Result<String, AudioError>;

    /// Serve a buffered stream any number of times until `ttl` elapses.
    fn serve_for(&self, stream: FixedLengthAudioStream, ttl: Duration)
    -> Result<String, AudioError>;
}

/// Content type the server answers with, if it can serve the format at all
pub fn content_type_for(format: &AudioFormat) -> Option<&'static str> {
    if format.is_mp3() {
        Some("audio/mpeg")
    } else if format.container() == Some(AudioFormat::CONTAINER_WAVE) || format.is_pcm() {
        Some("audio/wav")
    } else if format.container() == Some(AudioFormat::CONTAINER_OGG)
        || format.codec() == Some(AudioFormat::CODEC_VORBIS)
    {
        Some("audio/ogg")
    } else if format.codec() == Some(AudioFormat::CODEC_AAC) {
        Some("audio/aac")
    } else {
        None
    }
}

/// What a one-time id resolves to
enum Payload {
    Redirect(String),
    Buffered(Bytes),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

enum Entry {
    /// Removed on first fetch, or at `expires_at` if never fetched
    Once {
        content_type: &'static str,
        payload: Payload,
        expires_at: Instant,
    },
    /// Fetchable until `expires_at`
    Until {
        content_type: &'static str,
        data: Bytes,
        expires_at: Instant,
    },
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        let (Self::Once { expires_at, .. } | Self::Until { expires_at, .. }) = self;
        *expires_at <= now
    }
}

/// Result of looking up a registered stream
pub enum ServedAudio {
    Redirect(String),
    Buffered {
        content_type: &'static str,
        data: Bytes,
    },
    Reader {
        content_type: &'static str,
        reader: Box<dyn AsyncRead + Send + Unpin>,
    },
}

impl std::fmt::Debug for ServedAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redirect(url) => f.debug_tuple("Redirect").field(url).finish(),
            Self::Buffered { content_type, data } => f
                .debug_struct("Buffered")
                .field("content_type", content_type)
                .field("len", &data.len())
                .finish(),
            Self::Reader { content_type, .. } => f
                .debug_struct("Reader")
                .field("content_type", content_type)
                .finish_non_exhaustive(),
        }
    }
}

/// In-memory audio registry backing the `/audio` routes
pub struct AudioServer {
    entries: Mutex<HashMap<Uuid, Entry>>,
    one_time_ttl: Duration,
}

impl Default for AudioServer {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            one_time_ttl: ONE_TIME_TIMEOUT,
        }
    }
}

impl AudioServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override how long unfetched one-time entries are kept
    pub fn with_one_time_ttl(mut self, ttl: Duration) -> Self {
        self.one_time_ttl = ttl;
        self
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries, including one-time entries nobody fetched
    pub fn purge_expired(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Purged expired audio streams");
        }
    }

    /// Resolve a registered id. One-time entries are removed by this call.
    pub fn take(&self, id: Uuid) -> Option<ServedAudio> {
        self.purge_expired();

        let mut entries = self.entries.lock();
        if let Entry::Until {
            content_type, data, ..
        } = entries.get(&id)?
        {
            return Some(ServedAudio::Buffered {
                content_type: *content_type,
                data: data.clone(),
            });
        }

        let Some(Entry::Once {
            content_type,
            payload,
            ..
        }) = entries.remove(&id)
        else {
            return None;
        };

        Some(match payload {
            Payload::Redirect(url) => ServedAudio::Redirect(url),
            Payload::Buffered(data) => ServedAudio::Buffered { content_type, data },
            Payload::Reader(reader) => ServedAudio::Reader {
                content_type,
                reader,
            },
        })
    }

    fn register(&self, entry: Entry) -> String {
        self.purge_expired();

        let id = Uuid::new_v4();
        self.entries.lock().insert(id, entry);
        format!("{}/{}", AUDIO_PATH_PREFIX, id)
    }
}

impl AudioHttpServer for AudioServer {
    fn serve(&self, stream: AudioStream) -> Result<String, AudioError> {
        let content_type = content_type_for(stream.format())
            .ok_or_else(|| AudioError::unsupported(stream.format()))?;

        let payload = match stream {
            AudioStream::Url(s) => Payload::Redirect(s.url().to_string()),
            AudioStream::FixedLength(s) => Payload::Buffered(s.data().clone()),
            AudioStream::Unbounded(s) => Payload::Reader(s.into_reader()),
        };

        let path = self.register(Entry::Once {
            content_type,
            payload,
            expires_at: Instant::now() + self.one_time_ttl,
        });
        debug!(path = %path, content_type, "Serving audio stream once");
        Ok(path)
    }

    fn serve_for(
        &self,
        stream: FixedLengthAudioStream,
        ttl: Duration,
    ) -> Result<String, AudioError> {
        let content_type = content_type_for(stream.format())
            .ok_or_else(|| AudioError::unsupported(stream.format()))?;

        let path = self.register(Entry::Until {
            content_type,
            data: stream.data().clone(),
            expires_at: Instant::now() + ttl,
        });
        debug!(path = %path, content_type, ttl_secs = ttl.as_secs(), "Serving audio stream");
        Ok(path)
    }
}

/// Extract the id from a path returned by [AudioHttpServer::serve]
pub fn id_from_path(path: &str) -> Option<Uuid> {
    path.strip_prefix(AUDIO_PATH_PREFIX)?
        .strip_prefix('/')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::audio::{UnboundedAudioStream, UrlAudioStream};

    fn mp3_clip() -> FixedLengthAudioStream {
        FixedLengthAudioStream::new(&b"ID3fakeframes"[..], AudioFormat::mp3())
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for(&AudioFormat::mp3()), Some("audio/mpeg"));
        assert_eq!(content_type_for(&AudioFormat::wav()), Some("audio/wav"));
        assert_eq!(
            content_type_for(&AudioFormat::new(None, Some(AudioFormat::CODEC_PCM_ULAW))),
            Some("audio/wav")
        );
        assert_eq!(content_type_for(&AudioFormat::ogg_vorbis()), Some("audio/ogg"));
        assert_eq!(content_type_for(&AudioFormat::aac()), Some("audio/aac"));
        assert_eq!(content_type_for(&AudioFormat::default()), None);
        assert_eq!(content_type_for(&AudioFormat::new(None, Some("FLAC"))), None);
    }

    #[test]
    fn test_serve_returns_audio_path() {
        let server = AudioServer::new();
        let path = server.serve(mp3_clip().into()).unwrap();

        assert!(path.starts_with("/audio/"));
        assert!(id_from_path(&path).is_some());
        assert_eq!(server.len(), 1);
    }

    #[test]
    fn test_one_time_entry_is_removed_after_fetch() {
        let server = AudioServer::new();
        let path = server.serve(mp3_clip().into()).unwrap();
        let id = id_from_path(&path).unwrap();

        assert_matches!(
            server.take(id),
            Some(ServedAudio::Buffered { content_type: "audio/mpeg", .. })
        );
        assert!(server.take(id).is_none());
        assert!(server.is_empty());
    }

    #[test]
    fn test_time_limited_entry_serves_repeatedly() {
        let server = AudioServer::new();
        let path = server.serve_for(mp3_clip(), Duration::from_secs(10)).unwrap();
        let id = id_from_path(&path).unwrap();

        for _ in 0..3 {
            assert_matches!(server.take(id), Some(ServedAudio::Buffered { .. }));
        }
    }

    #[test]
    fn test_time_limited_entry_expires() {
        let server = AudioServer::new();
        let path = server.serve_for(mp3_clip(), Duration::ZERO).unwrap();
        let id = id_from_path(&path).unwrap();

        assert!(server.take(id).is_none());
        assert!(server.is_empty());
    }

    #[test]
    fn test_unfetched_one_time_entries_expire() {
        let server = AudioServer::new().with_one_time_ttl(Duration::ZERO);
        for _ in 0..3 {
            let stream = UnboundedAudioStream::new(&b"RIFF"[..], AudioFormat::wav());
            server.serve(stream.into()).unwrap();
        }

        server.purge_expired();
        assert!(server.is_empty());
    }

    #[test]
    fn test_one_time_entries_outlive_a_slow_fetch() {
        let server = AudioServer::new();
        let path = server.serve(mp3_clip().into()).unwrap();

        server.purge_expired();
        assert_eq!(server.len(), 1);
        assert!(server.take(id_from_path(&path).unwrap()).is_some());
    }

    #[test]
    fn test_unsupported_format_is_rejected() {
        let server = AudioServer::new();
        let flac = FixedLengthAudioStream::new(vec![0u8; 8], AudioFormat::new(None, Some("FLAC")));

        assert_matches!(
            server.serve_for(flac.clone(), Duration::from_secs(10)),
            Err(AudioError::UnsupportedFormat { .. })
        );
        assert_matches!(server.serve(flac.into()), Err(AudioError::UnsupportedFormat { .. }));
        assert!(server.is_empty());
    }

    #[test]
    fn test_url_stream_becomes_redirect() {
        let server = AudioServer::new();
        let path = server
            .serve(UrlAudioStream::new("http://radio.local/a.mp3", AudioFormat::mp3()).into())
            .unwrap();
        let id = id_from_path(&path).unwrap();

        assert_matches!(server.take(id), Some(ServedAudio::Redirect(url)) if url == "http://radio.local/a.mp3");
    }

    #[test]
    fn test_unbounded_stream_is_served_as_reader() {
        let server = AudioServer::new();
        let stream = UnboundedAudioStream::new(&b"RIFF"[..], AudioFormat::wav());
        let path = server.serve(stream.into()).unwrap();
        let id = id_from_path(&path).unwrap();

        assert_matches!(server.take(id), Some(ServedAudio::Reader { content_type: "audio/wav", .. }));
        assert!(server.take(id).is_none());
    }

    #[test]
    fn test_server_is_shareable_across_tasks() {
        fn shareable<T: Send + Sync + 'static>() {}
        shareable::<AudioServer>();
        shareable::<std::sync::Arc<dyn AudioHttpServer>>();
    }

    #[test]
    fn test_id_from_path() {
        assert!(id_from_path("/audio/not-a-uuid").is_none());
        assert!(id_from_path("/media/3f2504e0-4f89-11d3-9a0c-0305e82c3301").is_none());
        assert!(id_from_path("/audio/3f2504e0-4f89-11d3-9a0c-0305e82c3301").is_some());
    }
}
