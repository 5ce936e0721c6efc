//! Audio format descriptor
//!
//! A format is a loose description: every field is optional and an unset field
//! means "unknown" rather than "anything".

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Container and codec description of an audio stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub container: Option<String>,
    pub codec: Option<String>,
    pub big_endian: Option<bool>,
    pub bit_depth: Option<u32>,
    pub bit_rate: Option<u32>,
    pub frequency: Option<u64>,
}

impl AudioFormat {
    pub const CONTAINER_NONE: &'static str = "NONE";
    pub const CONTAINER_WAVE: &'static str = "WAVE";
    pub const CONTAINER_OGG: &'static str = "OGG";

    pub const CODEC_PCM_SIGNED: &'static str = "PCM_SIGNED";
    pub const CODEC_PCM_UNSIGNED: &'static str = "PCM_UNSIGNED";
    pub const CODEC_PCM_ALAW: &'static str = "PCM_ALAW";
    pub const CODEC_PCM_ULAW: &'static str = "PCM_ULAW";
    pub const CODEC_MP3: &'static str = "MP3";
    pub const CODEC_VORBIS: &'static str = "VORBIS";
    pub const CODEC_AAC: &'static str = "AAC";

    pub fn new(container: Option<&str>, codec: Option<&str>) -> Self {
        Self {
            container: container.map(str::to_string),
            codec: codec.map(str::to_string),
            ..Default::default()
        }
    }

    /// 16 bit signed little-endian PCM in a WAVE container at 44.1 kHz
    pub fn wav() -> Self {
        Self {
            container: Some(Self::CONTAINER_WAVE.to_string()),
            codec: Some(Self::CODEC_PCM_SIGNED.to_string()),
            big_endian: Some(false),
            bit_depth: Some(16),
            bit_rate: Some(705_600),
            frequency: Some(44_100),
        }
    }

    /// Raw MP3 frames, no container
    pub fn mp3() -> Self {
        Self::new(Some(Self::CONTAINER_NONE), Some(Self::CODEC_MP3))
    }

    pub fn ogg_vorbis() -> Self {
        Self::new(Some(Self::CONTAINER_OGG), Some(Self::CODEC_VORBIS))
    }

    pub fn aac() -> Self {
        Self::new(Some(Self::CONTAINER_NONE), Some(Self::CODEC_AAC))
    }

    pub fn codec(&self) -> Option<&str> {
        self.codec.as_deref()
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn is_mp3(&self) -> bool {
        self.codec() == Some(Self::CODEC_MP3)
    }

    pub fn is_pcm(&self) -> bool {
        matches!(
            self.codec(),
            Some(
                Self::CODEC_PCM_SIGNED
                    | Self::CODEC_PCM_UNSIGNED
                    | Self::CODEC_PCM_ALAW
                    | Self::CODEC_PCM_ULAW
            )
        )
    }

    /// Whether `other` satisfies every property this format pins down.
    ///
    /// Unset fields on `self` match anything; set fields must be equal.
    pub fn is_compatible(&self, other: &AudioFormat) -> bool {
        fn pinned<T: PartialEq>(mine: &Option<T>, theirs: &Option<T>) -> bool {
            mine.as_ref().is_none_or(|m| theirs.as_ref() == Some(m))
        }

        pinned(&self.container, &other.container)
            && pinned(&self.codec, &other.codec)
            && pinned(&self.big_endian, &other.big_endian)
            && pinned(&self.bit_depth, &other.bit_depth)
            && pinned(&self.bit_rate, &other.bit_rate)
            && pinned(&self.frequency, &other.frequency)
    }

    /// Guess a format from a file name. Only the container/codec pair is set.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let mime = mime_guess::from_path(path.as_ref()).first()?;

        match (mime.type_().as_str(), mime.subtype().as_str()) {
            ("audio", "mpeg") | ("audio", "mp3") => Some(Self::mp3()),
            ("audio", "wav") | ("audio", "x-wav") | ("audio", "wave") => Some(Self::new(
                Some(Self::CONTAINER_WAVE),
                Some(Self::CODEC_PCM_SIGNED),
            )),
            ("audio", "ogg") | ("application", "ogg") => Some(Self::ogg_vorbis()),
            ("audio", "aac") | ("audio", "x-aac") => Some(Self::aac()),
            _ => None,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.container().unwrap_or("?"),
            self.codec().unwrap_or("?")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mp3_preset() {
        let format = AudioFormat::mp3();
        assert!(format.is_mp3());
        assert!(!format.is_pcm());
        assert_eq!(format.container(), Some("NONE"));
    }

    #[test]
    fn test_wav_preset_is_pcm() {
        let format = AudioFormat::wav();
        assert!(format.is_pcm());
        assert!(!format.is_mp3());
        assert_eq!(format.frequency, Some(44_100));
    }

    #[test]
    fn test_compatibility_ignores_unset_fields() {
        let wanted = AudioFormat::new(Some("WAVE"), Some("PCM_SIGNED"));
        assert!(wanted.is_compatible(&AudioFormat::wav()));

        // the other direction pins bit depth etc., which `wanted` leaves unset
        assert!(!AudioFormat::wav().is_compatible(&wanted));
    }

    #[test]
    fn test_compatibility_rejects_codec_mismatch() {
        assert!(!AudioFormat::mp3().is_compatible(&AudioFormat::wav()));
        assert!(AudioFormat::default().is_compatible(&AudioFormat::mp3()));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(AudioFormat::from_path("doorbell.mp3"), Some(AudioFormat::mp3()));
        assert_eq!(
            AudioFormat::from_path("/tmp/chime.WAV").and_then(|f| f.container),
            Some("WAVE".to_string())
        );
        assert_eq!(AudioFormat::from_path("alarm.ogg"), Some(AudioFormat::ogg_vorbis()));
        assert_eq!(AudioFormat::from_path("notes.txt"), None);
        assert_eq!(AudioFormat::from_path("no_extension"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(AudioFormat::mp3().to_string(), "NONE/MP3");
        assert_eq!(AudioFormat::default().to_string(), "?/?");
    }
}
