use thiserror::Error;

use super::AudioFormat;

/// Errors surfaced by the audio sink.
///
/// Only one kind exists: a collaborator refused the stream's format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("unsupported audio format: {format}")]
    UnsupportedFormat { format: AudioFormat },
}

impl AudioError {
    pub fn unsupported(format: &AudioFormat) -> Self {
        Self::UnsupportedFormat {
            format: format.clone(),
        }
    }
}
