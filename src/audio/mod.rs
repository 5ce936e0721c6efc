//! Audio model shared by the sink, the commander and the audio HTTP server.

pub mod error;
pub mod format;
pub mod stream;

pub use error::AudioError;
pub use format::AudioFormat;
pub use stream::{
    AudioStream, FixedLengthAudioStream, StreamKind, UnboundedAudioStream, UrlAudioStream,
};
