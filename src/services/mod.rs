//! Sink, commander and serving services

pub mod audio_server;
pub mod audio_sink;
pub mod cast;
pub mod http_server;
pub mod logging;

pub use audio_server::{AudioHttpServer, AudioServer};
pub use audio_sink::{AudioSink, ChromecastAudioSink, NOTIFICATION_TITLE, STREAM_TIMEOUT};
pub use cast::{CastCommander, CastTarget, Commander};
pub use http_server::{HttpServerConfig, HttpServerService};
pub use logging::{LogFormat, init_tracing};
