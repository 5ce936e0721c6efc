//! castsink - notification audio for Chromecast devices
//!
//! [ChromecastAudioSink](services::ChromecastAudioSink) takes an audio stream,
//! makes it reachable for the device (directly, or through the embedded audio
//! HTTP server and a callback URL) and asks a [Commander](services::Commander)
//! to play it.

pub mod api;
pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod services;
