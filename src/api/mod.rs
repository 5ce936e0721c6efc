//! HTTP endpoints

pub mod audio;
pub mod health;
