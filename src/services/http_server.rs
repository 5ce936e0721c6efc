//! HTTP server service: binds the Axum app and runs it in a background task.
//!
//! The server exposes the streams registered with the shared [AudioServer] so
//! cast devices can fetch them through the callback URL. It runs from
//! [start](HttpServerService::start) until [stop](HttpServerService::stop).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::info;

use crate::app::{AppState, build_app};
use crate::services::AudioServer;

/// Health status of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a service health check.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceHealth {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Configuration for the HTTP server service.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    /// 0 binds an ephemeral port
    pub port: u16,
}

/// HTTP server service: binds and serves the Axum app in a background task.
pub struct HttpServerService {
    config: HttpServerConfig,
    audio_server: Arc<AudioServer>,
    /// JoinHandle for the server task; set in start(), taken in stop().
    join_handle: parking_lot::RwLock<Option<tokio::task::JoinHandle<Result<()>>>>,
    /// Send to trigger server shutdown; set in start(), taken in stop().
    shutdown_tx: parking_lot::RwLock<Option<broadcast::Sender<()>>>,
    local_addr: parking_lot::RwLock<Option<SocketAddr>>,
}

impl HttpServerService {
    pub fn new(config: HttpServerConfig, audio_server: Arc<AudioServer>) -> Self {
        Self {
            config,
            audio_server,
            join_handle: parking_lot::RwLock::new(None),
            shutdown_tx: parking_lot::RwLock::new(None),
            local_addr: parking_lot::RwLock::new(None),
        }
    }

    /// Address the server is bound to, once started
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read()
    }

    pub async fn start(&self) -> Result<SocketAddr> {
        info!(service = "http", "HTTP server service starting");

        let state = AppState {
            audio_server: self.audio_server.clone(),
        };
        let app = build_app(state);

        let bind = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .with_context(|| format!("HTTP server: bind to {} failed", bind))?;
        let addr = listener
            .local_addr()
            .context("HTTP server: no local address")?;

        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let mut shutdown_rx = shutdown_tx.subscribe();

        let serve_fut = axum::serve(listener, app);
        let join = tokio::spawn(async move {
            tokio::select! {
                result = serve_fut => result.context("axum::serve"),
                _ = shutdown_rx.recv() => Ok(()),
            }
        });

        *self.join_handle.write() = Some(join);
        *self.shutdown_tx.write() = Some(shutdown_tx);
        *self.local_addr.write() = Some(addr);

        info!(service = "http", "Serving audio on http://{}", addr);
        Ok(addr)
    }

    pub async fn stop(&self) -> Result<()> {
        let tx = self.shutdown_tx.write().take();
        let handle = self.join_handle.write().take();
        drop(tx); // dropping the sender unblocks the server task's recv
        if let Some(h) = handle {
            let _ = h.await;
        }
        *self.local_addr.write() = None;
        info!(service = "http", "HTTP server service stopped");
        Ok(())
    }

    pub fn health(&self) -> ServiceHealth {
        match self.join_handle.read().as_ref() {
            Some(handle) if !handle.is_finished() => ServiceHealth::healthy(),
            Some(_) => ServiceHealth::unhealthy("server task exited"),
            None => ServiceHealth::unhealthy("server task not running"),
        }
    }
}
