//! Application configuration management

use std::env;

use anyhow::{Context, Result};
use url::Url;

use crate::services::cast::{CastTarget, DEFAULT_CAST_PORT};
use crate::services::logging::LogFormat;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Host the audio HTTP server binds to
    pub host: String,

    /// Audio HTTP server port
    pub port: u16,

    /// Public base URL cast devices use to reach the audio server.
    /// `None` disables serving local streams.
    pub callback_url: Option<String>,

    /// Target cast device
    pub cast_device: Option<CastTarget>,

    /// Console log format
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .context("Invalid PORT")?;

        let callback_url = match lookup("CALLBACK_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(normalize_callback_url(&raw)?),
            None => derive_callback_url(port),
        };

        let cast_port: u16 = lookup("CAST_PORT")
            .map(|v| v.parse().context("Invalid CAST_PORT"))
            .transpose()?
            .unwrap_or(DEFAULT_CAST_PORT);

        let cast_device = lookup("CAST_DEVICE")
            .filter(|v| !v.trim().is_empty())
            .map(|v| CastTarget::parse_with_port(&v, cast_port).context("Invalid CAST_DEVICE"))
            .transpose()?;

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            callback_url,
            cast_device,
            log_format: lookup("LOG_FORMAT")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// Validate a callback URL and strip trailing slashes so relative paths can be
/// appended directly.
pub fn normalize_callback_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let url = Url::parse(raw).with_context(|| format!("Invalid CALLBACK_URL: {}", raw))?;
    anyhow::ensure!(
        matches!(url.scheme(), "http" | "https"),
        "CALLBACK_URL must be http or https, got {}",
        url.scheme()
    );
    Ok(raw.trim_end_matches('/').to_string())
}

/// `http://<primary local ip>:<port>`, if the local address can be determined
fn derive_callback_url(port: u16) -> Option<String> {
    match local_ip_address::local_ip() {
        Ok(ip) if ip.is_ipv6() => Some(format!("http://[{}]:{}", ip, port)),
        Ok(ip) => Some(format!("http://{}:{}", ip, port)),
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine local IP address for callback url");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9090"),
            ("CALLBACK_URL", "http://openhab.local:9090/"),
            ("CAST_DEVICE", "192.168.1.20"),
            ("CAST_PORT", "8010"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9090);
        assert_eq!(config.callback_url.as_deref(), Some("http://openhab.local:9090"));
        assert_eq!(config.cast_device, Some(CastTarget::new("192.168.1.20", 8010)));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_device_port_in_address_wins() {
        let config = Config::from_lookup(lookup(&[
            ("CALLBACK_URL", "http://host:8080"),
            ("CAST_DEVICE", "speaker.local:8011"),
            ("CAST_PORT", "8010"),
        ]))
        .unwrap();

        assert_eq!(config.cast_device, Some(CastTarget::new("speaker.local", 8011)));
    }

    #[test]
    fn test_cast_port_applies_to_bare_ipv6_device() {
        let config = Config::from_lookup(lookup(&[
            ("CALLBACK_URL", "http://host:8080"),
            ("CAST_DEVICE", "fe80::1"),
            ("CAST_PORT", "8010"),
        ]))
        .unwrap();

        assert_eq!(config.cast_device, Some(CastTarget::new("fe80::1", 8010)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("CALLBACK_URL", "http://host:8080")])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cast_device, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("CALLBACK_URL", "not a url")])).is_err());
        assert!(Config::from_lookup(lookup(&[("CALLBACK_URL", "ftp://host/")])).is_err());
        assert!(
            Config::from_lookup(lookup(&[("CALLBACK_URL", "http://h"), ("CAST_PORT", "x")]))
                .is_err()
        );
    }

    #[test]
    fn test_normalize_callback_url() {
        assert_eq!(
            normalize_callback_url(" http://host:8080// ").unwrap(),
            "http://host:8080"
        );
        assert_eq!(
            normalize_callback_url("https://example.org/openhab").unwrap(),
            "https://example.org/openhab"
        );
    }
}
