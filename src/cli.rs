//! Minimal CLI parsing for the host binary.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::services::cast::CastTarget;

/// What the binary should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Play a remote URL directly
    PlayUrl(String),
    /// Serve a local file and play it
    PlayFile(PathBuf),
    /// Stop playback
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub action: Action,
    pub device: Option<CastTarget>,
    pub volume: Option<u8>,
}

impl CliOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut action = None;
        let mut device = None;
        let mut volume = None;

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg, None),
            };
            let mut value = |name: &str| {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .with_context(|| format!("{} needs a value", name))
            };

            match flag.as_str() {
                "--url" => action = Some(Action::PlayUrl(value("--url")?)),
                "--file" => action = Some(Action::PlayFile(PathBuf::from(value("--file")?))),
                "--stop" => action = Some(Action::Stop),
                "--device" => device = Some(value("--device")?.parse::<CastTarget>()?),
                "--volume" => {
                    let percent: u8 = value("--volume")?.parse().context("Invalid --volume")?;
                    anyhow::ensure!(percent <= 100, "--volume must be between 0 and 100");
                    volume = Some(percent);
                }
                other => anyhow::bail!("Unknown argument: {}", other),
            }
        }

        Ok(Self {
            action: action.context("One of --url, --file or --stop is required")?,
            device,
            volume,
        })
    }
}

pub const USAGE: &str = "usage: castsink (--url <URL> | --file <PATH> | --stop) [--device <HOST[:PORT]>] [--volume <0-100>]";

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_parse_url() {
        let opts = CliOptions::parse(["--url", "http://radio.local/chime.mp3"]).unwrap();
        assert_eq!(opts.action, Action::PlayUrl("http://radio.local/chime.mp3".to_string()));
        assert_eq!(opts.device, None);
    }

    #[test]
    fn test_parse_file_with_device_and_volume() {
        let opts =
            CliOptions::parse(["--file=doorbell.wav", "--device", "10.0.0.5:8009", "--volume=40"])
                .unwrap();
        assert_eq!(opts.action, Action::PlayFile(PathBuf::from("doorbell.wav")));
        assert_eq!(opts.device, Some(CastTarget::new("10.0.0.5", 8009)));
        assert_eq!(opts.volume, Some(40));
    }

    #[test]
    fn test_parse_stop() {
        assert_eq!(CliOptions::parse(["--stop"]).unwrap().action, Action::Stop);
    }

    #[test]
    fn test_parse_errors() {
        assert!(CliOptions::parse(Vec::<String>::new()).is_err());
        assert!(CliOptions::parse(["--url"]).is_err());
        assert!(CliOptions::parse(["--stop", "--volume", "101"]).is_err());
        assert!(CliOptions::parse(["--bogus"]).is_err());
    }
}
