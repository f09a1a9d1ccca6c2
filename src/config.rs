use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::focus::FocusPolicy;

const SELECTED_MIDI_PORT: &str = "selected_midi_port";
const SETTLE_DELAY_MS: &str = "settle_delay_ms";
const FOCUS_POLICY: &str = "focus_policy";

const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(400);

/// Flat key-value settings file.
///
/// Unknown keys are kept and written back untouched.
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    values: toml::Table,
}

impl Config {
    /// `<config dir>/osmose-presets/config.toml`, or `config.toml` in the
    /// working directory when the platform has no config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("osmose-presets").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Read the file at `path`. A missing or unreadable file gives an
    /// empty store.
    pub fn load(path: &Path) -> Self {
        let values = match std::fs::read_to_string(path) {
            Ok(content) => content.parse::<toml::Table>().unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config {}: {e}", path.display());
                toml::Table::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(e) => {
                log::warn!("Cannot read config {}: {e}", path.display());
                toml::Table::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    pub fn selected_midi_port(&self) -> Option<&str> {
        self.get_str(SELECTED_MIDI_PORT).filter(|s| !s.is_empty())
    }

    pub fn settle_delay(&self) -> Duration {
        match self.values.get(SETTLE_DELAY_MS).and_then(|v| v.as_integer()) {
            Some(ms) if ms >= 0 => Duration::from_millis(ms as u64),
            Some(ms) => {
                log::warn!("Negative {SETTLE_DELAY_MS} = {ms}, using default");
                DEFAULT_SETTLE_DELAY
            }
            None => DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn focus_policy(&self) -> FocusPolicy {
        match self.get_str(FOCUS_POLICY).map(str::parse::<FocusPolicy>) {
            Some(Ok(policy)) => policy,
            Some(Err(e)) => {
                log::warn!("{e}, using default");
                FocusPolicy::default()
            }
            None => FocusPolicy::default(),
        }
    }

    /// Remember `port` and write the file.
    pub fn set_selected_midi_port(&mut self, port: &str) -> anyhow::Result<()> {
        self.values
            .insert(SELECTED_MIDI_PORT.into(), toml::Value::String(port.into()));
        self.save()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let content = toml::to_string(&self.values)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("writing {}", self.path.display()))?;
        log::debug!("Saved config to {}", self.path.display());
        Ok(())
    }
}
