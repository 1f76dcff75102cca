use std::{fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use publisher::{ConnectOptions, DEFAULT_BROKER_URL, DEFAULT_CLIENT_ID_PREFIX};
use translator::{Calibration, ColorPolicy, Translator};
use url::Url;

pub const SETTINGS_FILE: &str = "neo_commands.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bind_addr: String,
    pub broker_url: String,
    pub client_id_prefix: String,
    pub connect_timeout_ms: u64,
    pub queue_capacity: usize,
    pub keep_alive_secs: u64,
    /// 0 disables reconnection.
    pub reconnect_period_ms: u64,
    pub calibration: String,
    pub calibration_file: Option<String>,
    pub color_policy: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8480".into(),
            broker_url: DEFAULT_BROKER_URL.into(),
            client_id_prefix: DEFAULT_CLIENT_ID_PREFIX.into(),
            connect_timeout_ms: 5_000,
            queue_capacity: 64,
            keep_alive_secs: 60,
            reconnect_period_ms: 1_000,
            calibration: translator::calibration::DEFAULT_REVISION.into(),
            calibration_file: None,
            color_policy: "strict".into(),
        }
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(file.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then environment variables. Unparsable
/// values are ignored and the previous layer wins.
pub fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        if let Ok(file_cfg) = toml::from_str::<toml::Table>(raw) {
            let text = |key: &str| {
                file_cfg
                    .get(key)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            };
            let number = |key: &str| file_cfg.get(key).and_then(|v| v.as_integer());

            if let Some(v) = text("bind_addr") {
                settings.bind_addr = v;
            }
            if let Some(v) = text("broker_url") {
                settings.broker_url = v;
            }
            if let Some(v) = text("client_id_prefix") {
                settings.client_id_prefix = v;
            }
            if let Some(v) = number("connect_timeout_ms").and_then(|v| u64::try_from(v).ok()) {
                settings.connect_timeout_ms = v;
            }
            if let Some(v) = number("queue_capacity").and_then(|v| usize::try_from(v).ok()) {
                settings.queue_capacity = v;
            }
            if let Some(v) = number("keep_alive_secs").and_then(|v| u64::try_from(v).ok()) {
                settings.keep_alive_secs = v;
            }
            if let Some(v) = number("reconnect_period_ms").and_then(|v| u64::try_from(v).ok()) {
                settings.reconnect_period_ms = v;
            }
            if let Some(v) = text("calibration") {
                settings.calibration = v;
            }
            if let Some(v) = text("calibration_file") {
                settings.calibration_file = Some(v);
            }
            if let Some(v) = text("color_policy") {
                settings.color_policy = v;
            }
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("BROKER_URL") {
        settings.broker_url = v;
    }
    if let Some(v) = env("APP__BROKER_URL") {
        settings.broker_url = v;
    }

    if let Some(v) = env("CLIENT_ID_PREFIX") {
        settings.client_id_prefix = v;
    }
    if let Some(v) = env("APP__CLIENT_ID_PREFIX") {
        settings.client_id_prefix = v;
    }

    if let Some(v) = env("APP__CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        settings.connect_timeout_ms = v;
    }
    if let Some(v) = env("APP__QUEUE_CAPACITY").and_then(|v| v.parse().ok()) {
        settings.queue_capacity = v;
    }
    if let Some(v) = env("APP__KEEP_ALIVE_SECS").and_then(|v| v.parse().ok()) {
        settings.keep_alive_secs = v;
    }
    if let Some(v) = env("APP__RECONNECT_PERIOD_MS").and_then(|v| v.parse().ok()) {
        settings.reconnect_period_ms = v;
    }

    if let Some(v) = env("APP__CALIBRATION") {
        settings.calibration = v;
    }
    if let Some(v) = env("APP__CALIBRATION_FILE") {
        settings.calibration_file = Some(v);
    }
    if let Some(v) = env("APP__COLOR_POLICY") {
        settings.color_policy = v;
    }

    settings
}

impl Settings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn connect_options(&self) -> anyhow::Result<ConnectOptions> {
        let broker_url = Url::parse(self.broker_url.trim())
            .with_context(|| format!("invalid broker url '{}'", self.broker_url))?;
        if !matches!(broker_url.scheme(), "ws" | "wss" | "mqtt" | "tcp") {
            return Err(anyhow!(
                "unsupported broker url scheme '{}' in '{}'",
                broker_url.scheme(),
                self.broker_url
            ));
        }

        let mut options = ConnectOptions::new(broker_url);
        options.keep_alive = Duration::from_secs(self.keep_alive_secs);
        options.queue_capacity = self.queue_capacity;
        options.reconnect_period = (self.reconnect_period_ms > 0)
            .then(|| Duration::from_millis(self.reconnect_period_ms));
        Ok(options)
    }

    /// A calibration file, when set, takes precedence over the named revision.
    pub fn translator(&self) -> anyhow::Result<Translator> {
        let calibration = match &self.calibration_file {
            Some(path) => Calibration::from_file(Path::new(path))
                .with_context(|| format!("failed to load calibration from '{path}'"))?,
            None => Calibration::builtin(&self.calibration)?,
        };
        let color_policy: ColorPolicy = self
            .color_policy
            .parse()
            .map_err(|err: String| anyhow!(err))?;
        Ok(Translator::new(calibration, color_policy))
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
