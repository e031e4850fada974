use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "DISPENSER_KERNEL_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KernelConfig {
    pub mqtt: MqttConf,
    pub http: HttpConf,
    pub dispatch: DispatchConf,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub alert_topic: String,
    pub notification_topic: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub bind: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Log,
    Mqtt,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DispatchConf {
    pub debounce_ms: u64,
    pub sink: SinkKind,
}

impl DispatchConf {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for MqttConf {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            client_id: "dispenser-kernel".into(),
            alert_topic: "dispenser/alerts/event@v1".into(),
            notification_topic: "dispenser/notifications/request@v1".into(),
        }
    }
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".into() }
    }
}

impl Default for DispatchConf {
    fn default() -> Self {
        Self {
            debounce_ms: 2000,
            sink: SinkKind::Mqtt,
        }
    }
}

impl KernelConfig {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let txt = fs::read_to_string(path).await?;
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&txt)?)
    }
}

/// Reads `$DISPENSER_KERNEL_CONFIG` (default `kernel.yaml`); falls back to
/// defaults when the file is missing or invalid.
pub async fn load_config() -> KernelConfig {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "kernel.yaml".into());
    if !Path::new(&path).exists() {
        info!(path = %path, "no config file, using defaults");
        return KernelConfig::default();
    }
    match KernelConfig::from_file(&path).await {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path, "invalid config, using defaults: {e}");
            KernelConfig::default()
        }
    }
}
