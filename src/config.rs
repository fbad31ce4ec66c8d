use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::monitor::MonitorSettings;
use crate::notify::MqttSettings;

const DEFAULT_DB_PATH: &str = "poolwatch.db";
const DEFAULT_SOURCE_URL: &str = "stub://pool";
const DEFAULT_SOURCE_FPS: u32 = 30;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_DETECTOR_NAME: &str = "stub";
const DEFAULT_DETECTOR_TIMEOUT_MS: u64 = 500;
const DEFAULT_SAMPLE_INTERVAL: u64 = 30;
const DEFAULT_MOTION_THRESHOLD: u8 = 25;
const DEFAULT_ALERT_AFTER_SECS: u64 = 10;
const DEFAULT_MQTT_TOPIC: &str = "poolwatch/alerts";
const DEFAULT_MQTT_CLIENT_ID: &str = "poolwatchd";

#[derive(Debug, Deserialize, Default)]
struct PoolwatchConfigFile {
    db_path: Option<String>,
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    risk: Option<RiskConfigFile>,
    mqtt: Option<MqttConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    still_after: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    name: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct RiskConfigFile {
    sample_interval: Option<u64>,
    motion_threshold: Option<u8>,
    alert_after_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct MqttConfigFile {
    broker_addr: Option<String>,
    topic: Option<String>,
    client_id: Option<String>,
}

/// Daemon configuration: file (`POOLWATCH_CONFIG`, JSON) overlaid by
/// `POOLWATCH_*` environment variables, then validated.
#[derive(Debug, Clone)]
pub struct PoolwatchConfig {
    pub db_path: String,
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    pub risk: RiskSettings,
    /// `None` when no broker is configured; the daemon falls back to the
    /// log notifier.
    pub mqtt: Option<MqttSettings>,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// For `stub://` sources: frame index after which the synthetic subject
    /// stops moving.
    pub still_after: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub name: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RiskSettings {
    pub sample_interval: u64,
    pub motion_threshold: u8,
    pub alert_after: Duration,
}

impl PoolwatchConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("POOLWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PoolwatchConfigFile) -> Self {
        let db_path = file.db_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|source| source.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            fps: file
                .source
                .as_ref()
                .and_then(|source| source.fps)
                .unwrap_or(DEFAULT_SOURCE_FPS),
            width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(DEFAULT_SOURCE_HEIGHT),
            still_after: file.source.as_ref().and_then(|source| source.still_after),
        };
        let detector = DetectorSettings {
            name: file
                .detector
                .as_ref()
                .and_then(|detector| detector.name.clone())
                .unwrap_or_else(|| DEFAULT_DETECTOR_NAME.to_string()),
            timeout: Duration::from_millis(
                file.detector
                    .as_ref()
                    .and_then(|detector| detector.timeout_ms)
                    .unwrap_or(DEFAULT_DETECTOR_TIMEOUT_MS),
            ),
        };
        let risk = RiskSettings {
            sample_interval: file
                .risk
                .as_ref()
                .and_then(|risk| risk.sample_interval)
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL),
            motion_threshold: file
                .risk
                .as_ref()
                .and_then(|risk| risk.motion_threshold)
                .unwrap_or(DEFAULT_MOTION_THRESHOLD),
            alert_after: Duration::from_secs(
                file.risk
                    .as_ref()
                    .and_then(|risk| risk.alert_after_secs)
                    .unwrap_or(DEFAULT_ALERT_AFTER_SECS),
            ),
        };
        let mqtt = file.mqtt.and_then(|mqtt| {
            mqtt.broker_addr.map(|broker_addr| MqttSettings {
                broker_addr,
                topic: mqtt.topic.unwrap_or_else(|| DEFAULT_MQTT_TOPIC.to_string()),
                client_id: mqtt
                    .client_id
                    .unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_string()),
            })
        });
        Self {
            db_path,
            source,
            detector,
            risk,
            mqtt,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("POOLWATCH_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
        if let Ok(url) = std::env::var("POOLWATCH_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(name) = std::env::var("POOLWATCH_DETECTOR") {
            if !name.trim().is_empty() {
                self.detector.name = name;
            }
        }
        if let Ok(interval) = std::env::var("POOLWATCH_SAMPLE_INTERVAL") {
            self.risk.sample_interval = interval
                .parse()
                .map_err(|_| anyhow!("POOLWATCH_SAMPLE_INTERVAL must be a frame count"))?;
        }
        if let Ok(threshold) = std::env::var("POOLWATCH_MOTION_THRESHOLD") {
            self.risk.motion_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("POOLWATCH_MOTION_THRESHOLD must be 0-255"))?;
        }
        if let Ok(secs) = std::env::var("POOLWATCH_ALERT_AFTER_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|_| anyhow!("POOLWATCH_ALERT_AFTER_SECS must be an integer number of seconds"))?;
            self.risk.alert_after = Duration::from_secs(secs);
        }
        if let Ok(broker) = std::env::var("POOLWATCH_MQTT_BROKER") {
            if !broker.trim().is_empty() {
                let existing = self.mqtt.take();
                self.mqtt = Some(MqttSettings {
                    broker_addr: broker,
                    topic: existing
                        .as_ref()
                        .map(|mqtt| mqtt.topic.clone())
                        .unwrap_or_else(|| DEFAULT_MQTT_TOPIC.to_string()),
                    client_id: existing
                        .map(|mqtt| mqtt.client_id)
                        .unwrap_or_else(|| DEFAULT_MQTT_CLIENT_ID.to_string()),
                });
            }
        }
        if let Ok(topic) = std::env::var("POOLWATCH_MQTT_TOPIC") {
            if !topic.trim().is_empty() {
                if let Some(mqtt) = self.mqtt.as_mut() {
                    mqtt.topic = topic;
                }
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.source.fps == 0 {
            return Err(anyhow!("source fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be greater than zero"));
        }
        if self.risk.sample_interval == 0 {
            return Err(anyhow!("sample_interval must be at least one frame"));
        }
        if self.risk.motion_threshold == 0 {
            return Err(anyhow!("motion_threshold must be greater than zero"));
        }
        if self.risk.alert_after.is_zero() {
            return Err(anyhow!("alert_after must be greater than zero"));
        }
        Ok(())
    }

    /// Monitor settings derived from this config. `realtime` paces the loop
    /// to the source frame rate; replay and tests leave it off.
    pub fn monitor_settings(&self, realtime: bool) -> MonitorSettings {
        MonitorSettings {
            sample_interval: self.risk.sample_interval,
            motion_threshold: self.risk.motion_threshold,
            alert_after: self.risk.alert_after,
            detector_timeout: self.detector.timeout,
            frame_interval: realtime.then(|| Duration::from_secs(1) / self.source.fps),
        }
    }
}

fn read_config_file(path: &Path) -> Result<PoolwatchConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
