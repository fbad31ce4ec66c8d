//! Best-effort notification channels.
//!
//! Notification is a side channel, not a delivery guarantee: failures are
//! logged and swallowed by the caller, and nothing in the monitoring path
//! waits on a notification. Platform specifics (a wall-mounted speaker, a
//! pager gateway, a home-automation bus) live behind the `Notifier` trait.

use anyhow::{anyhow, Result};
use rumqttc::v5::{mqttbytes::QoS, Client, Connection, Event, MqttOptions};
use std::time::Duration;

use crate::alert::Alert;

pub trait Notifier: Send {
    fn name(&self) -> &'static str;

    /// Deliver one alert. Best-effort; the caller logs and drops errors.
    fn notify(&mut self, alert: &Alert) -> Result<()>;
}

/// Fallback channel: the alert is the log line.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn notify(&mut self, alert: &Alert) -> Result<()> {
        log::warn!("ALERT {}: {}", alert.alert_type, alert.details);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MqttSettings {
    /// Broker as `host` or `host:port` (default port 1883).
    pub broker_addr: String,
    pub topic: String,
    pub client_id: String,
}

/// Publishes alerts as JSON over MQTT (QoS 1).
///
/// A background thread drives the connection event loop; publishing from the
/// alert writer never blocks on the broker.
pub struct MqttNotifier {
    client: Client,
    topic: String,
    connection_handle: Option<std::thread::JoinHandle<()>>,
}

impl MqttNotifier {
    pub fn connect(settings: &MqttSettings) -> Result<Self> {
        let (host, port) = split_broker_addr(&settings.broker_addr)?;
        let mut options = MqttOptions::new(&settings.client_id, host, port);
        options.set_keep_alive(Duration::from_secs(60));
        options.set_clean_start(true);

        let (client, connection) = Client::new(options, 10);
        let connection_handle = Some(spawn_connection_thread(connection));
        log::info!(
            "mqtt notifier connected to {} (topic {})",
            settings.broker_addr,
            settings.topic
        );

        Ok(Self {
            client,
            topic: settings.topic.clone(),
            connection_handle,
        })
    }

    pub fn disconnect(mut self) -> Result<()> {
        self.client.disconnect()?;
        if let Some(handle) = self.connection_handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Notifier for MqttNotifier {
    fn name(&self) -> &'static str {
        "mqtt"
    }

    fn notify(&mut self, alert: &Alert) -> Result<()> {
        let payload = serde_json::to_vec(alert)?;
        self.client
            .publish(self.topic.clone(), QoS::AtLeastOnce, false, payload)?;
        Ok(())
    }
}

fn spawn_connection_thread(mut connection: Connection) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(_)) | Ok(Event::Outgoing(_)) => {}
                Err(e) => {
                    log::warn!("mqtt connection error: {}", e);
                    break;
                }
            }
        }
    })
}

fn split_broker_addr(addr: &str) -> Result<(String, u16)> {
    match addr.rsplit_once(':') {
        Some((host, port)) => {
            let port: u16 = port
                .parse()
                .map_err(|_| anyhow!("invalid mqtt broker port in '{}'", addr))?;
            Ok((host.to_string(), port))
        }
        None => Ok((addr.to_string(), 1883)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broker_addr_defaults_to_1883() {
        assert_eq!(
            split_broker_addr("broker.local").unwrap(),
            ("broker.local".to_string(), 1883)
        );
    }

    #[test]
    fn broker_addr_with_port() {
        assert_eq!(
            split_broker_addr("127.0.0.1:8883").unwrap(),
            ("127.0.0.1".to_string(), 8883)
        );
    }

    #[test]
    fn broker_addr_with_bad_port_is_an_error() {
        assert!(split_broker_addr("broker:http").is_err());
    }
}
