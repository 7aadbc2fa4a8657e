//! MQTT transport for cloud events
//!
//! Event `NAME` travels on topic `{topic_prefix}/NAME`.

use crate::publisher::Publisher;
use crate::trigger::TriggerHandler;
use crate::CloudError;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Cloud connection configuration
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// MQTT broker host
    pub broker_host: String,
    /// MQTT port
    pub broker_port: u16,
    /// Client identifier
    pub client_id: String,
    /// Topic prefix shared by all events
    pub topic_prefix: String,
    /// Keep-alive interval (seconds)
    pub keep_alive_secs: u64,
    /// Delay before polling again after a connection error (seconds)
    pub reconnect_delay_secs: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "sensor-node".to_string(),
            topic_prefix: "events".to_string(),
            keep_alive_secs: 30,
            reconnect_delay_secs: 5,
        }
    }
}

/// Topic carrying event `name`
pub fn event_topic(prefix: &str, name: &str) -> String {
    format!("{}/{}", prefix, name)
}

/// Event name carried on `topic`, if it belongs to `prefix`
pub fn event_name<'a>(prefix: &str, topic: &'a str) -> Option<&'a str> {
    topic
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|name| !name.is_empty() && !name.contains('/'))
}

/// MQTT-backed cloud event channel
pub struct MqttCloud {
    config: CloudConfig,
    client: AsyncClient,
    event_task: JoinHandle<()>,
}

impl MqttCloud {
    /// Connect to the broker and start delivering triggers to `handler`.
    ///
    /// The MQTT event loop runs on its own tokio task; `handler` is invoked
    /// there for every inbound event.
    pub fn connect(config: CloudConfig, handler: TriggerHandler) -> Result<Self, CloudError> {
        if config.broker_host.is_empty() {
            return Err(CloudError::Connection("Broker host is empty".to_string()));
        }

        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, mut eventloop) = AsyncClient::new(options, 10);
        let subscriber = client.clone();
        let prefix = config.topic_prefix.clone();
        let filter = event_topic(&prefix, "+");
        let reconnect_delay = Duration::from_secs(config.reconnect_delay_secs);

        let event_task = tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("Connected, subscribing to {}", filter);
                        if let Err(e) = subscriber.try_subscribe(filter.as_str(), QoS::AtMostOnce) {
                            error!("Subscribe to {} failed: {}", filter, e);
                        }
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        match event_name(&prefix, &publish.topic) {
                            Some(name) => {
                                if !handler.handle(name, &publish.payload) {
                                    debug!("Ignoring event {}", name);
                                }
                            }
                            None => debug!("Ignoring topic {}", publish.topic),
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("MQTT connection error: {}", e);
                        tokio::time::sleep(reconnect_delay).await;
                    }
                }
            }
        });

        info!(
            "Cloud channel to {}:{} started",
            config.broker_host, config.broker_port
        );
        Ok(Self {
            config,
            client,
            event_task,
        })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }
}

impl Publisher for MqttCloud {
    async fn publish(&self, name: &str, payload: &[u8]) -> Result<(), CloudError> {
        let topic = event_topic(&self.config.topic_prefix, name);
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.to_vec())
            .await
            .map_err(|e| CloudError::Publish(e.to_string()))
    }
}

impl Drop for MqttCloud {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}
