use embassy_net::tcp::TcpSocket;
use rust_mqtt::{
    client::{
        client::MqttClient,
        client_config::{ClientConfig, MqttVersion},
    },
    packet::v5::{publish_packet::QualityOfService, reason_codes::ReasonCode},
    utils::rng_generator::CountingRng,
};

use telemetry_core::{Broker, DeviceConfig, Topics};

use crate::constants::{MQTT_KEEP_ALIVE_SECS, MQTT_MAX_PROPERTIES};

const STATUS_ONLINE: &[u8] = b"online";
const STATUS_OFFLINE: &[u8] = b"offline";

#[derive(Debug)]
pub enum Error {
    ConnectionFailed,
    SubscribeFailed,
    PublishMessageFailed,
    ReceiveFailed,
    PingFailed,
}

/// Broker session over an open TCP socket.
pub struct Mqtt<'a> {
    client: MqttClient<'a, TcpSocket<'a>, MQTT_MAX_PROPERTIES, CountingRng>,
    topics: &'a Topics,
    connected: bool,
}

impl<'a> Mqtt<'a> {
    /// Performs the MQTT handshake, announces the device and subscribes to
    /// its command and meta topics.
    pub async fn new(
        socket: TcpSocket<'a>,
        write_buffer: &'a mut [u8],
        recv_buffer: &'a mut [u8],
        device: &DeviceConfig<'a>,
        topics: &'a Topics,
    ) -> Result<Self, Error> {
        let mut config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_max_subscribe_qos(QualityOfService::QoS1);
        config.add_client_id(device.device_id);
        if !device.broker_username.is_empty() {
            config.add_username(device.broker_username);
            config.add_password(device.broker_password);
        }
        config.add_will(topics.status.as_str(), STATUS_OFFLINE, true);
        config.keep_alive = MQTT_KEEP_ALIVE_SECS;
        config.max_packet_size = write_buffer.len() as u32;

        let write_len = write_buffer.len();
        let recv_len = recv_buffer.len();
        let mut client = MqttClient::<_, MQTT_MAX_PROPERTIES, _>::new(
            socket,
            write_buffer,
            write_len,
            recv_buffer,
            recv_len,
            config,
        );

        match client.connect_to_broker().await {
            Ok(_) => {
                log::info!("MQTT connected to broker successfully");
            }
            Err(e) => {
                log::error!("MQTT connect_to_broker failed: {:?}", e);
                return Err(Error::ConnectionFailed);
            }
        }

        let mut mqtt = Self {
            client,
            topics,
            connected: true,
        };

        mqtt.announce(STATUS_ONLINE).await?;

        for topic in [&topics.command, &topics.meta] {
            if let Err(e) = mqtt.client.subscribe_to_topic(topic.as_str()).await {
                log::error!("Failed to subscribe to {}: {:?}", topic, e);
                return Err(Error::SubscribeFailed);
            }
            log::info!("Subscribed to {}", topic);
        }

        Ok(mqtt)
    }

    /// False once the session hit a network error.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Retained device status on the status topic.
    async fn announce(&mut self, status: &[u8]) -> Result<(), Error> {
        let topics = self.topics;
        match self
            .client
            .send_message(topics.status.as_str(), status, QualityOfService::QoS1, true)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                log::error!("Failed to publish status: {:?}", e);
                self.track(e);
                Err(Error::PublishMessageFailed)
            }
        }
    }

    pub async fn send_message(&mut self, topic: &str, message: &[u8]) -> Result<(), Error> {
        match self
            .client
            .send_message(topic, message, QualityOfService::QoS0, false)
            .await
        {
            Ok(_) => {
                log::debug!("Message published to {}", topic);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to publish message: {:?}", e);
                self.track(e);
                Err(Error::PublishMessageFailed)
            }
        }
    }

    /// Waits for the next inbound publish.
    pub async fn receive(&mut self) -> Result<(&str, &[u8]), Error> {
        match self.client.receive_message().await {
            Ok(message) => Ok(message),
            Err(e) => {
                if matches!(e, ReasonCode::NetworkError) {
                    self.connected = false;
                }
                log::warn!("MQTT receive failed: {:?}", e);
                Err(Error::ReceiveFailed)
            }
        }
    }

    pub async fn ping(&mut self) -> Result<(), Error> {
        self.client.send_ping().await.map_err(|e| {
            log::warn!("MQTT ping failed: {:?}", e);
            // An unanswered ping means the broker is gone.
            self.connected = false;
            Error::PingFailed
        })
    }

    /// Leaves cleanly, replacing the retained status with `offline` first
    /// since a clean disconnect suppresses the will.
    pub async fn disconnect(mut self) {
        if self.connected {
            let _ = self.announce(STATUS_OFFLINE).await;
        }
        let _ = self.client.disconnect().await;
    }

    fn track(&mut self, code: ReasonCode) {
        if matches!(code, ReasonCode::NetworkError) {
            self.connected = false;
        }
    }
}

impl Broker for Mqtt<'_> {
    type Error = Error;

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Error> {
        self.send_message(topic, payload).await
    }
}
