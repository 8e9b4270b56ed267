use embassy_net::Stack;
use embassy_time::{with_timeout, Duration, Instant, Timer};

use telemetry_core::{DeviceAgent, Diagnostics, Step};

use crate::constants::*;
use crate::led::StatusLed;
use crate::mqtt::{self, Mqtt};
use crate::sensors::Sensors;
use crate::transport;
use crate::wifi;

pub type Agent = DeviceAgent<'static, StatusLed>;

#[derive(Debug)]
pub enum Error {
    #[allow(dead_code)]
    Transport(transport::Error),
    #[allow(dead_code)]
    Mqtt(mqtt::Error),
}

/// Socket and MQTT client buffers, reused by every broker session.
pub struct Buffers {
    pub rx: [u8; RX_BUFFER_SIZE],
    pub tx: [u8; TX_BUFFER_SIZE],
    pub mqtt_rx: [u8; MQTT_RX_BUFFER_SIZE],
    pub mqtt_tx: [u8; MQTT_TX_BUFFER_SIZE],
}

impl Buffers {
    pub const fn new() -> Self {
        Self {
            rx: [0; RX_BUFFER_SIZE],
            tx: [0; TX_BUFFER_SIZE],
            mqtt_rx: [0; MQTT_RX_BUFFER_SIZE],
            mqtt_tx: [0; MQTT_TX_BUFFER_SIZE],
        }
    }
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

fn diagnostics(now: u64) -> Diagnostics {
    Diagnostics {
        rssi: wifi::rssi(),
        uptime_secs: now / 1000,
        free_heap: Some(esp_alloc::HEAP.free() as u32),
    }
}

pub fn restart() -> ! {
    log::warn!("Restarting");
    esp_hal::system::software_reset()
}

#[embassy_executor::task]
pub async fn agent_task(
    stack: Stack<'static>,
    mut agent: Agent,
    mut sensors: Sensors,
    buffers: &'static mut Buffers,
) {
    log::info!(
        "Agent started, publishing every {} ms",
        agent.interval().as_millis()
    );

    loop {
        let now = now_ms();
        match agent.supervise(now, wifi::is_up(stack), false) {
            Step::Reboot => restart(),
            Step::AssociateWifi | Step::Ready => {
                Timer::after(Duration::from_millis(LOOP_TICK_MS)).await
            }
            Step::Backoff { until } => {
                log::debug!("Next broker attempt in {} ms", until.saturating_sub(now));
                Timer::at(Instant::from_millis(until)).await
            }
            Step::ConnectBroker => {
                if let Err(e) = run_session(stack, &mut agent, &mut sensors, buffers).await {
                    log::error!("Broker connection error: {:?}", e);
                    agent.connect_failed(now_ms());
                }
            }
        }

        if agent.reboot_due(now_ms()) {
            restart();
        }
    }
}

/// Connects to the broker and serves the session until the link drops.
///
/// Errors only describe a failed connect; a session that was established
/// and then lost is reported to the supervisor and returns `Ok`.
async fn run_session(
    stack: Stack<'static>,
    agent: &mut Agent,
    sensors: &mut Sensors,
    buffers: &mut Buffers,
) -> Result<(), Error> {
    let device = *agent.config();
    let topics = agent.topics().clone();

    let socket = transport::connect(
        stack,
        &mut buffers.rx,
        &mut buffers.tx,
        device.broker_host,
        device.broker_port,
    )
    .await
    .map_err(Error::Transport)?;

    let mut mqtt = Mqtt::new(
        socket,
        &mut buffers.mqtt_tx,
        &mut buffers.mqtt_rx,
        &device,
        &topics,
    )
    .await
    .map_err(Error::Mqtt)?;

    agent.connect_succeeded(now_ms());

    let ping_interval = Duration::from_secs(u64::from(MQTT_KEEP_ALIVE_SECS) / 2);
    let mut last_ping = Instant::now();

    loop {
        let now = now_ms();

        if agent.reboot_due(now) {
            mqtt.disconnect().await;
            restart();
        }

        match agent.supervise(now, wifi::is_up(stack), mqtt.is_connected()) {
            Step::Ready => {}
            Step::Reboot => restart(),
            step => {
                log::warn!("Leaving broker session: {:?}", step);
                break;
            }
        }

        if let Some(false) = agent
            .tick(now, &mut mqtt, sensors, &diagnostics(now))
            .await
        {
            log::warn!("Telemetry publish failed");
        }
        if !mqtt.is_connected() {
            break;
        }

        if last_ping.elapsed() >= ping_interval {
            if mqtt.ping().await.is_err() {
                break;
            }
            last_ping = Instant::now();
        }

        let received = with_timeout(Duration::from_millis(LOOP_TICK_MS), mqtt.receive()).await;
        if let Ok(Ok((topic, payload))) = received {
            log::info!("Received {} bytes on {}", payload.len(), topic);
            agent.handle_message(now_ms(), topic, payload);
        }
        if !mqtt.is_connected() {
            break;
        }
    }

    agent.broker_lost(now_ms());
    Ok(())
}
