use core::str::FromStr;
use core::sync::atomic::{AtomicI32, Ordering};

use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{with_timeout, Duration, Timer};

use esp_hal::rng::Rng;
use esp_radio::{
    wifi::{ClientConfig, Config, ModeConfig, WifiController, WifiDevice, WifiEvent, WifiStaState},
    Controller,
};

use heapless::String;
use log::info;
use static_cell::StaticCell;

use crate::config::CONFIG;
use crate::constants::{
    RSSI_SAMPLE_INTERVAL_SECS, WIFI_CONNECT_TIMEOUT_SECS, WIFI_RECONNECT_DELAY_MS,
};

static RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();

const RSSI_UNKNOWN: i32 = i32::MIN;

/// Last sampled signal strength, written by the connection task.
static RSSI: AtomicI32 = AtomicI32::new(RSSI_UNKNOWN);

pub struct Wifi {
    pub stack: Stack<'static>,
}

#[derive(Debug)]
pub enum Error {
    WifiInitFailed,
    HostnameTooLong,
    SpawnFailed,
}

impl Wifi {
    pub fn new(
        init: &'static Controller<'static>,
        wifi: esp_hal::peripherals::WIFI<'static>,
        rng: Rng,
        spawner: Spawner,
    ) -> Result<Self, Error> {
        let (controller, interfaces) = esp_radio::wifi::new(init, wifi, Config::default())
            .map_err(|_| Error::WifiInitFailed)?;

        let mut dhcp_config = embassy_net::DhcpConfig::default();
        dhcp_config.hostname = Some(
            String::<32>::from_str(CONFIG.device.device_id).map_err(|_| Error::HostnameTooLong)?,
        );

        let seed = (rng.random() as u64) << 32 | rng.random() as u64;
        let config = embassy_net::Config::dhcpv4(dhcp_config);

        let resources = RESOURCES.init(StackResources::new());
        let (stack, runner) = embassy_net::new(interfaces.sta, config, resources, seed);

        spawner
            .spawn(connection(controller))
            .map_err(|_| Error::SpawnFailed)?;
        spawner
            .spawn(net_task(runner))
            .map_err(|_| Error::SpawnFailed)?;

        Ok(Self { stack })
    }
}

/// Associated with an access point and holding an IPv4 lease.
pub fn is_up(stack: Stack<'static>) -> bool {
    stack.is_link_up() && stack.config_v4().is_some()
}

/// Most recent RSSI sample, if associated.
pub fn rssi() -> Option<i8> {
    match RSSI.load(Ordering::Relaxed) {
        RSSI_UNKNOWN => None,
        value => Some(value.clamp(i8::MIN as i32, i8::MAX as i32) as i8),
    }
}

/// Samples RSSI until the station drops.
async fn monitor(controller: &mut WifiController<'static>) {
    loop {
        if let Ok(value) = controller.rssi() {
            RSSI.store(value, Ordering::Relaxed);
        }

        match select(
            controller.wait_for_event(WifiEvent::StaDisconnected),
            Timer::after(Duration::from_secs(RSSI_SAMPLE_INTERVAL_SECS)),
        )
        .await
        {
            Either::First(_) => break,
            Either::Second(_) => {}
        }
    }

    RSSI.store(RSSI_UNKNOWN, Ordering::Relaxed);
    info!("Wifi disconnected");
}

#[embassy_executor::task]
async fn connection(mut controller: WifiController<'static>) {
    info!(
        "Start connection task, device capabilities: {:?}",
        controller.capabilities()
    );
    loop {
        if esp_radio::wifi::sta_state() == WifiStaState::Connected {
            // wait until we're no longer connected
            monitor(&mut controller).await;
            Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
        }

        if !matches!(controller.is_started(), Ok(true)) {
            info!("Connecting to wifi with SSID: {:?}", CONFIG.wifi_ssid);
            let client_config = ClientConfig::default()
                .with_ssid(CONFIG.wifi_ssid.into())
                .with_password(CONFIG.wifi_psk.into());
            let config = ModeConfig::Client(client_config);
            if let Err(e) = controller.set_config(&config) {
                log::error!("Failed to set WiFi config: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Starting wifi");
            if let Err(e) = controller.start_async().await {
                log::error!("Failed to start WiFi: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Wifi started!");
        }

        info!("About to connect to {:?}...", CONFIG.wifi_ssid);
        match with_timeout(
            Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS),
            controller.connect_async(),
        )
        .await
        {
            Ok(Ok(_)) => info!("Wifi connected!"),
            Ok(Err(e)) => {
                info!("Failed to connect to wifi: {e:?}");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
            Err(_) => {
                info!("Wifi connection timed out");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
