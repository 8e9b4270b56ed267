use telemetry_core::DeviceConfig;

pub struct Config {
    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub wifi_psk: &'static str,

    // Broker, identity and initial interval of this device
    pub device: DeviceConfig<'static>,
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));
