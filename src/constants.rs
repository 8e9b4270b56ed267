/// Current firmware version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the heap in DRAM (internal memory)
pub const HEAP_SIZE: usize = 72 * 1024;

/// Size of the TCP socket receive buffer
pub const RX_BUFFER_SIZE: usize = 4096;
/// Size of the TCP socket transmit buffer
pub const TX_BUFFER_SIZE: usize = 4096;

/// Size of the MQTT client receive buffer for application data
pub const MQTT_RX_BUFFER_SIZE: usize = 1024;
/// Size of the MQTT client transmit buffer for application data
pub const MQTT_TX_BUFFER_SIZE: usize = 1024;
/// Maximum number of MQTT v5 properties per packet
pub const MQTT_MAX_PROPERTIES: usize = 5;
/// MQTT keep-alive announced to the broker
pub const MQTT_KEEP_ALIVE_SECS: u16 = 30;

/// TCP socket inactivity timeout; bounds a stalled broker connect
pub const SOCKET_TIMEOUT_SECS: u64 = 30;

/// Delay between Wi-Fi reconnection attempts
pub const WIFI_RECONNECT_DELAY_MS: u64 = 5000;
/// Timeout for a single Wi-Fi association attempt
pub const WIFI_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Interval between RSSI samples while associated
pub const RSSI_SAMPLE_INTERVAL_SECS: u64 = 10;

/// Reboot when Wi-Fi never associates within this long after boot
pub const BOOT_WIFI_TIMEOUT_MS: u64 = 60_000;

/// Agent loop period; also bounds how long an inbound receive may block
pub const LOOP_TICK_MS: u64 = 50;

/// Debounce window for the pulse input
pub const PULSE_DEBOUNCE_MS: u64 = 20;

/// ADC reference voltage and full-scale count (12-bit)
pub const ADC_VREF: f32 = 3.3;
pub const ADC_RESOLUTION: f32 = 4095.0;
