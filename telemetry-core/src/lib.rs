//! Hardware-independent logic of the telemetry agent: debounced pulse
//! counting, publish scheduling, connection supervision, payload building
//! and remote command handling.
#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

pub mod agent;
pub mod config;
pub mod publisher;
pub mod pulse;
pub mod remote;
pub mod scheduler;
pub mod supervisor;
pub mod topics;

pub use agent::{DeviceAgent, REBOOT_GRACE_MS};
pub use config::DeviceConfig;
pub use publisher::{
    voltage_from_raw, Broker, Diagnostics, Indicator, Reading, Sensor, SensorError,
    TelemetryPublisher,
};
pub use pulse::{PulseCounter, PulseSnapshot};
pub use remote::RemoteHandler;
pub use scheduler::{TelemetryInterval, TelemetryScheduler};
pub use supervisor::{BootPolicy, ConnectionSupervisor, LinkState, RetryPolicy, Step};
pub use topics::Topics;
