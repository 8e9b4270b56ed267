#![no_std]
#![no_main]

use static_cell::StaticCell;

use embassy_executor::Spawner;
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;
use esp_radio::Controller;

use hal::{
    gpio::{Input, InputConfig, Io, Level, Output, OutputConfig, Pull},
    rng::Rng,
    timer::timg::TimerGroup,
};

use telemetry_core::{BootPolicy, ConnectionSupervisor, DeviceAgent, RetryPolicy};

pub mod config;
pub mod constants;
mod led;
mod mqtt;
mod pulse_input;
pub mod sensors;
mod telemetry;
pub mod transport;
mod wifi;

use config::CONFIG;
use constants::*;
use led::StatusLed;
use sensors::{analog::AnalogProbe, digital::DigitalInputs, Sensors};
use telemetry::{agent_task, Buffers};
use wifi::Wifi;

esp_bootloader_esp_idf::esp_app_desc!();

static RADIO: StaticCell<Controller<'static>> = StaticCell::new();
static BUFFERS: StaticCell<Buffers> = StaticCell::new();

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    init_logger(log::LevelFilter::Info);
    log::info!("Telemetry agent v{}", VERSION);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    let supervisor = ConnectionSupervisor::new(
        RetryPolicy::default(),
        BootPolicy::RebootAfter {
            timeout_ms: BOOT_WIFI_TIMEOUT_MS,
        },
    );
    let led = StatusLed::new(Output::new(
        peripherals.GPIO2,
        Level::Low,
        OutputConfig::default(),
    ));

    let agent = match DeviceAgent::new(CONFIG.device, &pulse_input::PULSES, led, supervisor) {
        Ok(agent) => agent,
        Err(e) => {
            log::error!("Invalid device configuration: {:?}", e);
            Timer::after(Duration::from_millis(BOOT_WIFI_TIMEOUT_MS)).await;
            telemetry::restart();
        }
    };

    let mut io = Io::new(peripherals.IO_MUX);
    let pulse_pin = Input::new(
        peripherals.GPIO27,
        InputConfig::default().with_pull(Pull::Up),
    );
    pulse_input::install(&mut io, pulse_pin);

    let inputs = DigitalInputs::new(
        Input::new(
            peripherals.GPIO25,
            InputConfig::default().with_pull(Pull::Down),
        ),
        Input::new(
            peripherals.GPIO26,
            InputConfig::default().with_pull(Pull::Down),
        ),
    );
    let sensors = Sensors::new()
        .with_analog(AnalogProbe::new(peripherals.ADC1, peripherals.GPIO34))
        .with_digital(inputs);

    let radio = RADIO.init(esp_radio::init().unwrap());
    let wifi = Wifi::new(radio, peripherals.WIFI, Rng::new(), spawner).unwrap();

    let buffers = BUFFERS.uninit().write(Buffers::new());

    spawner
        .spawn(agent_task(wifi.stack, agent, sensors, buffers))
        .unwrap();

    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
