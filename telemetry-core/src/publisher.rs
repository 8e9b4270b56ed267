use core::fmt::Debug;

use serde::Serialize;

use crate::pulse::PulseCounter;

/// Largest serialized telemetry message.
pub const PAYLOAD_CAPACITY: usize = 512;

/// Status string reported with every telemetry message.
pub const STATUS_RUNNING: &str = "running";

#[derive(Debug)]
pub enum SensorError {
    MeasurementFailure,
}

#[derive(Debug)]
pub enum Error {
    PayloadTooLarge,
}

/// One snapshot of the attached inputs. Fields a board does not wire stay
/// `None` and are left out of the payload.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reading {
    pub raw: Option<u16>,
    pub voltage: Option<f32>,
    pub input1: Option<bool>,
    pub input2: Option<bool>,
}

/// Link and runtime figures reported next to the sensor data.
#[derive(Clone, Copy, Debug, Default)]
pub struct Diagnostics {
    pub rssi: Option<i8>,
    pub uptime_secs: u64,
    pub free_heap: Option<u32>,
}

/// Fills a [`Reading`] from hardware.
pub trait Sensor {
    async fn measure(&mut self, reading: &mut Reading) -> Result<(), SensorError>;
}

/// Outbound half of the broker session.
pub trait Broker {
    type Error: Debug;

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;
}

/// Visual feedback around a publish, typically an LED.
pub trait Indicator {
    fn set_active(&mut self, active: bool);
}

impl Indicator for () {
    fn set_active(&mut self, _active: bool) {}
}

/// Converts raw ADC counts to volts.
pub fn voltage_from_raw(raw: u16, vref: f32, resolution: f32) -> f32 {
    f32::from(raw) * (vref / resolution)
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Telemetry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltaje: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<u16>,
    /// Pulse total
    pub v: u32,
    /// Pulses since the previous message
    pub d: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s1: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s2: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i8>,
    pub up: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem: Option<u32>,
    pub status: &'static str,
}

#[derive(Serialize)]
struct Envelope<'a> {
    d: &'a Telemetry,
}

impl Telemetry {
    pub fn new(reading: &Reading, total: u32, delta: u32, diagnostics: &Diagnostics) -> Self {
        Self {
            voltaje: reading.voltage,
            raw: reading.raw,
            v: total,
            d: delta,
            s1: reading.input1.map(u8::from),
            s2: reading.input2.map(u8::from),
            rssi: diagnostics.rssi,
            up: diagnostics.uptime_secs,
            mem: diagnostics.free_heap,
            status: STATUS_RUNNING,
        }
    }

    /// Writes `{"d": {...}}` into `buffer`, returning the used length.
    pub fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, Error> {
        serde_json_core::to_slice(&Envelope { d: self }, buffer).map_err(|_| Error::PayloadTooLarge)
    }
}

/// Builds and sends one telemetry message per call.
pub struct TelemetryPublisher<'a, I: Indicator> {
    pulses: &'a PulseCounter,
    indicator: I,
    buffer: [u8; PAYLOAD_CAPACITY],
}

impl<'a, I: Indicator> TelemetryPublisher<'a, I> {
    pub fn new(pulses: &'a PulseCounter, indicator: I) -> Self {
        Self {
            pulses,
            indicator,
            buffer: [0; PAYLOAD_CAPACITY],
        }
    }

    pub fn pulses(&self) -> &'a PulseCounter {
        self.pulses
    }

    /// Reads the inputs and publishes them once to `topic`.
    ///
    /// There is no local retry: a failed publish is logged and the next
    /// scheduled tick sends fresh data.
    pub async fn publish<B, S>(
        &mut self,
        broker: &mut B,
        sensor: &mut S,
        diagnostics: &Diagnostics,
        topic: &str,
    ) -> bool
    where
        B: Broker,
        S: Sensor,
    {
        let mut reading = Reading::default();
        if let Err(e) = sensor.measure(&mut reading).await {
            log::warn!("Sensor read failed: {:?}", e);
        }

        let pulses = self.pulses.snapshot();
        let telemetry = Telemetry::new(&reading, pulses.total, pulses.delta, diagnostics);
        log::debug!("Telemetry: {:?}", telemetry);

        let len = match telemetry.serialize_into(&mut self.buffer) {
            Ok(len) => len,
            Err(e) => {
                log::error!("Failed to serialize telemetry: {:?}", e);
                return false;
            }
        };

        self.indicator.set_active(true);
        let result = broker.publish(topic, &self.buffer[..len]).await;
        self.indicator.set_active(false);

        match result {
            Ok(()) => {
                log::info!(
                    "Published raw={:?} voltage={:?} pulses={} (+{})",
                    reading.raw,
                    reading.voltage,
                    pulses.total,
                    pulses.delta
                );
                true
            }
            Err(e) => {
                log::error!("Failed to publish telemetry: {:?}", e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use embassy_futures::block_on;

    #[derive(Default)]
    pub struct RecordingBroker {
        pub fail: bool,
        pub messages: Vec<(String, String)>,
    }

    impl Broker for RecordingBroker {
        type Error = ();

        async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            let payload = String::from_utf8(payload.to_vec()).unwrap();
            self.messages.push((topic.into(), payload));
            Ok(())
        }
    }

    pub struct FixedSensor(pub Option<Reading>);

    impl Sensor for FixedSensor {
        async fn measure(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
            match self.0 {
                Some(fixed) => {
                    *reading = fixed;
                    Ok(())
                }
                None => Err(SensorError::MeasurementFailure),
            }
        }
    }

    #[derive(Default)]
    struct Led {
        toggles: Vec<bool>,
    }

    impl Indicator for &mut Led {
        fn set_active(&mut self, active: bool) {
            self.toggles.push(active);
        }
    }

    #[test]
    fn converts_adc_counts() {
        assert_eq!(voltage_from_raw(0, 3.3, 4095.0), 0.0);
        assert!((voltage_from_raw(4095, 3.3, 4095.0) - 3.3).abs() < 1e-5);
        assert!((voltage_from_raw(2048, 3.3, 4095.0) - 1.6504).abs() < 1e-3);
    }

    #[test]
    fn payload_omits_missing_fields() {
        let telemetry = Telemetry::new(
            &Reading {
                raw: Some(1024),
                ..Reading::default()
            },
            5,
            2,
            &Diagnostics {
                uptime_secs: 30,
                ..Diagnostics::default()
            },
        );
        let mut buffer = [0u8; PAYLOAD_CAPACITY];
        let len = telemetry.serialize_into(&mut buffer).unwrap();
        assert_eq!(
            core::str::from_utf8(&buffer[..len]).unwrap(),
            r#"{"d":{"raw":1024,"v":5,"d":2,"up":30,"status":"running"}}"#
        );
    }

    #[test]
    fn oversize_payload_is_an_error() {
        let telemetry = Telemetry::new(&Reading::default(), 0, 0, &Diagnostics::default());
        let mut buffer = [0u8; 8];
        assert!(matches!(
            telemetry.serialize_into(&mut buffer),
            Err(Error::PayloadTooLarge)
        ));
    }

    #[test]
    fn publishes_full_reading() {
        let pulses = PulseCounter::new(20);
        pulses.on_edge(0);
        pulses.on_edge(100);

        let mut led = Led::default();
        let mut publisher = TelemetryPublisher::new(&pulses, &mut led);
        let mut broker = RecordingBroker::default();
        let mut sensor = FixedSensor(Some(Reading {
            raw: Some(4095),
            voltage: Some(3.3),
            input1: Some(true),
            input2: Some(false),
        }));
        let diagnostics = Diagnostics {
            rssi: Some(-61),
            uptime_secs: 12,
            free_heap: Some(40_000),
        };

        assert!(block_on(publisher.publish(
            &mut broker,
            &mut sensor,
            &diagnostics,
            "u/1/d/2/telemetry"
        )));
        drop(publisher);

        let (topic, payload) = &broker.messages[0];
        assert_eq!(topic, "u/1/d/2/telemetry");
        assert!(payload.starts_with(r#"{"d":{"voltaje":3.3,"raw":4095,"v":2,"d":2,"#));
        assert!(payload.ends_with(
            r#""s1":1,"s2":0,"rssi":-61,"up":12,"mem":40000,"status":"running"}}"#
        ));
        assert!(payload.len() <= PAYLOAD_CAPACITY);
        assert_eq!(led.toggles, [true, false]);
    }

    #[test]
    fn sensor_failure_still_publishes_counters() {
        let pulses = PulseCounter::new(20);
        pulses.on_edge(0);

        let mut publisher = TelemetryPublisher::new(&pulses, ());
        let mut broker = RecordingBroker::default();
        let mut sensor = FixedSensor(None);

        assert!(block_on(publisher.publish(
            &mut broker,
            &mut sensor,
            &Diagnostics::default(),
            "t"
        )));
        assert_eq!(
            broker.messages[0].1,
            r#"{"d":{"v":1,"d":1,"up":0,"status":"running"}}"#
        );
    }

    #[test]
    fn broker_failure_reports_false_and_consumes_delta() {
        let pulses = PulseCounter::new(20);
        pulses.on_edge(0);

        let mut led = Led::default();
        let mut publisher = TelemetryPublisher::new(&pulses, &mut led);
        let mut broker = RecordingBroker {
            fail: true,
            ..RecordingBroker::default()
        };
        let mut sensor = FixedSensor(Some(Reading::default()));

        assert!(!block_on(publisher.publish(
            &mut broker,
            &mut sensor,
            &Diagnostics::default(),
            "t"
        )));
        drop(publisher);

        assert!(broker.messages.is_empty());
        assert_eq!(led.toggles, [true, false]);
        assert_eq!(pulses.snapshot().delta, 0);
    }
}
