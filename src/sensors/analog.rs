use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::{ADC1, GPIO34};
use log::info;

use telemetry_core::{voltage_from_raw, Reading, Sensor, SensorError};

use crate::constants::{ADC_RESOLUTION, ADC_VREF};

pub type ProbeAdc = Adc<'static, ADC1<'static>, esp_hal::Blocking>;
pub type ProbePin = AdcPin<GPIO34<'static>, ADC1<'static>>;

/// Voltage probe on an ADC1 channel, 0 to 3.3 V at 11 dB attenuation.
pub struct AnalogProbe {
    adc: ProbeAdc,
    pin: ProbePin,
}

impl AnalogProbe {
    pub fn new(adc1: ADC1<'static>, gpio: GPIO34<'static>) -> Self {
        info!("Initialising analog probe on GPIO34...");
        let mut config = AdcConfig::new();
        let pin = config.enable_pin(gpio, Attenuation::_11dB);
        let adc = Adc::new(adc1, config);

        Self { adc, pin }
    }
}

impl Sensor for AnalogProbe {
    async fn measure(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        let raw = nb::block!(self.adc.read_oneshot(&mut self.pin))
            .map_err(|_| SensorError::MeasurementFailure)?;

        reading.raw = Some(raw);
        reading.voltage = Some(voltage_from_raw(raw, ADC_VREF, ADC_RESOLUTION));
        Ok(())
    }
}
