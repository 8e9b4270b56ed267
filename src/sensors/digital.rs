use esp_hal::gpio::Input;

use telemetry_core::{Reading, Sensor, SensorError};

/// Two level inputs reported as `s1` and `s2`.
pub struct DigitalInputs {
    s1: Input<'static>,
    s2: Input<'static>,
}

impl DigitalInputs {
    pub fn new(s1: Input<'static>, s2: Input<'static>) -> Self {
        Self { s1, s2 }
    }
}

impl Sensor for DigitalInputs {
    async fn measure(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        reading.input1 = Some(self.s1.is_high());
        reading.input2 = Some(self.s2.is_high());
        Ok(())
    }
}
