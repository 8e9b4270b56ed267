use telemetry_core::{Reading, Sensor, SensorError};

pub mod analog;
pub mod digital;

use crate::sensors::{analog::AnalogProbe, digital::DigitalInputs};

/// Every probe wired to the board; absent ones leave their fields empty.
pub struct Sensors {
    pub analog: Option<AnalogProbe>,
    pub digital: Option<DigitalInputs>,
}

impl Default for Sensors {
    fn default() -> Self {
        Self::new()
    }
}

impl Sensors {
    pub fn new() -> Self {
        Self {
            analog: None,
            digital: None,
        }
    }

    pub fn with_analog(mut self, probe: AnalogProbe) -> Self {
        self.analog = Some(probe);
        self
    }

    pub fn with_digital(mut self, inputs: DigitalInputs) -> Self {
        self.digital = Some(inputs);
        self
    }
}

impl Sensor for Sensors {
    async fn measure(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        if let Some(analog) = self.analog.as_mut() {
            analog.measure(reading).await?;
        }

        if let Some(digital) = self.digital.as_mut() {
            digital.measure(reading).await?;
        }

        Ok(())
    }
}
