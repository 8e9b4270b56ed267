use esp_hal::gpio::Output;

use telemetry_core::Indicator;

/// LED lit while a telemetry publish is in flight.
pub struct StatusLed {
    pin: Output<'static>,
}

impl StatusLed {
    pub fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }
}

impl Indicator for StatusLed {
    fn set_active(&mut self, active: bool) {
        if active {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}
