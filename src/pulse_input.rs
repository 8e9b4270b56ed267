use core::cell::RefCell;

use critical_section::Mutex;
use esp_hal::gpio::{Event, Input, Io};
use esp_hal::handler;

use telemetry_core::PulseCounter;

use crate::constants::PULSE_DEBOUNCE_MS;

/// Pulses counted since boot or the last reset command.
pub static PULSES: PulseCounter = PulseCounter::new(PULSE_DEBOUNCE_MS);

static PULSE_PIN: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));

/// Routes falling edges on `pin` into [`PULSES`].
pub fn install(io: &mut Io<'_>, mut pin: Input<'static>) {
    io.set_interrupt_handler(handler);

    critical_section::with(|cs| {
        pin.listen(Event::FallingEdge);
        PULSE_PIN.borrow_ref_mut(cs).replace(pin)
    });
}

#[handler]
fn handler() {
    let now = embassy_time::Instant::now().as_millis();

    critical_section::with(|cs| {
        if let Some(pin) = PULSE_PIN.borrow_ref_mut(cs).as_mut() {
            if pin.is_interrupt_set() {
                PULSES.on_edge(now);
            }
            pin.clear_interrupt();
        }
    });
}
