use core::cell::Cell;

use critical_section::Mutex;

/// Default debounce window for mechanical contacts and reed switches.
pub const DEFAULT_DEBOUNCE_MS: u64 = 20;

/// Counter state read and written as a whole inside a critical section.
#[derive(Clone, Copy, Debug, Default)]
struct PulseState {
    total: u32,
    baseline: u32,
    last_accepted: Option<u64>,
}

/// Result of [`PulseCounter::snapshot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PulseSnapshot {
    /// Pulses counted since boot or the last reset.
    pub total: u32,
    /// Pulses counted since the previous snapshot.
    pub delta: u32,
}

/// Debounced edge counter shared between a GPIO interrupt and the agent loop.
///
/// Every access goes through `critical_section::with`, so the interrupt can
/// never observe or produce a half-written state. The raw count is not
/// exposed; the cooperative side only sees it through [`snapshot`] and
/// [`reset`].
///
/// [`snapshot`]: PulseCounter::snapshot
/// [`reset`]: PulseCounter::reset
pub struct PulseCounter {
    debounce_ms: u64,
    state: Mutex<Cell<PulseState>>,
}

impl PulseCounter {
    pub const fn new(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            state: Mutex::new(Cell::new(PulseState {
                total: 0,
                baseline: 0,
                last_accepted: None,
            })),
        }
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    /// Called from interrupt context on every configured edge.
    ///
    /// Returns `true` when the edge was counted, `false` when it fell inside
    /// the debounce window of the previously accepted edge.
    pub fn on_edge(&self, now_ms: u64) -> bool {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();

            let accept = match state.last_accepted {
                None => true,
                Some(last) => now_ms.saturating_sub(last) > self.debounce_ms,
            };

            if accept {
                state.total = state.total.wrapping_add(1);
                state.last_accepted = Some(now_ms);
                cell.set(state);
            }

            accept
        })
    }

    /// Reads the running total and the pulses seen since the previous call.
    pub fn snapshot(&self) -> PulseSnapshot {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();

            let delta = state.total.wrapping_sub(state.baseline);
            state.baseline = state.total;
            cell.set(state);

            PulseSnapshot {
                total: state.total,
                delta,
            }
        })
    }

    /// Zeroes the total and the snapshot baseline.
    ///
    /// The debounce reference is kept so a bouncing contact right after a
    /// reset is still filtered.
    pub fn reset(&self) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut state = cell.get();
            state.total = 0;
            state.baseline = 0;
            cell.set(state);
        });
        log::info!("Pulse counter reset");
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}
