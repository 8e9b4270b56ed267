/// State of one network layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// What the agent loop should do next to keep the link alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// WiFi is not associated yet; the radio task is working on it.
    AssociateWifi,
    /// A broker connect is not allowed before `until` (uptime ms).
    Backoff { until: u64 },
    /// Open a broker session now and report the outcome.
    ConnectBroker,
    /// Both layers are up.
    Ready,
    /// Boot never reached the network; restart the device.
    Reboot,
}

/// Spacing between broker connect attempts. Doubles on each consecutive
/// failure up to `max_spacing_ms`.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub min_spacing_ms: u64,
    pub max_spacing_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_spacing_ms: 2_000,
            max_spacing_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    fn spacing(&self, failures: u32) -> u64 {
        let shift = failures.saturating_sub(1).min(16);
        self.min_spacing_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_spacing_ms)
    }
}

/// What to do when WiFi never associates after boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootPolicy {
    RetryForever,
    RebootAfter { timeout_ms: u64 },
}

/// Tracks WiFi and broker state and paces reconnects.
///
/// The supervisor performs no I/O: the caller reports what the link looks
/// like, acts on the returned [`Step`], and feeds connect outcomes back.
#[derive(Debug)]
pub struct ConnectionSupervisor {
    wifi: LinkState,
    broker: LinkState,
    failures: u32,
    next_attempt: u64,
    wifi_ever_up: bool,
    retry: RetryPolicy,
    boot: BootPolicy,
}

impl ConnectionSupervisor {
    pub fn new(retry: RetryPolicy, boot: BootPolicy) -> Self {
        Self {
            wifi: LinkState::Disconnected,
            broker: LinkState::Disconnected,
            failures: 0,
            next_attempt: 0,
            wifi_ever_up: false,
            retry,
            boot,
        }
    }

    pub fn poll(&mut self, now: u64, wifi_up: bool, broker_up: bool) -> Step {
        if !wifi_up {
            if self.wifi == LinkState::Connected {
                log::warn!("WiFi link lost");
            }
            self.wifi = LinkState::Connecting;
            self.broker = LinkState::Disconnected;

            if let BootPolicy::RebootAfter { timeout_ms } = self.boot {
                if !self.wifi_ever_up && now >= timeout_ms {
                    log::error!("WiFi not associated {} ms after boot", timeout_ms);
                    return Step::Reboot;
                }
            }
            return Step::AssociateWifi;
        }

        if self.wifi != LinkState::Connected {
            log::info!("WiFi link up");
        }
        self.wifi = LinkState::Connected;
        self.wifi_ever_up = true;

        if broker_up {
            self.broker = LinkState::Connected;
            return Step::Ready;
        }

        if self.broker == LinkState::Connected {
            log::warn!("Broker session dropped");
            self.broker = LinkState::Disconnected;
        }

        if now < self.next_attempt {
            return Step::Backoff {
                until: self.next_attempt,
            };
        }

        self.broker = LinkState::Connecting;
        Step::ConnectBroker
    }

    pub fn connect_succeeded(&mut self, now: u64) {
        if self.failures > 0 {
            log::info!("Broker connected after {} failed attempts", self.failures);
        }
        self.failures = 0;
        self.broker = LinkState::Connected;
        self.next_attempt = now.saturating_add(self.retry.min_spacing_ms);
    }

    pub fn connect_failed(&mut self, now: u64) {
        self.failures = self.failures.saturating_add(1);
        self.broker = LinkState::Disconnected;

        let spacing = self.retry.spacing(self.failures);
        self.next_attempt = now.saturating_add(spacing);
        log::warn!(
            "Broker connect failed ({} in a row), next attempt in {} ms",
            self.failures,
            spacing
        );
    }

    pub fn broker_lost(&mut self, _now: u64) {
        if self.broker == LinkState::Connected {
            log::warn!("Broker session lost");
        }
        self.broker = LinkState::Disconnected;
    }

    pub fn wifi_state(&self) -> LinkState {
        self.wifi
    }

    pub fn broker_state(&self) -> LinkState {
        self.broker
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_ready(&self) -> bool {
        self.wifi == LinkState::Connected && self.broker == LinkState::Connected
    }
}

impl Default for ConnectionSupervisor {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), BootPolicy::RetryForever)
    }
}
