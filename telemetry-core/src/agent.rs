use crate::config::{self, DeviceConfig};
use crate::publisher::{Broker, Diagnostics, Indicator, Sensor, TelemetryPublisher};
use crate::pulse::PulseCounter;
use crate::remote::{Command, MetaUpdate, RemoteHandler};
use crate::scheduler::{TelemetryInterval, TelemetryScheduler};
use crate::supervisor::{ConnectionSupervisor, Step};
use crate::topics::{Inbound, Topics};

/// Delay between accepting a reboot command and restarting, so the command
/// acknowledgment can still leave the device.
pub const REBOOT_GRACE_MS: u64 = 1_000;

/// All mutable device state, owned by the single agent loop.
pub struct DeviceAgent<'a, I: Indicator> {
    config: DeviceConfig<'a>,
    topics: Topics,
    scheduler: TelemetryScheduler,
    supervisor: ConnectionSupervisor,
    publisher: TelemetryPublisher<'a, I>,
    reboot_at: Option<u64>,
}

impl<'a, I: Indicator> DeviceAgent<'a, I> {
    pub fn new(
        config: DeviceConfig<'a>,
        pulses: &'a PulseCounter,
        indicator: I,
        supervisor: ConnectionSupervisor,
    ) -> Result<Self, config::Error> {
        config.validate()?;
        let topics = config.topics()?;

        Ok(Self {
            config,
            topics,
            scheduler: TelemetryScheduler::new(config.pub_interval_ms),
            supervisor,
            publisher: TelemetryPublisher::new(pulses, indicator),
            reboot_at: None,
        })
    }

    pub fn config(&self) -> &DeviceConfig<'a> {
        &self.config
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn interval(&self) -> TelemetryInterval {
        self.scheduler.interval()
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    pub fn supervise(&mut self, now: u64, wifi_up: bool, broker_up: bool) -> Step {
        self.supervisor.poll(now, wifi_up, broker_up)
    }

    pub fn connect_succeeded(&mut self, now: u64) {
        self.supervisor.connect_succeeded(now);
    }

    pub fn connect_failed(&mut self, now: u64) {
        self.supervisor.connect_failed(now);
    }

    pub fn broker_lost(&mut self, now: u64) {
        self.supervisor.broker_lost(now);
    }

    /// Publishes when the link is ready and an interval elapsed.
    ///
    /// Returns `None` when nothing was due, otherwise whether the publish
    /// went through. The attempt is recorded either way.
    pub async fn tick<B, S>(
        &mut self,
        now: u64,
        broker: &mut B,
        sensor: &mut S,
        diagnostics: &Diagnostics,
    ) -> Option<bool>
    where
        B: Broker,
        S: Sensor,
    {
        if !self.supervisor.is_ready() || !self.scheduler.is_due(now) {
            return None;
        }

        let published = self
            .publisher
            .publish(broker, sensor, diagnostics, &self.topics.telemetry)
            .await;
        self.scheduler.mark_published(now);

        Some(published)
    }

    /// Routes a message received from the broker by topic.
    pub fn handle_message(&mut self, now: u64, topic: &str, payload: &[u8]) {
        match self.topics.classify(topic) {
            Inbound::Command => self.on_command(now, payload),
            Inbound::Meta => self.on_meta(now, payload),
            Inbound::Other => log::debug!("Ignoring message on {}", topic),
        }
    }

    pub fn reboot_pending(&self) -> bool {
        self.reboot_at.is_some()
    }

    pub fn reboot_due(&self, now: u64) -> bool {
        self.reboot_at.is_some_and(|at| now >= at)
    }
}

impl<I: Indicator> RemoteHandler for DeviceAgent<'_, I> {
    fn on_meta(&mut self, _now: u64, payload: &[u8]) {
        if let Some(ms) = MetaUpdate::parse(payload).pub_interval {
            self.scheduler.set_interval(ms);
        }
    }

    fn on_command(&mut self, now: u64, payload: &[u8]) {
        let command = Command::parse(payload);
        if command.is_empty() {
            log::debug!("Command without known actions");
            return;
        }

        if command.reset {
            self.publisher.pulses().reset();
        }

        if command.reboot && self.reboot_at.is_none() {
            log::warn!("Reboot requested, restarting in {} ms", REBOOT_GRACE_MS);
            self.reboot_at = Some(now.saturating_add(REBOOT_GRACE_MS));
        }
    }
}
