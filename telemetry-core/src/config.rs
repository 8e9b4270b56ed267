use crate::topics::{Topics, TOPIC_CAPACITY};

/// Identity and broker settings of one device, loaded once at boot.
#[derive(Clone, Copy, Debug)]
pub struct DeviceConfig<'a> {
    // MQTT broker hostname or IPv4 address
    pub broker_host: &'a str,

    // MQTT broker port (usually 1883)
    pub broker_port: u16,

    // MQTT credentials, empty when the broker allows anonymous clients
    pub broker_username: &'a str,
    pub broker_password: &'a str,

    // Tenant and device identifiers, used for topics and the client id
    pub user_id: &'a str,
    pub device_id: &'a str,

    // Publish interval to start with, in milliseconds
    pub pub_interval_ms: Option<i64>,

    // Set once the device went through provisioning
    pub provisioned: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    NotProvisioned,
    MissingBrokerHost,
    InvalidBrokerPort,
    MissingUserId,
    MissingDeviceId,
    IdentifierTooLong,
}

impl DeviceConfig<'_> {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.provisioned {
            return Err(Error::NotProvisioned);
        }
        if self.broker_host.is_empty() {
            return Err(Error::MissingBrokerHost);
        }
        if self.broker_port == 0 {
            return Err(Error::InvalidBrokerPort);
        }
        if self.user_id.is_empty() {
            return Err(Error::MissingUserId);
        }
        if self.device_id.is_empty() {
            return Err(Error::MissingDeviceId);
        }
        // "u/" + "/d/" + "/telemetry" is the longest prefix and suffix
        if self.user_id.len() + self.device_id.len() + 15 > TOPIC_CAPACITY {
            return Err(Error::IdentifierTooLong);
        }
        Ok(())
    }

    pub fn topics(&self) -> Result<Topics, Error> {
        Topics::new(self.user_id, self.device_id).map_err(|_| Error::IdentifierTooLong)
    }
}
