//! Inbound command and meta payloads.
//!
//! Both arrive as small JSON objects, usually wrapped in a `d` envelope.
//! Anything that does not parse, or keys we do not know, are ignored.

use serde::de::IgnoredAny;
use serde::Deserialize;

/// Capability handed to the broker side: it calls back with raw payloads
/// received on the meta and command topics.
pub trait RemoteHandler {
    fn on_meta(&mut self, now: u64, payload: &[u8]);
    fn on_command(&mut self, now: u64, payload: &[u8]);
}

#[derive(Deserialize)]
struct Envelope<K> {
    d: Option<K>,
}

#[derive(Deserialize)]
struct Flags<R, B> {
    reset: Option<R>,
    reboot: Option<B>,
}

#[derive(Deserialize)]
struct MetaFields {
    #[serde(rename = "pubInterval")]
    pub_interval: Option<i64>,
}

#[derive(Deserialize)]
struct MetaPayload {
    #[serde(rename = "pubInterval")]
    pub_interval: Option<i64>,
    meta: Option<MetaFields>,
    d: Option<MetaFields>,
}

/// Parses `payload` as `{"d": K}`, falling back to a bare `K`.
fn parse_keyed<'a, K: Deserialize<'a>>(payload: &'a [u8]) -> Option<K> {
    if let Ok((Envelope { d: Some(inner) }, _)) = serde_json_core::from_slice::<Envelope<K>>(payload)
    {
        return Some(inner);
    }
    serde_json_core::from_slice::<K>(payload)
        .ok()
        .map(|(inner, _)| inner)
}

fn str_truthy(value: &str) -> bool {
    !matches!(value, "" | "0" | "false")
}

#[derive(Clone, Copy)]
enum Key {
    Reset,
    Reboot,
}

fn scalar<'a, T: Deserialize<'a>>(payload: &'a [u8], key: Key) -> Option<T> {
    match key {
        Key::Reset => parse_keyed::<Flags<T, IgnoredAny>>(payload).and_then(|f| f.reset),
        Key::Reboot => parse_keyed::<Flags<IgnoredAny, T>>(payload).and_then(|f| f.reboot),
    }
}

/// Reads one flag, trying the JSON scalar types a dashboard may send:
/// `true`, `1`, `"1"`. Null, zero, `false`, `""`, `"0"` and `"false"` are off.
fn flag(payload: &[u8], key: Key) -> bool {
    if let Some(value) = scalar::<bool>(payload, key) {
        return value;
    }
    if let Some(value) = scalar::<f64>(payload, key) {
        return value != 0.0;
    }
    scalar::<&str>(payload, key).is_some_and(str_truthy)
}

/// Actions requested on the command topic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Command {
    pub reset: bool,
    pub reboot: bool,
}

impl Command {
    pub fn parse(payload: &[u8]) -> Self {
        Self {
            reset: flag(payload, Key::Reset),
            reboot: flag(payload, Key::Reboot),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.reset && !self.reboot
    }
}

/// Settings pushed on the meta topic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetaUpdate {
    pub pub_interval: Option<i64>,
}

impl MetaUpdate {
    /// Accepts `pubInterval` at the top level, under `meta` or under `d`.
    /// A non-integer value anywhere discards the whole update.
    pub fn parse(payload: &[u8]) -> Self {
        let Ok((meta, _)) = serde_json_core::from_slice::<MetaPayload>(payload) else {
            log::debug!("Ignoring unparseable meta payload");
            return Self::default();
        };

        let pub_interval = meta
            .pub_interval
            .or(meta.meta.and_then(|m| m.pub_interval))
            .or(meta.d.and_then(|m| m.pub_interval));

        Self { pub_interval }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_in_envelope() {
        let command = Command::parse(br#"{"d":{"reset":1}}"#);
        assert_eq!(command, Command { reset: true, reboot: false });
    }

    #[test]
    fn reboot_in_envelope() {
        let command = Command::parse(br#"{"d":{"reboot":1}}"#);
        assert_eq!(command, Command { reset: false, reboot: true });
    }

    #[test]
    fn mixed_value_types() {
        let command = Command::parse(br#"{"d":{"reset":true,"reboot":"yes"}}"#);
        assert!(command.reset);
        assert!(command.reboot);
    }

    #[test]
    fn falsy_values_request_nothing() {
        for payload in [
            &br#"{"d":{"reset":0}}"#[..],
            br#"{"d":{"reset":false}}"#,
            br#"{"d":{"reset":"0"}}"#,
            br#"{"d":{"reset":""}}"#,
            br#"{"d":{"reset":null}}"#,
        ] {
            assert!(Command::parse(payload).is_empty());
        }
    }

    #[test]
    fn bare_object_is_accepted() {
        assert!(Command::parse(br#"{"reset":1}"#).reset);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let command = Command::parse(br#"{"d":{"blink":3,"reset":1,"color":"red"}}"#);
        assert_eq!(command, Command { reset: true, reboot: false });
        assert!(Command::parse(br#"{"d":{"blink":3}}"#).is_empty());
    }

    #[test]
    fn garbage_is_ignored() {
        assert!(Command::parse(b"reboot").is_empty());
        assert!(Command::parse(b"").is_empty());
    }

    #[test]
    fn meta_interval_locations() {
        assert_eq!(MetaUpdate::parse(br#"{"pubInterval":3000}"#).pub_interval, Some(3000));
        assert_eq!(
            MetaUpdate::parse(br#"{"meta":{"pubInterval":0}}"#).pub_interval,
            Some(0)
        );
        assert_eq!(
            MetaUpdate::parse(br#"{"d":{"pubInterval":-5}}"#).pub_interval,
            Some(-5)
        );
    }

    #[test]
    fn meta_without_interval_changes_nothing() {
        assert_eq!(MetaUpdate::parse(br#"{"meta":{"name":"pump"}}"#).pub_interval, None);
    }

    #[test]
    fn non_integer_interval_is_discarded() {
        assert_eq!(MetaUpdate::parse(br#"{"pubInterval":"fast"}"#).pub_interval, None);
        assert_eq!(MetaUpdate::parse(br#"{"pubInterval":2.5}"#).pub_interval, None);
        assert_eq!(MetaUpdate::parse(b"{").pub_interval, None);
    }
}
