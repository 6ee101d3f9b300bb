use defmt::Format;
use heapless::{String, Vec};

use crate::{Ipv4, Stream};

pub const MDNS_PORT: u16 = 5353;
pub const MDNS_GROUP: Ipv4 = [224, 0, 0, 251];

/// Service type every audio device answers for.
pub const SERVICE: &str = "_netaudio-arc._udp.local";

pub const MAX_DEVICES: usize = 64;
pub const NAME_CAPACITY: usize = 64;

const HEADER_LEN: usize = 12;
const MAX_LABEL: usize = 63;

/// Zero transaction id, standard query, one question, no other records.
const QUERY_HEADER: [u8; HEADER_LEN] = [0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];

/// Root label, then type PTR and class IN.
const QUESTION_TAIL: [u8; 5] = [0x00, 0x00, 0x0c, 0x00, 0x01];

/// Authoritative response flags.
const RESPONSE_FLAGS: [u8; 2] = [0x84, 0x00];

const SIGNATURE: &[u8] = b"\x0d_netaudio-arc";
const SIGNATURE_OFFSET: usize = 12;
const NAME_OFFSET: usize = 48;

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    BufferTooSmall { needed: usize, available: usize },
    EmptyLabel,
    LabelTooLong { length: usize },
}

/// Writes a PTR query for `name` into `buf` and returns its length.
pub fn encode_query(name: &str, buf: &mut [u8]) -> Result<usize, QueryError> {
    let needed = HEADER_LEN + name.len() + 1 + QUESTION_TAIL.len();
    if buf.len() < needed {
        return Err(QueryError::BufferTooSmall {
            needed,
            available: buf.len(),
        });
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(QueryError::EmptyLabel);
        }
        if label.len() > MAX_LABEL {
            return Err(QueryError::LabelTooLong {
                length: label.len(),
            });
        }
    }

    buf[..HEADER_LEN].copy_from_slice(&QUERY_HEADER);
    let mut n = HEADER_LEN;

    for label in name.split('.') {
        buf[n] = label.len() as u8;
        buf[n + 1..n + 1 + label.len()].copy_from_slice(label.as_bytes());
        n += 1 + label.len();
    }

    buf[n..n + QUESTION_TAIL.len()].copy_from_slice(&QUESTION_TAIL);
    Ok(n + QUESTION_TAIL.len())
}

/// Advertised device name of a matching response. Anything else yields `None`.
pub fn parse_response(packet: &[u8]) -> Option<&str> {
    if packet.len() <= NAME_OFFSET {
        return None;
    }

    let transaction = &packet[0..2];
    let flags = &packet[2..4];
    let questions = &packet[4..6];
    let answers = &packet[6..8];

    if transaction != [0, 0] || flags != RESPONSE_FLAGS || questions != [0, 0] || answers == [0, 0] {
        return None;
    }
    if &packet[SIGNATURE_OFFSET..SIGNATURE_OFFSET + SIGNATURE.len()] != SIGNATURE {
        return None;
    }

    let n = packet[NAME_OFFSET] as usize;
    if n + 1 > packet.len() - NAME_OFFSET {
        return None;
    }

    core::str::from_utf8(&packet[NAME_OFFSET + 1..NAME_OFFSET + 1 + n]).ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String<NAME_CAPACITY>,
    pub address: Ipv4,
    pub stream: Option<Stream>,
}

impl Format for Device {
    fn format(&self, fmt: defmt::Formatter) {
        let [a, b, c, d] = self.address;
        defmt::write!(
            fmt,
            "{=str} at {}.{}.{}.{} stream {}",
            self.name.as_str(),
            a,
            b,
            c,
            d,
            self.stream
        )
    }
}

/// Devices found by discovery, one entry per name.
pub struct DeviceList {
    devices: Vec<Device, MAX_DEVICES>,
}

impl DeviceList {
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Adds a device unless one with the same name is known. Returns whether it
    /// was added; names over [`NAME_CAPACITY`] bytes and a full list are dropped.
    pub fn record(&mut self, name: &str, address: Ipv4) -> bool {
        if self.devices.iter().any(|device| device.name == name) {
            return false;
        }

        let mut stored = String::new();
        if stored.push_str(name).is_err() {
            return false;
        }

        self.devices
            .push(Device {
                name: stored,
                address,
                stream: None,
            })
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.devices.is_full()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Device> {
        self.devices.iter_mut()
    }
}

impl Default for DeviceList {
    fn default() -> Self {
        Self::new()
    }
}
