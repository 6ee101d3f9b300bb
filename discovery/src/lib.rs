#![cfg_attr(not(test), no_std)]

pub mod mdns;
pub mod stream;
pub mod wiznet;

pub use mdns::{Device, DeviceList, QueryError, encode_query, parse_response};
pub use stream::{Stream, parse_stream_reply};

/// IPv4 address as it goes on the wire.
pub type Ipv4 = [u8; 4];
