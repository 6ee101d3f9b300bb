use defmt::Format;

use crate::Ipv4;

/// UDP port devices answer stream queries on.
pub const STREAM_QUERY_PORT: u16 = 4440;

pub const STREAM_QUERY: [u8; 16] = [
    0x27, 0x29, 0x00, 0x10, 0x09, 0x35, 0x22, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00,
];

/// A multicast flow a device transmits.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stream {
    pub group: Ipv4,
    pub port: u16,
}

/// First `239.255.x.y` group in a stream query reply. The port is the
/// big-endian pair right before the group.
pub fn parse_stream_reply(reply: &[u8]) -> Option<Stream> {
    reply.windows(6).find_map(|window| match *window {
        [high, low, 239, 255, x, y] => Some(Stream {
            group: [239, 255, x, y],
            port: u16::from_be_bytes([high, low]),
        }),
        _ => None,
    })
}
