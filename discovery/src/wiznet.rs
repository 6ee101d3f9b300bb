//! SPI framing for a W5500 Ethernet controller.
//!
//! Every access starts with a 3-byte header: the 16-bit offset and a control
//! byte `block << 3 | write << 2 | mode`. Data follows for as long as chip select
//! stays low.

use defmt::Format;

use crate::Ipv4;

/// Value of the version register on a W5500.
pub const VERSION: u8 = 0x04;

pub const SOCKETS: u8 = 8;

/// Variable-length data mode, bounded by chip select.
const VARIABLE_LENGTH: u8 = 0b00;

/// Bytes the controller prepends to every received UDP datagram.
pub const UDP_HEADER_LEN: usize = 8;

pub mod common {
    pub const MR: u16 = 0x0000;
    pub const GAR: u16 = 0x0001;
    pub const SUBR: u16 = 0x0005;
    pub const SHAR: u16 = 0x0009;
    pub const SIPR: u16 = 0x000f;
    pub const VERSIONR: u16 = 0x0039;

    pub const MR_RESET: u8 = 0x80;
}

pub mod socket {
    pub const MR: u16 = 0x0000;
    pub const CR: u16 = 0x0001;
    pub const SR: u16 = 0x0003;
    pub const PORT: u16 = 0x0004;
    pub const DHAR: u16 = 0x0006;
    pub const DIPR: u16 = 0x000c;
    pub const DPORT: u16 = 0x0010;
    pub const TX_FSR: u16 = 0x0020;
    pub const TX_WR: u16 = 0x0024;
    pub const RX_RSR: u16 = 0x0026;
    pub const RX_RD: u16 = 0x0028;

    pub const MR_UDP: u8 = 0x02;
    pub const MR_MULTICAST: u8 = 0x80;

    pub const CR_OPEN: u8 = 0x01;
    pub const CR_CLOSE: u8 = 0x10;
    pub const CR_SEND: u8 = 0x20;
    pub const CR_RECV: u8 = 0x40;

    pub const SR_CLOSED: u8 = 0x00;
    pub const SR_UDP: u8 = 0x22;
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Common,
    Socket(u8),
    Tx(u8),
    Rx(u8),
}

impl Block {
    pub const fn select(self) -> u8 {
        match self {
            Block::Common => 0,
            Block::Socket(n) => 4 * n + 1,
            Block::Tx(n) => 4 * n + 2,
            Block::Rx(n) => 4 * n + 3,
        }
    }
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read = 0,
    Write = 1,
}

pub const fn header(offset: u16, block: Block, access: Access) -> [u8; 3] {
    let [high, low] = offset.to_be_bytes();
    [high, low, block.select() << 3 | (access as u8) << 2 | VARIABLE_LENGTH]
}

/// Header for reading the big-endian received-size register of socket `n`.
pub const fn received_size_request(n: u8) -> [u8; 3] {
    header(socket::RX_RSR, Block::Socket(n), Access::Read)
}

/// Header for a burst read of socket `n`'s RX buffer starting at `pointer`.
pub const fn rx_burst(n: u8, pointer: u16) -> [u8; 3] {
    header(pointer, Block::Rx(n), Access::Read)
}

/// Header for a burst write into socket `n`'s TX buffer starting at `pointer`.
pub const fn tx_burst(n: u8, pointer: u16) -> [u8; 3] {
    header(pointer, Block::Tx(n), Access::Write)
}

/// Ethernet group address for an IPv4 multicast group.
pub const fn multicast_mac(group: Ipv4) -> [u8; 6] {
    [0x01, 0x00, 0x5e, group[1] & 0x7f, group[2], group[3]]
}

/// Sender and payload length the controller stores ahead of a UDP payload.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpInfo {
    pub source: Ipv4,
    pub port: u16,
    pub len: u16,
}

impl UdpInfo {
    pub const fn parse(header: [u8; UDP_HEADER_LEN]) -> Self {
        let [a, b, c, d, port_high, port_low, len_high, len_low] = header;
        Self {
            source: [a, b, c, d],
            port: u16::from_be_bytes([port_high, port_low]),
            len: u16::from_be_bytes([len_high, len_low]),
        }
    }
}
