//! Minimal UDP driver for a W5500 on a blocking SPI bus.

use defmt::Format;
use discovery::wiznet::{
    self, Access, Block, UDP_HEADER_LEN, UdpInfo, VERSION, common, multicast_mac, socket,
};
use discovery::{Ipv4, QueryError};
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{self, Blocking, Spi};
use embassy_time::{Duration, Timer};

use super::hardware::EthernetHardware;

const RESET_PULSE: Duration = Duration::from_micros(500);
const RESET_RECOVERY: Duration = Duration::from_millis(10);
const POLL_INTERVAL: Duration = Duration::from_micros(10);
const POLL_LIMIT: u32 = 1000;

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    Spi,
    /// The version register did not read back as a W5500.
    ControllerMissing { version: u8 },
    /// A socket command was never accepted.
    CommandTimeout { socket: u8 },
    /// A socket did not reach the expected state.
    SocketState { socket: u8, status: u8 },
    Query(QueryError),
}

impl From<spi::Error> for NetError {
    fn from(_: spi::Error) -> Self {
        NetError::Spi
    }
}

impl From<QueryError> for NetError {
    fn from(err: QueryError) -> Self {
        NetError::Query(err)
    }
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetIdentity {
    pub mac: [u8; 6],
    pub address: Ipv4,
    pub subnet: Ipv4,
    pub gateway: Ipv4,
}

pub struct Ethernet<'d> {
    spi: Spi<'d, SPI0, Blocking>,
    chip_select: Output<'d>,
    reset: Output<'d>,
}

impl<'d> Ethernet<'d> {
    pub fn new(hardware: EthernetHardware<'d>) -> Self {
        Self {
            spi: hardware.spi,
            chip_select: hardware.chip_select,
            reset: hardware.reset,
        }
    }

    fn read(&mut self, header: [u8; 3], buf: &mut [u8]) -> Result<(), NetError> {
        self.chip_select.set_low();
        let result = self
            .spi
            .blocking_write(&header)
            .and_then(|()| self.spi.blocking_read(buf));
        self.chip_select.set_high();
        Ok(result?)
    }

    fn write(&mut self, header: [u8; 3], data: &[u8]) -> Result<(), NetError> {
        self.chip_select.set_low();
        let result = self
            .spi
            .blocking_write(&header)
            .and_then(|()| self.spi.blocking_write(data));
        self.chip_select.set_high();
        Ok(result?)
    }

    fn read_register<const N: usize>(
        &mut self,
        offset: u16,
        block: Block,
    ) -> Result<[u8; N], NetError> {
        let mut value = [0; N];
        self.read(wiznet::header(offset, block, Access::Read), &mut value)?;
        Ok(value)
    }

    fn write_register(&mut self, offset: u16, block: Block, value: &[u8]) -> Result<(), NetError> {
        self.write(wiznet::header(offset, block, Access::Write), value)
    }

    fn socket_u16(&mut self, n: u8, offset: u16) -> Result<u16, NetError> {
        Ok(u16::from_be_bytes(self.read_register(offset, Block::Socket(n))?))
    }

    fn set_socket_u16(&mut self, n: u8, offset: u16, value: u16) -> Result<(), NetError> {
        self.write_register(offset, Block::Socket(n), &value.to_be_bytes())
    }

    /// Hardware and software reset, then checks the chip answers as a W5500.
    pub async fn reset(&mut self) -> Result<(), NetError> {
        self.reset.set_low();
        Timer::after(RESET_PULSE).await;
        self.reset.set_high();
        Timer::after(RESET_RECOVERY).await;

        self.write_register(common::MR, Block::Common, &[common::MR_RESET])?;
        Timer::after(RESET_RECOVERY).await;

        let [version] = self.read_register::<1>(common::VERSIONR, Block::Common)?;
        if version != VERSION {
            return Err(NetError::ControllerMissing { version });
        }
        Ok(())
    }

    pub fn configure(&mut self, identity: &NetIdentity) -> Result<(), NetError> {
        self.write_register(common::GAR, Block::Common, &identity.gateway)?;
        self.write_register(common::SUBR, Block::Common, &identity.subnet)?;
        self.write_register(common::SHAR, Block::Common, &identity.mac)?;
        self.write_register(common::SIPR, Block::Common, &identity.address)
    }

    async fn command(&mut self, n: u8, command: u8) -> Result<(), NetError> {
        self.write_register(socket::CR, Block::Socket(n), &[command])?;

        for _ in 0..POLL_LIMIT {
            let [pending] = self.read_register::<1>(socket::CR, Block::Socket(n))?;
            if pending == 0 {
                return Ok(());
            }
            Timer::after(POLL_INTERVAL).await;
        }
        Err(NetError::CommandTimeout { socket: n })
    }

    async fn wait_status(&mut self, n: u8, expected: u8) -> Result<(), NetError> {
        let mut status = 0;
        for _ in 0..POLL_LIMIT {
            [status] = self.read_register::<1>(socket::SR, Block::Socket(n))?;
            if status == expected {
                return Ok(());
            }
            Timer::after(POLL_INTERVAL).await;
        }
        Err(NetError::SocketState { socket: n, status })
    }

    /// Opens socket `n` for UDP on `port`, joining `group` when given.
    pub async fn open_udp(&mut self, n: u8, port: u16, group: Option<Ipv4>) -> Result<(), NetError> {
        self.close(n).await?;

        let mut mode = socket::MR_UDP;
        if let Some(group) = group {
            mode |= socket::MR_MULTICAST;
            self.write_register(socket::DHAR, Block::Socket(n), &multicast_mac(group))?;
            self.write_register(socket::DIPR, Block::Socket(n), &group)?;
            self.set_socket_u16(n, socket::DPORT, port)?;
        }
        self.write_register(socket::MR, Block::Socket(n), &[mode])?;
        self.set_socket_u16(n, socket::PORT, port)?;

        self.command(n, socket::CR_OPEN).await?;
        self.wait_status(n, socket::SR_UDP).await
    }

    pub async fn close(&mut self, n: u8) -> Result<(), NetError> {
        self.command(n, socket::CR_CLOSE).await?;
        self.wait_status(n, socket::SR_CLOSED).await
    }

    pub async fn send_to(
        &mut self,
        n: u8,
        address: Ipv4,
        port: u16,
        payload: &[u8],
    ) -> Result<(), NetError> {
        self.write_register(socket::DIPR, Block::Socket(n), &address)?;
        self.set_socket_u16(n, socket::DPORT, port)?;

        let mut polls = 0;
        while (self.socket_u16(n, socket::TX_FSR)? as usize) < payload.len() {
            polls += 1;
            if polls == POLL_LIMIT {
                return Err(NetError::CommandTimeout { socket: n });
            }
            Timer::after(POLL_INTERVAL).await;
        }

        let pointer = self.socket_u16(n, socket::TX_WR)?;
        self.write(wiznet::tx_burst(n, pointer), payload)?;
        self.set_socket_u16(n, socket::TX_WR, pointer.wrapping_add(payload.len() as u16))?;

        self.command(n, socket::CR_SEND).await
    }

    /// Bytes waiting in the receive buffer of socket `n`.
    ///
    /// The counter can move during a read, so it is read until two reads agree.
    pub fn received(&mut self, n: u8) -> Result<u16, NetError> {
        let mut size = [0; 2];
        self.read(wiznet::received_size_request(n), &mut size)?;
        loop {
            let mut again = [0; 2];
            self.read(wiznet::received_size_request(n), &mut again)?;
            if again == size {
                return Ok(u16::from_be_bytes(size));
            }
            size = again;
        }
    }

    /// Takes the next datagram of socket `n`, copying as much of its payload
    /// as fits into `buf`.
    pub async fn receive_from(
        &mut self,
        n: u8,
        buf: &mut [u8],
    ) -> Result<Option<(UdpInfo, usize)>, NetError> {
        if (self.received(n)? as usize) < UDP_HEADER_LEN {
            return Ok(None);
        }

        let pointer = self.socket_u16(n, socket::RX_RD)?;
        let mut header = [0; UDP_HEADER_LEN];
        self.read(wiznet::rx_burst(n, pointer), &mut header)?;
        let info = UdpInfo::parse(header);

        let payload = pointer.wrapping_add(UDP_HEADER_LEN as u16);
        let len = (info.len as usize).min(buf.len());
        self.read(wiznet::rx_burst(n, payload), &mut buf[..len])?;

        self.set_socket_u16(n, socket::RX_RD, payload.wrapping_add(info.len))?;
        self.command(n, socket::CR_RECV).await?;

        Ok(Some((info, len)))
    }

    /// Reads `len` received bytes of socket `n` in one burst, as much as fits
    /// into `buf`, and releases them. Returns the bytes copied.
    pub async fn drain(&mut self, n: u8, len: u16, buf: &mut [u8]) -> Result<usize, NetError> {
        let pointer = self.socket_u16(n, socket::RX_RD)?;
        let count = (len as usize).min(buf.len());
        self.read(wiznet::rx_burst(n, pointer), &mut buf[..count])?;

        self.set_socket_u16(n, socket::RX_RD, pointer.wrapping_add(len))?;
        self.command(n, socket::CR_RECV).await?;

        Ok(count)
    }
}
