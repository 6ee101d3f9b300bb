pub mod ethernet;
pub mod hardware;

#[cfg(feature = "capture-udp")]
mod udp_capture;

use defmt::{error, info, warn};
use discovery::mdns::{MDNS_GROUP, MDNS_PORT, SERVICE};
use discovery::stream::{STREAM_QUERY, STREAM_QUERY_PORT};
use discovery::{DeviceList, encode_query, parse_response, parse_stream_reply};
use embassy_executor::SpawnToken;
use embassy_time::{Duration, Instant, Timer};
use static_cell::StaticCell;

use ethernet::{Ethernet, NetError, NetIdentity};
use hardware::EthernetHardware;

pub const IDENTITY: NetIdentity = NetIdentity {
    mac: [0x00, 0x08, 0xdc, 0x12, 0x34, 0x56],
    address: [10, 0, 0, 99],
    subnet: [255, 255, 0, 0],
    gateway: [10, 0, 0, 1],
};

const MDNS_SOCKET: u8 = 2;
const QUERY_SOCKET: u8 = 3;
const QUERY_LOCAL_PORT: u16 = 1000;

/// How long answers to the discovery query are collected.
const DISCOVERY_WINDOW: Duration = Duration::from_millis(250);
const STREAM_REPLY_WAIT: Duration = Duration::from_millis(20);
const RECEIVE_POLL: Duration = Duration::from_micros(100);

const PACKET_CAPACITY: usize = 2048;

pub struct NetworkTaskState<'d> {
    ethernet: Ethernet<'d>,
    devices: DeviceList,
    packet: [u8; PACKET_CAPACITY],
}

impl<'d> NetworkTaskState<'d> {
    pub fn new(ethernet: Ethernet<'d>) -> Self {
        Self {
            ethernet,
            devices: DeviceList::new(),
            packet: [0; PACKET_CAPACITY],
        }
    }

    async fn bring_up(&mut self) -> Result<(), NetError> {
        self.ethernet.reset().await?;
        self.ethernet.configure(&IDENTITY)
    }

    /// Asks every audio device on the network to announce itself, then asks
    /// each one for a multicast flow.
    async fn discover(&mut self) -> Result<(), NetError> {
        let ethernet = &mut self.ethernet;

        ethernet.open_udp(MDNS_SOCKET, MDNS_PORT, Some(MDNS_GROUP)).await?;
        let len = encode_query(SERVICE, &mut self.packet)?;
        ethernet
            .send_to(MDNS_SOCKET, MDNS_GROUP, MDNS_PORT, &self.packet[..len])
            .await?;

        let deadline = Instant::now() + DISCOVERY_WINDOW;
        while Instant::now() < deadline && !self.devices.is_full() {
            match ethernet.receive_from(MDNS_SOCKET, &mut self.packet).await? {
                Some((sender, len)) => {
                    if let Some(name) = parse_response(&self.packet[..len]) {
                        self.devices.record(name, sender.source);
                    }
                }
                None => Timer::after(RECEIVE_POLL).await,
            }
        }
        ethernet.close(MDNS_SOCKET).await?;

        ethernet.open_udp(QUERY_SOCKET, QUERY_LOCAL_PORT, None).await?;
        for device in self.devices.iter_mut() {
            ethernet
                .send_to(QUERY_SOCKET, device.address, STREAM_QUERY_PORT, &STREAM_QUERY)
                .await?;
            Timer::after(STREAM_REPLY_WAIT).await;

            if let Some((_, len)) = ethernet.receive_from(QUERY_SOCKET, &mut self.packet).await? {
                device.stream = parse_stream_reply(&self.packet[..len]);
            }
        }
        ethernet.close(QUERY_SOCKET).await
    }
}

pub static NETWORK_TASK_STATE: StaticCell<NetworkTaskState> = StaticCell::new();

pub fn create_network_task(hardware: EthernetHardware<'static>) -> SpawnToken<impl Sized> {
    let ethernet = Ethernet::new(hardware);

    network_task(NETWORK_TASK_STATE.init(NetworkTaskState::new(ethernet)))
}

#[embassy_executor::task]
pub async fn network_task(state: &'static mut NetworkTaskState<'static>) {
    info!("Network: Task starting");

    if let Err(err) = state.bring_up().await {
        error!("Network: controller bring-up failed: {}", err);
        return;
    }
    info!("Network: up as {}", IDENTITY);

    if let Err(err) = state.discover().await {
        warn!("Network: discovery stopped early: {}", err);
    }
    info!("Network: found {} devices", state.devices.len());
    for device in state.devices.iter() {
        info!("Network: {}", device);
    }

    #[cfg(feature = "capture-udp")]
    if let Err(err) =
        udp_capture::run(&mut state.ethernet, &state.devices, &mut state.packet).await
    {
        error!("Network: stream capture stopped: {}", err);
    }
}
