use defmt::info;
use discovery::{DeviceList, Stream};
use embassy_time::{Duration, Instant, Timer};
use histogram::Histogram;

use super::ethernet::{Ethernet, NetError};
use crate::clock::Uptime;
use crate::report_task::log_histogram;

const CAPTURE_SOCKET: u8 = 5;

/// Joined when no discovered device advertises a flow.
const FALLBACK_STREAM: Stream = Stream {
    group: [239, 255, 0, 1],
    port: 5004,
};

/// Anything at or below this is not an audio packet.
const MIN_PACKET: u16 = 100;

const REPORT_PERIOD: Duration = Duration::from_secs(20);
const POLL_INTERVAL: Duration = Duration::from_micros(5);

/// Receives the first advertised multicast flow and reports packet timing and
/// sizes. Only returns on a controller error.
pub async fn run(
    ethernet: &mut Ethernet<'_>,
    devices: &DeviceList,
    packet: &mut [u8],
) -> Result<(), NetError> {
    let stream = devices
        .iter()
        .find_map(|device| device.stream)
        .unwrap_or(FALLBACK_STREAM);
    info!("Capture: listening to {}", stream);

    ethernet
        .open_udp(CAPTURE_SOCKET, stream.port, Some(stream.group))
        .await?;

    let mut times = Histogram::new("Packet interval (us)", 0, 2000, Uptime);
    let mut sizes = Histogram::new("Packet size (bytes)", 0, 2000, Uptime);
    let mut last_report = Instant::now();

    loop {
        let len = ethernet.received(CAPTURE_SOCKET)?;
        if len > MIN_PACKET {
            ethernet.drain(CAPTURE_SOCKET, len, packet).await?;
            times.time();
            sizes.add(len as i32);
        }

        if last_report.elapsed() > REPORT_PERIOD {
            last_report = Instant::now();
            info!("Capture: uptime {} us", times.now());
            log_histogram(&times);
            log_histogram(&sizes);
            times.reset();
            sizes.reset();
        }

        Timer::after(POLL_INTERVAL).await;
    }
}
