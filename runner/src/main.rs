#![no_std]
#![no_main]

#[cfg(feature = "capture-serial")]
mod audio_task;
mod clock;
mod hardware;
mod network_task;
mod report_task;

use defmt::info;
use embassy_executor::Executor;
use static_cell::StaticCell;

use defmt_rtt as _;
use panic_probe as _;

#[cfg(all(feature = "capture-serial", feature = "capture-udp"))]
compile_error!(
    "feature \"capture-serial\" and feature \"capture-udp\" cannot be enabled at the same time"
);

#[cfg(not(any(feature = "capture-serial", feature = "capture-udp")))]
compile_error!("one of the features \"capture-serial\" or \"capture-udp\" must be enabled");

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[cortex_m_rt::entry]
fn main() -> ! {
    let hardware = hardware::Hardware::get();

    #[cfg(feature = "capture-serial")]
    audio_task::start(hardware.serial);

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        #[cfg(feature = "capture-serial")]
        spawner.spawn(report_task::report_task()).unwrap();

        spawner
            .spawn(network_task::create_network_task(hardware.ethernet))
            .unwrap();

        info!("Bridge running");
    })
}
