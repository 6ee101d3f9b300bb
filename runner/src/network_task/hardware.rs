use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Blocking, Spi};

pub const SPI_FREQUENCY: u32 = 36_000_000;

/// SPI0 wiring of a W5500 module: SCK GPIO 18, MOSI GPIO 19, MISO GPIO 16,
/// chip select GPIO 17 and reset GPIO 20.
pub struct EthernetHardware<'d> {
    pub spi: Spi<'d, SPI0, Blocking>,
    pub chip_select: Output<'d>,
    pub reset: Output<'d>,
}

#[macro_export]
macro_rules! get_ethernet_hardware {
    ($peripherals:ident) => {{
        let mut config = embassy_rp::spi::Config::default();
        config.frequency = $crate::network_task::hardware::SPI_FREQUENCY;

        let spi = embassy_rp::spi::Spi::new_blocking(
            $peripherals.SPI0,
            $peripherals.PIN_18,
            $peripherals.PIN_19,
            $peripherals.PIN_16,
            config,
        );
        let chip_select =
            embassy_rp::gpio::Output::new($peripherals.PIN_17, embassy_rp::gpio::Level::High);
        let reset =
            embassy_rp::gpio::Output::new($peripherals.PIN_20, embassy_rp::gpio::Level::High);

        $crate::network_task::hardware::EthernetHardware {
            spi,
            chip_select,
            reset,
        }
    }};
}
