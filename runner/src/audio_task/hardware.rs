use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Input;
use embassy_rp::peripherals::{PIO0, PIO1};
use embassy_rp::pio::{self, Pio};
use upsampler::OUTPUT_LINES;
use upsampler::deinterleave::LINES;

/// Pins of the serial audio lines.
///
/// The capture bit clock on GPIO 2 and word clock on GPIO 3 are read by
/// number inside the capture program, so they are not handed to the PIO here.
pub struct SerialHardware<'d> {
    pub capture: Pio<'d, PIO0>,
    /// DI0 to DI3 on GPIO 4 to 7.
    pub capture_pins: [pio::Pin<'d, PIO0>; LINES],
    pub playback: Pio<'d, PIO1>,
    /// Double-rate bit clock on GPIO 8 and word clock on GPIO 9.
    pub playback_clock_pins: [pio::Pin<'d, PIO1>; 2],
    /// DO0 to DO3 on GPIO 10 to 13.
    pub playback_pins: [pio::Pin<'d, PIO1>; OUTPUT_LINES],
    /// The capture word clock, read by software to line up the start.
    pub word_clock: Input<'d>,
}

bind_interrupts!(pub struct Irqs {
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
    PIO1_IRQ_0 => pio::InterruptHandler<PIO1>;
});

#[macro_export]
macro_rules! get_serial_hardware {
    ($peripherals:ident) => {{
        let mut capture =
            embassy_rp::pio::Pio::new($peripherals.PIO0, $crate::audio_task::hardware::Irqs);
        let capture_pins = [
            capture.common.make_pio_pin($peripherals.PIN_4),
            capture.common.make_pio_pin($peripherals.PIN_5),
            capture.common.make_pio_pin($peripherals.PIN_6),
            capture.common.make_pio_pin($peripherals.PIN_7),
        ];

        let mut playback =
            embassy_rp::pio::Pio::new($peripherals.PIO1, $crate::audio_task::hardware::Irqs);
        let playback_clock_pins = [
            playback.common.make_pio_pin($peripherals.PIN_8),
            playback.common.make_pio_pin($peripherals.PIN_9),
        ];
        let playback_pins = [
            playback.common.make_pio_pin($peripherals.PIN_10),
            playback.common.make_pio_pin($peripherals.PIN_11),
            playback.common.make_pio_pin($peripherals.PIN_12),
            playback.common.make_pio_pin($peripherals.PIN_13),
        ];

        let word_clock =
            embassy_rp::gpio::Input::new($peripherals.PIN_3, embassy_rp::gpio::Pull::None);

        $crate::audio_task::hardware::SerialHardware {
            capture,
            capture_pins,
            playback,
            playback_clock_pins,
            playback_pins,
            word_clock,
        }
    }};
}
