//! PIO programs for the serial audio lines.
//!
//! Capture is a slave on the incoming bit and word clocks: every rising bit
//! clock edge shifts the four data lines in at once, so each pushed word holds 8
//! bit cycles of all lines. Playback is four master I2S transmitters at twice
//! the rate, sharing one pair of generated clocks.

use defmt::info;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pac;
use embassy_rp::peripherals::PIO1;
use embassy_rp::pio::{
    Config, Direction, FifoJoin, LoadedProgram, Pin, ShiftConfig, ShiftDirection,
    StateMachine,
};
use fixed::traits::ToFixed;
use fixed::types::U56F8;
use upsampler::OUTPUT_RATE;
use upsampler::deinterleave::SLOTS;

use super::hardware::SerialHardware;

/// Bits per slot on every line.
const SLOT_BITS: u32 = 32;

/// PIO cycles per output bit: one with the bit clock low, one high.
const CYCLES_PER_BIT: u32 = 2;

const PLAYBACK_PIO_HZ: u32 = OUTPUT_RATE * SLOTS as u32 * SLOT_BITS * CYCLES_PER_BIT;

/// Data request line of capture state machine 0 (PIO0 RX0).
pub const CAPTURE_DREQ: u8 = 4;

/// Data request line of playback state machine `line` (PIO1 TXn).
pub const fn playback_dreq(line: usize) -> u8 {
    8 + line as u8
}

pub fn capture_fifo() -> u32 {
    pac::PIO0.rxf(0).as_ptr() as u32
}

pub fn playback_fifo(line: usize) -> u32 {
    pac::PIO1.txf(line).as_ptr() as u32
}

/// Loads both programs and configures every state machine, leaving them disabled.
pub fn configure(serial: &mut SerialHardware<'static>) {
    let capture_program = pio::pio_asm!(
        // Align to a frame: the left slot starts one bit after the word clock falls
        "wait 1 gpio 3",
        "wait 0 gpio 3",
        "wait 0 gpio 2",
        "wait 1 gpio 2",
        ".wrap_target",
        "wait 0 gpio 2",
        "wait 1 gpio 2",
        "in pins, 4",
        ".wrap",
    );

    let capture = serial.capture.common.load_program(&capture_program.program);
    let mut config = Config::default();
    config.use_program(&capture, &[]);
    config.set_in_pins(&serial.capture_pins.each_ref());
    config.shift_in = ShiftConfig {
        auto_fill: true,
        threshold: 32,
        direction: ShiftDirection::Left,
    };
    config.fifo_join = FifoJoin::RxOnly;

    let sm = &mut serial.capture.sm0;
    sm.set_config(&config);
    sm.set_pin_dirs(Direction::In, &serial.capture_pins.each_ref());

    // Side-set bit 0 is the bit clock and bit 1 the word clock. The last bit of
    // each slot goes out after the word clock has already switched.
    let playback_program = pio::pio_asm!(
        ".side_set 2",
        "    set x, 30         side 0b01",
        ".wrap_target",
        "left:",
        "    out pins, 1       side 0b00",
        "    jmp x-- left      side 0b01",
        "    out pins, 1       side 0b10",
        "    set x, 30         side 0b11",
        "right:",
        "    out pins, 1       side 0b10",
        "    jmp x-- right     side 0b11",
        "    out pins, 1       side 0b00",
        "    set x, 30         side 0b01",
        ".wrap",
    );

    let playback = serial.playback.common.load_program(&playback_program.program);
    let [bit_clock, word_clock] = &serial.playback_clock_pins;
    let [do0, do1, do2, do3] = &serial.playback_pins;

    configure_playback(&mut serial.playback.sm0, &playback, do0, bit_clock, word_clock);
    configure_playback(&mut serial.playback.sm1, &playback, do1, bit_clock, word_clock);
    configure_playback(&mut serial.playback.sm2, &playback, do2, bit_clock, word_clock);
    configure_playback(&mut serial.playback.sm3, &playback, do3, bit_clock, word_clock);

    info!(
        "Serial engine: playback PIO at {} Hz from {} Hz system clock",
        PLAYBACK_PIO_HZ,
        clk_sys_freq()
    );
}

fn configure_playback<const SM: usize>(
    sm: &mut StateMachine<'static, PIO1, SM>,
    program: &LoadedProgram<'static, PIO1>,
    data: &Pin<'static, PIO1>,
    bit_clock: &Pin<'static, PIO1>,
    word_clock: &Pin<'static, PIO1>,
) {
    let mut config = Config::default();
    config.use_program(program, &[bit_clock, word_clock]);
    config.set_out_pins(&[data]);
    config.shift_out = ShiftConfig {
        auto_fill: true,
        threshold: 32,
        direction: ShiftDirection::Left,
    };
    config.fifo_join = FifoJoin::TxOnly;
    config.clock_divider =
        (U56F8::from_num(clk_sys_freq()) / U56F8::from_num(PLAYBACK_PIO_HZ)).to_fixed();

    sm.set_config(&config);
    sm.set_pin_dirs(Direction::Out, &[data, bit_clock, word_clock]);
}

/// Enables every state machine on a rising capture word clock edge.
///
/// The capture program then syncs itself on the following falling edge. Spins
/// forever without an incoming word clock.
pub fn start_in_sync(serial: &mut SerialHardware<'static>) {
    info!("Serial engine: waiting for the capture word clock");
    while serial.word_clock.is_high() {}
    while serial.word_clock.is_low() {}

    serial.capture.sm0.set_enable(true);
    serial.playback.common.apply_sm_batch(|batch| {
        batch.set_enable(&mut serial.playback.sm0, true);
        batch.set_enable(&mut serial.playback.sm1, true);
        batch.set_enable(&mut serial.playback.sm2, true);
        batch.set_enable(&mut serial.playback.sm3, true);
    });
}
