#![cfg_attr(not(test), no_std)]

use defmt::Format;

mod probe;
mod ring;

pub use probe::{CompletionCounter, HalfProbe, RingProbe};
pub use ring::{
    ConfigError, RingConfig, RingMode, SUSPECT_RING_BYTES, TransferRing, wrap_supported,
};

/// Bytes moved by a single transfer. Every channel here moves 32-bit words.
pub const WORD_BYTES: u32 = 4;

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Peripheral FIFO to memory.
    Capture,
    /// Memory to peripheral FIFO.
    Playback,
}

/// One of the two buffers of a double-buffered ring.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    First,
    Second,
}

impl Half {
    pub const fn from_index(index: usize) -> Self {
        if index % 2 == 0 { Half::First } else { Half::Second }
    }

    pub const fn index(self) -> usize {
        match self {
            Half::First => 0,
            Half::Second => 1,
        }
    }

    pub const fn other(self) -> Self {
        match self {
            Half::First => Half::Second,
            Half::Second => Half::First,
        }
    }
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Wait for the peripheral's data request line before every transfer.
    Peripheral(u8),
    /// Run back to back.
    Unpaced,
}

/// Address wrap applied to one side of a channel.
///
/// Only the low `size_bits` of the address advance, so the side cycles over a
/// `1 << size_bits` byte region that must be aligned to its own size.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrap {
    pub on_write: bool,
    pub size_bits: u8,
}

/// Full programming of one channel.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub read_address: u32,
    pub write_address: u32,
    pub read_increment: bool,
    pub write_increment: bool,
    /// Transfers per trigger. Reloaded into the live counter on every trigger.
    pub count: u32,
    pub pacing: Pacing,
    /// Channel triggered when this one finishes.
    pub chain_to: Option<u8>,
    pub wrap: Option<Wrap>,
    pub raise_completion: bool,
}

/// Register aliases that update one field of a channel and start it.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerRegister {
    ReadAddress,
    WriteAddress,
    TransferCount,
}

/// The hardware seam of the transfer engine.
///
/// Implemented by the RP2040 DMA block in the firmware and by an in-memory model
/// for host tests.
pub trait DmaEngine {
    const CHANNELS: u8;

    /// Loads a descriptor into `channel` without starting it.
    fn program(&mut self, channel: u8, descriptor: &Descriptor);

    /// Bus address of the alias that writes `target` of `channel` and triggers it.
    fn trigger_register(&self, channel: u8, target: TriggerRegister) -> u32;

    /// Live read pointer of `channel`.
    fn read_address(&self, channel: u8) -> u32;

    /// Live write pointer of `channel`.
    fn write_address(&self, channel: u8) -> u32;

    fn store_word(&mut self, address: u32, value: u32);

    /// Triggers every channel set in `mask` at once.
    fn start(&mut self, mask: u32);

    /// Clears the completion flag of `channel`. Returns whether it was raised.
    fn acknowledge(&mut self, channel: u8) -> bool;
}

/// Configuration checks every [`DmaEngine`] backend must pass.
///
/// `$new` builds a fresh engine and `$ram` is a 64-byte aligned address with at
/// least 1 KiB of free engine memory behind it.
#[macro_export]
macro_rules! declare_tests {
    {$T:ty, $new:expr, $ram:expr $(, #[$meta:meta])*} => {
        #[cfg(test)]
        $(#[$meta])*
        mod ring_tests {
            use $crate::{
                ConfigError, DmaEngine, Direction, Half, HalfProbe, RingConfig, RingMode,
                TransferRing, WORD_BYTES,
            };

            const RAM: u32 = $ram;
            const TABLE: u32 = RAM + 0x200;
            const FIFO: u32 = 0x5020_0020;

            fn engine() -> $T {
                $new
            }

            fn config(mode: RingMode) -> RingConfig {
                RingConfig {
                    direction: Direction::Capture,
                    fifo: FIFO,
                    first_half: RAM,
                    second_half: RAM + 8 * WORD_BYTES,
                    block_len: 8,
                    pacing: 4,
                    raise_completion: true,
                    mode,
                }
            }

            #[test]
            pub fn test_configured_ring_starts_on_first_half() {
                let mut engine = engine();
                let ring =
                    TransferRing::configure(&mut engine, 0, &config(RingMode::ReloadDescriptor), TABLE)
                        .unwrap();
                assert_eq!(ring.active_half(&engine), Half::First);
                assert_eq!(ring.probe(&engine).completed_half(), Half::Second);
                assert_eq!(ring.start_mask(), 0b1);
                assert_eq!(ring.reload_channel(), 1);
            }

            #[test]
            pub fn test_zero_block_is_rejected() {
                let mut engine = engine();
                let mut config = config(RingMode::ReloadDescriptor);
                config.block_len = 0;
                assert_eq!(
                    TransferRing::configure(&mut engine, 0, &config, TABLE),
                    Err(ConfigError::BlockLengthZero)
                );
            }

            #[test]
            pub fn test_gap_between_halves_is_rejected() {
                let mut engine = engine();
                let mut config = config(RingMode::ReloadDescriptor);
                config.second_half += WORD_BYTES;
                assert_eq!(
                    TransferRing::configure(&mut engine, 0, &config, TABLE),
                    Err(ConfigError::HalvesNotContiguous)
                );
            }

            #[test]
            pub fn test_reload_table_needs_eight_byte_alignment() {
                let mut engine = engine();
                assert_eq!(
                    TransferRing::configure(
                        &mut engine,
                        0,
                        &config(RingMode::ReloadDescriptor),
                        TABLE + WORD_BYTES
                    ),
                    Err(ConfigError::MisalignedReloadTable { address: TABLE + WORD_BYTES })
                );
            }

            #[test]
            pub fn test_last_channel_has_no_reload_partner() {
                let mut engine = engine();
                let last = <$T as DmaEngine>::CHANNELS - 1;
                assert_eq!(
                    TransferRing::configure(&mut engine, last, &config(RingMode::ReloadDescriptor), TABLE),
                    Err(ConfigError::ReloadChannelOverlap { channel: last })
                );
            }

            #[test]
            pub fn test_wrap_mode_needs_power_of_two_ring() {
                let mut engine = engine();
                let mut config = config(RingMode::HardwareWrap);
                config.block_len = 6;
                config.second_half = RAM + 6 * WORD_BYTES;
                assert_eq!(
                    TransferRing::configure(&mut engine, 0, &config, TABLE),
                    Err(ConfigError::RingSizeUnsupported { bytes: 48 })
                );
            }

            #[test]
            pub fn test_wrap_mode_rejects_suspect_size() {
                let mut engine = engine();
                let mut config = config(RingMode::HardwareWrap);
                config.block_len = 16;
                config.second_half = RAM + 16 * WORD_BYTES;
                assert_eq!(
                    TransferRing::configure(&mut engine, 0, &config, TABLE),
                    Err(ConfigError::RingSizeUnsupported { bytes: 128 })
                );
            }

            #[test]
            pub fn test_wrap_mode_needs_ring_alignment() {
                let mut engine = engine();
                let mut config = config(RingMode::HardwareWrap);
                config.first_half = RAM + 8 * WORD_BYTES;
                config.second_half = RAM + 16 * WORD_BYTES;
                assert_eq!(
                    TransferRing::configure(&mut engine, 0, &config, TABLE),
                    Err(ConfigError::MisalignedBuffer { address: RAM + 32, required: 64 })
                );
            }

            #[test]
            pub fn test_wrap_mode_accepts_aligned_pair() {
                let mut engine = engine();
                let ring =
                    TransferRing::configure(&mut engine, 2, &config(RingMode::HardwareWrap), TABLE)
                        .unwrap();
                assert_eq!(ring.active_half(&engine), Half::First);
                assert_eq!(ring.start_mask(), 0b100);
            }
        }
    };
}
