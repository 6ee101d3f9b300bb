use defmt::Format;

use crate::{
    DmaEngine, Descriptor, Direction, Half, Pacing, RingProbe, TriggerRegister, WORD_BYTES, Wrap,
};

/// Ring sizes in bytes that misbehaved on hardware with [`RingMode::HardwareWrap`].
pub const SUSPECT_RING_BYTES: &[u32] = &[128];

/// Largest wrap the address generator supports, in address bits.
const MAX_WRAP_BITS: u32 = 15;

/// Alignment of the two-entry reload table so its read side can wrap over 8 bytes.
const RELOAD_TABLE_ALIGN: u32 = 8;

/// Whether a pair of `ring_bytes` can run in [`RingMode::HardwareWrap`].
pub const fn wrap_supported(ring_bytes: u32) -> bool {
    if !ring_bytes.is_power_of_two() || ring_bytes.trailing_zeros() > MAX_WRAP_BITS {
        return false;
    }

    let mut i = 0;
    while i < SUSPECT_RING_BYTES.len() {
        if SUSPECT_RING_BYTES[i] == ring_bytes {
            return false;
        }
        i += 1;
    }
    true
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RingMode {
    /// A second channel rewrites the data channel's memory address from a table
    /// holding `[A, B]` after every block.
    #[default]
    ReloadDescriptor,
    /// The data channel wraps its memory address over the pair and a second
    /// channel only restarts the transfer count.
    HardwareWrap,
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingConfig {
    pub direction: Direction,
    /// Address of the peripheral FIFO register.
    pub fifo: u32,
    pub first_half: u32,
    pub second_half: u32,
    /// Words per half.
    pub block_len: u32,
    /// Data request line of the peripheral.
    pub pacing: u8,
    /// Whether the data channel raises its completion flag after each half.
    pub raise_completion: bool,
    pub mode: RingMode,
}

#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    BlockLengthZero,
    /// The second half must start right where the first one ends.
    HalvesNotContiguous,
    MisalignedBuffer { address: u32, required: u32 },
    MisalignedReloadTable { address: u32 },
    RingSizeUnsupported { bytes: u32 },
    /// The reload channel `data + 1` does not exist.
    ReloadChannelOverlap { channel: u8 },
}

/// A configured double-buffered transfer: channel `data` moves the blocks and
/// channel `data + 1` re-arms it after each one.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRing {
    direction: Direction,
    data: u8,
    base: u32,
    block_bytes: u32,
}

impl TransferRing {
    /// Programs both channels of the ring without starting them.
    ///
    /// `reload_table` is the address of engine memory the reload channel reads
    /// from. It must stay untouched while the ring runs.
    pub fn configure<E: DmaEngine>(
        engine: &mut E,
        data: u8,
        config: &RingConfig,
        reload_table: u32,
    ) -> Result<Self, ConfigError> {
        if config.block_len == 0 {
            return Err(ConfigError::BlockLengthZero);
        }
        if data.checked_add(1).is_none_or(|reload| reload >= E::CHANNELS) {
            return Err(ConfigError::ReloadChannelOverlap { channel: data });
        }
        if config.first_half % WORD_BYTES != 0 {
            return Err(ConfigError::MisalignedBuffer {
                address: config.first_half,
                required: WORD_BYTES,
            });
        }

        let block_bytes = config.block_len * WORD_BYTES;
        if config.first_half.wrapping_add(block_bytes) != config.second_half {
            return Err(ConfigError::HalvesNotContiguous);
        }

        let reload = data + 1;
        let (read_address, write_address) = match config.direction {
            Direction::Capture => (config.fifo, config.first_half),
            Direction::Playback => (config.first_half, config.fifo),
        };
        let mut data_descriptor = Descriptor {
            read_address,
            write_address,
            read_increment: config.direction == Direction::Playback,
            write_increment: config.direction == Direction::Capture,
            count: config.block_len,
            pacing: Pacing::Peripheral(config.pacing),
            chain_to: Some(reload),
            wrap: None,
            raise_completion: config.raise_completion,
        };

        let reload_descriptor = match config.mode {
            RingMode::ReloadDescriptor => {
                if reload_table % RELOAD_TABLE_ALIGN != 0 {
                    return Err(ConfigError::MisalignedReloadTable {
                        address: reload_table,
                    });
                }
                engine.store_word(reload_table, config.first_half);
                engine.store_word(reload_table + WORD_BYTES, config.second_half);

                let target = match config.direction {
                    Direction::Capture => TriggerRegister::WriteAddress,
                    Direction::Playback => TriggerRegister::ReadAddress,
                };

                // The data channel starts on A, so the first reload hands it B
                Descriptor {
                    read_address: reload_table + WORD_BYTES,
                    write_address: engine.trigger_register(data, target),
                    read_increment: true,
                    write_increment: false,
                    count: 1,
                    pacing: Pacing::Unpaced,
                    chain_to: None,
                    wrap: Some(Wrap {
                        on_write: false,
                        size_bits: RELOAD_TABLE_ALIGN.trailing_zeros() as u8,
                    }),
                    raise_completion: false,
                }
            }
            RingMode::HardwareWrap => {
                let ring_bytes = 2 * block_bytes;
                if !wrap_supported(ring_bytes) {
                    return Err(ConfigError::RingSizeUnsupported { bytes: ring_bytes });
                }
                if config.first_half % ring_bytes != 0 {
                    return Err(ConfigError::MisalignedBuffer {
                        address: config.first_half,
                        required: ring_bytes,
                    });
                }
                if reload_table % WORD_BYTES != 0 {
                    return Err(ConfigError::MisalignedReloadTable {
                        address: reload_table,
                    });
                }
                engine.store_word(reload_table, config.block_len);

                data_descriptor.wrap = Some(Wrap {
                    on_write: config.direction == Direction::Capture,
                    size_bits: ring_bytes.trailing_zeros() as u8,
                });

                Descriptor {
                    read_address: reload_table,
                    write_address: engine.trigger_register(data, TriggerRegister::TransferCount),
                    read_increment: false,
                    write_increment: false,
                    count: 1,
                    pacing: Pacing::Unpaced,
                    chain_to: None,
                    wrap: None,
                    raise_completion: false,
                }
            }
        };

        engine.program(data, &data_descriptor);
        engine.program(reload, &reload_descriptor);

        Ok(Self {
            direction: config.direction,
            data,
            base: config.first_half,
            block_bytes,
        })
    }

    pub fn data_channel(&self) -> u8 {
        self.data
    }

    pub fn reload_channel(&self) -> u8 {
        self.data + 1
    }

    /// Mask for [`DmaEngine::start`]. Only the data channel is started; the
    /// reload channel runs when chained.
    pub fn start_mask(&self) -> u32 {
        1 << self.data
    }

    /// The half the engine is currently filling (capture) or draining (playback).
    pub fn active_half<E: DmaEngine>(&self, engine: &E) -> Half {
        let address = match self.direction {
            Direction::Capture => engine.write_address(self.data),
            Direction::Playback => engine.read_address(self.data),
        };
        Half::from_index((address.wrapping_sub(self.base) / self.block_bytes) as usize)
    }

    pub fn probe<'a, E: DmaEngine>(&'a self, engine: &'a E) -> RingProbe<'a, E> {
        RingProbe::new(self, engine)
    }
}
