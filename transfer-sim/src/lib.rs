#![cfg_attr(not(test), no_std)]

use heapless::Deque;
use transfer_interface::{DmaEngine, Descriptor, Pacing, TriggerRegister, WORD_BYTES};

pub const RAM_BASE: u32 = 0x2000_0000;
pub const DMA_BASE: u32 = 0x5000_0000;
pub const CHANNELS: u8 = 12;

/// Depth of a joined serial-engine FIFO.
pub const FIFO_DEPTH: usize = 8;
/// State machines per serial-engine block.
pub const STATE_MACHINES: u8 = 4;

const CHANNEL_STRIDE: u32 = 0x40;
const AL1_TRANS_COUNT_TRIG: u32 = 0x1c;
const AL2_WRITE_ADDR_TRIG: u32 = 0x2c;
const AL3_READ_ADDR_TRIG: u32 = 0x3c;

const RX_FIFO_BASE: u32 = 0x5020_0020;
const TX_FIFO_BASE: u32 = 0x5030_0010;

/// Receive FIFO register of capture state machine `sm`.
pub const fn rx_fifo(sm: u8) -> u32 {
    RX_FIFO_BASE + WORD_BYTES * sm as u32
}

/// Transmit FIFO register of playback state machine `sm`.
pub const fn tx_fifo(sm: u8) -> u32 {
    TX_FIFO_BASE + WORD_BYTES * sm as u32
}

#[derive(Clone, Copy)]
struct Channel {
    control: Option<Descriptor>,
    read: u32,
    write: u32,
    remaining: u32,
    busy: bool,
}

impl Channel {
    const IDLE: Channel = Channel {
        control: None,
        read: 0,
        write: 0,
        remaining: 0,
        busy: false,
    };
}

enum Target {
    Ram(usize),
    Rx(usize),
    Tx(usize),
    Register { channel: u8, target: TriggerRegister },
    Unmapped,
}

/// Word-level model of the transfer engine, its RAM and the serial-engine FIFOs.
///
/// Peripheral-paced channels move a word only when their FIFO can take or give
/// one, so a test drives time by pushing capture words, popping playback words
/// and calling [`SimEngine::service`].
pub struct SimEngine<const WORDS: usize> {
    ram: [u32; WORDS],
    channels: [Channel; CHANNELS as usize],
    rx: [Deque<u32, FIFO_DEPTH>; STATE_MACHINES as usize],
    tx: [Deque<u32, FIFO_DEPTH>; STATE_MACHINES as usize],
    irq: u32,
    overflows: u32,
    underruns: u32,
}

impl<const WORDS: usize> SimEngine<WORDS> {
    pub fn new() -> Self {
        Self {
            ram: [0; WORDS],
            channels: [Channel::IDLE; CHANNELS as usize],
            rx: core::array::from_fn(|_| Deque::new()),
            tx: core::array::from_fn(|_| Deque::new()),
            irq: 0,
            overflows: 0,
            underruns: 0,
        }
    }

    /// The capture peripheral shifts in a word. Returns false when the FIFO was
    /// full and the word was lost.
    pub fn push_rx(&mut self, sm: u8, word: u32) -> bool {
        let pushed = self.rx[sm as usize].push_back(word).is_ok();
        if !pushed {
            self.overflows += 1;
        }
        pushed
    }

    /// The playback peripheral shifts out a word. `None` is an underrun.
    pub fn pop_tx(&mut self, sm: u8) -> Option<u32> {
        let word = self.tx[sm as usize].pop_front();
        if word.is_none() {
            self.underruns += 1;
        }
        word
    }

    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    pub fn underruns(&self) -> u32 {
        self.underruns
    }

    pub fn irq_pending(&self, channel: u8) -> bool {
        self.irq & (1 << channel) != 0
    }

    pub fn is_busy(&self, channel: u8) -> bool {
        self.channels[channel as usize].busy
    }

    pub fn load_word(&self, address: u32) -> u32 {
        self.ram[Self::ram_index(address)]
    }

    pub fn words(&self, address: u32, len: usize) -> &[u32] {
        let start = Self::ram_index(address);
        &self.ram[start..start + len]
    }

    pub fn words_mut(&mut self, address: u32, len: usize) -> &mut [u32] {
        let start = Self::ram_index(address);
        &mut self.ram[start..start + len]
    }

    /// Runs every channel until none can make progress.
    pub fn service(&mut self) {
        loop {
            let mut progressed = false;
            for channel in 0..CHANNELS {
                while self.step(channel) {
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }

    fn ram_index(address: u32) -> usize {
        assert!(address >= RAM_BASE && address % WORD_BYTES == 0);
        ((address - RAM_BASE) / WORD_BYTES) as usize
    }

    fn decode(address: u32) -> Target {
        let ram_end = RAM_BASE + (WORDS as u32) * WORD_BYTES;
        let dma_end = DMA_BASE + CHANNELS as u32 * CHANNEL_STRIDE;

        if (RAM_BASE..ram_end).contains(&address) {
            Target::Ram(Self::ram_index(address))
        } else if (rx_fifo(0)..rx_fifo(STATE_MACHINES)).contains(&address) {
            Target::Rx(((address - RX_FIFO_BASE) / WORD_BYTES) as usize)
        } else if (tx_fifo(0)..tx_fifo(STATE_MACHINES)).contains(&address) {
            Target::Tx(((address - TX_FIFO_BASE) / WORD_BYTES) as usize)
        } else if (DMA_BASE..dma_end).contains(&address) {
            let channel = ((address - DMA_BASE) / CHANNEL_STRIDE) as u8;
            let target = match (address - DMA_BASE) % CHANNEL_STRIDE {
                AL1_TRANS_COUNT_TRIG => TriggerRegister::TransferCount,
                AL2_WRITE_ADDR_TRIG => TriggerRegister::WriteAddress,
                AL3_READ_ADDR_TRIG => TriggerRegister::ReadAddress,
                _ => return Target::Unmapped,
            };
            Target::Register { channel, target }
        } else {
            Target::Unmapped
        }
    }

    fn ready(&self, channel: &Channel, descriptor: &Descriptor) -> bool {
        if descriptor.pacing == Pacing::Unpaced {
            return true;
        }
        let readable = match Self::decode(channel.read) {
            Target::Rx(sm) => !self.rx[sm].is_empty(),
            _ => true,
        };
        let writable = match Self::decode(channel.write) {
            Target::Tx(sm) => !self.tx[sm].is_full(),
            _ => true,
        };
        readable && writable
    }

    fn load(&mut self, address: u32) -> u32 {
        match Self::decode(address) {
            Target::Ram(index) => self.ram[index],
            Target::Rx(sm) => self.rx[sm].pop_front().unwrap_or(0),
            _ => 0,
        }
    }

    fn store(&mut self, address: u32, value: u32) {
        match Self::decode(address) {
            Target::Ram(index) => self.ram[index] = value,
            Target::Tx(sm) => {
                if self.tx[sm].push_back(value).is_err() {
                    self.overflows += 1;
                }
            }
            Target::Register { channel, target } => {
                let state = &mut self.channels[channel as usize];
                match target {
                    TriggerRegister::ReadAddress => state.read = value,
                    TriggerRegister::WriteAddress => state.write = value,
                    TriggerRegister::TransferCount => {
                        if let Some(control) = state.control.as_mut() {
                            control.count = value;
                        }
                    }
                }
                self.trigger(channel);
            }
            Target::Rx(_) | Target::Unmapped => {}
        }
    }

    fn trigger(&mut self, channel: u8) {
        let state = &mut self.channels[channel as usize];
        if let Some(control) = state.control {
            state.remaining = control.count;
            state.busy = control.count > 0;
        }
    }

    fn advance(address: u32, increment: bool, wrap_bits: Option<u8>) -> u32 {
        if !increment {
            return address;
        }
        let next = address.wrapping_add(WORD_BYTES);
        match wrap_bits {
            Some(bits) => {
                let mask = (1u32 << bits) - 1;
                (address & !mask) | (next & mask)
            }
            None => next,
        }
    }

    fn step(&mut self, channel: u8) -> bool {
        let state = self.channels[channel as usize];
        let Some(control) = state.control else {
            return false;
        };
        if !state.busy || !self.ready(&state, &control) {
            return false;
        }

        let value = self.load(state.read);

        let (read_wrap, write_wrap) = match control.wrap {
            Some(wrap) if wrap.on_write => (None, Some(wrap.size_bits)),
            Some(wrap) => (Some(wrap.size_bits), None),
            None => (None, None),
        };
        {
            let state = &mut self.channels[channel as usize];
            state.read = Self::advance(state.read, control.read_increment, read_wrap);
            state.write = Self::advance(state.write, control.write_increment, write_wrap);
            state.remaining -= 1;
            if state.remaining == 0 {
                state.busy = false;
            }
        }

        // Stored after the pointers moved so a write that retriggers this channel wins
        self.store(state.write, value);

        let finished = self.channels[channel as usize].remaining == 0;
        if finished {
            if control.raise_completion {
                self.irq |= 1 << channel;
            }
            if let Some(next) = control.chain_to.filter(|&next| next != channel) {
                self.trigger(next);
            }
        }

        true
    }
}

impl<const WORDS: usize> Default for SimEngine<WORDS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const WORDS: usize> DmaEngine for SimEngine<WORDS> {
    const CHANNELS: u8 = CHANNELS;

    fn program(&mut self, channel: u8, descriptor: &Descriptor) {
        self.channels[channel as usize] = Channel {
            control: Some(*descriptor),
            read: descriptor.read_address,
            write: descriptor.write_address,
            remaining: 0,
            busy: false,
        };
    }

    fn trigger_register(&self, channel: u8, target: TriggerRegister) -> u32 {
        let offset = match target {
            TriggerRegister::TransferCount => AL1_TRANS_COUNT_TRIG,
            TriggerRegister::WriteAddress => AL2_WRITE_ADDR_TRIG,
            TriggerRegister::ReadAddress => AL3_READ_ADDR_TRIG,
        };
        DMA_BASE + channel as u32 * CHANNEL_STRIDE + offset
    }

    fn read_address(&self, channel: u8) -> u32 {
        self.channels[channel as usize].read
    }

    fn write_address(&self, channel: u8) -> u32 {
        self.channels[channel as usize].write
    }

    fn store_word(&mut self, address: u32, value: u32) {
        self.store(address, value);
    }

    fn start(&mut self, mask: u32) {
        for channel in 0..CHANNELS {
            if mask & (1 << channel) != 0 {
                self.trigger(channel);
            }
        }
    }

    fn acknowledge(&mut self, channel: u8) -> bool {
        let raised = self.irq_pending(channel);
        self.irq &= !(1 << channel);
        raised
    }
}

transfer_interface::declare_tests!(crate::SimEngine<1024>, crate::SimEngine::new(), crate::RAM_BASE);
