pub mod dma;
pub mod hardware;
pub mod serial;

use core::cell::{RefCell, UnsafeCell};

use defmt::info;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, block_for};
use histogram::Histogram;
use static_cell::StaticCell;
use transfer_interface::{
    DmaEngine, Direction, Half, RingConfig, RingMode, TransferRing, WORD_BYTES, wrap_supported,
};
use upsampler::deinterleave::{SLOTS, WORDS_PER_FRAME};
use upsampler::fir::PHASES;
use upsampler::{
    BlockBuffers, BlockPipeline, CaptureHalf, HalfSelection, Kernel, OUTPUT_LINES, OutputHalf,
    PipelineStats, SAMPLE_RATE,
};

use crate::clock::Uptime;
use dma::RpDma;
use hardware::SerialHardware;

#[cfg(any(
    all(feature = "block-4", feature = "block-8"),
    all(feature = "block-4", feature = "block-16"),
    all(feature = "block-8", feature = "block-16"),
))]
compile_error!("only one of the \"block-4\", \"block-8\" and \"block-16\" features can be enabled");

#[cfg(all(feature = "kernel-a", feature = "kernel-b"))]
compile_error!("feature \"kernel-a\" and feature \"kernel-b\" cannot be enabled at the same time");

#[cfg(feature = "block-4")]
pub const FRAMES: usize = 4;
#[cfg(feature = "block-8")]
pub const FRAMES: usize = 8;
#[cfg(feature = "block-16")]
pub const FRAMES: usize = 16;

#[cfg(feature = "kernel-a")]
const TAPS: usize = 21;
#[cfg(feature = "kernel-a")]
const KERNEL: Kernel<TAPS> = upsampler::KERNEL_A;

#[cfg(feature = "kernel-b")]
const TAPS: usize = 23;
#[cfg(feature = "kernel-b")]
const KERNEL: Kernel<TAPS> = upsampler::KERNEL_B;

const WINDOW: usize = TAPS - 1 + FRAMES;

/// Time between completions in microseconds.
pub const BLOCK_PERIOD_US: i32 = (FRAMES as u64 * 1_000_000 / SAMPLE_RATE as u64) as i32;

/// Wait between starting the serial engine and taking completions, so the
/// first one never sees a ring mid-reconfiguration.
const SETTLE: Duration = Duration::from_millis(10);

const CAPTURE_CHANNEL: u8 = 0;

/// Data channel of playback line `line`; each ring also takes the next channel.
const fn playback_channel(line: usize) -> u8 {
    2 + 2 * line as u8
}

const CAPTURE_WORDS: usize = FRAMES * WORDS_PER_FRAME;
const PLAYBACK_WORDS: usize = FRAMES * PHASES * SLOTS;

// Aligned for the largest block so any ring can use hardware wrapping
#[repr(C, align(1024))]
struct CaptureRing(UnsafeCell<[CaptureHalf<FRAMES>; 2]>);

#[repr(C, align(512))]
struct PlaybackRing(UnsafeCell<[OutputHalf<FRAMES>; 2]>);

#[repr(C, align(8))]
struct ReloadTable(UnsafeCell<[u32; 2]>);

// SAFETY: the DMA engine and the completion interrupt are the only users, and
// they never work on the same half at once
unsafe impl Sync for CaptureRing {}
unsafe impl Sync for PlaybackRing {}
unsafe impl Sync for ReloadTable {}

static CAPTURE: CaptureRing = CaptureRing(UnsafeCell::new([[[0; WORDS_PER_FRAME]; FRAMES]; 2]));

static PLAYBACK: [PlaybackRing; OUTPUT_LINES] =
    [const { PlaybackRing(UnsafeCell::new([[[[0; SLOTS]; PHASES]; FRAMES]; 2])) }; OUTPUT_LINES];

static RELOAD_TABLES: [ReloadTable; 1 + OUTPUT_LINES] =
    [const { ReloadTable(UnsafeCell::new([0; 2])) }; 1 + OUTPUT_LINES];

/// Completion handler statistics, shared with the report task.
pub static STATS: Mutex<CriticalSectionRawMutex, RefCell<PipelineStats<Uptime>>> =
    Mutex::new(RefCell::new(PipelineStats::new(
        Histogram::new("ISR call interval (us)", 0, 2 * BLOCK_PERIOD_US, Uptime),
        Histogram::new("ISR execution time (us)", 0, BLOCK_PERIOD_US, Uptime),
    )));

/// The halves of the static rings, as seen from the completion interrupt.
struct RingBuffers;

impl BlockBuffers<FRAMES> for RingBuffers {
    fn split(
        &mut self,
        capture: Half,
        playback: Half,
    ) -> (&CaptureHalf<FRAMES>, [&mut OutputHalf<FRAMES>; OUTPUT_LINES]) {
        // SAFETY: the engine is on the other half of every ring, and only the
        // single `RingBuffers` in `Pipeline` hands out references
        let capture = unsafe { &(*CAPTURE.0.get())[capture.index()] };
        let playback = PLAYBACK
            .each_ref()
            .map(|ring| unsafe { &mut (*ring.0.get())[playback.index()] });
        (capture, playback)
    }
}

struct Pipeline {
    engine: RpDma,
    capture: TransferRing,
    playback: [TransferRing; OUTPUT_LINES],
    buffers: RingBuffers,
    filters: BlockPipeline<FRAMES, TAPS, WINDOW>,
}

impl Pipeline {
    fn on_interrupt(&mut self) {
        if !self.engine.acknowledge(self.capture.data_channel()) {
            return;
        }

        let selection = HalfSelection::probe(
            &self.capture.probe(&self.engine),
            &self.playback[0].probe(&self.engine),
        );

        STATS.lock(|stats| {
            self.filters
                .on_completion(selection, &mut self.buffers, &mut *stats.borrow_mut());
        });
    }
}

static PIPELINE_STATE: StaticCell<Pipeline> = StaticCell::new();
static PIPELINE: Mutex<CriticalSectionRawMutex, RefCell<Option<&'static mut Pipeline>>> =
    Mutex::new(RefCell::new(None));

static SERIAL: StaticCell<SerialHardware<'static>> = StaticCell::new();

fn ring_mode(ring_bytes: usize) -> RingMode {
    if cfg!(feature = "ring-wrap") && wrap_supported(ring_bytes as u32) {
        RingMode::HardwareWrap
    } else {
        RingMode::ReloadDescriptor
    }
}

fn cell_address<T>(cell: &UnsafeCell<T>) -> u32 {
    cell.get() as u32
}

/// Brings up the rings and the serial engine, then enables the completion interrupt.
///
/// Configuration errors stop the firmware before any audio moves.
pub fn start(serial: SerialHardware<'static>) {
    let serial = SERIAL.init(serial);
    serial::configure(serial);

    let mut engine = RpDma::new();

    let capture_base = cell_address(&CAPTURE.0);
    let capture_config = RingConfig {
        direction: Direction::Capture,
        fifo: serial::capture_fifo(),
        first_half: capture_base,
        second_half: capture_base + (CAPTURE_WORDS as u32) * WORD_BYTES,
        block_len: CAPTURE_WORDS as u32,
        pacing: serial::CAPTURE_DREQ,
        raise_completion: true,
        mode: ring_mode(2 * CAPTURE_WORDS * WORD_BYTES as usize),
    };
    let capture = match TransferRing::configure(
        &mut engine,
        CAPTURE_CHANNEL,
        &capture_config,
        cell_address(&RELOAD_TABLES[0].0),
    ) {
        Ok(ring) => ring,
        Err(err) => defmt::panic!("Capture ring rejected: {}", err),
    };
    info!("Audio: capture ring {}", capture_config);

    let playback: [TransferRing; OUTPUT_LINES] = core::array::from_fn(|line| {
        let base = cell_address(&PLAYBACK[line].0);
        let config = RingConfig {
            direction: Direction::Playback,
            fifo: serial::playback_fifo(line),
            first_half: base,
            second_half: base + (PLAYBACK_WORDS as u32) * WORD_BYTES,
            block_len: PLAYBACK_WORDS as u32,
            pacing: serial::playback_dreq(line),
            raise_completion: false,
            mode: ring_mode(2 * PLAYBACK_WORDS * WORD_BYTES as usize),
        };
        match TransferRing::configure(
            &mut engine,
            playback_channel(line),
            &config,
            cell_address(&RELOAD_TABLES[1 + line].0),
        ) {
            Ok(ring) => ring,
            Err(err) => defmt::panic!("Playback ring {} rejected: {}", line, err),
        }
    });
    info!("Audio: playback rings {}", playback);

    let mask = playback
        .iter()
        .fold(capture.start_mask(), |mask, ring| mask | ring.start_mask());
    engine.start(mask);
    serial::start_in_sync(serial);

    block_for(SETTLE);
    engine.acknowledge(capture.data_channel());

    let pipeline = PIPELINE_STATE.init(Pipeline {
        engine,
        capture,
        playback,
        buffers: RingBuffers,
        filters: BlockPipeline::new(KERNEL),
    });
    PIPELINE.lock(|cell| *cell.borrow_mut() = Some(pipeline));

    interrupt::DMA_IRQ_1.set_priority(Priority::P0);
    // SAFETY: the handler only touches state installed above
    unsafe { interrupt::DMA_IRQ_1.enable() };

    info!(
        "Audio: running {} frames per block, {} taps, {} us block period",
        FRAMES, TAPS, BLOCK_PERIOD_US
    );
}

#[interrupt]
fn DMA_IRQ_1() {
    PIPELINE.lock(|pipeline| {
        if let Some(pipeline) = pipeline.borrow_mut().as_mut() {
            pipeline.on_interrupt();
        }
    });
}
