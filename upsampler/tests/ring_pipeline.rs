use core::cell::Cell;

use histogram::{Clock, Histogram};
use pretty_assertions::assert_eq;
use transfer_interface::{DmaEngine, Direction, Half, RingConfig, RingMode, TransferRing, WORD_BYTES};
use transfer_sim::{RAM_BASE, SimEngine, rx_fifo, tx_fifo};
use upsampler::deinterleave::{LINES, SLOTS, WORDS_PER_FRAME, frame_words};
use upsampler::fir::PHASES;
use upsampler::{
    BlockBuffers, BlockPipeline, CaptureHalf, HalfSelection, KERNEL_B, OUTPUT_LINES, OutputHalf,
    PipelineStats, Upsampler,
};

// Eight frames keep every pair a power of two other than the suspect 128 bytes
const FRAMES: usize = 8;
const TAPS: usize = 23;
const WINDOW: usize = TAPS - 1 + FRAMES;

const CAPTURE_WORDS: usize = FRAMES * WORDS_PER_FRAME;
const OUTPUT_WORDS: usize = FRAMES * PHASES * SLOTS;
const PLAYBACK_WORDS: usize = OUTPUT_LINES * 2 * OUTPUT_WORDS;

const CAPTURE: u32 = RAM_BASE;
const PLAYBACK: u32 = CAPTURE + (2 * CAPTURE_WORDS) as u32 * WORD_BYTES;
const TABLES: u32 = PLAYBACK + PLAYBACK_WORDS as u32 * WORD_BYTES;

const CAPTURE_CHANNEL: u8 = 0;

type Engine = SimEngine<512>;

struct Rings {
    capture: TransferRing,
    playback: [TransferRing; OUTPUT_LINES],
}

fn configure(engine: &mut Engine, mode: RingMode) -> Rings {
    let capture = TransferRing::configure(
        &mut *engine,
        CAPTURE_CHANNEL,
        &RingConfig {
            direction: Direction::Capture,
            fifo: rx_fifo(0),
            first_half: CAPTURE,
            second_half: CAPTURE + CAPTURE_WORDS as u32 * WORD_BYTES,
            block_len: CAPTURE_WORDS as u32,
            pacing: 4,
            raise_completion: true,
            mode,
        },
        TABLES,
    )
    .unwrap();

    let playback = core::array::from_fn(|line| {
        let first_half = PLAYBACK + (line * 2 * OUTPUT_WORDS) as u32 * WORD_BYTES;
        TransferRing::configure(
            &mut *engine,
            2 + 2 * line as u8,
            &RingConfig {
                direction: Direction::Playback,
                fifo: tx_fifo(line as u8),
                first_half,
                second_half: first_half + OUTPUT_WORDS as u32 * WORD_BYTES,
                block_len: OUTPUT_WORDS as u32,
                pacing: 8 + line as u8,
                raise_completion: false,
                mode,
            },
            TABLES + 8 * (line as u32 + 1),
        )
        .unwrap()
    });

    Rings { capture, playback }
}

struct SimBuffers<'a>(&'a mut Engine);

impl BlockBuffers<FRAMES> for SimBuffers<'_> {
    fn split(
        &mut self,
        capture: Half,
        playback: Half,
    ) -> (&CaptureHalf<FRAMES>, [&mut OutputHalf<FRAMES>; OUTPUT_LINES]) {
        let memory = self.0.words_mut(CAPTURE, 2 * CAPTURE_WORDS + PLAYBACK_WORDS);
        let (captured, lines) = memory.split_at_mut(2 * CAPTURE_WORDS);

        let captured = &captured[capture.index() * CAPTURE_WORDS..][..CAPTURE_WORDS];
        let captured: &CaptureHalf<FRAMES> =
            bytemuck::cast_slice::<u32, [u32; WORDS_PER_FRAME]>(captured)
                .try_into()
                .unwrap();

        let mut lines = lines.chunks_exact_mut(2 * OUTPUT_WORDS).map(|pair| {
            let half = &mut pair[playback.index() * OUTPUT_WORDS..][..OUTPUT_WORDS];
            let half: &mut OutputHalf<FRAMES> =
                bytemuck::cast_slice_mut::<u32, [[i32; SLOTS]; PHASES]>(half)
                    .try_into()
                    .unwrap();
            half
        });

        (captured, core::array::from_fn(|_| lines.next().unwrap()))
    }
}

struct Ticks(Cell<u64>);

impl Clock for &Ticks {
    fn now(&self) -> u64 {
        self.0.get()
    }
}

fn sample(frame: usize, channel: usize) -> i32 {
    let phase = (frame * (channel + 3)) % 17;
    (phase as i32 - 8) * ((channel as i32 + 1) << 20)
}

/// Feeds `blocks` half-blocks through the rings and returns every word each
/// output line shifted out, along with the capture halves the pipeline chose.
fn stream(mode: RingMode, blocks: usize) -> (Vec<Vec<u32>>, Vec<HalfSelection>) {
    let mut engine = Engine::new();
    let rings = configure(&mut engine, mode);
    let mask = rings
        .playback
        .iter()
        .fold(rings.capture.start_mask(), |mask, ring| mask | ring.start_mask());
    engine.start(mask);
    engine.service();

    let ticks = Ticks(Cell::new(0));
    let mut stats = PipelineStats::new(
        Histogram::new("Call", 0, 1000, &ticks),
        Histogram::new("Exec", 0, 1000, &ticks),
    );
    let mut pipeline = BlockPipeline::<FRAMES, TAPS, WINDOW>::new(KERNEL_B);

    let mut played = vec![Vec::new(); OUTPUT_LINES];
    let mut selections = Vec::new();

    for frame in 0..blocks * FRAMES {
        let samples: [[i32; SLOTS]; LINES] = core::array::from_fn(|line| {
            core::array::from_fn(|slot| sample(frame, 2 * line + slot))
        });
        for word in frame_words(&samples) {
            assert!(engine.push_rx(0, word));
        }
        engine.service();
        ticks.0.set(ticks.0.get() + 83);

        if engine.acknowledge(CAPTURE_CHANNEL) {
            let selection = HalfSelection::probe(
                &rings.capture.probe(&engine),
                &rings.playback[0].probe(&engine),
            );
            selections.push(selection);
            pipeline.on_completion(selection, &mut SimBuffers(&mut engine), &mut stats);
        }

        for (line, words) in played.iter_mut().enumerate() {
            for _ in 0..PHASES * SLOTS {
                words.push(engine.pop_tx(line as u8).unwrap());
            }
        }
        engine.service();
    }

    assert_eq!(engine.overflows(), 0);
    assert_eq!(engine.underruns(), 0);
    assert_eq!(stats.exec.count(), blocks as u32);
    assert_eq!(stats.call.min(), Some(FRAMES as i32 * 83));

    (played, selections)
}

fn check(mode: RingMode) {
    let blocks = 6;
    let (played, selections) = stream(mode, blocks);

    let captures: Vec<Half> = selections.iter().map(|s| s.capture).collect();
    let playbacks: Vec<Half> = selections.iter().map(|s| s.playback).collect();
    let alternating: Vec<Half> = (0..blocks).map(Half::from_index).collect();
    assert_eq!(captures, alternating);
    assert_eq!(playbacks, alternating);

    // The playback rings start by draining both untouched halves
    let latency = 2 * OUTPUT_WORDS;
    let processed = (blocks - 2) * FRAMES;

    for (line, words) in played.iter().enumerate() {
        assert!(words[..latency].iter().all(|&w| w == 0));

        for slot in 0..SLOTS {
            let channel = 2 * line + slot;
            let input: Vec<i32> = (0..processed).map(|frame| sample(frame, channel)).collect();
            let mut reference = Upsampler::<TAPS, WINDOW>::new(KERNEL_B);
            let mut expected = Vec::new();
            for chunk in input.chunks(FRAMES) {
                let mut output = [[0; PHASES]; FRAMES];
                reference.process(chunk, &mut output);
                expected.extend(output.into_iter().flatten());
            }

            let actual: Vec<i32> = words[latency..]
                .iter()
                .skip(slot)
                .step_by(SLOTS)
                .take(2 * processed)
                .map(|&w| w as i32)
                .collect();
            assert_eq!(actual, expected, "channel {}", channel);
        }
    }
}

#[test]
fn reload_rings_carry_audio_end_to_end() {
    check(RingMode::ReloadDescriptor);
}

#[test]
fn wrap_rings_carry_audio_end_to_end() {
    check(RingMode::HardwareWrap);
}
