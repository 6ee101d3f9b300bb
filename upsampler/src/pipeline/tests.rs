use core::cell::Cell;
use pretty_assertions::assert_eq;
use transfer_interface::CompletionCounter;

use super::*;
use crate::deinterleave::frame_words;
use crate::fir::{KERNEL_B, PRESCALE_SHIFT};

const FRAMES: usize = 4;
const TAPS: usize = 23;
const WINDOW: usize = TAPS - 1 + FRAMES;

type Pipeline = BlockPipeline<FRAMES, TAPS, WINDOW>;

fn capture_block(samples: impl Fn(usize, usize) -> i32) -> CaptureHalf<FRAMES> {
    core::array::from_fn(|frame| {
        let frame_samples = core::array::from_fn(|line| {
            core::array::from_fn(|slot| samples(frame, line * SLOTS + slot))
        });
        frame_words(&frame_samples)
    })
}

fn run(pipeline: &mut Pipeline, capture: &CaptureHalf<FRAMES>) -> [OutputHalf<FRAMES>; OUTPUT_LINES] {
    let mut lines = [[[[0; SLOTS]; PHASES]; FRAMES]; OUTPUT_LINES];
    {
        let [a, b, c, d] = &mut lines;
        pipeline.process(capture, &mut [a, b, c, d]);
    }
    lines
}

fn channel_stream(lines: &[OutputHalf<FRAMES>; OUTPUT_LINES], channel: usize) -> Vec<i32> {
    let (line, slot) = output_position(channel);
    lines[line]
        .iter()
        .flat_map(|phases| phases.iter().map(move |slots| slots[slot]))
        .collect()
}

#[test]
fn channels_map_to_line_and_slot() {
    assert_eq!(output_position(0), (0, 0));
    assert_eq!(output_position(1), (0, 1));
    assert_eq!(output_position(5), (2, 1));
    assert_eq!(output_position(7), (3, 1));
}

#[test]
fn golden_vector_on_first_channel() {
    let mut pipeline = Pipeline::new(KERNEL_B);
    let input = [100, -100, 50, -50];
    let capture = capture_block(|frame, channel| if channel == 0 { input[frame] } else { 0 });

    let lines = run(&mut pipeline, &capture);

    assert_eq!(channel_stream(&lines, 0), vec![0, 0, -2, 2, 4, -4, -10, 8]);
    for channel in 1..CHANNELS {
        assert!(channel_stream(&lines, channel).iter().all(|&s| s == 0));
    }
}

#[test]
fn impulse_reaches_only_its_slot() {
    let mut pipeline = Pipeline::new(KERNEL_B);
    let impulse = capture_block(|frame, channel| {
        if channel == 5 && frame == 0 { 1 << PRESCALE_SHIFT } else { 0 }
    });
    let silence = capture_block(|_, _| 0);

    let mut stream = Vec::new();
    stream.extend(channel_stream(&run(&mut pipeline, &impulse), 5));
    for _ in 0..5 {
        let lines = run(&mut pipeline, &silence);
        assert!(channel_stream(&lines, 4).iter().all(|&s| s == 0));
        stream.extend(channel_stream(&lines, 5));
    }

    let expected: Vec<i32> = (0..TAPS)
        .flat_map(|j| KERNEL_B.phases.map(|phase| phase[j] << KERNEL_B.shift))
        .chain(core::iter::repeat(0))
        .take(stream.len())
        .collect();
    assert_eq!(stream, expected);
}

#[test]
fn channels_keep_separate_history() {
    let mut pipeline = Pipeline::new(KERNEL_B);
    let capture = capture_block(|frame, channel| ((channel as i32 + 1) * 1000 + frame as i32) << 8);

    run(&mut pipeline, &capture);

    for channel in 0..CHANNELS {
        let history = pipeline.upsampler(channel).history();
        let newest = history[history.len() - 1];
        assert_eq!(newest, (channel as i32 + 1) * 1000 + FRAMES as i32 - 1);
    }
}

struct TickingClock(Cell<u64>);

impl Clock for &TickingClock {
    fn now(&self) -> u64 {
        let now = self.0.get() + 10;
        self.0.set(now);
        now
    }
}

struct Owned {
    capture: [CaptureHalf<FRAMES>; 2],
    playback: [[OutputHalf<FRAMES>; 2]; OUTPUT_LINES],
}

impl BlockBuffers<FRAMES> for Owned {
    fn split(
        &mut self,
        capture: Half,
        playback: Half,
    ) -> (&CaptureHalf<FRAMES>, [&mut OutputHalf<FRAMES>; OUTPUT_LINES]) {
        let [a, b, c, d] = &mut self.playback;
        let index = playback.index();
        (
            &self.capture[capture.index()],
            [&mut a[index], &mut b[index], &mut c[index], &mut d[index]],
        )
    }
}

#[test]
fn completion_records_interval_and_duration() {
    let clock = TickingClock(Cell::new(0));
    let mut stats = PipelineStats::new(
        Histogram::new("Call", 0, 100, &clock),
        Histogram::new("Exec", 0, 100, &clock),
    );
    let mut pipeline = Pipeline::new(KERNEL_B);
    let mut buffers = Owned {
        capture: [capture_block(|_, _| 1 << 20), capture_block(|_, _| 0)],
        playback: [[[[[0; SLOTS]; PHASES]; FRAMES]; 2]; OUTPUT_LINES],
    };

    let counter = CompletionCounter::new();
    for _ in 0..4 {
        counter.record();
        let selection = HalfSelection::probe(&counter, &counter);
        pipeline.on_completion(selection, &mut buffers, &mut stats);
    }

    assert_eq!(stats.call.count(), 3);
    assert_eq!(stats.call.min(), Some(20));
    assert_eq!(stats.exec.count(), 4);
    assert_eq!(stats.exec.max(), Some(10));
    assert!(stats.overran(10));
    assert!(!stats.overran(11));

    // Passes alternate halves, so half 0 holds the third pass over nonzero input
    assert!(buffers.playback[0][0][FRAMES - 1][1][0] != 0);

    stats.reset();
    assert_eq!(stats.exec.count(), 0);
    assert!(!stats.overran(0));
}

#[test]
fn taking_a_report_clears_the_overrun() {
    let clock = TickingClock(Cell::new(0));
    let mut stats = PipelineStats::new(
        Histogram::new("Call", 0, 100, &clock),
        Histogram::new("Exec", 0, 100, &clock),
    );
    let mut pipeline = Pipeline::new(KERNEL_B);
    let mut buffers = Owned {
        capture: [capture_block(|_, _| 0), capture_block(|_, _| 0)],
        playback: [[[[[0; SLOTS]; PHASES]; FRAMES]; 2]; OUTPUT_LINES],
    };
    let counter = CompletionCounter::new();

    counter.record();
    pipeline.on_completion(HalfSelection::probe(&counter, &counter), &mut buffers, &mut stats);
    // One slow pass, as after start-up
    stats.exec.add(50);

    let report = stats.take();
    assert!(report.overran(20));
    assert_eq!(report.exec.count(), 2);
    assert_eq!(stats.exec.count(), 0);
    assert!(!stats.overran(20));

    counter.record();
    pipeline.on_completion(HalfSelection::probe(&counter, &counter), &mut buffers, &mut stats);

    let report = stats.take();
    assert!(!report.overran(20));
    assert_eq!(report.exec.max(), Some(10));
    // The interval mark survives the reset
    assert_eq!(report.call.count(), 1);
}

#[test]
fn selection_follows_completed_halves() {
    let counter = CompletionCounter::new();
    let mut seen = Vec::new();
    for _ in 0..4 {
        counter.record();
        seen.push(HalfSelection::probe(&counter, &counter).capture);
    }
    assert_eq!(seen, vec![Half::First, Half::Second, Half::First, Half::Second]);
}
