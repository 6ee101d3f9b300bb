use defmt::Format;
use histogram::{Clock, Histogram};
use transfer_interface::{Half, HalfProbe};

use crate::deinterleave::{LINES, SLOTS, WORDS_PER_FRAME, frame_samples};
use crate::fir::{Kernel, PHASES, Upsampler};

#[cfg(test)]
mod tests;

/// Channel `2 * line + slot` comes from capture line `line`, slot `slot`.
pub const CHANNELS: usize = LINES * SLOTS;

/// Double-rate output lines. Channel `c` leaves on line `c / 2`, slot `c % 2`.
pub const OUTPUT_LINES: usize = CHANNELS / SLOTS;

/// Raw capture words of one half-block, one row per input frame.
pub type CaptureHalf<const FRAMES: usize> = [[u32; WORDS_PER_FRAME]; FRAMES];

/// One output line's half-block, indexed `[input frame][phase][slot]`.
///
/// Each input frame becomes two consecutive output frames, phase 0 first.
pub type OutputHalf<const FRAMES: usize> = [[[i32; SLOTS]; PHASES]; FRAMES];

/// Output line and slot of `channel`.
pub const fn output_position(channel: usize) -> (usize, usize) {
    (channel / SLOTS, channel % SLOTS)
}

/// Access to the halves software may touch after a completion.
pub trait BlockBuffers<const FRAMES: usize> {
    fn split(
        &mut self,
        capture: Half,
        playback: Half,
    ) -> (&CaptureHalf<FRAMES>, [&mut OutputHalf<FRAMES>; OUTPUT_LINES]);
}

/// Halves chosen for one processing pass.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfSelection {
    /// Just filled by the capture ring.
    pub capture: Half,
    /// Not being drained by the playback rings.
    pub playback: Half,
}

impl HalfSelection {
    /// Reads ownership from the engines rather than from a latch, so a late or
    /// coalesced completion still picks the right halves.
    pub fn probe(capture: &impl HalfProbe, playback: &impl HalfProbe) -> Self {
        Self {
            capture: capture.completed_half(),
            playback: playback.completed_half(),
        }
    }
}

/// Call-interval and execution-time statistics of the completion handler.
#[derive(Debug, Clone, Copy)]
pub struct PipelineStats<C: Clock> {
    pub call: Histogram<C>,
    pub exec: Histogram<C>,
}

impl<C: Clock> PipelineStats<C> {
    pub const fn new(call: Histogram<C>, exec: Histogram<C>) -> Self {
        Self { call, exec }
    }

    /// Whether any pass took a full block period or longer.
    pub fn overran(&self, block_period: i32) -> bool {
        self.exec.max().is_some_and(|max| max >= block_period)
    }

    pub fn reset(&mut self) {
        self.call.reset();
        self.exec.reset();
    }
}

impl<C: Clock + Copy> PipelineStats<C> {
    /// Copies the statistics of the finished reporting cycle and starts a new one.
    pub fn take(&mut self) -> Self {
        let report = *self;
        self.reset();
        report
    }
}

/// Per-channel filter state for one group of capture lines.
pub struct BlockPipeline<const FRAMES: usize, const TAPS: usize, const WINDOW: usize> {
    channels: [Upsampler<TAPS, WINDOW>; CHANNELS],
}

impl<const FRAMES: usize, const TAPS: usize, const WINDOW: usize>
    BlockPipeline<FRAMES, TAPS, WINDOW>
{
    pub const fn new(kernel: Kernel<TAPS>) -> Self {
        const {
            assert!(FRAMES > 0 && WINDOW >= TAPS - 1 + FRAMES);
        }

        Self {
            channels: [Upsampler::new(kernel); CHANNELS],
        }
    }

    pub fn upsampler(&self, channel: usize) -> &Upsampler<TAPS, WINDOW> {
        &self.channels[channel]
    }

    /// Runs one pass for a completion signal and records its timing.
    ///
    /// Must not be re-entered. Never blocks or allocates.
    pub fn on_completion<B, C>(
        &mut self,
        selection: HalfSelection,
        buffers: &mut B,
        stats: &mut PipelineStats<C>,
    ) where
        B: BlockBuffers<FRAMES>,
        C: Clock,
    {
        let entry = stats.call.time();
        stats.exec.start(entry);

        let (capture, mut playback) = buffers.split(selection.capture, selection.playback);
        self.process(capture, &mut playback);

        stats.exec.time();
    }

    pub fn process(
        &mut self,
        capture: &CaptureHalf<FRAMES>,
        playback: &mut [&mut OutputHalf<FRAMES>; OUTPUT_LINES],
    ) {
        let mut inputs = [[0; FRAMES]; CHANNELS];
        for (frame, words) in capture.iter().enumerate() {
            for (line, slots) in frame_samples(words).into_iter().enumerate() {
                for (slot, sample) in slots.into_iter().enumerate() {
                    inputs[line * SLOTS + slot][frame] = sample;
                }
            }
        }

        let mut output = [[0; PHASES]; FRAMES];
        for (channel, (upsampler, input)) in self.channels.iter_mut().zip(&inputs).enumerate() {
            upsampler.process(input, &mut output);

            let (line, slot) = output_position(channel);
            for (frame, phases) in output.iter().enumerate() {
                for (phase, &sample) in phases.iter().enumerate() {
                    playback[line][frame][phase][slot] = sample;
                }
            }
        }
    }
}
