#![cfg_attr(not(test), no_std)]

pub mod deinterleave;
pub mod fir;
pub mod pipeline;

/// Capture frame rate in Hz. Output lines run at twice this.
pub const SAMPLE_RATE: u32 = 48000;
pub const OUTPUT_RATE: u32 = 2 * SAMPLE_RATE;

pub use fir::{DelayLine, KERNEL_A, KERNEL_B, Kernel, Upsampler};
pub use pipeline::{
    BlockBuffers, BlockPipeline, CHANNELS, CaptureHalf, HalfSelection, OUTPUT_LINES, OutputHalf,
    PipelineStats,
};
