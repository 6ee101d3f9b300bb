use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs;
use std::path::PathBuf;
use upsampler::fir::PHASES;
use upsampler::{KERNEL_A, KERNEL_B, Kernel, Upsampler};

const MAX_FRAMES: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "WAV Upsampler")]
#[command(about = "Runs the 2x FIR upsampler over a WAV file", long_about = None)]
struct Args {
    /// Kernel to use (a, b)
    #[arg(long, default_value = "b")]
    kernel: String,

    /// Frames per processing block (1-16)
    #[arg(long, default_value_t = 4)]
    frames: usize,

    /// Input WAV file, integer PCM
    #[arg(long)]
    input: PathBuf,

    /// Output WAV file path
    #[arg(long, default_value = "./test-results/upsampled.wav")]
    output: PathBuf,
}

fn main() {
    let args = Args::parse();

    if args.frames == 0 || args.frames > MAX_FRAMES {
        eprintln!("Invalid block size. Choose 1 to {}", MAX_FRAMES);
        std::process::exit(1);
    }

    let mut reader = WavReader::open(&args.input).expect("Failed to open WAV file");
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int {
        eprintln!("Only integer PCM input is supported");
        std::process::exit(1);
    }

    // Sign-extended samples move to the top of the 32-bit container the pipeline expects
    let shift = 32 - spec.bits_per_sample as u32;
    let samples: Vec<i32> = reader
        .samples::<i32>()
        .map(|s| s.expect("Failed to read sample") << shift)
        .collect();
    let channels = spec.channels as usize;

    println!(
        "Upsampling {} frames of {} channels at {} Hz with kernel {}, {} frames per block",
        samples.len() / channels,
        channels,
        spec.sample_rate,
        args.kernel,
        args.frames
    );

    let output = match args.kernel.to_lowercase().as_str() {
        "a" => render::<21, { 21 - 1 + MAX_FRAMES }>(KERNEL_A, &samples, channels, args.frames),
        "b" => render::<23, { 23 - 1 + MAX_FRAMES }>(KERNEL_B, &samples, channels, args.frames),
        _ => {
            eprintln!("Invalid kernel. Choose: a or b");
            std::process::exit(1);
        }
    };

    write_wav(&args.output, &output, spec.channels, spec.sample_rate * 2);

    println!("Output written to: {}", args.output.display());
}

fn render<const TAPS: usize, const WINDOW: usize>(
    kernel: Kernel<TAPS>,
    samples: &[i32],
    channels: usize,
    frames: usize,
) -> Vec<i32> {
    let mut upsamplers = vec![Upsampler::<TAPS, WINDOW>::new(kernel); channels];
    let mut output = vec![0; samples.len() * PHASES];

    for (block_index, block) in samples.chunks(frames * channels).enumerate() {
        let block_frames = block.len() / channels;
        let base = block_index * frames * channels * PHASES;

        for (channel, upsampler) in upsamplers.iter_mut().enumerate() {
            let input: Vec<i32> = block.iter().skip(channel).step_by(channels).copied().collect();
            let mut phases = vec![[0; PHASES]; block_frames];
            upsampler.process(&input[..block_frames], &mut phases);

            for (frame, pair) in phases.iter().enumerate() {
                for (phase, &sample) in pair.iter().enumerate() {
                    output[base + (frame * PHASES + phase) * channels + channel] = sample;
                }
            }
        }
    }

    output
}

fn write_wav(path: &PathBuf, samples: &[i32], channels: u16, sample_rate: u32) {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create output directory");
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).expect("Failed to create WAV file");

    for &sample in samples {
        writer.write_sample(sample).expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV file");
}
