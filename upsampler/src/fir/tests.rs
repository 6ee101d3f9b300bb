use pretty_assertions::assert_eq;
use rand::{RngExt, SeedableRng, rngs::StdRng};

use super::*;

const WINDOW_B: usize = 23 - 1 + 16;
const WINDOW_A: usize = 21 - 1 + 16;

fn run<const TAPS: usize, const WINDOW: usize>(
    upsampler: &mut Upsampler<TAPS, WINDOW>,
    input: &[i32],
) -> Vec<i32> {
    let mut output = vec![[0; PHASES]; input.len()];
    upsampler.process(input, &mut output);
    output.into_iter().flatten().collect()
}

#[test]
fn phases_sum_to_documented_gain() {
    for phase in KERNEL_A.phases {
        assert_eq!(phase.iter().sum::<i32>(), 32);
    }
    for phase in KERNEL_B.phases {
        assert_eq!(phase.iter().sum::<i32>(), 128);
    }
}

#[test]
fn golden_vector_kernel_b() {
    let mut upsampler = Upsampler::<23, WINDOW_B>::new(KERNEL_B);
    assert_eq!(
        run(&mut upsampler, &[100, -100, 50, -50]),
        vec![0, 0, -2, 2, 4, -4, -10, 8]
    );
}

#[test]
fn golden_vector_kernel_a() {
    let mut upsampler = Upsampler::<21, WINDOW_A>::new(KERNEL_A);
    assert_eq!(
        run(&mut upsampler, &[100, -100, 50, -50]),
        vec![0, 0, 8, -8, -8, 8, 16, -16]
    );
}

#[test]
fn golden_vector_wide_input() {
    let input = [25600, -25600, 12800, -12800, 1048576, -1048576, 12345678, -7654321];

    let mut b = Upsampler::<23, WINDOW_B>::new(KERNEL_B);
    assert_eq!(
        run(&mut b, &input),
        vec![
            200, -200, -600, 600, 1300, -1100, -2300, 1500, 11592, -9692, -29376, 25776, 152002,
            -137910, -342920, 300952,
        ]
    );

    let mut a = Upsampler::<21, WINDOW_A>::new(KERNEL_A);
    assert_eq!(
        run(&mut a, &input),
        vec![
            -800, 800, 1600, -1600, -2000, 2000, 3200, -2400, -37568, 34368, 72336, -66336,
            -460536, 450936, 734904, -687336,
        ]
    );
}

fn impulse_reproduces_kernel<const TAPS: usize, const WINDOW: usize>(kernel: Kernel<TAPS>) {
    let mut upsampler = Upsampler::<TAPS, WINDOW>::new(kernel);
    let mut input = vec![0; TAPS];
    input[0] = 1 << PRESCALE_SHIFT;

    let mut output = Vec::new();
    for chunk in input.chunks(4) {
        let mut block = vec![[0; PHASES]; chunk.len()];
        upsampler.process(chunk, &mut block);
        output.extend(block);
    }

    for (j, out) in output.iter().enumerate() {
        assert_eq!(
            *out,
            [
                kernel.phases[0][j] << kernel.shift,
                kernel.phases[1][j] << kernel.shift
            ],
            "tap {}",
            j
        );
    }
}

#[test]
fn impulse_response_kernel_b() {
    impulse_reproduces_kernel::<23, WINDOW_B>(KERNEL_B);
}

#[test]
fn impulse_response_kernel_a() {
    impulse_reproduces_kernel::<21, WINDOW_A>(KERNEL_A);
}

#[test]
fn silence_stays_silent() {
    let mut upsampler = Upsampler::<23, WINDOW_B>::new(KERNEL_B);
    for _ in 0..10 {
        assert!(run(&mut upsampler, &[0; 16]).iter().all(|&s| s == 0));
    }
}

#[test]
fn small_inputs_vanish_in_prescale() {
    let mut upsampler = Upsampler::<23, WINDOW_B>::new(KERNEL_B);
    assert!(run(&mut upsampler, &[255; 16]).iter().all(|&s| s == 0));
    assert!(upsampler.history().iter().all(|&s| s == 0));
}

/// Drives phase 1 of `kernel` with full-scale samples matching its signs.
fn saturating_input<const TAPS: usize>(kernel: &Kernel<TAPS>, positive: bool) -> Vec<i32> {
    let phase = kernel.phases[1];
    (0..TAPS)
        .map(|i| {
            let c = phase[TAPS - 1 - i];
            if c == 0 {
                0
            } else if (c > 0) == positive {
                i32::MAX
            } else {
                i32::MIN
            }
        })
        .collect()
}

/// Phase 1 output once the whole saturating input is in the window.
fn saturated_output<const TAPS: usize, const WINDOW: usize>(
    kernel: Kernel<TAPS>,
    positive: bool,
) -> i32 {
    let mut upsampler = Upsampler::<TAPS, WINDOW>::new(kernel);
    let input = saturating_input(&kernel, positive);

    let mut output = Vec::new();
    for chunk in input.chunks(DelayLine::<TAPS, WINDOW>::capacity()) {
        output.extend(run(&mut upsampler, chunk));
    }
    output[2 * (TAPS - 1) + 1]
}

#[test]
fn accumulator_saturates_at_clamp_kernel_b() {
    assert_eq!(saturated_output::<23, WINDOW_B>(KERNEL_B, true), 0x7fff_fffe);
    assert_eq!(saturated_output::<23, WINDOW_B>(KERNEL_B, false), i32::MIN);
}

#[test]
fn accumulator_saturates_at_clamp_kernel_a() {
    assert_eq!(saturated_output::<21, WINDOW_A>(KERNEL_A, true), 0x7fff_fff8);
    assert_eq!(saturated_output::<21, WINDOW_A>(KERNEL_A, false), i32::MIN);
}

#[test]
fn output_is_independent_of_block_boundaries() {
    let mut rng = StdRng::from_seed([11; 32]);
    let input: Vec<i32> = (0..301).map(|_| rng.random_range(i32::MIN..=i32::MAX)).collect();

    let mut whole = Upsampler::<23, WINDOW_B>::new(KERNEL_B);
    let mut expected = Vec::new();
    for sample in &input {
        expected.extend(run(&mut whole, core::slice::from_ref(sample)));
    }

    for _ in 0..20 {
        let mut chunked = Upsampler::<23, WINDOW_B>::new(KERNEL_B);
        let mut output = Vec::new();
        let mut rest = input.as_slice();
        while !rest.is_empty() {
            let size = rng.random_range(1..=16).min(rest.len());
            let (chunk, tail) = rest.split_at(size);
            output.extend(run(&mut chunked, chunk));
            rest = tail;
        }
        assert_eq!(output, expected);
    }
}

#[test]
fn every_output_is_written() {
    let mut upsampler = Upsampler::<21, WINDOW_A>::new(KERNEL_A);
    for len in 1..=16 {
        let mut output = vec![[i32::MAX; PHASES]; len];
        upsampler.process(&vec![0; len], &mut output);
        assert_eq!(output, vec![[0; PHASES]; len]);
    }
}

#[test]
fn delay_line_keeps_last_taps() {
    let mut delay = DelayLine::<4, 8>::new();
    assert_eq!(delay.window(), &[0, 0, 0]);

    delay.push(&[1 << 8, 2 << 8, 3 << 8, 4 << 8, 5 << 8]);
    assert_eq!(delay.window(), &[0, 0, 0, 1, 2, 3, 4, 5]);
    assert_eq!(delay.history(), &[3, 4, 5]);

    delay.push(&[-6 << 8]);
    assert_eq!(delay.window(), &[3, 4, 5, -6]);
    assert_eq!(DelayLine::<4, 8>::capacity(), 5);
}

#[test]
#[should_panic]
fn oversized_block_is_rejected() {
    let mut delay = DelayLine::<4, 8>::new();
    delay.push(&[0; 6]);
}
