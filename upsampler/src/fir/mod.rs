use defmt::Format;

#[cfg(test)]
mod tests;

/// Right shift applied to every input before it enters the delay line.
pub const PRESCALE_SHIFT: u32 = 8;

/// Output phases per input sample.
pub const PHASES: usize = 2;

/// A two-phase 2x interpolation kernel with its output scaling.
///
/// Coefficient `j` of a phase multiplies the sample `j` positions older than
/// the newest one. The accumulated sum is clamped to `[min, max]` and then
/// shifted left by `shift`, with no rounding anywhere.
#[derive(Format, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel<const TAPS: usize> {
    pub phases: [[i32; TAPS]; PHASES],
    pub min: i32,
    pub max: i32,
    pub shift: u32,
}

/// 21 taps, phases sum to 32.
pub const KERNEL_A: Kernel<21> = Kernel {
    phases: [
        [
            -1, 1, -1, 2, -3, 4, -5, 6, -8, 16, 31, -15, 7, -3, 1, 0, 0, 1, -1, 1, -1,
        ],
        [
            1, -1, 1, -1, 0, 0, -1, 3, -7, 38, 2, -7, 7, -5, 4, -3, 3, -2, 1, -1, 0,
        ],
    ],
    min: -0x1000_0000,
    max: 0x0fff_ffff,
    shift: 3,
};

/// 23 taps, phases sum to 128.
pub const KERNEL_B: Kernel<23> = Kernel {
    phases: [
        [
            1, -2, 4, -6, 8, -11, 14, -18, 23, -33, 66, 124, -61, 28, -13, 5, -1, -1, 2, -3, 3,
            -2, 1,
        ],
        [
            -1, 2, -3, 3, -2, 1, 1, -5, 11, -27, 152, 10, -29, 27, -22, 18, -14, 11, -8, 5, -3,
            2, -1,
        ],
    ],
    min: -0x4000_0000,
    max: 0x3fff_ffff,
    shift: 1,
};

impl<const TAPS: usize> Kernel<TAPS> {
    /// Both output phases for the window ending at its newest sample.
    #[inline(always)]
    pub fn evaluate(&self, window: &[i32; TAPS]) -> [i32; PHASES] {
        self.phases.map(|coefficients| {
            let sum: i64 = coefficients
                .iter()
                .zip(window.iter().rev())
                .map(|(&c, &x)| c as i64 * x as i64)
                .sum();
            (sum.clamp(self.min as i64, self.max as i64) as i32) << self.shift
        })
    }
}

/// Per-channel history of pre-scaled samples.
///
/// The first `TAPS - 1` slots always hold the tail of the previous block so a
/// block of up to `WINDOW - (TAPS - 1)` new samples can be filtered as one
/// contiguous window.
#[derive(Debug, Clone, Copy)]
pub struct DelayLine<const TAPS: usize, const WINDOW: usize> {
    samples: [i32; WINDOW],
    len: usize,
}

impl<const TAPS: usize, const WINDOW: usize> DelayLine<TAPS, WINDOW> {
    const HISTORY: usize = TAPS - 1;

    pub const fn new() -> Self {
        const {
            assert!(TAPS > 0 && WINDOW >= TAPS);
        }

        Self {
            samples: [0; WINDOW],
            len: TAPS - 1,
        }
    }

    /// Largest block one [`DelayLine::push`] accepts.
    pub const fn capacity() -> usize {
        WINDOW - Self::HISTORY
    }

    /// Moves the last `TAPS - 1` samples to the front and appends `input`
    /// shifted right by [`PRESCALE_SHIFT`].
    pub fn push(&mut self, input: &[i32]) {
        if input.len() > Self::capacity() {
            panic!("input.len() > DelayLine::capacity()");
        }

        self.samples.copy_within(self.len - Self::HISTORY..self.len, 0);
        for (slot, &sample) in self.samples[Self::HISTORY..].iter_mut().zip(input) {
            *slot = sample >> PRESCALE_SHIFT;
        }
        self.len = Self::HISTORY + input.len();
    }

    /// History followed by the samples of the last push, oldest first.
    pub fn window(&self) -> &[i32] {
        &self.samples[..self.len]
    }

    /// The `TAPS - 1` most recent samples, oldest first.
    pub fn history(&self) -> &[i32] {
        &self.samples[self.len - Self::HISTORY..self.len]
    }
}

impl<const TAPS: usize, const WINDOW: usize> Default for DelayLine<TAPS, WINDOW> {
    fn default() -> Self {
        Self::new()
    }
}

/// 2x upsampler for one channel.
#[derive(Debug, Clone, Copy)]
pub struct Upsampler<const TAPS: usize, const WINDOW: usize> {
    kernel: Kernel<TAPS>,
    delay: DelayLine<TAPS, WINDOW>,
}

impl<const TAPS: usize, const WINDOW: usize> Upsampler<TAPS, WINDOW> {
    pub const fn new(kernel: Kernel<TAPS>) -> Self {
        Self {
            kernel,
            delay: DelayLine::new(),
        }
    }

    pub fn kernel(&self) -> &Kernel<TAPS> {
        &self.kernel
    }

    pub fn history(&self) -> &[i32] {
        self.delay.history()
    }

    /// Filters `input` into `output[n] = [phase 0, phase 1]` for every input `n`.
    #[inline(always)]
    pub fn process(&mut self, input: &[i32], output: &mut [[i32; PHASES]]) {
        if input.len() != output.len() {
            panic!("input.len() != output.len()");
        }

        self.delay.push(input);

        for (window, out) in self.delay.window().windows(TAPS).zip(output.iter_mut()) {
            let window: &[i32; TAPS] = window.try_into().unwrap_or_else(|_| unreachable!());
            *out = self.kernel.evaluate(window);
        }
    }
}
