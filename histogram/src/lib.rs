#![cfg_attr(not(test), no_std)]

use core::fmt::{self, Write};

use defmt::Format;
use micromath::F32Ext;

/// Number of buckets in the distribution.
pub const BINS: usize = 32;

/// Monotonic tick source used for interval measurements.
pub trait Clock {
    fn now(&self) -> u64;
}

/// Running statistics over scalar samples.
///
/// Every update is O(1) and allocation free so the interrupt path can record into it.
/// Samples outside `[min, max)` are still counted, landing in the first or last bin.
#[derive(Debug, Clone, Copy)]
pub struct Histogram<C: Clock> {
    name: &'static str,
    clock: C,
    range_min: i32,
    range_max: i32,
    bins: [u32; BINS],
    count: u32,
    sum: i64,
    sum_squares: u64,
    smallest: i32,
    largest: i32,
    mark: Option<u64>,
}

impl<C: Clock> Histogram<C> {
    pub const fn new(name: &'static str, range_min: i32, range_max: i32, clock: C) -> Self {
        assert!(range_max > range_min);

        Self {
            name,
            clock,
            range_min,
            range_max,
            bins: [0; BINS],
            count: 0,
            sum: 0,
            sum_squares: 0,
            smallest: i32::MAX,
            largest: i32::MIN,
            mark: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Records the ticks elapsed since the previous mark and moves the mark to now.
    ///
    /// The first call only sets the mark. Returns the timestamp it took.
    pub fn time(&mut self) -> u64 {
        let now = self.clock.now();
        if let Some(mark) = self.mark {
            self.add(i32::try_from(now.saturating_sub(mark)).unwrap_or(i32::MAX));
        }
        self.mark = Some(now);
        now
    }

    /// Sets the mark so the next [`Histogram::time`] measures a duration from `timestamp`.
    pub fn start(&mut self, timestamp: u64) {
        self.mark = Some(timestamp);
    }

    pub fn add(&mut self, value: i32) {
        let span = self.range_max as i64 - self.range_min as i64;
        let bin = ((value as i64 - self.range_min as i64) * BINS as i64 / span)
            .clamp(0, BINS as i64 - 1) as usize;

        self.bins[bin] = self.bins[bin].saturating_add(1);
        self.count = self.count.saturating_add(1);
        self.sum = self.sum.saturating_add(value as i64);
        self.sum_squares = self
            .sum_squares
            .saturating_add((value as i64 * value as i64) as u64);
        self.smallest = self.smallest.min(value);
        self.largest = self.largest.max(value);
    }

    /// Clears the accumulated statistics. The timing mark survives so interval
    /// measurements continue across a reporting cycle.
    pub fn reset(&mut self) {
        self.bins = [0; BINS];
        self.count = 0;
        self.sum = 0;
        self.sum_squares = 0;
        self.smallest = i32::MAX;
        self.largest = i32::MIN;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn bins(&self) -> &[u32; BINS] {
        &self.bins
    }

    pub fn min(&self) -> Option<i32> {
        (self.count > 0).then_some(self.smallest)
    }

    pub fn max(&self) -> Option<i32> {
        (self.count > 0).then_some(self.largest)
    }

    pub fn mean(&self) -> Option<f32> {
        (self.count > 0).then(|| self.sum as f32 / self.count as f32)
    }

    pub fn std_dev(&self) -> Option<f32> {
        let mean = self.mean()?;
        let variance = (self.sum_squares as f32 / self.count as f32 - mean * mean).max(0.0);
        Some(F32Ext::sqrt(variance))
    }

    /// Centre of the fullest bin.
    pub fn mode(&self) -> Option<i32> {
        if self.count == 0 {
            return None;
        }

        let (index, _) = self
            .bins
            .iter()
            .enumerate()
            .fold((0, 0), |best, (i, &n)| if n > best.1 { (i, n) } else { best });

        let span = self.range_max as i64 - self.range_min as i64;
        Some((self.range_min as i64 + (2 * index as i64 + 1) * span / (2 * BINS as i64)) as i32)
    }

    fn bin_lower(&self, index: usize) -> i32 {
        let span = self.range_max as i64 - self.range_min as i64;
        (self.range_min as i64 + index as i64 * span / BINS as i64) as i32
    }

    /// Renders the summary and a horizontal bar chart into `out`.
    ///
    /// `width` is the length in characters of the longest bar. Only the bins between
    /// the first and last non-empty one are drawn.
    pub fn text<W: Write>(&self, width: usize, out: &mut W) -> fmt::Result {
        writeln!(out, "{}", self.name)?;
        writeln!(out, "N     {}", self.count)?;

        let (Some(mean), Some(std_dev), Some(mode), Some(min), Some(max)) = (
            self.mean(),
            self.std_dev(),
            self.mode(),
            self.min(),
            self.max(),
        ) else {
            return Ok(());
        };

        writeln!(out, "mean  {:.3e}", mean)?;
        writeln!(out, "std   {:.3e}", std_dev)?;
        writeln!(out, "mode  {}", mode)?;
        writeln!(out, "min   {}", min)?;
        writeln!(out, "max   {}", max)?;

        let first = self.bins.iter().position(|&n| n > 0).unwrap_or(0);
        let last = self.bins.iter().rposition(|&n| n > 0).unwrap_or(0);
        let peak = self.bins.iter().copied().max().unwrap_or(0).max(1) as u64;

        for index in first..=last {
            let n = self.bins[index];
            write!(out, "{:>11} |", self.bin_lower(index))?;

            let length = (n as u64 * width as u64 / peak) as usize;
            if length == 0 && n > 0 {
                out.write_char('.')?;
            }
            for _ in 0..length {
                out.write_char('X')?;
            }
            out.write_char('\n')?;
        }

        Ok(())
    }
}

impl<C: Clock> Format for Histogram<C> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{=str}: n={} min={} max={}",
            self.name,
            self.count,
            self.min(),
            self.max()
        )
    }
}
