use core::sync::atomic::{AtomicU32, Ordering};

use crate::{DmaEngine, Half, TransferRing};

/// Tells which half of a ring the engine owns right now.
pub trait HalfProbe {
    fn active_half(&self) -> Half;

    /// The half the engine finished last, which software may now touch.
    fn completed_half(&self) -> Half {
        self.active_half().other()
    }
}

/// Reads the owned half straight from the channel's live address.
pub struct RingProbe<'a, E> {
    ring: &'a TransferRing,
    engine: &'a E,
}

impl<'a, E: DmaEngine> RingProbe<'a, E> {
    pub fn new(ring: &'a TransferRing, engine: &'a E) -> Self {
        Self { ring, engine }
    }
}

impl<E: DmaEngine> HalfProbe for RingProbe<'_, E> {
    fn active_half(&self) -> Half {
        self.ring.active_half(self.engine)
    }
}

/// Tracks ownership by counting completions instead of reading addresses.
///
/// The ring starts on [`Half::First`], so after `n` completions the engine owns
/// half `n % 2`. Only plain loads and stores are used since the target has no
/// atomic read-modify-write; [`CompletionCounter::record`] must have a single
/// writer.
pub struct CompletionCounter(AtomicU32);

impl CompletionCounter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn record(&self) {
        let completions = self.0.load(Ordering::Relaxed);
        self.0.store(completions.wrapping_add(1), Ordering::Release);
    }

    pub fn completions(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for CompletionCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl HalfProbe for CompletionCounter {
    fn active_half(&self) -> Half {
        Half::from_index(self.completions() as usize)
    }
}
