use embassy_time::Instant;
use histogram::Clock;

/// Microseconds since boot.
#[derive(Debug, Clone, Copy)]
pub struct Uptime;

impl Clock for Uptime {
    fn now(&self) -> u64 {
        Instant::now().as_micros()
    }
}
