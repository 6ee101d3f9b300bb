use defmt::{info, warn};
use heapless::String;
use histogram::{Clock, Histogram};

/// Bar length of the fullest bin.
const BAR_WIDTH: usize = 20;
const REPORT_CAPACITY: usize = 1536;

#[cfg(feature = "capture-serial")]
const REPORT_PERIOD: embassy_time::Duration = embassy_time::Duration::from_secs(5);

/// Logs the rendered histogram.
pub fn log_histogram<C: Clock>(histogram: &Histogram<C>) {
    let mut text: String<REPORT_CAPACITY> = String::new();
    if histogram.text(BAR_WIDTH, &mut text).is_err() {
        warn!("{=str}: report truncated", histogram.name());
    }
    info!("\n{=str}", text.as_str());
}

#[cfg(feature = "capture-serial")]
#[embassy_executor::task]
pub async fn report_task() {
    use crate::audio_task::{BLOCK_PERIOD_US, STATS};

    info!("Report: Task starting");

    loop {
        embassy_time::Timer::after(REPORT_PERIOD).await;

        let stats = STATS.lock(|stats| stats.borrow_mut().take());

        info!("Report: uptime {} us", stats.call.now());
        log_histogram(&stats.call);
        log_histogram(&stats.exec);

        if stats.overran(BLOCK_PERIOD_US) {
            warn!(
                "Report: completion handler took {} us of a {} us block",
                stats.exec.max(),
                BLOCK_PERIOD_US
            );
        }
    }
}
