//! OS-maintained "time since last input" counter.

use std::time::Duration;

/// Cross-check for the hook-derived idle time.
///
/// `None` means the gauge could not be read this time; the aggregator then
/// relies on its own timestamps alone.
pub trait IdleGauge: Send + Sync {
    fn idle(&self) -> Option<Duration>;
}

/// Reads the system last-input tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemIdleGauge;

#[cfg(windows)]
impl IdleGauge for SystemIdleGauge {
    fn idle(&self) -> Option<Duration> {
        use std::mem;
        use winapi::um::sysinfoapi::GetTickCount;
        use winapi::um::winuser::{GetLastInputInfo, LASTINPUTINFO};

        let mut info = LASTINPUTINFO {
            cbSize: mem::size_of::<LASTINPUTINFO>() as u32,
            dwTime: 0,
        };
        if unsafe { GetLastInputInfo(&mut info) } == 0 {
            return None;
        }
        // Both counters are 32-bit milliseconds and wrap after ~49.7 days.
        let now = unsafe { GetTickCount() };
        Some(Duration::from_millis(u64::from(now.wrapping_sub(info.dwTime))))
    }
}

#[cfg(not(windows))]
impl IdleGauge for SystemIdleGauge {
    fn idle(&self) -> Option<Duration> {
        None
    }
}

/// A gauge that never reports, leaving the hook timestamps authoritative.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGauge;

impl IdleGauge for NoGauge {
    fn idle(&self) -> Option<Duration> {
        None
    }
}
