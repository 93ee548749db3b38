//! High-Precision Timing
//!
//! Every timed section reads a [`Clock`]. Production runs use
//! [`MonotonicClock`] (backed by `std::time::Instant`); tests and simulations
//! use [`ManualClock`], which only moves when told to.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of rounds used to estimate the clock resolution
const RESOLUTION_PROBES: usize = 64;

/// Monotonic time source measured in nanoseconds
pub trait Clock {
    /// Nanoseconds since an arbitrary, fixed origin
    fn now_nanos(&self) -> u64;

    /// Smallest observable step of this clock in nanoseconds
    fn resolution_ns(&self) -> u64 {
        1
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline(always)]
    fn now_nanos(&self) -> u64 {
        (**self).now_nanos()
    }

    fn resolution_ns(&self) -> u64 {
        (**self).resolution_ns()
    }
}

// ─── MonotonicClock ──────────────────────────────────────────────────────────

/// Wall clock backed by `std::time::Instant`
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: std::time::Instant,
    resolution_ns: u64,
}

impl MonotonicClock {
    /// Create a clock and estimate its resolution
    pub fn new() -> Self {
        let mut clock = Self {
            origin: std::time::Instant::now(),
            resolution_ns: 1,
        };
        clock.resolution_ns = estimate_resolution(&clock);
        clock
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline(always)]
    fn now_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn resolution_ns(&self) -> u64 {
        self.resolution_ns
    }
}

/// Smallest non-zero step observed over a few spin rounds
fn estimate_resolution<C: Clock + ?Sized>(clock: &C) -> u64 {
    let mut smallest = u64::MAX;
    for _ in 0..RESOLUTION_PROBES {
        let start = clock.now_nanos();
        let mut now = clock.now_nanos();
        while now == start {
            now = clock.now_nanos();
        }
        smallest = smallest.min(now - start);
    }
    smallest.max(1)
}

// ─── ManualClock ─────────────────────────────────────────────────────────────

/// Deterministic clock that only advances when [`ManualClock::advance`] is called.
///
/// Clones share the same underlying time, so a candidate closure can hold one
/// clone and "spend" time while the benchmark engine reads another. An optional
/// resolution quantises readings the way a coarse hardware timer would.
#[derive(Debug, Clone)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
    resolution_ns: u64,
}

impl ManualClock {
    /// Create a clock at time zero with 1 ns resolution
    pub fn new() -> Self {
        Self::with_resolution(1)
    }

    /// Create a clock whose readings are rounded down to `resolution_ns`
    pub fn with_resolution(resolution_ns: u64) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(0)),
            resolution_ns: resolution_ns.max(1),
        }
    }

    /// Move time forward by `nanos`
    #[inline]
    pub fn advance(&self, nanos: u64) {
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Exact internal time, ignoring resolution
    pub fn raw_nanos(&self) -> u64 {
        self.nanos.load(Ordering::Relaxed)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> u64 {
        let raw = self.raw_nanos();
        raw - raw % self.resolution_ns
    }

    fn resolution_ns(&self) -> u64 {
        self.resolution_ns
    }
}

// ─── Timer ───────────────────────────────────────────────────────────────────

/// Timer for measuring one batch
pub struct Timer<'a, C: Clock + ?Sized> {
    clock: &'a C,
    start: u64,
}

impl<'a, C: Clock + ?Sized> Timer<'a, C> {
    /// Start a new timer
    #[inline(always)]
    pub fn start(clock: &'a C) -> Self {
        Self {
            clock,
            start: clock.now_nanos(),
        }
    }

    /// Elapsed nanoseconds since start
    #[inline(always)]
    pub fn stop(&self) -> u64 {
        self.clock.now_nanos().saturating_sub(self.start)
    }
}

/// Set CPU affinity to pin the current thread to a specific core
///
/// Keeps timed batches on one core so migrations do not show up as noise.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// Set CPU affinity to pin the current thread to a specific core
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    // CPU pinning not supported on this platform
    Ok(())
}

/// Pin the current thread to the core it is running on right now.
///
/// Returns the core index.
#[cfg(target_os = "linux")]
pub fn pin_current_thread() -> Result<usize, std::io::Error> {
    // SAFETY: sched_getcpu has no preconditions.
    let cpu = unsafe { libc::sched_getcpu() };
    if cpu < 0 {
        return Err(std::io::Error::last_os_error());
    }
    let cpu = cpu as usize;
    pin_to_cpu(cpu)?;
    Ok(cpu)
}

/// Pin the current thread to the core it is running on right now.
#[cfg(not(target_os = "linux"))]
pub fn pin_current_thread() -> Result<usize, std::io::Error> {
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_monotonic_elapsed() {
        let clock = MonotonicClock::new();
        let start = clock.now_nanos();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = clock.now_nanos() - start;

        // Should be at least 5ms
        assert!(elapsed >= 5_000_000);
        // Should be less than 1s (accounting for scheduling)
        assert!(elapsed < 1_000_000_000);
    }

    #[test]
    fn test_monotonic_resolution() {
        let clock = MonotonicClock::new();
        assert!(clock.resolution_ns() >= 1);
        // Any sane host timer resolves better than a millisecond
        assert!(clock.resolution_ns() < 1_000_000);
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance(250);
        handle.advance(250);
        assert_eq!(clock.now_nanos(), 500);
    }

    #[test]
    fn test_manual_clock_resolution() {
        let clock = ManualClock::with_resolution(1_000);
        clock.advance(999);
        assert_eq!(clock.now_nanos(), 0);
        clock.advance(1);
        assert_eq!(clock.now_nanos(), 1_000);
        assert_eq!(clock.raw_nanos(), 1_000);
    }

    #[test]
    fn test_timer() {
        let clock = ManualClock::new();
        let timer = Timer::start(&clock);
        clock.advance(42);
        assert_eq!(timer.stop(), 42);
    }

    #[test]
    fn test_clock_by_reference() {
        let clock = ManualClock::with_resolution(10);
        let by_ref: &dyn Clock = &clock;
        clock.advance(25);
        assert_eq!(by_ref.now_nanos(), 20);
        assert_eq!((&clock).resolution_ns(), 10);
    }
}
