//! A small clock abstraction so TTL and buffer-wait logic can be driven by a
//! deterministic fake clock in tests instead of racing the wall clock.
//!
//! Mirrors the shape of `near_async::time::Clock` used throughout
//! `chain/network`: callers hold a [`Clock`], never `Instant::now()`
//! directly, so a single [`Clock::fake`] swap makes an entire call graph
//! testable.

pub use time::Duration;

use parking_lot::Mutex;
use std::sync::Arc;

/// A point in time as seen by a [`Clock`].
///
/// Backed by [`std::time::Instant`] rather than wall-clock time: the core
/// only ever needs to reason about elapsed durations (TTL expiry, flush
/// `maxWait`), never about calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Instant(std::time::Instant);

impl Instant {
    /// Duration elapsed between `earlier` and `self`. Saturates at zero if
    /// `earlier` is actually later (can happen with a fake clock rewound in
    /// a test, or instants taken from different clocks).
    pub fn saturating_duration_since(&self, earlier: Instant) -> Duration {
        let std_dur = self.0.saturating_duration_since(earlier.0);
        Duration::try_from(std_dur).unwrap_or(Duration::ZERO)
    }

    pub fn checked_add(&self, d: Duration) -> Option<Instant> {
        let std_dur = std::time::Duration::try_from(d).ok()?;
        self.0.checked_add(std_dur).map(Instant)
    }
}

#[derive(Clone)]
enum Inner {
    Real,
    Fake(Arc<Mutex<std::time::Instant>>),
}

/// Source of [`Instant`]s. Clone is cheap; a fake clock's state is shared
/// across clones.
#[derive(Clone)]
pub struct Clock(Inner);

impl Clock {
    /// The real, monotonic wall clock.
    pub fn real() -> Self {
        Self(Inner::Real)
    }

    /// A clock that only advances when [`FakeClock::advance`] is called.
    /// Returns the clock handle plus the controller used to advance it.
    pub fn fake() -> (Self, FakeClock) {
        let now = Arc::new(Mutex::new(std::time::Instant::now()));
        (Self(Inner::Fake(now.clone())), FakeClock(now))
    }

    pub fn now(&self) -> Instant {
        match &self.0 {
            Inner::Real => Instant(std::time::Instant::now()),
            Inner::Fake(now) => Instant(*now.lock()),
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::real()
    }
}

/// Handle used to advance a fake [`Clock`] in tests.
#[derive(Clone)]
pub struct FakeClock(Arc<Mutex<std::time::Instant>>);

impl FakeClock {
    pub fn advance(&self, d: Duration) {
        let std_dur = std::time::Duration::try_from(d).expect("negative advance");
        let mut now = self.0.lock();
        *now += std_dur;
    }
}
