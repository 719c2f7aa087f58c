//! Client-side rate limiting for the extraction service.
//!
//! The service accepts a fixed number of requests per minute and rejects the
//! rest. [`RateLimiter`] keeps the instants of recent requests and blocks the
//! caller until one more fits in the rolling window; [`RateLimitedTransport`]
//! puts it in front of any [`Transport`].

use super::{Transport, Upload};
use crate::error::Result;
use log::debug;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Requests per window the service accepts.
pub const DEFAULT_MAX_REQUESTS: u32 = 10;

/// Rate limit window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Rate limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Max requests allowed in any window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Create a policy. A zero request count is treated as one.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
        }
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

/// Time source used by the limiter.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Block for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// A clock that only moves when told to. `sleep` advances it instantly.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
    slept: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock starting at the current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            slept: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += duration;
    }

    /// Total time spent in `sleep`.
    pub fn slept(&self) -> Duration {
        *self.slept.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: Duration) {
        *self.slept.lock().unwrap_or_else(|e| e.into_inner()) += duration;
        self.advance(duration);
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Rolling-window limiter.
///
/// At most `max_requests` grants fall inside any `window`-long span of time.
/// The first `max_requests` calls go through at once; after that a call waits
/// until the oldest grant in the window has aged out.
pub struct RateLimiter<C: Clock = SystemClock> {
    policy: RateLimitPolicy,
    clock: C,
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter<SystemClock> {
    /// Create a limiter on the wall clock.
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_clock(policy, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a limiter on a custom clock.
    pub fn with_clock(policy: RateLimitPolicy, clock: C) -> Self {
        Self {
            policy,
            clock,
            grants: Mutex::new(VecDeque::with_capacity(policy.max_requests as usize)),
        }
    }

    /// The policy being enforced.
    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Record a request if one fits in the current window.
    ///
    /// Returns the time to wait before the next request will fit otherwise.
    pub fn try_acquire(&self) -> std::result::Result<(), Duration> {
        let now = self.clock.now();
        let window = self.policy.window;
        let mut grants = self.grants.lock().unwrap_or_else(|e| e.into_inner());

        while let Some(oldest) = grants.front() {
            if now.saturating_duration_since(*oldest) >= window {
                grants.pop_front();
            } else {
                break;
            }
        }

        if grants.len() < self.policy.max_requests as usize {
            grants.push_back(now);
            return Ok(());
        }

        match grants.front() {
            Some(oldest) => Err(window.saturating_sub(now.saturating_duration_since(*oldest))),
            None => Ok(()),
        }
    }

    /// Block until a request fits in the window, then record it.
    pub fn acquire(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(wait) => {
                    debug!("rate limit reached, waiting {:?}", wait);
                    self.clock.sleep(wait);
                }
            }
        }
    }
}

/// A transport that waits for the rate limiter before every request.
pub struct RateLimitedTransport<T: Transport, C: Clock = SystemClock> {
    inner: T,
    limiter: RateLimiter<C>,
}

impl<T: Transport> RateLimitedTransport<T, SystemClock> {
    /// Wrap a transport with a wall-clock limiter.
    pub fn new(inner: T, policy: RateLimitPolicy) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(policy),
        }
    }
}

impl<T: Transport, C: Clock> RateLimitedTransport<T, C> {
    /// Wrap a transport with an existing limiter.
    pub fn with_limiter(inner: T, limiter: RateLimiter<C>) -> Self {
        Self { inner, limiter }
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// The limiter in front of the transport.
    pub fn limiter(&self) -> &RateLimiter<C> {
        &self.limiter
    }
}

impl<T: Transport, C: Clock> Transport for RateLimitedTransport<T, C> {
    fn submit(&self, upload: Upload) -> Result<Vec<u8>> {
        self.limiter.acquire();
        self.inner.submit(upload)
    }
}
