//! Time scalar for the animation engine.
//!
//! A single signed 64-bit nanosecond value is shared by every timestamp and
//! duration in the engine: keyframe times, animation offsets, and the
//! engine's own global clock.

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Rem, Sub};

/// A signed nanosecond timestamp or duration.
///
/// Monotonic in practice; arithmetic is ordinary signed 64-bit arithmetic
/// and is never checked against overflow, matching the source's `int64_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Time(i64);

impl Time {
    /// One second, in nanoseconds.
    pub const SECOND: Time = Time(1_000_000_000);
    /// One millisecond, in nanoseconds.
    pub const MSECOND: Time = Time(1_000_000);
    /// The zero timestamp.
    pub const ZERO: Time = Time(0);

    /// Creates a time value from a raw nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Creates a time value from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * Self::SECOND.0)
    }

    /// Creates a time value from whole milliseconds.
    #[must_use]
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms * Self::MSECOND.0)
    }

    /// Returns the raw nanosecond count.
    #[must_use]
    pub const fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Returns the value as fractional seconds.
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / Self::SECOND.0 as f64
    }
}

impl Add for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Time {
        Time(self.0 + rhs.0)
    }
}

impl AddAssign for Time {
    fn add_assign(&mut self, rhs: Time) {
        self.0 += rhs.0;
    }
}

impl Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Time {
        Time(self.0 - rhs.0)
    }
}

impl Mul<i64> for Time {
    type Output = Time;

    fn mul(self, rhs: i64) -> Time {
        Time(self.0 * rhs)
    }
}

impl Div<i64> for Time {
    type Output = Time;

    fn div(self, rhs: i64) -> Time {
        Time(self.0 / rhs)
    }
}

impl Rem for Time {
    type Output = Time;

    fn rem(self, rhs: Time) -> Time {
        Time(self.0 % rhs.0)
    }
}

/// Renders `u:hh:mm:ss.nnnnnnnnn`, matching `ETCH_TIME_FORMAT` from the
/// original source (hours unbounded, the rest zero-padded).
impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ns = self.0;
        let secs_total = total_ns / Self::SECOND.0;
        let nanos = (total_ns % Self::SECOND.0).unsigned_abs();
        let hours = secs_total / 3600;
        let minutes = (secs_total / 60) % 60;
        let seconds = secs_total % 60;
        write!(f, "u:{hours:02}:{minutes:02}:{seconds:02}.{nanos:09}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_nanosecond_scale() {
        assert_eq!(Time::SECOND.as_nanos(), 1_000_000_000);
        assert_eq!(Time::MSECOND.as_nanos(), 1_000_000);
    }

    #[test]
    fn arithmetic_is_ordinary_signed() {
        let a = Time::from_secs(1);
        let b = Time::from_millis(500);
        assert_eq!((a + b).as_nanos(), 1_500_000_000);
        assert_eq!((a - b).as_nanos(), 500_000_000);
    }

    #[test]
    fn display_formats_hh_mm_ss_nanos() {
        let t = Time::from_secs(3661) + Time::from_nanos(123_456_789);
        assert_eq!(t.to_string(), "u:01:01:01.123456789");
    }
}
