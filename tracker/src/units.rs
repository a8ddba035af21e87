//! A lightweight uom-ish set of quantities used by the tracker.

use chrono::{TimeZone, Utc};
use isstypes::time::UtcTimestamp;
use serde::Serialize;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// J2000.0 (2000-01-01T12:00:00 UTC) as POSIX seconds
const J2000_POSIX_SECS: i64 = 946_728_000;

#[derive(Copy, Clone, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Length {
    meters: f64,
}

impl std::fmt::Debug for Length {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} m", self.meters)
    }
}

impl Length {
    pub fn from_meters(meters: f64) -> Length {
        Length { meters }
    }

    pub fn as_meters(&self) -> f64 {
        self.meters
    }

    pub fn as_kilometers(&self) -> f64 {
        self.meters / 1000.0
    }
}

/// A UTC instant with nanosecond resolution
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct Timestamp {
    utc: UtcTimestamp,
}

impl std::fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.utc)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.utc)
    }
}

impl From<UtcTimestamp> for Timestamp {
    fn from(utc: UtcTimestamp) -> Self {
        Timestamp::from_utc(utc)
    }
}

impl Timestamp {
    pub fn epoch() -> Timestamp {
        Timestamp::from_utc(UtcTimestamp::default())
    }

    pub fn now() -> Timestamp {
        Timestamp::from_utc(Utc::now())
    }

    pub fn from_utc(utc: UtcTimestamp) -> Timestamp {
        Timestamp { utc }
    }

    /// Fractional POSIX seconds; `None` when not finite or outside chrono's range
    pub fn from_posix_secs(secs: f64) -> Option<Timestamp> {
        if !secs.is_finite() || secs.abs() >= i64::MAX as f64 {
            return None;
        }
        let whole = secs.floor();
        let mut nanos = ((secs - whole) * NANOS_PER_SEC).round() as i64;
        let mut whole = whole as i64;
        if nanos >= NANOS_PER_SEC as i64 {
            whole += 1;
            nanos -= NANOS_PER_SEC as i64;
        }
        Utc.timestamp_opt(whole, nanos as u32)
            .single()
            .map(Timestamp::from_utc)
    }

    pub fn as_utc(&self) -> &UtcTimestamp {
        &self.utc
    }

    pub fn as_posix_secs(&self) -> f64 {
        self.utc.timestamp() as f64 + self.utc.timestamp_subsec_nanos() as f64 / NANOS_PER_SEC
    }

    /// Days elapsed since J2000.0, UTC standing in for UT1
    pub fn days_since_j2000(&self) -> f64 {
        let secs = (self.utc.timestamp() - J2000_POSIX_SECS) as f64
            + self.utc.timestamp_subsec_nanos() as f64 / NANOS_PER_SEC;
        secs / 86_400.0
    }

    /// The instant halfway between `self` and `other`
    pub fn midpoint(&self, other: Timestamp) -> Timestamp {
        *self + (other - *self) / 2.0
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Time;

    fn sub(self, rhs: Timestamp) -> Self::Output {
        Time::from_chrono_duration(*self.as_utc() - *rhs.as_utc())
    }
}

impl Add<Time> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Time) -> Self::Output {
        let mut ts = self;
        ts += rhs;
        ts
    }
}

impl AddAssign<Time> for Timestamp {
    fn add_assign(&mut self, rhs: Time) {
        self.utc += chrono::Duration::nanoseconds(rhs.as_nanos());
    }
}

impl Sub<Time> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Time) -> Self::Output {
        let mut ts = self;
        ts -= rhs;
        ts
    }
}

impl SubAssign<Time> for Timestamp {
    fn sub_assign(&mut self, rhs: Time) {
        self.utc -= chrono::Duration::nanoseconds(rhs.as_nanos());
    }
}

/// A signed duration
#[derive(Copy, Clone, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Time {
    seconds: f64,
}

impl std::fmt::Debug for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} s", self.seconds)
    }
}

impl From<std::time::Duration> for Time {
    fn from(d: std::time::Duration) -> Self {
        Time::from_secs(d.as_secs_f64())
    }
}

impl Time {
    pub const ZERO: Time = Time { seconds: 0.0 };

    pub fn from_chrono_duration(duration: chrono::Duration) -> Time {
        match duration.num_nanoseconds() {
            Some(ns) => Time::from_secs(ns as f64 / NANOS_PER_SEC),
            // Beyond ~292 years, millisecond resolution is plenty
            None => Time::from_millis(duration.num_milliseconds() as f64),
        }
    }

    pub fn from_days(days: f64) -> Time {
        Self::from_hours(days * 24.0)
    }

    pub fn from_hours(hours: f64) -> Time {
        Self::from_minutes(hours * 60.0)
    }

    pub fn from_minutes(minutes: f64) -> Time {
        Self::from_secs(minutes * 60.0)
    }

    pub fn from_secs(seconds: f64) -> Time {
        Time { seconds }
    }

    pub fn from_millis(millis: f64) -> Time {
        Time {
            seconds: millis / 1000.0,
        }
    }

    pub fn as_secs(&self) -> f64 {
        self.seconds
    }

    pub fn as_minutes(&self) -> f64 {
        self.seconds / 60.0
    }

    /// Rounded to the nearest nanosecond
    pub fn as_nanos(&self) -> i64 {
        (self.seconds * NANOS_PER_SEC).round() as i64
    }

    pub fn abs(&self) -> Time {
        Time {
            seconds: self.seconds.abs(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.seconds.is_finite()
    }
}

impl Add<Time> for Time {
    type Output = Time;

    fn add(self, rhs: Time) -> Self::Output {
        Time::from_secs(self.as_secs() + rhs.as_secs())
    }
}

impl AddAssign<Time> for Time {
    fn add_assign(&mut self, rhs: Time) {
        self.seconds += rhs.as_secs()
    }
}

impl Sub<Time> for Time {
    type Output = Time;

    fn sub(self, rhs: Time) -> Self::Output {
        Time::from_secs(self.as_secs() - rhs.as_secs())
    }
}

impl Div<Time> for Time {
    type Output = f64;

    fn div(self, rhs: Time) -> Self::Output {
        self.as_secs() / rhs.as_secs()
    }
}

impl Div<f64> for Time {
    type Output = Time;

    fn div(self, rhs: f64) -> Self::Output {
        Time::from_secs(self.as_secs() / rhs)
    }
}

impl Mul<f64> for Time {
    type Output = Time;

    fn mul(self, rhs: f64) -> Self::Output {
        Time::from_secs(self.as_secs() * rhs)
    }
}

#[derive(Copy, Clone, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Angle {
    degrees: f64,
}

impl std::fmt::Debug for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees)
    }
}

impl Angle {
    pub fn from_degrees(degrees: f64) -> Angle {
        Angle { degrees }
    }

    pub fn from_radians(radians: f64) -> Angle {
        Angle {
            degrees: radians.to_degrees(),
        }
    }

    pub fn as_degrees(&self) -> f64 {
        self.degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn posix_round_trip() {
        let t = Timestamp::from_posix_secs(1_700_000_000.25).unwrap();
        assert_eq!(t.as_utc().timestamp(), 1_700_000_000);
        assert_eq!(t.as_utc().timestamp_subsec_millis(), 250);
        assert_relative_eq!(t.as_posix_secs(), 1_700_000_000.25);

        let before_epoch = Timestamp::from_posix_secs(-0.5).unwrap();
        assert_eq!(before_epoch.as_utc().timestamp(), -1);
        assert_eq!(before_epoch.as_utc().timestamp_subsec_millis(), 500);
    }

    #[test]
    fn posix_rejects_non_finite() {
        assert!(Timestamp::from_posix_secs(f64::NAN).is_none());
        assert!(Timestamp::from_posix_secs(f64::INFINITY).is_none());
        assert!(Timestamp::from_posix_secs(1e300).is_none());
    }

    #[test]
    fn timestamp_arithmetic() {
        let t0 = Timestamp::from_posix_secs(0.0).unwrap();
        let t1 = t0 + Time::from_secs(0.1) * 3.0;
        assert_eq!(t1.as_utc().timestamp_subsec_nanos(), 300_000_000);
        assert_relative_eq!((t1 - t0).as_secs(), 0.3);
        assert_relative_eq!((t0 - t1).as_secs(), -0.3);
        assert_eq!(t0.midpoint(t1), t0 + Time::from_millis(150.0));
        assert_eq!(t1 - Time::from_secs(0.3), t0);
    }

    #[test]
    fn j2000() {
        let t = Timestamp::from_posix_secs(J2000_POSIX_SECS as f64).unwrap();
        assert_relative_eq!(t.days_since_j2000(), 0.0);
        let t = t + Time::from_days(1.5);
        assert_relative_eq!(t.days_since_j2000(), 1.5);
    }
}
