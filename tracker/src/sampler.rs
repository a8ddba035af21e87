//! Lazily sampled ground track

use crate::{
    error::{Error, Result},
    propagator::{GeodeticPosition, Propagator},
    units::{Time, Timestamp},
};
use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub at: Timestamp,
    #[serde(flatten)]
    pub position: GeodeticPosition,
}

/// Positions at `start + i * step` for every `i` with `start + i * step < end`.
///
/// Cloning yields an independent sequence from the clone's current point.
#[derive(Debug, Clone)]
pub struct GroundTrack<'a> {
    propagator: &'a Propagator,
    start: Timestamp,
    end: Timestamp,
    step: Time,
    index: u64,
    done: bool,
}

impl<'a> GroundTrack<'a> {
    pub fn new(
        propagator: &'a Propagator,
        start: Timestamp,
        end: Timestamp,
        step: Time,
    ) -> Result<Self> {
        if !step.is_finite() || step <= Time::ZERO {
            return Err(Error::invalid(format!(
                "step must be a positive number of seconds, got {}",
                step.as_secs()
            )));
        }
        Ok(GroundTrack {
            propagator,
            start,
            end,
            step,
            index: 0,
            done: false,
        })
    }

    /// Number of points still to be yielded, errors aside
    pub fn remaining(&self) -> usize {
        if self.done || self.end <= self.start {
            return 0;
        }
        let total = ((self.end - self.start) / self.step).ceil() as u64;
        total.saturating_sub(self.index) as usize
    }
}

impl<'a> Iterator for GroundTrack<'a> {
    type Item = Result<TrackPoint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let at = self.start + self.step * self.index as f64;
        if at >= self.end {
            self.done = true;
            return None;
        }
        self.index += 1;
        match self.propagator.position(at) {
            Ok(position) => Some(Ok(TrackPoint { at, position })),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Shorthand for [`GroundTrack::new`]
pub fn sample(
    propagator: &Propagator,
    start: Timestamp,
    end: Timestamp,
    step: Time,
) -> Result<GroundTrack<'_>> {
    GroundTrack::new(propagator, start, end, step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        propagator::PropagatorConfig,
        test_fixtures::{iss, iss_epoch},
    };

    fn propagator() -> Propagator {
        Propagator::new(&iss(), &PropagatorConfig::default()).unwrap()
    }

    #[test]
    fn empty_when_end_not_after_start() {
        let prop = propagator();
        let t0 = iss_epoch();
        assert_eq!(sample(&prop, t0, t0, Time::from_secs(1.0)).unwrap().count(), 0);
        let before = t0 - Time::from_secs(60.0);
        assert_eq!(
            sample(&prop, t0, before, Time::from_secs(1.0)).unwrap().count(),
            0
        );
    }

    #[test]
    fn point_count_and_values() {
        let prop = propagator();
        let start = iss_epoch();
        let end = start + Time::from_secs(100.0);
        let track = sample(&prop, start, end, Time::from_secs(30.0)).unwrap();
        assert_eq!(track.remaining(), 4);

        let points: Vec<TrackPoint> = track.map(Result::unwrap).collect();
        assert_eq!(points.len(), 4);
        for (i, p) in points.iter().enumerate() {
            let at = start + Time::from_secs(30.0 * i as f64);
            assert_eq!(p.at, at);
            assert_eq!(p.position, prop.position(at).unwrap());
        }

        // Exact multiple excludes the end point
        let track = sample(&prop, start, end, Time::from_secs(25.0)).unwrap();
        assert_eq!(track.count(), 4);
    }

    #[test]
    fn restartable() {
        let prop = propagator();
        let start = iss_epoch();
        let end = start + Time::from_minutes(5.0);
        let mut track = sample(&prop, start, end, Time::from_secs(10.0)).unwrap();
        track.next();
        let snapshot = track.clone();
        let rest: Vec<_> = track.map(Result::unwrap).collect();
        let again: Vec<_> = snapshot.map(Result::unwrap).collect();
        assert_eq!(rest.len(), 29);
        assert_eq!(rest, again);
    }

    #[test]
    fn rejects_bad_step() {
        let prop = propagator();
        let t0 = iss_epoch();
        let t1 = t0 + Time::from_secs(10.0);
        for step in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                sample(&prop, t0, t1, Time::from_secs(step)),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn stops_after_first_failure() {
        let prop = propagator();
        // Crosses the 30 day staleness bound part way through
        let start = iss_epoch() + Time::from_days(30.0) - Time::from_secs(20.0);
        let end = start + Time::from_minutes(10.0);
        let results: Vec<_> = sample(&prop, start, end, Time::from_secs(10.0))
            .unwrap()
            .collect();
        assert_eq!(results.len(), 4);
        assert!(results[..3].iter().all(Result::is_ok));
        assert!(matches!(results[3], Err(Error::PropagationDiverged(_))));
    }
}
