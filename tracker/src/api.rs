//! Operations exposed to the HTTP layer.
//!
//! Query parameters arrive as POSIX seconds and degrees; everything is validated here
//! before reaching the propagator.

use crate::{
    error::{Error, Result},
    observer::{self, ObserverLocation},
    predictor::{PassoverInterval, Predictor, PredictorConfig},
    propagator::{Propagator, PropagatorConfig},
    sampler::GroundTrack,
    source::TleSource,
    units::{Length, Time, Timestamp},
};
use serde::Serialize;
use std::sync::Arc;

/// Largest trajectory returned in a single response
pub const MAX_TRAJECTORY_POINTS: usize = 100_000;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LatLon {
    pub latitude: f64,
    pub longitude: f64,
}

/// Wire form of a [`PassoverInterval`], instants as POSIX seconds
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PassResponse {
    pub entry: f64,
    pub exit: f64,
    pub midpoint: f64,
    pub max_elevation: f64,
    pub max_elevation_at: f64,
}

impl From<&PassoverInterval> for PassResponse {
    fn from(p: &PassoverInterval) -> Self {
        PassResponse {
            entry: p.entry.as_posix_secs(),
            exit: p.exit.as_posix_secs(),
            midpoint: p.midpoint.as_posix_secs(),
            max_elevation: p.max_elevation.as_degrees(),
            max_elevation_at: p.max_elevation_at.as_posix_secs(),
        }
    }
}

/// Owns the handle to the TLE source, passed to every request handler
#[derive(Debug, Clone)]
pub struct Tracker {
    source: Arc<TleSource>,
    propagator_config: PropagatorConfig,
    predictor_config: PredictorConfig,
}

impl Tracker {
    pub fn new(
        source: Arc<TleSource>,
        propagator_config: PropagatorConfig,
        predictor_config: PredictorConfig,
    ) -> Self {
        Tracker {
            source,
            propagator_config,
            predictor_config,
        }
    }

    /// Built from the current snapshot, so a concurrent reload never mixes element sets
    pub fn propagator(&self) -> Result<Propagator> {
        let tle = self.source.current()?;
        Propagator::new(&tle, &self.propagator_config)
    }

    pub fn iss_location(&self, instant: f64) -> Result<LatLon> {
        let at = timestamp("instant", instant)?;
        let pos = self.propagator()?.position(at)?;
        Ok(LatLon {
            latitude: pos.latitude,
            longitude: pos.longitude,
        })
    }

    pub fn trajectory(&self, start: f64, end: f64, step: f64) -> Result<Vec<LatLon>> {
        let start = timestamp("start", start)?;
        let end = timestamp("end", end)?;
        let propagator = self.propagator()?;
        let track = GroundTrack::new(&propagator, start, end, Time::from_secs(step))?;
        if track.remaining() > MAX_TRAJECTORY_POINTS {
            return Err(Error::invalid(format!(
                "trajectory would hold {} points, limit is {MAX_TRAJECTORY_POINTS}",
                track.remaining()
            )));
        }
        track
            .map(|p| {
                p.map(|p| LatLon {
                    latitude: p.position.latitude,
                    longitude: p.position.longitude,
                })
            })
            .collect()
    }

    pub fn next_pass_over(
        &self,
        latitude: f64,
        longitude: f64,
        search_start: f64,
    ) -> Result<PassResponse> {
        let observer = ObserverLocation::new(latitude, longitude, Length::from_meters(0.0))?;
        let start = timestamp("search start", search_start)?;
        let pass = self.next_pass(&observer, start)?;
        Ok(PassResponse::from(&pass))
    }

    pub fn next_pass(
        &self,
        observer: &ObserverLocation,
        search_start: Timestamp,
    ) -> Result<PassoverInterval> {
        self.next_pass_within(observer, search_start, self.predictor_config.max_search_window)
    }

    pub fn next_pass_within(
        &self,
        observer: &ObserverLocation,
        search_start: Timestamp,
        window: Time,
    ) -> Result<PassoverInterval> {
        let propagator = self.propagator()?;
        Predictor::new(&propagator, observer, &self.predictor_config)?
            .next_pass_within(search_start, window)
    }

    pub fn passes(
        &self,
        observer: &ObserverLocation,
        start: Timestamp,
        window: Time,
    ) -> Result<Vec<PassoverInterval>> {
        let propagator = self.propagator()?;
        Predictor::new(&propagator, observer, &self.predictor_config)?.passes(start, window)
    }
}

/// A POSIX timestamp query parameter
pub fn timestamp(name: &str, secs: f64) -> Result<Timestamp> {
    Timestamp::from_posix_secs(secs)
        .ok_or_else(|| Error::invalid(format!("{name} {secs} is not a valid POSIX timestamp")))
}

/// Latitude/longitude query parameters
pub fn coordinates(latitude: f64, longitude: f64) -> Result<LatLon> {
    observer::validate_coordinates(latitude, longitude)?;
    Ok(LatLon {
        latitude,
        longitude,
    })
}
