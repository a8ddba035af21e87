//! SGP4 propagation from a TLE to an Earth-fixed state and its sub-satellite point

use crate::{
    error::{Error, Result},
    units::{Length, Time, Timestamp},
};
use isstypes::prelude::TleRecord;
use na::Vector3;
use nav_types::{ECEF, WGS84};
use serde::Serialize;
use std::f64::consts::TAU;
use tracing::warn;

/// Staleness bound applied when none is configured
pub const DEFAULT_MAX_TLE_AGE_DAYS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PropagatorConfig {
    /// Propagating further than this from the TLE epoch is refused, `None` disables the guard
    pub max_tle_age: Option<Time>,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        PropagatorConfig {
            max_tle_age: Some(Time::from_days(DEFAULT_MAX_TLE_AGE_DAYS)),
        }
    }
}

/// Sub-satellite point on the WGS-84 ellipsoid
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct GeodeticPosition {
    /// [deg], in (-90, 90]
    pub latitude: f64,

    /// [deg], in (-180, 180]
    pub longitude: f64,

    /// Height above the ellipsoid, [m]
    pub altitude: f64,
}

impl GeodeticPosition {
    pub fn altitude(&self) -> Length {
        Length::from_meters(self.altitude)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EarthFixedState {
    pub at: Timestamp,

    /// Position in the TEME frame, [km]
    pub teme: Vector3<f64>,

    /// Position in the Earth-fixed frame, [m]
    pub ecef: Vector3<f64>,

    pub position: GeodeticPosition,
}

/// Initialized SGP4 model for a single element set
pub struct Propagator {
    name: String,
    epoch: Timestamp,
    max_tle_age: Option<Time>,
    constants: sgp4::Constants,
}

impl std::fmt::Debug for Propagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Propagator")
            .field("name", &self.name)
            .field("epoch", &self.epoch)
            .field("max_tle_age", &self.max_tle_age)
            .finish_non_exhaustive()
    }
}

impl Propagator {
    pub fn new(tle: &TleRecord, config: &PropagatorConfig) -> Result<Self> {
        let elements = sgp4::Elements::from_tle(
            Some(tle.name.clone()),
            tle.raw.line1.as_bytes(),
            tle.raw.line2.as_bytes(),
        )
        .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", tle.name)))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| Error::PropagationDiverged(format!("{}: {e}", tle.name)))?;

        Ok(Propagator {
            name: tle.name.clone(),
            epoch: Timestamp::from_utc(tle.epoch),
            max_tle_age: config.max_tle_age,
            constants,
        })
    }

    pub fn epoch(&self) -> Timestamp {
        self.epoch
    }

    pub fn position(&self, at: Timestamp) -> Result<GeodeticPosition> {
        Ok(self.state(at)?.position)
    }

    pub fn state(&self, at: Timestamp) -> Result<EarthFixedState> {
        let since_epoch = at - self.epoch;
        if let Some(max_age) = self.max_tle_age {
            if since_epoch.abs() > max_age {
                warn!(
                    satellite = %self.name,
                    %at,
                    epoch = %self.epoch,
                    "Refusing to propagate beyond the TLE staleness bound"
                );
                return Err(Error::PropagationDiverged(format!(
                    "{at} is {:.1} days from the {} epoch {}, limit is {:.1} days",
                    since_epoch.abs().as_secs() / 86_400.0,
                    self.name,
                    self.epoch,
                    max_age.as_secs() / 86_400.0,
                )));
            }
        }

        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(since_epoch.as_minutes()))
            .map_err(|e| Error::PropagationDiverged(format!("{} at {at}: {e}", self.name)))?;

        let teme = Vector3::from(prediction.position);
        if !teme.iter().all(|c| c.is_finite()) {
            return Err(Error::PropagationDiverged(format!(
                "{} at {at}: non-finite position",
                self.name
            )));
        }

        let ecef = teme_to_ecef(&teme, gmst(at)) * 1000.0;
        let wgs = WGS84::from(ECEF::new(ecef.x, ecef.y, ecef.z));

        Ok(EarthFixedState {
            at,
            teme,
            ecef,
            position: GeodeticPosition {
                latitude: normalize_latitude(wgs.latitude_degrees()),
                longitude: normalize_longitude(wgs.longitude_degrees()),
                altitude: wgs.altitude(),
            },
        })
    }
}

/// Geodetic position of `tle` at `at` with the default staleness bound
pub fn position(tle: &TleRecord, at: Timestamp) -> Result<GeodeticPosition> {
    Propagator::new(tle, &PropagatorConfig::default())?.position(at)
}

/// Earth-fixed state of `tle` at `at` with the default staleness bound
pub fn state(tle: &TleRecord, at: Timestamp) -> Result<EarthFixedState> {
    Propagator::new(tle, &PropagatorConfig::default())?.state(at)
}

/// Greenwich mean sidereal time (IAU-82), [rad] in [0, 2π)
pub fn gmst(at: Timestamp) -> f64 {
    let t = at.days_since_j2000() / 36_525.0;
    let secs = -6.2e-6 * t * t * t
        + 0.093104 * t * t
        + (876_600.0 * 3600.0 + 8_640_184.812866) * t
        + 67_310.54841;
    // 240 seconds of sidereal time per degree
    (secs.to_radians() / 240.0).rem_euclid(TAU)
}

/// Rotate about z by the sidereal angle, polar motion ignored
fn teme_to_ecef(teme: &Vector3<f64>, gmst: f64) -> Vector3<f64> {
    let (sin, cos) = gmst.sin_cos();
    Vector3::new(
        cos * teme.x + sin * teme.y,
        -sin * teme.x + cos * teme.y,
        teme.z,
    )
}

pub(crate) fn normalize_longitude(deg: f64) -> f64 {
    let lon = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if lon <= -180.0 {
        180.0
    } else {
        lon
    }
}

/// Southernmost reported latitude, a fraction of a millimetre north of the pole
const MIN_LATITUDE: f64 = -89.999_999_999;

/// Into (-90, 90], the south pole itself is reported as [`MIN_LATITUDE`]
pub(crate) fn normalize_latitude(deg: f64) -> f64 {
    deg.clamp(MIN_LATITUDE, 90.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{iss, iss_epoch};
    use approx::assert_relative_eq;

    /// Angular distance between two longitudes, [deg]
    fn lon_diff(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn ranges_over_an_orbit() {
        let tle = iss();
        let prop = Propagator::new(&tle, &PropagatorConfig::default()).unwrap();
        let mut at = iss_epoch();
        for _ in 0..200 {
            let pos = prop.position(at).unwrap();
            assert!(pos.latitude > -90.0 && pos.latitude <= 90.0, "{pos:?}");
            assert!(pos.longitude > -180.0 && pos.longitude <= 180.0, "{pos:?}");
            // Never higher than the inclination
            assert!(pos.latitude.abs() < 52.0, "{pos:?}");
            assert!(
                pos.altitude().as_kilometers() > 300.0 && pos.altitude().as_kilometers() < 450.0,
                "{pos:?}"
            );
            at += Time::from_secs(30.0);
        }
    }

    #[test]
    fn deterministic() {
        let tle = iss();
        let at = iss_epoch() + Time::from_secs(1234.567);
        let a = position(&tle, at).unwrap();
        let b = position(&tle, at).unwrap();
        assert_eq!(a.latitude.to_bits(), b.latitude.to_bits());
        assert_eq!(a.longitude.to_bits(), b.longitude.to_bits());
        assert_eq!(a.altitude.to_bits(), b.altitude.to_bits());
    }

    #[test]
    fn sub_satellite_point_at_epoch() {
        let tle = iss();
        let el = tle.elements;
        let i = el.inclination_deg.to_radians();
        let m = el.mean_anomaly_deg.to_radians();
        let e = el.eccentricity;
        // Near-circular, first order equation of center
        let nu = m + 2.0 * e * m.sin();
        let u = el.argument_of_perigee_deg.to_radians() + nu;

        let expected_lat = (i.sin() * u.sin()).asin().to_degrees();
        let right_ascension = el.raan_deg.to_radians() + (i.cos() * u.sin()).atan2(u.cos());
        let expected_lon = normalize_longitude((right_ascension - gmst(iss_epoch())).to_degrees());

        let pos = position(&tle, iss_epoch()).unwrap();
        assert!(
            (pos.latitude - expected_lat).abs() < 1.0,
            "{} vs {expected_lat}",
            pos.latitude
        );
        assert!(
            lon_diff(pos.longitude, expected_lon) < 1.0,
            "{} vs {expected_lon}",
            pos.longitude
        );
    }

    #[test]
    fn ecef_matches_geodetic() {
        let s = state(&iss(), iss_epoch() + Time::from_minutes(10.0)).unwrap();
        let back = ECEF::from(WGS84::from_degrees_and_meters(
            s.position.latitude,
            s.position.longitude,
            s.position.altitude,
        ));
        assert_relative_eq!(back.x(), s.ecef.x, epsilon = 0.1);
        assert_relative_eq!(back.y(), s.ecef.y, epsilon = 0.1);
        assert_relative_eq!(back.z(), s.ecef.z, epsilon = 0.1);
        assert_relative_eq!(s.teme.norm() * 1000.0, s.ecef.norm(), max_relative = 1e-12);
    }

    #[test]
    fn stale_tle() {
        let tle = iss();
        let at = iss_epoch() + Time::from_days(31.0);
        assert!(matches!(
            position(&tle, at),
            Err(Error::PropagationDiverged(_))
        ));
        let at = iss_epoch() - Time::from_days(31.0);
        assert!(matches!(
            position(&tle, at),
            Err(Error::PropagationDiverged(_))
        ));

        let unbounded = Propagator::new(&tle, &PropagatorConfig { max_tle_age: None }).unwrap();
        assert!(unbounded.position(iss_epoch() + Time::from_days(5.0)).is_ok());
    }

    #[test]
    fn gmst_reference() {
        // Vallado example 3-5: 1992-08-20 12:14 UT1 -> 152.578787810°
        let at = Timestamp::from_posix_secs(714_312_840.0).unwrap();
        assert_relative_eq!(gmst(at).to_degrees(), 152.578_787_81, epsilon = 1e-4);
    }

    #[test]
    fn longitude_normalization() {
        assert_relative_eq!(normalize_longitude(180.0), 180.0);
        assert_relative_eq!(normalize_longitude(-180.0), 180.0);
        assert_relative_eq!(normalize_longitude(190.0), -170.0);
        assert_relative_eq!(normalize_longitude(-190.0), 170.0);
        assert_relative_eq!(normalize_longitude(540.0), 180.0);
        assert_relative_eq!(normalize_longitude(12.5), 12.5);
    }

    #[test]
    fn latitude_normalization() {
        assert_eq!(normalize_latitude(90.0), 90.0);
        assert_eq!(normalize_latitude(90.000_001), 90.0);
        assert_eq!(normalize_latitude(45.5), 45.5);
        for south in [-90.0, -90.000_001] {
            let lat = normalize_latitude(south);
            assert!(lat > -90.0 && lat < -89.999_999, "{lat}");
        }
    }

    #[test]
    fn teme_reference_vectors() {
        // Vanguard 1 from the SGP4 verification set (Vallado et al., "Revisiting Spacetrack
        // Report #3"). Reference output uses WGS-72 constants, this model uses WGS-84.
        let tle = tleparse::parse_named_tle(
            indoc::indoc! {"
                1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753
                2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667
            "},
            None,
        )
        .unwrap();
        let epoch = Timestamp::from_utc(tle.epoch);
        let expected = [
            (0.0, Vector3::new(7022.46529266, -1400.08296755, 0.03995155)),
            (
                360.0,
                Vector3::new(-7154.03120202, -3783.17682504, -3536.19412294),
            ),
        ];
        for (minutes, teme_km) in expected {
            let s = state(&tle, epoch + Time::from_minutes(minutes)).unwrap();
            let error_km = (s.teme - teme_km).norm();
            assert!(error_km < 1.0, "{error_km} km off at {minutes} min");
        }
    }
}
