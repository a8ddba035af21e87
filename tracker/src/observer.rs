use crate::{
    error::{Error, Result},
    units::{Angle, Length},
};
use na::{Matrix3, Vector3};
use nav_types::{ECEF, WGS84};
use serde::Serialize;

/// A point on the ground from which passes are predicted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObserverLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// [deg]
    pub latitude: f64,

    /// [deg]
    pub longitude: f64,

    /// Height above the WGS-84 ellipsoid, [m]
    pub elevation: f64,
}

impl ObserverLocation {
    pub fn new(latitude: f64, longitude: f64, elevation: Length) -> Result<Self> {
        validate_coordinates(latitude, longitude)?;
        if !elevation.as_meters().is_finite() {
            return Err(Error::invalid(format!(
                "elevation {:?} is not finite",
                elevation
            )));
        }
        Ok(ObserverLocation {
            name: None,
            latitude,
            longitude,
            elevation: elevation.as_meters(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn frame(&self) -> Topocentric {
        Topocentric::new(self)
    }
}

/// Latitude within ±90° and longitude within ±180°, both finite
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::invalid(format!(
            "latitude {latitude} must be a finite value within ±90°"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::invalid(format!(
            "longitude {longitude} must be a finite value within ±180°"
        )));
    }
    Ok(())
}

/// Where the satellite appears from the observer
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LookAngles {
    /// Above the local horizontal plane
    pub elevation: Angle,

    /// Clockwise from north
    pub azimuth: Angle,

    pub range: Length,
}

/// Observer-centered East-North-Up frame
#[derive(Debug, Clone)]
pub struct Topocentric {
    origin: Vector3<f64>,
    ecef_to_enu: Matrix3<f64>,
}

impl Topocentric {
    pub fn new(observer: &ObserverLocation) -> Self {
        let wgs = WGS84::from_degrees_and_meters(
            observer.latitude,
            observer.longitude,
            observer.elevation,
        );
        let ecef = ECEF::from(wgs);

        let (sin_lat, cos_lat) = observer.latitude.to_radians().sin_cos();
        let (sin_lon, cos_lon) = observer.longitude.to_radians().sin_cos();
        #[rustfmt::skip]
        let ecef_to_enu = Matrix3::new(
            -sin_lon,           cos_lon,           0.0,
            -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat,
            cos_lat * cos_lon,  cos_lat * sin_lon,  sin_lat,
        );

        Topocentric {
            origin: Vector3::new(ecef.x(), ecef.y(), ecef.z()),
            ecef_to_enu,
        }
    }

    /// `target` is an Earth-fixed position, [m]
    pub fn look(&self, target: &Vector3<f64>) -> LookAngles {
        let range = target - self.origin;
        let enu = self.ecef_to_enu * range;
        let dist = enu.norm();
        LookAngles {
            elevation: Angle::from_radians((enu.z / dist).clamp(-1.0, 1.0).asin()),
            azimuth: Angle::from_radians(enu.x.atan2(enu.y).rem_euclid(std::f64::consts::TAU)),
            range: Length::from_meters(dist),
        }
    }

    pub fn elevation(&self, target: &Vector3<f64>) -> Angle {
        self.look(target).elevation
    }
}
