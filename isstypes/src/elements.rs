use derive_more::Display;
use serde::Serialize;

/// Mean orbital elements at the TLE epoch, as encoded on line 2
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Display, Serialize)]
#[display(
    fmt = "{{i: {}°, raan: {}°, e: {}, argp: {}°, M: {}°, n: {} rev/day}}",
    inclination_deg,
    raan_deg,
    eccentricity,
    argument_of_perigee_deg,
    mean_anomaly_deg,
    mean_motion
)]
pub struct MeanElements {
    /// Inclination, [deg]
    pub inclination_deg: f64,

    /// Right ascension of the ascending node, [deg]
    pub raan_deg: f64,

    /// Eccentricity, dimensionless
    pub eccentricity: f64,

    /// Argument of perigee, [deg]
    pub argument_of_perigee_deg: f64,

    /// Mean anomaly, [deg]
    pub mean_anomaly_deg: f64,

    /// Mean motion, [rev/day]
    pub mean_motion: f64,
}

impl MeanElements {
    /// Orbital period in minutes
    pub fn period_minutes(&self) -> f64 {
        1440.0 / self.mean_motion
    }
}

/// Drag related terms from line 1
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, Default, Serialize)]
pub struct DragTerms {
    /// First derivative of mean motion divided by two, [rev/day²]
    pub mean_motion_dot: f64,

    /// Second derivative of mean motion divided by six, [rev/day³]
    pub mean_motion_ddot: f64,

    /// B* drag term, [1/earth radii]
    pub bstar: f64,
}
