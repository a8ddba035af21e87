// cargo run --bin elevation-profile --release -- --tle tracker/test_fixtures/iss.txt --lat 45 --lon -75 --duration 86400 --dt 10 /tmp/elevation.txt

use clap::Parser;
use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;

use tracker_lib::{
    observer::ObserverLocation,
    propagator::{Propagator, PropagatorConfig},
    source::{TleSource, DEFAULT_TIMEOUT},
    units::{Length, Time, Timestamp},
};

/// Write the elevation and azimuth seen from an observer over time
#[derive(Parser, Debug)]
#[command(version, allow_negative_numbers = true)]
struct Opts {
    /// TLE source: an http(s) URL, a file URL or a path
    #[arg(long)]
    tle: String,

    /// Satellite name, required when the source holds several element sets
    #[arg(short = 's', long)]
    satellite: Option<String>,

    /// Observer latitude, [deg]
    #[arg(long)]
    lat: f64,

    /// Observer longitude, [deg]
    #[arg(long)]
    lon: f64,

    /// Observer height above the WGS-84 ellipsoid, [m]
    #[arg(long, default_value_t = 0.0)]
    elevation: f64,

    /// Start as POSIX seconds, defaults to the TLE epoch
    #[arg(long)]
    start: Option<f64>,

    /// Duration in seconds
    #[arg(short = 'd', long)]
    duration: f64,

    /// Time step (dt)
    #[arg(short = 't', long)]
    dt: f64,

    /// Output file path to write
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();

    let source = TleSource::new(opts.satellite, DEFAULT_TIMEOUT);
    let tle = source.load(&opts.tle)?;
    let propagator = Propagator::new(&tle, &PropagatorConfig { max_tle_age: None })?;
    let observer =
        ObserverLocation::new(opts.lat, opts.lon, Length::from_meters(opts.elevation))?;
    let frame = observer.frame();

    let start = match opts.start {
        Some(secs) => Timestamp::from_posix_secs(secs).ok_or("Invalid start time")?,
        None => propagator.epoch(),
    };
    let dt = Time::from_secs(opts.dt);
    if !dt.is_finite() || dt <= Time::ZERO {
        return Err("dt must be positive".into());
    }

    let mut output = File::create(opts.output)?;
    let mut time = Time::ZERO;
    loop {
        if time.as_secs() >= opts.duration {
            break;
        }

        let at = start + time;
        let state = propagator.state(at)?;
        let look = frame.look(&state.ecef);

        writeln!(
            &mut output,
            "{} {} {} {} {}",
            time.as_secs(),
            look.elevation.as_degrees(),
            look.azimuth.as_degrees(),
            look.range.as_kilometers(),
            u8::from(look.elevation.as_degrees() >= 0.0),
        )?;

        time += dt;
    }

    Ok(())
}
