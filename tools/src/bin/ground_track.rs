// cargo run --bin ground-track --release -- --tle tracker/test_fixtures/iss.txt --duration 86400 --dt 30 /tmp/ground_track.txt

use clap::Parser;
use std::fs::File;
use std::io::prelude::*;
use std::path::PathBuf;

use tracker_lib::{
    propagator::{Propagator, PropagatorConfig},
    sampler::GroundTrack,
    source::{TleSource, DEFAULT_TIMEOUT},
    units::{Time, Timestamp},
};

/// Write the sub-satellite point over time
#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
    /// TLE source: an http(s) URL, a file URL or a path
    #[arg(long)]
    tle: String,

    /// Satellite name, required when the source holds several element sets
    #[arg(short = 's', long)]
    satellite: Option<String>,

    /// Start as POSIX seconds, defaults to the TLE epoch
    #[arg(long, allow_negative_numbers = true)]
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

    let start = match opts.start {
        Some(secs) => Timestamp::from_posix_secs(secs).ok_or("Invalid start time")?,
        None => propagator.epoch(),
    };
    let end = start + Time::from_secs(opts.duration);

    let mut output = File::create(opts.output)?;
    for point in GroundTrack::new(&propagator, start, end, Time::from_secs(opts.dt))? {
        let point = point?;
        writeln!(
            &mut output,
            "{} {} {} {}",
            (point.at - start).as_secs(),
            point.position.latitude,
            point.position.longitude,
            point.position.altitude,
        )?;
    }

    Ok(())
}
