use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;

use tracker_lib::{
    api::{self, PassResponse, Tracker},
    config::{Config, DEFAULT_SOURCE_URI},
    observer::ObserverLocation,
    units::{Length, Time, Timestamp},
    ErrorBody,
};

#[derive(Parser, Debug)]
#[command(version)]
struct Opts {
    /// Configuration toml file.
    ///
    /// Built-in defaults are used when not provided.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TLE source: an http(s) URL, a file URL or a path.
    /// Overrides the configured source.
    #[arg(long)]
    tle: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sub-satellite point at an instant
    Location {
        /// POSIX seconds, defaults to now
        #[arg(long)]
        at: Option<f64>,
    },

    /// Sub-satellite points from start (inclusive) to end (exclusive)
    #[command(allow_negative_numbers = true)]
    Trajectory {
        /// POSIX seconds
        #[arg(long)]
        start: f64,

        /// POSIX seconds
        #[arg(long)]
        end: f64,

        /// Seconds between points
        #[arg(long, default_value_t = 60.0)]
        step: f64,
    },

    /// The next time the station is above the horizon of a location
    #[command(allow_negative_numbers = true)]
    NextPass {
        #[command(flatten)]
        observer: ObserverArgs,

        /// POSIX seconds, defaults to now
        #[arg(long)]
        start: Option<f64>,

        /// How far ahead to look for the pass to begin, e.g. '12h'.
        /// Defaults to the configured maximum search window.
        #[arg(long, value_parser = humantime::parse_duration)]
        window: Option<Duration>,
    },

    /// Every pass over a location beginning within a window
    #[command(allow_negative_numbers = true)]
    Passes {
        #[command(flatten)]
        observer: ObserverArgs,

        /// POSIX seconds, defaults to now
        #[arg(long)]
        start: Option<f64>,

        #[arg(long, value_parser = humantime::parse_duration, default_value = "24h")]
        window: Duration,
    },
}

#[derive(clap::Args, Debug)]
struct ObserverArgs {
    /// Observer latitude, [deg]
    #[arg(long)]
    lat: f64,

    /// Observer longitude, [deg]
    #[arg(long)]
    lon: f64,

    /// Observer height above the WGS-84 ellipsoid, [m]
    #[arg(long, default_value_t = 0.0)]
    elevation: f64,
}

impl ObserverArgs {
    fn location(&self) -> tracker_lib::Result<ObserverLocation> {
        ObserverLocation::new(self.lat, self.lon, Length::from_meters(self.elevation))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let opts = Opts::parse();

    let cfg = match opts.config.as_ref() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let uri = opts
        .tle
        .clone()
        .or_else(|| cfg.source.uri.clone())
        .unwrap_or_else(|| DEFAULT_SOURCE_URI.to_owned());
    let source = Arc::new(cfg.tle_source()?);
    let tracker = Tracker::new(
        source.clone(),
        cfg.propagator_config()?,
        cfg.predictor_config()?,
    );

    let result = source
        .load(&uri)
        .map_err(Box::<dyn std::error::Error>::from)
        .and_then(|tle| {
            info!(satellite = %tle.name, epoch = %tle.epoch, "Tracking");
            run(&tracker, opts.command)
        });

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            if let Some(core) = e.downcast_ref::<tracker_lib::Error>() {
                println!("{}", serde_json::to_string_pretty(&ErrorBody::from(core))?);
            }
            Err(e)
        }
    }
}

fn run(
    tracker: &Tracker,
    command: Command,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let now = Timestamp::now().as_posix_secs();
    let value = match command {
        Command::Location { at } => {
            serde_json::to_value(tracker.iss_location(at.unwrap_or(now))?)?
        }
        Command::Trajectory { start, end, step } => {
            serde_json::to_value(tracker.trajectory(start, end, step)?)?
        }
        Command::NextPass {
            observer,
            start,
            window,
        } => {
            let observer = observer.location()?;
            let start = api::timestamp("start", start.unwrap_or(now))?;
            let pass = match window {
                Some(w) => tracker.next_pass_within(&observer, start, Time::from(w))?,
                None => tracker.next_pass(&observer, start)?,
            };
            serde_json::to_value(PassResponse::from(&pass))?
        }
        Command::Passes {
            observer,
            start,
            window,
        } => {
            let observer = observer.location()?;
            let start = api::timestamp("start", start.unwrap_or(now))?;
            let passes: Vec<PassResponse> = tracker
                .passes(&observer, start, Time::from(window))?
                .iter()
                .map(PassResponse::from)
                .collect();
            serde_json::to_value(passes)?
        }
    };
    Ok(value)
}
