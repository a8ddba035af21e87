//! End to end: load an element set from disk and answer the HTTP-facing queries

use std::{path::PathBuf, sync::Arc, thread};
use tracker_lib::{
    api::Tracker,
    observer::ObserverLocation,
    predictor::{OngoingPass, PredictorConfig},
    propagator::PropagatorConfig,
    source::{TleSource, DEFAULT_TIMEOUT},
    units::{Length, Time, Timestamp},
    Error,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

fn iss_source() -> Arc<TleSource> {
    let source = TleSource::new(Some("ISS (ZARYA)".to_owned()), DEFAULT_TIMEOUT);
    source
        .load(fixture("stations.txt").to_str().unwrap())
        .unwrap();
    Arc::new(source)
}

#[test]
fn load_from_path_and_file_url() {
    let source = TleSource::default();
    let record = source.load(fixture("iss.txt").to_str().unwrap()).unwrap();
    assert_eq!(record.name, "ISS (ZARYA)");

    let url = format!("file://{}", fixture("iss.txt").display());
    let again = source.load(&url).unwrap();
    assert_eq!(record, again);
}

#[test]
fn several_sets_need_a_name() {
    let source = TleSource::default();
    let err = source
        .load(fixture("stations.txt").to_str().unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert_eq!(err.http_status(), 503);
    assert_eq!(source.current(), Err(Error::NotInitialized));

    let geo = TleSource::new(Some(" geo2 ".to_owned()), DEFAULT_TIMEOUT);
    let record = geo
        .load(fixture("stations.txt").to_str().unwrap())
        .unwrap();
    assert_eq!(record.norad_id, 39120);
}

#[test]
fn queries() {
    let source = iss_source();
    let epoch = Timestamp::from_utc(source.current().unwrap().epoch);
    let tracker = Tracker::new(
        source,
        PropagatorConfig::default(),
        PredictorConfig::default(),
    );

    let start = epoch.as_posix_secs().round();
    let here = tracker.iss_location(start).unwrap();
    let track = tracker.trajectory(start, start + 5400.0, 90.0).unwrap();
    assert_eq!(track.len(), 60);
    assert_eq!(track[0], here);

    // One orbit sweeps the full latitude band
    let max_lat = track.iter().map(|p| p.latitude).fold(f64::MIN, f64::max);
    let min_lat = track.iter().map(|p| p.latitude).fold(f64::MAX, f64::min);
    assert!(max_lat > 45.0 && min_lat < -45.0, "{min_lat}..{max_lat}");

    let pass = tracker.next_pass_over(45.0, -75.0, start).unwrap();
    assert!(start < pass.entry && pass.entry < pass.midpoint && pass.midpoint < pass.exit);
    assert!(pass.max_elevation > 0.0);
}

#[test]
fn ongoing_pass_policies() {
    let source = iss_source();
    let epoch = Timestamp::from_utc(source.current().unwrap().epoch);
    let observer = ObserverLocation::new(45.0, -75.0, Length::from_meters(0.0)).unwrap();

    let include = Tracker::new(
        source.clone(),
        PropagatorConfig::default(),
        PredictorConfig::default(),
    );
    let skip = Tracker::new(
        source,
        PropagatorConfig::default(),
        PredictorConfig {
            ongoing_pass: OngoingPass::Skip,
            ..Default::default()
        },
    );

    let first = include.next_pass(&observer, epoch).unwrap();
    let during = first.entry + Time::from_secs(60.0);

    let current = include.next_pass(&observer, during).unwrap();
    assert!(current.entry < during && during < current.exit);

    let following = skip.next_pass(&observer, during).unwrap();
    assert!(following.entry > first.exit);

    let listed = include
        .passes(&observer, epoch, Time::from_hours(24.0))
        .unwrap();
    assert_eq!(listed[0], first);
    assert!(listed.len() >= 2);
}

#[test]
fn concurrent_readers_during_reload() {
    let source = iss_source();
    let tracker = Tracker::new(
        source.clone(),
        PropagatorConfig::default(),
        PredictorConfig::default(),
    );
    let epoch = Timestamp::from_utc(source.current().unwrap().epoch);
    let at = epoch.as_posix_secs();
    let expected = tracker.iss_location(at).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    assert_eq!(tracker.iss_location(at).unwrap(), expected);
                }
            })
        })
        .collect();
    for _ in 0..20 {
        source
            .load(fixture("iss.txt").to_str().unwrap())
            .unwrap();
    }
    for r in readers {
        r.join().unwrap();
    }
}
