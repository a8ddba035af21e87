//! Passover search: coarse elevation scan, then bisection of the bracketing interval

use crate::{
    error::{Error, Result},
    observer::{ObserverLocation, Topocentric},
    propagator::Propagator,
    units::{Angle, Time, Timestamp},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on coarse scan steps for a single search
pub const MAX_SCAN_STEPS: f64 = 1_000_000.0;

/// Bisection never needs more than this to reach sub-nanosecond width
const MAX_REFINE_ITERATIONS: usize = 64;

/// 1/φ
const INV_GOLDEN_RATIO: f64 = 0.618_033_988_749_894_8;

/// What to report when the satellite is already above the horizon at the search start
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OngoingPass {
    /// The pass in progress, with its entry in the past
    #[default]
    Include,

    /// The first pass that begins after the search start
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    pub coarse_step: Time,
    pub precision: Time,
    pub max_search_window: Time,
    pub ongoing_pass: OngoingPass,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        PredictorConfig {
            coarse_step: Time::from_secs(30.0),
            precision: Time::from_millis(100.0),
            max_search_window: Time::from_hours(24.0),
            ongoing_pass: OngoingPass::Include,
        }
    }
}

/// A continuous interval during which the satellite is at or above the observer's horizon
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PassoverInterval {
    /// Acquisition of signal
    pub entry: Timestamp,

    /// Loss of signal, the first instant after `entry` below the horizon
    pub exit: Timestamp,

    pub midpoint: Timestamp,

    pub max_elevation: Angle,
    pub max_elevation_at: Timestamp,
}

impl PassoverInterval {
    pub fn duration(&self) -> Time {
        self.exit - self.entry
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// Predicts passes of one propagated satellite over one observer
#[derive(Debug)]
pub struct Predictor<'a> {
    propagator: &'a Propagator,
    observer: &'a ObserverLocation,
    frame: Topocentric,
    config: &'a PredictorConfig,
}

impl<'a> Predictor<'a> {
    pub fn new(
        propagator: &'a Propagator,
        observer: &'a ObserverLocation,
        config: &'a PredictorConfig,
    ) -> Result<Self> {
        validate_config(config)?;
        Ok(Predictor {
            propagator,
            observer,
            frame: observer.frame(),
            config,
        })
    }

    pub fn elevation(&self, at: Timestamp) -> Result<Angle> {
        let state = self.propagator.state(at)?;
        Ok(self.frame.elevation(&state.ecef))
    }

    pub fn is_visible(&self, at: Timestamp) -> Result<bool> {
        Ok(self.elevation(at)?.as_degrees() >= 0.0)
    }

    /// The next pass within the configured maximum search window
    pub fn next_pass(&self, search_start: Timestamp) -> Result<PassoverInterval> {
        self.next_pass_within(search_start, self.config.max_search_window)
    }

    /// The next pass whose entry is found within `window` of `search_start`.
    ///
    /// The exit search is bounded by the configured maximum search window.
    pub fn next_pass_within(
        &self,
        search_start: Timestamp,
        window: Time,
    ) -> Result<PassoverInterval> {
        self.check_budget(window)?;
        let not_found = || Error::NoPassFound {
            start: search_start,
            window_secs: window.as_secs(),
        };

        let entry = if self.is_visible(search_start)? {
            match self.config.ongoing_pass {
                OngoingPass::Include => {
                    let (visible, hidden) = self
                        .find_transition(search_start, true, Direction::Backward, window)?
                        .ok_or_else(not_found)?;
                    self.refine(visible, hidden)?.0
                }
                OngoingPass::Skip => {
                    let (visible, hidden) = self
                        .find_transition(search_start, true, Direction::Forward, window)?
                        .ok_or_else(not_found)?;
                    let exit = self.refine(visible, hidden)?.1;
                    let remaining = window - (exit - search_start);
                    self.find_rise(exit, remaining)?.ok_or_else(not_found)?
                }
            }
        } else {
            self.find_rise(search_start, window)?.ok_or_else(not_found)?
        };

        let (visible, hidden) = self
            .find_transition(entry, true, Direction::Forward, self.config.max_search_window)?
            .ok_or(Error::NoPassFound {
                start: entry,
                window_secs: self.config.max_search_window.as_secs(),
            })?;
        let exit = self.refine(visible, hidden)?.1;

        let (max_elevation_at, max_elevation) = self.max_elevation(entry, exit)?;
        let pass = PassoverInterval {
            entry,
            exit,
            midpoint: entry.midpoint(exit),
            max_elevation,
            max_elevation_at,
        };
        debug!(
            observer = ?self.observer.name,
            %search_start,
            entry = %pass.entry,
            exit = %pass.exit,
            max_elevation = pass.max_elevation.as_degrees(),
            "Found pass"
        );
        Ok(pass)
    }

    /// The pass reported for `start` and every later one entering before `start + window`
    pub fn passes(&self, start: Timestamp, window: Time) -> Result<Vec<PassoverInterval>> {
        self.check_budget(window)?;
        let end = start + window;
        let mut passes = Vec::new();
        let mut from = start;
        let mut remaining = window;
        loop {
            let pass = match self.next_pass_within(from, remaining) {
                Ok(p) => p,
                Err(Error::NoPassFound { .. }) => break,
                Err(e) => return Err(e),
            };
            if pass.entry >= end {
                break;
            }
            from = pass.exit;
            passes.push(pass);
            remaining = end - from;
            if remaining <= Time::ZERO {
                break;
            }
        }
        Ok(passes)
    }

    fn check_budget(&self, window: Time) -> Result<()> {
        if !window.is_finite() || window <= Time::ZERO {
            return Err(Error::invalid(format!(
                "search window must be a positive number of seconds, got {}",
                window.as_secs()
            )));
        }
        let steps = window / self.config.coarse_step;
        if steps > MAX_SCAN_STEPS {
            return Err(Error::invalid(format!(
                "search window of {} s needs {steps:.0} scan steps, limit is {MAX_SCAN_STEPS}",
                window.as_secs()
            )));
        }
        Ok(())
    }

    /// Entry of the first rise after `from`, which must be below the horizon
    fn find_rise(&self, from: Timestamp, limit: Time) -> Result<Option<Timestamp>> {
        if limit <= Time::ZERO {
            return Ok(None);
        }
        match self.find_transition(from, false, Direction::Forward, limit)? {
            Some((hidden, visible)) => Ok(Some(self.refine(visible, hidden)?.0)),
            None => Ok(None),
        }
    }

    /// Steps away from `from` until visibility differs from `visible`, the bound evaluated last.
    ///
    /// Returns the last instant with the original visibility and the first one without.
    fn find_transition(
        &self,
        from: Timestamp,
        visible: bool,
        direction: Direction,
        limit: Time,
    ) -> Result<Option<(Timestamp, Timestamp)>> {
        let step = self.config.coarse_step * direction.sign();
        let bound = from + limit * direction.sign();
        let mut prev = from;
        loop {
            let mut next = prev + step;
            let at_bound = match direction {
                Direction::Forward => next >= bound,
                Direction::Backward => next <= bound,
            };
            if at_bound {
                next = bound;
            }
            if self.is_visible(next)? != visible {
                return Ok(Some((prev, next)));
            }
            if at_bound {
                return Ok(None);
            }
            prev = next;
        }
    }

    /// Narrows a horizon crossing to the configured precision, returns `(visible, hidden)`
    fn refine(
        &self,
        mut visible: Timestamp,
        mut hidden: Timestamp,
    ) -> Result<(Timestamp, Timestamp)> {
        for _ in 0..MAX_REFINE_ITERATIONS {
            if (visible - hidden).abs() <= self.config.precision {
                break;
            }
            let mid = visible.midpoint(hidden);
            if mid == visible || mid == hidden {
                break;
            }
            if self.is_visible(mid)? {
                visible = mid;
            } else {
                hidden = mid;
            }
        }
        Ok((visible, hidden))
    }

    /// Golden-section search for the culmination between `entry` and `exit`
    fn max_elevation(&self, entry: Timestamp, exit: Timestamp) -> Result<(Timestamp, Angle)> {
        let mut a = entry;
        let mut b = exit;
        let mut c = b - (b - a) * INV_GOLDEN_RATIO;
        let mut d = a + (b - a) * INV_GOLDEN_RATIO;
        let mut ec = self.elevation(c)?;
        let mut ed = self.elevation(d)?;
        for _ in 0..MAX_REFINE_ITERATIONS {
            if (b - a) <= self.config.precision {
                break;
            }
            if ec.as_degrees() > ed.as_degrees() {
                b = d;
                d = c;
                ed = ec;
                c = b - (b - a) * INV_GOLDEN_RATIO;
                ec = self.elevation(c)?;
            } else {
                a = c;
                c = d;
                ec = ed;
                d = a + (b - a) * INV_GOLDEN_RATIO;
                ed = self.elevation(d)?;
            }
        }

        let mut best = if ec.as_degrees() > ed.as_degrees() {
            (c, ec)
        } else {
            (d, ed)
        };
        let entry_elevation = self.elevation(entry)?;
        if entry_elevation.as_degrees() > best.1.as_degrees() {
            best = (entry, entry_elevation);
        }
        Ok(best)
    }
}

/// Checks the step sizes are usable before any search
pub fn validate_config(config: &PredictorConfig) -> Result<()> {
    for (name, value) in [
        ("coarse step", config.coarse_step),
        ("precision", config.precision),
        ("max search window", config.max_search_window),
    ] {
        if !value.is_finite() || value <= Time::ZERO {
            return Err(Error::invalid(format!(
                "{name} must be a positive number of seconds, got {}",
                value.as_secs()
            )));
        }
    }
    if config.precision >= config.coarse_step {
        return Err(Error::invalid(format!(
            "precision ({} s) must be finer than the coarse step ({} s)",
            config.precision.as_secs(),
            config.coarse_step.as_secs()
        )));
    }
    Ok(())
}

/// Shorthand for building a [`Predictor`] and calling [`Predictor::next_pass`]
pub fn next_pass(
    propagator: &Propagator,
    observer: &ObserverLocation,
    search_start: Timestamp,
    config: &PredictorConfig,
) -> Result<PassoverInterval> {
    Predictor::new(propagator, observer, config)?.next_pass(search_start)
}
