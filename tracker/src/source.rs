//! Holds the current element set and replaces it on demand

use crate::{
    error::{Error, Result},
    propagator::{Propagator, PropagatorConfig},
    units::Time,
};
use isstypes::prelude::TleRecord;
use std::{
    fmt, fs,
    path::PathBuf,
    str::FromStr,
    sync::{Arc, PoisonError, RwLock},
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where TLE text is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUri {
    Http(Url),
    File(PathBuf),
}

impl FromStr for SourceUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::SourceUnavailable("empty source URI".to_owned()));
        }
        match Url::parse(s) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(SourceUri::Http(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(SourceUri::File)
                .map_err(|_| Error::SourceUnavailable(format!("'{s}' is not a local file URL"))),
            // Bare paths, including ones with a drive letter that parse as a scheme
            _ => Ok(SourceUri::File(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceUri::Http(url) => write!(f, "{url}"),
            SourceUri::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The process-wide TLE holder.
///
/// Readers get an `Arc` snapshot; a reload swaps the pointer and never mutates a record in place.
#[derive(Debug)]
pub struct TleSource {
    satellite: Option<String>,
    timeout: Duration,
    current: RwLock<Option<Arc<TleRecord>>>,
}

impl Default for TleSource {
    fn default() -> Self {
        TleSource::new(None, DEFAULT_TIMEOUT)
    }
}

impl TleSource {
    /// `satellite` selects an element set by name when the text holds several
    pub fn new(satellite: Option<String>, timeout: Duration) -> Self {
        TleSource {
            satellite,
            timeout,
            current: RwLock::new(None),
        }
    }

    pub fn satellite(&self) -> Option<&str> {
        self.satellite.as_deref()
    }

    /// Fetch, parse and install the element set at `uri`
    pub fn load(&self, uri: &str) -> Result<Arc<TleRecord>> {
        let uri: SourceUri = uri.parse()?;
        info!(%uri, satellite = ?self.satellite, "Loading TLE");
        let start = Instant::now();
        let text = match self.fetch(&uri) {
            Ok(text) => text,
            Err(e) => {
                warn!(%uri, error = %e, "TLE fetch failed");
                return Err(e);
            }
        };
        let record = self.load_text(&text)?;
        debug!(%uri, elapsed = ?start.elapsed(), "TLE load complete");
        Ok(record)
    }

    /// Parse and install TLE text that was obtained elsewhere.
    ///
    /// The current record is kept unless the new one also initializes the SGP4 model.
    pub fn load_text(&self, text: &str) -> Result<Arc<TleRecord>> {
        let record = tleparse::parse_named_tle(text, self.satellite.as_deref())
            .map_err(|e| Error::SourceUnavailable(e.to_string()))?;
        Propagator::new(&record, &PropagatorConfig { max_tle_age: None }).map_err(|e| {
            warn!(satellite = %record.name, error = %e, "Rejected element set");
            match e {
                Error::SourceUnavailable(msg) | Error::PropagationDiverged(msg) => {
                    Error::SourceUnavailable(msg)
                }
                e => e,
            }
        })?;
        Ok(self.install(record))
    }

    /// Replace the current record
    pub fn install(&self, record: TleRecord) -> Arc<TleRecord> {
        info!(
            satellite = %record.name,
            norad_id = record.norad_id,
            epoch = %record.epoch,
            "Installed TLE"
        );
        let record = Arc::new(record);
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(record.clone());
        record
    }

    pub fn current(&self) -> Result<Arc<TleRecord>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotInitialized)
    }

    fn fetch(&self, uri: &SourceUri) -> Result<String> {
        match uri {
            SourceUri::Http(url) => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(self.timeout)
                    .build()
                    .map_err(|e| {
                        Error::SourceUnavailable(format!("Failed to create HTTP client: {e}"))
                    })?;
                let response = client
                    .get(url.clone())
                    .send()
                    .map_err(|e| Error::SourceUnavailable(format!("GET {url}: {e}")))?;
                if !response.status().is_success() {
                    return Err(Error::SourceUnavailable(format!(
                        "GET {url}: status {}",
                        response.status()
                    )));
                }
                response
                    .text()
                    .map_err(|e| Error::SourceUnavailable(format!("GET {url}: {e}")))
            }
            SourceUri::File(path) => fs::read_to_string(path)
                .map_err(|e| Error::SourceUnavailable(format!("{}: {e}", path.display()))),
        }
    }
}

/// Timeout from configuration, falling back to the default for non-positive values
pub(crate) fn timeout_from(t: Time) -> Duration {
    if t.is_finite() && t > Time::ZERO {
        Duration::from_secs_f64(t.as_secs())
    } else {
        DEFAULT_TIMEOUT
    }
}
