use crate::{
    predictor::{self, OngoingPass, PredictorConfig},
    propagator::PropagatorConfig,
    source::{self, SourceUri, TleSource},
    units::Time,
};
use serde::Deserialize;
use std::{fs, path::Path};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SOURCE_URI: &str = "https://live.ariss.org/iss.txt";
pub const DEFAULT_SATELLITE: &str = "ISS (ZARYA)";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}'. {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file. {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid duration '{value}' for '{key}'. {source}")]
    Duration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("Invalid configuration. {0}")]
    Invalid(String),
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub source: Source,
    pub propagator: Propagator,
    pub predictor: Predictor,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Source {
    pub uri: Option<String>,
    pub satellite: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Propagator {
    /// A duration, or 'none' to disable the staleness guard
    pub max_tle_age: Option<String>,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Predictor {
    pub coarse_step: Option<String>,
    pub precision: Option<String>,
    pub max_search_window: Option<String>,
    pub ongoing_pass: Option<OngoingPass>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_str_checked(&content)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(cfg)
    }

    pub fn from_str_checked(s: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(s)?;

        cfg.source_uri()?;
        cfg.source_timeout()?;
        cfg.propagator_config()?;
        let predictor = cfg.predictor_config()?;
        predictor::validate_config(&predictor).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(cfg)
    }

    pub fn source_uri(&self) -> Result<SourceUri, ConfigError> {
        self.source
            .uri
            .as_deref()
            .unwrap_or(DEFAULT_SOURCE_URI)
            .parse()
            .map_err(|e: crate::Error| ConfigError::Invalid(e.to_string()))
    }

    pub fn satellite(&self) -> Option<String> {
        match self.source.satellite.as_deref() {
            None => Some(DEFAULT_SATELLITE.to_owned()),
            // An empty name means the text holds a single set
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s.to_owned()),
        }
    }

    pub fn source_timeout(&self) -> Result<std::time::Duration, ConfigError> {
        match self.source.timeout.as_deref() {
            Some(s) => Ok(source::timeout_from(duration("source.timeout", s)?)),
            None => Ok(source::DEFAULT_TIMEOUT),
        }
    }

    pub fn tle_source(&self) -> Result<TleSource, ConfigError> {
        Ok(TleSource::new(self.satellite(), self.source_timeout()?))
    }

    pub fn propagator_config(&self) -> Result<PropagatorConfig, ConfigError> {
        let max_tle_age = match self.propagator.max_tle_age.as_deref().map(str::trim) {
            None => PropagatorConfig::default().max_tle_age,
            Some(s) if s.eq_ignore_ascii_case("none") => None,
            Some(s) => Some(duration("propagator.max-tle-age", s)?),
        };
        Ok(PropagatorConfig { max_tle_age })
    }

    pub fn predictor_config(&self) -> Result<PredictorConfig, ConfigError> {
        let defaults = PredictorConfig::default();
        let p = &self.predictor;
        Ok(PredictorConfig {
            coarse_step: optional_duration("predictor.coarse-step", &p.coarse_step)?
                .unwrap_or(defaults.coarse_step),
            precision: optional_duration("predictor.precision", &p.precision)?
                .unwrap_or(defaults.precision),
            max_search_window: optional_duration(
                "predictor.max-search-window",
                &p.max_search_window,
            )?
            .unwrap_or(defaults.max_search_window),
            ongoing_pass: p.ongoing_pass.unwrap_or(defaults.ongoing_pass),
        })
    }
}

fn duration(key: &'static str, value: &str) -> Result<Time, ConfigError> {
    humantime::parse_duration(value.trim())
        .map(Time::from)
        .map_err(|source| ConfigError::Duration {
            key,
            value: value.to_owned(),
            source,
        })
}

fn optional_duration(
    key: &'static str,
    value: &Option<String>,
) -> Result<Option<Time>, ConfigError> {
    value.as_deref().map(|v| duration(key, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use indoc::indoc;
    use std::path::PathBuf;

    const FULL_CONFIG_TOML: &str = indoc! {r#"
        [source]
        uri = "file:///var/lib/tracker/stations.txt"
        satellite = "ISS (ZARYA)"
        timeout = "10s"

        [propagator]
        max-tle-age = "14days"

        [predictor]
        coarse-step = "20s"
        precision = "50ms"
        max-search-window = "2days"
        ongoing-pass = "skip"
    "#};

    #[test]
    fn full_config() {
        let cfg = Config::from_str_checked(FULL_CONFIG_TOML).unwrap();
        assert_eq!(
            cfg.source_uri().unwrap(),
            SourceUri::File(PathBuf::from("/var/lib/tracker/stations.txt"))
        );
        assert_eq!(cfg.satellite().as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(
            cfg.source_timeout().unwrap(),
            std::time::Duration::from_secs(10)
        );

        let prop = cfg.propagator_config().unwrap();
        assert_relative_eq!(prop.max_tle_age.unwrap().as_secs(), 14.0 * 86_400.0);

        let pred = cfg.predictor_config().unwrap();
        assert_relative_eq!(pred.coarse_step.as_secs(), 20.0);
        assert_relative_eq!(pred.precision.as_secs(), 0.05);
        assert_relative_eq!(pred.max_search_window.as_secs(), 2.0 * 86_400.0);
        assert_eq!(pred.ongoing_pass, OngoingPass::Skip);
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_str_checked("").unwrap();
        assert!(matches!(cfg.source_uri().unwrap(), SourceUri::Http(_)));
        assert_eq!(cfg.satellite().as_deref(), Some(DEFAULT_SATELLITE));
        assert_eq!(cfg.source_timeout().unwrap(), source::DEFAULT_TIMEOUT);
        assert_eq!(cfg.propagator_config().unwrap(), PropagatorConfig::default());
        assert_eq!(cfg.predictor_config().unwrap(), PredictorConfig::default());
    }

    #[test]
    fn staleness_guard_disabled() {
        const TOML: &str = indoc! {r#"
            [propagator]
            max-tle-age = "none"
        "#};
        let cfg = Config::from_str_checked(TOML).unwrap();
        assert_eq!(cfg.propagator_config().unwrap().max_tle_age, None);
    }

    #[test]
    fn single_set_source() {
        const TOML: &str = indoc! {r#"
            [source]
            uri = "test_fixtures/iss.txt"
            satellite = ""
        "#};
        let cfg = Config::from_str_checked(TOML).unwrap();
        assert_eq!(cfg.satellite(), None);
        assert_eq!(
            cfg.source_uri().unwrap(),
            SourceUri::File(PathBuf::from("test_fixtures/iss.txt"))
        );
    }

    #[test]
    fn bad_duration() {
        const TOML: &str = indoc! {r#"
            [predictor]
            coarse-step = "thirty seconds"
        "#};
        assert!(matches!(
            Config::from_str_checked(TOML),
            Err(ConfigError::Duration {
                key: "predictor.coarse-step",
                ..
            })
        ));
    }

    #[test]
    fn precision_coarser_than_step() {
        const TOML: &str = indoc! {r#"
            [predictor]
            coarse-step = "10s"
            precision = "1m"
        "#};
        assert!(matches!(
            Config::from_str_checked(TOML),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_ongoing_pass_policy() {
        const TOML: &str = indoc! {r#"
            [predictor]
            ongoing-pass = "sometimes"
        "#};
        assert!(matches!(
            Config::from_str_checked(TOML),
            Err(ConfigError::Toml(_))
        ));
    }
}
