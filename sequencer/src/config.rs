//! Generator configuration
//!
//! Everything tunable lives here: sentinel values, delays, catalog locations,
//! logging and the equipment profiles themselves. A configuration file is
//! optional; every field falls back to the values the rigs were tuned with.

use crate::error::ConfigurationError;
use crate::profiles::{builtin_profiles, EquipmentProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "sharpseq.json";

/// Delays (seconds) emitted between directives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    /// `DELAY` before still mode at session start and before each target
    #[serde(default = "default_setup_delay_secs")]
    pub setup_delay_secs: u32,
    /// After each solve-and-sync
    #[serde(default = "default_post_solve_delay_secs")]
    pub post_solve_delay_secs: u32,
    /// Between stopping any previous guiding and starting again
    #[serde(default = "default_guiding_stop_delay_secs")]
    pub guiding_stop_delay_secs: u32,
    /// After guiding starts, before capturing
    #[serde(default = "default_guiding_settle_secs")]
    pub guiding_settle_secs: u32,
    /// After a filter wheel move
    #[serde(default = "default_wheel_settle_secs")]
    pub wheel_settle_secs: u32,
    /// After park and unpark when re-anchoring for flexure
    #[serde(default = "default_park_settle_secs")]
    pub park_settle_secs: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            setup_delay_secs: 1,
            post_solve_delay_secs: 10,
            guiding_stop_delay_secs: 5,
            guiding_settle_secs: 20,
            wheel_settle_secs: 20,
            park_settle_secs: 10,
        }
    }
}

fn default_setup_delay_secs() -> u32 {
    1
}

fn default_post_solve_delay_secs() -> u32 {
    10
}

fn default_guiding_stop_delay_secs() -> u32 {
    5
}

fn default_guiding_settle_secs() -> u32 {
    20
}

fn default_wheel_settle_secs() -> u32 {
    20
}

fn default_park_settle_secs() -> u32 {
    10
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Cooler temperature that means "no cooling requested"
    #[serde(default = "default_cooler_disabled_sentinel")]
    pub cooler_disabled_sentinel: i32,

    /// `TOLERANCE` of the cool-down directive
    #[serde(default = "default_cooler_tolerance")]
    pub cooler_tolerance: u32,

    /// Gain used for platesolve exposures
    #[serde(default = "default_platesolve_gain")]
    pub platesolve_gain: u32,

    /// How far (degrees) the equator-assisted solve moves towards the equator
    #[serde(default = "default_equator_assist_offset_deg")]
    pub equator_assist_offset_deg: f64,

    #[serde(default)]
    pub timings: Timings,

    /// Extension appended to output file names that have none
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// CSV catalog: name, RA h, RA m, RA s, Dec d, Dec m, Dec s
    #[serde(default = "default_catalog_path")]
    pub catalog_path: Option<PathBuf>,

    /// Optional plain-text list of catalog names shown before lookup
    #[serde(default)]
    pub catalog_listing_path: Option<PathBuf>,

    /// Log filter directive, e.g. `warn` or `sharpseq_sequencer=debug`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Write logs to daily files in this directory instead of stderr
    #[serde(default)]
    pub log_directory: Option<PathBuf>,

    #[serde(default = "builtin_profiles")]
    pub profiles: Vec<EquipmentProfile>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cooler_disabled_sentinel: default_cooler_disabled_sentinel(),
            cooler_tolerance: default_cooler_tolerance(),
            platesolve_gain: default_platesolve_gain(),
            equator_assist_offset_deg: default_equator_assist_offset_deg(),
            timings: Timings::default(),
            output_extension: default_output_extension(),
            catalog_path: default_catalog_path(),
            catalog_listing_path: None,
            log_level: default_log_level(),
            log_directory: None,
            profiles: builtin_profiles(),
        }
    }
}

fn default_cooler_disabled_sentinel() -> i32 {
    100
}

fn default_cooler_tolerance() -> u32 {
    1
}

fn default_platesolve_gain() -> u32 {
    100
}

fn default_equator_assist_offset_deg() -> f64 {
    20.0
}

fn default_output_extension() -> String {
    "scs".to_string()
}

fn default_catalog_path() -> Option<PathBuf> {
    Some(PathBuf::from("catalog.csv"))
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl GeneratorConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            tracing::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config = Self::from_json(&text).map_err(|e| match e {
            ConfigurationError::Malformed { reason, .. } => ConfigurationError::Malformed {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        tracing::info!(
            "Loaded configuration from {} ({} profiles)",
            path.display(),
            config.profiles.len()
        );
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(text).map_err(|e| ConfigurationError::Malformed {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.profiles.is_empty() {
            return Err(ConfigurationError::NoProfiles);
        }
        for profile in &self.profiles {
            profile.validate()?;
        }
        if !(0.0..=90.0).contains(&self.equator_assist_offset_deg) {
            return Err(ConfigurationError::InvalidValue {
                field: "equator_assist_offset_deg".to_string(),
                reason: format!("must be between 0 and 90, got {}", self.equator_assist_offset_deg),
            });
        }
        if self.output_extension.trim().is_empty() {
            return Err(ConfigurationError::InvalidValue {
                field: "output_extension".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Output path for the operator's file name.
    ///
    /// The output extension is appended unless the name already ends with it
    /// (any case); other dotted suffixes such as dates are kept as part of the name.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        let name = file_name.trim();
        let extension = self.output_extension.trim_start_matches('.');
        let has_extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if has_extension {
            PathBuf::from(name)
        } else {
            PathBuf::from(format!("{}.{}", name, extension))
        }
    }
}
