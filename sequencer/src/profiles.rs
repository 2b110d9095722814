//! Equipment profiles and capture parameter tables
//!
//! Every rig the generator knows about is described by an [`EquipmentProfile`]:
//! its parameter table (one [`FilterEntry`] per supported filter) plus the
//! rules that used to live in separate per-rig scripts (target name suffixes,
//! platesolve passes, flexure caps, first-target allowance).

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optical filter in front of the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    UvIr,
    LPro,
    LEnhance,
    D1,
    D2,
    Luminance,
    Red,
    Green,
    Blue,
    Sii,
    Ha,
    Oiii,
    NoFilter,
}

/// Spectral band of a filter, used to pick SharpCap profiles and flexure caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Broadband,
    Narrowband,
}

impl FilterKind {
    /// Menu label
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::UvIr => "UV/IR",
            FilterKind::LPro => "L-Pro",
            FilterKind::LEnhance => "L-Enhance",
            FilterKind::D1 => "D1",
            FilterKind::D2 => "D2",
            FilterKind::Luminance => "Luminance",
            FilterKind::Red => "Red",
            FilterKind::Green => "Green",
            FilterKind::Blue => "Blue",
            FilterKind::Sii => "SII",
            FilterKind::Ha => "Ha",
            FilterKind::Oiii => "OIII",
            FilterKind::NoFilter => "None",
        }
    }

    /// Short token appended to target names on filter wheel rigs
    pub fn code(&self) -> &'static str {
        match self {
            FilterKind::UvIr => "UVIR",
            FilterKind::LPro => "LPRO",
            FilterKind::LEnhance => "LENH",
            FilterKind::D1 => "D1",
            FilterKind::D2 => "D2",
            FilterKind::Luminance => "L",
            FilterKind::Red => "R",
            FilterKind::Green => "G",
            FilterKind::Blue => "B",
            FilterKind::Sii => "SII",
            FilterKind::Ha => "Ha",
            FilterKind::Oiii => "OIII",
            FilterKind::NoFilter => "N",
        }
    }

    pub fn band(&self) -> Band {
        match self {
            FilterKind::LEnhance
            | FilterKind::D1
            | FilterKind::D2
            | FilterKind::Sii
            | FilterKind::Ha
            | FilterKind::Oiii => Band::Narrowband,
            _ => Band::Broadband,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What the operator picks from the filter menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChoice {
    Single(FilterKind),
    /// Red, green and blue captured back to back under one solved position
    RgbCompound,
}

/// Channels imaged in RGB compound mode, in capture order
pub const RGB_CHANNELS: [FilterKind; 3] = [FilterKind::Red, FilterKind::Green, FilterKind::Blue];

impl FilterChoice {
    pub fn label(&self) -> &'static str {
        match self {
            FilterChoice::Single(filter) => filter.label(),
            FilterChoice::RgbCompound => "RGB (compound)",
        }
    }

    /// Filter whose table entry drives exposure, dither and frame count
    pub fn primary(&self) -> FilterKind {
        match self {
            FilterChoice::Single(filter) => *filter,
            FilterChoice::RgbCompound => FilterKind::Red,
        }
    }

    /// Filters captured for this choice, in order
    pub fn channels(&self) -> Vec<FilterKind> {
        match self {
            FilterChoice::Single(filter) => vec![*filter],
            FilterChoice::RgbCompound => RGB_CHANNELS.to_vec(),
        }
    }
}

/// Exposure settings derived from (profile, filter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureParameters {
    /// Light frame exposure in seconds
    pub exposure_secs: u32,
    /// Short exposure used for platesolving
    pub platesolve_exposure_secs: u32,
    /// Wall-clock seconds consumed per frame, including download and dither overhead
    pub seconds_per_frame: f64,
    /// Frames between dithers
    pub dither_every_frames: u32,
}

/// One row of a profile's parameter table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub filter: FilterKind,
    #[serde(flatten)]
    pub params: CaptureParameters,
    /// SharpCap capture profile loaded for this filter
    #[serde(default)]
    pub sharpcap_profile: Option<String>,
    /// Filter wheel slot holding this filter
    #[serde(default)]
    pub wheel_position: Option<u8>,
    /// Overrides the filter's own band, e.g. a broadband filter run with narrowband exposures
    #[serde(default)]
    pub band: Option<Band>,
}

impl FilterEntry {
    pub fn band(&self) -> Band {
        self.band.unwrap_or_else(|| self.filter.band())
    }
}

/// Filter wheel positions used outside the imaging filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterWheel {
    /// Slot used while platesolving
    pub solve_position: u8,
    /// Slot the wheel returns to at shutdown
    pub home_position: u8,
}

/// Camera type of the rig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorKind {
    /// Colour camera; filters are swapped by hand and selected through SharpCap profiles
    OneShotColor,
    /// Monochrome camera behind a filter wheel
    Mono { wheel: FilterWheel },
}

/// How the mount position is corrected before guiding starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlatesolveStrategy {
    /// One solve-and-sync at the target
    Single,
    /// Several solve-and-sync passes at the target
    Repeated { passes: u8 },
    /// Slew to a position nearer the equator, solve there, then slew to the
    /// target and solve twice
    EquatorAssisted,
}

impl PlatesolveStrategy {
    /// Number of solve-and-sync passes at the true target position
    pub fn passes_at_target(&self) -> u8 {
        match self {
            PlatesolveStrategy::Single => 1,
            PlatesolveStrategy::Repeated { passes } => (*passes).max(1),
            PlatesolveStrategy::EquatorAssisted => 2,
        }
    }
}

/// Maximum frames per capture block before the mount is re-anchored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexureCaps {
    pub broadband: u32,
    pub narrowband: u32,
}

impl FlexureCaps {
    pub fn cap_for(&self, band: Band) -> u32 {
        match band {
            Band::Broadband => self.broadband,
            Band::Narrowband => self.narrowband,
        }
    }
}

/// Descriptor of a telescope + camera combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentProfile {
    /// Menu label
    pub name: String,
    pub sensor: SensorKind,
    /// Value for `SET COLOUR SPACE TO`
    pub colour_space: String,
    /// Cooler ramp rate in degrees per minute
    pub cooler_rate: u32,
    /// Delay after a slew before anything else happens
    pub slew_settle_secs: u32,
    pub platesolve: PlatesolveStrategy,
    /// Setup minutes deducted from the first target so the session stops on time
    #[serde(default)]
    pub first_target_setup_minutes: Option<f64>,
    #[serde(default)]
    pub flexure_caps: Option<FlexureCaps>,
    /// Ask for the filter again for every target
    #[serde(default)]
    pub filter_per_target: bool,
    /// Offer the RGB compound mode in the filter menu
    #[serde(default)]
    pub rgb_compound: bool,
    pub filters: Vec<FilterEntry>,
}

impl EquipmentProfile {
    pub fn filter_wheel(&self) -> Option<&FilterWheel> {
        match &self.sensor {
            SensorKind::Mono { wheel } => Some(wheel),
            SensorKind::OneShotColor => None,
        }
    }

    pub fn uses_filter_wheel(&self) -> bool {
        self.filter_wheel().is_some()
    }

    pub fn supports(&self, filter: FilterKind) -> bool {
        self.filters.iter().any(|e| e.filter == filter)
    }

    /// Table row for a filter
    pub fn entry(&self, filter: FilterKind) -> Result<&FilterEntry, ConfigurationError> {
        self.filters
            .iter()
            .find(|e| e.filter == filter)
            .ok_or_else(|| ConfigurationError::UnsupportedFilter {
                profile: self.name.clone(),
                filter: filter.label().to_string(),
            })
    }

    /// Capture parameters for a filter on this rig
    pub fn capture_parameters(&self, filter: FilterKind) -> Result<&CaptureParameters, ConfigurationError> {
        self.entry(filter).map(|e| &e.params)
    }

    /// Wheel slot for a filter; errors on wheel rigs without one
    pub fn wheel_position(&self, filter: FilterKind) -> Result<u8, ConfigurationError> {
        self.entry(filter)?
            .wheel_position
            .ok_or_else(|| ConfigurationError::MissingWheelPosition {
                profile: self.name.clone(),
                filter: filter.label().to_string(),
            })
    }

    /// Flexure cap for the band of `filter`, if the rig re-anchors during long captures
    pub fn block_cap(&self, filter: FilterKind) -> Option<u32> {
        let caps = self.flexure_caps.as_ref()?;
        let band = self.entry(filter).map(|e| e.band()).unwrap_or_else(|_| filter.band());
        Some(caps.cap_for(band))
    }

    /// Entries of the filter menu, in table order
    pub fn filter_choices(&self) -> Vec<FilterChoice> {
        let mut choices: Vec<FilterChoice> = self
            .filters
            .iter()
            .map(|e| FilterChoice::Single(e.filter))
            .collect();
        if self.rgb_compound && RGB_CHANNELS.iter().all(|f| self.supports(*f)) {
            choices.push(FilterChoice::RgbCompound);
        }
        choices
    }

    /// Check the descriptor is complete for every selectable filter
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.filters.is_empty() {
            return Err(ConfigurationError::EmptyProfile(self.name.clone()));
        }
        for entry in &self.filters {
            let params = &entry.params;
            if !params.seconds_per_frame.is_finite() || params.seconds_per_frame <= 0.0 {
                return Err(ConfigurationError::InvalidValue {
                    field: format!("{}.{}.seconds_per_frame", self.name, entry.filter.label()),
                    reason: format!("must be positive, got {}", params.seconds_per_frame),
                });
            }
            match self.sensor {
                SensorKind::OneShotColor if entry.sharpcap_profile.is_none() => {
                    return Err(ConfigurationError::MissingProfileName {
                        profile: self.name.clone(),
                        filter: entry.filter.label().to_string(),
                    });
                }
                SensorKind::Mono { .. } if entry.wheel_position.is_none() => {
                    return Err(ConfigurationError::MissingWheelPosition {
                        profile: self.name.clone(),
                        filter: entry.filter.label().to_string(),
                    });
                }
                _ => {}
            }
        }
        if let Some(caps) = &self.flexure_caps {
            if caps.broadband == 0 || caps.narrowband == 0 {
                return Err(ConfigurationError::InvalidValue {
                    field: format!("{}.flexure_caps", self.name),
                    reason: "caps must be at least one frame".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn entry(
    filter: FilterKind,
    exposure_secs: u32,
    platesolve_exposure_secs: u32,
    seconds_per_frame: f64,
    dither_every_frames: u32,
) -> FilterEntry {
    FilterEntry {
        filter,
        params: CaptureParameters {
            exposure_secs,
            platesolve_exposure_secs,
            seconds_per_frame,
            dither_every_frames,
        },
        sharpcap_profile: None,
        wheel_position: None,
        band: None,
    }
}

fn narrowband(entry: FilterEntry) -> FilterEntry {
    FilterEntry {
        band: Some(Band::Narrowband),
        ..entry
    }
}

fn osc(entry: FilterEntry, profile: &str) -> FilterEntry {
    FilterEntry {
        sharpcap_profile: Some(profile.to_string()),
        ..entry
    }
}

fn wheel(entry: FilterEntry, profile: &str, position: u8) -> FilterEntry {
    FilterEntry {
        sharpcap_profile: Some(profile.to_string()),
        wheel_position: Some(position),
        ..entry
    }
}

/// Rigs known without a configuration file
pub fn builtin_profiles() -> Vec<EquipmentProfile> {
    use FilterKind::*;

    vec![
        EquipmentProfile {
            name: "Orion 130ST".to_string(),
            sensor: SensorKind::OneShotColor,
            colour_space: "RAW16".to_string(),
            cooler_rate: 8,
            slew_settle_secs: 20,
            platesolve: PlatesolveStrategy::Single,
            first_target_setup_minutes: Some(11.0),
            flexure_caps: None,
            filter_per_target: false,
            rgb_compound: false,
            filters: vec![
                osc(entry(UvIr, 30, 4, 35.08, 12), "533 OSC"),
                osc(entry(LPro, 30, 4, 35.08, 12), "533 OSC"),
                osc(entry(LEnhance, 180, 4, 188.0, 6), "533 HO"),
            ],
        },
        EquipmentProfile {
            name: "Towa 339".to_string(),
            sensor: SensorKind::OneShotColor,
            colour_space: "RAW16".to_string(),
            cooler_rate: 8,
            slew_settle_secs: 20,
            platesolve: PlatesolveStrategy::EquatorAssisted,
            first_target_setup_minutes: None,
            flexure_caps: Some(FlexureCaps {
                broadband: 120,
                narrowband: 40,
            }),
            filter_per_target: false,
            rgb_compound: false,
            filters: vec![
                osc(entry(UvIr, 60, 12, 70.16, 10), "533 OSC"),
                osc(narrowband(entry(LPro, 180, 12, 181.73, 6)), "533 HO"),
            ],
        },
        EquipmentProfile {
            name: "C6 (Hyperstar)".to_string(),
            sensor: SensorKind::OneShotColor,
            colour_space: "RAW16".to_string(),
            cooler_rate: 8,
            slew_settle_secs: 20,
            platesolve: PlatesolveStrategy::Single,
            first_target_setup_minutes: None,
            flexure_caps: None,
            filter_per_target: false,
            rgb_compound: false,
            filters: vec![
                osc(entry(UvIr, 30, 1, 35.08, 12), "C6H OSC"),
                osc(entry(LPro, 30, 1, 35.08, 12), "C6H OSC"),
                osc(entry(LEnhance, 120, 2, 133.0, 8), "C6H NB"),
                osc(entry(D1, 240, 4, 247.0, 3), "C6H NB"),
                osc(entry(D2, 240, 4, 247.0, 3), "C6H NB"),
            ],
        },
        EquipmentProfile {
            name: "Carbonstar 150 (Minicam8M)".to_string(),
            sensor: SensorKind::Mono {
                wheel: FilterWheel {
                    solve_position: 1,
                    home_position: 1,
                },
            },
            colour_space: "MONO16".to_string(),
            cooler_rate: 25,
            slew_settle_secs: 20,
            platesolve: PlatesolveStrategy::Repeated { passes: 2 },
            first_target_setup_minutes: None,
            flexure_caps: None,
            filter_per_target: true,
            rgb_compound: true,
            filters: vec![
                wheel(entry(Luminance, 30, 2, 35.08, 20), "MC8_LRGB", 1),
                wheel(entry(Red, 30, 2, 35.08, 20), "MC8_LRGB", 2),
                wheel(entry(Green, 30, 2, 35.08, 20), "MC8_LRGB", 3),
                wheel(entry(Blue, 30, 2, 35.08, 20), "MC8_LRGB", 4),
                wheel(entry(Sii, 180, 2, 190.82, 3), "MC8_NB", 5),
                wheel(entry(Ha, 180, 2, 190.82, 3), "MC8_NB", 6),
                wheel(entry(Oiii, 180, 2, 190.82, 3), "MC8_NB", 7),
                wheel(entry(NoFilter, 2, 2, 35.08, 20), "MC8_NB", 8),
            ],
        },
    ]
}
