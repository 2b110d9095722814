//! J2000 equatorial coordinates in sexagesimal form

use serde::{Deserialize, Serialize};
use std::fmt;

/// Right ascension as hours, minutes, seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RightAscension {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

/// Declination as sign, degrees, arcminutes, arcseconds
///
/// The sign is kept apart from the degrees so that `-0 30 00` survives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Declination {
    pub negative: bool,
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub ra: RightAscension,
    pub dec: Declination,
}

fn parse_number<T: std::str::FromStr>(text: &str, what: &str) -> Result<T, String> {
    text.trim()
        .parse::<T>()
        .map_err(|_| format!("'{}' is not a valid {}", text.trim(), what))
}

/// RA hours, 0 to 23
pub fn parse_ra_hours(text: &str) -> Result<u32, String> {
    let hours: u32 = parse_number(text, "hour value")?;
    if hours >= 24 {
        return Err(format!("RA hours must be below 24, got {}", hours));
    }
    Ok(hours)
}

/// Minutes of time or arc, 0 to 59
pub fn parse_minutes(text: &str) -> Result<u32, String> {
    let minutes: u32 = parse_number(text, "minute value")?;
    if minutes >= 60 {
        return Err(format!("Minutes must be below 60, got {}", minutes));
    }
    Ok(minutes)
}

/// Seconds of time or arc, 0 up to (not including) 60
pub fn parse_seconds(text: &str) -> Result<f64, String> {
    let seconds: f64 = parse_number(text, "second value")?;
    if !(0.0..60.0).contains(&seconds) {
        return Err(format!("Seconds must be from 0 to below 60, got {}", seconds));
    }
    Ok(seconds)
}

/// Signed declination degrees, -90 to +90; returns (negative, degrees)
pub fn parse_dec_degrees(text: &str) -> Result<(bool, u32), String> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let degrees: u32 = parse_number(digits, "degree value")?;
    if degrees > 90 {
        return Err(format!("Declination must be within ±90 degrees, got {}", trimmed));
    }
    Ok((negative, degrees))
}

impl Coordinates {
    /// Build from the six textual components RA h, m, s and Dec d, m, s
    pub fn from_components(parts: [&str; 6]) -> Result<Self, String> {
        let (negative, degrees) = parse_dec_degrees(parts[3])?;
        let coords = Self {
            ra: RightAscension {
                hours: parse_ra_hours(parts[0])?,
                minutes: parse_minutes(parts[1])?,
                seconds: parse_seconds(parts[2])?,
            },
            dec: Declination {
                negative,
                degrees,
                minutes: parse_minutes(parts[4])?,
                seconds: parse_seconds(parts[5])?,
            },
        };
        if coords.dec.degrees == 90 && (coords.dec.minutes > 0 || coords.dec.seconds > 0.0) {
            return Err("Declination must be within ±90 degrees".to_string());
        }
        Ok(coords)
    }

    /// RA in decimal hours
    pub fn ra_hours(&self) -> f64 {
        self.ra.hours as f64 + self.ra.minutes as f64 / 60.0 + self.ra.seconds / 3600.0
    }

    /// Dec in signed decimal degrees
    pub fn dec_degrees(&self) -> f64 {
        let magnitude = self.dec.degrees as f64 + self.dec.minutes as f64 / 60.0 + self.dec.seconds / 3600.0;
        if self.dec.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Same RA, declination moved `offset_deg` towards the equator (not past it)
    pub fn toward_equator(&self, offset_deg: f64) -> Self {
        let dec = &self.dec;
        let arcsec = dec.degrees as f64 * 3600.0 + dec.minutes as f64 * 60.0 + dec.seconds;
        let moved = (arcsec - offset_deg.max(0.0) * 3600.0).max(0.0).round() as u32;
        Self {
            ra: self.ra,
            dec: Declination {
                negative: dec.negative && moved > 0,
                degrees: moved / 3600,
                minutes: (moved % 3600) / 60,
                seconds: (moved % 60) as f64,
            },
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}, {}{} {} {}",
            self.ra.hours,
            self.ra.minutes,
            self.ra.seconds,
            if self.dec.negative { "-" } else { "" },
            self.dec.degrees,
            self.dec.minutes,
            self.dec.seconds
        )
    }
}
