//! Coordinate resolution for a target: catalog lookup with manual fallback

use crate::catalog::Catalog;
use crate::coordinates::{parse_dec_degrees, parse_minutes, parse_ra_hours, parse_seconds, Coordinates, Declination, RightAscension};
use crate::error::InputError;
use crate::input::InputProvider;

/// Coordinates plus the catalog key they came from, if any
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCoordinates {
    pub coordinates: Coordinates,
    pub catalog_name: Option<String>,
}

/// Ask for the six sexagesimal components one by one
pub fn resolve_direct<I: InputProvider>(input: &mut I) -> Result<Coordinates, InputError> {
    loop {
        let hours = input.ask_parsed("Enter J2000 coordinates (RA h)", parse_ra_hours)?;
        let minutes = input.ask_parsed("Enter J2000 coordinates (RA m)", parse_minutes)?;
        let seconds = input.ask_parsed("Enter J2000 coordinates (RA s)", parse_seconds)?;
        let (negative, degrees) = input.ask_parsed("Enter J2000 coordinates (DEC d)", parse_dec_degrees)?;
        let dec_minutes = input.ask_parsed("Enter J2000 coordinates (DEC m)", parse_minutes)?;
        let dec_seconds = input.ask_parsed("Enter J2000 coordinates (DEC s)", parse_seconds)?;

        if degrees == 90 && (dec_minutes > 0 || dec_seconds > 0.0) {
            input.notify("Declination must be within ±90 degrees. Please enter the coordinates again.");
            continue;
        }

        return Ok(Coordinates {
            ra: RightAscension { hours, minutes, seconds },
            dec: Declination {
                negative,
                degrees,
                minutes: dec_minutes,
                seconds: dec_seconds,
            },
        });
    }
}

/// Look `name` up in the catalog, falling back to manual entry on any miss.
///
/// Lookup failures are reported to the operator and never returned; the only
/// error is the input channel closing.
pub fn resolve_by_catalog<I: InputProvider>(
    input: &mut I,
    catalog: &dyn Catalog,
    name: &str,
) -> Result<Coordinates, InputError> {
    lookup_or_manual(input, catalog, name).map(|resolved| resolved.coordinates)
}

fn lookup_or_manual<I: InputProvider>(
    input: &mut I,
    catalog: &dyn Catalog,
    name: &str,
) -> Result<ResolvedCoordinates, InputError> {
    match catalog.lookup(name) {
        Ok(coordinates) => Ok(ResolvedCoordinates {
            coordinates,
            catalog_name: Some(name.to_string()),
        }),
        Err(miss) => {
            tracing::warn!("Catalog lookup failed, falling back to manual entry: {}", miss);
            input.notify(&format!("{}. Enter the coordinates manually.", miss));
            Ok(ResolvedCoordinates {
                coordinates: resolve_direct(input)?,
                catalog_name: None,
            })
        }
    }
}

/// Resolve one target's coordinates, offering the catalog when one is configured
pub fn resolve_target<I: InputProvider>(
    input: &mut I,
    catalog: Option<&dyn Catalog>,
) -> Result<ResolvedCoordinates, InputError> {
    let Some(catalog) = catalog else {
        return Ok(ResolvedCoordinates {
            coordinates: resolve_direct(input)?,
            catalog_name: None,
        });
    };

    if !input.ask_yes_no("Look up the target in the catalog? (y/n)")? {
        return Ok(ResolvedCoordinates {
            coordinates: resolve_direct(input)?,
            catalog_name: None,
        });
    }

    match catalog.names() {
        Ok(names) if !names.is_empty() => input.notify(&format!("Catalog entries:\n{}", names.join("\n"))),
        Ok(_) => {}
        Err(miss) => tracing::debug!("No catalog listing to show: {}", miss),
    }

    let name = input.ask_text("Enter catalog name")?;
    lookup_or_manual(input, catalog, &name)
}
