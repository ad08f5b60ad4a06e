//! Great-circle distance and ETA heuristics.
//!
//! Everything in this crate measures distance in statute miles; the single
//! Earth-radius constant lives here so callers cannot mix unit systems.
//! ETA is a straight-line advisory figure, not road routing.

use thiserror::Error;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Conversion factor for geofence radii, which are stored in meters.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Default assumed response speed for the ETA heuristic.
pub const DEFAULT_AVG_SPEED_MPH: f64 = 45.0;

/// Floor applied to displayed ETAs.
pub const MIN_ETA_MINUTES: u32 = 2;

/// Errors produced by coordinate validation.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("coordinate is not a finite number")]
    NotFinite,
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Validate a latitude/longitude pair.
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), GeoError> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(GeoError::NotFinite);
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoError::LatitudeOutOfRange(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeoError::LongitudeOutOfRange(lon));
    }
    Ok(())
}

/// Haversine great-circle distance in statute miles.
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64, GeoError> {
    validate_coordinates(lat1, lon1)?;
    validate_coordinates(lat2, lon2)?;

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    Ok(EARTH_RADIUS_MILES * c)
}

/// Straight-line ETA in whole minutes at the given average speed, clamped to
/// [`MIN_ETA_MINUTES`]. Zero or negative distance clamps rather than errors
/// since this is display-only.
pub fn eta_minutes(distance_miles: f64, avg_speed_mph: f64) -> u32 {
    if distance_miles <= 0.0 || avg_speed_mph <= 0.0 {
        return MIN_ETA_MINUTES;
    }
    let minutes = (distance_miles / avg_speed_mph * 60.0).round() as u32;
    minutes.max(MIN_ETA_MINUTES)
}
