//! Error types for dsn-watch operations

use thiserror::Error;

/// Main error type for dsn-watch operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DsnError {
    /// Invalid coordinate value
    #[error("Invalid {coord_type}: {value} (valid range: {valid_range})")]
    InvalidCoordinate {
        /// Type of coordinate (e.g., "RA", "Dec", "Latitude")
        coord_type: &'static str,
        /// The invalid value
        value: f64,
        /// Valid range description
        valid_range: &'static str,
    },

    /// Too few ephemeris samples for the visibility solver
    #[error("Need at least {needed} samples, got {got}")]
    InsufficientSamples {
        /// Minimum sample count required
        needed: usize,
        /// Samples actually supplied
        got: usize,
    },

    /// Solver ran but could not determine rise/set/circumpolar state
    #[error("No valid visibility window within the sampled span")]
    NoValidWindow,

    /// Ephemeris service returned HTML, a bad status, or timed out
    #[error("Ephemeris service unavailable: {reason}")]
    ServiceUnavailable {
        /// What went wrong at the transport level
        reason: String,
    },

    /// Response decoded but its payload could not be understood
    #[error("Parse error: {reason}")]
    ParseError {
        /// Description of the issue
        reason: String,
    },

    /// Requested body has no registry entry or no current tracking
    #[error("Unknown target '{target}'")]
    UnknownTarget {
        /// NAIF id or spacecraft code as given by the caller
        target: String,
    },
}

/// Type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DsnError>;

/// Validate right ascension (0 <= RA < 360)
#[inline]
pub fn validate_ra(ra: f64) -> Result<()> {
    if ra < 0.0 || ra >= 360.0 {
        Err(DsnError::InvalidCoordinate {
            coord_type: "RA",
            value: ra,
            valid_range: "[0, 360)",
        })
    } else {
        Ok(())
    }
}

/// Validate declination (-90 <= Dec <= 90)
#[inline]
pub fn validate_dec(dec: f64) -> Result<()> {
    if dec < -90.0 || dec > 90.0 {
        Err(DsnError::InvalidCoordinate {
            coord_type: "Declination",
            value: dec,
            valid_range: "[-90, 90]",
        })
    } else {
        Ok(())
    }
}

/// Validate latitude (-90 <= lat <= 90)
#[inline]
pub fn validate_latitude(lat: f64) -> Result<()> {
    if lat < -90.0 || lat > 90.0 {
        Err(DsnError::InvalidCoordinate {
            coord_type: "Latitude",
            value: lat,
            valid_range: "[-90, 90]",
        })
    } else {
        Ok(())
    }
}

/// Validate longitude (-180 <= lon <= 180)
#[inline]
pub fn validate_longitude(lon: f64) -> Result<()> {
    if lon < -180.0 || lon > 180.0 {
        Err(DsnError::InvalidCoordinate {
            coord_type: "Longitude",
            value: lon,
            valid_range: "[-180, 180]",
        })
    } else {
        Ok(())
    }
}
