use crate::error::{validate_latitude, validate_longitude, Result};
use crate::sidereal::local_sidereal_time;
use crate::time::julian_date;
use chrono::{DateTime, Utc};

/// Represents a physical observer location on Earth.
///
/// Used for computing local sidereal time, converting celestial coordinates,
/// and modeling the ground side of a space link. Height above the ellipsoid
/// is assumed zero; at deep-space ranges it changes nothing measurable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Latitude in degrees (+N, -S)
    pub latitude_deg: f64,
    /// Longitude in degrees (+E, -W, Greenwich = 0)
    pub longitude_deg: f64,
    /// Site name, if the location corresponds to a named facility
    pub name: Option<&'static str>,
}

impl Observer {
    /// Creates an observer after validating the coordinate ranges.
    ///
    /// # Example
    /// ```
    /// use dsn_watch::location::Observer;
    ///
    /// let obs = Observer::new(35.4267, -116.89).unwrap();
    /// assert_eq!(obs.name, None);
    /// assert!(Observer::new(95.0, 0.0).is_err());
    /// ```
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Result<Self> {
        validate_latitude(latitude_deg)?;
        validate_longitude(longitude_deg)?;
        Ok(Observer {
            latitude_deg,
            longitude_deg,
            name: None,
        })
    }

    /// Creates a named observer without validation; intended for the
    /// compile-time site constants.
    pub const fn at(latitude_deg: f64, longitude_deg: f64, name: &'static str) -> Self {
        Observer {
            latitude_deg,
            longitude_deg,
            name: Some(name),
        }
    }

    /// Computes the Local Sidereal Time (LST) at this location, in degrees.
    ///
    /// # Arguments
    /// - `datetime`: UTC datetime
    ///
    /// # Returns
    /// Local sidereal time in degrees, `[0, 360)`
    ///
    /// # Example
    /// ```
    /// use chrono::{Utc, TimeZone};
    /// use dsn_watch::location::Observer;
    ///
    /// let dt = Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap();
    /// let obs = Observer::at(-35.4014, 148.9817, "Canberra");
    /// let lst = obs.local_sidereal_time(dt);
    /// assert!((0.0..360.0).contains(&lst));
    /// ```
    pub fn local_sidereal_time(&self, datetime: DateTime<Utc>) -> f64 {
        let jd = julian_date(datetime);
        local_sidereal_time(jd, self.longitude_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_validates() {
        assert!(Observer::new(35.0, -116.0).is_ok());
        assert!(Observer::new(-91.0, 0.0).is_err());
        assert!(Observer::new(0.0, 181.0).is_err());
    }

    #[test]
    fn test_lst_at_greenwich_equals_gmst() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        let obs = Observer::new(51.48, 0.0).unwrap();
        let jd = crate::time::julian_date(dt);
        let gmst = crate::sidereal::gmst(jd);
        assert!((obs.local_sidereal_time(dt) - gmst).abs() < 1e-3);
    }
}
