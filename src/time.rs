//! Time scales and light-time helpers.
//!
//! Everything downstream (sidereal time, the solar model, the orbit
//! fallback) runs on the Julian Date, so this module owns the UTC→JD
//! conversion plus the couple of light-time conveniences the link views
//! need.

use chrono::{DateTime, Utc};

/// Julian Date (JD) of the J2000.0 epoch: 2000 January 1.5 TT
pub const JD2000: f64 = 2451545.0;

/// Julian Date of the Unix epoch, 1970-01-01 00:00:00 UTC
pub const JD_UNIX_EPOCH: f64 = 2440587.5;

/// Speed of light in km/s
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// One astronomical unit in kilometers
pub const AU_KM: f64 = 149_597_870.7;

/// Seconds per day
const DAY_S: f64 = 86_400.0;

/// Converts a UTC datetime to a Julian Date.
///
/// Rather than the classical calendar arithmetic, this counts seconds from
/// the Unix epoch (whose JD is known exactly) and divides out the day:
///
/// ```text
/// JD = 2440587.5 + unix_seconds / 86400
/// ```
///
/// Every timestamp this crate ever sees — feed snapshots, ephemeris rows,
/// cache clocks — is a modern date, where this offset form is exact and
/// chrono has already done the calendar work. Resolution is better than
/// 0.1 ms out to beyond 2100, far below the feed's own precision. Like
/// most JD conversions it treats UTC as a uniform scale, so leap seconds
/// are absorbed rather than modeled.
///
/// # Example
///
/// ```
/// use chrono::{Utc, TimeZone};
/// use dsn_watch::time::julian_date;
///
/// // J2000.0: noon UTC on 2000-01-01
/// let dt = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
/// assert!((julian_date(dt) - 2451545.0).abs() < 1e-6);
/// ```
pub fn julian_date(datetime: DateTime<Utc>) -> f64 {
    let unix_seconds =
        datetime.timestamp() as f64 + datetime.timestamp_subsec_nanos() as f64 * 1e-9;
    JD_UNIX_EPOCH + unix_seconds / DAY_S
}

/// Days elapsed since J2000.0, the argument every polynomial in the
/// sidereal and solar models wants.
///
/// # Example
///
/// ```
/// use chrono::{Utc, TimeZone};
/// use dsn_watch::time::j2000_days;
///
/// let dt = Utc.with_ymd_and_hms(2000, 1, 2, 12, 0, 0).unwrap();
/// assert!((j2000_days(dt) - 1.0).abs() < 1e-9);
/// ```
pub fn j2000_days(datetime: DateTime<Utc>) -> f64 {
    julian_date(datetime) - JD2000
}

/// One-way light travel time in seconds for a distance in kilometers.
///
/// # Example
///
/// ```
/// use dsn_watch::time::{light_time_s, AU_KM};
///
/// // Sunlight takes about 499 seconds to reach Earth
/// let t = light_time_s(AU_KM);
/// assert!((t - 499.005).abs() < 0.01);
/// ```
pub fn light_time_s(distance_km: f64) -> f64 {
    distance_km / SPEED_OF_LIGHT_KM_S
}

/// Formats a light-time duration the way operators read it: `"8m19s"`,
/// `"1h23m"`, or `"42s"` for sub-minute times.
///
/// # Example
///
/// ```
/// use dsn_watch::time::{format_light_time, light_time_s, AU_KM};
///
/// assert_eq!(format_light_time(light_time_s(AU_KM)), "8m19s");
/// assert_eq!(format_light_time(42.3), "42s");
/// ```
pub fn format_light_time(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    if total >= 3600 {
        format!("{}h{}m", total / 3600, (total % 3600) / 60)
    } else if total >= 60 {
        format!("{}m{}s", total / 60, total % 60)
    } else {
        format!("{}s", total)
    }
}
