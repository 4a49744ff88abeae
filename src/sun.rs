//! Low-precision solar position.
//!
//! Implements the short solar theory from Meeus’ *Astronomical Algorithms*
//! (2nd ed., Chapter 25): mean longitude, mean anomaly, equation of center,
//! apparent longitude with the leading nutation term, and the corrected
//! obliquity. Accuracy is about 0.01° in RA and 0.001° in Dec: plenty for
//! sun-separation warnings and pass annotations, nowhere near good enough
//! for pointing.

use crate::time::julian_date;
use chrono::{DateTime, Utc};

/// The Sun's apparent ecliptic longitude in degrees, `[0, 360)`.
///
/// Includes the equation of center and the leading aberration/nutation
/// correction from the longitude of the ascending node.
pub fn sun_apparent_longitude(jd: f64) -> f64 {
    let t = (jd - 2451545.0) / 36525.0;

    // Geometric mean longitude and mean anomaly (Meeus 25.2, 25.3)
    let l0 = 280.46646 + 36000.76983 * t + 0.0003032 * t * t;
    let m = (357.52911 + 35999.05029 * t - 0.0001537 * t * t).to_radians();

    // Equation of center
    let c = (1.914602 - 0.004817 * t - 0.000014 * t * t) * m.sin()
        + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
        + 0.000289 * (3.0 * m).sin();

    let true_longitude = l0 + c;

    // Nutation / aberration correction toward apparent longitude
    let omega = (125.04 - 1934.136 * t).to_radians();
    (true_longitude - 0.00569 - 0.00478 * omega.sin()).rem_euclid(360.0)
}

/// The Sun's apparent right ascension and declination in degrees.
///
/// # Returns
///
/// A tuple `(ra_deg, dec_deg)` with RA normalized to `[0, 360)`.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dsn_watch::sun::sun_ra_dec;
///
/// // Near the vernal equinox the Sun sits close to RA 0, Dec 0
/// let dt = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
/// let (ra, dec) = sun_ra_dec(dt);
/// assert!(ra < 2.0 || ra > 358.0);
/// assert!(dec.abs() < 1.0);
/// ```
pub fn sun_ra_dec(date: DateTime<Utc>) -> (f64, f64) {
    let jd = julian_date(date);
    let t = (jd - 2451545.0) / 36525.0;

    let lambda = sun_apparent_longitude(jd).to_radians();

    // Obliquity corrected by the nutation node term (Meeus 25.8)
    let omega = (125.04 - 1934.136 * t).to_radians();
    let eps0 = 23.439291 - 0.0130042 * t - 1.64e-7 * t * t;
    let eps = (eps0 + 0.00256 * omega.cos()).to_radians();

    let ra = (eps.cos() * lambda.sin())
        .atan2(lambda.cos())
        .to_degrees()
        .rem_euclid(360.0);
    let dec = (eps.sin() * lambda.sin()).clamp(-1.0, 1.0).asin().to_degrees();

    (ra, dec)
}
