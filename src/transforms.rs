use crate::coords::{SkyCoord, Vec3};
use crate::location::Observer;
use chrono::{DateTime, Utc};
use std::f64::consts::PI;

/// Mean obliquity of the ecliptic at J2000.0, in degrees
pub const OBLIQUITY_J2000_DEG: f64 = 23.439291;

/// Converts equatorial coordinates (RA/DEC) to horizontal coordinates
/// (elevation/azimuth) for a given UTC time and observer location.
///
/// This uses the standard Meeus spherical trigonometry formulation:
/// - Computes **hour angle (HA)** from the local sidereal time
/// - Computes **elevation** and **azimuth** from HA, declination, and latitude
///
/// # Arguments
///
/// - `ra_deg`: Right Ascension in degrees (0° to 360°)
/// - `dec_deg`: Declination in degrees (−90° to +90°)
/// - `datetime`: UTC datetime of observation
/// - `observer`: [Observer](`Observer`) containing lat/lon
///
/// # Returns
///
/// A tuple `(elevation_deg, azimuth_deg)` in degrees:
/// - `elevation_deg`: Elevation above horizon (−90° to +90°)
/// - `azimuth_deg`: Degrees clockwise from true north (0° = North, 90° = East, etc.)
///
/// # Formulae
///
/// ```text
/// HA = LST - RA
/// El = arcsin(sin(Dec)·sin(Lat) + cos(Dec)·cos(Lat)·cos(HA))
/// Az = arccos((sin(Dec) - sin(El)·sin(Lat)) / (cos(El)·cos(Lat)))
/// ```
///
/// If `sin(HA) > 0` (object is west of the meridian), azimuth is flipped:
/// ```text
/// Az = 360° − Az
/// ```
///
/// The `acos` argument is clamped to `[-1, 1]` so that floating drift at the
/// zenith or the celestial pole can never produce NaN.
///
/// # Example
///
/// ```
/// use chrono::{Utc, TimeZone};
/// use dsn_watch::{Observer, ra_dec_to_el_az};
///
/// let dt = Utc.with_ymd_and_hms(2025, 4, 21, 19, 5, 6).unwrap();
/// let obs = Observer::at(39.0005, -92.3009, "Columbia");
///
/// // Vega (α Lyrae): RA = 279.2347°, Dec = +38.7837°
/// let (el, az) = ra_dec_to_el_az(279.2347, 38.7837, dt, &obs);
///
/// assert!(el > 0.0 && el < 10.0);
/// assert!(az > 300.0 && az < 360.0);
/// ```
pub fn ra_dec_to_el_az(
    ra_deg: f64,
    dec_deg: f64,
    datetime: DateTime<Utc>,
    observer: &Observer,
) -> (f64, f64) {
    let dec_rad = dec_deg.to_radians();
    let lat_rad = observer.latitude_deg.to_radians();

    // Hour angle from local sidereal time, both in degrees
    let lst_deg = observer.local_sidereal_time(datetime);
    let ha_rad = (lst_deg - ra_deg).to_radians();

    // Elevation (Meeus formula)
    let sin_el = dec_rad.sin() * lat_rad.sin() + dec_rad.cos() * lat_rad.cos() * ha_rad.cos();
    let el_rad = sin_el.clamp(-1.0, 1.0).asin();

    // Azimuth (Meeus formula), guarded against zenith/pole division blowup
    let denom = el_rad.cos() * lat_rad.cos();
    let cos_az = if denom.abs() < 1e-12 {
        1.0
    } else {
        (dec_rad.sin() - el_rad.sin() * lat_rad.sin()) / denom
    };
    let mut az_rad = cos_az.clamp(-1.0, 1.0).acos();

    // Flip azimuth if the object is west of the meridian
    if ha_rad.sin() > 0.0 {
        az_rad = 2.0 * PI - az_rad;
    }

    let el_deg = el_rad.to_degrees();
    let az_deg = az_rad.to_degrees().rem_euclid(360.0);

    (el_deg, az_deg)
}

/// Converts horizontal coordinates (azimuth/elevation) back to equatorial
/// RA/Dec for a given UTC time and observer.
///
/// This is the inverse of [`ra_dec_to_el_az`] and is used to turn
/// antenna pointing from the DSN feed into a sky position.
///
/// # Returns
///
/// A tuple `(ra_deg, dec_deg)` with RA normalized to `[0, 360)`.
///
/// # Example
///
/// ```
/// use chrono::{Utc, TimeZone};
/// use dsn_watch::{Observer, ra_dec_to_el_az, el_az_to_ra_dec};
///
/// let dt = Utc.with_ymd_and_hms(2024, 7, 15, 3, 0, 0).unwrap();
/// let obs = Observer::at(35.4267, -116.89, "Goldstone");
///
/// let (el, az) = ra_dec_to_el_az(120.0, 25.0, dt, &obs);
/// let (ra, dec) = el_az_to_ra_dec(el, az, dt, &obs);
/// assert!((ra - 120.0).abs() < 1e-6);
/// assert!((dec - 25.0).abs() < 1e-6);
/// ```
pub fn el_az_to_ra_dec(
    el_deg: f64,
    az_deg: f64,
    datetime: DateTime<Utc>,
    observer: &Observer,
) -> (f64, f64) {
    let el_rad = el_deg.to_radians();
    let az_rad = az_deg.to_radians();
    let lat_rad = observer.latitude_deg.to_radians();

    let sin_dec = el_rad.sin() * lat_rad.sin() + el_rad.cos() * lat_rad.cos() * az_rad.cos();
    let dec_rad = sin_dec.clamp(-1.0, 1.0).asin();

    let denom = dec_rad.cos() * lat_rad.cos();
    let cos_ha = if denom.abs() < 1e-12 {
        1.0
    } else {
        (el_rad.sin() - dec_rad.sin() * lat_rad.sin()) / denom
    };
    let mut ha_rad = cos_ha.clamp(-1.0, 1.0).acos();

    // Eastern azimuths correspond to the object rising, i.e. a negative hour angle
    if az_rad.sin() > 0.0 {
        ha_rad = -ha_rad;
    }

    let lst_deg = observer.local_sidereal_time(datetime);
    let ra_deg = (lst_deg - ha_rad.to_degrees()).rem_euclid(360.0);

    (ra_deg, dec_rad.to_degrees())
}

/// Horizontal conversion preserving the input coordinate's equatorial axes
/// and range, per the snapshot-fusion convention.
pub fn to_horizontal(coord: &SkyCoord, datetime: DateTime<Utc>, observer: &Observer) -> SkyCoord {
    let (el, az) = ra_dec_to_el_az(coord.ra_deg, coord.dec_deg, datetime, observer);
    SkyCoord {
        ra_deg: coord.ra_deg,
        dec_deg: coord.dec_deg,
        az_deg: az,
        el_deg: el,
        range_km: coord.range_km,
    }
}

/// Unit vector in the equatorial frame for an RA/Dec direction.
pub fn ra_dec_unit_vector(ra_deg: f64, dec_deg: f64) -> Vec3 {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();
    Vec3::new(dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin())
}

/// Rotates an equatorial-frame vector into the ecliptic frame.
///
/// The rotation is about the X axis by the J2000 mean obliquity
/// ε = 23.439291°:
///
/// ```text
/// x_ecl = x_eq
/// y_ecl =  y_eq·cos(ε) + z_eq·sin(ε)
/// z_ecl = −y_eq·sin(ε) + z_eq·cos(ε)
/// ```
///
/// # Example
///
/// ```
/// use dsn_watch::coords::Vec3;
/// use dsn_watch::transforms::{equatorial_to_ecliptic, ecliptic_to_equatorial};
///
/// let v = Vec3::new(0.3, -1.2, 2.5);
/// let back = ecliptic_to_equatorial(equatorial_to_ecliptic(v));
/// assert!((back.x - v.x).abs() < 1e-10);
/// assert!((back.y - v.y).abs() < 1e-10);
/// assert!((back.z - v.z).abs() < 1e-10);
/// ```
pub fn equatorial_to_ecliptic(v: Vec3) -> Vec3 {
    let eps = OBLIQUITY_J2000_DEG.to_radians();
    let (sin_e, cos_e) = eps.sin_cos();
    Vec3::new(
        v.x,
        v.y * cos_e + v.z * sin_e,
        -v.y * sin_e + v.z * cos_e,
    )
}

/// Rotates an ecliptic-frame vector into the equatorial frame
/// (inverse of [`equatorial_to_ecliptic`]).
pub fn ecliptic_to_equatorial(v: Vec3) -> Vec3 {
    let eps = OBLIQUITY_J2000_DEG.to_radians();
    let (sin_e, cos_e) = eps.sin_cos();
    Vec3::new(
        v.x,
        v.y * cos_e - v.z * sin_e,
        v.y * sin_e + v.z * cos_e,
    )
}

/// Angular separation between two sky directions, in degrees.
///
/// Uses the haversine formulation on the celestial sphere, which stays
/// well-conditioned for both tiny and near-antipodal separations. The
/// intermediate `a` term is clamped to `[0, 1]` against floating drift.
///
/// # Example
///
/// ```
/// use dsn_watch::transforms::angular_separation;
///
/// // A degree apart along the equator
/// let sep = angular_separation(10.0, 0.0, 11.0, 0.0);
/// assert!((sep - 1.0).abs() < 1e-9);
/// ```
pub fn angular_separation(ra1_deg: f64, dec1_deg: f64, ra2_deg: f64, dec2_deg: f64) -> f64 {
    let ra1 = ra1_deg.to_radians();
    let dec1 = dec1_deg.to_radians();
    let ra2 = ra2_deg.to_radians();
    let dec2 = dec2_deg.to_radians();

    let sin_ddec = ((dec2 - dec1) / 2.0).sin();
    let sin_dra = ((ra2 - ra1) / 2.0).sin();
    let a = sin_ddec * sin_ddec + dec1.cos() * dec2.cos() * sin_dra * sin_dra;
    let a = a.clamp(0.0, 1.0);

    (2.0 * a.sqrt().asin()).to_degrees()
}
