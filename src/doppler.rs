//! Non-relativistic line-of-sight Doppler prediction.
//!
//! The observer sits on the rotating WGS84 ellipsoid; the spacecraft state
//! comes in as an ECEF position/velocity pair, or as a ready-made range
//! rate when an ephemeris service supplies one.

use crate::coords::Vec3;
use crate::location::Observer;
use crate::time::SPEED_OF_LIGHT_KM_S;

/// WGS84 semi-major axis, km
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;
/// Earth rotation rate, rad/s
pub const EARTH_ROTATION_RAD_S: f64 = 7.2921159e-5;
/// Ranges below this are degenerate for a line-of-sight projection, km
pub const MIN_RANGE_KM: f64 = 1.0;

/// A predicted Doppler observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DopplerEstimate {
    /// Line-of-sight velocity, km/s; positive is receding
    pub los_velocity_km_s: f64,
    /// Frequency shift `f₀ · v/c`, Hz
    pub shift_hz: f64,
}

/// Observer position on the WGS84 ellipsoid in ECEF, km (height 0).
///
/// Uses the prime-vertical radius `N = a / √(1 − e²·sin²φ)`:
///
/// ```text
/// x = N·cosφ·cosλ
/// y = N·cosφ·sinλ
/// z = N·(1 − e²)·sinφ
/// ```
///
/// # Example
///
/// ```
/// use dsn_watch::doppler::geodetic_to_ecef;
///
/// let p = geodetic_to_ecef(35.4267, -116.89);
/// let radius = p.norm();
/// assert!(radius > 6350.0 && radius < 6400.0);
/// ```
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64) -> Vec3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let e2 = 2.0 * WGS84_F - WGS84_F * WGS84_F;
    let n = WGS84_A_KM / (1.0 - e2 * lat.sin() * lat.sin()).sqrt();
    Vec3::new(
        n * lat.cos() * lon.cos(),
        n * lat.cos() * lon.sin(),
        n * (1.0 - e2) * lat.sin(),
    )
}

/// Observer velocity in ECEF due to Earth rotation, km/s.
///
/// Only the equatorial-plane components are nonzero:
/// `v = ω × r = (−ω·R·sinλ, ω·R·cosλ, 0)` with `R = a·cosφ`.
pub fn observer_ecef_velocity(lat_deg: f64, lon_deg: f64) -> Vec3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let r = WGS84_A_KM * lat.cos();
    Vec3::new(
        -EARTH_ROTATION_RAD_S * r * lon.sin(),
        EARTH_ROTATION_RAD_S * r * lon.cos(),
        0.0,
    )
}

/// Doppler prediction from a spacecraft ECEF state vector.
///
/// Projects the observer-relative velocity onto the line of sight and
/// scales by the carrier: `Δf = f₀ · v_los / c`. Returns `None` when the
/// spacecraft is within [`MIN_RANGE_KM`] of the observer, where the
/// line-of-sight direction is meaningless.
///
/// # Example
///
/// ```
/// use dsn_watch::coords::Vec3;
/// use dsn_watch::doppler::doppler_from_state;
/// use dsn_watch::location::Observer;
///
/// // Near-geostationary target dropping straight down the Z axis
/// let obs = Observer::at(0.0, 0.0, "equator");
/// let est = doppler_from_state(
///     &obs,
///     Vec3::new(0.0, 0.0, 42_164.0),
///     Vec3::new(0.0, 0.0, -1.0),
///     8.42e9,
/// )
/// .unwrap();
/// assert!(est.los_velocity_km_s < 0.0); // approaching
/// assert!(est.shift_hz.abs() < 56_200.0);
/// ```
pub fn doppler_from_state(
    observer: &Observer,
    sc_pos_ecef_km: Vec3,
    sc_vel_ecef_km_s: Vec3,
    f0_hz: f64,
) -> Option<DopplerEstimate> {
    let obs_pos = geodetic_to_ecef(observer.latitude_deg, observer.longitude_deg);
    let obs_vel = observer_ecef_velocity(observer.latitude_deg, observer.longitude_deg);

    let line_of_sight = sc_pos_ecef_km - obs_pos;
    if line_of_sight.norm() < MIN_RANGE_KM {
        return None;
    }
    let direction = line_of_sight.unit()?;

    let relative_velocity = sc_vel_ecef_km_s - obs_vel;
    let los_velocity = relative_velocity.dot(direction);

    Some(DopplerEstimate {
        los_velocity_km_s: los_velocity,
        shift_hz: f0_hz * los_velocity / SPEED_OF_LIGHT_KM_S,
    })
}

/// Doppler prediction from a range rate supplied directly by an ephemeris
/// service; no geometric projection is needed.
pub fn doppler_from_range_rate(range_rate_km_s: f64, f0_hz: f64) -> DopplerEstimate {
    DopplerEstimate {
        los_velocity_km_s: range_rate_km_s,
        shift_hz: f0_hz * range_rate_km_s / SPEED_OF_LIGHT_KM_S,
    }
}
