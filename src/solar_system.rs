//! Solar-system snapshot cache: planets plus tracked spacecraft as
//! heliocentric ecliptic positions, for the orrery views.
//!
//! Planets refresh every 10 minutes through the ephemeris provider; when
//! the provider is down they fall back to a circular-orbit approximation
//! that is ugly for ephemeris work and perfectly fine for a plan view.
//! Spacecraft refresh every 5 minutes and are synthesized from the DSN
//! feed's pointing and range when the provider cannot place them.

use crate::coords::Vec3;
use crate::provider::CachedEphemeris;
use crate::time::{j2000_days, AU_KM};
use crate::transforms::{el_az_to_ra_dec, equatorial_to_ecliptic, ra_dec_unit_vector};
use crate::views::SpacecraftView;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::RwLock;

/// Freshness bound for planet positions, seconds.
pub const PLANET_TTL_S: i64 = 600;
/// Freshness bound for spacecraft positions, seconds.
pub const SPACECRAFT_TTL_S: i64 = 300;

/// What kind of body an [`EclipticBody`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Sun,
    Planet,
    Spacecraft,
}

/// A body with a heliocentric ecliptic position in AU.
#[derive(Debug, Clone, PartialEq)]
pub struct EclipticBody {
    pub name: String,
    pub naif_id: i64,
    pub kind: BodyKind,
    /// Heliocentric ecliptic position, AU
    pub pos_au: Vec3,
}

/// A generated solar-system view.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarSystemSnapshot {
    pub generated_at: DateTime<Utc>,
    /// Sun first, then planets, then spacecraft
    pub bodies: Vec<EclipticBody>,
}

/// A planet's registry row for queries and the orbit fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planet {
    pub name: &'static str,
    pub naif_id: i64,
    /// Semi-major axis, AU
    pub semi_major_axis_au: f64,
}

/// The eight planets with published semi-major axes.
pub static PLANETS: &[Planet] = &[
    Planet { name: "Mercury", naif_id: 199, semi_major_axis_au: 0.387 },
    Planet { name: "Venus", naif_id: 299, semi_major_axis_au: 0.723 },
    Planet { name: "Earth", naif_id: 399, semi_major_axis_au: 1.000 },
    Planet { name: "Mars", naif_id: 499, semi_major_axis_au: 1.524 },
    Planet { name: "Jupiter", naif_id: 599, semi_major_axis_au: 5.203 },
    Planet { name: "Saturn", naif_id: 699, semi_major_axis_au: 9.537 },
    Planet { name: "Uranus", naif_id: 799, semi_major_axis_au: 19.191 },
    Planet { name: "Neptune", naif_id: 899, semi_major_axis_au: 30.069 },
];

/// Circular-orbit placement from Kepler's third law: the mean anomaly
/// advances through one revolution per `a^1.5` years from J2000, on the
/// ecliptic plane.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dsn_watch::solar_system::circular_orbit_position;
///
/// let at = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
/// let pos = circular_orbit_position(5.203, at);
/// assert!((pos.norm() - 5.203).abs() < 1e-9);
/// assert_eq!(pos.z, 0.0);
/// ```
pub fn circular_orbit_position(semi_major_axis_au: f64, at: DateTime<Utc>) -> Vec3 {
    let days = j2000_days(at);
    let period_days = semi_major_axis_au.powf(1.5) * 365.25;
    let mean_anomaly = 2.0 * std::f64::consts::PI * days / period_days;
    Vec3::new(
        semi_major_axis_au * mean_anomaly.cos(),
        semi_major_axis_au * mean_anomaly.sin(),
        0.0,
    )
}

struct TimedBody {
    fetched_at: DateTime<Utc>,
    body: EclipticBody,
}

/// The solar-system cache. Holds per-body timestamps so planets and
/// spacecraft age out on their own schedules.
#[derive(Default)]
pub struct SolarSystemCache {
    planets: RwLock<HashMap<i64, TimedBody>>,
    spacecraft: RwLock<HashMap<String, TimedBody>>,
}

impl SolarSystemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot for `now`, refreshing whatever has gone stale.
    ///
    /// `views` carries the spacecraft currently tracked by the DSN; their
    /// positions come from the provider when it knows them and are
    /// synthesized from dish pointing and range otherwise. The Sun at the
    /// origin is always included.
    pub fn snapshot(
        &self,
        provider: &CachedEphemeris,
        views: &[SpacecraftView],
        now: DateTime<Utc>,
    ) -> SolarSystemSnapshot {
        let mut bodies = vec![EclipticBody {
            name: "Sun".to_string(),
            naif_id: 10,
            kind: BodyKind::Sun,
            pos_au: Vec3::ZERO,
        }];

        self.refresh_planets(provider, now);
        {
            let guard = self.planets.read().unwrap();
            for planet in PLANETS {
                if let Some(timed) = guard.get(&planet.naif_id) {
                    bodies.push(timed.body.clone());
                }
            }
        }

        self.refresh_spacecraft(provider, views, now);
        {
            let guard = self.spacecraft.read().unwrap();
            let mut craft: Vec<&TimedBody> = views
                .iter()
                .filter_map(|v| guard.get(&v.spacecraft))
                .collect();
            craft.sort_by(|a, b| a.body.name.cmp(&b.body.name));
            bodies.extend(craft.into_iter().map(|t| t.body.clone()));
        }

        SolarSystemSnapshot { generated_at: now, bodies }
    }

    fn refresh_planets(&self, provider: &CachedEphemeris, now: DateTime<Utc>) {
        for planet in PLANETS {
            let fresh = self
                .planets
                .read()
                .unwrap()
                .get(&planet.naif_id)
                .map(|t| (now - t.fetched_at).num_seconds() < PLANET_TTL_S)
                .unwrap_or(false);
            if fresh {
                continue;
            }

            let pos_au = match provider.heliocentric_position(planet.naif_id, now) {
                Ok(v) => v,
                Err(e) => {
                    debug!("{}: provider miss ({e}), circular fallback", planet.name);
                    circular_orbit_position(planet.semi_major_axis_au, now)
                }
            };

            self.planets.write().unwrap().insert(
                planet.naif_id,
                TimedBody {
                    fetched_at: now,
                    body: EclipticBody {
                        name: planet.name.to_string(),
                        naif_id: planet.naif_id,
                        kind: BodyKind::Planet,
                        pos_au,
                    },
                },
            );
        }
    }

    fn refresh_spacecraft(
        &self,
        provider: &CachedEphemeris,
        views: &[SpacecraftView],
        now: DateTime<Utc>,
    ) {
        for view in views {
            let fresh = self
                .spacecraft
                .read()
                .unwrap()
                .get(&view.spacecraft)
                .map(|t| (now - t.fetched_at).num_seconds() < SPACECRAFT_TTL_S)
                .unwrap_or(false);
            if fresh {
                continue;
            }

            let naif_id = crate::provider::target_by_code(&view.spacecraft)
                .map(|t| t.naif_id)
                .unwrap_or(view.spacecraft_id);

            let pos_au = provider
                .heliocentric_position(naif_id, now)
                .unwrap_or_else(|_| synthesize_from_link(view, now));

            self.spacecraft.write().unwrap().insert(
                view.spacecraft.clone(),
                TimedBody {
                    fetched_at: now,
                    body: EclipticBody {
                        name: view.spacecraft.clone(),
                        naif_id,
                        kind: BodyKind::Spacecraft,
                        pos_au,
                    },
                },
            );
        }
    }
}

/// Heliocentric position synthesized from DSN pointing and range: the
/// geocentric direction stands in for the heliocentric one, which is a
/// fine approximation for anything beyond a few AU.
fn synthesize_from_link(view: &SpacecraftView, now: DateTime<Utc>) -> Vec3 {
    let link = view.primary_link();
    let observer = link.complex.observer();
    let (ra, dec) = el_az_to_ra_dec(link.elevation_deg, link.azimuth_deg, now, &observer);
    let geocentric = ra_dec_unit_vector(ra, dec) * (link.distance_km / AU_KM);
    equatorial_to_ecliptic(geocentric)
}
