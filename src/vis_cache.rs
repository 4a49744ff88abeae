//! Per-spacecraft visibility memoization.
//!
//! Solving rise/set for one craft across three complexes over a 96-sample
//! arc costs tens of microseconds, but the UI asks on every frame, so the
//! answers are cached per (spacecraft, complex) with a short TTL. Values
//! are copied out under the read lock; no computation runs while a lock
//! is held.

use crate::coords::RaDecSample;
use crate::error::{validate_dec, validate_ra, Result};
use crate::model::Complex;
use crate::sun::sun_ra_dec;
use crate::transforms::{angular_separation, ra_dec_to_el_az};
use crate::visibility::{solve_visibility, VisibilityWindow};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// Freshness bound for cached visibility, seconds.
pub const VISIBILITY_TTL_S: i64 = 300;
/// Length of the synthetic sample arc, hours.
pub const ARC_HOURS: i64 = 24;
/// Step of the synthetic sample arc, minutes.
pub const ARC_STEP_MIN: i64 = 15;

/// Elevation bucket for at-a-glance display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationTier {
    /// Below the horizon
    None,
    /// Up but low, under 15°
    Low,
    /// 15° to 45°
    Mid,
    /// Above 45°
    High,
}

impl ElevationTier {
    pub fn from_elevation(el_deg: f64) -> ElevationTier {
        if el_deg <= 0.0 {
            ElevationTier::None
        } else if el_deg < 15.0 {
            ElevationTier::Low
        } else if el_deg < 45.0 {
            ElevationTier::Mid
        } else {
            ElevationTier::High
        }
    }
}

/// Sun-separation bucket; close separations degrade the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunSeparationTier {
    /// Under 10°: solar conjunction territory
    Warning,
    /// 10° to 20°
    Caution,
    /// 20° and beyond
    Safe,
}

impl SunSeparationTier {
    pub fn from_separation(sep_deg: f64) -> SunSeparationTier {
        if sep_deg < 10.0 {
            SunSeparationTier::Warning
        } else if sep_deg < 20.0 {
            SunSeparationTier::Caution
        } else {
            SunSeparationTier::Safe
        }
    }
}

/// Everything the views need to render one craft's sky state at one
/// complex.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityInfo {
    /// Rise/transit/set window over the synthetic arc
    pub window: VisibilityWindow,
    /// Elevation right now, degrees
    pub current_elevation_deg: f64,
    /// Elevation bucket
    pub elevation_tier: ElevationTier,
    /// Separation from the Sun right now, degrees
    pub sun_separation_deg: f64,
    /// Sun-separation bucket
    pub sun_tier: SunSeparationTier,
    /// When this entry was computed
    pub computed_at: DateTime<Utc>,
}

/// The visibility cache: spacecraft code → complex → [`VisibilityInfo`].
#[derive(Default)]
pub struct VisibilityCache {
    entries: RwLock<HashMap<String, HashMap<Complex, VisibilityInfo>>>,
    focus: RwLock<Option<String>>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes visibility for one craft across all three complexes
    /// from a single RA/Dec fix.
    ///
    /// Builds a 24-hour arc at a 15-minute step with the position held
    /// fixed, which is valid for deep-space targets: their geocentric
    /// coordinates barely move on that time scale.
    pub fn update_visibility(
        &self,
        spacecraft: &str,
        ra_deg: f64,
        dec_deg: f64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        validate_ra(ra_deg)?;
        validate_dec(dec_deg)?;

        let samples: Vec<RaDecSample> = (0..=(ARC_HOURS * 60 / ARC_STEP_MIN))
            .map(|i| RaDecSample {
                at: now + Duration::minutes(i * ARC_STEP_MIN),
                ra_deg,
                dec_deg,
            })
            .collect();

        let (sun_ra, sun_dec) = sun_ra_dec(now);
        let sun_separation_deg = angular_separation(ra_deg, dec_deg, sun_ra, sun_dec);

        let mut per_complex = HashMap::new();
        for complex in Complex::ALL {
            let observer = complex.observer();
            let window = solve_visibility(&observer, &samples)?;
            let current_elevation_deg = ra_dec_to_el_az(ra_deg, dec_deg, now, &observer).0;
            per_complex.insert(
                complex,
                VisibilityInfo {
                    window,
                    current_elevation_deg,
                    elevation_tier: ElevationTier::from_elevation(current_elevation_deg),
                    sun_separation_deg,
                    sun_tier: SunSeparationTier::from_separation(sun_separation_deg),
                    computed_at: now,
                },
            );
        }

        self.entries
            .write()
            .unwrap()
            .insert(spacecraft.to_string(), per_complex);
        Ok(())
    }

    /// A fresh entry for one craft at one complex, or `None` when absent
    /// or expired.
    pub fn get(&self, spacecraft: &str, complex: Complex) -> Option<VisibilityInfo> {
        let guard = self.entries.read().unwrap();
        let info = guard.get(spacecraft)?.get(&complex)?;
        if (Utc::now() - info.computed_at).num_seconds() >= VISIBILITY_TTL_S {
            return None;
        }
        Some(info.clone())
    }

    /// Whether a fresh entry exists for the craft at any complex.
    pub fn is_fresh(&self, spacecraft: &str) -> bool {
        Complex::ALL
            .iter()
            .any(|&c| self.get(spacecraft, c).is_some())
    }

    /// Switches the focused spacecraft. Returns true when the focus
    /// actually moved, which tells collaborators a refresh is warranted.
    pub fn set_focus(&self, spacecraft: Option<&str>) -> bool {
        let mut focus = self.focus.write().unwrap();
        let new = spacecraft.map(str::to_string);
        if *focus == new {
            return false;
        }
        *focus = new;
        true
    }

    /// The currently focused spacecraft, if any.
    pub fn focus(&self) -> Option<String> {
        self.focus.read().unwrap().clone()
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}
