//! Rise, transit, and set determination from sampled sky positions.
//!
//! Unlike a closed-form hour-angle solution, this solver works on a list
//! of (time, RA, Dec) samples so it handles moving targets the same way it
//! handles stars: transform every sample to elevation, then hunt for the
//! horizon crossings. For deep-space targets a 24-hour arc at a 15 or
//! 30-minute step is plenty.

use crate::coords::RaDecSample;
use crate::error::{DsnError, Result};
use crate::location::Observer;
use crate::transforms::ra_dec_to_el_az;
use chrono::{DateTime, Duration, Utc};

/// Minimum number of samples the solver needs.
pub const MIN_SAMPLES: usize = 3;

/// Outcome of a rise/transit/set solve over one sampled window.
///
/// `rise` is left unset when the object is already above the horizon at
/// the first sample; `set` and `transit` are still reported. For a
/// circumpolar object only `transit` is populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityWindow {
    /// Time the object crosses the horizon upward
    pub rise: Option<DateTime<Utc>>,
    /// Time of maximum elevation
    pub transit: Option<DateTime<Utc>>,
    /// Time the object crosses the horizon downward
    pub set: Option<DateTime<Utc>>,
    /// Maximum elevation over the window, degrees
    pub max_elevation_deg: f64,
    /// Whether a usable determination was made
    pub valid: bool,
    /// Object never goes below the horizon in this window
    pub always_visible: bool,
    /// Object never comes above the horizon in this window
    pub never_visible: bool,
}

/// Solves rise/transit/set for a chronologically ordered sample arc.
///
/// # Algorithm
///
/// 1. Transform each sample to elevation at its instant.
/// 2. If the minimum elevation is above the horizon the object is
///    circumpolar for this window; if the maximum is below, it never
///    rises. Both short-circuit.
/// 3. Otherwise scan for the first upward horizon crossing (rise) and the
///    first downward crossing after it (set), linearly interpolating the
///    crossing instants.
/// 4. Refine the transit by fitting a parabola through the discrete
///    maximum and its neighbors.
///
/// # Errors
///
/// [`DsnError::InsufficientSamples`] with fewer than three samples.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use dsn_watch::coords::RaDecSample;
/// use dsn_watch::location::Observer;
/// use dsn_watch::visibility::solve_visibility;
///
/// // Vega over Goldstone, position fixed over 24 hours
/// let start = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
/// let samples: Vec<RaDecSample> = (0..=24)
///     .map(|h| RaDecSample {
///         at: start + Duration::hours(h),
///         ra_deg: 279.235,
///         dec_deg: 38.784,
///     })
///     .collect();
///
/// let obs = Observer::at(35.4267, -116.89, "Goldstone");
/// let window = solve_visibility(&obs, &samples).unwrap();
/// assert!(window.valid);
/// assert!(!window.always_visible && !window.never_visible);
/// assert!(window.max_elevation_deg > 0.0);
/// ```
pub fn solve_visibility(observer: &Observer, samples: &[RaDecSample]) -> Result<VisibilityWindow> {
    if samples.len() < MIN_SAMPLES {
        return Err(DsnError::InsufficientSamples {
            needed: MIN_SAMPLES,
            got: samples.len(),
        });
    }

    let elevations: Vec<f64> = samples
        .iter()
        .map(|s| ra_dec_to_el_az(s.ra_deg, s.dec_deg, s.at, observer).0)
        .collect();

    let mut min_el = f64::INFINITY;
    let mut max_el = f64::NEG_INFINITY;
    let mut argmax = 0;
    for (i, &el) in elevations.iter().enumerate() {
        if el < min_el {
            min_el = el;
        }
        if el > max_el {
            max_el = el;
            argmax = i;
        }
    }

    let mut window = VisibilityWindow {
        max_elevation_deg: max_el,
        ..Default::default()
    };

    if min_el > 0.0 {
        window.always_visible = true;
        window.valid = true;
        let (t, el) = refine_transit(samples, &elevations, argmax);
        window.transit = Some(t);
        window.max_elevation_deg = el;
        return Ok(window);
    }
    if max_el < 0.0 {
        window.never_visible = true;
        return Ok(window);
    }

    // Rise: first transition from at-or-below to above
    let mut rise_index = None;
    for i in 1..elevations.len() {
        if elevations[i - 1] <= 0.0 && elevations[i] > 0.0 {
            window.rise = Some(interpolate_crossing(
                samples[i - 1].at,
                elevations[i - 1],
                samples[i].at,
                elevations[i],
            ));
            rise_index = Some(i);
            break;
        }
    }

    // Set: first transition from above to at-or-below, after the rise if
    // one was seen (the object may already be up at the first sample)
    let search_from = rise_index.unwrap_or(1);
    for i in search_from..elevations.len() {
        if elevations[i - 1] > 0.0 && elevations[i] <= 0.0 {
            window.set = Some(interpolate_crossing(
                samples[i - 1].at,
                elevations[i - 1],
                samples[i].at,
                elevations[i],
            ));
            break;
        }
    }

    let (t, el) = refine_transit(samples, &elevations, argmax);
    window.transit = Some(t);
    window.max_elevation_deg = el;
    window.valid = window.rise.is_some() || window.set.is_some();
    if !window.valid {
        return Err(DsnError::NoValidWindow);
    }
    Ok(window)
}

/// Linear interpolation of the instant where elevation crosses zero
/// between two samples. Degenerate (equal-elevation or same-instant)
/// pairs fall back to the earlier sample.
fn interpolate_crossing(
    t1: DateTime<Utc>,
    el1: f64,
    t2: DateTime<Utc>,
    el2: f64,
) -> DateTime<Utc> {
    let span = el2 - el1;
    if span.abs() < 1e-12 {
        return t1;
    }
    let fraction = (-el1 / span).clamp(0.0, 1.0);
    let dt_s = (t2 - t1).num_milliseconds() as f64 / 1000.0;
    t1 + Duration::milliseconds((fraction * dt_s * 1000.0).round() as i64)
}

/// Parabolic refinement of the transit around the discrete maximum.
///
/// Fits `y = a·t² + b·t + c` through the maximum and its two neighbors on
/// a normalized `t ∈ {-1, 0, +1}` axis and takes the vertex when the fit
/// is concave-down. Falls back to the discrete maximum at the window
/// edges, for a concave-up triple, or when the sample step is not uniform
/// (the vertex time only maps back linearly on a uniform grid).
fn refine_transit(
    samples: &[RaDecSample],
    elevations: &[f64],
    argmax: usize,
) -> (DateTime<Utc>, f64) {
    let discrete = (samples[argmax].at, elevations[argmax]);
    if argmax == 0 || argmax + 1 >= samples.len() {
        return discrete;
    }

    let left_step = samples[argmax].at - samples[argmax - 1].at;
    let right_step = samples[argmax + 1].at - samples[argmax].at;
    if (left_step - right_step).num_seconds().abs() > 1 {
        return discrete;
    }

    let y0 = elevations[argmax - 1];
    let y1 = elevations[argmax];
    let y2 = elevations[argmax + 1];
    let a = (y0 + y2) / 2.0 - y1;
    let b = (y2 - y0) / 2.0;
    if a >= 0.0 {
        return discrete;
    }

    let t_star = (-b / (2.0 * a)).clamp(-1.0, 1.0);
    let refined_el = a * t_star * t_star + b * t_star + y1;
    let step_ms = left_step.num_milliseconds() as f64;
    let refined_t =
        samples[argmax].at + Duration::milliseconds((t_star * step_ms).round() as i64);
    (refined_t, refined_el)
}
