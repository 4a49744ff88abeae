//! Pass enumeration and classification across the three complexes.

use crate::coords::RaDecSample;
use crate::error::{DsnError, Result};
use crate::model::Complex;
use crate::sun::sun_ra_dec;
use crate::transforms::{angular_separation, ra_dec_to_el_az};
use chrono::{DateTime, Duration, Utc};

/// Elevation threshold for a workable pass, degrees.
pub const MIN_PASS_ELEVATION_DEG: f64 = 5.0;

/// Where a pass sits relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// Already over
    Past,
    /// In progress
    Now,
    /// The soonest upcoming pass across all complexes
    Next,
    /// Upcoming, but not the soonest
    Future,
}

impl PassStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PassStatus::Past => "PAST",
            PassStatus::Now => "NOW",
            PassStatus::Next => "NEXT",
            PassStatus::Future => "FUTURE",
        }
    }
}

/// One contiguous interval a spacecraft spends above a complex's pass
/// threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    /// Hosting complex
    pub complex: Complex,
    /// Threshold crossing going up
    pub start: DateTime<Utc>,
    /// Time of maximum elevation
    pub peak: DateTime<Utc>,
    /// Threshold crossing going down
    pub end: DateTime<Utc>,
    /// Maximum elevation over the pass, degrees
    pub max_el_deg: f64,
    /// Minimum sun separation over the pass, degrees
    pub sun_min_sep_deg: f64,
    /// Classification relative to the planning instant
    pub status: PassStatus,
}

/// A spacecraft's pass schedule across all three complexes.
#[derive(Debug, Clone, PartialEq)]
pub struct PassPlan {
    /// Spacecraft code the plan is for
    pub spacecraft: String,
    /// Passes sorted by start time (ties broken GDS < CDS < MDS)
    pub passes: Vec<Pass>,
}

/// Enumerates and classifies passes over a sampled arc.
///
/// For each complex, contiguous runs of samples at or above
/// [`MIN_PASS_ELEVATION_DEG`] become passes; the threshold crossings are
/// linearly interpolated between the neighboring samples. Exactly one
/// future pass, the one starting soonest across all complexes, is marked
/// [`PassStatus::Next`].
///
/// # Errors
///
/// [`DsnError::InsufficientSamples`] with fewer than three samples.
pub fn plan_passes(
    spacecraft: &str,
    samples: &[RaDecSample],
    now: DateTime<Utc>,
) -> Result<PassPlan> {
    if samples.len() < 3 {
        return Err(DsnError::InsufficientSamples {
            needed: 3,
            got: samples.len(),
        });
    }

    let mut passes = Vec::new();
    for complex in Complex::ALL {
        collect_passes(&mut passes, complex, samples, now);
    }

    passes.sort_by(|a, b| a.start.cmp(&b.start).then(a.complex.cmp(&b.complex)));

    // Promote the soonest future pass to NEXT
    if let Some(next) = passes
        .iter_mut()
        .filter(|p| p.status == PassStatus::Future)
        .min_by_key(|p| p.start)
    {
        next.status = PassStatus::Next;
    }

    Ok(PassPlan {
        spacecraft: spacecraft.to_string(),
        passes,
    })
}

fn collect_passes(
    passes: &mut Vec<Pass>,
    complex: Complex,
    samples: &[RaDecSample],
    now: DateTime<Utc>,
) {
    let observer = complex.observer();
    let elevations: Vec<f64> = samples
        .iter()
        .map(|s| ra_dec_to_el_az(s.ra_deg, s.dec_deg, s.at, &observer).0)
        .collect();

    let mut run_start: Option<usize> = None;
    for i in 0..=elevations.len() {
        let above = i < elevations.len() && elevations[i] >= MIN_PASS_ELEVATION_DEG;
        match (run_start, above) {
            (None, true) => run_start = Some(i),
            (Some(first), false) => {
                passes.push(build_pass(
                    complex, samples, &elevations, first, i - 1, now,
                ));
                run_start = None;
            }
            _ => {}
        }
    }
}

fn build_pass(
    complex: Complex,
    samples: &[RaDecSample],
    elevations: &[f64],
    first: usize,
    last: usize,
    now: DateTime<Utc>,
) -> Pass {
    // Interpolate the threshold crossings against the neighbors outside
    // the run, when they exist
    let start = if first > 0 {
        interpolate_threshold(
            samples[first - 1].at,
            elevations[first - 1],
            samples[first].at,
            elevations[first],
        )
    } else {
        samples[first].at
    };
    let end = if last + 1 < samples.len() {
        interpolate_threshold(
            samples[last].at,
            elevations[last],
            samples[last + 1].at,
            elevations[last + 1],
        )
    } else {
        samples[last].at
    };

    let mut max_el = f64::NEG_INFINITY;
    let mut peak = samples[first].at;
    let mut sun_min_sep = f64::INFINITY;
    for i in first..=last {
        if elevations[i] > max_el {
            max_el = elevations[i];
            peak = samples[i].at;
        }
        let (sun_ra, sun_dec) = sun_ra_dec(samples[i].at);
        let sep = angular_separation(samples[i].ra_deg, samples[i].dec_deg, sun_ra, sun_dec);
        sun_min_sep = sun_min_sep.min(sep);
    }

    let status = if start <= now && now <= end {
        PassStatus::Now
    } else if end < now {
        PassStatus::Past
    } else {
        PassStatus::Future
    };

    Pass {
        complex,
        start,
        peak,
        end,
        max_el_deg: max_el,
        sun_min_sep_deg: sun_min_sep,
        status,
    }
}

/// Instant where elevation crosses the pass threshold between two samples.
fn interpolate_threshold(
    t1: DateTime<Utc>,
    el1: f64,
    t2: DateTime<Utc>,
    el2: f64,
) -> DateTime<Utc> {
    let span = el2 - el1;
    if span.abs() < 1e-12 {
        return t1;
    }
    let fraction = ((MIN_PASS_ELEVATION_DEG - el1) / span).clamp(0.0, 1.0);
    let dt_ms = (t2 - t1).num_milliseconds() as f64;
    t1 + Duration::milliseconds((fraction * dt_ms).round() as i64)
}
