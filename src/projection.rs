// Top-down solar-system projection used by the orrery views.

use crate::coords::Vec3;
use crate::transforms::{equatorial_to_ecliptic, ra_dec_unit_vector};

/// Heliocentric shell radius, in AU, on which catalog stars are placed
/// so that they project outside every planetary orbit.
pub const STAR_SHELL_RADIUS_AU: f64 = 100.0;

/// How radial distance maps to display radius in the top-down view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadialScale {
    /// Logarithmic compression of the full system: `log10(r + 1)`
    LogR,
    /// Linear inner-system view, clamped at 5 AU
    Inner,
    /// Piecewise: linear to 5 AU, logarithmic beyond
    Outer,
}

/// Applies the selected radial scaling to a heliocentric distance in AU.
///
/// # Example
///
/// ```
/// use dsn_watch::projection::{scale_radius, RadialScale};
///
/// assert_eq!(scale_radius(0.0, RadialScale::LogR), 0.0);
/// assert_eq!(scale_radius(3.0, RadialScale::Inner), 3.0);
/// assert_eq!(scale_radius(40.0, RadialScale::Inner), 5.0);
/// ```
pub fn scale_radius(r: f64, mode: RadialScale) -> f64 {
    match mode {
        RadialScale::LogR => (r + 1.0).log10(),
        RadialScale::Inner => r.min(5.0),
        RadialScale::Outer => {
            if r <= 5.0 {
                r / 10.0
            } else {
                0.5 + (r / 5.0 + 1.0).log10() * 0.5
            }
        }
    }
}

/// Flattens an ecliptic-frame position into polar display coordinates.
///
/// The Z component is discarded; the ecliptic plane is the screen plane.
///
/// # Returns
///
/// `(angle_rad, display_radius)` where the angle is `atan2(y, x)` and the
/// radius has the selected scaling applied.
pub fn project_ecliptic(pos: Vec3, mode: RadialScale) -> (f64, f64) {
    let angle = pos.y.atan2(pos.x);
    let r = (pos.x * pos.x + pos.y * pos.y).sqrt();
    (angle, scale_radius(r, mode))
}

/// Places a J2000 star direction on the heliocentric star shell, in the
/// ecliptic frame, ready for [`project_ecliptic`].
///
/// # Example
///
/// ```
/// use dsn_watch::projection::{star_shell_position, STAR_SHELL_RADIUS_AU};
///
/// let pos = star_shell_position(279.235, 38.784);
/// assert!((pos.norm() - STAR_SHELL_RADIUS_AU).abs() < 1e-9);
/// ```
pub fn star_shell_position(ra_deg: f64, dec_deg: f64) -> Vec3 {
    let unit = ra_dec_unit_vector(ra_deg, dec_deg);
    equatorial_to_ecliptic(unit) * STAR_SHELL_RADIUS_AU
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logr_monotone() {
        let mut last = -1.0;
        for i in 0..100 {
            let r = i as f64 * 0.5;
            let s = scale_radius(r, RadialScale::LogR);
            assert!(s > last);
            last = s;
        }
    }

    #[test]
    fn test_outer_continuous_at_knee() {
        // The two branches meet at r = 5
        let below = scale_radius(5.0, RadialScale::Outer);
        let above = scale_radius(5.0 + 1e-9, RadialScale::Outer);
        assert!((below - 0.5).abs() < 1e-12);
        assert!((above - below).abs() < 1e-6);
    }

    #[test]
    fn test_project_angle() {
        let (angle, r) = project_ecliptic(Vec3::new(0.0, 2.0, 0.7), RadialScale::Inner);
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((r - 2.0).abs() < 1e-12);
    }
}
