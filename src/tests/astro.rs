use crate::coords::{RaDecSample, Vec3};
use crate::doppler::geodetic_to_ecef;
use crate::location::Observer;
use crate::sidereal::{gmst, local_sidereal_time};
use crate::time::{format_light_time, julian_date, light_time_s, AU_KM, JD2000};
use crate::transforms::{
    ecliptic_to_equatorial, equatorial_to_ecliptic, ra_dec_to_el_az,
};
use crate::visibility::solve_visibility;
use approx::assert_abs_diff_eq;
use chrono::{Duration, TimeZone, Utc};

#[test]
fn test_gmst_at_j2000() {
    let theta = gmst(JD2000);
    assert!((theta - 280.46).abs() < 0.1, "GMST(J2000) = {theta}");
}

#[test]
fn test_lst_at_zero_longitude_is_gmst() {
    for offset in [0.0, 0.25, 113.7, 8123.456] {
        let jd = JD2000 + offset;
        assert!(
            (local_sidereal_time(jd, 0.0) - gmst(jd)).abs() < 1e-3,
            "LST != GMST at jd {jd}"
        );
    }
}

#[test]
fn test_ecliptic_roundtrip_to_1e10() {
    let vectors = [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(-3.7, 42.0, -0.001),
        Vec3::new(1e8, -2e7, 5e6),
    ];
    for v in vectors {
        let back = ecliptic_to_equatorial(equatorial_to_ecliptic(v));
        let eps = 1e-10 * v.norm().max(1.0);
        assert_abs_diff_eq!(back.x, v.x, epsilon = eps);
        assert_abs_diff_eq!(back.y, v.y, epsilon = eps);
        assert_abs_diff_eq!(back.z, v.z, epsilon = eps);
    }
}

#[test]
fn test_horizontal_output_ranges_everywhere() {
    let observers = [
        Observer::at(35.4267, -116.89, "Goldstone"),
        Observer::at(-35.4014, 148.9817, "Canberra"),
        Observer::at(40.4314, -4.2481, "Madrid"),
        Observer::at(89.0, 0.0, "near north pole"),
        Observer::at(-89.0, 0.0, "near south pole"),
    ];
    let dt = Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap();
    for obs in &observers {
        for ra in (0..360).step_by(45) {
            for dec in (-90..=90).step_by(30) {
                let (el, az) = ra_dec_to_el_az(ra as f64, dec as f64, dt, obs);
                assert!((0.0..360.0).contains(&az), "az {az}");
                assert!((-90.0..=90.0).contains(&el), "el {el}");
            }
        }
    }
}

#[test]
fn test_polaris_elevation_tracks_latitude() {
    // Polaris sits at the pole to within ~0.75 degrees, so its elevation
    // approximates the observer's latitude at any hour
    let dt0 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    for lat in [25.0, 35.4267, 50.0, 70.0] {
        let obs = Observer::at(lat, -116.89, "northern site");
        for hour in [0, 6, 12, 18] {
            let (el, _) = ra_dec_to_el_az(37.955, 89.264, dt0 + Duration::hours(hour), &obs);
            assert!(
                (el - lat).abs() < 5.0,
                "Polaris at {el} from latitude {lat}"
            );
        }
    }
}

#[test]
fn test_deep_southern_target_never_rises_from_north() {
    // Dec below -(90 - lat) stays under the horizon for a northern site
    let lat = 40.0;
    let dec = -(90.0 - lat) - 5.0;
    let obs = Observer::at(lat, -4.2481, "northern site");
    let start = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
    let samples: Vec<RaDecSample> = (0..=48)
        .map(|i| RaDecSample {
            at: start + Duration::minutes(30 * i),
            ra_deg: 200.0,
            dec_deg: dec,
        })
        .collect();
    let window = solve_visibility(&obs, &samples).unwrap();
    assert!(window.never_visible);
}

#[test]
fn test_transit_elevation_matches_colatitude() {
    let obs = Observer::at(-35.4014, 148.9817, "Canberra");
    let dec = -60.0;
    let start = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
    let samples: Vec<RaDecSample> = (0..=24)
        .map(|i| RaDecSample {
            at: start + Duration::hours(i),
            ra_deg: 120.0,
            dec_deg: dec,
        })
        .collect();
    let window = solve_visibility(&obs, &samples).unwrap();
    let expected = 90.0 - (obs.latitude_deg - dec).abs();
    assert!(
        (window.max_elevation_deg - expected).abs() < 5.0,
        "max el {} vs {}",
        window.max_elevation_deg,
        expected
    );
}

#[test]
fn test_light_time_round_trip() {
    assert_eq!(format_light_time(light_time_s(AU_KM)), "8m19s");
}

#[test]
fn test_observer_ecef_radius() {
    for lat in [-89.0, -45.0, -10.0, 0.0, 35.4267, 66.5, 89.9] {
        let r = geodetic_to_ecef(lat, 77.0).norm();
        assert!((6350.0..6400.0).contains(&r), "radius {r} at lat {lat}");
    }
}

#[test]
fn test_julian_date_continuity_across_midnight() {
    let before = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    let after = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 1).unwrap();
    let delta = julian_date(after) - julian_date(before);
    assert!((delta - 2.0 / 86400.0).abs() < 1e-9);
}
