//! End-to-end scenarios exercising the fused stack.

use crate::coords::{RaDecSample, Vec3};
use crate::diff::diff_snapshots;
use crate::doppler::doppler_from_state;
use crate::location::Observer;
use crate::model::Complex;
use crate::parse::parse_dsn_xml;
use crate::passes::{plan_passes, PassStatus};
use crate::visibility::solve_visibility;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn fixed_arc(ra: f64, dec: f64, start: DateTime<Utc>, count: i64, step_h: i64) -> Vec<RaDecSample> {
    (0..=count)
        .map(|i| RaDecSample {
            at: start + Duration::hours(i * step_h),
            ra_deg: ra,
            dec_deg: dec,
        })
        .collect()
}

#[test]
fn scenario_vega_from_goldstone() {
    let start = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
    let samples = fixed_arc(279.235, 38.784, start, 24, 1);
    let obs = Observer::at(35.4267, -116.89, "Goldstone");

    let window = solve_visibility(&obs, &samples).unwrap();
    assert!(window.valid);
    assert!(!window.always_visible);
    assert!(!window.never_visible);
    assert!(window.max_elevation_deg >= 0.0);

    let transit = window.transit.expect("Vega transits");
    assert!(transit >= start && transit <= samples.last().unwrap().at);
}

#[test]
fn scenario_polaris_from_far_north() {
    let start = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
    let samples = fixed_arc(37.955, 89.264, start, 24, 1);
    let obs = Observer::at(89.0, 0.0, "drifting station");

    let window = solve_visibility(&obs, &samples).unwrap();
    assert!(window.always_visible);
    assert!(
        (85.0..=90.0).contains(&window.max_elevation_deg),
        "max el {}",
        window.max_elevation_deg
    );
}

#[test]
fn scenario_canopus_from_far_north() {
    let start = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
    let samples = fixed_arc(95.988, -52.696, start, 24, 1);
    let obs = Observer::at(89.0, 0.0, "drifting station");

    let window = solve_visibility(&obs, &samples).unwrap();
    assert!(window.never_visible);
}

fn one_link_snapshot(entries: &[(&str, &str)]) -> crate::model::DsnData {
    // (dish, spacecraft) pairs; dish number decides the complex
    let mut xml = String::from("<dsn>");
    for (dish, craft) in entries {
        let station = match dish.chars().nth(3).and_then(|c| c.to_digit(10)) {
            Some(1) | Some(2) => "gdscc",
            Some(3) | Some(4) => "cdscc",
            _ => "mdscc",
        };
        xml.push_str(&format!(
            "<station name=\"{station}\" friendlyName=\"{station}\"/>\
             <dish name=\"{dish}\" elevationAngle=\"30\" azimuthAngle=\"120\" activity=\"track\">\
             <downSignal signalType=\"data\" dataRate=\"100000\" frequency=\"8420000000\" band=\"X\" spacecraft=\"{craft}\" spacecraftID=\"-70\"/>\
             <target name=\"{craft}\" id=\"-70\" rtlt=\"1000\"/></dish>"
        ));
    }
    xml.push_str("</dsn>");
    parse_dsn_xml(&xml).unwrap()
}

#[test]
fn scenario_handoff_diff() {
    let prev = one_link_snapshot(&[("DSS14", "ALPHA"), ("DSS43", "BETA")]);
    let curr = one_link_snapshot(&[("DSS63", "ALPHA"), ("DSS14", "GAMMA")]);

    let diff = diff_snapshots(Some(&prev), &curr);
    assert_eq!(diff.new_links, vec!["GAMMA".to_string()]);
    assert_eq!(diff.lost_links, vec!["BETA".to_string()]);
    assert_eq!(diff.handoffs.len(), 1);

    let handoff = &diff.handoffs[0];
    assert_eq!(handoff.spacecraft, "ALPHA");
    assert_eq!(handoff.from, "DSS-14");
    assert_eq!(handoff.to, "DSS-63");

    // The stations really are at different complexes
    assert_eq!(
        prev.links
            .iter()
            .find(|l| l.spacecraft == "ALPHA")
            .unwrap()
            .complex,
        Complex::Goldstone
    );
    assert_eq!(
        curr.links
            .iter()
            .find(|l| l.spacecraft == "ALPHA")
            .unwrap()
            .complex,
        Complex::Madrid
    );
}

#[test]
fn scenario_near_geostationary_doppler() {
    let obs = Observer::at(0.0, 0.0, "equatorial site");
    let est = doppler_from_state(
        &obs,
        Vec3::new(0.0, 0.0, 42_164.0),
        Vec3::new(0.0, 0.0, -1.0),
        8.42e9,
    )
    .expect("geometry is fine");

    assert!(est.los_velocity_km_s < 0.0, "target approaches");
    // |Δf| bounded by a 2 km/s closing speed at X band
    let bound = 2.0 * 8.42e9 / 299_792.458;
    assert!(est.shift_hz.abs() < bound, "shift {}", est.shift_hz);
}

#[test]
fn scenario_zenith_pass_is_now() {
    let now = Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap();
    let goldstone = Complex::Goldstone.observer();

    // Place the target at Goldstone's zenith at `now`
    let ra = goldstone.local_sidereal_time(now);
    let dec = goldstone.latitude_deg;

    let start = now - Duration::hours(12);
    let samples: Vec<RaDecSample> = (0..=96)
        .map(|i| RaDecSample {
            at: start + Duration::minutes(15 * i),
            ra_deg: ra,
            dec_deg: dec,
        })
        .collect();

    let plan = plan_passes("ZENITH", &samples, now).unwrap();

    // NOW is exactly the set of passes bracketing `now`
    for pass in &plan.passes {
        let contains_now = pass.start <= now && now <= pass.end;
        assert_eq!(pass.status == PassStatus::Now, contains_now);
    }

    // Goldstone hosts exactly one of them, peaking at the zenith
    let goldstone_now: Vec<_> = plan
        .passes
        .iter()
        .filter(|p| p.complex == Complex::Goldstone && p.status == PassStatus::Now)
        .collect();
    assert_eq!(goldstone_now.len(), 1, "exactly one NOW pass at Goldstone");
    assert!(goldstone_now[0].max_el_deg > 80.0, "zenith pass peaks near 90");

    // And at most one pass network-wide is promoted to NEXT
    let next_count = plan
        .passes
        .iter()
        .filter(|p| p.status == PassStatus::Next)
        .count();
    assert!(next_count <= 1);
}
