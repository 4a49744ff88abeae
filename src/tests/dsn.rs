//! Feed-to-derivation integration checks on a realistic snapshot.

use crate::derive::{complex_utilization, link_health, link_struggle, predict_handoff, LinkHealth};
use crate::export::{export_snapshot, to_json};
use crate::model::{Band, Complex, DsnData};
use crate::parse::parse_dsn_xml;
use crate::views::build_views;

/// A two-complex snapshot with arraying, MSPA, a calibration target, a
/// below-horizon dish, and one malformed numeric field.
fn fixture() -> DsnData {
    let xml = r#"<dsn>
      <station name="gdscc" friendlyName="Goldstone" timeUTC="1721001600000" timeZoneOffset="-28800000"/>
      <dish name="DSS14" azimuthAngle="120.5" elevationAngle="12.0" windSpeed="14" activity="track" isMSPA="true">
        <downSignal signalType="data" dataRate="2000000" frequency="8439000000" band="X" power="-121" spacecraft="MRO" spacecraftID="-74"/>
        <downSignal signalType="carrier" dataRate="10" frequency="8446000000" spacecraft="MVN" spacecraftID="-202"/>
        <upSignal signalType="data" dataRate="2000" frequency="7183000000" band="X" spacecraft="MRO" spacecraftID="-74"/>
        <target name="MRO" id="-74" uplegRange="2.6e8" downlegRange="2.6e8" rtlt="1734"/>
        <target name="MVN" id="-202" uplegRange="2.6e8" downlegRange="2.6e8" rtlt="1736"/>
      </dish>
      <dish name="DSS26" azimuthAngle="bogus" elevationAngle="-5.0" activity="maintenance">
        <target name="DSN" id="0" rtlt="0"/>
      </dish>
      <station name="cdscc" friendlyName="Canberra" timeUTC="1721001600000" timeZoneOffset="36000000"/>
      <dish name="DSS43" azimuthAngle="50.1" elevationAngle="61.0" activity="track" isArray="true">
        <downSignal signalType="data" dataRate="160" frequency="8420432000" spacecraft="VGR2" spacecraftID="-32"/>
        <target name="VGR2" id="-32" uplegRange="1.9e10" downlegRange="1.9e10" rtlt="129000"/>
      </dish>
      <dish name="DSS35" azimuthAngle="50.3" elevationAngle="60.5" activity="track" isArray="true">
        <downSignal signalType="data" dataRate="160" frequency="8420432000" spacecraft="VGR2" spacecraftID="-32"/>
        <target name="VGR2" id="-32" uplegRange="1.9e10" downlegRange="1.9e10" rtlt="129000"/>
      </dish>
      <timestamp>1721001600000</timestamp>
    </dsn>"#;
    parse_dsn_xml(xml).unwrap()
}

#[test]
fn test_links_inherit_station_complex() {
    let data = fixture();
    for link in &data.links {
        let host = data
            .stations
            .iter()
            .find(|s| s.antennas.iter().any(|a| a.id == link.antenna_id))
            .expect("every link has a hosting station");
        assert_eq!(Some(link.complex), host.complex, "link {}", link.antenna_id);
    }
}

#[test]
fn test_malformed_numeric_warns_and_zeroes() {
    let data = fixture();
    assert!(data.errors.iter().any(|w| w.contains("azimuthAngle")));
    let dss26 = data
        .stations
        .iter()
        .flat_map(|s| &s.antennas)
        .find(|a| a.id == "DSS-26")
        .unwrap();
    assert_eq!(dss26.azimuth_deg, 0.0);
}

#[test]
fn test_mspa_dish_yields_one_link_per_target() {
    let data = fixture();
    let dss14_links: Vec<_> = data.links.iter().filter(|l| l.dss == 14).collect();
    assert_eq!(dss14_links.len(), 2);

    let mro = dss14_links.iter().find(|l| l.spacecraft == "MRO").unwrap();
    assert_eq!(mro.band, Band::X);
    // Max of up (2000) and down (2000000)
    assert_eq!(mro.data_rate_bps, 2_000_000.0);

    // MVN's down signal has no band tag; frequency inference kicks in
    let mvn = dss14_links.iter().find(|l| l.spacecraft == "MVN").unwrap();
    assert_eq!(mvn.band, Band::X);
}

#[test]
fn test_utilization_capped_by_mspa() {
    let data = fixture();
    // Goldstone: 2 dishes, 2 links on DSS-14 alone (MSPA), 0 on DSS-26
    let gds = complex_utilization(&data, Complex::Goldstone);
    assert_eq!(gds, 1.0);
    // Canberra: 2 dishes, 2 links
    let cds = complex_utilization(&data, Complex::Canberra);
    assert_eq!(cds, 1.0);
    // Madrid: no stations in this snapshot
    assert_eq!(complex_utilization(&data, Complex::Madrid), 0.0);
}

#[test]
fn test_views_filter_and_array() {
    let data = fixture();
    let views = build_views(&data);

    // DSN calibration target and the below-horizon dish are gone
    assert!(views.iter().all(|v| v.spacecraft != "DSN"));
    assert_eq!(views.len(), 3, "MRO, MVN, VGR2");

    let vgr2 = views.iter().find(|v| v.spacecraft == "VGR2").unwrap();
    assert_eq!(vgr2.links.len(), 2, "arrayed across two dishes");
    assert_eq!(vgr2.antenna_list(), "DSS-35+DSS-43");
    // Higher elevation wins the primary slot
    assert_eq!(vgr2.primary_link().antenna_id, "DSS-43");
}

#[test]
fn test_struggle_ranks_voyager_hardest() {
    let data = fixture();
    let views = build_views(&data);
    let vgr2 = views.iter().find(|v| v.spacecraft == "VGR2").unwrap();
    let mro = views.iter().find(|v| v.spacecraft == "MRO").unwrap();

    let s_vgr2 = link_struggle(vgr2.primary_link());
    let s_mro = link_struggle(mro.primary_link());
    assert!(
        s_vgr2 > s_mro,
        "Voyager 2 ({s_vgr2}) must outrank MRO ({s_mro})"
    );
    // 19 billion km at 160 bps is a struggle however high the dish points
    assert_eq!(link_health(vgr2.primary_link()), LinkHealth::Poor);
    assert_eq!(link_health(mro.primary_link()), LinkHealth::Marginal);
}

#[test]
fn test_handoff_prediction_for_low_link() {
    let data = fixture();
    let mro = data.links.iter().find(|l| l.spacecraft == "MRO").unwrap();
    // DSS-14 points at 12 degrees; the link is setting
    assert_eq!(
        predict_handoff(mro.complex, mro.elevation_deg),
        Some(Complex::Canberra)
    );

    let vgr2 = data.links.iter().find(|l| l.spacecraft == "VGR2").unwrap();
    assert_eq!(predict_handoff(vgr2.complex, vgr2.elevation_deg), None);
}

#[test]
fn test_export_round_trip_shape() {
    let data = fixture();
    let export = export_snapshot(&data);
    let json = to_json(&export).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["stations"].as_array().unwrap().len(), 2);
    // Four spacecraft links plus the DSN calibration target's
    assert_eq!(value["links"].as_array().unwrap().len(), 5);
    assert_eq!(value["utilization"].as_array().unwrap().len(), 3);
    assert!(value["warnings"].as_array().unwrap().len() >= 1);

    // Struggle and health ride along on every link
    for link in value["links"].as_array().unwrap() {
        assert!(link["struggle_index"].as_f64().unwrap() <= 1.0);
        assert!(link["health"].as_str().is_some());
    }
}
