//! JSON export of the fused snapshot state.

use crate::derive::{complex_utilization, link_health, link_struggle};
use crate::error::{DsnError, Result};
use crate::model::{Complex, DsnData};
use serde::Serialize;

/// Serializable view of one antenna.
#[derive(Debug, Clone, Serialize)]
pub struct AntennaExport {
    pub id: String,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub activity: String,
}

/// Serializable view of one station with its antennas.
#[derive(Debug, Clone, Serialize)]
pub struct StationExport {
    pub name: String,
    pub friendly_name: String,
    pub complex: Option<&'static str>,
    pub antennas: Vec<AntennaExport>,
}

/// Serializable view of one link, augmented with the derived health data.
#[derive(Debug, Clone, Serialize)]
pub struct LinkExport {
    pub antenna: String,
    pub complex: &'static str,
    pub spacecraft: String,
    pub spacecraft_id: i64,
    pub band: &'static str,
    pub data_rate_bps: f64,
    pub distance_km: f64,
    pub rtlt_s: f64,
    pub struggle_index: f64,
    pub health: &'static str,
}

/// Per-complex load fraction.
#[derive(Debug, Clone, Serialize)]
pub struct UtilizationExport {
    pub complex: &'static str,
    pub load: f64,
}

/// The full fused snapshot, ready for JSON serialization.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotExport {
    /// Feed timestamp in RFC 3339, when the feed carried one
    pub timestamp: Option<String>,
    pub stations: Vec<StationExport>,
    pub links: Vec<LinkExport>,
    pub utilization: Vec<UtilizationExport>,
    /// Parse warnings that accumulated while reading the feed
    pub warnings: Vec<String>,
}

/// Builds the export view of a snapshot.
pub fn export_snapshot(data: &DsnData) -> SnapshotExport {
    let stations = data
        .stations
        .iter()
        .map(|s| StationExport {
            name: s.name.clone(),
            friendly_name: s.friendly_name.clone(),
            complex: s.complex.map(|c| c.code()),
            antennas: s
                .antennas
                .iter()
                .map(|a| AntennaExport {
                    id: a.id.clone(),
                    azimuth_deg: a.azimuth_deg,
                    elevation_deg: a.elevation_deg,
                    activity: a.activity.clone(),
                })
                .collect(),
        })
        .collect();

    let links = data
        .links
        .iter()
        .map(|l| LinkExport {
            antenna: l.antenna_id.clone(),
            complex: l.complex.code(),
            spacecraft: l.spacecraft.clone(),
            spacecraft_id: l.spacecraft_id,
            band: l.band.label(),
            data_rate_bps: l.data_rate_bps,
            distance_km: l.distance_km,
            rtlt_s: l.rtlt_s,
            struggle_index: link_struggle(l),
            health: link_health(l).label(),
        })
        .collect();

    let utilization = Complex::ALL
        .iter()
        .map(|&c| UtilizationExport {
            complex: c.code(),
            load: complex_utilization(data, c),
        })
        .collect();

    SnapshotExport {
        timestamp: data.timestamp.map(|t| t.to_rfc3339()),
        stations,
        links,
        utilization,
        warnings: data.errors.clone(),
    }
}

/// Serializes the export view to a JSON string.
pub fn to_json(export: &SnapshotExport) -> Result<String> {
    serde_json::to_string_pretty(export).map_err(|e| DsnError::ParseError {
        reason: format!("JSON encode: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_dsn_xml;

    #[test]
    fn test_export_shape() {
        let xml = r#"<dsn>
          <station name="gdscc" friendlyName="Goldstone"/>
          <dish name="DSS14" azimuthAngle="120" elevationAngle="45" activity="track">
            <downSignal signalType="data" dataRate="160000" frequency="8420000000" band="X" spacecraft="VGR1" spacecraftID="-31"/>
            <target name="VGR1" id="-31" rtlt="160000"/>
          </dish>
          <timestamp>1721001600000</timestamp>
        </dsn>"#;
        let data = parse_dsn_xml(xml).unwrap();
        let export = export_snapshot(&data);

        assert_eq!(export.stations.len(), 1);
        assert_eq!(export.links.len(), 1);
        assert_eq!(export.utilization.len(), 3);
        assert!(export.timestamp.is_some());

        let link = &export.links[0];
        assert_eq!(link.band, "X");
        assert!((0.0..=1.0).contains(&link.struggle_index));
        assert!(["GOOD", "MARGINAL", "POOR"].contains(&link.health));

        let json = to_json(&export).unwrap();
        assert!(json.contains("\"struggle_index\""));
        assert!(json.contains("\"gdscc\""));
    }
}
