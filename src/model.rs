//! DSN entity types.
//!
//! Everything here is an immutable value produced by the feed parser and
//! replaced wholesale by the next snapshot. Caches hold owning copies;
//! nothing mutates a snapshot in place.

use crate::location::Observer;
use crate::time::SPEED_OF_LIGHT_KM_S;
use chrono::{DateTime, Utc};

/// One of the three Deep Space Network ground complexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Complex {
    Goldstone,
    Canberra,
    Madrid,
}

impl Complex {
    /// All complexes, in canonical order (GDS < CDS < MDS).
    pub const ALL: [Complex; 3] = [Complex::Goldstone, Complex::Canberra, Complex::Madrid];

    /// Short site code as used by the feed ("gdscc", "cdscc", "mdscc").
    pub fn code(&self) -> &'static str {
        match self {
            Complex::Goldstone => "gdscc",
            Complex::Canberra => "cdscc",
            Complex::Madrid => "mdscc",
        }
    }

    /// Human-readable site name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Complex::Goldstone => "Goldstone",
            Complex::Canberra => "Canberra",
            Complex::Madrid => "Madrid",
        }
    }

    /// The complex's geographic location.
    pub fn observer(&self) -> Observer {
        match self {
            Complex::Goldstone => Observer::at(35.4267, -116.8900, "Goldstone"),
            Complex::Canberra => Observer::at(-35.4014, 148.9817, "Canberra"),
            Complex::Madrid => Observer::at(40.4314, -4.2481, "Madrid"),
        }
    }

    /// The next complex to the west; Earth's rotation hands setting
    /// spacecraft off in this direction (GDS→CDS→MDS→GDS).
    pub fn west_neighbor(&self) -> Complex {
        match self {
            Complex::Goldstone => Complex::Canberra,
            Complex::Canberra => Complex::Madrid,
            Complex::Madrid => Complex::Goldstone,
        }
    }

    /// Infers the complex from a DSS station number. Leading digit 1–2 is
    /// Goldstone, 3–4 Canberra, 5–6 Madrid.
    pub fn from_dss_number(dss: u32) -> Option<Complex> {
        match dss / 10 {
            1 | 2 => Some(Complex::Goldstone),
            3 | 4 => Some(Complex::Canberra),
            5 | 6 => Some(Complex::Madrid),
            _ => None,
        }
    }

    /// Matches the literal complex names used by the feed's station headers.
    pub fn from_name(name: &str) -> Option<Complex> {
        let lower = name.to_ascii_lowercase();
        if lower.contains("gdscc") || lower.contains("goldstone") {
            Some(Complex::Goldstone)
        } else if lower.contains("cdscc") || lower.contains("canberra") {
            Some(Complex::Canberra)
        } else if lower.contains("mdscc") || lower.contains("madrid") {
            Some(Complex::Madrid)
        } else {
            None
        }
    }
}

/// Radio band of a space link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Uhf,
    S,
    X,
    Ka,
    Unknown,
}

impl Band {
    /// Parses the single-letter band tag the feed attaches to signals.
    pub fn from_tag(tag: &str) -> Band {
        match tag.trim().to_ascii_uppercase().as_str() {
            "UHF" => Band::Uhf,
            "S" => Band::S,
            "X" => Band::X,
            "KA" => Band::Ka,
            _ => Band::Unknown,
        }
    }

    /// Infers the band from a carrier frequency in Hz.
    pub fn from_frequency_hz(f: f64) -> Band {
        match f {
            f if f >= 0.3e9 && f < 1.0e9 => Band::Uhf,
            f if f >= 2.0e9 && f < 4.0e9 => Band::S,
            f if f >= 8.0e9 && f < 12.0e9 => Band::X,
            f if f >= 31.0e9 && f < 40.0e9 => Band::Ka,
            _ => Band::Unknown,
        }
    }

    /// Nominal deep-space downlink center frequency for the band, in Hz.
    /// Used by the Doppler view when the feed omits the carrier.
    pub fn center_frequency_hz(&self) -> Option<f64> {
        match self {
            Band::Uhf => Some(0.435e9),
            Band::S => Some(2.295e9),
            Band::X => Some(8.420e9),
            Band::Ka => Some(32.0e9),
            Band::Unknown => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::Uhf => "UHF",
            Band::S => "S",
            Band::X => "X",
            Band::Ka => "Ka",
            Band::Unknown => "?",
        }
    }
}

/// A station header from the feed: one per complex.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Feed site code, e.g. "gdscc"
    pub name: String,
    /// Display name, e.g. "Goldstone"
    pub friendly_name: String,
    /// Which complex this station is
    pub complex: Option<Complex>,
    /// Station-reported UTC time, when the header carried one
    pub utc_time: Option<DateTime<Utc>>,
    /// Local timezone offset from UTC, hours
    pub tz_offset_hours: f64,
    /// Dishes parsed under this header
    pub antennas: Vec<Antenna>,
}

/// One dish and its current pointing/activity.
#[derive(Debug, Clone, PartialEq)]
pub struct Antenna {
    /// Stable identifier, normalized to "DSS-NN"
    pub id: String,
    /// DSS station number (14, 43, 63, ...)
    pub dss: u32,
    /// Azimuth in degrees, `[0, 360)`
    pub azimuth_deg: f64,
    /// Elevation in degrees, `[-90, 90]`
    pub elevation_deg: f64,
    /// Wind speed at the site, km/h
    pub wind_kph: f64,
    /// Activity string from the feed ("track", "maintenance", ...)
    pub activity: String,
    /// Multiple-spacecraft-per-aperture flag
    pub mspa: bool,
    /// Arrayed-antenna flag
    pub array: bool,
    /// Delta-DOR session flag
    pub ddor: bool,
    /// Spacecraft under track
    pub targets: Vec<Target>,
    /// Downlink signals
    pub down_signals: Vec<Signal>,
    /// Uplink signals
    pub up_signals: Vec<Signal>,
}

/// A spacecraft entry under an antenna.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// Feed spacecraft id (NAIF convention, sign as given)
    pub id: i64,
    /// Spacecraft code, e.g. "VGR1"
    pub name: String,
    /// Downleg range in km
    pub downleg_range_km: f64,
    /// Upleg range in km
    pub upleg_range_km: f64,
    /// Round-trip light time in seconds
    pub rtlt_s: f64,
}

/// One up- or down-link signal on an antenna.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Whether the signal is currently active
    pub active: bool,
    /// Signal type string ("data", "carrier", "none", ...)
    pub signal_type: String,
    /// Data rate in bits per second
    pub data_rate_bps: f64,
    /// Carrier frequency in Hz
    pub frequency_hz: f64,
    /// Band tag as carried by the feed
    pub band: Band,
    /// Transmit/receive power as reported
    pub power: f64,
    /// Spacecraft code this signal belongs to
    pub spacecraft: String,
    /// Spacecraft id this signal belongs to
    pub spacecraft_id: i64,
}

/// A flattened antenna↔spacecraft association, the unit most derivations
/// work on. A spacecraft being arrayed across several dishes appears as one
/// link per dish.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Antenna identifier, normalized "DSS-NN"
    pub antenna_id: String,
    /// DSS station number, for ordering
    pub dss: u32,
    /// Hosting complex
    pub complex: Complex,
    /// Spacecraft code
    pub spacecraft: String,
    /// Spacecraft id
    pub spacecraft_id: i64,
    /// Link band
    pub band: Band,
    /// Best matching data rate in bps (max of up/down)
    pub data_rate_bps: f64,
    /// Carrier frequency in Hz (0 when the feed omits it)
    pub frequency_hz: f64,
    /// Round-trip light time in seconds
    pub rtlt_s: f64,
    /// One-way distance derived from RTLT, km
    pub distance_km: f64,
    /// Antenna azimuth at snapshot time, degrees
    pub azimuth_deg: f64,
    /// Antenna elevation at snapshot time, degrees
    pub elevation_deg: f64,
    /// Normalized signal quality in [0, 1], when a source provides one
    pub signal_quality: Option<f64>,
}

/// One-way distance from a round-trip light time.
///
/// `distance = max(0, RTLT / 2 × c)`; negative RTLTs from feed glitches
/// clamp to zero rather than propagate.
pub fn distance_from_rtlt_km(rtlt_s: f64) -> f64 {
    (rtlt_s / 2.0 * SPEED_OF_LIGHT_KM_S).max(0.0)
}

/// A parsed feed snapshot: everything the derivation layer needs, plus any
/// non-fatal parse warnings that accumulated along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DsnData {
    /// Feed timestamp, when present
    pub timestamp: Option<DateTime<Utc>>,
    /// Station headers with their dishes
    pub stations: Vec<Station>,
    /// Flattened links across all stations
    pub links: Vec<Link>,
    /// Non-fatal parse warnings
    pub errors: Vec<String>,
}

impl DsnData {
    /// Total dish count across all stations.
    pub fn antenna_count(&self) -> usize {
        self.stations.iter().map(|s| s.antennas.len()).sum()
    }

    /// Links hosted at one complex.
    pub fn links_at(&self, complex: Complex) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.complex == complex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_from_dss_number() {
        assert_eq!(Complex::from_dss_number(14), Some(Complex::Goldstone));
        assert_eq!(Complex::from_dss_number(26), Some(Complex::Goldstone));
        assert_eq!(Complex::from_dss_number(34), Some(Complex::Canberra));
        assert_eq!(Complex::from_dss_number(43), Some(Complex::Canberra));
        assert_eq!(Complex::from_dss_number(55), Some(Complex::Madrid));
        assert_eq!(Complex::from_dss_number(63), Some(Complex::Madrid));
        assert_eq!(Complex::from_dss_number(99), None);
    }

    #[test]
    fn test_west_neighbor_cycles() {
        let mut c = Complex::Goldstone;
        for _ in 0..3 {
            c = c.west_neighbor();
        }
        assert_eq!(c, Complex::Goldstone);
    }

    #[test]
    fn test_band_inference() {
        assert_eq!(Band::from_frequency_hz(8.42e9), Band::X);
        assert_eq!(Band::from_frequency_hz(2.3e9), Band::S);
        assert_eq!(Band::from_frequency_hz(32.0e9), Band::Ka);
        assert_eq!(Band::from_frequency_hz(0.44e9), Band::Uhf);
        assert_eq!(Band::from_frequency_hz(5.0e9), Band::Unknown);
        assert_eq!(Band::from_frequency_hz(0.0), Band::Unknown);
    }

    #[test]
    fn test_distance_from_rtlt() {
        // 1000 s round trip is ~500 light-seconds one way
        let d = distance_from_rtlt_km(1000.0);
        assert!((d - 500.0 * 299_792.458).abs() < 1e-6);
        assert_eq!(distance_from_rtlt_km(-5.0), 0.0);
    }

    #[test]
    fn test_complex_order() {
        assert!(Complex::Goldstone < Complex::Canberra);
        assert!(Complex::Canberra < Complex::Madrid);
    }
}
