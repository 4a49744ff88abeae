//! DSN XML feed parsing.
//!
//! The feed's root element interleaves `<station>` headers with `<dish>`
//! siblings; each dish carries `<target>`, `<downSignal>` and `<upSignal>`
//! children whose attributes are all strings. Numeric attributes may be
//! absent, empty, `"none"` or `"null"`; those decode to 0 silently. A
//! value that is present but unparseable also decodes to 0 but leaves a
//! warning in the snapshot's error list; one bad field never fails the
//! whole feed.

use crate::error::{DsnError, Result};
use crate::model::{
    distance_from_rtlt_km, Antenna, Band, Complex, DsnData, Link, Signal, Station, Target,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;

static DSS_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)dss[-\s]?0*(\d+)").unwrap());

/// Parses the DSN XML feed into a snapshot.
///
/// Structural XML errors are fatal; everything else degrades to warnings
/// collected in [`DsnData::errors`].
///
/// # Example
///
/// ```
/// use dsn_watch::parse::parse_dsn_xml;
///
/// let xml = r#"<dsn>
///   <station name="gdscc" friendlyName="Goldstone" timeUTC="1721001600000" timeZoneOffset="-28800000"/>
///   <dish name="DSS14" azimuthAngle="120.5" elevationAngle="45.2" windSpeed="9" activity="track">
///     <downSignal signalType="data" dataRate="160000" frequency="8420000000" band="X" power="-120.3" spacecraft="VGR1" spacecraftID="-31"/>
///     <target name="VGR1" id="-31" uplegRange="2.4e10" downlegRange="2.4e10" rtlt="160000"/>
///   </dish>
///   <timestamp>1721001600000</timestamp>
/// </dsn>"#;
///
/// let data = parse_dsn_xml(xml).unwrap();
/// assert_eq!(data.links.len(), 1);
/// assert_eq!(data.links[0].antenna_id, "DSS-14");
/// assert!(data.errors.is_empty());
/// ```
pub fn parse_dsn_xml(xml: &str) -> Result<DsnData> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut data = DsnData::default();
    let mut antenna: Option<Antenna> = None;
    let mut in_timestamp = false;

    loop {
        let event = reader.read_event().map_err(|e| DsnError::ParseError {
            reason: format!("XML error at byte {}: {e}", reader.buffer_position()),
        })?;
        let is_empty = matches!(&event, Event::Empty(_));
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                match e.name().as_ref() {
                    b"station" => {
                        // A dangling dish without its closing tag would be
                        // lost here, which the warning makes visible.
                        if let Some(a) = antenna.take() {
                            data.errors.push(format!("dish {} never closed", a.id));
                            finish_dish(&mut data, a);
                        }
                        data.stations.push(parse_station(e, &mut data.errors));
                    }
                    b"dish" => {
                        if let Some(a) = antenna.take() {
                            data.errors.push(format!("dish {} never closed", a.id));
                            finish_dish(&mut data, a);
                        }
                        let parsed = parse_dish(e, &mut data.errors);
                        if is_empty {
                            finish_dish(&mut data, parsed);
                        } else {
                            antenna = Some(parsed);
                        }
                    }
                    b"target" => {
                        if let Some(a) = antenna.as_mut() {
                            a.targets.push(parse_target(e, &a.id, &mut data.errors));
                        }
                    }
                    b"downSignal" => {
                        if let Some(a) = antenna.as_mut() {
                            a.down_signals.push(parse_signal(e, &a.id, &mut data.errors));
                        }
                    }
                    b"upSignal" => {
                        if let Some(a) = antenna.as_mut() {
                            a.up_signals.push(parse_signal(e, &a.id, &mut data.errors));
                        }
                    }
                    b"timestamp" => in_timestamp = !is_empty,
                    _ => {}
                }
            }
            Event::End(ref e) => match e.name().as_ref() {
                b"dish" => {
                    if let Some(a) = antenna.take() {
                        finish_dish(&mut data, a);
                    }
                }
                b"timestamp" => in_timestamp = false,
                _ => {}
            },
            Event::Text(ref t) => {
                if in_timestamp {
                    if let Ok(raw) = t.unescape() {
                        let raw = raw.trim();
                        data.timestamp = parse_feed_timestamp(raw);
                        if data.timestamp.is_none() && !raw.is_empty() {
                            data.errors.push(format!("unparseable timestamp '{raw}'"));
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(a) = antenna.take() {
        data.errors.push(format!("dish {} never closed", a.id));
        finish_dish(&mut data, a);
    }

    debug!(
        "parsed snapshot: {} stations, {} links, {} warnings",
        data.stations.len(),
        data.links.len(),
        data.errors.len()
    );
    for w in &data.errors {
        warn!("feed warning: {w}");
    }

    Ok(data)
}

/// Tries the timestamp formats the feed has been seen to use, in order:
/// RFC 3339, bare ISO-8601 date-times, then Unix milliseconds.
pub fn parse_feed_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let millis: i64 = s.parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

fn attributes(e: &BytesStart) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            (
                String::from_utf8_lossy(a.key.as_ref()).to_string(),
                a.unescape_value().map(|v| v.to_string()).unwrap_or_default(),
            )
        })
        .collect()
}

/// Lenient numeric attribute: absent/empty/"none"/"null" are 0 without
/// comment, anything else unparseable is 0 with a warning.
fn lenient_f64(
    attrs: &HashMap<String, String>,
    key: &str,
    context: &str,
    warnings: &mut Vec<String>,
) -> f64 {
    match attrs.get(key).map(|s| s.trim()) {
        None | Some("") | Some("none") | Some("null") => 0.0,
        Some(v) => v.parse().unwrap_or_else(|_| {
            warnings.push(format!("{context}: bad {key} '{v}'"));
            0.0
        }),
    }
}

fn lenient_i64(
    attrs: &HashMap<String, String>,
    key: &str,
    context: &str,
    warnings: &mut Vec<String>,
) -> i64 {
    match attrs.get(key).map(|s| s.trim()) {
        None | Some("") | Some("none") | Some("null") => 0,
        Some(v) => v.parse().unwrap_or_else(|_| {
            warnings.push(format!("{context}: bad {key} '{v}'"));
            0
        }),
    }
}

fn lenient_bool(attrs: &HashMap<String, String>, key: &str) -> bool {
    attrs
        .get(key)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn string_attr(attrs: &HashMap<String, String>, key: &str) -> String {
    attrs.get(key).cloned().unwrap_or_default()
}

fn parse_station(e: &BytesStart, warnings: &mut Vec<String>) -> Station {
    let attrs = attributes(e);
    let name = string_attr(&attrs, "name");
    let friendly_name = string_attr(&attrs, "friendlyName");
    let complex = Complex::from_name(&name).or_else(|| Complex::from_name(&friendly_name));

    let utc_time = attrs
        .get("timeUTC")
        .and_then(|s| parse_feed_timestamp(s.trim()));
    let tz_offset_hours =
        lenient_f64(&attrs, "timeZoneOffset", &format!("station {name}"), warnings)
            / 3_600_000.0;

    Station {
        name,
        friendly_name,
        complex,
        utc_time,
        tz_offset_hours,
        antennas: Vec::new(),
    }
}

fn parse_dish(e: &BytesStart, warnings: &mut Vec<String>) -> Antenna {
    let attrs = attributes(e);
    let raw_name = string_attr(&attrs, "name");
    let dss = DSS_ID
        .captures(&raw_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    if dss == 0 && !raw_name.is_empty() {
        warnings.push(format!("dish name '{raw_name}' has no DSS number"));
    }
    let id = if dss > 0 {
        format!("DSS-{dss}")
    } else {
        raw_name.clone()
    };

    let context = format!("dish {id}");
    Antenna {
        azimuth_deg: lenient_f64(&attrs, "azimuthAngle", &context, warnings).rem_euclid(360.0),
        elevation_deg: lenient_f64(&attrs, "elevationAngle", &context, warnings)
            .clamp(-90.0, 90.0),
        wind_kph: lenient_f64(&attrs, "windSpeed", &context, warnings),
        activity: string_attr(&attrs, "activity"),
        mspa: lenient_bool(&attrs, "isMSPA"),
        array: lenient_bool(&attrs, "isArray"),
        ddor: lenient_bool(&attrs, "isDDOR"),
        targets: Vec::new(),
        down_signals: Vec::new(),
        up_signals: Vec::new(),
        id,
        dss,
    }
}

fn parse_target(e: &BytesStart, dish_id: &str, warnings: &mut Vec<String>) -> Target {
    let attrs = attributes(e);
    let name = string_attr(&attrs, "name");
    let context = format!("dish {dish_id} target {name}");
    Target {
        id: lenient_i64(&attrs, "id", &context, warnings),
        downleg_range_km: lenient_f64(&attrs, "downlegRange", &context, warnings),
        upleg_range_km: lenient_f64(&attrs, "uplegRange", &context, warnings),
        rtlt_s: lenient_f64(&attrs, "rtlt", &context, warnings),
        name,
    }
}

fn parse_signal(e: &BytesStart, dish_id: &str, warnings: &mut Vec<String>) -> Signal {
    let attrs = attributes(e);
    let signal_type = string_attr(&attrs, "signalType");
    let spacecraft = string_attr(&attrs, "spacecraft");
    let context = format!("dish {dish_id} signal {spacecraft}");

    // Older feed revisions carry an explicit active flag; newer ones encode
    // idleness as signalType="none".
    let active = if attrs.contains_key("active") {
        lenient_bool(&attrs, "active")
    } else {
        !signal_type.is_empty() && !signal_type.eq_ignore_ascii_case("none")
    };

    Signal {
        active,
        data_rate_bps: lenient_f64(&attrs, "dataRate", &context, warnings),
        frequency_hz: lenient_f64(&attrs, "frequency", &context, warnings),
        band: Band::from_tag(&string_attr(&attrs, "band")),
        power: lenient_f64(&attrs, "power", &context, warnings),
        spacecraft_id: lenient_i64(&attrs, "spacecraftID", &context, warnings),
        signal_type,
        spacecraft,
    }
}

/// Attaches a completed dish to the current station and flattens its
/// targets into links.
fn finish_dish(data: &mut DsnData, antenna: Antenna) {
    let station_complex = data.stations.last().and_then(|s| s.complex);

    // The dish's own DSS number wins; the hosting station header is the
    // fallback for odd identifiers.
    let complex = Complex::from_dss_number(antenna.dss).or(station_complex);
    let Some(complex) = complex else {
        data.errors
            .push(format!("dish {}: cannot determine complex", antenna.id));
        attach_antenna(data, antenna);
        return;
    };
    if let Some(sc) = station_complex {
        if sc != complex {
            data.errors.push(format!(
                "dish {}: DSS number says {} but station header says {}",
                antenna.id,
                complex.code(),
                sc.code()
            ));
        }
    }

    for target in &antenna.targets {
        data.links.push(build_link(&antenna, target, complex));
    }
    attach_antenna(data, antenna);
}

fn attach_antenna(data: &mut DsnData, antenna: Antenna) {
    if data.stations.is_empty() {
        // Dish arrived before any station header; keep it under an
        // anonymous station rather than drop it.
        data.stations.push(Station {
            name: String::new(),
            friendly_name: String::new(),
            complex: Complex::from_dss_number(antenna.dss),
            utc_time: None,
            tz_offset_hours: 0.0,
            antennas: Vec::new(),
        });
    }
    data.stations.last_mut().unwrap().antennas.push(antenna);
}

fn signal_matches(signal: &Signal, target: &Target) -> bool {
    (!signal.spacecraft.is_empty() && signal.spacecraft.eq_ignore_ascii_case(&target.name))
        || (signal.spacecraft_id != 0 && signal.spacecraft_id == target.id)
}

fn build_link(antenna: &Antenna, target: &Target, complex: Complex) -> Link {
    let down: Vec<&Signal> = antenna
        .down_signals
        .iter()
        .filter(|s| signal_matches(s, target))
        .collect();
    let up: Vec<&Signal> = antenna
        .up_signals
        .iter()
        .filter(|s| signal_matches(s, target))
        .collect();

    let band = down
        .iter()
        .find(|s| s.band != Band::Unknown)
        .map(|s| s.band)
        .or_else(|| {
            down.iter()
                .find(|s| s.frequency_hz > 0.0)
                .map(|s| Band::from_frequency_hz(s.frequency_hz))
        })
        .unwrap_or(Band::Unknown);

    let frequency_hz = down
        .iter()
        .map(|s| s.frequency_hz)
        .find(|&f| f > 0.0)
        .unwrap_or(0.0);

    let data_rate_bps = down
        .iter()
        .chain(up.iter())
        .map(|s| s.data_rate_bps)
        .fold(0.0, f64::max);

    Link {
        antenna_id: antenna.id.clone(),
        dss: antenna.dss,
        complex,
        spacecraft: target.name.clone(),
        spacecraft_id: target.id,
        band,
        data_rate_bps,
        frequency_hz,
        rtlt_s: target.rtlt_s,
        distance_km: distance_from_rtlt_km(target.rtlt_s),
        azimuth_deg: antenna.azimuth_deg,
        elevation_deg: antenna.elevation_deg,
        signal_quality: None,
    }
}
