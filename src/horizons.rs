//! Client for the JPL-Horizons-style text ephemeris service.
//!
//! Requests go out as HTTP GETs with the query in the URL; the response is
//! a JSON envelope whose `result` field holds a plain-text ephemeris
//! table framed between `$$SOE` and `$$EOE` markers. Observer tables are
//! whitespace-tokenized with the date in the first two fields; vector
//! tables are requested in CSV form. Individual lines that fail to parse
//! are skipped, since a partial table is still useful, but a response
//! without the frame markers is an error.

use crate::coords::{AzElSample, RaDecSample, Vec3};
use crate::error::{validate_dec, DsnError, Result};
use crate::location::Observer;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::debug;
use serde::Deserialize;
use std::time::Duration as StdDuration;
use url::Url;

/// Production endpoint of the ephemeris service.
pub const DEFAULT_BASE_URL: &str = "https://ssd.jpl.nasa.gov/api/horizons.api";

/// Hard timeout on every network call. No built-in retry; the caller
/// decides whether a refetch is worth it.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Envelope {
    result: String,
}

/// Blocking ephemeris client.
pub struct HorizonsClient {
    agent: ureq::Agent,
    base_url: String,
}

impl Default for HorizonsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HorizonsClient {
    /// Client against the production endpoint with the default timeout.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an alternate endpoint; used by tests and mirrors.
    pub fn with_base_url(base_url: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(DEFAULT_TIMEOUT)
            .build();
        HorizonsClient {
            agent,
            base_url: base_url.to_string(),
        }
    }

    /// Geocentric astrometric RA/Dec samples over a time span.
    pub fn radec_path(
        &self,
        naif_id: i64,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<RaDecSample>> {
        let result = self.fetch(&[
            ("COMMAND", format!("'{naif_id}'")),
            ("EPHEM_TYPE", "'OBSERVER'".into()),
            ("CENTER", "'500@399'".into()),
            ("QUANTITIES", "'1'".into()),
            ("ANG_FORMAT", "'DEG'".into()),
            ("START_TIME", time_arg(start)),
            ("STOP_TIME", time_arg(stop)),
            ("STEP_SIZE", step_arg(step_minutes)),
        ])?;
        let rows = parse_observer_table(&result)?;
        // A row with an impossible declination is just another bad line
        Ok(rows
            .into_iter()
            .filter(|&(_, _, dec)| validate_dec(dec).is_ok())
            .map(|(at, ra, dec)| RaDecSample {
                at,
                ra_deg: ra.rem_euclid(360.0),
                dec_deg: dec,
            })
            .collect())
    }

    /// Apparent azimuth/elevation samples for a ground observer.
    pub fn azel_path(
        &self,
        naif_id: i64,
        observer: &Observer,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<AzElSample>> {
        let site = format!(
            "'{:.4},{:.4},0'",
            observer.longitude_deg, observer.latitude_deg
        );
        let result = self.fetch(&[
            ("COMMAND", format!("'{naif_id}'")),
            ("EPHEM_TYPE", "'OBSERVER'".into()),
            ("CENTER", "'coord@399'".into()),
            ("COORD_TYPE", "'GEODETIC'".into()),
            ("SITE_COORD", site),
            ("QUANTITIES", "'4'".into()),
            ("START_TIME", time_arg(start)),
            ("STOP_TIME", time_arg(stop)),
            ("STEP_SIZE", step_arg(step_minutes)),
        ])?;
        let rows = parse_observer_table(&result)?;
        Ok(rows
            .into_iter()
            .map(|(at, az, el)| AzElSample {
                at,
                az_deg: az.rem_euclid(360.0),
                el_deg: el,
            })
            .collect())
    }

    /// Heliocentric ecliptic position in AU at an instant.
    pub fn heliocentric_position(&self, naif_id: i64, at: DateTime<Utc>) -> Result<Vec3> {
        let result = self.fetch(&[
            ("COMMAND", format!("'{naif_id}'")),
            ("EPHEM_TYPE", "'VECTORS'".into()),
            ("CENTER", "'@10'".into()),
            ("VEC_TABLE", "'2'".into()),
            ("REF_PLANE", "'ECLIPTIC'".into()),
            ("OUT_UNITS", "'AU-D'".into()),
            ("CSV_FORMAT", "'YES'".into()),
            ("START_TIME", time_arg(at)),
            ("STOP_TIME", time_arg(at + chrono::Duration::minutes(1))),
            ("STEP_SIZE", "'1 m'".into()),
        ])?;
        parse_vector_table(&result)?
            .into_iter()
            .next()
            .map(|(_, v)| v)
            .ok_or(DsnError::ParseError {
                reason: "vector table held no rows".into(),
            })
    }

    /// Issues one GET and peels the JSON envelope down to the `result`
    /// text blob.
    fn fetch(&self, params: &[(&str, String)]) -> Result<String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| DsnError::ServiceUnavailable {
            reason: format!("bad endpoint '{}': {e}", self.base_url),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("format", "json");
            pairs.append_pair("OBJ_DATA", "'NO'");
            pairs.append_pair("MAKE_EPHEM", "'YES'");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        debug!("ephemeris fetch: {url}");

        let response = self.agent.get(url.as_str()).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => DsnError::ServiceUnavailable {
                reason: format!("status {code}"),
            },
            other => DsnError::ServiceUnavailable {
                reason: other.to_string(),
            },
        })?;

        let body = response
            .into_string()
            .map_err(|e| DsnError::ServiceUnavailable {
                reason: format!("reading body: {e}"),
            })?;

        // Outage pages come back as HTML with a 200
        if body.trim_start().starts_with('<') {
            return Err(DsnError::ServiceUnavailable {
                reason: "HTML response".into(),
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| DsnError::ParseError {
                reason: format!("JSON decode: {e}"),
            })?;
        Ok(envelope.result)
    }
}

fn time_arg(t: DateTime<Utc>) -> String {
    format!("'{}'", t.format("%Y-%m-%d %H:%M"))
}

fn step_arg(step_minutes: u32) -> String {
    if step_minutes >= 60 && step_minutes % 60 == 0 {
        format!("'{} h'", step_minutes / 60)
    } else {
        format!("'{} m'", step_minutes.max(1))
    }
}

/// Slices the `$$SOE`/`$$EOE`-framed data block out of a result blob.
fn table_body(result: &str) -> Result<&str> {
    let start = result.find("$$SOE").ok_or(DsnError::ParseError {
        reason: "missing $$SOE marker".into(),
    })?;
    let end = result.find("$$EOE").ok_or(DsnError::ParseError {
        reason: "missing $$EOE marker".into(),
    })?;
    if end < start {
        return Err(DsnError::ParseError {
            reason: "$$EOE precedes $$SOE".into(),
        });
    }
    Ok(&result[start + 5..end])
}

/// Parses a whitespace-tokenized observer table into
/// `(instant, quantity_a, quantity_b)` rows.
///
/// The first two tokens of a line form the date (`YYYY-MMM-DD HH:MM[:SS]`);
/// the last two numeric tokens are the quantity pair (RA/Dec or Az/El
/// depending on the query). Lines that do not conform are skipped.
pub fn parse_observer_table(result: &str) -> Result<Vec<(DateTime<Utc>, f64, f64)>> {
    let body = table_body(result)?;
    let mut rows = Vec::new();

    for line in body.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 4 {
            continue;
        }
        let Some(at) = parse_table_datetime(tokens[0], tokens[1]) else {
            continue;
        };
        let numbers: Vec<f64> = tokens[2..]
            .iter()
            .filter_map(|t| t.parse().ok())
            .collect();
        if numbers.len() < 2 {
            continue;
        }
        let a = numbers[numbers.len() - 2];
        let b = numbers[numbers.len() - 1];
        rows.push((at, a, b));
    }

    Ok(rows)
}

/// Parses a CSV vector table into `(instant, position)` rows, taking the
/// X/Y/Z columns that follow the calendar date. Bad lines are skipped.
pub fn parse_vector_table(result: &str) -> Result<Vec<(DateTime<Utc>, Vec3)>> {
    let body = table_body(result)?;
    let mut rows = Vec::new();

    for line in body.lines() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 5 {
            continue;
        }
        // fields: JD, calendar date, X, Y, Z, ...
        let Some(at) = parse_vector_datetime(fields[1]) else {
            continue;
        };
        let coords: Option<Vec<f64>> = fields[2..5].iter().map(|f| f.parse().ok()).collect();
        if let Some(c) = coords {
            rows.push((at, Vec3::new(c[0], c[1], c[2])));
        }
    }

    Ok(rows)
}

/// Parses the two-token observer-table date, with or without seconds.
fn parse_table_datetime(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let joined = format!("{date} {time}");
    for fmt in ["%Y-%b-%d %H:%M:%S%.f", "%Y-%b-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&joined, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Parses the calendar-date field of a CSV vector row, e.g.
/// `"A.D. 2024-Jul-15 00:00:00.0000 TDB"`.
fn parse_vector_datetime(field: &str) -> Option<DateTime<Utc>> {
    let mut tokens = field.split_whitespace();
    let _era = tokens.next()?;
    let date = tokens.next()?;
    let time = tokens.next()?;
    parse_table_datetime(date, time)
}
