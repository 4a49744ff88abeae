//! Ephemeris source polymorphism, the target registry, and the memoizing
//! provider.
//!
//! Two things can answer "where is this spacecraft": the external
//! ephemeris service ([`HorizonsClient`](crate::horizons::HorizonsClient))
//! and the DSN feed itself ([`DsnDerivedSource`]), which knows the pointing
//! of whichever dish is tracking the craft right now. Both sit behind the
//! [`EphemerisSource`] trait; [`CachedEphemeris`] wraps either one with
//! per-target TTLs, focus-change invalidation, and stale-on-error reads.

use crate::coords::{AzElSample, RaDecSample, Vec3};
use crate::error::{DsnError, Result};
use crate::horizons::HorizonsClient;
use crate::location::Observer;
use crate::model::DsnData;
use crate::time::AU_KM;
use crate::transforms::{el_az_to_ra_dec, equatorial_to_ecliptic, ra_dec_unit_vector};
use crate::views::primary_order;
use chrono::{DateTime, Duration, Utc};
use log::warn;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

/// Freshness bound for cached RA/Dec and Az/El paths, seconds.
pub const PATH_TTL_S: i64 = 300;
/// Freshness bound for cached heliocentric vectors, seconds.
pub const VECTOR_TTL_S: i64 = 600;

/// The three questions an ephemeris source can answer, plus whether it is
/// in a position to answer at all.
pub trait EphemerisSource: Send + Sync {
    /// Geocentric apparent RA/Dec over a span.
    fn radec_path(
        &self,
        naif_id: i64,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<RaDecSample>>;

    /// Observer-centric Az/El over a span.
    fn azel_path(
        &self,
        naif_id: i64,
        observer: &Observer,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<AzElSample>>;

    /// Heliocentric ecliptic position in AU at an instant.
    fn heliocentric_position(&self, naif_id: i64, at: DateTime<Utc>) -> Result<Vec3>;

    /// Whether the source can currently answer queries.
    fn is_available(&self) -> bool;
}

impl EphemerisSource for HorizonsClient {
    fn radec_path(
        &self,
        naif_id: i64,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<RaDecSample>> {
        HorizonsClient::radec_path(self, naif_id, start, stop, step_minutes)
    }

    fn azel_path(
        &self,
        naif_id: i64,
        observer: &Observer,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<AzElSample>> {
        HorizonsClient::azel_path(self, naif_id, observer, start, stop, step_minutes)
    }

    fn heliocentric_position(&self, naif_id: i64, at: DateTime<Utc>) -> Result<Vec3> {
        HorizonsClient::heliocentric_position(self, naif_id, at)
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Registry entry mapping a NAIF id to its name and DSN feed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetInfo {
    pub naif_id: i64,
    pub name: &'static str,
    /// Spacecraft code as it appears in the DSN feed, when the craft is a
    /// DSN customer
    pub dsn_code: Option<&'static str>,
}

const fn target(naif_id: i64, name: &'static str, dsn_code: Option<&'static str>) -> TargetInfo {
    TargetInfo { naif_id, name, dsn_code }
}

/// Deep-space missions the views care about.
pub static TARGETS: &[TargetInfo] = &[
    target(-31, "Voyager 1", Some("VGR1")),
    target(-32, "Voyager 2", Some("VGR2")),
    target(-170, "JWST", Some("JWST")),
    target(-74, "Mars Reconnaissance Orbiter", Some("MRO")),
    target(-202, "MAVEN", Some("MVN")),
    target(-53, "Mars Odyssey", Some("ODY")),
    target(-61, "Juno", Some("JNO")),
    target(-98, "New Horizons", Some("NHPC")),
    target(-255, "Psyche", Some("PSYC")),
    target(-159, "Europa Clipper", Some("EURC")),
    target(-168, "Perseverance", Some("M20")),
    target(-76, "Curiosity", Some("MSL")),
    target(-49, "Lucy", Some("LUCY")),
    target(-96, "Parker Solar Probe", Some("SPP")),
    target(-234, "STEREO-A", Some("STA")),
    target(-64, "OSIRIS-APEX", Some("ORX")),
    target(-85, "Lunar Reconnaissance Orbiter", Some("LRO")),
    target(-155, "Danuri", Some("KPLO")),
    target(-21, "SOHO", Some("SOHO")),
    target(-92, "ACE", Some("ACE")),
    target(-151, "Chandra", Some("CHDR")),
    target(-121, "BepiColombo", Some("BEPI")),
    target(-144, "Solar Orbiter", Some("SOLO")),
    target(-143, "ExoMars TGO", Some("TGO")),
    target(-41, "Mars Express", Some("MEX")),
];

static BY_NAIF: Lazy<HashMap<i64, &'static TargetInfo>> =
    Lazy::new(|| TARGETS.iter().map(|t| (t.naif_id, t)).collect());

static BY_CODE: Lazy<HashMap<&'static str, &'static TargetInfo>> = Lazy::new(|| {
    TARGETS
        .iter()
        .filter_map(|t| t.dsn_code.map(|c| (c, t)))
        .collect()
});

/// Looks up a registry entry by NAIF id.
pub fn target_by_naif(naif_id: i64) -> Option<&'static TargetInfo> {
    BY_NAIF.get(&naif_id).copied()
}

/// Looks up a registry entry by DSN spacecraft code.
pub fn target_by_code(code: &str) -> Option<&'static TargetInfo> {
    BY_CODE.get(code.to_ascii_uppercase().as_str()).copied()
}

/// Ephemeris answers derived from the live DSN feed: the craft is where
/// the dish that tracks it points. Positions are frozen over the requested
/// span, which is fine at deep-space distances and hour scales.
#[derive(Default)]
pub struct DsnDerivedSource {
    current: RwLock<Option<DsnData>>,
}

impl DsnDerivedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the snapshot this source answers from.
    pub fn update(&self, snapshot: DsnData) {
        *self.current.write().unwrap() = Some(snapshot);
    }

    /// Pointing and range of the best link for a target, plus the hosting
    /// complex's observer and the snapshot instant.
    fn tracked_state(&self, naif_id: i64) -> Result<TrackedState> {
        let info = target_by_naif(naif_id).ok_or_else(|| DsnError::UnknownTarget {
            target: naif_id.to_string(),
        })?;
        let code = info.dsn_code.ok_or_else(|| DsnError::UnknownTarget {
            target: info.name.to_string(),
        })?;

        let guard = self.current.read().unwrap();
        let data = guard.as_ref().ok_or(DsnError::ServiceUnavailable {
            reason: "no DSN snapshot yet".into(),
        })?;
        let link = data
            .links
            .iter()
            .filter(|l| l.spacecraft.eq_ignore_ascii_case(code))
            .min_by(|a, b| primary_order(a, b))
            .ok_or_else(|| DsnError::UnknownTarget {
                target: code.to_string(),
            })?;

        Ok(TrackedState {
            observer: link.complex.observer(),
            az_deg: link.azimuth_deg,
            el_deg: link.elevation_deg,
            distance_km: link.distance_km,
            at: data.timestamp.unwrap_or_else(Utc::now),
        })
    }
}

struct TrackedState {
    observer: Observer,
    az_deg: f64,
    el_deg: f64,
    distance_km: f64,
    at: DateTime<Utc>,
}

fn span_instants(
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
    step_minutes: u32,
) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(step_minutes.max(1) as i64);
    let mut instants = Vec::new();
    let mut t = start;
    while t <= stop {
        instants.push(t);
        t += step;
    }
    instants
}

impl EphemerisSource for DsnDerivedSource {
    fn radec_path(
        &self,
        naif_id: i64,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<RaDecSample>> {
        let state = self.tracked_state(naif_id)?;
        let (ra, dec) = el_az_to_ra_dec(state.el_deg, state.az_deg, state.at, &state.observer);
        Ok(span_instants(start, stop, step_minutes)
            .into_iter()
            .map(|at| RaDecSample { at, ra_deg: ra, dec_deg: dec })
            .collect())
    }

    fn azel_path(
        &self,
        naif_id: i64,
        observer: &Observer,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<AzElSample>> {
        let state = self.tracked_state(naif_id)?;
        // Re-derive Az/El for the requested observer, which may differ
        // from the tracking complex
        let (ra, dec) = el_az_to_ra_dec(state.el_deg, state.az_deg, state.at, &state.observer);
        Ok(span_instants(start, stop, step_minutes)
            .into_iter()
            .map(|at| {
                let (el, az) = crate::transforms::ra_dec_to_el_az(ra, dec, at, observer);
                AzElSample { at, az_deg: az, el_deg: el }
            })
            .collect())
    }

    fn heliocentric_position(&self, naif_id: i64, _at: DateTime<Utc>) -> Result<Vec3> {
        let state = self.tracked_state(naif_id)?;
        let (ra, dec) = el_az_to_ra_dec(state.el_deg, state.az_deg, state.at, &state.observer);
        // At deep-space ranges the geocentric direction doubles as the
        // heliocentric one
        let geocentric = ra_dec_unit_vector(ra, dec) * (state.distance_km / AU_KM);
        Ok(equatorial_to_ecliptic(geocentric))
    }

    fn is_available(&self) -> bool {
        self.current.read().unwrap().is_some()
    }
}

struct CachedPath<T> {
    computed_at: DateTime<Utc>,
    samples: Vec<T>,
}

struct CachedVector {
    computed_at: DateTime<Utc>,
    position: Vec3,
}

/// Memoizing wrapper around any [`EphemerisSource`].
///
/// Paths stay fresh for [`PATH_TTL_S`], vectors for [`VECTOR_TTL_S`].
/// When an underlying fetch fails and a stale entry exists, the stale
/// entry is served so views stay populated through an outage. Changing
/// the focused target drops the previous focus's entries, so the next
/// request for it refetches.
pub struct CachedEphemeris {
    source: Box<dyn EphemerisSource>,
    radec: RwLock<HashMap<i64, CachedPath<RaDecSample>>>,
    azel: RwLock<HashMap<i64, CachedPath<AzElSample>>>,
    vectors: RwLock<HashMap<i64, CachedVector>>,
    focus: RwLock<Option<i64>>,
}

impl CachedEphemeris {
    pub fn new(source: Box<dyn EphemerisSource>) -> Self {
        CachedEphemeris {
            source,
            radec: RwLock::new(HashMap::new()),
            azel: RwLock::new(HashMap::new()),
            vectors: RwLock::new(HashMap::new()),
            focus: RwLock::new(None),
        }
    }

    /// Changes the focused target, invalidating the previous focus's
    /// cached entries so its next query is fresh. Returns whether the
    /// focus actually changed.
    pub fn set_focus(&self, naif_id: Option<i64>) -> bool {
        let mut focus = self.focus.write().unwrap();
        if *focus == naif_id {
            return false;
        }
        if let Some(old) = *focus {
            self.radec.write().unwrap().remove(&old);
            self.azel.write().unwrap().remove(&old);
            self.vectors.write().unwrap().remove(&old);
        }
        *focus = naif_id;
        true
    }

    /// The currently focused target, if any.
    pub fn focus(&self) -> Option<i64> {
        *self.focus.read().unwrap()
    }

    pub fn radec_path(
        &self,
        naif_id: i64,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<RaDecSample>> {
        let now = Utc::now();
        if let Some(entry) = self.radec.read().unwrap().get(&naif_id) {
            if (now - entry.computed_at).num_seconds() < PATH_TTL_S {
                return Ok(entry.samples.clone());
            }
        }
        match self.source.radec_path(naif_id, start, stop, step_minutes) {
            Ok(samples) => {
                self.radec.write().unwrap().insert(
                    naif_id,
                    CachedPath { computed_at: now, samples: samples.clone() },
                );
                Ok(samples)
            }
            Err(e) => self.stale_radec(naif_id, e),
        }
    }

    fn stale_radec(&self, naif_id: i64, error: DsnError) -> Result<Vec<RaDecSample>> {
        if let Some(entry) = self.radec.read().unwrap().get(&naif_id) {
            warn!("serving stale RA/Dec path for {naif_id}: {error}");
            return Ok(entry.samples.clone());
        }
        Err(error)
    }

    pub fn azel_path(
        &self,
        naif_id: i64,
        observer: &Observer,
        start: DateTime<Utc>,
        stop: DateTime<Utc>,
        step_minutes: u32,
    ) -> Result<Vec<AzElSample>> {
        let now = Utc::now();
        if let Some(entry) = self.azel.read().unwrap().get(&naif_id) {
            if (now - entry.computed_at).num_seconds() < PATH_TTL_S {
                return Ok(entry.samples.clone());
            }
        }
        match self
            .source
            .azel_path(naif_id, observer, start, stop, step_minutes)
        {
            Ok(samples) => {
                self.azel.write().unwrap().insert(
                    naif_id,
                    CachedPath { computed_at: now, samples: samples.clone() },
                );
                Ok(samples)
            }
            Err(e) => {
                if let Some(entry) = self.azel.read().unwrap().get(&naif_id) {
                    warn!("serving stale Az/El path for {naif_id}: {e}");
                    return Ok(entry.samples.clone());
                }
                Err(e)
            }
        }
    }

    pub fn heliocentric_position(&self, naif_id: i64, at: DateTime<Utc>) -> Result<Vec3> {
        let now = Utc::now();
        if let Some(entry) = self.vectors.read().unwrap().get(&naif_id) {
            if (now - entry.computed_at).num_seconds() < VECTOR_TTL_S {
                return Ok(entry.position);
            }
        }
        match self.source.heliocentric_position(naif_id, at) {
            Ok(position) => {
                self.vectors
                    .write()
                    .unwrap()
                    .insert(naif_id, CachedVector { computed_at: now, position });
                Ok(position)
            }
            Err(e) => {
                if let Some(entry) = self.vectors.read().unwrap().get(&naif_id) {
                    warn!("serving stale heliocentric vector for {naif_id}: {e}");
                    return Ok(entry.position);
                }
                Err(e)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: serves a fixed vector, then fails forever.
    struct FlakySource {
        calls: AtomicUsize,
        fail_after: usize,
    }

    impl EphemerisSource for FlakySource {
        fn radec_path(
            &self,
            _naif_id: i64,
            start: DateTime<Utc>,
            _stop: DateTime<Utc>,
            _step_minutes: u32,
        ) -> Result<Vec<RaDecSample>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.fail_after {
                return Err(DsnError::ServiceUnavailable { reason: "down".into() });
            }
            Ok(vec![RaDecSample { at: start, ra_deg: n as f64, dec_deg: 0.0 }])
        }

        fn azel_path(
            &self,
            _naif_id: i64,
            _observer: &Observer,
            _start: DateTime<Utc>,
            _stop: DateTime<Utc>,
            _step_minutes: u32,
        ) -> Result<Vec<AzElSample>> {
            Err(DsnError::ServiceUnavailable { reason: "down".into() })
        }

        fn heliocentric_position(&self, _naif_id: i64, _at: DateTime<Utc>) -> Result<Vec3> {
            Err(DsnError::ServiceUnavailable { reason: "down".into() })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(target_by_naif(-31).unwrap().name, "Voyager 1");
        assert_eq!(target_by_code("vgr2").unwrap().naif_id, -32);
        assert!(target_by_naif(12345).is_none());
        assert!(target_by_code("NOPE").is_none());
    }

    #[test]
    fn test_cache_hit_within_ttl() {
        let cache = CachedEphemeris::new(Box::new(FlakySource {
            calls: AtomicUsize::new(0),
            fail_after: 1,
        }));
        let start = Utc::now();
        let stop = start + Duration::hours(1);

        let first = cache.radec_path(-31, start, stop, 60).unwrap();
        // Second read must come from cache; the source would fail now
        let second = cache.radec_path(-31, start, stop, 60).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_focus_change_invalidates() {
        let cache = CachedEphemeris::new(Box::new(FlakySource {
            calls: AtomicUsize::new(0),
            fail_after: 100,
        }));
        let start = Utc::now();
        let stop = start + Duration::hours(1);

        cache.set_focus(Some(-31));
        let first = cache.radec_path(-31, start, stop, 60).unwrap();
        assert!(!cache.set_focus(Some(-31)), "same focus is a no-op");

        // Moving focus away drops -31's entry, so the next read refetches
        assert!(cache.set_focus(Some(-32)));
        let refetched = cache.radec_path(-31, start, stop, 60).unwrap();
        assert_ne!(first[0].ra_deg, refetched[0].ra_deg);
    }

    #[test]
    fn test_stale_on_error_absent_entry_propagates() {
        let cache = CachedEphemeris::new(Box::new(FlakySource {
            calls: AtomicUsize::new(0),
            fail_after: 0,
        }));
        let start = Utc::now();
        let err = cache
            .radec_path(-31, start, start + Duration::hours(1), 60)
            .unwrap_err();
        assert!(matches!(err, DsnError::ServiceUnavailable { .. }));
    }

    #[test]
    fn test_dsn_derived_unknown_target() {
        let source = DsnDerivedSource::new();
        assert!(!source.is_available());
        let err = source
            .radec_path(12345, Utc::now(), Utc::now() + Duration::hours(1), 60)
            .unwrap_err();
        assert!(matches!(err, DsnError::UnknownTarget { .. }));
    }

    #[test]
    fn test_dsn_derived_from_snapshot() {
        use crate::parse::parse_dsn_xml;

        let xml = r#"<dsn>
          <station name="gdscc" friendlyName="Goldstone"/>
          <dish name="DSS14" azimuthAngle="180" elevationAngle="45" activity="track">
            <target name="VGR1" id="-31" rtlt="160000"/>
          </dish>
          <timestamp>1721001600000</timestamp>
        </dsn>"#;

        let source = DsnDerivedSource::new();
        source.update(parse_dsn_xml(xml).unwrap());
        assert!(source.is_available());

        let start = Utc::now();
        let path = source
            .radec_path(-31, start, start + Duration::hours(2), 60)
            .unwrap();
        assert_eq!(path.len(), 3);
        // Frozen position: all samples identical in RA/Dec
        assert_eq!(path[0].ra_deg, path[2].ra_deg);
        assert!((0.0..360.0).contains(&path[0].ra_deg));

        let helio = source.heliocentric_position(-31, start).unwrap();
        // 160000 s RTLT is ~160 AU one way
        assert!((helio.norm() - 160.3).abs() < 2.0, "norm {}", helio.norm());
    }
}
