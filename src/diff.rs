//! Snapshot-to-snapshot change detection.
//!
//! Feeds the event log: which spacecraft appeared, which dropped off,
//! which moved to a different station, and whose data rate jumped.

use crate::model::DsnData;
use crate::views::{build_views, SpacecraftView};
use std::collections::BTreeMap;

/// Factor by which a data rate must change, in either direction, to count
/// as a rate change event.
pub const RATE_CHANGE_FACTOR: f64 = 2.0;

/// A spacecraft whose primary station moved between snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct Handoff {
    pub spacecraft: String,
    /// Primary station in the previous snapshot
    pub from: String,
    /// Primary station now
    pub to: String,
}

/// A spacecraft whose primary-link data rate changed by at least
/// [`RATE_CHANGE_FACTOR`].
#[derive(Debug, Clone, PartialEq)]
pub struct RateChange {
    pub spacecraft: String,
    pub previous_bps: f64,
    pub current_bps: f64,
}

/// Differences between two successive snapshots, keyed by spacecraft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    /// Spacecraft tracked now but not before
    pub new_links: Vec<String>,
    /// Spacecraft tracked before but not now
    pub lost_links: Vec<String>,
    /// Spacecraft whose primary station moved
    pub handoffs: Vec<Handoff>,
    /// Spacecraft whose data rate jumped or collapsed
    pub rate_changes: Vec<RateChange>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.new_links.is_empty()
            && self.lost_links.is_empty()
            && self.handoffs.is_empty()
            && self.rate_changes.is_empty()
    }
}

fn view_map(data: &DsnData) -> BTreeMap<String, SpacecraftView> {
    build_views(data)
        .into_iter()
        .map(|v| (v.spacecraft.clone(), v))
        .collect()
}

/// Computes the delta from `prev` to `curr`.
///
/// With no previous snapshot every current spacecraft is a new link.
/// Comparing a snapshot against itself yields an empty diff.
///
/// # Example
///
/// ```
/// use dsn_watch::diff::diff_snapshots;
/// use dsn_watch::parse::parse_dsn_xml;
///
/// let xml = r#"<dsn>
///   <station name="mdscc" friendlyName="Madrid"/>
///   <dish name="DSS63" elevationAngle="40" activity="track">
///     <target name="VGR2" id="-32" rtlt="140000"/>
///   </dish>
/// </dsn>"#;
/// let snap = parse_dsn_xml(xml).unwrap();
///
/// let first = diff_snapshots(None, &snap);
/// assert_eq!(first.new_links, vec!["VGR2".to_string()]);
///
/// let unchanged = diff_snapshots(Some(&snap), &snap);
/// assert!(unchanged.is_empty());
/// ```
pub fn diff_snapshots(prev: Option<&DsnData>, curr: &DsnData) -> SnapshotDiff {
    let curr_views = view_map(curr);
    let mut diff = SnapshotDiff::default();

    let Some(prev) = prev else {
        diff.new_links = curr_views.keys().cloned().collect();
        return diff;
    };
    let prev_views = view_map(prev);

    for (name, curr_view) in &curr_views {
        match prev_views.get(name) {
            None => diff.new_links.push(name.clone()),
            Some(prev_view) => {
                let prev_primary = prev_view.primary_link();
                let curr_primary = curr_view.primary_link();

                if prev_primary.antenna_id != curr_primary.antenna_id {
                    diff.handoffs.push(Handoff {
                        spacecraft: name.clone(),
                        from: prev_primary.antenna_id.clone(),
                        to: curr_primary.antenna_id.clone(),
                    });
                }

                let prev_rate = prev_primary.data_rate_bps;
                let curr_rate = curr_primary.data_rate_bps;
                if prev_rate > 0.0
                    && curr_rate > 0.0
                    && (curr_rate >= prev_rate * RATE_CHANGE_FACTOR
                        || curr_rate <= prev_rate / RATE_CHANGE_FACTOR)
                {
                    diff.rate_changes.push(RateChange {
                        spacecraft: name.clone(),
                        previous_bps: prev_rate,
                        current_bps: curr_rate,
                    });
                }
            }
        }
    }

    for name in prev_views.keys() {
        if !curr_views.contains_key(name) {
            diff.lost_links.push(name.clone());
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_dsn_xml;

    fn snapshot(dishes: &[(&str, &str, f64)]) -> DsnData {
        let mut xml = String::from("<dsn><station name=\"gdscc\" friendlyName=\"Goldstone\"/>");
        for (dish, craft, rate) in dishes {
            xml.push_str(&format!(
                "<dish name=\"{dish}\" elevationAngle=\"30\" activity=\"track\">\
                 <downSignal signalType=\"data\" dataRate=\"{rate}\" frequency=\"8420000000\" band=\"X\" spacecraft=\"{craft}\" spacecraftID=\"-70\"/>\
                 <target name=\"{craft}\" id=\"-70\" rtlt=\"1000\"/></dish>"
            ));
        }
        xml.push_str("</dsn>");
        parse_dsn_xml(&xml).unwrap()
    }

    #[test]
    fn test_diff_self_is_empty() {
        let snap = snapshot(&[("DSS14", "MVN", 1.0e5), ("DSS24", "JWST", 2.0e6)]);
        assert!(diff_snapshots(Some(&snap), &snap).is_empty());
    }

    #[test]
    fn test_no_previous_all_new() {
        let snap = snapshot(&[("DSS14", "MVN", 1.0e5)]);
        let diff = diff_snapshots(None, &snap);
        assert_eq!(diff.new_links, vec!["MVN".to_string()]);
        assert!(diff.lost_links.is_empty());
    }

    #[test]
    fn test_new_lost_and_handoff() {
        let prev = snapshot(&[("DSS14", "ALPHA", 1.0e5), ("DSS24", "BETA", 1.0e5)]);
        let curr = snapshot(&[("DSS63", "ALPHA", 1.0e5), ("DSS14", "GAMMA", 1.0e5)]);

        let diff = diff_snapshots(Some(&prev), &curr);
        assert_eq!(diff.new_links, vec!["GAMMA".to_string()]);
        assert_eq!(diff.lost_links, vec!["BETA".to_string()]);
        assert_eq!(diff.handoffs.len(), 1);
        assert_eq!(diff.handoffs[0].spacecraft, "ALPHA");
        assert_eq!(diff.handoffs[0].from, "DSS-14");
        assert_eq!(diff.handoffs[0].to, "DSS-63");
        assert!(diff.rate_changes.is_empty());
    }

    #[test]
    fn test_rate_change_both_directions() {
        let prev = snapshot(&[("DSS14", "MVN", 1.0e5)]);
        let doubled = snapshot(&[("DSS14", "MVN", 2.0e5)]);
        let halved = snapshot(&[("DSS14", "MVN", 0.5e5)]);
        let nudged = snapshot(&[("DSS14", "MVN", 1.5e5)]);

        assert_eq!(diff_snapshots(Some(&prev), &doubled).rate_changes.len(), 1);
        assert_eq!(diff_snapshots(Some(&prev), &halved).rate_changes.len(), 1);
        assert!(diff_snapshots(Some(&prev), &nudged).rate_changes.is_empty());
    }
}
