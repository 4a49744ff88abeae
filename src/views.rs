//! Per-spacecraft grouping of links.
//!
//! A spacecraft arrayed across several dishes shows up as several links;
//! operators think in spacecraft, so this module folds the links into one
//! view per craft and picks the link that best represents it.

use crate::derive::link_struggle;
use crate::model::{DsnData, Link};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// All links for one spacecraft, sorted by station number.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacecraftView {
    /// Spacecraft code, e.g. "VGR1"
    pub spacecraft: String,
    /// Spacecraft id as carried by the feed
    pub spacecraft_id: i64,
    /// Links carrying this spacecraft, ascending by DSS number
    pub links: Vec<Link>,
}

impl SpacecraftView {
    /// The link that best represents the craft right now: highest
    /// elevation, then lowest struggle, then lowest station number.
    pub fn primary_link(&self) -> &Link {
        self.links
            .iter()
            .min_by(|a, b| primary_order(a, b))
            .expect("a view always holds at least one link")
    }

    /// Station list in the arrayed notation operators use: sorted ids
    /// joined with "+", e.g. `"DSS-43+DSS-35"` becomes `"DSS-35+DSS-43"`.
    pub fn antenna_list(&self) -> String {
        let ids: Vec<&str> = self.links.iter().map(|l| l.antenna_id.as_str()).collect();
        ids.join("+")
    }
}

/// Comparator defining the primary-link preference. `Less` means "more
/// preferred". Distinct station numbers make this a strict total order.
pub fn primary_order(a: &Link, b: &Link) -> Ordering {
    b.elevation_deg
        .partial_cmp(&a.elevation_deg)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            link_struggle(a)
                .partial_cmp(&link_struggle(b))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.dss.cmp(&b.dss))
}

/// Whether a target name denotes an actual spacecraft rather than the
/// network testing against itself. Ground calibration targets show up in
/// the feed under "DSN"/"DSS" names.
pub fn is_real_spacecraft(name: &str) -> bool {
    let upper = name.trim().to_ascii_uppercase();
    !(upper.starts_with("DSN") || upper.starts_with("DSS"))
}

/// Groups a snapshot's links into per-spacecraft views.
///
/// Synthetic targets and dishes pointing below the horizon are dropped;
/// the result is ordered by spacecraft code.
///
/// # Example
///
/// ```
/// use dsn_watch::parse::parse_dsn_xml;
/// use dsn_watch::views::build_views;
///
/// let xml = r#"<dsn>
///   <station name="cdscc" friendlyName="Canberra"/>
///   <dish name="DSS43" elevationAngle="31" activity="track">
///     <target name="VGR2" id="-32" rtlt="140000"/>
///   </dish>
///   <dish name="DSS35" elevationAngle="30" activity="track">
///     <target name="VGR2" id="-32" rtlt="140000"/>
///   </dish>
/// </dsn>"#;
/// let views = build_views(&parse_dsn_xml(xml).unwrap());
/// assert_eq!(views.len(), 1);
/// assert_eq!(views[0].antenna_list(), "DSS-35+DSS-43");
/// assert_eq!(views[0].primary_link().antenna_id, "DSS-43");
/// ```
pub fn build_views(data: &DsnData) -> Vec<SpacecraftView> {
    let mut groups: BTreeMap<String, SpacecraftView> = BTreeMap::new();

    for link in &data.links {
        if !is_real_spacecraft(&link.spacecraft) || link.elevation_deg < 0.0 {
            continue;
        }
        groups
            .entry(link.spacecraft.clone())
            .or_insert_with(|| SpacecraftView {
                spacecraft: link.spacecraft.clone(),
                spacecraft_id: link.spacecraft_id,
                links: Vec::new(),
            })
            .links
            .push(link.clone());
    }

    let mut views: Vec<SpacecraftView> = groups.into_values().collect();
    for view in &mut views {
        view.links.sort_by_key(|l| l.dss);
    }
    views
}
