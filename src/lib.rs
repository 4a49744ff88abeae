//! # dsn-watch
//!
//! `dsn-watch` is the computational core of an operator-facing
//! situational-awareness tool for NASA's Deep Space Network. It fuses the
//! live DSN XML feed with ephemeris data from an external service and
//! derives the views operators actually look at: rise/set windows, pass
//! schedules, sky and solar-system projections, Doppler predictions,
//! handoff detection, and a link-difficulty score.
//!
//! It includes:
//! - Julian Date and sidereal time handling from Meeus
//! - RA/DEC ↔ Az/El and equatorial ↔ ecliptic transformations
//! - A sampled rise/transit/set solver with parabolic transit refinement
//! - The DSN feed parser, per-spacecraft link grouping, and snapshot diffs
//! - An ephemeris-service client with per-target caching and a DSN-derived
//!   fallback source
//!
//! Rendering, input handling and transport glue live elsewhere; this crate
//! only computes.
//!
//! ## Quick Example: a Voyager 1 pass schedule
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use dsn_watch::coords::RaDecSample;
//! use dsn_watch::passes::plan_passes;
//!
//! // 24 hours of geocentric positions (held fixed: Voyager barely moves)
//! let start = Utc.with_ymd_and_hms(2024, 7, 15, 0, 0, 0).unwrap();
//! let samples: Vec<RaDecSample> = (0..=96)
//!     .map(|i| RaDecSample {
//!         at: start + Duration::minutes(15 * i),
//!         ra_deg: 257.3,
//!         dec_deg: 12.2,
//!     })
//!     .collect();
//!
//! let plan = plan_passes("VGR1", &samples, start).unwrap();
//! for pass in &plan.passes {
//!     println!(
//!         "{:?} {} el {:.1}",
//!         pass.complex,
//!         pass.status.label(),
//!         pass.max_el_deg
//!     );
//! }
//! ```

pub mod coords;
pub mod derive;
pub mod diff;
pub mod doppler;
pub mod error;
pub mod export;
pub mod horizons;
pub mod location;
pub mod model;
pub mod parse;
pub mod passes;
pub mod projection;
pub mod provider;
pub mod sidereal;
pub mod solar_system;
pub mod stars;
pub mod sun;
pub mod time;
pub mod transforms;
pub mod views;
pub mod vis_cache;
pub mod visibility;

pub use coords::*;
pub use derive::*;
pub use diff::*;
pub use doppler::*;
pub use error::*;
pub use export::*;
pub use location::*;
pub use model::*;
pub use passes::*;
pub use projection::*;
pub use sidereal::*;
pub use sun::*;
pub use time::*;
pub use transforms::*;
pub use views::*;
pub use visibility::*;

#[cfg(test)]
pub mod tests;
