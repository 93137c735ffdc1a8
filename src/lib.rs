//! saferoute-hotspots core
//!
//! Accident hotspot clustering and radius search over road-accident reports.

pub mod error;
pub mod model;
pub mod traits;
pub mod haversine;
pub mod location;
pub mod hotspot;
pub mod radius;
pub mod backend;
pub mod live;

pub use error::{FeedError, HotspotError};
pub use hotspot::{build_hotspots, build_hotspots_with, cluster_accidents, ClusterPolicy, Clustering, HotspotOptions};
pub use model::{AccidentRecord, Coordinate, Hotspot, HotspotKind, Nearby, RiskLevel, RiskSummary, Severity};
pub use radius::{accidents_within_radius, filter_within_radius, hotspots_within_radius};
