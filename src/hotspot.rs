//! Accident hotspot clustering.
//!
//! Two ordered passes over a snapshot of accident records:
//!
//! 1. **Same spot**: records snapped to the same tolerance grid cell form a
//!    hotspot when the cell holds at least `min_same_spot_size` records.
//!    The centroid is the first member's exact position.
//! 2. **Proximity**: remaining records are grouped greedily in input order.
//!    Each unprocessed record seeds a group and absorbs every other
//!    unprocessed record within `cluster_radius_km` of the *seed*. Groups of
//!    at least `min_cluster_size` become hotspots centred on the mean
//!    position; smaller groups are dropped and their members stay
//!    unclustered.
//!
//! Hotspots are disjoint, ids and names are sequential across both passes,
//! and the output depends only on the input order.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::haversine::distance_km;
use crate::model::{AccidentRecord, Coordinate, Hotspot, HotspotKind, RiskLevel, Severity};

/// Grid cell size for same-spot detection (~11 m).
pub const DEFAULT_LOCATION_TOLERANCE_DEG: f64 = 0.0001;

/// Proximity clustering radius.
pub const DEFAULT_CLUSTER_RADIUS_KM: f64 = 0.5;

/// How proximity groups grow from their seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClusterPolicy {
    /// Only records within the radius of the seed join. Not transitive.
    #[default]
    SeedRadius,
    /// Records within the radius of any member join (connected components),
    /// grown breadth-first from the same seed order.
    Transitive,
}

#[derive(Debug, Clone)]
pub struct HotspotOptions {
    /// Grid cell size in degrees for same-spot grouping.
    pub location_tolerance_deg: f64,
    /// Proximity radius in km, inclusive.
    pub cluster_radius_km: f64,
    /// Smallest same-spot group that becomes a hotspot.
    pub min_same_spot_size: usize,
    /// Smallest proximity group that becomes a hotspot.
    pub min_cluster_size: usize,
    pub policy: ClusterPolicy,
    /// Candidate count at which the proximity scan goes parallel.
    pub parallel_threshold: usize,
}

impl Default for HotspotOptions {
    fn default() -> Self {
        Self {
            location_tolerance_deg: DEFAULT_LOCATION_TOLERANCE_DEG,
            cluster_radius_km: DEFAULT_CLUSTER_RADIUS_KM,
            min_same_spot_size: 2,
            min_cluster_size: 3,
            policy: ClusterPolicy::SeedRadius,
            parallel_threshold: 512,
        }
    }
}

/// Result of a clustering run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub hotspots: Vec<Hotspot>,
    /// Hotspot id holding each input record, indexed like the input.
    pub assignments: Vec<Option<u32>>,
    /// Records skipped for missing or invalid coordinates.
    pub excluded: usize,
}

/// Build hotspots with default options.
pub fn build_hotspots(accidents: &[AccidentRecord]) -> Vec<Hotspot> {
    build_hotspots_with(accidents, &HotspotOptions::default())
}

pub fn build_hotspots_with(accidents: &[AccidentRecord], options: &HotspotOptions) -> Vec<Hotspot> {
    cluster_accidents(accidents, options).hotspots
}

/// Run both clustering passes and report which hotspot holds each record.
pub fn cluster_accidents(accidents: &[AccidentRecord], options: &HotspotOptions) -> Clustering {
    let locations: Vec<Option<Coordinate>> = accidents.iter().map(AccidentRecord::location).collect();

    // Records we cannot place never take part in either pass.
    let mut processed: Vec<bool> = locations.iter().map(Option::is_none).collect();
    let excluded = processed.iter().filter(|skip| **skip).count();
    for (accident, _) in accidents.iter().zip(&locations).filter(|(_, loc)| loc.is_none()) {
        warn!(
            accident_id = %accident.id,
            latitude = accident.latitude,
            longitude = accident.longitude,
            "excluding accident with invalid coordinates from clustering"
        );
    }

    let mut emitter = Emitter::new(accidents);

    same_spot_pass(&locations, &mut processed, &mut emitter, options);
    let same_spot_count = emitter.hotspots.len();

    proximity_pass(&locations, &mut processed, &mut emitter, options);

    debug!(
        accidents = accidents.len(),
        excluded,
        same_spot = same_spot_count,
        cluster = emitter.hotspots.len() - same_spot_count,
        "built accident hotspots"
    );

    Clustering {
        hotspots: emitter.hotspots,
        assignments: emitter.assignments,
        excluded,
    }
}

fn same_spot_pass(
    locations: &[Option<Coordinate>],
    processed: &mut [bool],
    emitter: &mut Emitter<'_>,
    options: &HotspotOptions,
) {
    let tolerance = effective(options.location_tolerance_deg, DEFAULT_LOCATION_TOLERANCE_DEG);

    // Groups in first-seen order; the map only points into the vec.
    let mut seen: HashMap<(i64, i64), usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (idx, location) in locations.iter().enumerate() {
        let Some(location) = location else { continue };
        let key = grid_key(location, tolerance);
        let slot = *seen.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(idx);
    }

    let min_size = options.min_same_spot_size.max(1);
    for members in groups.iter().filter(|members| members.len() >= min_size) {
        let first = members[0];
        let Some(centroid) = locations[first] else { continue };
        emitter.emit(HotspotKind::SameSpot, members, centroid);
        for &idx in members {
            processed[idx] = true;
        }
    }

    debug!(cells = groups.len(), "same-spot pass complete");
}

fn proximity_pass(
    locations: &[Option<Coordinate>],
    processed: &mut [bool],
    emitter: &mut Emitter<'_>,
    options: &HotspotOptions,
) {
    let radius_km = effective(options.cluster_radius_km, DEFAULT_CLUSTER_RADIUS_KM);
    let mut discarded = 0usize;

    for seed in 0..locations.len() {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;

        // Every index before the seed is already processed.
        let mut members = vec![seed];
        let mut frontier = 0;
        while frontier < members.len() {
            let Some(anchor) = locations[members[frontier]] else { break };
            let joined = within_radius(anchor, seed + 1, locations, processed, radius_km, options);
            for &idx in &joined {
                processed[idx] = true;
            }
            members.extend(joined);

            match options.policy {
                ClusterPolicy::SeedRadius => break,
                ClusterPolicy::Transitive => frontier += 1,
            }
        }

        if members.len() >= options.min_cluster_size.max(1) {
            let centroid = mean_location(&members, locations);
            emitter.emit(HotspotKind::Cluster, &members, centroid);
        } else {
            discarded += members.len();
        }
    }

    debug!(unclustered = discarded, "proximity pass complete");
}

/// Unprocessed records from `start` onward within `radius_km` of `anchor`,
/// in input order.
fn within_radius(
    anchor: Coordinate,
    start: usize,
    locations: &[Option<Coordinate>],
    processed: &[bool],
    radius_km: f64,
    options: &HotspotOptions,
) -> Vec<usize> {
    let candidates: Vec<(usize, Coordinate)> = (start..locations.len())
        .filter(|&idx| !processed[idx])
        .filter_map(|idx| locations[idx].map(|loc| (idx, loc)))
        .collect();

    let close = |&(idx, loc): &(usize, Coordinate)| (distance_km(&anchor, &loc) <= radius_km).then_some(idx);

    if candidates.len() >= options.parallel_threshold {
        candidates.par_iter().filter_map(close).collect()
    } else {
        candidates.iter().filter_map(close).collect()
    }
}

fn mean_location(members: &[usize], locations: &[Option<Coordinate>]) -> Coordinate {
    let (lat_sum, lng_sum, count) = members
        .iter()
        .filter_map(|&idx| locations[idx])
        .fold((0.0, 0.0, 0usize), |(lat, lng, n), loc| (lat + loc.lat, lng + loc.lng, n + 1));
    let count = count.max(1) as f64;
    Coordinate {
        lat: lat_sum / count,
        lng: lng_sum / count,
    }
}

/// Snap to the tolerance grid, rounding halves toward +inf.
fn grid_key(location: &Coordinate, tolerance: f64) -> (i64, i64) {
    let snap = |value: f64| (value / tolerance + 0.5).floor() as i64;
    (snap(location.lat), snap(location.lng))
}

fn effective(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!(value, fallback, "ignoring non-positive clustering parameter");
        fallback
    }
}

/// Assigns sequential ids and names and records membership.
struct Emitter<'a> {
    accidents: &'a [AccidentRecord],
    hotspots: Vec<Hotspot>,
    assignments: Vec<Option<u32>>,
}

impl<'a> Emitter<'a> {
    fn new(accidents: &'a [AccidentRecord]) -> Self {
        Self {
            accidents,
            hotspots: Vec::new(),
            assignments: vec![None; accidents.len()],
        }
    }

    fn emit(&mut self, kind: HotspotKind, members: &[usize], centroid: Coordinate) {
        let id = self.hotspots.len() as u32 + 1;
        let count_of = |severity: Severity| {
            members
                .iter()
                .filter(|&&idx| self.accidents[idx].severity == severity)
                .count()
        };
        let fatal_count = count_of(Severity::Fatal);
        let major_count = count_of(Severity::Major);

        let risk_level = match kind {
            HotspotKind::SameSpot => RiskLevel::for_same_spot(fatal_count, major_count),
            HotspotKind::Cluster => RiskLevel::for_cluster(fatal_count, major_count),
        };

        for &idx in members {
            self.assignments[idx] = Some(id);
        }

        self.hotspots.push(Hotspot {
            id,
            name: format!("Hotspot ({}) #{}", kind.label(), id),
            latitude: centroid.lat,
            longitude: centroid.lng,
            risk_level,
            accident_count: members.len(),
            fatal_count,
            major_count,
            kind,
            distance_km: None,
        });
    }
}
