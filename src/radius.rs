//! Radius search around a query anchor (user location, geocoded place or
//! map click).

use tracing::debug;

use crate::error::HotspotError;
use crate::haversine::distance_km;
use crate::model::{AccidentRecord, Coordinate, Hotspot, Nearby};
use crate::traits::Located;

/// Radius used by the "find hotspots near me" search.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 5.0;

/// Keep every point within `radius_km` of `center` (inclusive), in input
/// order, paired with its distance. Points without usable coordinates are
/// skipped.
pub fn filter_within_radius<T>(points: &[T], center: Coordinate, radius_km: f64) -> Result<Vec<Nearby<T>>, HotspotError>
where
    T: Located + Clone,
{
    validate_query(&center, radius_km)?;

    let nearby: Vec<Nearby<T>> = points
        .iter()
        .filter_map(|point| {
            let distance = distance_km(&center, &point.coordinate()?);
            (distance <= radius_km).then(|| Nearby {
                item: point.clone(),
                distance_km: distance,
            })
        })
        .collect();

    debug!(
        candidates = points.len(),
        retained = nearby.len(),
        radius_km,
        "radius filter applied"
    );

    Ok(nearby)
}

/// Hotspots within the radius, returned with `distance_km` populated.
pub fn hotspots_within_radius(hotspots: &[Hotspot], center: Coordinate, radius_km: f64) -> Result<Vec<Hotspot>, HotspotError> {
    Ok(filter_within_radius(hotspots, center, radius_km)?
        .into_iter()
        .map(|nearby| Hotspot {
            distance_km: Some(nearby.distance_km),
            ..nearby.item
        })
        .collect())
}

pub fn accidents_within_radius(
    accidents: &[AccidentRecord],
    center: Coordinate,
    radius_km: f64,
) -> Result<Vec<Nearby<AccidentRecord>>, HotspotError> {
    filter_within_radius(accidents, center, radius_km)
}

fn validate_query(center: &Coordinate, radius_km: f64) -> Result<(), HotspotError> {
    if !center.is_valid() {
        return Err(HotspotError::InvalidArgument(format!(
            "search center ({}, {}) is not a valid latitude/longitude",
            center.lat, center.lng
        )));
    }
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(HotspotError::InvalidArgument(format!(
            "search radius must be a non-negative number of km, got {}",
            radius_km
        )));
    }
    Ok(())
}
