//! Core seams for the hotspot engine.
//!
//! These are intentionally minimal. Anything that can be placed on the map
//! can be radius-filtered, and anything that can list accidents can feed
//! the engine.

use crate::error::FeedError;
use crate::model::{AccidentRecord, Coordinate, Hotspot, Nearby};

/// Something with a map position.
pub trait Located {
    /// Position, or None when the item has no usable coordinates.
    fn coordinate(&self) -> Option<Coordinate>;
}

impl Located for Coordinate {
    fn coordinate(&self) -> Option<Coordinate> {
        self.is_valid().then_some(*self)
    }
}

impl Located for AccidentRecord {
    fn coordinate(&self) -> Option<Coordinate> {
        self.location()
    }
}

impl Located for Hotspot {
    fn coordinate(&self) -> Option<Coordinate> {
        let centroid = self.centroid();
        centroid.is_valid().then_some(centroid)
    }
}

impl<T: Located> Located for Nearby<T> {
    fn coordinate(&self) -> Option<Coordinate> {
        self.item.coordinate()
    }
}

/// Lists the current accident snapshot.
pub trait AccidentSource {
    fn accidents(&self) -> Result<Vec<AccidentRecord>, FeedError>;
}

impl AccidentSource for Vec<AccidentRecord> {
    fn accidents(&self) -> Result<Vec<AccidentRecord>, FeedError> {
        Ok(self.clone())
    }
}
