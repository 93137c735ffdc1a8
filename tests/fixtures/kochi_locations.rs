//! Real Kochi / Ernakulam road locations for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap. These are busy junctions on
//! NH 66, NH 544 and the city arterials.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Major junctions
// ============================================================================

pub const JUNCTIONS: &[Location] = &[
    Location::new("Vyttila Junction", 9.9673, 76.3185),
    Location::new("Edappally Junction", 10.0253, 76.3084),
    Location::new("Kaloor Junction", 9.9986, 76.2923),
    Location::new("Palarivattom Junction", 10.0047, 76.3071),
    Location::new("Kundannoor Junction", 9.9429, 76.3209),
    Location::new("Jos Junction", 9.9763, 76.2832),
    Location::new("Aluva Bypass", 10.1076, 76.3516),
    Location::new("Kalamassery HMT Junction", 10.0530, 76.3195),
];

// ============================================================================
// Reference points
// ============================================================================

pub const VYTTILA: Location = Location::new("Vyttila Junction", 9.9673, 76.3185);
pub const EDAPPALLY: Location = Location::new("Edappally Junction", 10.0253, 76.3084);
pub const KOCHI_CENTER: Location = Location::new("Ernakulam South", 9.9690, 76.2890);
pub const THRISSUR_ROUND: Location = Location::new("Swaraj Round, Thrissur", 10.5276, 76.2144);
