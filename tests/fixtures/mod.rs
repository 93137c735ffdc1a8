//! Test fixtures for saferoute-hotspots.
//!
//! Provides realistic test data including:
//! - Real Kochi / Ernakulam road junctions (from OpenStreetMap)
//! - Builders for accident batches and a seeded pseudo-random scatter

#![allow(dead_code)]

pub mod kochi_locations;

pub use kochi_locations::*;

use saferoute_hotspots::{AccidentRecord, Severity};

/// Accident at a fixed point.
pub fn accident(id: &str, lat: f64, lng: f64, severity: Severity) -> AccidentRecord {
    AccidentRecord::new(id, lat, lng, severity)
}

/// One accident per severity, all at exactly the same point.
pub fn pileup(prefix: &str, location: &Location, severities: &[Severity]) -> Vec<AccidentRecord> {
    severities
        .iter()
        .enumerate()
        .map(|(i, severity)| accident(&format!("{}-{}", prefix, i), location.lat, location.lng, *severity))
        .collect()
}

/// Deterministic linear congruential generator so property tests are
/// reproducible without a random crate.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        let idx = (self.next_f64() * items.len() as f64) as usize;
        &items[idx.min(items.len() - 1)]
    }
}

/// Accidents scattered within ~`spread_deg` of the given junctions, with a
/// share landing exactly on a junction so same-spot groups form.
pub fn scatter(seed: u64, count: usize, spread_deg: f64) -> Vec<AccidentRecord> {
    let mut rng = Lcg::new(seed);
    let severities = [
        Severity::Minor,
        Severity::Minor,
        Severity::Minor,
        Severity::Major,
        Severity::Major,
        Severity::Fatal,
    ];

    (0..count)
        .map(|i| {
            let junction = rng.pick(JUNCTIONS);
            let exact = rng.next_f64() < 0.25;
            let (lat, lng) = if exact {
                junction.coords()
            } else {
                (
                    junction.lat + (rng.next_f64() - 0.5) * spread_deg,
                    junction.lng + (rng.next_f64() - 0.5) * spread_deg,
                )
            };
            accident(&format!("acc-{}", i), lat, lng, *rng.pick(&severities))
        })
        .collect()
}
