//! Data types shared by the hotspot engine, the radius search and the feed.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HotspotError;
use crate::location::parse_location;

/// A WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, HotspotError> {
        let coordinate = Self { lat, lng };
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(HotspotError::InvalidArgument(format!(
                "coordinate ({}, {}) is not a valid latitude/longitude",
                lat, lng
            )))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Reported accident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Minor,
    Major,
    Fatal,
}

impl Severity {
    /// Case-insensitive parse. Anything unrecognised counts as `Minor`,
    /// matching how hotspot counts treat it (neither fatal nor major).
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fatal" => Severity::Fatal,
            "major" => Severity::Major,
            _ => Severity::Minor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Major => "Major",
            Severity::Fatal => "Fatal",
        }
    }
}

/// A single accident report as listed by the backend.
///
/// Coordinates are kept raw; the engine validates them and excludes
/// records it cannot place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: Severity,
    #[serde(default, deserialize_with = "de_timestamp", skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
}

impl AccidentRecord {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, severity: Severity) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            severity,
            reported_at: None,
        }
    }

    pub fn reported_at(mut self, at: DateTime<Utc>) -> Self {
        self.reported_at = Some(at);
        self
    }

    /// Decode one loosely-shaped record. Returns None without an id or a
    /// usable location.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let id = match value.get("id")? {
            serde_json::Value::String(text) if !text.is_empty() => text.clone(),
            serde_json::Value::Number(number) => number.to_string(),
            _ => return None,
        };
        let location = parse_location(value)?;
        let severity = value
            .get("severity")
            .and_then(serde_json::Value::as_str)
            .map(Severity::parse_loose)
            .unwrap_or(Severity::Minor);
        let reported_at = value
            .get("reported_at")
            .or_else(|| value.get("reportedAt"))
            .and_then(serde_json::Value::as_str)
            .and_then(parse_timestamp);

        Some(Self {
            id,
            latitude: location.lat,
            longitude: location.lng,
            severity,
            reported_at,
        })
    }

    /// Location if it is a valid WGS84 point.
    pub fn location(&self) -> Option<Coordinate> {
        Coordinate::new(self.latitude, self.longitude).ok()
    }
}

/// Hotspot risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Same-spot rule: any fatal is High, any major is Medium.
    pub fn for_same_spot(fatal: usize, major: usize) -> Self {
        if fatal > 0 {
            RiskLevel::High
        } else if major >= 1 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Proximity rule: any fatal is High, more than one major is Medium.
    pub fn for_cluster(fatal: usize, major: usize) -> Self {
        if fatal > 0 {
            RiskLevel::High
        } else if major > 1 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HotspotKind {
    #[serde(rename = "sameSpot")]
    SameSpot,
    #[serde(rename = "cluster")]
    Cluster,
}

impl HotspotKind {
    pub fn label(&self) -> &'static str {
        match self {
            HotspotKind::SameSpot => "Same Spot",
            HotspotKind::Cluster => "Cluster",
        }
    }
}

/// A derived cluster of accidents. Ids are only unique within one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: u32,
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,
    #[serde(rename = "accidents")]
    pub accident_count: usize,
    #[serde(rename = "fatal")]
    pub fatal_count: usize,
    #[serde(rename = "major")]
    pub major_count: usize,
    #[serde(rename = "type")]
    pub kind: HotspotKind,
    /// Set only on hotspots returned from a radius query.
    #[serde(rename = "distance", default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl Hotspot {
    pub fn minor_count(&self) -> usize {
        self.accident_count
            .saturating_sub(self.fatal_count)
            .saturating_sub(self.major_count)
    }

    pub fn centroid(&self) -> Coordinate {
        Coordinate {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

/// A point retained by a radius query, with its distance to the anchor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nearby<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(rename = "distance")]
    pub distance_km: f64,
}

/// Counts by risk level for a set of hotspots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskSummary {
    pub fn from_hotspots(hotspots: &[Hotspot]) -> Self {
        hotspots.iter().fold(Self::default(), |mut summary, hotspot| {
            summary.total += 1;
            match hotspot.risk_level {
                RiskLevel::High => summary.high += 1,
                RiskLevel::Medium => summary.medium += 1,
                RiskLevel::Low => summary.low += 1,
            }
            summary
        })
    }
}

/// Parses RFC 3339, falling back to a naive ISO timestamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
