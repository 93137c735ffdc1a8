//! Loose location-descriptor parsing.
//!
//! Accidents, alerts and notifications arrive in several legacy shapes:
//! `latitude`/`longitude` fields, `lat`/`lng` fields, a nested `location`
//! object, or a `location` string holding JSON or free text such as
//! `"Lat: 9.93, Lng: 76.26"`. Everything funnels through [`parse_location`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::model::Coordinate;

const LAT_KEYS: &[&str] = &["latitude", "lat"];
const LNG_KEYS: &[&str] = &["longitude", "lng", "lon"];
const TEXT_KEYS: &[&str] = &["location", "details"];

/// Two decimal numbers separated by anything that is not part of a number.
static COORD_PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+\.\d+)[^\d\-]+(-?\d+\.\d+)").expect("valid regex"));

/// Extract a valid coordinate from a loosely-typed descriptor.
pub fn parse_location(value: &Value) -> Option<Coordinate> {
    match value {
        Value::Object(map) => parse_object(map),
        Value::String(text) => parse_text(text),
        _ => None,
    }
}

/// Extract a coordinate from free text, e.g. `"9.93,76.26"`.
pub fn parse_text(text: &str) -> Option<Coordinate> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
            if let Some(coordinate) = field_pair(&map) {
                return Some(coordinate);
            }
        }
    }

    let captures = COORD_PAIR_RE.captures(trimmed)?;
    let lat = captures.get(1)?.as_str().parse().ok()?;
    let lng = captures.get(2)?.as_str().parse().ok()?;
    Coordinate::new(lat, lng).ok()
}

fn parse_object(map: &Map<String, Value>) -> Option<Coordinate> {
    if let Some(coordinate) = field_pair(map) {
        return Some(coordinate);
    }

    if let Some(Value::Object(nested)) = map.get("location") {
        if let Some(coordinate) = field_pair(nested) {
            return Some(coordinate);
        }
    }

    TEXT_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .find_map(parse_text)
}

fn field_pair(map: &Map<String, Value>) -> Option<Coordinate> {
    let lat = first_number(map, LAT_KEYS)?;
    let lng = first_number(map, LNG_KEYS)?;
    Coordinate::new(lat, lng).ok()
}

fn first_number(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| map.get(*key).and_then(as_number))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
