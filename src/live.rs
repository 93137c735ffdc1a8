//! Live accident feed session.
//!
//! Owns the accident snapshot, the hotspots derived from it and the
//! push-channel lifecycle. The socket itself belongs to the caller: it
//! reports open/close transitions and hands over text frames, and the
//! session answers with reconnect delays and decoded events.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{FeedError, HotspotError};
use crate::hotspot::{cluster_accidents, Clustering, HotspotOptions};
use crate::model::{AccidentRecord, Coordinate, Hotspot, RiskSummary};
use crate::radius::hotspots_within_radius;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    /// Closed on purpose; no reconnects.
    Closed,
}

/// Linear backoff: attempt `n` waits `base_delay * n`, up to `max_attempts`.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(3),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before 1-based `attempt`, or None once the budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base_delay * attempt)
    }
}

/// A decoded push frame.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// Appended to the snapshot; hotspots were rebuilt.
    NewAccident(AccidentRecord),
    NewAlert(Value),
    Pong,
    Other { event: String, data: Value },
}

/// Holds the accident snapshot and the hotspots built from it.
///
/// Pushed accidents are appended, so after a push the snapshot is no longer
/// in the backend's newest-first order. Clustering depends on input order,
/// and a fresh listing of the same reports can therefore yield different
/// hotspots. The session's hotspots always match `cluster_accidents` over
/// `accidents()`.
#[derive(Debug)]
pub struct LiveSession {
    state: ConnectionState,
    attempts: u32,
    policy: ReconnectPolicy,
    options: HotspotOptions,
    accidents: Vec<AccidentRecord>,
    clustering: Clustering,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default(), HotspotOptions::default())
    }
}

impl LiveSession {
    pub fn new(policy: ReconnectPolicy, options: HotspotOptions) -> Self {
        let clustering = cluster_accidents(&[], &options);
        Self {
            state: ConnectionState::Disconnected,
            attempts: 0,
            policy,
            options,
            accidents: Vec::new(),
            clustering,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Mark a connection attempt. False when already open.
    pub fn connect(&mut self) -> bool {
        if self.state == ConnectionState::Open {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    pub fn on_open(&mut self) {
        info!(after_attempts = self.attempts, "live feed connected");
        self.state = ConnectionState::Open;
        self.attempts = 0;
    }

    /// Connection dropped. Returns how long to wait before reconnecting.
    pub fn on_close(&mut self) -> Option<Duration> {
        if self.state == ConnectionState::Closed {
            return None;
        }
        self.state = ConnectionState::Disconnected;
        self.attempts += 1;

        match self.policy.delay_for(self.attempts) {
            Some(delay) => {
                info!(
                    attempt = self.attempts,
                    max_attempts = self.policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "live feed disconnected, reconnect scheduled"
                );
                Some(delay)
            }
            None => {
                warn!(attempts = self.policy.max_attempts, "live feed reconnect budget exhausted");
                None
            }
        }
    }

    /// Close on purpose and reset the reconnect budget.
    pub fn close(&mut self) {
        info!("live feed closed");
        self.state = ConnectionState::Closed;
        self.attempts = 0;
    }

    /// Replace the snapshot, e.g. with the initial listing.
    pub fn seed(&mut self, accidents: Vec<AccidentRecord>) {
        self.accidents = accidents;
        self.rebuild();
    }

    /// Decode one text frame and apply it.
    pub fn handle_message(&mut self, text: &str) -> Result<LiveEvent, FeedError> {
        let frame: Value = serde_json::from_str(text)?;
        let event = frame
            .get("event")
            .or_else(|| frame.get("type"))
            .and_then(Value::as_str)
            .ok_or_else(|| FeedError::Envelope("push frame has no event or type".to_string()))?
            .to_string();
        let data = frame.get("data").cloned().unwrap_or(Value::Null);

        match event.as_str() {
            "new_accident" => {
                let Some(record) = AccidentRecord::from_value(&data) else {
                    warn!(frame = %text, "new_accident frame without id or location");
                    return Err(FeedError::Envelope(
                        "new_accident data has no id or location".to_string(),
                    ));
                };
                self.accidents.push(record.clone());
                self.rebuild();
                Ok(LiveEvent::NewAccident(record))
            }
            "new_alert" => Ok(LiveEvent::NewAlert(data)),
            "pong" => Ok(LiveEvent::Pong),
            _ => Ok(LiveEvent::Other { event, data }),
        }
    }

    pub fn accidents(&self) -> &[AccidentRecord] {
        &self.accidents
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.clustering.hotspots
    }

    pub fn clustering(&self) -> &Clustering {
        &self.clustering
    }

    pub fn summary(&self) -> RiskSummary {
        RiskSummary::from_hotspots(self.hotspots())
    }

    pub fn nearby_hotspots(&self, center: Coordinate, radius_km: f64) -> Result<Vec<Hotspot>, HotspotError> {
        hotspots_within_radius(self.hotspots(), center, radius_km)
    }

    fn rebuild(&mut self) {
        self.clustering = cluster_accidents(&self.accidents, &self.options);
    }
}

/// Keep-alive frame.
pub fn ping_frame(now: DateTime<Utc>) -> String {
    json!({
        "type": "ping",
        "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
    })
    .to_string()
}

/// Reports the user's position to the backend.
pub fn location_update_frame(location: Coordinate) -> String {
    json!({
        "type": "location_update",
        "latitude": location.lat,
        "longitude": location.lng,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reconnect_delays_are_linear() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(3)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(6)));
        assert_eq!(policy.delay_for(5), Some(Duration::from_secs(15)));
        assert_eq!(policy.delay_for(6), None);
        assert_eq!(policy.delay_for(0), None);
    }

    #[test]
    fn test_reconnect_budget() {
        let mut session = LiveSession::default();
        assert!(session.connect());
        session.on_open();
        assert!(!session.connect());

        for attempt in 1..=5 {
            assert_eq!(session.on_close(), Some(Duration::from_secs(3 * attempt)));
        }
        assert_eq!(session.on_close(), None);
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_open_resets_attempts() {
        let mut session = LiveSession::default();
        session.on_close();
        session.on_close();
        assert_eq!(session.attempts(), 2);
        session.on_open();
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.on_close(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_explicit_close_never_reconnects() {
        let mut session = LiveSession::default();
        session.on_open();
        session.close();
        assert_eq!(session.on_close(), None);
        assert_eq!(session.state(), ConnectionState::Closed);
        assert!(session.connect());
    }

    #[test]
    fn test_other_events_leave_snapshot_alone() {
        let mut session = LiveSession::default();
        let alert = session
            .handle_message(r#"{"event": "new_alert", "data": {"message": "Fog on NH66"}}"#)
            .unwrap();
        assert!(matches!(alert, LiveEvent::NewAlert(_)));
        assert_eq!(session.handle_message(r#"{"type": "pong"}"#).unwrap(), LiveEvent::Pong);
        let other = session.handle_message(r#"{"event": "system_update"}"#).unwrap();
        assert_eq!(
            other,
            LiveEvent::Other {
                event: "system_update".to_string(),
                data: Value::Null
            }
        );
        assert!(session.accidents().is_empty());
    }

    #[test]
    fn test_malformed_frames() {
        let mut session = LiveSession::default();
        assert!(matches!(session.handle_message("not json"), Err(FeedError::Decode(_))));
        assert!(matches!(session.handle_message(r#"{"data": {}}"#), Err(FeedError::Envelope(_))));
        assert!(matches!(
            session.handle_message(r#"{"event": "new_accident", "data": {"id": 1}}"#),
            Err(FeedError::Envelope(_))
        ));
        assert!(session.accidents().is_empty());
    }

    #[test]
    fn test_outbound_frames() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let ping: Value = serde_json::from_str(&ping_frame(now)).unwrap();
        assert_eq!(ping["type"], "ping");
        assert_eq!(ping["timestamp"], "2024-03-01T08:00:00.000Z");

        let update: Value =
            serde_json::from_str(&location_update_frame(Coordinate { lat: 9.93, lng: 76.26 })).unwrap();
        assert_eq!(update["type"], "location_update");
        assert_eq!(update["latitude"], 9.93);
        assert_eq!(update["longitude"], 76.26);
    }
}
