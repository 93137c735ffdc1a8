//! HTTP adapter for the backend's accident-listing endpoint.

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::FeedError;
use crate::model::{AccidentRecord, Severity};
use crate::traits::AccidentSource;

pub const API_URL_ENV: &str = "SAFEROUTE_API_URL";
pub const API_TIMEOUT_ENV: &str = "SAFEROUTE_API_TIMEOUT_SECS";

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Page size used when a query does not set its own limit.
    pub report_limit: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 10,
            report_limit: 100,
        }
    }
}

impl BackendConfig {
    /// Defaults overridden by `SAFEROUTE_API_URL` / `SAFEROUTE_API_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(API_URL_ENV).ok().as_deref(),
            std::env::var(API_TIMEOUT_ENV).ok().as_deref(),
        )
    }

    /// Defaults overridden by raw override values. Blank URLs and
    /// unparseable timeouts are ignored.
    pub fn from_values(url: Option<&str>, timeout_secs: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = timeout_secs {
            match raw.trim().parse() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => warn!(value = %raw, "ignoring unparseable {}", API_TIMEOUT_ENV),
            }
        }
        config
    }
}

/// Filters accepted by `GET /api/reports/`.
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub limit: Option<usize>,
    pub severity: Option<Severity>,
    pub verified: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    config: BackendConfig,
    client: reqwest::blocking::Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// List accident reports, newest first as the backend orders them.
    /// Reports that cannot be decoded are skipped.
    pub fn fetch_accidents(&self, query: &ReportQuery) -> Result<Vec<AccidentRecord>, FeedError> {
        let url = format!("{}/api/reports/", self.config.base_url.trim_end_matches('/'));

        let mut params: Vec<(&str, String)> = vec![(
            "limit",
            query.limit.unwrap_or(self.config.report_limit).to_string(),
        )];
        if let Some(severity) = query.severity {
            params.push(("severity", severity.as_str().to_string()));
        }
        if let Some(verified) = query.verified {
            params.push(("verified", verified.to_string()));
        }

        let response = self.client.get(&url).query(&params).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(FeedError::Api {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let payload: Value = serde_json::from_str(&body)?;
        let records = decode_reports(&payload)?;
        debug!(url = %url, count = records.len(), "fetched accident reports");
        Ok(records)
    }
}

impl AccidentSource for BackendClient {
    fn accidents(&self) -> Result<Vec<AccidentRecord>, FeedError> {
        self.fetch_accidents(&ReportQuery::default())
    }
}

/// Unwrap the listing envelope and decode each report.
///
/// Accepts `{"success", "data": {"count", "reports": [..]}}`,
/// `{"data": [..]}`, `{"reports": [..]}` or a bare array.
pub fn decode_reports(payload: &Value) -> Result<Vec<AccidentRecord>, FeedError> {
    let items = report_items(payload).ok_or_else(|| {
        FeedError::Envelope("expected a list of reports or a data envelope".to_string())
    })?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let record = AccidentRecord::from_value(item);
            if record.is_none() {
                warn!(report = %item, "skipping accident report without id or location");
            }
            record
        })
        .collect())
}

fn report_items(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(items) => Some(items),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => Some(items),
            Some(Value::Object(data)) => data.get("reports").and_then(Value::as_array),
            _ => map.get("reports").and_then(Value::as_array),
        },
        _ => None,
    }
}

fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
