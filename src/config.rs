//! Configuration document parsing.
//!
//! The document holds one section per record kind:
//!
//! ```json
//! {
//!   "sadis": {
//!     "integration": {
//!       "url": "http://directory.local/subscribers/%s",
//!       "cache": { "maxsize": 50, "ttl": "PT1M" }
//!     },
//!     "entries": [ { "id": "PSMO12345678", "nasId": "olt-1" } ]
//!   },
//!   "bandwidthprofile": { ... }
//! }
//! ```
//!
//! A section parses into a [`LookupConfig`]. Problems with a single field or
//! entry degrade that field or entry only; a section that cannot be read at
//! all is an error, and the caller keeps its previous state.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

use crate::lookup::UrlTemplate;
use crate::record::{decode_value_strict, Record};

/// Section key for subscriber and device records.
pub const SUBSCRIBER_SECTION: &str = "sadis";
/// Section key for bandwidth profiles.
pub const BANDWIDTH_PROFILE_SECTION: &str = "bandwidthprofile";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidTemplate { template: String, reason: String },
    InvalidDuration(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config IO error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::InvalidTemplate { template, reason } => {
                write!(f, "invalid URL template \"{template}\": {reason}")
            }
            ConfigError::InvalidDuration(text) => {
                write!(f, "invalid ISO-8601 duration \"{text}\"")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Read and parse a configuration document from disk.
pub fn load_document(path: &Path) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Everything an adapter needs for one reconfiguration.
#[derive(Debug, Clone)]
pub struct LookupConfig<R> {
    /// `None` means no remote source.
    pub remote: Option<UrlTemplate>,
    /// 0 disables caching.
    pub cache_max_entries: usize,
    /// 0 disables caching.
    pub cache_ttl: Duration,
    /// Loaded into the local table in order.
    pub local_entries: Vec<R>,
}

impl<R> Default for LookupConfig<R> {
    fn default() -> Self {
        Self {
            remote: None,
            cache_max_entries: 0,
            cache_ttl: Duration::ZERO,
            local_entries: Vec::new(),
        }
    }
}

impl<R: Record> LookupConfig<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the remote source. An invalid template is logged and leaves no remote source.
    pub fn with_remote_url(mut self, url: &str) -> Self {
        self.remote = validate_template::<R>(url);
        self
    }

    pub fn with_cache(mut self, max_entries: usize, ttl: Duration) -> Self {
        self.cache_max_entries = max_entries;
        self.cache_ttl = ttl;
        self
    }

    pub fn with_entries(mut self, entries: Vec<R>) -> Self {
        self.local_entries = entries;
        self
    }

    /// Parse one section of the configuration document.
    pub fn from_section(section: &Value) -> Result<Self, ConfigError> {
        let doc = SectionDocument::deserialize(section)?;

        let mut config = Self::new();
        if let Some(integration) = doc.integration {
            if let Some(url) = integration.url.as_deref() {
                config.remote = validate_template::<R>(url);
            }
            if let Some(cache) = integration.cache {
                config.cache_max_entries = match usize::try_from(cache.maxsize) {
                    Ok(size) => size,
                    Err(_) => {
                        warn!(kind = R::KIND, maxsize = cache.maxsize, "negative cache size, caching disabled");
                        0
                    }
                };
                if let Some(ttl) = cache.ttl.as_deref() {
                    config.cache_ttl = parse_iso_duration(ttl)?;
                }
            }
        }

        config.local_entries = doc
            .entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match decode_value_strict::<R>(entry) {
                Ok(record) if record.id().is_empty() => {
                    warn!(kind = R::KIND, index, "skipping entry with empty id");
                    None
                }
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(kind = R::KIND, index, error = %e, "skipping invalid entry");
                    None
                }
            })
            .collect();

        Ok(config)
    }
}

fn validate_template<R: Record>(url: &str) -> Option<UrlTemplate> {
    match UrlTemplate::parse(url) {
        Ok(template) => Some(template),
        Err(e) => {
            error!(kind = R::KIND, error = %e, "invalid remote URL, remote lookups disabled");
            None
        }
    }
}

#[derive(Deserialize)]
struct SectionDocument {
    #[serde(default)]
    integration: Option<IntegrationDocument>,
    #[serde(default)]
    entries: Vec<Value>,
}

#[derive(Deserialize)]
struct IntegrationDocument {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    cache: Option<CacheDocument>,
}

#[derive(Deserialize)]
struct CacheDocument {
    #[serde(default)]
    maxsize: i64,
    #[serde(default)]
    ttl: Option<String>,
}

static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)D)?(T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:[.,](\d{1,9}))?S)?)?$")
        .expect("duration pattern is valid")
});

/// Parse an ISO-8601 duration of the form `PnDTnHnMn.nS`.
pub fn parse_iso_duration(text: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(text.to_owned());
    let caps = ISO_DURATION.captures(text.trim()).ok_or_else(invalid)?;

    let time_part = caps.get(2).is_some();
    let has_time_fields = (3..=5).any(|i| caps.get(i).is_some());
    if (time_part && !has_time_fields) || (!time_part && caps.get(1).is_none()) {
        return Err(invalid());
    }

    let field = |index: usize, unit: u64| -> Result<u64, ConfigError> {
        match caps.get(index) {
            None => Ok(0),
            Some(m) => m
                .as_str()
                .parse::<u64>()
                .ok()
                .and_then(|value| value.checked_mul(unit))
                .ok_or_else(invalid),
        }
    };

    let secs = [field(1, 86_400)?, field(3, 3_600)?, field(4, 60)?, field(5, 1)?]
        .into_iter()
        .try_fold(0u64, u64::checked_add)
        .ok_or_else(invalid)?;

    let nanos = match caps.get(6) {
        Some(m) => {
            let digits = m.as_str();
            let value: u32 = digits.parse().map_err(|_| invalid())?;
            value * 10u32.pow(9 - digits.len() as u32)
        }
        None => 0,
    };

    Ok(Duration::new(secs, nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{BandwidthProfileInfo, SubscriberAndDeviceInfo};
    use serde_json::json;

    #[test]
    fn iso_durations() {
        assert_eq!(parse_iso_duration("PT0S").unwrap(), Duration::ZERO);
        assert_eq!(parse_iso_duration("PT1M").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_iso_duration("pt2h30m").unwrap(), Duration::from_secs(9_000));
        assert_eq!(parse_iso_duration("P1DT1S").unwrap(), Duration::from_secs(86_401));
        assert_eq!(parse_iso_duration("P2D").unwrap(), Duration::from_secs(172_800));
        assert_eq!(parse_iso_duration("PT1.5S").unwrap(), Duration::from_millis(1_500));

        for bad in ["", "P", "PT", "P1DT", "1M", "PT-5S", "PT1Y", "60"] {
            assert!(parse_iso_duration(bad).is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn full_section() {
        let section = json!({
            "integration": {
                "url": "http://directory.local/bp/%s",
                "cache": { "maxsize": 40, "ttl": "PT10M" }
            },
            "entries": [
                { "id": "HSA", "cir": 10, "pir": 20 },
                { "id": "Default", "cir": 1 }
            ]
        });
        let config = LookupConfig::<BandwidthProfileInfo>::from_section(&section).unwrap();
        assert_eq!(config.remote.as_ref().map(|t| t.as_str()), Some("http://directory.local/bp/%s"));
        assert_eq!(config.cache_max_entries, 40);
        assert_eq!(config.cache_ttl, Duration::from_secs(600));
        assert_eq!(config.local_entries.len(), 2);
        assert_eq!(config.local_entries[0].id, "HSA");
    }

    #[test]
    fn missing_integration_means_no_remote_and_no_cache() {
        let section = json!({ "entries": [ { "id": "A" } ] });
        let config = LookupConfig::<SubscriberAndDeviceInfo>::from_section(&section).unwrap();
        assert!(config.remote.is_none());
        assert_eq!(config.cache_max_entries, 0);
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert_eq!(config.local_entries.len(), 1);
    }

    #[test]
    fn invalid_template_disables_remote_only() {
        let section = json!({
            "integration": { "url": "http://directory.local/sub", "cache": { "maxsize": 5, "ttl": "PT5S" } }
        });
        let config = LookupConfig::<SubscriberAndDeviceInfo>::from_section(&section).unwrap();
        assert!(config.remote.is_none());
        assert_eq!(config.cache_max_entries, 5);
    }

    #[test]
    fn negative_cache_size_disables_cache() {
        let section = json!({ "integration": { "cache": { "maxsize": -3, "ttl": "PT5S" } } });
        let config = LookupConfig::<SubscriberAndDeviceInfo>::from_section(&section).unwrap();
        assert_eq!(config.cache_max_entries, 0);
    }

    #[test]
    fn bad_ttl_fails_the_section() {
        let section = json!({ "integration": { "cache": { "maxsize": 5, "ttl": "ten minutes" } } });
        let err = LookupConfig::<SubscriberAndDeviceInfo>::from_section(&section).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration(_)));
    }

    #[test]
    fn invalid_entries_are_skipped() {
        let section = json!({
            "entries": [
                { "id": "A" },
                { "id": "B", "notAField": 1 },
                { "id": "" },
                { "nasId": "no id" },
                { "id": "D", "nniDhcpTrapVid": 5000 },
                { "id": "C" }
            ]
        });
        let config = LookupConfig::<SubscriberAndDeviceInfo>::from_section(&section).unwrap();
        let ids: Vec<&str> = config.local_entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["A", "C"]);
    }

    #[test]
    fn non_object_section_is_an_error() {
        let err = LookupConfig::<SubscriberAndDeviceInfo>::from_section(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_document_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        std::fs::write(&path, r#"{"sadis":{"entries":[]}}"#).unwrap();
        let doc = load_document(&path).unwrap();
        assert!(doc.get(SUBSCRIBER_SECTION).is_some());

        let err = load_document(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
