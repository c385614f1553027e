//! Directory service: one lookup adapter per record kind, reconfigured from
//! the configuration document as sections appear or change.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{ConfigError, LookupConfig, BANDWIDTH_PROFILE_SECTION, SUBSCRIBER_SECTION};
use crate::lookup::{FetchError, LookupAdapter, Reconfigured, RemoteFetcher, RemoteSettings};
use crate::metrics::StatsSnapshot;
use crate::record::Record;
use crate::records::{BandwidthProfileInfo, SubscriberAndDeviceInfo};

/// A record-kind section of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Subscribers,
    BandwidthProfiles,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 2] = [ConfigSection::Subscribers, ConfigSection::BandwidthProfiles];

    /// Key of this section in the configuration document.
    pub fn key(self) -> &'static str {
        match self {
            ConfigSection::Subscribers => SUBSCRIBER_SECTION,
            ConfigSection::BandwidthProfiles => BANDWIDTH_PROFILE_SECTION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEventKind {
    Added,
    Updated,
    Removed,
}

/// Change notification for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigEvent {
    pub section: ConfigSection,
    pub kind: ConfigEventKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryStats {
    pub subscribers: StatsSnapshot,
    pub bandwidth_profiles: StatsSnapshot,
}

pub struct Directory {
    subscribers: LookupAdapter<SubscriberAndDeviceInfo>,
    bandwidth_profiles: LookupAdapter<BandwidthProfileInfo>,
}

impl Directory {
    /// Both adapters share one HTTP connection pool.
    pub fn new(settings: &RemoteSettings) -> Result<Self, FetchError> {
        let fetcher = RemoteFetcher::new(settings)?;
        Ok(Self {
            subscribers: LookupAdapter::new(fetcher.clone()),
            bandwidth_profiles: LookupAdapter::new(fetcher),
        })
    }

    pub fn subscribers(&self) -> &LookupAdapter<SubscriberAndDeviceInfo> {
        &self.subscribers
    }

    pub fn bandwidth_profiles(&self) -> &LookupAdapter<BandwidthProfileInfo> {
        &self.bandwidth_profiles
    }

    /// Initial load: reconfigure every adapter from its section of `document`.
    /// A section that fails to parse leaves that adapter as it was.
    pub fn apply_document(&self, document: &Value) -> Vec<(ConfigSection, Result<Reconfigured, ConfigError>)> {
        ConfigSection::ALL
            .into_iter()
            .map(|section| {
                let outcome = self.apply_section(section, document);
                if let Err(e) = &outcome {
                    warn!(section = section.key(), error = %e, "section rejected, keeping previous configuration");
                }
                (section, outcome)
            })
            .collect()
    }

    /// React to a change of one section of `document`.
    pub fn handle_event(&self, event: &ConfigEvent, document: &Value) -> Result<Reconfigured, ConfigError> {
        match event.kind {
            ConfigEventKind::Added | ConfigEventKind::Updated => {
                let outcome = self.apply_section(event.section, document)?;
                info!(section = event.section.key(), ?outcome, "reconfigured");
                Ok(outcome)
            }
            ConfigEventKind::Removed => {
                info!(section = event.section.key(), "section removed, keeping previous configuration");
                Ok(Reconfigured::NoConfig)
            }
        }
    }

    fn apply_section(&self, section: ConfigSection, document: &Value) -> Result<Reconfigured, ConfigError> {
        let value = document.get(section.key());
        match section {
            ConfigSection::Subscribers => reconfigure_from(&self.subscribers, value),
            ConfigSection::BandwidthProfiles => reconfigure_from(&self.bandwidth_profiles, value),
        }
    }

    pub fn stats(&self) -> DirectoryStats {
        DirectoryStats {
            subscribers: self.subscribers.stats(),
            bandwidth_profiles: self.bandwidth_profiles.stats(),
        }
    }
}

fn reconfigure_from<R: Record>(
    adapter: &LookupAdapter<R>,
    section: Option<&Value>,
) -> Result<Reconfigured, ConfigError> {
    let config = section.map(LookupConfig::from_section).transpose()?;
    Ok(adapter.update_config(config))
}
