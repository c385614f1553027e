//! Subscriber directory: read-through lookup of subscriber/device and
//! bandwidth-profile records.
//! Each record kind has its own adapter (cache, then local table from config,
//! then remote HTTP directory), reconfigured in place as the config changes.

pub mod config;
pub mod directory;
pub mod lookup;
pub mod metrics;
pub mod record;
pub mod records;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, LookupConfig};
pub use directory::{ConfigEvent, ConfigEventKind, ConfigSection, Directory, DirectoryStats};
pub use lookup::{FetchError, LookupAdapter, Reconfigured, RemoteFetcher, RemoteSettings, UrlTemplate};
pub use record::{DecodeError, Record};
pub use records::{BandwidthProfileInfo, SubscriberAndDeviceInfo, UniTagInfo, VlanId};
pub use watcher::ConfigWatcher;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "subscriber_directory=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
/// Returns false if a subscriber was already installed.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.is_ok()
}
