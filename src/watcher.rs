//! Configuration file watcher.
//! Polls the document, fingerprints each section with blake3 and feeds
//! Added/Updated/Removed events for changed sections to the directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ConfigError;
use crate::directory::{ConfigEvent, ConfigEventKind, ConfigSection, Directory};

pub struct ConfigWatcher {
    path: PathBuf,
    directory: Arc<Directory>,
    fingerprints: Mutex<HashMap<ConfigSection, blake3::Hash>>,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>, directory: Arc<Directory>) -> Self {
        Self {
            path: path.into(),
            directory,
            fingerprints: Mutex::new(HashMap::new()),
        }
    }

    /// Read the file once and apply every section whose content changed.
    /// The first successful pass reports each present section as added.
    pub async fn poll_once(&self) -> Result<Vec<ConfigEvent>, ConfigError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let document: Value = serde_json::from_slice(&bytes)?;

        let events = self.detect_changes(&document);
        for event in &events {
            if let Err(e) = self.directory.handle_event(event, &document) {
                warn!(
                    section = event.section.key(),
                    error = %e,
                    "section rejected, keeping previous configuration"
                );
            }
        }
        Ok(events)
    }

    fn detect_changes(&self, document: &Value) -> Vec<ConfigEvent> {
        let mut fingerprints = self.fingerprints.lock();
        let mut events = Vec::new();

        for section in ConfigSection::ALL {
            let current = document.get(section.key()).map(fingerprint);
            let kind = match (fingerprints.get(&section), current) {
                (None, Some(_)) => ConfigEventKind::Added,
                (Some(previous), Some(current)) if *previous != current => ConfigEventKind::Updated,
                (Some(_), None) => ConfigEventKind::Removed,
                _ => continue,
            };

            match current {
                Some(hash) => fingerprints.insert(section, hash),
                None => fingerprints.remove(&section),
            };
            debug!(section = section.key(), ?kind, "config section changed");
            events.push(ConfigEvent { section, kind });
        }
        events
    }

    /// Poll every `interval` until `cancel` fires.
    pub async fn run(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        info!(path = %self.path.display(), interval_ms = interval.as_millis() as u64, "config watcher started");
        loop {
            match self.poll_once().await {
                Ok(events) if !events.is_empty() => {
                    info!(changed = events.len(), "configuration reloaded");
                }
                Ok(_) => {}
                Err(e) => warn!(path = %self.path.display(), error = %e, "failed to read configuration"),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        info!("config watcher exiting");
    }

    pub fn spawn(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(interval, cancel))
    }
}

fn fingerprint(section: &Value) -> blake3::Hash {
    // serde_json keeps object keys sorted, so the rendering is canonical.
    blake3::hash(section.to_string().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::RemoteSettings;
    use serde_json::json;

    fn directory() -> Arc<Directory> {
        let settings = RemoteSettings {
            use_system_proxy: false,
            ..RemoteSettings::default()
        };
        Arc::new(Directory::new(&settings).unwrap())
    }

    fn write(path: &std::path::Path, document: &Value) {
        std::fs::write(path, document.to_string()).unwrap();
    }

    fn kinds(events: &[ConfigEvent]) -> Vec<(ConfigSection, ConfigEventKind)> {
        events.iter().map(|e| (e.section, e.kind)).collect()
    }

    #[tokio::test]
    async fn detects_section_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        let directory = directory();
        let watcher = ConfigWatcher::new(&path, Arc::clone(&directory));

        let mut doc = json!({
            "sadis": { "entries": [ { "id": "A" } ] },
            "bandwidthprofile": { "entries": [ { "id": "Default", "cir": 1 } ] }
        });
        write(&path, &doc);
        let events = watcher.poll_once().await.unwrap();
        assert_eq!(
            kinds(&events),
            [
                (ConfigSection::Subscribers, ConfigEventKind::Added),
                (ConfigSection::BandwidthProfiles, ConfigEventKind::Added),
            ]
        );
        assert!(directory.subscribers().get("A").await.is_some());

        assert!(watcher.poll_once().await.unwrap().is_empty());

        doc["sadis"]["entries"] = json!([ { "id": "B" } ]);
        write(&path, &doc);
        let events = watcher.poll_once().await.unwrap();
        assert_eq!(kinds(&events), [(ConfigSection::Subscribers, ConfigEventKind::Updated)]);
        assert!(directory.subscribers().get("B").await.is_some());

        doc.as_object_mut().unwrap().remove("bandwidthprofile");
        write(&path, &doc);
        let events = watcher.poll_once().await.unwrap();
        assert_eq!(kinds(&events), [(ConfigSection::BandwidthProfiles, ConfigEventKind::Removed)]);
        assert_eq!(directory.bandwidth_profiles().local_len(), 1);
    }

    #[tokio::test]
    async fn unreadable_file_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        let directory = directory();
        let watcher = ConfigWatcher::new(&path, Arc::clone(&directory));

        assert!(matches!(watcher.poll_once().await, Err(ConfigError::Io(_))));

        write(&path, &json!({ "sadis": { "entries": [ { "id": "A" } ] } }));
        watcher.poll_once().await.unwrap();

        std::fs::write(&path, "{ truncated").unwrap();
        assert!(matches!(watcher.poll_once().await, Err(ConfigError::Parse(_))));
        assert_eq!(directory.subscribers().local_len(), 1);
    }

    #[tokio::test]
    async fn background_task_applies_changes_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");
        write(&path, &json!({ "sadis": { "entries": [] } }));

        let directory = directory();
        let watcher = Arc::new(ConfigWatcher::new(&path, Arc::clone(&directory)));
        let cancel = CancellationToken::new();
        let handle = watcher.spawn(Duration::from_millis(20), cancel.clone());

        write(&path, &json!({ "sadis": { "entries": [ { "id": "A" }, { "id": "B" } ] } }));
        tokio::time::timeout(Duration::from_secs(5), async {
            while directory.subscribers().local_len() != 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
