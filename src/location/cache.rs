use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::address::DetectedLocation;

pub const CACHE_VALIDITY_MS: i64 = 24 * 60 * 60 * 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLocation {
    pub data: DetectedLocation,
    /// Epoch milliseconds of the write.
    pub timestamp: i64,
}

impl CachedLocation {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() - self.timestamp < CACHE_VALIDITY_MS
    }
}

/// One JSON file holding the last detected location. Every I/O problem
/// reads as "no cache".
#[derive(Debug, Clone)]
pub struct LocationCache {
    path: PathBuf,
}

impl LocationCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Fresh entry, if any. Stale entries stay on disk until overwritten.
    pub fn load(&self, now: DateTime<Utc>) -> Option<CachedLocation> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "location cache unreadable");
                return None;
            }
        };

        let entry: CachedLocation = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(path = %self.path.display(), error = %err, "location cache corrupt");
                return None;
            }
        };

        if entry.is_fresh(now) {
            Some(entry)
        } else {
            debug!(timestamp = entry.timestamp, "location cache expired");
            None
        }
    }

    pub fn store(&self, data: &DetectedLocation, now: DateTime<Utc>) {
        let entry = CachedLocation {
            data: data.clone(),
            timestamp: now.timestamp_millis(),
        };

        let written = serde_json::to_string(&entry)
            .map_err(|err| err.to_string())
            .and_then(|json| fs::write(&self.path, json).map_err(|err| err.to_string()));

        if let Err(err) = written {
            debug!(path = %self.path.display(), error = %err, "location cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::LocationCache;
    use crate::models::address::{AddressComponents, DetectedLocation};
    use crate::models::coordinate::Coordinate;

    fn detected() -> DetectedLocation {
        DetectedLocation {
            components: AddressComponents {
                city: Some("Madurai".to_string()),
                pincode: Some("625001".to_string()),
                ..Default::default()
            },
            coordinate: Coordinate::new(9.9252, 78.1198).unwrap(),
        }
    }

    #[test]
    fn fresh_entry_is_returned_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocationCache::new(dir.path().join("location.json"));
        let written_at = Utc::now() - Duration::hours(23);

        cache.store(&detected(), written_at);
        let entry = cache.load(Utc::now()).unwrap();

        assert_eq!(entry.data, detected());
        assert_eq!(entry.timestamp, written_at.timestamp_millis());
    }

    #[test]
    fn expired_entry_is_ignored_but_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("location.json");
        let cache = LocationCache::new(&path);

        cache.store(&detected(), Utc::now() - Duration::hours(25));

        assert!(cache.load(Utc::now()).is_none());
        assert!(path.exists());
    }

    #[test]
    fn missing_or_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("location.json");
        let cache = LocationCache::new(&path);
        assert!(cache.load(Utc::now()).is_none());

        std::fs::write(&path, "{not json").unwrap();
        assert!(cache.load(Utc::now()).is_none());
    }

    #[test]
    fn unwritable_location_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocationCache::new(dir.path().join("missing-dir").join("location.json"));

        cache.store(&detected(), Utc::now());
        assert!(cache.load(Utc::now()).is_none());
    }

    #[test]
    fn entry_uses_flat_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("location.json");
        let cache = LocationCache::new(&path);
        cache.store(&detected(), Utc::now());

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["data"]["city"], "Madurai");
        assert_eq!(json["data"]["latitude"], 9.9252);
        assert!(json["timestamp"].is_i64());
    }
}
