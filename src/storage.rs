/// Archive record set and the key-value store it is persisted in

use crate::error::ArchiveError;
use crate::identity::RowIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Archived row identities, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveRecordSet {
    entries: Vec<RowIdentity>,
}

impl ArchiveRecordSet {
    pub fn new() -> Self {
        ArchiveRecordSet {
            entries: Vec::new(),
        }
    }

    /// Decode a stored array entry by entry. Entries that are not identities
    /// (older `[id, millis]` records, for instance) are skipped.
    pub fn from_stored(values: Vec<serde_json::Value>) -> Self {
        let entries = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RowIdentity>(value.clone()) {
                Ok(identity) => Some(identity),
                Err(_) => {
                    log::warn!("Skipping unreadable archive entry: {}", value);
                    None
                }
            })
            .collect();
        ArchiveRecordSet { entries }
    }

    pub fn push(&mut self, identity: RowIdentity) {
        self.entries.push(identity);
    }

    /// Remove every entry matching `identity`, returning how many went
    pub fn remove_matching(&mut self, identity: &RowIdentity) -> usize {
        let original_len = self.entries.len();
        self.entries.retain(|entry| !entry.matches(identity));
        original_len - self.entries.len()
    }

    pub fn contains_match(&self, identity: &RowIdentity) -> bool {
        self.entries.iter().any(|entry| entry.matches(identity))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowIdentity> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RowIdentity> for ArchiveRecordSet {
    fn from_iter<I: IntoIterator<Item = RowIdentity>>(iter: I) -> Self {
        ArchiveRecordSet {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Asynchronous key-value store holding the archive record set.
///
/// Futures are `!Send`: the browser implementation awaits JS promises on
/// the page's event loop.
#[async_trait(?Send)]
pub trait ArchiveStore {
    /// Stored set under `key`, `None` when nothing was ever written
    async fn get(&self, key: &str) -> Result<Option<ArchiveRecordSet>, ArchiveError>;

    async fn set(&self, key: &str, records: &ArchiveRecordSet) -> Result<(), ArchiveError>;
}
