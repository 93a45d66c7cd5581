use thiserror::Error;

use super::data::{Location, LocationDraft, LocationId, ValidationError, ValidationRules};
use super::kv::{KvError, KvStore};

/// Errors from mutating the location list
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no location at position {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("location {0} is no longer in the list")]
    NotFound(LocationId),
    #[error("could not encode the location list: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("could not save the location list: {0}")]
    Storage(#[from] KvError),
}

/// The ordered list of visited locations and the slot it is persisted in.
///
/// Every mutation rewrites the whole slot. If the write fails the in-memory
/// list is put back the way it was, so memory and storage never disagree.
pub struct LocationStore<K: KvStore> {
    kv: K,
    key: String,
    rules: ValidationRules,
    locations: Vec<Location>,
}

impl<K: KvStore> LocationStore<K> {
    /// Open the store and read whatever the slot currently holds
    pub fn open(kv: K, key: impl Into<String>, rules: ValidationRules) -> Self {
        let mut store = Self {
            kv,
            key: key.into(),
            rules,
            locations: Vec::new(),
        };
        store.load();
        store
    }

    /// Re-read the persisted list.
    ///
    /// Missing, unreadable or malformed data all yield an empty list; this
    /// never fails.
    pub fn load(&mut self) -> &[Location] {
        self.locations = read_slot(&self.kv, &self.key, &self.rules);
        &self.locations
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|loc| loc.id == id)
    }

    /// Case-insensitive name match
    pub fn find_by_name(&self, name: &str) -> Option<&Location> {
        let name = name.trim();
        self.locations
            .iter()
            .find(|loc| loc.name.eq_ignore_ascii_case(name))
    }

    /// Validate a draft and add it to the end of the list
    pub fn append(&mut self, draft: LocationDraft) -> Result<&Location, StoreError> {
        let location = draft.validate(&self.rules)?;
        tracing::debug!(id = %location.id, name = %location.name, "appending location");

        self.locations.push(location);
        if let Err(err) = self.persist() {
            self.locations.pop();
            return Err(err);
        }

        let len = self.locations.len();
        Ok(&self.locations[len - 1])
    }

    /// Remove by current position.
    ///
    /// An index past the end is a caller bug. It is logged at `warn` and
    /// returned as `IndexOutOfRange` with the list untouched.
    pub fn remove_at(&mut self, index: usize) -> Result<Location, StoreError> {
        let len = self.locations.len();
        if index >= len {
            tracing::warn!(index, len, "refusing to remove a location past the end of the list");
            return Err(StoreError::IndexOutOfRange { index, len });
        }

        let removed = self.locations.remove(index);
        if let Err(err) = self.persist() {
            self.locations.insert(index, removed);
            return Err(err);
        }

        tracing::debug!(id = %removed.id, name = %removed.name, "removed location");
        Ok(removed)
    }

    /// Remove by stable id
    pub fn remove(&mut self, id: LocationId) -> Result<Location, StoreError> {
        let Some(index) = self.locations.iter().position(|loc| loc.id == id) else {
            tracing::warn!(%id, "refusing to remove a location that is not in the list");
            return Err(StoreError::NotFound(id));
        };
        self.remove_at(index)
    }

    /// Drop every location and delete the persisted slot
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.kv.remove(&self.key)?;
        let dropped = self.locations.len();
        self.locations.clear();
        tracing::info!("🧹 Cleared {} locations", dropped);
        Ok(())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.locations)?;
        self.kv.set(&self.key, &json)?;
        Ok(())
    }
}

fn read_slot<K: KvStore>(kv: &K, key: &str, rules: &ValidationRules) -> Vec<Location> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!("⚠️  Could not read saved locations, starting empty: {}", err);
            return Vec::new();
        }
    };

    let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(err) => {
            tracing::warn!("⚠️  Saved locations are not readable, starting empty: {}", err);
            return Vec::new();
        }
    };

    // Decode record by record so one bad entry cannot take the rest down
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value::<Location>(record) {
            Ok(loc) => Some(loc),
            Err(err) => {
                tracing::warn!(index, "dropping unreadable saved location: {}", err);
                None
            }
        })
        .filter(|loc| match loc.check(rules) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(name = %loc.name, "dropping invalid saved location: {}", err);
                false
            }
        })
        .collect()
}

impl<K: KvStore> std::fmt::Debug for LocationStore<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationStore")
            .field("key", &self.key)
            .field("len", &self.locations.len())
            .finish()
    }
}
