// ── Generic entity collection ──
//
// Ordered map from server address to entity. Every single-entry
// mutation funnels through `update`, so an unknown address or a rejected
// change always leaves the collection exactly as it was.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::CoreError;
use crate::model::{HasInputs, Named};

/// A mirrored collection for a single entity type.
///
/// Backed by a `BTreeMap` so iteration order is stable and two mirrors
/// fed the same events compare equal. Every mutation bumps a version
/// counter; `synced` is set by a full `State` replacement and cleared when
/// a resync starts.
#[derive(Debug, Clone)]
pub struct EntityCollection<K, V> {
    label: &'static str,
    entries: BTreeMap<K, V>,
    version: u64,
    synced: bool,
}

impl<K: Ord + fmt::Display, V> EntityCollection<K, V> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entries: BTreeMap::new(),
            version: 0,
            synced: false,
        }
    }

    /// Discard everything and take `entries` as the new contents.
    pub fn replace_all(&mut self, entries: impl IntoIterator<Item = (K, V)>) {
        self.entries = entries.into_iter().collect();
        self.synced = true;
        self.bump_version();
    }

    /// Insert or overwrite an entry. Returns `true` if the key was new.
    pub fn upsert(&mut self, key: K, value: V) -> bool {
        let is_new = self.entries.insert(key, value).is_none();
        self.bump_version();
        is_new
    }

    /// Remove an entry. Absent keys are a no-op.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.bump_version();
        }
        removed
    }

    /// Replace one entry with `f(entry)`.
    ///
    /// Unknown keys yield [`CoreError::UnknownAddress`]. If `f` fails its
    /// error is returned and the entry is left as it was.
    pub fn update<F>(&mut self, key: &K, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&V) -> Result<V, CoreError>,
    {
        let label = self.label;
        let Some(slot) = self.entries.get_mut(key) else {
            return Err(CoreError::UnknownAddress {
                collection: label,
                address: key.to_string(),
            });
        };
        *slot = f(slot)?;
        self.bump_version();
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub(crate) fn begin_resync(&mut self) {
        self.synced = false;
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }
}

impl<K: Ord + Clone + fmt::Display, V: Clone> EntityCollection<K, V> {
    /// Owned copy of every entry, in key order.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// `update` with an in-place edit on a copy of the entry.
    fn modify<F>(&mut self, key: &K, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&K, &mut V) -> Result<(), CoreError>,
    {
        self.update(key, |current| {
            let mut next = current.clone();
            f(key, &mut next)?;
            Ok(next)
        })
    }
}

// ── Shared reducers ──────────────────────────────────────────────────

impl<K: Ord + Clone + fmt::Display, V: Named + Clone> EntityCollection<K, V> {
    pub fn rename(&mut self, key: &K, name: String) -> Result<(), CoreError> {
        self.modify(key, |_, entry| {
            entry.set_name(name);
            Ok(())
        })
    }
}

impl<K: Ord + Clone + fmt::Display, V: HasInputs + Clone> EntityCollection<K, V> {
    /// Connect or disconnect one existing input slot.
    pub fn set_input(
        &mut self,
        key: &K,
        slot: usize,
        target: Option<V::Target>,
    ) -> Result<(), CoreError> {
        self.modify(key, |key, entry| {
            let inputs = entry.inputs_mut();
            let len = inputs.len();
            let input = inputs.get_mut(slot).ok_or_else(|| CoreError::InputOutOfRange {
                address: key.to_string(),
                index: slot,
                len,
            })?;
            *input = target;
            Ok(())
        })
    }

    /// Append a disconnected input slot.
    pub fn push_input(&mut self, key: &K) -> Result<(), CoreError> {
        self.modify(key, |_, entry| {
            entry.inputs_mut().push(None);
            Ok(())
        })
    }

    /// Drop the last input slot.
    pub fn pop_input(&mut self, key: &K) -> Result<(), CoreError> {
        self.modify(key, |key, entry| {
            entry
                .inputs_mut()
                .pop()
                .map(|_| ())
                .ok_or_else(|| CoreError::NoInputs {
                    address: key.to_string(),
                })
        })
    }
}

/// Contents and sync state decide equality; the version counter does not.
impl<K: PartialEq, V: PartialEq> PartialEq for EntityCollection<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.synced == other.synced && self.entries == other.entries
    }
}
