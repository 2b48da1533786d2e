//! The entry table: the authoritative map from identity to stored object and
//! its resolution state.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use cadb_types::ObjectId;
use serde_json::Value;

use crate::config::DuplicatePolicy;
use crate::coordinator::Flight;
use crate::error::{DatabaseError, DatabaseResult};
use crate::object::{Object, Recipe};

/// Externally visible resolution status of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    /// Stored, never resolved.
    Pending,
    /// A resolution is running.
    InFlight,
    /// Holds its final value.
    Resolved,
    /// The last resolution failed.
    Failed,
}

pub(crate) enum EntryState {
    Resolved(Arc<Value>),
    Pending(Recipe),
    InFlight { recipe: Recipe, flight: Flight },
    Failed { recipe: Recipe, error: DatabaseError },
}

pub(crate) struct Entry {
    /// Canonical encoding the identity was derived from.
    pub(crate) encoding: Arc<[u8]>,
    /// Declared dependencies; empty for raw values. Kept past resolution.
    deps: Vec<ObjectId>,
    pub(crate) state: EntryState,
}

impl Entry {
    pub(crate) fn new(object: Object, encoding: Vec<u8>) -> Self {
        let deps = object.dependencies().to_vec();
        let state = match object {
            Object::Value(value) => EntryState::Resolved(Arc::new(value)),
            Object::Recipe(recipe) => EntryState::Pending(recipe),
        };
        Self {
            encoding: encoding.into(),
            deps,
            state,
        }
    }

    pub(crate) fn status(&self) -> EntryStatus {
        match &self.state {
            EntryState::Resolved(_) => EntryStatus::Resolved,
            EntryState::Pending(_) => EntryStatus::Pending,
            EntryState::InFlight { flight, .. } if flight.is_abandoned() => EntryStatus::Failed,
            EntryState::InFlight { .. } => EntryStatus::InFlight,
            EntryState::Failed { .. } => EntryStatus::Failed,
        }
    }

    pub(crate) fn dependencies(&self) -> Vec<ObjectId> {
        self.deps.clone()
    }
}

/// Identity-keyed entries behind a single lock.
///
/// Critical sections are short and never span an `.await`: resolver work
/// always happens outside the lock.
pub(crate) struct EntryTable {
    entries: RwLock<HashMap<ObjectId, Entry>>,
}

impl EntryTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new entry. Returns `false` when the identity was already
    /// mapped and the policy is `Reuse`.
    pub(crate) fn insert(
        &self,
        id: ObjectId,
        entry: Entry,
        policy: DuplicatePolicy,
    ) -> DatabaseResult<bool> {
        let mut map = self.entries.write().expect("entry table lock poisoned");
        if map.contains_key(&id) {
            return match policy {
                DuplicatePolicy::Reuse => Ok(false),
                DuplicatePolicy::Reject => Err(DatabaseError::AlreadyExists(id)),
            };
        }
        map.insert(id, entry);
        Ok(true)
    }

    pub(crate) fn contains(&self, id: &ObjectId) -> bool {
        self.entries
            .read()
            .expect("entry table lock poisoned")
            .contains_key(id)
    }

    pub(crate) fn read<R>(&self, id: &ObjectId, f: impl FnOnce(&Entry) -> R) -> Option<R> {
        self.entries
            .read()
            .expect("entry table lock poisoned")
            .get(id)
            .map(f)
    }

    /// Run `f` on the entry with the table write-locked, so a state check and
    /// the transition it decides on happen atomically.
    pub(crate) fn update<R>(&self, id: &ObjectId, f: impl FnOnce(Option<&mut Entry>) -> R) -> R {
        let mut map = self.entries.write().expect("entry table lock poisoned");
        f(map.get_mut(id))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().expect("entry table lock poisoned").len()
    }

    pub(crate) fn ids(&self) -> Vec<ObjectId> {
        let map = self.entries.read().expect("entry table lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(object: Object) -> (ObjectId, Entry) {
        let canonical = object.canonical().unwrap();
        (canonical.id, Entry::new(object, canonical.encoding))
    }

    #[test]
    fn raw_values_start_resolved() {
        let (_, e) = entry(Object::from(json!("hi")));
        assert_eq!(e.status(), EntryStatus::Resolved);
        assert!(e.dependencies().is_empty());
    }

    #[test]
    fn recipes_start_pending() {
        let dep = ObjectId::from_bytes(b"dep");
        let (_, e) = entry(Object::from(Recipe::new("collect").with_dep(dep)));
        assert_eq!(e.status(), EntryStatus::Pending);
        assert_eq!(e.dependencies(), vec![dep]);
    }

    #[test]
    fn duplicate_insert_follows_policy() {
        let table = EntryTable::new();
        let (id, e) = entry(Object::from(json!(1)));
        assert!(table.insert(id, e, DuplicatePolicy::Reuse).unwrap());

        let (_, again) = entry(Object::from(json!(1)));
        assert!(!table.insert(id, again, DuplicatePolicy::Reuse).unwrap());

        let (_, again) = entry(Object::from(json!(1)));
        assert_eq!(
            table.insert(id, again, DuplicatePolicy::Reject),
            Err(DatabaseError::AlreadyExists(id))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn reuse_keeps_the_original_entry() {
        let table = EntryTable::new();
        let (id, e) = entry(Object::from(Recipe::new("collect")));
        table.insert(id, e, DuplicatePolicy::Reuse).unwrap();
        table.update(&id, |e| e.unwrap().state = EntryState::Resolved(Arc::new(json!([]))));

        let (_, again) = entry(Object::from(Recipe::new("collect")));
        table.insert(id, again, DuplicatePolicy::Reuse).unwrap();
        assert_eq!(table.read(&id, Entry::status), Some(EntryStatus::Resolved));
    }

    #[test]
    fn resolved_recipe_keeps_declared_dependencies() {
        let table = EntryTable::new();
        let dep = ObjectId::from_bytes(b"dep");
        let (id, e) = entry(Object::from(Recipe::new("collect").with_deps([dep, dep])));
        table.insert(id, e, DuplicatePolicy::Reuse).unwrap();
        table.update(&id, |e| e.unwrap().state = EntryState::Resolved(Arc::new(json!([]))));

        assert_eq!(table.read(&id, Entry::dependencies), Some(vec![dep, dep]));
    }

    #[test]
    fn encoding_is_retained() {
        let table = EntryTable::new();
        let object = Object::from(json!({"a": 1}));
        let canonical = object.canonical().unwrap();
        table
            .insert(
                canonical.id,
                Entry::new(object, canonical.encoding.clone()),
                DuplicatePolicy::Reuse,
            )
            .unwrap();
        let stored = table.read(&canonical.id, |e| e.encoding.to_vec()).unwrap();
        assert_eq!(stored, canonical.encoding);
    }

    #[test]
    fn ids_are_sorted() {
        let table = EntryTable::new();
        for n in 0..5 {
            let (id, e) = entry(Object::from(json!(n)));
            table.insert(id, e, DuplicatePolicy::Reuse).unwrap();
        }
        let ids = table.ids();
        assert_eq!(ids.len(), 5);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(!table.contains(&ObjectId::from_bytes(b"absent")));
    }
}
