//! Object storage: the id-indexed record table behind indirect references.
//!
//! A storage owns a dense table of records numbered from 1. Records are either
//! added directly ([`ObjectStorage::add_object`]) or reserved first and filled later
//! ([`ObjectStorage::reserve_slot`] / [`ObjectStorage::fill_slot`]), which lets the
//! resolver hand out forward references while it is still importing content.
//!
//! Several storages may exist at once, for example one per page built on a worker
//! thread. References carry the [`StorageId`] they were minted from, and the
//! [`Resolver`] merges everything reachable into a single target storage before the
//! document is written.

mod resolver;

pub use resolver::{Resolver, SweepStats};

use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use std::collections::HashMap;
use uuid::Uuid;

/// Identity of an [`ObjectStorage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageId(Uuid);

impl StorageId {
    /// Mint a fresh, globally unique storage identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StorageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StorageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Table of numbered records.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    id: StorageId,
    /// Index `n` holds record id `n + 1`; `None` marks a reserved slot.
    slots: Vec<Option<Object>>,
}

impl Default for ObjectStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStorage {
    /// Create an empty storage with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: StorageId::new(),
            slots: Vec::new(),
        }
    }

    /// Identity of this storage.
    pub fn id(&self) -> StorageId {
        self.id
    }

    /// Number of allocated ids, reserved slots included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no id has been allocated yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add a record and return a reference to it.
    ///
    /// Adding a reference does not create a record: the reference itself is returned,
    /// since a record may never hold a bare reference.
    pub fn add_object(&mut self, object: Object) -> ObjectRef {
        if let Object::Reference(existing) = object {
            return existing;
        }

        self.slots.push(Some(object));
        self.reference_for(self.slots.len() as u32)
    }

    /// Reserve an id whose content is supplied later through [`fill_slot`](Self::fill_slot).
    pub fn reserve_slot(&mut self) -> ObjectRef {
        self.slots.push(None);
        self.reference_for(self.slots.len() as u32)
    }

    /// Fill a previously reserved slot.
    pub fn fill_slot(&mut self, reference: ObjectRef, object: Object) -> Result<()> {
        self.check_owner(reference)?;

        if let Object::Reference(_) = object {
            return Err(Error::UnexpectedSweepResult {
                expected: "concrete record content".to_string(),
                found: object.type_name().to_string(),
            });
        }

        match self.slot_index(reference.id).map(|index| &mut self.slots[index]) {
            Some(slot @ None) => {
                *slot = Some(object);
                Ok(())
            },
            _ => Err(Error::SlotNotReserved(reference.id)),
        }
    }

    /// Whether `reference` was minted by this storage and names an allocated id.
    pub fn contains(&self, reference: ObjectRef) -> bool {
        reference.storage == self.id && self.slot_index(reference.id).is_some()
    }

    /// Get the record a reference points to.
    pub fn get(&self, reference: ObjectRef) -> Result<&Object> {
        self.check_owner(reference)?;
        let index = self
            .slot_index(reference.id)
            .ok_or(Error::StorageMismatch(reference))?;
        self.slots[index]
            .as_ref()
            .ok_or(Error::UnfilledSlot(reference.id))
    }

    /// Get mutable access to the record a reference points to.
    pub fn get_mut(&mut self, reference: ObjectRef) -> Result<&mut Object> {
        self.check_owner(reference)?;
        let index = self
            .slot_index(reference.id)
            .ok_or(Error::StorageMismatch(reference))?;
        self.slots[index]
            .as_mut()
            .ok_or(Error::UnfilledSlot(reference.id))
    }

    /// Resolve a value one level: a reference yields the record it names, anything
    /// else yields itself.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(reference) => self.get(*reference),
            other => Ok(other),
        }
    }

    /// All ids in ascending order.
    ///
    /// Fails if any reserved slot was never filled.
    pub fn ids(&self) -> Result<Vec<u32>> {
        self.iter().map(|records| records.map(|(r, _)| r.id).collect())
    }

    /// Iterate records in ascending id order.
    ///
    /// Fails up front if any reserved slot was never filled.
    pub fn iter(&self) -> Result<impl Iterator<Item = (ObjectRef, &Object)> + '_> {
        if let Some(index) = self.slots.iter().position(|slot| slot.is_none()) {
            return Err(Error::UnfilledSlot(index as u32 + 1));
        }

        Ok(self.slots.iter().enumerate().filter_map(move |(index, slot)| {
            slot.as_ref()
                .map(|object| (self.reference_for(index as u32 + 1), object))
        }))
    }

    /// Move a record out of its slot, leaving the slot reserved.
    pub(crate) fn take(&mut self, id: u32) -> Option<Object> {
        self.slot_index(id).and_then(|index| self.slots[index].take())
    }

    /// Put a record back into a slot emptied by [`take`](Self::take).
    pub(crate) fn restore(&mut self, id: u32, object: Object) {
        if let Some(index) = self.slot_index(id) {
            self.slots[index] = Some(object);
        }
    }

    fn reference_for(&self, id: u32) -> ObjectRef {
        ObjectRef::new(id, 0, self.id)
    }

    fn slot_index(&self, id: u32) -> Option<usize> {
        let index = (id as usize).checked_sub(1)?;
        (index < self.slots.len()).then_some(index)
    }

    fn check_owner(&self, reference: ObjectRef) -> Result<()> {
        if reference.storage != self.id {
            return Err(Error::StorageMismatch(reference));
        }
        Ok(())
    }
}

/// Read-only registry of storages that references may point into.
///
/// Storages built independently are moved in here before the sweep, after which
/// nothing mutates them.
#[derive(Debug, Default)]
pub struct StoragePool {
    storages: HashMap<StorageId, ObjectStorage>,
}

impl StoragePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a storage, returning its identity.
    pub fn insert(&mut self, storage: ObjectStorage) -> StorageId {
        let id = storage.id();
        self.storages.insert(id, storage);
        id
    }

    /// Look up a registered storage.
    pub fn get(&self, id: StorageId) -> Option<&ObjectStorage> {
        self.storages.get(&id)
    }

    /// Number of registered storages.
    pub fn len(&self) -> usize {
        self.storages.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }
}
