//! Reference sweep.
//!
//! Walks everything reachable from a set of roots and rewrites the graph so that a
//! single target storage can be written out on its own:
//!
//! - references into other storages are imported, once per foreign record, so two
//!   references to the same foreign record stay aliases after the import
//! - streams nested inside arrays or dictionaries are promoted to their own records
//! - cycles are detected through the set of records currently being swept and left
//!   as plain references

use super::{ObjectStorage, StorageId, StoragePool};
use crate::error::{Error, Result};
use crate::object::{Object, ObjectRef};
use std::collections::{HashMap, HashSet};

/// Counters collected during a sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    /// Foreign records copied into the target storage
    pub imported: usize,
    /// Nested streams moved into records of their own
    pub promoted: usize,
    /// Back edges found while a record was still being swept
    pub cycles: usize,
}

/// Graph sweeper over one target storage.
pub struct Resolver<'a> {
    target: &'a mut ObjectStorage,
    pool: &'a StoragePool,
    /// Foreign (storage, generation, id) to the local record it was imported as.
    imported: HashMap<(StorageId, u16, u32), ObjectRef>,
    /// Local ids currently on the recursion stack.
    in_progress: HashSet<u32>,
    /// Local ids whose content is already swept.
    swept: HashSet<u32>,
    stats: SweepStats,
}

impl<'a> Resolver<'a> {
    /// Create a resolver that merges into `target`, importing from `pool`.
    pub fn new(target: &'a mut ObjectStorage, pool: &'a StoragePool) -> Self {
        Self {
            target,
            pool,
            imported: HashMap::new(),
            in_progress: HashSet::new(),
            swept: HashSet::new(),
            stats: SweepStats::default(),
        }
    }

    /// Sweep every record currently in the target storage.
    pub fn sweep_all(&mut self) -> Result<()> {
        let count = self.target.len() as u32;
        let storage = self.target.id();
        for id in 1..=count {
            self.sweep_record(ObjectRef::new(id, 0, storage))?;
        }
        Ok(())
    }

    /// Sweep a root record and return the local reference that now stands for it.
    ///
    /// A foreign root is imported.
    pub fn sweep_record(&mut self, reference: ObjectRef) -> Result<ObjectRef> {
        match self.sweep_reference(reference)? {
            Object::Reference(local) => Ok(local),
            other => Err(Error::UnexpectedSweepResult {
                expected: "Reference".to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Sweep a root value that is not itself a record, such as page resources.
    ///
    /// A stream root is promoted, so the result is never a stream.
    pub fn sweep_value(&mut self, value: Object) -> Result<Object> {
        self.sweep_child(value)
    }

    /// Finish the sweep and report what it did.
    pub fn finish(self) -> SweepStats {
        log::debug!(
            "Reference sweep: {} imported, {} promoted, {} cycles",
            self.stats.imported,
            self.stats.promoted,
            self.stats.cycles
        );
        self.stats
    }

    fn sweep(&mut self, value: Object) -> Result<Object> {
        match value {
            Object::Reference(reference) => self.sweep_reference(reference),
            Object::Array(mut items) => {
                for item in items.iter_mut() {
                    let child = std::mem::replace(item, Object::Null);
                    *item = self.sweep_child(child)?;
                }
                Ok(Object::Array(items))
            },
            Object::Dictionary(mut dict) => {
                for (_, entry) in dict.iter_mut() {
                    let child = std::mem::replace(entry, Object::Null);
                    *entry = self.sweep_child(child)?;
                }
                Ok(Object::Dictionary(dict))
            },
            Object::Stream(mut stream) => {
                for (_, entry) in stream.dict.iter_mut() {
                    let child = std::mem::replace(entry, Object::Null);
                    *entry = self.sweep_child(child)?;
                }
                Ok(Object::Stream(stream))
            },
            scalar => Ok(scalar),
        }
    }

    /// Sweep a value held inside a composite; streams leave as references.
    fn sweep_child(&mut self, value: Object) -> Result<Object> {
        match self.sweep(value)? {
            Object::Stream(stream) => {
                let promoted = self.target.add_object(Object::Stream(stream));
                self.swept.insert(promoted.id);
                self.stats.promoted += 1;
                Ok(Object::Reference(promoted))
            },
            other => Ok(other),
        }
    }

    fn sweep_reference(&mut self, reference: ObjectRef) -> Result<Object> {
        if reference.storage == self.target.id() {
            self.sweep_local(reference)
        } else {
            self.import(reference)
        }
    }

    fn sweep_local(&mut self, reference: ObjectRef) -> Result<Object> {
        if self.in_progress.contains(&reference.id) {
            self.stats.cycles += 1;
            return Ok(Object::Reference(reference));
        }
        if self.swept.contains(&reference.id) {
            return Ok(Object::Reference(reference));
        }

        let content = match self.target.take(reference.id) {
            Some(content) => content,
            None if self.target.contains(reference) => {
                return Err(Error::UnfilledSlot(reference.id));
            },
            None => return Err(Error::StorageMismatch(reference)),
        };

        self.in_progress.insert(reference.id);
        let result = self.sweep(content);
        self.in_progress.remove(&reference.id);

        let swept = result?;
        self.target.restore(reference.id, swept);
        self.swept.insert(reference.id);
        Ok(Object::Reference(reference))
    }

    fn import(&mut self, reference: ObjectRef) -> Result<Object> {
        let key = (reference.storage, reference.gen, reference.id);
        if let Some(local) = self.imported.get(&key) {
            return Ok(Object::Reference(*local));
        }

        let source = self
            .pool
            .get(reference.storage)
            .ok_or(Error::ForeignReference(reference))?;
        let content = source.get(reference)?.clone();

        // Reserve before recursing so cycles in the foreign graph find the memo entry.
        let local = self.target.reserve_slot();
        self.imported.insert(key, local);
        self.in_progress.insert(local.id);
        let result = self.sweep(content);
        self.in_progress.remove(&local.id);

        let swept = result?;
        if let Object::Reference(_) = swept {
            return Err(Error::UnexpectedSweepResult {
                expected: "concrete record content".to_string(),
                found: swept.type_name().to_string(),
            });
        }
        self.target.fill_slot(local, swept)?;
        self.swept.insert(local.id);
        self.stats.imported += 1;

        log::trace!("Imported {} from storage {} as {}", reference, reference.storage, local);
        Ok(Object::Reference(local))
    }
}
