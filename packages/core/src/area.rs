//! Write regions and the syncers that flush them to backing storage.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::access::AccessError;
use crate::blackboard::Blackboard;

/// A syncer failed to flush a region.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("sync failed: {message}")]
pub struct SyncError {
    pub message: String,
}

impl SyncError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pushes a region of the blackboard to its backing store.
///
/// # Object Safety
///
/// This trait is object-safe: syncer sets hold `Arc<dyn Syncer>`.
pub trait Syncer: Send + Sync {
    /// Flush `size` bytes starting at `offset` of `blackboard`.
    fn sync(&self, blackboard: &Blackboard, offset: usize, size: usize) -> Result<(), SyncError>;
}

/// A deduplicating, insertion-ordered collection of syncers.
///
/// Syncers are compared by handle identity, so adding the same `Arc` twice
/// keeps a single entry and the region is flushed through it once.
#[derive(Clone, Default)]
pub struct SyncerSet {
    syncers: Vec<Arc<dyn Syncer>>,
}

impl SyncerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `syncer`; returns false if it was already present.
    pub fn insert(&mut self, syncer: Arc<dyn Syncer>) -> bool {
        if self.contains(&syncer) {
            return false;
        }
        self.syncers.push(syncer);
        true
    }

    pub fn contains(&self, syncer: &Arc<dyn Syncer>) -> bool {
        self.syncers.iter().any(|s| Arc::ptr_eq(s, syncer))
    }

    /// Union `other` into this set.
    pub fn extend(&mut self, other: &SyncerSet) {
        for syncer in &other.syncers {
            self.insert(Arc::clone(syncer));
        }
    }

    pub fn len(&self) -> usize {
        self.syncers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.syncers.is_empty()
    }

    /// Run every syncer once, collecting all failures.
    pub fn sync_all(
        &self,
        blackboard: &Blackboard,
        offset: usize,
        size: usize,
    ) -> Result<(), SyncError> {
        let failures: Vec<String> = self
            .syncers
            .iter()
            .filter_map(|s| s.sync(blackboard, offset, size).err())
            .map(|e| e.message)
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(SyncError::new(failures.join("; ")))
        }
    }
}

impl fmt::Debug for SyncerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncerSet")
            .field("len", &self.syncers.len())
            .finish()
    }
}

impl FromIterator<Arc<dyn Syncer>> for SyncerSet {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Syncer>>>(iter: I) -> Self {
        let mut set = SyncerSet::new();
        for syncer in iter {
            set.insert(syncer);
        }
        set
    }
}

/// The physical region a write must commit, plus who commits it.
///
/// For a bit parameter the region is the whole owning block, so committing
/// several fields of one block flushes the block once. The configuration can
/// also snapshot the region ([`save`](Self::save)) and put it back
/// ([`restore`](Self::restore)).
#[derive(Debug, Clone)]
pub struct AreaConfiguration {
    offset: usize,
    size: usize,
    syncers: SyncerSet,
    saved: Blackboard,
}

impl AreaConfiguration {
    pub fn new(offset: usize, size: usize, syncers: SyncerSet) -> Self {
        Self {
            offset,
            size,
            syncers,
            saved: Blackboard::new(size),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn syncers(&self) -> &SyncerSet {
        &self.syncers
    }

    /// The snapshot taken by the last [`save`](Self::save).
    ///
    /// Parameters can be read from it through an access context whose base
    /// offset is [`offset`](Self::offset).
    pub fn saved(&self) -> &Blackboard {
        &self.saved
    }

    pub fn saved_mut(&mut self) -> &mut Blackboard {
        &mut self.saved
    }

    pub fn same_area(&self, other: &AreaConfiguration) -> bool {
        self.offset == other.offset && self.size == other.size
    }

    /// Fold `other`'s syncers into this configuration.
    ///
    /// # Panics
    ///
    /// Panics if the two configurations describe different regions.
    pub fn merge_from(&mut self, other: &AreaConfiguration) {
        assert!(
            self.same_area(other),
            "merging area {}+{} into {}+{}",
            other.offset,
            other.size,
            self.offset,
            self.size
        );
        self.syncers.extend(&other.syncers);
    }

    /// Snapshot the region from `main`.
    pub fn save(&mut self, main: &Blackboard) -> Result<(), AccessError> {
        let bytes = main.read_area(self.offset, self.size)?;
        self.saved.write_area(0, bytes)
    }

    /// Copy the snapshot back into `main`.
    pub fn restore(&self, main: &mut Blackboard) -> Result<(), AccessError> {
        main.write_area(self.offset, self.saved.as_bytes())
    }

    /// Flush the region of `main` through every syncer.
    pub fn commit(&self, main: &Blackboard) -> Result<(), SyncError> {
        tracing::debug!(
            offset = self.offset,
            size = self.size,
            syncers = self.syncers.len(),
            "committing area"
        );
        self.syncers.sync_all(main, self.offset, self.size)
    }
}

/// A shared in-memory register file standing in for hardware.
///
/// Clones share the same storage. Every successful sync copies the region
/// into the register file and bumps the flush counter.
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    inner: Arc<Mutex<RegisterFileState>>,
}

#[derive(Debug, Default)]
struct RegisterFileState {
    registers: Vec<u8>,
    flushes: usize,
}

impl RegisterFile {
    pub fn new(size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegisterFileState {
                registers: vec![0; size],
                flushes: 0,
            })),
        }
    }

    /// Copy of the current register contents.
    pub fn snapshot(&self) -> Vec<u8> {
        self.lock().map(|s| s.registers.clone()).unwrap_or_default()
    }

    /// Number of region flushes received so far.
    pub fn flush_count(&self) -> usize {
        self.lock().map(|s| s.flushes).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, RegisterFileState>, SyncError> {
        self.inner
            .lock()
            .map_err(|_| SyncError::new("register file lock poisoned"))
    }
}

impl Syncer for RegisterFile {
    fn sync(&self, blackboard: &Blackboard, offset: usize, size: usize) -> Result<(), SyncError> {
        let bytes = blackboard
            .read_area(offset, size)
            .map_err(|e| SyncError::new(e.to_string()))?;

        let mut state = self.lock()?;
        if state.registers.len() < offset + size {
            state.registers.resize(offset + size, 0);
        }
        state.registers[offset..offset + size].copy_from_slice(bytes);
        state.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSyncer(&'static str);

    impl Syncer for FailingSyncer {
        fn sync(&self, _: &Blackboard, _: usize, _: usize) -> Result<(), SyncError> {
            Err(SyncError::new(self.0))
        }
    }

    #[test]
    fn syncer_set_deduplicates_by_identity() {
        let shared: Arc<dyn Syncer> = Arc::new(RegisterFile::new(4));
        let other: Arc<dyn Syncer> = Arc::new(RegisterFile::new(4));

        let mut set = SyncerSet::new();
        assert!(set.insert(Arc::clone(&shared)));
        assert!(!set.insert(Arc::clone(&shared)));
        assert!(set.insert(other));
        assert_eq!(set.len(), 2);

        let mut union = SyncerSet::from_iter([Arc::clone(&shared)]);
        union.extend(&set);
        assert_eq!(union.len(), 2);
    }

    #[test]
    fn sync_all_runs_each_syncer_once() {
        let registers = RegisterFile::new(4);
        let set: SyncerSet = [Arc::new(registers.clone()) as Arc<dyn Syncer>]
            .into_iter()
            .collect();

        let bb = Blackboard::from_bytes(vec![1, 2, 3, 4]);
        set.sync_all(&bb, 1, 2).unwrap();

        assert_eq!(registers.snapshot(), vec![0, 2, 3, 0]);
        assert_eq!(registers.flush_count(), 1);
    }

    #[test]
    fn sync_all_collects_every_failure() {
        let set: SyncerSet = [
            Arc::new(FailingSyncer("bus timeout")) as Arc<dyn Syncer>,
            Arc::new(FailingSyncer("nack")) as Arc<dyn Syncer>,
        ]
        .into_iter()
        .collect();

        let err = set.sync_all(&Blackboard::new(1), 0, 1).unwrap_err();
        assert_eq!(err.to_string(), "sync failed: bus timeout; nack");
    }

    #[test]
    fn save_and_restore_region() {
        let mut main = Blackboard::from_bytes(vec![9, 8, 7, 6]);
        let mut area = AreaConfiguration::new(1, 2, SyncerSet::new());

        area.save(&main).unwrap();
        assert_eq!(area.saved().as_bytes(), &[8, 7]);

        main.write_area(0, &[0, 0, 0, 0]).unwrap();
        area.restore(&mut main).unwrap();
        assert_eq!(main.as_bytes(), &[0, 8, 7, 0]);
    }

    #[test]
    fn commit_flushes_region_through_syncers() {
        let registers = RegisterFile::new(2);
        let mut syncers = SyncerSet::new();
        syncers.insert(Arc::new(registers.clone()));

        let area = AreaConfiguration::new(0, 2, syncers);
        area.commit(&Blackboard::from_bytes(vec![0xAB, 0xCD]))
            .unwrap();
        assert_eq!(registers.snapshot(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn merge_unions_syncers_of_same_area() {
        let a: Arc<dyn Syncer> = Arc::new(RegisterFile::new(1));
        let b: Arc<dyn Syncer> = Arc::new(RegisterFile::new(1));

        let mut first = AreaConfiguration::new(0, 1, [Arc::clone(&a)].into_iter().collect());
        let second = AreaConfiguration::new(0, 1, [a, b].into_iter().collect());
        first.merge_from(&second);
        assert_eq!(first.syncers().len(), 2);
    }

    #[test]
    #[should_panic(expected = "merging area")]
    fn merge_of_different_areas_panics() {
        let mut first = AreaConfiguration::new(0, 1, SyncerSet::new());
        first.merge_from(&AreaConfiguration::new(1, 1, SyncerSet::new()));
    }

    #[test]
    fn register_file_grows_to_fit() {
        let registers = RegisterFile::default();
        registers
            .sync(&Blackboard::from_bytes(vec![5, 6]), 0, 2)
            .unwrap();
        assert_eq!(registers.snapshot(), vec![5, 6]);
    }
}
