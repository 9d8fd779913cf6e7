use std::sync::{Arc, RwLock};

use crate::market_data::types::RateSnapshot;
use crate::state::{read, write};

/// Holds the latest snapshot from the feed, `None` until the first
/// successful poll.
///
/// Cheap to clone; every clone shares the same slot. Writers swap an
/// `Arc` in place, so readers get either the previous snapshot or the new
/// one, never a mix.
#[derive(Clone, Debug, Default)]
pub struct RateRepository {
    slot: Arc<RwLock<Slot>>,
}

#[derive(Debug, Default)]
struct Slot {
    snapshot: Option<Arc<RateSnapshot>>,
    generation: u64,
}

impl RateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<RateSnapshot>> {
        read(&self.slot).snapshot.clone()
    }

    /// Replaces the stored snapshot wholesale and returns the new generation.
    pub fn set(&self, snapshot: RateSnapshot) -> u64 {
        let snapshot = Arc::new(snapshot);
        let mut slot = write(&self.slot);
        slot.snapshot = Some(snapshot);
        slot.generation += 1;
        slot.generation
    }

    /// Number of snapshots stored so far; 0 before the first poll lands.
    pub fn generation(&self) -> u64 {
        read(&self.slot).generation
    }

    /// Snapshot and generation read under one lock.
    pub fn current(&self) -> (Option<Arc<RateSnapshot>>, u64) {
        let slot = read(&self.slot);
        (slot.snapshot.clone(), slot.generation)
    }
}
