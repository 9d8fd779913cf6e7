use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use tracing::{debug, info};

use crate::adjustment::AdjustmentEngine;
use crate::market_data::types::RateSnapshot;
use crate::state::rate_repository::RateRepository;
use crate::state::{lock, read, write};

/// Which view of the rates the storefront shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Live,
    Modified,
}

/// Effective snapshot plus the inputs it was derived from.
#[derive(Debug)]
struct Derived {
    generation: u64,
    adjustment_version: u64,
    snapshot: Arc<RateSnapshot>,
}

impl Derived {
    fn matches(&self, generation: u64, adjustment_version: u64) -> bool {
        self.generation == generation && self.adjustment_version == adjustment_version
    }
}

/// Picks between the raw feed snapshot and the adjusted one.
///
/// The adjusted snapshot is derived at most once per (snapshot, overrides)
/// pair and shared by every reader.
#[derive(Debug)]
pub struct DisplayModeController {
    mode: RwLock<DisplayMode>,
    repository: RateRepository,
    engine: Arc<AdjustmentEngine>,
    derived: Mutex<Option<Derived>>,
}

impl DisplayModeController {
    pub fn new(repository: RateRepository, engine: Arc<AdjustmentEngine>) -> Self {
        Self {
            mode: RwLock::new(DisplayMode::Live),
            repository,
            engine,
            derived: Mutex::new(None),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        *read(&self.mode)
    }

    pub fn show_live(&self) {
        self.switch(DisplayMode::Live);
    }

    pub fn show_modified(&self) {
        self.switch(DisplayMode::Modified);
    }

    fn switch(&self, target: DisplayMode) {
        let mut mode = write(&self.mode);
        if *mode != target {
            *mode = target;
            info!(mode = ?target, "display mode changed");
        }
    }

    /// What consumers should render right now; `None` until the first
    /// successful poll, whatever the mode.
    pub fn current_snapshot(&self) -> Option<Arc<RateSnapshot>> {
        match self.mode() {
            DisplayMode::Live => self.repository.get(),
            DisplayMode::Modified => self.effective_snapshot(),
        }
    }

    fn cached(&self, generation: u64, adjustment_version: u64) -> Option<Arc<RateSnapshot>> {
        lock(&self.derived)
            .as_ref()
            .filter(|derived| derived.matches(generation, adjustment_version))
            .map(|derived| Arc::clone(&derived.snapshot))
    }

    /// The adjusted view regardless of mode. Derivation runs outside the
    /// cache lock.
    pub fn effective_snapshot(&self) -> Option<Arc<RateSnapshot>> {
        let (live, generation) = self.repository.current();
        let live = live?;
        let (adjustments, adjustment_version) = self.engine.current();

        if let Some(cached) = self.cached(generation, adjustment_version) {
            return Some(cached);
        }

        // Nothing to apply: share the live snapshot instead of copying it.
        let snapshot = if adjustments.is_noop() {
            live
        } else {
            Arc::new(crate::adjustment::compute_effective(&live, &adjustments))
        };
        debug!(generation, adjustment_version, "derived effective snapshot");

        let mut derived = lock(&self.derived);
        // A concurrent reader may have stored the same derivation first.
        if let Some(cached) = derived.as_ref().filter(|d| d.matches(generation, adjustment_version)) {
            return Some(Arc::clone(&cached.snapshot));
        }
        *derived = Some(Derived {
            generation,
            adjustment_version,
            snapshot: Arc::clone(&snapshot),
        });
        Some(snapshot)
    }
}
