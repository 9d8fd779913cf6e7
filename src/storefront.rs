//! Process-wide storefront state.
//!
//! Everything the admin screen can change lives here: display mode,
//! per-category overrides, the auto-update flag, and the ticker banner.
//! Built once at startup (live mode, auto-update on, zero overrides) and
//! changed only through the methods below.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::adjustment::{AdjustmentDescriptor, AdjustmentEngine, AdjustmentRequest, Adjustments};
use crate::config::Config;
use crate::market_data::adapters::FeedTransport;
use crate::market_data::poller::{PollScheduler, PollSettings};
use crate::market_data::types::{Category, RateSnapshot};
use crate::state::display_mode::{DisplayMode, DisplayModeController};
use crate::state::rate_repository::RateRepository;
use crate::state::{read, write};

/// Read-only view of the admin-controlled state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorefrontStatus {
    pub mode: DisplayMode,
    pub auto_update: bool,
    pub adjustments: Adjustments,
    pub generation: u64,
    pub ticker_message: Option<String>,
}

pub struct Storefront {
    repository: RateRepository,
    engine: Arc<AdjustmentEngine>,
    display: DisplayModeController,
    auto_update: watch::Sender<bool>,
    ticker_message: RwLock<Option<String>>,
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new(true, None)
    }
}

impl Storefront {
    pub fn new(auto_update: bool, ticker_message: Option<String>) -> Self {
        let repository = RateRepository::new();
        let engine = Arc::new(AdjustmentEngine::new());
        let display = DisplayModeController::new(repository.clone(), Arc::clone(&engine));
        let (auto_update, _) = watch::channel(auto_update);

        Self {
            repository,
            engine,
            display,
            auto_update,
            ticker_message: RwLock::new(normalize_ticker(ticker_message.as_deref())),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.auto_update, config.ticker_message.clone())
    }

    /// Scheduler that writes into this storefront's repository and obeys
    /// its auto-update flag.
    pub fn poll_scheduler(
        &self,
        transport: Arc<dyn FeedTransport>,
        settings: PollSettings,
    ) -> PollScheduler {
        PollScheduler::new(
            transport,
            self.repository.clone(),
            settings,
            self.auto_update.subscribe(),
        )
    }

    pub fn repository(&self) -> &RateRepository {
        &self.repository
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Snapshot for presentation, honoring the display mode.
    pub fn current_snapshot(&self) -> Option<Arc<RateSnapshot>> {
        self.display.current_snapshot()
    }

    /// Adjusted view regardless of mode, for the admin preview.
    pub fn effective_snapshot(&self) -> Option<Arc<RateSnapshot>> {
        self.display.effective_snapshot()
    }

    pub fn status(&self) -> StorefrontStatus {
        StorefrontStatus {
            mode: self.display.mode(),
            auto_update: self.is_auto_update_enabled(),
            adjustments: self.engine.adjustments(),
            generation: self.repository.generation(),
            ticker_message: self.ticker_message(),
        }
    }

    // ── Overrides ────────────────────────────────────────────────

    pub fn set_adjustment(&self, category: Category, descriptor: AdjustmentDescriptor) {
        self.engine.set_adjustment(category, descriptor);
    }

    /// Applies a validated admin request to every category in its scope.
    pub fn apply_adjustment(&self, request: &AdjustmentRequest) {
        let descriptor = request.descriptor();
        for category in request.scope.categories() {
            self.engine.set_adjustment(*category, descriptor);
        }
    }

    pub fn reset_adjustments(&self) {
        self.engine.reset_adjustments();
    }

    pub fn adjustments(&self) -> Adjustments {
        self.engine.adjustments()
    }

    // ── Display mode ─────────────────────────────────────────────

    pub fn show_live(&self) {
        self.display.show_live();
    }

    pub fn show_modified(&self) {
        self.display.show_modified();
    }

    // ── Auto-update ──────────────────────────────────────────────

    pub fn is_auto_update_enabled(&self) -> bool {
        *self.auto_update.borrow()
    }

    /// Flips the flag and returns the new value. The stored snapshot is
    /// left alone either way.
    pub fn toggle_auto_update(&self) -> bool {
        let mut enabled = false;
        self.auto_update.send_modify(|flag| {
            *flag = !*flag;
            enabled = *flag;
        });
        info!(enabled, "auto-update toggled");
        enabled
    }

    pub fn set_auto_update(&self, enabled: bool) {
        self.auto_update.send_if_modified(|flag| {
            let changed = *flag != enabled;
            *flag = enabled;
            changed
        });
    }

    // ── Ticker ───────────────────────────────────────────────────

    pub fn ticker_message(&self) -> Option<String> {
        read(&self.ticker_message).clone()
    }

    /// Blank text clears the banner.
    pub fn set_ticker_message(&self, message: &str) {
        *write(&self.ticker_message) = normalize_ticker(Some(message));
    }
}

fn normalize_ticker(message: Option<&str>) -> Option<String> {
    message
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(str::to_string)
}
