//! Precious-metal rate pipeline for a retail storefront display.
//!
//! A tab-delimited live feed is polled, normalized into a [`RateSnapshot`],
//! and optionally shifted by per-category admin overrides before being
//! handed to the presentation layer.
//!
//! ```text
//! transport ─▶ feed_parser ─▶ RateRepository ─▶ DisplayModeController ─▶ view
//!                                                  ▲
//!                                 AdjustmentEngine ┘
//! ```
//!
//! [`RateSnapshot`]: market_data::types::RateSnapshot

pub mod adjustment;
pub mod config;
pub mod error;
pub mod market_data;
pub mod metrics;
pub mod state;
pub mod storefront;

pub use storefront::{Storefront, StorefrontStatus};
