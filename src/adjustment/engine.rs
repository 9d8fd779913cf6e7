use std::sync::RwLock;

use tracing::info;

use super::descriptor::{AdjustmentDescriptor, Adjustments};
use crate::market_data::types::{Category, ProductRecord, RateRecord, RateSnapshot};
use crate::state::{read, write};

/// A record whose prices can be shifted by a category override.
///
/// Implementations are pure: they return a new record and leave `self`
/// alone.
pub trait Adjustable: Clone {
    /// Display name used for category classification.
    fn name(&self) -> &str;

    fn adjusted(&self, descriptor: &AdjustmentDescriptor) -> Self;
}

impl Adjustable for RateRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn adjusted(&self, descriptor: &AdjustmentDescriptor) -> Self {
        Self {
            bid: descriptor.apply(self.bid),
            ask: descriptor.apply(self.ask),
            high: descriptor.apply(self.high),
            low: descriptor.apply(self.low),
            ..self.clone()
        }
    }
}

impl Adjustable for ProductRecord {
    fn name(&self) -> &str {
        &self.name
    }

    // `buy` is always the sentinel for products, only `sell` moves.
    fn adjusted(&self, descriptor: &AdjustmentDescriptor) -> Self {
        Self {
            sell: descriptor.apply(self.sell),
            ..self.clone()
        }
    }
}

fn adjust_all<T: Adjustable>(records: &[T], adjustments: &Adjustments) -> Vec<T> {
    records
        .iter()
        .map(|record| match adjustments.for_name(record.name()) {
            Some(descriptor) => record.adjusted(descriptor),
            None => record.clone(),
        })
        .collect()
}

/// Derives the effective snapshot: the live one with the current overrides
/// applied to every gold/silver record. `live` is not modified.
pub fn compute_effective(live: &RateSnapshot, adjustments: &Adjustments) -> RateSnapshot {
    RateSnapshot {
        spot: adjust_all(&live.spot, adjustments),
        rtgs: adjust_all(&live.rtgs, adjustments),
        futures: adjust_all(&live.futures, adjustments),
        next: adjust_all(&live.next, adjustments),
    }
}

/// Holds the admin overrides. Survives snapshot replacement; only the
/// setters below change it.
#[derive(Debug, Default)]
pub struct AdjustmentEngine {
    state: RwLock<Versioned>,
}

#[derive(Debug, Default)]
struct Versioned {
    adjustments: Adjustments,
    version: u64,
}

impl AdjustmentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn adjustments(&self) -> Adjustments {
        read(&self.state).adjustments
    }

    /// Overrides plus a counter bumped on every change.
    pub fn current(&self) -> (Adjustments, u64) {
        let state = read(&self.state);
        (state.adjustments, state.version)
    }

    /// Replaces one category's descriptor, mode and value together.
    pub fn set_adjustment(&self, category: Category, descriptor: AdjustmentDescriptor) {
        let mut state = write(&self.state);
        state.adjustments.set(category, descriptor);
        state.version += 1;
        info!(
            category = category.as_str(),
            mode = ?descriptor.mode,
            value = %descriptor.value,
            "adjustment updated"
        );
    }

    /// Zeroes both categories in one step.
    pub fn reset_adjustments(&self) {
        let mut state = write(&self.state);
        state.adjustments = Adjustments::default();
        state.version += 1;
        info!("adjustments reset");
    }

    pub fn compute_effective(&self, live: &RateSnapshot) -> RateSnapshot {
        compute_effective(live, &self.adjustments())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::market_data::feed_parser::parse;
    use crate::market_data::types::Quote;

    const FEED: &str = "3101\tGOLD ($)\t2345.10\t2345.60\t2350.00\t2331.25\tInStock\n\
3107\tSILVER ($)\t29.41\t29.45\t29.80\t29.02\tInStock\n\
3103\tUSD-INR\t83.41\t83.43\t83.50\t83.30\tInStock\n\
945\tGOLD RTGS\t-\t243937\t-\t-\tInStock\n\
2966\tSilver 999 (30 Kgs)\t-\t-\t-\t-\tInStock\n\
2987\tSilver 999 (5 Kgs)\t-\t91250\t-\t-\tInStock";

    fn price(raw: &str) -> Quote {
        Quote::Price(Decimal::from_str(raw).unwrap())
    }

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    #[test]
    fn zero_overrides_are_a_no_op() {
        let live = parse(FEED);
        let engine = AdjustmentEngine::new();
        engine.set_adjustment(Category::Gold, AdjustmentDescriptor::amount(Decimal::ZERO));
        assert_eq!(engine.compute_effective(&live), live);
    }

    #[test]
    fn gold_product_only_sees_the_gold_descriptor() {
        let live = parse(FEED);
        let engine = AdjustmentEngine::new();
        engine.set_adjustment(Category::Gold, AdjustmentDescriptor::amount(dec("-100")));
        engine.set_adjustment(Category::Silver, AdjustmentDescriptor::percent(dec("50")));

        let effective = engine.compute_effective(&live);
        assert_eq!(effective.rtgs[0].name, "GOLD RTGS");
        assert_eq!(effective.rtgs[0].sell, price("243837.00"));
        assert_eq!(effective.rtgs[2].sell, price("136875.00"));
    }

    #[test]
    fn spot_fields_shift_uniformly_and_currency_passes_through() {
        let live = parse(FEED);
        let adjustments = Adjustments {
            gold: AdjustmentDescriptor::amount(dec("10")),
            silver: AdjustmentDescriptor::default(),
        };
        let effective = compute_effective(&live, &adjustments);

        let gold = &effective.spot[0];
        assert_eq!(gold.bid, price("2355.10"));
        assert_eq!(gold.ask, price("2355.60"));
        assert_eq!(gold.high, price("2360.00"));
        assert_eq!(gold.low, price("2341.25"));
        assert_eq!(effective.spot[1], live.spot[1]);
        assert_eq!(effective.spot[2], live.spot[2]);
    }

    #[test]
    fn unavailable_sell_survives_every_mode() {
        let live = parse(FEED);
        for descriptor in [
            AdjustmentDescriptor::amount(dec("500")),
            AdjustmentDescriptor::percent(dec("-20")),
        ] {
            let adjustments = Adjustments {
                gold: descriptor,
                silver: descriptor,
            };
            let effective = compute_effective(&live, &adjustments);
            assert_eq!(effective.rtgs[1].sell, Quote::Unavailable);
            assert_eq!(effective.rtgs[1].buy, Quote::Unavailable);
        }
    }

    #[test]
    fn live_snapshot_is_left_untouched() {
        let live = parse(FEED);
        let before = live.clone();
        let adjustments = Adjustments {
            gold: AdjustmentDescriptor::percent(dec("10")),
            silver: AdjustmentDescriptor::amount(dec("1")),
        };
        let effective = compute_effective(&live, &adjustments);
        assert_eq!(live, before);
        assert_ne!(effective, live);
    }

    #[test]
    fn set_replaces_the_whole_descriptor() {
        let engine = AdjustmentEngine::new();
        engine.set_adjustment(Category::Gold, AdjustmentDescriptor::percent(dec("10")));
        engine.set_adjustment(Category::Gold, AdjustmentDescriptor::amount(dec("3")));
        assert_eq!(engine.adjustments().gold, AdjustmentDescriptor::amount(dec("3")));
        assert!(engine.adjustments().silver.is_noop());
    }

    #[test]
    fn reset_restores_the_live_values() {
        let live = parse(FEED);
        let engine = AdjustmentEngine::new();
        engine.set_adjustment(Category::Gold, AdjustmentDescriptor::percent(dec("10")));
        engine.set_adjustment(Category::Silver, AdjustmentDescriptor::amount(dec("-2")));
        engine.reset_adjustments();

        assert_eq!(engine.adjustments(), Adjustments::default());
        assert_eq!(engine.compute_effective(&live), live);
    }

    #[test]
    fn every_change_bumps_the_version() {
        let engine = AdjustmentEngine::new();
        assert_eq!(engine.current().1, 0);
        engine.set_adjustment(Category::Silver, AdjustmentDescriptor::amount(dec("1")));
        engine.reset_adjustments();
        assert_eq!(engine.current().1, 2);
    }
}
