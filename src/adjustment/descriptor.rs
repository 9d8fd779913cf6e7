use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::AdjustmentInputError;
use crate::market_data::types::{Category, Quote};

/// Decimal places an adjusted price is rounded to.
pub const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentMode {
    #[default]
    Amount,
    Percent,
}

impl FromStr for AdjustmentMode {
    type Err = AdjustmentInputError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "amount" => Ok(Self::Amount),
            "percent" => Ok(Self::Percent),
            _ => Err(AdjustmentInputError::UnknownMode(raw.to_string())),
        }
    }
}

/// Manual override for one category: a signed delta, either absolute or
/// a percentage of the live price. `value == 0` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AdjustmentDescriptor {
    pub mode: AdjustmentMode,
    pub value: Decimal,
}

impl AdjustmentDescriptor {
    pub const ZERO: Self = Self {
        mode: AdjustmentMode::Amount,
        value: Decimal::ZERO,
    };

    pub fn amount(value: Decimal) -> Self {
        Self {
            mode: AdjustmentMode::Amount,
            value,
        }
    }

    pub fn percent(value: Decimal) -> Self {
        Self {
            mode: AdjustmentMode::Percent,
            value,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.value.is_zero()
    }

    /// Applies the override to one price field.
    ///
    /// The sentinel passes through untouched. Results are rounded half away
    /// from zero to [`PRICE_SCALE`] places. A zero override, or one whose
    /// arithmetic would overflow, returns the base as is.
    pub fn apply(&self, base: Quote) -> Quote {
        let Quote::Price(base) = base else {
            return Quote::Unavailable;
        };
        if self.is_noop() {
            return Quote::Price(base);
        }

        let delta = match self.mode {
            AdjustmentMode::Amount => Some(self.value),
            AdjustmentMode::Percent => base
                .checked_mul(self.value)
                .and_then(|scaled| scaled.checked_div(Decimal::ONE_HUNDRED)),
        };

        match delta.and_then(|delta| base.checked_add(delta)) {
            Some(effective) => Quote::Price(
                effective.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero),
            ),
            None => Quote::Price(base),
        }
    }
}

/// The per-category override pair the engine applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Adjustments {
    pub gold: AdjustmentDescriptor,
    pub silver: AdjustmentDescriptor,
}

impl Adjustments {
    pub fn get(&self, category: Category) -> &AdjustmentDescriptor {
        match category {
            Category::Gold => &self.gold,
            Category::Silver => &self.silver,
        }
    }

    pub fn set(&mut self, category: Category, descriptor: AdjustmentDescriptor) {
        match category {
            Category::Gold => self.gold = descriptor,
            Category::Silver => self.silver = descriptor,
        }
    }

    /// Descriptor for a display name, `None` when the name is in no category.
    pub fn for_name(&self, name: &str) -> Option<&AdjustmentDescriptor> {
        Category::classify(name).map(|category| self.get(category))
    }

    pub fn is_noop(&self) -> bool {
        self.gold.is_noop() && self.silver.is_noop()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl FromStr for Direction {
    type Err = AdjustmentInputError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            _ => Err(AdjustmentInputError::UnknownDirection(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Only(Category),
}

impl Scope {
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Self::All => &Category::ALL,
            Self::Only(Category::Gold) => &[Category::Gold],
            Self::Only(Category::Silver) => &[Category::Silver],
        }
    }
}

impl FromStr for Scope {
    type Err = AdjustmentInputError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "gold" => Ok(Self::Only(Category::Gold)),
            "silver" => Ok(Self::Only(Category::Silver)),
            _ => Err(AdjustmentInputError::UnknownScope(raw.to_string())),
        }
    }
}

/// Admin form input, validated before anything reaches the engine.
///
/// The amount is always entered positive; the direction carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjustmentRequest {
    pub direction: Direction,
    pub scope: Scope,
    pub mode: AdjustmentMode,
    pub amount: Decimal,
}

impl AdjustmentRequest {
    pub fn parse(
        direction: &str,
        scope: &str,
        mode: &str,
        amount: &str,
    ) -> Result<Self, AdjustmentInputError> {
        let trimmed = amount.trim();
        let value = Decimal::from_str(trimmed)
            .map_err(|_| AdjustmentInputError::NotANumber(amount.to_string()))?;
        if value <= Decimal::ZERO {
            return Err(AdjustmentInputError::NotPositive(trimmed.to_string()));
        }

        Ok(Self {
            direction: direction.parse()?,
            scope: scope.parse()?,
            mode: mode.parse()?,
            amount: value,
        })
    }

    pub fn descriptor(&self) -> AdjustmentDescriptor {
        let value = match self.direction {
            Direction::Increase => self.amount,
            Direction::Decrease => -self.amount,
        };
        AdjustmentDescriptor {
            mode: self.mode,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    #[test]
    fn percent_adds_share_of_base() {
        let effective = AdjustmentDescriptor::percent(dec("5")).apply(Quote::Price(dec("1000")));
        assert_eq!(effective, Quote::Price(dec("1050.00")));
    }

    #[test]
    fn amount_adds_signed_delta() {
        let effective = AdjustmentDescriptor::amount(dec("-100")).apply(Quote::Price(dec("243937")));
        assert_eq!(effective, Quote::Price(dec("243837.00")));
    }

    #[test]
    fn rounds_half_away_from_zero_to_two_places() {
        let up = AdjustmentDescriptor::amount(dec("0.005")).apply(Quote::Price(dec("10")));
        assert_eq!(up, Quote::Price(dec("10.01")));
        let down = AdjustmentDescriptor::amount(dec("-0.005")).apply(Quote::Price(dec("-10")));
        assert_eq!(down, Quote::Price(dec("-10.01")));
        let below_half = AdjustmentDescriptor::percent(dec("1")).apply(Quote::Price(dec("0.4")));
        assert_eq!(below_half, Quote::Price(dec("0.40")));
        let third = AdjustmentDescriptor::percent(dec("10")).apply(Quote::Price(dec("33.333")));
        assert_eq!(third, Quote::Price(dec("36.67")));
    }

    #[test]
    fn sentinel_is_never_adjusted() {
        for descriptor in [
            AdjustmentDescriptor::amount(dec("250")),
            AdjustmentDescriptor::percent(dec("-3")),
        ] {
            assert_eq!(descriptor.apply(Quote::Unavailable), Quote::Unavailable);
        }
    }

    #[test]
    fn zero_value_keeps_base_exactly() {
        let base = Quote::Price(dec("29.4567"));
        assert_eq!(AdjustmentDescriptor::ZERO.apply(base), base);
        assert_eq!(AdjustmentDescriptor::percent(Decimal::ZERO).apply(base), base);
    }

    #[test]
    fn overflow_leaves_base_alone() {
        let base = Quote::Price(Decimal::MAX);
        assert_eq!(AdjustmentDescriptor::amount(dec("1")).apply(base), base);
    }

    #[test]
    fn names_resolve_to_their_category_descriptor() {
        let adjustments = Adjustments {
            gold: AdjustmentDescriptor::amount(dec("1")),
            silver: AdjustmentDescriptor::amount(dec("2")),
        };
        assert_eq!(adjustments.for_name("GOLD RTGS"), Some(&adjustments.gold));
        assert_eq!(adjustments.for_name("Silver 999"), Some(&adjustments.silver));
        assert_eq!(adjustments.for_name("USD-INR"), None);
    }

    #[test]
    fn request_parses_and_signs_by_direction() {
        let request = AdjustmentRequest::parse("Decrease", "gold", "amount", " 100 ").unwrap();
        assert_eq!(request.scope, Scope::Only(Category::Gold));
        assert_eq!(request.descriptor(), AdjustmentDescriptor::amount(dec("-100")));

        let request = AdjustmentRequest::parse("increase", "all", "percent", "2.5").unwrap();
        assert_eq!(request.scope.categories(), &Category::ALL);
        assert_eq!(request.descriptor(), AdjustmentDescriptor::percent(dec("2.5")));
    }

    #[test]
    fn request_rejects_bad_input_at_the_boundary() {
        assert_eq!(
            AdjustmentRequest::parse("increase", "gold", "amount", "abc"),
            Err(AdjustmentInputError::NotANumber("abc".into()))
        );
        assert_eq!(
            AdjustmentRequest::parse("increase", "gold", "amount", "0"),
            Err(AdjustmentInputError::NotPositive("0".into()))
        );
        assert_eq!(
            AdjustmentRequest::parse("increase", "gold", "amount", "-5"),
            Err(AdjustmentInputError::NotPositive("-5".into()))
        );
        assert_eq!(
            AdjustmentRequest::parse("increase", "platinum", "amount", "5"),
            Err(AdjustmentInputError::UnknownScope("platinum".into()))
        );
        assert_eq!(
            AdjustmentRequest::parse("increase", "gold", "ratio", "5"),
            Err(AdjustmentInputError::UnknownMode("ratio".into()))
        );
        assert_eq!(
            AdjustmentRequest::parse("up", "gold", "amount", "5"),
            Err(AdjustmentInputError::UnknownDirection("up".into()))
        );
    }
}
