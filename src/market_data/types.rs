use std::fmt;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Placeholder the feed uses for a field it does not currently supply.
pub const UNAVAILABLE: &str = "-";

/// A price field: either a finite decimal or the "unavailable" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Price(Decimal),
    Unavailable,
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Price(value) => write!(f, "{value}"),
            Self::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for Quote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Price(value) => Serialize::serialize(value, serializer),
            Self::Unavailable => serializer.serialize_str(UNAVAILABLE),
        }
    }
}

/// Metal category an instrument is classified into by its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Gold,
    Silver,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Gold, Category::Silver];

    /// First match wins and gold is checked first: "GOLD/SILVER RATIO" is gold.
    pub fn classify(name: &str) -> Option<Category> {
        let upper = name.to_uppercase();
        if upper.contains("GOLD") {
            Some(Category::Gold)
        } else if upper.contains("SILVER") {
            Some(Category::Silver)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
        }
    }
}

/// One tradable instrument's quote as delivered by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRecord {
    pub id: String,
    pub name: String,
    pub bid: Quote,
    pub ask: Quote,
    pub high: Quote,
    pub low: Quote,
    pub in_stock: bool,
}

/// Retail/RTGS product quote derived from a [`RateRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub buy: Quote,
    pub sell: Quote,
    pub in_stock: bool,
}

impl From<&RateRecord> for ProductRecord {
    fn from(record: &RateRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            buy: Quote::Unavailable,
            sell: record.ask,
            in_stock: record.in_stock,
        }
    }
}

/// Point-in-time aggregate produced by one successful poll.
///
/// Immutable once built; a newer poll replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateSnapshot {
    pub spot: Vec<RateRecord>,
    pub rtgs: Vec<ProductRecord>,
    pub futures: Vec<RateRecord>,
    pub next: Vec<RateRecord>,
}
