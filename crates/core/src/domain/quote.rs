use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub String);

impl ProviderId {
    /// Reserved id of the cross-provider cart option.
    pub const MIXED: &'static str = "mixed";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn mixed() -> Self {
        Self(Self::MIXED.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_mixed(&self) -> bool {
        self.0 == Self::MIXED
    }

    /// `amazon_fresh` -> `Amazon Fresh`
    pub fn display_name(&self) -> String {
        self.0
            .split('_')
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteMetadata {
    pub original_price: Decimal,
    pub discount_percent: Decimal,
    pub category: String,
    pub unit: Option<String>,
    pub category_multiplier: Decimal,
    pub base_multiplier: Decimal,
    pub min_order: Decimal,
    pub strategy: String,
    pub strengths: Vec<String>,
}

impl QuoteMetadata {
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("original_price".to_string(), self.original_price.to_string());
        map.insert("discount_percent".to_string(), self.discount_percent.to_string());
        map.insert("category".to_string(), self.category.clone());
        if let Some(unit) = &self.unit {
            map.insert("unit".to_string(), unit.clone());
        }
        map.insert("strategy".to_string(), self.strategy.clone());
        map
    }
}

/// One provider's priced, timed offer for one item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub provider: ProviderId,
    pub item_name: String,
    pub unit_price: Decimal,
    pub currency: String,
    pub in_stock: bool,
    pub delivery_fee: Decimal,
    pub eta_minutes: u32,
    pub url: Option<String>,
    pub metadata: QuoteMetadata,
}

impl Quote {
    /// Amount saved against the pre-discount price.
    pub fn discount_amount(&self) -> Decimal {
        self.metadata.original_price - self.unit_price
    }
}
