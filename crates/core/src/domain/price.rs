use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{ProviderId, Quote};

/// Every successful quote for one requested item, in provider order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResultItem {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit: String,
    pub quotes: Vec<Quote>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResult {
    pub items: Vec<PriceResultItem>,
    pub total_savings: Decimal,
    pub best_platform: Option<ProviderId>,
    pub recommendations: Vec<String>,
    pub dropped_items: usize,
    pub aggregated_at: DateTime<Utc>,
}

impl PriceResult {
    /// Flat quote set in item order, as consumed by the cart builder.
    pub fn quotes(&self) -> Vec<Quote> {
        self.items.iter().flat_map(|item| item.quotes.iter().cloned()).collect()
    }
}
