use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{ProviderId, Quote};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartOption {
    pub provider: ProviderId,
    pub quotes: Vec<Quote>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub eta_minutes: u32,
}

impl CartOption {
    pub fn is_mixed(&self) -> bool {
        self.provider.is_mixed()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartPlan {
    pub options: Vec<CartOption>,
    pub best_option_index: usize,
}

impl CartPlan {
    pub fn best_option(&self) -> Option<&CartOption> {
        self.options.get(self.best_option_index)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub provider: ProviderId,
    pub item_name: String,
    pub unit_price: Decimal,
    pub delivery_fee: Decimal,
    pub quantity: u32,
    pub metadata: BTreeMap<String, String>,
}

impl CartLine {
    pub fn line_id(provider: &ProviderId, item_name: &str) -> String {
        format!("{provider}:{item_name}")
    }

    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub delivery: Decimal,
    pub total: Decimal,
}

impl CartSummary {
    pub fn line(&self, line_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == line_id)
    }
}
