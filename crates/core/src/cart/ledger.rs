use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use rust_decimal::Decimal;

use crate::domain::cart::{CartLine, CartSummary};
use crate::domain::money::round_money;
use crate::domain::quote::{ProviderId, Quote};

type UserCart = Arc<Mutex<Vec<CartLine>>>;

/// In-memory per-user carts. Each user's lines sit behind their own lock.
#[derive(Clone, Default)]
pub struct CartLedger {
    carts: Arc<RwLock<HashMap<String, UserCart>>>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn cart(&self, user_id: &str) -> UserCart {
        {
            let carts = match self.carts.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(cart) = carts.get(user_id) {
                return cart.clone();
            }
        }
        let mut carts = match self.carts.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        carts.entry(user_id.to_string()).or_default().clone()
    }

    fn with_lines<T>(&self, user_id: &str, f: impl FnOnce(&mut Vec<CartLine>) -> T) -> T {
        let cart = self.cart(user_id);
        let mut lines = match cart.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut lines)
    }

    /// Inserts, updates, or (for `quantity <= 0`) deletes the `provider:item` line.
    pub fn add_or_update(&self, user_id: &str, quote: &Quote, quantity: i64) -> CartSummary {
        let line_id = CartLine::line_id(&quote.provider, &quote.item_name);
        self.with_lines(user_id, |lines| {
            let existing = lines.iter().position(|line| line.id == line_id);
            if quantity <= 0 {
                if let Some(index) = existing {
                    lines.remove(index);
                }
                return summarize(lines);
            }

            let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            let mut line = CartLine {
                id: line_id.clone(),
                provider: quote.provider.clone(),
                item_name: quote.item_name.clone(),
                unit_price: quote.unit_price,
                delivery_fee: quote.delivery_fee,
                quantity,
                metadata: quote.metadata.to_map(),
            };
            match existing {
                Some(index) => {
                    if line.delivery_fee <= Decimal::ZERO {
                        line.delivery_fee = lines[index].delivery_fee;
                    }
                    lines[index] = line;
                }
                None => lines.push(line),
            }
            summarize(lines)
        })
    }

    pub fn remove(&self, user_id: &str, line_id: &str) -> CartSummary {
        self.with_lines(user_id, |lines| {
            lines.retain(|line| line.id != line_id);
            summarize(lines)
        })
    }

    pub fn clear(&self, user_id: &str) -> CartSummary {
        self.with_lines(user_id, |lines| {
            lines.clear();
            summarize(lines)
        })
    }

    pub fn get(&self, user_id: &str) -> CartSummary {
        self.with_lines(user_id, |lines| summarize(lines))
    }

    /// Drops every user's cart.
    pub fn reset(&self) {
        let mut carts = match self.carts.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        carts.clear();
    }
}

fn summarize(lines: &[CartLine]) -> CartSummary {
    let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();

    let mut provider_fees: Vec<(&ProviderId, Decimal)> = Vec::new();
    for line in lines {
        if !provider_fees.iter().any(|(provider, _)| *provider == &line.provider) {
            provider_fees.push((&line.provider, line.delivery_fee));
        }
    }
    let delivery: Decimal = provider_fees.iter().map(|(_, fee)| *fee).sum();

    CartSummary {
        lines: lines.to_vec(),
        subtotal: round_money(subtotal),
        delivery: round_money(delivery),
        total: round_money(subtotal + delivery),
    }
}
