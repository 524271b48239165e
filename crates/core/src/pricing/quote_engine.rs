use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::domain::item::Item;
use crate::domain::money::{decimal_from_f64, round_money};
use crate::domain::quote::{ProviderId, Quote, QuoteMetadata};
use crate::pricing::catalog::{Catalog, MatchKind};
use crate::pricing::strategy::{ProviderConfig, GENERAL_CATEGORY};
use crate::pricing::ProviderAdapter;

const IN_STOCK_THRESHOLD: f64 = 0.05;

/// First four bytes of the SHA-256 digest of `name`, big-endian.
pub fn item_hash(name: &str) -> u64 {
    let digest = Sha256::digest(name.as_bytes());
    u64::from(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
}

/// First draw of a generator seeded only by `seed`. Each call owns its generator.
fn seeded_draw(seed: u64) -> f64 {
    StdRng::seed_from_u64(seed).gen::<f64>()
}

/// Discount for `name` within `[min, max]`. Reversed bounds are swapped.
pub fn discount_percent(name: &str, min: u32, max: u32) -> f64 {
    let (min, max) = if min <= max { (min, max) } else { (max, min) };
    let hash = item_hash(name);
    let span = u64::from(max - min) + 1;
    let base = f64::from(min) + (hash % span) as f64;
    let variation = 0.8 + 0.4 * seeded_draw(hash);
    (base * variation).clamp(f64::from(min), f64::from(max))
}

pub fn in_stock(name: &str) -> bool {
    seeded_draw(item_hash(name)) > IN_STOCK_THRESHOLD
}

pub fn brand_factor(preferred_brand: Option<&str>) -> Decimal {
    match preferred_brand {
        Some(brand) if !brand.is_empty() && brand.chars().count() % 2 == 0 => Decimal::new(9, 1),
        _ => Decimal::ONE,
    }
}

pub fn product_url(provider: &ProviderId, item_name: &str) -> String {
    format!(
        "https://{}.com/product/{}",
        provider.as_str().replace('_', ""),
        item_name.replace(' ', "-")
    )
}

/// Simulated storefront for one provider, priced from a static strategy.
#[derive(Clone, Debug)]
pub struct QuoteEngine {
    provider: ProviderId,
    strategy: ProviderConfig,
    catalog: Arc<Catalog>,
    currency: String,
}

impl QuoteEngine {
    pub fn new(
        provider: ProviderId,
        strategy: ProviderConfig,
        catalog: Arc<Catalog>,
        currency: impl Into<String>,
    ) -> Self {
        Self { provider, strategy, catalog, currency: currency.into() }
    }

    pub fn strategy(&self) -> &ProviderConfig {
        &self.strategy
    }

    fn eta_minutes(&self) -> u32 {
        if self.strategy.eta_min >= self.strategy.eta_max {
            return self.strategy.eta_min;
        }
        thread_rng().gen_range(self.strategy.eta_min..=self.strategy.eta_max)
    }

    fn category_for(&self, item: &Item, kind: MatchKind, catalog_category: &str) -> String {
        if kind == MatchKind::Exact {
            return catalog_category.to_string();
        }
        item.category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(str::to_lowercase)
            .unwrap_or_else(|| GENERAL_CATEGORY.to_string())
    }
}

impl ProviderAdapter for QuoteEngine {
    fn provider_id(&self) -> &ProviderId {
        &self.provider
    }

    fn quote(&self, item: &Item, _location_pin: Option<&str>) -> Option<Quote> {
        let matched = self.catalog.resolve(&item.name)?;
        let category = self.category_for(item, matched.kind, &matched.entry.category);
        let category_multiplier = self.strategy.category_multiplier(&category);

        let price = matched.entry.base_price
            * category_multiplier
            * brand_factor(item.preferred_brand.as_deref());

        let percent = discount_percent(
            &item.name,
            self.strategy.discount_min,
            self.strategy.discount_max,
        );
        let percent = decimal_from_f64(percent, 4)?;
        let unit_price = round_money(price * (Decimal::ONE - percent / Decimal::ONE_HUNDRED));

        Some(Quote {
            provider: self.provider.clone(),
            item_name: item.name.clone(),
            unit_price,
            currency: self.currency.clone(),
            in_stock: in_stock(&item.name),
            delivery_fee: self.strategy.delivery_fee,
            eta_minutes: self.eta_minutes(),
            url: Some(product_url(&self.provider, &item.name)),
            metadata: QuoteMetadata {
                original_price: round_money(price),
                discount_percent: percent.round_dp(1),
                category,
                unit: Some(matched.entry.unit.clone()),
                category_multiplier,
                base_multiplier: self.strategy.base_multiplier,
                min_order: self.strategy.min_order,
                strategy: self.strategy.id.to_string(),
                strengths: self.strategy.strengths.clone(),
            },
        })
    }
}
