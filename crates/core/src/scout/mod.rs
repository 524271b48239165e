use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::item::PriceQuery;
use crate::domain::money::{format_money, round_money};
use crate::domain::price::{PriceResult, PriceResultItem};
use crate::domain::quote::{ProviderId, Quote};
use crate::pricing::catalog::Catalog;
use crate::pricing::strategy::{StrategyRegistry, GENERAL_CATEGORY};
use crate::pricing::{default_providers, ProviderAdapter};

const DEFAULT_RESULT_CATEGORY: &str = "General";
const DEFAULT_RESULT_UNIT: &str = "piece";
const LIMITED_STOCK_RATIO: f64 = 0.8;
const STRONG_PLATFORM_SCORE: f64 = 0.7;
const SPLIT_ORDER_ITEM_COUNT: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSummary {
    pub provider: ProviderId,
    pub items: Vec<Quote>,
    pub total_cost: Decimal,
    pub delivery_fee: Decimal,
    pub delivery_time: u32,
    pub total_savings: Decimal,
    pub in_stock_items: usize,
    pub total_items: usize,
}

impl PlatformSummary {
    pub fn stock_ratio(&self) -> f64 {
        if self.total_items == 0 {
            return 0.0;
        }
        self.in_stock_items as f64 / self.total_items as f64
    }

    pub fn landed_cost(&self) -> Decimal {
        self.total_cost + self.delivery_fee
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeals {
    pub item_name: String,
    pub quotes: Vec<Quote>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub category: String,
    pub best_platform: ProviderId,
    pub best_price: Decimal,
    pub avg_price: Decimal,
    pub savings_vs_avg: Decimal,
    pub total_items: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrengthScore {
    pub provider: ProviderId,
    pub score: f64,
    pub strengths: Vec<String>,
}

/// Fans each requested item out to every provider and summarizes the price matrix.
#[derive(Clone)]
pub struct DealScout {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    registry: Arc<StrategyRegistry>,
    catalog: Arc<Catalog>,
    currency: String,
}

impl DealScout {
    pub fn new(
        providers: Vec<Arc<dyn ProviderAdapter>>,
        registry: Arc<StrategyRegistry>,
        catalog: Arc<Catalog>,
        currency: impl Into<String>,
    ) -> Self {
        Self { providers, registry, catalog, currency: currency.into() }
    }

    /// One quote engine per registered strategy.
    pub fn with_registry(
        registry: Arc<StrategyRegistry>,
        catalog: Arc<Catalog>,
        currency: impl Into<String>,
    ) -> Self {
        let currency = currency.into();
        let providers = default_providers(&registry, catalog.clone(), &currency);
        Self::new(providers, registry, catalog, currency)
    }

    pub fn providers(&self) -> &[Arc<dyn ProviderAdapter>] {
        &self.providers
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn aggregate_prices(&self, query: &PriceQuery) -> PriceResult {
        let location_pin = query.location_pin.as_deref();
        let mut items = Vec::with_capacity(query.items.len());
        let mut platform_totals: Vec<(ProviderId, Decimal)> = Vec::new();

        for item in &query.items {
            let quotes: Vec<Quote> = self
                .providers
                .iter()
                .filter_map(|provider| provider.quote(item, location_pin))
                .collect();
            if quotes.is_empty() {
                continue;
            }

            for quote in &quotes {
                match platform_totals.iter_mut().find(|(provider, _)| provider == &quote.provider)
                {
                    Some((_, total)) => *total += quote.unit_price,
                    None => platform_totals.push((quote.provider.clone(), quote.unit_price)),
                }
            }

            items.push(PriceResultItem {
                name: item.name.clone(),
                category: item
                    .category
                    .clone()
                    .unwrap_or_else(|| DEFAULT_RESULT_CATEGORY.to_string()),
                quantity: item.quantity.unwrap_or(1),
                unit: item.unit.clone().unwrap_or_else(|| DEFAULT_RESULT_UNIT.to_string()),
                quotes,
            });
        }

        let best_platform = min_by_first(&platform_totals, |(_, total)| *total)
            .map(|(provider, _)| provider.clone());
        let total_savings = match (
            platform_totals.iter().map(|(_, total)| *total).max(),
            platform_totals.iter().map(|(_, total)| *total).min(),
        ) {
            (Some(max), Some(min)) => round_money(max - min),
            _ => Decimal::ZERO,
        };

        let recommendations = vec![
            format!(
                "Best overall platform: {}",
                best_platform.as_ref().map(ProviderId::as_str).unwrap_or("none")
            ),
            format!("Total potential savings: {}", format_money(&self.currency, total_savings)),
            "Consider bulk purchases for better deals".to_string(),
        ];

        let dropped_items = query.items.len() - items.len();
        debug!(
            event_name = "scout.prices_aggregated",
            requested_items = query.items.len(),
            priced_items = items.len(),
            dropped_items,
            providers = self.providers.len(),
            best_platform = best_platform.as_ref().map(ProviderId::as_str).unwrap_or("none"),
            "aggregated provider quotes"
        );

        PriceResult {
            items,
            total_savings,
            best_platform,
            recommendations,
            dropped_items,
            aggregated_at: Utc::now(),
        }
    }

    pub fn platform_comparison(&self, query: &PriceQuery) -> Vec<PlatformSummary> {
        platform_comparison(&self.aggregate_prices(query))
    }

    pub fn best_deals(&self, query: &PriceQuery) -> Vec<ItemDeals> {
        best_deals(&self.aggregate_prices(query))
    }

    pub fn category_analysis(&self, query: &PriceQuery) -> Vec<CategoryAnalysis> {
        category_analysis(&self.aggregate_prices(query))
    }

    /// Share of the query's distinct catalog categories each registered strategy excels in.
    pub fn platform_strengths(&self, query: &PriceQuery) -> Vec<StrengthScore> {
        let categories: BTreeSet<String> = query
            .items
            .iter()
            .map(|item| {
                self.catalog
                    .lookup(&item.name)
                    .map(|entry| entry.category.clone())
                    .unwrap_or_else(|| GENERAL_CATEGORY.to_string())
            })
            .collect();

        self.registry
            .strategies()
            .iter()
            .map(|strategy| {
                let score = if categories.is_empty() {
                    0.0
                } else {
                    let matching =
                        categories.iter().filter(|category| strategy.excels_in(category)).count();
                    matching as f64 / categories.len() as f64
                };
                StrengthScore {
                    provider: strategy.id.clone(),
                    score,
                    strengths: strategy.strengths.clone(),
                }
            })
            .collect()
    }

    pub fn detailed_recommendations(&self, query: &PriceQuery) -> Vec<String> {
        let result = self.aggregate_prices(query);
        let platforms = platform_comparison(&result);
        let mut recommendations = Vec::new();

        if let Some(cheapest) = min_by_first(&platforms, PlatformSummary::landed_cost) {
            recommendations.push(format!(
                "Best overall value: {} ({})",
                cheapest.provider.display_name(),
                format_money(&self.currency, cheapest.landed_cost())
            ));
        }
        if let Some(fastest) = min_by_first(&platforms, |platform| platform.delivery_time) {
            recommendations.push(format!(
                "Fastest delivery: {} ({} minutes)",
                fastest.provider.display_name(),
                fastest.delivery_time
            ));
        }
        if let Some(saver) = max_by_first(&platforms, |platform| platform.total_savings) {
            if saver.total_savings > Decimal::from(50) {
                recommendations.push(format!(
                    "Maximum savings: {} ({} off)",
                    saver.provider.display_name(),
                    format_money(&self.currency, saver.total_savings)
                ));
            }
        }
        for platform in &platforms {
            if platform.stock_ratio() < LIMITED_STOCK_RATIO {
                recommendations.push(format!(
                    "Limited stock on {} ({}/{} items available)",
                    platform.provider.display_name(),
                    platform.in_stock_items,
                    platform.total_items
                ));
            }
        }
        for analysis in category_analysis(&result) {
            if analysis.savings_vs_avg > Decimal::TEN {
                recommendations.push(format!(
                    "Best for {}: {} ({} cheaper than average)",
                    analysis.category,
                    analysis.best_platform.display_name(),
                    format_money(&self.currency, analysis.savings_vs_avg)
                ));
            }
        }
        for strength in self.platform_strengths(query) {
            if strength.score > STRONG_PLATFORM_SCORE && !strength.strengths.is_empty() {
                recommendations.push(format!(
                    "{} excels in: {}",
                    strength.provider.display_name(),
                    strength.strengths.join(", ")
                ));
            }
        }
        if query.items.len() > SPLIT_ORDER_ITEM_COUNT {
            recommendations
                .push("Consider splitting your order across platforms for maximum savings".to_string());
        }

        recommendations
    }
}

/// Per-provider totals in first-seen provider order.
pub fn platform_comparison(result: &PriceResult) -> Vec<PlatformSummary> {
    let mut platforms: Vec<PlatformSummary> = Vec::new();
    for quote in result.items.iter().flat_map(|item| item.quotes.iter()) {
        let index = match platforms.iter().position(|platform| platform.provider == quote.provider)
        {
            Some(index) => index,
            None => {
                platforms.push(PlatformSummary {
                    provider: quote.provider.clone(),
                    items: Vec::new(),
                    total_cost: Decimal::ZERO,
                    delivery_fee: quote.delivery_fee,
                    delivery_time: quote.eta_minutes,
                    total_savings: Decimal::ZERO,
                    in_stock_items: 0,
                    total_items: 0,
                });
                platforms.len() - 1
            }
        };
        let platform = &mut platforms[index];
        platform.total_cost += quote.unit_price;
        platform.total_savings += quote.discount_amount();
        platform.total_items += 1;
        if quote.in_stock {
            platform.in_stock_items += 1;
        }
        platform.items.push(quote.clone());
    }
    platforms
}

/// Quotes per item, cheapest first. Equal prices keep provider order.
pub fn best_deals(result: &PriceResult) -> Vec<ItemDeals> {
    let mut deals: Vec<ItemDeals> = Vec::new();
    for quote in result.items.iter().flat_map(|item| item.quotes.iter()) {
        match deals.iter_mut().find(|deal| deal.item_name == quote.item_name) {
            Some(deal) => deal.quotes.push(quote.clone()),
            None => deals
                .push(ItemDeals { item_name: quote.item_name.clone(), quotes: vec![quote.clone()] }),
        }
    }
    for deal in &mut deals {
        deal.quotes.sort_by(|left, right| left.unit_price.cmp(&right.unit_price));
    }
    deals
}

pub fn category_analysis(result: &PriceResult) -> Vec<CategoryAnalysis> {
    let mut categories: Vec<(String, Vec<&Quote>)> = Vec::new();
    for quote in result.items.iter().flat_map(|item| item.quotes.iter()) {
        match categories.iter_mut().find(|(category, _)| category == &quote.metadata.category) {
            Some((_, quotes)) => quotes.push(quote),
            None => categories.push((quote.metadata.category.clone(), vec![quote])),
        }
    }

    categories
        .into_iter()
        .filter_map(|(category, quotes)| {
            let mut totals: Vec<(ProviderId, Decimal)> = Vec::new();
            for quote in &quotes {
                match totals.iter_mut().find(|(provider, _)| provider == &quote.provider) {
                    Some((_, total)) => *total += quote.unit_price,
                    None => totals.push((quote.provider.clone(), quote.unit_price)),
                }
            }
            let (best_platform, best_price) = min_by_first(&totals, |(_, total)| *total)?.clone();
            let sum: Decimal = totals.iter().map(|(_, total)| *total).sum();
            let avg_price = round_money(sum / Decimal::from(totals.len()));
            Some(CategoryAnalysis {
                category,
                best_platform,
                best_price,
                avg_price,
                savings_vs_avg: avg_price - best_price,
                total_items: quotes.len(),
            })
        })
        .collect()
}

fn min_by_first<T, K: PartialOrd>(values: &[T], key: impl Fn(&T) -> K) -> Option<&T> {
    let mut best: Option<(&T, K)> = None;
    for value in values {
        let candidate = key(value);
        let replace = match &best {
            Some((_, current)) => candidate < *current,
            None => true,
        };
        if replace {
            best = Some((value, candidate));
        }
    }
    best.map(|(value, _)| value)
}

fn max_by_first<T, K: PartialOrd>(values: &[T], key: impl Fn(&T) -> K) -> Option<&T> {
    let mut best: Option<(&T, K)> = None;
    for value in values {
        let candidate = key(value);
        let replace = match &best {
            Some((_, current)) => candidate > *current,
            None => true,
        };
        if replace {
            best = Some((value, candidate));
        }
    }
    best.map(|(value, _)| value)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{best_deals, category_analysis, platform_comparison, DealScout};
    use crate::domain::item::{Item, PriceQuery};
    use crate::domain::quote::{ProviderId, Quote, QuoteMetadata};
    use crate::pricing::catalog::Catalog;
    use crate::pricing::strategy::StrategyRegistry;
    use crate::pricing::ProviderAdapter;

    struct FixedProvider {
        id: ProviderId,
        prices: Vec<(&'static str, i64, &'static str)>,
        delivery_fee: i64,
        eta_minutes: u32,
        in_stock: bool,
    }

    impl ProviderAdapter for FixedProvider {
        fn provider_id(&self) -> &ProviderId {
            &self.id
        }

        fn quote(&self, item: &Item, _location_pin: Option<&str>) -> Option<Quote> {
            let (_, price, category) =
                self.prices.iter().find(|(name, _, _)| *name == item.name)?;
            Some(Quote {
                provider: self.id.clone(),
                item_name: item.name.clone(),
                unit_price: Decimal::from(*price),
                currency: "INR".to_string(),
                in_stock: self.in_stock,
                delivery_fee: Decimal::from(self.delivery_fee),
                eta_minutes: self.eta_minutes,
                url: None,
                metadata: QuoteMetadata {
                    original_price: Decimal::from(*price + 40),
                    discount_percent: Decimal::TEN,
                    category: category.to_string(),
                    unit: None,
                    category_multiplier: Decimal::ONE,
                    base_multiplier: Decimal::ONE,
                    min_order: Decimal::ZERO,
                    strategy: self.id.to_string(),
                    strengths: Vec::new(),
                },
            })
        }
    }

    fn fixture_scout() -> DealScout {
        let cheap = FixedProvider {
            id: ProviderId::new("amazon_fresh"),
            prices: vec![("rice", 40, "staples"), ("milk", 70, "dairy")],
            delivery_fee: 0,
            eta_minutes: 90,
            in_stock: true,
        };
        let fast = FixedProvider {
            id: ProviderId::new("uber_eats"),
            prices: vec![("rice", 55, "staples"), ("milk", 60, "dairy"), ("tea", 210, "beverages")],
            delivery_fee: 25,
            eta_minutes: 20,
            in_stock: false,
        };
        DealScout::new(
            vec![Arc::new(cheap), Arc::new(fast)],
            Arc::new(StrategyRegistry::default()),
            Arc::new(Catalog::grocery()),
            "INR",
        )
    }

    #[test]
    fn aggregate_drops_unquoted_items_and_picks_cheapest_platform() {
        let scout = fixture_scout();
        let query = PriceQuery::from_names(["rice", "milk", "caviar"]);

        let result = scout.aggregate_prices(&query);

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.dropped_items, 1);
        assert_eq!(result.items[0].category, "General");
        assert_eq!(result.items[0].unit, "piece");
        assert_eq!(result.items[0].quantity, 1);
        // amazon_fresh 110, uber_eats 115
        assert_eq!(result.best_platform, Some(ProviderId::new("amazon_fresh")));
        assert_eq!(result.total_savings, Decimal::from(5));
        assert_eq!(
            result.recommendations,
            vec![
                "Best overall platform: amazon_fresh".to_string(),
                "Total potential savings: INR 5.00".to_string(),
                "Consider bulk purchases for better deals".to_string(),
            ]
        );
    }

    #[test]
    fn empty_query_has_no_best_platform() {
        let result = fixture_scout().aggregate_prices(&PriceQuery::default());

        assert!(result.items.is_empty());
        assert_eq!(result.best_platform, None);
        assert_eq!(result.total_savings, Decimal::ZERO);
    }

    #[test]
    fn comparison_and_deals_are_derived_from_the_same_matrix() {
        let scout = fixture_scout();
        let result = scout.aggregate_prices(&PriceQuery::from_names(["rice", "milk", "tea"]));

        let platforms = platform_comparison(&result);
        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[1].provider.as_str(), "uber_eats");
        assert_eq!(platforms[1].total_cost, Decimal::from(325));
        assert_eq!(platforms[1].total_items, 3);
        assert_eq!(platforms[1].in_stock_items, 0);
        assert_eq!(platforms[1].total_savings, Decimal::from(120));

        let deals = best_deals(&result);
        assert_eq!(deals[1].item_name, "milk");
        assert_eq!(deals[1].quotes[0].provider.as_str(), "uber_eats");
        assert_eq!(deals[2].quotes.len(), 1);
    }

    #[test]
    fn category_analysis_reports_savings_against_average() {
        let scout = fixture_scout();
        let result = scout.aggregate_prices(&PriceQuery::from_names(["rice", "milk"]));

        let analysis = category_analysis(&result);
        let staples = analysis.iter().find(|entry| entry.category == "staples").expect("staples");
        assert_eq!(staples.best_platform.as_str(), "amazon_fresh");
        assert_eq!(staples.best_price, Decimal::from(40));
        assert_eq!(staples.avg_price, Decimal::new(4750, 2));
        assert_eq!(staples.savings_vs_avg, Decimal::new(750, 2));
    }

    #[test]
    fn platform_strengths_score_distinct_query_categories() {
        let scout = fixture_scout();
        let scores = scout.platform_strengths(&PriceQuery::from_names(["rice", "dal", "cumin"]));

        let amazon = scores.iter().find(|score| score.provider.as_str() == "amazon_fresh");
        assert_eq!(amazon.map(|score| score.score), Some(1.0));
        let instacart = scores.iter().find(|score| score.provider.as_str() == "instacart");
        assert_eq!(instacart.map(|score| score.score), Some(0.0));

        let empty = scout.platform_strengths(&PriceQuery::default());
        assert!(empty.iter().all(|score| score.score == 0.0));
    }

    #[test]
    fn detailed_recommendations_cover_value_speed_stock_and_strengths() {
        let scout = fixture_scout();
        let recommendations = scout
            .detailed_recommendations(&PriceQuery::from_names(["rice", "milk", "tea", "dal"]));

        assert_eq!(recommendations[0], "Best overall value: Amazon Fresh (INR 110.00)");
        assert_eq!(recommendations[1], "Fastest delivery: Uber Eats (20 minutes)");
        assert!(recommendations.contains(&"Maximum savings: Uber Eats (INR 120.00 off)".to_string()));
        assert!(recommendations
            .contains(&"Limited stock on Uber Eats (0/3 items available)".to_string()));
        assert!(recommendations.contains(
            &"Consider splitting your order across platforms for maximum savings".to_string()
        ));
    }

    #[test]
    fn default_scout_quotes_every_registered_provider() {
        let scout = DealScout::with_registry(
            Arc::new(StrategyRegistry::default()),
            Arc::new(Catalog::grocery()),
            "INR",
        );
        let result = scout.aggregate_prices(&PriceQuery::new(vec![Item::named("rice")]));

        assert_eq!(result.items[0].quotes.len(), 3);
        assert!(result.best_platform.is_some());
    }
}
