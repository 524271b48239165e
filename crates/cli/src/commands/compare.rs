use cartscout_core::config::LoadOptions;
use cartscout_core::domain::item::PriceQuery;
use cartscout_core::domain::price::PriceResult;
use cartscout_core::scout::{
    best_deals, category_analysis, platform_comparison, CategoryAnalysis, ItemDeals,
    PlatformSummary, StrengthScore,
};
use cartscout_core::{ApplicationError, CartBuilder, CartPlan, Overseer};
use serde::Serialize;

use crate::commands::{item_names, load_config, CommandResult};

#[derive(Debug, Serialize)]
struct CompareReport {
    prices: PriceResult,
    platforms: Vec<PlatformSummary>,
    best_deals: Vec<ItemDeals>,
    categories: Vec<CategoryAnalysis>,
    strengths: Vec<StrengthScore>,
    recommendations: Vec<String>,
    cart: CartPlan,
}

pub fn run(options: &LoadOptions, items: &[String]) -> CommandResult {
    let names = item_names(items);
    if names.is_empty() {
        return CommandResult::from_error(
            "compare",
            &ApplicationError::InvalidInput("at least one item is required".to_string()),
        );
    }

    let config = match load_config("compare", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let overseer = match Overseer::from_config(&config) {
        Ok(overseer) => overseer,
        Err(error) => return CommandResult::from_error("compare", &ApplicationError::from(error)),
    };

    let scout = overseer.scout();
    let query = PriceQuery::from_names(names);
    let prices = scout.aggregate_prices(&query);
    let report = CompareReport {
        platforms: platform_comparison(&prices),
        best_deals: best_deals(&prices),
        categories: category_analysis(&prices),
        strengths: scout.platform_strengths(&query),
        recommendations: scout.detailed_recommendations(&query),
        cart: CartBuilder::new().build_cart(&prices.quotes()),
        prices,
    };

    let message = match report.prices.best_platform.as_ref() {
        Some(best) => format!(
            "priced {} of {} items; best platform {}",
            report.prices.items.len(),
            query.items.len(),
            best.display_name()
        ),
        None => format!("none of the {} items are stocked", query.items.len()),
    };
    CommandResult::success_with_data("compare", message, &report)
}
