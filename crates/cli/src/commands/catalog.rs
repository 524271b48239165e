use cartscout_core::config::LoadOptions;
use cartscout_core::pricing::catalog::{Catalog, CatalogEntry};
use cartscout_core::pricing::strategy::ProviderConfig;
use cartscout_core::ApplicationError;
use serde::Serialize;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct CatalogReport<'a> {
    currency: &'a str,
    default_provider: &'a str,
    categories: Vec<&'a str>,
    items: &'a [CatalogEntry],
    strategies: &'a [ProviderConfig],
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("catalog", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let registry = match config.strategy_registry() {
        Ok(registry) => registry,
        Err(error) => return CommandResult::from_error("catalog", &ApplicationError::from(error)),
    };

    let catalog = Catalog::grocery();
    let report = CatalogReport {
        currency: &config.pricing.currency,
        default_provider: registry.default_id().as_str(),
        categories: catalog.categories(),
        items: catalog.entries(),
        strategies: registry.strategies(),
    };

    CommandResult::success_with_data(
        "catalog",
        format!(
            "{} items across {} providers",
            catalog.len(),
            registry.strategies().len()
        ),
        &report,
    )
}
