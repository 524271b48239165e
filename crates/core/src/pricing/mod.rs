pub mod catalog;
pub mod quote_engine;
pub mod strategy;

use std::sync::Arc;

use crate::domain::item::Item;
use crate::domain::quote::{ProviderId, Quote};

use self::{catalog::Catalog, quote_engine::QuoteEngine, strategy::StrategyRegistry};

/// A storefront that can price an item. `None` means the provider does not carry it.
pub trait ProviderAdapter: Send + Sync {
    fn provider_id(&self) -> &ProviderId;
    fn quote(&self, item: &Item, location_pin: Option<&str>) -> Option<Quote>;
}

/// One quote engine per registered strategy, in registration order.
pub fn default_providers(
    registry: &StrategyRegistry,
    catalog: Arc<Catalog>,
    currency: &str,
) -> Vec<Arc<dyn ProviderAdapter>> {
    registry
        .strategies()
        .iter()
        .map(|strategy| {
            Arc::new(QuoteEngine::new(
                strategy.id.clone(),
                strategy.clone(),
                catalog.clone(),
                currency,
            )) as Arc<dyn ProviderAdapter>
        })
        .collect()
}

/// Engine for an arbitrary provider id, priced with the registry's default
/// strategy when the id has none of its own.
pub fn provider_for(
    provider: &str,
    registry: &StrategyRegistry,
    catalog: Arc<Catalog>,
    currency: &str,
) -> QuoteEngine {
    QuoteEngine::new(
        ProviderId::new(provider),
        registry.get_or_default(provider).clone(),
        catalog,
        currency,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{default_providers, provider_for, ProviderAdapter};
    use crate::domain::item::Item;
    use crate::pricing::{catalog::Catalog, strategy::StrategyRegistry};

    #[test]
    fn default_providers_follow_registry_order() {
        let registry = StrategyRegistry::default();
        let providers = default_providers(&registry, Arc::new(Catalog::grocery()), "INR");

        let ids: Vec<&str> = providers.iter().map(|provider| provider.provider_id().as_str()).collect();
        assert_eq!(ids, vec!["amazon_fresh", "instacart", "uber_eats"]);
    }

    #[test]
    fn unconfigured_provider_keeps_its_id_but_uses_default_strategy() {
        let registry = StrategyRegistry::default();
        let engine = provider_for("blinkit", &registry, Arc::new(Catalog::grocery()), "INR");

        let quote = engine.quote(&Item::named("rice"), None).expect("catalog item");
        assert_eq!(quote.provider.as_str(), "blinkit");
        assert_eq!(quote.metadata.strategy, "amazon_fresh");
        assert_eq!(quote.url.as_deref(), Some("https://blinkit.com/product/rice"));
    }
}
