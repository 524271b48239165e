use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::ProviderId;
use crate::errors::DomainError;

pub const DEFAULT_STRATEGY: &str = "amazon_fresh";
pub const GENERAL_CATEGORY: &str = "general";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub base_multiplier: Decimal,
    pub category_multipliers: BTreeMap<String, Decimal>,
    pub discount_min: u32,
    pub discount_max: u32,
    pub delivery_fee: Decimal,
    pub min_order: Decimal,
    pub eta_min: u32,
    pub eta_max: u32,
    pub strengths: Vec<String>,
}

impl ProviderConfig {
    /// Falls back to the base multiplier for categories without an entry.
    pub fn category_multiplier(&self, category: &str) -> Decimal {
        self.category_multipliers.get(category).copied().unwrap_or(self.base_multiplier)
    }

    pub fn excels_in(&self, category: &str) -> bool {
        self.strengths.iter().any(|strength| strength == category)
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.discount_min > self.discount_max {
            return Err(DomainError::InvariantViolation(format!(
                "provider `{}` discount range {}..{} is inverted",
                self.id, self.discount_min, self.discount_max
            )));
        }
        if self.eta_min > self.eta_max {
            return Err(DomainError::InvariantViolation(format!(
                "provider `{}` eta range {}..{} is inverted",
                self.id, self.eta_min, self.eta_max
            )));
        }
        if self.base_multiplier <= Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "provider `{}` base multiplier must be positive",
                self.id
            )));
        }
        Ok(())
    }
}

fn multipliers(values: [(&str, i64); 11]) -> BTreeMap<String, Decimal> {
    values
        .into_iter()
        .map(|(category, hundredths)| (category.to_string(), Decimal::new(hundredths, 2)))
        .collect()
}

fn strengths(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn amazon_fresh() -> ProviderConfig {
    ProviderConfig {
        id: ProviderId::new("amazon_fresh"),
        base_multiplier: Decimal::new(100, 2),
        category_multipliers: multipliers([
            ("staples", 95),
            ("dairy", 105),
            ("vegetables", 110),
            ("fruits", 115),
            ("spices", 90),
            ("beverages", 100),
            ("snacks", 110),
            ("bakery", 105),
            ("frozen", 95),
            ("packaged", 90),
            (GENERAL_CATEGORY, 100),
        ]),
        discount_min: 5,
        discount_max: 15,
        delivery_fee: Decimal::ZERO,
        min_order: Decimal::from(200),
        eta_min: 30,
        eta_max: 120,
        strengths: strengths(&["packaged", "staples", "spices"]),
    }
}

pub fn instacart() -> ProviderConfig {
    ProviderConfig {
        id: ProviderId::new("instacart"),
        base_multiplier: Decimal::new(102, 2),
        category_multipliers: multipliers([
            ("staples", 98),
            ("dairy", 108),
            ("vegetables", 112),
            ("fruits", 118),
            ("spices", 95),
            ("beverages", 105),
            ("snacks", 110),
            ("bakery", 108),
            ("frozen", 100),
            ("packaged", 95),
            (GENERAL_CATEGORY, 102),
        ]),
        discount_min: 8,
        discount_max: 18,
        delivery_fee: Decimal::from(35),
        min_order: Decimal::from(100),
        eta_min: 60,
        eta_max: 180,
        strengths: strengths(&["vegetables", "fruits", "dairy", "bakery"]),
    }
}

pub fn uber_eats() -> ProviderConfig {
    ProviderConfig {
        id: ProviderId::new("uber_eats"),
        base_multiplier: Decimal::new(108, 2),
        category_multipliers: multipliers([
            ("staples", 110),
            ("dairy", 115),
            ("vegetables", 120),
            ("fruits", 125),
            ("spices", 110),
            ("beverages", 108),
            ("snacks", 105),
            ("bakery", 112),
            ("frozen", 105),
            ("packaged", 108),
            (GENERAL_CATEGORY, 108),
        ]),
        discount_min: 5,
        discount_max: 12,
        delivery_fee: Decimal::from(25),
        min_order: Decimal::from(50),
        eta_min: 15,
        eta_max: 45,
        strengths: strengths(&["vegetables", "fruits", "dairy", "bakery"]),
    }
}

fn position(strategies: &[ProviderConfig], id: &ProviderId) -> Result<usize, DomainError> {
    strategies
        .iter()
        .position(|strategy| &strategy.id == id)
        .ok_or_else(|| DomainError::UnknownProvider(id.to_string()))
}

/// Provider strategies in registration order plus the id used for unknown providers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategyRegistry {
    strategies: Vec<ProviderConfig>,
    // Always a valid index; every constructor checks the default is registered.
    default_index: usize,
}

impl StrategyRegistry {
    pub fn new(
        strategies: Vec<ProviderConfig>,
        default_id: ProviderId,
    ) -> Result<Self, DomainError> {
        for strategy in &strategies {
            strategy.validate()?;
        }
        let default_index = position(&strategies, &default_id)?;
        Ok(Self { strategies, default_index })
    }

    pub fn with_default_strategies() -> Self {
        Self { strategies: vec![amazon_fresh(), instacart(), uber_eats()], default_index: 0 }
    }

    /// Keeps only the listed providers, in the listed order.
    pub fn restricted_to(&self, provider_ids: &[String]) -> Result<Self, DomainError> {
        let mut strategies = Vec::with_capacity(provider_ids.len());
        for id in provider_ids {
            let strategy =
                self.get(id).ok_or_else(|| DomainError::UnknownProvider(id.to_string()))?;
            strategies.push(strategy.clone());
        }
        if strategies.is_empty() {
            return Err(DomainError::InvariantViolation(
                "at least one provider is required".to_string(),
            ));
        }
        let default_index = position(&strategies, self.default_id()).unwrap_or(0);
        Ok(Self { strategies, default_index })
    }

    pub fn with_default(mut self, default_id: ProviderId) -> Result<Self, DomainError> {
        self.default_index = position(&self.strategies, &default_id)?;
        Ok(self)
    }

    pub fn get(&self, provider: &str) -> Option<&ProviderConfig> {
        self.strategies.iter().find(|strategy| strategy.id.as_str() == provider)
    }

    pub fn default_strategy(&self) -> &ProviderConfig {
        &self.strategies[self.default_index]
    }

    pub fn get_or_default(&self, provider: &str) -> &ProviderConfig {
        self.get(provider).unwrap_or_else(|| self.default_strategy())
    }

    pub fn default_id(&self) -> &ProviderId {
        &self.default_strategy().id
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.strategies.iter().map(|strategy| strategy.id.clone()).collect()
    }

    pub fn strategies(&self) -> &[ProviderConfig] {
        &self.strategies
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_default_strategies()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{amazon_fresh, StrategyRegistry, DEFAULT_STRATEGY};
    use crate::domain::quote::ProviderId;
    use crate::errors::DomainError;

    #[test]
    fn unknown_provider_falls_back_to_default_strategy() {
        let registry = StrategyRegistry::default();

        assert_eq!(registry.get_or_default("blinkit").id.as_str(), DEFAULT_STRATEGY);
        assert_eq!(registry.get_or_default("uber_eats").delivery_fee, Decimal::from(25));
        assert!(registry.get("blinkit").is_none());
    }

    #[test]
    fn category_multiplier_falls_back_to_base_multiplier() {
        let registry = StrategyRegistry::default();
        let instacart = registry.get("instacart").expect("registered");

        assert_eq!(instacart.category_multiplier("fruits"), Decimal::new(118, 2));
        assert_eq!(instacart.category_multiplier("pet food"), Decimal::new(102, 2));
    }

    #[test]
    fn registry_rejects_unregistered_default() {
        let result = StrategyRegistry::new(vec![amazon_fresh()], ProviderId::new("uber_eats"));

        assert_eq!(result, Err(DomainError::UnknownProvider("uber_eats".to_string())));
    }

    #[test]
    fn registry_rejects_inverted_ranges() {
        let mut broken = amazon_fresh();
        broken.eta_min = 200;

        let result = StrategyRegistry::new(vec![broken], ProviderId::new(DEFAULT_STRATEGY));
        assert!(result.is_err());
    }

    #[test]
    fn restricting_providers_keeps_requested_order_and_reassigns_default() {
        let registry = StrategyRegistry::default();
        let restricted = registry
            .restricted_to(&["uber_eats".to_string(), "instacart".to_string()])
            .expect("known providers");

        assert_eq!(
            restricted.provider_ids(),
            vec![ProviderId::new("uber_eats"), ProviderId::new("instacart")]
        );
        assert_eq!(restricted.default_id().as_str(), "uber_eats");
        assert!(registry.restricted_to(&["blinkit".to_string()]).is_err());
    }
}
