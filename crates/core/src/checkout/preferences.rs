use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::money::round_money;
use crate::domain::quote::ProviderId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryBucket {
    Instant,
    Fast,
    Standard,
}

impl DeliveryBucket {
    pub fn for_eta(eta_minutes: u32) -> Self {
        match eta_minutes {
            0..=30 => Self::Instant,
            31..=120 => Self::Fast,
            _ => Self::Standard,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderPreference {
    pub provider: ProviderId,
    pub order_count: u64,
    pub total_value: Decimal,
    pub avg_order_value: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// First-order order; earlier providers win count ties.
    pub providers: Vec<ProviderPreference>,
    pub delivery: Vec<(DeliveryBucket, u64)>,
}

impl UserPreferences {
    fn record(&mut self, provider: &ProviderId, order_value: Decimal, eta_minutes: u32) {
        let index = match self.providers.iter().position(|pref| &pref.provider == provider) {
            Some(index) => index,
            None => {
                self.providers.push(ProviderPreference {
                    provider: provider.clone(),
                    order_count: 0,
                    total_value: Decimal::ZERO,
                    avg_order_value: Decimal::ZERO,
                });
                self.providers.len() - 1
            }
        };
        let pref = &mut self.providers[index];
        pref.order_count += 1;
        pref.total_value += order_value;
        pref.avg_order_value = round_money(pref.total_value / Decimal::from(pref.order_count));

        let bucket = DeliveryBucket::for_eta(eta_minutes);
        match self.delivery.iter_mut().find(|(existing, _)| *existing == bucket) {
            Some((_, count)) => *count += 1,
            None => self.delivery.push((bucket, 1)),
        }
    }

    pub fn favorite_provider(&self) -> Option<&ProviderPreference> {
        let mut favorite: Option<&ProviderPreference> = None;
        for pref in &self.providers {
            if favorite.map_or(true, |current| pref.order_count > current.order_count) {
                favorite = Some(pref);
            }
        }
        favorite
    }

    pub fn preferred_delivery(&self) -> Option<DeliveryBucket> {
        let mut preferred: Option<(DeliveryBucket, u64)> = None;
        for (bucket, count) in &self.delivery {
            if preferred.map_or(true, |(_, current)| *count > current) {
                preferred = Some((*bucket, *count));
            }
        }
        preferred.map(|(bucket, _)| bucket)
    }

    pub fn recommendations(&self) -> Vec<String> {
        let mut recommendations = Vec::new();
        if let Some(favorite) = self.favorite_provider() {
            recommendations
                .push(format!("Your favorite platform is {}", favorite.provider.display_name()));
        }
        if let Some(bucket) = self.preferred_delivery() {
            recommendations.push(
                match bucket {
                    DeliveryBucket::Instant => {
                        "You prefer instant delivery - try Blinkit or Swiggy Instamart for urgent items"
                    }
                    DeliveryBucket::Fast => {
                        "You prefer fast delivery - Amazon Fresh and BigBasket are great options"
                    }
                    DeliveryBucket::Standard => {
                        "You prefer standard delivery - consider bulk orders for better value"
                    }
                }
                .to_string(),
            );
        }
        recommendations
    }
}

/// Running per-user order statistics.
#[derive(Clone, Default)]
pub struct PreferenceStore {
    users: Arc<Mutex<HashMap<String, UserPreferences>>>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_order(
        &self,
        user_id: &str,
        provider: &ProviderId,
        order_value: Decimal,
        eta_minutes: u32,
    ) {
        let mut users = match self.users.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        users.entry(user_id.to_string()).or_default().record(provider, order_value, eta_minutes);
    }

    pub fn get(&self, user_id: &str) -> Option<UserPreferences> {
        let users = match self.users.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        users.get(user_id).cloned()
    }

    pub fn recommendations(&self, user_id: &str) -> Vec<String> {
        match self.get(user_id) {
            Some(preferences) => preferences.recommendations(),
            None => vec!["Start shopping to get personalized recommendations!".to_string()],
        }
    }

    pub fn reset(&self) {
        let mut users = match self.users.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        users.clear();
    }
}
