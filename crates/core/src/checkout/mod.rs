pub mod coupons;
pub mod preferences;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::checkout::{CheckoutRequest, CheckoutResult};
use crate::domain::money::{format_money, round_money, DEFAULT_CURRENCY};
use crate::domain::quote::ProviderId;
use crate::policy::{DelegationPolicy, RoleCeilingPolicy};

use self::coupons::CouponRegistry;
use self::preferences::{PreferenceStore, UserPreferences};

pub const DEFAULT_LOYALTY_POINTS: u64 = 500;
pub const DEFAULT_ETA_MINUTES: u32 = 60;
const RECOMMENDATIONS_IN_MESSAGE: usize = 2;

pub const AUTHENTICATION_FAILED: &str = "Authentication failed. Please login again.";
pub const NO_ITEMS: &str = "No items to checkout";

pub trait PaymentAuthenticator: Send + Sync {
    fn authenticate(&self, user_id: &str, payment_token: Option<&str>) -> bool;
}

/// Accepts every user and token.
#[derive(Clone, Debug, Default)]
pub struct PermissiveAuthenticator;

impl PaymentAuthenticator for PermissiveAuthenticator {
    fn authenticate(&self, _user_id: &str, _payment_token: Option<&str>) -> bool {
        true
    }
}

pub trait LoyaltySource: Send + Sync {
    fn available_points(&self, user_id: &str) -> u64;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedLoyalty(pub u64);

impl Default for FixedLoyalty {
    fn default() -> Self {
        Self(DEFAULT_LOYALTY_POINTS)
    }
}

impl LoyaltySource for FixedLoyalty {
    fn available_points(&self, _user_id: &str) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoyaltyRedemption {
    pub points_used: u64,
    pub discount: Decimal,
}

/// Up to 10% of the subtotal (whole points) at 0.01 per point.
pub fn redeem_loyalty(available_points: u64, subtotal: Decimal) -> LoyaltyRedemption {
    let cap = (subtotal * Decimal::new(1, 1)).floor().to_u64().unwrap_or(0);
    let points_used = available_points.min(cap);
    LoyaltyRedemption { points_used, discount: Decimal::from(points_used) * Decimal::new(1, 2) }
}

pub fn tracking_url(provider: &ProviderId, order_id: &str) -> String {
    match provider.as_str() {
        "amazon_fresh" => format!("https://amazon.in/track/{order_id}"),
        "flipkart_supermart" => format!("https://flipkart.com/track/{order_id}"),
        "bigbasket" => format!("https://bigbasket.com/track/{order_id}"),
        "blinkit" => format!("https://blinkit.com/track/{order_id}"),
        "swiggy_instamart" => format!("https://swiggy.com/track/{order_id}"),
        _ => format!("https://grocery-scout.com/track/{order_id}"),
    }
}

struct InvoiceFigures {
    items: usize,
    subtotal: Decimal,
    delivery_fee: Decimal,
    coupon_discount: Decimal,
    loyalty_discount: Decimal,
    final_total: Decimal,
    eta_minutes: u32,
}

fn render_invoice(order_id: &str, currency: &str, figures: &InvoiceFigures) -> String {
    [
        "INVOICE".to_string(),
        format!("Order ID: {order_id}"),
        format!("Date: {}", Utc::now().format("%Y-%m-%d %H:%M:%S")),
        String::new(),
        format!("Items: {}", figures.items),
        format!("Subtotal: {}", format_money(currency, figures.subtotal)),
        format!("Delivery Fee: {}", format_money(currency, figures.delivery_fee)),
        format!("Coupon Discount: {}", format_money(currency, figures.coupon_discount)),
        format!("Loyalty Discount: {}", format_money(currency, figures.loyalty_discount)),
        format!("Total: {}", format_money(currency, figures.final_total)),
        String::new(),
        format!("Delivery ETA: {} minutes", figures.eta_minutes),
    ]
    .join("\n")
}

/// Prices a checkout request: delegation, coupons, loyalty, then the order record.
#[derive(Clone)]
pub struct OrderExecutor {
    authenticator: Arc<dyn PaymentAuthenticator>,
    loyalty: Arc<dyn LoyaltySource>,
    delegation: Arc<dyn DelegationPolicy>,
    coupons: CouponRegistry,
    preferences: PreferenceStore,
    currency: String,
}

impl Default for OrderExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENCY)
    }
}

impl OrderExecutor {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            authenticator: Arc::new(PermissiveAuthenticator),
            loyalty: Arc::new(FixedLoyalty::default()),
            delegation: Arc::new(RoleCeilingPolicy::default()),
            coupons: CouponRegistry::default(),
            preferences: PreferenceStore::new(),
            currency: currency.into(),
        }
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn PaymentAuthenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    pub fn with_loyalty(mut self, loyalty: Arc<dyn LoyaltySource>) -> Self {
        self.loyalty = loyalty;
        self
    }

    pub fn with_delegation(mut self, delegation: Arc<dyn DelegationPolicy>) -> Self {
        self.delegation = delegation;
        self
    }

    pub fn with_coupons(mut self, coupons: CouponRegistry) -> Self {
        self.coupons = coupons;
        self
    }

    pub fn with_preferences(mut self, preferences: PreferenceStore) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn coupons(&self) -> &CouponRegistry {
        &self.coupons
    }

    pub fn checkout(&self, request: &CheckoutRequest, role: &str) -> CheckoutResult {
        if !self.authenticator.authenticate(&request.user_id, request.payment_token.as_deref()) {
            return self.reject(request, "authentication", AUTHENTICATION_FAILED);
        }
        if request.items.is_empty() {
            return self.reject(request, "empty_cart", NO_ITEMS);
        }

        let subtotal: Decimal = request.items.iter().map(|quote| quote.unit_price).sum();
        if let Some(required_role) = self.delegation.check(subtotal, role) {
            if required_role != role {
                let message = format!(
                    "Order value {} requires {required_role} approval. Current role: {role}",
                    format_money(&self.currency, subtotal)
                );
                return self.reject(request, "delegation_required", &message);
            }
        }

        let delivery_fee =
            request.items.iter().map(|quote| quote.delivery_fee).max().unwrap_or(Decimal::ZERO);
        let coupons = self.coupons.apply(subtotal, &request.coupon_codes);
        let loyalty =
            redeem_loyalty(self.loyalty.available_points(&request.user_id), subtotal);
        let final_total =
            round_money(subtotal + delivery_fee - coupons.total_discount - loyalty.discount);
        let eta_minutes = request
            .items
            .iter()
            .map(|quote| quote.eta_minutes)
            .min()
            .unwrap_or(DEFAULT_ETA_MINUTES);

        let order_id = format!("order_{}", Uuid::new_v4().simple());
        self.preferences.record_order(&request.user_id, &request.provider, subtotal, eta_minutes);

        let invoice = render_invoice(
            &order_id,
            &self.currency,
            &InvoiceFigures {
                items: request.items.len(),
                subtotal,
                delivery_fee,
                coupon_discount: coupons.total_discount,
                loyalty_discount: loyalty.discount,
                final_total,
                eta_minutes,
            },
        );
        let recommendations = self.preferences.recommendations(&request.user_id);
        let headline = recommendations
            .iter()
            .take(RECOMMENDATIONS_IN_MESSAGE)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            event_name = "checkout.completed",
            user_id = %request.user_id,
            provider = %request.provider,
            order_id = %order_id,
            items = request.items.len(),
            final_total = %final_total,
            applied_coupons = coupons.applied.len(),
            loyalty_points_used = loyalty.points_used,
            "order placed"
        );

        CheckoutResult {
            success: true,
            tracking_url: Some(tracking_url(&request.provider, &order_id)),
            message: format!("Order placed successfully on {}! {headline}", request.provider),
            order_id: Some(order_id),
            eta_minutes: Some(eta_minutes),
            invoice: Some(invoice),
            applied_coupons: coupons.applied,
            invalid_coupons: coupons.invalid,
            loyalty_points_used: loyalty.points_used,
            final_total: Some(final_total),
        }
    }

    pub fn user_preferences(&self, user_id: &str) -> Option<UserPreferences> {
        self.preferences.get(user_id)
    }

    pub fn recommendations(&self, user_id: &str) -> Vec<String> {
        self.preferences.recommendations(user_id)
    }

    fn reject(&self, request: &CheckoutRequest, reason: &str, message: &str) -> CheckoutResult {
        warn!(
            event_name = "checkout.rejected",
            user_id = %request.user_id,
            provider = %request.provider,
            reason,
            "checkout rejected"
        );
        CheckoutResult::rejected(message)
    }
}
