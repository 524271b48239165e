use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::quote::{ProviderId, Quote};

pub const ANONYMOUS_USER: &str = "anonymous";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: String,
    pub provider: ProviderId,
    pub items: Vec<Quote>,
    #[serde(default)]
    pub coupon_codes: Vec<String>,
    #[serde(default)]
    pub payment_token: Option<String>,
}

impl CheckoutRequest {
    pub fn new(user_id: impl Into<String>, provider: ProviderId, items: Vec<Quote>) -> Self {
        Self {
            user_id: user_id.into(),
            provider,
            items,
            coupon_codes: Vec::new(),
            payment_token: None,
        }
    }

    pub fn with_coupons<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.coupon_codes = codes.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub success: bool,
    pub order_id: Option<String>,
    pub message: String,
    pub eta_minutes: Option<u32>,
    pub tracking_url: Option<String>,
    pub invoice: Option<String>,
    pub applied_coupons: Vec<AppliedCoupon>,
    pub invalid_coupons: Vec<String>,
    pub loyalty_points_used: u64,
    pub final_total: Option<Decimal>,
}

impl CheckoutResult {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id: None,
            message: message.into(),
            eta_minutes: None,
            tracking_url: None,
            invoice: None,
            applied_coupons: Vec::new(),
            invalid_coupons: Vec::new(),
            loyalty_points_used: 0,
            final_total: None,
        }
    }
}
