use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::checkout::AppliedCoupon;
use crate::domain::money::round_money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub discount_fraction: Decimal,
    pub min_order: Decimal,
    pub max_discount: Decimal,
}

impl Coupon {
    pub fn new(code: &str, percent: i64, min_order: i64, max_discount: i64) -> Self {
        Self {
            code: code.to_uppercase(),
            discount_fraction: Decimal::new(percent, 2),
            min_order: Decimal::from(min_order),
            max_discount: Decimal::from(max_discount),
        }
    }

    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        (subtotal * self.discount_fraction).min(self.max_discount)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponOutcome {
    pub total_discount: Decimal,
    pub applied: Vec<AppliedCoupon>,
    pub invalid: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CouponRegistry {
    coupons: Vec<Coupon>,
}

impl CouponRegistry {
    pub fn new(coupons: Vec<Coupon>) -> Self {
        Self { coupons }
    }

    pub fn get(&self, code: &str) -> Option<&Coupon> {
        let code = code.trim().to_uppercase();
        self.coupons.iter().find(|coupon| coupon.code == code)
    }

    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Valid codes stack additively; every rejected code is reported with its reason.
    pub fn apply(&self, subtotal: Decimal, codes: &[String]) -> CouponOutcome {
        let mut outcome = CouponOutcome::default();
        for code in codes {
            match self.get(code) {
                Some(coupon) if subtotal >= coupon.min_order => {
                    let discount = round_money(coupon.discount_for(subtotal));
                    outcome.total_discount += discount;
                    outcome.applied.push(AppliedCoupon { code: coupon.code.clone(), discount });
                }
                Some(coupon) => outcome
                    .invalid
                    .push(format!("{code}: Minimum order {} required", coupon.min_order)),
                None => outcome.invalid.push(format!("{code}: Invalid coupon code")),
            }
        }
        outcome
    }
}

impl Default for CouponRegistry {
    fn default() -> Self {
        Self::new(vec![
            Coupon::new("WELCOME20", 20, 100, 50),
            Coupon::new("FRESH15", 15, 200, 75),
            Coupon::new("BULK25", 25, 500, 150),
            Coupon::new("INSTANT10", 10, 50, 25),
        ])
    }
}
