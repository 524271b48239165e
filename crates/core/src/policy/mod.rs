use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const SHOPPER_ROLE: &str = "shopper";
pub const ADMIN_ROLE: &str = "admin";

/// Decides whether an order value needs sign-off from a different role.
pub trait DelegationPolicy: Send + Sync {
    /// Returns the role that must approve, or `None` when `role` may proceed.
    fn check(&self, order_value: Decimal, role: &str) -> Option<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCeiling {
    /// `None` means the role has no ceiling.
    pub max_value: Option<Decimal>,
    pub delegates_to: Option<String>,
}

/// Per-role order-value ceilings. Roles without an entry never delegate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleCeilingPolicy {
    ceilings: BTreeMap<String, RoleCeiling>,
}

impl RoleCeilingPolicy {
    pub fn new(ceilings: BTreeMap<String, RoleCeiling>) -> Self {
        Self { ceilings }
    }

    pub fn with_shopper_ceiling(shopper_ceiling: Decimal) -> Self {
        let mut ceilings = BTreeMap::new();
        ceilings.insert(
            SHOPPER_ROLE.to_string(),
            RoleCeiling {
                max_value: Some(shopper_ceiling),
                delegates_to: Some(ADMIN_ROLE.to_string()),
            },
        );
        ceilings.insert(ADMIN_ROLE.to_string(), RoleCeiling { max_value: None, delegates_to: None });
        Self::new(ceilings)
    }

    pub fn ceiling(&self, role: &str) -> Option<&RoleCeiling> {
        self.ceilings.get(role)
    }
}

impl Default for RoleCeilingPolicy {
    fn default() -> Self {
        Self::with_shopper_ceiling(Decimal::from(1000))
    }
}

impl DelegationPolicy for RoleCeilingPolicy {
    fn check(&self, order_value: Decimal, role: &str) -> Option<String> {
        let ceiling = self.ceilings.get(role)?;
        match ceiling.max_value {
            Some(max_value) if order_value > max_value => ceiling.delegates_to.clone(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{DelegationPolicy, RoleCeilingPolicy};

    #[test]
    fn shopper_above_ceiling_requires_admin() {
        let policy = RoleCeilingPolicy::default();

        assert_eq!(policy.check(Decimal::from(1200), "shopper"), Some("admin".to_string()));
        assert_eq!(policy.check(Decimal::from(1000), "shopper"), None);
    }

    #[test]
    fn admin_has_no_ceiling() {
        let policy = RoleCeilingPolicy::default();

        assert_eq!(policy.check(Decimal::from(1_000_000), "admin"), None);
    }

    #[test]
    fn unknown_roles_never_delegate() {
        let policy = RoleCeilingPolicy::default();

        assert_eq!(policy.check(Decimal::from(50_000), "viewer"), None);
        assert!(policy.ceiling("viewer").is_none());
    }

    #[test]
    fn shopper_ceiling_is_configurable() {
        let policy = RoleCeilingPolicy::with_shopper_ceiling(Decimal::from(250));

        assert_eq!(policy.check(Decimal::from(300), "shopper"), Some("admin".to_string()));
    }
}
