use serde::{Deserialize, Serialize};

/// A requested grocery item. Only `name` is required; the rest narrows pricing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub preferred_brand: Option<String>,
}

impl Item {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), quantity: None, unit: None, category: None, preferred_brand: None }
    }

    pub fn with_quantity(mut self, quantity: u32, unit: impl Into<String>) -> Self {
        self.quantity = Some(quantity);
        self.unit = Some(unit.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.preferred_brand = Some(brand.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PriceQuery {
    pub items: Vec<Item>,
    #[serde(default)]
    pub location_pin: Option<String>,
}

impl PriceQuery {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, location_pin: None }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(Item::named).collect())
    }
}
