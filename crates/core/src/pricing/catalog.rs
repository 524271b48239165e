use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fuzzy matching is skipped for names shorter than this many characters.
pub const MIN_FUZZY_MATCH_LEN: usize = 3;

const GROCERY_CATALOG: &[(&str, i64, &str, &str)] = &[
    ("rice", 45, "staples", "kg"),
    ("wheat flour", 35, "staples", "kg"),
    ("dal", 120, "staples", "kg"),
    ("sugar", 42, "staples", "kg"),
    ("salt", 20, "staples", "kg"),
    ("oil", 140, "staples", "liter"),
    ("milk", 60, "dairy", "liter"),
    ("curd", 45, "dairy", "kg"),
    ("butter", 55, "dairy", "100g"),
    ("cheese", 200, "dairy", "200g"),
    ("paneer", 300, "dairy", "250g"),
    ("tomato", 40, "vegetables", "kg"),
    ("onion", 30, "vegetables", "kg"),
    ("potato", 25, "vegetables", "kg"),
    ("carrot", 50, "vegetables", "kg"),
    ("cabbage", 35, "vegetables", "kg"),
    ("spinach", 20, "vegetables", "bunch"),
    ("coriander", 15, "vegetables", "bunch"),
    ("banana", 60, "fruits", "dozen"),
    ("apple", 180, "fruits", "kg"),
    ("orange", 80, "fruits", "kg"),
    ("mango", 120, "fruits", "kg"),
    ("grapes", 150, "fruits", "kg"),
    ("turmeric", 200, "spices", "100g"),
    ("cumin", 300, "spices", "100g"),
    ("coriander powder", 150, "spices", "100g"),
    ("garam masala", 180, "spices", "100g"),
    ("chili powder", 120, "spices", "100g"),
    ("tea", 200, "beverages", "250g"),
    ("coffee", 300, "beverages", "200g"),
    ("soft drink", 35, "beverages", "500ml"),
    ("juice", 80, "beverages", "1L"),
    ("biscuits", 25, "snacks", "100g"),
    ("chips", 20, "snacks", "50g"),
    ("bread", 30, "bakery", "loaf"),
    ("eggs", 60, "dairy", "dozen"),
    ("frozen peas", 80, "frozen", "500g"),
    ("pasta", 60, "packaged", "500g"),
    ("noodles", 15, "packaged", "packet"),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub base_price: Decimal,
    pub category: String,
    pub unit: String,
}

impl CatalogEntry {
    pub fn new(
        name: impl Into<String>,
        base_price: Decimal,
        category: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().to_lowercase(),
            base_price,
            category: category.into(),
            unit: unit.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogMatch<'a> {
    pub entry: &'a CatalogEntry,
    pub kind: MatchKind,
}

/// Static item table, kept in declaration order so fuzzy resolution is stable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn grocery() -> Self {
        Self::new(
            GROCERY_CATALOG
                .iter()
                .map(|(name, price, category, unit)| {
                    CatalogEntry::new(*name, Decimal::from(*price), *category, *unit)
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        let key = name.trim().to_lowercase();
        self.entries.iter().find(|entry| entry.name == key)
    }

    pub fn resolve(&self, name: &str) -> Option<CatalogMatch<'_>> {
        if let Some(entry) = self.lookup(name) {
            return Some(CatalogMatch { entry, kind: MatchKind::Exact });
        }

        let needle = name.trim().to_lowercase();
        if needle.chars().count() < MIN_FUZZY_MATCH_LEN {
            return None;
        }

        self.entries
            .iter()
            .find(|entry| {
                needle.contains(entry.name.as_str())
                    || entry.name.contains(needle.as_str())
                    || entry.name.split_whitespace().any(|token| needle.contains(token))
            })
            .map(|entry| CatalogMatch { entry, kind: MatchKind::Fuzzy })
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !categories.contains(&entry.category.as_str()) {
                categories.push(entry.category.as_str());
            }
        }
        categories
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::grocery()
    }
}
