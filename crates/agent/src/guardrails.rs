use serde::Serialize;

use crate::parser::{ParsedItem, ParsedItems, DEFAULT_UNIT};

pub const MIN_NAME_LETTERS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow(ParsedItem),
    Degrade { item: ParsedItem, reason_code: &'static str, user_message: String },
    Deny { reason_code: &'static str, user_message: String },
}

/// Items that survived screening plus what was changed or dropped on the way.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScreenedItems {
    pub platform: Option<String>,
    pub accepted: Vec<ParsedItem>,
    pub adjustments: Vec<String>,
    pub rejected: Vec<String>,
}

/// Checks parser output before anything is priced. Parsers never get to invent
/// units or zero quantities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemGuardrail {
    pub min_name_letters: usize,
}

impl Default for ItemGuardrail {
    fn default() -> Self {
        Self { min_name_letters: MIN_NAME_LETTERS }
    }
}

impl ItemGuardrail {
    pub fn evaluate(&self, item: &ParsedItem) -> GuardrailDecision {
        let name = item.name.trim().to_lowercase();
        let letters = name.chars().filter(|ch| ch.is_alphabetic()).count();
        if letters < self.min_name_letters {
            return GuardrailDecision::Deny {
                reason_code: "item_name_too_short",
                user_message: format!("Skipped `{}`: not a recognizable grocery item.", item.name),
            };
        }

        let unit = normalize_unit(&item.unit);
        let quantity = item.quantity.max(1);
        let cleaned = ParsedItem::new(name, quantity, unit.unwrap_or(DEFAULT_UNIT));

        if unit.is_none() {
            return GuardrailDecision::Degrade {
                user_message: format!(
                    "Unit `{}` for {} is not supported; using {DEFAULT_UNIT}.",
                    item.unit, cleaned.name
                ),
                item: cleaned,
                reason_code: "unit_unrecognized",
            };
        }
        if item.quantity == 0 {
            return GuardrailDecision::Degrade {
                user_message: format!("Quantity for {} was missing; using 1.", cleaned.name),
                item: cleaned,
                reason_code: "quantity_floored",
            };
        }
        GuardrailDecision::Allow(cleaned)
    }

    pub fn screen(&self, parsed: ParsedItems) -> ScreenedItems {
        let mut screened = ScreenedItems { platform: parsed.platform, ..ScreenedItems::default() };
        for item in &parsed.items {
            match self.evaluate(item) {
                GuardrailDecision::Allow(item) => screened.accepted.push(item),
                GuardrailDecision::Degrade { item, user_message, .. } => {
                    screened.accepted.push(item);
                    screened.adjustments.push(user_message);
                }
                GuardrailDecision::Deny { .. } => screened.rejected.push(item.name.clone()),
            }
        }
        screened
    }
}

/// Canonical spelling for a unit, or `None` when the unit is unknown.
pub fn normalize_unit(unit: &str) -> Option<&'static str> {
    let unit = unit.trim().to_lowercase();
    let normalized = match unit.as_str() {
        "kg" | "kgs" | "kilogram" | "kilograms" => "kg",
        "g" | "gm" | "gms" | "gram" | "grams" => "g",
        "l" | "ltr" | "litre" | "litres" | "liter" | "liters" => "liter",
        "ml" => "ml",
        "" | "pc" | "pcs" | "piece" | "pieces" => "piece",
        "dozen" | "dozens" => "dozen",
        "packet" | "packets" => "packet",
        "pack" | "packs" => "pack",
        "bunch" | "bunches" => "bunch",
        "loaf" | "loaves" => "loaf",
        _ => return None,
    };
    Some(normalized)
}
