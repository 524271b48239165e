//! Free text to structured grocery items.
//!
//! `LlmItemParser` asks a model for a strict JSON reply. `PatternItemParser` is the
//! deterministic extractor. `ResilientItemParser` bounds the primary parser with a
//! timeout and falls back to the pattern extractor on error or timeout.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::{json_object_span, LlmClient};

pub const DEFAULT_UNIT: &str = "piece";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedItem {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
}

impl ParsedItem {
    pub fn new(name: impl Into<String>, quantity: u32, unit: impl Into<String>) -> Self {
        Self { name: name.into(), quantity, unit: unit.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedItems {
    /// Storefront named in the text, lowercase and unmapped (`instamart` stays `instamart`).
    pub platform: Option<String>,
    pub items: Vec<ParsedItem>,
}

#[async_trait]
pub trait TextItemParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParsedItems>;
}

pub struct LlmItemParser {
    client: Arc<dyn LlmClient>,
}

impl LlmItemParser {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct ReplyItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    quantity: Option<f64>,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    items: Vec<ReplyItem>,
}

#[async_trait]
impl TextItemParser for LlmItemParser {
    async fn parse(&self, text: &str) -> Result<ParsedItems> {
        let reply = self.client.complete(&parse_prompt(text)).await?;
        let body = json_object_span(&reply)
            .ok_or_else(|| anyhow!("model reply did not contain a JSON object"))?;
        let reply: Reply =
            serde_json::from_str(body).context("model reply did not match the item schema")?;

        let items = reply
            .items
            .into_iter()
            .map(|item| {
                let quantity = item.quantity.map(|value| value.round()).unwrap_or(1.0);
                ParsedItem {
                    name: item.name.trim().to_lowercase(),
                    quantity: if quantity < 1.0 { 0 } else { quantity.min(u32::MAX as f64) as u32 },
                    unit: item
                        .unit
                        .map(|unit| unit.trim().to_lowercase())
                        .filter(|unit| !unit.is_empty())
                        .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
                }
            })
            .collect();

        Ok(ParsedItems {
            platform: reply
                .platform
                .map(|platform| platform.trim().to_lowercase())
                .filter(|platform| !platform.is_empty()),
            items,
        })
    }
}

fn parse_prompt(text: &str) -> String {
    format!(
        r#"You are a precise parser for grocery shopping inputs.
Extract every grocery item with its quantity and unit from the user text.

Input: "{text}"

Rules:
- Units must be one of: kg, g, liter, ml, piece, dozen, packet, pack, bunch, loaf. Use the singular form.
- Quantity is an integer. Round decimals. Default to 1 with unit "piece" when no quantity is given.
- Item names are lowercase grocery nouns such as "rice" or "milk". Never return a single letter or a fragment of a unit word.
- In "X liters of Y" or "X kg of Y" the item is Y.
- If the text names a platform (instamart, instacart, amazon fresh, uber eats, blinkit, bigbasket), return it lowercase as "platform" without mapping it. Otherwise null.

Reply only with JSON in this shape:
{{"platform": null, "items": [{{"name": "rice", "quantity": 2, "unit": "kg"}}]}}"#
    )
}

/// Regex extractor for phrases like `5 kg of rice` or `2 liters milk`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PatternItemParser;

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Longest unit spellings first, and a word boundary after the unit, so `2 lemons`
    // is not read as unit `l` plus item `emons`.
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(\d+)\s*(?:(kilograms|kg|grams|g|liters|liter|ml|l|pieces|piece|pcs)\b)?\s*(?:of\s+)?([a-zA-Z_]+)",
        )
        .expect("item pattern is a valid regex")
    })
}

impl PatternItemParser {
    pub fn extract(&self, text: &str) -> ParsedItems {
        let normalized = text.to_lowercase().replace(" and ", ",");
        let items = item_pattern()
            .captures_iter(&normalized)
            .filter_map(|captures| {
                let quantity = captures.get(1)?.as_str().parse::<u32>().ok()?;
                let unit = captures.get(2).map(|unit| unit.as_str()).unwrap_or(DEFAULT_UNIT);
                let name = captures.get(3)?.as_str();
                Some(ParsedItem::new(name, quantity, unit))
            })
            .collect();
        ParsedItems { platform: None, items }
    }
}

#[async_trait]
impl TextItemParser for PatternItemParser {
    async fn parse(&self, text: &str) -> Result<ParsedItems> {
        Ok(self.extract(text))
    }
}

pub struct ResilientItemParser {
    primary: Arc<dyn TextItemParser>,
    fallback: PatternItemParser,
    timeout: Duration,
}

impl ResilientItemParser {
    pub fn new(primary: Arc<dyn TextItemParser>, timeout: Duration) -> Self {
        Self { primary, fallback: PatternItemParser, timeout }
    }
}

#[async_trait]
impl TextItemParser for ResilientItemParser {
    async fn parse(&self, text: &str) -> Result<ParsedItems> {
        let reason = match tokio::time::timeout(self.timeout, self.primary.parse(text)).await {
            Ok(Ok(parsed)) => return Ok(parsed),
            Ok(Err(error)) => format!("primary parser failed: {error:#}"),
            Err(_) => format!("primary parser timed out after {} ms", self.timeout.as_millis()),
        };

        warn!(event_name = "parser.fallback_used", reason = %reason, "using pattern extractor");
        self.fallback.parse(text).await
    }
}
