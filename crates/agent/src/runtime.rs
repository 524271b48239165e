use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use cartscout_core::cart::CartLedger;
use cartscout_core::domain::cart::CartSummary;
use cartscout_core::domain::checkout::CheckoutRequest;
use cartscout_core::domain::item::{Item, PriceQuery};
use cartscout_core::overseer::{Overseer, WorkflowResult};
use cartscout_core::{AppConfig, ApplicationError, ProviderId};
use serde::Serialize;
use tracing::info;

use crate::guardrails::{ItemGuardrail, ScreenedItems};
use crate::identity::{
    resolve_within, AnonymousResolver, IdentityResolver, ResolvedIdentity, SignedTokenResolver,
};
use crate::llm::LlmClient;
use crate::parser::{LlmItemParser, ParsedItem, PatternItemParser, ResilientItemParser, TextItemParser};

pub const DEFAULT_TEXT_PROVIDER: &str = "instacart";
pub const DEFAULT_IDENTITY_TIMEOUT: Duration = Duration::from_millis(1000);

/// Storefront names recognized in free text, checked in this order.
const PROVIDER_HINTS: [&str; 6] =
    ["instacart", "amazon_fresh", "uber_eats", "bigbasket", "instamart", "blinkit"];

/// Storefront ids that are sold through another provider's strategy.
fn canonical_provider(platform: &str) -> String {
    let platform = platform.trim().to_lowercase().replace(' ', "_");
    match platform.as_str() {
        "instamart" => DEFAULT_TEXT_PROVIDER.to_string(),
        _ => platform,
    }
}

fn infer_provider(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    PROVIDER_HINTS
        .into_iter()
        .find(|hint| lower.contains(hint) || lower.contains(&hint.replace('_', " ")))
}

#[derive(Clone, Debug, Serialize)]
pub struct TextQuote {
    pub screened: ScreenedItems,
    pub workflow: WorkflowResult,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ParseAddOutcome {
    pub provider: String,
    pub cart: CartSummary,
    pub added_items: Vec<ParsedItem>,
    pub unavailable_items: Vec<String>,
    pub unavailable_platforms: Vec<String>,
    pub available_platforms: Vec<String>,
    pub rejected: Vec<String>,
    pub adjustments: Vec<String>,
}

/// Free-text front end over the overseer and the shared cart ledger.
pub struct AgentRuntime {
    overseer: Arc<Overseer>,
    parser: Arc<dyn TextItemParser>,
    guardrail: ItemGuardrail,
    identity: Arc<dyn IdentityResolver>,
    identity_timeout: Duration,
    ledger: CartLedger,
}

impl AgentRuntime {
    pub fn new(overseer: Arc<Overseer>, parser: Arc<dyn TextItemParser>) -> Self {
        Self {
            overseer,
            parser,
            guardrail: ItemGuardrail::default(),
            identity: Arc::new(AnonymousResolver),
            identity_timeout: DEFAULT_IDENTITY_TIMEOUT,
            ledger: CartLedger::new(),
        }
    }

    /// Without a model client the pattern extractor is the only parser.
    pub fn from_config(config: &AppConfig, llm: Option<Arc<dyn LlmClient>>) -> Result<Self> {
        let overseer = Overseer::from_config(config).map_err(ApplicationError::from)?;
        let parser: Arc<dyn TextItemParser> = match llm {
            Some(client) => Arc::new(ResilientItemParser::new(
                Arc::new(LlmItemParser::new(client)),
                Duration::from_millis(config.parser.timeout_ms),
            )),
            None => Arc::new(PatternItemParser),
        };

        Ok(Self::new(Arc::new(overseer), parser)
            .with_identity(
                Arc::new(SignedTokenResolver::from_config(&config.identity)),
                Duration::from_millis(config.identity.timeout_ms),
            ))
    }

    pub fn with_identity(mut self, resolver: Arc<dyn IdentityResolver>, timeout: Duration) -> Self {
        self.identity = resolver;
        self.identity_timeout = timeout;
        self
    }

    pub fn with_guardrail(mut self, guardrail: ItemGuardrail) -> Self {
        self.guardrail = guardrail;
        self
    }

    pub fn with_ledger(mut self, ledger: CartLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn overseer(&self) -> &Overseer {
        &self.overseer
    }

    pub fn ledger(&self) -> &CartLedger {
        &self.ledger
    }

    pub async fn resolve_identity(&self, token: Option<&str>) -> ResolvedIdentity {
        resolve_within(self.identity.as_ref(), token, self.identity_timeout).await
    }

    pub async fn parse_items(&self, text: &str) -> Result<ScreenedItems> {
        let parsed = self.parser.parse(text).await?;
        Ok(self.guardrail.screen(parsed))
    }

    pub async fn quote_text(&self, text: &str) -> Result<TextQuote> {
        self.run_text(text, None).await
    }

    /// Parses `text` and runs the full workflow. A checkout request, when given, is
    /// completed against the best cart option.
    pub async fn run_text(&self, text: &str, checkout: Option<CheckoutRequest>) -> Result<TextQuote> {
        let screened = self.parse_items(text).await?;
        if screened.accepted.is_empty() {
            return Err(ApplicationError::InvalidInput(format!(
                "no grocery items found in `{}`",
                text.trim()
            ))
            .into());
        }

        let query = PriceQuery::new(screened.accepted.iter().map(to_item).collect());
        let workflow = self.overseer.execute_workflow(&query, checkout);
        Ok(TextQuote { screened, workflow })
    }

    /// Adds every parsed item to `user_id`'s cart at the provider named in the text.
    pub async fn parse_and_add(&self, user_id: &str, text: &str) -> Result<ParseAddOutcome> {
        if text.trim().is_empty() {
            return Ok(ParseAddOutcome {
                provider: DEFAULT_TEXT_PROVIDER.to_string(),
                cart: self.ledger.get(user_id),
                ..ParseAddOutcome::default()
            });
        }

        let screened = self.parse_items(text).await?;
        let provider = screened
            .platform
            .as_deref()
            .map(canonical_provider)
            .or_else(|| infer_provider(text).map(canonical_provider))
            .unwrap_or_else(|| DEFAULT_TEXT_PROVIDER.to_string());
        let provider_id = ProviderId::new(provider.as_str());

        let mut outcome = ParseAddOutcome {
            provider: provider.clone(),
            rejected: screened.rejected,
            adjustments: screened.adjustments,
            ..ParseAddOutcome::default()
        };
        let mut unavailable_platforms = BTreeSet::new();
        let mut available_platforms = BTreeSet::new();

        for item in &screened.accepted {
            let prices = self.overseer.scout().aggregate_prices(&PriceQuery::new(vec![to_item(item)]));
            let quotes = prices.items.into_iter().next().map(|priced| priced.quotes).unwrap_or_default();
            if quotes.is_empty() {
                outcome.unavailable_items.push(item.name.clone());
                continue;
            }
            available_platforms.extend(quotes.iter().map(|quote| quote.provider.to_string()));

            let Some(mut quote) = quotes.into_iter().find(|quote| quote.provider == provider_id)
            else {
                unavailable_platforms.insert(provider.clone());
                continue;
            };
            quote.metadata.unit = Some(item.unit.clone());
            self.ledger.add_or_update(user_id, &quote, i64::from(item.quantity));
            outcome.added_items.push(item.clone());
        }

        outcome.cart = self.ledger.get(user_id);
        outcome.unavailable_platforms = unavailable_platforms.into_iter().collect();
        outcome.available_platforms = available_platforms.into_iter().collect();

        info!(
            event_name = "cart.parse_add",
            user_id,
            provider = %provider,
            added = outcome.added_items.len(),
            unavailable_items = outcome.unavailable_items.len(),
            rejected = outcome.rejected.len(),
            "parsed text into cart"
        );
        Ok(outcome)
    }
}

fn to_item(item: &ParsedItem) -> Item {
    Item::named(item.name.clone()).with_quantity(item.quantity, item.unit.clone())
}
