//! Free-text front end for CartScout.
//!
//! Text goes through a [`parser::TextItemParser`], is screened by
//! [`guardrails::ItemGuardrail`], and is then priced by the core overseer. The model only
//! turns text into item names, quantities and units. Prices, carts and checkout decisions
//! stay in `cartscout-core`.
//!
//! [`runtime::AgentRuntime`] ties the pieces together and owns the per-user cart ledger.
//! Callers identify themselves with a bearer token resolved by [`identity::IdentityResolver`].

pub mod guardrails;
pub mod identity;
pub mod llm;
pub mod parser;
pub mod runtime;

pub use guardrails::{ItemGuardrail, ScreenedItems};
pub use identity::{IdentityResolver, ResolvedIdentity, SignedTokenResolver};
pub use llm::LlmClient;
pub use parser::{LlmItemParser, ParsedItem, PatternItemParser, ResilientItemParser, TextItemParser};
pub use runtime::{AgentRuntime, ParseAddOutcome, TextQuote};
