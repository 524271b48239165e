pub mod audit;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod overseer;
pub mod policy;
pub mod pricing;
pub mod scout;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use cart::{CartBuilder, CartLedger};
pub use checkout::OrderExecutor;
pub use config::{AppConfig, ConfigError, LoadOptions};
pub use domain::cart::{CartOption, CartPlan, CartSummary};
pub use domain::checkout::{CheckoutRequest, CheckoutResult};
pub use domain::item::{Item, PriceQuery};
pub use domain::price::PriceResult;
pub use domain::quote::{ProviderId, Quote};
pub use errors::{ApplicationError, DomainError};
pub use overseer::{HealthStatus, Overseer, OverseerError, StageError, WorkflowResult};
pub use pricing::{catalog::Catalog, strategy::StrategyRegistry, ProviderAdapter};
pub use scout::DealScout;
