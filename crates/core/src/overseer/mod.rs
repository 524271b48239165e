//! Runs the scout, cart and checkout stages as one monitored workflow and keeps the
//! run history used for health and analytics reporting.

pub mod history;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink, TracingAuditSink};
use crate::cart::CartBuilder;
use crate::checkout::{FixedLoyalty, OrderExecutor};
use crate::config::{AppConfig, ConfigError};
use crate::domain::cart::{CartOption, CartPlan};
use crate::domain::checkout::{CheckoutRequest, CheckoutResult};
use crate::domain::item::PriceQuery;
use crate::domain::money::round_money;
use crate::domain::price::PriceResult;
use crate::domain::quote::{ProviderId, Quote};
use crate::flows::{
    FlowAction, FlowEngine, FlowTransitionError, ShoppingFlow, WorkflowEvent, WorkflowState,
};
use crate::policy::{RoleCeilingPolicy, SHOPPER_ROLE};
use crate::pricing::catalog::Catalog;
use crate::scout::DealScout;

pub use history::{
    AgentMetrics, AgentPerformance, AgentPerformanceHistory, HealthStatus, WorkflowAnalytics,
    WorkflowHistory, WorkflowRecord, WorkflowStats, CART_BUILDER_AGENT, DEAL_SCOUT_AGENT,
    ORDER_EXECUTOR_AGENT,
};

const SLOW_STAGE_MS: f64 = 5000.0;
const HIGH_SAVINGS: i64 = 100;
const LOW_SAVINGS: i64 = 20;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StageError {
    #[error("cart builder produced no options")]
    EmptyCart,
    #[error("checkout requested without a checkout request")]
    MissingCheckoutRequest,
    #[error(transparent)]
    Flow(#[from] FlowTransitionError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OverseerError {
    #[error("retrying workflow `{0}` is not supported")]
    RetryUnsupported(String),
}

/// How many units of work a stage result represents.
pub trait StageOutput {
    fn items_processed(&self) -> usize;
}

impl StageOutput for PriceResult {
    fn items_processed(&self) -> usize {
        self.items.len()
    }
}

impl StageOutput for CartPlan {
    fn items_processed(&self) -> usize {
        self.options.len()
    }
}

impl StageOutput for CheckoutResult {
    fn items_processed(&self) -> usize {
        0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub state: WorkflowState,
    pub success: bool,
    pub price_result: Option<PriceResult>,
    pub cart_plan: Option<CartPlan>,
    pub final_order: Option<CheckoutResult>,
    pub agent_metrics: Vec<AgentMetrics>,
    pub total_execution_time_ms: f64,
    pub total_cost_savings: Decimal,
    pub recommendations: Vec<String>,
    pub errors: Vec<String>,
}

/// Outputs gathered so far; survives a failed stage so partial results can be returned.
#[derive(Debug)]
struct Run {
    state: WorkflowState,
    metrics: Vec<AgentMetrics>,
    price_result: Option<PriceResult>,
    cart_plan: Option<CartPlan>,
    final_order: Option<CheckoutResult>,
}

pub struct Overseer {
    scout: DealScout,
    cart_builder: CartBuilder,
    executor: OrderExecutor,
    flow: FlowEngine<ShoppingFlow>,
    audit: Arc<dyn AuditSink>,
    history: WorkflowHistory,
    performance: AgentPerformanceHistory,
    default_role: String,
    health_window: usize,
}

impl Overseer {
    pub fn new(scout: DealScout, executor: OrderExecutor) -> Self {
        Self {
            scout,
            cart_builder: CartBuilder::new(),
            executor,
            flow: FlowEngine::default(),
            audit: Arc::new(TracingAuditSink),
            history: WorkflowHistory::default(),
            performance: AgentPerformanceHistory::new(),
            default_role: SHOPPER_ROLE.to_string(),
            health_window: history::DEFAULT_HEALTH_WINDOW,
        }
    }

    /// Wires the built-in catalog and the configured providers, ceiling, loyalty balance
    /// and history sizing.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let registry = Arc::new(config.strategy_registry()?);
        let catalog = Arc::new(Catalog::grocery());
        let currency = config.pricing.currency.clone();

        let scout = DealScout::with_registry(registry, catalog, currency.clone());
        let executor = OrderExecutor::new(currency)
            .with_loyalty(Arc::new(FixedLoyalty(config.checkout.default_loyalty_points)))
            .with_delegation(Arc::new(RoleCeilingPolicy::with_shopper_ceiling(
                config.checkout.shopper_order_ceiling,
            )));

        Ok(Self::new(scout, executor)
            .with_history(WorkflowHistory::new(config.overseer.history_limit))
            .with_performance(AgentPerformanceHistory::with_limit(config.overseer.history_limit))
            .with_default_role(config.overseer.default_role.clone())
            .with_health_window(config.overseer.health_window))
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_history(mut self, history: WorkflowHistory) -> Self {
        self.history = history;
        self
    }

    pub fn with_performance(mut self, performance: AgentPerformanceHistory) -> Self {
        self.performance = performance;
        self
    }

    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = role.into();
        self
    }

    pub fn with_health_window(mut self, window: usize) -> Self {
        self.health_window = window.max(1);
        self
    }

    pub fn scout(&self) -> &DealScout {
        &self.scout
    }

    pub fn executor(&self) -> &OrderExecutor {
        &self.executor
    }

    pub fn history(&self) -> &WorkflowHistory {
        &self.history
    }

    pub fn performance(&self) -> &AgentPerformanceHistory {
        &self.performance
    }

    pub fn execute_workflow(
        &self,
        query: &PriceQuery,
        checkout: Option<CheckoutRequest>,
    ) -> WorkflowResult {
        let started = Instant::now();
        let workflow_id = format!("wf_{}", Uuid::new_v4().simple());
        let audit = AuditContext::for_workflow(
            workflow_id.clone(),
            checkout.as_ref().map(|request| request.user_id.clone()),
        );

        let mut run = Run {
            state: self.flow.initial_state(),
            metrics: Vec::new(),
            price_result: None,
            cart_plan: None,
            final_order: None,
        };

        let outcome = self.drive(&mut run, query, checkout, &audit);
        let mut errors = Vec::new();
        if let Err(error) = &outcome {
            errors.push(format!("Workflow failed: {error}"));
            run.state = self
                .flow
                .apply_with_audit(run.state, &WorkflowEvent::StageFailed, self.audit.as_ref(), &audit)
                .map(|transition| transition.to)
                .unwrap_or(WorkflowState::Failed);
        }
        let success = outcome.is_ok();

        let best_option = run.cart_plan.as_ref().and_then(CartPlan::best_option);
        let total_cost_savings = match (&run.price_result, best_option) {
            (Some(prices), Some(best)) if success => cost_savings(&prices.quotes(), best),
            _ => Decimal::ZERO,
        };
        let recommendations = workflow_recommendations(
            success,
            &run.metrics,
            total_cost_savings,
            run.cart_plan.as_ref(),
        );
        let total_execution_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        self.history.record(WorkflowRecord {
            workflow_id: workflow_id.clone(),
            timestamp: Utc::now(),
            success,
            execution_time_ms: total_execution_time_ms,
            cost_savings: total_cost_savings,
            errors: errors.clone(),
        });
        self.performance.record_all(&run.metrics);

        let outcome_kind = if success { AuditOutcome::Success } else { AuditOutcome::Failed };
        self.audit.emit(
            audit
                .event("workflow.completed", AuditCategory::Workflow, outcome_kind)
                .with_metadata("state", format!("{:?}", run.state))
                .with_metadata("cost_savings", total_cost_savings.to_string()),
        );
        info!(
            event_name = "workflow.completed",
            correlation_id = %workflow_id,
            success,
            state = ?run.state,
            elapsed_ms = total_execution_time_ms,
            cost_savings = %total_cost_savings,
            "workflow finished"
        );

        WorkflowResult {
            workflow_id,
            state: run.state,
            success,
            price_result: run.price_result,
            cart_plan: run.cart_plan,
            final_order: run.final_order,
            agent_metrics: run.metrics,
            total_execution_time_ms,
            total_cost_savings,
            recommendations,
            errors,
        }
    }

    /// Runs whatever the flow asks for next until it reaches a terminal state.
    fn drive(
        &self,
        run: &mut Run,
        query: &PriceQuery,
        mut checkout: Option<CheckoutRequest>,
        audit: &AuditContext,
    ) -> Result<(), StageError> {
        let mut actions = self.advance(run, WorkflowEvent::Start, audit)?;

        while let Some(action) = actions.first().cloned() {
            let event = match action {
                FlowAction::AggregatePrices => {
                    let prices =
                        self.monitor(run, DEAL_SCOUT_AGENT, AuditCategory::Scouting, audit, || {
                            Ok(self.scout.aggregate_prices(query))
                        })?;
                    run.price_result = Some(prices);
                    WorkflowEvent::PricesAggregated
                }
                FlowAction::BuildCart => {
                    let quotes =
                        run.price_result.as_ref().map(PriceResult::quotes).unwrap_or_default();
                    let plan = self.monitor(run, CART_BUILDER_AGENT, AuditCategory::Cart, audit, || {
                        let plan = self.cart_builder.build_cart(&quotes);
                        if plan.options.is_empty() {
                            Err(StageError::EmptyCart)
                        } else {
                            Ok(plan)
                        }
                    })?;
                    run.cart_plan = Some(plan);
                    WorkflowEvent::CartBuilt { checkout_requested: checkout.is_some() }
                }
                FlowAction::ExecuteCheckout => {
                    let mut request = checkout.take().ok_or(StageError::MissingCheckoutRequest)?;
                    let best = run
                        .cart_plan
                        .as_ref()
                        .and_then(CartPlan::best_option)
                        .cloned()
                        .ok_or(StageError::EmptyCart)?;
                    request.provider = best.provider;
                    request.items = best.quotes;
                    let order =
                        self.monitor(run, ORDER_EXECUTOR_AGENT, AuditCategory::Checkout, audit, || {
                            Ok(self.executor.checkout(&request, &self.default_role))
                        })?;
                    run.final_order = Some(order);
                    WorkflowEvent::CheckoutFinished
                }
                FlowAction::RecordHistory => break,
            };
            actions = self.advance(run, event, audit)?;
        }

        Ok(())
    }

    fn advance(
        &self,
        run: &mut Run,
        event: WorkflowEvent,
        audit: &AuditContext,
    ) -> Result<Vec<FlowAction>, StageError> {
        let transition =
            self.flow.apply_with_audit(run.state, &event, self.audit.as_ref(), audit)?;
        run.state = transition.to;
        Ok(transition.actions)
    }

    /// Times one stage call and records its metrics whether it succeeds or not.
    fn monitor<T, F>(
        &self,
        run: &mut Run,
        agent: &str,
        category: AuditCategory,
        audit: &AuditContext,
        stage: F,
    ) -> Result<T, StageError>
    where
        T: StageOutput,
        F: FnOnce() -> Result<T, StageError>,
    {
        let started = Instant::now();
        let result = stage();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(output) => {
                let items_processed = output.items_processed();
                info!(
                    event_name = "workflow.stage_completed",
                    correlation_id = %audit.correlation_id,
                    agent,
                    elapsed_ms,
                    items_processed,
                    "stage completed"
                );
                self.audit.emit(
                    audit
                        .event("workflow.stage_completed", category, AuditOutcome::Success)
                        .with_metadata("agent", agent)
                        .with_metadata("items_processed", items_processed.to_string()),
                );
                run.metrics.push(AgentMetrics {
                    agent_name: agent.to_string(),
                    execution_time_ms: elapsed_ms,
                    success: true,
                    error_message: None,
                    items_processed,
                });
            }
            Err(error) => {
                warn!(
                    event_name = "workflow.stage_failed",
                    correlation_id = %audit.correlation_id,
                    agent,
                    elapsed_ms,
                    error = %error,
                    "stage failed"
                );
                self.audit.emit(
                    audit
                        .event("workflow.stage_failed", category, AuditOutcome::Failed)
                        .with_metadata("agent", agent)
                        .with_metadata("error", error.to_string()),
                );
                run.metrics.push(AgentMetrics {
                    agent_name: agent.to_string(),
                    execution_time_ms: elapsed_ms,
                    success: false,
                    error_message: Some(error.to_string()),
                    items_processed: 0,
                });
            }
        }

        result
    }

    pub fn agent_health_status(&self) -> BTreeMap<String, HealthStatus> {
        self.performance.health(self.health_window)
    }

    pub fn workflow_analytics(&self) -> WorkflowAnalytics {
        WorkflowAnalytics::collect(&self.history, &self.performance, self.health_window)
    }

    pub fn retry_failed_workflow(&self, workflow_id: &str) -> Result<WorkflowResult, OverseerError> {
        Err(OverseerError::RetryUnsupported(workflow_id.to_string()))
    }

    pub fn reset(&self) {
        self.history.reset();
        self.performance.reset();
    }
}

/// Most expensive single-provider basket (sum of unit prices plus its highest fee) minus
/// the chosen option's total, floored at zero.
pub fn cost_savings(quotes: &[Quote], chosen: &CartOption) -> Decimal {
    let mut baskets: Vec<(ProviderId, Decimal, Decimal)> = Vec::new();
    for quote in quotes {
        match baskets.iter_mut().find(|(provider, _, _)| provider == &quote.provider) {
            Some((_, sum, fee)) => {
                *sum += quote.unit_price;
                *fee = (*fee).max(quote.delivery_fee);
            }
            None => baskets.push((quote.provider.clone(), quote.unit_price, quote.delivery_fee)),
        }
    }

    let Some(most_expensive) = baskets.iter().map(|(_, sum, fee)| *sum + *fee).max() else {
        return Decimal::ZERO;
    };
    round_money((most_expensive - chosen.total).max(Decimal::ZERO))
}

pub fn workflow_recommendations(
    success: bool,
    metrics: &[AgentMetrics],
    savings: Decimal,
    plan: Option<&CartPlan>,
) -> Vec<String> {
    if !success {
        return vec!["Workflow failed - review agent performance and retry".to_string()];
    }

    let mut recommendations = Vec::new();
    if !metrics.is_empty() {
        let avg_ms =
            metrics.iter().map(|entry| entry.execution_time_ms).sum::<f64>() / metrics.len() as f64;
        if avg_ms > SLOW_STAGE_MS {
            recommendations
                .push("Consider optimizing agent performance - execution time is high".to_string());
        }
    }

    if savings > Decimal::from(HIGH_SAVINGS) {
        recommendations
            .push("Excellent cost savings achieved! Consider bulk ordering for better deals".to_string());
    } else if savings < Decimal::from(LOW_SAVINGS) {
        recommendations.push(
            "Minimal savings - consider different providers or timing for better deals".to_string(),
        );
    }

    if let Some(best) = plan.and_then(CartPlan::best_option) {
        if best.is_mixed() {
            recommendations
                .push("Mixed-cart strategy used - this often provides the best value".to_string());
        } else {
            recommendations.push(format!(
                "Single provider ({}) selected - good for convenience",
                best.provider
            ));
        }
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use super::{
        cost_savings, workflow_recommendations, AgentMetrics, HealthStatus, Overseer,
        OverseerError, CART_BUILDER_AGENT, DEAL_SCOUT_AGENT, ORDER_EXECUTOR_AGENT,
    };
    use crate::audit::InMemoryAuditSink;
    use crate::checkout::OrderExecutor;
    use crate::config::AppConfig;
    use crate::domain::cart::{CartOption, CartPlan};
    use crate::domain::checkout::CheckoutRequest;
    use crate::domain::item::PriceQuery;
    use crate::domain::quote::{ProviderId, Quote, QuoteMetadata};
    use crate::flows::WorkflowState;
    use crate::pricing::catalog::Catalog;
    use crate::pricing::strategy::StrategyRegistry;
    use crate::scout::DealScout;

    fn overseer() -> Overseer {
        let scout = DealScout::with_registry(
            Arc::new(StrategyRegistry::with_default_strategies()),
            Arc::new(Catalog::grocery()),
            "INR",
        );
        Overseer::new(scout, OrderExecutor::default())
    }

    fn quote(provider: &str, item: &str, unit: i64, fee: i64) -> Quote {
        Quote {
            provider: ProviderId::new(provider),
            item_name: item.to_string(),
            unit_price: Decimal::from(unit),
            currency: "INR".to_string(),
            in_stock: true,
            delivery_fee: Decimal::from(fee),
            eta_minutes: 30,
            url: None,
            metadata: QuoteMetadata::default(),
        }
    }

    fn option(provider: &str, total: i64) -> CartOption {
        CartOption {
            provider: ProviderId::new(provider),
            quotes: Vec::new(),
            subtotal: Decimal::from(total),
            delivery_fee: Decimal::ZERO,
            total: Decimal::from(total),
            eta_minutes: 30,
        }
    }

    fn stage(agent: &str, ms: f64) -> AgentMetrics {
        AgentMetrics {
            agent_name: agent.to_string(),
            execution_time_ms: ms,
            success: true,
            error_message: None,
            items_processed: 1,
        }
    }

    #[test]
    fn cart_only_workflow_completes_with_options() {
        let overseer = overseer();
        let query = PriceQuery::from_names(["rice", "milk", "bread"]);

        let result = overseer.execute_workflow(&query, None);

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(result.state, WorkflowState::Completed);
        let prices = result.price_result.as_ref().expect("price result");
        assert_eq!(prices.items.len(), 3);
        assert!(!result.cart_plan.as_ref().expect("cart plan").options.is_empty());
        assert!(result.final_order.is_none());
        assert_eq!(result.agent_metrics.len(), 2);
        assert_eq!(result.agent_metrics[0].items_processed, 3);
        assert!(result.total_cost_savings >= Decimal::ZERO);
        assert_eq!(overseer.history().stats().successful_workflows, 1);
    }

    #[test]
    fn stages_follow_the_flow_transitions_in_order() {
        let sink = Arc::new(InMemoryAuditSink::default());
        let overseer = overseer().with_audit_sink(sink.clone());
        let request = CheckoutRequest::new("user-3", ProviderId::new("instacart"), Vec::new());

        let result = overseer.execute_workflow(&PriceQuery::from_names(["rice"]), Some(request));

        let agents: Vec<&str> =
            result.agent_metrics.iter().map(|metrics| metrics.agent_name.as_str()).collect();
        assert_eq!(agents, vec![DEAL_SCOUT_AGENT, CART_BUILDER_AGENT, ORDER_EXECUTOR_AGENT]);
        assert_eq!(sink.count("flow.transition_applied"), 4);
        assert_eq!(sink.count("flow.transition_rejected"), 0);
        let stage_events: Vec<String> = sink
            .events()
            .into_iter()
            .filter(|event| event.event_type == "workflow.stage_completed")
            .filter_map(|event| event.metadata.get("agent").cloned())
            .collect();
        assert_eq!(stage_events, agents);
    }

    #[test]
    fn checkout_workflow_uses_best_option() {
        let overseer = overseer();
        let query = PriceQuery::from_names(["eggs", "butter"]);
        let request = CheckoutRequest::new("user-7", ProviderId::new("instacart"), Vec::new());

        let result = overseer.execute_workflow(&query, Some(request));

        assert!(result.success);
        let order = result.final_order.as_ref().expect("order placed");
        assert!(order.success, "{}", order.message);
        let best = result
            .cart_plan
            .as_ref()
            .and_then(CartPlan::best_option)
            .expect("best option");
        assert!(order.message.contains(best.provider.as_str()));
        assert_eq!(result.agent_metrics.len(), 3);
        assert_eq!(result.agent_metrics[2].agent_name, ORDER_EXECUTOR_AGENT);
        assert_eq!(result.agent_metrics[2].items_processed, 0);
    }

    #[test]
    fn unknown_items_fail_at_cart_stage_with_partial_output() {
        let sink = Arc::new(InMemoryAuditSink::default());
        let overseer = overseer().with_audit_sink(sink.clone());
        let query = PriceQuery::from_names(["unobtainium"]);

        let result = overseer.execute_workflow(&query, None);

        assert!(!result.success);
        assert_eq!(result.state, WorkflowState::Failed);
        assert!(result.price_result.is_some());
        assert!(result.cart_plan.is_none());
        assert_eq!(result.errors, vec!["Workflow failed: cart builder produced no options".to_string()]);
        assert_eq!(
            result.recommendations,
            vec!["Workflow failed - review agent performance and retry".to_string()]
        );
        let failed = &result.agent_metrics[1];
        assert_eq!(failed.agent_name, CART_BUILDER_AGENT);
        assert!(!failed.success);

        let stats = overseer.history().stats();
        assert_eq!(stats.failed_workflows, 1);
        assert_eq!(stats.total_cost_savings, Decimal::ZERO);
        assert_eq!(sink.count("workflow.stage_failed"), 1);
        let trail = sink.for_workflow(&result.workflow_id);
        assert!(!trail.is_empty());
        assert!(trail.iter().all(|event| event.correlation_id == result.workflow_id));
    }

    #[test]
    fn health_and_analytics_track_runs() {
        let overseer = overseer();
        assert!(overseer.agent_health_status().values().all(|status| *status == HealthStatus::Unknown));

        for _ in 0..5 {
            overseer.execute_workflow(&PriceQuery::from_names(["apple"]), None);
        }
        let health = overseer.agent_health_status();
        assert_eq!(health.get(DEAL_SCOUT_AGENT), Some(&HealthStatus::Healthy));
        assert_eq!(health.get(ORDER_EXECUTOR_AGENT), Some(&HealthStatus::Unknown));

        let analytics = overseer.workflow_analytics();
        assert_eq!(analytics.workflow_stats.total_workflows, 5);
        assert_eq!(analytics.recent_workflows.len(), 5);
        assert_eq!(analytics.agent_performance[DEAL_SCOUT_AGENT].total_executions, 5);

        overseer.reset();
        assert_eq!(overseer.workflow_analytics().workflow_stats.total_workflows, 0);
    }

    #[test]
    fn retry_is_an_explicit_placeholder() {
        let overseer = overseer();
        assert_eq!(
            overseer.retry_failed_workflow("wf_missing"),
            Err(OverseerError::RetryUnsupported("wf_missing".to_string()))
        );
    }

    #[test]
    fn savings_compare_costliest_basket_to_chosen_total() {
        let quotes = vec![
            quote("amazon_fresh", "rice", 100, 0),
            quote("amazon_fresh", "milk", 60, 0),
            quote("uber_eats", "rice", 120, 25),
            quote("uber_eats", "milk", 70, 40),
        ];

        assert_eq!(cost_savings(&quotes, &option("amazon_fresh", 160)), Decimal::from(70));
        assert_eq!(cost_savings(&quotes, &option("mixed", 400)), Decimal::ZERO);
        assert_eq!(cost_savings(&[], &option("mixed", 10)), Decimal::ZERO);
    }

    #[test]
    fn recommendations_reflect_speed_savings_and_cart_shape() {
        let mixed = CartPlan { options: vec![option("mixed", 100)], best_option_index: 0 };
        let single = CartPlan { options: vec![option("instacart", 100)], best_option_index: 0 };

        let slow = workflow_recommendations(
            true,
            &[stage(DEAL_SCOUT_AGENT, 9000.0), stage(CART_BUILDER_AGENT, 3000.0)],
            Decimal::from(150),
            Some(&mixed),
        );
        assert_eq!(
            slow,
            vec![
                "Consider optimizing agent performance - execution time is high".to_string(),
                "Excellent cost savings achieved! Consider bulk ordering for better deals".to_string(),
                "Mixed-cart strategy used - this often provides the best value".to_string(),
            ]
        );

        let modest = workflow_recommendations(
            true,
            &[stage(DEAL_SCOUT_AGENT, 3.0)],
            Decimal::from(5),
            Some(&single),
        );
        assert_eq!(
            modest,
            vec![
                "Minimal savings - consider different providers or timing for better deals".to_string(),
                "Single provider (instacart) selected - good for convenience".to_string(),
            ]
        );
    }

    #[test]
    fn from_config_respects_provider_list() {
        let mut config = AppConfig::default();
        config.pricing.providers = vec!["uber_eats".to_string()];
        config.pricing.default_provider = "uber_eats".to_string();

        let overseer = Overseer::from_config(&config).expect("valid config");
        let result = overseer.execute_workflow(&PriceQuery::from_names(["rice"]), None);

        assert!(result.success);
        let quotes = result.price_result.expect("prices").quotes();
        assert!(quotes.iter().all(|quote| quote.provider.as_str() == "uber_eats"));
    }
}
