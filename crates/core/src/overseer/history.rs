use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEAL_SCOUT_AGENT: &str = "DealScoutAgent";
pub const CART_BUILDER_AGENT: &str = "CartBuilderAgent";
pub const ORDER_EXECUTOR_AGENT: &str = "OrderExecutorAgent";

pub const DEFAULT_HISTORY_LIMIT: usize = 1000;
pub const DEFAULT_HEALTH_WINDOW: usize = 5;
const RECENT_WORKFLOWS: usize = 10;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Timing and outcome of one monitored stage call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub agent_name: String,
    pub execution_time_ms: f64,
    pub success: bool,
    pub error_message: Option<String>,
    pub items_processed: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub workflow_id: String,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub execution_time_ms: f64,
    pub cost_savings: Decimal,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub total_workflows: u64,
    pub successful_workflows: u64,
    pub failed_workflows: u64,
    pub total_cost_savings: Decimal,
    pub avg_execution_time_ms: f64,
}

#[derive(Debug)]
struct HistoryState {
    records: Vec<WorkflowRecord>,
    stats: WorkflowStats,
    limit: usize,
}

/// Append-only run log with running totals. Only the newest `limit` records are kept;
/// counters stay cumulative.
#[derive(Clone, Debug)]
pub struct WorkflowHistory {
    state: Arc<Mutex<HistoryState>>,
}

impl Default for WorkflowHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl WorkflowHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(HistoryState {
                records: Vec::new(),
                stats: WorkflowStats::default(),
                limit: limit.max(1),
            })),
        }
    }

    pub fn record(&self, record: WorkflowRecord) -> WorkflowStats {
        let mut state = lock(&self.state);
        state.stats.total_workflows += 1;
        if record.success {
            state.stats.successful_workflows += 1;
            state.stats.total_cost_savings += record.cost_savings;
        } else {
            state.stats.failed_workflows += 1;
        }

        state.records.push(record);
        let overflow = state.records.len().saturating_sub(state.limit);
        if overflow > 0 {
            state.records.drain(..overflow);
        }

        let elapsed: f64 = state.records.iter().map(|record| record.execution_time_ms).sum();
        state.stats.avg_execution_time_ms = elapsed / state.records.len() as f64;
        state.stats.clone()
    }

    pub fn stats(&self) -> WorkflowStats {
        lock(&self.state).stats.clone()
    }

    pub fn recent(&self, count: usize) -> Vec<WorkflowRecord> {
        let state = lock(&self.state);
        let start = state.records.len().saturating_sub(count);
        state.records[start..].to_vec()
    }

    pub fn find(&self, workflow_id: &str) -> Option<WorkflowRecord> {
        lock(&self.state).records.iter().find(|record| record.workflow_id == workflow_id).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.state).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.records.clear();
        state.stats = WorkflowStats::default();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Good,
    Fair,
    Poor,
    Unknown,
}

impl HealthStatus {
    pub fn classify(recent: &[AgentMetrics]) -> Self {
        if recent.is_empty() {
            return Self::Unknown;
        }
        let count = recent.len() as f64;
        let success_rate = recent.iter().filter(|metrics| metrics.success).count() as f64 / count;
        let avg_time = recent.iter().map(|metrics| metrics.execution_time_ms).sum::<f64>() / count;

        if success_rate >= 1.0 && avg_time < 1000.0 {
            Self::Healthy
        } else if success_rate >= 0.8 && avg_time < 2000.0 {
            Self::Good
        } else if success_rate >= 0.6 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Healthy => "Healthy",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub total_executions: usize,
    pub success_rate: f64,
    pub avg_execution_time_ms: f64,
    pub recent_errors: Vec<String>,
}

/// Per-agent metric series. Each series keeps only its newest `limit` entries, so summaries
/// describe the retained window.
#[derive(Clone, Debug)]
pub struct AgentPerformanceHistory {
    agents: Arc<Mutex<BTreeMap<String, Vec<AgentMetrics>>>>,
    limit: usize,
}

impl Default for AgentPerformanceHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentPerformanceHistory {
    /// Starts with empty series for the three pipeline agents.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { agents: Arc::new(Mutex::new(seeded_agents())), limit: limit.max(1) }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn record(&self, metrics: AgentMetrics) {
        let mut agents = lock(&self.agents);
        append_capped(&mut agents, metrics, self.limit);
    }

    pub fn record_all(&self, metrics: &[AgentMetrics]) {
        let mut agents = lock(&self.agents);
        for entry in metrics {
            append_capped(&mut agents, entry.clone(), self.limit);
        }
    }

    pub fn health(&self, window: usize) -> BTreeMap<String, HealthStatus> {
        lock(&self.agents)
            .iter()
            .map(|(agent, metrics)| {
                let start = metrics.len().saturating_sub(window);
                (agent.clone(), HealthStatus::classify(&metrics[start..]))
            })
            .collect()
    }

    pub fn summaries(&self, error_window: usize) -> BTreeMap<String, AgentPerformance> {
        lock(&self.agents)
            .iter()
            .map(|(agent, metrics)| {
                let total = metrics.len();
                let (success_rate, avg_time) = if total == 0 {
                    (0.0, 0.0)
                } else {
                    (
                        metrics.iter().filter(|entry| entry.success).count() as f64 / total as f64,
                        metrics.iter().map(|entry| entry.execution_time_ms).sum::<f64>()
                            / total as f64,
                    )
                };
                let start = total.saturating_sub(error_window);
                let recent_errors = metrics[start..]
                    .iter()
                    .filter(|entry| !entry.success)
                    .filter_map(|entry| entry.error_message.clone())
                    .collect();
                (
                    agent.clone(),
                    AgentPerformance {
                        total_executions: total,
                        success_rate,
                        avg_execution_time_ms: avg_time,
                        recent_errors,
                    },
                )
            })
            .collect()
    }

    pub fn reset(&self) {
        *lock(&self.agents) = seeded_agents();
    }
}

fn append_capped(
    agents: &mut BTreeMap<String, Vec<AgentMetrics>>,
    metrics: AgentMetrics,
    limit: usize,
) {
    let series = agents.entry(metrics.agent_name.clone()).or_default();
    series.push(metrics);
    let overflow = series.len().saturating_sub(limit);
    if overflow > 0 {
        series.drain(..overflow);
    }
}

fn seeded_agents() -> BTreeMap<String, Vec<AgentMetrics>> {
    [DEAL_SCOUT_AGENT, CART_BUILDER_AGENT, ORDER_EXECUTOR_AGENT]
        .into_iter()
        .map(|agent| (agent.to_string(), Vec::new()))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowAnalytics {
    pub workflow_stats: WorkflowStats,
    pub agent_performance: BTreeMap<String, AgentPerformance>,
    pub recent_workflows: Vec<WorkflowRecord>,
    pub total_cost_savings: Decimal,
}

impl WorkflowAnalytics {
    pub fn collect(
        history: &WorkflowHistory,
        performance: &AgentPerformanceHistory,
        error_window: usize,
    ) -> Self {
        let workflow_stats = history.stats();
        Self {
            total_cost_savings: workflow_stats.total_cost_savings,
            agent_performance: performance.summaries(error_window),
            recent_workflows: history.recent(RECENT_WORKFLOWS),
            workflow_stats,
        }
    }
}
