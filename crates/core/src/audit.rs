//! Audit trail for shopping workflows.
//!
//! Every stage outcome and flow transition of a run is reported to an [`AuditSink`] with the
//! run's workflow id as correlation id. Sinks must not fail the pipeline.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const OVERSEER_ACTOR: &str = "overseer";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Scouting,
    Cart,
    Checkout,
    Workflow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Rejected,
    Failed,
}

/// Identifies one workflow run; stamps every event raised on its behalf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub workflow_id: String,
    pub user_id: Option<String>,
    pub correlation_id: String,
    pub actor: String,
}

impl AuditContext {
    /// Context for an overseer run. The workflow id doubles as correlation id.
    pub fn for_workflow(workflow_id: impl Into<String>, user_id: Option<String>) -> Self {
        let workflow_id = workflow_id.into();
        Self {
            correlation_id: workflow_id.clone(),
            workflow_id,
            user_id,
            actor: OVERSEER_ACTOR.to_string(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn event(
        &self,
        event_type: impl Into<String>,
        category: AuditCategory,
        outcome: AuditOutcome,
    ) -> AuditEvent {
        AuditEvent {
            event_id: Uuid::new_v4().to_string(),
            workflow_id: self.workflow_id.clone(),
            user_id: self.user_id.clone(),
            correlation_id: self.correlation_id.clone(),
            event_type: event_type.into(),
            category,
            actor: self.actor.clone(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub workflow_id: String,
    pub user_id: Option<String>,
    pub correlation_id: String,
    pub event_type: String,
    pub category: AuditCategory,
    pub actor: String,
    pub outcome: AuditOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.metadata.insert(key.into(), value.to_string());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

/// Keeps events in memory, in emission order.
#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events().iter().filter(|event| event.event_type == event_type).count()
    }

    pub fn for_workflow(&self, workflow_id: &str) -> Vec<AuditEvent> {
        self.events().into_iter().filter(|event| event.workflow_id == workflow_id).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn emit(&self, event: AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Writes audit events to `tracing`; failures at warn level, everything else at info.
#[derive(Clone, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let metadata = serde_json::to_string(&event.metadata).unwrap_or_default();
        if event.outcome == AuditOutcome::Failed {
            warn!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                workflow_id = %event.workflow_id,
                category = ?event.category,
                actor = %event.actor,
                metadata = %metadata,
                "audit failure"
            );
            return;
        }
        info!(
            event_name = %event.event_type,
            correlation_id = %event.correlation_id,
            workflow_id = %event.workflow_id,
            category = ?event.category,
            outcome = ?event.outcome,
            actor = %event.actor,
            metadata = %metadata,
            "audit event"
        );
    }
}
