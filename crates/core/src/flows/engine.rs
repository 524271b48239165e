use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::flows::states::{FlowAction, TransitionOutcome, WorkflowEvent, WorkflowState};

pub trait FlowDefinition {
    fn initial_state(&self) -> WorkflowState;
    fn transition(
        &self,
        current: WorkflowState,
        event: &WorkflowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Scout, then cart, then an optional checkout.
#[derive(Clone, Debug, Default)]
pub struct ShoppingFlow;

impl FlowDefinition for ShoppingFlow {
    fn initial_state(&self) -> WorkflowState {
        WorkflowState::Idle
    }

    fn transition(
        &self,
        current: WorkflowState,
        event: &WorkflowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_shopping(current, event)
    }
}

#[derive(Clone, Debug)]
pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> WorkflowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: WorkflowState,
        event: &WorkflowEvent,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: WorkflowState,
        event: &WorkflowEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event);
        match &result {
            Ok(outcome) => sink.emit(
                audit
                    .event("flow.transition_applied", AuditCategory::Workflow, AuditOutcome::Success)
                    .with_metadata("from", format!("{:?}", outcome.from))
                    .with_metadata("to", format!("{:?}", outcome.to))
                    .with_metadata("event", format!("{:?}", outcome.event)),
            ),
            Err(error) => sink.emit(
                audit
                    .event("flow.transition_rejected", AuditCategory::Workflow, AuditOutcome::Rejected)
                    .with_metadata("error", error.to_string()),
            ),
        }
        result
    }
}

impl Default for FlowEngine<ShoppingFlow> {
    fn default() -> Self {
        Self::new(ShoppingFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: WorkflowState, event: WorkflowEvent },
}

fn transition_shopping(
    current: WorkflowState,
    event: &WorkflowEvent,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{AggregatePrices, BuildCart, ExecuteCheckout, RecordHistory};
    use WorkflowEvent::{CartBuilt, CheckoutFinished, PricesAggregated, StageFailed, Start};
    use WorkflowState::{CartBuilding, Completed, Executing, Failed, Idle, Scouting};

    let (to, actions) = match (current, event) {
        (Idle, Start) => (Scouting, vec![AggregatePrices]),
        (Scouting, PricesAggregated) => (CartBuilding, vec![BuildCart]),
        (CartBuilding, CartBuilt { checkout_requested: true }) => {
            (Executing, vec![ExecuteCheckout])
        }
        (CartBuilding, CartBuilt { checkout_requested: false }) => (Completed, vec![RecordHistory]),
        (Executing, CheckoutFinished) => (Completed, vec![RecordHistory]),
        (Scouting | CartBuilding | Executing, StageFailed) => (Failed, vec![RecordHistory]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition { state: current, event: event.clone() });
        }
    };

    Ok(TransitionOutcome { from: current, to, event: event.clone(), actions })
}
