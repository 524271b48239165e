pub mod engine;
pub mod states;

pub use engine::{FlowDefinition, FlowEngine, FlowTransitionError, ShoppingFlow};
pub use states::{FlowAction, TransitionOutcome, WorkflowEvent, WorkflowState};
