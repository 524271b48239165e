use thiserror::Error;

use crate::config::ConfigError;
use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
    #[error("provider `{0}` is not registered")]
    UnknownProvider(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures surfaced to callers of the shopping pipeline, grouped by who has to act.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl ApplicationError {
    /// Stable machine-readable class for structured output.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::UnknownProvider(_)) | Self::Configuration(_) => {
                "config_validation"
            }
            Self::Domain(_) => "domain",
            Self::InvalidInput(_) => "input",
            Self::Integration(_) => "integration",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::Configuration(error) => format!("Check the CartScout configuration: {error}"),
            Self::Domain(DomainError::UnknownProvider(provider)) => {
                format!("Provider `{provider}` is not available.")
            }
            Self::Domain(_) => "The request could not be completed.".to_string(),
            Self::Integration(_) => {
                "A dependent service is temporarily unavailable. Please retry shortly.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ApplicationError, DomainError};
    use crate::config::ConfigError;
    use crate::flows::{FlowTransitionError, WorkflowEvent, WorkflowState};

    #[test]
    fn classes_group_by_responsible_party() {
        let unknown = ApplicationError::from(DomainError::UnknownProvider("blinkit".to_owned()));
        let config = ApplicationError::from(ConfigError::Validation("bad currency".to_owned()));
        let flow = ApplicationError::from(DomainError::from(FlowTransitionError::InvalidTransition {
            state: WorkflowState::Idle,
            event: WorkflowEvent::CheckoutFinished,
        }));

        assert_eq!(unknown.error_class(), "config_validation");
        assert_eq!(config.error_class(), "config_validation");
        assert_eq!(flow.error_class(), "domain");
        assert_eq!(ApplicationError::InvalidInput("x".to_owned()).error_class(), "input");
        assert_eq!(ApplicationError::Integration("x".to_owned()).error_class(), "integration");
    }

    #[test]
    fn input_errors_are_shown_verbatim_and_integrations_are_not() {
        let input = ApplicationError::InvalidInput("no grocery items found".to_owned());
        let integration = ApplicationError::Integration("connection refused at 10.0.0.5".to_owned());

        assert_eq!(input.user_message(), "no grocery items found");
        assert!(!integration.user_message().contains("10.0.0.5"));
    }

    #[test]
    fn unknown_provider_names_the_provider() {
        let error = DomainError::UnknownProvider("blinkit".to_owned());
        assert_eq!(error.to_string(), "provider `blinkit` is not registered");
    }
}
