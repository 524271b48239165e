pub mod catalog;
pub mod compare;
pub mod config;
pub mod parse;
pub mod smoke;
pub mod workflow;

use std::future::Future;

use cartscout_core::config::{AppConfig, LoadOptions};
use cartscout_core::ApplicationError;
use serde::Serialize;
use serde_json::Value;

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;
pub const EXIT_WORKFLOW: u8 = 4;
pub const EXIT_RUNTIME: u8 = 5;
pub const EXIT_SMOKE: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::ok(command, message, None)
    }

    /// Success payload carrying a structured `data` body next to the message.
    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::ok(command, message, Some(data)),
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_RUNTIME),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), exit_code_for(error))
    }

    fn ok(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub fn exit_code_for(error: &ApplicationError) -> u8 {
    match error.error_class() {
        "config_validation" => EXIT_CONFIG,
        "input" => EXIT_INPUT,
        _ => EXIT_RUNTIME,
    }
}

pub(crate) fn load_config(command: &str, options: &LoadOptions) -> Result<AppConfig, CommandResult> {
    AppConfig::load(options.clone())
        .map_err(|error| CommandResult::from_error(command, &ApplicationError::from(error)))
}

/// Classifies an agent error; anything that is not an `ApplicationError` is an integration
/// failure.
pub(crate) fn agent_failure(command: &str, error: anyhow::Error) -> CommandResult {
    match error.downcast::<ApplicationError>() {
        Ok(error) => CommandResult::from_error(command, &error),
        Err(error) => CommandResult::from_error(
            command,
            &ApplicationError::Integration(format!("{error:#}")),
        ),
    }
}

/// Drives an async command body on a private current-thread runtime.
pub(crate) fn block_on<F>(command: &str, future: F) -> Result<F::Output, CommandResult>
where
    F: Future,
{
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(
        |error| {
            CommandResult::failure(
                command,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME,
            )
        },
    )?;
    Ok(runtime.block_on(future))
}

/// Non-empty, trimmed item names in the order given.
pub(crate) fn item_names(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
