use std::env;
use std::fs;
use std::path::Path;

use cartscout_core::config::{discover_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<&'static str>,
}

/// Keys read only by a language-model client. This binary ships none, so `parse`
/// always uses the pattern extractor.
const LLM_CLIENT_KEYS: [&str; 4] =
    ["parser.provider", "parser.model", "parser.base_url", "parser.api_key"];
const LLM_CLIENT_NOTE: &str =
    "unused: no language-model client is built in; parse uses the pattern extractor";

struct Field {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
    overridden: bool,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = discover_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let entries: Vec<ConfigEntry> = fields(&config, options)
        .into_iter()
        .map(|field| ConfigEntry {
            source: field_source(
                &field,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
            note: LLM_CLIENT_KEYS.contains(&field.key).then_some(LLM_CLIENT_NOTE),
            key: field.key,
            value: field.value,
        })
        .collect();

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: override > env > file > default)",
        &entries,
    )
}

fn fields(config: &AppConfig, options: &LoadOptions) -> Vec<Field> {
    let overrides = &options.overrides;
    let field = |key: &'static str,
                 value: String,
                 env_keys: &'static [&'static str],
                 overridden: bool| Field { key, value, env_keys, overridden };

    vec![
        field(
            "pricing.currency",
            config.pricing.currency.clone(),
            &["CARTSCOUT_PRICING_CURRENCY"],
            overrides.currency.is_some(),
        ),
        field(
            "pricing.default_provider",
            config.pricing.default_provider.clone(),
            &["CARTSCOUT_PRICING_DEFAULT_PROVIDER"],
            overrides.default_provider.is_some(),
        ),
        field(
            "pricing.providers",
            config.pricing.providers.join(","),
            &["CARTSCOUT_PRICING_PROVIDERS"],
            overrides.providers.is_some(),
        ),
        field(
            "checkout.default_loyalty_points",
            config.checkout.default_loyalty_points.to_string(),
            &["CARTSCOUT_CHECKOUT_DEFAULT_LOYALTY_POINTS"],
            false,
        ),
        field(
            "checkout.shopper_order_ceiling",
            config.checkout.shopper_order_ceiling.to_string(),
            &["CARTSCOUT_CHECKOUT_SHOPPER_ORDER_CEILING"],
            false,
        ),
        field(
            "overseer.default_role",
            config.overseer.default_role.clone(),
            &["CARTSCOUT_OVERSEER_DEFAULT_ROLE"],
            overrides.default_role.is_some(),
        ),
        field(
            "overseer.history_limit",
            config.overseer.history_limit.to_string(),
            &["CARTSCOUT_OVERSEER_HISTORY_LIMIT"],
            false,
        ),
        field(
            "overseer.health_window",
            config.overseer.health_window.to_string(),
            &["CARTSCOUT_OVERSEER_HEALTH_WINDOW"],
            false,
        ),
        field(
            "parser.provider",
            format!("{:?}", config.parser.provider),
            &["CARTSCOUT_PARSER_PROVIDER"],
            overrides.parser_provider.is_some(),
        ),
        field(
            "parser.model",
            config.parser.model.clone(),
            &["CARTSCOUT_PARSER_MODEL"],
            overrides.parser_model.is_some(),
        ),
        field(
            "parser.base_url",
            config.parser.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["CARTSCOUT_PARSER_BASE_URL"],
            false,
        ),
        field(
            "parser.api_key",
            redact_secret(config.parser.api_key.as_ref().map(|key| key.expose_secret())),
            &["CARTSCOUT_PARSER_API_KEY"],
            false,
        ),
        field(
            "parser.timeout_ms",
            config.parser.timeout_ms.to_string(),
            &["CARTSCOUT_PARSER_TIMEOUT_MS"],
            false,
        ),
        field(
            "identity.signing_secret",
            redact_secret(
                config.identity.signing_secret.as_ref().map(|secret| secret.expose_secret()),
            ),
            &["CARTSCOUT_IDENTITY_SIGNING_SECRET"],
            false,
        ),
        field(
            "identity.issuer",
            config.identity.issuer.clone(),
            &["CARTSCOUT_IDENTITY_ISSUER"],
            false,
        ),
        field(
            "identity.timeout_ms",
            config.identity.timeout_ms.to_string(),
            &["CARTSCOUT_IDENTITY_TIMEOUT_MS"],
            false,
        ),
        field(
            "identity.allow_unverified_fallback",
            config.identity.allow_unverified_fallback.to_string(),
            &["CARTSCOUT_IDENTITY_ALLOW_UNVERIFIED_FALLBACK"],
            false,
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["CARTSCOUT_LOGGING_LEVEL", "CARTSCOUT_LOG_LEVEL"],
            overrides.log_level.is_some(),
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["CARTSCOUT_LOGGING_FORMAT", "CARTSCOUT_LOG_FORMAT"],
            overrides.log_format.is_some(),
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if field.overridden {
        return "override".to_string();
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Only reports whether a secret is set.
fn redact_secret(secret: Option<&str>) -> String {
    match secret.map(str::trim) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(_) => "<redacted>".to_string(),
    }
}
