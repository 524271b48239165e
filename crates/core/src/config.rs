use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkout::DEFAULT_LOYALTY_POINTS;
use crate::domain::money::DEFAULT_CURRENCY;
use crate::overseer::history::{DEFAULT_HEALTH_WINDOW, DEFAULT_HISTORY_LIMIT};
use crate::policy::SHOPPER_ROLE;
use crate::pricing::strategy::{StrategyRegistry, DEFAULT_STRATEGY};

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["cartscout.toml", "config/cartscout.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub pricing: PricingConfig,
    pub checkout: CheckoutConfig,
    pub overseer: OverseerConfig,
    pub parser: ParserConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    pub currency: String,
    pub default_provider: String,
    pub providers: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    pub default_loyalty_points: u64,
    pub shopper_order_ceiling: Decimal,
}

#[derive(Clone, Debug)]
pub struct OverseerConfig {
    pub default_role: String,
    pub history_limit: usize,
    pub health_window: usize,
}

#[derive(Clone, Debug)]
pub struct ParserConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
}

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub signing_secret: Option<SecretString>,
    pub issuer: String,
    pub timeout_ms: u64,
    pub allow_unverified_fallback: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

/// Values supplied by the caller (usually CLI flags). They win over every other source.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub currency: Option<String>,
    pub default_provider: Option<String>,
    pub providers: Option<Vec<String>>,
    pub default_role: Option<String>,
    pub parser_provider: Option<LlmProvider>,
    pub parser_model: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let registry = StrategyRegistry::with_default_strategies();
        Self {
            pricing: PricingConfig {
                currency: DEFAULT_CURRENCY.to_string(),
                default_provider: DEFAULT_STRATEGY.to_string(),
                providers: registry.provider_ids().into_iter().map(|id| id.0).collect(),
            },
            checkout: CheckoutConfig {
                default_loyalty_points: DEFAULT_LOYALTY_POINTS,
                shopper_order_ceiling: Decimal::from(1000),
            },
            overseer: OverseerConfig {
                default_role: SHOPPER_ROLE.to_string(),
                history_limit: DEFAULT_HISTORY_LIMIT,
                health_window: DEFAULT_HEALTH_WINDOW,
            },
            parser: ParserConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_ms: 5_000,
            },
            identity: IdentityConfig {
                signing_secret: None,
                issuer: "cartscout".to_string(),
                timeout_ms: 1_000,
                allow_unverified_fallback: false,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported parser provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = discover_config_path(options.config_path.as_deref()) {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The provider registry narrowed to `pricing.providers` with `pricing.default_provider`
    /// as the fallback strategy.
    pub fn strategy_registry(&self) -> Result<StrategyRegistry, ConfigError> {
        let registry = StrategyRegistry::with_default_strategies()
            .restricted_to(&self.pricing.providers)
            .and_then(|registry| registry.with_default(self.pricing.default_provider.as_str().into()))
            .map_err(|error| ConfigError::Validation(format!("pricing: {error}")))?;
        Ok(registry)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pricing) = patch.pricing {
            if let Some(currency) = pricing.currency {
                self.pricing.currency = currency;
            }
            if let Some(default_provider) = pricing.default_provider {
                self.pricing.default_provider = default_provider;
            }
            if let Some(providers) = pricing.providers {
                self.pricing.providers = providers;
            }
        }

        if let Some(checkout) = patch.checkout {
            if let Some(points) = checkout.default_loyalty_points {
                self.checkout.default_loyalty_points = points;
            }
            if let Some(ceiling) = checkout.shopper_order_ceiling {
                self.checkout.shopper_order_ceiling = ceiling;
            }
        }

        if let Some(overseer) = patch.overseer {
            if let Some(default_role) = overseer.default_role {
                self.overseer.default_role = default_role;
            }
            if let Some(history_limit) = overseer.history_limit {
                self.overseer.history_limit = history_limit;
            }
            if let Some(health_window) = overseer.health_window {
                self.overseer.health_window = health_window;
            }
        }

        if let Some(parser) = patch.parser {
            if let Some(provider) = parser.provider {
                self.parser.provider = provider;
            }
            if let Some(api_key) = parser.api_key {
                self.parser.api_key = Some(api_key.into());
            }
            if let Some(base_url) = parser.base_url {
                self.parser.base_url = Some(base_url);
            }
            if let Some(model) = parser.model {
                self.parser.model = model;
            }
            if let Some(timeout_ms) = parser.timeout_ms {
                self.parser.timeout_ms = timeout_ms;
            }
        }

        if let Some(identity) = patch.identity {
            if let Some(signing_secret) = identity.signing_secret {
                self.identity.signing_secret = Some(signing_secret.into());
            }
            if let Some(issuer) = identity.issuer {
                self.identity.issuer = issuer;
            }
            if let Some(timeout_ms) = identity.timeout_ms {
                self.identity.timeout_ms = timeout_ms;
            }
            if let Some(allow) = identity.allow_unverified_fallback {
                self.identity.allow_unverified_fallback = allow;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CARTSCOUT_PRICING_CURRENCY") {
            self.pricing.currency = value;
        }
        if let Some(value) = read_env("CARTSCOUT_PRICING_DEFAULT_PROVIDER") {
            self.pricing.default_provider = value;
        }
        if let Some(value) = read_env("CARTSCOUT_PRICING_PROVIDERS") {
            self.pricing.providers = split_list(&value);
        }

        if let Some(value) = read_env("CARTSCOUT_CHECKOUT_DEFAULT_LOYALTY_POINTS") {
            self.checkout.default_loyalty_points =
                parse_env("CARTSCOUT_CHECKOUT_DEFAULT_LOYALTY_POINTS", &value)?;
        }
        if let Some(value) = read_env("CARTSCOUT_CHECKOUT_SHOPPER_ORDER_CEILING") {
            self.checkout.shopper_order_ceiling =
                parse_env("CARTSCOUT_CHECKOUT_SHOPPER_ORDER_CEILING", &value)?;
        }

        if let Some(value) = read_env("CARTSCOUT_OVERSEER_DEFAULT_ROLE") {
            self.overseer.default_role = value;
        }
        if let Some(value) = read_env("CARTSCOUT_OVERSEER_HISTORY_LIMIT") {
            self.overseer.history_limit = parse_env("CARTSCOUT_OVERSEER_HISTORY_LIMIT", &value)?;
        }
        if let Some(value) = read_env("CARTSCOUT_OVERSEER_HEALTH_WINDOW") {
            self.overseer.health_window = parse_env("CARTSCOUT_OVERSEER_HEALTH_WINDOW", &value)?;
        }

        if let Some(value) = read_env("CARTSCOUT_PARSER_PROVIDER") {
            self.parser.provider = value.parse()?;
        }
        if let Some(value) = read_env("CARTSCOUT_PARSER_API_KEY") {
            self.parser.api_key = Some(value.into());
        }
        if let Some(value) = read_env("CARTSCOUT_PARSER_BASE_URL") {
            self.parser.base_url = Some(value);
        }
        if let Some(value) = read_env("CARTSCOUT_PARSER_MODEL") {
            self.parser.model = value;
        }
        if let Some(value) = read_env("CARTSCOUT_PARSER_TIMEOUT_MS") {
            self.parser.timeout_ms = parse_env("CARTSCOUT_PARSER_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = read_env("CARTSCOUT_IDENTITY_SIGNING_SECRET") {
            self.identity.signing_secret = Some(value.into());
        }
        if let Some(value) = read_env("CARTSCOUT_IDENTITY_ISSUER") {
            self.identity.issuer = value;
        }
        if let Some(value) = read_env("CARTSCOUT_IDENTITY_TIMEOUT_MS") {
            self.identity.timeout_ms = parse_env("CARTSCOUT_IDENTITY_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("CARTSCOUT_IDENTITY_ALLOW_UNVERIFIED_FALLBACK") {
            self.identity.allow_unverified_fallback =
                parse_env("CARTSCOUT_IDENTITY_ALLOW_UNVERIFIED_FALLBACK", &value)?;
        }

        let log_level =
            read_env("CARTSCOUT_LOGGING_LEVEL").or_else(|| read_env("CARTSCOUT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CARTSCOUT_LOGGING_FORMAT").or_else(|| read_env("CARTSCOUT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(currency) = overrides.currency {
            self.pricing.currency = currency;
        }
        if let Some(default_provider) = overrides.default_provider {
            self.pricing.default_provider = default_provider;
        }
        if let Some(providers) = overrides.providers {
            self.pricing.providers = providers;
        }
        if let Some(default_role) = overrides.default_role {
            self.overseer.default_role = default_role;
        }
        if let Some(provider) = overrides.parser_provider {
            self.parser.provider = provider;
        }
        if let Some(model) = overrides.parser_model {
            self.parser.model = model;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pricing(&self.pricing)?;
        self.strategy_registry()?;
        validate_checkout(&self.checkout)?;
        validate_overseer(&self.overseer)?;
        validate_parser(&self.parser)?;
        validate_identity(&self.identity)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The explicit path when it exists, else the first default candidate found in the
/// working directory.
pub fn discover_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pricing(pricing: &PricingConfig) -> Result<(), ConfigError> {
    let currency = pricing.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(
            "pricing.currency must be a three-letter uppercase code such as `INR`".to_string(),
        ));
    }

    if pricing.providers.is_empty() {
        return Err(ConfigError::Validation(
            "pricing.providers must list at least one provider".to_string(),
        ));
    }

    if !pricing.providers.iter().any(|provider| provider == &pricing.default_provider) {
        return Err(ConfigError::Validation(format!(
            "pricing.default_provider `{}` must be one of pricing.providers",
            pricing.default_provider
        )));
    }

    Ok(())
}

fn validate_checkout(checkout: &CheckoutConfig) -> Result<(), ConfigError> {
    if checkout.shopper_order_ceiling <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "checkout.shopper_order_ceiling must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_overseer(overseer: &OverseerConfig) -> Result<(), ConfigError> {
    if overseer.default_role.trim().is_empty() {
        return Err(ConfigError::Validation("overseer.default_role must not be empty".to_string()));
    }
    if overseer.history_limit == 0 {
        return Err(ConfigError::Validation(
            "overseer.history_limit must be greater than zero".to_string(),
        ));
    }
    if overseer.health_window == 0 || overseer.health_window > 100 {
        return Err(ConfigError::Validation(
            "overseer.health_window must be in range 1..=100".to_string(),
        ));
    }
    Ok(())
}

fn validate_parser(parser: &ParserConfig) -> Result<(), ConfigError> {
    if parser.timeout_ms == 0 || parser.timeout_ms > 60_000 {
        return Err(ConfigError::Validation(
            "parser.timeout_ms must be in range 1..=60000".to_string(),
        ));
    }

    match parser.provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => {
            let missing = parser
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "parser.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                parser.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "parser.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_identity(identity: &IdentityConfig) -> Result<(), ConfigError> {
    if identity.timeout_ms == 0 || identity.timeout_ms > 60_000 {
        return Err(ConfigError::Validation(
            "identity.timeout_ms must be in range 1..=60000".to_string(),
        ));
    }
    if identity.issuer.trim().is_empty() {
        return Err(ConfigError::Validation("identity.issuer must not be empty".to_string()));
    }
    let empty_secret = identity
        .signing_secret
        .as_ref()
        .map(|secret| secret.expose_secret().trim().is_empty())
        .unwrap_or(false);
    if empty_secret {
        return Err(ConfigError::Validation(
            "identity.signing_secret is set but empty; remove it or provide a value".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pricing: Option<PricingPatch>,
    checkout: Option<CheckoutPatch>,
    overseer: Option<OverseerPatch>,
    parser: Option<ParserPatch>,
    identity: Option<IdentityPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PricingPatch {
    currency: Option<String>,
    default_provider: Option<String>,
    providers: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct CheckoutPatch {
    default_loyalty_points: Option<u64>,
    shopper_order_ceiling: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct OverseerPatch {
    default_role: Option<String>,
    history_limit: Option<usize>,
    health_window: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ParserPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct IdentityPatch {
    signing_secret: Option<String>,
    issuer: Option<String>,
    timeout_ms: Option<u64>,
    allow_unverified_fallback: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LlmProvider, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<std::path::PathBuf, String> {
        let path = dir.path().join("cartscout.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_validate_without_a_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions {
            config_path: Some("does-not-exist.toml".into()),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.pricing.currency == "INR", "default currency should be INR")?;
        ensure(config.pricing.providers.len() == 3, "all built-in providers enabled by default")?;
        ensure(config.overseer.default_role == "shopper", "default role should be shopper")?;
        ensure(
            config.checkout.shopper_order_ceiling == Decimal::from(1000),
            "shopper ceiling should default to 1000",
        )?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "compact logs by default")
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let error = AppConfig::load(LoadOptions {
            config_path: Some("nowhere/cartscout.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        })
        .err();

        ensure(
            matches!(error, Some(ConfigError::MissingConfigFile(_))),
            "require_file should fail when the file is absent",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_CARTSCOUT_SIGNING_SECRET", "shared-secret-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[identity]
signing_secret = "${TEST_CARTSCOUT_SIGNING_SECRET}"
issuer = "shop.example"

[checkout]
shopper_order_ceiling = "750.50"
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            let secret = config
                .identity
                .signing_secret
                .as_ref()
                .map(|secret| secret.expose_secret().to_string());
            ensure(
                secret.as_deref() == Some("shared-secret-from-env"),
                "signing secret should be interpolated from environment",
            )?;
            ensure(config.identity.issuer == "shop.example", "issuer should come from file")?;
            ensure(
                config.checkout.shopper_order_ceiling == Decimal::new(75050, 2),
                "ceiling should be parsed as a decimal",
            )
        })();

        clear_vars(&["TEST_CARTSCOUT_SIGNING_SECRET"]);
        result
    }

    #[test]
    fn unset_interpolation_variable_fails() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_CARTSCOUT_UNSET"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(&dir, "[parser]\nmodel = \"${TEST_CARTSCOUT_UNSET}\"\n")?;

        let error =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .err();
        ensure(
            matches!(
                error,
                Some(ConfigError::MissingEnvInterpolation { ref var }) if var == "TEST_CARTSCOUT_UNSET"
            ),
            "missing interpolation variable should be named",
        )
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTSCOUT_LOG_LEVEL", "warn");
        env::set_var("CARTSCOUT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should be set from env alias")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json format should be set from env alias",
            )
        })();

        clear_vars(&["CARTSCOUT_LOG_LEVEL", "CARTSCOUT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTSCOUT_PRICING_PROVIDERS", "instacart, uber_eats");
        env::set_var("CARTSCOUT_PRICING_DEFAULT_PROVIDER", "uber_eats");
        env::set_var("CARTSCOUT_OVERSEER_HISTORY_LIMIT", "25");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[pricing]
currency = "USD"
providers = ["amazon_fresh"]
default_provider = "amazon_fresh"

[overseer]
history_limit = 10
default_role = "admin"

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    default_role: Some("shopper".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.pricing.currency == "USD", "file currency should beat default")?;
            ensure(
                config.pricing.providers == vec!["instacart".to_string(), "uber_eats".to_string()],
                "env provider list should beat file",
            )?;
            ensure(config.pricing.default_provider == "uber_eats", "env default provider wins")?;
            ensure(config.overseer.history_limit == 25, "env history limit should beat file")?;
            ensure(config.overseer.default_role == "shopper", "override role should win")?;
            ensure(config.logging.level == "debug", "override log level should win")?;

            let registry = config.strategy_registry().map_err(|err| err.to_string())?;
            ensure(registry.default_id().as_str() == "uber_eats", "registry uses default provider")?;
            ensure(registry.strategies().len() == 2, "registry is narrowed to listed providers")
        })();

        clear_vars(&[
            "CARTSCOUT_PRICING_PROVIDERS",
            "CARTSCOUT_PRICING_DEFAULT_PROVIDER",
            "CARTSCOUT_OVERSEER_HISTORY_LIMIT",
        ]);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTSCOUT_PARSER_TIMEOUT_MS", "soon");

        let result = (|| -> Result<(), String> {
            let error = AppConfig::load(LoadOptions::default()).err();
            ensure(
                matches!(
                    error,
                    Some(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "CARTSCOUT_PARSER_TIMEOUT_MS"
                ),
                "non-numeric timeout should be an invalid override",
            )
        })();

        clear_vars(&["CARTSCOUT_PARSER_TIMEOUT_MS"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let unknown_provider = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                providers: Some(vec!["amazon_fresh".to_string(), "blinkit".to_string()]),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .err();
        ensure(
            matches!(
                unknown_provider,
                Some(ConfigError::Validation(ref message)) if message.contains("blinkit")
            ),
            "unknown provider should be named in the validation error",
        )?;

        let stray_default = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                providers: Some(vec!["instacart".to_string()]),
                default_provider: Some("amazon_fresh".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .err();
        ensure(
            matches!(
                stray_default,
                Some(ConfigError::Validation(ref message)) if message.contains("pricing.default_provider")
            ),
            "default provider outside the provider list should fail",
        )?;

        let keyless = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                parser_provider: Some(LlmProvider::OpenAi),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .err();
        ensure(
            matches!(
                keyless,
                Some(ConfigError::Validation(ref message)) if message.contains("parser.api_key")
            ),
            "hosted parser providers need an api key",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("CARTSCOUT_PARSER_API_KEY", "sk-very-secret-value");
        env::set_var("CARTSCOUT_IDENTITY_SIGNING_SECRET", "hmac-very-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-very-secret-value"), "debug must not contain api key")?;
            ensure(
                !debug.contains("hmac-very-secret-value"),
                "debug must not contain signing secret",
            )
        })();

        clear_vars(&["CARTSCOUT_PARSER_API_KEY", "CARTSCOUT_IDENTITY_SIGNING_SECRET"]);
        result
    }
}
