use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use cartscout_cli::commands::parse::ParseArgs;
use cartscout_cli::commands::workflow::WorkflowArgs;
use cartscout_cli::commands::{catalog, compare, config, parse, smoke, workflow};
use cartscout_core::config::LoadOptions;
use serde_json::Value;

#[test]
fn catalog_lists_items_and_strategies() {
    with_env(&[], || {
        let result = catalog::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "catalog");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["currency"], "INR");
        assert_eq!(payload["data"]["strategies"].as_array().map(Vec::len), Some(3));
        assert!(payload["data"]["items"].as_array().map(Vec::len).unwrap_or(0) > 30);
    });
}

#[test]
fn catalog_respects_provider_restriction_from_env() {
    with_env(
        &[
            ("CARTSCOUT_PRICING_PROVIDERS", "instacart"),
            ("CARTSCOUT_PRICING_DEFAULT_PROVIDER", "instacart"),
        ],
        || {
            let payload = parse_payload(&catalog::run(&LoadOptions::default()).output);
            assert_eq!(payload["data"]["default_provider"], "instacart");
            assert_eq!(payload["data"]["strategies"].as_array().map(Vec::len), Some(1));
        },
    );
}

#[test]
fn compare_reports_matrix_views_and_cart() {
    with_env(&[], || {
        let items = vec!["rice".to_string(), "milk".to_string(), "moonrock".to_string()];
        let result = compare::run(&LoadOptions::default(), &items);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let data = &payload["data"];
        assert_eq!(data["prices"]["items"].as_array().map(Vec::len), Some(2));
        assert_eq!(data["prices"]["dropped_items"], 1);
        assert_eq!(data["platforms"].as_array().map(Vec::len), Some(3));
        assert!(!data["cart"]["options"].as_array().map(Vec::is_empty).unwrap_or(true));
    });
}

#[test]
fn compare_without_items_is_an_input_error() {
    with_env(&[], || {
        let result = compare::run(&LoadOptions::default(), &["  ".to_string()]);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "input");
    });
}

#[test]
fn workflow_checkout_applies_coupons() {
    with_env(&[], || {
        let args = WorkflowArgs {
            items: vec!["rice".to_string(), "oil".to_string(), "milk".to_string()],
            checkout: true,
            coupons: vec!["welcome20".to_string(), "BOGUS".to_string()],
            token: None,
        };
        let result = workflow::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "output: {}", result.output);

        let payload = parse_payload(&result.output);
        let order = &payload["data"]["final_order"];
        assert_eq!(order["success"], true);
        assert_eq!(order["applied_coupons"][0]["code"], "WELCOME20");
        assert_eq!(order["invalid_coupons"].as_array().map(Vec::len), Some(1));
        assert!(payload["message"].as_str().unwrap_or("").starts_with("Order placed successfully on"));
    });
}

#[test]
fn workflow_large_order_needs_admin_role() {
    with_env(&[], || {
        let items = ["paneer", "cumin", "coffee", "cheese", "turmeric", "tea", "apple", "garam masala"];
        let args = WorkflowArgs {
            items: items.iter().map(|item| item.to_string()).collect(),
            checkout: true,
            ..WorkflowArgs::default()
        };

        let shopper = parse_payload(&workflow::run(&LoadOptions::default(), &args).output);
        assert_eq!(shopper["data"]["final_order"]["success"], false);
        assert!(shopper["message"].as_str().unwrap_or("").contains("requires admin approval"));

        let mut options = LoadOptions::default();
        options.overrides.default_role = Some("admin".to_string());
        let admin = parse_payload(&workflow::run(&options, &args).output);
        assert_eq!(admin["data"]["final_order"]["success"], true);
    });
}

#[test]
fn workflow_fails_fast_on_invalid_config() {
    with_env(&[("CARTSCOUT_PRICING_CURRENCY", "rupees")], || {
        let args = WorkflowArgs { items: vec!["rice".to_string()], ..WorkflowArgs::default() };
        let result = workflow::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn parse_quotes_free_text() {
    with_env(&[], || {
        let args = ParseArgs { text: "2 kg rice and 3 eggs".to_string(), ..ParseArgs::default() };
        let result = parse::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["screened"]["accepted"].as_array().map(Vec::len), Some(2));
        assert_eq!(payload["data"]["workflow"]["success"], true);
    });
}

#[test]
fn parse_add_fills_the_named_users_cart() {
    with_env(&[], || {
        let args = ParseArgs {
            text: "5 kg of rice and 2 liters milk from instamart".to_string(),
            add: true,
            user: Some("user-7".to_string()),
            token: None,
        };
        let result = parse::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["provider"], "instacart");
        assert_eq!(payload["data"]["cart"]["lines"].as_array().map(Vec::len), Some(2));
        assert!(payload["message"].as_str().unwrap_or("").ends_with("for user-7"));
    });
}

#[test]
fn parse_without_items_is_an_input_error() {
    with_env(&[], || {
        let args = ParseArgs { text: "something nice for dinner".to_string(), ..ParseArgs::default() };
        let result = parse::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 3);
        assert_eq!(parse_payload(&result.output)["error_class"], "input");
    });
}

#[test]
fn config_attributes_env_sources_and_redacts_secrets() {
    with_env(
        &[("CARTSCOUT_IDENTITY_SIGNING_SECRET", "hunter2-signing"), ("CARTSCOUT_LOG_LEVEL", "debug")],
        || {
            let result = config::run(&LoadOptions::default());
            assert_eq!(result.exit_code, 0);
            assert!(!result.output.contains("hunter2-signing"));

            let payload = parse_payload(&result.output);
            let secret = entry(&payload, "identity.signing_secret");
            assert_eq!(secret["value"], "<redacted>");
            assert_eq!(secret["source"], "env (CARTSCOUT_IDENTITY_SIGNING_SECRET)");

            let level = entry(&payload, "logging.level");
            assert_eq!(level["value"], "debug");
            assert_eq!(level["source"], "env (CARTSCOUT_LOG_LEVEL)");

            assert_eq!(entry(&payload, "pricing.currency")["source"], "default");
        },
    );
}

#[test]
fn config_attributes_file_and_override_sources() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("cartscout.toml");
        fs::write(&path, "[pricing]\ncurrency = \"USD\"\n\n[overseer]\nhistory_limit = 50\n")
            .expect("config file written");

        let mut options =
            LoadOptions { config_path: Some(path.clone()), require_file: true, ..LoadOptions::default() };
        options.overrides.default_role = Some("admin".to_string());

        let payload = parse_payload(&config::run(&options).output);

        let currency = entry(&payload, "pricing.currency");
        assert_eq!(currency["value"], "USD");
        assert_eq!(currency["source"], format!("file ({})", path.display()));
        assert_eq!(entry(&payload, "overseer.history_limit")["value"], "50");
        assert_eq!(entry(&payload, "overseer.default_role")["source"], "override");
    });
}

#[test]
fn config_flags_language_model_keys_as_unused() {
    with_env(&[("CARTSCOUT_PARSER_MODEL", "llama3.2")], || {
        let payload = parse_payload(&config::run(&LoadOptions::default()).output);

        for key in ["parser.provider", "parser.model", "parser.base_url", "parser.api_key"] {
            let note = entry(&payload, key)["note"].as_str().unwrap_or_default();
            assert!(note.contains("pattern extractor"), "{key}: {note}");
        }
        assert_eq!(entry(&payload, "parser.model")["source"], "env (CARTSCOUT_PARSER_MODEL)");
        assert!(entry(&payload, "parser.timeout_ms").get("note").is_none());
        assert!(entry(&payload, "pricing.currency").get("note").is_none());
    });
}

#[test]
fn smoke_returns_success_report_with_defaults() {
    with_env(&[], || {
        let result = smoke::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0, "output: {}", result.output);

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "pass");
        assert_eq!(payload["checks"].as_array().map(Vec::len), Some(5));
    });
}

#[test]
fn smoke_returns_failure_when_config_invalid() {
    with_env(&[("CARTSCOUT_OVERSEER_HEALTH_WINDOW", "0")], || {
        let result = smoke::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
    });
}

fn entry<'a>(payload: &'a Value, key: &str) -> &'a Value {
    payload["data"]
        .as_array()
        .and_then(|entries| entries.iter().find(|entry| entry["key"] == key))
        .unwrap_or_else(|| panic!("missing config entry `{key}`"))
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "CARTSCOUT_PRICING_CURRENCY",
        "CARTSCOUT_PRICING_DEFAULT_PROVIDER",
        "CARTSCOUT_PRICING_PROVIDERS",
        "CARTSCOUT_CHECKOUT_DEFAULT_LOYALTY_POINTS",
        "CARTSCOUT_CHECKOUT_SHOPPER_ORDER_CEILING",
        "CARTSCOUT_OVERSEER_DEFAULT_ROLE",
        "CARTSCOUT_OVERSEER_HISTORY_LIMIT",
        "CARTSCOUT_OVERSEER_HEALTH_WINDOW",
        "CARTSCOUT_PARSER_PROVIDER",
        "CARTSCOUT_PARSER_API_KEY",
        "CARTSCOUT_PARSER_BASE_URL",
        "CARTSCOUT_PARSER_MODEL",
        "CARTSCOUT_PARSER_TIMEOUT_MS",
        "CARTSCOUT_IDENTITY_SIGNING_SECRET",
        "CARTSCOUT_IDENTITY_ISSUER",
        "CARTSCOUT_IDENTITY_TIMEOUT_MS",
        "CARTSCOUT_IDENTITY_ALLOW_UNVERIFIED_FALLBACK",
        "CARTSCOUT_LOGGING_LEVEL",
        "CARTSCOUT_LOGGING_FORMAT",
        "CARTSCOUT_LOG_LEVEL",
        "CARTSCOUT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
