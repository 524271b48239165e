use std::time::{Duration, Instant};

use cartscout_agent::identity::{resolve_within, SignedTokenResolver};
use cartscout_agent::parser::PatternItemParser;
use cartscout_core::config::{AppConfig, LoadOptions};
use cartscout_core::domain::item::PriceQuery;
use cartscout_core::Overseer;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_SMOKE};

const SMOKE_ITEMS: [&str; 3] = ["rice", "milk", "tomato"];
const SMOKE_TEXT: &str = "2 kg rice and 1 liter milk";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

impl SmokeCheck {
    fn outcome(name: &'static str, started: Instant, result: Result<String, String>) -> Self {
        let (status, message) = match result {
            Ok(message) => (SmokeStatus::Pass, message),
            Err(message) => (SmokeStatus::Fail, message),
        };
        Self { name, status, elapsed_ms: started.elapsed().as_millis() as u64, message }
    }
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(options.clone())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("overseer_wiring"));
            checks.push(skipped("workflow_roundtrip"));
            checks.push(skipped("pattern_parser"));
            checks.push(skipped("identity_resolution"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let overseer = match timed_check(|| Overseer::from_config(&config)) {
        Ok((elapsed_ms, overseer)) => {
            checks.push(SmokeCheck {
                name: "overseer_wiring",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: format!("{} providers registered", overseer.scout().providers().len()),
            });
            overseer
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "overseer_wiring",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("workflow_roundtrip"));
            checks.push(skipped("pattern_parser"));
            checks.push(skipped("identity_resolution"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let workflow_started = Instant::now();
    let result = overseer.execute_workflow(&PriceQuery::from_names(SMOKE_ITEMS), None);
    let option_count = result.cart_plan.as_ref().map(|plan| plan.options.len()).unwrap_or(0);
    checks.push(SmokeCheck::outcome(
        "workflow_roundtrip",
        workflow_started,
        if result.success && option_count > 0 {
            Ok(format!("{} cart options for {} items", option_count, SMOKE_ITEMS.len()))
        } else {
            Err(format!("workflow did not complete: {}", result.errors.join("; ")))
        },
    ));

    let parser_started = Instant::now();
    let parsed = PatternItemParser.extract(SMOKE_TEXT);
    checks.push(SmokeCheck::outcome(
        "pattern_parser",
        parser_started,
        if parsed.items.len() == 2 {
            Ok("pattern extractor reads quantities and units".to_string())
        } else {
            Err(format!("expected 2 items from `{SMOKE_TEXT}`, got {}", parsed.items.len()))
        },
    ));

    let identity_started = Instant::now();
    let identity_check = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => {
            let resolver = SignedTokenResolver::from_config(&config.identity);
            let timeout = Duration::from_millis(config.identity.timeout_ms);
            let identity = runtime.block_on(resolve_within(&resolver, None, timeout));
            if identity.verified {
                Err("an absent token resolved to a verified identity".to_string())
            } else {
                Ok(format!("anonymous requests resolve to role `{}`", identity.role))
            }
        }
        Err(error) => Err(format!("failed to initialize async runtime: {error}")),
    };
    checks.push(SmokeCheck::outcome("identity_resolution", identity_started, identity_check));

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "not run: an earlier check failed".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult {
        exit_code: if failed { EXIT_SMOKE } else { 0 },
        output: format!("{human}\n{machine}"),
    }
}
