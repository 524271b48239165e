use std::time::Duration;

use cartscout_agent::identity::{resolve_within, SignedTokenResolver};
use cartscout_core::config::LoadOptions;
use cartscout_core::domain::checkout::CheckoutRequest;
use cartscout_core::domain::item::PriceQuery;
use cartscout_core::{ApplicationError, Overseer, ProviderId};

use crate::commands::{block_on, item_names, load_config, CommandResult, EXIT_WORKFLOW};

#[derive(Debug, Clone, Default)]
pub struct WorkflowArgs {
    pub items: Vec<String>,
    pub checkout: bool,
    pub coupons: Vec<String>,
    pub token: Option<String>,
}

pub fn run(options: &LoadOptions, args: &WorkflowArgs) -> CommandResult {
    let names = item_names(&args.items);
    if names.is_empty() {
        return CommandResult::from_error(
            "workflow",
            &ApplicationError::InvalidInput("at least one item is required".to_string()),
        );
    }

    let config = match load_config("workflow", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let mut overseer = match Overseer::from_config(&config) {
        Ok(overseer) => overseer,
        Err(error) => return CommandResult::from_error("workflow", &ApplicationError::from(error)),
    };

    let resolver = SignedTokenResolver::from_config(&config.identity);
    let timeout = Duration::from_millis(config.identity.timeout_ms);
    let identity = match block_on(
        "workflow",
        resolve_within(&resolver, args.token.as_deref(), timeout),
    ) {
        Ok(identity) => identity,
        Err(failure) => return failure,
    };
    if identity.verified {
        overseer = overseer.with_default_role(identity.role.clone());
    }

    let checkout = args.checkout.then(|| {
        CheckoutRequest::new(
            identity.user_id.clone(),
            ProviderId::new(config.pricing.default_provider.as_str()),
            Vec::new(),
        )
        .with_coupons(args.coupons.iter().cloned())
    });

    let result = overseer.execute_workflow(&PriceQuery::from_names(names), checkout);
    if !result.success {
        return CommandResult::failure(
            "workflow",
            "workflow_failed",
            result.errors.join("; "),
            EXIT_WORKFLOW,
        );
    }

    let message = match &result.final_order {
        Some(order) => order.message.clone(),
        None => format!(
            "workflow {} completed; estimated savings {} {}",
            result.workflow_id, config.pricing.currency, result.total_cost_savings
        ),
    };
    CommandResult::success_with_data("workflow", message, &result)
}
