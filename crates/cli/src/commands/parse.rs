use cartscout_agent::runtime::AgentRuntime;
use cartscout_core::config::LoadOptions;

use crate::commands::{agent_failure, block_on, load_config, CommandResult};

#[derive(Debug, Clone, Default)]
pub struct ParseArgs {
    pub text: String,
    pub add: bool,
    pub user: Option<String>,
    pub token: Option<String>,
}

/// Quotes free text, or with `add` puts the parsed items into the caller's cart.
pub fn run(options: &LoadOptions, args: &ParseArgs) -> CommandResult {
    let config = match load_config("parse", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match AgentRuntime::from_config(&config, None) {
        Ok(runtime) => runtime,
        Err(error) => return agent_failure("parse", error),
    };

    let outcome = block_on("parse", async {
        if !args.add {
            return runtime.quote_text(&args.text).await.map(|quote| {
                let message = format!(
                    "parsed {} items ({} rejected)",
                    quote.screened.accepted.len(),
                    quote.screened.rejected.len()
                );
                CommandResult::success_with_data("parse", message, &quote)
            });
        }

        let user_id = match &args.user {
            Some(user) => user.clone(),
            None => runtime.resolve_identity(args.token.as_deref()).await.user_id,
        };
        runtime.parse_and_add(&user_id, &args.text).await.map(|outcome| {
            let message = format!(
                "added {} items to the {} cart for {user_id}",
                outcome.added_items.len(),
                outcome.provider
            );
            CommandResult::success_with_data("parse", message, &outcome)
        })
    });

    match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(error)) => agent_failure("parse", error),
        Err(failure) => failure,
    }
}
