pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use cartscout_core::config::{ConfigOverrides, LoadOptions};
use clap::{Args, Parser, Subcommand};

use crate::commands::parse::ParseArgs;
use crate::commands::workflow::WorkflowArgs;

#[derive(Debug, Parser)]
#[command(
    name = "cartscout",
    about = "CartScout grocery price comparison CLI",
    long_about = "Compare grocery prices across providers, build carts, run checkout workflows, and inspect configuration.",
    after_help = "Examples:\n  cartscout compare rice milk eggs\n  cartscout workflow rice paneer --checkout --coupon WELCOME20\n  cartscout parse \"5 kg of rice and 2 liters milk from instamart\" --add\n  cartscout smoke"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Path to a cartscout.toml file")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Currency code for quotes, e.g. INR")]
    pub currency: Option<String>,
    #[arg(
        long,
        global = true,
        value_delimiter = ',',
        help = "Comma-separated provider ids to query"
    )]
    pub providers: Option<Vec<String>>,
    #[arg(long = "default-provider", global = true)]
    pub default_provider: Option<String>,
    #[arg(long, global = true, help = "Role used for checkout delegation checks")]
    pub role: Option<String>,
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
}

impl GlobalArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                currency: self.currency.clone(),
                default_provider: self.default_provider.clone(),
                providers: self.providers.clone(),
                default_role: self.role.clone(),
                log_level: self.log_level.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List catalog items and provider strategies")]
    Catalog,
    #[command(about = "Price items across every provider and summarize the matrix")]
    Compare {
        #[arg(required = true)]
        items: Vec<String>,
    },
    #[command(about = "Run scouting, cart building and optional checkout for the given items")]
    Workflow {
        #[arg(required = true)]
        items: Vec<String>,
        #[arg(long, help = "Place an order for the best cart option")]
        checkout: bool,
        #[arg(long = "coupon", help = "Coupon code; repeat for several")]
        coupons: Vec<String>,
        #[arg(long, help = "Signed session token identifying the shopper")]
        token: Option<String>,
    },
    #[command(about = "Parse free text into items; quote them, or add them to a cart with --add")]
    Parse {
        text: String,
        #[arg(long)]
        add: bool,
        #[arg(long, help = "Cart owner; defaults to the token subject or anonymous")]
        user: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Run end-to-end readiness checks with per-check timing details")]
    Smoke,
}

pub fn execute(cli: Cli) -> ExitCode {
    let options = cli.global.load_options();

    let result = match cli.command {
        Command::Catalog => commands::catalog::run(&options),
        Command::Compare { items } => commands::compare::run(&options, &items),
        Command::Workflow { items, checkout, coupons, token } => {
            commands::workflow::run(&options, &WorkflowArgs { items, checkout, coupons, token })
        }
        Command::Parse { text, add, user, token } => {
            commands::parse::run(&options, &ParseArgs { text, add, user, token })
        }
        Command::Config => commands::config::run(&options),
        Command::Smoke => commands::smoke::run(&options),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
