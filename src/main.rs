mod cli;
mod core;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::core::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "vidcost",
    about = "Cost and data generation analytics for video understanding workflows",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Load pricing rules from a JSON file instead of the built-in table
    #[arg(long, global = true)]
    pricing_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate costs and data sizes across workflows
    Report {
        /// Workflow group (all|frame|clip|novamme|tlabsmme)
        #[arg(short, long, default_value = "all")]
        group: String,

        /// Fallback region when a task does not report one
        #[arg(long)]
        region: Option<String>,

        /// Base URL used for every backend service
        #[arg(long)]
        endpoint: Option<String>,

        /// Include cost breakdown and data volume charts
        #[arg(short, long)]
        charts: bool,
    },
    /// Show the pricing rules for a region
    Pricing {
        #[arg(long)]
        region: Option<String>,
    },
    /// Price a local JSON file of usage records
    Cost {
        file: PathBuf,

        #[arg(long)]
        region: Option<String>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init {
        /// Base URL to set for every service
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Validate config file
    Check,
    /// Enable a workflow
    Add {
        /// Workflow ID to enable
        workflow: String,
    },
    /// Disable a workflow
    Remove {
        /// Workflow ID to disable
        workflow: String,
    },
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "vidcost=debug" } else { "vidcost=warn" };
    let filter = match directive.parse() {
        Ok(d) => EnvFilter::from_default_env().add_directive(d),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(path) = cli.pricing_file.clone() {
        config.settings.pricing_file = Some(path);
    }

    let output_opts = cli::output::OutputOptions {
        format: cli::output::OutputFormat::resolve(
            cli.json,
            cli.format.as_deref(),
            &config.settings.default_format,
        ),
        pretty: cli.pretty,
        use_color: cli::output::detect_color(!cli.no_color, &config.settings.color),
    };

    match cli.command {
        None => {
            let args = cli::report_cmd::ReportArgs {
                group: "all".to_string(),
                region: None,
                endpoint: None,
                charts: false,
            };
            cli::report_cmd::run(config, args, &output_opts).await?;
        }
        Some(Commands::Report {
            group,
            region,
            endpoint,
            charts,
        }) => {
            let args = cli::report_cmd::ReportArgs {
                group,
                region,
                endpoint,
                charts,
            };
            cli::report_cmd::run(config, args, &output_opts).await?;
        }
        Some(Commands::Pricing { region }) => {
            cli::pricing_cmd::show(&config, region.as_deref(), &output_opts)?;
        }
        Some(Commands::Cost { file, region }) => {
            cli::pricing_cmd::estimate(&config, &file, region.as_deref(), &output_opts)?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { endpoint } => cli::config_cmd::init(endpoint.as_deref())?,
            ConfigAction::Check => cli::config_cmd::check()?,
            ConfigAction::Add { workflow } => cli::config_cmd::add(&workflow)?,
            ConfigAction::Remove { workflow } => cli::config_cmd::remove(&workflow)?,
        },
    }

    Ok(())
}
