use anyhow::{Context, Result};
use tracing::debug;

use crate::cli::output::{to_json, OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::backend::HttpBackend;
use crate::core::config::AppConfig;
use crate::core::report::aggregator::CostContext;
use crate::core::report::assembler::load_report;
use crate::core::workflow::WorkflowGroup;

pub struct ReportArgs {
    pub group: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub charts: bool,
}

/// Load the analytics report and print it. Exits non-zero when the load
/// fails as a whole.
pub async fn run(config: AppConfig, args: ReportArgs, opts: &OutputOptions) -> Result<()> {
    let mut config = config;
    if let Some(endpoint) = &args.endpoint {
        config.override_endpoint(endpoint);
    }

    let group = match WorkflowGroup::parse(&args.group) {
        Some(g) => g,
        None => {
            eprintln!(
                "Unknown workflow group: '{}' (expected all|frame|clip|novamme|tlabsmme)",
                args.group
            );
            std::process::exit(1);
        }
    };
    let workflows = group.select(&config.enabled_workflows());
    if workflows.is_empty() {
        eprintln!("No enabled workflows selected. Run `vidcost config add <workflow>` to enable one.");
        return Ok(());
    }

    let services: Vec<_> = config
        .services
        .iter()
        .filter(|s| workflows.iter().any(|w| w.service() == s.name))
        .cloned()
        .collect();
    let backend = HttpBackend::new(&services, config.settings.timeout())
        .context("Invalid service configuration")?;

    let pricing = config
        .settings
        .pricing_table()
        .context("Failed to load pricing table")?;
    let region = args.region.as_deref().unwrap_or(&config.settings.region);
    let ctx = CostContext {
        pricing: &pricing,
        default_region: region,
        infra_rate_per_second: config.settings.infra_rate_per_second,
    };
    debug!(?workflows, region, "loading report");

    // Spinner on stderr while loading (text mode only)
    let spinner = if matches!(opts.format, OutputFormat::Text) {
        Some(tokio::spawn(async move {
            let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
            let mut i = 0usize;
            loop {
                eprint!("\r {} Loading data generation analytics...", frames[i % frames.len()]);
                i = i.wrapping_add(1);
                tokio::time::sleep(std::time::Duration::from_millis(80)).await;
            }
        }))
    } else {
        None
    };

    let state = load_report(&backend, &workflows, ctx).await;

    if let Some(s) = spinner {
        s.abort();
        eprint!("\r\x1b[2K");
    }

    if let Some(total) = state.report.total() {
        debug!(
            videos = total.video_count,
            total_cost = total.total_cost,
            data_size = total.data_size,
            "report totals"
        );
    }

    match opts.format {
        OutputFormat::Text => match &state.error {
            Some(message) => eprintln!("{}", renderer::render_error(message, opts.use_color)),
            None => println!(
                "{}",
                renderer::render_report(&state.report, args.charts, opts.use_color)
            ),
        },
        OutputFormat::Json => println!("{}", to_json(&state, opts)?),
    }

    if state.error.is_some() {
        std::process::exit(1);
    }
    Ok(())
}
