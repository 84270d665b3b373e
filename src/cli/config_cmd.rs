use anyhow::Result;

use crate::core::config::AppConfig;
use crate::core::workflow::WorkflowType;

pub fn init(endpoint: Option<&str>) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    let mut config = AppConfig::default();
    if let Some(endpoint) = endpoint {
        config.override_endpoint(endpoint);
    }

    match config.save() {
        Ok(path) => {
            println!("Generated config at {}", path.display());
            let enabled: Vec<&str> = config.enabled_workflows().iter().map(|w| w.id()).collect();
            println!("  Workflows enabled: {}", enabled.join(", "));
            if endpoint.is_none() {
                println!("  Set a base_url for each service before running a report.");
            }
        }
        Err(e) => {
            eprintln!("Failed to generate config: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn parse_workflow(workflow_id: &str) -> WorkflowType {
    match WorkflowType::from_id(workflow_id) {
        Some(w) => w,
        None => {
            eprintln!("Unknown workflow: {}", workflow_id);
            std::process::exit(1);
        }
    }
}

pub fn add(workflow_id: &str) -> Result<()> {
    let workflow = parse_workflow(workflow_id);
    let mut config = AppConfig::load()?;

    if !config.set_workflow_enabled(workflow, true) {
        eprintln!("Workflow '{}' is already enabled", workflow.id());
        std::process::exit(1);
    }

    config.save()?;
    println!("Enabled workflow: {}", workflow.id());
    Ok(())
}

pub fn remove(workflow_id: &str) -> Result<()> {
    let workflow = parse_workflow(workflow_id);
    let mut config = AppConfig::load()?;

    if !config.set_workflow_enabled(workflow, false) {
        eprintln!("Workflow '{}' is already disabled", workflow.id());
        std::process::exit(1);
    }

    config.save()?;
    println!("Disabled workflow: {}", workflow.id());
    Ok(())
}

pub fn check() -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `vidcost config init` to create one.");
        return Ok(());
    }

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let mut issues = config.validate();
    if let Err(e) = config.settings.pricing_table() {
        issues.push(e.to_string());
    }

    if issues.is_empty() {
        println!("Config is valid: {}", path.display());
        let enabled: Vec<&str> = config.enabled_workflows().iter().map(|w| w.id()).collect();
        if enabled.is_empty() {
            println!("  No workflows enabled.");
        } else {
            println!("  Enabled workflows: {}", enabled.join(", "));
        }
        println!("  Region: {}", config.settings.region);
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        std::process::exit(1);
    }
    Ok(())
}
