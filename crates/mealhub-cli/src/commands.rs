use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use mealhub_sdk::{HubConfig, MealHub};
use mealhub_server::{InMemoryRejectionLog, MealHubServer, ServerConfig};
use mealhub_types::{compose_image_address, compose_key, slugify, Container, Credential};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Slug(args) => cmd_slug(args, &format),
        Command::Key(args) => cmd_key(args, &format),
        Command::Address(args) => cmd_address(args, &format),
        Command::Config(args) => cmd_config(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let (hub_config, mut server_config) = load_configs(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        server_config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind:?}"))?;
    }

    println!("{} MealHub on {}", "✓".green().bold(), server_config.bind_addr.to_string().bold());
    println!("  Meals table: {}", hub_config.meals_table.cyan());
    println!("  Restaurants table: {}", hub_config.restaurants_table.cyan());
    println!("  Stores: {}", "in-memory".yellow());

    let hub = MealHub::in_memory(&hub_config);
    let server = MealHubServer::new(server_config, hub)
        .with_rejection_log(Arc::new(InMemoryRejectionLog::new()));
    tokio::runtime::Runtime::new()?.block_on(server.serve())?;
    Ok(())
}

fn cmd_slug(args: SlugArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let slug = slugify(&args.text);
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "slug": slug })),
        OutputFormat::Text => println!("{}", slug.as_str().green()),
    }
    Ok(())
}

fn cmd_key(args: KeyArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let key = compose_key(&args.area, &args.name)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&key)?),
        OutputFormat::Text => {
            println!("PartitionKey: {}", key.partition_key.yellow());
            println!("RowKey:       {}", key.row_key.green());
        }
    }
    Ok(())
}

fn cmd_address(args: AddressArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let container: Container = args.container.parse()?;
    let image = compose_image_address(container, &args.area, &args.item, &args.file)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&image)?),
        OutputFormat::Text => println!("{}/{}", image.container.to_string().cyan(), image.path.green()),
    }
    Ok(())
}

fn cmd_config(args: ConfigArgs) -> anyhow::Result<()> {
    let (hub_config, server_config) = load_configs(args.config.as_deref())?;
    print!("{}", render_config(&hub_config, &server_config)?);
    Ok(())
}

/// Hub settings from `path` (or defaults) with environment overrides applied,
/// plus the server settings from the same file.
fn load_configs(path: Option<&Path>) -> anyhow::Result<(HubConfig, ServerConfig)> {
    let (hub, server) = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            (HubConfig::from_toml_str(&text)?, ServerConfig::from_toml_str(&text)?)
        }
        None => (HubConfig::default(), ServerConfig::default()),
    };
    let hub = hub.with_env_overrides(|name| std::env::var(name).ok())?;
    Ok((hub, server))
}

#[derive(Serialize)]
struct ServerSection<'a> {
    server: &'a ServerConfig,
}

/// The effective configuration as TOML, with the credential redacted.
fn render_config(hub: &HubConfig, server: &ServerConfig) -> anyhow::Result<String> {
    let mut hub = hub.clone();
    if !hub.credential.is_empty() {
        hub.credential = Credential::new("<redacted>");
    }
    let mut out = toml::to_string_pretty(&hub)?;
    out.push('\n');
    out.push_str(&toml::to_string_pretty(&ServerSection { server })?);
    Ok(out)
}
