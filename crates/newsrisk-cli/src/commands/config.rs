//! Config command - manage configuration.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use newsrisk_core::NewsRiskConfig;

use super::{config_path, load_config, save_config};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration (API key masked)
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "api.model")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Restore default model and colors, keeping the API key
    Reset,

    /// Show configuration file path
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub fn run(args: ConfigArgs, explicit_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(explicit_path),
        ConfigCommand::Init(init_args) => init_config(init_args, explicit_path),
        ConfigCommand::Get { key } => get_config(&key, explicit_path),
        ConfigCommand::Set { key, value } => set_config(&key, &value, explicit_path),
        ConfigCommand::Reset => reset_config(explicit_path),
        ConfigCommand::Path => show_path(explicit_path),
    }
}

/// Keep the first and last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        String::new()
    } else if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

fn show_config(explicit_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(explicit_path);

    if !path.exists() {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }
    let mut config = load_config(explicit_path)?;
    config.api.api_key = mask_key(&config.api.api_key);

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, explicit_path: Option<&str>) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| config_path(explicit_path));

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    save_config(&NewsRiskConfig::default(), &output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(key: &str, explicit_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(explicit_path)?;

    // Convert config to JSON for key lookup
    let json = serde_json::to_value(&config)?;

    let mut current = &json;
    for part in key.split('.') {
        current = current
            .get(part)
            .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;
    }

    println!("{}", serde_json::to_string_pretty(current)?);

    Ok(())
}

fn set_config(key: &str, value: &str, explicit_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(explicit_path);
    let config = if path.exists() {
        NewsRiskConfig::from_file(&path)?
    } else {
        NewsRiskConfig::default()
    };

    // Numbers and booleans parse as JSON; anything else is a string
    let parsed_value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));

    let mut json = serde_json::to_value(&config)?;

    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        anyhow::bail!("Empty configuration key");
    };

    let mut current = &mut json;
    for part in parents {
        current = current
            .get_mut(*part)
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
    }

    let obj = current
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Cannot set value at non-object path"))?;
    if !obj.contains_key(*last) {
        anyhow::bail!("Configuration key not found: {}", key);
    }
    obj.insert((*last).to_string(), parsed_value.clone());

    // Round-trip through the typed config to reject invalid values
    let config: NewsRiskConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;
    save_config(&config, &path)?;

    let shown = if key == "api.api_key" {
        Value::String(mask_key(value))
    } else {
        parsed_value
    };
    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&shown)?
    );

    Ok(())
}

fn reset_config(explicit_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(explicit_path);
    let mut config = load_config(explicit_path)?;

    config.reset_keeping_key();
    save_config(&config, &path)?;

    println!(
        "{} Settings reset to defaults (API key kept)",
        style("✓").green()
    );

    Ok(())
}

fn show_path(explicit_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(explicit_path);

    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'newsrisk config init' to create a configuration file.");
    }

    Ok(())
}
