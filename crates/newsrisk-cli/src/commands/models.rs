//! Models command - list and select analysis models.

use clap::{Args, Subcommand};
use console::style;

use newsrisk_core::ModelId;

use super::{config_path, load_config, save_config};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List supported models
    List,

    /// Set the model used by default
    Use(UseArgs),
}

#[derive(Args)]
struct UseArgs {
    /// Model id, e.g. "gpt-4o-mini"
    model: ModelId,
}

pub fn run(args: ModelsArgs, explicit_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::List => list_models(explicit_path),
        ModelsCommand::Use(use_args) => use_model(use_args, explicit_path),
    }
}

fn list_models(explicit_path: Option<&str>) -> anyhow::Result<()> {
    println!("{}", style("Supported Models").bold());
    println!();

    let active = load_config(explicit_path)?.api.model;

    for model in ModelId::ALL {
        let active_marker = if model == active { " (active)" } else { "" };
        println!(
            "{} {}{}",
            style(format!("▸ {:<14}", model.as_str())).bold().cyan(),
            style(model.display_name()).dim(),
            style(active_marker).green().bold()
        );
    }

    println!();
    println!("Commands:");
    println!("  newsrisk models use <model>       Switch default model");
    println!("  newsrisk analyze -m <model> ...   Use a model for one run");

    Ok(())
}

fn use_model(args: UseArgs, explicit_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(explicit_path);
    let mut config = load_config(explicit_path)?;

    config.api.model = args.model;
    save_config(&config, &path)?;

    println!(
        "{} Switched to {}",
        style("✓").green(),
        style(args.model.as_str()).cyan().bold()
    );

    Ok(())
}
