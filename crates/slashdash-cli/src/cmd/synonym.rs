use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use slashdash_core::{config::Config, mapper::DEFAULT_SYNONYM_WEIGHT};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SynonymSubcommand {
    /// List synonyms, optionally for one command
    List {
        /// Canonical command name, e.g. analyze-data
        command: Option<String>,
    },

    /// Add a synonym (creates the command if it is new)
    Add {
        command: String,
        alias: String,
        /// Weight in [0, 100]; out-of-range values are clamped
        #[arg(long, default_value_t = DEFAULT_SYNONYM_WEIGHT)]
        weight: f64,
    },

    /// Remove a synonym from a command
    Remove { command: String, alias: String },

    /// Show which commands an exact alias belongs to
    Find { alias: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: SynonymSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SynonymSubcommand::List { command } => list(root, command.as_deref(), json),
        SynonymSubcommand::Add {
            command,
            alias,
            weight,
        } => add(root, &command, &alias, weight),
        SynonymSubcommand::Remove { command, alias } => remove(root, &command, &alias),
        SynonymSubcommand::Find { alias } => find(root, &alias, json),
    }
}

fn list(root: &Path, command: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let store = config.synonym_store();

    if let Some(name) = command {
        if !store.contains(name) {
            anyhow::bail!("unknown command: {name}");
        }
    }
    let groups: Vec<_> = store
        .iter()
        .filter(|(name, _)| command.map_or(true, |c| c == *name))
        .collect();

    if json {
        let value: Vec<serde_json::Value> = groups
            .iter()
            .map(|(name, aliases)| serde_json::json!({ "command": name, "synonyms": aliases }))
            .collect();
        return print_json(&value);
    }

    let mut rows = Vec::new();
    for (name, aliases) in groups {
        let mut sorted: Vec<(&String, &f64)> = aliases.iter().collect();
        sorted.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (alias, weight) in sorted {
            rows.push(vec![name.to_string(), alias.clone(), format!("{weight:.0}")]);
        }
    }
    print_table(&["COMMAND", "ALIAS", "WEIGHT"], rows);
    Ok(())
}

fn add(root: &Path, command: &str, alias: &str, weight: f64) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    config
        .add_synonym(command, alias, weight)
        .with_context(|| format!("cannot add '{alias}' to {command}"))?;
    config.save(root).context("failed to save config")?;
    println!("Added synonym '{}' -> /{command}.", alias.trim().to_lowercase());
    Ok(())
}

fn remove(root: &Path, command: &str, alias: &str) -> anyhow::Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if !config.remove_synonym(command, alias)? {
        anyhow::bail!("'{alias}' is not a synonym of {command}");
    }
    config.save(root).context("failed to save config")?;
    println!("Removed synonym '{alias}' from /{command}.");
    Ok(())
}

fn find(root: &Path, alias: &str, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let matches = config.synonym_store().find_by_synonym(alias);

    if json {
        let value: Vec<serde_json::Value> = matches
            .iter()
            .map(|(command, weight)| serde_json::json!({ "command": command, "weight": weight }))
            .collect();
        return print_json(&value);
    }

    if matches.is_empty() {
        println!("No command has the synonym '{alias}'.");
        return Ok(());
    }
    let rows = matches
        .into_iter()
        .map(|(command, weight)| vec![command, format!("{weight:.0}")])
        .collect();
    print_table(&["COMMAND", "WEIGHT"], rows);
    Ok(())
}
