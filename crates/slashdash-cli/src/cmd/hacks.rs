use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use slashdash_core::{
    config::Config,
    hacks::{preset, HackSet, PRESETS},
    injector::{self, InjectOptions, InjectionPosition, InjectionStyle},
    SlashdashError,
};
use std::io::Read;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum HacksSubcommand {
    /// List hacks with their milestone and enabled state
    List,

    /// Show one hack's postscript and usage hints
    Show { id: String },

    /// List the available presets
    Presets,

    /// Replace the enabled set with a preset and clear per-hack overrides
    ApplyPreset { preset: String },

    /// Enable one hack on top of the preset
    Enable { id: String },

    /// Disable one hack on top of the preset
    Disable { id: String },

    /// Inject a hack into a prompt (reads stdin when --prompt is omitted)
    Inject {
        id: String,

        #[arg(long)]
        prompt: Option<String>,

        /// minimal, default, boxed, or highlight
        #[arg(long)]
        style: Option<InjectionStyle>,

        /// prepend, append, or wrap
        #[arg(long)]
        position: Option<InjectionPosition>,

        /// Add the hack's enhanced addendum
        #[arg(long)]
        enhanced: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: HacksSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        HacksSubcommand::List => list(root, json),
        HacksSubcommand::Show { id } => show(root, &id, json),
        HacksSubcommand::Presets => presets(root, json),
        HacksSubcommand::ApplyPreset { preset } => apply_preset(root, &preset),
        HacksSubcommand::Enable { id } => toggle(root, &id, true),
        HacksSubcommand::Disable { id } => toggle(root, &id, false),
        HacksSubcommand::Inject {
            id,
            prompt,
            style,
            position,
            enhanced,
        } => {
            let config = Config::load_or_default(root).context("failed to load config")?;
            let options = InjectOptions {
                style: style.unwrap_or(config.injection.style),
                position: position.unwrap_or(config.injection.position),
                enhanced: enhanced || config.injection.enhanced,
            };
            inject(&config, &id, prompt, options, json)
        }
    }
}

fn load_hacks(root: &Path) -> anyhow::Result<HackSet> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    config.hack_set().context("invalid hacks config")
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let hacks = load_hacks(root)?;
    if json {
        let all: Vec<_> = hacks.iter().collect();
        return print_json(&all);
    }

    let rows = hacks
        .iter()
        .map(|h| {
            vec![
                h.id.clone(),
                h.name.clone(),
                format!("{}%", h.milestone),
                if h.enabled { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "MILESTONE", "ENABLED"], rows);
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let hacks = load_hacks(root)?;
    let hack = hacks
        .get(id)
        .ok_or_else(|| SlashdashError::UnknownHack(id.to_string()))?;
    if json {
        return print_json(hack);
    }
    print!("{}", injector::preview(hack));
    Ok(())
}

fn presets(root: &Path, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&PRESETS);
    }

    let config = Config::load_or_default(root).context("failed to load config")?;
    let rows = PRESETS
        .iter()
        .map(|p| {
            let marker = if p.id == config.hacks.preset { "*" } else { "" };
            vec![
                format!("{}{marker}", p.id),
                p.description.to_string(),
                p.enabled_hacks.join(", "),
            ]
        })
        .collect();
    print_table(&["PRESET", "DESCRIPTION", "HACKS"], rows);
    Ok(())
}

fn apply_preset(root: &Path, id: &str) -> anyhow::Result<()> {
    let chosen = preset(id).ok_or_else(|| SlashdashError::UnknownPreset(id.to_string()))?;
    let mut config = Config::load(root).context("failed to load config")?;
    config.hacks.preset = chosen.id.to_string();
    config.hacks.overrides.clear();
    config.save(root).context("failed to save config")?;

    println!("Applied preset '{}' ({}).", chosen.id, chosen.name);
    if chosen.enabled_hacks.is_empty() {
        println!("  all hacks disabled");
    } else {
        println!("  enabled: {}", chosen.enabled_hacks.join(", "));
    }
    Ok(())
}

fn toggle(root: &Path, id: &str, enabled: bool) -> anyhow::Result<()> {
    if HackSet::default().get(id).is_none() {
        return Err(SlashdashError::UnknownHack(id.to_string()).into());
    }
    let mut config = Config::load(root).context("failed to load config")?;
    config.hacks.overrides.insert(id.to_string(), enabled);
    config.save(root).context("failed to save config")?;
    println!(
        "{} hack '{id}'.",
        if enabled { "Enabled" } else { "Disabled" }
    );
    Ok(())
}

fn inject(
    config: &Config,
    id: &str,
    prompt: Option<String>,
    options: InjectOptions,
    json: bool,
) -> anyhow::Result<()> {
    let hacks = config.hack_set().context("invalid hacks config")?;
    let hack = hacks
        .get(id)
        .ok_or_else(|| SlashdashError::UnknownHack(id.to_string()))?;

    let prompt = match prompt {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read prompt from stdin")?;
            buf.trim_end().to_string()
        }
    };

    let result = injector::inject(&prompt, hack, options);
    if json {
        return print_json(&result);
    }
    println!("{}", result.injected);
    Ok(())
}
