use crate::output::{print_json, print_table};
use anyhow::Context;
use slashdash_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, verb: &str, noun: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let mapper = config.mapper().context("invalid mapping config")?;
    let result = mapper.map(verb, noun);

    if json {
        return print_json(&result);
    }

    let Some(ref target) = result.target_command else {
        println!("No command matches '{}'.", result.input_verb);
        return Ok(());
    };

    let verdict = if result.requires_confirmation {
        "needs confirmation"
    } else {
        "direct"
    };
    println!(
        "{} -> /{target} ({:.1}%, {verdict})",
        result.input_verb, result.confidence
    );
    if let Some(ref description) = result.target_description {
        println!("  {description}");
    }

    if !result.alternatives.is_empty() {
        println!();
        let rows = result
            .alternatives
            .iter()
            .map(|c| {
                vec![
                    format!("/{}", c.command),
                    format!("{:.1}", c.confidence),
                    c.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        print_table(&["ALTERNATIVE", "CONFIDENCE", "DESCRIPTION"], rows);
    }

    Ok(())
}
