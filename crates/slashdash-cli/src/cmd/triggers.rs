use crate::cmd::check::CommandArgs;
use crate::output::{print_json, print_table};
use anyhow::Context;
use slashdash_core::{
    config::Config,
    trigger::{LargeTaskCause, TriggerDetails, TriggerResult},
};
use std::path::Path;

pub fn run(root: &Path, args: &CommandArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let pipeline = config.pipeline().context("invalid config")?;
    let (command, _, ctx) = args.resolve(&pipeline)?;

    let checker = pipeline.protocol().checker();
    let fired = checker.check_all(&command, &ctx);
    let highest = checker.check_highest_priority(&command, &ctx);

    if json {
        let value = serde_json::json!({
            "command": command.raw(),
            "triggers": fired,
            "highest": highest,
        });
        return print_json(&value);
    }

    if fired.is_empty() {
        println!("No triggers fired for `{}`.", command.raw());
        return Ok(());
    }

    println!("Triggers for `{}`:", command.raw());
    println!();
    let rows = fired
        .iter()
        .map(|t| {
            vec![
                t.trigger_type.to_string(),
                t.severity.to_string(),
                describe(t),
            ]
        })
        .collect();
    print_table(&["TRIGGER", "SEVERITY", "DETAILS"], rows);
    println!();
    println!(
        "Highest priority: {} (severity {})",
        highest.trigger_type, highest.severity
    );
    Ok(())
}

fn describe(trigger: &TriggerResult) -> String {
    match trigger.details {
        TriggerDetails::None => String::new(),
        TriggerDetails::HighRisk { ref reason, .. } => reason.clone(),
        TriggerDetails::AmbiguousVerb {
            ref verb,
            confidence,
            threshold,
            ref candidates,
        } => format!(
            "'{verb}' at {confidence:.1}% (threshold {threshold:.1}), {} candidate(s)",
            candidates.len()
        ),
        TriggerDetails::InputError {
            ref error,
            ref input,
        } => match input {
            Some(input) => format!("{} ({input})", error.message),
            None => error.message.clone(),
        },
        TriggerDetails::PreviousError {
            ref previous_error,
            ref recovery_options,
        } => format!(
            "{} ({} recovery option(s))",
            previous_error.message,
            recovery_options.len()
        ),
        TriggerDetails::LargeTask {
            estimated_tokens,
            estimated_steps,
            triggered_by,
            ..
        } => format!(
            "{estimated_tokens} tokens, {estimated_steps} steps (by {})",
            match triggered_by {
                LargeTaskCause::Tokens => "tokens",
                LargeTaskCause::Steps => "steps",
            }
        ),
        TriggerDetails::MissingRequired { ref missing_params } => {
            format!("missing: {}", missing_params.join(", "))
        }
    }
}
