use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use serde::Serialize;
use slashdash_core::{
    command::{InputRef, ParamValue, ParsedCommand},
    config::Config,
    context::CheckContext,
    mapper::MappingResult,
    pipeline::Pipeline,
    protocol::ConfirmationResponse,
    types::ConfirmationStatus,
};
use std::path::Path;

// ---------------------------------------------------------------------------
// Shared arguments
// ---------------------------------------------------------------------------

/// A command plus the signals gathered about it before it runs.
#[derive(Args, Debug, Clone)]
pub struct CommandArgs {
    /// Command name, with or without the leading slash (e.g. analyze-data)
    pub command: String,

    /// Input object as kind:id (e.g. file:sales.csv)
    #[arg(long)]
    pub input: Option<InputRef>,

    /// Command parameter as key=value; a bare key is a flag (repeatable)
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Override the mapping confidence (0-100)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Estimated token cost of the task
    #[arg(long)]
    pub tokens: Option<u64>,

    /// Estimated number of workflow steps
    #[arg(long)]
    pub steps: Option<u32>,

    /// A planned workflow step (repeatable)
    #[arg(long = "workflow-step", value_name = "STEP")]
    pub workflow_steps: Vec<String>,

    /// Error found while validating the input
    #[arg(long)]
    pub input_error: Option<String>,

    /// Error left by the previous command
    #[arg(long)]
    pub previous_error: Option<String>,

    /// Recovery command to offer after a previous error (repeatable)
    #[arg(long = "recovery", value_name = "COMMAND")]
    pub recovery: Vec<String>,

    /// Recently used resource, as kind:id or a file name (repeatable)
    #[arg(long = "recent", value_name = "RESOURCE")]
    pub recent: Vec<String>,

    /// Task progress in percent
    #[arg(long)]
    pub progress: Option<u32>,

    /// Check the command exactly as given, without verb mapping
    #[arg(long)]
    pub no_map: bool,
}

impl CommandArgs {
    pub fn parsed(&self) -> anyhow::Result<ParsedCommand> {
        let name = self.command.trim().trim_start_matches('/');
        if name.is_empty() {
            anyhow::bail!("command name must not be empty");
        }
        let mut command = ParsedCommand::new(name);
        if let Some(ref input) = self.input {
            command = command.with_input(input.clone());
        }
        for param in &self.params {
            let (key, value) = parse_param(param)?;
            command = command.with_param(key, value);
        }
        Ok(command)
    }

    /// Map the command (unless `--no-map`) and layer the flag signals over
    /// the mapping context.
    pub fn resolve(
        &self,
        pipeline: &Pipeline,
    ) -> anyhow::Result<(ParsedCommand, Option<MappingResult>, CheckContext)> {
        let command = self.parsed()?;
        let (command, mapping, mut ctx) = if self.no_map {
            let missing = pipeline.mapper().catalog().missing_required(&command);
            (command, None, CheckContext::new().with_missing_params(missing))
        } else {
            let resolution = pipeline.resolve(&command);
            (
                resolution.command,
                Some(resolution.mapping),
                resolution.context,
            )
        };

        if let Some(confidence) = self.confidence {
            ctx.mapping_confidence = Some(confidence);
        }
        if let Some(tokens) = self.tokens {
            ctx = ctx.with_estimated_tokens(tokens);
        }
        if let Some(steps) = self.steps {
            ctx = ctx.with_estimated_steps(steps);
        }
        if !self.workflow_steps.is_empty() {
            ctx = ctx.with_workflow_steps(self.workflow_steps.iter().cloned());
        }
        if let Some(ref error) = self.input_error {
            ctx = ctx.with_input_error(error.clone());
        }
        if let Some(ref error) = self.previous_error {
            ctx = ctx.with_previous_error(error.clone());
        }
        for recovery in &self.recovery {
            let recovery = if recovery.starts_with('/') {
                recovery.clone()
            } else {
                format!("/{recovery}")
            };
            ctx = ctx.with_recovery_option(recovery.clone(), format!("Run {recovery}"));
        }
        if !self.recent.is_empty() {
            ctx = ctx.with_recent_resources(self.recent.iter().cloned());
        }
        if let Some(progress) = self.progress {
            ctx = ctx.with_progress(progress);
        }

        Ok((command, mapping, ctx))
    }
}

fn parse_param(raw: &str) -> anyhow::Result<(String, ParamValue)> {
    let (key, value) = match raw.split_once('=') {
        Some((k, v)) => (k.trim(), Some(v.trim())),
        None => (raw.trim(), None),
    };
    if key.is_empty() {
        anyhow::bail!("invalid parameter '{raw}': expected key=value");
    }
    let value = match value {
        None | Some("true") => ParamValue::Flag(true),
        Some("false") => ParamValue::Flag(false),
        Some(v) => {
            if let Ok(i) = v.parse::<i64>() {
                ParamValue::Int(i)
            } else if let Ok(x) = v.parse::<f64>() {
                ParamValue::Float(x)
            } else {
                ParamValue::Text(v.to_string())
            }
        }
    };
    Ok((key.replace('-', "_"), value))
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CheckOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mapping: Option<MappingResult>,
    response: ConfirmationResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    applied_hacks: Vec<String>,
}

pub fn run(
    root: &Path,
    args: &CommandArgs,
    reply: Option<&str>,
    prompt: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let mut pipeline = config.pipeline().context("invalid config")?;
    let (command, mapping, ctx) = args.resolve(&pipeline)?;

    let (mut response, prompt, applied_hacks) = match prompt {
        Some(text) => {
            let outcome = pipeline.check_and_enhance(&command, text, &ctx);
            (outcome.response, Some(outcome.prompt), outcome.applied_hacks)
        }
        None => (pipeline.protocol().check(&command, &ctx), None, Vec::new()),
    };

    if let Some(reply) = reply {
        if response.triggered {
            pipeline.protocol().process_response(&mut response, reply);
        }
    }

    if json {
        return print_json(&CheckOutput {
            command: command.raw(),
            mapping,
            response,
            prompt,
            applied_hacks,
        });
    }

    if let Some(ref m) = mapping {
        if let Some(ref target) = m.target_command {
            if *target != args.parsed()?.command_name {
                println!("Mapped '{}' to /{target} ({:.1}%)", m.input_verb, m.confidence);
            }
        }
    }

    if !response.triggered {
        println!("No confirmation needed: `{}`", command.raw());
    } else {
        println!("{}", response.format_prompt());
        if reply.is_some() {
            println!();
            print_status(&response);
        }
    }

    if let Some(ref text) = prompt {
        println!();
        if !applied_hacks.is_empty() {
            println!("Applied hacks: {}", applied_hacks.join(", "));
        }
        println!("{text}");
    }

    Ok(())
}

pub fn print_status(response: &ConfirmationResponse) {
    println!("Status: {}", response.status);
    match response.status {
        ConfirmationStatus::Confirmed | ConfirmationStatus::Modified => {
            if let Some(ref final_command) = response.final_command {
                println!("Final command: `{final_command}`");
            }
        }
        ConfirmationStatus::Pending => {
            println!("Reply not understood; still waiting for a choice.");
        }
        ConfirmationStatus::Cancelled | ConfirmationStatus::Timeout => {}
    }
}
