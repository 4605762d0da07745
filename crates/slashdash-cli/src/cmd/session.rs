use crate::cmd::check::print_status;
use anyhow::Context;
use slashdash_core::{
    command::{InputRef, ParamValue, ParsedCommand},
    config::Config,
    history::CommandSnapshot,
    pipeline::Pipeline,
    protocol::ConfirmationResponse,
};
use std::io::{BufRead, Write};
use std::path::Path;

const HELP: &str = "\
Enter a command such as `/inspect-data @file:sales.csv --format md`.
While a confirmation is pending, reply with an option number, a new /command, or 'cancel'.

  undo [n]       undo the last n commands (default 1)
  redo [n]       redo the last n undone commands
  history [n]    show recent commands
  progress <n>   report task progress in percent
  status         show progress, history and hack counts
  help           show this help
  quit           leave the session";

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

struct Session {
    pipeline: Pipeline,
    pending: Option<ConfirmationResponse>,
    progress: Option<u32>,
}

enum Flow {
    Continue,
    Quit,
}

pub fn run(root: &Path) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let mut session = Session {
        pipeline: config.pipeline().context("invalid config")?,
        pending: None,
        progress: None,
    };

    println!("slashdash session. Type 'help' for commands, 'quit' to leave.");
    let stdin = std::io::stdin();
    let mut out = std::io::stdout();
    print!("> ");
    out.flush()?;

    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        match session.handle(line.trim()) {
            Ok(Flow::Quit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(e) => println!("error: {e:#}"),
        }
        print!("> ");
        out.flush()?;
    }

    if let Some(mut response) = session.pending.take() {
        if response.expire() {
            println!();
            println!("Confirmation timed out.");
        }
    }
    Ok(())
}

impl Session {
    fn handle(&mut self, line: &str) -> anyhow::Result<Flow> {
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let mut words = line.split_whitespace();
        let keyword = words.next().unwrap_or_default();
        let count = words.next().map(str::parse::<usize>).transpose();

        match keyword {
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => println!("{HELP}"),
            _ if self.pending.is_some() => self.reply(line),
            "undo" => self.undo(count.context("expected a number")?.unwrap_or(1)),
            "redo" => self.redo(count.context("expected a number")?.unwrap_or(1)),
            "history" => self.history(count.context("expected a number")?),
            "status" => self.status(),
            "progress" => {
                let value = line
                    .split_whitespace()
                    .nth(1)
                    .context("usage: progress <percent>")?
                    .parse::<u32>()
                    .context("progress must be a whole number")?;
                self.progress = Some(value.min(100));
                println!("Progress set to {}%.", value.min(100));
            }
            _ => self.command(line)?,
        }
        Ok(Flow::Continue)
    }

    fn command(&mut self, line: &str) -> anyhow::Result<()> {
        let parsed = parse_line(line)?;
        let resolution = self.pipeline.resolve(&parsed);
        let mut ctx = resolution.context;
        if let Some(progress) = self.progress {
            ctx = ctx.with_progress(progress);
        }

        if resolution.command.command_name != parsed.command_name {
            println!(
                "Mapped '{}' to /{} ({:.1}%)",
                resolution.mapping.input_verb,
                resolution.command.command_name,
                resolution.mapping.confidence
            );
        }

        let command = resolution.command;
        let outcome = self
            .pipeline
            .check_and_enhance(&command, &command.raw(), &ctx);

        if !outcome.applied_hacks.is_empty() {
            println!("Hacks: {}", outcome.applied_hacks.join(", "));
        }
        if outcome.response.triggered {
            println!("{}", outcome.response.format_prompt());
            self.pending = Some(outcome.response);
        } else {
            println!("Ready: `{}`", command.raw());
        }
        Ok(())
    }

    fn reply(&mut self, line: &str) {
        let Some(mut response) = self.pending.take() else {
            return;
        };
        self.pipeline
            .protocol()
            .process_response(&mut response, line);
        print_status(&response);
        if response.is_pending() {
            self.pending = Some(response);
        }
    }

    fn undo(&mut self, steps: usize) {
        let undone = self.pipeline.history_mut().undo_steps(steps);
        if undone.is_empty() {
            println!("Nothing to undo.");
        }
        for snapshot in &undone {
            println!("Undone: {}", snapshot.command);
        }
    }

    fn redo(&mut self, steps: usize) {
        let redone = self.pipeline.history_mut().redo_steps(steps);
        if redone.is_empty() {
            println!("Nothing to redo.");
        }
        for snapshot in &redone {
            println!("Redone: {}", snapshot.command);
        }
    }

    fn history(&self, limit: Option<usize>) {
        let recent: Vec<&CommandSnapshot> = self.pipeline.history().recent(limit);
        if recent.is_empty() {
            println!("No history.");
            return;
        }
        for snapshot in recent {
            println!("{snapshot}");
        }
    }

    fn status(&self) {
        let status = self.pipeline.status();
        println!("Progress: {}", status.progress_indicator);
        println!(
            "History:  {} undoable, {} redoable",
            status.undo_count, status.redo_count
        );
        println!(
            "Hacks:    {}/{} enabled ({})",
            status.enabled_hacks.len(),
            status.total_hacks,
            status.enabled_hacks.join(", ")
        );
    }
}

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

/// Split `/name @kind:id --key value --flag` on whitespace.
fn parse_line(line: &str) -> anyhow::Result<ParsedCommand> {
    let mut tokens = line.split_whitespace().peekable();
    let name = tokens
        .next()
        .map(|t| t.trim_start_matches('/'))
        .filter(|t| !t.is_empty())
        .context("empty command")?;

    let mut command = ParsedCommand::new(name.to_lowercase());
    while let Some(token) = tokens.next() {
        if token.starts_with('@') {
            let input: InputRef = token.parse()?;
            command = command.with_input(input);
        } else if let Some(key) = token.strip_prefix("--") {
            let key = key.replace('-', "_");
            match tokens.next_if(|next| !next.starts_with("--") && !next.starts_with('@')) {
                Some(value) => command = command.with_param(key, ParamValue::from(value)),
                None => command = command.with_param(key, true),
            }
        } else {
            anyhow::bail!("unexpected argument '{token}'");
        }
    }
    Ok(command)
}
