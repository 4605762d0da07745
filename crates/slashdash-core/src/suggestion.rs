use crate::command::{InputRef, ParsedCommand};
use crate::context::RecoveryOption;
use crate::mapper::MappingCandidate;
use crate::types::RiskLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recent resources offered when the input is missing.
pub const MAX_RECENT_RESOURCES: usize = 3;
/// Above this many steps a large task also offers to run the first half.
pub const SPLIT_STEP_THRESHOLD: usize = 5;

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// 1-based position in the list shown to the user.
    pub index: usize,
    pub command: String,
    pub description: String,
    pub confidence: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}\n   `{}`", self.index, self.description, self.command)
    }
}

struct Draft {
    command: String,
    description: String,
    confidence: f64,
    risk_level: RiskLevel,
}

impl Draft {
    fn new(command: impl Into<String>, description: impl Into<String>, confidence: f64) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
            confidence,
            risk_level: RiskLevel::Low,
        }
    }

    fn risk(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }
}

// ---------------------------------------------------------------------------
// SuggestionGenerator
// ---------------------------------------------------------------------------

/// Builds the numbered options for each confirmation mode. Every list is
/// truncated to `max_suggestions` and numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionGenerator {
    max_suggestions: usize,
}

impl Default for SuggestionGenerator {
    fn default() -> Self {
        Self { max_suggestions: 5 }
    }
}

impl SuggestionGenerator {
    pub fn new(max_suggestions: usize) -> Self {
        Self { max_suggestions }
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    fn finish(&self, drafts: Vec<Draft>) -> Vec<Suggestion> {
        drafts
            .into_iter()
            .take(self.max_suggestions)
            .enumerate()
            .map(|(i, d)| Suggestion {
                index: i + 1,
                command: d.command,
                description: d.description,
                confidence: d.confidence,
                risk_level: d.risk_level,
            })
            .collect()
    }

    /// Candidates ranked by confidence, each rebuilt with the original input
    /// and parameters.
    pub fn for_ambiguous(&self, command: &ParsedCommand, candidates: &[MappingCandidate]) -> Vec<Suggestion> {
        let mut ranked: Vec<&MappingCandidate> = candidates.iter().collect();
        ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let drafts = ranked
            .into_iter()
            .map(|c| {
                let name = c.command.trim_start_matches('/');
                let description = c
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| format!("Run /{name}"));
                Draft::new(command.retarget(name).raw(), description, c.confidence)
            })
            .collect();
        self.finish(drafts)
    }

    pub fn for_high_risk(&self, command: &ParsedCommand) -> Vec<Suggestion> {
        let raw = command.raw();
        let backup = match command.input {
            Some(ref input) => format!("/backup {input} && {raw}"),
            None => format!("/backup && {raw}"),
        };
        self.finish(vec![
            Draft::new(raw, "Execute anyway (cannot be undone)", 100.0).risk(RiskLevel::High),
            Draft::new("cancel", "Cancel the operation", 100.0),
            Draft::new(backup, "Back up first, then execute", 90.0).risk(RiskLevel::Medium),
        ])
    }

    /// Up to three recent resources swapped in as the input, then an upload
    /// option. A resource written as `kind:id` keeps its kind; anything else
    /// is treated as a file.
    pub fn for_input_missing(&self, command: &ParsedCommand, recent: &[String]) -> Vec<Suggestion> {
        let mut drafts: Vec<Draft> = recent
            .iter()
            .take(MAX_RECENT_RESOURCES)
            .enumerate()
            .map(|(i, resource)| {
                let input = resource
                    .parse::<InputRef>()
                    .unwrap_or_else(|_| InputRef::new("file", resource.as_str()));
                Draft::new(
                    command.with_replaced_input(input).raw(),
                    format!("Use recent file: {resource}"),
                    80.0 - (i as f64 + 1.0) * 10.0,
                )
            })
            .collect();
        drafts.push(Draft::new("upload", "Upload a new file", 60.0));
        self.finish(drafts)
    }

    /// The caller's recovery options (leaving room for one more), then a retry
    /// of the original command.
    pub fn for_error_recovery(&self, command: &ParsedCommand, options: &[RecoveryOption]) -> Vec<Suggestion> {
        let mut drafts: Vec<Draft> = options
            .iter()
            .take(self.max_suggestions.saturating_sub(1))
            .map(|o| Draft::new(o.command.clone(), o.description.clone(), o.confidence.unwrap_or(50.0)))
            .collect();
        drafts.push(Draft::new(command.raw(), "Retry the original command", 30.0));
        self.finish(drafts)
    }

    pub fn for_large_task(&self, command: &ParsedCommand, steps: usize) -> Vec<Suggestion> {
        let raw = command.raw();
        let mut drafts = vec![
            Draft::new(raw.clone(), format!("Run the full workflow ({steps} steps)"), 100.0),
            Draft::new("trim", "Trim the workflow to selected steps", 80.0),
        ];
        if steps > SPLIT_STEP_THRESHOLD {
            let half = steps / 2;
            drafts.push(Draft::new(
                format!("{raw} --steps 1-{half}"),
                format!("Run the first {half} steps now"),
                70.0,
            ));
        }
        drafts.push(Draft::new("cancel", "Cancel the task", 100.0));
        self.finish(drafts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(command: &str, confidence: f64) -> MappingCandidate {
        MappingCandidate {
            command: command.to_string(),
            confidence,
            description: None,
        }
    }

    #[test]
    fn display_format() {
        let s = Suggestion {
            index: 2,
            command: "cancel".into(),
            description: "Cancel the operation".into(),
            confidence: 100.0,
            risk_level: RiskLevel::Low,
        };
        assert_eq!(s.to_string(), "2. Cancel the operation\n   `cancel`");
    }

    #[test]
    fn ambiguous_ranks_and_rebuilds_commands() {
        let gen = SuggestionGenerator::default();
        let cmd = ParsedCommand::new("figure-out").with_input(InputRef::new("data", "sales"));
        let suggestions = gen.for_ambiguous(
            &cmd,
            &[candidate("summarize-doc", 60.0), candidate("/analyze-data", 80.0)],
        );
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].index, 1);
        assert_eq!(suggestions[0].command, "/analyze-data @data:sales");
        assert_eq!(suggestions[1].command, "/summarize-doc @data:sales");
        assert_eq!(suggestions[1].index, 2);
    }

    #[test]
    fn ambiguous_is_capped() {
        let gen = SuggestionGenerator::new(2);
        let cmd = ParsedCommand::new("go");
        let cands: Vec<_> = (0..6).map(|i| candidate(&format!("cmd-{}", "abcdef".chars().nth(i).unwrap()), 50.0)).collect();
        assert_eq!(gen.for_ambiguous(&cmd, &cands).len(), 2);
    }

    #[test]
    fn high_risk_offers_confirm_cancel_backup() {
        let gen = SuggestionGenerator::default();
        let cmd = ParsedCommand::new("delete-file").with_input(InputRef::new("file", "important.txt"));
        let s = gen.for_high_risk(&cmd);
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].command, "/delete-file @file:important.txt");
        assert_eq!(s[0].risk_level, RiskLevel::High);
        assert_eq!(s[1].command, "cancel");
        assert_eq!(
            s[2].command,
            "/backup @file:important.txt && /delete-file @file:important.txt"
        );
        assert_eq!(s[2].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn input_missing_uses_three_recent_then_upload() {
        let gen = SuggestionGenerator::default();
        let cmd = ParsedCommand::new("analyze-data");
        let recent: Vec<String> = ["a.csv", "b.csv", "dataset:q3", "d.csv"].iter().map(|s| s.to_string()).collect();
        let s = gen.for_input_missing(&cmd, &recent);
        assert_eq!(s.len(), 4);
        assert_eq!(s[0].command, "/analyze-data @file:a.csv");
        assert_eq!(s[0].confidence, 70.0);
        assert_eq!(s[2].command, "/analyze-data @dataset:q3");
        assert_eq!(s[3].command, "upload");
        assert_eq!(s[3].index, 4);
    }

    #[test]
    fn error_recovery_reserves_retry_slot() {
        let gen = SuggestionGenerator::new(3);
        let cmd = ParsedCommand::new("convert-file");
        let options: Vec<RecoveryOption> = (1..=5)
            .map(|i| RecoveryOption {
                command: format!("/fix-{i}"),
                description: format!("fix {i}"),
                confidence: None,
            })
            .collect();
        let s = gen.for_error_recovery(&cmd, &options);
        assert_eq!(s.len(), 3);
        assert_eq!(s[1].command, "/fix-2");
        assert_eq!(s[1].confidence, 50.0);
        assert_eq!(s[2].command, "/convert-file");
        assert_eq!(s[2].description, "Retry the original command");
    }

    #[test]
    fn large_task_split_only_above_five_steps() {
        let gen = SuggestionGenerator::default();
        let cmd = ParsedCommand::new("generate-site");

        let small = gen.for_large_task(&cmd, 5);
        let commands: Vec<&str> = small.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(commands, vec!["/generate-site", "trim", "cancel"]);

        let big = gen.for_large_task(&cmd, 8);
        assert_eq!(big.len(), 4);
        assert_eq!(big[2].command, "/generate-site --steps 1-4");
        assert_eq!(big[3].command, "cancel");
        assert_eq!(big[3].index, 4);
    }
}
