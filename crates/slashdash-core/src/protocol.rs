use crate::command::ParsedCommand;
use crate::context::CheckContext;
use crate::error::{Result, SlashdashError};
use crate::suggestion::{Suggestion, SuggestionGenerator};
use crate::trigger::{TriggerChecker, TriggerResult};
use crate::types::{ConfirmationMode, ConfirmationStatus, TriggerType};
use serde::{Deserialize, Serialize};

/// Replies that cancel a pending confirmation, matched case-insensitively.
pub const CANCEL_TOKENS: &[&str] = &["cancel", "no", "n", "取消"];

// ---------------------------------------------------------------------------
// ProtocolConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    #[serde(default = "default_mapping_threshold")]
    pub mapping_threshold: f64,
    #[serde(default = "default_token_threshold")]
    pub large_task_token_threshold: u64,
    #[serde(default = "default_step_threshold")]
    pub large_task_step_threshold: u32,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_mapping_threshold() -> f64 {
    90.0
}

fn default_token_threshold() -> u64 {
    50_000
}

fn default_step_threshold() -> u32 {
    5
}

fn default_max_suggestions() -> usize {
    5
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            mapping_threshold: default_mapping_threshold(),
            large_task_token_threshold: default_token_threshold(),
            large_task_step_threshold: default_step_threshold(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.mapping_threshold.is_finite() || !(0.0..=100.0).contains(&self.mapping_threshold) {
            return Err(SlashdashError::InvalidThreshold {
                name: "mapping_threshold",
                value: self.mapping_threshold,
                reason: "must be between 0 and 100".to_string(),
            });
        }
        if self.max_suggestions == 0 {
            return Err(SlashdashError::InvalidConfig {
                field: "max_suggestions".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn checker(&self) -> TriggerChecker {
        TriggerChecker::new(
            self.mapping_threshold,
            self.large_task_token_threshold,
            self.large_task_step_threshold,
        )
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// What the user answered to a pending confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserReply {
    Index(usize),
    Text(String),
}

impl From<usize> for UserReply {
    fn from(i: usize) -> Self {
        UserReply::Index(i)
    }
}

impl From<&str> for UserReply {
    fn from(s: &str) -> Self {
        UserReply::Text(s.to_string())
    }
}

impl From<String> for UserReply {
    fn from(s: String) -> Self {
        UserReply::Text(s)
    }
}

/// The option recorded when a reply resolves a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectedOption {
    Index(usize),
    Command(String),
}

// ---------------------------------------------------------------------------
// ConfirmationResponse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    pub triggered: bool,
    pub mode: Option<ConfirmationMode>,
    pub trigger_type: TriggerType,
    pub severity: u32,
    pub original_command: Option<ParsedCommand>,
    pub trigger_reason: String,
    pub suggestions: Vec<Suggestion>,
    pub prompt_message: String,
    pub status: ConfirmationStatus,
    pub selected_option: Option<SelectedOption>,
    pub final_command: Option<String>,
}

impl ConfirmationResponse {
    pub fn no_trigger() -> Self {
        Self {
            triggered: false,
            mode: None,
            trigger_type: TriggerType::None,
            severity: 0,
            original_command: None,
            trigger_reason: String::new(),
            suggestions: Vec::new(),
            prompt_message: String::new(),
            status: ConfirmationStatus::Pending,
            selected_option: None,
            final_command: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.triggered && self.status == ConfirmationStatus::Pending
    }

    /// Apply a reply. Terminal responses are left untouched; unrecognised or
    /// out-of-range replies keep the response pending.
    pub fn apply_reply(&mut self, reply: &UserReply) -> ConfirmationStatus {
        if self.status.is_terminal() {
            return self.status;
        }

        let before = self.status;
        match reply {
            UserReply::Index(i) => self.select(*i),
            UserReply::Text(text) => {
                let text = text.trim();
                let lowered = text.to_lowercase();
                if CANCEL_TOKENS.contains(&lowered.as_str()) {
                    self.status = ConfirmationStatus::Cancelled;
                } else if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                    if let Ok(i) = text.parse::<usize>() {
                        self.select(i);
                    }
                } else if text.starts_with('/') {
                    self.status = ConfirmationStatus::Modified;
                    self.selected_option = Some(SelectedOption::Command(text.to_string()));
                    self.final_command = Some(text.to_string());
                }
            }
        }

        if self.status != before {
            tracing::info!(
                mode = ?self.mode,
                from = %before,
                to = %self.status,
                "confirmation resolved"
            );
        }
        self.status
    }

    fn select(&mut self, index: usize) {
        if index == 0 || index > self.suggestions.len() {
            return;
        }
        let chosen = &self.suggestions[index - 1];
        self.final_command = Some(chosen.command.clone());
        self.selected_option = Some(SelectedOption::Index(index));
        self.status = ConfirmationStatus::Confirmed;
    }

    /// Mark a still-pending response as timed out. Returns whether the status
    /// changed.
    pub fn expire(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = ConfirmationStatus::Timeout;
        tracing::info!(mode = ?self.mode, "confirmation timed out");
        true
    }

    /// Plain-text prompt for the user. Empty when nothing was triggered.
    pub fn format_prompt(&self) -> String {
        if !self.triggered {
            return String::new();
        }

        let mut lines = vec!["Confirmation required".to_string(), String::new()];
        if let Some(mode) = self.mode {
            lines.push(format!("Mode: {} ({})", mode.label(), mode.code()));
        }
        lines.push(format!("Reason: {}", self.trigger_reason));
        lines.push(String::new());

        if let Some(ref cmd) = self.original_command {
            lines.push(format!("Original command: `{}`", cmd.raw()));
            lines.push(String::new());
        }

        if !self.suggestions.is_empty() {
            lines.push("Suggestions:".to_string());
            for suggestion in &self.suggestions {
                lines.push(suggestion.to_string());
            }
            lines.push(String::new());
        }

        lines.push(self.prompt_message.clone());
        lines.push("Reply with an option number, a new /command, or 'cancel'.".to_string());
        lines.join("\n")
    }
}

// ---------------------------------------------------------------------------
// ConfirmationProtocol
// ---------------------------------------------------------------------------

type Check = fn(&TriggerChecker, &ParsedCommand, &CheckContext) -> TriggerResult;

/// Fixed precedence; the first rule that fires decides the mode. Unlike
/// [`TriggerChecker::check_highest_priority`] this never ranks by severity,
/// so an irreversible verb always wins over a low mapping confidence.
const PRECEDENCE: &[(ConfirmationMode, Check)] = &[
    (ConfirmationMode::HighRiskConfirm, TriggerChecker::check_high_risk),
    (ConfirmationMode::AmbiguousRepair, TriggerChecker::check_ambiguous_verb),
    (ConfirmationMode::InputMissing, TriggerChecker::check_input_error),
    (ConfirmationMode::ErrorRecovery, TriggerChecker::check_previous_error),
    (ConfirmationMode::LargeTaskConfirm, TriggerChecker::check_large_task),
];

/// Decides whether a command needs the user's confirmation before it runs,
/// and drives the reply state machine once it does.
#[derive(Debug, Clone)]
pub struct ConfirmationProtocol {
    config: ProtocolConfig,
    checker: TriggerChecker,
    suggestions: SuggestionGenerator,
}

impl Default for ConfirmationProtocol {
    fn default() -> Self {
        let config = ProtocolConfig::default();
        Self {
            checker: config.checker(),
            suggestions: SuggestionGenerator::new(config.max_suggestions),
            config,
        }
    }
}

impl ConfirmationProtocol {
    pub fn new(config: ProtocolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            checker: config.checker(),
            suggestions: SuggestionGenerator::new(config.max_suggestions),
            config,
        })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn checker(&self) -> &TriggerChecker {
        &self.checker
    }

    pub fn check(&self, command: &ParsedCommand, ctx: &CheckContext) -> ConfirmationResponse {
        for (mode, check) in PRECEDENCE {
            let trigger = check(&self.checker, command, ctx);
            if trigger.triggered {
                let response = self.build(*mode, &trigger, command, ctx);
                tracing::debug!(
                    command = %command.command_name,
                    mode = %mode,
                    suggestions = response.suggestions.len(),
                    "confirmation required"
                );
                return response;
            }
        }
        ConfirmationResponse::no_trigger()
    }

    /// Thin wrapper over [`ConfirmationResponse::apply_reply`].
    pub fn process_response(
        &self,
        response: &mut ConfirmationResponse,
        reply: impl Into<UserReply>,
    ) -> ConfirmationStatus {
        response.apply_reply(&reply.into())
    }

    fn build(
        &self,
        mode: ConfirmationMode,
        trigger: &TriggerResult,
        command: &ParsedCommand,
        ctx: &CheckContext,
    ) -> ConfirmationResponse {
        let (trigger_reason, suggestions, prompt_message) = match mode {
            ConfirmationMode::HighRiskConfirm => (
                format!("High-risk operation: '{}' cannot be undone", command.verb),
                self.suggestions.for_high_risk(command),
                "This operation is irreversible. Proceed?".to_string(),
            ),
            ConfirmationMode::AmbiguousRepair => (
                format!(
                    "Verb '{}' could not be mapped to a command with confidence ({:.1} < {:.1})",
                    command.verb,
                    ctx.mapping_confidence(),
                    self.config.mapping_threshold
                ),
                self.suggestions.for_ambiguous(command, &ctx.candidates),
                "Choose the command you meant".to_string(),
            ),
            ConfirmationMode::InputMissing => (
                ctx.input_error()
                    .map(|e| e.message.trim())
                    .filter(|m| !m.is_empty())
                    .unwrap_or("Input is missing or invalid")
                    .to_string(),
                self.suggestions.for_input_missing(command, &ctx.recent_resources),
                "Choose an input source".to_string(),
            ),
            ConfirmationMode::ErrorRecovery => (
                format!(
                    "Previous command failed: {}",
                    ctx.previous_error()
                        .map(|e| e.message.trim())
                        .filter(|m| !m.is_empty())
                        .unwrap_or("unknown error")
                ),
                self.suggestions
                    .for_error_recovery(command, &ctx.recovery_options),
                "Choose a recovery option".to_string(),
            ),
            ConfirmationMode::LargeTaskConfirm => {
                let steps = ctx.step_count();
                (
                    format!(
                        "Large task: about {steps} steps, ~{} tokens",
                        ctx.estimated_tokens()
                    ),
                    self.suggestions.for_large_task(command, steps),
                    large_task_prompt(&ctx.workflow_steps),
                )
            }
        };

        ConfirmationResponse {
            triggered: true,
            mode: Some(mode),
            trigger_type: trigger.trigger_type,
            severity: trigger.severity,
            original_command: Some(command.clone()),
            trigger_reason,
            suggestions,
            prompt_message,
            status: ConfirmationStatus::Pending,
            selected_option: None,
            final_command: None,
        }
    }
}

fn large_task_prompt(steps: &[String]) -> String {
    if steps.is_empty() {
        return "Run the full workflow?".to_string();
    }
    let list: Vec<String> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| format!("  {}. {s}", i + 1))
        .collect();
    format!("Workflow:\n{}\n\nRun the full workflow?", list.join("\n"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
