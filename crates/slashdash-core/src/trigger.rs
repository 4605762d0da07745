use crate::command::ParsedCommand;
use crate::context::{CheckContext, ErrorInfo, RecoveryOption};
use crate::mapper::MappingCandidate;
use crate::types::TriggerType;
use serde::{Deserialize, Serialize};

/// Verbs whose commands are irreversible, with their trigger severity.
pub const HIGH_RISK_VERBS: &[(&str, u32)] = &[
    ("deploy", 8),
    ("delete", 9),
    ("remove", 8),
    ("destroy", 10),
    ("overwrite", 7),
    ("publish", 6),
    ("release", 6),
    ("drop", 9),
    ("truncate", 9),
];

pub const INPUT_ERROR_SEVERITY: u32 = 5;
pub const PREVIOUS_ERROR_SEVERITY: u32 = 6;
pub const LARGE_TASK_SEVERITY: u32 = 4;
pub const MISSING_REQUIRED_SEVERITY: u32 = 5;

pub fn high_risk_severity(verb: &str) -> Option<u32> {
    HIGH_RISK_VERBS
        .iter()
        .find(|(v, _)| *v == verb)
        .map(|(_, severity)| *severity)
}

// ---------------------------------------------------------------------------
// TriggerDetails
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LargeTaskCause {
    Tokens,
    Steps,
}

/// Per-trigger evidence. Serialises as a flat key/value object tagged by
/// `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerDetails {
    None,
    HighRisk {
        verb: String,
        command: String,
        reason: String,
    },
    AmbiguousVerb {
        verb: String,
        confidence: f64,
        threshold: f64,
        candidates: Vec<MappingCandidate>,
    },
    InputError {
        error: ErrorInfo,
        input: Option<String>,
    },
    PreviousError {
        previous_error: ErrorInfo,
        recovery_options: Vec<RecoveryOption>,
    },
    LargeTask {
        estimated_tokens: u64,
        estimated_steps: u32,
        workflow_steps: Vec<String>,
        triggered_by: LargeTaskCause,
    },
    MissingRequired {
        missing_params: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// TriggerResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerResult {
    pub triggered: bool,
    pub trigger_type: TriggerType,
    pub severity: u32,
    pub details: TriggerDetails,
}

impl TriggerResult {
    pub fn no_trigger() -> Self {
        Self {
            triggered: false,
            trigger_type: TriggerType::None,
            severity: 0,
            details: TriggerDetails::None,
        }
    }

    fn fired(trigger_type: TriggerType, severity: u32, details: TriggerDetails) -> Self {
        tracing::debug!(trigger = %trigger_type, severity, "trigger fired");
        Self {
            triggered: true,
            trigger_type,
            severity,
            details,
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerChecker
// ---------------------------------------------------------------------------

type Check = fn(&TriggerChecker, &ParsedCommand, &CheckContext) -> TriggerResult;

/// Evaluation order used by [`TriggerChecker::check_all`].
const CHECK_ORDER: &[Check] = &[
    TriggerChecker::check_high_risk,
    TriggerChecker::check_ambiguous_verb,
    TriggerChecker::check_input_error,
    TriggerChecker::check_previous_error,
    TriggerChecker::check_large_task,
    TriggerChecker::check_missing_required,
];

/// Six independent predicates over a command and its context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerChecker {
    pub mapping_threshold: f64,
    pub token_threshold: u64,
    pub step_threshold: u32,
}

impl Default for TriggerChecker {
    fn default() -> Self {
        Self {
            mapping_threshold: 90.0,
            token_threshold: 50_000,
            step_threshold: 5,
        }
    }
}

impl TriggerChecker {
    pub fn new(mapping_threshold: f64, token_threshold: u64, step_threshold: u32) -> Self {
        Self {
            mapping_threshold,
            token_threshold,
            step_threshold,
        }
    }

    /// Every fired trigger, in check order (not severity order).
    pub fn check_all(&self, command: &ParsedCommand, ctx: &CheckContext) -> Vec<TriggerResult> {
        CHECK_ORDER
            .iter()
            .map(|check| check(self, command, ctx))
            .filter(|r| r.triggered)
            .collect()
    }

    /// The most severe fired trigger. Equal severities keep check order.
    pub fn check_highest_priority(&self, command: &ParsedCommand, ctx: &CheckContext) -> TriggerResult {
        let mut results = self.check_all(command, ctx);
        results.sort_by(|a, b| b.severity.cmp(&a.severity));
        results
            .into_iter()
            .next()
            .unwrap_or_else(TriggerResult::no_trigger)
    }

    pub fn check_high_risk(&self, command: &ParsedCommand, _ctx: &CheckContext) -> TriggerResult {
        match high_risk_severity(&command.verb) {
            Some(severity) => TriggerResult::fired(
                TriggerType::HighRisk,
                severity,
                TriggerDetails::HighRisk {
                    verb: command.verb.clone(),
                    command: command.command_name.clone(),
                    reason: format!("'{}' is an irreversible operation", command.verb),
                },
            ),
            None => TriggerResult::no_trigger(),
        }
    }

    pub fn check_ambiguous_verb(&self, command: &ParsedCommand, ctx: &CheckContext) -> TriggerResult {
        let confidence = ctx.mapping_confidence();
        if confidence < self.mapping_threshold {
            // saturates for very negative or infinite confidence
            let severity = (((self.mapping_threshold - confidence) / 10.0).floor() as u32).saturating_add(3);
            return TriggerResult::fired(
                TriggerType::AmbiguousVerb,
                severity,
                TriggerDetails::AmbiguousVerb {
                    verb: command.verb.clone(),
                    confidence,
                    threshold: self.mapping_threshold,
                    candidates: ctx.candidates.clone(),
                },
            );
        }
        TriggerResult::no_trigger()
    }

    pub fn check_input_error(&self, command: &ParsedCommand, ctx: &CheckContext) -> TriggerResult {
        match ctx.input_error() {
            Some(error) => TriggerResult::fired(
                TriggerType::InputError,
                INPUT_ERROR_SEVERITY,
                TriggerDetails::InputError {
                    error: error.clone(),
                    input: command.input.as_ref().map(ToString::to_string),
                },
            ),
            None => TriggerResult::no_trigger(),
        }
    }

    pub fn check_previous_error(&self, _command: &ParsedCommand, ctx: &CheckContext) -> TriggerResult {
        match ctx.previous_error() {
            Some(error) => TriggerResult::fired(
                TriggerType::PreviousError,
                PREVIOUS_ERROR_SEVERITY,
                TriggerDetails::PreviousError {
                    previous_error: error.clone(),
                    recovery_options: ctx.recovery_options.clone(),
                },
            ),
            None => TriggerResult::no_trigger(),
        }
    }

    pub fn check_large_task(&self, _command: &ParsedCommand, ctx: &CheckContext) -> TriggerResult {
        match self.large_task_cause(ctx) {
            Some(cause) => TriggerResult::fired(
                TriggerType::LargeTask,
                LARGE_TASK_SEVERITY,
                TriggerDetails::LargeTask {
                    estimated_tokens: ctx.estimated_tokens(),
                    estimated_steps: ctx.estimated_steps(),
                    workflow_steps: ctx.workflow_steps.clone(),
                    triggered_by: cause,
                },
            ),
            None => TriggerResult::no_trigger(),
        }
    }

    pub fn check_missing_required(&self, _command: &ParsedCommand, ctx: &CheckContext) -> TriggerResult {
        if ctx.missing_required_params.is_empty() {
            return TriggerResult::no_trigger();
        }
        TriggerResult::fired(
            TriggerType::MissingRequired,
            MISSING_REQUIRED_SEVERITY,
            TriggerDetails::MissingRequired {
                missing_params: ctx.missing_required_params.clone(),
            },
        )
    }

    /// Tokens take precedence over steps when both exceed their thresholds.
    pub fn large_task_cause(&self, ctx: &CheckContext) -> Option<LargeTaskCause> {
        if ctx.estimated_tokens() > self.token_threshold {
            Some(LargeTaskCause::Tokens)
        } else if ctx.estimated_steps() > self.step_threshold {
            Some(LargeTaskCause::Steps)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
