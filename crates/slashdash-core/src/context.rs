use crate::mapper::MappingCandidate;
use serde::{Deserialize, Serialize};

/// Confidence assumed when the caller supplies none. Absent signals must never
/// cause a confirmation on their own.
pub const DEFAULT_MAPPING_CONFIDENCE: f64 = 100.0;

// ---------------------------------------------------------------------------
// ErrorInfo / RecoveryOption
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.message.trim().is_empty() && self.code.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryOption {
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

// ---------------------------------------------------------------------------
// CheckContext
// ---------------------------------------------------------------------------

/// Signals the caller has gathered about a command before it is checked.
///
/// Every field is optional; an absent field means "signal not present". The
/// accessor methods apply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<MappingCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recovery_options: Vec<RecoveryOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_steps: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workflow_steps: Vec<String>,
    #[serde(alias = "recent_files", skip_serializing_if = "Vec::is_empty")]
    pub recent_resources: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_required_params: Vec<String>,
    /// Caller-reported task progress, consumed only by the pipeline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
}

impl CheckContext {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Defaulting accessors
    // -----------------------------------------------------------------------

    pub fn mapping_confidence(&self) -> f64 {
        self.mapping_confidence
            .unwrap_or(DEFAULT_MAPPING_CONFIDENCE)
    }

    pub fn estimated_tokens(&self) -> u64 {
        self.estimated_tokens.unwrap_or(0)
    }

    pub fn estimated_steps(&self) -> u32 {
        self.estimated_steps.unwrap_or(0)
    }

    /// Number of workflow steps: the listed steps when present, otherwise the
    /// estimate.
    pub fn step_count(&self) -> usize {
        if self.workflow_steps.is_empty() {
            self.estimated_steps() as usize
        } else {
            self.workflow_steps.len()
        }
    }

    pub fn input_error(&self) -> Option<&ErrorInfo> {
        self.input_error.as_ref().filter(|e| !e.is_empty())
    }

    pub fn previous_error(&self) -> Option<&ErrorInfo> {
        self.previous_error.as_ref().filter(|e| !e.is_empty())
    }

    pub fn progress(&self) -> u32 {
        self.progress.unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.mapping_confidence = Some(confidence);
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<MappingCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_input_error(mut self, message: impl Into<String>) -> Self {
        self.input_error = Some(ErrorInfo::new(message));
        self
    }

    pub fn with_previous_error(mut self, message: impl Into<String>) -> Self {
        self.previous_error = Some(ErrorInfo::new(message));
        self
    }

    pub fn with_recovery_option(
        mut self,
        command: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.recovery_options.push(RecoveryOption {
            command: command.into(),
            description: description.into(),
            confidence: None,
        });
        self
    }

    pub fn with_estimated_tokens(mut self, tokens: u64) -> Self {
        self.estimated_tokens = Some(tokens);
        self
    }

    pub fn with_estimated_steps(mut self, steps: u32) -> Self {
        self.estimated_steps = Some(steps);
        self
    }

    pub fn with_workflow_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workflow_steps = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_recent_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recent_resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_missing_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_required_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_progress(mut self, progress: u32) -> Self {
        self.progress = Some(progress);
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
