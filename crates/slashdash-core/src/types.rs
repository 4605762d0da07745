use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// RiskLevel
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = crate::error::SlashdashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(crate::error::SlashdashError::InvalidVariant {
                kind: "risk level",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// TriggerType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    None,
    AmbiguousVerb,
    InputError,
    HighRisk,
    LargeTask,
    PreviousError,
    MissingRequired,
}

impl TriggerType {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerType::None => "none",
            TriggerType::AmbiguousVerb => "ambiguous_verb",
            TriggerType::InputError => "input_error",
            TriggerType::HighRisk => "high_risk",
            TriggerType::LargeTask => "large_task",
            TriggerType::PreviousError => "previous_error",
            TriggerType::MissingRequired => "missing_required",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConfirmationMode
// ---------------------------------------------------------------------------

/// The five confirmation scenarios. `code()` is the stable single-letter
/// identifier used by prompt-injection tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMode {
    AmbiguousRepair,
    ErrorRecovery,
    LargeTaskConfirm,
    HighRiskConfirm,
    InputMissing,
}

impl ConfirmationMode {
    pub fn all() -> &'static [ConfirmationMode] {
        &[
            ConfirmationMode::AmbiguousRepair,
            ConfirmationMode::ErrorRecovery,
            ConfirmationMode::LargeTaskConfirm,
            ConfirmationMode::HighRiskConfirm,
            ConfirmationMode::InputMissing,
        ]
    }

    pub fn code(self) -> char {
        match self {
            ConfirmationMode::AmbiguousRepair => 'A',
            ConfirmationMode::ErrorRecovery => 'B',
            ConfirmationMode::LargeTaskConfirm => 'C',
            ConfirmationMode::HighRiskConfirm => 'D',
            ConfirmationMode::InputMissing => 'E',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationMode::AmbiguousRepair => "ambiguous_repair",
            ConfirmationMode::ErrorRecovery => "error_recovery",
            ConfirmationMode::LargeTaskConfirm => "large_task_confirm",
            ConfirmationMode::HighRiskConfirm => "high_risk_confirm",
            ConfirmationMode::InputMissing => "input_missing",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConfirmationMode::AmbiguousRepair => "Ambiguous command repair",
            ConfirmationMode::ErrorRecovery => "Error recovery",
            ConfirmationMode::LargeTaskConfirm => "Large task confirmation",
            ConfirmationMode::HighRiskConfirm => "High-risk operation confirmation",
            ConfirmationMode::InputMissing => "Missing input",
        }
    }
}

impl fmt::Display for ConfirmationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConfirmationStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
    Modified,
    Timeout,
}

impl ConfirmationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfirmationStatus::Pending => "pending",
            ConfirmationStatus::Confirmed => "confirmed",
            ConfirmationStatus::Cancelled => "cancelled",
            ConfirmationStatus::Modified => "modified",
            ConfirmationStatus::Timeout => "timeout",
        }
    }

    /// Every state except `Pending` is terminal.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ConfirmationStatus::Pending)
    }
}

impl fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes_are_distinct() {
        let codes: Vec<char> = ConfirmationMode::all().iter().map(|m| m.code()).collect();
        assert_eq!(codes, vec!['A', 'B', 'C', 'D', 'E']);
    }

    #[test]
    fn risk_level_parse_and_order() {
        assert_eq!("high".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert!("extreme".parse::<RiskLevel>().is_err());
        assert!(RiskLevel::Critical > RiskLevel::Low);
        assert!(RiskLevel::Critical.is_high());
        assert!(!RiskLevel::Medium.is_high());
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!ConfirmationStatus::Pending.is_terminal());
        for s in [
            ConfirmationStatus::Confirmed,
            ConfirmationStatus::Cancelled,
            ConfirmationStatus::Modified,
            ConfirmationStatus::Timeout,
        ] {
            assert!(s.is_terminal(), "{s} should be terminal");
        }
    }

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&ConfirmationMode::HighRiskConfirm).unwrap();
        assert_eq!(json, "\"high_risk_confirm\"");
    }
}
