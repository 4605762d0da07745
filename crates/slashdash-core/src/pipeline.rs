use crate::command::ParsedCommand;
use crate::context::CheckContext;
use crate::hacks::HackSet;
use crate::history::{CommandSnapshot, HistoryStack};
use crate::injector::{inject, InjectOptions};
use crate::mapper::{MappingResult, VerbMapper};
use crate::protocol::{ConfirmationProtocol, ConfirmationResponse};
use crate::tracker::ProgressTracker;
use crate::types::ConfirmationMode;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// IntegrationOptions
// ---------------------------------------------------------------------------

/// How confirmation modes pull prompt hacks into the outgoing prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationOptions {
    #[serde(default = "default_true")]
    pub clarify_on_ambiguous: bool,
    #[serde(default = "default_true")]
    pub devils_advocate_on_high_risk: bool,
    #[serde(default = "default_true")]
    pub all_hacks_on_large_task: bool,
    #[serde(default = "default_true")]
    pub record_history: bool,
}

fn default_true() -> bool {
    true
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            clarify_on_ambiguous: true,
            devils_advocate_on_high_risk: true,
            all_hacks_on_large_task: true,
            record_history: true,
        }
    }
}

impl IntegrationOptions {
    /// Hack ids recommended for `mode`, in injection order.
    pub fn hacks_for(&self, mode: ConfirmationMode) -> &'static [&'static str] {
        match mode {
            ConfirmationMode::AmbiguousRepair if self.clarify_on_ambiguous => &["clarify"],
            ConfirmationMode::AmbiguousRepair => &[],
            ConfirmationMode::ErrorRecovery => &["clarify", "self_grade"],
            ConfirmationMode::LargeTaskConfirm if self.all_hacks_on_large_task => {
                &["clarify", "web_backed", "self_grade", "devils_advocate"]
            }
            ConfirmationMode::LargeTaskConfirm => &["self_grade"],
            ConfirmationMode::HighRiskConfirm if self.devils_advocate_on_high_risk => {
                &["devils_advocate"]
            }
            ConfirmationMode::HighRiskConfirm => &[],
            ConfirmationMode::InputMissing => &["clarify"],
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// A mapped command ready for [`Pipeline::check_and_enhance`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub mapping: MappingResult,
    /// Retargeted onto the mapped command when the mapping was confident,
    /// otherwise the command as given.
    pub command: ParsedCommand,
    pub context: CheckContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    pub response: ConfirmationResponse,
    pub prompt: String,
    pub applied_hacks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStatus {
    pub progress_percentage: f64,
    pub progress_indicator: String,
    pub milestones_injected: usize,
    pub milestones_remaining: usize,
    pub undo_count: usize,
    pub redo_count: usize,
    pub enabled_hacks: Vec<String>,
    pub total_hacks: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Mapping, confirmation, hack injection and history wired together.
#[derive(Debug, Clone)]
pub struct Pipeline {
    mapper: VerbMapper,
    protocol: ConfirmationProtocol,
    tracker: ProgressTracker,
    history: HistoryStack,
    options: IntegrationOptions,
    injection: InjectOptions,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(VerbMapper::with_defaults(), ConfirmationProtocol::default())
    }
}

impl Pipeline {
    pub fn new(mapper: VerbMapper, protocol: ConfirmationProtocol) -> Self {
        Self {
            mapper,
            protocol,
            tracker: ProgressTracker::default(),
            history: HistoryStack::default(),
            options: IntegrationOptions::default(),
            injection: InjectOptions::default(),
        }
    }

    pub fn with_hacks(mut self, hacks: HackSet) -> Self {
        self.tracker = ProgressTracker::new(hacks);
        self
    }

    pub fn with_options(mut self, options: IntegrationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_injection(mut self, injection: InjectOptions) -> Self {
        self.injection = injection;
        self
    }

    pub fn with_history(mut self, history: HistoryStack) -> Self {
        self.history = history;
        self
    }

    pub fn mapper(&self) -> &VerbMapper {
        &self.mapper
    }

    pub fn protocol(&self) -> &ConfirmationProtocol {
        &self.protocol
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ProgressTracker {
        &mut self.tracker
    }

    pub fn history(&self) -> &HistoryStack {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStack {
        &mut self.history
    }

    /// Map the command's verb and build the context the protocol needs.
    pub fn resolve(&self, command: &ParsedCommand) -> Resolution {
        let noun = Some(command.noun.as_str()).filter(|n| !n.is_empty());
        let mapping = self.mapper.map(&command.verb, noun);

        let command = match mapping.target_command {
            Some(ref target) if !mapping.requires_confirmation => command.retarget(target),
            _ => command.clone(),
        };

        let mut context = mapping.to_context();
        context.missing_required_params = self.mapper.catalog().missing_required(&command);

        Resolution {
            mapping,
            command,
            context,
        }
    }

    /// Run the protocol, inject the hacks its mode calls for and any newly
    /// reached milestone hack, then record the command in history.
    pub fn check_and_enhance(
        &mut self,
        command: &ParsedCommand,
        prompt: &str,
        context: &CheckContext,
    ) -> PipelineOutcome {
        let response = self.protocol.check(command, context);
        let mut prompt = prompt.to_string();
        let mut applied: Vec<String> = Vec::new();

        if let Some(mode) = response.mode {
            for id in self.options.hacks_for(mode) {
                let Some(hack) = self.tracker.hacks().get(id).filter(|h| h.enabled) else {
                    continue;
                };
                prompt = inject(&prompt, hack, self.injection).injected;
                applied.push(hack.id.clone());
            }
        }

        let progress = context.progress();
        if progress > 0 {
            let milestone_hack = self
                .tracker
                .update_progress(u64::from(progress))
                .filter(|h| !applied.contains(&h.id))
                .cloned();
            if let Some(hack) = milestone_hack {
                prompt = inject(&prompt, &hack, self.injection).injected;
                self.tracker.mark_injected(hack.milestone);
                applied.push(hack.id);
            }
        }

        if self.options.record_history {
            self.history
                .push(CommandSnapshot::new(command.raw(), command.command_name.clone()));
        }

        tracing::debug!(
            command = %command.command_name,
            triggered = response.triggered,
            hacks = applied.len(),
            "pipeline checked command"
        );

        PipelineOutcome {
            response,
            prompt,
            applied_hacks: applied,
        }
    }

    pub fn status(&self) -> PipelineStatus {
        let hacks = self.tracker.hacks();
        PipelineStatus {
            progress_percentage: self.tracker.percentage(),
            progress_indicator: self.tracker.compact_indicator(),
            milestones_injected: self.tracker.injected_count(),
            milestones_remaining: self.tracker.remaining_count(),
            undo_count: self.history.undo_count(),
            redo_count: self.history.redo_count(),
            enabled_hacks: hacks.enabled().map(|h| h.id.clone()).collect(),
            total_hacks: hacks.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::InputRef;
    use crate::hacks::preset;
    use crate::injector::InjectionStyle;

    fn pipeline() -> Pipeline {
        Pipeline::default().with_injection(InjectOptions {
            style: InjectionStyle::Minimal,
            ..Default::default()
        })
    }

    #[test]
    fn every_mode_has_a_hack_list() {
        let options = IntegrationOptions::default();
        for mode in ConfirmationMode::all() {
            let _ = options.hacks_for(*mode);
        }
        assert_eq!(options.hacks_for(ConfirmationMode::ErrorRecovery), &["clarify", "self_grade"]);
        let quiet = IntegrationOptions {
            all_hacks_on_large_task: false,
            devils_advocate_on_high_risk: false,
            ..Default::default()
        };
        assert_eq!(quiet.hacks_for(ConfirmationMode::LargeTaskConfirm), &["self_grade"]);
        assert!(quiet.hacks_for(ConfirmationMode::HighRiskConfirm).is_empty());
    }

    #[test]
    fn ambiguous_injects_clarify() {
        let mut p = pipeline();
        let cmd = ParsedCommand::new("figure-out");
        let outcome = p.check_and_enhance(&cmd, "Look at Q3", &CheckContext::new().with_confidence(40.0));
        assert_eq!(outcome.response.mode, Some(ConfirmationMode::AmbiguousRepair));
        assert_eq!(outcome.applied_hacks, vec!["clarify"]);
        assert!(outcome.prompt.starts_with("Look at Q3\n\nAsk me clarifying"));
    }

    #[test]
    fn large_task_skips_disabled_hacks() {
        let mut p = pipeline().with_hacks({
            let mut hacks = HackSet::default();
            hacks.apply_preset(preset("analysis").unwrap());
            hacks
        });
        let cmd = ParsedCommand::new("generate-site");
        let outcome = p.check_and_enhance(&cmd, "Build it", &CheckContext::new().with_estimated_tokens(80_000));
        assert_eq!(outcome.applied_hacks, vec!["clarify", "self_grade"]);
    }

    #[test]
    fn high_risk_enforces_devils_advocate() {
        let mut p = pipeline();
        let cmd = ParsedCommand::new("delete-file").with_input(InputRef::new("file", "a.txt"));
        let outcome = p.check_and_enhance(&cmd, "Remove it", &CheckContext::new());
        assert_eq!(outcome.applied_hacks, vec!["devils_advocate"]);
    }

    #[test]
    fn milestone_hack_added_once() {
        let mut p = pipeline();
        let cmd = ParsedCommand::new("list-files");
        let ctx = CheckContext::new().with_progress(25);
        let first = p.check_and_enhance(&cmd, "Go", &ctx);
        assert!(!first.response.triggered);
        assert_eq!(first.applied_hacks, vec!["clarify"]);
        assert_eq!(p.tracker().injected_count(), 1);

        let second = p.check_and_enhance(&cmd, "Go", &ctx);
        assert!(second.applied_hacks.is_empty());
        assert_eq!(second.prompt, "Go");
    }

    #[test]
    fn milestone_hack_not_duplicated() {
        let mut p = pipeline();
        let cmd = ParsedCommand::new("figure-out");
        let ctx = CheckContext::new().with_confidence(40.0).with_progress(20);
        let outcome = p.check_and_enhance(&cmd, "Go", &ctx);
        assert_eq!(outcome.applied_hacks, vec!["clarify"]);
        assert_eq!(outcome.prompt.matches("Ask me clarifying").count(), 1);
    }

    #[test]
    fn records_history_when_enabled() {
        let mut p = pipeline();
        let cmd = ParsedCommand::new("list-files");
        p.check_and_enhance(&cmd, "Go", &CheckContext::new());
        assert_eq!(p.history().undo_count(), 1);
        assert_eq!(p.history().peek_undo().unwrap().command, "/list-files");

        let mut quiet = pipeline().with_options(IntegrationOptions {
            record_history: false,
            ..Default::default()
        });
        quiet.check_and_enhance(&cmd, "Go", &CheckContext::new());
        assert!(quiet.history().is_empty());
    }

    #[test]
    fn resolve_retargets_confident_mapping() {
        let p = pipeline();
        let cmd = ParsedCommand::new("inspect-data").with_input(InputRef::new("file", "q3.csv"));
        let resolution = p.resolve(&cmd);
        assert_eq!(resolution.command.command_name, "analyze-data");
        assert_eq!(resolution.command.raw(), "/analyze-data @file:q3.csv");
        assert_eq!(resolution.context.mapping_confidence(), 95.0);
    }

    #[test]
    fn resolve_keeps_ambiguous_command() {
        let p = pipeline();
        let cmd = ParsedCommand::new("check-data");
        let resolution = p.resolve(&cmd);
        assert_eq!(resolution.command.command_name, "check-data");
        let response = p.protocol().check(&resolution.command, &resolution.context);
        assert_eq!(response.mode, Some(ConfirmationMode::AmbiguousRepair));
        assert_eq!(response.suggestions[0].command, "/analyze-data");
    }

    #[test]
    fn resolve_maps_synonym_onto_high_risk_command() {
        let p = pipeline();
        let cmd = ParsedCommand::new("erase-file");
        let resolution = p.resolve(&cmd);
        assert_eq!(resolution.command.verb, "delete");
        let response = p.protocol().check(&resolution.command, &resolution.context);
        assert_eq!(response.mode, Some(ConfirmationMode::HighRiskConfirm));
    }

    #[test]
    fn status_reports_counts() {
        let mut p = pipeline();
        p.check_and_enhance(&ParsedCommand::new("list-files"), "Go", &CheckContext::new().with_progress(45));
        let status = p.status();
        assert_eq!(status.undo_count, 1);
        assert_eq!(status.milestones_injected, 1);
        assert_eq!(status.milestones_remaining, 3);
        assert_eq!(status.total_hacks, 5);
        assert_eq!(status.enabled_hacks.len(), 4);
    }
}
