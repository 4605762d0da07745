use crate::catalog::Catalog;
use crate::context::CheckContext;
use crate::error::{Result, SlashdashError};
use crate::synonyms::{AliasMap, SynonymStore};
use crate::weights::WeightCalculator;
use serde::{Deserialize, Serialize};

/// Multiplier applied when the caller's noun disagrees with the command noun.
pub const NOUN_MISMATCH_PENALTY: f64 = 0.7;
/// Runner-up candidates reported next to the best match.
pub const MAX_ALTERNATIVES: usize = 4;
/// Weight used by [`VerbMapper::register_synonym`] when none is given.
pub const DEFAULT_SYNONYM_WEIGHT: f64 = 80.0;

// ---------------------------------------------------------------------------
// MapperConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// At or above this confidence the best candidate is used without asking.
    #[serde(default = "default_direct_threshold")]
    pub direct_threshold: f64,
    /// Scores below this are discarded before any adjustment.
    #[serde(default = "default_reject_threshold")]
    pub reject_threshold: f64,
    #[serde(default = "default_fuzzy_match")]
    pub fuzzy_match: bool,
}

fn default_direct_threshold() -> f64 {
    90.0
}

fn default_reject_threshold() -> f64 {
    30.0
}

fn default_fuzzy_match() -> bool {
    true
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            direct_threshold: default_direct_threshold(),
            reject_threshold: default_reject_threshold(),
            fuzzy_match: default_fuzzy_match(),
        }
    }
}

impl MapperConfig {
    /// Both thresholds must be finite, inside `[0, 100]`, and ordered
    /// `reject <= direct`.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("direct_threshold", self.direct_threshold),
            ("reject_threshold", self.reject_threshold),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(SlashdashError::InvalidThreshold {
                    name,
                    value,
                    reason: "must be between 0 and 100".to_string(),
                });
            }
        }
        if self.reject_threshold > self.direct_threshold {
            return Err(SlashdashError::InvalidThreshold {
                name: "reject_threshold",
                value: self.reject_threshold,
                reason: format!(
                    "must not exceed direct_threshold ({})",
                    self.direct_threshold
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MappingCandidate / MappingResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingCandidate {
    pub command: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub input_verb: String,
    pub matched: bool,
    pub target_command: Option<String>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_description: Option<String>,
    pub alternatives: Vec<MappingCandidate>,
    pub requires_confirmation: bool,
}

impl MappingResult {
    pub fn no_match(input_verb: impl Into<String>) -> Self {
        Self {
            input_verb: input_verb.into(),
            matched: false,
            target_command: None,
            confidence: 0.0,
            target_description: None,
            alternatives: Vec::new(),
            requires_confirmation: true,
        }
    }

    /// The best match followed by the alternatives, in rank order.
    pub fn candidates(&self) -> Vec<MappingCandidate> {
        let mut out = Vec::with_capacity(self.alternatives.len() + 1);
        if let Some(ref command) = self.target_command {
            out.push(MappingCandidate {
                command: command.clone(),
                confidence: self.confidence,
                description: self.target_description.clone(),
            });
        }
        out.extend(self.alternatives.iter().cloned());
        out
    }

    /// A context carrying this mapping's confidence and ranked candidates.
    pub fn to_context(&self) -> CheckContext {
        CheckContext::new()
            .with_confidence(self.confidence)
            .with_candidates(self.candidates())
    }
}

// ---------------------------------------------------------------------------
// VerbMapper
// ---------------------------------------------------------------------------

/// Maps loosely worded verbs onto canonical command names.
///
/// The mapper owns its [`SynonymStore`]; there is no process-wide registry.
/// Mapping is a pure function of the store, the config and the input.
#[derive(Debug, Clone)]
pub struct VerbMapper {
    store: SynonymStore,
    catalog: Catalog,
    calculator: WeightCalculator,
    config: MapperConfig,
}

impl Default for VerbMapper {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VerbMapper {
    pub fn new(store: SynonymStore, config: MapperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            catalog: Catalog::new(),
            calculator: WeightCalculator::new(config.fuzzy_match),
            config,
        })
    }

    /// Default synonym groups, default catalog and default thresholds.
    pub fn with_defaults() -> Self {
        Self {
            store: SynonymStore::with_defaults(),
            catalog: Catalog::with_defaults(),
            calculator: WeightCalculator::default(),
            config: MapperConfig::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn store(&self) -> &SynonymStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SynonymStore {
        &mut self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn map(&self, verb: &str, noun: Option<&str>) -> MappingResult {
        let verb = verb.trim().to_lowercase();
        if verb.is_empty() {
            return MappingResult::no_match(verb);
        }

        let mut candidates = self.find_candidates(&verb, noun);
        // stable: ties keep store registration order
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut ranked = candidates.into_iter();
        let Some(best) = ranked.next() else {
            tracing::debug!(verb = %verb, "no command matched");
            return MappingResult::no_match(verb);
        };
        let alternatives: Vec<MappingCandidate> = ranked.take(MAX_ALTERNATIVES).collect();
        let requires_confirmation = best.confidence < self.config.direct_threshold;

        tracing::debug!(
            verb = %verb,
            target = %best.command,
            confidence = best.confidence,
            alternatives = alternatives.len(),
            requires_confirmation,
            "mapped verb"
        );

        MappingResult {
            input_verb: verb,
            matched: true,
            target_command: Some(best.command),
            confidence: best.confidence,
            target_description: best.description,
            alternatives,
            requires_confirmation,
        }
    }

    fn find_candidates(&self, verb: &str, noun: Option<&str>) -> Vec<MappingCandidate> {
        let noun = noun.map(str::trim).filter(|n| !n.is_empty());

        self.store
            .iter()
            .filter_map(|(command, aliases)| {
                let mut confidence = self.calculator.calculate(verb, aliases);
                if confidence < self.config.reject_threshold {
                    return None;
                }
                if let Some(noun) = noun {
                    let command_noun = command.split_once('-').map_or("", |(_, n)| n);
                    if !command_noun.is_empty() && command_noun != noun {
                        confidence *= NOUN_MISMATCH_PENALTY;
                    }
                }
                Some(MappingCandidate {
                    command: command.to_string(),
                    confidence,
                    description: self.catalog.description(command).map(str::to_string),
                })
            })
            .collect()
    }

    /// Add one alias to `command` with the default weight of 80.
    pub fn register_synonym(&mut self, command: &str, alias: &str, weight: Option<f64>) {
        self.store
            .add_synonym(command, alias, weight.unwrap_or(DEFAULT_SYNONYM_WEIGHT));
    }

    /// Aliases of `command`; empty when the command is unknown.
    pub fn synonyms_for(&self, command: &str) -> AliasMap {
        self.store.get(command).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper_with(groups: &[(&str, &[(&str, f64)])]) -> VerbMapper {
        let mut store = SynonymStore::new();
        for (command, aliases) in groups {
            store.register(command, aliases.iter().map(|(a, w)| (*a, *w)));
        }
        VerbMapper::new(store, MapperConfig::default()).unwrap()
    }

    #[test]
    fn exact_alias_maps_directly() {
        let mapper = VerbMapper::with_defaults();
        let result = mapper.map("inspect", None);
        assert!(result.matched);
        assert_eq!(result.target_command.as_deref(), Some("analyze-data"));
        assert_eq!(result.confidence, 95.0);
        assert!(!result.requires_confirmation);
        assert_eq!(
            result.target_description.as_deref(),
            Some("Run a detailed analysis of the data")
        );
    }

    #[test]
    fn unregistered_verb_is_no_match() {
        let mapper = VerbMapper::with_defaults();
        let result = mapper.map("figure", None);
        assert_eq!(result, MappingResult::no_match("figure"));
        assert!(!result.matched);
        assert!(result.target_command.is_none());
        assert!(result.requires_confirmation);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn empty_verb_is_no_match() {
        let mapper = VerbMapper::with_defaults();
        assert!(!mapper.map("   ", None).matched);
        assert!(!mapper.map("", Some("data")).matched);
    }

    #[test]
    fn mapping_is_idempotent() {
        let mapper = VerbMapper::with_defaults();
        for verb in ["inspect", "chek", "summ", "remove", "nothing"] {
            assert_eq!(mapper.map(verb, None), mapper.map(verb, None));
        }
    }

    #[test]
    fn normalizes_verb_case_and_whitespace() {
        let mapper = VerbMapper::with_defaults();
        let result = mapper.map("  INSPECT ", None);
        assert_eq!(result.input_verb, "inspect");
        assert_eq!(result.confidence, 95.0);
    }

    #[test]
    fn ties_keep_registration_order() {
        let mapper = mapper_with(&[("zeta-one", &[("run", 85.0)]), ("alpha-two", &[("run", 85.0)])]);
        let result = mapper.map("run", None);
        assert_eq!(result.target_command.as_deref(), Some("zeta-one"));
        assert_eq!(result.alternatives[0].command, "alpha-two");
    }

    #[test]
    fn noun_mismatch_is_penalized() {
        let mapper = VerbMapper::with_defaults();
        let matching = mapper.map("inspect", Some("data"));
        assert_eq!(matching.confidence, 95.0);

        let mismatched = mapper.map("inspect", Some("report"));
        assert!((mismatched.confidence - 95.0 * NOUN_MISMATCH_PENALTY).abs() < 1e-9);
        assert!(mismatched.requires_confirmation);
    }

    #[test]
    fn single_word_command_has_no_noun_penalty() {
        let mapper = mapper_with(&[("status", &[("status", 100.0)])]);
        assert_eq!(mapper.map("status", Some("report")).confidence, 100.0);
    }

    #[test]
    fn reject_floor_applies_before_noun_penalty() {
        // 35 survives the floor of 30, then drops to 24.5 after the penalty
        let mapper = mapper_with(&[("peek-data", &[("peek", 35.0)]), ("drop-logs", &[("peek", 20.0)])]);
        let result = mapper.map("peek", Some("report"));
        assert!(result.matched);
        assert_eq!(result.target_command.as_deref(), Some("peek-data"));
        assert!((result.confidence - 24.5).abs() < 1e-9);
        assert!(result.alternatives.is_empty());
    }

    #[test]
    fn alternatives_capped_at_four() {
        let groups: Vec<(String, f64)> = ["aa-a", "bb-b", "cc-c", "dd-d", "ee-e", "ff-f"]
            .iter()
            .enumerate()
            .map(|(i, c)| (c.to_string(), 95.0 - i as f64))
            .collect();
        let mut store = SynonymStore::new();
        for (command, weight) in &groups {
            store.add_synonym(command, "go", *weight);
        }
        let mapper = VerbMapper::new(store, MapperConfig::default()).unwrap();
        let result = mapper.map("go", None);
        assert_eq!(result.target_command.as_deref(), Some("aa-a"));
        assert_eq!(result.alternatives.len(), MAX_ALTERNATIVES);
        assert_eq!(result.alternatives[3].command, "ee-e");
        assert_eq!(result.candidates().len(), 5);
    }

    #[test]
    fn low_confidence_requires_confirmation() {
        let mapper = VerbMapper::with_defaults();
        // "check" is an exact alias of analyze-data at 80
        let result = mapper.map("check", None);
        assert_eq!(result.confidence, 80.0);
        assert!(result.requires_confirmation);
    }

    #[test]
    fn fuzzy_match_finds_misspelling() {
        let mapper = VerbMapper::with_defaults();
        let result = mapper.map("summarise", None);
        assert_eq!(result.target_command.as_deref(), Some("summarize-doc"));
        assert!(result.confidence < 90.0);
    }

    #[test]
    fn to_context_carries_ranked_candidates() {
        let mapper = VerbMapper::with_defaults();
        let result = mapper.map("check", None);
        let ctx = result.to_context();
        assert_eq!(ctx.mapping_confidence(), 80.0);
        assert_eq!(ctx.candidates[0].command, "analyze-data");
    }

    #[test]
    fn register_synonym_uses_default_weight() {
        let mut mapper = VerbMapper::with_defaults();
        mapper.register_synonym("analyze-data", "crunch", None);
        assert_eq!(mapper.synonyms_for("analyze-data")["crunch"], 80.0);
        let result = mapper.map("crunch", None);
        assert_eq!(result.target_command.as_deref(), Some("analyze-data"));
        assert!(mapper.synonyms_for("unknown-cmd").is_empty());
    }

    #[test]
    fn config_validation() {
        assert!(MapperConfig::default().validate().is_ok());
        let inverted = MapperConfig {
            direct_threshold: 20.0,
            reject_threshold: 50.0,
            fuzzy_match: true,
        };
        assert!(inverted.validate().is_err());
        let out_of_range = MapperConfig {
            direct_threshold: 150.0,
            ..Default::default()
        };
        assert!(out_of_range.validate().is_err());
        assert!(VerbMapper::new(SynonymStore::new(), inverted).is_err());
    }
}
