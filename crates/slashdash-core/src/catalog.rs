use crate::command::ParsedCommand;
use crate::error::Result;
use crate::paths::validate_command_name;
use crate::types::RiskLevel;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CommandSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_types: Vec<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            risk_level: RiskLevel::Low,
            required_params: Vec::new(),
            input_types: Vec::new(),
        }
    }

    pub fn with_risk(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn with_required<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_input_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Text before the first hyphen.
    pub fn verb(&self) -> &str {
        self.name.split_once('-').map_or(self.name.as_str(), |(v, _)| v)
    }

    /// Text after the first hyphen, empty for single-word names.
    pub fn noun(&self) -> &str {
        self.name.split_once('-').map_or("", |(_, n)| n)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The set of known commands with their descriptions and risk levels.
/// Iteration follows registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    specs: Vec<CommandSpec>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let specs = DEFAULT_COMMANDS
            .iter()
            .map(|(name, description, risk)| CommandSpec::new(*name, *description).with_risk(*risk))
            .collect();
        Self { specs }
    }

    /// Register `spec`, replacing any existing entry of the same name in place.
    pub fn register(&mut self, spec: CommandSpec) -> Result<()> {
        validate_command_name(&spec.name)?;
        match self.specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.specs.len();
        self.specs.retain(|s| s.name != name);
        self.specs.len() != before
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn description(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(|s| s.description.as_str())
            .filter(|d| !d.is_empty())
    }

    pub fn find_by_verb(&self, verb: &str) -> Vec<&CommandSpec> {
        self.specs.iter().filter(|s| s.verb() == verb).collect()
    }

    pub fn high_risk(&self) -> Vec<&CommandSpec> {
        self.specs.iter().filter(|s| s.risk_level.is_high()).collect()
    }

    /// Required parameters of the named command that `command` does not carry.
    /// Unknown commands have no requirements.
    pub fn missing_required(&self, command: &ParsedCommand) -> Vec<String> {
        let Some(spec) = self.get(&command.command_name) else {
            return Vec::new();
        };
        spec.required_params
            .iter()
            .filter(|p| !command.parameters.contains_key(p.as_str()))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

const DEFAULT_COMMANDS: &[(&str, &str, RiskLevel)] = &[
    ("analyze-data", "Run a detailed analysis of the data", RiskLevel::Low),
    ("summarize-doc", "Produce a summary of the document", RiskLevel::Low),
    ("convert-file", "Convert the file to another format", RiskLevel::Medium),
    ("generate-site", "Generate a static site", RiskLevel::Low),
    ("deploy-site", "Deploy the site", RiskLevel::High),
    ("delete-file", "Delete the file", RiskLevel::Critical),
    ("list-files", "List available files", RiskLevel::Low),
    ("search-content", "Search the content", RiskLevel::Low),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synonyms::DEFAULT_SYNONYMS;

    #[test]
    fn defaults_cover_every_synonym_group() {
        let catalog = Catalog::with_defaults();
        for (command, _) in DEFAULT_SYNONYMS {
            assert!(catalog.contains(command), "missing {command}");
        }
        assert_eq!(
            catalog.description("analyze-data"),
            Some("Run a detailed analysis of the data")
        );
    }

    #[test]
    fn register_validates_and_replaces() {
        let mut catalog = Catalog::new();
        assert!(catalog.register(CommandSpec::new("Bad_Name", "x")).is_err());

        catalog.register(CommandSpec::new("export-report", "v1")).unwrap();
        catalog.register(CommandSpec::new("list-files", "list")).unwrap();
        catalog.register(CommandSpec::new("export-report", "v2")).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("export-report").unwrap().description, "v2");
        assert_eq!(catalog.iter().next().unwrap().name, "export-report");
    }

    #[test]
    fn unregister_reports_presence() {
        let mut catalog = Catalog::with_defaults();
        assert!(catalog.unregister("list-files"));
        assert!(!catalog.unregister("list-files"));
        assert!(catalog.get("list-files").is_none());
    }

    #[test]
    fn high_risk_lists_high_and_critical() {
        let catalog = Catalog::with_defaults();
        let names: Vec<&str> = catalog.high_risk().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["deploy-site", "delete-file"]);
    }

    #[test]
    fn missing_required_params() {
        let mut catalog = Catalog::new();
        catalog
            .register(CommandSpec::new("convert-file", "convert").with_required(["format", "target"]))
            .unwrap();

        let cmd = ParsedCommand::new("convert-file").with_param("format", "pdf");
        assert_eq!(catalog.missing_required(&cmd), vec!["target".to_string()]);

        let unknown = ParsedCommand::new("other-thing");
        assert!(catalog.missing_required(&unknown).is_empty());
    }

    #[test]
    fn verb_and_noun() {
        let spec = CommandSpec::new("search-content", "");
        assert_eq!(spec.verb(), "search");
        assert_eq!(spec.noun(), "content");
        assert_eq!(CommandSpec::new("list", "").noun(), "");
        let catalog = Catalog::with_defaults();
        assert_eq!(catalog.find_by_verb("deploy").len(), 1);
    }
}
