use crate::catalog::{Catalog, CommandSpec};
use crate::error::{Result, SlashdashError};
use crate::hacks::{preset, HackSet};
use crate::history::{HistoryStack, DEFAULT_MAX_HISTORY};
use crate::injector::InjectOptions;
use crate::mapper::{MapperConfig, VerbMapper};
use crate::paths;
use crate::pipeline::{IntegrationOptions, Pipeline};
use crate::protocol::{ConfirmationProtocol, ProtocolConfig};
use crate::synonyms::{clamp_weight, AliasMap, SynonymStore, DEFAULT_SYNONYMS};
use crate::types::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl ConfigWarning {
    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: WarnLevel::Error,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CommandConfig
// ---------------------------------------------------------------------------

/// A command as it appears in `config.yaml`: its catalog entry plus its
/// weighted aliases. List order is registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_types: Vec<String>,
    #[serde(default)]
    pub synonyms: AliasMap,
}

impl CommandConfig {
    fn spec(&self) -> CommandSpec {
        CommandSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            risk_level: self.risk_level,
            required_params: self.required_params.clone(),
            input_types: self.input_types.clone(),
        }
    }
}

fn default_commands() -> Vec<CommandConfig> {
    let catalog = Catalog::with_defaults();
    DEFAULT_SYNONYMS
        .iter()
        .map(|(name, aliases)| {
            let spec = catalog.get(name);
            CommandConfig {
                name: name.to_string(),
                description: spec.map(|s| s.description.clone()).unwrap_or_default(),
                risk_level: spec.map(|s| s.risk_level).unwrap_or_default(),
                required_params: Vec::new(),
                input_types: Vec::new(),
                synonyms: aliases.iter().map(|(a, w)| (a.to_string(), *w)).collect(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// HacksConfig / HistoryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HacksConfig {
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Per-hack switches applied after the preset.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, bool>,
}

fn default_preset() -> String {
    "recommended".to_string()
}

impl Default for HacksConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            overrides: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_HISTORY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub mapping: MapperConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    #[serde(default = "default_commands")]
    pub commands: Vec<CommandConfig>,
    #[serde(default)]
    pub hacks: HacksConfig,
    #[serde(default)]
    pub injection: InjectOptions,
    #[serde(default)]
    pub integration: IntegrationOptions,
    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            mapping: MapperConfig::default(),
            protocol: ProtocolConfig::default(),
            commands: default_commands(),
            hacks: HacksConfig::default(),
            injection: InjectOptions::default(),
            integration: IntegrationOptions::default(),
            history: HistoryConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(SlashdashError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        for w in cfg.validate() {
            tracing::warn!(level = ?w.level, "{}", w.message);
        }
        Ok(cfg)
    }

    /// Like [`Config::load`], but falls back to defaults when the project has
    /// not been initialized.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(SlashdashError::NotInitialized) => Ok(Self::default()),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Write the config only when none exists yet. Returns true if written.
    pub fn save_if_missing(&self, root: &Path) -> Result<bool> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::write_if_missing(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Commands and synonyms
    // -----------------------------------------------------------------------

    pub fn command(&self, name: &str) -> Option<&CommandConfig> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Add or update one alias, creating the command when it is new.
    pub fn add_synonym(&mut self, command: &str, alias: &str, weight: f64) -> Result<()> {
        paths::validate_command_name(command)?;
        let alias = alias.trim().to_lowercase();
        if alias.is_empty() {
            return Err(SlashdashError::InvalidConfig {
                field: "synonym".to_string(),
                reason: "alias must not be empty".to_string(),
            });
        }
        let weight = clamp_weight(weight);
        match self.commands.iter_mut().find(|c| c.name == command) {
            Some(entry) => {
                entry.synonyms.insert(alias, weight);
            }
            None => self.commands.push(CommandConfig {
                name: command.to_string(),
                description: String::new(),
                risk_level: RiskLevel::Low,
                required_params: Vec::new(),
                input_types: Vec::new(),
                synonyms: AliasMap::from([(alias, weight)]),
            }),
        }
        Ok(())
    }

    pub fn remove_synonym(&mut self, command: &str, alias: &str) -> Result<bool> {
        let entry = self
            .commands
            .iter_mut()
            .find(|c| c.name == command)
            .ok_or_else(|| SlashdashError::UnknownCommand(command.to_string()))?;
        Ok(entry.synonyms.remove(&alias.trim().to_lowercase()).is_some())
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub fn synonym_store(&self) -> SynonymStore {
        let mut store = SynonymStore::new();
        for command in &self.commands {
            store.register(&command.name, command.synonyms.iter().map(|(a, w)| (a, *w)));
        }
        store
    }

    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        for command in &self.commands {
            catalog.register(command.spec())?;
        }
        Ok(catalog)
    }

    pub fn mapper(&self) -> Result<VerbMapper> {
        Ok(VerbMapper::new(self.synonym_store(), self.mapping)?.with_catalog(self.catalog()?))
    }

    pub fn confirmation_protocol(&self) -> Result<ConfirmationProtocol> {
        ConfirmationProtocol::new(self.protocol)
    }

    pub fn hack_set(&self) -> Result<HackSet> {
        let mut hacks = HackSet::default();
        let chosen = preset(&self.hacks.preset)
            .ok_or_else(|| SlashdashError::UnknownPreset(self.hacks.preset.clone()))?;
        hacks.apply_preset(chosen);
        for (id, enabled) in &self.hacks.overrides {
            hacks.set_enabled(id, *enabled)?;
        }
        Ok(hacks)
    }

    pub fn pipeline(&self) -> Result<Pipeline> {
        Ok(Pipeline::new(self.mapper()?, self.confirmation_protocol()?)
            .with_hacks(self.hack_set()?)
            .with_options(self.integration)
            .with_injection(self.injection)
            .with_history(HistoryStack::new(self.history.max_entries)))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if let Err(e) = self.mapping.validate() {
            warnings.push(ConfigWarning::error(format!("mapping: {e}")));
        }
        if let Err(e) = self.protocol.validate() {
            warnings.push(ConfigWarning::error(format!("protocol: {e}")));
        }

        let mut seen = HashSet::new();
        for command in &self.commands {
            if paths::validate_command_name(&command.name).is_err() {
                warnings.push(ConfigWarning::error(format!(
                    "command '{}' is not a valid command name",
                    command.name
                )));
            }
            if !seen.insert(command.name.as_str()) {
                warnings.push(ConfigWarning::warning(format!(
                    "command '{}' is listed more than once; aliases are merged",
                    command.name
                )));
            }
            if command.synonyms.is_empty() {
                warnings.push(ConfigWarning::warning(format!(
                    "command '{}' has no synonyms and can never be mapped",
                    command.name
                )));
            }
            for (alias, weight) in &command.synonyms {
                if !(0.0..=100.0).contains(weight) {
                    warnings.push(ConfigWarning::warning(format!(
                        "synonym '{alias}' of '{}' has weight {weight}; it will be clamped to [0, 100]",
                        command.name
                    )));
                }
            }
        }

        if preset(&self.hacks.preset).is_none() {
            warnings.push(ConfigWarning::error(format!(
                "unknown hack preset '{}'",
                self.hacks.preset
            )));
        }
        let known = HackSet::default();
        for id in self.hacks.overrides.keys() {
            if known.get(id).is_none() {
                warnings.push(ConfigWarning::error(format!("unknown hack '{id}' in overrides")));
            }
        }

        if self.history.max_entries == 0 {
            warnings.push(ConfigWarning::warning(
                "history.max_entries is 0; one entry will be kept",
            ));
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
