use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Alias → weight in `[0, 100]`.
pub type AliasMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAliases {
    pub command: String,
    pub aliases: AliasMap,
}

// ---------------------------------------------------------------------------
// SynonymStore
// ---------------------------------------------------------------------------

/// Canonical command → weighted aliases.
///
/// Commands are kept in registration order. That order is observable: the
/// verb mapper uses it to break ties between equally scored commands, so a
/// command registered earlier wins a tie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynonymStore {
    entries: Vec<CommandAliases>,
}

pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        return 0.0;
    }
    weight.clamp(0.0, 100.0)
}

fn normalize_alias(alias: &str) -> String {
    alias.trim().to_lowercase()
}

impl SynonymStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store populated with [`DEFAULT_SYNONYMS`].
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        for (command, aliases) in DEFAULT_SYNONYMS {
            store.register(command, aliases.iter().map(|(a, w)| (*a, *w)));
        }
        store
    }

    fn entry_mut(&mut self, command: &str) -> &mut CommandAliases {
        let idx = match self.entries.iter().position(|e| e.command == command) {
            Some(i) => i,
            None => {
                self.entries.push(CommandAliases {
                    command: command.to_string(),
                    aliases: AliasMap::new(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    /// Merge `aliases` into `command`, creating the command if needed.
    pub fn register<I, S>(&mut self, command: &str, aliases: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let entry = self.entry_mut(command);
        for (alias, weight) in aliases {
            entry
                .aliases
                .insert(normalize_alias(alias.as_ref()), clamp_weight(weight));
        }
    }

    pub fn add_synonym(&mut self, command: &str, alias: &str, weight: f64) {
        self.entry_mut(command)
            .aliases
            .insert(normalize_alias(alias), clamp_weight(weight));
    }

    pub fn remove_synonym(&mut self, command: &str, alias: &str) -> bool {
        let alias = normalize_alias(alias);
        self.entries
            .iter_mut()
            .find(|e| e.command == command)
            .map(|e| e.aliases.remove(&alias).is_some())
            .unwrap_or(false)
    }

    pub fn remove_command(&mut self, command: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.command != command);
        self.entries.len() != before
    }

    pub fn get(&self, command: &str) -> Option<&AliasMap> {
        self.entries
            .iter()
            .find(|e| e.command == command)
            .map(|e| &e.aliases)
    }

    /// Every command that lists `alias` verbatim, highest weight first.
    pub fn find_by_synonym(&self, alias: &str) -> Vec<(String, f64)> {
        let alias = normalize_alias(alias);
        let mut results: Vec<(String, f64)> = self
            .entries
            .iter()
            .filter_map(|e| e.aliases.get(&alias).map(|w| (e.command.clone(), *w)))
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AliasMap)> {
        self.entries.iter().map(|e| (e.command.as_str(), &e.aliases))
    }

    pub fn commands(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.command.as_str()).collect()
    }

    pub fn contains(&self, command: &str) -> bool {
        self.entries.iter().any(|e| e.command == command)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_SYNONYMS: &[(&str, &[(&str, f64)])] = &[
    (
        "analyze-data",
        &[
            ("analyze", 100.0),
            ("inspect", 95.0),
            ("examine", 92.0),
            ("investigate", 90.0),
            ("review", 85.0),
            ("check", 80.0),
            ("study", 78.0),
            ("evaluate", 75.0),
        ],
    ),
    (
        "summarize-doc",
        &[
            ("summarize", 100.0),
            ("digest", 95.0),
            ("condense", 92.0),
            ("brief", 90.0),
            ("abstract", 88.0),
            ("outline", 85.0),
            ("recap", 82.0),
        ],
    ),
    (
        "convert-file",
        &[
            ("convert", 100.0),
            ("transform", 95.0),
            ("change", 88.0),
            ("translate", 85.0),
            ("switch", 80.0),
            ("modify", 75.0),
        ],
    ),
    (
        "generate-site",
        &[
            ("generate", 100.0),
            ("create", 98.0),
            ("build", 95.0),
            ("make", 90.0),
            ("produce", 85.0),
            ("construct", 82.0),
        ],
    ),
    (
        "deploy-site",
        &[
            ("deploy", 100.0),
            ("publish", 95.0),
            ("release", 92.0),
            ("launch", 90.0),
        ],
    ),
    (
        "delete-file",
        &[
            ("delete", 100.0),
            ("remove", 95.0),
            ("erase", 92.0),
            ("destroy", 90.0),
        ],
    ),
    (
        "list-files",
        &[
            ("list", 100.0),
            ("show", 95.0),
            ("display", 92.0),
            ("enumerate", 88.0),
        ],
    ),
    (
        "search-content",
        &[
            ("search", 100.0),
            ("find", 98.0),
            ("locate", 95.0),
            ("lookup", 92.0),
            ("query", 88.0),
        ],
    ),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get() {
        let mut store = SynonymStore::new();
        store.register("test-cmd", [("test", 100.0), ("try", 90.0)]);
        let aliases = store.get("test-cmd").unwrap();
        assert_eq!(aliases["test"], 100.0);
        assert_eq!(aliases["try"], 90.0);
        assert!(store.get("missing-cmd").is_none());
    }

    #[test]
    fn weights_are_clamped_on_every_insert_path() {
        let mut store = SynonymStore::new();
        store.register("a-b", [("high", 250.0), ("low", -3.0)]);
        store.add_synonym("a-b", "nan", f64::NAN);
        store.add_synonym("a-b", "over", 101.0);
        let aliases = store.get("a-b").unwrap();
        assert_eq!(aliases["high"], 100.0);
        assert_eq!(aliases["low"], 0.0);
        assert_eq!(aliases["nan"], 0.0);
        assert_eq!(aliases["over"], 100.0);
    }

    #[test]
    fn aliases_are_normalized() {
        let mut store = SynonymStore::new();
        store.add_synonym("analyze-data", "  Inspect ", 95.0);
        assert_eq!(store.get("analyze-data").unwrap()["inspect"], 95.0);
        assert!(store.remove_synonym("analyze-data", "INSPECT"));
    }

    #[test]
    fn register_merges_into_existing_command() {
        let mut store = SynonymStore::new();
        store.register("test-cmd", [("test", 100.0)]);
        store.register("test-cmd", [("try", 90.0), ("test", 70.0)]);
        let aliases = store.get("test-cmd").unwrap();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases["test"], 70.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn find_by_synonym_orders_by_weight() {
        let mut store = SynonymStore::new();
        store.register("cmd-one", [("test", 80.0)]);
        store.register("cmd-two", [("test", 100.0)]);
        let results = store.find_by_synonym("test");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], ("cmd-two".to_string(), 100.0));
        assert_eq!(results[1], ("cmd-one".to_string(), 80.0));
    }

    #[test]
    fn remove_synonym_and_command() {
        let mut store = SynonymStore::new();
        store.register("test-cmd", [("test", 100.0), ("try", 90.0)]);
        assert!(store.remove_synonym("test-cmd", "try"));
        assert!(!store.remove_synonym("test-cmd", "try"));
        assert!(!store.remove_synonym("other-cmd", "test"));
        assert!(!store.get("test-cmd").unwrap().contains_key("try"));

        assert!(store.remove_command("test-cmd"));
        assert!(!store.remove_command("test-cmd"));
        assert!(store.is_empty());
    }

    #[test]
    fn preserves_registration_order() {
        let mut store = SynonymStore::new();
        store.add_synonym("zeta-cmd", "z", 50.0);
        store.add_synonym("alpha-cmd", "a", 50.0);
        store.add_synonym("zeta-cmd", "zz", 50.0);
        assert_eq!(store.commands(), vec!["zeta-cmd", "alpha-cmd"]);
    }

    #[test]
    fn default_store_has_all_groups() {
        let store = SynonymStore::with_defaults();
        assert_eq!(store.len(), DEFAULT_SYNONYMS.len());
        assert!(store.contains("analyze-data"));
        assert!(store.contains("summarize-doc"));
        assert_eq!(store.get("delete-file").unwrap()["destroy"], 90.0);
        assert_eq!(store.commands()[0], "analyze-data");
    }
}
