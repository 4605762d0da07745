use crate::error::{Result, SlashdashError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress percentages at which a hack may be injected.
pub const MILESTONES: [u32; 5] = [20, 40, 60, 80, 100];

// ---------------------------------------------------------------------------
// PromptHack
// ---------------------------------------------------------------------------

/// A postscript appended to an outgoing prompt to improve answer quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptHack {
    pub id: String,
    pub name: String,
    pub milestone: u32,
    pub postscript: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub use_when: Vec<String>,
    /// Used instead of the postscript when the model cannot do what it asks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl PromptHack {
    /// Postscript text, optionally followed by the enhanced addendum.
    pub fn text(&self, enhanced: bool) -> String {
        let base = self.postscript.trim();
        match self.enhanced.as_deref() {
            Some(extra) if enhanced => format!("{base}\n\n{}", extra.trim()),
            _ => base.to_string(),
        }
    }
}

impl fmt::Display for PromptHack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.enabled { "x" } else { " " };
        write!(f, "[{mark}] {:>3}% {}", self.milestone, self.name)
    }
}

// ---------------------------------------------------------------------------
// HackSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HackSet {
    hacks: Vec<PromptHack>,
}

impl Default for HackSet {
    fn default() -> Self {
        Self {
            hacks: default_hacks(),
        }
    }
}

impl HackSet {
    pub fn new(hacks: Vec<PromptHack>) -> Self {
        Self { hacks }
    }

    pub fn get(&self, id: &str) -> Option<&PromptHack> {
        self.hacks.iter().find(|h| h.id == id)
    }

    /// The enabled hack scheduled at `milestone`, if any.
    pub fn at_milestone(&self, milestone: u32) -> Option<&PromptHack> {
        self.hacks
            .iter()
            .find(|h| h.milestone == milestone && h.enabled)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &PromptHack> {
        self.hacks.iter().filter(|h| h.enabled)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.get(id).is_some_and(|h| h.enabled)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> Result<()> {
        let hack = self
            .hacks
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| SlashdashError::UnknownHack(id.to_string()))?;
        hack.enabled = enabled;
        Ok(())
    }

    pub fn apply_preset(&mut self, preset: &Preset) {
        preset.apply(&mut self.hacks);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PromptHack> {
        self.hacks.iter()
    }

    pub fn len(&self) -> usize {
        self.hacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hacks.is_empty()
    }
}

pub fn default_hacks() -> Vec<PromptHack> {
    vec![
        PromptHack {
            id: "clarify".into(),
            name: "Clarify".into(),
            milestone: 20,
            postscript: "Ask me clarifying questions until you are 95% confident you understand what I want before generating the final output.".into(),
            enabled: true,
            use_when: vec![
                "Task has hidden preferences (tone, audience, constraints)".into(),
                "Wrong assumptions would waste time".into(),
            ],
            fallback: None,
            enhanced: None,
        },
        PromptHack {
            id: "web_backed".into(),
            name: "Web-backed".into(),
            milestone: 40,
            postscript: "Before answering, search the web for the most recent and credible information. Include sources and a timestamp.".into(),
            enabled: true,
            use_when: vec![
                "Time-sensitive data (pricing, laws, product features)".into(),
                "You want receipts, not vibes".into(),
            ],
            fallback: Some("If you cannot browse, tell me exactly what you would search for, which sources you would trust most, and what might be outdated.".into()),
            enhanced: None,
        },
        PromptHack {
            id: "self_grade".into(),
            name: "Self-grade".into(),
            milestone: 60,
            postscript: "Before answering, evaluate your answer for accuracy, completeness, usefulness, and clarity until it is at least 9 out of 10 in each category.".into(),
            enabled: true,
            use_when: vec![
                "Need a polished deliverable (strategy, pitch, SOP)".into(),
                "Hate re-prompting for obvious fixes".into(),
            ],
            fallback: None,
            enhanced: None,
        },
        PromptHack {
            id: "expert_panel".into(),
            name: "3-Expert Panel".into(),
            milestone: 80,
            postscript: "Answer using a 3-expert panel: a practitioner, a skeptic, and an editor. Show where they disagree, then synthesize one final answer with the best tradeoffs.".into(),
            enabled: false,
            use_when: vec![
                "Making decisions and want tradeoffs".into(),
                "Want fewer blind spots".into(),
            ],
            fallback: None,
            enhanced: None,
        },
        PromptHack {
            id: "devils_advocate".into(),
            name: "Devil's Advocate".into(),
            milestone: 100,
            postscript: "After generating your answer, provide a critique of your own response from the perspective of a skeptic. Highlight potential biases, missing angles, or logical gaps.".into(),
            enabled: true,
            use_when: vec![
                "Brainstorming, decision-making, sanity-checking".into(),
                "Want to catch weak logic before acting".into(),
            ],
            fallback: None,
            enhanced: Some("Assume my plan fails. List the top 10 reasons and how to mitigate each.".into()),
        },
    ]
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// A named selection of enabled hacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub enabled_hacks: &'static [&'static str],
}

impl Preset {
    /// Enable exactly the hacks this preset lists and disable the rest.
    pub fn apply(&self, hacks: &mut [PromptHack]) {
        for hack in hacks {
            hack.enabled = self.enabled_hacks.contains(&hack.id.as_str());
        }
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        id: "recommended",
        name: "Recommended",
        description: "Balance quality and speed",
        enabled_hacks: &["clarify", "web_backed", "self_grade", "devils_advocate"],
    },
    Preset {
        id: "all",
        name: "All",
        description: "Enable all five hacks",
        enabled_hacks: &[
            "clarify",
            "web_backed",
            "self_grade",
            "expert_panel",
            "devils_advocate",
        ],
    },
    Preset {
        id: "analysis",
        name: "Analysis",
        description: "For data analysis tasks",
        enabled_hacks: &["clarify", "self_grade"],
    },
    Preset {
        id: "research",
        name: "Research",
        description: "Latest information and multiple perspectives",
        enabled_hacks: &["web_backed", "expert_panel", "devils_advocate"],
    },
    Preset {
        id: "writing",
        name: "Writing",
        description: "High quality output",
        enabled_hacks: &["self_grade", "devils_advocate"],
    },
    Preset {
        id: "minimal",
        name: "Minimal",
        description: "Only clarify",
        enabled_hacks: &["clarify"],
    },
    Preset {
        id: "none",
        name: "None",
        description: "No hacks enabled",
        enabled_hacks: &[],
    },
];

pub fn preset(id: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
