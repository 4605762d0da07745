use crate::error::SlashdashError;
use crate::hacks::PromptHack;
use serde::{Deserialize, Serialize};
use std::fmt;

const RULE_WIDTH: usize = 41;
const BOX_WIDTH: usize = 55;

// ---------------------------------------------------------------------------
// InjectionStyle / InjectionPosition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionStyle {
    Minimal,
    #[default]
    Default,
    Boxed,
    Highlight,
}

impl InjectionStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            InjectionStyle::Minimal => "minimal",
            InjectionStyle::Default => "default",
            InjectionStyle::Boxed => "boxed",
            InjectionStyle::Highlight => "highlight",
        }
    }
}

impl fmt::Display for InjectionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InjectionStyle {
    type Err = SlashdashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(InjectionStyle::Minimal),
            "default" => Ok(InjectionStyle::Default),
            "boxed" => Ok(InjectionStyle::Boxed),
            "highlight" => Ok(InjectionStyle::Highlight),
            _ => Err(SlashdashError::InvalidVariant {
                kind: "injection style",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPosition {
    Prepend,
    #[default]
    Append,
    Wrap,
}

impl InjectionPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            InjectionPosition::Prepend => "prepend",
            InjectionPosition::Append => "append",
            InjectionPosition::Wrap => "wrap",
        }
    }
}

impl fmt::Display for InjectionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InjectionPosition {
    type Err = SlashdashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepend" => Ok(InjectionPosition::Prepend),
            "append" => Ok(InjectionPosition::Append),
            "wrap" => Ok(InjectionPosition::Wrap),
            _ => Err(SlashdashError::InvalidVariant {
                kind: "injection position",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Injection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InjectOptions {
    #[serde(default)]
    pub style: InjectionStyle,
    #[serde(default)]
    pub position: InjectionPosition,
    #[serde(default)]
    pub enhanced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionResult {
    pub original: String,
    pub injected: String,
    pub hack_id: String,
    pub style: InjectionStyle,
    pub position: InjectionPosition,
}

impl InjectionResult {
    pub fn was_modified(&self) -> bool {
        self.original != self.injected
    }
}

/// Place `hack`'s postscript into `prompt`.
pub fn inject(prompt: &str, hack: &PromptHack, options: InjectOptions) -> InjectionResult {
    let block = format_hack(hack, options.style, options.enhanced);
    let injected = match options.position {
        InjectionPosition::Prepend => format!("{block}\n\n{prompt}"),
        InjectionPosition::Append => format!("{prompt}\n\n{block}"),
        InjectionPosition::Wrap => format!("{block}\n\n{prompt}\n\n{block}"),
    };
    tracing::debug!(hack = %hack.id, style = %options.style, position = %options.position, "injected hack");

    InjectionResult {
        original: prompt.to_string(),
        injected,
        hack_id: hack.id.clone(),
        style: options.style,
        position: options.position,
    }
}

pub fn format_hack(hack: &PromptHack, style: InjectionStyle, enhanced: bool) -> String {
    let text = hack.text(enhanced);
    match style {
        InjectionStyle::Minimal => text,
        InjectionStyle::Default => {
            let rule = "─".repeat(RULE_WIDTH);
            format!("{rule}\n{}\n{rule}\n{text}\n{rule}", hack.name)
        }
        InjectionStyle::Boxed => boxed(&hack.name, &text),
        InjectionStyle::Highlight => format!(
            ">>> {name} <<<\n{text}\n>>> end of {name} <<<",
            name = hack.name
        ),
    }
}

fn boxed(title: &str, text: &str) -> String {
    let inner = BOX_WIDTH - 4;
    let mut lines = vec![
        format!("╭{}╮", "─".repeat(BOX_WIDTH)),
        format!("│ {title:^width$} │", width = BOX_WIDTH - 2),
        format!("├{}┤", "─".repeat(BOX_WIDTH)),
    ];
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            lines.push(format!("│ {:<inner$}   │", ""));
            continue;
        }
        for chunk in chars.chunks(inner) {
            let chunk: String = chunk.iter().collect();
            lines.push(format!("│ {chunk:<inner$}   │"));
        }
    }
    lines.push(format!("╰{}╯", "─".repeat(BOX_WIDTH)));
    lines.join("\n")
}

/// Name, postscript and usage hints for display in a listing.
pub fn preview(hack: &PromptHack) -> String {
    let mut out = format!("{}\n{}\n{}\n", hack.name, "─".repeat(50), hack.postscript.trim());
    if let Some(ref fallback) = hack.fallback {
        out.push_str(&format!("Fallback: {}\n", fallback.trim()));
    }
    if !hack.use_when.is_empty() {
        out.push_str("Use when:\n");
        for hint in &hack.use_when {
            out.push_str(&format!("  - {hint}\n"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hacks::HackSet;

    fn hack(id: &str) -> PromptHack {
        HackSet::default().get(id).unwrap().clone()
    }

    #[test]
    fn positions() {
        let h = hack("clarify");
        let minimal = |position| InjectOptions {
            style: InjectionStyle::Minimal,
            position,
            enhanced: false,
        };

        let appended = inject("Write a plan", &h, minimal(InjectionPosition::Append));
        assert!(appended.injected.starts_with("Write a plan\n\nAsk me clarifying"));

        let prepended = inject("Write a plan", &h, minimal(InjectionPosition::Prepend));
        assert!(prepended.injected.ends_with("\n\nWrite a plan"));

        let wrapped = inject("Write a plan", &h, minimal(InjectionPosition::Wrap));
        assert_eq!(wrapped.injected.matches("Ask me clarifying").count(), 2);
        assert!(wrapped.was_modified());
        assert_eq!(wrapped.hack_id, "clarify");
    }

    #[test]
    fn default_style_has_header() {
        let block = format_hack(&hack("self_grade"), InjectionStyle::Default, false);
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines[1], "Self-grade");
        assert!(lines[0].starts_with('─'));
        assert!(block.ends_with('─'));
    }

    #[test]
    fn enhanced_appends_addendum() {
        let opts = InjectOptions {
            style: InjectionStyle::Highlight,
            enhanced: true,
            ..Default::default()
        };
        let result = inject("Plan", &hack("devils_advocate"), opts);
        assert!(result.injected.contains("top 10 reasons"));
        assert!(result.injected.contains(">>> Devil's Advocate <<<"));
    }

    #[test]
    fn boxed_lines_have_equal_width() {
        let block = format_hack(&hack("expert_panel"), InjectionStyle::Boxed, false);
        let widths: Vec<usize> = block.lines().map(|l| l.chars().count()).collect();
        assert!(widths.len() > 4);
        assert!(widths.iter().all(|w| *w == widths[0]), "{widths:?}");
    }

    #[test]
    fn parse_style_and_position() {
        assert_eq!("boxed".parse::<InjectionStyle>().unwrap(), InjectionStyle::Boxed);
        assert_eq!("wrap".parse::<InjectionPosition>().unwrap(), InjectionPosition::Wrap);
        assert!("fancy".parse::<InjectionStyle>().is_err());
        assert!("middle".parse::<InjectionPosition>().is_err());
    }

    #[test]
    fn preview_lists_hints_and_fallback() {
        let text = preview(&hack("web_backed"));
        assert!(text.contains("Fallback: If you cannot browse"));
        assert!(text.contains("  - You want receipts, not vibes"));
    }
}
