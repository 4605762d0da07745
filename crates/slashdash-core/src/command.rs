use crate::error::SlashdashError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// InputRef
// ---------------------------------------------------------------------------

/// The `@kind:id` input object attached to a command. Opaque to the core:
/// it is only ever displayed or carried into suggestions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRef {
    pub kind: String,
    pub id: String,
}

impl InputRef {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}:{}", self.kind, self.id)
    }
}

impl std::str::FromStr for InputRef {
    type Err = SlashdashError;

    /// Accepts `kind:id` with or without the leading `@`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('@').unwrap_or(trimmed);
        match body.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(InputRef::new(kind, id)),
            _ => Err(SlashdashError::InvalidInputRef(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ParamValue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Flag(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Flag(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// ParsedCommand
// ---------------------------------------------------------------------------

/// A command that has already been tokenized upstream into name, input and
/// parameters. `verb` and `noun` are the parts of `command_name` before and
/// after its first hyphen. The name is stored trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub command_name: String,
    pub verb: String,
    pub noun: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputRef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParamValue>,
}

impl ParsedCommand {
    pub fn new(command_name: impl Into<String>) -> Self {
        let command_name = command_name.into().trim().to_lowercase();
        let (verb, noun) = match command_name.split_once('-') {
            Some((v, n)) => (v.to_string(), n.to_string()),
            None => (command_name.clone(), String::new()),
        };
        Self {
            command_name,
            verb,
            noun,
            input: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, input: InputRef) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Same input and parameters, different command.
    pub fn retarget(&self, command_name: &str) -> ParsedCommand {
        ParsedCommand {
            input: self.input.clone(),
            parameters: self.parameters.clone(),
            ..ParsedCommand::new(command_name)
        }
    }

    /// Same command and parameters, different input.
    pub fn with_replaced_input(&self, input: InputRef) -> ParsedCommand {
        let mut cmd = self.clone();
        cmd.input = Some(input);
        cmd
    }

    /// The canonical `/name @kind:id --key value` rendering.
    pub fn raw(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParsedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.command_name)?;
        if let Some(ref input) = self.input {
            write!(f, " {input}")?;
        }
        for (key, value) in &self.parameters {
            let flag = key.replace('_', "-");
            match value {
                ParamValue::Flag(true) => write!(f, " --{flag}")?,
                other => write!(f, " --{flag} {other}")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
