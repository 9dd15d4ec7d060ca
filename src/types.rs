use crate::error::{ErrorKind, ParseError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Id of the node every script starts from.
pub const START_NODE: &str = "start";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub autoclear: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.version.is_none()
            && self.autoclear.is_none()
    }

    /// Header keys in the order they are emitted.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("title", &self.title),
            ("author", &self.author),
            ("version", &self.version),
            ("autoclear", &self.autoclear),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
    }

    pub(crate) fn set(&mut self, key: &str, value: String) {
        let slot = match key {
            "title" => &mut self.title,
            "author" => &mut self.author,
            "version" => &mut self.version,
            "autoclear" => &mut self.autoclear,
            _ => return,
        };
        *slot = Some(value);
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,
}

/// One instruction inside a node. Conditions are opaque to this crate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Line {
    Dialogue {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        speaker: Option<String>,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        condition: Option<String>,
    },
    Command {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        condition: Option<String>,
    },
    Choice {
        content: String,
        #[serde(default)]
        options: Vec<ChoiceOption>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        condition: Option<String>,
    },
    Input {
        variable: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        condition: Option<String>,
    },
}

impl Line {
    pub fn content(&self) -> &str {
        match self {
            Line::Dialogue { content, .. }
            | Line::Command { content, .. }
            | Line::Choice { content, .. }
            | Line::Input { content, .. } => content,
        }
    }

    pub fn condition(&self) -> Option<&str> {
        match self {
            Line::Dialogue { condition, .. }
            | Line::Command { condition, .. }
            | Line::Choice { condition, .. }
            | Line::Input { condition, .. } => condition.as_deref(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jump: Option<String>,
}

impl Node {
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lines: Vec::new(),
            jump: None,
        }
    }
}

/// A parsed dialogue graph. Nodes keep their declaration order.
///
/// A `Script` can only be obtained from [`crate::parse`] or
/// [`crate::deserialize_script`], both of which guarantee a `start` node and
/// no dangling jump or option targets. It is never mutated afterwards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(try_from = "RawScript")]
pub struct Script {
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,
    nodes: Vec<Node>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

#[derive(Deserialize)]
pub(crate) struct RawScript {
    #[serde(default)]
    metadata: Metadata,
    nodes: Vec<Node>,
}

impl TryFrom<RawScript> for Script {
    type Error = ParseError;

    fn try_from(raw: RawScript) -> Result<Self, Self::Error> {
        Script::assemble(raw.metadata, raw.nodes)
    }
}

impl Script {
    /// Builds the id index and checks the closed-graph invariants.
    pub(crate) fn assemble(metadata: Metadata, nodes: Vec<Node>) -> Result<Self, ParseError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(ParseError::Script(ErrorKind::DuplicateNode(
                    node.id.clone(),
                )));
            }
        }

        let script = Script {
            metadata,
            nodes,
            index,
        };

        if !script.contains(START_NODE) {
            return Err(ParseError::Script(ErrorKind::MissingStart));
        }

        let report = crate::validate::validate(&script);
        if !report.valid {
            return Err(ParseError::Script(ErrorKind::DanglingReferences(
                report.errors,
            )));
        }

        Ok(script)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Result of [`crate::validate`] and [`crate::validate_variable_types`].
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub(crate) fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStats {
    pub node_count: usize,
    pub dialogue_count: usize,
    pub choice_count: usize,
    pub command_count: usize,
    pub input_count: usize,
    pub variable_count: usize,
    pub branch_count: usize,
}

/// Expected runtime type of a variable.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl VarType {
    pub fn of(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::String(_) => VarType::String,
            Value::Number(_) => VarType::Number,
            Value::Bool(_) => VarType::Boolean,
            Value::Array(_) => VarType::Array,
            Value::Object(_) => VarType::Object,
            Value::Null => VarType::Null,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VarType::String => "string",
            VarType::Number => "number",
            VarType::Boolean => "boolean",
            VarType::Array => "array",
            VarType::Object => "object",
            VarType::Null => "null",
        }
    }
}

impl std::fmt::Display for VarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
