use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Deserialize;

/// A scalar tag value.
///
/// Deserialized from bare TOML scalars (`"a"`, `1`, `2.5`, `true`).
///
/// Floats are compared and hashed by bit pattern so that tag values can be
/// used as grouping keys. This means `NaN == NaN` and `0.0 != -0.0`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PartialEq for TagValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TagValue::Bool(a), TagValue::Bool(b)) => a == b,
            (TagValue::Int(a), TagValue::Int(b)) => a == b,
            (TagValue::Float(a), TagValue::Float(b)) => a.to_bits() == b.to_bits(),
            (TagValue::Str(a), TagValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TagValue {}

impl Hash for TagValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            TagValue::Bool(b) => b.hash(state),
            TagValue::Int(i) => i.hash(state),
            TagValue::Float(f) => f.to_bits().hash(state),
            TagValue::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(b) => write!(f, "{b}"),
            TagValue::Int(i) => write!(f, "{i}"),
            TagValue::Float(x) => write!(f, "{x}"),
            TagValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::Str(s.to_string())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::Str(s)
    }
}

impl From<i64> for TagValue {
    fn from(i: i64) -> Self {
        TagValue::Int(i)
    }
}

impl From<i32> for TagValue {
    fn from(i: i32) -> Self {
        TagValue::Int(i64::from(i))
    }
}

impl From<f64> for TagValue {
    fn from(x: f64) -> Self {
        TagValue::Float(x)
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        TagValue::Bool(b)
    }
}

/// Key/value annotations attached to a task.
pub type TagMap = BTreeMap<String, TagValue>;

/// Overwrite `base` key-by-key with every entry of `overlay`.
pub fn merge_tags(base: &mut TagMap, overlay: &TagMap) {
    for (k, v) in overlay {
        base.insert(k.clone(), v.clone());
    }
}

/// Render a tag map as `{k=v, ...}` for logs and reports.
pub fn format_tags(tags: &TagMap) -> String {
    let inner = tags
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{inner}}}")
}

/// Index of a stage within a [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(pub usize);

/// Non-owning reference to a task: its stage plus its position in that
/// stage's task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    pub stage: StageId,
    pub index: usize,
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.t{}", self.stage, self.index)
    }
}
