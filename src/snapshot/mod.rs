//! Step records and captured output
//!
//! The immutable artifacts a trace is made of:
//! - [`StepRecord`]: one line event with the locals visible at that point
//! - [`LocalValue`] / [`ValueRepr`]: a bounded, never-failing rendering of a value
//! - [`OutputCapture`]: the program's stdout/stderr, buffered per run
//! - [`Trace`]: the ordered steps plus the combined output and outcome
//!
//! Everything here is plain data with serde derives, so a trace can be handed
//! to the JSON and HTML front ends unchanged.

use crate::interpreter::constants::{REPR_ELLIPSIS, STRUCTURED_ITEMS_LIMIT};
use crate::memory::value::{ReprError, Stream, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cut `text` to at most `limit` characters, ending in `...` when cut
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(REPR_ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(REPR_ELLIPSIS);
    out
}

/// Textual representation of one value: the repr text, or the reason it
/// could not be produced.
///
/// `text` is what gets displayed in both cases, already bounded. A failure
/// displays as `<repr error: reason>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValueRepr {
    Ok { text: String },
    Failed { reason: String, text: String },
}

impl ValueRepr {
    /// Bound a repr result to `limit` characters
    pub fn capture(result: Result<String, ReprError>, limit: usize) -> Self {
        match result {
            Ok(text) => ValueRepr::Ok {
                text: truncate(&text, limit),
            },
            Err(err) => {
                let reason = err.to_string();
                let text = truncate(&format!("<repr error: {}>", reason), limit);
                ValueRepr::Failed { reason, text }
            }
        }
    }

    pub fn of(value: &Value, limit: usize) -> Self {
        Self::capture(value.repr(), limit)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ValueRepr::Ok { .. })
    }
}

impl fmt::Display for ValueRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRepr::Ok { text } | ValueRepr::Failed { text, .. } => f.write_str(text),
        }
    }
}

/// A captured local variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalValue {
    pub repr: ValueRepr,
    /// Element reprs of a list or tuple
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<ValueRepr>>,
    /// Key/value reprs of a dict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dict_items: Option<Vec<(ValueRepr, ValueRepr)>>,
}

impl LocalValue {
    /// Capture `value` with every rendered string bounded by `limit`
    pub fn capture(value: &Value, limit: usize) -> Self {
        let list_items = match value {
            Value::List(items) => Some(Self::capture_items(&items.borrow(), limit)),
            Value::Tuple(items) => Some(Self::capture_items(items, limit)),
            _ => None,
        };
        let dict_items = match value {
            Value::Dict(dict) => Some(
                dict.borrow()
                    .iter()
                    .take(STRUCTURED_ITEMS_LIMIT)
                    .map(|(k, v)| (ValueRepr::of(k, limit), ValueRepr::of(v, limit)))
                    .collect(),
            ),
            _ => None,
        };

        Self {
            repr: ValueRepr::of(value, limit),
            list_items,
            dict_items,
        }
    }

    fn capture_items(items: &[Value], limit: usize) -> Vec<ValueRepr> {
        items
            .iter()
            .take(STRUCTURED_ITEMS_LIMIT)
            .map(|item| ValueRepr::of(item, limit))
            .collect()
    }

    /// Plain-text value (without the structured breakdown)
    pub fn text(&self) -> String {
        self.repr.to_string()
    }
}

/// One recorded line event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based source line about to execute
    #[serde(rename = "lineno")]
    pub line: usize,
    /// Enclosing function name, `<module>` at top level
    #[serde(rename = "func")]
    pub function: String,
    /// Locals sorted by name
    pub locals: BTreeMap<String, LocalValue>,
}

/// How the traced run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    SyntaxError,
    StepLimit,
    RuntimeError,
}

/// The result of one tracer invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub steps: Vec<StepRecord>,
    /// Combined stdout, stderr and error message
    pub output: String,
    pub outcome: Outcome,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// In-memory stdout/stderr of one run
#[derive(Debug, Clone, Default)]
pub struct OutputCapture {
    stdout: String,
    stderr: String,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, stream: Stream, text: &str) {
        match stream {
            Stream::Stdout => self.stdout.push_str(text),
            Stream::Stderr => self.stderr.push_str(text),
        }
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// stdout, then stderr, then `error`; each non-empty section is
    /// separated from what came before by a newline, and the whole is trimmed
    pub fn combined(&self, error: &str) -> String {
        let mut out = String::new();
        for section in [self.stdout.as_str(), self.stderr.as_str(), error] {
            if section.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(section);
        }
        out.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::value::Dict;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 200), "short");
        let long = "x".repeat(250);
        let cut = truncate(&long, 200);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate(&"y".repeat(200), 200), "y".repeat(200));
    }

    #[test]
    fn test_failed_repr_placeholder() {
        let repr = ValueRepr::capture(Err(ReprError::RecursionLimit), 200);
        assert!(!repr.is_ok());
        assert_eq!(
            repr.to_string(),
            "<repr error: maximum recursion depth exceeded while getting the repr of an object>"
        );

        let short = ValueRepr::capture(Err(ReprError::RecursionLimit), 30);
        assert_eq!(short.to_string(), "<repr error: maximum recurs...");
        match short {
            ValueRepr::Failed { reason, .. } => assert_eq!(reason, ReprError::RecursionLimit.to_string()),
            ValueRepr::Ok { .. } => panic!("expected a failed repr"),
        }
    }

    #[test]
    fn test_structured_breakdowns() {
        let list = Value::new_list(vec![Value::Int(1), Value::from("two")]);
        let local = LocalValue::capture(&list, 200);
        assert_eq!(local.text(), "[1, 'two']");
        let items = local.list_items.unwrap();
        assert_eq!(items[1].to_string(), "'two'");
        assert!(local.dict_items.is_none());

        let mut dict = Dict::new();
        dict.insert(Value::from("a"), Value::Int(1));
        let local = LocalValue::capture(&Value::new_dict(dict), 200);
        let pairs = local.dict_items.unwrap();
        assert_eq!(pairs[0].0.to_string(), "'a'");
        assert_eq!(pairs[0].1.to_string(), "1");

        let scalar = LocalValue::capture(&Value::Int(3), 200);
        assert!(scalar.list_items.is_none() && scalar.dict_items.is_none());
    }

    #[test]
    fn test_combined_output_ordering() {
        let mut capture = OutputCapture::new();
        assert_eq!(capture.combined(""), "");

        capture.write(Stream::Stderr, "warn\n");
        assert_eq!(capture.combined("RuntimeError: boom"), "warn\n\nRuntimeError: boom");

        capture.write(Stream::Stdout, "out\n");
        assert_eq!(capture.combined(""), "out\n\nwarn");
    }

    #[test]
    fn test_step_record_json_shape() {
        let mut locals = BTreeMap::new();
        locals.insert("x".to_string(), LocalValue::capture(&Value::Int(1), 200));
        let step = StepRecord {
            line: 2,
            function: "<module>".to_string(),
            locals,
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["lineno"], 2);
        assert_eq!(json["func"], "<module>");
        assert_eq!(json["locals"]["x"]["repr"]["status"], "ok");
        assert_eq!(json["locals"]["x"]["repr"]["text"], "1");
        assert!(json["locals"]["x"].get("list_items").is_none());
    }
}
