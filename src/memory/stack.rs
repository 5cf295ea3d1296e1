//! Call stack implementation
//!
//! This module provides the call stack for function execution:
//! - [`Stack`]: The call stack containing frames
//! - [`StackFrame`]: A single function's activation record
//! - [`Namespace`]: name → value bindings of one scope
//! - [`LineState`]: the line a scope last reported, for merging line events
//!
//! Top-level code has no frame of its own here: its locals are the module
//! globals, owned by the interpreter. A frame exists for every active user
//! function call.

use super::value::Value;
use crate::parser::ast::FunctionDef;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Name → value bindings of one scope
pub type Namespace = FxHashMap<String, Value>;

/// Line-event bookkeeping of one executing scope.
///
/// Consecutive events on the same line collapse into one, unless a loop
/// jumped back in between.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineState {
    pub last: Option<usize>,
    pub jumped_back: bool,
}

impl LineState {
    /// Record that `line` is about to run; returns whether to report it
    pub fn enter(&mut self, line: usize) -> bool {
        let report = self.jumped_back || self.last != Some(line);
        self.jumped_back = false;
        self.last = Some(line);
        report
    }
}

/// A user function's activation record
#[derive(Debug)]
pub struct StackFrame {
    pub function: Rc<FunctionDef>,
    pub locals: Namespace,
    pub lines: LineState,
}

impl StackFrame {
    pub fn new(function: Rc<FunctionDef>) -> Self {
        Self {
            function,
            locals: Namespace::default(),
            lines: LineState::default(),
        }
    }

    /// Whether `name` is bound in this function's local scope
    pub fn is_local(&self, name: &str) -> bool {
        self.function.locals.contains(name)
    }
}

/// The call stack
#[derive(Debug, Default)]
pub struct Stack {
    frames: Vec<StackFrame>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, frame: StackFrame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        self.frames.pop()
    }

    pub fn current_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }

    pub fn current_frame_mut(&mut self) -> Option<&mut StackFrame> {
        self.frames.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from outermost to innermost
    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::compile;
    use crate::parser::ast::Stmt;

    fn function(source: &str) -> Rc<FunctionDef> {
        match compile(source, "<test>").expect("Parsing failed").body.remove(0) {
            Stmt::FunctionDef(def) => def,
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_push_and_pop() {
        let mut stack = Stack::new();
        assert!(stack.current_frame().is_none());

        let def = function("def f(a):\n    b = a\n");
        stack.push_frame(StackFrame::new(def.clone()));
        stack.push_frame(StackFrame::new(def));
        assert_eq!(stack.depth(), 2);

        let frame = stack.current_frame_mut().unwrap();
        frame.locals.insert("a".to_string(), Value::Int(1));
        assert!(frame.is_local("b"));
        assert!(!frame.is_local("print"));

        let popped = stack.pop_frame().unwrap();
        assert_eq!(popped.locals.len(), 1);
        assert!(stack.current_frame().unwrap().locals.is_empty());
    }

    #[test]
    fn test_line_state_merges_repeats() {
        let mut lines = LineState::default();
        assert!(lines.enter(1));
        assert!(!lines.enter(1));
        assert!(lines.enter(2));

        lines.jumped_back = true;
        assert!(lines.enter(2));
        assert!(!lines.enter(2));
    }
}
