//! Loop statement execution (`while`, `for`) and iteration.
//!
//! Adds `impl Interpreter` methods for the two loop forms. `break` and
//! `continue` are folded into [`LoopBodyResult`] so the loop drivers can react
//! without inspecting [`ControlFlow`] themselves.
//!
//! Line events: a `while` header raises one per condition check, a `for`
//! header one per fetch of the next item, including the final fetch that
//! finds the iterator exhausted. Jumping back to the top of a loop always
//! reports its next line, even when the loop fits on a single line.

use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::RuntimeError;
use crate::memory::value::Value;
use crate::parser::ast::{Expr, SourceLocation, Stmt, Target};
use std::cell::RefCell;
use std::rc::Rc;

/// How one pass through a loop body ended
pub(crate) enum LoopBodyResult {
    /// Ran to completion or hit `continue`: iterate again
    Continue,
    /// `break`: leave the loop, skipping its `else`
    Break,
    /// `return`: unwind with this control flow
    Exit(ControlFlow),
}

/// A running iteration over an iterable value
pub(crate) enum ValueIter {
    /// Lists are walked by index so appends during the loop are seen
    List {
        items: Rc<RefCell<Vec<Value>>>,
        index: usize,
    },
    Range {
        next: i64,
        stop: i64,
        step: i64,
    },
    /// Everything else iterates over a snapshot taken up front
    Items(std::vec::IntoIter<Value>),
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::List { items, index } => {
                let item = items.borrow().get(*index).cloned()?;
                *index += 1;
                Some(item)
            }
            ValueIter::Range { next, stop, step } => {
                let done = if *step > 0 { *next >= *stop } else { *next <= *stop };
                if done {
                    return None;
                }
                let current = *next;
                // Saturate so a range ending near i64::MAX still terminates
                *next = next.checked_add(*step).unwrap_or(*stop);
                Some(Value::Int(current))
            }
            ValueIter::Items(items) => items.next(),
        }
    }
}

impl Interpreter<'_> {
    /// Start iterating `value`
    pub(crate) fn iterate(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<ValueIter, RuntimeError> {
        let snapshot = match value {
            Value::List(items) => {
                return Ok(ValueIter::List {
                    items: items.clone(),
                    index: 0,
                })
            }
            Value::Range { start, stop, step } => {
                return Ok(ValueIter::Range {
                    next: *start,
                    stop: *stop,
                    step: *step,
                })
            }
            Value::Tuple(items) => items.to_vec(),
            Value::Str(text) => text.chars().map(|c| Value::from(c.to_string())).collect(),
            Value::Dict(dict) => dict.borrow().keys(),
            other => {
                return Err(RuntimeError::type_error(
                    format!("'{}' object is not iterable", other.type_name()),
                    location,
                ))
            }
        };
        Ok(ValueIter::Items(snapshot.into_iter()))
    }

    /// Drain an iterable into a vector
    pub(crate) fn collect_iterable(
        &self,
        value: &Value,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        Ok(self.iterate(value, location)?.collect())
    }

    /// Execute one pass through a loop body
    pub(crate) fn execute_loop_body(
        &mut self,
        body: &[Stmt],
    ) -> Result<LoopBodyResult, RuntimeError> {
        match self.execute_block(body)? {
            ControlFlow::Normal | ControlFlow::Continue => Ok(LoopBodyResult::Continue),
            ControlFlow::Break => Ok(LoopBodyResult::Break),
            flow @ ControlFlow::Return(_) => Ok(LoopBodyResult::Exit(flow)),
        }
    }

    /// Execute `while condition: body [else: orelse]`
    pub(crate) fn execute_while(
        &mut self,
        condition: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        location: SourceLocation,
    ) -> Result<ControlFlow, RuntimeError> {
        // The condition is re-tested after each pass and only a true result
        // jumps back into the body
        self.line_event(location)?;
        if self.evaluate_expression(condition)?.is_truthy() {
            loop {
                match self.execute_loop_body(body)? {
                    LoopBodyResult::Continue => {}
                    LoopBodyResult::Break => return Ok(ControlFlow::Normal),
                    LoopBodyResult::Exit(flow) => return Ok(flow),
                }
                self.line_event(location)?;
                if !self.evaluate_expression(condition)?.is_truthy() {
                    break;
                }
                self.jump_back();
            }
        }
        self.execute_block(orelse)
    }

    /// Execute `for target in iter: body [else: orelse]`
    pub(crate) fn execute_for(
        &mut self,
        target: &Target,
        iter: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        location: SourceLocation,
    ) -> Result<ControlFlow, RuntimeError> {
        // One event per fetch; the first also covers evaluating `iter`
        self.line_event(location)?;
        let iterable = self.evaluate_expression(iter)?;
        let items = self.iterate(&iterable, location)?;

        for item in items {
            self.assign_target(target, item)?;
            match self.execute_loop_body(body)? {
                LoopBodyResult::Continue => {}
                LoopBodyResult::Break => return Ok(ControlFlow::Normal),
                LoopBodyResult::Exit(flow) => return Ok(flow),
            }
            self.jump_back();
            self.line_event(location)?;
        }
        self.execute_block(orelse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_iteration() {
        let forward = ValueIter::Range { next: 0, stop: 5, step: 2 };
        let values: Vec<i64> = forward.filter_map(|v| v.as_int()).collect();
        assert_eq!(values, vec![0, 2, 4]);

        let backward = ValueIter::Range { next: 3, stop: 0, step: -1 };
        assert_eq!(backward.count(), 3);

        let empty = ValueIter::Range { next: 5, stop: 0, step: 1 };
        assert_eq!(empty.count(), 0);
    }

    #[test]
    fn test_list_iteration_sees_appends() {
        let items = Rc::new(RefCell::new(vec![Value::Int(1)]));
        let mut iter = ValueIter::List {
            items: items.clone(),
            index: 0,
        };
        assert!(iter.next().is_some());
        items.borrow_mut().push(Value::Int(2));
        assert_eq!(iter.next().and_then(|v| v.as_int()), Some(2));
        assert!(iter.next().is_none());
    }
}
