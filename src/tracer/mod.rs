//! Execution tracer
//!
//! Compiles a program under the synthetic `<user_code>` filename, runs it with
//! a [`LineHook`] that records a [`StepRecord`] per line event, and folds the
//! program's output and any failure into one [`Trace`].
//!
//! The tracer never fails outward:
//! - a syntax error yields zero steps and `SyntaxError: ...` as output
//! - the step ceiling unwinds the program and yields `Step limit N reached.`
//! - an uncaught exception yields `RuntimeError: <str(exc)>`
//!
//! The run happens on a dedicated thread with a large stack, since deep user
//! recursion nests several evaluator frames per call.

use crate::interpreter::constants::{EXCLUDED_LOCALS, MAX_STEPS, REPR_LIMIT, TRACE_STACK_SIZE, USER_FILENAME};
use crate::interpreter::engine::{Interpreter, LineEvent, LineHook};
use crate::interpreter::errors::RuntimeError;
use crate::parser::compile;
use crate::snapshot::{LocalValue, OutputCapture, StepRecord};
use std::collections::BTreeMap;
use std::thread;
use tracing::{debug, info, warn};

pub use crate::snapshot::{Outcome, Trace, ValueRepr};

/// Limits applied to one trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceConfig {
    /// Maximum number of step records
    pub max_steps: usize,
    /// Maximum length of each rendered repr
    pub repr_limit: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            repr_limit: REPR_LIMIT,
        }
    }
}

/// Trace `source` with the default limits
pub fn trace(source: &str) -> Trace {
    trace_with(source, &TraceConfig::default())
}

/// Trace `source` with explicit limits
pub fn trace_with(source: &str, config: &TraceConfig) -> Trace {
    let config = *config;
    thread::scope(|scope| {
        let spawned = thread::Builder::new()
            .name("pyviz-trace".to_string())
            .stack_size(TRACE_STACK_SIZE)
            .spawn_scoped(scope, move || trace_inline(source, &config));

        match spawned {
            Ok(handle) => handle.join().unwrap_or_else(|_| {
                warn!("trace thread panicked");
                Trace {
                    steps: Vec::new(),
                    output: "RuntimeError: internal interpreter failure".to_string(),
                    outcome: Outcome::RuntimeError,
                }
            }),
            Err(err) => {
                warn!(error = %err, "could not spawn trace thread, tracing on the caller's stack");
                trace_inline(source, &config)
            }
        }
    })
}

/// Trace on the current thread
fn trace_inline(source: &str, config: &TraceConfig) -> Trace {
    let program = match compile(source, USER_FILENAME) {
        Ok(program) => program,
        Err(err) => {
            debug!(error = %err, "compilation failed");
            return Trace {
                steps: Vec::new(),
                output: format!("SyntaxError: {}", err),
                outcome: Outcome::SyntaxError,
            };
        }
    };

    let mut output = OutputCapture::new();
    let mut recorder = StepRecorder::new(*config);
    let result = {
        let mut interpreter = Interpreter::new(&mut output).with_hook(&mut recorder);
        interpreter.run(&program)
    };

    let (error, outcome) = match result {
        Ok(()) => (String::new(), Outcome::Completed),
        Err(err @ RuntimeError::StepLimit { .. }) => (err.to_string(), Outcome::StepLimit),
        Err(err) => (format!("RuntimeError: {}", err), Outcome::RuntimeError),
    };

    let steps = recorder.into_steps();
    info!(steps = steps.len(), ?outcome, "trace finished");

    Trace {
        steps,
        output: output.combined(&error),
        outcome,
    }
}

/// Line hook that turns line events into step records
#[derive(Debug)]
pub struct StepRecorder {
    config: TraceConfig,
    steps: Vec<StepRecord>,
}

impl StepRecorder {
    pub fn new(config: TraceConfig) -> Self {
        Self {
            config,
            steps: Vec::new(),
        }
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }
}

impl LineHook for StepRecorder {
    fn on_line(&mut self, event: &LineEvent<'_>) -> Result<(), RuntimeError> {
        if event.filename != USER_FILENAME {
            return Ok(());
        }

        if self.steps.len() >= self.config.max_steps {
            debug!(limit = self.config.max_steps, line = event.line, "step ceiling reached");
            return Err(RuntimeError::StepLimit {
                limit: self.config.max_steps,
            });
        }

        let locals: BTreeMap<String, LocalValue> = event
            .locals
            .iter()
            .filter(|(name, _)| !EXCLUDED_LOCALS.contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), LocalValue::capture(value, self.config.repr_limit)))
            .collect();

        self.steps.push(StepRecord {
            line: event.line,
            function: event.function.to_string(),
            locals,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::stack::Namespace;
    use crate::memory::value::Value;

    fn event<'e>(filename: &'e str, locals: &'e Namespace) -> LineEvent<'e> {
        LineEvent {
            line: 3,
            filename,
            function: "f",
            locals,
        }
    }

    #[test]
    fn test_recorder_ignores_foreign_code() {
        let locals = Namespace::default();
        let mut recorder = StepRecorder::new(TraceConfig::default());
        recorder.on_line(&event("<other>", &locals)).unwrap();
        assert!(recorder.steps().is_empty());
    }

    #[test]
    fn test_recorder_excludes_bookkeeping_names() {
        let mut locals = Namespace::default();
        locals.insert("__name__".to_string(), Value::from("__main__"));
        locals.insert("b".to_string(), Value::Int(2));
        locals.insert("a".to_string(), Value::from("x"));

        let mut recorder = StepRecorder::new(TraceConfig::default());
        recorder.on_line(&event(USER_FILENAME, &locals)).unwrap();

        let step = &recorder.steps()[0];
        assert_eq!(step.line, 3);
        assert_eq!(step.function, "f");
        let names: Vec<&str> = step.locals.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(step.locals["a"].text(), "'x'");
    }

    #[test]
    fn test_recorder_stops_at_ceiling() {
        let locals = Namespace::default();
        let mut recorder = StepRecorder::new(TraceConfig {
            max_steps: 2,
            repr_limit: REPR_LIMIT,
        });
        recorder.on_line(&event(USER_FILENAME, &locals)).unwrap();
        recorder.on_line(&event(USER_FILENAME, &locals)).unwrap();
        let err = recorder.on_line(&event(USER_FILENAME, &locals)).unwrap_err();
        assert!(matches!(err, RuntimeError::StepLimit { limit: 2 }));
        assert_eq!(recorder.steps().len(), 2);
    }

    #[test]
    fn test_trace_simple_program() {
        let trace = trace("x = 1\ny = x + 1\nprint(y)\n");
        assert_eq!(trace.outcome, Outcome::Completed);
        let lines: Vec<usize> = trace.steps.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(trace.steps[0].locals.is_empty());
        assert_eq!(trace.steps[2].locals["y"].text(), "2");
        assert_eq!(trace.output, "2");
    }

    #[test]
    fn test_trace_syntax_error() {
        let trace = trace("x = (1,\n");
        assert!(trace.steps.is_empty());
        assert_eq!(trace.outcome, Outcome::SyntaxError);
        assert!(trace.output.starts_with("SyntaxError: "));
        assert!(trace.output.contains("(<user_code>, line"));
    }
}
