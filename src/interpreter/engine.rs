// Execution engine for the Python-subset interpreter

use crate::interpreter::builtins;
use crate::interpreter::constants::{MAX_CALL_DEPTH, MODULE_FUNCTION_NAME};
use crate::interpreter::errors::{ExceptionKind, RuntimeError};
use crate::memory::stack::{LineState, Namespace, Stack, StackFrame};
use crate::memory::value::{ExceptionValue, Function, Module, Value};
use crate::parser::ast::*;
use crate::snapshot::OutputCapture;
use std::rc::Rc;
use tracing::debug;

/// A line event: a statement or loop/branch header of user code is about to run
#[derive(Debug)]
pub struct LineEvent<'e> {
    pub line: usize,
    /// Filename of the code object the event belongs to
    pub filename: &'e str,
    /// Enclosing function name, `<module>` at top level
    pub function: &'e str,
    /// Bindings of the executing scope (the module globals at top level)
    pub locals: &'e Namespace,
}

/// Receives line events while a program runs.
///
/// Returning an error unwinds the program with that error; the tracer uses
/// this to stop at its step ceiling.
pub trait LineHook {
    fn on_line(&mut self, event: &LineEvent<'_>) -> Result<(), RuntimeError>;
}

/// How a statement (or block) finished
#[derive(Debug, Clone)]
pub(crate) enum ControlFlow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// The interpreter that executes one program.
///
/// The output capture and the optional line hook are borrowed for the
/// interpreter's lifetime only; dropping the interpreter releases both, on
/// every exit path.
pub struct Interpreter<'a> {
    /// Module namespace (the locals of top-level code)
    pub(crate) globals: Namespace,

    /// Frames of active user function calls
    pub(crate) stack: Stack,

    /// Line-event state of top-level code
    module_lines: LineState,

    /// Scopes of list comprehensions being evaluated, innermost last
    pub(crate) comprehension_scopes: Vec<Namespace>,

    /// Exceptions currently being handled, innermost last (for bare `raise`)
    pub(crate) handling: Vec<Rc<ExceptionValue>>,

    /// Filename the running module was compiled under
    pub(crate) filename: Rc<str>,

    /// Destination of `print` and `sys.stdout`/`sys.stderr` writes
    pub(crate) output: &'a mut OutputCapture,

    hook: Option<&'a mut dyn LineHook>,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter writing program output into `output`
    pub fn new(output: &'a mut OutputCapture) -> Self {
        let mut globals = Namespace::default();
        globals.insert("__name__".to_string(), Value::from("__main__"));
        globals.insert("__builtins__".to_string(), Value::Module(Module::Builtins));

        Interpreter {
            globals,
            stack: Stack::new(),
            module_lines: LineState::default(),
            comprehension_scopes: Vec::new(),
            handling: Vec::new(),
            filename: Rc::from(""),
            output,
            hook: None,
        }
    }

    /// Install a line hook for this interpreter's runs
    pub fn with_hook(mut self, hook: &'a mut dyn LineHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Run the program's top-level code to completion
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        self.filename = program.filename.clone();
        debug!(filename = %program.filename, statements = program.body.len(), "running program");

        match self.execute_block(&program.body)? {
            ControlFlow::Normal => Ok(()),
            // The parser rejects `return`/`break`/`continue` at module level
            other => {
                debug!(?other, "ignoring control flow escaping module body");
                Ok(())
            }
        }
    }

    /// Module namespace after (or during) a run
    pub fn globals(&self) -> &Namespace {
        &self.globals
    }

    /// Notify the hook that the statement at `location` is about to run.
    ///
    /// Repeats of the scope's last reported line are dropped unless a loop
    /// jumped back since.
    pub(crate) fn line_event(&mut self, location: SourceLocation) -> Result<(), RuntimeError> {
        let line = location.line;
        let (function, filename, locals, lines) = match self.stack.current_frame_mut() {
            Some(frame) => (
                frame.function.name.as_str(),
                &*frame.function.filename,
                &frame.locals,
                &mut frame.lines,
            ),
            None => (
                MODULE_FUNCTION_NAME,
                &*self.filename,
                &self.globals,
                &mut self.module_lines,
            ),
        };
        if !lines.enter(line) {
            return Ok(());
        }

        let Some(hook) = self.hook.as_deref_mut() else {
            return Ok(());
        };
        hook.on_line(&LineEvent {
            line,
            filename,
            function,
            locals,
        })
    }

    /// Mark a loop back-edge: the next line event of this scope is always reported
    pub(crate) fn jump_back(&mut self) {
        match self.stack.current_frame_mut() {
            Some(frame) => frame.lines.jumped_back = true,
            None => self.module_lines.jumped_back = true,
        }
    }

    // ===== Name resolution =====

    /// Resolve a name: comprehension scopes, then function locals, then
    /// globals, then builtins
    pub(crate) fn lookup_name(
        &self,
        name: &str,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        for scope in self.comprehension_scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return Ok(value.clone());
            }
        }

        if let Some(frame) = self.stack.current_frame() {
            if frame.is_local(name) {
                return frame.locals.get(name).cloned().ok_or_else(|| {
                    RuntimeError::raise(
                        ExceptionKind::UnboundLocalError,
                        format!(
                            "cannot access local variable '{}' where it is not associated with a value",
                            name
                        ),
                        location,
                    )
                });
            }
        }

        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }

        builtins::lookup(name).ok_or_else(|| {
            RuntimeError::raise(
                ExceptionKind::NameError,
                format!("name '{}' is not defined", name),
                location,
            )
        })
    }

    /// Bind a name in the current scope (honoring `global` declarations)
    pub(crate) fn store_name(&mut self, name: &str, value: Value) {
        match self.stack.current_frame_mut() {
            Some(frame) if frame.is_local(name) => {
                frame.locals.insert(name.to_string(), value);
            }
            _ => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    /// Unbind a name for `del`
    pub(crate) fn delete_name(
        &mut self,
        name: &str,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        let removed = match self.stack.current_frame_mut() {
            Some(frame) if frame.is_local(name) => {
                if frame.locals.remove(name).is_none() {
                    return Err(RuntimeError::raise(
                        ExceptionKind::UnboundLocalError,
                        format!(
                            "cannot access local variable '{}' where it is not associated with a value",
                            name
                        ),
                        location,
                    ));
                }
                true
            }
            _ => self.globals.remove(name).is_some(),
        };

        if removed {
            Ok(())
        } else {
            Err(RuntimeError::raise(
                ExceptionKind::NameError,
                format!("name '{}' is not defined", name),
                location,
            ))
        }
    }

    // ===== Calls =====

    /// Call any callable value
    pub(crate) fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(function) => self.call_function(function, args, kwargs, location),
            Value::Builtin(builtin) => self.call_builtin(*builtin, args, kwargs, location),
            Value::Method(method) => {
                self.call_method(&method.receiver, &method.name, args, kwargs, location)
            }
            Value::ExceptionType(kind) => {
                if !kwargs.is_empty() {
                    return Err(RuntimeError::type_error(
                        format!("{}() takes no keyword arguments", kind.name()),
                        location,
                    ));
                }
                Ok(Value::Exception(Rc::new(ExceptionValue::new(*kind, args))))
            }
            other => Err(RuntimeError::type_error(
                format!("'{}' object is not callable", other.type_name()),
                location,
            )),
        }
    }

    /// Call a user-defined function in a new frame
    pub(crate) fn call_function(
        &mut self,
        function: &Rc<Function>,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if self.stack.depth() >= MAX_CALL_DEPTH {
            return Err(RuntimeError::raise(
                ExceptionKind::RecursionError,
                "maximum recursion depth exceeded",
                location,
            ));
        }

        let def = &function.def;
        let mut frame = StackFrame::new(def.clone());
        for (param, value) in def.params.iter().zip(bind_arguments(function, args, kwargs, location)?) {
            frame.locals.insert(param.name.clone(), value);
        }

        self.stack.push_frame(frame);
        let result = self.execute_block(&def.body);
        self.stack.pop_frame();

        match result? {
            ControlFlow::Return(value) => Ok(value),
            _ => Ok(Value::None),
        }
    }
}

/// Match call arguments to parameters, filling in defaults
fn bind_arguments(
    function: &Function,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
    location: SourceLocation,
) -> Result<Vec<Value>, RuntimeError> {
    let def = &function.def;
    let params = &def.params;

    if args.len() > params.len() {
        let expected = match params.len() {
            1 => "1 positional argument".to_string(),
            n => format!("{} positional arguments", n),
        };
        return Err(RuntimeError::type_error(
            format!(
                "{}() takes {} but {} {} given",
                def.name,
                expected,
                args.len(),
                if args.len() == 1 { "was" } else { "were" }
            ),
            location,
        ));
    }

    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    slots.resize(params.len(), None);

    for (name, value) in kwargs {
        let Some(index) = params.iter().position(|p| p.name == name) else {
            return Err(RuntimeError::type_error(
                format!("{}() got an unexpected keyword argument '{}'", def.name, name),
                location,
            ));
        };
        if slots[index].is_some() {
            return Err(RuntimeError::type_error(
                format!("{}() got multiple values for argument '{}'", def.name, name),
                location,
            ));
        }
        slots[index] = Some(value);
    }

    // Defaults belong to the trailing parameters
    let first_default = params.len() - function.defaults.len();
    let mut missing = Vec::new();
    let mut values = Vec::with_capacity(params.len());
    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Some(value) => values.push(value),
            None if index >= first_default => {
                values.push(function.defaults[index - first_default].clone())
            }
            None => missing.push(format!("'{}'", params[index].name)),
        }
    }

    if !missing.is_empty() {
        let names = match missing.as_slice() {
            [one] => one.clone(),
            [init @ .., last] => format!("{} and {}", init.join(", "), last),
            [] => String::new(),
        };
        return Err(RuntimeError::type_error(
            format!(
                "{}() missing {} required positional argument{}: {}",
                def.name,
                missing.len(),
                if missing.len() == 1 { "" } else { "s" },
                names
            ),
            location,
        ));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile;

    /// Records (line, function) pairs
    struct LineLog(Vec<(usize, String)>);

    impl LineHook for LineLog {
        fn on_line(&mut self, event: &LineEvent<'_>) -> Result<(), RuntimeError> {
            self.0.push((event.line, event.function.to_string()));
            Ok(())
        }
    }

    fn run(source: &str) -> (Result<(), RuntimeError>, Vec<(usize, String)>, OutputCapture) {
        let program = compile(source, "<test>").expect("Parsing failed");
        let mut output = OutputCapture::new();
        let mut log = LineLog(Vec::new());
        let result = Interpreter::new(&mut output).with_hook(&mut log).run(&program);
        (result, log.0, output)
    }

    #[test]
    fn test_line_events_enter_functions() {
        let (result, lines, _) = run("def f(x):\n    return x + 1\ny = f(1)\n");
        assert!(result.is_ok());
        assert_eq!(
            lines,
            vec![
                (1, "<module>".to_string()),
                (3, "<module>".to_string()),
                (2, "f".to_string()),
            ]
        );
    }

    #[test]
    fn test_repeated_lines_merge_per_frame() {
        let (result, lines, _) = run("def f():\n    return 1\nx = f(); y = f()\n");
        assert!(result.is_ok());
        let lines: Vec<usize> = lines.into_iter().map(|(line, _)| line).collect();
        // each call is a fresh frame; the caller stays on line 3 throughout
        assert_eq!(lines, vec![1, 3, 2, 2]);
    }

    #[test]
    fn test_print_goes_to_capture() {
        let (result, _, output) = run("print('hi', 2)\n");
        assert!(result.is_ok());
        assert_eq!(output.stdout(), "hi 2\n");
    }

    #[test]
    fn test_unbound_local() {
        let (result, _, _) = run("x = 1\ndef f():\n    y = x\n    x = 2\nf()\n");
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot access local variable 'x' where it is not associated with a value"
        );
        assert_eq!(err.exception().unwrap().kind, ExceptionKind::UnboundLocalError);
    }

    #[test]
    fn test_argument_errors() {
        let (result, _, _) = run("def f(a, b):\n    pass\nf(1)\n");
        assert_eq!(
            result.unwrap_err().to_string(),
            "f() missing 1 required positional argument: 'b'"
        );
        let (result, _, _) = run("def f(a):\n    pass\nf(1, 2)\n");
        assert_eq!(
            result.unwrap_err().to_string(),
            "f() takes 1 positional argument but 2 were given"
        );
        let (result, _, _) = run("def f(a):\n    pass\nf(b=2)\n");
        assert_eq!(
            result.unwrap_err().to_string(),
            "f() got an unexpected keyword argument 'b'"
        );
    }

    #[test]
    fn test_defaults_and_keywords() {
        let (result, _, output) =
            run("def f(a, b=10, c=20):\n    return a + b + c\nprint(f(1, c=2))\n");
        assert!(result.is_ok());
        assert_eq!(output.stdout(), "13\n");
    }

    #[test]
    fn test_global_declaration() {
        let (result, _, output) =
            run("count = 0\ndef bump():\n    global count\n    count += 1\nbump()\nbump()\nprint(count)\n");
        assert!(result.is_ok());
        assert_eq!(output.stdout(), "2\n");
    }

    #[test]
    fn test_runs_without_hook() {
        let program = compile("x = 1\nprint(x)\n", "<test>").expect("Parsing failed");
        let mut output = OutputCapture::new();
        let mut interpreter = Interpreter::new(&mut output);
        assert!(interpreter.run(&program).is_ok());
        assert!(interpreter.globals().contains_key("x"));
        drop(interpreter);
        assert_eq!(output.stdout(), "1\n");
    }
}
