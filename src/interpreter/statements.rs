//! Statement execution
//!
//! Adds `impl Interpreter` methods that execute statements and blocks.
//! Every simple statement raises a line event before it runs; compound
//! statements raise events for their headers (`if`/`elif` conditions, `def`,
//! `try`, each evaluated `except` clause). Loops live in `loops`.
//!
//! Control flow leaves a block as a [`ControlFlow`] value; exceptions and the
//! step-limit interrupt leave it as a [`RuntimeError`].

use crate::interpreter::builtins::module_attribute;
use crate::interpreter::engine::{ControlFlow, Interpreter};
use crate::interpreter::errors::{ExceptionKind, RuntimeError};
use crate::memory::value::{ExceptionValue, Function, Module, Value};
use crate::parser::ast::*;
use std::rc::Rc;

impl Interpreter<'_> {
    /// Execute statements in order until one transfers control
    pub(crate) fn execute_block(&mut self, body: &[Stmt]) -> Result<ControlFlow, RuntimeError> {
        for stmt in body {
            let flow = self.execute_statement(stmt)?;
            if !matches!(flow, ControlFlow::Normal) {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Execute a single statement
    pub(crate) fn execute_statement(&mut self, stmt: &Stmt) -> Result<ControlFlow, RuntimeError> {
        match stmt {
            Stmt::If {
                condition,
                body,
                orelse,
                location,
            } => {
                self.line_event(*location)?;
                if self.evaluate_expression(condition)?.is_truthy() {
                    self.execute_block(body)
                } else {
                    self.execute_block(orelse)
                }
            }

            Stmt::While {
                condition,
                body,
                orelse,
                location,
            } => self.execute_while(condition, body, orelse, *location),

            Stmt::For {
                target,
                iter,
                body,
                orelse,
                location,
            } => self.execute_for(target, iter, body, orelse, *location),

            Stmt::Try {
                body,
                handlers,
                orelse,
                finally,
                location,
            } => {
                self.line_event(*location)?;
                self.execute_try(body, handlers, orelse, finally)
            }

            Stmt::FunctionDef(def) => {
                self.line_event(def.location)?;
                let defaults = def
                    .params
                    .iter()
                    .filter_map(|param| param.default.as_ref())
                    .map(|default| self.evaluate_expression(default))
                    .collect::<Result<Vec<_>, _>>()?;
                let function = Value::Function(Rc::new(Function {
                    def: def.clone(),
                    defaults,
                }));
                self.store_name(&def.name, function);
                Ok(ControlFlow::Normal)
            }

            simple => {
                self.line_event(simple.location())?;
                self.execute_simple_statement(simple)
            }
        }
    }

    fn execute_simple_statement(&mut self, stmt: &Stmt) -> Result<ControlFlow, RuntimeError> {
        match stmt {
            Stmt::Expr { expr, .. } => {
                self.evaluate_expression(expr)?;
            }

            Stmt::Assign { targets, value, .. } => {
                let value = self.evaluate_expression(value)?;
                for target in targets {
                    self.assign_target(target, value.clone())?;
                }
            }

            Stmt::AugAssign {
                target,
                op,
                value,
                location,
            } => self.execute_aug_assign(target, *op, value, *location)?,

            Stmt::Pass { .. } | Stmt::Global { .. } => {}

            Stmt::Break { .. } => return Ok(ControlFlow::Break),

            Stmt::Continue { .. } => return Ok(ControlFlow::Continue),

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::None,
                };
                return Ok(ControlFlow::Return(value));
            }

            Stmt::Del { targets, .. } => {
                for target in targets {
                    self.delete_target(target)?;
                }
            }

            Stmt::Assert {
                test,
                message,
                location,
            } => {
                if !self.evaluate_expression(test)?.is_truthy() {
                    let args = match message {
                        Some(expr) => vec![self.evaluate_expression(expr)?],
                        None => Vec::new(),
                    };
                    return Err(RuntimeError::Exception {
                        exception: Rc::new(ExceptionValue::new(ExceptionKind::AssertionError, args)),
                        location: *location,
                    });
                }
            }

            Stmt::Raise {
                exception,
                location,
            } => return Err(self.execute_raise(exception.as_ref(), *location)?),

            Stmt::Import { modules, location } => {
                for import in modules {
                    let module = Module::from_name(&import.name).ok_or_else(|| {
                        RuntimeError::raise(
                            ExceptionKind::ModuleNotFoundError,
                            format!("No module named '{}'", import.name),
                            *location,
                        )
                    })?;
                    self.store_name(import.binding(), Value::Module(module));
                }
            }

            Stmt::ImportFrom {
                module,
                names,
                location,
            } => {
                let source = Module::from_name(module).ok_or_else(|| {
                    RuntimeError::raise(
                        ExceptionKind::ModuleNotFoundError,
                        format!("No module named '{}'", module),
                        *location,
                    )
                })?;
                for import in names {
                    let value = module_attribute(source, &import.name).ok_or_else(|| {
                        RuntimeError::raise(
                            ExceptionKind::ImportError,
                            format!(
                                "cannot import name '{}' from '{}' (unknown location)",
                                import.name, module
                            ),
                            *location,
                        )
                    })?;
                    self.store_name(import.binding(), value);
                }
            }

            // Compound statements are dispatched by execute_statement
            Stmt::If { .. }
            | Stmt::While { .. }
            | Stmt::For { .. }
            | Stmt::Try { .. }
            | Stmt::FunctionDef(_) => return self.execute_statement(stmt),
        }

        Ok(ControlFlow::Normal)
    }

    /// `target op= value`: the target's container and index are evaluated once
    fn execute_aug_assign(
        &mut self,
        target: &Target,
        op: BinOp,
        value: &Expr,
        location: SourceLocation,
    ) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name, name_location) => {
                let current = self.lookup_name(name, *name_location)?;
                let rhs = self.evaluate_expression(value)?;
                let result = self.inplace_operation(op, current, rhs, location)?;
                self.store_name(name, result);
            }
            Target::Subscript {
                object,
                index,
                location: subscript_location,
            } => {
                let container = self.evaluate_expression(object)?;
                let index = self.evaluate_index(index)?;
                let current = self.get_item(&container, &index, *subscript_location)?;
                let rhs = self.evaluate_expression(value)?;
                let result = self.inplace_operation(op, current, rhs, location)?;
                self.set_item(&container, index, result, *subscript_location)?;
            }
            Target::Tuple(_, tuple_location) => {
                return Err(RuntimeError::type_error(
                    "illegal expression for augmented assignment",
                    *tuple_location,
                ));
            }
        }
        Ok(())
    }

    /// `+=` on a list extends it in place; everything else rebinds
    fn inplace_operation(
        &mut self,
        op: BinOp,
        current: Value,
        rhs: Value,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if let (BinOp::Add, Value::List(items)) = (op, &current) {
            let extra = self.collect_iterable(&rhs, location)?;
            items.borrow_mut().extend(extra);
            return Ok(current);
        }
        self.binary_operation(op, &current, &rhs, location)
    }

    /// Bind `value` to an assignment target
    pub(crate) fn assign_target(&mut self, target: &Target, value: Value) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name, _) => {
                self.store_name(name, value);
                Ok(())
            }
            Target::Subscript {
                object,
                index,
                location,
            } => {
                let container = self.evaluate_expression(object)?;
                let index = self.evaluate_index(index)?;
                self.set_item(&container, index, value, *location)
            }
            Target::Tuple(targets, location) => {
                let values = self.unpack(&value, targets.len(), *location)?;
                for (target, value) in targets.iter().zip(values) {
                    self.assign_target(target, value)?;
                }
                Ok(())
            }
        }
    }

    /// Iterate `value` into exactly `expected` items
    pub(crate) fn unpack(
        &mut self,
        value: &Value,
        expected: usize,
        location: SourceLocation,
    ) -> Result<Vec<Value>, RuntimeError> {
        let items = self.collect_iterable(value, location).map_err(|err| {
            match err.exception() {
                Some(exception) if exception.kind == ExceptionKind::TypeError => {
                    RuntimeError::type_error(
                        format!("cannot unpack non-iterable {} object", value.type_name()),
                        location,
                    )
                }
                _ => err,
            }
        })?;

        if items.len() > expected {
            return Err(RuntimeError::value_error(
                format!("too many values to unpack (expected {})", expected),
                location,
            ));
        }
        if items.len() < expected {
            return Err(RuntimeError::value_error(
                format!(
                    "not enough values to unpack (expected {}, got {})",
                    expected,
                    items.len()
                ),
                location,
            ));
        }
        Ok(items)
    }

    fn delete_target(&mut self, target: &Target) -> Result<(), RuntimeError> {
        match target {
            Target::Name(name, location) => self.delete_name(name, *location),
            Target::Subscript {
                object,
                index,
                location,
            } => {
                let container = self.evaluate_expression(object)?;
                let index = self.evaluate_index(index)?;
                self.delete_item(&container, &index, *location)
            }
            Target::Tuple(targets, _) => {
                for target in targets {
                    self.delete_target(target)?;
                }
                Ok(())
            }
        }
    }

    /// Build the error a `raise` statement unwinds with
    fn execute_raise(
        &mut self,
        exception: Option<&Expr>,
        location: SourceLocation,
    ) -> Result<RuntimeError, RuntimeError> {
        let Some(expr) = exception else {
            return Ok(match self.handling.last() {
                Some(active) => RuntimeError::Exception {
                    exception: active.clone(),
                    location,
                },
                None => RuntimeError::raise(
                    ExceptionKind::RuntimeError,
                    "No active exception to reraise",
                    location,
                ),
            });
        };

        let exception = match self.evaluate_expression(expr)? {
            Value::Exception(exception) => exception,
            Value::ExceptionType(kind) => Rc::new(ExceptionValue::new(kind, Vec::new())),
            _ => {
                return Ok(RuntimeError::type_error(
                    "exceptions must derive from BaseException",
                    location,
                ))
            }
        };
        Ok(RuntimeError::Exception {
            exception,
            location,
        })
    }

    /// Execute `try`/`except`/`else`/`finally`.
    ///
    /// The step-limit interrupt passes straight through: no handler sees it
    /// and the `finally` block does not run.
    fn execute_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finally: &[Stmt],
    ) -> Result<ControlFlow, RuntimeError> {
        let result = match self.execute_block(body) {
            Ok(ControlFlow::Normal) => self.execute_block(orelse),
            Ok(flow) => Ok(flow),
            Err(RuntimeError::Exception {
                exception,
                location,
            }) => self.handle_exception(handlers, exception, location),
            Err(interrupt) => return Err(interrupt),
        };

        if matches!(result, Err(RuntimeError::StepLimit { .. })) || finally.is_empty() {
            return result;
        }

        // A `finally` that transfers control or raises replaces the pending outcome
        match self.execute_block(finally)? {
            ControlFlow::Normal => result,
            flow => Ok(flow),
        }
    }

    /// Find the first matching `except` clause and run it, or re-raise
    fn handle_exception(
        &mut self,
        handlers: &[ExceptHandler],
        exception: Rc<ExceptionValue>,
        location: SourceLocation,
    ) -> Result<ControlFlow, RuntimeError> {
        for handler in handlers {
            self.line_event(handler.location)?;

            if let Some(class) = &handler.class {
                let class = self.evaluate_expression(class)?;
                if !self.exception_matches(&exception, &class, handler.location)? {
                    continue;
                }
            }

            if let Some(name) = &handler.name {
                self.store_name(name, Value::Exception(exception.clone()));
            }

            self.handling.push(exception.clone());
            let result = self.execute_block(&handler.body);
            self.handling.pop();

            // The `as` name is unbound when the handler ends
            if let Some(name) = &handler.name {
                let _ = self.delete_name(name, handler.location);
            }
            return result;
        }

        Err(RuntimeError::Exception {
            exception,
            location,
        })
    }

    /// Whether `exception` is an instance of `class` (a class or tuple of classes)
    fn exception_matches(
        &self,
        exception: &ExceptionValue,
        class: &Value,
        location: SourceLocation,
    ) -> Result<bool, RuntimeError> {
        match class {
            Value::ExceptionType(kind) => Ok(exception.kind.is_subclass_of(*kind)),
            Value::Tuple(classes) => {
                for class in classes.iter() {
                    if self.exception_matches(exception, class, location)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            _ => Err(RuntimeError::type_error(
                "catching classes that do not inherit from BaseException is not allowed",
                location,
            )),
        }
    }
}
