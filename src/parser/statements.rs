//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Simple statements: expressions, assignments, `pass`, `return`, `del`, ...
//! - Control flow: `if`/`elif`/`else`, `while`, `for` (with optional `else`)
//! - Definitions: `def`
//! - Exception handling: `try`/`except`/`else`/`finally`, `raise`, `assert`
//! - Imports: `import a as b`, `from a import b`
//!
//! # Grammar
//!
//! ```text
//! statement    ::= compound_stmt | simple_stmts
//! simple_stmts ::= simple_stmt (';' simple_stmt)* [';'] NEWLINE
//! compound_stmt ::= if_stmt | while_stmt | for_stmt | funcdef | try_stmt
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::parser::scope;
use std::rc::Rc;

impl Parser {
    /// Parse one statement line.
    ///
    /// Returns a list because a single line of simple statements may hold
    /// several `;`-separated statements.
    pub(crate) fn parse_statement(&mut self) -> Result<Vec<Stmt>, ParseError> {
        match &self.peek().kind {
            TokenKind::If => Ok(vec![self.parse_if_statement("'if' statement")?]),
            TokenKind::While => Ok(vec![self.parse_while_statement()?]),
            TokenKind::For => Ok(vec![self.parse_for_statement()?]),
            TokenKind::Def => Ok(vec![self.parse_function_definition()?]),
            TokenKind::Try => Ok(vec![self.parse_try_statement()?]),
            TokenKind::Elif | TokenKind::Else | TokenKind::Except | TokenKind::Finally => {
                Err(self.invalid_syntax())
            }
            _ => self.parse_simple_statements(),
        }
    }

    /// Parse `simple_stmt (';' simple_stmt)* [';'] NEWLINE`
    pub(crate) fn parse_simple_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = vec![self.parse_simple_statement()?];

        while self.match_token(&TokenKind::Semicolon) {
            if self.check(&TokenKind::Newline) || self.is_at_end() {
                break;
            }
            statements.push(self.parse_simple_statement()?);
        }

        self.expect_statement_end()?;
        Ok(statements)
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();

        match &self.peek().kind {
            TokenKind::Pass => {
                self.advance();
                Ok(Stmt::Pass { location })
            }
            TokenKind::Break => {
                if self.loop_depth == 0 {
                    return Err(self.error_here("'break' outside loop"));
                }
                self.advance();
                Ok(Stmt::Break { location })
            }
            TokenKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(self.error_here("'continue' not properly in loop"));
                }
                self.advance();
                Ok(Stmt::Continue { location })
            }
            TokenKind::Return => {
                if self.function_depth == 0 {
                    return Err(self.error_here("'return' outside function"));
                }
                self.advance();
                let value = if self.at_simple_statement_end() {
                    None
                } else {
                    Some(self.parse_expression_list()?)
                };
                Ok(Stmt::Return { value, location })
            }
            TokenKind::Global => {
                self.advance();
                let mut names = vec![self.expect_identifier()?];
                while self.match_token(&TokenKind::Comma) {
                    names.push(self.expect_identifier()?);
                }
                Ok(Stmt::Global { names, location })
            }
            TokenKind::Del => {
                self.advance();
                let expr = self.parse_expression_list()?;
                let targets = match expr {
                    Expr::Tuple(items, _) => items
                        .into_iter()
                        .map(|item| self.expr_to_target(item, "delete"))
                        .collect::<Result<Vec<_>, _>>()?,
                    other => vec![self.expr_to_target(other, "delete")?],
                };
                Ok(Stmt::Del { targets, location })
            }
            TokenKind::Assert => {
                self.advance();
                let test = self.parse_expression()?;
                let message = if self.match_token(&TokenKind::Comma) {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Stmt::Assert {
                    test,
                    message,
                    location,
                })
            }
            TokenKind::Raise => {
                self.advance();
                let exception = if self.at_simple_statement_end() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                // `raise X from Y`: the cause is evaluated for errors but not kept
                if self.match_token(&TokenKind::From) {
                    self.parse_expression()?;
                }
                Ok(Stmt::Raise {
                    exception,
                    location,
                })
            }
            TokenKind::Import => self.parse_import(location),
            TokenKind::From => self.parse_from_import(location),
            _ => self.parse_expression_statement(location),
        }
    }

    /// Whether the current token ends a simple statement
    fn at_simple_statement_end(&self) -> bool {
        self.check(&TokenKind::Newline) || self.check(&TokenKind::Semicolon) || self.is_at_end()
    }

    /// Expression statement, assignment, augmented assignment or annotation
    fn parse_expression_statement(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        let first = self.parse_expression_list()?;

        if self.check(&TokenKind::Eq) {
            let mut exprs = vec![first];
            while self.match_token(&TokenKind::Eq) {
                exprs.push(self.parse_expression_list()?);
            }
            let value = exprs.pop().ok_or_else(|| self.invalid_syntax())?;
            let targets = exprs
                .into_iter()
                .map(|expr| self.expr_to_target(expr, "assign to"))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Stmt::Assign {
                targets,
                value,
                location,
            });
        }

        if let Some(op) = self.match_augmented_operator() {
            let target = match first {
                Expr::Name(..) | Expr::Subscript { .. } => {
                    self.expr_to_target(first, "assign to")?
                }
                Expr::Tuple(..) => {
                    return Err(self.error_at(
                        "'tuple' is an illegal expression for augmented assignment",
                        location,
                    ))
                }
                Expr::List(..) => {
                    return Err(self.error_at(
                        "'list' is an illegal expression for augmented assignment",
                        location,
                    ))
                }
                _ => {
                    return Err(self.error_at(
                        "illegal expression for augmented assignment",
                        location,
                    ))
                }
            };
            let value = self.parse_expression_list()?;
            return Ok(Stmt::AugAssign {
                target,
                op,
                value,
                location,
            });
        }

        // Annotated assignment: `x: int = 5` or a bare `x: int`
        if self.match_token(&TokenKind::Colon) {
            let target = match first {
                Expr::Name(..) | Expr::Subscript { .. } => self.expr_to_target(first, "assign to")?,
                _ => {
                    return Err(self.error_at(
                        "only single target (not tuple) can be annotated",
                        location,
                    ))
                }
            };
            self.parse_expression()?;
            if self.match_token(&TokenKind::Eq) {
                let value = self.parse_expression_list()?;
                return Ok(Stmt::Assign {
                    targets: vec![target],
                    value,
                    location,
                });
            }
            return Ok(Stmt::Pass { location });
        }

        Ok(Stmt::Expr {
            expr: first,
            location,
        })
    }

    fn match_augmented_operator(&mut self) -> Option<BinOp> {
        let op = match self.peek().kind {
            TokenKind::PlusEq => BinOp::Add,
            TokenKind::MinusEq => BinOp::Sub,
            TokenKind::StarEq => BinOp::Mul,
            TokenKind::SlashEq => BinOp::Div,
            TokenKind::DoubleSlashEq => BinOp::FloorDiv,
            TokenKind::PercentEq => BinOp::Mod,
            TokenKind::DoubleStarEq => BinOp::Pow,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Convert a parsed expression into an assignment (or `del`) target
    pub(crate) fn expr_to_target(&self, expr: Expr, verb: &str) -> Result<Target, ParseError> {
        match expr {
            Expr::Name(name, loc) => Ok(Target::Name(name, loc)),
            Expr::Subscript {
                object,
                index,
                location,
            } => Ok(Target::Subscript {
                object: *object,
                index: *index,
                location,
            }),
            Expr::Tuple(items, loc) | Expr::List(items, loc) => {
                let targets = items
                    .into_iter()
                    .map(|item| self.expr_to_target(item, verb))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Target::Tuple(targets, loc))
            }
            Expr::Attribute { location, .. } => Err(self.error_at(
                &format!("cannot {} attribute: attributes are read-only", verb),
                location,
            )),
            Expr::None(loc)
            | Expr::Bool(_, loc)
            | Expr::Int(_, loc)
            | Expr::BigInt(_, loc)
            | Expr::Float(_, loc)
            | Expr::Str(_, loc) => {
                Err(self.error_at(&format!("cannot {} literal", verb), loc))
            }
            Expr::Call { location, .. } => {
                Err(self.error_at(&format!("cannot {} function call", verb), location))
            }
            other => Err(self.error_at(&format!("cannot {} expression", verb), other.location())),
        }
    }

    /// Parse `if` (or `elif`, which shares the shape)
    fn parse_if_statement(&mut self, header: &str) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // 'if' / 'elif'

        let condition = self.parse_expression()?;
        let body = self.parse_block(header, location.line)?;

        let orelse = if self.check(&TokenKind::Elif) {
            vec![self.parse_if_statement("'elif' statement")?]
        } else if self.check(&TokenKind::Else) {
            let line = self.current_location().line;
            self.advance();
            self.parse_block("'else' statement", line)?
        } else {
            Vec::new()
        };

        Ok(Stmt::If {
            condition,
            body,
            orelse,
            location,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // 'while'

        let condition = self.parse_expression()?;
        let body = self.parse_loop_body("'while' statement", location.line)?;
        let orelse = self.parse_loop_else()?;

        Ok(Stmt::While {
            condition,
            body,
            orelse,
            location,
        })
    }

    fn parse_for_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // 'for'

        let target = self.parse_for_target()?;
        self.expect_token(&TokenKind::In, "expected 'in'")?;
        let iter = self.parse_expression_list()?;
        let body = self.parse_loop_body("'for' statement", location.line)?;
        let orelse = self.parse_loop_else()?;

        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
            location,
        })
    }

    /// Target list of a `for` statement or comprehension clause.
    ///
    /// Parsed below the comparison level so the `in` keyword is not consumed
    /// as a membership test.
    pub(crate) fn parse_for_target(&mut self) -> Result<Target, ParseError> {
        let location = self.current_location();
        let first = self.parse_bitwise_or()?;
        if !self.check(&TokenKind::Comma) {
            return self.expr_to_target(first, "assign to");
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::In) {
                break;
            }
            items.push(self.parse_bitwise_or()?);
        }
        self.expr_to_target(Expr::Tuple(items, location), "assign to")
    }

    fn parse_loop_body(&mut self, header: &str, line: usize) -> Result<Vec<Stmt>, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_block(header, line);
        self.loop_depth -= 1;
        body
    }

    fn parse_loop_else(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.check(&TokenKind::Else) {
            let line = self.current_location().line;
            self.advance();
            self.parse_block("'else' statement", line)
        } else {
            Ok(Vec::new())
        }
    }

    /// Parse `def name(params) [-> annotation]: body`
    fn parse_function_definition(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // 'def'

        let name = self.expect_identifier()?;
        self.expect_token(&TokenKind::LParen, "expected '('")?;
        let params = self.parse_parameters()?;

        if self.match_token(&TokenKind::Arrow) {
            self.parse_expression()?;
        }

        // A function body starts a fresh loop context
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block("function definition", location.line);
        self.function_depth -= 1;
        self.loop_depth = saved_loop_depth;
        let body = body?;

        let (locals, globals) = scope::analyze_function(&params, &body);

        Ok(Stmt::FunctionDef(Rc::new(FunctionDef {
            name,
            params,
            body,
            locals,
            globals,
            filename: self.filename.clone(),
            location,
        })))
    }

    /// Parse a parameter list up to and including the closing `)`
    fn parse_parameters(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params: Vec<Param> = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Star) || self.check(&TokenKind::DoubleStar) {
                return Err(self.error_here("variadic parameters are not supported"));
            }

            let param_location = self.current_location();
            let name = self.expect_identifier()?;
            if params.iter().any(|p| p.name == name) {
                return Err(self.error_at(
                    &format!("duplicate argument '{}' in function definition", name),
                    param_location,
                ));
            }

            if self.match_token(&TokenKind::Colon) {
                self.parse_expression()?;
            }

            let default = if self.match_token(&TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                if params.iter().any(|p| p.default.is_some()) {
                    return Err(self.error_at(
                        "parameter without a default follows parameter with a default",
                        param_location,
                    ));
                }
                None
            };

            params.push(Param { name, default });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(&TokenKind::RParen, "expected ')'")?;
        Ok(params)
    }

    /// Parse `try: ... except ...: ... else: ... finally: ...`
    fn parse_try_statement(&mut self) -> Result<Stmt, ParseError> {
        let location = self.current_location();
        self.advance(); // 'try'

        let body = self.parse_block("'try' statement", location.line)?;

        let mut handlers = Vec::new();
        while self.check(&TokenKind::Except) {
            let handler_location = self.current_location();
            if handlers
                .last()
                .is_some_and(|h: &ExceptHandler| h.class.is_none())
            {
                return Err(self.error_at("default 'except:' must be last", handler_location));
            }
            self.advance(); // 'except'

            let (class, name) = if self.check(&TokenKind::Colon) {
                (None, None)
            } else {
                let class = self.parse_expression()?;
                let name = if self.match_token(&TokenKind::As) {
                    Some(self.expect_identifier()?)
                } else {
                    None
                };
                (Some(class), name)
            };

            let body = self.parse_block("'except' statement", handler_location.line)?;
            handlers.push(ExceptHandler {
                class,
                name,
                body,
                location: handler_location,
            });
        }

        let orelse = if !handlers.is_empty() && self.check(&TokenKind::Else) {
            let line = self.current_location().line;
            self.advance();
            self.parse_block("'else' statement", line)?
        } else {
            Vec::new()
        };

        let finally = if self.check(&TokenKind::Finally) {
            let line = self.current_location().line;
            self.advance();
            self.parse_block("'finally' statement", line)?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finally.is_empty() {
            return Err(self.error_here("expected 'except' or 'finally' block"));
        }

        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finally,
            location,
        })
    }

    /// `import a[.b] [as c], ...`
    fn parse_import(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        self.advance(); // 'import'

        let mut modules = Vec::new();
        loop {
            let name = self.parse_dotted_name()?;
            let alias = if self.match_token(&TokenKind::As) {
                Some(self.expect_identifier()?)
            } else {
                None
            };
            modules.push(ImportName { name, alias });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        Ok(Stmt::Import { modules, location })
    }

    /// `from module import name [as alias], ...` (optionally parenthesized)
    fn parse_from_import(&mut self, location: SourceLocation) -> Result<Stmt, ParseError> {
        self.advance(); // 'from'

        if self.check(&TokenKind::Dot) {
            return Err(self.error_here("relative imports are not supported"));
        }
        let module = self.parse_dotted_name()?;
        self.expect_token(&TokenKind::Import, "invalid syntax")?;

        if self.check(&TokenKind::Star) {
            return Err(self.error_here("wildcard imports are not supported"));
        }

        let parenthesized = self.match_token(&TokenKind::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let alias = if self.match_token(&TokenKind::As) {
                Some(self.expect_identifier()?)
            } else {
                None
            };
            names.push(ImportName { name, alias });
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
            if parenthesized && self.check(&TokenKind::RParen) {
                break;
            }
        }
        if parenthesized {
            self.expect_token(&TokenKind::RParen, "expected ')'")?;
        }

        Ok(Stmt::ImportFrom {
            module,
            names,
            location,
        })
    }

    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_identifier()?;
        while self.match_token(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::compile;

    fn parse(source: &str) -> Program {
        compile(source, "<test>").expect("Parsing failed")
    }

    fn parse_err(source: &str) -> String {
        compile(source, "<test>").unwrap_err().message
    }

    #[test]
    fn test_tuple_unpacking_target() {
        let program = parse("a, b = 1, 2\n");
        match &program.body[0] {
            Stmt::Assign { targets, value, .. } => {
                assert!(matches!(&targets[0], Target::Tuple(items, _) if items.len() == 2));
                assert!(matches!(value, Expr::Tuple(items, _) if items.len() == 2));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_assignment() {
        let program = parse("a = b = 0\n");
        match &program.body[0] {
            Stmt::Assign { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_augmented_assignment_to_subscript() {
        let program = parse("counts[k] += 1\n");
        assert!(matches!(
            &program.body[0],
            Stmt::AugAssign {
                target: Target::Subscript { .. },
                op: BinOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_for_with_tuple_target() {
        let program = parse("for i, x in enumerate(xs):\n    pass\n");
        assert!(matches!(
            &program.body[0],
            Stmt::For { target: Target::Tuple(items, _), .. } if items.len() == 2
        ));
    }

    #[test]
    fn test_try_except_else_finally() {
        let source = "try:\n    x = 1\nexcept ValueError as e:\n    pass\nexcept:\n    pass\nelse:\n    y = 2\nfinally:\n    z = 3\n";
        match &parse(source).body[0] {
            Stmt::Try {
                handlers,
                orelse,
                finally,
                ..
            } => {
                assert_eq!(handlers.len(), 2);
                assert_eq!(handlers[0].name.as_deref(), Some("e"));
                assert!(handlers[1].class.is_none());
                assert_eq!(handlers[1].location.line, 5);
                assert_eq!(orelse.len(), 1);
                assert_eq!(finally.len(), 1);
            }
            other => panic!("Expected try statement, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_except_must_be_last() {
        let source = "try:\n    pass\nexcept:\n    pass\nexcept ValueError:\n    pass\n";
        assert_eq!(parse_err(source), "default 'except:' must be last");
    }

    #[test]
    fn test_try_without_handlers() {
        assert_eq!(
            parse_err("try:\n    pass\nx = 1\n"),
            "expected 'except' or 'finally' block"
        );
    }

    #[test]
    fn test_imports() {
        let program = parse("import math as m, sys\nfrom math import (sqrt, pi as PI)\n");
        match &program.body[0] {
            Stmt::Import { modules, .. } => {
                assert_eq!(modules[0].binding(), "m");
                assert_eq!(modules[1].binding(), "sys");
            }
            other => panic!("Expected import, got {:?}", other),
        }
        match &program.body[1] {
            Stmt::ImportFrom { module, names, .. } => {
                assert_eq!(module, "math");
                assert_eq!(names[1].binding(), "PI");
            }
            other => panic!("Expected from-import, got {:?}", other),
        }
    }

    #[test]
    fn test_default_parameter_order() {
        assert_eq!(
            parse_err("def f(a=1, b):\n    pass\n"),
            "parameter without a default follows parameter with a default"
        );
    }

    #[test]
    fn test_annotations_are_ignored() {
        let program = parse("def f(a: int, b: int = 2) -> int:\n    return a\nx: int = 5\n");
        assert_eq!(program.body.len(), 2);
        assert!(matches!(&program.body[1], Stmt::Assign { .. }));
    }

    #[test]
    fn test_assign_to_literal() {
        assert_eq!(parse_err("1 = x\n"), "cannot assign to literal");
        assert_eq!(parse_err("f() = 3\n"), "cannot assign to function call");
    }

    #[test]
    fn test_break_in_function_inside_loop() {
        let err = parse_err("for i in x:\n    def f():\n        break\n");
        assert_eq!(err, "'break' outside loop");
    }

    #[test]
    fn test_stray_else() {
        assert_eq!(parse_err("else:\n    pass\n"), "invalid syntax");
    }
}
