//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, token helpers, block parsing and the [`compile`]
//! entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, blocks and coordination
//! - `statements`: simple and compound statements (`if`, `for`, `def`, `try`, ...)
//! - `expressions`: expressions by precedence level, plus f-string splitting
//! - `scope`: local-name analysis for function bodies
//!
//! Parser methods are split across files using `impl Parser` blocks, each
//! extending the Parser with related functionality while sharing its state.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use std::fmt;
use std::rc::Rc;

/// Parser error type.
///
/// Displays the way CPython renders `str(SyntaxError)`:
/// `invalid syntax (<user_code>, line 3)`.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub filename: Rc<str>,
    pub location: SourceLocation,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, line {})",
            self.message, self.filename, self.location.line
        )
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    fn from_lex(err: LexError, filename: Rc<str>) -> Self {
        ParseError {
            message: err.message,
            filename,
            location: err.location,
        }
    }
}

/// Parse `source` into a [`Program`] tagged with `filename`.
pub fn compile(source: &str, filename: &str) -> Result<Program, ParseError> {
    let mut parser = Parser::new(source, filename)?;
    parser.parse_program()
}

/// Recursive descent parser for the Python subset
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    pub(crate) filename: Rc<str>,
    /// Number of enclosing loops in the current function (for `break`/`continue`)
    pub(crate) loop_depth: usize,
    /// Number of enclosing `def`s (for `return`)
    pub(crate) function_depth: usize,
}

impl Parser {
    pub fn new(source: &str, filename: &str) -> Result<Self, ParseError> {
        let filename: Rc<str> = Rc::from(filename);
        let tokens = Lexer::new(source)
            .tokenize()
            .map_err(|e| ParseError::from_lex(e, filename.clone()))?;
        Ok(Self {
            tokens,
            position: 0,
            filename,
            loop_depth: 0,
            function_depth: 0,
        })
    }

    /// Parser over a fragment of a larger source, e.g. an f-string field
    pub(crate) fn for_fragment(
        source: &str,
        filename: Rc<str>,
        location: SourceLocation,
    ) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source)
            .starting_at(location)
            .tokenize()
            .map_err(|e| ParseError::from_lex(e, filename.clone()))?;
        Ok(Self {
            tokens,
            position: 0,
            filename,
            loop_depth: 0,
            function_depth: 0,
        })
    }

    /// Parse the entire program (module body)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            if self.match_token(&TokenKind::Newline) {
                continue;
            }
            if self.check(&TokenKind::Indent) {
                return Err(self.error_here("unexpected indent"));
            }
            body.extend(self.parse_statement()?);
        }

        Ok(Program {
            filename: self.filename.clone(),
            body,
        })
    }

    /// Parse the block after a compound statement header's `:`.
    ///
    /// Either an indented suite on the following lines, or one or more simple
    /// statements on the header's own line.
    pub(crate) fn parse_block(
        &mut self,
        header: &str,
        header_line: usize,
    ) -> Result<Vec<Stmt>, ParseError> {
        self.expect_token(&TokenKind::Colon, "expected ':'")?;

        if !self.match_token(&TokenKind::Newline) {
            return self.parse_simple_statements();
        }

        if !self.match_token(&TokenKind::Indent) {
            return Err(self.error_here(&format!(
                "expected an indented block after {} on line {}",
                header, header_line
            )));
        }

        let mut body = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.is_at_end() {
            if self.match_token(&TokenKind::Newline) {
                continue;
            }
            if self.check(&TokenKind::Indent) {
                return Err(self.error_here("unexpected indent"));
            }
            body.extend(self.parse_statement()?);
        }
        self.match_token(&TokenKind::Dedent);

        Ok(body)
    }

    // ===== Helper methods =====

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    pub(crate) fn check_ahead(&self, n: usize, kind: &TokenKind) -> bool {
        self.tokens
            .get(self.position + n)
            .is_some_and(|t| std::mem::discriminant(&t.kind) == std::mem::discriminant(kind))
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        // The lexer always terminates the stream with Eof
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location
    }

    pub(crate) fn error_at(&self, message: &str, location: SourceLocation) -> ParseError {
        ParseError {
            message: message.to_string(),
            filename: self.filename.clone(),
            location,
        }
    }

    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        self.error_at(message, self.current_location())
    }

    /// The generic "invalid syntax" error, specialised for reserved keywords
    pub(crate) fn invalid_syntax(&self) -> ParseError {
        match &self.peek().kind {
            TokenKind::Reserved(word) => {
                self.error_here(&format!("'{}' is not supported", word))
            }
            TokenKind::Indent => self.error_here("unexpected indent"),
            TokenKind::Dedent => self.error_here("unindent does not match any outer indentation level"),
            _ => self.error_here("invalid syntax"),
        }
    }

    pub(crate) fn expect_token(
        &mut self,
        kind: &TokenKind,
        message: &str,
    ) -> Result<(), ParseError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.error_here(message))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let TokenKind::Name(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.invalid_syntax())
        }
    }

    /// Expect the end of a simple statement (newline, `;` handled by caller, or EOF)
    pub(crate) fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        if self.match_token(&TokenKind::Newline) || self.is_at_end() {
            Ok(())
        } else {
            Err(self.invalid_syntax())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        compile(source, "<test>").unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        compile(source, "<test>").unwrap_err()
    }

    #[test]
    fn test_parse_simple_assignment() {
        let program = parse("x = 1 + 2 * 3\n");
        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Stmt::Assign { targets, value, .. } => {
                assert!(matches!(&targets[0], Target::Name(n, _) if n == "x"));
                assert!(matches!(value, Expr::BinaryOp { op: BinOp::Add, .. }));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_function() {
        let program = parse("def add(a, b=2):\n    c = a + b\n    return c\n");
        match &program.body[0] {
            Stmt::FunctionDef(def) => {
                assert_eq!(def.name, "add");
                assert_eq!(def.params.len(), 2);
                assert!(def.params[1].default.is_some());
                assert_eq!(def.body.len(), 2);
                assert!(def.locals.contains("c"));
                assert!(def.locals.contains("a"));
                assert_eq!(&*def.filename, "<test>");
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_elif_else() {
        let program = parse("if x:\n    a = 1\nelif y:\n    a = 2\nelse:\n    a = 3\n");
        match &program.body[0] {
            Stmt::If { orelse, .. } => {
                assert_eq!(orelse.len(), 1);
                assert!(matches!(&orelse[0], Stmt::If { location, .. } if location.line == 3));
            }
            other => panic!("Expected if statement, got {:?}", other),
        }
    }

    #[test]
    fn test_one_line_body() {
        let program = parse("total = 0\nfor i in range(3): total += i\nprint(total)\n");
        assert_eq!(program.body.len(), 3);
        match &program.body[1] {
            Stmt::For { body, location, .. } => {
                assert_eq!(location.line, 2);
                assert_eq!(body.len(), 1);
                assert_eq!(body[0].location().line, 2);
            }
            other => panic!("Expected for statement, got {:?}", other),
        }
    }

    #[test]
    fn test_semicolon_separated() {
        let program = parse("a = 1; b = 2\n");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn test_missing_colon() {
        let err = parse_err("if x\n    pass\n");
        assert_eq!(err.message, "expected ':'");
        assert_eq!(err.to_string(), "expected ':' (<test>, line 1)");
    }

    #[test]
    fn test_missing_indented_block() {
        let err = parse_err("for i in x:\nprint(i)\n");
        assert_eq!(
            err.message,
            "expected an indented block after 'for' statement on line 1"
        );
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_return_outside_function() {
        let err = parse_err("return 1\n");
        assert_eq!(err.message, "'return' outside function");
    }

    #[test]
    fn test_break_outside_loop() {
        let err = parse_err("if True:\n    break\n");
        assert_eq!(err.message, "'break' outside loop");
    }

    #[test]
    fn test_lexer_errors_carry_filename() {
        let err = parse_err("x = $\n");
        assert_eq!(err.to_string(), "invalid character '$' (U+0024) (<test>, line 1)");
    }

    #[test]
    fn test_reserved_keyword() {
        let err = parse_err("class A:\n    pass\n");
        assert_eq!(err.message, "'class' is not supported");
    }
}
