//! Expression parsing implementation
//!
//! This module handles parsing of expressions using recursive descent, one
//! method per precedence level, lowest first:
//!
//! ```text
//! expression  ::= or_test ['if' or_test 'else' expression]
//! or_test     ::= and_test ('or' and_test)*
//! and_test    ::= not_test ('and' not_test)*
//! not_test    ::= 'not' not_test | comparison
//! comparison  ::= bitwise_or (comp_op bitwise_or)*
//! bitwise_or  ::= xor ('|' xor)*        (then '^', '&', shifts)
//! arith       ::= term (('+' | '-') term)*
//! term        ::= factor (('*' | '/' | '//' | '%') factor)*
//! factor      ::= ('+' | '-' | '~') factor | power
//! power       ::= primary ['**' factor]
//! primary     ::= atom (call | subscript | '.' NAME)*
//! ```
//!
//! f-string literals are split into literal text and replacement fields here;
//! each field's expression is parsed with a sub-parser positioned at the
//! literal's location.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse expression (top-level entry point, no bare tuples)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let body = self.parse_or_test()?;

        if !self.match_token(&TokenKind::If) {
            return Ok(body);
        }

        let condition = self.parse_or_test()?;
        self.expect_token(&TokenKind::Else, "expected 'else' after 'if' expression")?;
        let orelse = self.parse_expression()?;

        Ok(Expr::IfExp {
            condition: Box::new(condition),
            body: Box::new(body),
            orelse: Box::new(orelse),
            location,
        })
    }

    /// Parse a comma-separated expression list; more than one element (or a
    /// trailing comma) produces a tuple.
    pub(crate) fn parse_expression_list(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let first = self.parse_expression()?;

        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if !self.can_start_expression() {
                break;
            }
            items.push(self.parse_expression()?);
        }
        Ok(Expr::Tuple(items, location))
    }

    fn can_start_expression(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Name(_)
                | TokenKind::Int(_)
                | TokenKind::BigInt(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::FString(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::None
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::Tilde
                | TokenKind::Not
        )
    }

    fn parse_or_test(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_test()?;

        while self.check(&TokenKind::Or) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_and_test()?;
            left = Expr::BoolOp {
                op: BoolOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_and_test(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not_test()?;

        while self.check(&TokenKind::And) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_not_test()?;
            left = Expr::BoolOp {
                op: BoolOp::And,
                left: Box::new(left),
                right: Box::new(right),
                location,
            };
        }

        Ok(left)
    }

    fn parse_not_test(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        if self.match_token(&TokenKind::Not) {
            let operand = self.parse_not_test()?;
            return Ok(Expr::UnaryOp {
                op: UnOp::Not,
                operand: Box::new(operand),
                location,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let left = self.parse_bitwise_or()?;

        let mut comparisons = Vec::new();
        while let Some(op) = self.match_comparison_operator() {
            comparisons.push((op, self.parse_bitwise_or()?));
        }

        if comparisons.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                comparisons,
                location,
            })
        }
    }

    fn match_comparison_operator(&mut self) -> Option<CmpOp> {
        let op = match self.peek().kind {
            TokenKind::EqEq => CmpOp::Eq,
            TokenKind::NotEq => CmpOp::NotEq,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Ge => CmpOp::Ge,
            TokenKind::In => CmpOp::In,
            TokenKind::Not if self.check_ahead(1, &TokenKind::In) => {
                self.advance();
                CmpOp::NotIn
            }
            TokenKind::Is => {
                self.advance();
                return Some(if self.match_token(&TokenKind::Not) {
                    CmpOp::IsNot
                } else {
                    CmpOp::Is
                });
            }
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    /// Parse `|` level (also the entry point for `for` targets)
    pub(crate) fn parse_bitwise_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitwise_xor()?;
        while self.check(&TokenKind::Pipe) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_bitwise_xor()?;
            left = binary(BinOp::BitOr, left, right, location);
        }
        Ok(left)
    }

    fn parse_bitwise_xor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitwise_and()?;
        while self.check(&TokenKind::Caret) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_bitwise_and()?;
            left = binary(BinOp::BitXor, left, right, location);
        }
        Ok(left)
    }

    fn parse_bitwise_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_shift()?;
        while self.check(&TokenKind::Amp) {
            let location = self.current_location();
            self.advance();
            let right = self.parse_shift()?;
            left = binary(BinOp::BitAnd, left, right, location);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_arith()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::LShift => BinOp::Shl,
                TokenKind::RShift => BinOp::Shr,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_arith()?;
            left = binary(op, left, right, location);
        }
        Ok(left)
    }

    fn parse_arith(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right, location);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let location = self.current_location();
            self.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right, location);
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let op = match self.peek().kind {
            TokenKind::Minus => UnOp::Neg,
            TokenKind::Plus => UnOp::Pos,
            TokenKind::Tilde => UnOp::Invert,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_factor()?;
        Ok(Expr::UnaryOp {
            op,
            operand: Box::new(operand),
            location,
        })
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if self.check(&TokenKind::DoubleStar) {
            let location = self.current_location();
            self.advance();
            // Right-associative, and binds tighter than a unary minus on its left
            let exponent = self.parse_factor()?;
            return Ok(binary(BinOp::Pow, base, exponent, location));
        }
        Ok(base)
    }

    /// Parse an atom followed by call, subscript and attribute trailers
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;

        loop {
            let location = self.current_location();
            if self.match_token(&TokenKind::LParen) {
                expr = self.parse_call(expr, location)?;
            } else if self.match_token(&TokenKind::LBracket) {
                let index = self.parse_subscript_index()?;
                self.expect_token(&TokenKind::RBracket, "expected ']'")?;
                expr = Expr::Subscript {
                    object: Box::new(expr),
                    index: Box::new(index),
                    location,
                };
            } else if self.match_token(&TokenKind::Dot) {
                let name = self.expect_identifier()?;
                expr = Expr::Attribute {
                    object: Box::new(expr),
                    name,
                    location,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse call arguments after `(` through the closing `)`
    fn parse_call(&mut self, func: Expr, location: SourceLocation) -> Result<Expr, ParseError> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(String, Expr)> = Vec::new();

        while !self.check(&TokenKind::RParen) {
            if self.check(&TokenKind::Star) || self.check(&TokenKind::DoubleStar) {
                return Err(self.error_here("argument unpacking is not supported"));
            }

            let keyword = match &self.peek().kind {
                TokenKind::Name(name) if self.check_ahead(1, &TokenKind::Eq) => Some(name.clone()),
                _ => None,
            };

            if let Some(name) = keyword {
                let keyword_location = self.current_location();
                self.advance(); // name
                self.advance(); // '='
                if kwargs.iter().any(|(existing, _)| *existing == name) {
                    return Err(self.error_at(
                        &format!("keyword argument repeated: {}", name),
                        keyword_location,
                    ));
                }
                let value = self.parse_expression()?;
                kwargs.push((name, value));
            } else {
                if !kwargs.is_empty() {
                    return Err(self.error_here("positional argument follows keyword argument"));
                }
                let arg_location = self.current_location();
                let arg = self.parse_expression()?;
                if self.check(&TokenKind::For) {
                    // Bare generator argument, evaluated eagerly as a list
                    let clauses = self.parse_comprehension_clauses()?;
                    if !args.is_empty() || !self.check(&TokenKind::RParen) {
                        return Err(self.error_at(
                            "Generator expression must be parenthesized",
                            arg_location,
                        ));
                    }
                    args.push(Expr::ListComp {
                        element: Box::new(arg),
                        clauses,
                        location: arg_location,
                    });
                } else {
                    args.push(arg);
                }
            }

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        if !self.match_token(&TokenKind::RParen) {
            return Err(self.invalid_syntax());
        }

        Ok(Expr::Call {
            func: Box::new(func),
            args,
            kwargs,
            location,
        })
    }

    /// Parse the inside of `[...]`: an index, a slice, or a tuple of indices
    fn parse_subscript_index(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        if self.match_token(&TokenKind::Colon) {
            let upper = if self.check(&TokenKind::Colon) || self.check(&TokenKind::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_expression()?))
            };
            let step = if self.match_token(&TokenKind::Colon) && !self.check(&TokenKind::RBracket)
            {
                Some(Box::new(self.parse_expression()?))
            } else {
                None
            };
            return Ok(Expr::Slice {
                lower: lower.map(Box::new),
                upper,
                step,
                location,
            });
        }

        let Some(first) = lower else {
            return Err(self.invalid_syntax());
        };
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        Ok(Expr::Tuple(items, location))
    }

    /// Parse one or more `for target in iter [if cond]*` clauses
    fn parse_comprehension_clauses(&mut self) -> Result<Vec<CompClause>, ParseError> {
        let mut clauses = Vec::new();

        while self.match_token(&TokenKind::For) {
            let target = self.parse_for_target()?;
            self.expect_token(&TokenKind::In, "expected 'in'")?;
            let iter = self.parse_or_test()?;
            let mut conditions = Vec::new();
            while self.match_token(&TokenKind::If) {
                conditions.push(self.parse_or_test()?);
            }
            clauses.push(CompClause {
                target,
                iter,
                conditions,
            });
        }

        Ok(clauses)
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();

        match self.peek().kind.clone() {
            TokenKind::Name(name) => {
                self.advance();
                Ok(Expr::Name(name, location))
            }
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::Int(value, location))
            }
            TokenKind::BigInt(value) => {
                self.advance();
                Ok(Expr::BigInt(value, location))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::Float(value, location))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true, location))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false, location))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::None(location))
            }
            TokenKind::Str(_) | TokenKind::FString(_) => self.parse_string_literals(),
            TokenKind::LParen => {
                self.advance();
                self.parse_parenthesized(location)
            }
            TokenKind::LBracket => {
                self.advance();
                self.parse_list_display(location)
            }
            TokenKind::LBrace => {
                self.advance();
                self.parse_dict_display(location)
            }
            _ => Err(self.invalid_syntax()),
        }
    }

    /// `( ... )`: empty tuple, grouping, tuple or generator expression
    fn parse_parenthesized(&mut self, location: SourceLocation) -> Result<Expr, ParseError> {
        if self.match_token(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new(), location));
        }

        let first = self.parse_expression()?;

        if self.check(&TokenKind::For) {
            let clauses = self.parse_comprehension_clauses()?;
            self.expect_token(&TokenKind::RParen, "expected ')'")?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                clauses,
                location,
            });
        }

        if !self.check(&TokenKind::Comma) {
            self.expect_token(&TokenKind::RParen, "expected ')'")?;
            return Ok(first);
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect_token(&TokenKind::RParen, "expected ')'")?;
        Ok(Expr::Tuple(items, location))
    }

    /// `[ ... ]`: list display or list comprehension
    fn parse_list_display(&mut self, location: SourceLocation) -> Result<Expr, ParseError> {
        if self.match_token(&TokenKind::RBracket) {
            return Ok(Expr::List(Vec::new(), location));
        }

        let first = self.parse_expression()?;

        if self.check(&TokenKind::For) {
            let clauses = self.parse_comprehension_clauses()?;
            self.expect_token(&TokenKind::RBracket, "expected ']'")?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                clauses,
                location,
            });
        }

        let mut items = vec![first];
        while self.match_token(&TokenKind::Comma) {
            if self.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_expression()?);
        }
        self.expect_token(&TokenKind::RBracket, "expected ']'")?;
        Ok(Expr::List(items, location))
    }

    /// `{ ... }`: dict display
    fn parse_dict_display(&mut self, location: SourceLocation) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();

        while !self.check(&TokenKind::RBrace) {
            let key = self.parse_expression()?;
            if !self.match_token(&TokenKind::Colon) {
                let message = if self.check(&TokenKind::For) {
                    "set comprehensions are not supported"
                } else {
                    "set literals are not supported"
                };
                return Err(self.error_at(message, location));
            }
            let value = self.parse_expression()?;
            if self.check(&TokenKind::For) {
                return Err(self.error_at("dict comprehensions are not supported", location));
            }
            entries.push((key, value));

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.expect_token(&TokenKind::RBrace, "expected '}'")?;
        Ok(Expr::Dict(entries, location))
    }

    /// Adjacent string literals concatenate; any f-string among them makes
    /// the whole literal an f-string.
    fn parse_string_literals(&mut self) -> Result<Expr, ParseError> {
        let location = self.current_location();
        let mut parts = Vec::new();
        let mut formatted = false;

        loop {
            let token_location = self.current_location();
            match self.peek().kind.clone() {
                TokenKind::Str(text) => {
                    self.advance();
                    push_literal(&mut parts, &text);
                }
                TokenKind::FString(body) => {
                    self.advance();
                    formatted = true;
                    for part in self.split_fstring(&body, token_location)? {
                        match part {
                            FStringPart::Literal(text) => push_literal(&mut parts, &text),
                            field => parts.push(field),
                        }
                    }
                }
                _ => break,
            }
        }

        if formatted {
            return Ok(Expr::FString { parts, location });
        }

        let text = parts
            .into_iter()
            .map(|part| match part {
                FStringPart::Literal(text) => text,
                FStringPart::Field { .. } => String::new(),
            })
            .collect();
        Ok(Expr::Str(text, location))
    }

    /// Split an f-string body into literal text and replacement fields
    fn split_fstring(
        &self,
        body: &str,
        location: SourceLocation,
    ) -> Result<Vec<FStringPart>, ParseError> {
        let chars: Vec<char> = body.chars().collect();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    literal.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    literal.push('}');
                    i += 2;
                }
                '}' => {
                    return Err(self.error_at("f-string: single '}' is not allowed", location));
                }
                '{' => {
                    if !literal.is_empty() {
                        parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
                    }
                    let (field, next) = self.parse_fstring_field(&chars, i + 1, location)?;
                    parts.push(field);
                    i = next;
                }
                ch => {
                    literal.push(ch);
                    i += 1;
                }
            }
        }

        if !literal.is_empty() {
            parts.push(FStringPart::Literal(literal));
        }
        Ok(parts)
    }

    /// Parse one replacement field starting just after its `{`.
    ///
    /// Returns the field and the index just past its closing `}`.
    fn parse_fstring_field(
        &self,
        chars: &[char],
        start: usize,
        location: SourceLocation,
    ) -> Result<(FStringPart, usize), ParseError> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut expr_end = None;
        let mut conversion = None;
        let mut spec_start = None;
        let mut i = start;

        let close = loop {
            let Some(&ch) = chars.get(i) else {
                return Err(self.error_at("f-string: expecting '}'", location));
            };
            match quote {
                Some(q) => {
                    if ch == q {
                        quote = None;
                    }
                }
                None => match ch {
                    '\'' | '"' if spec_start.is_none() => quote = Some(ch),
                    '(' | '[' | '{' if spec_start.is_none() => depth += 1,
                    ')' | ']' if depth > 0 => depth -= 1,
                    '}' if depth > 0 => depth -= 1,
                    '}' => break i,
                    '!' if depth == 0
                        && expr_end.is_none()
                        && chars.get(i + 1) != Some(&'=') =>
                    {
                        expr_end = Some(i);
                        match chars.get(i + 1) {
                            Some(&c @ ('r' | 's' | 'a')) => conversion = Some(c),
                            _ => {
                                return Err(self.error_at(
                                    "f-string: invalid conversion character: expected 's', 'r', or 'a'",
                                    location,
                                ))
                            }
                        }
                        i += 1;
                    }
                    ':' if depth == 0 && spec_start.is_none() => {
                        expr_end.get_or_insert(i);
                        spec_start = Some(i + 1);
                    }
                    '{' => {
                        return Err(self.error_at(
                            "f-string: nested replacement fields are not supported",
                            location,
                        ))
                    }
                    _ => {}
                },
            }
            i += 1;
        };

        let expr_text: String = chars[start..expr_end.unwrap_or(close)].iter().collect();
        if expr_text.trim().is_empty() {
            return Err(self.error_at("f-string: empty expression not allowed", location));
        }
        let spec = spec_start.map(|s| chars[s..close].iter().collect::<String>());

        // Parenthesized so leading whitespace and bare tuples parse as in CPython
        let mut fragment =
            Parser::for_fragment(&format!("({})", expr_text), self.filename.clone(), location)?;
        let expr = fragment.parse_expression()?;
        if !fragment.check(&TokenKind::Newline) && !fragment.is_at_end() {
            return Err(self.error_at("f-string: invalid syntax", location));
        }

        // `!a` behaves like `!r` for the ASCII-only strings this subset produces
        let conversion = conversion.map(|c| if c == 'a' { 'r' } else { c });

        Ok((
            FStringPart::Field {
                expr,
                conversion,
                spec,
            },
            close + 1,
        ))
    }
}

fn binary(op: BinOp, left: Expr, right: Expr, location: SourceLocation) -> Expr {
    Expr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
        location,
    }
}

fn push_literal(parts: &mut Vec<FStringPart>, text: &str) {
    if let Some(FStringPart::Literal(last)) = parts.last_mut() {
        last.push_str(text);
    } else if !text.is_empty() {
        parts.push(FStringPart::Literal(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::compile;

    fn expr(source: &str) -> Expr {
        let program = compile(source, "<test>").expect("Parsing failed");
        match program.body.into_iter().next() {
            Some(Stmt::Expr { expr, .. }) => expr,
            Some(Stmt::Assign { value, .. }) => value,
            other => panic!("Expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence() {
        // 1 + (2 * 3)
        match expr("1 + 2 * 3\n") {
            Expr::BinaryOp {
                op: BinOp::Add,
                right,
                ..
            } => assert!(matches!(*right, Expr::BinaryOp { op: BinOp::Mul, .. })),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        match expr("-2 ** 2\n") {
            Expr::UnaryOp {
                op: UnOp::Neg,
                operand,
                ..
            } => assert!(matches!(*operand, Expr::BinaryOp { op: BinOp::Pow, .. })),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison() {
        match expr("a < b <= c\n") {
            Expr::Compare { comparisons, .. } => {
                assert_eq!(comparisons.len(), 2);
                assert_eq!(comparisons[1].0, CmpOp::Le);
            }
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_in_and_is_not() {
        assert!(matches!(
            expr("x not in y\n"),
            Expr::Compare { ref comparisons, .. } if comparisons[0].0 == CmpOp::NotIn
        ));
        assert!(matches!(
            expr("x is not None\n"),
            Expr::Compare { ref comparisons, .. } if comparisons[0].0 == CmpOp::IsNot
        ));
    }

    #[test]
    fn test_conditional_expression() {
        assert!(matches!(expr("a if c else b\n"), Expr::IfExp { .. }));
    }

    #[test]
    fn test_call_with_keywords() {
        match expr("print(a, b, sep='-')\n") {
            Expr::Call { args, kwargs, .. } => {
                assert_eq!(args.len(), 2);
                assert_eq!(kwargs[0].0, "sep");
            }
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_positional_after_keyword() {
        let err = compile("f(a=1, 2)\n", "<test>").unwrap_err();
        assert_eq!(err.message, "positional argument follows keyword argument");
    }

    #[test]
    fn test_slices() {
        match expr("xs[1:]\n") {
            Expr::Subscript { index, .. } => match *index {
                Expr::Slice {
                    lower, upper, step, ..
                } => {
                    assert!(lower.is_some());
                    assert!(upper.is_none());
                    assert!(step.is_none());
                }
                other => panic!("Unexpected index {:?}", other),
            },
            other => panic!("Unexpected {:?}", other),
        }
        assert!(matches!(expr("xs[::-1]\n"), Expr::Subscript { .. }));
    }

    #[test]
    fn test_list_comprehension() {
        match expr("[x * x for x in range(5) if x % 2]\n") {
            Expr::ListComp { clauses, .. } => {
                assert_eq!(clauses.len(), 1);
                assert_eq!(clauses[0].conditions.len(), 1);
            }
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_generator_argument() {
        match expr("sum(x for x in xs)\n") {
            Expr::Call { args, .. } => assert!(matches!(args[0], Expr::ListComp { .. })),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tuples() {
        assert!(matches!(expr("()\n"), Expr::Tuple(ref items, _) if items.is_empty()));
        assert!(matches!(expr("(1,)\n"), Expr::Tuple(ref items, _) if items.len() == 1));
        assert!(matches!(expr("(1)\n"), Expr::Int(1, _)));
        assert!(matches!(expr("x = 1, 2,\n"), Expr::Tuple(ref items, _) if items.len() == 2));
    }

    #[test]
    fn test_dict_display() {
        assert!(matches!(expr("{'a': 1, 'b': 2}\n"), Expr::Dict(ref e, _) if e.len() == 2));
        let err = compile("{1, 2}\n", "<test>").unwrap_err();
        assert_eq!(err.message, "set literals are not supported");
    }

    #[test]
    fn test_adjacent_strings() {
        assert!(matches!(expr("'ab' \"cd\"\n"), Expr::Str(ref s, _) if s == "abcd"));
    }

    #[test]
    fn test_fstring_fields() {
        match expr("f'{name!r}: {value:>8.2f} {{literal}}'\n") {
            Expr::FString { parts, .. } => {
                assert_eq!(parts.len(), 4);
                assert!(matches!(
                    &parts[0],
                    FStringPart::Field { conversion: Some('r'), spec: None, .. }
                ));
                assert!(matches!(&parts[1], FStringPart::Literal(s) if s == ": "));
                assert!(matches!(
                    &parts[2],
                    FStringPart::Field { spec: Some(s), .. } if s == ">8.2f"
                ));
                assert!(matches!(&parts[3], FStringPart::Literal(s) if s == " {literal}"));
            }
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fstring_field_with_comparison() {
        match expr("f'{a != b}'\n") {
            Expr::FString { parts, .. } => assert!(matches!(
                &parts[0],
                FStringPart::Field { expr: Expr::Compare { .. }, conversion: None, .. }
            )),
            other => panic!("Unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fstring_errors() {
        let err = compile("f'{}'\n", "<test>").unwrap_err();
        assert_eq!(err.message, "f-string: empty expression not allowed");
        let err = compile("f'a}'\n", "<test>").unwrap_err();
        assert_eq!(err.message, "f-string: single '}' is not allowed");
    }
}
