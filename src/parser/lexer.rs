//! Lexer (tokenizer) for the Python subset
//!
//! Converts raw source text into a flat [`Token`] stream consumed by the parser.
//! Indentation is turned into explicit [`TokenKind::Indent`] /
//! [`TokenKind::Dedent`] tokens and logical line ends into
//! [`TokenKind::Newline`], so the parser never looks at whitespace. Newlines
//! inside brackets and after a trailing backslash do not end a logical line.

use super::ast::SourceLocation;
use crate::interpreter::constants::INT_MAX_STR_DIGITS;
use num_bigint::BigInt;
use std::fmt;
use std::rc::Rc;

/// Width a tab advances the indentation column to (next multiple of 8)
const TAB_WIDTH: usize = 8;

/// All token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    /// Integer literal too large for `i64`
    BigInt(Rc<BigInt>),
    Float(f64),
    Str(String),
    /// f-string body with escapes processed and `{`/`}` left intact
    FString(String),

    // Identifiers
    Name(String),

    // Keywords
    False,
    None,
    True,
    And,
    As,
    Assert,
    Break,
    Continue,
    Def,
    Del,
    Elif,
    Else,
    Except,
    Finally,
    For,
    From,
    Global,
    If,
    Import,
    In,
    Is,
    Not,
    Or,
    Pass,
    Raise,
    Return,
    Try,
    While,
    /// Python keywords this subset does not implement (`class`, `lambda`, ...)
    Reserved(&'static str),

    // Operators
    Plus,        // +
    Minus,       // -
    Star,        // *
    DoubleStar,  // **
    Slash,       // /
    DoubleSlash, // //
    Percent,     // %
    Amp,         // &
    Pipe,        // |
    Caret,       // ^
    Tilde,       // ~
    LShift,      // <<
    RShift,      // >>
    Lt,          // <
    Gt,          // >
    Le,          // <=
    Ge,          // >=
    EqEq,        // ==
    NotEq,       // !=

    // Assignment
    Eq,            // =
    PlusEq,        // +=
    MinusEq,       // -=
    StarEq,        // *=
    SlashEq,       // /=
    DoubleSlashEq, // //=
    PercentEq,     // %=
    DoubleStarEq,  // **=

    // Punctuation
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Dot,       // .
    Arrow,     // ->

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{}", n),
            TokenKind::BigInt(n) => write!(f, "{}", n),
            TokenKind::Float(x) => write!(f, "{}", x),
            TokenKind::Str(_) | TokenKind::FString(_) => write!(f, "string literal"),
            TokenKind::Name(name) => write!(f, "'{}'", name),
            TokenKind::Reserved(word) => write!(f, "'{}'", word),
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Indent => write!(f, "indent"),
            TokenKind::Dedent => write!(f, "dedent"),
            TokenKind::Eof => write!(f, "end of file"),
            other => write!(f, "'{}'", other.spelling()),
        }
    }
}

impl TokenKind {
    fn spelling(&self) -> &'static str {
        match self {
            TokenKind::False => "False",
            TokenKind::None => "None",
            TokenKind::True => "True",
            TokenKind::And => "and",
            TokenKind::As => "as",
            TokenKind::Assert => "assert",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Def => "def",
            TokenKind::Del => "del",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::Except => "except",
            TokenKind::Finally => "finally",
            TokenKind::For => "for",
            TokenKind::From => "from",
            TokenKind::Global => "global",
            TokenKind::If => "if",
            TokenKind::Import => "import",
            TokenKind::In => "in",
            TokenKind::Is => "is",
            TokenKind::Not => "not",
            TokenKind::Or => "or",
            TokenKind::Pass => "pass",
            TokenKind::Raise => "raise",
            TokenKind::Return => "return",
            TokenKind::Try => "try",
            TokenKind::While => "while",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::DoubleStar => "**",
            TokenKind::Slash => "/",
            TokenKind::DoubleSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::LShift => "<<",
            TokenKind::RShift => ">>",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Le => "<=",
            TokenKind::Ge => ">=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Eq => "=",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::DoubleSlashEq => "//=",
            TokenKind::PercentEq => "%=",
            TokenKind::DoubleStarEq => "**=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Semicolon => ";",
            TokenKind::Dot => ".",
            TokenKind::Arrow => "->",
            _ => "?",
        }
    }
}

/// A token together with the location of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

/// Lexer error type
#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Lexer for Python-subset source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    indent_stack: Vec<usize>,
    /// Open brackets with the location they were opened at
    brackets: Vec<(char, SourceLocation)>,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            indent_stack: vec![0],
            brackets: Vec::new(),
            tokens: Vec::new(),
        }
    }

    /// Start line/column numbering at `location` instead of 1:1.
    ///
    /// Used for source fragments embedded in a larger file (f-string fields).
    pub(crate) fn starting_at(mut self, location: SourceLocation) -> Self {
        self.line = location.line;
        self.column = location.column;
        self
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut at_line_start = true;

        loop {
            if at_line_start && self.brackets.is_empty() {
                if !self.handle_indentation()? {
                    // Blank or comment-only line, already consumed
                    if self.is_at_end() {
                        break;
                    }
                    continue;
                }
                at_line_start = false;
            }

            self.skip_inline_whitespace();

            let Some(ch) = self.peek() else { break };

            match ch {
                '#' => self.skip_comment(),
                '\n' => {
                    let loc = self.current_location();
                    self.advance();
                    if self.brackets.is_empty() {
                        self.push(TokenKind::Newline, loc);
                        at_line_start = true;
                    }
                }
                '\\' if self.peek_ahead(1) == Some('\n')
                    || (self.peek_ahead(1) == Some('\r') && self.peek_ahead(2) == Some('\n')) =>
                {
                    // Explicit line continuation
                    self.advance();
                    if self.peek() == Some('\r') {
                        self.advance();
                    }
                    self.advance();
                }
                _ => {
                    let token = self.next_token()?;
                    self.tokens.push(token);
                }
            }
        }

        self.finish()
    }

    /// Emit the trailing NEWLINE/DEDENT/EOF tokens, or report an unclosed bracket
    fn finish(mut self) -> Result<Vec<Token>, LexError> {
        if let Some((open, location)) = self.brackets.first().copied() {
            return Err(LexError {
                message: format!("'{}' was never closed", open),
                location,
            });
        }

        let loc = self.current_location();
        let needs_newline = self.tokens.last().is_some_and(|t| {
            !matches!(
                t.kind,
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
            )
        });
        if needs_newline {
            self.push(TokenKind::Newline, loc);
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, loc);
        }
        self.push(TokenKind::Eof, loc);
        Ok(self.tokens)
    }

    /// Measure the indentation of a new logical line and emit INDENT/DEDENT.
    ///
    /// Returns `false` if the line was blank or comment-only (and has been
    /// consumed entirely).
    fn handle_indentation(&mut self) -> Result<bool, LexError> {
        let mut width = 0;
        while let Some(ch) = self.peek() {
            match ch {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => return Ok(false),
            Some('\n') | Some('\r') => {
                while let Some(ch) = self.peek() {
                    self.advance();
                    if ch == '\n' {
                        break;
                    }
                }
                return Ok(false);
            }
            Some('#') => {
                self.skip_comment();
                if self.peek() == Some('\n') {
                    self.advance();
                }
                return Ok(false);
            }
            _ => {}
        }

        let loc = self.current_location();
        let current = *self.indent_stack.last().unwrap_or(&0);

        if width > current {
            if self.tokens.is_empty() {
                return Err(LexError {
                    message: "unexpected indent".to_string(),
                    location: loc,
                });
            }
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, loc);
        } else if width < current {
            while self.indent_stack.last().is_some_and(|&w| w > width) {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, loc);
            }
            if self.indent_stack.last() != Some(&width) {
                return Err(LexError {
                    message: "unindent does not match any outer indentation level".to_string(),
                    location: loc,
                });
            }
        }

        Ok(true)
    }

    /// Get next token
    fn next_token(&mut self) -> Result<Token, LexError> {
        let loc = self.current_location();
        let ch = self.peek().ok_or_else(|| LexError {
            message: "unexpected EOF while parsing".to_string(),
            location: loc,
        })?;

        if ch.is_ascii_digit() || (ch == '.' && self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit())) {
            return self.number_literal(loc);
        }

        if ch == '"' || ch == '\'' {
            return self.string_literal(loc, false, false);
        }

        if ch.is_alphabetic() || ch == '_' {
            if let Some(token) = self.prefixed_string(loc)? {
                return Ok(token);
            }
            return Ok(self.identifier_or_keyword(loc));
        }

        self.advance();
        let kind = match ch {
            '+' => self.with_eq(TokenKind::Plus, TokenKind::PlusEq),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    self.with_eq(TokenKind::Minus, TokenKind::MinusEq)
                }
            }
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    self.with_eq(TokenKind::DoubleStar, TokenKind::DoubleStarEq)
                } else {
                    self.with_eq(TokenKind::Star, TokenKind::StarEq)
                }
            }
            '/' => {
                if self.peek() == Some('/') {
                    self.advance();
                    self.with_eq(TokenKind::DoubleSlash, TokenKind::DoubleSlashEq)
                } else {
                    self.with_eq(TokenKind::Slash, TokenKind::SlashEq)
                }
            }
            '%' => self.with_eq(TokenKind::Percent, TokenKind::PercentEq),
            '=' => self.with_eq(TokenKind::Eq, TokenKind::EqEq),
            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::NotEq
                } else {
                    return Err(LexError {
                        message: "invalid syntax".to_string(),
                        location: loc,
                    });
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    TokenKind::LShift
                } else {
                    self.with_eq(TokenKind::Lt, TokenKind::Le)
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::RShift
                } else {
                    self.with_eq(TokenKind::Gt, TokenKind::Ge)
                }
            }
            '&' => TokenKind::Amp,
            '|' => TokenKind::Pipe,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '(' | '[' | '{' => {
                self.brackets.push((ch, loc));
                match ch {
                    '(' => TokenKind::LParen,
                    '[' => TokenKind::LBracket,
                    _ => TokenKind::LBrace,
                }
            }
            ')' | ']' | '}' => {
                let expected = match ch {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, _)) => {
                        return Err(LexError {
                            message: format!(
                                "closing parenthesis '{}' does not match opening parenthesis '{}'",
                                ch, open
                            ),
                            location: loc,
                        });
                    }
                    None => {
                        return Err(LexError {
                            message: format!("unmatched '{}'", ch),
                            location: loc,
                        });
                    }
                }
                match ch {
                    ')' => TokenKind::RParen,
                    ']' => TokenKind::RBracket,
                    _ => TokenKind::RBrace,
                }
            }
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            _ => {
                return Err(LexError {
                    message: format!("invalid character '{}' (U+{:04X})", ch, ch as u32),
                    location: loc,
                });
            }
        };

        Ok(Token {
            kind,
            location: loc,
        })
    }

    /// Return `with_eq` if the next char is `=` (consuming it), else `plain`
    fn with_eq(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.peek() == Some('=') {
            self.advance();
            with_eq
        } else {
            plain
        }
    }

    /// Handle `r"..."`, `f"..."`, `rf"..."` and friends.
    ///
    /// Returns `None` when the identifier at the cursor is not a string prefix.
    fn prefixed_string(&mut self, loc: SourceLocation) -> Result<Option<Token>, LexError> {
        let mut prefix_len = 0;
        while prefix_len < 2
            && self
                .peek_ahead(prefix_len)
                .is_some_and(|c| matches!(c.to_ascii_lowercase(), 'r' | 'f' | 'b' | 'u'))
        {
            prefix_len += 1;
        }
        // Shrink until the char after the prefix is a quote
        while prefix_len > 0 && !matches!(self.peek_ahead(prefix_len), Some('"') | Some('\'')) {
            prefix_len -= 1;
        }
        if prefix_len == 0 {
            return Ok(None);
        }

        let prefix: String = (0..prefix_len)
            .filter_map(|i| self.peek_ahead(i))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if prefix.contains('b') {
            return Err(LexError {
                message: "bytes literals are not supported".to_string(),
                location: loc,
            });
        }
        if prefix.contains('u') && prefix.len() > 1 {
            return Err(LexError {
                message: "invalid syntax".to_string(),
                location: loc,
            });
        }

        for _ in 0..prefix_len {
            self.advance();
        }
        let raw = prefix.contains('r');
        let formatted = prefix.contains('f');
        self.string_literal(loc, raw, formatted).map(Some)
    }

    /// Parse a string literal starting at the opening quote
    fn string_literal(
        &mut self,
        loc: SourceLocation,
        raw: bool,
        formatted: bool,
    ) -> Result<Token, LexError> {
        let quote = self.advance().unwrap_or('"');
        let triple = self.peek() == Some(quote) && self.peek_ahead(1) == Some(quote);
        if triple {
            self.advance();
            self.advance();
        }

        let mut value = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(self.unterminated(loc, triple));
            };

            if ch == quote {
                if !triple {
                    self.advance();
                    break;
                }
                if self.peek_ahead(1) == Some(quote) && self.peek_ahead(2) == Some(quote) {
                    self.advance();
                    self.advance();
                    self.advance();
                    break;
                }
            }

            if ch == '\n' && !triple {
                return Err(self.unterminated(loc, triple));
            }

            if ch == '\\' {
                self.advance();
                let escaped = self.advance().ok_or_else(|| self.unterminated(loc, triple))?;
                if raw {
                    value.push('\\');
                    value.push(escaped);
                    continue;
                }
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\n' => {}
                    'x' => {
                        let hex: String = (0..2).filter_map(|_| self.advance()).collect();
                        let code = u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32);
                        match code {
                            Some(c) if hex.len() == 2 => value.push(c),
                            _ => {
                                return Err(LexError {
                                    message: "(unicode error) truncated \\xXX escape".to_string(),
                                    location: loc,
                                });
                            }
                        }
                    }
                    other => {
                        // Unknown escapes keep their backslash
                        value.push('\\');
                        value.push(other);
                    }
                }
                continue;
            }

            value.push(ch);
            self.advance();
        }

        let kind = if formatted {
            TokenKind::FString(value)
        } else {
            TokenKind::Str(value)
        };
        Ok(Token {
            kind,
            location: loc,
        })
    }

    fn unterminated(&self, loc: SourceLocation, triple: bool) -> LexError {
        let message = if triple {
            format!(
                "unterminated triple-quoted string literal (detected at line {})",
                self.line
            )
        } else {
            format!("unterminated string literal (detected at line {})", loc.line)
        };
        LexError {
            message,
            location: loc,
        }
    }

    /// Parse an integer or float literal
    fn number_literal(&mut self, loc: SourceLocation) -> Result<Token, LexError> {
        // Radix-prefixed integers
        if self.peek() == Some('0') {
            let radix = match self.peek_ahead(1).map(|c| c.to_ascii_lowercase()) {
                Some('x') => Some(16),
                Some('o') => Some(8),
                Some('b') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.advance();
                self.advance();
                let digits = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
                let kind = int_literal(&cleaned, radix).ok_or_else(|| LexError {
                    message: format!("invalid literal '{}'", digits),
                    location: loc,
                })?;
                return Ok(Token { kind, location: loc });
            }
        }

        let mut text = self.take_while(|c| c.is_ascii_digit() || c == '_');
        let mut is_float = false;

        if self.peek() == Some('.') && !self.peek_ahead(1).is_some_and(|c| c.is_alphabetic() && c != 'e' && c != 'E') {
            is_float = true;
            text.push('.');
            self.advance();
            text.push_str(&self.take_while(|c| c.is_ascii_digit() || c == '_'));
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign_offset = usize::from(matches!(self.peek_ahead(1), Some('+') | Some('-')));
            if self.peek_ahead(1 + sign_offset).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                text.push('e');
                self.advance();
                if sign_offset == 1 {
                    text.push(self.advance().unwrap_or('+'));
                }
                text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            }
        }

        if self.peek().is_some_and(|c| c.is_alphabetic() || c == '_') {
            return Err(LexError {
                message: "invalid decimal literal".to_string(),
                location: loc,
            });
        }

        let cleaned: String = text.chars().filter(|&c| c != '_').collect();
        let kind = if is_float {
            TokenKind::Float(cleaned.parse::<f64>().map_err(|_| LexError {
                message: format!("invalid float literal '{}'", text),
                location: loc,
            })?)
        } else {
            if cleaned.len() > INT_MAX_STR_DIGITS {
                return Err(LexError {
                    message: format!(
                        "Exceeds the limit ({} digits) for integer string conversion: value has {} digits; use sys.set_int_max_str_digits() to increase the limit - Consider hexadecimal for huge integer literals to avoid decimal conversion limits.",
                        INT_MAX_STR_DIGITS,
                        cleaned.len()
                    ),
                    location: loc,
                });
            }
            int_literal(&cleaned, 10).ok_or_else(|| LexError {
                message: format!("invalid decimal literal '{}'", text),
                location: loc,
            })?
        };

        Ok(Token {
            kind,
            location: loc,
        })
    }

    /// Parse identifier or keyword
    fn identifier_or_keyword(&mut self, loc: SourceLocation) -> Token {
        let ident = self.take_while(|c| c.is_alphanumeric() || c == '_');

        let kind = match ident.as_str() {
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            "True" => TokenKind::True,
            "and" => TokenKind::And,
            "as" => TokenKind::As,
            "assert" => TokenKind::Assert,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "def" => TokenKind::Def,
            "del" => TokenKind::Del,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "except" => TokenKind::Except,
            "finally" => TokenKind::Finally,
            "for" => TokenKind::For,
            "from" => TokenKind::From,
            "global" => TokenKind::Global,
            "if" => TokenKind::If,
            "import" => TokenKind::Import,
            "in" => TokenKind::In,
            "is" => TokenKind::Is,
            "not" => TokenKind::Not,
            "or" => TokenKind::Or,
            "pass" => TokenKind::Pass,
            "raise" => TokenKind::Raise,
            "return" => TokenKind::Return,
            "try" => TokenKind::Try,
            "while" => TokenKind::While,
            "class" => TokenKind::Reserved("class"),
            "lambda" => TokenKind::Reserved("lambda"),
            "nonlocal" => TokenKind::Reserved("nonlocal"),
            "with" => TokenKind::Reserved("with"),
            "yield" => TokenKind::Reserved("yield"),
            "async" => TokenKind::Reserved("async"),
            "await" => TokenKind::Reserved("await"),
            _ => TokenKind::Name(ident),
        };

        Token {
            kind,
            location: loc,
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if !pred(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        text
    }

    /// Skip spaces, tabs and carriage returns inside a line
    fn skip_inline_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\x0c') = self.peek() {
            self.advance();
        }
        // Inside brackets, newlines are plain whitespace
        if !self.brackets.is_empty() {
            while let Some(' ' | '\t' | '\r' | '\n' | '\x0c') = self.peek() {
                self.advance();
            }
        }
    }

    /// Skip a `#` comment up to (not including) the newline
    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn push(&mut self, kind: TokenKind, location: SourceLocation) {
        self.tokens.push(Token { kind, location });
    }

    /// Peek at current character without consuming
    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    /// Advance to next character
    fn advance(&mut self) -> Option<char> {
        let ch = *self.input.get(self.position)?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    /// Check if at end of input
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Get current source location
    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// An int token, promoted to [`TokenKind::BigInt`] when it overflows `i64`
fn int_literal(digits: &str, radix: u32) -> Option<TokenKind> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    match i64::from_str_radix(digits, radix) {
        Ok(n) => Some(TokenKind::Int(n)),
        Err(_) => BigInt::parse_bytes(digits.as_bytes(), radix).map(|n| TokenKind::BigInt(Rc::new(n))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_tokens() {
        let tokens = kinds("x = 1 + 2");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Name("x".to_string()),
                TokenKind::Eq,
                TokenKind::Int(1),
                TokenKind::Plus,
                TokenKind::Int(2),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = kinds("if x:\n    y = 1\nz = 2\n");
        assert!(tokens.contains(&TokenKind::Indent));
        let indent = tokens.iter().position(|t| *t == TokenKind::Indent).unwrap();
        let dedent = tokens.iter().position(|t| *t == TokenKind::Dedent).unwrap();
        assert!(indent < dedent);
        assert_eq!(tokens[dedent + 1], TokenKind::Name("z".to_string()));
    }

    #[test]
    fn test_dedents_flushed_at_eof() {
        let tokens = kinds("def f():\n    if x:\n        pass");
        let dedents = tokens.iter().filter(|t| **t == TokenKind::Dedent).count();
        assert_eq!(dedents, 2);
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_blank_and_comment_lines_ignored() {
        let tokens = kinds("x = 1\n\n   # comment\n\ny = 2  # trailing\n");
        let newlines = tokens.iter().filter(|t| **t == TokenKind::Newline).count();
        assert_eq!(newlines, 2);
        assert!(!tokens.contains(&TokenKind::Indent));
    }

    #[test]
    fn test_newlines_inside_brackets() {
        let tokens = kinds("xs = [1,\n      2,\n      3]\n");
        let newlines = tokens.iter().filter(|t| **t == TokenKind::Newline).count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("a ** b // c += d -> e != f <= g");
        assert!(tokens.contains(&TokenKind::DoubleStar));
        assert!(tokens.contains(&TokenKind::DoubleSlash));
        assert!(tokens.contains(&TokenKind::PlusEq));
        assert!(tokens.contains(&TokenKind::Arrow));
        assert!(tokens.contains(&TokenKind::NotEq));
        assert!(tokens.contains(&TokenKind::Le));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("0x1F")[0], TokenKind::Int(31));
        assert_eq!(kinds("1_000")[0], TokenKind::Int(1000));
        assert_eq!(
            kinds("9223372036854775808")[0],
            TokenKind::BigInt(Rc::new(BigInt::from(i64::MAX) + 1))
        );
        assert_eq!(kinds("0xffffffffffffffff")[0].to_string(), "18446744073709551615");
        assert_eq!(kinds("2.5")[0], TokenKind::Float(2.5));
        assert_eq!(kinds("1e3")[0], TokenKind::Float(1000.0));
        assert_eq!(kinds(".5")[0], TokenKind::Float(0.5));
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(kinds(r#""hello\nworld""#)[0], TokenKind::Str("hello\nworld".to_string()));
        assert_eq!(kinds(r"r'a\nb'")[0], TokenKind::Str("a\\nb".to_string()));
        assert_eq!(kinds("'''a\nb'''")[0], TokenKind::Str("a\nb".to_string()));
        assert_eq!(kinds("f'{x}!'")[0], TokenKind::FString("{x}!".to_string()));
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("x = 'abc\n").tokenize().unwrap_err();
        assert!(err.message.starts_with("unterminated string literal"));
        assert_eq!(err.location.line, 1);
    }

    #[test]
    fn test_unclosed_bracket() {
        let err = Lexer::new("print(1, 2\n").tokenize().unwrap_err();
        assert_eq!(err.message, "'(' was never closed");
    }

    #[test]
    fn test_bad_dedent() {
        let err = Lexer::new("if x:\n    y\n  z\n").tokenize().unwrap_err();
        assert_eq!(
            err.message,
            "unindent does not match any outer indentation level"
        );
    }
}
