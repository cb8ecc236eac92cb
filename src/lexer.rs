// ABOUTME: Indentation-sensitive lexer: source text to a token stream with
// explicit INDENT/DEDENT/NEWLINE tokens and structured f-string literals

use crate::error::LexError;
use crate::token::{keyword_kind, FStringPart, Literal, Token, TokenKind};

/// Tokenizes a complete source unit. The stream always ends with EOF, and
/// every INDENT is balanced by a DEDENT before it.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).scan()
}

/// A scanned string literal before token assembly: plain text or f-string
/// fragments. Adjacent literals merge into one.
enum Scanned {
    Plain(String),
    Formatted(Vec<FStringPart>),
}

struct Lexer {
    chars: Vec<char>,
    current: usize,
    line: u32,
    line_start: usize,
    tokens: Vec<Token>,
    indent_stack: Vec<usize>,
    bracket_depth: usize,
    at_line_start: bool,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            current: 0,
            line: 1,
            line_start: 0,
            tokens: Vec::new(),
            indent_stack: vec![0],
            bracket_depth: 0,
            at_line_start: true,
        }
    }

    fn scan(mut self) -> Result<Vec<Token>, LexError> {
        while !self.at_end() {
            if self.at_line_start && self.bracket_depth == 0 {
                self.handle_line_start()?;
                if self.at_end() {
                    break;
                }
            }
            self.scan_token()?;
        }

        // Close the final logical line, then unwind every open indent.
        if !self.at_line_start && !self.tokens.is_empty() {
            self.push_simple(TokenKind::Newline, "");
        }
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_simple(TokenKind::Dedent, "");
        }
        self.push_simple(TokenKind::Eof, "");
        Ok(self.tokens)
    }

    // ------------------------------------------------------------------
    // Indentation
    // ------------------------------------------------------------------

    /// Measures the new line's leading whitespace and emits INDENT/DEDENT
    /// tokens. Blank and comment-only lines are consumed without any
    /// indentation effect.
    fn handle_line_start(&mut self) -> Result<(), LexError> {
        loop {
            let mut width = 0usize;
            let mut saw_space = false;
            let mut saw_tab = false;
            loop {
                match self.peek() {
                    Some(' ') => {
                        saw_space = true;
                        width += 1;
                        self.advance();
                    }
                    Some('\t') => {
                        saw_tab = true;
                        width += 8 - width % 8;
                        self.advance();
                    }
                    Some('\r') => {
                        self.advance();
                    }
                    _ => break,
                }
            }
            if saw_space && saw_tab {
                return Err(self.error("inconsistent use of tabs and spaces in indentation"));
            }

            match self.peek() {
                // Blank line: no tokens, no indentation change.
                Some('\n') => {
                    self.consume_newline();
                    continue;
                }
                // Comment-only line.
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    if self.peek() == Some('\n') {
                        self.consume_newline();
                    }
                    continue;
                }
                None => return Ok(()),
                _ => {}
            }

            let top = *self.indent_stack.last().unwrap();
            if width > top {
                self.indent_stack.push(width);
                self.push_simple(TokenKind::Indent, "");
            } else if width < top {
                while *self.indent_stack.last().unwrap() > width {
                    self.indent_stack.pop();
                    self.push_simple(TokenKind::Dedent, "");
                }
                if *self.indent_stack.last().unwrap() != width {
                    return Err(
                        self.error("unindent does not match any outer indentation level")
                    );
                }
            }
            self.at_line_start = false;
            return Ok(());
        }
    }

    // ------------------------------------------------------------------
    // Token scanning
    // ------------------------------------------------------------------

    fn scan_token(&mut self) -> Result<(), LexError> {
        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(()),
        };

        match c {
            ' ' | '\t' | '\r' => {
                self.advance();
            }
            '\\' => {
                // Explicit line join.
                self.advance();
                if self.peek() == Some('\r') {
                    self.advance();
                }
                if self.peek() == Some('\n') {
                    self.consume_newline();
                } else {
                    return Err(self.error("unexpected character after line continuation"));
                }
            }
            '\n' => {
                if self.bracket_depth > 0 {
                    self.consume_newline();
                } else {
                    let (line, col) = (self.line, self.column());
                    self.consume_newline();
                    self.tokens
                        .push(Token::new(TokenKind::Newline, "", line, col));
                    self.at_line_start = true;
                }
            }
            '#' => {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            }
            '\'' | '"' => self.scan_string_token(false)?,
            'f' | 'F' if matches!(self.peek_at(1), Some('\'') | Some('"')) => {
                self.scan_string_token(true)?
            }
            c if c.is_ascii_digit() => self.scan_number()?,
            '.' if matches!(self.peek_at(1), Some(d) if d.is_ascii_digit()) => {
                self.scan_number()?
            }
            c if c.is_alphabetic() || c == '_' => self.scan_identifier(),
            _ => self.scan_operator()?,
        }
        Ok(())
    }

    fn scan_identifier(&mut self) {
        let start = self.current;
        let (line, col) = (self.line, self.column());
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.current].iter().collect();
        let kind = keyword_kind(&text).unwrap_or(TokenKind::Identifier);
        self.tokens.push(Token::new(kind, text, line, col));
    }

    fn scan_operator(&mut self) -> Result<(), LexError> {
        let (line, col) = (self.line, self.column());
        let c = self.advance().unwrap();

        // Single-character structural tokens first.
        let simple = match c {
            '(' | '[' | '{' => {
                self.bracket_depth += 1;
                Some(match c {
                    '(' => TokenKind::LeftParen,
                    '[' => TokenKind::LeftBracket,
                    _ => TokenKind::LeftBrace,
                })
            }
            ')' | ']' | '}' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                Some(match c {
                    ')' => TokenKind::RightParen,
                    ']' => TokenKind::RightBracket,
                    _ => TokenKind::RightBrace,
                })
            }
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            ';' => Some(TokenKind::Semicolon),
            '.' => Some(TokenKind::Dot),
            '~' => Some(TokenKind::Tilde),
            _ => None,
        };
        if let Some(kind) = simple {
            self.tokens.push(Token::new(kind, c.to_string(), line, col));
            return Ok(());
        }

        // Multi-character operators, longest match first.
        let (kind, lexeme) = match c {
            '+' => self.pick('=', TokenKind::PlusEqual, TokenKind::Plus, "+"),
            '-' => self.pick('=', TokenKind::MinusEqual, TokenKind::Minus, "-"),
            '%' => self.pick('=', TokenKind::PercentEqual, TokenKind::Percent, "%"),
            '&' => self.pick('=', TokenKind::AmpersandEqual, TokenKind::Ampersand, "&"),
            '|' => self.pick('=', TokenKind::PipeEqual, TokenKind::Pipe, "|"),
            '^' => self.pick('=', TokenKind::CaretEqual, TokenKind::Caret, "^"),
            '=' => self.pick('=', TokenKind::EqualEqual, TokenKind::Equal, "="),
            '!' => {
                if self.match_char('=') {
                    (TokenKind::BangEqual, "!=".to_string())
                } else {
                    return Err(LexError::new("unexpected character '!'", line, col));
                }
            }
            '*' => {
                if self.match_char('*') {
                    self.pick('=', TokenKind::StarStarEqual, TokenKind::StarStar, "**")
                } else {
                    self.pick('=', TokenKind::StarEqual, TokenKind::Star, "*")
                }
            }
            '/' => {
                if self.match_char('/') {
                    self.pick('=', TokenKind::SlashSlashEqual, TokenKind::SlashSlash, "//")
                } else {
                    self.pick('=', TokenKind::SlashEqual, TokenKind::Slash, "/")
                }
            }
            '<' => {
                if self.match_char('<') {
                    self.pick('=', TokenKind::LessLessEqual, TokenKind::LessLess, "<<")
                } else {
                    self.pick('=', TokenKind::LessEqual, TokenKind::Less, "<")
                }
            }
            '>' => {
                if self.match_char('>') {
                    self.pick(
                        '=',
                        TokenKind::GreaterGreaterEqual,
                        TokenKind::GreaterGreater,
                        ">>",
                    )
                } else {
                    self.pick('=', TokenKind::GreaterEqual, TokenKind::Greater, ">")
                }
            }
            other => {
                return Err(LexError::new(
                    format!("unexpected character '{}'", other),
                    line,
                    col,
                ))
            }
        };
        self.tokens.push(Token::new(kind, lexeme, line, col));
        Ok(())
    }

    /// Consumes `next` if present, returning the matched or fallback kind
    /// with its lexeme.
    fn pick(
        &mut self,
        next: char,
        matched: TokenKind,
        fallback: TokenKind,
        base: &str,
    ) -> (TokenKind, String) {
        if self.match_char(next) {
            (matched, format!("{}{}", base, next))
        } else {
            (fallback, base.to_string())
        }
    }

    // ------------------------------------------------------------------
    // Numbers
    // ------------------------------------------------------------------

    fn scan_number(&mut self) -> Result<(), LexError> {
        let start = self.current;
        let (line, col) = (self.line, self.column());

        // Radix prefixes: 0x / 0b / 0o.
        if self.peek() == Some('0') {
            if let Some(prefix) = self.peek_at(1) {
                let radix = match prefix {
                    'x' | 'X' => Some(16),
                    'b' | 'B' => Some(2),
                    'o' | 'O' => Some(8),
                    _ => None,
                };
                if let Some(radix) = radix {
                    self.advance();
                    self.advance();
                    let digits_start = self.current;
                    while let Some(c) = self.peek() {
                        if c.is_digit(radix) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                    if self.current == digits_start {
                        return Err(LexError::new(
                            "missing digits after numeric prefix",
                            line,
                            col,
                        ));
                    }
                    self.reject_trailing_junk(line, col)?;
                    let digits: String = self.chars[digits_start..self.current].iter().collect();
                    let value = i64::from_str_radix(&digits, radix)
                        .map_err(|_| LexError::new("integer literal too large", line, col))?;
                    let lexeme: String = self.chars[start..self.current].iter().collect();
                    self.tokens.push(Token::with_literal(
                        TokenKind::Int,
                        lexeme,
                        Literal::Int(value),
                        line,
                        col,
                    ));
                    return Ok(());
                }
            }
        }

        let mut is_float = false;
        let mut int_part = String::new();
        let mut frac_part = String::new();
        let mut exponent = String::new();

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                int_part.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    frac_part.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if self.peek() == Some('.') {
                return Err(LexError::new(
                    "invalid numeric literal: adjacent dots",
                    line,
                    col,
                ));
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            exponent.push('e');
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                exponent.push(self.advance().unwrap());
            }
            let digits_start = self.current;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    exponent.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if self.current == digits_start {
                return Err(LexError::new(
                    "invalid float literal: missing exponent digits",
                    line,
                    col,
                ));
            }
        }
        self.reject_trailing_junk(line, col)?;

        let lexeme: String = self.chars[start..self.current].iter().collect();
        if is_float {
            let normalized = format!(
                "{}.{}{}",
                if int_part.is_empty() { "0" } else { &int_part },
                if frac_part.is_empty() { "0" } else { &frac_part },
                exponent
            );
            let value: f64 = normalized
                .parse()
                .map_err(|_| LexError::new("invalid float literal", line, col))?;
            self.tokens.push(Token::with_literal(
                TokenKind::Float,
                lexeme,
                Literal::Float(value),
                line,
                col,
            ));
        } else {
            let value: i64 = int_part
                .parse()
                .map_err(|_| LexError::new("integer literal too large", line, col))?;
            self.tokens.push(Token::with_literal(
                TokenKind::Int,
                lexeme,
                Literal::Int(value),
                line,
                col,
            ));
        }
        Ok(())
    }

    /// A numeric literal must not run straight into identifier characters
    /// (`0b12`, `0xfg`, `12abc`).
    fn reject_trailing_junk(&self, line: u32, col: u32) -> Result<(), LexError> {
        if let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                return Err(LexError::new("invalid numeric literal", line, col));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Strings and f-strings
    // ------------------------------------------------------------------

    /// Scans one string literal (plus any adjacent literals, which
    /// concatenate) and pushes the resulting Str or FString token.
    fn scan_string_token(&mut self, formatted: bool) -> Result<(), LexError> {
        let start = self.current;
        let (line, col) = (self.line, self.column());
        let mut merged = self.scan_string_literal(formatted)?;

        // Implicit adjacent concatenation: "a" "b" is one token.
        loop {
            let mark = self.current;
            while matches!(self.peek(), Some(' ') | Some('\t') | Some('\r')) {
                self.advance();
            }
            let next_formatted = match self.peek() {
                Some('\'') | Some('"') => false,
                Some('f') | Some('F')
                    if matches!(self.peek_at(1), Some('\'') | Some('"')) =>
                {
                    true
                }
                _ => {
                    self.current = mark;
                    break;
                }
            };
            let next = self.scan_string_literal(next_formatted)?;
            merged = merge_scanned(merged, next);
        }

        let lexeme: String = self.chars[start..self.current].iter().collect();
        let token = match merged {
            Scanned::Plain(text) => {
                Token::with_literal(TokenKind::Str, lexeme, Literal::Str(text), line, col)
            }
            Scanned::Formatted(parts) => Token::with_literal(
                TokenKind::FString,
                lexeme,
                Literal::FString(parts),
                line,
                col,
            ),
        };
        self.tokens.push(token);
        Ok(())
    }

    fn scan_string_literal(&mut self, formatted: bool) -> Result<Scanned, LexError> {
        if formatted {
            self.advance(); // the f/F prefix
        }
        let (line, col) = (self.line, self.column());
        let quote = self.advance().unwrap();
        let triple =
            self.peek() == Some(quote) && self.peek_at(1) == Some(quote) && {
                self.advance();
                self.advance();
                true
            };

        let body_line = self.line;
        let body_col = self.column();
        let mut raw = String::new();

        if triple {
            // Raw span: no escape processing, newlines preserved.
            loop {
                match self.peek() {
                    None => {
                        return Err(LexError::new("unterminated string literal", line, col))
                    }
                    Some(c) if c == quote
                        && self.peek_at(1) == Some(quote)
                        && self.peek_at(2) == Some(quote) =>
                    {
                        self.advance();
                        self.advance();
                        self.advance();
                        break;
                    }
                    Some('\n') => {
                        raw.push('\n');
                        self.consume_newline();
                    }
                    Some(c) => {
                        raw.push(c);
                        self.advance();
                    }
                }
            }
            return if formatted {
                self.parse_fstring_body(&raw, body_line, body_col, false)
            } else {
                Ok(Scanned::Plain(raw))
            };
        }

        // Single-line literal: collect raw text, keeping escape pairs
        // intact so f-string brace scanning sees them.
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(LexError::new("unterminated string literal", line, col))
                }
                Some('\\') => {
                    raw.push('\\');
                    self.advance();
                    match self.peek() {
                        None => {
                            return Err(LexError::new("unterminated string literal", line, col))
                        }
                        Some('\n') => {
                            raw.push('\n');
                            self.consume_newline();
                        }
                        Some(c) => {
                            raw.push(c);
                            self.advance();
                        }
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    raw.push(c);
                    self.advance();
                }
            }
        }

        if formatted {
            self.parse_fstring_body(&raw, body_line, body_col, true)
        } else {
            Ok(Scanned::Plain(self.process_escapes(
                &raw, body_line, body_col,
            )?))
        }
    }

    fn process_escapes(&self, raw: &str, line: u32, col: u32) -> Result<String, LexError> {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().enumerate().peekable();
        while let Some((offset, c)) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, '0')) => out.push('\0'),
                Some((_, 'b')) => out.push('\u{8}'),
                Some((_, 'f')) => out.push('\u{c}'),
                Some((_, 'v')) => out.push('\u{b}'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, '\'')) => out.push('\''),
                Some((_, '"')) => out.push('"'),
                Some((_, '\n')) => {} // escaped newline joins
                Some((_, other)) => {
                    return Err(LexError::new(
                        format!("invalid escape sequence '\\{}'", other),
                        line,
                        col + offset as u32,
                    ))
                }
                None => return Err(LexError::new("unterminated string literal", line, col)),
            }
        }
        Ok(out)
    }

    /// Splits an f-string body into literal and `{expr[:spec]}` fragments.
    /// Expression text is kept as source; the parser tokenizes it
    /// recursively. Braces inside the expression must balance; quotes in
    /// the expression shield braces and colons.
    fn parse_fstring_body(
        &self,
        raw: &str,
        line: u32,
        col: u32,
        escapes: bool,
    ) -> Result<Scanned, LexError> {
        let chars: Vec<char> = raw.chars().collect();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut i = 0usize;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '{' if chars.get(i + 1) == Some(&'{') => {
                    literal.push('{');
                    i += 2;
                }
                '}' if chars.get(i + 1) == Some(&'}') => {
                    literal.push('}');
                    i += 2;
                }
                '}' => {
                    return Err(LexError::new(
                        "single '}' is not allowed in f-string",
                        line,
                        col + i as u32,
                    ))
                }
                '{' => {
                    if !literal.is_empty() {
                        let text = if escapes {
                            self.process_escapes(&literal, line, col)?
                        } else {
                            literal.clone()
                        };
                        parts.push(FStringPart::Literal(text));
                        literal.clear();
                    }
                    let expr_col = col + i as u32 + 1;
                    i += 1;
                    let mut depth = 0usize;
                    let mut in_quote: Option<char> = None;
                    let mut source = String::new();
                    let mut spec: Option<String> = None;
                    loop {
                        let Some(&c) = chars.get(i) else {
                            return Err(LexError::new(
                                "unterminated expression in f-string",
                                line,
                                expr_col,
                            ));
                        };
                        match in_quote {
                            Some(q) => {
                                source.push(c);
                                if c == q {
                                    in_quote = None;
                                }
                                i += 1;
                            }
                            None => match c {
                                '\'' | '"' => {
                                    in_quote = Some(c);
                                    source.push(c);
                                    i += 1;
                                }
                                '(' | '[' | '{' => {
                                    depth += 1;
                                    source.push(c);
                                    i += 1;
                                }
                                ')' | ']' => {
                                    depth = depth.saturating_sub(1);
                                    source.push(c);
                                    i += 1;
                                }
                                '}' if depth == 0 => {
                                    i += 1;
                                    break;
                                }
                                '}' => {
                                    depth -= 1;
                                    source.push(c);
                                    i += 1;
                                }
                                ':' if depth == 0 => {
                                    // Format specifier runs to the brace.
                                    i += 1;
                                    let mut s = String::new();
                                    loop {
                                        let Some(&c) = chars.get(i) else {
                                            return Err(LexError::new(
                                                "unterminated expression in f-string",
                                                line,
                                                expr_col,
                                            ));
                                        };
                                        if c == '}' {
                                            i += 1;
                                            break;
                                        }
                                        s.push(c);
                                        i += 1;
                                    }
                                    spec = Some(s);
                                    break;
                                }
                                c => {
                                    source.push(c);
                                    i += 1;
                                }
                            },
                        }
                    }
                    if source.trim().is_empty() {
                        return Err(LexError::new(
                            "empty expression in f-string",
                            line,
                            expr_col,
                        ));
                    }
                    parts.push(FStringPart::Expr {
                        source,
                        format_spec: spec,
                        line,
                        column: expr_col,
                    });
                }
                c => {
                    literal.push(c);
                    i += 1;
                }
            }
        }
        if !literal.is_empty() {
            let text = if escapes {
                self.process_escapes(&literal, line, col)?
            } else {
                literal
            };
            parts.push(FStringPart::Literal(text));
        }
        Ok(Scanned::Formatted(parts))
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.current + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.current += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn consume_newline(&mut self) {
        debug_assert_eq!(self.peek(), Some('\n'));
        self.current += 1;
        self.line += 1;
        self.line_start = self.current;
    }

    fn column(&self) -> u32 {
        (self.current - self.line_start + 1) as u32
    }

    fn error(&self, message: &str) -> LexError {
        LexError::new(message, self.line, self.column())
    }

    fn push_simple(&mut self, kind: TokenKind, lexeme: &str) {
        let (line, col) = (self.line, self.column());
        self.tokens.push(Token::new(kind, lexeme, line, col));
    }
}

fn merge_scanned(left: Scanned, right: Scanned) -> Scanned {
    match (left, right) {
        (Scanned::Plain(mut a), Scanned::Plain(b)) => {
            a.push_str(&b);
            Scanned::Plain(a)
        }
        (left, right) => {
            let mut parts = into_parts(left);
            parts.extend(into_parts(right));
            Scanned::Formatted(parts)
        }
    }
}

fn into_parts(scanned: Scanned) -> Vec<FStringPart> {
    match scanned {
        Scanned::Plain(text) if text.is_empty() => Vec::new(),
        Scanned::Plain(text) => vec![FStringPart::Literal(text)],
        Scanned::Formatted(parts) => parts,
    }
}
