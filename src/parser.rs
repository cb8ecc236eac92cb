// ABOUTME: Recursive-descent parser: token stream to statement list, with
// synchronize-based error recovery so one bad line does not hide the rest

use crate::ast::{
    CmpOp, CompClause, ComprehensionKind, ExceptHandler, Expr, FStringPiece, FunctionDecl,
    LiteralValue, Param, ParamKind, Stmt,
};
use crate::error::SyntaxError;
use crate::lexer::tokenize;
use crate::token::{FStringPart, Literal, Token, TokenKind};
use std::rc::Rc;

type ParseResult<T> = Result<T, SyntaxError>;

/// Parses a token stream into statements. Syntax errors are collected, not
/// fatal: the parser synchronizes and keeps going so every error in the
/// unit is reported in one pass.
pub fn parse(tokens: Vec<Token>) -> (Vec<Stmt>, Vec<SyntaxError>) {
    let mut parser = Parser {
        tokens,
        current: 0,
        errors: Vec::new(),
    };
    let statements = parser.program();
    (statements, parser.errors)
}

struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<SyntaxError>,
}

impl Parser {
    fn program(&mut self) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::Eof) {
            if self.match_kind(TokenKind::Newline) {
                continue;
            }
            match self.statement_line() {
                Ok(stmts) => statements.extend(stmts),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        statements
    }

    /// One source line's worth of statements: a single compound statement,
    /// or one or more `;`-separated simple statements.
    fn statement_line(&mut self) -> ParseResult<Vec<Stmt>> {
        if self.is_compound_header() {
            return Ok(vec![self.compound_statement()?]);
        }
        let mut stmts = vec![self.simple_statement()?];
        while self.match_kind(TokenKind::Semicolon) {
            if self.check(TokenKind::Newline) || self.check(TokenKind::Eof) {
                break;
            }
            stmts.push(self.simple_statement()?);
        }
        self.end_of_line()?;
        Ok(stmts)
    }

    fn is_compound_header(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Def
                | TokenKind::Class
                | TokenKind::Try
        )
    }

    fn compound_statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Def => self.function_definition().map(|decl| Stmt::FunctionDef { decl }),
            TokenKind::Class => self.class_definition(),
            TokenKind::Try => self.try_statement(),
            _ => unreachable!("checked by is_compound_header"),
        }
    }

    fn simple_statement(&mut self) -> ParseResult<Stmt> {
        match self.peek().kind {
            TokenKind::Return => {
                let token = self.advance().clone();
                let value = if self.check(TokenKind::Newline)
                    || self.check(TokenKind::Semicolon)
                    || self.check(TokenKind::Eof)
                {
                    None
                } else {
                    Some(self.tuple_expression()?)
                };
                Ok(Stmt::Return { token, value })
            }
            TokenKind::Pass => {
                self.advance();
                Ok(Stmt::Pass)
            }
            TokenKind::Break => {
                let token = self.advance().clone();
                Ok(Stmt::Break { token })
            }
            TokenKind::Continue => {
                let token = self.advance().clone();
                Ok(Stmt::Continue { token })
            }
            TokenKind::Global => {
                self.advance();
                Ok(Stmt::Global {
                    names: self.name_list()?,
                })
            }
            TokenKind::Nonlocal => {
                self.advance();
                Ok(Stmt::Nonlocal {
                    names: self.name_list()?,
                })
            }
            TokenKind::Raise => {
                let token = self.advance().clone();
                let exception = self.expression()?;
                Ok(Stmt::Raise { token, exception })
            }
            _ => {
                let expr = self.tuple_expression()?;
                Ok(Stmt::Expression { expr })
            }
        }
    }

    fn name_list(&mut self) -> ParseResult<Vec<Token>> {
        let mut names = vec![self.consume(TokenKind::Identifier, "expected name")?.clone()];
        while self.match_kind(TokenKind::Comma) {
            names.push(self.consume(TokenKind::Identifier, "expected name")?.clone());
        }
        Ok(names)
    }

    // ------------------------------------------------------------------
    // Compound statements
    // ------------------------------------------------------------------

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.advance(); // if
        let mut branches = Vec::new();
        let condition = self.expression()?;
        branches.push((condition, self.suite()?));
        let mut else_branch = None;
        loop {
            if self.check(TokenKind::Elif) {
                self.advance();
                let condition = self.expression()?;
                branches.push((condition, self.suite()?));
            } else if self.check(TokenKind::Else) {
                self.advance();
                else_branch = Some(self.suite()?);
                break;
            } else {
                break;
            }
        }
        Ok(Stmt::If {
            branches,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let token = self.advance().clone(); // while
        let condition = self.expression()?;
        let body = self.suite()?;
        Ok(Stmt::While {
            token,
            condition,
            body,
        })
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let token = self.advance().clone(); // for
        let targets = self.name_list()?;
        self.consume(TokenKind::In, "expected 'in' after for loop variables")?;
        let iterable = self.tuple_expression()?;
        let body = self.suite()?;
        Ok(Stmt::For {
            token,
            targets,
            iterable,
            body,
        })
    }

    fn function_definition(&mut self) -> ParseResult<Rc<FunctionDecl>> {
        self.advance(); // def
        let name = self
            .consume(TokenKind::Identifier, "expected function name")?
            .clone();
        self.consume(TokenKind::LeftParen, "expected '(' after function name")?;
        let params = self.parameter_list(TokenKind::RightParen)?;
        self.consume(TokenKind::RightParen, "expected ')' after parameters")?;
        let body = self.suite()?;
        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    /// Parses parameters up to (not including) `terminator`: plain names,
    /// defaulted names, `*args`, `**kwargs`, in that order.
    fn parameter_list(&mut self, terminator: TokenKind) -> ParseResult<Vec<Param>> {
        let mut params: Vec<Param> = Vec::new();
        let mut seen_default = false;
        let mut seen_varargs = false;
        let mut seen_kwargs = false;
        while !self.check(terminator) {
            if seen_kwargs {
                return Err(self.error_here("no parameters allowed after **kwargs"));
            }
            if self.match_kind(TokenKind::StarStar) {
                let name = self
                    .consume(TokenKind::Identifier, "expected parameter name after '**'")?
                    .clone();
                params.push(Param {
                    name,
                    kind: ParamKind::KwArgs,
                    default: None,
                });
                seen_kwargs = true;
            } else if self.match_kind(TokenKind::Star) {
                if seen_varargs {
                    return Err(self.error_here("only one *args parameter is allowed"));
                }
                let name = self
                    .consume(TokenKind::Identifier, "expected parameter name after '*'")?
                    .clone();
                params.push(Param {
                    name,
                    kind: ParamKind::VarArgs,
                    default: None,
                });
                seen_varargs = true;
            } else {
                let name = self
                    .consume(TokenKind::Identifier, "expected parameter name")?
                    .clone();
                let default = if self.match_kind(TokenKind::Equal) {
                    seen_default = true;
                    Some(self.expression()?)
                } else {
                    if seen_default && !seen_varargs {
                        return Err(SyntaxError::at(
                            &name,
                            "non-default argument follows default argument",
                        ));
                    }
                    None
                };
                if seen_varargs && default.is_some() {
                    return Err(SyntaxError::at(
                        &name,
                        "parameters after *args cannot have defaults",
                    ));
                }
                params.push(Param {
                    name,
                    kind: ParamKind::Plain,
                    default,
                });
            }
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn class_definition(&mut self) -> ParseResult<Stmt> {
        self.advance(); // class
        let name = self
            .consume(TokenKind::Identifier, "expected class name")?
            .clone();
        let superclass = if self.match_kind(TokenKind::LeftParen) {
            let sup = if self.check(TokenKind::RightParen) {
                None
            } else {
                let sup_name = self
                    .consume(TokenKind::Identifier, "expected superclass name")?
                    .clone();
                Some(Expr::Variable { name: sup_name })
            };
            self.consume(TokenKind::RightParen, "expected ')' after superclass")?;
            sup
        } else {
            None
        };
        let body = self.suite()?;

        let mut methods = Vec::new();
        for stmt in body {
            match stmt {
                Stmt::FunctionDef { decl } => methods.push(decl),
                Stmt::Pass => {}
                _ => {
                    self.errors.push(SyntaxError::at(
                        &name,
                        "only method definitions are allowed in a class body",
                    ));
                }
            }
        }
        Ok(Stmt::ClassDef {
            name,
            superclass,
            methods,
        })
    }

    fn try_statement(&mut self) -> ParseResult<Stmt> {
        let try_token = self.advance().clone(); // try
        self.suite_colon_guard(&try_token)?;
        let body = self.suite()?;

        let mut handlers = Vec::new();
        while self.check(TokenKind::Except) {
            let token = self.advance().clone();
            let (class, binding) = if self.check(TokenKind::Colon) {
                (None, None)
            } else {
                let class = self.expression()?;
                let binding = if self.match_kind(TokenKind::As) {
                    Some(
                        self.consume(TokenKind::Identifier, "expected name after 'as'")?
                            .clone(),
                    )
                } else {
                    None
                };
                (Some(class), binding)
            };
            let body = self.suite()?;
            handlers.push(ExceptHandler {
                token,
                class,
                binding,
                body,
            });
        }

        let else_branch = if self.check(TokenKind::Else) {
            self.advance();
            Some(self.suite()?)
        } else {
            None
        };
        let finally = if self.check(TokenKind::Finally) {
            self.advance();
            Some(self.suite()?)
        } else {
            None
        };

        if handlers.is_empty() && finally.is_none() {
            return Err(SyntaxError::at(
                &try_token,
                "expected 'except' or 'finally' block",
            ));
        }
        if else_branch.is_some() && handlers.is_empty() {
            return Err(SyntaxError::at(
                &try_token,
                "try/else requires at least one except block",
            ));
        }
        Ok(Stmt::Try {
            body,
            handlers,
            else_branch,
            finally,
        })
    }

    /// try's suite starts with ':' like every other header; this check
    /// exists only to report the error against the try token.
    fn suite_colon_guard(&mut self, token: &Token) -> ParseResult<()> {
        if !self.check(TokenKind::Colon) {
            return Err(SyntaxError::at(token, "expected ':' after 'try'"));
        }
        Ok(())
    }

    /// Parses the suite after a compound-statement header: either an
    /// indented block on the following lines or simple statements on the
    /// same line.
    fn suite(&mut self) -> ParseResult<Vec<Stmt>> {
        self.consume(TokenKind::Colon, "expected ':'")?;
        if self.match_kind(TokenKind::Newline) {
            self.consume(TokenKind::Indent, "expected an indented block")?;
            let mut statements = Vec::new();
            while !self.check(TokenKind::Dedent) && !self.check(TokenKind::Eof) {
                if self.match_kind(TokenKind::Newline) {
                    continue;
                }
                match self.statement_line() {
                    Ok(stmts) => statements.extend(stmts),
                    Err(err) => {
                        self.errors.push(err);
                        self.synchronize();
                    }
                }
            }
            self.consume(TokenKind::Dedent, "expected dedent to close block")?;
            Ok(statements)
        } else {
            // Single-line suite: one or more simple statements.
            let mut statements = vec![self.simple_statement()?];
            while self.match_kind(TokenKind::Semicolon) {
                if self.check(TokenKind::Newline) || self.check(TokenKind::Eof) {
                    break;
                }
                statements.push(self.simple_statement()?);
            }
            self.end_of_line()?;
            Ok(statements)
        }
    }

    fn end_of_line(&mut self) -> ParseResult<()> {
        if self.match_kind(TokenKind::Newline) || self.check(TokenKind::Eof) {
            return Ok(());
        }
        Err(self.error_here("expected end of line"))
    }

    // ------------------------------------------------------------------
    // Expressions, precedence top-down
    // ------------------------------------------------------------------

    /// An expression list: `a, b, c` builds a tuple, a lone expression
    /// stays itself.
    fn tuple_expression(&mut self) -> ParseResult<Expr> {
        let first = self.expression()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let token = self.peek().clone();
        let mut elements = vec![first];
        while self.match_kind(TokenKind::Comma) {
            if self.starts_expression() {
                elements.push(self.expression()?);
            } else {
                break; // trailing comma
            }
        }
        Ok(Expr::TupleLiteral { elements, token })
    }

    fn starts_expression(&self) -> bool {
        !matches!(
            self.peek().kind,
            TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::Eof
                | TokenKind::RightParen
                | TokenKind::RightBracket
                | TokenKind::RightBrace
                | TokenKind::Colon
                | TokenKind::Equal
        )
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::Lambda) {
            return self.lambda();
        }
        let expr = self.or_test()?;

        if self.match_kind(TokenKind::Equal) {
            let value = Box::new(self.assignment_value()?);
            return match expr {
                Expr::Variable { name } => Ok(Expr::Assign { name, value }),
                Expr::IndexGet {
                    object,
                    index,
                    token,
                } => Ok(Expr::IndexSet {
                    object,
                    index,
                    value,
                    token,
                }),
                Expr::AttrGet { object, name } => Ok(Expr::AttrSet {
                    object,
                    name,
                    value,
                }),
                Expr::Slice { token, .. } => {
                    Err(SyntaxError::at(&token, "cannot assign to slice"))
                }
                other => Err(SyntaxError::at(
                    other.token(),
                    "invalid assignment target",
                )),
            };
        }

        if let Some(op) = self.match_augmented() {
            let value = Box::new(self.expression()?);
            return match &expr {
                Expr::Variable { .. } | Expr::IndexGet { .. } | Expr::AttrGet { .. } => {
                    Ok(Expr::AugAssign {
                        target: Box::new(expr),
                        op,
                        value,
                    })
                }
                other => Err(SyntaxError::at(
                    other.token(),
                    "invalid augmented assignment target",
                )),
            };
        }

        Ok(expr)
    }

    /// The right-hand side of `=`: either a nested assignment (chained
    /// `a = b = 1`) or a tuple expression.
    fn assignment_value(&mut self) -> ParseResult<Expr> {
        let value = self.expression()?;
        if matches!(value, Expr::Assign { .. } | Expr::AugAssign { .. }) {
            return Ok(value);
        }
        if !self.check(TokenKind::Comma) {
            return Ok(value);
        }
        let token = self.peek().clone();
        let mut elements = vec![value];
        while self.match_kind(TokenKind::Comma) {
            if self.starts_expression() {
                elements.push(self.expression()?);
            } else {
                break;
            }
        }
        Ok(Expr::TupleLiteral { elements, token })
    }

    fn match_augmented(&mut self) -> Option<Token> {
        let kinds = [
            TokenKind::PlusEqual,
            TokenKind::MinusEqual,
            TokenKind::StarEqual,
            TokenKind::StarStarEqual,
            TokenKind::SlashEqual,
            TokenKind::SlashSlashEqual,
            TokenKind::PercentEqual,
            TokenKind::AmpersandEqual,
            TokenKind::PipeEqual,
            TokenKind::CaretEqual,
            TokenKind::LessLessEqual,
            TokenKind::GreaterGreaterEqual,
        ];
        for kind in kinds {
            if self.check(kind) {
                return Some(self.advance().clone());
            }
        }
        None
    }

    fn lambda(&mut self) -> ParseResult<Expr> {
        let token = self.advance().clone(); // lambda
        let params = if self.check(TokenKind::Colon) {
            Vec::new()
        } else {
            self.parameter_list(TokenKind::Colon)?
        };
        self.consume(TokenKind::Colon, "expected ':' after lambda parameters")?;
        let body = Box::new(self.expression()?);
        Ok(Expr::Lambda {
            params,
            body,
            token,
        })
    }

    fn or_test(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and_test()?;
        while self.check(TokenKind::Or) {
            let op = self.advance().clone();
            let right = self.and_test()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and_test(&mut self) -> ParseResult<Expr> {
        let mut expr = self.not_test()?;
        while self.check(TokenKind::And) {
            let op = self.advance().clone();
            let right = self.not_test()?;
            expr = Expr::Logical {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn not_test(&mut self) -> ParseResult<Expr> {
        if self.check(TokenKind::Not) {
            let op = self.advance().clone();
            let operand = Box::new(self.not_test()?);
            return Ok(Expr::Unary { op, operand });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let first = self.bit_or()?;
        let mut rest = Vec::new();
        loop {
            let (op, token) = match self.peek().kind {
                TokenKind::EqualEqual => (CmpOp::Eq, self.advance().clone()),
                TokenKind::BangEqual => (CmpOp::Ne, self.advance().clone()),
                TokenKind::Less => (CmpOp::Lt, self.advance().clone()),
                TokenKind::LessEqual => (CmpOp::Le, self.advance().clone()),
                TokenKind::Greater => (CmpOp::Gt, self.advance().clone()),
                TokenKind::GreaterEqual => (CmpOp::Ge, self.advance().clone()),
                TokenKind::In => (CmpOp::In, self.advance().clone()),
                TokenKind::Not if self.peek_next_kind() == Some(TokenKind::In) => {
                    let token = self.advance().clone(); // not
                    self.advance(); // in
                    (CmpOp::NotIn, token)
                }
                _ => break,
            };
            let operand = self.bit_or()?;
            rest.push((op, token, operand));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn bit_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.bit_xor()?;
        while self.check(TokenKind::Pipe) {
            let op = self.advance().clone();
            let right = self.bit_xor()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn bit_xor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.bit_and()?;
        while self.check(TokenKind::Caret) {
            let op = self.advance().clone();
            let right = self.bit_and()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn bit_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.shift()?;
        while self.check(TokenKind::Ampersand) {
            let op = self.advance().clone();
            let right = self.shift()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn shift(&mut self) -> ParseResult<Expr> {
        let mut expr = self.arith()?;
        while self.check(TokenKind::LessLess) || self.check(TokenKind::GreaterGreater) {
            let op = self.advance().clone();
            let right = self.arith()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn arith(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        while self.check(TokenKind::Plus) || self.check(TokenKind::Minus) {
            let op = self.advance().clone();
            let right = self.term()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while matches!(
            self.peek().kind,
            TokenKind::Star | TokenKind::Slash | TokenKind::SlashSlash | TokenKind::Percent
        ) {
            let op = self.advance().clone();
            let right = self.unary()?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if matches!(
            self.peek().kind,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Tilde
        ) {
            let op = self.advance().clone();
            let operand = Box::new(self.unary()?);
            return Ok(Expr::Unary { op, operand });
        }
        self.power()
    }

    fn power(&mut self) -> ParseResult<Expr> {
        let base = self.postfix()?;
        if self.check(TokenKind::StarStar) {
            let op = self.advance().clone();
            // Right-associative, and the exponent may be signed: 2 ** -1.
            let right = self.unary()?;
            return Ok(binary(base, op, right));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        loop {
            if self.check(TokenKind::LeftParen) {
                let token = self.advance().clone();
                expr = self.finish_call(expr, token)?;
            } else if self.check(TokenKind::Dot) {
                self.advance();
                let name = self
                    .consume(TokenKind::Identifier, "expected attribute name after '.'")?
                    .clone();
                expr = Expr::AttrGet {
                    object: Box::new(expr),
                    name,
                };
            } else if self.check(TokenKind::LeftBracket) {
                let token = self.advance().clone();
                expr = self.finish_subscript(expr, token)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr, token: Token) -> ParseResult<Expr> {
        let mut args = Vec::new();
        let mut kwargs: Vec<(Token, Expr)> = Vec::new();
        while !self.check(TokenKind::RightParen) {
            if self.check(TokenKind::Identifier)
                && self.peek_next_kind() == Some(TokenKind::Equal)
            {
                let name = self.advance().clone();
                self.advance(); // =
                let value = self.expression()?;
                kwargs.push((name, value));
            } else {
                let arg = self.expression()?;
                if !kwargs.is_empty() {
                    return Err(SyntaxError::at(
                        arg.token(),
                        "positional argument follows keyword argument",
                    ));
                }
                args.push(arg);
            }
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.consume(TokenKind::RightParen, "expected ')' after arguments")?;
        Ok(Expr::Call {
            callee: Box::new(callee),
            args,
            kwargs,
            token,
        })
    }

    fn finish_subscript(&mut self, object: Expr, token: Token) -> ParseResult<Expr> {
        let start = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        if !self.check(TokenKind::Colon) {
            let index = start
                .ok_or_else(|| SyntaxError::at(&token, "expected index expression"))?;
            self.consume(TokenKind::RightBracket, "expected ']' after index")?;
            return Ok(Expr::IndexGet {
                object: Box::new(object),
                index,
                token,
            });
        }

        self.advance(); // first ':'
        let stop = if self.check(TokenKind::Colon) || self.check(TokenKind::RightBracket) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        let step = if self.match_kind(TokenKind::Colon) {
            if self.check(TokenKind::RightBracket) {
                None
            } else {
                Some(Box::new(self.expression()?))
            }
        } else {
            None
        };
        self.consume(TokenKind::RightBracket, "expected ']' after slice")?;
        Ok(Expr::Slice {
            object: Box::new(object),
            start,
            stop,
            step,
            token,
        })
    }

    // ------------------------------------------------------------------
    // Primaries
    // ------------------------------------------------------------------

    fn primary(&mut self) -> ParseResult<Expr> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int | TokenKind::Float | TokenKind::Str => {
                self.advance();
                let value = match &token.literal {
                    Some(Literal::Int(i)) => LiteralValue::Int(*i),
                    Some(Literal::Float(f)) => LiteralValue::Float(*f),
                    Some(Literal::Str(s)) => LiteralValue::Str(s.clone()),
                    _ => return Err(SyntaxError::at(&token, "malformed literal token")),
                };
                Ok(Expr::Literal { value, token })
            }
            TokenKind::FString => {
                self.advance();
                self.fstring_expr(token)
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Bool(true),
                    token,
                })
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::Bool(false),
                    token,
                })
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::Literal {
                    value: LiteralValue::None,
                    token,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Variable { name: token })
            }
            TokenKind::Super => {
                self.advance();
                self.consume(TokenKind::LeftParen, "expected '(' after 'super'")?;
                self.consume(TokenKind::RightParen, "expected ')' after 'super('")?;
                self.consume(TokenKind::Dot, "expected '.' after 'super()'")?;
                let method = self
                    .consume(TokenKind::Identifier, "expected method name after 'super().'")?
                    .clone();
                Ok(Expr::SuperCall { token, method })
            }
            TokenKind::Lambda => self.lambda(),
            TokenKind::LeftParen => {
                self.advance();
                if self.match_kind(TokenKind::RightParen) {
                    return Ok(Expr::TupleLiteral {
                        elements: Vec::new(),
                        token,
                    });
                }
                let first = self.expression()?;
                if self.check(TokenKind::Comma) {
                    let mut elements = vec![first];
                    while self.match_kind(TokenKind::Comma) {
                        if self.check(TokenKind::RightParen) {
                            break;
                        }
                        elements.push(self.expression()?);
                    }
                    self.consume(TokenKind::RightParen, "expected ')' after tuple")?;
                    Ok(Expr::TupleLiteral { elements, token })
                } else {
                    self.consume(TokenKind::RightParen, "expected ')' after expression")?;
                    Ok(first)
                }
            }
            TokenKind::LeftBracket => {
                self.advance();
                if self.match_kind(TokenKind::RightBracket) {
                    return Ok(Expr::ListLiteral {
                        elements: Vec::new(),
                        token,
                    });
                }
                let first = self.expression()?;
                if self.check(TokenKind::For) {
                    let clauses = self.comprehension_clauses()?;
                    self.consume(TokenKind::RightBracket, "expected ']' after comprehension")?;
                    return Ok(Expr::Comprehension {
                        kind: ComprehensionKind::List,
                        element: Box::new(first),
                        value: None,
                        clauses,
                        token,
                    });
                }
                let mut elements = vec![first];
                while self.match_kind(TokenKind::Comma) {
                    if self.check(TokenKind::RightBracket) {
                        break;
                    }
                    elements.push(self.expression()?);
                }
                self.consume(TokenKind::RightBracket, "expected ']' after list literal")?;
                Ok(Expr::ListLiteral { elements, token })
            }
            TokenKind::LeftBrace => {
                self.advance();
                self.brace_display(token)
            }
            _ => Err(SyntaxError::at(&token, "expected expression")),
        }
    }

    /// Everything that starts with `{`: dict literal, set literal, dict
    /// comprehension, or set comprehension.
    fn brace_display(&mut self, token: Token) -> ParseResult<Expr> {
        if self.match_kind(TokenKind::RightBrace) {
            return Ok(Expr::DictLiteral {
                pairs: Vec::new(),
                token,
            });
        }
        let first = self.expression()?;
        if self.match_kind(TokenKind::Colon) {
            let first_value = self.expression()?;
            if self.check(TokenKind::For) {
                let clauses = self.comprehension_clauses()?;
                self.consume(TokenKind::RightBrace, "expected '}' after comprehension")?;
                return Ok(Expr::Comprehension {
                    kind: ComprehensionKind::Dict,
                    element: Box::new(first),
                    value: Some(Box::new(first_value)),
                    clauses,
                    token,
                });
            }
            let mut pairs = vec![(first, first_value)];
            while self.match_kind(TokenKind::Comma) {
                if self.check(TokenKind::RightBrace) {
                    break;
                }
                let key = self.expression()?;
                self.consume(TokenKind::Colon, "expected ':' in dict literal")?;
                let value = self.expression()?;
                pairs.push((key, value));
            }
            self.consume(TokenKind::RightBrace, "expected '}' after dict literal")?;
            return Ok(Expr::DictLiteral { pairs, token });
        }
        if self.check(TokenKind::For) {
            let clauses = self.comprehension_clauses()?;
            self.consume(TokenKind::RightBrace, "expected '}' after comprehension")?;
            return Ok(Expr::Comprehension {
                kind: ComprehensionKind::Set,
                element: Box::new(first),
                value: None,
                clauses,
                token,
            });
        }
        let mut elements = vec![first];
        while self.match_kind(TokenKind::Comma) {
            if self.check(TokenKind::RightBrace) {
                break;
            }
            elements.push(self.expression()?);
        }
        self.consume(TokenKind::RightBrace, "expected '}' after set literal")?;
        Ok(Expr::SetLiteral { elements, token })
    }

    /// `for x in iter (if cond)*`, repeated. Iterables and conditions sit
    /// at or-test level so a following `if`/`for` keyword stays a clause.
    fn comprehension_clauses(&mut self) -> ParseResult<Vec<CompClause>> {
        let mut clauses = Vec::new();
        loop {
            if self.match_kind(TokenKind::For) {
                let targets = self.name_list()?;
                self.consume(TokenKind::In, "expected 'in' in comprehension")?;
                let iterable = self.or_test()?;
                clauses.push(CompClause::For { targets, iterable });
            } else if self.match_kind(TokenKind::If) {
                let condition = self.or_test()?;
                clauses.push(CompClause::If { condition });
            } else {
                break;
            }
        }
        Ok(clauses)
    }

    /// Reassembles a lexed f-string into literal pieces and parsed
    /// embedded expressions.
    fn fstring_expr(&mut self, token: Token) -> ParseResult<Expr> {
        let parts = match &token.literal {
            Some(Literal::FString(parts)) => parts.clone(),
            Some(Literal::Str(s)) => vec![FStringPart::Literal(s.clone())],
            _ => return Err(SyntaxError::at(&token, "malformed f-string token")),
        };
        let mut pieces = Vec::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => pieces.push(FStringPiece::Literal(text)),
                FStringPart::Expr {
                    source,
                    format_spec,
                    line,
                    column,
                } => {
                    let expr = parse_embedded_expression(&source, line, column)?;
                    pieces.push(FStringPiece::Expr {
                        expr: Box::new(expr),
                        format_spec,
                    });
                }
            }
        }
        Ok(Expr::FString { pieces, token })
    }

    // ------------------------------------------------------------------
    // Error recovery and cursor helpers
    // ------------------------------------------------------------------

    /// Discards tokens until a plausible statement boundary: just past a
    /// NEWLINE, or in front of a statement-starting keyword.
    fn synchronize(&mut self) {
        while !self.check(TokenKind::Eof) {
            if self.previous_kind() == Some(TokenKind::Newline) {
                return;
            }
            match self.peek().kind {
                TokenKind::Def
                | TokenKind::Class
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Try
                | TokenKind::Return
                | TokenKind::Raise
                | TokenKind::Global
                | TokenKind::Nonlocal
                | TokenKind::Pass
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Dedent => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn peek_next_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.current + 1).map(|t| t.kind)
    }

    fn previous_kind(&self) -> Option<TokenKind> {
        if self.current == 0 {
            None
        } else {
            Some(self.tokens[self.current - 1].kind)
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.check(TokenKind::Eof) {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn error_here(&self, message: &str) -> SyntaxError {
        SyntaxError::at(self.peek(), message)
    }
}

fn binary(left: Expr, op: Token, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

/// Lexes and parses one f-string expression fragment. Errors are reported
/// at the fragment's position in the enclosing literal.
fn parse_embedded_expression(source: &str, line: u32, column: u32) -> ParseResult<Expr> {
    let reposition = |message: String| SyntaxError {
        message,
        lexeme: source.to_string(),
        line,
        column,
    };
    let tokens =
        tokenize(source).map_err(|err| reposition(format!("in f-string: {}", err.message)))?;
    let mut parser = Parser {
        tokens,
        current: 0,
        errors: Vec::new(),
    };
    let expr = parser
        .expression()
        .map_err(|err| reposition(format!("in f-string: {}", err.message)))?;
    if !parser.check(TokenKind::Newline) && !parser.check(TokenKind::Eof) {
        return Err(reposition("in f-string: unexpected trailing tokens".to_string()));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_source(source: &str) -> (Vec<Stmt>, Vec<SyntaxError>) {
        parse(tokenize(source).unwrap())
    }

    fn parse_clean(source: &str) -> Vec<Stmt> {
        let (stmts, errors) = parse_source(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        stmts
    }

    fn parse_expr(source: &str) -> Expr {
        let stmts = parse_clean(source);
        match stmts.into_iter().next() {
            Some(Stmt::Expression { expr }) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_arith_over_comparison() {
        match parse_expr("1 + 2 * 3 < 4") {
            Expr::Compare { first, rest } => {
                assert!(matches!(*first, Expr::Binary { .. }));
                assert_eq!(rest.len(), 1);
                assert_eq!(rest[0].0, CmpOp::Lt);
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_chained_comparison() {
        match parse_expr("a < b <= c") {
            Expr::Compare { rest, .. } => {
                assert_eq!(rest.len(), 2);
                assert_eq!(rest[0].0, CmpOp::Lt);
                assert_eq!(rest[1].0, CmpOp::Le);
            }
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_not_in_operator() {
        match parse_expr("x not in items") {
            Expr::Compare { rest, .. } => assert_eq!(rest[0].0, CmpOp::NotIn),
            other => panic!("expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_power_right_associative() {
        // 2 ** 3 ** 2 parses as 2 ** (3 ** 2).
        match parse_expr("2 ** 3 ** 2") {
            Expr::Binary { right, .. } => assert!(matches!(*right, Expr::Binary { .. })),
            other => panic!("expected binary, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_targets() {
        assert!(matches!(parse_expr("x = 1"), Expr::Assign { .. }));
        assert!(matches!(parse_expr("a[0] = 1"), Expr::IndexSet { .. }));
        assert!(matches!(parse_expr("a.b = 1"), Expr::AttrSet { .. }));

        let (_, errors) = parse_source("1 + 2 = 3");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("invalid assignment target"));
    }

    #[test]
    fn test_chained_assignment() {
        match parse_expr("a = b = 1") {
            Expr::Assign { value, .. } => assert!(matches!(*value, Expr::Assign { .. })),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_slice_forms() {
        assert!(matches!(parse_expr("a[1]"), Expr::IndexGet { .. }));
        match parse_expr("a[1:5:2]") {
            Expr::Slice {
                start, stop, step, ..
            } => {
                assert!(start.is_some() && stop.is_some() && step.is_some());
            }
            other => panic!("expected slice, got {:?}", other),
        }
        match parse_expr("a[::-1]") {
            Expr::Slice {
                start, stop, step, ..
            } => {
                assert!(start.is_none() && stop.is_none() && step.is_some());
            }
            other => panic!("expected slice, got {:?}", other),
        }
    }

    #[test]
    fn test_call_arguments() {
        match parse_expr("f(1, 2, sep='x')") {
            Expr::Call { args, kwargs, .. } => {
                assert_eq!(args.len(), 2);
                assert_eq!(kwargs.len(), 1);
                assert_eq!(kwargs[0].0.lexeme, "sep");
            }
            other => panic!("expected call, got {:?}", other),
        }

        let (_, errors) = parse_source("f(a=1, 2)");
        assert!(errors[0]
            .message
            .contains("positional argument follows keyword argument"));
    }

    #[test]
    fn test_function_definition_with_varargs() {
        let stmts = parse_clean("def f(a, b=1, *args, **kwargs):\n    return a\n");
        match &stmts[0] {
            Stmt::FunctionDef { decl } => {
                assert_eq!(decl.params.len(), 4);
                assert_eq!(decl.params[0].kind, ParamKind::Plain);
                assert!(decl.params[1].default.is_some());
                assert_eq!(decl.params[2].kind, ParamKind::VarArgs);
                assert_eq!(decl.params[3].kind, ParamKind::KwArgs);
            }
            other => panic!("expected function def, got {:?}", other),
        }
    }

    #[test]
    fn test_if_elif_else() {
        let stmts = parse_clean("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        match &stmts[0] {
            Stmt::If {
                branches,
                else_branch,
            } => {
                assert_eq!(branches.len(), 2);
                assert!(else_branch.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_suite() {
        let stmts = parse_clean("if x: y = 1; z = 2\n");
        match &stmts[0] {
            Stmt::If { branches, .. } => assert_eq!(branches[0].1.len(), 2),
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_try_except_else_finally() {
        let source = "try:\n    x = 1\nexcept ValueError as e:\n    pass\nexcept:\n    pass\nelse:\n    pass\nfinally:\n    pass\n";
        let stmts = parse_clean(source);
        match &stmts[0] {
            Stmt::Try {
                handlers,
                else_branch,
                finally,
                ..
            } => {
                assert_eq!(handlers.len(), 2);
                assert!(handlers[0].class.is_some());
                assert_eq!(handlers[0].binding.as_ref().unwrap().lexeme, "e");
                assert!(handlers[1].class.is_none());
                assert!(else_branch.is_some());
                assert!(finally.is_some());
            }
            other => panic!("expected try, got {:?}", other),
        }
    }

    #[test]
    fn test_comprehension_clauses() {
        match parse_expr("[i*i for i in xs if i % 2 == 0 for j in ys]") {
            Expr::Comprehension { kind, clauses, .. } => {
                assert_eq!(kind, ComprehensionKind::List);
                assert_eq!(clauses.len(), 3);
                assert!(matches!(clauses[0], CompClause::For { .. }));
                assert!(matches!(clauses[1], CompClause::If { .. }));
                assert!(matches!(clauses[2], CompClause::For { .. }));
            }
            other => panic!("expected comprehension, got {:?}", other),
        }
    }

    #[test]
    fn test_dict_and_set_displays() {
        assert!(matches!(parse_expr("{}"), Expr::DictLiteral { .. }));
        assert!(matches!(parse_expr("{1: 'a', 2: 'b'}"), Expr::DictLiteral { .. }));
        assert!(matches!(parse_expr("{1, 2, 3}"), Expr::SetLiteral { .. }));
        assert!(matches!(
            parse_expr("{k: v for k in ks}"),
            Expr::Comprehension {
                kind: ComprehensionKind::Dict,
                ..
            }
        ));
        assert!(matches!(
            parse_expr("{x for x in xs}"),
            Expr::Comprehension {
                kind: ComprehensionKind::Set,
                ..
            }
        ));
    }

    #[test]
    fn test_tuple_by_comma() {
        assert!(matches!(parse_expr("1, 2, 3"), Expr::TupleLiteral { .. }));
        assert!(matches!(parse_expr("()"), Expr::TupleLiteral { .. }));
        match parse_expr("(1)") {
            Expr::Literal { .. } => {}
            other => panic!("parenthesized scalar is not a tuple: {:?}", other),
        }
        assert!(matches!(parse_expr("(1,)"), Expr::TupleLiteral { .. }));
    }

    #[test]
    fn test_super_call() {
        let stmts =
            parse_clean("class A(B):\n    def f(self):\n        return super().f()\n");
        assert!(matches!(&stmts[0], Stmt::ClassDef { methods, .. } if methods.len() == 1));
    }

    #[test]
    fn test_fstring_embedded_expression() {
        match parse_expr("f'total: {a + b:>8}'") {
            Expr::FString { pieces, .. } => {
                assert_eq!(pieces.len(), 2);
                match &pieces[1] {
                    FStringPiece::Expr { expr, format_spec } => {
                        assert!(matches!(**expr, Expr::Binary { .. }));
                        assert_eq!(format_spec.as_deref(), Some(">8"));
                    }
                    other => panic!("expected expr piece, got {:?}", other),
                }
            }
            other => panic!("expected f-string, got {:?}", other),
        }
    }

    #[test]
    fn test_error_recovery_continues() {
        let (stmts, errors) = parse_source("x = )\ny = 2\n");
        assert_eq!(errors.len(), 1);
        // The second line still parses.
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn test_lambda() {
        match parse_expr("lambda x, y=2: x + y") {
            Expr::Lambda { params, .. } => {
                assert_eq!(params.len(), 2);
                assert!(params[1].default.is_some());
            }
            other => panic!("expected lambda, got {:?}", other),
        }
    }
}
