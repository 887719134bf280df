//! Recursive descent parser producing an arena-backed [`Module`].
//!
//! Deliberately small: standard precedence climbing for operators, a token
//! of lookahead everywhere except arrow parameter lists, which scan ahead
//! for `) =>` before committing. Semicolons are optional; there is no
//! automatic-semicolon-insertion cleverness beyond that.

use smol_str::SmolStr;

use crate::lexer::{Lexer, Token, TokenKind};
use crate::{
    number_key, BinaryOp, Declarator, Expr, ExprId, FnBody, MemberKey, Module, ObjectProperty,
    Param, ParseError, PatternProp, Span, Stmt, StmtId, UnaryOp,
};

pub fn parse(source: &str) -> Result<Module, ParseError> {
    let tokens = Lexer::new(source).tokenize()?;
    let parser = Parser {
        tokens,
        pos: 0,
        module: Module::default(),
    };
    parser.parse_program(source.len() as u32)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    module: Module,
}

impl Parser {
    fn parse_program(mut self, source_len: u32) -> Result<Module, ParseError> {
        let mut body = Vec::new();
        while !self.at(&TokenKind::Eof) {
            body.push(self.parse_stmt()?);
        }
        self.module.body = body;
        self.module.span = Span::new(0, source_len);
        Ok(self.module)
    }

    // ========================================================================
    // Token plumbing
    // ========================================================================

    fn peek(&self) -> &Token {
        // The token stream always ends with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn nth_kind(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_ident(&mut self, expected: &'static str) -> Result<(SmolStr, Span), ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                let token = self.bump();
                Ok((name, token.span))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            ParseError::Eof {
                expected,
                span: token.span,
            }
        } else {
            ParseError::Unexpected {
                found: token.kind.describe(),
                expected,
                span: token.span,
            }
        }
    }

    fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn expr_span(&self, id: ExprId) -> Span {
        self.module.expr_span(id)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn parse_stmt(&mut self) -> Result<StmtId, ParseError> {
        let start = self.peek().span.start;
        match &self.peek().kind {
            TokenKind::Return => {
                self.bump();
                let arg = if self.at(&TokenKind::Semi)
                    || self.at(&TokenKind::RBrace)
                    || self.at(&TokenKind::Eof)
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.eat(&TokenKind::Semi);
                let span = Span::new(start, self.prev_end());
                Ok(self.module.alloc_stmt(Stmt::Return(arg), span))
            }
            TokenKind::Const | TokenKind::Let | TokenKind::Var => {
                self.bump();
                let mut declarators = Vec::new();
                loop {
                    let (name, _) = self.expect_ident("a binding name")?;
                    self.expect(&TokenKind::Assign, "`=`")?;
                    let init = self.parse_expr()?;
                    declarators.push(Declarator { name, init });
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.eat(&TokenKind::Semi);
                let span = Span::new(start, self.prev_end());
                Ok(self.module.alloc_stmt(Stmt::Declaration(declarators), span))
            }
            TokenKind::Function if matches!(self.nth_kind(1), TokenKind::Ident(_)) => {
                let function = self.parse_function_expr()?;
                let Expr::Function {
                    name: Some(name), ..
                } = &self.module[function]
                else {
                    return Err(self.unexpected("a function name"));
                };
                let name = name.clone();
                let span = Span::new(start, self.prev_end());
                Ok(self
                    .module
                    .alloc_stmt(Stmt::FunctionDecl { name, function }, span))
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.at(&TokenKind::Assign) {
                    return Err(ParseError::Unsupported {
                        what: "assignment",
                        span: self.peek().span,
                    });
                }
                self.eat(&TokenKind::Semi);
                let span = Span::new(start, self.prev_end());
                Ok(self.module.alloc_stmt(Stmt::Expr(expr), span))
            }
        }
    }

    fn parse_block(&mut self) -> Result<Vec<StmtId>, ParseError> {
        self.expect(&TokenKind::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        Ok(stmts)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expr(&mut self) -> Result<ExprId, ParseError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<ExprId, ParseError> {
        let test = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_expr()?;
        self.expect(&TokenKind::Colon, "`:`")?;
        let alternate = self.parse_expr()?;
        let span = self.expr_span(test).merge(self.expr_span(alternate));
        Ok(self.module.alloc_expr(
            Expr::Conditional {
                test,
                consequent,
                alternate,
            },
            span,
        ))
    }

    fn parse_or(&mut self) -> Result<ExprId, ParseError> {
        self.parse_binary_level(0)
    }

    /// Binary operators by ascending precedence level.
    fn level_op(kind: &TokenKind, level: usize) -> Option<BinaryOp> {
        match (level, kind) {
            (0, TokenKind::PipePipe) => Some(BinaryOp::Or),
            (1, TokenKind::AmpAmp) => Some(BinaryOp::And),
            (2, TokenKind::EqEq) => Some(BinaryOp::Eq),
            (2, TokenKind::NotEq) => Some(BinaryOp::NotEq),
            (2, TokenKind::EqEqEq) => Some(BinaryOp::StrictEq),
            (2, TokenKind::NotEqEq) => Some(BinaryOp::StrictNotEq),
            (3, TokenKind::Lt) => Some(BinaryOp::Lt),
            (3, TokenKind::Gt) => Some(BinaryOp::Gt),
            (3, TokenKind::LtEq) => Some(BinaryOp::LtEq),
            (3, TokenKind::GtEq) => Some(BinaryOp::GtEq),
            (4, TokenKind::Plus) => Some(BinaryOp::Add),
            (4, TokenKind::Minus) => Some(BinaryOp::Sub),
            (5, TokenKind::Star) => Some(BinaryOp::Mul),
            (5, TokenKind::Slash) => Some(BinaryOp::Div),
            (5, TokenKind::Percent) => Some(BinaryOp::Rem),
            _ => None,
        }
    }

    fn parse_binary_level(&mut self, level: usize) -> Result<ExprId, ParseError> {
        if level > 5 {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary_level(level + 1)?;
        while let Some(op) = Self::level_op(&self.peek().kind, level) {
            self.bump();
            let rhs = self.parse_binary_level(level + 1)?;
            let span = self.expr_span(lhs).merge(self.expr_span(rhs));
            lhs = self.module.alloc_expr(Expr::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<ExprId, ParseError> {
        let op = match &self.peek().kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Neg),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        let start = self.bump().span.start;
        let operand = self.parse_unary()?;
        let span = Span::new(start, self.expr_span(operand).end);
        Ok(self.module.alloc_expr(Expr::Unary { op, operand }, span))
    }

    fn parse_postfix(&mut self) -> Result<ExprId, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match &self.peek().kind {
                TokenKind::LParen => {
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at(&TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RParen, "`)`")?;
                    let span = Span::new(self.expr_span(expr).start, self.prev_end());
                    expr = self.module.alloc_expr(Expr::Call { callee: expr, args }, span);
                }
                TokenKind::Dot => {
                    self.bump();
                    let (name, _) = self.expect_ident("a property name")?;
                    let span = Span::new(self.expr_span(expr).start, self.prev_end());
                    expr = self.module.alloc_expr(
                        Expr::Member {
                            object: expr,
                            property: MemberKey::Static(name),
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    self.bump();
                    let key = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    let span = Span::new(self.expr_span(expr).start, self.prev_end());
                    expr = self.module.alloc_expr(
                        Expr::Member {
                            object: expr,
                            property: MemberKey::Computed(key),
                        },
                        span,
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<ExprId, ParseError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Number(n) => {
                let n = *n;
                self.bump();
                Ok(self.module.alloc_expr(Expr::Number(n), token.span))
            }
            TokenKind::Str(s) => {
                let s = s.clone();
                self.bump();
                Ok(self.module.alloc_expr(Expr::Str(s), token.span))
            }
            TokenKind::True => {
                self.bump();
                Ok(self.module.alloc_expr(Expr::Bool(true), token.span))
            }
            TokenKind::False => {
                self.bump();
                Ok(self.module.alloc_expr(Expr::Bool(false), token.span))
            }
            TokenKind::Ident(name) => {
                let name = name.clone();
                if self.nth_kind(1) == &TokenKind::Arrow {
                    // Bare single-parameter arrow: `x => body`
                    self.bump();
                    self.bump();
                    return self.finish_arrow(vec![Param::Ident(name)], token.span.start);
                }
                self.bump();
                Ok(self.module.alloc_expr(Expr::Ident(name), token.span))
            }
            TokenKind::Function => self.parse_function_expr(),
            TokenKind::LParen => {
                if self.arrow_ahead() {
                    self.bump();
                    let params = self.parse_params()?;
                    self.expect(&TokenKind::Arrow, "`=>`")?;
                    self.finish_arrow(params, token.span.start)
                } else {
                    self.bump();
                    let expr = self.parse_expr()?;
                    self.expect(&TokenKind::RParen, "`)`")?;
                    Ok(expr)
                }
            }
            TokenKind::LBrace => self.parse_object(),
            TokenKind::LBracket => self.parse_array(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Decide whether a `(` opens an arrow parameter list by scanning for
    /// its matching `)` and peeking at the token after it.
    fn arrow_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        loop {
            match &self.tokens[i.min(self.tokens.len() - 1)].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .is_some_and(|t| t.kind == TokenKind::Arrow);
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
    }

    fn finish_arrow(&mut self, params: Vec<Param>, start: u32) -> Result<ExprId, ParseError> {
        let body = if self.at(&TokenKind::LBrace) {
            // `=> {}` is an empty block, not an object literal; an object
            // body needs parentheses, same as real JavaScript.
            FnBody::Block(self.parse_block()?)
        } else {
            FnBody::Expr(self.parse_expr()?)
        };
        let span = Span::new(start, self.prev_end());
        Ok(self.module.alloc_expr(
            Expr::Function {
                name: None,
                params,
                body,
            },
            span,
        ))
    }

    fn parse_function_expr(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(&TokenKind::Function, "`function`")?.span.start;
        let name = match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.bump();
                Some(name)
            }
            _ => None,
        };
        self.expect(&TokenKind::LParen, "`(`")?;
        let params = self.parse_params()?;
        let body = FnBody::Block(self.parse_block()?);
        let span = Span::new(start, self.prev_end());
        Ok(self
            .module
            .alloc_expr(Expr::Function { name, params, body }, span))
    }

    /// Parameter list after an already-consumed `(`.
    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();
        while !self.at(&TokenKind::RParen) {
            let param = match &self.peek().kind {
                TokenKind::Ident(name) => {
                    let name = name.clone();
                    self.bump();
                    Param::Ident(name)
                }
                TokenKind::LBrace => {
                    self.bump();
                    let mut props = Vec::new();
                    while !self.at(&TokenKind::RBrace) {
                        let (key, _) = self.expect_ident("a pattern key")?;
                        let binding = if self.eat(&TokenKind::Colon) {
                            self.expect_ident("a binding name")?.0
                        } else {
                            key.clone()
                        };
                        props.push(PatternProp { key, binding });
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(&TokenKind::RBrace, "`}`")?;
                    Param::Object(props)
                }
                _ => return Err(self.unexpected("a parameter")),
            };
            params.push(param);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "`)`")?;
        Ok(params)
    }

    fn parse_object(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(&TokenKind::LBrace, "`{`")?.span.start;
        let mut properties = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            let property = match &self.peek().kind {
                TokenKind::Ellipsis => {
                    self.bump();
                    ObjectProperty::Spread(self.parse_expr()?)
                }
                TokenKind::LBracket => {
                    self.bump();
                    let key = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket, "`]`")?;
                    self.expect(&TokenKind::Colon, "`:`")?;
                    let value = self.parse_expr()?;
                    ObjectProperty::Computed { key, value }
                }
                TokenKind::Ident(name) => {
                    let key = name.clone();
                    let key_span = self.bump().span;
                    if self.eat(&TokenKind::Colon) {
                        let value = self.parse_expr()?;
                        ObjectProperty::Static { key, value }
                    } else {
                        // Shorthand `{a}` is sugar for `{a: a}`.
                        let value = self.module.alloc_expr(Expr::Ident(key.clone()), key_span);
                        ObjectProperty::Static { key, value }
                    }
                }
                TokenKind::Str(s) => {
                    let key = s.clone();
                    self.bump();
                    self.expect(&TokenKind::Colon, "`:`")?;
                    let value = self.parse_expr()?;
                    ObjectProperty::Static { key, value }
                }
                TokenKind::Number(n) => {
                    let key = number_key(*n);
                    self.bump();
                    self.expect(&TokenKind::Colon, "`:`")?;
                    let value = self.parse_expr()?;
                    ObjectProperty::Static { key, value }
                }
                _ => return Err(self.unexpected("a property")),
            };
            properties.push(property);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "`}`")?;
        let span = Span::new(start, self.prev_end());
        Ok(self.module.alloc_expr(Expr::Object { properties }, span))
    }

    fn parse_array(&mut self) -> Result<ExprId, ParseError> {
        let start = self.expect(&TokenKind::LBracket, "`[`")?.span.start;
        let mut elements = Vec::new();
        while !self.at(&TokenKind::RBracket) {
            elements.push(self.parse_expr()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket, "`]`")?;
        let span = Span::new(start, self.prev_end());
        Ok(self.module.alloc_expr(Expr::Array { elements }, span))
    }
}
