//! Tokens to syntax tree.
//!
//! Recursive descent over the token stream. After an opening `(` the next
//! token decides the form: a keyword selects `defun`/`setq`/`if`/`print`, an
//! operator selects a primitive call and a bare symbol selects a function
//! call. A symbol outside parentheses is a variable reference.

use std::rc::Rc;

use crate::ast::{Expr, FuncDef, Operator, Program};
use crate::config::Config;
use crate::lexer::{Token, TokenKind, tokenize_all};
use crate::{Error, ParseError, ParseErrorKind};

/// Parse a complete program from tokens
pub fn parse<'a>(tokens: impl IntoIterator<Item = Token<'a>>) -> Result<Program, ParseError> {
    parse_with_config(tokens, &Config::default())
}

/// Parse a complete program, applying the nesting limit from `config`
pub fn parse_with_config<'a>(
    tokens: impl IntoIterator<Item = Token<'a>>,
    config: &Config,
) -> Result<Program, ParseError> {
    let mut parser = Parser {
        tokens: tokens.into_iter().collect(),
        pos: 0,
        max_depth: config.max_parse_depth,
    };
    parser.program()
}

/// Lex and parse source text, failing on the first lex error
pub fn parse_source(source: &str) -> Result<Program, Error> {
    let (tokens, errors) = tokenize_all(source);
    if let Some(error) = errors.into_iter().next() {
        return Err(Error::Lex(error));
    }
    Ok(parse(tokens)?)
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Position just past the last token, for end-of-input errors
    fn end_position(&self) -> (usize, usize) {
        match self.tokens.last() {
            Some(last) => (last.line, last.column + last.lexeme.chars().count()),
            None => (1, 1),
        }
    }

    fn error(&self, kind: ParseErrorKind, expected: &str, found: Option<Token<'a>>) -> ParseError {
        match found {
            Some(token) => ParseError::new(
                kind,
                expected,
                Some(token.lexeme.to_owned()),
                token.line,
                token.column,
            ),
            None => {
                let (line, column) = self.end_position();
                ParseError::new(ParseErrorKind::UnexpectedEof, expected, None, line, column)
            }
        }
    }

    fn unexpected(&self, expected: &str, found: Option<Token<'a>>) -> ParseError {
        self.error(ParseErrorKind::UnexpectedToken, expected, found)
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<'a>, ParseError> {
        match self.bump() {
            Some(token) if token.kind == kind => Ok(token),
            other => Err(self.unexpected(expected, other)),
        }
    }

    fn expect_symbol(&mut self, expected: &str) -> Result<String, ParseError> {
        self.expect(TokenKind::Symbol, expected)
            .map(|token| token.lexeme.to_owned())
    }

    fn at_close(&self) -> bool {
        matches!(self.peek(), Some(token) if token.kind == TokenKind::RParen)
    }

    fn program(&mut self) -> Result<Program, ParseError> {
        let mut exprs = Vec::new();
        while self.peek().is_some() {
            exprs.push(self.expr(0)?);
        }
        if exprs.is_empty() {
            return Err(self.unexpected("expression", None));
        }
        Ok(Program { exprs })
    }

    fn expr(&mut self, depth: usize) -> Result<Expr, ParseError> {
        if depth >= self.max_depth {
            let found = self.peek().copied();
            return Err(self.error(
                ParseErrorKind::TooDeeplyNested,
                &format!("at most {} levels of nesting", self.max_depth),
                found,
            ));
        }

        let Some(token) = self.bump() else {
            return Err(self.unexpected("expression", None));
        };
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Str => Ok(Expr::string_literal(token.lexeme)),
            TokenKind::Symbol => Ok(Expr::Symbol(token.lexeme.to_owned())),
            TokenKind::LParen => {
                let form = self.form(depth)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(form)
            }
            _ => Err(self.unexpected("expression", Some(token))),
        }
    }

    /// The inside of a parenthesized form, after `(` and before `)`
    fn form(&mut self, depth: usize) -> Result<Expr, ParseError> {
        let Some(token) = self.bump() else {
            return Err(self.unexpected("form", None));
        };

        match token.kind {
            TokenKind::Defun => self.funcdef(depth),
            TokenKind::Setq => {
                let name = self.expect_symbol("variable name")?;
                let value = self.expr(depth + 1)?;
                Ok(Expr::Assignment {
                    name,
                    value: Box::new(value),
                })
            }
            TokenKind::If => {
                let cond = self.expr(depth + 1)?;
                let then_branch = self.expr(depth + 1)?;
                let else_branch = self.expr(depth + 1)?;
                Ok(Expr::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                })
            }
            TokenKind::Print => {
                let expr = self.expr(depth + 1)?;
                Ok(Expr::Print(Box::new(expr)))
            }
            TokenKind::Symbol => {
                let args = self.args(depth)?;
                Ok(Expr::FuncCall {
                    name: token.lexeme.to_owned(),
                    args,
                })
            }
            kind => match Operator::from_token(kind) {
                Some(op) => {
                    if self.at_close() {
                        let found = self.peek().copied();
                        return Err(self.unexpected("operand", found));
                    }
                    let args = self.args(depth)?;
                    Ok(Expr::PrimOp { op, args })
                }
                None => Err(self.unexpected(
                    "'defun', 'setq', 'if', 'print', an operator or a function name",
                    Some(token),
                )),
            },
        }
    }

    /// Expressions up to (not including) the closing `)`
    fn args(&mut self, depth: usize) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        while self.peek().is_some() && !self.at_close() {
            args.push(self.expr(depth + 1)?);
        }
        Ok(args)
    }

    fn funcdef(&mut self, depth: usize) -> Result<Expr, ParseError> {
        let name = self.expect_symbol("function name")?;
        let params = self.params()?;
        let body = self.expr(depth + 1)?;
        Ok(Expr::FuncDef(Rc::new(FuncDef { name, params, body })))
    }

    fn params(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(TokenKind::LParen, "'(' starting the parameter list")?;
        let mut params: Vec<String> = Vec::new();
        loop {
            match self.bump() {
                Some(token) if token.kind == TokenKind::RParen => return Ok(params),
                Some(token) if token.kind == TokenKind::Symbol => {
                    if params.iter().any(|p| p == token.lexeme) {
                        return Err(self.error(
                            ParseErrorKind::DuplicateParameter,
                            "distinct parameter names",
                            Some(token),
                        ));
                    }
                    params.push(token.lexeme.to_owned());
                }
                other => return Err(self.unexpected("parameter name or ')'", other)),
            }
        }
    }
}
