//! Syntax tree types produced by the parser.
//!
//! [`Expr`] is a closed set of node kinds; every non-leaf owns its children.
//! Function definitions sit behind an `Rc` so the runtime
//! [`Value::Function`](crate::value::Value::Function) can share the body with
//! the tree instead of copying it. The tree is never mutated after parsing.
//!
//! `Display` renders nodes back to canonical source text, which the REPL shows
//! for `:parse`.

use std::fmt;
use std::rc::Rc;

use crate::lexer::TokenKind;

/// Type alias for number values in interpreter
pub type NumberType = i64;

/// Built-in operators written with punctuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Operator {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Plus => Operator::Add,
            TokenKind::Minus => Operator::Sub,
            TokenKind::Star => Operator::Mul,
            TokenKind::Slash => Operator::Div,
            TokenKind::Gt => Operator::Gt,
            TokenKind::Lt => Operator::Lt,
            TokenKind::GtEq => Operator::Ge,
            TokenKind::LtEq => Operator::Le,
            TokenKind::EqEq => Operator::Eq,
            TokenKind::NotEq => Operator::Ne,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Eq => "==",
            Operator::Ne => "!=",
        }
    }

    /// Arithmetic operators fold over any number of arguments; the rest are
    /// binary comparisons
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A named function definition
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(NumberType),
    /// String literal, already unquoted
    Str(String),
    Symbol(String),
    /// `(setq name value)`
    Assignment { name: String, value: Box<Expr> },
    /// `(if cond then else)`
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `(print expr)`
    Print(Box<Expr>),
    /// `(defun name (params...) body)`
    FuncDef(Rc<FuncDef>),
    /// `(name args...)`, a user function or a named primitive
    FuncCall { name: String, args: Vec<Expr> },
    /// `(op args...)`
    PrimOp { op: Operator, args: Vec<Expr> },
}

impl Expr {
    /// Build a string literal from its lexeme, dropping the surrounding quotes
    pub fn string_literal(lexeme: &str) -> Self {
        let inner = lexeme
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(lexeme);
        Expr::Str(inner.to_owned())
    }
}

/// Top-level sequence of expressions; never empty when produced by the parser
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub exprs: Vec<Expr>,
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for arg in args {
        write!(f, " {arg}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Str(s) => write!(f, "\"{s}\""),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Assignment { name, value } => write!(f, "(setq {name} {value})"),
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "(if {cond} {then_branch} {else_branch})"),
            Expr::Print(expr) => write!(f, "(print {expr})"),
            Expr::FuncDef(def) => {
                write!(f, "(defun {} ({}) {})", def.name, def.params.join(" "), def.body)
            }
            Expr::FuncCall { name, args } => {
                write!(f, "({name}")?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::PrimOp { op, args } => {
                write!(f, "({op}")?;
                write_args(f, args)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.exprs.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{expr}")?;
        }
        Ok(())
    }
}
