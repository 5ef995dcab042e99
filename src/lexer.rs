//! Source text to tokens.
//!
//! Lexemes are recognized with `nom` combinators and classified afterwards.
//! The lexer is resilient: an illegal character produces a [`LexError`] item
//! and lexing resumes one character later, so a single stray byte never hides
//! the rest of the stream.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{opt, recognize},
    sequence::{delimited, pair, preceded},
};
use thiserror::Error;

use crate::ast::NumberType;

/// Kind of a token, carrying the converted value for numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Number(NumberType),
    Symbol,
    /// String literal; the lexeme still includes its quotes
    Str,
    Plus,
    Minus,
    Star,
    Slash,
    Gt,
    Lt,
    GtEq,
    LtEq,
    EqEq,
    NotEq,
    Defun,
    Setq,
    If,
    Print,
}

/// A lexed token borrowing its lexeme from the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    /// 1-based line of the first character
    pub line: usize,
    /// 1-based column of the first character
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    IllegalCharacter(char),
    NumberOutOfRange(String),
}

/// Diagnostic for input the lexer skipped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at line {line}, column {column}", describe(.kind))]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
}

fn describe(kind: &LexErrorKind) -> String {
    match kind {
        LexErrorKind::IllegalCharacter(c) => format!("illegal character '{c}'"),
        LexErrorKind::NumberOutOfRange(digits) => {
            format!("number literal {digits} does not fit in 64 bits")
        }
    }
}

/// Create a lazy token stream over `source`
pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Drain the whole stream, separating tokens from diagnostics
pub fn tokenize_all(source: &str) -> (Vec<Token<'_>>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for item in tokenize(source) {
        match item {
            Ok(token) => tokens.push(token),
            Err(error) => errors.push(error),
        }
    }
    (tokens, errors)
}

/// Iterator of tokens and lex diagnostics
///
/// Cloning a lexer snapshots its position; [`Lexer::restart`] rewinds to the
/// beginning of the source.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    rest: &'a str,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            rest: source,
            line: 1,
            column: 1,
        }
    }

    pub fn restart(&mut self) {
        *self = Lexer::new(self.source);
    }

    /// Move past `consumed`, which must be a prefix of the remaining input
    fn advance(&mut self, consumed: &'a str) {
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.rest = &self.rest[consumed.len()..];
    }

    fn skip_trivia(&mut self) {
        if let Ok((remaining, _)) = trivia(self.rest) {
            let consumed = &self.rest[..self.rest.len() - remaining.len()];
            self.advance(consumed);
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_trivia();
        if self.rest.is_empty() {
            return None;
        }

        let (line, column) = (self.line, self.column);
        match lexeme(self.rest) {
            Ok((_, text)) => {
                self.advance(text);
                match classify(text) {
                    Ok(kind) => Some(Ok(Token {
                        kind,
                        lexeme: text,
                        line,
                        column,
                    })),
                    Err(kind) => Some(Err(report(kind, line, column))),
                }
            }
            Err(_) => {
                // Skip exactly one character; the loop resumes on the next one
                let bad = self.rest.chars().next()?;
                let (skipped, _) = self.rest.split_at(bad.len_utf8());
                self.advance(skipped);
                Some(Err(report(LexErrorKind::IllegalCharacter(bad), line, column)))
            }
        }
    }
}

impl std::iter::FusedIterator for Lexer<'_> {}

fn report(kind: LexErrorKind, line: usize, column: usize) -> LexError {
    let error = LexError { kind, line, column };
    tracing::warn!(%error, "skipping unlexable input");
    error
}

/// Whitespace, newlines and `;` comments, possibly interleaved
fn trivia(input: &str) -> IResult<&str, ()> {
    let mut rest = input;
    loop {
        let step: IResult<&str, &str> = alt((
            take_while1(|c: char| matches!(c, ' ' | '\t' | '\r' | '\n')),
            recognize(preceded(char(';'), take_while(|c: char| c != '\n'))),
        ))
        .parse(rest);
        match step {
            Ok((remaining, _)) => rest = remaining,
            Err(_) => return Ok((rest, ())),
        }
    }
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(char('-')), digit1)).parse(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn string(input: &str) -> IResult<&str, &str> {
    recognize(delimited(char('"'), take_while(|c: char| c != '"'), char('"'))).parse(input)
}

/// Two-character operators come first so they win over their prefixes
fn punctuation(input: &str) -> IResult<&str, &str> {
    alt((
        tag(">="),
        tag("<="),
        tag("=="),
        tag("!="),
        recognize(one_of("()+-*/<>")),
    ))
    .parse(input)
}

/// Numbers are tried before punctuation so `-5` is one token
fn lexeme(input: &str) -> IResult<&str, &str> {
    alt((number, word, string, punctuation)).parse(input)
}

fn classify(text: &str) -> Result<TokenKind, LexErrorKind> {
    let kind = match text {
        "(" => TokenKind::LParen,
        ")" => TokenKind::RParen,
        "+" => TokenKind::Plus,
        "-" => TokenKind::Minus,
        "*" => TokenKind::Star,
        "/" => TokenKind::Slash,
        ">" => TokenKind::Gt,
        "<" => TokenKind::Lt,
        ">=" => TokenKind::GtEq,
        "<=" => TokenKind::LtEq,
        "==" => TokenKind::EqEq,
        "!=" => TokenKind::NotEq,
        "defun" => TokenKind::Defun,
        "setq" => TokenKind::Setq,
        "if" => TokenKind::If,
        "print" => TokenKind::Print,
        _ if text.starts_with('"') => TokenKind::Str,
        _ if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) => {
            match text.parse::<NumberType>() {
                Ok(n) => TokenKind::Number(n),
                Err(_) => return Err(LexErrorKind::NumberOutOfRange(text.to_owned())),
            }
        }
        _ => TokenKind::Symbol,
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = tokenize_all(source);
        assert!(errors.is_empty(), "unexpected lex errors for {source:?}: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_token_kinds_data_driven() {
        use TokenKind::*;

        let test_cases: Vec<(&str, Vec<TokenKind>)> = vec![
            ("", vec![]),
            ("   \t\n  ", vec![]),
            ("42", vec![Number(42)]),
            ("-17", vec![Number(-17)]),
            ("- 17", vec![Minus, Number(17)]),
            ("--5", vec![Minus, Number(-5)]),
            ("(+ 1 2)", vec![LParen, Plus, Number(1), Number(2), RParen]),
            ("x-1", vec![Symbol, Number(-1)]),
            (">= <= == != > <", vec![GtEq, LtEq, EqEq, NotEq, Gt, Lt]),
            (">=>", vec![GtEq, Gt]),
            ("* /", vec![Star, Slash]),
            ("defun setq if print", vec![Defun, Setq, If, Print]),
            ("defunx setq_ iff _print", vec![Symbol, Symbol, Symbol, Symbol]),
            ("foo_bar9 _x", vec![Symbol, Symbol]),
            ("\"hello world\"", vec![Str]),
            ("\"\"", vec![Str]),
            ("(print \"a\") ; trailing comment", vec![LParen, Print, Str, RParen]),
            ("; whole line\n7", vec![Number(7)]),
            ("  ; a\n ; b\n\t8 ; c", vec![Number(8)]),
            (";\n;\n", vec![]),
            ("1\r\n2", vec![Number(1), Number(2)]),
            ("9223372036854775807", vec![Number(i64::MAX)]),
            ("-9223372036854775808", vec![Number(i64::MIN)]),
        ];

        for (i, (input, expected)) in test_cases.iter().enumerate() {
            assert_eq!(kinds(input), *expected, "lex test #{} ({input:?})", i + 1);
        }
    }

    #[test]
    fn test_string_lexeme_keeps_quotes() {
        let (tokens, _) = tokenize_all("(setq s \"hi there\")");
        assert_eq!(tokens[3].kind, TokenKind::Str);
        assert_eq!(tokens[3].lexeme, "\"hi there\"");
    }

    #[test]
    fn test_positions() {
        let (tokens, _) = tokenize_all("(setq x\n  10)\n\"a\nb\" y");
        let positions: Vec<(&str, usize, usize)> =
            tokens.iter().map(|t| (t.lexeme, t.line, t.column)).collect();
        assert_eq!(
            positions,
            vec![
                ("(", 1, 1),
                ("setq", 1, 2),
                ("x", 1, 7),
                ("10", 2, 3),
                (")", 2, 5),
                ("\"a\nb\"", 3, 1),
                ("y", 4, 4),
            ]
        );
    }

    #[test]
    fn test_illegal_characters_are_skipped() {
        let (tokens, errors) = tokenize_all("(+ 1 # 2 & 3)");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LParen,
                TokenKind::Plus,
                TokenKind::Number(1),
                TokenKind::Number(2),
                TokenKind::Number(3),
                TokenKind::RParen,
            ]
        );
        assert_eq!(
            errors,
            vec![
                LexError {
                    kind: LexErrorKind::IllegalCharacter('#'),
                    line: 1,
                    column: 6,
                },
                LexError {
                    kind: LexErrorKind::IllegalCharacter('&'),
                    line: 1,
                    column: 10,
                },
            ]
        );
        assert_eq!(errors[0].to_string(), "illegal character '#' at line 1, column 6");
    }

    #[test]
    fn test_lone_bang_and_equals_are_illegal() {
        let (tokens, errors) = tokenize_all("! = !=");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::NotEq);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unterminated_string_reports_quote() {
        let (tokens, errors) = tokenize_all("\"abc");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, LexErrorKind::IllegalCharacter('"'));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Symbol);
        assert_eq!(tokens[0].lexeme, "abc");
    }

    #[test]
    fn test_number_out_of_range() {
        let (tokens, errors) = tokenize_all("99999999999999999999 1");
        assert_eq!(
            errors,
            vec![LexError {
                kind: LexErrorKind::NumberOutOfRange("99999999999999999999".into()),
                line: 1,
                column: 1,
            }]
        );
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number(1));
    }

    #[test]
    fn test_non_ascii_character_skipped_whole() {
        let (tokens, errors) = tokenize_all("é1");
        assert_eq!(errors[0].kind, LexErrorKind::IllegalCharacter('é'));
        assert_eq!(tokens[0].kind, TokenKind::Number(1));
        assert_eq!(tokens[0].column, 2);
    }

    #[test]
    fn test_lexer_is_lazy_and_restartable() {
        let mut lexer = tokenize("(a b)");
        let first = lexer.next();
        assert!(matches!(first, Some(Ok(Token { kind: TokenKind::LParen, .. }))));

        let snapshot = lexer.clone();
        assert_eq!(lexer.count(), 3);
        assert_eq!(snapshot.count(), 3);

        let mut lexer = tokenize("(a b)");
        lexer.by_ref().for_each(drop);
        assert!(lexer.next().is_none());
        lexer.restart();
        assert_eq!(lexer.count(), 4);
    }
}
