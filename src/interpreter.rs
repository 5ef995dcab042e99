//! Facade for front ends.
//!
//! An [`Interpreter`] owns the global environment, so successive calls to
//! [`Interpreter::eval_source`] see each other's definitions. A failed call
//! keeps every binding made before the failing expression.

use std::io::{self, Write};

use crate::Error;
use crate::ast::Program;
use crate::config::Config;
use crate::environment::Environment;
use crate::evaluator::Evaluator;
use crate::lexer::tokenize_all;
use crate::parser::parse_with_config;
use crate::value::Value;

#[derive(Debug)]
pub struct Interpreter {
    env: Environment<'static>,
    config: Config,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new(Config::default())
    }
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Interpreter {
            env: Environment::global(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn environment(&self) -> &Environment<'static> {
        &self.env
    }

    /// Lex and parse `source` under this interpreter's config
    ///
    /// With strict lexing the first lex error fails the parse; otherwise lex
    /// errors have already been logged and only the surviving tokens are
    /// parsed.
    pub fn parse(&self, source: &str) -> Result<Program, Error> {
        let (tokens, errors) = tokenize_all(source);
        if let Some(first) = errors.first() {
            if self.config.strict_lexing {
                return Err(Error::Lex(first.clone()));
            }
            tracing::info!(count = errors.len(), "continuing past lex errors");
        }
        Ok(parse_with_config(tokens, &self.config)?)
    }

    /// Run `source`, printing to standard output
    pub fn eval_source(&mut self, source: &str) -> Result<Value, Error> {
        let mut stdout = io::stdout().lock();
        self.eval_source_to(source, &mut stdout)
    }

    /// Run `source`, writing `print` output to `out`
    pub fn eval_source_to(&mut self, source: &str, out: &mut dyn Write) -> Result<Value, Error> {
        let program = self.parse(source)?;
        Evaluator::with_config(out, &self.config).eval_program(&program, &mut self.env)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::lexer::LexErrorKind;
    use crate::value::val;

    fn run(interp: &mut Interpreter, source: &str) -> Result<Value, Error> {
        interp.eval_source_to(source, &mut io::sink())
    }

    #[test]
    fn test_bindings_survive_across_calls_and_errors() {
        let mut interp = Interpreter::default();
        assert_eq!(run(&mut interp, "(setq x 5)").unwrap(), val(5));
        assert_eq!(run(&mut interp, "x").unwrap(), val(5));

        assert!(run(&mut interp, "(setq y 1) (head (list))").is_err());
        assert_eq!(run(&mut interp, "(+ x y)").unwrap(), val(6));

        assert!(run(&mut interp, "(+ 1").is_err());
        assert_eq!(run(&mut interp, "(defun inc (n) (+ n 1)) (inc x)").unwrap(), val(6));
        assert_eq!(run(&mut interp, "(inc 10)").unwrap(), val(11));
    }

    #[test]
    fn test_strict_lexing_rejects_illegal_characters() {
        let mut interp = Interpreter::default();
        let err = run(&mut interp, "(+ 1 @ 2)").unwrap_err();
        let Error::Lex(lex) = err else {
            panic!("expected lex error, got {err}");
        };
        assert_eq!(lex.kind, LexErrorKind::IllegalCharacter('@'));
        assert_eq!((lex.line, lex.column), (1, 6));
    }

    #[test]
    fn test_lenient_lexing_skips_illegal_characters() {
        let mut interp = Interpreter::new(Config::default().with_strict_lexing(false));
        assert_eq!(run(&mut interp, "(+ 1 @ 2)").unwrap(), val(3));
    }

    #[test]
    fn test_output_goes_to_sink() {
        let mut interp = Interpreter::default();
        let mut out = Vec::new();
        let value = interp
            .eval_source_to("(setq s \"hello\") (print s)", &mut out)
            .unwrap();
        assert_eq!(value, val("hello"));
        assert_eq!(String::from_utf8(out).unwrap(), "hello\n");
    }

    #[test]
    fn test_config_limits_apply() {
        let config = Config::default().with_max_parse_depth(4).with_max_eval_depth(16);
        let mut interp = Interpreter::new(config);
        assert!(matches!(
            run(&mut interp, "(+ 1 (+ 1 (+ 1 (+ 1 (+ 1 1)))))"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            run(&mut interp, "(defun r (n) (r n)) (r 1)"),
            Err(Error::EvalError(_))
        ));
        assert_eq!(interp.config().max_eval_depth, 16);
    }
}
