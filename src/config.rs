use crate::{MAX_EVAL_DEPTH, MAX_PARSE_DEPTH};

/// Interpreter limits and front-end policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Deepest parenthesized nesting the parser accepts
    pub max_parse_depth: usize,
    /// Deepest evaluation recursion before reporting an error
    pub max_eval_depth: usize,
    /// Reject source text containing lex errors instead of parsing the
    /// tokens that survived
    pub strict_lexing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_parse_depth: MAX_PARSE_DEPTH,
            max_eval_depth: MAX_EVAL_DEPTH,
            strict_lexing: true,
        }
    }
}

impl Config {
    pub fn with_max_parse_depth(mut self, depth: usize) -> Self {
        self.max_parse_depth = depth;
        self
    }

    pub fn with_max_eval_depth(mut self, depth: usize) -> Self {
        self.max_eval_depth = depth;
        self
    }

    pub fn with_strict_lexing(mut self, strict: bool) -> Self {
        self.strict_lexing = strict;
        self
    }
}
