//! Registry of named primitives.
//!
//! Operator primitives (`+`, `==`, ...) have their own syntax and are handled
//! by the evaluator directly. The primitives here are called like user
//! functions, `(head xs)`, and are found by name when no user binding of that
//! name exists.
//!
//! ## Adding New Operations
//!
//! 1. Implement `fn(&[Value]) -> Result<Value, Error>`; arity is checked
//!    before the call, so the slice length always satisfies the declared
//!    [`Arity`]
//! 2. Add a [`BuiltinOp`] entry to `BUILTIN_OPS`
//! 3. Add evaluator-level tests for the new name

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::NumberType;
use crate::value::Value;

/// Accepted argument counts for a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }

    /// Check `count` against this arity, naming `callee` in the error
    pub fn validate(self, callee: &str, count: usize) -> Result<(), Error> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(Error::arity_error(callee, self, count))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Any => write!(f, "any number"),
        }
    }
}

pub type BuiltinFn = fn(&[Value]) -> Result<Value, Error>;

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    pub name: &'static str,
    pub func: BuiltinFn,
    pub arity: Arity,
}

impl BuiltinOp {
    /// Validate the argument count, then apply
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        self.arity.validate(self.name, args.len())?;
        (self.func)(args)
    }
}

fn expect_index(value: &Value, op: &str) -> Result<NumberType, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(Error::TypeMismatch(format!(
            "{op} expects a number index, got {}",
            other.type_name()
        ))),
    }
}

fn builtin_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::List(args.to_vec()))
}

fn builtin_head(args: &[Value]) -> Result<Value, Error> {
    args[0].head()
}

fn builtin_tail(args: &[Value]) -> Result<Value, Error> {
    args[0].tail()
}

fn builtin_append(args: &[Value]) -> Result<Value, Error> {
    args[0].append(args[1].clone())
}

fn builtin_splice(args: &[Value]) -> Result<Value, Error> {
    let start = expect_index(&args[1], "splice")?;
    let end = expect_index(&args[2], "splice")?;
    args[0].splice(start, end)
}

fn builtin_length(args: &[Value]) -> Result<Value, Error> {
    args[0].length()
}

fn builtin_nth(args: &[Value]) -> Result<Value, Error> {
    let index = expect_index(&args[1], "nth")?;
    args[0].nth(index)
}

static BUILTIN_OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "list",
        func: builtin_list,
        arity: Arity::Any,
    },
    BuiltinOp {
        name: "head",
        func: builtin_head,
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "tail",
        func: builtin_tail,
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "append",
        func: builtin_append,
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "splice",
        func: builtin_splice,
        arity: Arity::Exact(3),
    },
    BuiltinOp {
        name: "length",
        func: builtin_length,
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "nth",
        func: builtin_nth,
        arity: Arity::Exact(2),
    },
];

static BUILTIN_BY_NAME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.name, op)).collect());

/// Get all builtin operations
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

/// Find a builtin operation by name
pub fn find_builtin(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_BY_NAME.get(name).copied()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{empty_list, val};

    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        find_builtin(name).unwrap().call(args)
    }

    #[test]
    fn test_registry_lookup() {
        for op in get_builtin_ops() {
            let found = find_builtin(op.name).unwrap();
            assert!(std::ptr::eq(op, found), "{} resolves to itself", op.name);
        }
        assert!(find_builtin("car").is_none());
        assert!(find_builtin("+").is_none());
        assert_eq!(find_builtin("splice").unwrap().arity, Arity::Exact(3));
    }

    #[test]
    fn test_arity() {
        let cases = vec![
            (Arity::Exact(2), 2, true),
            (Arity::Exact(2), 1, false),
            (Arity::Exact(0), 0, true),
            (Arity::AtLeast(1), 5, true),
            (Arity::AtLeast(1), 0, false),
            (Arity::Any, 0, true),
        ];
        for (i, (arity, count, expected)) in cases.iter().enumerate() {
            assert_eq!(arity.accepts(*count), *expected, "arity case #{}", i + 1);
        }
        assert_eq!(Arity::AtLeast(1).to_string(), "at least 1");
        assert_eq!(Arity::Any.to_string(), "any number");
    }

    #[test]
    fn test_builtin_function_implementations() {
        type TestCase = (&'static str, Vec<Value>, Option<Value>);

        let abc = val(["a", "b", "c"]);
        let test_cases: Vec<TestCase> = vec![
            ("list", vec![], Some(empty_list())),
            ("list", vec![val(1), val("x")], Some(val(vec![val(1), val("x")]))),
            ("head", vec![abc.clone()], Some(val("a"))),
            ("head", vec![empty_list()], None),
            ("head", vec![val(3)], None),
            ("tail", vec![abc.clone()], Some(val(["b", "c"]))),
            ("tail", vec![val([1])], Some(empty_list())),
            ("tail", vec![empty_list()], Some(empty_list())),
            ("append", vec![empty_list(), val(1)], Some(val([1]))),
            ("append", vec![val([1]), val([2])], Some(val(vec![val(1), val([2])]))),
            ("append", vec![val(1), val(2)], None),
            ("splice", vec![abc.clone(), val(0), val(2)], Some(val(["a", "b"]))),
            ("splice", vec![abc.clone(), val(1), val(10)], Some(val(["b", "c"]))),
            ("splice", vec![abc.clone(), val(-5), val(1)], Some(val(["a"]))),
            ("splice", vec![abc.clone(), val(2), val(1)], Some(empty_list())),
            ("splice", vec![abc.clone(), val("0"), val(1)], None),
            ("length", vec![abc.clone()], Some(val(3))),
            ("length", vec![empty_list()], Some(val(0))),
            ("length", vec![val("abc")], None),
            ("nth", vec![abc.clone(), val(2)], Some(val("c"))),
            ("nth", vec![abc.clone(), val(3)], None),
            ("nth", vec![abc.clone(), val(-1)], None),
            ("nth", vec![val(1), val(0)], None),
            // Arity is checked by the registry entry
            ("head", vec![abc.clone(), abc.clone()], None),
            ("splice", vec![abc.clone()], None),
        ];

        for (i, (name, args, expected)) in test_cases.iter().enumerate() {
            let result = call_builtin(name, args);
            match (result, expected) {
                (Ok(actual), Some(expected)) => {
                    assert_eq!(actual, *expected, "builtin test #{} ({name})", i + 1);
                }
                (Err(_), None) => {}
                (Ok(actual), None) => {
                    panic!("builtin test #{} ({name}): expected error, got {actual:?}", i + 1)
                }
                (Err(err), Some(expected)) => panic!(
                    "builtin test #{} ({name}): expected {expected:?}, got error {err}",
                    i + 1
                ),
            }
        }
    }

    #[test]
    fn test_arity_error_names_builtin() {
        let err = call_builtin("nth", &[empty_list()]).unwrap_err();
        assert_eq!(err, Error::arity_error("nth", Arity::Exact(2), 1));
    }
}
