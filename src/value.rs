//! Runtime values.
//!
//! [`Value`] is the closed set of data an evaluation can produce. Values are
//! immutable: list operations such as [`Value::append`] build a new list and
//! leave the receiver untouched.
//!
//! Each operation matches on the variants it understands and reports any
//! other combination as [`Error::TypeMismatch`]; there is no coercion between
//! kinds.

use std::fmt;
use std::rc::Rc;

use crate::Error;
use crate::ast::{FuncDef, NumberType, Operator};

#[derive(Debug, Clone)]
pub enum Value {
    Number(NumberType),
    Str(String),
    List(Vec<Value>),
    /// User-defined function; shares its definition with the syntax tree
    Function(Rc<FuncDef>),
    Nil,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Function(_) => "function",
            Value::Nil => "nil",
        }
    }

    /// Zero is the only false value
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Number(0))
    }

    fn as_list(&self, op: &str) -> Result<&[Value], Error> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(Error::TypeMismatch(format!(
                "{op} expects a list, got {}",
                other.type_name()
            ))),
        }
    }

    fn numbers(&self, other: &Value, op: Operator) -> Result<(NumberType, NumberType), Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
            (a, b) => Err(Error::TypeMismatch(format!(
                "'{op}' expects numbers, got {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    /// Apply an arithmetic operator to two numbers
    ///
    /// Overflow and division by zero are evaluation errors. Division truncates
    /// toward zero.
    pub fn arithmetic(&self, op: Operator, other: &Value) -> Result<Value, Error> {
        let (a, b) = self.numbers(other, op)?;
        let result = match op {
            Operator::Add => a.checked_add(b),
            Operator::Sub => a.checked_sub(b),
            Operator::Mul => a.checked_mul(b),
            Operator::Div => {
                if b == 0 {
                    return Err(Error::EvalError("division by zero".into()));
                }
                a.checked_div(b)
            }
            _ => {
                return Err(Error::EvalError(format!(
                    "'{op}' is not an arithmetic operator"
                )));
            }
        };
        result
            .map(Value::Number)
            .ok_or_else(|| Error::EvalError(format!("integer overflow in {a} {op} {b}")))
    }

    /// Language-level equality: only values of the same kind compare
    pub fn equals(&self, other: &Value) -> Result<bool, Error> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => Ok(a == b),
            (Value::Str(a), Value::Str(b)) => Ok(a == b),
            (Value::Nil, Value::Nil) => Ok(true),
            (Value::List(a), Value::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.equals(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (a, b) => Err(Error::TypeMismatch(format!(
                "cannot compare {} with {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    /// Apply a comparison operator
    pub fn compare(&self, op: Operator, other: &Value) -> Result<bool, Error> {
        match op {
            Operator::Eq => self.equals(other),
            Operator::Ne => self.equals(other).map(|eq| !eq),
            Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le => {
                let (a, b) = self.numbers(other, op)?;
                Ok(match op {
                    Operator::Gt => a > b,
                    Operator::Lt => a < b,
                    Operator::Ge => a >= b,
                    _ => a <= b,
                })
            }
            _ => Err(Error::EvalError(format!("'{op}' is not a comparison"))),
        }
    }

    /// First element; an empty list has none
    pub fn head(&self) -> Result<Value, Error> {
        self.as_list("head")?
            .first()
            .cloned()
            .ok_or_else(|| Error::EvalError("head of empty list".into()))
    }

    /// All but the first element, empty for lists of length 0 or 1
    pub fn tail(&self) -> Result<Value, Error> {
        let items = self.as_list("tail")?;
        Ok(Value::List(items.iter().skip(1).cloned().collect()))
    }

    /// New list with `item` added at the end
    pub fn append(&self, item: Value) -> Result<Value, Error> {
        let mut items = self.as_list("append")?.to_vec();
        items.push(item);
        Ok(Value::List(items))
    }

    /// Sub-list `[start, end)` with both bounds clamped into the list
    pub fn splice(&self, start: NumberType, end: NumberType) -> Result<Value, Error> {
        let items = self.as_list("splice")?;
        let clamp = |i: NumberType| usize::try_from(i.max(0)).unwrap_or(usize::MAX).min(items.len());
        let (start, end) = (clamp(start), clamp(end));
        if start >= end {
            return Ok(Value::List(Vec::new()));
        }
        Ok(Value::List(items[start..end].to_vec()))
    }

    pub fn length(&self) -> Result<Value, Error> {
        let len = self.as_list("length")?.len();
        NumberType::try_from(len)
            .map(Value::Number)
            .map_err(|_| Error::EvalError("list too long".into()))
    }

    /// Element at a zero-based index
    pub fn nth(&self, index: NumberType) -> Result<Value, Error> {
        let items = self.as_list("nth")?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| {
                Error::EvalError(format!(
                    "index {index} out of bounds for list of length {}",
                    items.len()
                ))
            })
    }
}

/// Structural equality for tests and host code; functions compare by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Nil, Value::Nil) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Value::Function(def) => write!(f, "<function {}>", def.name),
            Value::Nil => write!(f, "nil"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(NumberType::from(n))
            }
        }
    };
}

impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType);
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

/// Build a value from anything convertible: `val(1)`, `val("s")`, `val([1, 2])`
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// The empty list
pub fn empty_list() -> Value {
    Value::List(Vec::new())
}
