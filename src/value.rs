use std::fmt::{self, Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};
use std::rc::Rc;

use anyhow::Result;

use crate::ast::{ExternFunctionDef, FunctionDef};
use crate::interpreter::RuntimeError;

/// The signature of a host-provided extern implementation. Errors are
/// wrapped by the interpreter with the call name and evaluated arguments.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value>>;

/// A value bound in the environment. `clone` deep-copies all plain data;
/// native callables inside an extern definition are shared by reference.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
    List(Vec<Value>),
    Function(FunctionDef),
    Extern(ExternFunctionDef),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::List(_) => "list",
            Value::Function(_) => "fn",
            Value::Extern(_) => "extern fn",
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{:?}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => f.write_str("null"),
            Value::List(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            Value::Function(def) => write!(f, "<fn {}>", def.name),
            Value::Extern(def) => write!(f, "<extern fn {}>", def.name),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

fn mismatch(what: &str, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch(format!(
        "cannot {} `{}` and `{}`",
        what,
        lhs.type_name(),
        rhs.type_name()
    ))
}

// Starting here are convenience implementations to make the interpret loop
// easier. Integer results stay integral; any float operand promotes, as does
// i64 overflow.
impl Add for Value {
    type Output = Result<Value, RuntimeError>;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Int(l), Value::Int(r)) => Ok(l
                .checked_add(r)
                .map(Value::Int)
                .unwrap_or(Value::Float(l as f64 + r as f64))),
            (Value::Int(l), Value::Float(r)) => Ok(Value::Float(l as f64 + r)),
            (Value::Float(l), Value::Int(r)) => Ok(Value::Float(l + r as f64)),
            (Value::Float(l), Value::Float(r)) => Ok(Value::Float(l + r)),
            (Value::Str(l), Value::Str(r)) => Ok(Value::Str(l + &r)),
            (Value::List(mut l), Value::List(r)) => {
                l.extend(r);
                Ok(Value::List(l))
            }
            (l, r) => Err(mismatch("add", &l, &r)),
        }
    }
}

impl Sub for Value {
    type Output = Result<Value, RuntimeError>;

    fn sub(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Int(l), Value::Int(r)) => Ok(l
                .checked_sub(r)
                .map(Value::Int)
                .unwrap_or(Value::Float(l as f64 - r as f64))),
            (Value::Int(l), Value::Float(r)) => Ok(Value::Float(l as f64 - r)),
            (Value::Float(l), Value::Int(r)) => Ok(Value::Float(l - r as f64)),
            (Value::Float(l), Value::Float(r)) => Ok(Value::Float(l - r)),
            (l, r) => Err(mismatch("subtract", &l, &r)),
        }
    }
}

impl Mul for Value {
    type Output = Result<Value, RuntimeError>;

    fn mul(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Int(l), Value::Int(r)) => Ok(l
                .checked_mul(r)
                .map(Value::Int)
                .unwrap_or(Value::Float(l as f64 * r as f64))),
            (Value::Int(l), Value::Float(r)) => Ok(Value::Float(l as f64 * r)),
            (Value::Float(l), Value::Int(r)) => Ok(Value::Float(l * r as f64)),
            (Value::Float(l), Value::Float(r)) => Ok(Value::Float(l * r)),
            (l, r) => Err(mismatch("multiply", &l, &r)),
        }
    }
}

// True division: the result is always a float, and a zero divisor of either
// numeric type is an error rather than an infinity.
impl Div for Value {
    type Output = Result<Value, RuntimeError>;

    fn div(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (l, r) if l.is_number() && r.is_number() => {
                let l = as_f64(&l);
                let r = as_f64(&r);
                if r == 0f64 {
                    Err(RuntimeError::DivisionByZero)
                } else {
                    Ok(Value::Float(l / r))
                }
            }
            (l, r) => Err(mismatch("divide", &l, &r)),
        }
    }
}

// Modulo with the sign of the result following the divisor.
impl Rem for Value {
    type Output = Result<Value, RuntimeError>;

    fn rem(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivisionByZero),
            (Value::Int(l), Value::Int(r)) => {
                let m = l % r;
                if m != 0 && (m < 0) != (r < 0) {
                    Ok(Value::Int(m + r))
                } else {
                    Ok(Value::Int(m))
                }
            }
            (l, r) if l.is_number() && r.is_number() => {
                let l = as_f64(&l);
                let r = as_f64(&r);
                if r == 0f64 {
                    return Err(RuntimeError::DivisionByZero);
                }
                let m = l % r;
                if m != 0f64 && (m < 0f64) != (r < 0f64) {
                    Ok(Value::Float(m + r))
                } else {
                    Ok(Value::Float(m))
                }
            }
            (l, r) => Err(mismatch("take the modulo of", &l, &r)),
        }
    }
}

impl Neg for Value {
    type Output = Result<Value, RuntimeError>;

    fn neg(self) -> Self::Output {
        match self {
            Value::Int(n) => Ok(n
                .checked_neg()
                .map(Value::Int)
                .unwrap_or(Value::Float(-(n as f64)))),
            Value::Float(n) => Ok(Value::Float(-n)),
            value => Err(RuntimeError::TypeMismatch(format!(
                "cannot negate `{}`",
                value.type_name()
            ))),
        }
    }
}

impl Value {
    /// The power operation behind both `**` and `^`. An integer base with a
    /// non-negative integer exponent stays integral (float fallback on
    /// overflow); a negative integer exponent forces float promotion.
    pub fn pow(self, rhs: Value) -> Result<Value, RuntimeError> {
        match (self, rhs) {
            (Value::Int(l), Value::Int(r)) => {
                if r >= 0 {
                    if let Some(value) = u32::try_from(r).ok().and_then(|exp| l.checked_pow(exp)) {
                        return Ok(Value::Int(value));
                    }
                }
                Ok(Value::Float((l as f64).powf(r as f64)))
            }
            (l, r) if l.is_number() && r.is_number() => {
                Ok(Value::Float(as_f64(&l).powf(as_f64(&r))))
            }
            (l, r) => Err(mismatch("raise", &l, &r)),
        }
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => unreachable!("checked by is_number"),
    }
}
