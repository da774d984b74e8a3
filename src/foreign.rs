//! Bridging host functions and values into the language.

use std::rc::Rc;

use thiserror::Error;

use crate::ast::{Expr, ExternFunctionDef, Literal, Param, ParamList};
use crate::value::{NativeFn, Value};

#[derive(Error, Debug, PartialEq, Eq)]
#[error("cannot express a `{0}` value as a literal")]
pub struct ConversionError(pub &'static str);

/// Wrap a host closure as a native extern implementation.
pub fn native<F>(f: F) -> NativeFn
where
    F: Fn(&[Value]) -> anyhow::Result<Value> + 'static,
{
    Rc::new(f)
}

/// Build an unlinked extern declaration from a signature. Link it with
/// [`ExternFunctionDef::with_implementation`].
pub fn extern_fn(name: &str, params: &[(&str, &str)], return_type: &str) -> ExternFunctionDef {
    let params = params
        .iter()
        .map(|(name, type_annotation)| Param {
            name: name.to_string(),
            type_annotation: type_annotation.to_string(),
        })
        .collect();
    ExternFunctionDef::new(name, ParamList(params), return_type)
}

/// Express a host value as a literal expression. Plain data converts
/// (lists recursively); function values have no literal form.
pub fn value_to_expr(value: &Value) -> Result<Expr, ConversionError> {
    match value {
        Value::Int(n) => Ok(Expr::Literal(Literal::Int(*n))),
        Value::Float(n) => Ok(Expr::Literal(Literal::Float((*n).into()))),
        Value::Str(s) => Ok(Expr::Literal(Literal::Str(s.clone()))),
        Value::Bool(b) => Ok(Expr::Literal(Literal::Bool(*b))),
        Value::Null => Ok(Expr::Literal(Literal::Null)),
        Value::List(elements) => {
            let elements = elements
                .iter()
                .map(value_to_expr)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::List(elements))
        }
        value @ (Value::Function(_) | Value::Extern(_)) => {
            Err(ConversionError(value.type_name()))
        }
    }
}

/// Render a host-level call as a call expression, for formatting example
/// programs.
pub fn to_function_call(name: &str, args: &[Value]) -> Result<Expr, ConversionError> {
    let args = args
        .iter()
        .map(value_to_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Expr::FunctionCall {
        name: name.to_string(),
        args,
    })
}
