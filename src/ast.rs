use std::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;

use ordered_float::OrderedFloat;
use thiserror::Error;

use crate::value::NativeFn;

#[derive(Debug, PartialEq)]
pub struct Program(pub Vec<Stmt>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Float(OrderedFloat<f64>),
    Bool(bool),
    Str(String),
    Null,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Literal(Literal),
    Grouping(Box<Expr>),
    Unary {
        op: UnaryOp,
        right: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
    Variable(String),
    List(Vec<Expr>),
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    VarDecl { name: String, value: Expr },
    Fn(FunctionDef),
    Extern(ExternFunctionDef),
    Expr(Expr),
}

/// A function parameter: a name plus its textual type annotation. Types are
/// annotations only, nothing checks them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub type_annotation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ParamList(pub Vec<Param>);

/// A user-defined function. The body is parsed and printable but is never
/// executed by the interpreter.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: ParamList,
    pub body: Vec<Stmt>,
    pub return_type: String,
}

/// A function declared in the language but implemented natively by the host.
/// Callable only once an implementation has been attached.
#[derive(Clone)]
pub struct ExternFunctionDef {
    pub name: String,
    pub params: ParamList,
    pub return_type: String,
    pub implementation: Option<NativeFn>,
    pub doc: String,
}

#[derive(Error, Debug)]
#[error("extern function `{0}` already has an implementation")]
pub struct AlreadyLinked(pub String);

impl ExternFunctionDef {
    pub fn new(name: &str, params: ParamList, return_type: &str) -> ExternFunctionDef {
        ExternFunctionDef {
            name: name.to_string(),
            params,
            return_type: return_type.to_string(),
            implementation: None,
            doc: String::new(),
        }
    }

    pub fn with_doc(mut self, doc: &str) -> ExternFunctionDef {
        self.doc = doc.to_string();
        self
    }

    /// Attach the native implementation. Attaching twice is a programming
    /// error and fails rather than silently overwriting.
    pub fn with_implementation(
        self,
        implementation: NativeFn,
    ) -> Result<ExternFunctionDef, AlreadyLinked> {
        if self.implementation.is_some() {
            return Err(AlreadyLinked(self.name));
        }
        Ok(ExternFunctionDef {
            implementation: Some(implementation),
            ..self
        })
    }
}

impl Debug for ExternFunctionDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternFunctionDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("return_type", &self.return_type)
            .field(
                "implementation",
                &self.implementation.as_ref().map(|_| "<native>"),
            )
            .field("doc", &self.doc)
            .finish()
    }
}

// Signatures compare structurally; attached implementations compare by
// reference identity since closures have no structural equality.
impl PartialEq for ExternFunctionDef {
    fn eq(&self, other: &Self) -> bool {
        let implementations_match = match (&self.implementation, &other.implementation) {
            (Some(lhs), Some(rhs)) => Rc::ptr_eq(lhs, rhs),
            (None, None) => true,
            _ => false,
        };
        self.name == other.name
            && self.params == other.params
            && self.return_type == other.return_type
            && self.doc == other.doc
            && implementations_match
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOp::Add => f.write_str("+"),
            BinaryOp::Sub => f.write_str("-"),
            BinaryOp::Mul => f.write_str("*"),
            BinaryOp::Div => f.write_str("/"),
            BinaryOp::Mod => f.write_str("%"),
            // `^` parses to the same operation; `**` is the canonical form
            BinaryOp::Pow => f.write_str("**"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Plus => f.write_str("+"),
            UnaryOp::Minus => f.write_str("-"),
        }
    }
}
