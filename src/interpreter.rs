use thiserror::Error;

use crate::ast::{BinaryOp, Expr, Literal, Program, Stmt, UnaryOp};
use crate::environment::Environment;
use crate::parser::{parse, SyntaxError};
use crate::value::Value;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("variable `{0}` not found")]
    UndefinedVariable(String),
    #[error("extern function `{0}` has not been linked to an implementation")]
    UnlinkedExternFunction(String),
    #[error("function `{0}` is declared but user-defined functions are never executed")]
    UnimplementedUserFunction(String),
    #[error("`{0}` is not callable")]
    NotCallable(String),
    #[error("extern function `{name}` failed: {source}")]
    NativeFunction {
        name: String,
        args: Vec<Value>,
        source: anyhow::Error,
    },
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("division by zero")]
    DivisionByZero,
}

/// Any failure surfaced by a run: either the parse failed or a statement did.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// A tree-walking evaluator over a single environment frame. Execution is a
/// single pass over the statements; the first failure halts it with the
/// mutations so far left in place.
pub struct Interpreter {
    pub environment: Environment,
}

impl Interpreter {
    pub fn new(environment: Environment) -> Interpreter {
        Interpreter { environment }
    }

    /// Execute every statement in order, returning the value of the last
    /// one (declarations yield null).
    pub fn interpret(&mut self, program: &Program) -> Result<Value, RuntimeError> {
        let mut last = Value::Null;
        for stmt in &program.0 {
            last = self.execute(stmt)?;
        }
        Ok(last)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Value, RuntimeError> {
        match stmt {
            // Declaration is an unconditional local write, same as plain
            // assignment
            Stmt::VarDecl { name, value } => {
                let value = self.eval(value)?;
                self.environment.set_symbol(name, value);
                Ok(Value::Null)
            }
            // Definitions register the definition itself, not an evaluation
            Stmt::Fn(def) => {
                self.environment
                    .set_symbol(&def.name, Value::Function(def.clone()));
                Ok(Value::Null)
            }
            Stmt::Extern(def) => {
                self.environment
                    .set_symbol(&def.name, Value::Extern(def.clone()));
                Ok(Value::Null)
            }
            Stmt::Expr(expr) => self.eval(expr),
        }
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Grouping(inner) => self.eval(inner),
            Expr::Unary { op, right } => {
                let value = self.eval(right)?;
                match op {
                    UnaryOp::Minus => -value,
                    UnaryOp::Plus => {
                        if value.is_number() {
                            Ok(value)
                        } else {
                            Err(RuntimeError::TypeMismatch(format!(
                                "cannot apply unary `+` to `{}`",
                                value.type_name()
                            )))
                        }
                    }
                }
            }
            Expr::Binary { left, op, right } => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => lhs / rhs,
                    BinaryOp::Mod => lhs % rhs,
                    BinaryOp::Pow => lhs.pow(rhs),
                }
            }
            Expr::Assign { name, value } => {
                let value = self.eval(value)?;
                Ok(self.environment.set_symbol(name, value))
            }
            Expr::Variable(name) => self.environment.get_symbol(name),
            Expr::List(elements) => {
                let values = elements
                    .iter()
                    .map(|element| self.eval(element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }
            Expr::FunctionCall { name, args } => self.call(name, args),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Value, RuntimeError> {
        // Resolution failure precedes argument evaluation
        let callee = self.environment.get_symbol(name)?;
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;
        match callee {
            Value::Extern(def) => match def.implementation {
                Some(implementation) => {
                    implementation(&args).map_err(|source| RuntimeError::NativeFunction {
                        name: name.to_string(),
                        args,
                        source,
                    })
                }
                None => Err(RuntimeError::UnlinkedExternFunction(name.to_string())),
            },
            Value::Function(_) => Err(RuntimeError::UnimplementedUserFunction(name.to_string())),
            _ => Err(RuntimeError::NotCallable(name.to_string())),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(value) => Value::Int(*value),
        Literal::Float(value) => Value::Float(value.into_inner()),
        Literal::Bool(value) => Value::Bool(*value),
        Literal::Str(value) => Value::Str(value.clone()),
        Literal::Null => Value::Null,
    }
}

/// The outcome of a run: the environment after execution plus every error
/// captured. The error list is empty on success and holds exactly one entry
/// on failure.
pub struct InterpreterResult {
    pub environment: Environment,
    pub errors: Vec<Error>,
}

/// Parse and execute `code` against a clone of `environment` (or a fresh
/// root when none is given), so the caller's environment is never mutated.
///
/// A parse failure returns the cloned-but-unexecuted environment with one
/// error. A runtime failure halts at the failing statement and returns the
/// environment as mutated up to that point, with one error. There is no
/// rollback.
pub fn run_interpreter(code: &str, environment: Option<&Environment>) -> InterpreterResult {
    let environment = environment.map(Environment::clone).unwrap_or_default();
    let program = match parse(code) {
        Ok(program) => program,
        Err(err) => {
            return InterpreterResult {
                environment,
                errors: vec![err.into()],
            }
        }
    };
    let mut interpreter = Interpreter::new(environment);
    match interpreter.interpret(&program) {
        Ok(_) => InterpreterResult {
            environment: interpreter.environment,
            errors: vec![],
        },
        Err(err) => InterpreterResult {
            environment: interpreter.environment,
            errors: vec![err.into()],
        },
    }
}
