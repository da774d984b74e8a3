//! A deliberately restricted expression language for machine-generated code.
//!
//! Programs are limited to literals, arithmetic, variable bindings, lists,
//! and calls to pre-registered host (`extern`) functions; there is no
//! control flow, and user-defined function bodies never execute. Source text
//! parses to an AST, a tree-walking interpreter evaluates it against a
//! cloned root environment, and a canonical printer renders trees back to
//! text for debugging and example formatting.
//!
//! ```
//! use corral::{run_interpreter, Value};
//!
//! let result = run_interpreter("var x = 1 + 3 * 3", None);
//! assert!(result.errors.is_empty());
//! assert_eq!(Value::Int(10), result.environment.get_symbol("x").unwrap());
//! ```

pub mod ast;
pub mod environment;
pub mod foreign;
pub mod interpreter;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod value;

pub use environment::{create_environment, Environment};
pub use interpreter::{run_interpreter, Error, Interpreter, InterpreterResult, RuntimeError};
pub use parser::{parse, SyntaxError};
pub use printer::AstPrinter;
pub use value::{NativeFn, Value};
