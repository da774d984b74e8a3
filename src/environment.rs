use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::ExternFunctionDef;
use crate::interpreter::RuntimeError;
use crate::value::Value;

/// A scope frame: bindings plus a back-reference to the enclosing frame.
///
/// Lookups walk the chain outward; writes always land in the local frame
/// (the parent sits behind a shared `Rc` and cannot be written through).
/// Only a root frame may be cloned, which yields a deep copy decoupled from
/// the source except for native extern implementations, which are shared by
/// reference.
#[derive(Debug, Default)]
pub struct Environment {
    pub parent: Option<Rc<Environment>>,
    pub variables: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    pub fn with_parent(parent: Rc<Environment>) -> Environment {
        Environment {
            parent: Some(parent),
            variables: HashMap::new(),
        }
    }

    /// Look up a symbol, falling back through the parent chain.
    pub fn get_symbol(&self, name: &str) -> Result<Value, RuntimeError> {
        if let Some(value) = self.variables.get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get_symbol(name),
            None => Err(RuntimeError::UndefinedVariable(name.to_string())),
        }
    }

    /// Bind a symbol in the local frame, shadowing any ancestor binding,
    /// and return the stored value.
    pub fn set_symbol(&mut self, name: &str, value: Value) -> Value {
        self.variables.insert(name.to_string(), value.clone());
        value
    }

    /// The extern functions declared in this frame (parents are not
    /// searched), sorted by name so rendered signatures are deterministic.
    pub fn list_extern_functions(&self) -> Vec<ExternFunctionDef> {
        let mut externs: Vec<ExternFunctionDef> = self
            .variables
            .values()
            .filter_map(|value| match value {
                Value::Extern(def) => Some(def.clone()),
                _ => None,
            })
            .collect();
        externs.sort_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
        externs
    }
}

impl Clone for Environment {
    fn clone(&self) -> Environment {
        assert!(
            self.parent.is_none(),
            "cannot clone an environment with a parent"
        );
        Environment {
            parent: None,
            variables: self.variables.clone(),
        }
    }
}

/// Build a root environment from extern declarations keyed by name, then
/// merge in caller-supplied bindings. The bindings are moved in rather than
/// copied, so any native closures they contain stay shared with the caller.
pub fn create_environment(
    extern_fns: Vec<ExternFunctionDef>,
    external_variables: Option<HashMap<String, Value>>,
) -> Environment {
    let mut environment = Environment::new();
    for def in extern_fns {
        let name = def.name.clone();
        environment.set_symbol(&name, Value::Extern(def));
    }
    if let Some(variables) = external_variables {
        for (name, value) in variables {
            environment.set_symbol(&name, value);
        }
    }
    environment
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::{Param, ParamList};

    #[test]
    fn test_accessing_variables() {
        let mut env = Environment::new();
        assert!(matches!(
            env.get_symbol("x"),
            Err(RuntimeError::UndefinedVariable(_))
        ));

        env.set_symbol("x", Value::Int(1));
        assert_eq!(Value::Int(1), env.get_symbol("x").unwrap());
    }

    #[test]
    fn test_clone_decouples() {
        let mut env = Environment::new();
        env.set_symbol("x", Value::Int(1));
        let mut new_env = env.clone();
        env.set_symbol("y", Value::Int(2));
        new_env.set_symbol("z", Value::Int(3));

        assert_eq!(Value::Int(1), env.get_symbol("x").unwrap());
        assert_eq!(Value::Int(2), env.get_symbol("y").unwrap());
        assert!(env.get_symbol("z").is_err());

        assert_eq!(Value::Int(1), new_env.get_symbol("x").unwrap());
        assert!(new_env.get_symbol("y").is_err());
        assert_eq!(Value::Int(3), new_env.get_symbol("z").unwrap());
    }

    #[test]
    #[should_panic(expected = "cannot clone an environment with a parent")]
    fn test_clone_rejects_child_frames() {
        let root = Rc::new(Environment::new());
        let child = Environment::with_parent(root);
        let _ = child.clone();
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let mut root = Environment::new();
        root.set_symbol("x", Value::Int(1));
        let mut child = Environment::with_parent(Rc::new(root));

        assert_eq!(Value::Int(1), child.get_symbol("x").unwrap());

        // A local write shadows without touching the ancestor frame
        child.set_symbol("x", Value::Int(2));
        assert_eq!(Value::Int(2), child.get_symbol("x").unwrap());
        assert_eq!(
            Value::Int(1),
            child.parent.as_ref().unwrap().get_symbol("x").unwrap()
        );
    }

    #[test]
    fn test_list_extern_functions() {
        let mut env = Environment::new();
        assert!(env.list_extern_functions().is_empty());

        let func = ExternFunctionDef::new("foo", ParamList::default(), "Any");
        env.set_symbol("foo", Value::Extern(func.clone()));
        env.set_symbol("x", Value::Int(1));
        assert_eq!(vec![func], env.list_extern_functions());
    }

    #[test]
    fn test_listing_skips_parent_frames() {
        let mut root = Environment::new();
        root.set_symbol(
            "outer",
            Value::Extern(ExternFunctionDef::new("outer", ParamList::default(), "Any")),
        );
        let mut child = Environment::with_parent(Rc::new(root));
        child.set_symbol(
            "inner",
            Value::Extern(ExternFunctionDef::new("inner", ParamList::default(), "Any")),
        );

        let listed = child.list_extern_functions();
        assert_eq!(1, listed.len());
        assert_eq!("inner", listed[0].name);
    }

    #[test]
    fn test_create_environment() {
        let add = ExternFunctionDef::new(
            "add",
            ParamList(vec![
                Param {
                    name: "a".to_string(),
                    type_annotation: "number".to_string(),
                },
                Param {
                    name: "b".to_string(),
                    type_annotation: "number".to_string(),
                },
            ]),
            "number",
        );
        let mut variables = HashMap::new();
        variables.insert("x".to_string(), Value::Int(7));

        let env = create_environment(vec![add.clone()], Some(variables));
        assert_eq!(Value::Extern(add), env.get_symbol("add").unwrap());
        assert_eq!(Value::Int(7), env.get_symbol("x").unwrap());
    }
}
