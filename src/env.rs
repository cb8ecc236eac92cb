// ABOUTME: Environment module: the lexical scope chain with Python's
// global/nonlocal declaration rules

use crate::error::{RuntimeError, SYNTAX_ERROR};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// One lexical scope frame. Function calls, class bodies, and
/// comprehension clauses each get a fresh frame chained to its enclosing
/// one; closures share the frame of their defining scope so `nonlocal`
/// mutations stay visible.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    enclosing: Option<Rc<Environment>>,
    globals: RefCell<HashSet<String>>,
    nonlocals: RefCell<HashSet<String>>,
    function_scope: bool,
}

impl Environment {
    /// Creates the outermost (module/global) environment.
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            enclosing: None,
            globals: RefCell::new(HashSet::new()),
            nonlocals: RefCell::new(HashSet::new()),
            function_scope: false,
        })
    }

    /// Creates a child frame. `function_scope` marks frames created by
    /// calls; `nonlocal` resolution only considers those.
    pub fn with_parent(parent: Rc<Environment>, function_scope: bool) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            enclosing: Some(parent),
            globals: RefCell::new(HashSet::new()),
            nonlocals: RefCell::new(HashSet::new()),
            function_scope,
        })
    }

    /// Defines a binding in THIS frame, shadowing any outer one.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Reads a name, walking outward until found.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.enclosing.as_ref().and_then(|parent| parent.get(name))
    }

    /// True if this frame itself binds `name`.
    pub fn defines(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Drops a binding from this frame (used to unbind `except ... as e`
    /// names when the handler suite finishes).
    pub fn remove(&self, name: &str) {
        self.bindings.borrow_mut().remove(name);
    }

    /// The outermost frame of the chain.
    pub fn outermost(self: &Rc<Self>) -> Rc<Environment> {
        let mut current = self.clone();
        while let Some(parent) = current.enclosing.clone() {
            current = parent;
        }
        current
    }

    /// Records a `global` declaration for this scope.
    pub fn declare_global(&self, name: &str) {
        self.nonlocals.borrow_mut().remove(name);
        self.globals.borrow_mut().insert(name.to_string());
    }

    /// Records a `nonlocal` declaration, validating that some enclosing
    /// function scope already binds the name.
    pub fn declare_nonlocal(self: &Rc<Self>, name: &str) -> Result<(), RuntimeError> {
        match self.find_nonlocal_scope(name) {
            Some(_) => {
                self.globals.borrow_mut().remove(name);
                self.nonlocals.borrow_mut().insert(name.to_string());
                Ok(())
            }
            None => Err(RuntimeError::new(
                SYNTAX_ERROR,
                format!("no binding for nonlocal '{}' found", name),
            )),
        }
    }

    /// Writes a name following the declaration rules: `global` targets the
    /// outermost frame, `nonlocal` the nearest enclosing function frame
    /// that binds it, everything else the current frame.
    pub fn assign(self: &Rc<Self>, name: &str, value: Value) -> Result<(), RuntimeError> {
        if self.globals.borrow().contains(name) {
            self.outermost().define(name, value);
            return Ok(());
        }
        if self.nonlocals.borrow().contains(name) {
            match self.find_nonlocal_scope(name) {
                Some(scope) => {
                    scope.define(name, value);
                    return Ok(());
                }
                None => {
                    return Err(RuntimeError::new(
                        SYNTAX_ERROR,
                        format!("no binding for nonlocal '{}' found", name),
                    ))
                }
            }
        }
        self.define(name, value);
        Ok(())
    }

    /// The nearest enclosing function frame that binds `name` and has not
    /// declared it global. The current frame is skipped.
    fn find_nonlocal_scope(self: &Rc<Self>, name: &str) -> Option<Rc<Environment>> {
        let mut current = self.enclosing.clone();
        while let Some(scope) = current {
            if scope.function_scope && scope.defines(name) {
                if scope.globals.borrow().contains(name) {
                    return None;
                }
                return Some(scope);
            }
            current = scope.enclosing.clone();
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x", Value::Int(42));
        assert!(matches!(env.get("x"), Some(Value::Int(42))));
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn test_shadowing_and_parent_lookup() {
        let parent = Environment::new();
        parent.define("x", Value::Int(1));
        parent.define("y", Value::Int(2));

        let child = Environment::with_parent(parent, true);
        child.define("x", Value::Int(10));

        assert!(matches!(child.get("x"), Some(Value::Int(10))));
        assert!(matches!(child.get("y"), Some(Value::Int(2))));
    }

    #[test]
    fn test_plain_assignment_stays_local() {
        let global = Environment::new();
        global.define("x", Value::Int(1));

        let call = Environment::with_parent(global.clone(), true);
        call.assign("x", Value::Int(5)).unwrap();

        assert!(matches!(call.get("x"), Some(Value::Int(5))));
        assert!(matches!(global.get("x"), Some(Value::Int(1))));
    }

    #[test]
    fn test_global_declaration_writes_outermost() {
        let global = Environment::new();
        global.define("count", Value::Int(0));

        let call = Environment::with_parent(global.clone(), true);
        call.declare_global("count");
        call.assign("count", Value::Int(7)).unwrap();

        assert!(matches!(global.get("count"), Some(Value::Int(7))));
        assert!(!call.defines("count"));
    }

    #[test]
    fn test_nonlocal_targets_nearest_function_scope() {
        let global = Environment::new();
        let outer = Environment::with_parent(global, true);
        outer.define("n", Value::Int(1));

        let inner = Environment::with_parent(outer.clone(), true);
        inner.declare_nonlocal("n").unwrap();
        inner.assign("n", Value::Int(9)).unwrap();

        assert!(matches!(outer.get("n"), Some(Value::Int(9))));
        assert!(!inner.defines("n"));
    }

    #[test]
    fn test_nonlocal_without_binding_errors() {
        let global = Environment::new();
        global.define("n", Value::Int(1)); // global scope does not count

        let call = Environment::with_parent(global, true);
        let err = call.declare_nonlocal("n").unwrap_err();
        assert_eq!(
            err.describe(),
            "SyntaxError: no binding for nonlocal 'n' found"
        );
    }
}
