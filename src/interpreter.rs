// ABOUTME: The embedding API: one Interpreter object owning the global
// environment, host callbacks, and the cooperative stop flag

use crate::builtins::register_builtins;
use crate::env::Environment;
use crate::error::{ExecError, HostResult, BUILTIN_EXCEPTIONS};
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::value::{Class, HostFunction, Value};
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle the host keeps to interrupt a running script from
/// another thread. The interpreter polls it at statement boundaries.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// An embeddable interpreter instance. Not reentrant: the host must
/// serialize calls to `evaluate`. Two instances share no state.
pub struct Interpreter {
    globals: Rc<Environment>,
    print_callback: Option<Box<dyn FnMut(&str)>>,
    error_callback: Option<Box<dyn FnMut(&str)>>,
    stop_flag: Arc<AtomicBool>,
    pub(crate) call_depth: usize,
    pub(crate) last_expression: Option<Value>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new();
        register_builtins(&globals);
        register_exception_classes(&globals);
        Interpreter {
            globals,
            print_callback: None,
            error_callback: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            call_depth: 0,
            last_expression: None,
        }
    }

    /// Runs a complete source unit through the lexer, parser, and
    /// evaluator. On success returns the value of the last top-level
    /// expression statement, if any. Every error is also reported through
    /// the error callback before this returns.
    pub fn evaluate(&mut self, source: &str) -> Result<Option<Value>, ExecError> {
        self.stop_flag.store(false, Ordering::SeqCst);
        self.last_expression = None;

        let tokens = tokenize(source).map_err(|err| {
            self.report(&err.to_string());
            ExecError::Lex(err)
        })?;
        debug!("lexed {} tokens", tokens.len());

        let (statements, errors) = parse(tokens);
        if !errors.is_empty() {
            for err in &errors {
                self.report(&err.to_string());
            }
            return Err(ExecError::Syntax(errors));
        }
        debug!("parsed {} statements", statements.len());

        let env = self.globals.clone();
        for stmt in &statements {
            if let Err(unwind) = self.execute_top_level(stmt, &env) {
                let err = unwind.into_escape_error();
                self.report(&err.to_string());
                return Err(ExecError::Runtime(err));
            }
        }
        Ok(self.last_expression.take())
    }

    /// Receives every fragment `print` produces, already formatted.
    /// Without a callback, output goes to stdout.
    pub fn register_print_callback(&mut self, callback: impl FnMut(&str) + 'static) {
        self.print_callback = Some(Box::new(callback));
    }

    /// Receives formatted error messages (`[line L, col C] Kind: ...`).
    /// Without a callback, errors go to stderr.
    pub fn register_error_callback(&mut self, callback: impl FnMut(&str) + 'static) {
        self.error_callback = Some(Box::new(callback));
    }

    /// Exposes a host callable under `name` in the global environment.
    /// The function receives evaluated positional and keyword arguments;
    /// an `Err(message)` surfaces as a catchable exception.
    pub fn register_function(
        &mut self,
        name: &str,
        func: impl Fn(Vec<Value>, Vec<(String, Value)>) -> HostResult + 'static,
    ) {
        self.globals.define(
            name,
            Value::HostFunction(Rc::new(HostFunction {
                name: name.to_string(),
                func: Box::new(func),
            })),
        );
    }

    /// Requests cooperative termination of the current run.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    /// A handle that can stop this interpreter from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: self.stop_flag.clone(),
        }
    }

    /// The outermost environment (builtins plus top-level bindings).
    pub fn global_environment(&self) -> &Rc<Environment> {
        &self.globals
    }

    /// Consumes a pending stop request. The evaluator polls this at
    /// statement boundaries and raises `StopExecution` once per request,
    /// so handler and finally suites still execute while the exception
    /// propagates.
    pub(crate) fn take_stop_request(&self) -> bool {
        self.stop_flag.swap(false, Ordering::SeqCst)
    }

    pub(crate) fn emit_output(&mut self, text: &str) {
        match &mut self.print_callback {
            Some(callback) => callback(text),
            None => print!("{}", text),
        }
    }

    pub(crate) fn report(&mut self, message: &str) {
        match &mut self.error_callback {
            Some(callback) => callback(message),
            None => eprintln!("{}", message),
        }
    }
}

/// Registers the builtin exception classes: an `Exception` base that
/// catches everything, and one class per concrete kind.
fn register_exception_classes(env: &Rc<Environment>) {
    let base = Rc::new(Class {
        name: "Exception".to_string(),
        superclass: None,
        methods: HashMap::new(),
        is_exception: true,
    });
    env.define("Exception", Value::Class(base.clone()));
    for kind in BUILTIN_EXCEPTIONS {
        if *kind == "Exception" {
            continue;
        }
        env.define(
            *kind,
            Value::Class(Rc::new(Class {
                name: kind.to_string(),
                superclass: Some(base.clone()),
                methods: HashMap::new(),
                is_exception: true,
            })),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_classes_registered() {
        let interp = Interpreter::new();
        for kind in ["Exception", "ZeroDivisionError", "TypeError", "KeyError"] {
            assert!(
                matches!(interp.global_environment().get(kind), Some(Value::Class(_))),
                "missing exception class {}",
                kind
            );
        }
    }

    #[test]
    fn test_two_instances_share_no_state() {
        let mut a = Interpreter::new();
        let b = Interpreter::new();
        a.evaluate("x = 1").unwrap();
        assert!(a.global_environment().get("x").is_some());
        assert!(b.global_environment().get("x").is_none());
    }
}
