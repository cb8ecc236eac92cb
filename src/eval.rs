// ABOUTME: The tree-walking evaluator: statement and expression visitors
// over the AST, with control flow as explicit Unwind outcomes

use crate::ast::{
    CompClause, ComprehensionKind, ExceptHandler, Expr, FStringPiece, FunctionDecl, LiteralValue,
    Param, ParamKind, Stmt,
};
use crate::config::MAX_CALL_DEPTH;
use crate::env::Environment;
use crate::error::{
    Position, RuntimeError, Unwind, RECURSION_ERROR, STOP_EXECUTION, SYNTAX_ERROR, TYPE_ERROR,
};
use crate::format::format_value;
use crate::interpreter::Interpreter;
use crate::methods;
use crate::ops;
use crate::token::{Token, TokenKind};
use crate::value::{
    is_truthy, CallArgs, Class, DictStorage, Function, HashKey, Instance, SetStorage, Value,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type ExecResult = Result<(), Unwind>;
type EvalResult = Result<Value, Unwind>;

fn raise(err: RuntimeError, token: &Token) -> Unwind {
    Unwind::Raise(err.with_token(token))
}

fn position(token: &Token) -> Position {
    Position {
        line: token.line,
        column: token.column,
        lexeme: token.lexeme.clone(),
    }
}

impl Interpreter {
    /// Runs one top-level statement, capturing the value of a trailing
    /// expression statement for the embedding API. Assignments do not
    /// count as expression results.
    pub(crate) fn execute_top_level(&mut self, stmt: &Stmt, env: &Rc<Environment>) -> ExecResult {
        if let Stmt::Expression { expr } = stmt {
            self.check_stop()?;
            let value = self.evaluate_expr(expr, env)?;
            if !matches!(
                expr,
                Expr::Assign { .. }
                    | Expr::AugAssign { .. }
                    | Expr::IndexSet { .. }
                    | Expr::AttrSet { .. }
            ) {
                self.last_expression = Some(value);
            }
            return Ok(());
        }
        self.execute(stmt, env)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// The cooperative stop boundary: a pending host stop surfaces as a
    /// `StopExecution` exception exactly once, so it propagates through
    /// the try/except/else/finally protocol like any other exception.
    fn check_stop(&mut self) -> ExecResult {
        if self.take_stop_request() {
            return Err(Unwind::Raise(RuntimeError::new(
                STOP_EXECUTION,
                "execution stopped by host",
            )));
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt, env: &Rc<Environment>) -> ExecResult {
        self.check_stop()?;
        match stmt {
            Stmt::Expression { expr } => {
                self.evaluate_expr(expr, env)?;
                Ok(())
            }
            Stmt::If {
                branches,
                else_branch,
            } => {
                for (condition, body) in branches {
                    let value = self.evaluate_expr(condition, env)?;
                    if is_truthy(&value) {
                        return self.execute_block(body, env);
                    }
                }
                match else_branch {
                    Some(body) => self.execute_block(body, env),
                    None => Ok(()),
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                loop {
                    let value = self.evaluate_expr(condition, env)?;
                    if !is_truthy(&value) {
                        break;
                    }
                    match self.execute_block(body, env) {
                        Ok(()) | Err(Unwind::Continue(_)) => {}
                        Err(Unwind::Break(_)) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::For {
                token,
                targets,
                iterable,
                body,
            } => {
                let iterable = self.evaluate_expr(iterable, env)?;
                let items = iterable
                    .iter_elements()
                    .map_err(|err| raise(err, token))?;
                for item in items {
                    self.bind_targets(targets, item, env, false)?;
                    match self.execute_block(body, env) {
                        Ok(()) | Err(Unwind::Continue(_)) => {}
                        Err(Unwind::Break(_)) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::FunctionDef { decl } => {
                let function = Function {
                    name: decl.name.lexeme.clone(),
                    decl: decl.clone(),
                    closure: env.clone(),
                };
                env.define(decl.name.lexeme.clone(), Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::ClassDef {
                name,
                superclass,
                methods,
            } => self.execute_class_def(name, superclass.as_ref(), methods, env),
            Stmt::Return { token: _, value } => {
                let value = match value {
                    Some(expr) => self.evaluate_expr(expr, env)?,
                    None => Value::None,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Pass => Ok(()),
            Stmt::Break { token } => Err(Unwind::Break(position(token))),
            Stmt::Continue { token } => Err(Unwind::Continue(position(token))),
            Stmt::Global { names } => {
                for name in names {
                    env.declare_global(&name.lexeme);
                }
                Ok(())
            }
            Stmt::Nonlocal { names } => {
                for name in names {
                    env.declare_nonlocal(&name.lexeme)
                        .map_err(|err| raise(err, name))?;
                }
                Ok(())
            }
            Stmt::Try {
                body,
                handlers,
                else_branch,
                finally,
            } => self.execute_try(body, handlers, else_branch.as_deref(), finally.as_deref(), env),
            Stmt::Raise { token, exception } => {
                let value = self.evaluate_expr(exception, env)?;
                let exception = match value {
                    Value::Class(class) => {
                        self.instantiate(&class, CallArgs::default(), token)?
                    }
                    Value::Exception(_) | Value::Instance(_) => value,
                    other => {
                        return Err(raise(
                            RuntimeError::new(
                                TYPE_ERROR,
                                format!(
                                    "exceptions must be classes or instances, not {}",
                                    other.type_name()
                                ),
                            ),
                            token,
                        ))
                    }
                };
                Err(raise(RuntimeError::from_value(exception), token))
            }
        }
    }

    pub(crate) fn execute_block(&mut self, stmts: &[Stmt], env: &Rc<Environment>) -> ExecResult {
        for stmt in stmts {
            self.execute(stmt, env)?;
        }
        Ok(())
    }

    fn execute_class_def(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        method_decls: &[Rc<FunctionDecl>],
        env: &Rc<Environment>,
    ) -> ExecResult {
        let superclass = match superclass {
            Some(expr) => match self.evaluate_expr(expr, env)? {
                Value::Class(class) => Some(class),
                other => {
                    return Err(raise(
                        RuntimeError::new(
                            TYPE_ERROR,
                            format!("class '{}' must inherit from a class, not {}",
                                name.lexeme,
                                other.type_name()
                            ),
                        ),
                        name,
                    ))
                }
            },
            None => None,
        };

        // The transient class-body environment. Methods capture it, which
        // is what makes `super` resolve statically to the immediate
        // superclass.
        let class_env = Environment::with_parent(env.clone(), false);
        if let Some(sup) = &superclass {
            class_env.define("super", Value::Class(sup.clone()));
        }

        let mut methods = HashMap::new();
        for decl in method_decls {
            let function = Function {
                name: format!("{}.{}", name.lexeme, decl.name.lexeme),
                decl: decl.clone(),
                closure: class_env.clone(),
            };
            methods.insert(decl.name.lexeme.clone(), Rc::new(function));
        }

        let class = Class {
            name: name.lexeme.clone(),
            superclass,
            methods,
            is_exception: false,
        };
        env.define(name.lexeme.clone(), Value::Class(Rc::new(class)));
        Ok(())
    }

    fn execute_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        else_branch: Option<&[Stmt]>,
        finally: Option<&[Stmt]>,
        env: &Rc<Environment>,
    ) -> ExecResult {
        let mut outcome = match self.execute_block(body, env) {
            Ok(()) => match else_branch {
                Some(body) => self.execute_block(body, env),
                None => Ok(()),
            },
            Err(Unwind::Raise(err)) => self.dispatch_handlers(handlers, err, env),
            Err(other) => Err(other),
        };

        // finally runs on every exit path, and its own unwind replaces
        // whatever was pending.
        if let Some(finally) = finally {
            if let Err(unwind) = self.execute_block(finally, env) {
                outcome = Err(unwind);
            }
        }
        outcome
    }

    fn dispatch_handlers(
        &mut self,
        handlers: &[ExceptHandler],
        err: RuntimeError,
        env: &Rc<Environment>,
    ) -> ExecResult {
        for handler in handlers {
            if !self.handler_matches(handler, &err, env)? {
                continue;
            }
            if let Some(binding) = &handler.binding {
                env.define(binding.lexeme.clone(), err.exception.clone());
            }
            let result = self.execute_block(&handler.body, env);
            if let Some(binding) = &handler.binding {
                env.remove(&binding.lexeme);
            }
            return result;
        }
        Err(Unwind::Raise(err))
    }

    fn handler_matches(
        &mut self,
        handler: &ExceptHandler,
        err: &RuntimeError,
        env: &Rc<Environment>,
    ) -> Result<bool, Unwind> {
        let Some(class_expr) = &handler.class else {
            return Ok(true); // unqualified except catches everything
        };
        let class = match self.evaluate_expr(class_expr, env)? {
            Value::Class(class) => class,
            other => {
                return Err(raise(
                    RuntimeError::new(
                        TYPE_ERROR,
                        format!(
                            "catching '{}' that is not a class is not allowed",
                            other.type_name()
                        ),
                    ),
                    &handler.token,
                ))
            }
        };
        if class.name == "Exception" && class.is_exception {
            return Ok(true);
        }
        Ok(match &err.exception {
            Value::Exception(exc) => class.is_exception && class.name == exc.kind,
            Value::Instance(inst) => inst.class.derives_from(&class),
            _ => false,
        })
    }

    /// Binds loop targets, unpacking when there is more than one. `local`
    /// selects plain definition (comprehension scopes) over assignment.
    fn bind_targets(
        &mut self,
        targets: &[Token],
        item: Value,
        env: &Rc<Environment>,
        local: bool,
    ) -> ExecResult {
        let bind = |name: &Token, value: Value| -> ExecResult {
            if local {
                env.define(name.lexeme.clone(), value);
                Ok(())
            } else {
                env.assign(&name.lexeme, value)
                    .map_err(|err| raise(err, name))
            }
        };
        if targets.len() == 1 {
            return bind(&targets[0], item);
        }
        let values = item.iter_elements().map_err(|_| {
            raise(
                RuntimeError::type_error(format!(
                    "cannot unpack non-iterable {} object",
                    item.type_name()
                )),
                &targets[0],
            )
        })?;
        if values.len() < targets.len() {
            return Err(raise(
                RuntimeError::value_error(format!(
                    "not enough values to unpack (expected {}, got {})",
                    targets.len(),
                    values.len()
                )),
                &targets[0],
            ));
        }
        if values.len() > targets.len() {
            return Err(raise(
                RuntimeError::value_error(format!(
                    "too many values to unpack (expected {})",
                    targets.len()
                )),
                &targets[0],
            ));
        }
        for (name, value) in targets.iter().zip(values) {
            bind(name, value)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub(crate) fn evaluate_expr(&mut self, expr: &Expr, env: &Rc<Environment>) -> EvalResult {
        match expr {
            Expr::Literal { value, .. } => Ok(match value {
                LiteralValue::None => Value::None,
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Int(i) => Value::Int(*i),
                LiteralValue::Float(f) => Value::Float(*f),
                LiteralValue::Str(s) => Value::str(s.clone()),
            }),
            Expr::FString { pieces, token } => {
                let mut out = String::new();
                for piece in pieces {
                    match piece {
                        FStringPiece::Literal(text) => out.push_str(text),
                        FStringPiece::Expr { expr, format_spec } => {
                            let value = self.evaluate_expr(expr, env)?;
                            match format_spec {
                                Some(spec) => {
                                    let formatted = format_value(&value, spec)
                                        .map_err(|err| raise(err, token))?;
                                    out.push_str(&formatted);
                                }
                                None => out.push_str(&format!("{}", value)),
                            }
                        }
                    }
                }
                Ok(Value::str(out))
            }
            Expr::Variable { name } => env.get(&name.lexeme).ok_or_else(|| {
                raise(
                    RuntimeError::new(
                        crate::error::NAME_ERROR,
                        format!("name '{}' is not defined", name.lexeme),
                    ),
                    name,
                )
            }),
            Expr::ListLiteral { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_expr(element, env)?);
                }
                Ok(Value::list(items))
            }
            Expr::TupleLiteral { elements, .. } => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate_expr(element, env)?);
                }
                Ok(Value::tuple(items))
            }
            Expr::SetLiteral { elements, token } => {
                let mut storage = SetStorage::default();
                for element in elements {
                    let value = self.evaluate_expr(element, env)?;
                    let key = HashKey::try_new(value).map_err(|err| raise(err, token))?;
                    storage.insert(key);
                }
                Ok(Value::set(storage))
            }
            Expr::DictLiteral { pairs, token } => {
                let mut storage = DictStorage::default();
                for (key_expr, value_expr) in pairs {
                    let key = self.evaluate_expr(key_expr, env)?;
                    let value = self.evaluate_expr(value_expr, env)?;
                    let key = HashKey::try_new(key).map_err(|err| raise(err, token))?;
                    storage.insert(key, value);
                }
                Ok(Value::dict(storage))
            }
            Expr::IndexGet {
                object,
                index,
                token,
            } => {
                let object = self.evaluate_expr(object, env)?;
                let index = self.evaluate_expr(index, env)?;
                ops::index_get(&object, &index).map_err(|err| raise(err, token))
            }
            Expr::IndexSet {
                object,
                index,
                value,
                token,
            } => {
                let object = self.evaluate_expr(object, env)?;
                let index = self.evaluate_expr(index, env)?;
                let value = self.evaluate_expr(value, env)?;
                ops::index_set(&object, &index, value.clone())
                    .map_err(|err| raise(err, token))?;
                Ok(value)
            }
            Expr::AttrGet { object, name } => {
                let object = self.evaluate_expr(object, env)?;
                self.attr_get(&object, name)
            }
            Expr::AttrSet {
                object,
                name,
                value,
            } => {
                let object = self.evaluate_expr(object, env)?;
                let value = self.evaluate_expr(value, env)?;
                match &object {
                    Value::Instance(instance) => {
                        instance
                            .fields
                            .borrow_mut()
                            .insert(name.lexeme.clone(), value.clone());
                        Ok(value)
                    }
                    other => Err(raise(
                        RuntimeError::new(
                            crate::error::ATTRIBUTE_ERROR,
                            format!(
                                "'{}' object has no attribute '{}'",
                                other.type_name(),
                                name.lexeme
                            ),
                        ),
                        name,
                    )),
                }
            }
            Expr::Slice {
                object,
                start,
                stop,
                step,
                token,
            } => {
                let object = self.evaluate_expr(object, env)?;
                let start = self.evaluate_optional(start.as_deref(), env)?;
                let stop = self.evaluate_optional(stop.as_deref(), env)?;
                let step = self.evaluate_optional(step.as_deref(), env)?;
                ops::slice_sequence(&object, start.as_ref(), stop.as_ref(), step.as_ref())
                    .map_err(|err| raise(err, token))
            }
            Expr::Unary { op, operand } => {
                let operand = self.evaluate_expr(operand, env)?;
                ops::unary_op(op.kind, &operand).map_err(|err| raise(err, op))
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate_expr(left, env)?;
                let right = self.evaluate_expr(right, env)?;
                ops::binary_op(op.kind, &left, &right).map_err(|err| raise(err, op))
            }
            Expr::Compare { first, rest } => {
                // Chained: a < b < c evaluates b once and short-circuits.
                let mut prev = self.evaluate_expr(first, env)?;
                for (op, token, operand) in rest {
                    let next = self.evaluate_expr(operand, env)?;
                    let holds =
                        ops::compare_op(*op, &prev, &next).map_err(|err| raise(err, token))?;
                    if !holds {
                        return Ok(Value::Bool(false));
                    }
                    prev = next;
                }
                Ok(Value::Bool(true))
            }
            Expr::Logical { left, op, right } => {
                let left = self.evaluate_expr(left, env)?;
                let take_left = match op.kind {
                    TokenKind::Or => is_truthy(&left),
                    _ => !is_truthy(&left),
                };
                if take_left {
                    Ok(left)
                } else {
                    self.evaluate_expr(right, env)
                }
            }
            Expr::Assign { name, value } => {
                let value = self.evaluate_expr(value, env)?;
                env.assign(&name.lexeme, value.clone())
                    .map_err(|err| raise(err, name))?;
                Ok(value)
            }
            Expr::AugAssign { target, op, value } => self.eval_aug_assign(target, op, value, env),
            Expr::Call {
                callee,
                args,
                kwargs,
                token,
            } => {
                let callee = self.evaluate_expr(callee, env)?;
                let mut call_args = CallArgs::default();
                for arg in args {
                    call_args.positional.push(self.evaluate_expr(arg, env)?);
                }
                for (name, value) in kwargs {
                    let value = self.evaluate_expr(value, env)?;
                    call_args.keyword.push((name.lexeme.clone(), value));
                }
                self.call_value(callee, call_args, token)
            }
            Expr::Lambda {
                params,
                body,
                token,
            } => {
                let decl = FunctionDecl {
                    name: Token::new(TokenKind::Identifier, "<lambda>", token.line, token.column),
                    params: params.clone(),
                    body: vec![Stmt::Return {
                        token: token.clone(),
                        value: Some((**body).clone()),
                    }],
                };
                Ok(Value::Function(Rc::new(Function {
                    name: "<lambda>".to_string(),
                    decl: Rc::new(decl),
                    closure: env.clone(),
                })))
            }
            Expr::Comprehension {
                kind,
                element,
                value,
                clauses,
                token,
            } => self.eval_comprehension(*kind, element, value.as_deref(), clauses, env, token),
            Expr::SuperCall { token, method } => self.eval_super(token, method, env),
        }
    }

    fn evaluate_optional(
        &mut self,
        expr: Option<&Expr>,
        env: &Rc<Environment>,
    ) -> Result<Option<Value>, Unwind> {
        match expr {
            Some(expr) => Ok(Some(self.evaluate_expr(expr, env)?)),
            None => Ok(None),
        }
    }

    fn attr_get(&mut self, object: &Value, name: &Token) -> EvalResult {
        let missing = || {
            raise(
                RuntimeError::new(
                    crate::error::ATTRIBUTE_ERROR,
                    format!(
                        "'{}' object has no attribute '{}'",
                        object.type_name(),
                        name.lexeme
                    ),
                ),
                name,
            )
        };
        match object {
            Value::Instance(instance) => {
                if let Some(value) = instance.fields.borrow().get(&name.lexeme) {
                    return Ok(value.clone());
                }
                match instance.class.find_method(&name.lexeme) {
                    Some(method) => Ok(Value::BoundMethod(Rc::new(
                        crate::value::BoundMethod {
                            receiver: object.clone(),
                            function: method,
                        },
                    ))),
                    None => Err(missing()),
                }
            }
            Value::Class(class) => match class.find_method(&name.lexeme) {
                Some(method) => Ok(Value::Function(method)),
                None => Err(missing()),
            },
            _ => methods::lookup(object, &name.lexeme).ok_or_else(missing),
        }
    }

    fn eval_aug_assign(
        &mut self,
        target: &Expr,
        op: &Token,
        value: &Expr,
        env: &Rc<Environment>,
    ) -> EvalResult {
        let base_op = ops::augmented_base(op.kind);
        match target {
            Expr::Variable { name } => {
                let current = env.get(&name.lexeme).ok_or_else(|| {
                    raise(
                        RuntimeError::new(
                            crate::error::NAME_ERROR,
                            format!("name '{}' is not defined", name.lexeme),
                        ),
                        name,
                    )
                })?;
                let operand = self.evaluate_expr(value, env)?;
                let updated =
                    ops::binary_op(base_op, &current, &operand).map_err(|err| raise(err, op))?;
                env.assign(&name.lexeme, updated.clone())
                    .map_err(|err| raise(err, name))?;
                Ok(updated)
            }
            Expr::IndexGet {
                object,
                index,
                token,
            } => {
                let object = self.evaluate_expr(object, env)?;
                let index = self.evaluate_expr(index, env)?;
                let current =
                    ops::index_get(&object, &index).map_err(|err| raise(err, token))?;
                let operand = self.evaluate_expr(value, env)?;
                let updated =
                    ops::binary_op(base_op, &current, &operand).map_err(|err| raise(err, op))?;
                ops::index_set(&object, &index, updated.clone())
                    .map_err(|err| raise(err, token))?;
                Ok(updated)
            }
            Expr::AttrGet { object, name } => {
                let object = self.evaluate_expr(object, env)?;
                let current = self.attr_get(&object, name)?;
                let operand = self.evaluate_expr(value, env)?;
                let updated =
                    ops::binary_op(base_op, &current, &operand).map_err(|err| raise(err, op))?;
                match &object {
                    Value::Instance(instance) => {
                        instance
                            .fields
                            .borrow_mut()
                            .insert(name.lexeme.clone(), updated.clone());
                        Ok(updated)
                    }
                    other => Err(raise(
                        RuntimeError::new(
                            crate::error::ATTRIBUTE_ERROR,
                            format!(
                                "'{}' object has no attribute '{}'",
                                other.type_name(),
                                name.lexeme
                            ),
                        ),
                        name,
                    )),
                }
            }
            other => Err(raise(
                RuntimeError::new(SYNTAX_ERROR, "invalid augmented assignment target"),
                other.token(),
            )),
        }
    }

    fn eval_comprehension(
        &mut self,
        kind: ComprehensionKind,
        element: &Expr,
        value: Option<&Expr>,
        clauses: &[CompClause],
        env: &Rc<Environment>,
        token: &Token,
    ) -> EvalResult {
        enum Accumulator {
            List(Vec<Value>),
            Set(SetStorage),
            Dict(DictStorage),
        }
        let mut acc = match kind {
            ComprehensionKind::List => Accumulator::List(Vec::new()),
            ComprehensionKind::Set => Accumulator::Set(SetStorage::default()),
            ComprehensionKind::Dict => Accumulator::Dict(DictStorage::default()),
        };

        // Recursive walk over the clause list: each `for` opens a child
        // scope per tick, each `if` filters within the current scope.
        fn tick(
            interp: &mut Interpreter,
            clauses: &[CompClause],
            element: &Expr,
            value: Option<&Expr>,
            env: &Rc<Environment>,
            token: &Token,
            acc: &mut Accumulator,
        ) -> ExecResult {
            let Some((clause, rest)) = clauses.split_first() else {
                let elem = interp.evaluate_expr(element, env)?;
                match acc {
                    Accumulator::List(items) => items.push(elem),
                    Accumulator::Set(storage) => {
                        let key =
                            HashKey::try_new(elem).map_err(|err| raise(err, token))?;
                        storage.insert(key);
                    }
                    Accumulator::Dict(storage) => {
                        let key =
                            HashKey::try_new(elem).map_err(|err| raise(err, token))?;
                        let value = interp.evaluate_expr(
                            value.expect("dict comprehension carries a value expression"),
                            env,
                        )?;
                        storage.insert(key, value);
                    }
                }
                return Ok(());
            };
            match clause {
                CompClause::For { targets, iterable } => {
                    let iterable = interp.evaluate_expr(iterable, env)?;
                    let items = iterable
                        .iter_elements()
                        .map_err(|err| raise(err, token))?;
                    for item in items {
                        let scope = Environment::with_parent(env.clone(), false);
                        interp.bind_targets(targets, item, &scope, true)?;
                        tick(interp, rest, element, value, &scope, token, acc)?;
                    }
                    Ok(())
                }
                CompClause::If { condition } => {
                    let cond = interp.evaluate_expr(condition, env)?;
                    if is_truthy(&cond) {
                        tick(interp, rest, element, value, env, token, acc)?;
                    }
                    Ok(())
                }
            }
        }

        tick(self, clauses, element, value, env, token, &mut acc)?;
        Ok(match acc {
            Accumulator::List(items) => Value::list(items),
            Accumulator::Set(storage) => Value::set(storage),
            Accumulator::Dict(storage) => Value::dict(storage),
        })
    }

    fn eval_super(&mut self, token: &Token, method: &Token, env: &Rc<Environment>) -> EvalResult {
        let superclass = match env.get("super") {
            Some(Value::Class(class)) => class,
            _ => {
                return Err(raise(
                    RuntimeError::new(
                        SYNTAX_ERROR,
                        "'super' used outside a subclass method",
                    ),
                    token,
                ))
            }
        };
        let receiver = env.get("self").ok_or_else(|| {
            raise(
                RuntimeError::new(SYNTAX_ERROR, "'super' used outside a method"),
                token,
            )
        })?;
        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::BoundMethod(Rc::new(crate::value::BoundMethod {
                receiver,
                function,
            }))),
            None => Err(raise(
                RuntimeError::new(
                    crate::error::ATTRIBUTE_ERROR,
                    format!(
                        "'super' object has no attribute '{}'",
                        method.lexeme
                    ),
                ),
                method,
            )),
        }
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    pub(crate) fn call_value(
        &mut self,
        callee: Value,
        args: CallArgs,
        token: &Token,
    ) -> EvalResult {
        match callee {
            Value::Function(function) => self.call_function(&function, args, None, token),
            Value::BoundMethod(method) => {
                self.call_function(&method.function, args, Some(method.receiver.clone()), token)
            }
            Value::Builtin(builtin) => {
                (builtin.func)(self, args).map_err(|err| raise(err, token))
            }
            Value::NativeMethod(method) => {
                (method.func)(&method.receiver, args).map_err(|err| raise(err, token))
            }
            Value::HostFunction(host) => (host.func)(args.positional, args.keyword)
                .map_err(|message| {
                    raise(RuntimeError::new("Exception", message), token)
                }),
            Value::Class(class) => self.instantiate(&class, args, token),
            other => Err(raise(
                RuntimeError::type_error(format!(
                    "'{}' object is not callable",
                    other.type_name()
                )),
                token,
            )),
        }
    }

    /// Argument binding per the calling convention: bound receiver first,
    /// then declared parameters consume positionals, keywords, and
    /// defaults in order, then *args and **kwargs absorb the rest.
    fn call_function(
        &mut self,
        func: &Rc<Function>,
        mut args: CallArgs,
        bound_receiver: Option<Value>,
        token: &Token,
    ) -> EvalResult {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(raise(
                RuntimeError::new(RECURSION_ERROR, "maximum recursion depth exceeded"),
                token,
            ));
        }
        if let Some(receiver) = bound_receiver {
            args.positional.insert(0, receiver);
        }

        let decl = func.decl.clone();
        let env = Environment::with_parent(func.closure.clone(), true);

        let mut positionals = args.positional.into_iter();
        let mut keywords: Vec<(String, Value)> = Vec::new();
        for (name, value) in args.keyword {
            if keywords.iter().any(|(existing, _)| *existing == name) {
                return Err(raise(
                    RuntimeError::type_error(format!(
                        "{}() got multiple values for keyword argument '{}'",
                        func.name, name
                    )),
                    token,
                ));
            }
            keywords.push((name, value));
        }

        for param in &decl.params {
            match param.kind {
                ParamKind::Plain => {
                    let value = self.bind_plain_param(
                        func,
                        param,
                        &mut positionals,
                        &mut keywords,
                        token,
                    )?;
                    env.define(param.name.lexeme.clone(), value);
                }
                ParamKind::VarArgs => {
                    let rest: Vec<Value> = positionals.by_ref().collect();
                    env.define(param.name.lexeme.clone(), Value::tuple(rest));
                }
                ParamKind::KwArgs => {
                    let mut storage = DictStorage::default();
                    for (name, value) in keywords.drain(..) {
                        storage.insert(
                            HashKey::try_new(Value::str(name))
                                .map_err(|err| raise(err, token))?,
                            value,
                        );
                    }
                    env.define(param.name.lexeme.clone(), Value::dict(storage));
                }
            }
        }

        let excess: Vec<Value> = positionals.collect();
        if !excess.is_empty() {
            let declared = decl
                .params
                .iter()
                .filter(|p| p.kind == ParamKind::Plain)
                .count();
            return Err(raise(
                RuntimeError::type_error(format!(
                    "{}() takes {} positional argument{} but {} were given",
                    func.name,
                    declared,
                    if declared == 1 { "" } else { "s" },
                    declared + excess.len()
                )),
                token,
            ));
        }
        if let Some((name, _)) = keywords.first() {
            return Err(raise(
                RuntimeError::type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    func.name, name
                )),
                token,
            ));
        }

        self.call_depth += 1;
        let result = self.execute_block(&decl.body, &env);
        self.call_depth -= 1;

        match result {
            Ok(()) => Ok(Value::None),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Break(pos)) => {
                Err(Unwind::Raise(Unwind::Break(pos).into_escape_error()))
            }
            Err(Unwind::Continue(pos)) => {
                Err(Unwind::Raise(Unwind::Continue(pos).into_escape_error()))
            }
            Err(other) => Err(other),
        }
    }

    fn bind_plain_param(
        &mut self,
        func: &Rc<Function>,
        param: &Param,
        positionals: &mut std::vec::IntoIter<Value>,
        keywords: &mut Vec<(String, Value)>,
        token: &Token,
    ) -> EvalResult {
        let keyword_index = keywords
            .iter()
            .position(|(name, _)| *name == param.name.lexeme);
        if let Some(value) = positionals.next() {
            if keyword_index.is_some() {
                return Err(raise(
                    RuntimeError::type_error(format!(
                        "{}() got multiple values for argument '{}'",
                        func.name, param.name.lexeme
                    )),
                    token,
                ));
            }
            return Ok(value);
        }
        if let Some(index) = keyword_index {
            return Ok(keywords.remove(index).1);
        }
        if let Some(default) = &param.default {
            // Defaults are evaluated in the closure environment at call
            // time, not at definition time.
            return self.evaluate_expr(default, &func.closure);
        }
        Err(raise(
            RuntimeError::type_error(format!(
                "{}() missing required argument: '{}'",
                func.name, param.name.lexeme
            )),
            token,
        ))
    }

    /// Calling a class: builtin exception classes construct exception
    /// values; regular classes allocate an instance and run `__init__`.
    pub(crate) fn instantiate(
        &mut self,
        class: &Rc<Class>,
        args: CallArgs,
        token: &Token,
    ) -> EvalResult {
        if class.is_exception {
            let message = match args.positional.len() {
                0 => String::new(),
                1 => format!("{}", args.positional[0]),
                _ => Value::tuple(args.positional.clone()).repr(),
            };
            return Ok(Value::exception(&class.name, message));
        }

        let instance = Value::Instance(Rc::new(Instance {
            class: class.clone(),
            fields: RefCell::new(HashMap::new()),
        }));
        if let Some(init) = class.find_method("__init__") {
            self.call_function(&init, args, Some(instance.clone()), token)?;
        } else if !args.positional.is_empty() || !args.keyword.is_empty() {
            if class.is_exception_kind() {
                // Exception subclasses without __init__ keep their
                // constructor arguments, Python-style.
                if let Value::Instance(inst) = &instance {
                    inst.fields
                        .borrow_mut()
                        .insert("args".to_string(), Value::tuple(args.positional));
                }
            } else {
                return Err(raise(
                    RuntimeError::type_error(format!(
                        "{}() takes no arguments",
                        class.name
                    )),
                    token,
                ));
            }
        }
        Ok(instance)
    }
}

