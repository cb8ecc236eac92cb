// ABOUTME: Runtime value representation: the tagged Value union, equality and
// ordering across the numeric groups, hashing for dict keys and set members,
// and the str()/repr() renderings

use crate::ast::FunctionDecl;
use crate::env::Environment;
use crate::error::{HostResult, RuntimeError, TYPE_ERROR};
use indexmap::{IndexMap, IndexSet};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Seed for folding tuple element hashes. Any fixed odd constant works as
/// long as the fold is deterministic and consistent with equality.
const TUPLE_HASH_SEED: u64 = 0x345678;
const TUPLE_HASH_MULT: u64 = 1000003;

pub type DictStorage = IndexMap<HashKey, Value>;
pub type SetStorage = IndexSet<HashKey>;

/// A runtime value. Containers are reference-semantic: cloning a `Value`
/// clones the handle, not the storage, so two bindings can observe each
/// other's mutations.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Set(Rc<RefCell<SetStorage>>),
    Dict(Rc<RefCell<DictStorage>>),
    Function(Rc<Function>),
    Builtin(Rc<Builtin>),
    HostFunction(Rc<HostFunction>),
    BoundMethod(Rc<BoundMethod>),
    NativeMethod(Rc<NativeMethod>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Exception(Rc<ExceptionObj>),
}

// ============================================================================
// Callable and object payloads
// ============================================================================

/// A user-defined function together with its captured closure. Methods
/// capture the transient class-body environment, which is what makes
/// `super` resolve statically.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<Environment>,
}

/// Evaluated argument list for any call: positionals in order, then
/// keyword arguments in source order.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn positional(args: Vec<Value>) -> Self {
        CallArgs {
            positional: args,
            keyword: Vec::new(),
        }
    }
}

pub type BuiltinFn =
    fn(&mut crate::interpreter::Interpreter, CallArgs) -> Result<Value, RuntimeError>;

/// Entry in the fixed builtin-function catalog.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

pub type NativeFn = fn(&Value, CallArgs) -> Result<Value, RuntimeError>;

/// A native container method already bound to its receiver: one record of
/// (receiver handle, implementation pointer, name) for every container
/// kind rather than a type per container.
#[derive(Debug)]
pub struct NativeMethod {
    pub name: &'static str,
    pub receiver: Value,
    pub func: NativeFn,
}

/// A host-registered callable exposed under a global name.
pub struct HostFunction {
    pub name: String,
    pub func: Box<dyn Fn(Vec<Value>, Vec<(String, Value)>) -> HostResult>,
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A user-defined method bound to a receiver; calls prepend the receiver
/// as the first positional argument.
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub function: Rc<Function>,
}

/// A class object: name, optional single superclass, and method table.
/// Builtin exception classes carry no methods and construct exception
/// values when called.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    pub methods: HashMap<String, Rc<Function>>,
    pub is_exception: bool,
}

impl Class {
    /// Walks the inheritance chain for a method.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }
        self.superclass
            .as_ref()
            .and_then(|sup| sup.find_method(name))
    }

    /// True if `self` is `other` or inherits from it.
    pub fn derives_from(self: &Rc<Self>, other: &Rc<Class>) -> bool {
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if Rc::ptr_eq(&class, other) {
                return true;
            }
            current = class.superclass.clone();
        }
        false
    }

    /// True if any class on the chain is a builtin exception class.
    pub fn is_exception_kind(self: &Rc<Self>) -> bool {
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if class.is_exception {
                return true;
            }
            current = class.superclass.clone();
        }
        false
    }
}

/// An instance owns its attribute dictionary; the class owns behavior.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<HashMap<String, Value>>,
}

/// A builtin exception value: kind string plus human-readable message.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionObj {
    pub kind: String,
    pub message: String,
}

// ============================================================================
// Constructors
// ============================================================================

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(Rc::from(s.into().as_str()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub fn set(storage: SetStorage) -> Self {
        Value::Set(Rc::new(RefCell::new(storage)))
    }

    pub fn dict(storage: DictStorage) -> Self {
        Value::Dict(Rc::new(RefCell::new(storage)))
    }

    pub fn exception(kind: &str, message: impl Into<String>) -> Self {
        Value::Exception(Rc::new(ExceptionObj {
            kind: kind.to_string(),
            message: message.into(),
        }))
    }

    /// The `Kind: message` line used when an exception surfaces through
    /// the error callback.
    pub fn exception_summary(&self) -> String {
        match self {
            Value::Exception(exc) if exc.message.is_empty() => exc.kind.clone(),
            Value::Exception(exc) => format!("{}: {}", exc.kind, exc.message),
            Value::Instance(inst) => match instance_exception_message(inst) {
                Some(message) if !message.is_empty() => {
                    format!("{}: {}", inst.class.name, message)
                }
                _ => inst.class.name.clone(),
            },
            other => format!("{}", other),
        }
    }
}

/// For instances of exception classes, the str() message derived from the
/// stored constructor arguments, matching how Python stringifies
/// exceptions (`str(ValueError('x')) == 'x'`).
fn instance_exception_message(inst: &Instance) -> Option<String> {
    if !inst.class.is_exception_kind() {
        return None;
    }
    let args = inst.fields.borrow().get("args").cloned();
    Some(match args {
        Some(Value::Tuple(items)) if items.len() == 1 => format!("{}", items[0]),
        Some(Value::Tuple(items)) if !items.is_empty() => {
            Value::Tuple(items).repr()
        }
        _ => String::new(),
    })
}

// ============================================================================
// Truthiness, type names, numeric views
// ============================================================================

/// Python-family truthiness: None, numeric zero, and empty containers are
/// false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::None => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::List(items) => !items.borrow().is_empty(),
        Value::Tuple(items) => !items.is_empty(),
        Value::Set(items) => !items.borrow().is_empty(),
        Value::Dict(entries) => !entries.borrow().is_empty(),
        _ => true,
    }
}

impl Value {
    /// The canonical type name, as reported by `type()`.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Function(_) | Value::BoundMethod(_) => "function".to_string(),
            Value::Builtin(_) | Value::NativeMethod(_) | Value::HostFunction(_) => {
                "builtin_function_or_method".to_string()
            }
            Value::Class(_) => "type".to_string(),
            Value::Instance(inst) => inst.class.name.clone(),
            Value::Exception(exc) => exc.kind.clone(),
        }
    }
}

/// A number viewed through the numeric equality group: bools count as
/// their integer value.
enum Num {
    Int(i64),
    Float(f64),
}

fn as_num(value: &Value) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(*b as i64)),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

// ============================================================================
// Equality and ordering
// ============================================================================

/// Deep equality with Python's cross-type numeric rules. Never errors:
/// unrelated types simply compare unequal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        return match (x, y) {
            (Num::Int(i), Num::Int(j)) => i == j,
            (Num::Int(i), Num::Float(f)) | (Num::Float(f), Num::Int(i)) => f == i as f64,
            (Num::Float(f), Num::Float(g)) => f == g,
        };
    }
    match (a, b) {
        (Value::None, Value::None) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::List(x), Value::List(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| values_equal(a, b))
        }
        (Value::Tuple(x), Value::Tuple(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| values_equal(a, b))
        }
        (Value::Set(x), Value::Set(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len() && x.iter().all(|k| y.contains(k))
        }
        (Value::Dict(x), Value::Dict(y)) => {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            let (x, y) = (x.borrow(), y.borrow());
            x.len() == y.len()
                && x.iter().all(|(k, v)| {
                    y.get(k).map(|other| values_equal(v, other)).unwrap_or(false)
                })
        }
        (Value::Function(x), Value::Function(y)) => Rc::ptr_eq(x, y),
        (Value::Builtin(x), Value::Builtin(y)) => Rc::ptr_eq(x, y),
        (Value::HostFunction(x), Value::HostFunction(y)) => Rc::ptr_eq(x, y),
        (Value::BoundMethod(x), Value::BoundMethod(y)) => Rc::ptr_eq(x, y),
        (Value::NativeMethod(x), Value::NativeMethod(y)) => Rc::ptr_eq(x, y),
        (Value::Class(x), Value::Class(y)) => Rc::ptr_eq(x, y),
        (Value::Instance(x), Value::Instance(y)) => Rc::ptr_eq(x, y),
        (Value::Exception(x), Value::Exception(y)) => x == y,
        _ => false,
    }
}

/// Three-way comparison for the ordered types. Returns `Ok(None)` when the
/// operands are comparable but unordered (NaN); errors with the
/// Python-style message when the types cannot be ordered at all.
pub fn compare_values(op: &str, a: &Value, b: &Value) -> Result<Option<Ordering>, RuntimeError> {
    if let (Some(x), Some(y)) = (as_num(a), as_num(b)) {
        let ord = match (x, y) {
            (Num::Int(i), Num::Int(j)) => i.partial_cmp(&j),
            (Num::Int(i), Num::Float(f)) => (i as f64).partial_cmp(&f),
            (Num::Float(f), Num::Int(i)) => f.partial_cmp(&(i as f64)),
            (Num::Float(f), Num::Float(g)) => f.partial_cmp(&g),
        };
        return Ok(ord);
    }
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::List(x), Value::List(y)) => {
            let (x, y) = (x.borrow().clone(), y.borrow().clone());
            compare_sequences(op, &x, &y)
        }
        (Value::Tuple(x), Value::Tuple(y)) => compare_sequences(op, x, y),
        _ => Err(RuntimeError::type_error(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn compare_sequences(
    op: &str,
    a: &[Value],
    b: &[Value],
) -> Result<Option<Ordering>, RuntimeError> {
    for (x, y) in a.iter().zip(b.iter()) {
        if !values_equal(x, y) {
            return compare_values(op, x, y);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

// ============================================================================
// Hashing
// ============================================================================

/// A validated-hashable value usable as a dict key or set member. The
/// `Hash`/`Eq` impls agree with `values_equal`, including across the
/// numeric groups (`hash(True) == hash(1) == hash(1.0)`).
#[derive(Debug, Clone)]
pub struct HashKey(pub Value);

impl HashKey {
    /// Validates hashability; lists, dicts, sets, and instances are
    /// rejected with the Python-style TypeError.
    pub fn try_new(value: Value) -> Result<Self, RuntimeError> {
        fn check(value: &Value) -> Result<(), RuntimeError> {
            match value {
                Value::List(_)
                | Value::Set(_)
                | Value::Dict(_)
                | Value::Instance(_)
                | Value::Exception(_) => Err(RuntimeError::new(
                    TYPE_ERROR,
                    format!("unhashable type: '{}'", value.type_name()),
                )),
                Value::Tuple(items) => items.iter().try_for_each(check),
                _ => Ok(()),
            }
        }
        check(&value)?;
        Ok(HashKey(value))
    }

    fn raw_hash(value: &Value) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        Self::feed(value, &mut hasher);
        hasher.finish()
    }

    fn feed(value: &Value, state: &mut impl Hasher) {
        match value {
            Value::None => state.write_u8(0),
            // The numeric group hashes through a canonical form so that
            // equal numbers of different tags hash alike.
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
                state.write_u8(1);
                match as_num(value) {
                    Some(Num::Int(i)) => state.write_i64(i),
                    Some(Num::Float(f)) => {
                        if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                            state.write_i64(f as i64);
                        } else {
                            state.write_u64(f.to_bits());
                        }
                    }
                    None => unreachable!(),
                }
            }
            Value::Str(s) => {
                state.write_u8(2);
                state.write(s.as_bytes());
            }
            Value::Tuple(items) => {
                state.write_u8(3);
                let mut acc = TUPLE_HASH_SEED;
                for item in items.iter() {
                    acc = acc
                        .wrapping_mul(TUPLE_HASH_MULT)
                        .wrapping_add(Self::raw_hash(item));
                }
                state.write_u64(acc);
                state.write_usize(items.len());
            }
            Value::Class(c) => {
                state.write_u8(4);
                state.write_usize(Rc::as_ptr(c) as usize);
            }
            Value::Function(f) => {
                state.write_u8(5);
                state.write_usize(Rc::as_ptr(f) as usize);
            }
            Value::Builtin(b) => {
                state.write_u8(6);
                state.write_usize(Rc::as_ptr(b) as usize);
            }
            Value::HostFunction(h) => {
                state.write_u8(7);
                state.write_usize(Rc::as_ptr(h) as usize);
            }
            Value::BoundMethod(m) => {
                state.write_u8(8);
                state.write_usize(Rc::as_ptr(m) as usize);
            }
            Value::NativeMethod(m) => {
                state.write_u8(9);
                state.write_usize(Rc::as_ptr(m) as usize);
            }
            // Rejected by try_new; unreachable in valid keys.
            Value::List(_) | Value::Set(_) | Value::Dict(_) | Value::Instance(_)
            | Value::Exception(_) => state.write_u8(255),
        }
    }
}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Self::feed(&self.0, state);
    }
}

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        values_equal(&self.0, &other.0)
    }
}

impl Eq for HashKey {}

// ============================================================================
// Rendering: str() via Display, repr() explicit
// ============================================================================

pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "inf".to_string() } else { "-inf".to_string() }
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn repr_str(s: &str) -> String {
    // Python quote choice: single quotes unless the string contains a
    // single quote and no double quote.
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

impl Value {
    /// The unambiguous rendering, matching `repr()`.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => repr_str(s),
            Value::List(items) => {
                let parts: Vec<String> = items.borrow().iter().map(|v| v.repr()).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.repr()).collect();
                if parts.len() == 1 {
                    format!("({},)", parts[0])
                } else {
                    format!("({})", parts.join(", "))
                }
            }
            Value::Set(items) => {
                let items = items.borrow();
                if items.is_empty() {
                    "set()".to_string()
                } else {
                    let parts: Vec<String> = items.iter().map(|k| k.0.repr()).collect();
                    format!("{{{}}}", parts.join(", "))
                }
            }
            Value::Dict(entries) => {
                let parts: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.0.repr(), v.repr()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Exception(exc) => format!("{}({})", exc.kind, repr_str(&exc.message)),
            _ => format!("{}", self),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            // Containers render their elements with repr, like Python.
            Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::Dict(_) => {
                write!(f, "{}", self.repr())
            }
            Value::Function(func) => write!(f, "<function {}>", func.name),
            Value::Builtin(b) => write!(f, "<built-in function {}>", b.name),
            Value::HostFunction(h) => write!(f, "<built-in function {}>", h.name),
            Value::BoundMethod(m) => {
                write!(f, "<bound method {}>", m.function.name)
            }
            Value::NativeMethod(m) => {
                write!(f, "<built-in method {} of {}>", m.name, m.receiver.type_name())
            }
            Value::Class(c) => write!(f, "<class '{}'>", c.name),
            // Exceptions stringify to their message alone, like Python's
            // str(ValueError('x')) == 'x'.
            Value::Instance(inst) => match instance_exception_message(inst) {
                Some(message) => write!(f, "{}", message),
                None => write!(f, "<{} object>", inst.class.name),
            },
            Value::Exception(exc) => write!(f, "{}", exc.message),
        }
    }
}

// ============================================================================
// Iteration
// ============================================================================

impl Value {
    /// Materializes the elements of an iterable: list, tuple, string (as
    /// 1-character strings), set, or dict keys. Used by `for`,
    /// comprehensions, and the conversion builtins.
    pub fn iter_elements(&self) -> Result<Vec<Value>, RuntimeError> {
        match self {
            Value::List(items) => Ok(items.borrow().clone()),
            Value::Tuple(items) => Ok(items.as_ref().clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.to_string())).collect()),
            Value::Set(items) => Ok(items.borrow().iter().map(|k| k.0.clone()).collect()),
            Value::Dict(entries) => Ok(entries.borrow().keys().map(|k| k.0.clone()).collect()),
            _ => Err(RuntimeError::type_error(format!(
                "'{}' object is not iterable",
                self.type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_group_equality() {
        assert!(values_equal(&Value::Bool(true), &Value::Int(1)));
        assert!(values_equal(&Value::Bool(false), &Value::Int(0)));
        assert!(values_equal(&Value::Int(2), &Value::Float(2.0)));
        assert!(!values_equal(&Value::Int(2), &Value::Float(2.5)));
        assert!(!values_equal(&Value::Int(0), &Value::None));
    }

    #[test]
    fn test_deep_container_equality() {
        let a = Value::list(vec![Value::Int(1), Value::Float(2.0)]);
        let b = Value::list(vec![Value::Float(1.0), Value::Int(2)]);
        assert!(values_equal(&a, &b));

        let t1 = Value::tuple(vec![Value::str("x"), Value::Int(3)]);
        let t2 = Value::tuple(vec![Value::str("x"), Value::Int(3)]);
        assert!(values_equal(&t1, &t2));
        assert!(!values_equal(&t1, &Value::tuple(vec![Value::str("x")])));
    }

    #[test]
    fn test_numeric_group_hashing() {
        let mut set = SetStorage::default();
        set.insert(HashKey::try_new(Value::Int(1)).unwrap());
        // Adding True or 1.0 where 1 is present is a no-op.
        assert!(!set.insert(HashKey::try_new(Value::Bool(true)).unwrap()));
        assert!(!set.insert(HashKey::try_new(Value::Float(1.0)).unwrap()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unhashable_types() {
        let err = HashKey::try_new(Value::list(vec![])).unwrap_err();
        assert_eq!(err.describe(), "TypeError: unhashable type: 'list'");

        let nested = Value::tuple(vec![Value::Int(1), Value::list(vec![])]);
        assert!(HashKey::try_new(nested).is_err());

        let ok = Value::tuple(vec![Value::Int(1), Value::str("a")]);
        assert!(HashKey::try_new(ok).is_ok());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::None));
        assert!(!is_truthy(&Value::Int(0)));
        assert!(!is_truthy(&Value::Float(0.0)));
        assert!(!is_truthy(&Value::str("")));
        assert!(!is_truthy(&Value::list(vec![])));
        assert!(is_truthy(&Value::Int(-1)));
        assert!(is_truthy(&Value::str("0")));
        assert!(is_truthy(&Value::list(vec![Value::None])));
    }

    #[test]
    fn test_display_and_repr() {
        assert_eq!(format!("{}", Value::Float(30.0)), "30.0");
        assert_eq!(format!("{}", Value::Float(7.5)), "7.5");
        assert_eq!(format!("{}", Value::Bool(true)), "True");
        assert_eq!(format!("{}", Value::None), "None");
        assert_eq!(format!("{}", Value::str("hi")), "hi");
        assert_eq!(Value::str("hi").repr(), "'hi'");
        assert_eq!(Value::str("it's").repr(), "\"it's\"");

        let list = Value::list(vec![Value::Int(1), Value::str("a")]);
        assert_eq!(format!("{}", list), "[1, 'a']");

        let single = Value::tuple(vec![Value::Int(1)]);
        assert_eq!(single.repr(), "(1,)");
    }

    #[test]
    fn test_reference_semantics() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = a.clone();
        if let Value::List(items) = &a {
            items.borrow_mut().push(Value::Int(2));
        }
        if let Value::List(items) = &b {
            assert_eq!(items.borrow().len(), 2);
        } else {
            panic!("expected list");
        }
    }

    #[test]
    fn test_lexicographic_ordering() {
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(compare_values("<", &a, &b).unwrap(), Some(Ordering::Less));

        let err = compare_values("<", &Value::Int(1), &Value::str("x")).unwrap_err();
        assert_eq!(
            err.describe(),
            "TypeError: '<' not supported between instances of 'int' and 'str'"
        );
    }
}
