//! Container builtins: len and the list/tuple/set/dict conversions

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::methods::{check_arity, reject_kwargs};
use crate::methods::dict::{merge_kwargs, merge_source};
use crate::value::{CallArgs, DictStorage, HashKey, SetStorage, Value};

pub fn builtin_len(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("len", &args)?;
    check_arity("len", &args, 1, 1)?;
    let n = match &args.positional[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Set(items) => items.borrow().len(),
        Value::Dict(entries) => entries.borrow().len(),
        other => {
            return Err(RuntimeError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(n as i64))
}

pub fn builtin_list(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("list", &args)?;
    check_arity("list", &args, 0, 1)?;
    match args.positional.first() {
        None => Ok(Value::list(Vec::new())),
        Some(iterable) => Ok(Value::list(iterable.iter_elements()?)),
    }
}

pub fn builtin_tuple(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("tuple", &args)?;
    check_arity("tuple", &args, 0, 1)?;
    match args.positional.first() {
        None => Ok(Value::tuple(Vec::new())),
        Some(iterable) => Ok(Value::tuple(iterable.iter_elements()?)),
    }
}

pub fn builtin_set(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("set", &args)?;
    check_arity("set", &args, 0, 1)?;
    let mut storage = SetStorage::default();
    if let Some(iterable) = args.positional.first() {
        for item in iterable.iter_elements()? {
            storage.insert(HashKey::try_new(item)?);
        }
    }
    Ok(Value::set(storage))
}

/// `dict()`, `dict(mapping)`, `dict(pairs)`, `dict(**kwargs)` — any
/// combination of one positional source plus keyword entries.
pub fn builtin_dict(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    check_arity("dict", &args, 0, 1)?;
    let result = Value::dict(DictStorage::default());
    let Value::Dict(entries) = &result else {
        unreachable!();
    };
    if let Some(source) = args.positional.first() {
        merge_source(entries, source)?;
    }
    merge_kwargs(entries, args.keyword)?;
    Ok(result)
}
