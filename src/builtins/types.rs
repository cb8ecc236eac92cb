//! Type-facing builtins: str, repr, bool, type, isinstance

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::methods::{check_arity, reject_kwargs};
use crate::value::{is_truthy, CallArgs, Value};

pub fn builtin_str(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("str", &args)?;
    check_arity("str", &args, 0, 1)?;
    match args.positional.first() {
        None => Ok(Value::str("")),
        Some(v) => Ok(Value::str(format!("{}", v))),
    }
}

pub fn builtin_repr(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("repr", &args)?;
    check_arity("repr", &args, 1, 1)?;
    Ok(Value::str(args.positional[0].repr()))
}

pub fn builtin_bool(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("bool", &args)?;
    check_arity("bool", &args, 0, 1)?;
    match args.positional.first() {
        None => Ok(Value::Bool(false)),
        Some(v) => Ok(Value::Bool(is_truthy(v))),
    }
}

/// `type(x)` reports the canonical class string, e.g. `<class 'int'>`.
pub fn builtin_type(_interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("type", &args)?;
    check_arity("type", &args, 1, 1)?;
    Ok(Value::str(format!(
        "<class '{}'>",
        args.positional[0].type_name()
    )))
}

/// `isinstance(obj, cls)` — class-chain membership for instances and
/// exceptions, name matching for primitives against the conversion
/// builtins (`int`, `str`, ...).
pub fn builtin_isinstance(
    _interp: &mut Interpreter,
    args: CallArgs,
) -> Result<Value, RuntimeError> {
    reject_kwargs("isinstance", &args)?;
    check_arity("isinstance", &args, 2, 2)?;
    let obj = &args.positional[0];
    match &args.positional[1] {
        Value::Class(class) => {
            let matched = match obj {
                Value::Instance(inst) => inst.class.derives_from(class),
                Value::Exception(exc) => {
                    class.name == "Exception" || class.name == exc.kind
                }
                _ => false,
            };
            Ok(Value::Bool(matched))
        }
        Value::Builtin(builtin) => {
            let type_name = obj.type_name();
            // bool is a subtype of int, as in Python.
            let matched = type_name == builtin.name
                || (builtin.name == "int" && matches!(obj, Value::Bool(_)));
            Ok(Value::Bool(matched))
        }
        other => Err(RuntimeError::type_error(format!(
            "isinstance() arg 2 must be a type, not {}",
            other.type_name()
        ))),
    }
}
