// ABOUTME: Native methods on the builtin container types, dispatched as
// receiver-bound (receiver, implementation, name) records

use crate::error::RuntimeError;
use crate::value::{CallArgs, NativeFn, NativeMethod, Value};
use std::rc::Rc;

pub mod dict;
pub mod list;
pub mod set;
pub mod string;
pub mod tuple;

/// Resolves `receiver.method` for container receivers, yielding a bound
/// native method. Returns `None` when the receiver type has no such
/// method (the caller raises AttributeError).
pub fn lookup(receiver: &Value, name: &str) -> Option<Value> {
    let table: &[(&str, NativeFn)] = match receiver {
        Value::List(_) => list::METHODS,
        Value::Dict(_) => dict::METHODS,
        Value::Str(_) => string::METHODS,
        Value::Set(_) => set::METHODS,
        Value::Tuple(_) => tuple::METHODS,
        _ => return None,
    };
    table.iter().find(|(n, _)| *n == name).map(|(n, f)| {
        Value::NativeMethod(Rc::new(NativeMethod {
            name: n,
            receiver: receiver.clone(),
            func: *f,
        }))
    })
}

// ============================================================================
// Shared argument plumbing
// ============================================================================

/// Positional arity check; `max == usize::MAX` means unbounded.
pub(crate) fn check_arity(
    name: &str,
    args: &CallArgs,
    min: usize,
    max: usize,
) -> Result<(), RuntimeError> {
    let got = args.positional.len();
    if got < min || got > max {
        let expected = if min == max {
            format!("exactly {}", min)
        } else if max == usize::MAX {
            format!("at least {}", min)
        } else {
            format!("from {} to {}", min, max)
        };
        return Err(RuntimeError::type_error(format!(
            "{}() takes {} argument{} ({} given)",
            name,
            expected,
            if min == 1 && max == 1 { "" } else { "s" },
            got
        )));
    }
    Ok(())
}

pub(crate) fn reject_kwargs(name: &str, args: &CallArgs) -> Result<(), RuntimeError> {
    if let Some((key, _)) = args.keyword.first() {
        return Err(RuntimeError::type_error(format!(
            "{}() got an unexpected keyword argument '{}'",
            name, key
        )));
    }
    Ok(())
}

/// Rebases and clamps optional start/stop arguments to `[0, len]`, the
/// same normalization slicing uses for a positive step.
pub(crate) fn normalize_range(
    name: &str,
    start: Option<&Value>,
    stop: Option<&Value>,
    len: usize,
) -> Result<(usize, usize), RuntimeError> {
    let resolve = |v: Option<&Value>, default: i64| -> Result<i64, RuntimeError> {
        match v {
            None => Ok(default),
            Some(Value::Int(i)) => Ok(*i),
            Some(Value::Bool(b)) => Ok(*b as i64),
            Some(other) => Err(RuntimeError::type_error(format!(
                "{}() indices must be integers, not {}",
                name,
                other.type_name()
            ))),
        }
    };
    let len_i = len as i64;
    let rebase = |i: i64| -> usize {
        let i = if i < 0 { i + len_i } else { i };
        i.clamp(0, len_i) as usize
    };
    let start = rebase(resolve(start, 0)?);
    let stop = rebase(resolve(stop, len_i)?);
    Ok((start, stop))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_per_container() {
        let list = Value::list(vec![]);
        assert!(lookup(&list, "append").is_some());
        assert!(lookup(&list, "keys").is_none());

        let dict = Value::dict(Default::default());
        assert!(lookup(&dict, "keys").is_some());

        assert!(lookup(&Value::str("x"), "upper").is_some());
        assert!(lookup(&Value::set(Default::default()), "add").is_some());
        assert!(lookup(&Value::tuple(vec![]), "count").is_some());
        assert!(lookup(&Value::Int(1), "append").is_none());
    }

    #[test]
    fn test_normalize_range() {
        let (a, b) = normalize_range("index", None, None, 5).unwrap();
        assert_eq!((a, b), (0, 5));
        let (a, b) =
            normalize_range("index", Some(&Value::Int(-2)), Some(&Value::Int(100)), 5).unwrap();
        assert_eq!((a, b), (3, 5));
    }
}
