// ABOUTME: Native tuple methods: count and index, mirroring the list
// semantics on an immutable receiver

use super::{check_arity, normalize_range, reject_kwargs};
use crate::error::RuntimeError;
use crate::value::{values_equal, CallArgs, NativeFn, Value};

pub const METHODS: &[(&str, NativeFn)] = &[("count", count), ("index", index)];

fn elements(receiver: &Value) -> &[Value] {
    match receiver {
        Value::Tuple(items) => items,
        _ => unreachable!("tuple method bound to non-tuple receiver"),
    }
}

fn count(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("count", &args)?;
    check_arity("count", &args, 1, 1)?;
    let target = &args.positional[0];
    let n = elements(receiver)
        .iter()
        .filter(|v| values_equal(v, target))
        .count();
    Ok(Value::Int(n as i64))
}

fn index(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("index", &args)?;
    check_arity("index", &args, 1, 3)?;
    let target = &args.positional[0];
    let items = elements(receiver);
    let (start, stop) = normalize_range(
        "index",
        args.positional.get(1),
        args.positional.get(2),
        items.len(),
    )?;
    for (i, v) in items.iter().enumerate().take(stop).skip(start) {
        if values_equal(v, target) {
            return Ok(Value::Int(i as i64));
        }
    }
    Err(RuntimeError::value_error(format!(
        "{} is not in tuple",
        target.repr()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_index() {
        let t = Value::tuple(vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
        let n = count(&t, CallArgs::positional(vec![Value::Int(1)])).unwrap();
        assert!(matches!(n, Value::Int(2)));

        let i = index(&t, CallArgs::positional(vec![Value::Int(2)])).unwrap();
        assert!(matches!(i, Value::Int(1)));

        let err = index(&t, CallArgs::positional(vec![Value::Int(9)])).unwrap_err();
        assert_eq!(err.describe(), "ValueError: 9 is not in tuple");
    }
}
