// ABOUTME: Native list methods: append, insert, remove, pop, clear, copy,
// count, index, reverse, sort

use super::{check_arity, normalize_range, reject_kwargs};
use crate::error::RuntimeError;
use crate::value::{compare_values, values_equal, CallArgs, NativeFn, Value};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Rc;

pub const METHODS: &[(&str, NativeFn)] = &[
    ("append", append),
    ("insert", insert),
    ("remove", remove),
    ("pop", pop),
    ("clear", clear),
    ("copy", copy),
    ("count", count),
    ("index", index),
    ("reverse", reverse),
    ("sort", sort),
];

fn storage(receiver: &Value) -> &Rc<RefCell<Vec<Value>>> {
    match receiver {
        Value::List(items) => items,
        _ => unreachable!("list method bound to non-list receiver"),
    }
}

fn append(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("append", &args)?;
    check_arity("append", &args, 1, 1)?;
    storage(receiver)
        .borrow_mut()
        .push(args.positional.into_iter().next().unwrap());
    Ok(Value::None)
}

fn insert(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("insert", &args)?;
    check_arity("insert", &args, 2, 2)?;
    let index = match &args.positional[0] {
        Value::Int(i) => *i,
        Value::Bool(b) => *b as i64,
        other => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )))
        }
    };
    let items = storage(receiver);
    let len = items.borrow().len() as i64;
    // Out-of-range insert positions clamp instead of failing.
    let at = if index < 0 { index + len } else { index }.clamp(0, len) as usize;
    items.borrow_mut().insert(at, args.positional[1].clone());
    Ok(Value::None)
}

fn remove(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("remove", &args)?;
    check_arity("remove", &args, 1, 1)?;
    let target = &args.positional[0];
    let items = storage(receiver);
    let found = items
        .borrow()
        .iter()
        .position(|v| values_equal(v, target));
    match found {
        Some(i) => {
            items.borrow_mut().remove(i);
            Ok(Value::None)
        }
        None => Err(RuntimeError::value_error("list.remove(x): x not in list")),
    }
}

fn pop(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("pop", &args)?;
    check_arity("pop", &args, 0, 1)?;
    let items = storage(receiver);
    let len = items.borrow().len() as i64;
    if len == 0 {
        return Err(RuntimeError::index_error("pop from empty list"));
    }
    let index = match args.positional.first() {
        None => len - 1,
        Some(Value::Int(i)) => *i,
        Some(Value::Bool(b)) => *b as i64,
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )))
        }
    };
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 || resolved >= len {
        return Err(RuntimeError::index_error("pop index out of range"));
    }
    Ok(items.borrow_mut().remove(resolved as usize))
}

fn clear(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("clear", &args)?;
    check_arity("clear", &args, 0, 0)?;
    storage(receiver).borrow_mut().clear();
    Ok(Value::None)
}

fn copy(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("copy", &args)?;
    check_arity("copy", &args, 0, 0)?;
    Ok(Value::list(storage(receiver).borrow().clone()))
}

fn count(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("count", &args)?;
    check_arity("count", &args, 1, 1)?;
    let target = &args.positional[0];
    let n = storage(receiver)
        .borrow()
        .iter()
        .filter(|v| values_equal(v, target))
        .count();
    Ok(Value::Int(n as i64))
}

fn index(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("index", &args)?;
    check_arity("index", &args, 1, 3)?;
    let target = &args.positional[0];
    let items = storage(receiver).borrow();
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
        "{} is not in list",
        target.repr()
    )))
}

fn reverse(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("reverse", &args)?;
    check_arity("reverse", &args, 0, 0)?;
    storage(receiver).borrow_mut().reverse();
    Ok(Value::None)
}

fn sort(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("sort", &args)?;
    check_arity("sort", &args, 0, 0)?;
    let items_rc = storage(receiver);
    // Sort a snapshot so comparisons on self-referential lists cannot
    // observe a mutable borrow.
    let mut items = items_rc.borrow().clone();
    let mut failure: Option<RuntimeError> = None;
    items.sort_by(|a, b| match compare_values("<", a, b) {
        Ok(Some(ord)) => ord,
        Ok(None) => Ordering::Equal,
        Err(err) => {
            failure.get_or_insert(err);
            Ordering::Equal
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }
    *items_rc.borrow_mut() = items;
    Ok(Value::None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(method: NativeFn, receiver: &Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        method(receiver, CallArgs::positional(args))
    }

    #[test]
    fn test_append_and_pop() {
        let list = Value::list(vec![Value::Int(1)]);
        call(append, &list, vec![Value::Int(2)]).unwrap();
        assert_eq!(format!("{}", list), "[1, 2]");

        let popped = call(pop, &list, vec![]).unwrap();
        assert!(matches!(popped, Value::Int(2)));

        call(pop, &list, vec![]).unwrap();
        let err = call(pop, &list, vec![]).unwrap_err();
        assert_eq!(err.describe(), "IndexError: pop from empty list");
    }

    #[test]
    fn test_insert_clamps() {
        let list = Value::list(vec![Value::Int(1), Value::Int(3)]);
        call(insert, &list, vec![Value::Int(1), Value::Int(2)]).unwrap();
        call(insert, &list, vec![Value::Int(100), Value::Int(4)]).unwrap();
        call(insert, &list, vec![Value::Int(-100), Value::Int(0)]).unwrap();
        assert_eq!(format!("{}", list), "[0, 1, 2, 3, 4]");
    }

    #[test]
    fn test_remove_miss_raises() {
        let list = Value::list(vec![Value::Int(1)]);
        let err = call(remove, &list, vec![Value::Int(9)]).unwrap_err();
        assert_eq!(err.describe(), "ValueError: list.remove(x): x not in list");
    }

    #[test]
    fn test_index_with_range() {
        let list = Value::list(vec![Value::Int(5), Value::Int(6), Value::Int(5)]);
        let i = call(index, &list, vec![Value::Int(5), Value::Int(1)]).unwrap();
        assert!(matches!(i, Value::Int(2)));
        let err = call(index, &list, vec![Value::Int(7)]).unwrap_err();
        assert_eq!(err.describe(), "ValueError: 7 is not in list");
    }

    #[test]
    fn test_sort_stable_natural_order() {
        let list = Value::list(vec![
            Value::Int(3),
            Value::Float(1.5),
            Value::Int(2),
            Value::Bool(false),
        ]);
        call(sort, &list, vec![]).unwrap();
        assert_eq!(format!("{}", list), "[False, 1.5, 2, 3]");

        let mixed = Value::list(vec![Value::Int(1), Value::str("a")]);
        assert!(call(sort, &mixed, vec![]).is_err());
    }
}
