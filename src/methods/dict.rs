// ABOUTME: Native dict methods: keys, values, items, get, pop, clear,
// copy, update

use super::{check_arity, reject_kwargs};
use crate::error::RuntimeError;
use crate::value::{CallArgs, DictStorage, HashKey, NativeFn, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub const METHODS: &[(&str, NativeFn)] = &[
    ("keys", keys),
    ("values", values),
    ("items", items),
    ("get", get),
    ("pop", pop),
    ("clear", clear),
    ("copy", copy),
    ("update", update),
];

fn storage(receiver: &Value) -> &Rc<RefCell<DictStorage>> {
    match receiver {
        Value::Dict(entries) => entries,
        _ => unreachable!("dict method bound to non-dict receiver"),
    }
}

// keys/values/items return fresh list snapshots rather than live views;
// that departure from dynamic views is a documented limitation.

fn keys(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("keys", &args)?;
    check_arity("keys", &args, 0, 0)?;
    let snapshot = storage(receiver)
        .borrow()
        .keys()
        .map(|k| k.0.clone())
        .collect();
    Ok(Value::list(snapshot))
}

fn values(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("values", &args)?;
    check_arity("values", &args, 0, 0)?;
    let snapshot = storage(receiver).borrow().values().cloned().collect();
    Ok(Value::list(snapshot))
}

fn items(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("items", &args)?;
    check_arity("items", &args, 0, 0)?;
    let snapshot = storage(receiver)
        .borrow()
        .iter()
        .map(|(k, v)| Value::tuple(vec![k.0.clone(), v.clone()]))
        .collect();
    Ok(Value::list(snapshot))
}

fn get(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("get", &args)?;
    check_arity("get", &args, 1, 2)?;
    let key = HashKey::try_new(args.positional[0].clone())?;
    let default = args.positional.get(1).cloned().unwrap_or(Value::None);
    Ok(storage(receiver)
        .borrow()
        .get(&key)
        .cloned()
        .unwrap_or(default))
}

fn pop(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("pop", &args)?;
    check_arity("pop", &args, 1, 2)?;
    let key = HashKey::try_new(args.positional[0].clone())?;
    let removed = storage(receiver).borrow_mut().shift_remove(&key);
    match removed {
        Some(value) => Ok(value),
        None => match args.positional.get(1) {
            Some(default) => Ok(default.clone()),
            None => Err(RuntimeError::key_error(args.positional[0].repr())),
        },
    }
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
    Ok(Value::dict(storage(receiver).borrow().clone()))
}

/// `update(other=None, **kwargs)`: merges a mapping, or any iterable of
/// 2-element pairs (2-character strings included, permissively), then the
/// keyword arguments.
fn update(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    check_arity("update", &args, 0, 1)?;
    let entries = storage(receiver);
    if let Some(source) = args.positional.first() {
        merge_source(entries, source)?;
    }
    merge_kwargs(entries, args.keyword)?;
    Ok(Value::None)
}

/// Merges a mapping or pair-sequence into `entries`. Shared with the
/// `dict()` conversion builtin.
pub(crate) fn merge_source(
    entries: &Rc<RefCell<DictStorage>>,
    source: &Value,
) -> Result<(), RuntimeError> {
    match source {
        Value::Dict(other) => {
            // Snapshot first: d.update(d) must not deadlock the cell.
            let pairs: Vec<(HashKey, Value)> = other
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let mut entries = entries.borrow_mut();
            for (k, v) in pairs {
                entries.insert(k, v);
            }
        }
        other => {
            for pair in other.iter_elements()? {
                let elements = pair.iter_elements().map_err(|_| {
                    RuntimeError::type_error(
                        "cannot convert dictionary update sequence element to a pair",
                    )
                })?;
                if elements.len() != 2 {
                    return Err(RuntimeError::value_error(format!(
                        "dictionary update sequence element has length {}; 2 is required",
                        elements.len()
                    )));
                }
                let key = HashKey::try_new(elements[0].clone())?;
                entries.borrow_mut().insert(key, elements[1].clone());
            }
        }
    }
    Ok(())
}

pub(crate) fn merge_kwargs(
    entries: &Rc<RefCell<DictStorage>>,
    kwargs: Vec<(String, Value)>,
) -> Result<(), RuntimeError> {
    for (name, value) in kwargs {
        let key = HashKey::try_new(Value::str(name))?;
        entries.borrow_mut().insert(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut storage = DictStorage::default();
        storage.insert(
            HashKey::try_new(Value::str("a")).unwrap(),
            Value::Int(1),
        );
        storage.insert(
            HashKey::try_new(Value::str("b")).unwrap(),
            Value::Int(2),
        );
        Value::dict(storage)
    }

    #[test]
    fn test_snapshots() {
        let dict = sample();
        let keys = keys(&dict, CallArgs::default()).unwrap();
        assert_eq!(format!("{}", keys), "['a', 'b']");
        let items = items(&dict, CallArgs::default()).unwrap();
        assert_eq!(format!("{}", items), "[('a', 1), ('b', 2)]");
    }

    #[test]
    fn test_get_with_default() {
        let dict = sample();
        let hit = get(&dict, CallArgs::positional(vec![Value::str("a")])).unwrap();
        assert!(matches!(hit, Value::Int(1)));
        let miss = get(&dict, CallArgs::positional(vec![Value::str("z")])).unwrap();
        assert!(matches!(miss, Value::None));
        let defaulted = get(
            &dict,
            CallArgs::positional(vec![Value::str("z"), Value::Int(9)]),
        )
        .unwrap();
        assert!(matches!(defaulted, Value::Int(9)));
    }

    #[test]
    fn test_pop_key_error() {
        let dict = sample();
        let err = pop(&dict, CallArgs::positional(vec![Value::str("z")])).unwrap_err();
        assert_eq!(err.describe(), "KeyError: 'z'");
        let ok = pop(
            &dict,
            CallArgs::positional(vec![Value::str("z"), Value::Int(0)]),
        )
        .unwrap();
        assert!(matches!(ok, Value::Int(0)));
    }

    #[test]
    fn test_update_from_pairs_and_kwargs() {
        let dict = sample();
        let pairs = Value::list(vec![
            Value::tuple(vec![Value::str("c"), Value::Int(3)]),
            Value::str("de"), // permissive 2-character string pair
        ]);
        update(&dict, CallArgs::positional(vec![pairs])).unwrap();
        update(
            &dict,
            CallArgs {
                positional: vec![],
                keyword: vec![("f".to_string(), Value::Int(6))],
            },
        )
        .unwrap();
        assert_eq!(
            format!("{}", dict),
            "{'a': 1, 'b': 2, 'c': 3, 'd': 'e', 'f': 6}"
        );
    }

    #[test]
    fn test_update_bad_pair_length() {
        let dict = sample();
        let pairs = Value::list(vec![Value::tuple(vec![Value::Int(1)])]);
        let err = update(&dict, CallArgs::positional(vec![pairs])).unwrap_err();
        assert!(err.describe().contains("2 is required"));
    }
}
