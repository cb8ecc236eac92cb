// ABOUTME: Native str methods: find, count, replace, split, join, upper,
// lower, startswith, endswith, strip, lstrip, rstrip

use super::{check_arity, normalize_range, reject_kwargs};
use crate::error::RuntimeError;
use crate::value::{CallArgs, NativeFn, Value};

pub const METHODS: &[(&str, NativeFn)] = &[
    ("find", find),
    ("count", count),
    ("replace", replace),
    ("split", split),
    ("join", join),
    ("upper", upper),
    ("lower", lower),
    ("startswith", startswith),
    ("endswith", endswith),
    ("strip", strip),
    ("lstrip", lstrip),
    ("rstrip", rstrip),
];

fn text(receiver: &Value) -> &str {
    match receiver {
        Value::Str(s) => s,
        _ => unreachable!("str method bound to non-str receiver"),
    }
}

fn expect_str<'a>(name: &str, value: &'a Value, what: &str) -> Result<&'a str, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::type_error(format!(
            "{}() {} must be str, not {}",
            name,
            what,
            other.type_name()
        ))),
    }
}

/// Char-index search for `needle` within `haystack[start..stop]`.
fn search(haystack: &[char], needle: &[char], start: usize, stop: usize) -> Option<usize> {
    if needle.is_empty() {
        return if start <= stop { Some(start) } else { None };
    }
    if stop < needle.len() {
        return None;
    }
    for i in start..=stop.saturating_sub(needle.len()) {
        if haystack[i..i + needle.len()] == *needle {
            return Some(i);
        }
    }
    None
}

fn find(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("find", &args)?;
    check_arity("find", &args, 1, 3)?;
    let haystack: Vec<char> = text(receiver).chars().collect();
    let needle: Vec<char> = expect_str("find", &args.positional[0], "argument")?
        .chars()
        .collect();
    let (start, stop) = normalize_range(
        "find",
        args.positional.get(1),
        args.positional.get(2),
        haystack.len(),
    )?;
    match search(&haystack, &needle, start, stop) {
        Some(i) => Ok(Value::Int(i as i64)),
        None => Ok(Value::Int(-1)),
    }
}

fn count(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("count", &args)?;
    check_arity("count", &args, 1, 3)?;
    let haystack: Vec<char> = text(receiver).chars().collect();
    let needle: Vec<char> = expect_str("count", &args.positional[0], "argument")?
        .chars()
        .collect();
    let (start, stop) = normalize_range(
        "count",
        args.positional.get(1),
        args.positional.get(2),
        haystack.len(),
    )?;
    if needle.is_empty() {
        return Ok(Value::Int((stop.saturating_sub(start) + 1) as i64));
    }
    let mut total = 0i64;
    let mut i = start;
    while let Some(found) = search(&haystack, &needle, i, stop) {
        total += 1;
        i = found + needle.len();
    }
    Ok(Value::Int(total))
}

fn replace(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("replace", &args)?;
    check_arity("replace", &args, 2, 3)?;
    let old = expect_str("replace", &args.positional[0], "old")?;
    let new = expect_str("replace", &args.positional[1], "new")?;
    let limit = match args.positional.get(2) {
        None => -1,
        Some(Value::Int(i)) => *i,
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )))
        }
    };
    let s = text(receiver);
    let replaced = if limit < 0 {
        s.replace(old, new)
    } else {
        s.replacen(old, new, limit as usize)
    };
    Ok(Value::str(replaced))
}

fn split(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("split", &args)?;
    check_arity("split", &args, 0, 2)?;
    let maxsplit = match args.positional.get(1) {
        None => -1,
        Some(Value::Int(i)) => *i,
        Some(other) => {
            return Err(RuntimeError::type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )))
        }
    };
    let s = text(receiver);

    let pieces: Vec<String> = match args.positional.first() {
        // No separator (or None): runs of whitespace collapse and edges
        // are trimmed.
        None | Some(Value::None) => {
            let mut pieces = Vec::new();
            let mut rest = s.trim_start();
            while !rest.is_empty() {
                if maxsplit >= 0 && pieces.len() as i64 >= maxsplit {
                    pieces.push(rest.to_string());
                    break;
                }
                match rest.find(char::is_whitespace) {
                    Some(end) => {
                        pieces.push(rest[..end].to_string());
                        rest = rest[end..].trim_start();
                    }
                    None => {
                        pieces.push(rest.to_string());
                        break;
                    }
                }
            }
            pieces
        }
        Some(sep) => {
            let sep = expect_str("split", sep, "separator")?;
            if sep.is_empty() {
                return Err(RuntimeError::value_error("empty separator"));
            }
            if maxsplit < 0 {
                s.split(sep).map(str::to_string).collect()
            } else {
                s.splitn(maxsplit as usize + 1, sep)
                    .map(str::to_string)
                    .collect()
            }
        }
    };
    Ok(Value::list(pieces.into_iter().map(Value::str).collect()))
}

fn join(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("join", &args)?;
    check_arity("join", &args, 1, 1)?;
    let sep = text(receiver);
    let mut pieces = Vec::new();
    for (i, item) in args.positional[0].iter_elements()?.into_iter().enumerate() {
        match item {
            Value::Str(s) => pieces.push(s.to_string()),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "sequence item {}: expected str instance, {} found",
                    i,
                    other.type_name()
                )))
            }
        }
    }
    Ok(Value::str(pieces.join(sep)))
}

fn upper(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("upper", &args)?;
    check_arity("upper", &args, 0, 0)?;
    Ok(Value::str(text(receiver).to_uppercase()))
}

fn lower(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    reject_kwargs("lower", &args)?;
    check_arity("lower", &args, 0, 0)?;
    Ok(Value::str(text(receiver).to_lowercase()))
}

/// Shared engine for startswith/endswith: a single prefix or a tuple of
/// candidates, with optional start/end bounds.
fn affix_match(
    name: &str,
    receiver: &Value,
    args: &CallArgs,
    at_end: bool,
) -> Result<Value, RuntimeError> {
    reject_kwargs(name, args)?;
    check_arity(name, args, 1, 3)?;
    let haystack: Vec<char> = text(receiver).chars().collect();
    let (start, stop) = normalize_range(
        name,
        args.positional.get(1),
        args.positional.get(2),
        haystack.len(),
    )?;
    let window: String = haystack[start.min(stop)..stop].iter().collect();

    let candidates: Vec<String> = match &args.positional[0] {
        Value::Str(s) => vec![s.to_string()],
        Value::Tuple(items) => {
            let mut out = Vec::new();
            for item in items.iter() {
                out.push(expect_str(name, item, "candidate")?.to_string());
            }
            out
        }
        other => {
            return Err(RuntimeError::type_error(format!(
                "{} first arg must be str or a tuple of str, not {}",
                name,
                other.type_name()
            )))
        }
    };
    let matched = candidates.iter().any(|c| {
        if at_end {
            window.ends_with(c.as_str())
        } else {
            window.starts_with(c.as_str())
        }
    });
    Ok(Value::Bool(matched))
}

fn startswith(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    affix_match("startswith", receiver, &args, false)
}

fn endswith(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    affix_match("endswith", receiver, &args, true)
}

fn strip_impl(
    name: &str,
    receiver: &Value,
    args: &CallArgs,
    left: bool,
    right: bool,
) -> Result<Value, RuntimeError> {
    reject_kwargs(name, args)?;
    check_arity(name, args, 0, 1)?;
    let s = text(receiver);
    let stripped = match args.positional.first() {
        None | Some(Value::None) => match (left, right) {
            (true, true) => s.trim(),
            (true, false) => s.trim_start(),
            _ => s.trim_end(),
        },
        Some(chars) => {
            let set: Vec<char> = expect_str(name, chars, "argument")?.chars().collect();
            let pred = |c: char| set.contains(&c);
            match (left, right) {
                (true, true) => s.trim_matches(pred),
                (true, false) => s.trim_start_matches(pred),
                _ => s.trim_end_matches(pred),
            }
        }
    };
    Ok(Value::str(stripped))
}

fn strip(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    strip_impl("strip", receiver, &args, true, true)
}

fn lstrip(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    strip_impl("lstrip", receiver, &args, true, false)
}

fn rstrip(receiver: &Value, args: CallArgs) -> Result<Value, RuntimeError> {
    strip_impl("rstrip", receiver, &args, false, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(
        method: NativeFn,
        receiver: &str,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        method(&Value::str(receiver), CallArgs::positional(args))
    }

    #[test]
    fn test_find_and_count() {
        let i = call(find, "hello world", vec![Value::str("o")]).unwrap();
        assert!(matches!(i, Value::Int(4)));
        let i = call(find, "hello world", vec![Value::str("o"), Value::Int(5)]).unwrap();
        assert!(matches!(i, Value::Int(7)));
        let i = call(find, "hello", vec![Value::str("z")]).unwrap();
        assert!(matches!(i, Value::Int(-1)));

        let n = call(count, "aaaa", vec![Value::str("aa")]).unwrap();
        assert!(matches!(n, Value::Int(2))); // non-overlapping
    }

    #[test]
    fn test_replace_with_limit() {
        let v = call(
            replace,
            "a-b-c",
            vec![Value::str("-"), Value::str("+"), Value::Int(1)],
        )
        .unwrap();
        assert_eq!(format!("{}", v), "a+b-c");
    }

    #[test]
    fn test_split_whitespace_collapses() {
        let v = call(split, "  a  b\t c ", vec![]).unwrap();
        assert_eq!(format!("{}", v), "['a', 'b', 'c']");

        let v = call(split, "a,b,,c", vec![Value::str(",")]).unwrap();
        assert_eq!(format!("{}", v), "['a', 'b', '', 'c']");

        let v = call(
            split,
            "a,b,c",
            vec![Value::str(","), Value::Int(1)],
        )
        .unwrap();
        assert_eq!(format!("{}", v), "['a', 'b,c']");
    }

    #[test]
    fn test_join_type_checks() {
        let items = Value::list(vec![Value::str("a"), Value::str("b")]);
        let v = call(join, ",", vec![items]).unwrap();
        assert_eq!(format!("{}", v), "a,b");

        let bad = Value::list(vec![Value::Int(1)]);
        let err = call(join, ",", vec![bad]).unwrap_err();
        assert!(err.describe().contains("expected str instance"));
    }

    #[test]
    fn test_affixes_with_tuple() {
        let candidates = Value::tuple(vec![Value::str("he"), Value::str("wo")]);
        let v = call(startswith, "hello", vec![candidates]).unwrap();
        assert!(matches!(v, Value::Bool(true)));
        let v = call(endswith, "hello", vec![Value::str("llo")]).unwrap();
        assert!(matches!(v, Value::Bool(true)));
    }

    #[test]
    fn test_strip_variants() {
        let v = call(strip, "  hi  ", vec![]).unwrap();
        assert_eq!(format!("{}", v), "hi");
        let v = call(lstrip, "xxhixx", vec![Value::str("x")]).unwrap();
        assert_eq!(format!("{}", v), "hixx");
        let v = call(rstrip, "xxhixx", vec![Value::str("x")]).unwrap();
        assert_eq!(format!("{}", v), "xxhi");
    }
}
