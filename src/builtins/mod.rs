//! # Built-in Functions Module
//!
//! The fixed catalog registered in the outermost environment at
//! interpreter construction, organized by category:
//!
//! - **[output]** (1): print
//! - **[numeric]** (8): abs, round, min, max, sum, int, float, range
//! - **[sequences]** (5): len, list, tuple, set, dict
//! - **[types]** (5): str, repr, bool, type, isinstance
//!
//! Each entry is a plain function pointer wrapped in a [`Builtin`] record;
//! no registration happens outside [`register_builtins`].

use crate::env::Environment;
use crate::value::{Builtin, BuiltinFn, Value};
use std::rc::Rc;

pub mod numeric;
pub mod output;
pub mod sequences;
pub mod types;

/// Registers every builtin in the given (global) environment.
pub fn register_builtins(env: &Rc<Environment>) {
    let entries: &[(&'static str, BuiltinFn)] = &[
        ("print", output::builtin_print),
        ("abs", numeric::builtin_abs),
        ("round", numeric::builtin_round),
        ("min", numeric::builtin_min),
        ("max", numeric::builtin_max),
        ("sum", numeric::builtin_sum),
        ("int", numeric::builtin_int),
        ("float", numeric::builtin_float),
        ("range", numeric::builtin_range),
        ("len", sequences::builtin_len),
        ("list", sequences::builtin_list),
        ("tuple", sequences::builtin_tuple),
        ("set", sequences::builtin_set),
        ("dict", sequences::builtin_dict),
        ("str", types::builtin_str),
        ("repr", types::builtin_repr),
        ("bool", types::builtin_bool),
        ("type", types::builtin_type),
        ("isinstance", types::builtin_isinstance),
    ];
    for (name, func) in entries {
        env.define(*name, Value::Builtin(Rc::new(Builtin { name, func: *func })));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_is_registered() {
        let env = Environment::new();
        register_builtins(&env);
        for name in [
            "print",
            "range",
            "len",
            "str",
            "int",
            "float",
            "bool",
            "type",
            "abs",
            "list",
            "dict",
            "set",
            "tuple",
            "round",
            "min",
            "max",
            "sum",
            "repr",
            "isinstance",
        ] {
            assert!(
                matches!(env.get(name), Some(Value::Builtin(_))),
                "missing builtin {}",
                name
            );
        }
    }
}
