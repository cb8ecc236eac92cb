//! Output builtins: print
//!
//! `print` is the only builtin that talks to the host; everything it
//! writes goes through the interpreter's print callback.

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{CallArgs, Value};

/// `print(*args, sep=' ', end='\n')` — stringify, join, append the
/// terminator, and hand the whole fragment to the host in one call.
pub fn builtin_print(interp: &mut Interpreter, args: CallArgs) -> Result<Value, RuntimeError> {
    let mut sep = " ".to_string();
    let mut end = "\n".to_string();
    for (key, value) in &args.keyword {
        let slot = match key.as_str() {
            "sep" => &mut sep,
            "end" => &mut end,
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' is an invalid keyword argument for print()",
                    other
                )))
            }
        };
        match value {
            Value::None => {} // None selects the default
            Value::Str(s) => *slot = s.to_string(),
            other => {
                return Err(RuntimeError::type_error(format!(
                    "{} must be None or a string, not {}",
                    key,
                    other.type_name()
                )))
            }
        }
    }

    let rendered: Vec<String> = args.positional.iter().map(|v| format!("{}", v)).collect();
    let mut text = rendered.join(&sep);
    text.push_str(&end);
    interp.emit_output(&text);
    Ok(Value::None)
}
