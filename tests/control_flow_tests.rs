// ABOUTME: Control flow behavior: loops, break/continue, scope
// declarations, and the full try/except/else/finally protocol

use minipy::{ExecError, Interpreter, Value};
use std::cell::RefCell;
use std::rc::Rc;

fn run(source: &str) -> (String, Result<Option<Value>, ExecError>) {
    let output = Rc::new(RefCell::new(String::new()));
    let sink = output.clone();
    let mut interp = Interpreter::new();
    interp.register_print_callback(move |text| sink.borrow_mut().push_str(text));
    interp.register_error_callback(|_| {});
    let result = interp.evaluate(source);
    let text = output.borrow().clone();
    (text, result)
}

fn run_ok(source: &str) -> String {
    let (output, result) = run(source);
    result.expect("script should succeed");
    output
}

fn run_err(source: &str) -> String {
    let (_, result) = run(source);
    match result {
        Err(ExecError::Runtime(err)) => err.describe(),
        other => panic!("expected runtime error, got ok={}", other.is_ok()),
    }
}

#[test]
fn test_while_with_break_and_continue() {
    let source = "\
i = 0
while True:
    i = i + 1
    if i == 3:
        continue
    if i > 5:
        break
    print(i)
";
    assert_eq!(run_ok(source), "1\n2\n4\n5\n");
}

#[test]
fn test_for_over_iterables() {
    assert_eq!(run_ok("for c in 'abc':\n    print(c)"), "a\nb\nc\n");
    assert_eq!(
        run_ok("for x in (10, 20):\n    print(x)"),
        "10\n20\n"
    );
    assert_eq!(
        run_ok("for k in {'a': 1, 'b': 2}:\n    print(k)"),
        "a\nb\n"
    );
}

#[test]
fn test_for_tuple_unpacking() {
    let source = "\
d = {'a': 1, 'b': 2}
for k, v in d.items():
    print(k, v)
";
    assert_eq!(run_ok(source), "a 1\nb 2\n");

    let err = run_err("for a, b in [(1, 2, 3)]:\n    pass");
    assert_eq!(err, "ValueError: too many values to unpack (expected 2)");
}

#[test]
fn test_break_outside_loop_is_eval_time_error() {
    assert_eq!(run_err("break"), "SyntaxError: 'break' outside loop");
    assert_eq!(
        run_err("continue"),
        "SyntaxError: 'continue' not properly in loop"
    );
    assert_eq!(run_err("return 1"), "SyntaxError: 'return' outside function");
    // A break inside a function but outside any loop is caught at the
    // call boundary.
    assert_eq!(
        run_err("def f():\n    break\nf()"),
        "SyntaxError: 'break' outside loop"
    );
}

#[test]
fn test_global_declaration() {
    let source = "\
count = 0
def bump():
    global count
    count = count + 1
bump()
bump()
print(count)
";
    assert_eq!(run_ok(source), "2\n");
}

#[test]
fn test_nonlocal_updates_nearest_function_scope() {
    let source = "\
def counter():
    n = 0
    def bump():
        nonlocal n
        n = n + 1
        return n
    bump()
    bump()
    return bump()
print(counter())
";
    assert_eq!(run_ok(source), "3\n");
}

#[test]
fn test_nonlocal_without_binding() {
    let err = run_err("def f():\n    nonlocal q\nf()");
    assert_eq!(err, "SyntaxError: no binding for nonlocal 'q' found");
}

#[test]
fn test_try_else_runs_without_exception() {
    let source = "\
try:
    x = 1
except:
    print('handler')
else:
    print('else')
finally:
    print('finally')
";
    assert_eq!(run_ok(source), "else\nfinally\n");
}

#[test]
fn test_typed_handlers_select_by_kind() {
    let source = "\
def attempt(f):
    try:
        f()
    except ZeroDivisionError:
        print('zero')
    except TypeError:
        print('type')
    except:
        print('other')
attempt(lambda: 1 / 0)
attempt(lambda: 1 + 'x')
attempt(lambda: [][0])
";
    assert_eq!(run_ok(source), "zero\ntype\nother\n");
}

#[test]
fn test_except_exception_catches_everything() {
    let source = "\
try:
    {}['missing']
except Exception as e:
    print('caught:', e)
";
    assert_eq!(run_ok(source), "caught: 'missing'\n");
}

#[test]
fn test_handler_binding_is_scoped_to_suite() {
    // The bound name is removed once the handler suite finishes.
    let (_, result) = run("try:\n    1/0\nexcept ZeroDivisionError as e:\n    pass\ne");
    match result {
        Err(ExecError::Runtime(err)) => {
            assert_eq!(err.describe(), "NameError: name 'e' is not defined");
        }
        other => panic!("expected NameError, got ok={}", other.is_ok()),
    }
}

#[test]
fn test_finally_runs_on_all_paths() {
    // Normal completion, handled exception, and propagating exception.
    let source = "\
def f(mode):
    try:
        if mode == 1:
            return 'returned'
        if mode == 2:
            1 / 0
    except ZeroDivisionError:
        print('handled')
    finally:
        print('finally', mode)
    return 'fell through'
print(f(0))
print(f(1))
print(f(2))
";
    assert_eq!(
        run_ok(source),
        "finally 0\nfell through\nfinally 1\nreturned\nhandled\nfinally 2\nfell through\n"
    );
}

#[test]
fn test_exception_in_finally_replaces_pending() {
    let source = "\
try:
    1 / 0
finally:
    raise ValueError('replacement')
";
    assert_eq!(run_err(source), "ValueError: replacement");
}

#[test]
fn test_raise_user_exception_and_reraise_class() {
    let source = "\
class ParseFailure(Exception):
    pass

try:
    raise ParseFailure('bad record')
except ParseFailure as e:
    print('got:', e)
";
    assert_eq!(run_ok(source), "got: bad record\n");

    // Raising a bare class instantiates it.
    assert_eq!(run_err("raise ValueError"), "ValueError");
}

#[test]
fn test_raising_non_exception_value() {
    assert_eq!(
        run_err("raise 42"),
        "TypeError: exceptions must be classes or instances, not int"
    );
}

#[test]
fn test_uncaught_exception_propagates_through_frames() {
    let source = "\
def inner():
    raise ValueError('deep')
def outer():
    inner()
outer()
";
    assert_eq!(run_err(source), "ValueError: deep");
}

#[test]
fn test_recursion_guard() {
    // Deep interpreter recursion needs more than the default test-thread
    // stack.
    std::thread::Builder::new()
        .stack_size(32 * 1024 * 1024)
        .spawn(|| {
            let err = run_err("def f():\n    return f()\nf()");
            assert_eq!(err, "RecursionError: maximum recursion depth exceeded");

            // And it is catchable like any other exception.
            let source = "\
def f():
    return f()
try:
    f()
except RecursionError:
    print('guarded')
";
            assert_eq!(run_ok(source), "guarded\n");
        })
        .expect("spawn test thread")
        .join()
        .expect("recursion test thread");
}

#[test]
fn test_single_line_suites() {
    assert_eq!(run_ok("if True: print('a'); print('b')"), "a\nb\n");
    assert_eq!(run_ok("x = 5\nwhile x > 3: x = x - 1\nprint(x)"), "3\n");
}

#[test]
fn test_division_by_zero_is_always_catchable() {
    for op in ["1 / 0", "1 // 0", "1 % 0", "1.0 / 0", "1.0 % 0"] {
        let source = format!(
            "try:\n    {}\nexcept ZeroDivisionError:\n    print('ok')",
            op
        );
        assert_eq!(run_ok(&source), "ok\n", "operator {}", op);
    }
}
