// ABOUTME: Class semantics: instantiation, attribute lookup, bound
// methods, single inheritance, super, and isinstance

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
fn test_instance_fields_shadow_methods() {
    let source = "\
class Box:
    def value(self):
        return 'method'

b = Box()
print(b.value())
b.value = 'field'
print(b.value)
";
    assert_eq!(run_ok(source), "method\nfield\n");
}

#[test]
fn test_methods_bind_self() {
    let source = "\
class Counter:
    def __init__(self):
        self.n = 0
    def bump(self):
        self.n = self.n + 1
        return self.n

c = Counter()
bump = c.bump
print(bump())
print(bump())
print(c.n)
";
    assert_eq!(run_ok(source), "1\n2\n2\n");
}

#[test]
fn test_inherited_methods_and_override() {
    let source = "\
class Animal:
    def speak(self):
        return 'generic sound'
    def describe(self):
        return 'makes ' + self.speak()

class Dog(Animal):
    def speak(self):
        return 'woof'

print(Dog().describe())
print(Animal().describe())
";
    assert_eq!(run_ok(source), "makes woof\nmakes generic sound\n");
}

#[test]
fn test_super_resolves_statically() {
    // Each super() resolves against the class whose body defined the
    // method, not the runtime class of self.
    let source = "\
class A:
    def tag(self):
        return 'A'

class B(A):
    def tag(self):
        return super().tag() + 'B'

class C(B):
    def tag(self):
        return super().tag() + 'C'

print(C().tag())
";
    assert_eq!(run_ok(source), "ABC\n");
}

#[test]
fn test_super_outside_subclass_method() {
    let err = run_err("class A:\n    def f(self):\n        return super().f()\nA().f()");
    assert_eq!(err, "SyntaxError: 'super' used outside a subclass method");
}

#[test]
fn test_constructor_arity_errors() {
    let source = "\
class Point:
    def __init__(self, x, y):
        self.x = x
        self.y = y
Point(1)
";
    let err = run_err(source);
    assert!(err.contains("missing required argument: 'y'"), "got {}", err);

    let err = run_err("class Empty:\n    pass\nEmpty(1)");
    assert_eq!(err, "TypeError: Empty() takes no arguments");
}

#[test]
fn test_keyword_arguments_and_defaults() {
    let source = "\
def greet(name, greeting='hello', *rest, **extra):
    print(greeting, name, rest, extra)
greet('ada')
greet('ada', 'hi')
greet('ada', 'hi', 1, 2, mood='fine')
greet(name='bob')
";
    assert_eq!(
        run_ok(source),
        "hello ada () {}\nhi ada () {}\nhi ada (1, 2) {'mood': 'fine'}\nhello bob () {}\n"
    );
}

#[test]
fn test_call_binding_errors() {
    let err = run_err("def f(a):\n    pass\nf(1, 2)");
    assert_eq!(
        err,
        "TypeError: f() takes 1 positional argument but 2 were given"
    );

    let err = run_err("def f(a):\n    pass\nf(b=1)");
    assert_eq!(err, "TypeError: f() got an unexpected keyword argument 'b'");

    let err = run_err("def f(a):\n    pass\nf(1, a=2)");
    assert_eq!(err, "TypeError: f() got multiple values for argument 'a'");
}

#[test]
fn test_defaults_evaluate_in_closure_at_call_time() {
    // The default expression names a global that is rebound between
    // calls; the call-time value wins.
    let source = "\
base = 10
def shifted(x, offset=base):
    return x + offset
print(shifted(1))
base = 100
print(shifted(1))
";
    assert_eq!(run_ok(source), "11\n101\n");
}

#[test]
fn test_isinstance_with_classes() {
    let source = "\
class Animal:
    pass
class Dog(Animal):
    pass

d = Dog()
print(isinstance(d, Dog))
print(isinstance(d, Animal))
print(isinstance(Animal(), Dog))
print(isinstance(3, int))
print(isinstance(True, int))
print(isinstance('x', int))
";
    assert_eq!(
        run_ok(source),
        "True\nTrue\nFalse\nTrue\nTrue\nFalse\n"
    );
}

#[test]
fn test_user_exception_hierarchy_in_except() {
    let source = "\
class AppError(Exception):
    pass
class ConfigError(AppError):
    pass

try:
    raise ConfigError('missing key')
except AppError as e:
    print('app-level:', e)
";
    assert_eq!(run_ok(source), "app-level: missing key\n");
}

#[test]
fn test_class_attribute_errors() {
    let err = run_err("class A:\n    pass\nA().missing");
    assert_eq!(err, "AttributeError: 'A' object has no attribute 'missing'");

    let err = run_err("x = [1]\nx.flatten()");
    assert_eq!(
        err,
        "AttributeError: 'list' object has no attribute 'flatten'"
    );
}

#[test]
fn test_classes_are_first_class_and_hashable() {
    let source = "\
class A:
    pass
class B:
    pass
registry = {A: 'first', B: 'second'}
print(registry[A], registry[B])
";
    assert_eq!(run_ok(source), "first second\n");
}

#[test]
fn test_lambda_values() {
    let source = "\
double = lambda x: x * 2
apply = lambda f, v: f(v)
print(apply(double, 21))
print((lambda: 7)())
";
    assert_eq!(run_ok(source), "42\n7\n");
}
