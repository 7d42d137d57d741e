//! End-to-end sandbox scenarios, one per observable behaviour a Dana
//! embedder actually depends on.

use dana_rt::{Error, ScopeName, Value};
use std::io::Write;

fn int_var(sandbox: &dana_rt::Sandbox, name: &str) -> i64 {
    match sandbox.context().get_scope(ScopeName::Local, name) {
        Some(Value::Integer(i)) => i,
        other => panic!("expected {name} to be an int, got {other:?}"),
    }
}

#[test]
fn arithmetic_precedence() {
    let sandbox = dana_rt::Sandbox::new();
    let result = sandbox.eval("x = 2 + 3 * 4\n");
    assert!(result.success, "{:?}", result.error.map(|e| e.display_chain()));
    assert_eq!(int_var(&sandbox, "x"), 14);
}

#[test]
fn pipeline_composition() {
    let sandbox = dana_rt::Sandbox::new();
    let result = sandbox.eval(
        "def add_one(x): return x + 1\n\
         def double(x): return x * 2\n\
         f = add_one | double\n\
         y = f(5)\n",
    );
    assert!(result.success, "{:?}", result.error.map(|e| e.display_chain()));
    assert_eq!(int_var(&sandbox, "y"), 12);
    assert!(matches!(
        sandbox.context().get_scope(ScopeName::Local, "f"),
        Some(Value::Function(_))
    ));

    let piped = sandbox.eval("z = 5 | f\n");
    assert!(piped.success);
    assert_eq!(int_var(&sandbox, "z"), 12);
}

#[test]
fn struct_construction_and_method_sugar_agree() {
    let sandbox = dana_rt::Sandbox::new();
    let result = sandbox.eval(
        "struct Point:\n    x: int\n    y: int\n\
         def sq_len(p: Point) -> int:\n    return p.x * p.x + p.y * p.y\n\
         p = Point(x=3, y=4)\n\
         a = sq_len(p)\n\
         b = p.sq_len()\n",
    );
    assert!(result.success, "{:?}", result.error.map(|e| e.display_chain()));
    assert_eq!(int_var(&sandbox, "a"), 25);
    assert_eq!(int_var(&sandbox, "b"), 25);
}

#[test]
fn import_from_dana_module() {
    let dir = tempfile::tempdir().unwrap();
    let module_path = dir.path().join("math_helpers.na");
    let mut f = std::fs::File::create(&module_path).unwrap();
    writeln!(f, "def add(a, b):\n    return a + b\n").unwrap();

    let danapath_override = dir.path().to_string_lossy().to_string();
    std::env::set_var("DANAPATH", &danapath_override);
    let sandbox = dana_rt::Sandbox::new();

    let result = sandbox.eval("from math_helpers import add\nr = add(2, 3)\n");
    std::env::remove_var("DANAPATH");

    assert!(result.success, "{:?}", result.error.map(|e| e.display_chain()));
    assert_eq!(int_var(&sandbox, "r"), 5);
    assert_eq!(result.output, "");
}

#[test]
fn error_breadcrumb_names_every_call_frame() {
    let sandbox = dana_rt::Sandbox::new();
    let result = sandbox.eval(
        "def inner(x): return unknown_fn(x)\n\
         def outer(x): return inner(x)\n\
         r = outer(1)\n",
    );
    assert!(!result.success);
    let chain = result.error.expect("expected a populated error chain");
    assert!(matches!(chain.root_cause(), Error::Name { .. }));
    assert!(chain.root_cause().to_string().contains("unknown_fn"));
    let names: Vec<_> = chain.breadcrumbs.iter().map(|b| b.function_name.as_str()).collect();
    assert!(names.contains(&"inner"));
    assert!(names.contains(&"outer"));
}

#[test]
fn fstring_evaluation() {
    let sandbox = dana_rt::Sandbox::new();
    let result = sandbox.eval("name = \"Dana\"\nmsg = f\"Hello {name}!\"\n");
    assert!(result.success, "{:?}", result.error.map(|e| e.display_chain()));
    match sandbox.context().get_scope(ScopeName::Local, "msg") {
        Some(Value::Str(s)) => assert_eq!(s, "Hello Dana!"),
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn two_sandboxes_share_no_state() {
    let a = dana_rt::Sandbox::new();
    let b = dana_rt::Sandbox::new();
    a.eval("x = 1\n");
    let result = b.eval("y = x\n");
    assert!(result.success);
    assert!(matches!(b.context().get_scope(ScopeName::Local, "y"), Some(Value::None)));
}

#[test]
fn reasoning_without_a_provider_is_a_runtime_error() {
    let sandbox = dana_rt::Sandbox::new();
    let result = sandbox.eval("r = reason(\"hello\")\n");
    assert!(!result.success);
    assert!(matches!(
        result.error.unwrap().root_cause(),
        Error::Runtime { .. }
    ));
}
