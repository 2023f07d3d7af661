use inkling::literal;
use inkling::{ErrorKind, Runtime, Value};

fn parsed(text: &str) -> Value {
    match literal::parse(text) {
        Ok(value) => value,
        Err(errors) => panic!("`{text}` failed: {errors:?}"),
    }
}

/// `base /. c0 /. c1 ...`
fn selection(runtime: &Runtime, base: &Value, path: &[Value]) -> Value {
    path.iter().fold(base.clone(), |target, component| {
        runtime.call("/.", vec![target, component.clone()])
    })
}

fn read(runtime: &Runtime, base: &Value, path: &[Value]) -> Value {
    path.iter().fold(base.clone(), |container, component| {
        runtime.call(".", vec![container, component.clone()])
    })
}

#[test]
fn read_after_write_leaves_the_input_untouched() {
    let runtime = Runtime::new();
    let cases = [
        ("((1 2) (3 4))", vec![Value::Int(1), Value::Int(0)]),
        (r#"{"a": {"b": 1}, "c": 2}"#, vec![Value::string("a"), Value::string("b")]),
        (r#"({"x": (5 6)})"#, vec![Value::Int(0), Value::string("x"), Value::Int(1)]),
        (r#""hello""#, vec![Value::Int(4)]),
    ];
    for (text, path) in cases {
        let base = parsed(text);
        let written = Value::string("o");
        let edited = runtime.call("<-", vec![selection(&runtime, &base, &path), written.clone()]);
        assert!(!edited.is_error(), "{text}: {edited}");
        assert_eq!(read(&runtime, &edited, &path), written, "{text}");
        assert_eq!(base, parsed(text), "{text} was mutated");
    }
}

#[test]
fn insert_then_remove_restores_the_array() {
    let runtime = Runtime::new();
    let original = parsed("(10 20 30)");
    for i in 0..3 {
        let index = Value::Int(i);
        let inserted = runtime.call(
            "++",
            vec![selection(&runtime, &original, &[index.clone()]), Value::Int(99)],
        );
        let restored = runtime.call("--", vec![selection(&runtime, &inserted, &[index.clone()])]);
        assert_eq!(restored, original, "insert then remove at {i}");

        let element = read(&runtime, &original, &[index.clone()]);
        let removed = runtime.call("--", vec![selection(&runtime, &original, &[index.clone()])]);
        let restored = runtime.call("++", vec![selection(&runtime, &removed, &[index]), element]);
        assert_eq!(restored, original, "remove then insert at {i}");
    }
}

#[test]
fn out_of_range_reads_name_the_bound() {
    let runtime = Runtime::new();
    let array = parsed("(1 2 3)");
    for index in [3, -1] {
        let result = runtime.call(".", vec![array.clone(), Value::Int(index)]);
        let fault = result.as_error().cloned().unwrap();
        assert_eq!(fault.kind, ErrorKind::Bounds);
        assert!(fault.message.contains(&index.to_string()), "{}", fault.message);
        assert!(fault.message.contains("0..<3"), "{}", fault.message);
    }
}

#[test]
fn a_failing_step_deep_in_the_path_edits_nothing() {
    let runtime = Runtime::new();
    let base = parsed("((1 2) (3 4))");
    let path = [Value::Int(1), Value::Int(5)];
    let result = runtime.call("<-", vec![selection(&runtime, &base, &path), Value::Int(0)]);
    assert_eq!(result.as_error().map(|fault| fault.kind), Some(ErrorKind::Bounds));
    assert_eq!(base, parsed("((1 2) (3 4))"));
}

#[test]
fn dictionaries_and_unbounded_ranges_reject_insertion() {
    let runtime = Runtime::new();
    let dictionary = parsed(r#"{"a": 1}"#);
    let at_key = selection(&runtime, &dictionary, &[Value::string("b")]);
    let inserted = runtime.call("++", vec![at_key.clone(), Value::Int(2)]);
    assert!(inserted.is_error());
    let set = runtime.call("<-", vec![at_key, Value::Int(2)]);
    assert_eq!(set, parsed(r#"{"a": 1, "b": 2}"#));

    let unbounded = parsed("[0, ...)");
    let appended = runtime.call("++", vec![unbounded.clone(), Value::Int(1)]);
    assert_eq!(appended.as_error().map(|fault| fault.kind), Some(ErrorKind::Shape));
    let indexed = runtime.call(".", vec![unbounded, Value::Int(2)]);
    assert_eq!(indexed.as_error().map(|fault| fault.kind), Some(ErrorKind::Shape));
}

#[test]
fn bounded_ranges_index_like_arrays() {
    let runtime = Runtime::new();
    let range = parsed("[0, 10]__5");
    assert_eq!(runtime.call(".", vec![range.clone(), Value::Int(1)]), Value::Int(5));
    assert_eq!(runtime.call("counta", vec![range]), Value::Int(3));
}
