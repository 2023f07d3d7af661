use inkling::bridge::{self, Fragment};
use inkling::{Runtime, Value};
use inkling_sheet::{Control, Journal, Line, Point, Sheet, SheetHost, Text};
use std::sync::Arc;

fn stroke(x: f64) -> Line {
    Line::new([
        Control::new(Point::new(x, 0.0), 1.0, 0.5),
        Control::new(Point::new(x, 2.0), 1.5, 0.25),
    ])
}

fn sheet() -> Sheet {
    Sheet::new(
        vec![stroke(0.0), stroke(3.0)],
        vec![Text {
            string: "title".into(),
            orientation: 0.0,
            size: 18.0,
            origin: Point::new(1.0, 1.0),
        }],
    )
}

fn selection(runtime: &Runtime, base: Value, path: &[Value]) -> Value {
    path.iter().fold(base, |target, component| {
        runtime.call("/.", vec![target, component.clone()])
    })
}

fn edited_sheet(value: &Value) -> &Sheet {
    match value {
        Value::Sheet(fragment) => fragment.sheet(),
        other => panic!("expected a sheet, got {other}"),
    }
}

#[test]
fn coordinate_edits_touch_one_field() {
    let runtime = Runtime::new();
    let base = Value::from(Fragment::new(sheet()));
    let path = [
        Value::string("lines"),
        Value::Int(1),
        Value::Int(0),
        Value::string("point"),
        Value::Int(1),
    ];
    let edited = runtime.call("<-", vec![selection(&runtime, base.clone(), &path), Value::Double(7.5)]);

    let mut expected = sheet();
    expected.lines[1].controls[0].point.y = 7.5;
    assert_eq!(edited_sheet(&edited), &expected);
    assert_eq!(edited_sheet(&base), &sheet());
}

#[test]
fn text_fields_accept_their_own_types() {
    let runtime = Runtime::new();
    let base = Value::from(Fragment::new(sheet()));
    let path = [Value::string("texts"), Value::Int(0), Value::string("string")];
    let renamed = runtime.call(
        "<-",
        vec![selection(&runtime, base.clone(), &path), Value::string("renamed")],
    );
    assert_eq!(edited_sheet(&renamed).texts[0].string, "renamed");

    let rejected = runtime.call("<-", vec![selection(&runtime, base, &path), Value::Int(3)]);
    assert!(rejected.is_error());
}

#[test]
fn lines_read_back_as_dictionaries() {
    let runtime = Runtime::new();
    let base = Value::from(Fragment::new(sheet()));
    let lines = runtime.call(".", vec![base, Value::string("lines")]);
    let first = runtime.call(".", vec![lines.clone(), Value::Int(0)]);
    assert_eq!(bridge::decode_line(&first), Some(stroke(0.0)));
    assert_eq!(runtime.call("counta", vec![lines]), Value::Int(2));
}

#[test]
fn removal_goes_through_the_host_and_can_be_undone() {
    let runtime = Runtime::new();
    let journal = Arc::new(Journal::new());
    let host: Arc<dyn SheetHost> = journal.clone();
    let base = Value::from(Fragment::hosted(sheet(), host));

    let target = selection(&runtime, base, &[Value::string("lines"), Value::Int(0)]);
    let removed = runtime.call("--", vec![target]);
    let after = edited_sheet(&removed).clone();
    assert_eq!(after.lines, vec![stroke(3.0)]);
    assert_eq!(journal.len(), 1);

    assert_eq!(journal.undo(&after), Some(sheet()));
    assert!(journal.is_empty());
}

#[test]
fn control_removal_is_journaled() {
    let runtime = Runtime::new();
    let journal = Arc::new(Journal::new());
    let host: Arc<dyn SheetHost> = journal.clone();
    let base = Value::from(Fragment::hosted(sheet(), host));

    let path = [Value::string("lines"), Value::Int(1), Value::Int(0)];
    let removed = runtime.call("--", vec![selection(&runtime, base, &path)]);
    let after = edited_sheet(&removed).clone();
    assert_eq!(after.lines[1].controls, vec![stroke(3.0).controls[1]]);
    assert_eq!(journal.len(), 1);

    assert_eq!(journal.undo(&after), Some(sheet()));
}

#[test]
fn removal_out_of_range_never_reaches_the_host() {
    let runtime = Runtime::new();
    let journal = Arc::new(Journal::new());
    let host: Arc<dyn SheetHost> = journal.clone();
    let base = Value::from(Fragment::hosted(sheet(), host));

    let target = selection(&runtime, base, &[Value::string("texts"), Value::Int(4)]);
    let result = runtime.call("--", vec![target]);
    let message = result.as_error().map(|fault| fault.message.clone()).unwrap_or_default();
    assert!(message.contains("0..<1"), "{message}");
    assert!(journal.is_empty());
}
