//! Path selection and structural edits.
//!
//! `set`, `insert` and `remove` share one walk. Going outward, the
//! container at every depth of the path is collected and validated. The
//! terminal edit then produces a replacement child. Going back inward,
//! each ancestor is rebuilt with its edited child substituted. Every
//! rebuild happens after the whole path resolved, so a failure leaves
//! nothing half-edited. Inputs are never mutated.

use crate::array::Array;
use crate::bridge;
use crate::config::Limits;
use crate::error::Fault;
use crate::value::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// A base value and the path of components leading into it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selected {
    pub base: Value,
    pub path: SmallVec<[Value; 4]>,
}

impl Selected {
    pub fn new(base: Value, component: Value) -> Self {
        let mut path = SmallVec::new();
        path.push(component);
        Self { base, path }
    }

    /// Value at the end of the path.
    pub fn resolve(&self, limits: &Limits) -> Result<Value, Fault> {
        self.path
            .iter()
            .try_fold(self.base.clone(), |container, component| child(&container, component, limits))
    }
}

/// Terminal step of an edit walk.
#[derive(Debug, Clone)]
pub enum Edit {
    Replace(Value),
    Insert(Value),
    Remove,
}

impl Edit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Edit::Replace(_) => "<-",
            Edit::Insert(_) => "++",
            Edit::Remove => "--",
        }
    }
}

/// `/.`
pub fn select(target: &Value, component: &Value) -> Value {
    match (target, component) {
        (Value::Error(_), _) => target.clone(),
        (_, Value::Error(_)) => component.clone(),
        (Value::Selection(selected), _) => {
            let mut extended = (**selected).clone();
            extended.path.push(component.clone());
            Value::Selection(Arc::new(extended))
        }
        _ => Value::Selection(Arc::new(Selected::new(target.clone(), component.clone()))),
    }
}

/// `.`
pub fn at(container: &Value, component: &Value, limits: &Limits) -> Value {
    match (container, component) {
        (Value::Error(_), _) => container.clone(),
        (_, Value::Error(_)) => component.clone(),
        _ => child(container, component, limits).into(),
    }
}

/// `<-`
pub fn set(selection: &Value, value: &Value, limits: &Limits) -> Value {
    if value.is_error() {
        return value.clone();
    }
    match selection {
        Value::Error(_) => selection.clone(),
        Value::Selection(selected) => edit(selected, Edit::Replace(value.clone()), limits).into(),
        other => Fault::undefined("<-", &[other.type_name(), value.type_name()]).into(),
    }
}

/// `++`: insert at the selected index, or append to an unselected
/// collection.
pub fn insert(target: &Value, value: &Value, limits: &Limits) -> Value {
    if value.is_error() {
        return value.clone();
    }
    match target {
        Value::Error(_) => target.clone(),
        Value::Selection(selected) => edit(selected, Edit::Insert(value.clone()), limits).into(),
        collection => append(collection, value.clone(), limits).into(),
    }
}

/// `--`
pub fn remove(selection: &Value, limits: &Limits) -> Value {
    match selection {
        Value::Error(_) => selection.clone(),
        Value::Selection(selected) => edit(selected, Edit::Remove, limits).into(),
        other => Fault::undefined("--", &[other.type_name()]).into(),
    }
}

fn edit(selected: &Selected, edit: Edit, limits: &Limits) -> Result<Value, Fault> {
    let path = &selected.path;
    let Some(last) = path.len().checked_sub(1) else {
        return Err(Fault::shape("nothing is selected"));
    };
    let mut containers: SmallVec<[Value; 4]> = SmallVec::new();
    containers.push(selected.base.clone());
    let mut replacement = None;
    for depth in 0..=last {
        let container = &containers[depth];
        if let Value::Sheet(fragment) = container {
            if let Some(result) = bridge::edit(fragment, &path[depth..], &edit) {
                replacement = Some(result?);
                break;
            }
        }
        if depth == last {
            replacement = Some(apply_terminal(container, &path[last], edit, limits)?);
            break;
        }
        let next = child(container, &path[depth], limits)?;
        containers.push(next);
    }
    let mut replacement = replacement.ok_or_else(|| Fault::shape("selection did not resolve"))?;
    // containers[k] holds the parent of path[k]; the edited child sits
    // at the deepest collected depth
    for depth in (0..containers.len() - 1).rev() {
        replacement = replace_child(&containers[depth], &path[depth], replacement, limits)?;
    }
    Ok(replacement)
}

/// One step of resolution.
pub fn child(container: &Value, component: &Value, limits: &Limits) -> Result<Value, Fault> {
    match container {
        Value::Array(array) => array.at(component),
        Value::Range(range) => range.materialize(limits.max_elements)?.at(component),
        Value::Dictionary(dictionary) => dictionary.lookup(component),
        Value::String(text) => {
            let count = text.chars().count();
            let index = Array::index(component, count)?;
            Ok(text
                .chars()
                .nth(index)
                .map(|c| Value::string(c.to_string()))
                .unwrap_or_else(Value::nil))
        }
        Value::Sheet(fragment) => bridge::field(fragment, component),
        Value::Selection(selected) => child(&selected.resolve(limits)?, component, limits),
        other => Err(Fault::undefined(".", &[other.type_name(), component.type_name()])),
    }
}

fn materialized(container: &Value, limits: &Limits) -> Result<Array, Fault> {
    match container {
        Value::Range(range) => range.materialize(limits.max_elements),
        Value::Array(array) => Ok(array.clone()),
        other => Err(Fault::undefined("index", &[other.type_name()])),
    }
}

fn splice(text: &str, component: &Value, bound_extra: usize, insert: Option<&str>, replace: bool) -> Result<Value, Fault> {
    let chars: Vec<char> = text.chars().collect();
    let index = Array::index(component, chars.len() + bound_extra)?;
    let mut out = String::with_capacity(text.len());
    out.extend(&chars[..index]);
    if let Some(insert) = insert {
        out.push_str(insert);
    }
    let rest = if replace || insert.is_none() { index + 1 } else { index };
    out.extend(chars.iter().skip(rest));
    Ok(Value::string(out))
}

fn text_operand<'v>(op: &str, value: &'v Value) -> Result<&'v str, Fault> {
    value
        .as_str()
        .ok_or_else(|| Fault::undefined(op, &["String", value.type_name()]))
}

/// Rebuild `container` with the child at `component` replaced.
pub fn replace_child(container: &Value, component: &Value, value: Value, limits: &Limits) -> Result<Value, Fault> {
    match container {
        Value::Array(array) => array.replaced(component, value).map(Value::Array),
        Value::Range(_) => materialized(container, limits)?
            .replaced(component, value)
            .map(Value::Array),
        Value::Dictionary(dictionary) => Ok(Value::Dictionary(dictionary.with(component, value))),
        Value::String(text) => splice(text, component, 0, Some(text_operand("<-", &value)?), true),
        Value::Sheet(fragment) => bridge::replace_field(fragment, component, &value),
        other => Err(Fault::undefined("<-", &[other.type_name(), value.type_name()])),
    }
}

fn apply_terminal(container: &Value, component: &Value, edit: Edit, limits: &Limits) -> Result<Value, Fault> {
    match edit {
        Edit::Replace(value) => replace_child(container, component, value, limits),
        Edit::Insert(value) => insert_at(container, component, value, limits),
        Edit::Remove => remove_child(container, component, limits),
    }
}

fn insert_at(container: &Value, component: &Value, value: Value, limits: &Limits) -> Result<Value, Fault> {
    match container {
        Value::Dictionary(_) => Err(Fault::undefined("++", &["Dictionary", value.type_name()])),
        Value::Array(_) | Value::Range(_) if component.is_number() => {
            materialized(container, limits)?.inserted(component, value).map(Value::Array)
        }
        Value::String(text) if component.is_number() => {
            splice(text, component, 1, Some(text_operand("++", &value)?), false)
        }
        _ => {
            // the component names a collection to append to
            let collection = child(container, component, limits)?;
            let appended = append(&collection, value, limits)?;
            replace_child(container, component, appended, limits)
        }
    }
}

fn append(collection: &Value, value: Value, limits: &Limits) -> Result<Value, Fault> {
    match collection {
        Value::Array(array) => array.appended(value).map(Value::Array),
        Value::Range(range) if !range.is_bounded() => {
            Err(Fault::shape("cannot insert into an unbounded range"))
        }
        Value::Range(_) => materialized(collection, limits)?.appended(value).map(Value::Array),
        Value::String(text) => Ok(Value::string(format!("{text}{}", text_operand("++", &value)?))),
        other => Err(Fault::undefined("++", &[other.type_name(), value.type_name()])),
    }
}

fn remove_child(container: &Value, component: &Value, limits: &Limits) -> Result<Value, Fault> {
    match container {
        Value::Array(_) | Value::Range(_) => materialized(container, limits)?
            .removed(component)
            .map(Value::Array),
        Value::Dictionary(dictionary) => dictionary.without(component).map(Value::Dictionary),
        Value::String(text) => splice(text, component, 0, None, true),
        other => Err(Fault::undefined("--", &[other.type_name(), component.type_name()])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::range::{Bounds, Range};

    fn ints(values: &[i64]) -> Value {
        Value::array(values.iter().copied().map(Value::Int))
    }

    fn limits() -> Limits {
        Limits::default()
    }

    fn path(base: &Value, components: &[Value]) -> Value {
        components
            .iter()
            .fold(base.clone(), |selection, component| select(&selection, component))
    }

    #[test]
    fn insert_and_remove_at_an_index() {
        let array = ints(&[3, 4]);
        let inserted = insert(&select(&array, &Value::Int(1)), &Value::Int(5), &limits());
        assert_eq!(inserted, ints(&[3, 5, 4]));
        let removed = remove(&select(&ints(&[3, 4, 5]), &Value::Int(1)), &limits());
        assert_eq!(removed, ints(&[3, 5]));
        assert_eq!(insert(&array, &Value::Int(6), &limits()), ints(&[3, 4, 6]));
    }

    #[test]
    fn nested_set_rebuilds_every_ancestor() {
        let inner = Value::dictionary([(Value::string("xs"), ints(&[1, 2, 3]))]);
        let root = Value::array([Value::Int(0), inner]);
        let selection = path(&root, &[Value::Int(1), Value::identifier("xs"), Value::Int(2)]);
        let updated = set(&selection, &Value::Int(9), &limits());

        let read_back = path(&updated, &[Value::Int(1), Value::identifier("xs"), Value::Int(2)]);
        let Value::Selection(selected) = read_back else {
            panic!("expected a selection");
        };
        assert_eq!(selected.resolve(&limits()), Ok(Value::Int(9)));
        assert_eq!(at(&at(&at(&root, &Value::Int(1), &limits()), &Value::string("xs"), &limits()), &Value::Int(2), &limits()), Value::Int(3));
    }

    #[test]
    fn failures_mid_path_leave_no_partial_edit() {
        let root = Value::array([ints(&[1, 2])]);
        let selection = path(&root, &[Value::Int(0), Value::Int(5)]);
        let result = set(&selection, &Value::Int(9), &limits());
        let fault = result.as_error().unwrap();
        assert_eq!(fault.kind, ErrorKind::Bounds);
        assert!(fault.message.contains("0..<2"));
    }

    #[test]
    fn dictionaries_reject_insertion() {
        let dict = Value::dictionary([(Value::string("a"), Value::Int(1))]);
        let result = insert(&select(&dict, &Value::string("b")), &Value::Int(2), &limits());
        assert_eq!(result.as_error().map(|f| f.kind), Some(ErrorKind::UndefinedOperator));
        let added = set(&select(&dict, &Value::string("b")), &Value::Int(2), &limits());
        assert_eq!(at(&added, &Value::string("b"), &limits()), Value::Int(2));
    }

    #[test]
    fn unbounded_ranges_cannot_be_edited() {
        let from = Value::from(Range::build(Bounds::Closed, &Value::Int(0), &Value::nil()).unwrap());
        for result in [
            at(&from, &Value::Int(0), &limits()),
            set(&select(&from, &Value::Int(0)), &Value::Int(1), &limits()),
            insert(&select(&from, &Value::Int(0)), &Value::Int(1), &limits()),
            remove(&select(&from, &Value::Int(0)), &limits()),
            insert(&from, &Value::Int(1), &limits()),
        ] {
            assert_eq!(result.as_error().map(|f| f.kind), Some(ErrorKind::Shape), "{result}");
        }
        let bounded = Value::from(Range::build(Bounds::Closed, &Value::Int(0), &Value::Int(2)).unwrap());
        assert_eq!(remove(&select(&bounded, &Value::Int(0)), &limits()), ints(&[1, 2]));
    }

    #[test]
    fn strings_are_indexable() {
        let text = Value::string("cat");
        assert_eq!(at(&text, &Value::Int(1), &limits()), Value::string("a"));
        assert_eq!(set(&select(&text, &Value::Int(0)), &Value::string("b"), &limits()), Value::string("bat"));
        assert_eq!(insert(&select(&text, &Value::Int(3)), &Value::string("s"), &limits()), Value::string("cats"));
        assert_eq!(remove(&select(&text, &Value::Int(2)), &limits()), Value::string("ca"));
    }

    #[test]
    fn errors_pass_through_selection() {
        let error = Value::from(Fault::user("no"));
        assert_eq!(select(&error, &Value::Int(0)), error);
        assert_eq!(at(&ints(&[1]), &error, &limits()), error);
        assert_eq!(set(&select(&ints(&[1]), &Value::Int(0)), &error, &limits()), error);
    }
}
