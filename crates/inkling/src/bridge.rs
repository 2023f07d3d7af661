//! Conversion between values and sheet fragments.
//!
//! The encodings use fixed string keys: a control is
//! `{point, weight, pressure}`, a text run is
//! `{string, orientation, size, origin}` and a fragment is
//! `{lines, texts}`. Decoding checks field count and types and returns
//! `None` on any mismatch.
//!
//! Edits whose path names a structured field are applied directly to the
//! sheet instead of encoding, editing and decoding the whole fragment.

use crate::array::Array;
use crate::dictionary::Dictionary;
use crate::error::Fault;
use crate::select::Edit;
use crate::value::Value;
use inkling_sheet::{Control, Item, Line, Point, Sheet, SheetHost, Text};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A sheet value, optionally attached to the host that owns it.
#[derive(Clone, Debug)]
pub struct Fragment {
    sheet: Arc<Sheet>,
    host: Option<Arc<dyn SheetHost>>,
}

impl Fragment {
    pub fn new(sheet: Sheet) -> Self {
        Self {
            sheet: Arc::new(sheet),
            host: None,
        }
    }

    pub fn hosted(sheet: Sheet, host: Arc<dyn SheetHost>) -> Self {
        Self {
            sheet: Arc::new(sheet),
            host: Some(host),
        }
    }

    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    pub fn host(&self) -> Option<&Arc<dyn SheetHost>> {
        self.host.as_ref()
    }

    /// Edited copy attached to the same host.
    pub fn with_sheet(&self, sheet: Sheet) -> Self {
        Self {
            sheet: Arc::new(sheet),
            host: self.host.clone(),
        }
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.sheet == other.sheet
    }
}

impl Eq for Fragment {}

impl Hash for Fragment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sheet.lines.len().hash(state);
        self.sheet.texts.len().hash(state);
    }
}

impl From<Fragment> for Value {
    fn from(fragment: Fragment) -> Self {
        Value::Sheet(fragment)
    }
}

fn entry(name: &str, value: Value) -> (Value, Value) {
    (Value::string(name), value)
}

pub fn encode_point(point: &Point) -> Value {
    Value::array([Value::Double(point.x), Value::Double(point.y)])
}

pub fn encode_control(control: &Control) -> Value {
    Value::dictionary([
        entry("point", encode_point(&control.point)),
        entry("weight", Value::Double(control.weight)),
        entry("pressure", Value::Double(control.pressure)),
    ])
}

pub fn encode_line(line: &Line) -> Value {
    Value::array(line.controls.iter().map(encode_control))
}

pub fn encode_text(text: &Text) -> Value {
    Value::dictionary([
        entry("string", Value::string(text.string.as_str())),
        entry("orientation", Value::Double(text.orientation)),
        entry("size", Value::Double(text.size)),
        entry("origin", encode_point(&text.origin)),
    ])
}

fn encode_lines(lines: &[Line]) -> Value {
    Value::array(lines.iter().map(encode_line))
}

fn encode_texts(texts: &[Text]) -> Value {
    Value::array(texts.iter().map(encode_text))
}

pub fn encode_sheet(sheet: &Sheet) -> Value {
    Value::dictionary([
        entry("lines", encode_lines(&sheet.lines)),
        entry("texts", encode_texts(&sheet.texts)),
    ])
}

fn real(value: &Value) -> Option<f64> {
    value.as_number().map(|n| n.to_f64())
}

/// Dictionary with exactly `count` entries.
fn fields(value: &Value, count: usize) -> Option<&Dictionary> {
    match value {
        Value::Dictionary(dictionary) if dictionary.len() == count => Some(dictionary),
        _ => None,
    }
}

fn array(value: &Value) -> Option<&Array> {
    match value {
        Value::Array(array) if array.dimension() == 1 => Some(array),
        _ => None,
    }
}

pub fn decode_point(value: &Value) -> Option<Point> {
    match array(value)?.items() {
        [x, y] => Some(Point::new(real(x)?, real(y)?)),
        _ => None,
    }
}

pub fn decode_control(value: &Value) -> Option<Control> {
    let fields = fields(value, 3)?;
    Some(Control::new(
        decode_point(fields.get_str("point")?)?,
        real(fields.get_str("weight")?)?,
        real(fields.get_str("pressure")?)?,
    ))
}

pub fn decode_line(value: &Value) -> Option<Line> {
    array(value)?
        .iter()
        .map(decode_control)
        .collect::<Option<Vec<_>>>()
        .map(Line::new)
}

pub fn decode_text(value: &Value) -> Option<Text> {
    let fields = fields(value, 4)?;
    Some(Text {
        string: fields.get_str("string")?.as_str()?.to_string(),
        orientation: real(fields.get_str("orientation")?)?,
        size: real(fields.get_str("size")?)?,
        origin: decode_point(fields.get_str("origin")?)?,
    })
}

fn decode_lines(value: &Value) -> Option<Vec<Line>> {
    array(value)?.iter().map(decode_line).collect()
}

fn decode_texts(value: &Value) -> Option<Vec<Text>> {
    array(value)?.iter().map(decode_text).collect()
}

pub fn decode_sheet(value: &Value) -> Option<Sheet> {
    let fields = fields(value, 2)?;
    Some(Sheet::new(
        decode_lines(fields.get_str("lines")?)?,
        decode_texts(fields.get_str("texts")?)?,
    ))
}

fn mismatch(what: &str, value: &Value) -> Fault {
    Fault::shape(format!("expected {what}, got {value}"))
}

/// `fragment . component`: the `lines` or `texts` of a fragment.
pub fn field(fragment: &Fragment, component: &Value) -> Result<Value, Fault> {
    match component.as_name() {
        Some("lines") => Ok(encode_lines(&fragment.sheet.lines)),
        Some("texts") => Ok(encode_texts(&fragment.sheet.texts)),
        _ => Err(Fault::missing_key(component)),
    }
}

/// Fragment with its `lines` or `texts` replaced by a decoded value.
pub fn replace_field(fragment: &Fragment, component: &Value, value: &Value) -> Result<Value, Fault> {
    let mut sheet = Sheet::clone(&fragment.sheet);
    match component.as_name() {
        Some("lines") => sheet.lines = decode_lines(value).ok_or_else(|| mismatch("lines", value))?,
        Some("texts") => sheet.texts = decode_texts(value).ok_or_else(|| mismatch("texts", value))?,
        _ => return Err(Fault::missing_key(component)),
    }
    Ok(fragment.with_sheet(sheet).into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlField {
    Point,
    Weight,
    Pressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    String,
    Orientation,
    Size,
    Origin,
}

/// Structured location inside a fragment. Index components are kept as
/// values and bounds-checked when the edit is applied.
#[derive(Debug)]
enum SheetPath<'p> {
    Lines,
    Line(&'p Value),
    Control(&'p Value, &'p Value),
    ControlField(&'p Value, &'p Value, ControlField),
    Coordinate(&'p Value, &'p Value, &'p Value),
    Texts,
    Text(&'p Value),
    TextField(&'p Value, TextField),
    OriginCoordinate(&'p Value, &'p Value),
}

fn is_index(value: &Value) -> bool {
    value.as_number().and_then(|n| n.as_index()).is_some()
}

impl<'p> SheetPath<'p> {
    fn parse(path: &'p [Value]) -> Option<SheetPath<'p>> {
        let (first, rest) = path.split_first()?;
        match first.as_name()? {
            "lines" => match rest {
                [] => Some(SheetPath::Lines),
                [i] if is_index(i) => Some(SheetPath::Line(i)),
                [i, j] if is_index(i) && is_index(j) => Some(SheetPath::Control(i, j)),
                [i, j, field] if is_index(i) && is_index(j) => {
                    let field = match field.as_name()? {
                        "point" => ControlField::Point,
                        "weight" => ControlField::Weight,
                        "pressure" => ControlField::Pressure,
                        _ => return None,
                    };
                    Some(SheetPath::ControlField(i, j, field))
                }
                [i, j, field, k]
                    if is_index(i) && is_index(j) && is_index(k) && field.as_name() == Some("point") =>
                {
                    Some(SheetPath::Coordinate(i, j, k))
                }
                _ => None,
            },
            "texts" => match rest {
                [] => Some(SheetPath::Texts),
                [i] if is_index(i) => Some(SheetPath::Text(i)),
                [i, field] if is_index(i) => {
                    let field = match field.as_name()? {
                        "string" => TextField::String,
                        "orientation" => TextField::Orientation,
                        "size" => TextField::Size,
                        "origin" => TextField::Origin,
                        _ => return None,
                    };
                    Some(SheetPath::TextField(i, field))
                }
                [i, field, k] if is_index(i) && is_index(k) && field.as_name() == Some("origin") => {
                    Some(SheetPath::OriginCoordinate(i, k))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

/// Apply `edit` at `path` inside `fragment` when the path is one of the
/// structured field paths. `None` sends the caller down the generic walk.
pub(crate) fn edit(fragment: &Fragment, path: &[Value], edit: &Edit) -> Option<Result<Value, Fault>> {
    let target = SheetPath::parse(path)?;
    log::trace!("sheet fast path {target:?} for {}", edit.symbol());
    Some(apply(fragment, target, edit))
}

fn apply(fragment: &Fragment, target: SheetPath<'_>, edit: &Edit) -> Result<Value, Fault> {
    let mut sheet = Sheet::clone(&fragment.sheet);
    match (target, edit) {
        (SheetPath::Line(i), Edit::Remove) => {
            let index = Array::index(i, sheet.lines.len())?;
            return remove_item(fragment, Item::Line(index));
        }
        (SheetPath::Text(i), Edit::Remove) => {
            let index = Array::index(i, sheet.texts.len())?;
            return remove_item(fragment, Item::Text(index));
        }
        (SheetPath::Lines, Edit::Replace(value)) => {
            sheet.lines = decode_lines(value).ok_or_else(|| mismatch("lines", value))?;
        }
        (SheetPath::Lines, Edit::Insert(value)) => {
            sheet.lines.push(decode_line(value).ok_or_else(|| mismatch("a line", value))?);
        }
        (SheetPath::Line(i), Edit::Replace(value)) => {
            let index = Array::index(i, sheet.lines.len())?;
            sheet.lines[index] = decode_line(value).ok_or_else(|| mismatch("a line", value))?;
        }
        (SheetPath::Line(i), Edit::Insert(value)) => {
            let index = Array::index(i, sheet.lines.len() + 1)?;
            let line = decode_line(value).ok_or_else(|| mismatch("a line", value))?;
            sheet.lines.insert(index, line);
        }
        (SheetPath::Control(i, j), Edit::Remove) => {
            let line = Array::index(i, sheet.lines.len())?;
            let index = Array::index(j, sheet.lines[line].controls.len())?;
            return remove_item(fragment, Item::Control { line, index });
        }
        (SheetPath::Control(i, j), Edit::Replace(value)) => {
            let control = control_mut(&mut sheet, i, j)?;
            *control = decode_control(value).ok_or_else(|| mismatch("a control", value))?;
        }
        (SheetPath::Control(i, j), Edit::Insert(value)) => {
            let line = line_mut(&mut sheet, i)?;
            let index = Array::index(j, line.controls.len() + 1)?;
            let control = decode_control(value).ok_or_else(|| mismatch("a control", value))?;
            line.controls.insert(index, control);
        }
        (SheetPath::ControlField(i, j, field), Edit::Replace(value)) => {
            let control = control_mut(&mut sheet, i, j)?;
            match field {
                ControlField::Point => {
                    control.point = decode_point(value).ok_or_else(|| mismatch("a point", value))?;
                }
                ControlField::Weight => control.weight = number(value)?,
                ControlField::Pressure => control.pressure = number(value)?,
            }
        }
        (SheetPath::Coordinate(i, j, k), Edit::Replace(value)) => {
            let control = control_mut(&mut sheet, i, j)?;
            *coordinate(&mut control.point, k)? = number(value)?;
        }
        (SheetPath::Texts, Edit::Replace(value)) => {
            sheet.texts = decode_texts(value).ok_or_else(|| mismatch("texts", value))?;
        }
        (SheetPath::Texts, Edit::Insert(value)) => {
            sheet.texts.push(decode_text(value).ok_or_else(|| mismatch("a text", value))?);
        }
        (SheetPath::Text(i), Edit::Replace(value)) => {
            let index = Array::index(i, sheet.texts.len())?;
            sheet.texts[index] = decode_text(value).ok_or_else(|| mismatch("a text", value))?;
        }
        (SheetPath::Text(i), Edit::Insert(value)) => {
            let index = Array::index(i, sheet.texts.len() + 1)?;
            let text = decode_text(value).ok_or_else(|| mismatch("a text", value))?;
            sheet.texts.insert(index, text);
        }
        (SheetPath::TextField(i, field), Edit::Replace(value)) => {
            let text = text_mut(&mut sheet, i)?;
            match field {
                TextField::String => {
                    text.string = value.as_str().ok_or_else(|| mismatch("a string", value))?.to_string();
                }
                TextField::Orientation => text.orientation = number(value)?,
                TextField::Size => text.size = number(value)?,
                TextField::Origin => {
                    text.origin = decode_point(value).ok_or_else(|| mismatch("a point", value))?;
                }
            }
        }
        (SheetPath::OriginCoordinate(i, k), Edit::Replace(value)) => {
            let text = text_mut(&mut sheet, i)?;
            *coordinate(&mut text.origin, k)? = number(value)?;
        }
        (target, edit) => {
            return Err(Fault::undefined(edit.symbol(), &["Sheet", format!("{target:?}").as_str()]));
        }
    }
    Ok(fragment.with_sheet(sheet).into())
}

fn number(value: &Value) -> Result<f64, Fault> {
    real(value).ok_or_else(|| mismatch("a number", value))
}

fn line_mut<'s>(sheet: &'s mut Sheet, i: &Value) -> Result<&'s mut Line, Fault> {
    let index = Array::index(i, sheet.lines.len())?;
    Ok(&mut sheet.lines[index])
}

fn control_mut<'s>(sheet: &'s mut Sheet, i: &Value, j: &Value) -> Result<&'s mut Control, Fault> {
    let line = line_mut(sheet, i)?;
    let index = Array::index(j, line.controls.len())?;
    Ok(&mut line.controls[index])
}

fn text_mut<'s>(sheet: &'s mut Sheet, i: &Value) -> Result<&'s mut Text, Fault> {
    let index = Array::index(i, sheet.texts.len())?;
    Ok(&mut sheet.texts[index])
}

fn coordinate<'s>(point: &'s mut Point, k: &Value) -> Result<&'s mut f64, Fault> {
    match Array::index(k, 2)? {
        0 => Ok(&mut point.x),
        _ => Ok(&mut point.y),
    }
}

/// Removal goes through the owning host so it lands in the host's undo
/// history; a detached fragment edits its own copy.
fn remove_item(fragment: &Fragment, item: Item) -> Result<Value, Fault> {
    let edited = match &fragment.host {
        Some(host) => host.remove(&fragment.sheet, item),
        None => fragment.sheet.without(item),
    };
    match edited {
        Some(sheet) => Ok(fragment.with_sheet(sheet).into()),
        None => {
            log::warn!("host refused to remove {item:?}");
            Err(Fault::undefined("--", &["Sheet", "a refused edit"]))
        }
    }
}
