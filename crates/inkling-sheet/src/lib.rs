//! Sheet document model shared by the inkling runtime and its hosts.
//!
//! A sheet is a drawing fragment made of freehand lines and text runs.
//! The language never owns a sheet: it reads one, produces edited copies,
//! and routes removals through a [`SheetHost`] so the host can keep its
//! own undo history.

use serde::{Deserialize, Serialize};

mod journal;
pub use journal::{Journal, JournalEntry};

/// 2D position in sheet coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One sampled control point of a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Control {
    pub point: Point,
    pub weight: f64,
    pub pressure: f64,
}

impl Control {
    pub fn new(point: Point, weight: f64, pressure: f64) -> Self {
        Self {
            point,
            weight,
            pressure,
        }
    }
}

/// A freehand stroke.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Line {
    pub controls: Vec<Control>,
}

impl Line {
    pub fn new(controls: impl IntoIterator<Item = Control>) -> Self {
        Self {
            controls: controls.into_iter().collect(),
        }
    }
}

/// A run of text placed on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub string: String,
    /// Rotation in radians
    pub orientation: f64,
    pub size: f64,
    pub origin: Point,
}

/// A document fragment: every line and text run of a sheet (or a part of it).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    pub lines: Vec<Line>,
    pub texts: Vec<Text>,
}

impl Sheet {
    pub fn new(lines: Vec<Line>, texts: Vec<Text>) -> Self {
        Self { lines, texts }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.texts.is_empty()
    }

    /// Copy of the sheet without the given item.
    pub fn without(&self, item: Item) -> Option<Sheet> {
        let mut sheet = self.clone();
        match item {
            Item::Line(index) if index < sheet.lines.len() => {
                sheet.lines.remove(index);
            }
            Item::Text(index) if index < sheet.texts.len() => {
                sheet.texts.remove(index);
            }
            Item::Control { line, index } => {
                let controls = &mut sheet.lines.get_mut(line)?.controls;
                if index >= controls.len() {
                    return None;
                }
                controls.remove(index);
            }
            _ => return None,
        }
        Some(sheet)
    }
}

/// Addresses one removable item of a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Item {
    Line(usize),
    Text(usize),
    /// Control `index` of line `line`
    Control { line: usize, index: usize },
}

/// Edit API of the application that owns a sheet.
///
/// Implementations must be cheap to call from any thread; the runtime
/// holds hosts behind `Arc<dyn SheetHost>`.
pub trait SheetHost: Send + Sync + std::fmt::Debug {
    /// Remove `item` from `sheet`, recording the edit on the host side.
    ///
    /// Returns the edited sheet, or `None` when the host refuses the edit.
    fn remove(&self, sheet: &Sheet, item: Item) -> Option<Sheet>;
}
