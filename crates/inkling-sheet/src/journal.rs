//! Undo journal host.
//!
//! Records every removal so the owning document can step back through
//! edits made by the language.

use crate::{Control, Item, Line, Sheet, SheetHost, Text};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A removal recorded by the [`Journal`].
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEntry {
    Line { index: usize, line: Line },
    Text { index: usize, text: Text },
    Control { line: usize, index: usize, control: Control },
}

/// Host that accepts every valid removal and remembers it for undo.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries are pushed whole, so a poisoned lock is still consistent.
    fn entries(&self) -> MutexGuard<'_, Vec<JournalEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            log::warn!("journal lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Number of recorded edits.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reinsert the most recently removed item into `sheet`.
    ///
    /// Returns `None` when nothing is recorded or the recorded index no
    /// longer fits the sheet.
    pub fn undo(&self, sheet: &Sheet) -> Option<Sheet> {
        let mut entries = self.entries();
        let entry = entries.last()?.clone();
        let mut restored = sheet.clone();
        match entry {
            JournalEntry::Line { index, line } => {
                if index > restored.lines.len() {
                    return None;
                }
                restored.lines.insert(index, line);
            }
            JournalEntry::Text { index, text } => {
                if index > restored.texts.len() {
                    return None;
                }
                restored.texts.insert(index, text);
            }
            JournalEntry::Control { line, index, control } => {
                let controls = &mut restored.lines.get_mut(line)?.controls;
                if index > controls.len() {
                    return None;
                }
                controls.insert(index, control);
            }
        }
        entries.pop();
        Some(restored)
    }
}

impl SheetHost for Journal {
    fn remove(&self, sheet: &Sheet, item: Item) -> Option<Sheet> {
        let entry = match item {
            Item::Line(index) => JournalEntry::Line {
                index,
                line: sheet.lines.get(index)?.clone(),
            },
            Item::Text(index) => JournalEntry::Text {
                index,
                text: sheet.texts.get(index)?.clone(),
            },
            Item::Control { line, index } => JournalEntry::Control {
                line,
                index,
                control: *sheet.lines.get(line)?.controls.get(index)?,
            },
        };
        let edited = sheet.without(item)?;
        self.entries().push(entry);
        log::debug!("journal recorded removal of {item:?}");
        Some(edited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use std::sync::Arc;

    #[test]
    fn poisoned_journal_keeps_its_entries() {
        let journal = Arc::new(Journal::new());
        let sheet = Sheet::new(vec![Line::new([Control::new(Point::new(0.0, 0.0), 1.0, 1.0)])], Vec::new());
        let edited = journal.remove(&sheet, Item::Line(0)).unwrap();

        let poisoner = Arc::clone(&journal);
        let outcome = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the journal");
        })
        .join();
        assert!(outcome.is_err());
        assert!(journal.entries.is_poisoned());

        assert_eq!(journal.len(), 1);
        assert_eq!(journal.undo(&edited), Some(sheet));
    }
}
