use crate::markup::{apply_style, Style};
use crate::models::{Note, NoteSnapshot, Record};
use crate::util::{is_blank, utf16_len};
use serde::{Deserialize, Serialize};

/// Editing state for one note, owned by the presentation layer.
///
/// Nothing here touches the store: saving goes through [`NoteDraft::snapshot`].
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NoteDraft {
    pub note_id: String,
    pub title: String,
    pub records: Vec<Record>,

    /// Pending record text.
    pub input: String,

    /// UTF-16 selection within `input`.
    #[serde(default)]
    pub selection: Option<(usize, usize)>,

    #[serde(default)]
    pub checkbox_mode: bool,

    // Local edit counter vs the last saved one; dirty when ahead.
    #[serde(default)]
    revision: u64,
    #[serde(default)]
    saved_revision: u64,
}

impl NoteDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_loaded(note: &Note) -> Self {
        let mut records = note.records.clone();
        records.sort_by_key(|r| r.order);
        Self {
            note_id: note.id.clone(),
            title: note.title.clone(),
            records,
            ..Default::default()
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    pub fn is_dirty(&self) -> bool {
        self.revision > self.saved_revision
    }

    /// Record the id the store returned and mark current content as saved.
    pub fn mark_saved(&mut self, note_id: &str) {
        self.note_id = note_id.to_string();
        self.saved_revision = self.revision;
    }

    pub fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.title = title.to_string();
            self.touch();
        }
    }

    /// Replace the pending input. Drops a selection that no longer fits.
    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        let len = utf16_len(&self.input);
        if let Some((start, end)) = self.selection {
            if start.max(end) > len {
                self.selection = None;
            }
        }
    }

    pub fn set_selection(&mut self, start: usize, end: usize) {
        self.selection = Some((start, end));
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn toggle_checkbox_mode(&mut self) -> bool {
        self.checkbox_mode = !self.checkbox_mode;
        self.checkbox_mode
    }

    /// Wrap the selected part of the input in `style`'s tags.
    ///
    /// Returns false (input untouched) when nothing is selected. The selection is cleared
    /// afterwards since its offsets no longer line up with the new text.
    pub fn apply_style(&mut self, style: Style) -> bool {
        let Some((start, end)) = self.selection.take() else {
            return false;
        };
        self.input = apply_style(&self.input, start, end, style.tag());
        true
    }

    /// Turn the pending input into a record at the end of the list.
    ///
    /// Blank input is ignored. In checkbox mode the record starts unchecked.
    pub fn add_record(&mut self) -> Option<&Record> {
        if is_blank(&self.input) {
            return None;
        }

        let content = std::mem::take(&mut self.input);
        let mut record = if self.checkbox_mode {
            Record::checkbox(content, false)
        } else {
            Record::text(content)
        };
        record.order = self.records.len() as i64;

        self.selection = None;
        self.records.push(record);
        self.touch();
        self.records.last()
    }

    /// Returns false for an out-of-range index or a text record.
    pub fn set_checked(&mut self, index: usize, checked: bool) -> bool {
        let Some(record) = self.records.get_mut(index) else {
            return false;
        };
        if !record.is_checkbox() {
            return false;
        }
        if record.is_checked != Some(checked) {
            record.is_checked = Some(checked);
            self.touch();
        }
        true
    }

    pub fn remove_record(&mut self, index: usize) -> Option<Record> {
        if index >= self.records.len() {
            return None;
        }
        let removed = self.records.remove(index);
        self.touch();
        Some(removed)
    }

    /// Owned copy for saving; `order` follows list position.
    pub fn snapshot(&self) -> NoteSnapshot {
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| Record {
                order: i as i64,
                ..r.clone()
            })
            .collect();

        NoteSnapshot {
            note_id: self.note_id.clone(),
            title: self.title.clone(),
            records,
        }
    }
}
