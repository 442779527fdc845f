use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Title shown for notes persisted without one.
pub const UNTITLED: &str = "Untitled";

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordType {
    #[default]
    Text,
    Checkbox,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Note {
    /// Empty until the note is first saved.
    pub id: String,
    pub title: String,
    /// Assigned by the store on every save.
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Note {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            modified_at: Utc::now(),
            records: Vec::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }
}

/// One content unit of a note.
///
/// `is_checked` is `Some` exactly when `kind` is [`RecordType::Checkbox`];
/// constructors and the store keep that pairing intact.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// Document id under the note's `records` collection. Empty for unsaved records.
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type")]
    pub kind: RecordType,

    pub content: String,

    #[serde(rename = "is_checked")]
    pub is_checked: Option<bool>,

    pub order: i64,
}

impl Record {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            kind: RecordType::Text,
            content: content.into(),
            is_checked: None,
            order: 0,
        }
    }

    pub fn checkbox(content: impl Into<String>, checked: bool) -> Self {
        Self {
            id: String::new(),
            kind: RecordType::Checkbox,
            content: content.into(),
            is_checked: Some(checked),
            order: 0,
        }
    }

    pub fn is_checkbox(&self) -> bool {
        self.kind == RecordType::Checkbox
    }

    /// Restore the checked/type pairing: checkboxes default to unchecked, text drops any value.
    pub fn normalized_checked(&self) -> Option<bool> {
        match self.kind {
            RecordType::Checkbox => Some(self.is_checked.unwrap_or(false)),
            RecordType::Text => None,
        }
    }
}

/// What the editor hands over on save: an owned copy, detached from any editing state.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct NoteSnapshot {
    /// Empty for a note that has never been saved.
    pub note_id: String,
    pub title: String,
    pub records: Vec<Record>,
}
