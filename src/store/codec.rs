//! Field-level mapping between note/record documents and the models.

use crate::docstore::{Document, FieldValue, Fields};
use crate::models::{Note, Record, RecordType, UNTITLED};
use chrono::{DateTime, Utc};
use std::str::FromStr;

pub(crate) const TITLE: &str = "title";
pub(crate) const MODIFIED_AT: &str = "modifiedAt";
pub(crate) const CONTENT: &str = "content";
pub(crate) const TYPE: &str = "type";
pub(crate) const IS_CHECKED: &str = "is_checked";
pub(crate) const ORDER: &str = "order";

pub(crate) fn note_fields(title: &str) -> Fields {
    let mut f = Fields::new();
    f.insert(TITLE.to_string(), title.into());
    f.insert(MODIFIED_AT.to_string(), FieldValue::ServerTimestamp);
    f
}

pub(crate) fn record_fields(
    kind: RecordType,
    content: &str,
    is_checked: Option<bool>,
    order: i64,
) -> Fields {
    let mut f = Fields::new();
    f.insert(CONTENT.to_string(), content.into());
    f.insert(TYPE.to_string(), kind.as_ref().into());
    f.insert(IS_CHECKED.to_string(), is_checked.into());
    f.insert(ORDER.to_string(), order.into());
    f
}

/// Fields for a record written by a full save: position becomes `order` and
/// checkboxes start unchecked whatever the caller had.
pub(crate) fn saved_record_fields(record: &Record, position: usize) -> Fields {
    let is_checked = match record.kind {
        RecordType::Checkbox => Some(false),
        RecordType::Text => None,
    };
    record_fields(record.kind, &record.content, is_checked, position as i64)
}

/// Missing title reads as [`UNTITLED`], missing timestamp as `fetched_at`.
pub(crate) fn note_from_doc(doc: &Document, fetched_at: DateTime<Utc>) -> Note {
    let modified_at = doc.get_timestamp(MODIFIED_AT).unwrap_or_else(|| {
        tracing::warn!(note_id = %doc.id, "note has no modifiedAt; using fetch time");
        fetched_at
    });

    Note {
        id: doc.id.clone(),
        title: doc.get_str(TITLE).unwrap_or(UNTITLED).to_string(),
        modified_at,
        records: Vec::new(),
    }
}

pub(crate) fn record_from_doc(doc: &Document) -> Record {
    let kind = match doc.get_str(TYPE) {
        None => RecordType::Text,
        Some(s) => RecordType::from_str(s).unwrap_or_else(|_| {
            tracing::warn!(record_id = %doc.id, kind = s, "unknown record type; reading as text");
            RecordType::Text
        }),
    };

    let is_checked = match kind {
        RecordType::Checkbox => Some(doc.get_bool(IS_CHECKED).unwrap_or(false)),
        RecordType::Text => None,
    };

    Record {
        id: doc.id.clone(),
        kind,
        content: doc.get_str(CONTENT).unwrap_or_default().to_string(),
        is_checked,
        order: doc.get_i64(ORDER).unwrap_or(0),
    }
}
