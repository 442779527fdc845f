//! Notes and their records on top of a [`DocumentStore`].
//!
//! Layout: `users/{userId}/notes/{noteId}` holds `{title, modifiedAt}` and
//! `users/{userId}/notes/{noteId}/records/{recordId}` holds
//! `{content, type, is_checked, order}`. The backend returns collections unordered,
//! so every read that has an order restores it here.

mod codec;

use crate::docstore::{CollectionPath, DocPath, DocResult, DocumentStore, WriteBatch};
use crate::error::{NoteError, Result};
use crate::models::{Note, Record};
use chrono::Utc;
use codec::{note_fields, note_from_doc, record_fields, record_from_doc, saved_record_fields, ORDER};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

const USERS: &str = "users";
const NOTES: &str = "notes";
const RECORDS: &str = "records";

/// How `save_note` replaces a note's records.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SaveMode {
    /// Upsert the note, delete every record, insert the new ones, one awaited call at a
    /// time. An interrupted save leaves whatever steps already landed.
    #[default]
    Sequential,
    /// Same writes submitted as one batch; atomic on backends that support it.
    Batched,
}

pub struct NoteStore<D> {
    docs: D,
    mode: SaveMode,
}

fn check_id(what: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() || id.contains('/') {
        return Err(NoteError::Validation(format!("invalid {what} id: {id:?}")));
    }
    Ok(())
}

fn notes_collection(user_id: &str) -> Result<CollectionPath> {
    check_id("user", user_id)?;
    Ok(CollectionPath::root(USERS)?.doc(user_id)?.collection(NOTES)?)
}

fn note_path(user_id: &str, note_id: &str) -> Result<DocPath> {
    check_id("note", note_id)?;
    Ok(notes_collection(user_id)?.doc(note_id)?)
}

fn records_collection(note: &DocPath) -> Result<CollectionPath> {
    Ok(note.collection(RECORDS)?)
}

impl<D: DocumentStore> NoteStore<D> {
    pub fn new(docs: D) -> Self {
        Self {
            docs,
            mode: SaveMode::default(),
        }
    }

    pub fn with_save_mode(mut self, mode: SaveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn save_mode(&self) -> SaveMode {
        self.mode
    }

    pub fn documents(&self) -> &D {
        &self.docs
    }

    /// All of a user's notes, newest first. Equal timestamps keep the backend's order.
    pub async fn list_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let coll = notes_collection(user_id)?;
        let fetched_at = Utc::now();
        let docs = self.docs.list(&coll).await?;

        let mut notes = docs
            .iter()
            .map(|d| note_from_doc(d, fetched_at))
            .collect::<Vec<_>>();
        notes.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

        debug!(user_id, count = notes.len(), "listed notes");
        Ok(notes)
    }

    /// A note and its records sorted by `order`. The returned note's own `records` is empty.
    pub async fn get_note(&self, user_id: &str, note_id: &str) -> Result<(Note, Vec<Record>)> {
        let path = note_path(user_id, note_id)?;
        let Some(doc) = self.docs.get(&path).await? else {
            return Err(NoteError::NotFound(format!("note {note_id}")));
        };
        let note = note_from_doc(&doc, Utc::now());

        let mut records = self
            .docs
            .list(&records_collection(&path)?)
            .await?
            .iter()
            .map(record_from_doc)
            .collect::<Vec<_>>();
        records.sort_by_key(|r| r.order);

        debug!(user_id, note_id, records = records.len(), "loaded note");
        Ok((note, records))
    }

    /// Create or overwrite a note and replace all of its records.
    ///
    /// Returns the note id, freshly allocated when `note.id` is empty. Records are
    /// written with `order` equal to their position; checkbox records start unchecked.
    pub async fn save_note(&self, user_id: &str, note: &Note, records: &[Record]) -> Result<String> {
        let coll = notes_collection(user_id)?;
        let note_id = if note.id.is_empty() {
            self.docs.new_id(&coll)
        } else {
            check_id("note", &note.id)?;
            note.id.clone()
        };
        let path = coll.doc(&note_id)?;

        let res = match self.mode {
            SaveMode::Sequential => self.replace_sequential(&path, &note.title, records).await,
            SaveMode::Batched => self.replace_batched(&path, &note.title, records).await,
        };

        match res {
            Ok(()) => {
                info!(user_id, note_id = %note_id, records = records.len(), mode = %self.mode, "saved note");
                Ok(note_id)
            }
            Err(e) => {
                warn!(user_id, note_id = %note_id, error = %e, "save failed part-way");
                Err(e)
            }
        }
    }

    async fn replace_sequential(&self, path: &DocPath, title: &str, records: &[Record]) -> Result<()> {
        let records_coll = records_collection(path)?;

        self.docs.set(path, note_fields(title)).await?;

        let existing = self.docs.list(&records_coll).await?;
        for doc in &existing {
            self.docs.delete(&records_coll.doc(&doc.id)?).await?;
        }

        for (i, r) in records.iter().enumerate() {
            self.docs.add(&records_coll, saved_record_fields(r, i)).await?;
        }
        Ok(())
    }

    async fn replace_batched(&self, path: &DocPath, title: &str, records: &[Record]) -> Result<()> {
        let records_coll = records_collection(path)?;
        let existing = self.docs.list(&records_coll).await?;

        let mut batch = WriteBatch::new();
        batch.set(path.clone(), note_fields(title));
        for doc in &existing {
            batch.delete(records_coll.doc(&doc.id)?);
        }
        for (i, r) in records.iter().enumerate() {
            let id = self.docs.new_id(&records_coll);
            batch.set(records_coll.doc(&id)?, saved_record_fields(r, i));
        }

        self.docs.commit(batch).await?;
        Ok(())
    }

    /// Delete every record, then the note. If any record delete fails the note stays.
    pub async fn delete_note(&self, user_id: &str, note_id: &str) -> Result<()> {
        let path = note_path(user_id, note_id)?;
        let records_coll = records_collection(&path)?;

        let record_paths = self
            .docs
            .list(&records_coll)
            .await?
            .iter()
            .map(|d| records_coll.doc(&d.id))
            .collect::<DocResult<Vec<_>>>()?;

        let results = join_all(record_paths.iter().map(|p| self.docs.delete(p))).await;
        if let Some(first) = results.into_iter().find_map(|r| r.err()) {
            warn!(user_id, note_id, error = %first, "record delete failed; keeping note");
            return Err(first.into());
        }

        self.docs.delete(&path).await?;
        info!(user_id, note_id, records = record_paths.len(), "deleted note");
        Ok(())
    }

    /// Replace one record's content, type and checked state, keeping its stored `order`.
    pub async fn update_record(
        &self,
        user_id: &str,
        note_id: &str,
        record_id: &str,
        record: &Record,
    ) -> Result<()> {
        check_id("record", record_id)?;
        let path = note_path(user_id, note_id)?;
        let record_path = records_collection(&path)?.doc(record_id)?;

        let Some(existing) = self.docs.get(&record_path).await? else {
            return Err(NoteError::NotFound(format!("record {record_id}")));
        };
        let order = existing.get_i64(ORDER).unwrap_or(0);

        self.docs
            .set(
                &record_path,
                record_fields(record.kind, &record.content, record.normalized_checked(), order),
            )
            .await?;

        debug!(user_id, note_id, record_id, order, "updated record");
        Ok(())
    }
}
