//! User-facing note actions.
//!
//! Adds the pieces the store leaves to its caller: the signed-in user, title
//! validation before anything is written, and [`Notice`]s describing outcomes.

pub mod notice;

use crate::auth::AuthSession;
use crate::docstore::DocumentStore;
use crate::error::{NoteError, Result};
use crate::models::{Note, NoteSnapshot, Record};
use crate::store::NoteStore;
use crate::util::is_blank;
use chrono::Utc;

pub use notice::{Action, Notice, NoticeLevel};

pub struct NoteService<D, A> {
    store: NoteStore<D>,
    session: A,
}

impl<D: DocumentStore, A: AuthSession> NoteService<D, A> {
    pub fn new(store: NoteStore<D>, session: A) -> Self {
        Self { store, session }
    }

    pub fn store(&self) -> &NoteStore<D> {
        &self.store
    }

    pub fn session(&self) -> &A {
        &self.session
    }

    fn user_id(&self) -> Result<String> {
        self.session
            .current_user_id()
            .ok_or(NoteError::Unauthenticated)
    }

    /// Persist a snapshot. New notes get their id from the store; the id is returned
    /// either way. A blank title is rejected before any remote call.
    pub async fn save_note(&self, snapshot: &NoteSnapshot) -> Result<String> {
        if is_blank(&snapshot.title) {
            return Err(NoteError::Validation("Title cannot be empty".to_string()));
        }
        let user_id = self.user_id()?;

        let note = Note {
            id: snapshot.note_id.clone(),
            title: snapshot.title.clone(),
            modified_at: Utc::now(),
            records: Vec::new(),
        };
        self.store
            .save_note(&user_id, &note, &snapshot.records)
            .await
    }

    /// The note with its records, in display order.
    pub async fn load_note(&self, note_id: &str) -> Result<Note> {
        let user_id = self.user_id()?;
        let (mut note, records) = self.store.get_note(&user_id, note_id).await?;
        note.records = records;
        Ok(note)
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<()> {
        let user_id = self.user_id()?;
        self.store.delete_note(&user_id, note_id).await
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let user_id = self.user_id()?;
        self.store.list_notes(&user_id).await
    }

    /// Overwrite a loaded record in place (its position is kept by the store).
    pub async fn update_record(&self, note_id: &str, record: &Record) -> Result<()> {
        if record.id.is_empty() {
            return Err(NoteError::Validation(
                "Record has not been saved yet".to_string(),
            ));
        }
        let user_id = self.user_id()?;
        self.store
            .update_record(&user_id, note_id, &record.id, record)
            .await
    }

    /// Tick or untick a checkbox record.
    pub async fn set_record_checked(&self, note_id: &str, record: &Record, checked: bool) -> Result<()> {
        if !record.is_checkbox() {
            return Err(NoteError::Validation(
                "Only checkbox records can be checked".to_string(),
            ));
        }
        let mut updated = record.clone();
        updated.is_checked = Some(checked);
        self.update_record(note_id, &updated).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuth;
    use crate::docstore::{MemoryDocumentStore, Op};
    use std::sync::Arc;

    type Service = NoteService<Arc<MemoryDocumentStore>, MemoryAuth>;

    fn service_for(user: Option<&str>) -> (Arc<MemoryDocumentStore>, Service) {
        let docs = Arc::new(MemoryDocumentStore::new());
        let auth = match user {
            Some(u) => MemoryAuth::signed_in(u),
            None => MemoryAuth::new(),
        };
        (docs.clone(), NoteService::new(NoteStore::new(docs), auth))
    }

    fn snapshot(title: &str, records: Vec<Record>) -> NoteSnapshot {
        NoteSnapshot {
            note_id: String::new(),
            title: title.to_string(),
            records,
        }
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected_without_remote_calls() {
        let (docs, svc) = service_for(Some("u1"));
        let err = svc
            .save_note(&snapshot("   ", vec![Record::text("x")]))
            .await
            .expect_err("blank title");
        assert!(matches!(err, NoteError::Validation(ref m) if m == "Title cannot be empty"));
        assert_eq!(docs.write_calls(), 0);
        assert_eq!(docs.calls(Op::List), 0);
    }

    #[tokio::test]
    async fn test_requires_signed_in_user() {
        let (docs, svc) = service_for(None);
        let err = svc
            .save_note(&snapshot("Title", vec![]))
            .await
            .expect_err("no user");
        assert!(matches!(err, NoteError::Unauthenticated));
        assert!(matches!(svc.list_notes().await, Err(NoteError::Unauthenticated)));
        assert_eq!(docs.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let (_, svc) = service_for(Some("u1"));
        let records = vec![
            Record::text("<i>intro</i>"),
            Record::checkbox("eggs", true),
            Record::text("outro"),
        ];
        let id = svc
            .save_note(&snapshot("Shopping", records.clone()))
            .await
            .expect("save");

        let note = svc.load_note(&id).await.expect("load");
        assert_eq!(note.id, id);
        assert_eq!(note.title, "Shopping");
        assert_eq!(note.records.len(), 3);
        for (i, (got, want)) in note.records.iter().zip(&records).enumerate() {
            assert_eq!(got.content, want.content);
            assert_eq!(got.kind, want.kind);
            assert_eq!(got.order, i as i64);
        }
        assert_eq!(note.records[1].is_checked, Some(false));
    }

    #[tokio::test]
    async fn test_second_save_reuses_id() {
        let (_, svc) = service_for(Some("u1"));
        let id = svc.save_note(&snapshot("v1", vec![])).await.expect("save");

        let mut again = snapshot("v2", vec![Record::text("added")]);
        again.note_id = id.clone();
        assert_eq!(svc.save_note(&again).await.expect("resave"), id);

        let listed = svc.list_notes().await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "v2");
    }

    #[tokio::test]
    async fn test_delete_then_load_is_not_found() {
        let (_, svc) = service_for(Some("u1"));
        let id = svc
            .save_note(&snapshot("bye", vec![Record::text("x")]))
            .await
            .expect("save");
        svc.delete_note(&id).await.expect("delete");

        let outcome = svc.load_note(&id).await;
        assert!(outcome.as_ref().is_err_and(NoteError::is_not_found));
        let notice = Notice::for_outcome(Action::LoadNote, &outcome).expect("error notice");
        assert_eq!(notice.level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_set_record_checked() {
        let (_, svc) = service_for(Some("u1"));
        let id = svc
            .save_note(&snapshot(
                "todo",
                vec![Record::text("header"), Record::checkbox("task", false)],
            ))
            .await
            .expect("save");
        let note = svc.load_note(&id).await.expect("load");

        let err = svc
            .set_record_checked(&id, &note.records[0], true)
            .await
            .expect_err("text record");
        assert!(matches!(err, NoteError::Validation(_)));

        svc.set_record_checked(&id, &note.records[1], true)
            .await
            .expect("check");
        let note = svc.load_note(&id).await.expect("reload");
        assert_eq!(note.records[1].is_checked, Some(true));
        assert_eq!(note.records[1].order, 1);
    }

    #[tokio::test]
    async fn test_update_unsaved_record_is_rejected() {
        let (docs, svc) = service_for(Some("u1"));
        let err = svc
            .update_record("n1", &Record::text("x"))
            .await
            .expect_err("no id");
        assert!(matches!(err, NoteError::Validation(_)));
        assert_eq!(docs.calls(Op::Get), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_notice() {
        let (docs, svc) = service_for(Some("u1"));
        docs.set_offline(true);
        let outcome = svc.save_note(&snapshot("t", vec![])).await;
        let notice = Notice::for_outcome(Action::SaveNote, &outcome).expect("notice");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.starts_with("Error saving note:"));
    }

    #[tokio::test]
    async fn test_users_do_not_see_each_others_notes() {
        let docs = Arc::new(MemoryDocumentStore::new());
        let alice = NoteService::new(NoteStore::new(docs.clone()), MemoryAuth::signed_in("alice"));
        let bob = NoteService::new(NoteStore::new(docs.clone()), MemoryAuth::signed_in("bob"));

        let id = alice.save_note(&snapshot("secret", vec![])).await.expect("save");
        assert!(bob.list_notes().await.expect("list").is_empty());
        assert!(bob.load_note(&id).await.is_err_and(|e| e.is_not_found()));
    }
}
