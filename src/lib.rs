//! Note-taking core: a small styled markup, per-user note storage on a
//! hierarchical document store, and the note actions built on top.
//!
//! ```no_run
//! # async fn demo() -> notekeeper::error::Result<()> {
//! use notekeeper::auth::MemoryAuth;
//! use notekeeper::docstore::MemoryDocumentStore;
//! use notekeeper::drafts::NoteDraft;
//! use notekeeper::service::NoteService;
//! use notekeeper::store::NoteStore;
//!
//! let service = NoteService::new(
//!     NoteStore::new(MemoryDocumentStore::new()),
//!     MemoryAuth::signed_in("u1"),
//! );
//!
//! let mut draft = NoteDraft::new();
//! draft.set_title("Groceries");
//! draft.set_input("eggs");
//! draft.add_record();
//!
//! let id = service.save_note(&draft.snapshot()).await?;
//! draft.mark_saved(&id);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod docstore;
pub mod drafts;
pub mod error;
pub mod markup;
pub mod models;
pub mod service;
pub mod store;
mod util;

pub use config::EnvConfig;
pub use error::{NoteError, Result};
pub use models::{Note, NoteSnapshot, Record, RecordType};
pub use service::NoteService;
pub use store::{NoteStore, SaveMode};
