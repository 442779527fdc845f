//! Hierarchical document storage.
//!
//! Documents live at even-length paths (`users/u1/notes/n1`), collections at odd-length
//! ones (`users/u1/notes`). Each document is a flat map of named primitive fields.
//! Queries come back unordered; callers sort.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;

/// Store operations, for status mapping, fault injection and call accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    Get,
    List,
    Set,
    Delete,
    Add,
    Commit,
}

impl Op {
    pub(crate) fn is_write(self) -> bool {
        !matches!(self, Op::Get | Op::List)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocStoreErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
    /// Backend refused or failed the operation (quota, permission, injected fault).
    Unavailable,
    InvalidPath,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct DocStoreError {
    pub kind: DocStoreErrorKind,
    pub message: String,
}

impl DocStoreError {
    pub fn new(kind: DocStoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn network(e: reqwest::Error) -> Self {
        Self::new(DocStoreErrorKind::Network, e.to_string())
    }

    pub(crate) fn parse(e: impl fmt::Display) -> Self {
        Self::new(DocStoreErrorKind::Parse, e.to_string())
    }

    pub(crate) fn unauthorized() -> Self {
        Self::new(DocStoreErrorKind::Unauthorized, "Unauthorized")
    }

    pub(crate) fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self::new(DocStoreErrorKind::Http, format!("{ctx} ({status}): {body}"))
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::new(DocStoreErrorKind::Unavailable, message)
    }

    fn invalid_path(segment: &str) -> Self {
        Self::new(
            DocStoreErrorKind::InvalidPath,
            format!("invalid path segment: {segment:?}"),
        )
    }
}

pub type DocResult<T> = Result<T, DocStoreError>;

fn check_segment(segment: &str) -> DocResult<String> {
    if segment.is_empty() || segment.contains('/') {
        return Err(DocStoreError::invalid_path(segment));
    }
    Ok(segment.to_string())
}

fn join_segments(segments: &[String], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, s) in segments.iter().enumerate() {
        if i > 0 {
            f.write_str("/")?;
        }
        f.write_str(s)?;
    }
    Ok(())
}

/// Path of a collection: an odd number of segments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(Vec<String>);

/// Path of a document: an even, non-zero number of segments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath(Vec<String>);

impl CollectionPath {
    pub fn root(name: &str) -> DocResult<Self> {
        Ok(Self(vec![check_segment(name)?]))
    }

    pub fn doc(&self, id: &str) -> DocResult<DocPath> {
        let mut segs = self.0.clone();
        segs.push(check_segment(id)?);
        Ok(DocPath(segs))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl DocPath {
    pub fn collection(&self, name: &str) -> DocResult<CollectionPath> {
        let mut segs = self.0.clone();
        segs.push(check_segment(name)?);
        Ok(CollectionPath(segs))
    }

    pub fn id(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath(self.0[..self.0.len().saturating_sub(1)].to_vec())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_segments(&self.0, f)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_segments(&self.0, f)
    }
}

/// A primitive field value.
///
/// `ServerTimestamp` is a write-only sentinel: the store replaces it with its own
/// clock when the write lands, so reads only ever see `Timestamp`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    Timestamp(DateTime<Utc>),
    ServerTimestamp,
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<Option<bool>> for FieldValue {
    fn from(v: Option<bool>) -> Self {
        v.map(Self::Bool).unwrap_or(Self::Null)
    }
}

pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Fields,
}

impl Document {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.fields.get(key) {
            Some(FieldValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(FieldValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn get_timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(key) {
            Some(FieldValue::Timestamp(t)) => Some(*t),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Write {
    Set { path: DocPath, fields: Fields },
    Delete { path: DocPath },
}

/// Writes meant to land together. Backends that can commit atomically do so.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteBatch {
    pub writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocPath, fields: Fields) -> &mut Self {
        self.writes.push(Write::Set { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.writes.push(Write::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Random document id, in the same alphabet for every backend.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when the document does not exist.
    async fn get(&self, path: &DocPath) -> DocResult<Option<Document>>;

    /// All documents directly under `collection`, in no particular order.
    async fn list(&self, collection: &CollectionPath) -> DocResult<Vec<Document>>;

    /// Create or fully replace a document.
    async fn set(&self, path: &DocPath, fields: Fields) -> DocResult<()>;

    /// Remove a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocPath) -> DocResult<()>;

    /// Create a document under a generated id and return that id.
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> DocResult<String>;

    /// Allocate an id without writing anything.
    fn new_id(&self, _collection: &CollectionPath) -> String {
        generate_id()
    }

    /// Apply a batch. The default applies writes one by one and stops at the first failure.
    async fn commit(&self, batch: WriteBatch) -> DocResult<()> {
        for w in batch.writes {
            match w {
                Write::Set { path, fields } => self.set(&path, fields).await?,
                Write::Delete { path } => self.delete(&path).await?,
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn get(&self, path: &DocPath) -> DocResult<Option<Document>> {
        (**self).get(path).await
    }

    async fn list(&self, collection: &CollectionPath) -> DocResult<Vec<Document>> {
        (**self).list(collection).await
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> DocResult<()> {
        (**self).set(path, fields).await
    }

    async fn delete(&self, path: &DocPath) -> DocResult<()> {
        (**self).delete(path).await
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> DocResult<String> {
        (**self).add(collection, fields).await
    }

    fn new_id(&self, collection: &CollectionPath) -> String {
        (**self).new_id(collection)
    }

    async fn commit(&self, batch: WriteBatch) -> DocResult<()> {
        (**self).commit(batch).await
    }
}
