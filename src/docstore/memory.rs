use super::{
    generate_id, CollectionPath, DocPath, DocResult, DocStoreError, DocStoreErrorKind, Document,
    DocumentStore, FieldValue, Fields, Op, Write, WriteBatch,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone, Copy, Debug, Default)]
struct Fault {
    /// Calls that still go through before failures start.
    pass: usize,
    /// Calls that fail once `pass` is used up.
    fail: usize,
}

#[derive(Default)]
struct Inner {
    docs: BTreeMap<DocPath, Fields>,
    last_server_time: Option<DateTime<Utc>>,
    offline: bool,
    faults: HashMap<Op, Fault>,
    calls: HashMap<Op, usize>,
    writes_applied: usize,
}

impl Inner {
    fn admit(&mut self, op: Op) -> DocResult<()> {
        *self.calls.entry(op).or_default() += 1;

        if self.offline {
            return Err(DocStoreError::new(
                DocStoreErrorKind::Network,
                "document store unreachable",
            ));
        }

        if let Some(f) = self.faults.get_mut(&op) {
            if f.pass > 0 {
                f.pass -= 1;
            } else if f.fail > 0 {
                f.fail -= 1;
                return Err(DocStoreError::unavailable(format!("injected {op:?} failure")));
            }
        }
        Ok(())
    }

    /// Strictly increasing server clock so back-to-back writes stay ordered.
    fn server_now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_server_time {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_server_time = Some(now);
        now
    }

    fn resolve(&mut self, mut fields: Fields) -> Fields {
        if fields.values().any(|v| *v == FieldValue::ServerTimestamp) {
            let now = self.server_now();
            for v in fields.values_mut() {
                if *v == FieldValue::ServerTimestamp {
                    *v = FieldValue::Timestamp(now);
                }
            }
        }
        fields
    }

    fn put(&mut self, path: DocPath, fields: Fields) {
        let fields = self.resolve(fields);
        self.docs.insert(path, fields);
        self.writes_applied += 1;
    }

    fn remove(&mut self, path: &DocPath) {
        self.docs.remove(path);
        self.writes_applied += 1;
    }
}

/// In-process document store.
///
/// Behaves like the remote backend as far as callers can tell: server timestamps,
/// generated ids, unordered listings. Faults can be injected per operation to
/// exercise partial-failure paths.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: Mutex<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// While offline every call fails with a network error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Fail the next `count` calls of `op`.
    pub fn fail_next(&self, op: Op, count: usize) {
        self.fail_after(op, 0, count);
    }

    /// Let `pass` calls of `op` succeed, then fail the following `count`.
    pub fn fail_after(&self, op: Op, pass: usize, count: usize) {
        self.lock().faults.insert(op, Fault { pass, fail: count });
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Number of calls made for `op`, failed ones included.
    pub fn calls(&self, op: Op) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Number of document writes that actually landed.
    pub fn writes_applied(&self) -> usize {
        self.lock().writes_applied
    }

    pub fn write_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(op, _)| op.is_write())
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn contains(&self, path: &DocPath) -> bool {
        self.lock().docs.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.lock().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().docs.is_empty()
    }
}

fn children<'a>(
    docs: &'a BTreeMap<DocPath, Fields>,
    collection: &'a CollectionPath,
) -> impl Iterator<Item = (&'a DocPath, &'a Fields)> + 'a {
    docs.iter().filter(move |(p, _)| {
        let segs = p.segments();
        segs.len() == collection.segments().len() + 1 && segs.starts_with(collection.segments())
    })
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> DocResult<Option<Document>> {
        let mut inner = self.lock();
        inner.admit(Op::Get)?;
        Ok(inner.docs.get(path).map(|fields| Document {
            id: path.id().to_string(),
            fields: fields.clone(),
        }))
    }

    async fn list(&self, collection: &CollectionPath) -> DocResult<Vec<Document>> {
        let mut inner = self.lock();
        inner.admit(Op::List)?;
        Ok(children(&inner.docs, collection)
            .map(|(p, fields)| Document {
                id: p.id().to_string(),
                fields: fields.clone(),
            })
            .collect())
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> DocResult<()> {
        let mut inner = self.lock();
        inner.admit(Op::Set)?;
        inner.put(path.clone(), fields);
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> DocResult<()> {
        let mut inner = self.lock();
        inner.admit(Op::Delete)?;
        inner.remove(path);
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> DocResult<String> {
        let mut inner = self.lock();
        inner.admit(Op::Add)?;
        let id = generate_id();
        let path = collection.doc(&id)?;
        inner.put(path, fields);
        Ok(id)
    }

    /// All-or-nothing: a rejected batch leaves no trace.
    async fn commit(&self, batch: WriteBatch) -> DocResult<()> {
        let mut inner = self.lock();
        inner.admit(Op::Commit)?;
        // One server time for the whole batch.
        let now = inner.server_now();
        for w in batch.writes {
            match w {
                Write::Set { path, mut fields } => {
                    for v in fields.values_mut() {
                        if *v == FieldValue::ServerTimestamp {
                            *v = FieldValue::Timestamp(now);
                        }
                    }
                    inner.put(path, fields);
                }
                Write::Delete { path } => inner.remove(&path),
            }
        }
        Ok(())
    }
}
