use super::{
    CollectionPath, DocPath, DocResult, DocStoreError, Document, DocumentStore, Fields, Op, Write,
    WriteBatch,
};
use crate::auth::SessionToken;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct FieldsBody {
    pub fields: Fields,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct AddResponse {
    pub id: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) enum WireWrite {
    Set { path: String, fields: Fields },
    Delete { path: String },
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct CommitRequest {
    pub writes: Vec<WireWrite>,
}

impl From<WriteBatch> for CommitRequest {
    fn from(batch: WriteBatch) -> Self {
        let writes = batch
            .writes
            .into_iter()
            .map(|w| match w {
                Write::Set { path, fields } => WireWrite::Set {
                    path: path.to_string(),
                    fields,
                },
                Write::Delete { path } => WireWrite::Delete {
                    path: path.to_string(),
                },
            })
            .collect();
        Self { writes }
    }
}

/// Document store backed by the notes REST API.
///
/// Every request carries the bearer token from the shared [`SessionToken`].
#[derive(Clone)]
pub struct HttpDocumentStore {
    base_url: String,
    client: reqwest::Client,
    token: SessionToken,
}

fn encode_segments(segments: &[String]) -> String {
    segments
        .iter()
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl HttpDocumentStore {
    pub fn new(base_url: impl Into<String>, token: SessionToken) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            token,
        }
    }

    pub(crate) fn doc_url(&self, path: &DocPath) -> String {
        format!("{}/v1/documents/{}", self.base_url, encode_segments(path.segments()))
    }

    pub(crate) fn collection_url(&self, path: &CollectionPath) -> String {
        format!("{}/v1/documents/{}", self.base_url, encode_segments(path.segments()))
    }

    pub(crate) fn commit_url(&self) -> String {
        format!("{}/v1/documents:commit", self.base_url)
    }

    fn with_auth_headers(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(header) = self.token.auth_header() {
            req = req.header("Authorization", header);
        }
        req
    }

    /// Send and classify the response. `Ok(None)` means the target does not exist
    /// and `op` treats that as a normal outcome.
    async fn request(
        &self,
        req: reqwest::RequestBuilder,
        op: Op,
    ) -> DocResult<Option<reqwest::Response>> {
        let res = self
            .with_auth_headers(req)
            .send()
            .await
            .map_err(DocStoreError::network)?;

        match map_status(res.status(), op)? {
            Outcome::Success => Ok(Some(res)),
            Outcome::Missing => Ok(None),
            Outcome::Failed => {
                let status = res.status();
                let body = res.text().await.unwrap_or_default();
                Err(DocStoreError::http(status, body, &format!("{op:?} failed")))
            }
        }
    }
}

/// How a response status resolves for an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Outcome {
    Success,
    /// 404 where the operation reads it as "nothing there".
    Missing,
    /// Any other non-2xx; the caller reads the body for the error.
    Failed,
}

pub(crate) fn map_status(status: reqwest::StatusCode, op: Op) -> DocResult<Outcome> {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(DocStoreError::unauthorized());
    }
    if status.is_success() {
        return Ok(Outcome::Success);
    }
    match (status, op) {
        (reqwest::StatusCode::NOT_FOUND, Op::Get | Op::List | Op::Delete) => Ok(Outcome::Missing),
        _ => Ok(Outcome::Failed),
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get(&self, path: &DocPath) -> DocResult<Option<Document>> {
        let Some(res) = self.request(self.client.get(self.doc_url(path)), Op::Get).await? else {
            return Ok(None);
        };
        let doc: Document = res.json().await.map_err(DocStoreError::parse)?;
        Ok(Some(doc))
    }

    async fn list(&self, collection: &CollectionPath) -> DocResult<Vec<Document>> {
        // An empty collection may not exist server-side yet.
        let Some(res) = self
            .request(self.client.get(self.collection_url(collection)), Op::List)
            .await?
        else {
            return Ok(vec![]);
        };
        let body: ListResponse = res.json().await.map_err(DocStoreError::parse)?;
        Ok(body.documents)
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> DocResult<()> {
        self.request(
            self.client.put(self.doc_url(path)).json(&FieldsBody { fields }),
            Op::Set,
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> DocResult<()> {
        self.request(self.client.delete(self.doc_url(path)), Op::Delete)
            .await?;
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, fields: Fields) -> DocResult<String> {
        let req = self
            .client
            .post(self.collection_url(collection))
            .json(&FieldsBody { fields });
        let Some(res) = self.request(req, Op::Add).await? else {
            return Err(DocStoreError::parse("add returned no document"));
        };
        let body: AddResponse = res.json().await.map_err(DocStoreError::parse)?;
        if body.id.trim().is_empty() {
            return Err(DocStoreError::parse("add succeeded but response is missing id"));
        }
        Ok(body.id)
    }

    async fn commit(&self, batch: WriteBatch) -> DocResult<()> {
        let body = CommitRequest::from(batch);
        self.request(self.client.post(self.commit_url()).json(&body), Op::Commit)
            .await?;
        Ok(())
    }
}
