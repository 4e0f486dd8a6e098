//! Stream types and traits
//!
//! Defines the resource-definition trait implemented by concrete streams and
//! the record-source abstraction shared by top-level and dependent streams.

use crate::error::{Error, Result};
use crate::http::{FormBody, RequestSpec, ResponseClassifier, ResponseEnvelope};
use crate::types::{JsonValue, Method, PageToken, Record, RequestContext, StreamState, StringMap};
use futures::future;
use futures::stream::{BoxStream, StreamExt};

/// Lazy, finite sequence of records. Dropping it stops all further requests.
pub type RecordStream<'a> = BoxStream<'a, Result<Record>>;

/// Records of one page in response order. Records before a failed element
/// are still yielded; the read ends at the failure.
pub type PageRecords = Vec<Result<Record>>;

/// A paginated HTTP resource.
///
/// Only `name`, `path` and `parse_response` are required. Retry behaviour is
/// customised through the [`ResponseClassifier`] supertrait.
pub trait HttpStream: ResponseClassifier {
    /// Stream name, used in logs and errors
    fn name(&self) -> &str;

    fn http_method(&self) -> Method {
        Method::GET
    }

    /// Path relative to the client's base URL
    fn path(&self, ctx: RequestContext<'_>) -> String;

    fn request_params(&self, _ctx: RequestContext<'_>) -> Result<StringMap> {
        Ok(StringMap::new())
    }

    /// Non-auth headers. Auth headers overwrite any overlap.
    fn request_headers(&self, _ctx: RequestContext<'_>) -> StringMap {
        StringMap::new()
    }

    /// JSON payload. Mutually exclusive with `request_body_data`.
    fn request_body_json(&self, _ctx: RequestContext<'_>) -> Option<JsonValue> {
        None
    }

    /// Form or raw payload. Mutually exclusive with `request_body_json`.
    fn request_body_data(&self, _ctx: RequestContext<'_>) -> Option<FormBody> {
        None
    }

    /// Continuation for the next page. `None` or an empty token ends pagination.
    fn next_page_token(&self, _response: &ResponseEnvelope) -> Option<PageToken> {
        None
    }

    /// Turn one page into records. An outer error fails the whole page.
    fn parse_response(
        &self,
        response: &ResponseEnvelope,
        ctx: RequestContext<'_>,
    ) -> Result<PageRecords>;

    /// Assemble the per-call request parameters
    fn request_spec(&self, ctx: RequestContext<'_>) -> Result<RequestSpec> {
        Ok(RequestSpec {
            method: self.http_method(),
            path: self.path(ctx),
            query: self.request_params(ctx)?,
            json: self.request_body_json(ctx),
            form: self.request_body_data(ctx),
        })
    }
}

/// Anything that can produce a fresh record sequence on demand
pub trait RecordSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Start a new, independent read
    fn read_records(&self, state: Option<StreamState>) -> RecordStream<'_>;
}

/// Split a JSON array body into records, one result per element
pub fn json_records(value: JsonValue) -> Result<PageRecords> {
    match value {
        JsonValue::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                JsonValue::Object(record) => Ok(record),
                other => Err(Error::malformed(format!(
                    "Expected a JSON object record, got: {other}"
                ))),
            })
            .collect()),
        other => Err(Error::malformed(format!(
            "Expected a JSON array of records, got: {other}"
        ))),
    }
}

/// End a record stream right after its first error
pub fn halt_on_error<'a>(records: RecordStream<'a>) -> RecordStream<'a> {
    records
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}
