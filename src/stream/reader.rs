//! Stream reader
//!
//! Binds a resource definition to a client and an authenticator and drives
//! the pagination loop.

use super::types::{halt_on_error, HttpStream, PageRecords, RecordSource, RecordStream};
use crate::auth::AuthProvider;
use crate::error::Result;
use crate::http::{HttpClient, ResponseEnvelope};
use crate::types::{PageToken, RequestContext, StreamSlice, StreamState};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Client plus authenticator: everything needed to fetch one page
#[derive(Clone)]
pub struct Requester {
    client: HttpClient,
    authenticator: Arc<dyn AuthProvider>,
}

impl Requester {
    pub fn new(client: HttpClient, authenticator: Arc<dyn AuthProvider>) -> Self {
        Self {
            client,
            authenticator,
        }
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Build, authenticate and send one page request
    pub async fn fetch_page<S>(&self, resource: &S, ctx: RequestContext<'_>) -> Result<ResponseEnvelope>
    where
        S: HttpStream + ?Sized,
    {
        let spec = resource.request_spec(ctx)?;
        // Reject conflicting bodies before any network call, login included
        spec.body()?;
        let headers = resource.request_headers(ctx);
        let auth_header = self.authenticator.auth_header().await?;
        let request = self.client.prepare(&spec, &headers, &auth_header)?;
        self.client.send(&request, resource).await
    }
}

impl std::fmt::Debug for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

/// Pagination state for one fetch cycle
struct PageCursor {
    slice: Option<StreamSlice>,
    state: StreamState,
    next_page_token: Option<PageToken>,
    complete: bool,
    pages: usize,
}

impl PageCursor {
    fn new(slice: Option<StreamSlice>, state: StreamState) -> Self {
        Self {
            slice,
            state,
            next_page_token: None,
            complete: false,
            pages: 0,
        }
    }
}

/// Run a full pagination cycle as a lazy record stream.
///
/// A page is requested only once every record of the previous page has been
/// pulled, and the sequence ends after the first page without a token or
/// right after the first error.
pub fn read_pages<'a, S>(
    resource: &'a S,
    requester: &'a Requester,
    slice: Option<StreamSlice>,
    state: StreamState,
) -> RecordStream<'a>
where
    S: HttpStream + ?Sized,
{
    let records = stream::try_unfold(PageCursor::new(slice, state), move |cursor| {
        next_page(resource, requester, cursor)
    })
    .map_ok(stream::iter)
    .try_flatten()
    .boxed();
    halt_on_error(records)
}

async fn next_page<S>(
    resource: &S,
    requester: &Requester,
    mut cursor: PageCursor,
) -> Result<Option<(PageRecords, PageCursor)>>
where
    S: HttpStream + ?Sized,
{
    if cursor.complete {
        return Ok(None);
    }

    let ctx = RequestContext::new(
        &cursor.state,
        cursor.slice.as_ref(),
        cursor.next_page_token.as_ref(),
    );
    let response = requester.fetch_page(resource, ctx).await?;
    let records = resource.parse_response(&response, ctx)?;
    let next_page_token = resource
        .next_page_token(&response)
        .filter(|token| !token.is_empty());

    cursor.pages += 1;
    debug!(
        stream = resource.name(),
        page = cursor.pages,
        records = records.len(),
        has_next = next_page_token.is_some(),
        "Fetched page"
    );

    cursor.complete = next_page_token.is_none();
    cursor.next_page_token = next_page_token;
    Ok(Some((records, cursor)))
}

/// A top-level stream bound to its requester
#[derive(Debug)]
pub struct StreamReader<S> {
    resource: S,
    requester: Requester,
}

impl<S: HttpStream> StreamReader<S> {
    pub fn new(resource: S, requester: Requester) -> Self {
        Self {
            resource,
            requester,
        }
    }

    /// The resource definition
    pub fn resource(&self) -> &S {
        &self.resource
    }

    pub fn requester(&self) -> &Requester {
        &self.requester
    }

    /// Run one pagination cycle scoped to a slice
    pub fn read_slice(
        &self,
        slice: Option<StreamSlice>,
        state: Option<StreamState>,
    ) -> RecordStream<'_> {
        read_pages(
            &self.resource,
            &self.requester,
            slice,
            state.unwrap_or_default(),
        )
    }
}

impl<S: HttpStream> RecordSource for StreamReader<S> {
    fn name(&self) -> &str {
        self.resource.name()
    }

    fn read_records(&self, state: Option<StreamState>) -> RecordStream<'_> {
        info!(stream = self.resource.name(), "Reading stream");
        self.read_slice(None, state)
    }
}
