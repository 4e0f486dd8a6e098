//! Parent-child fan-out
//!
//! A dependent stream runs one full, independent pagination cycle per record
//! of its parent, in parent order.

use super::reader::StreamReader;
use super::types::{halt_on_error, HttpStream, RecordSource, RecordStream};
use crate::error::{Error, Result};
use crate::types::{json_to_param, Record, RequestContext, StreamSlice, StreamState};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use tracing::debug;

/// A stream whose requests are derived from each record of a parent source
#[derive(Debug)]
pub struct DependentStream<P, S> {
    parent: P,
    child: StreamReader<S>,
}

impl<P, S> DependentStream<P, S>
where
    P: RecordSource,
    S: HttpStream,
{
    pub fn new(parent: P, child: StreamReader<S>) -> Self {
        Self { parent, child }
    }

    pub fn parent(&self) -> &P {
        &self.parent
    }

    pub fn child(&self) -> &StreamReader<S> {
        &self.child
    }

    /// One slice per parent record, pulled lazily from a fresh parent read
    pub fn stream_slices(&self) -> BoxStream<'_, Result<StreamSlice>> {
        self.parent
            .read_records(None)
            .map_ok(StreamSlice::from_parent)
            .boxed()
    }
}

impl<P, S> RecordSource for DependentStream<P, S>
where
    P: RecordSource,
    S: HttpStream,
{
    fn name(&self) -> &str {
        self.child.resource().name()
    }

    fn read_records(&self, state: Option<StreamState>) -> RecordStream<'_> {
        let child = &self.child;
        let records = self
            .stream_slices()
            .map_ok(move |slice| {
                debug!(
                    stream = child.resource().name(),
                    parent = self.parent.name(),
                    "Reading slice"
                );
                child.read_slice(Some(slice), state.clone())
            })
            .try_flatten()
            .boxed();
        halt_on_error(records)
    }
}

/// The slice of a dependent request, or an error naming the stream
pub fn require_slice<'a>(stream: &str, ctx: RequestContext<'a>) -> Result<&'a StreamSlice> {
    ctx.slice
        .ok_or_else(|| Error::slice(stream, "request requires a parent slice"))
}

/// A scalar parent field rendered as a query parameter value
pub fn parent_param(stream: &str, slice: &StreamSlice, field: &str) -> Result<String> {
    slice
        .parent_field(field)
        .and_then(json_to_param)
        .ok_or_else(|| Error::slice(stream, format!("parent record has no usable '{field}'")))
}

/// Copy the named parent fields into a child record
pub fn copy_parent_fields(
    stream: &str,
    slice: &StreamSlice,
    fields: &[&str],
    record: &mut Record,
) -> Result<()> {
    for field in fields {
        let value = slice
            .parent_field(field)
            .ok_or_else(|| Error::slice(stream, format!("parent record has no '{field}'")))?;
        record.insert((*field).to_string(), value.clone());
    }
    Ok(())
}
