//! Stream module
//!
//! Paginated resource fetching with parent-child fan-out.
//!
//! # Overview
//!
//! - `HttpStream` - a resource definition: path, parameters, parsing, paging
//! - `StreamReader` - binds a resource to a `Requester` and runs the page loop
//! - `DependentStream` - one full page loop per record of a parent source
//!
//! Every read builds fresh iterator state, so two reads never share progress.

mod dependent;
mod reader;
mod types;

pub use dependent::{copy_parent_fields, parent_param, require_slice, DependentStream};
pub use reader::{read_pages, Requester, StreamReader};
pub use types::{
    halt_on_error, json_records, HttpStream, PageRecords, RecordSource, RecordStream,
};
