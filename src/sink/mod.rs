//! Output sinks: an event stream for flattened records and a table for
//! daily summaries

pub mod event;
pub mod table;

pub use event::{EventPublisher, FilePublisher, HttpPublisher, StdoutPublisher};
pub use table::{CsvTableSink, TableSink};
