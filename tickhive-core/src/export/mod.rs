//! Historical candle export: windowed vendor pulls, pacing, CSV sinks.

pub mod exporter;
pub mod pacer;
pub mod sink;
pub mod window;

pub use exporter::{Exporter, ExportSummary};
pub use pacer::{FixedDelayPacer, Pacer};
pub use sink::{CsvSinkFactory, ExportError, MemorySinkFactory, RecordSink, SinkFactory};
pub use window::ExportWindow;
