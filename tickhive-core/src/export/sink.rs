//! Record sinks — append-only per (symbol, frequency) candle destinations.
//!
//! The CSV sink writes one flat row per candle, header first, with the
//! canonical timestamp plus the UTC / New York / Zurich renderings. The
//! renderings are presentation-only; nothing downstream orders by them.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::domain::candle::RENDERED_ZONES;
use crate::domain::{Candle, Frequency};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only destination for one (symbol, frequency) stream.
pub trait RecordSink {
    fn append(&mut self, candle: &Candle) -> Result<(), ExportError>;
    fn flush(&mut self) -> Result<(), ExportError>;
}

/// Opens one sink per (symbol, frequency) pair.
pub trait SinkFactory {
    fn open(&self, symbol: &str, frequency: Frequency) -> Result<Box<dyn RecordSink>, ExportError>;
}

// one ts_* column per entry in RENDERED_ZONES, in the same order
const CSV_HEADER: [&str; 11] = [
    "symbol",
    "frequency",
    "ts",
    "ts_utc",
    "ts_ny",
    "ts_zurich",
    "open",
    "high",
    "low",
    "close",
    "volume",
];

/// CSV file sink.
pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    fn create(path: &Path) -> Result<Self, ExportError> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer })
    }
}

impl RecordSink for CsvSink {
    fn append(&mut self, candle: &Candle) -> Result<(), ExportError> {
        let mut record = Vec::with_capacity(CSV_HEADER.len());
        record.push(candle.symbol.clone());
        record.push(candle.frequency.label().to_string());
        record.push(candle.ts.to_string());
        for tz in RENDERED_ZONES {
            record.push(candle.rendered(tz));
        }
        record.push(format!("{:.6}", candle.open));
        record.push(format!("{:.6}", candle.high));
        record.push(candle.low.map(|l| format!("{l:.6}")).unwrap_or_default());
        record.push(format!("{:.6}", candle.close));
        record.push(candle.volume.to_string());
        self.writer.write_record(&record)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ExportError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Factory writing `{symbol}_{frequency}.csv` files under one directory.
pub struct CsvSinkFactory {
    out_dir: PathBuf,
}

impl CsvSinkFactory {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    pub fn file_path(&self, symbol: &str, frequency: Frequency) -> PathBuf {
        self.out_dir.join(format!("{symbol}_{}.csv", frequency.label()))
    }
}

impl SinkFactory for CsvSinkFactory {
    fn open(&self, symbol: &str, frequency: Frequency) -> Result<Box<dyn RecordSink>, ExportError> {
        std::fs::create_dir_all(&self.out_dir)?;
        Ok(Box::new(CsvSink::create(&self.file_path(symbol, frequency))?))
    }
}

/// Shared store behind [`MemorySinkFactory`], keyed by (symbol, frequency).
pub type MemoryStore = Arc<Mutex<HashMap<(String, Frequency), Vec<Candle>>>>;

/// In-memory sink factory for tests and dry runs.
#[derive(Default)]
pub struct MemorySinkFactory {
    store: MemoryStore,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> MemoryStore {
        Arc::clone(&self.store)
    }
}

struct MemorySink {
    key: (String, Frequency),
    store: MemoryStore,
}

impl RecordSink for MemorySink {
    fn append(&mut self, candle: &Candle) -> Result<(), ExportError> {
        self.store
            .lock()
            .unwrap()
            .entry(self.key.clone())
            .or_default()
            .push(candle.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

impl SinkFactory for MemorySinkFactory {
    fn open(&self, symbol: &str, frequency: Frequency) -> Result<Box<dyn RecordSink>, ExportError> {
        Ok(Box::new(MemorySink {
            key: (symbol.to_string(), frequency),
            store: Arc::clone(&self.store),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candle(ts: i64) -> Candle {
        Candle {
            symbol: "SPY".into(),
            frequency: Frequency::Daily,
            ts,
            open: 100.0,
            high: 105.0,
            low: None,
            close: 103.0,
            volume: 50_000,
        }
    }

    #[test]
    fn csv_sink_writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let factory = CsvSinkFactory::new(dir.path());
        let mut sink = factory.open("SPY", Frequency::Daily).unwrap();
        sink.append(&sample_candle(1_577_977_200)).unwrap();
        sink.flush().unwrap();

        let contents =
            std::fs::read_to_string(factory.file_path("SPY", Frequency::Daily)).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "symbol,frequency,ts,ts_utc,ts_ny,ts_zurich,open,high,low,close,volume"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("SPY,daily,1577977200,2020-01-02 15:00:00,2020-01-02 10:00:00"));
        // absent low stays an empty field, not zero
        assert!(row.contains(",105.000000,,103.000000,"));
    }

    #[test]
    fn rendered_columns_track_the_domain_zone_list() {
        assert_eq!(CSV_HEADER.len(), 8 + RENDERED_ZONES.len());

        let dir = tempfile::tempdir().unwrap();
        let factory = CsvSinkFactory::new(dir.path());
        let mut sink = factory.open("SPY", Frequency::Daily).unwrap();
        let candle = sample_candle(1_577_977_200);
        sink.append(&candle).unwrap();
        sink.flush().unwrap();

        let contents =
            std::fs::read_to_string(factory.file_path("SPY", Frequency::Daily)).unwrap();
        let row = contents.lines().nth(1).unwrap();
        let fields: Vec<&str> = row.split(',').collect();
        for (i, tz) in RENDERED_ZONES.into_iter().enumerate() {
            assert_eq!(fields[3 + i], candle.rendered(tz));
        }
    }

    #[test]
    fn memory_sink_collects_per_pair() {
        let factory = MemorySinkFactory::new();
        let mut sink = factory.open("SPY", Frequency::Daily).unwrap();
        sink.append(&sample_candle(1)).unwrap();
        sink.append(&sample_candle(2)).unwrap();
        let store = factory.store();
        let store = store.lock().unwrap();
        assert_eq!(store[&("SPY".to_string(), Frequency::Daily)].len(), 2);
    }
}
