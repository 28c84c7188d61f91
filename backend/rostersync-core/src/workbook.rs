// src/workbook.rs
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::Result;
use crate::grid::{parse_cell, Grid};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Spreadsheet collaborator the reconciliation core reads and writes through.
pub trait SpreadsheetIo: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<Grid>;
    fn serialize(&self, grid: &Grid) -> Result<Vec<u8>>;
    /// Recomputes derived cells. Callers invoke this once per write batch.
    fn recalculate(&self, grid: &mut Grid);
}

/// Single-sheet CSV provider.
#[derive(Debug, Default)]
pub struct CsvWorkbook {
    recalculations: AtomicUsize,
}

impl CsvWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recalculation passes requested so far.
    pub fn recalculations(&self) -> usize {
        self.recalculations.load(Ordering::Relaxed)
    }
}

impl SpreadsheetIo for CsvWorkbook {
    fn load(&self, bytes: &[u8]) -> Result<Grid> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(parse_cell).collect::<Vec<_>>());
        }
        debug!("Loaded CSV grid with {} rows", rows.len());
        Ok(Grid::new(rows))
    }

    fn serialize(&self, grid: &Grid) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(Vec::new());
        for row in grid.rows() {
            if row.is_empty() {
                // csv refuses to write a zero-field record; a single empty field keeps the line.
                writer.write_record([""])?;
            } else {
                let fields: Vec<_> = row.iter().map(|c| c.source_text()).collect();
                writer.write_record(fields.iter().map(|f| f.as_bytes()))?;
            }
        }
        writer
            .into_inner()
            .map_err(|e| crate::error::ReconcileError::Io(e.into_error()))
    }

    fn recalculate(&self, _grid: &mut Grid) {
        // CSV has no formula cells.
        let pass = self.recalculations.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Recalculation pass {} (no formulas in CSV)", pass);
    }
}
