// src/writer.rs
use std::collections::HashMap;

use crate::error::{ReconcileError, Result};
use crate::grid::Grid;
use crate::locator::{find_column_by_cell_value, find_row_by_cell_value, AttendanceLayout};
use crate::reconcile::ProcessingLog;
use crate::workbook::SpreadsheetIo;

/// One attendance cell to set: `shift` for `name` on `day`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceUpdate {
    pub name: String,
    pub day: u32,
    pub shift: String,
}

impl AttendanceUpdate {
    pub fn new(name: impl Into<String>, day: u32, shift: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            day,
            shift: shift.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Overwrite,
    IfEmpty,
}

/// Counts from one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub skipped_occupied: usize,
    pub skipped_unknown_employee: usize,
}

impl BatchSummary {
    pub fn modified(&self) -> bool {
        self.written > 0
    }
}

/// Applies one batch of updates to the attendance grid.
///
/// Row and column lookups are cached for the duration of the batch only.
struct BatchWriter<'a> {
    grid: &'a mut Grid,
    layout: AttendanceLayout,
    row_cache: HashMap<String, Option<usize>>,
    col_cache: HashMap<u32, Option<usize>>,
    summary: BatchSummary,
}

impl<'a> BatchWriter<'a> {
    fn new(grid: &'a mut Grid, layout: AttendanceLayout) -> Self {
        Self {
            grid,
            layout,
            row_cache: HashMap::new(),
            col_cache: HashMap::new(),
            summary: BatchSummary::default(),
        }
    }

    fn apply(&mut self, update: &AttendanceUpdate, mode: WriteMode, log: &mut ProcessingLog) -> Result<()> {
        let (grid, layout) = (&*self.grid, self.layout);
        let row = *self
            .row_cache
            .entry(update.name.clone())
            .or_insert_with(|| {
                find_row_by_cell_value(grid, layout.name_column, &update.name, layout.data_start_row())
            });
        let col = *self
            .col_cache
            .entry(update.day)
            .or_insert_with(|| find_column_by_cell_value(grid, layout.day_row, i64::from(update.day)));

        let Some(row) = row else {
            log.warn(format!(
                "Warning: employee '{}' not found in attendance sheet, update skipped.",
                update.name
            ));
            self.summary.skipped_unknown_employee += 1;
            return Ok(());
        };
        let col = col.ok_or(ReconcileError::ColumnNotFound { day: update.day })?;

        if mode == WriteMode::IfEmpty {
            if let Some(existing) = self.grid.cell(row, col).filter(|c| !c.is_blank()) {
                log.push(format!(
                    "    - [skip] {} day {}: cell already holds '{}', '{}' not written.",
                    update.name,
                    update.day,
                    existing.display_text().trim(),
                    update.shift
                ));
                self.summary.skipped_occupied += 1;
                return Ok(());
            }
        }

        self.grid.set_text(row, col, &update.shift);
        self.summary.written += 1;
        Ok(())
    }
}

/// Writes `standard` updates unconditionally, then `if_empty` updates only into blank cells,
/// and requests a single recalculation if anything changed.
///
/// An unknown employee is logged and skipped; a day missing from the sheet aborts the batch.
pub fn apply_updates(
    io: &dyn SpreadsheetIo,
    grid: &mut Grid,
    layout: AttendanceLayout,
    standard: &[AttendanceUpdate],
    if_empty: &[AttendanceUpdate],
    log: &mut ProcessingLog,
) -> Result<BatchSummary> {
    let mut writer = BatchWriter::new(grid, layout);
    for update in standard {
        writer.apply(update, WriteMode::Overwrite, log)?;
    }
    for update in if_empty {
        writer.apply(update, WriteMode::IfEmpty, log)?;
    }
    let summary = writer.summary;

    if summary.modified() {
        io.recalculate(grid);
    }
    Ok(summary)
}
