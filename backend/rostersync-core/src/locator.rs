// src/locator.rs
use std::ops::RangeInclusive;

use crate::config::SheetHeaders;
use crate::error::{ReconcileError, Result};
use crate::grid::Grid;

/// Rows scanned for header text.
pub const HEADER_SEARCH_ROWS: RangeInclusive<usize> = 0..=5;

/// Footer markers that end the employee list.
const NAME_LIST_TERMINATORS: [&str; 2] = ["备注", "说明"];

// --- Grid lookups ---
// Text comparisons trim the cell but not the needle; callers pass header text
// with its exact internal spacing.

/// First row in `rows` holding a text cell equal to `text`.
pub fn find_row_containing(grid: &Grid, text: &str, rows: RangeInclusive<usize>) -> Option<usize> {
    rows.take_while(|&i| i < grid.row_count()).find(|&i| {
        grid.row(i)
            .map_or(false, |row| row.iter().any(|c| c.trimmed_str() == Some(text)))
    })
}

/// Column of the text cell equal to `text` in `header_row`.
pub fn find_column(grid: &Grid, header_row: usize, text: &str) -> Option<usize> {
    grid.row(header_row)?
        .iter()
        .position(|c| c.trimmed_str() == Some(text))
}

/// First row in `rows` holding a numeric cell equal to `value`.
pub fn find_row_containing_number(
    grid: &Grid,
    value: i64,
    rows: RangeInclusive<usize>,
) -> Option<usize> {
    rows.take_while(|&i| i < grid.row_count()).find(|&i| {
        grid.row(i)
            .map_or(false, |row| row.iter().any(|c| c.as_int() == Some(value)))
    })
}

/// Scans down `column` from `start_row` for a text cell equal to `value`.
pub fn find_row_by_cell_value(grid: &Grid, column: usize, value: &str, start_row: usize) -> Option<usize> {
    (start_row..grid.row_count())
        .find(|&i| grid.cell(i, column).and_then(|c| c.trimmed_str()) == Some(value))
}

/// Scans across `row` for a numeric cell equal to `value`.
pub fn find_column_by_cell_value(grid: &Grid, row: usize, value: i64) -> Option<usize> {
    grid.row(row)?.iter().position(|c| c.as_int() == Some(value))
}

// --- Attendance sheet structure ---

/// Structural anchors of an attendance sheet, located once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceLayout {
    pub employee_header_row: usize,
    pub date_header_row: usize,
    pub name_column: usize,
    pub day_row: usize,
}

impl AttendanceLayout {
    pub fn locate(grid: &Grid, headers: &SheetHeaders) -> Result<Self> {
        let employee_header_row =
            find_row_containing(grid, &headers.name_header, HEADER_SEARCH_ROWS).ok_or_else(|| {
                ReconcileError::StructureNotFound(format!(
                    "employee header row (containing '{}')",
                    headers.name_header
                ))
            })?;

        let date_header_row =
            find_row_containing(grid, &headers.date_header, HEADER_SEARCH_ROWS).ok_or_else(|| {
                ReconcileError::StructureNotFound(format!(
                    "date header row (containing '{}')",
                    headers.date_header
                ))
            })?;

        let name_column = find_column(grid, employee_header_row, &headers.name_header)
            .ok_or_else(|| {
                ReconcileError::StructureNotFound(format!("'{}' column", headers.name_header))
            })?;

        let day_row = find_row_containing_number(
            grid,
            1,
            date_header_row + 1..=date_header_row + 3,
        )
        .ok_or_else(|| {
            ReconcileError::StructureNotFound(format!(
                "day-number row containing 1 below '{}'",
                headers.date_header
            ))
        })?;

        Ok(Self {
            employee_header_row,
            date_header_row,
            name_column,
            day_row,
        })
    }

    /// First row the writer searches for employee names; the header spans two rows.
    pub fn data_start_row(&self) -> usize {
        self.employee_header_row + 2
    }

    /// Last day of the month: the rightmost numeric cell of the day row.
    pub fn month_length(&self, grid: &Grid) -> Result<u32> {
        grid.row(self.day_row)
            .and_then(|row| row.iter().rev().find_map(|c| c.as_int()))
            .and_then(|d| u32::try_from(d).ok())
            .ok_or_else(|| {
                ReconcileError::StructureNotFound("last day of the month".to_string())
            })
    }

    /// Employee names listed under the name header, stopping at the remarks footer.
    pub fn employee_names(&self, grid: &Grid) -> Vec<String> {
        let mut names = Vec::new();
        for i in self.employee_header_row + 1..grid.row_count() {
            let name = match grid.cell(i, self.name_column).and_then(|c| c.trimmed_str()) {
                Some(n) if !n.is_empty() => n,
                _ => continue,
            };
            if NAME_LIST_TERMINATORS.iter().any(|t| name.contains(t)) {
                break;
            }
            names.push(name.to_string());
        }
        names
    }
}
