// src/parser.rs
use std::collections::HashMap;

use tracing::debug;

use crate::grid::Grid;
use crate::vocabulary::ShiftVocabulary;

/// Blank rows in a row after which a roster is considered finished.
pub const CONSECUTIVE_EMPTY_ROW_LIMIT: usize = 100;

/// One shift block label and the names collected under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAssignment {
    pub label: String,
    pub names: Vec<String>,
}

/// Assignments keyed by label, in order of each label's first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRoster {
    assignments: Vec<ParsedAssignment>,
    index: HashMap<String, usize>,
}

impl ParsedRoster {
    fn entry(&mut self, label: String) -> &mut ParsedAssignment {
        let idx = match self.index.get(&label) {
            Some(&idx) => idx,
            None => {
                self.assignments.push(ParsedAssignment {
                    label: label.clone(),
                    names: Vec::new(),
                });
                self.index.insert(label, self.assignments.len() - 1);
                self.assignments.len() - 1
            }
        };
        &mut self.assignments[idx]
    }

    pub fn assignments(&self) -> &[ParsedAssignment] {
        &self.assignments
    }

    pub fn get(&self, label: &str) -> Option<&[String]> {
        self.index
            .get(label)
            .map(|&idx| self.assignments[idx].names.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }
}

/// Drops everything after a run of [`CONSECUTIVE_EMPTY_ROW_LIMIT`] blank rows.
/// Blank rows before that point are kept so row positions stay meaningful.
pub fn truncate_after_blank_run(grid: Grid) -> Grid {
    let mut rows = grid.into_rows();
    let mut blank_run = 0;
    let mut cut = None;
    for (i, row) in rows.iter().enumerate() {
        if row.iter().all(|c| c.is_blank()) {
            blank_run += 1;
            if blank_run >= CONSECUTIVE_EMPTY_ROW_LIMIT {
                cut = Some(i + 1 - blank_run);
                break;
            }
        } else {
            blank_run = 0;
        }
    }
    if let Some(cut) = cut {
        debug!("Roster truncated at row {} after {} blank rows", cut, blank_run);
        rows.truncate(cut);
    }
    Grid::new(rows)
}

/// Collects employee names per shift block.
///
/// A cell starting with a vocabulary keyword opens a block; the non-blank cells to its
/// right on the same row feed it until another keyword cell appears. Every allowed name
/// contained in such a cell is appended, so one cell can yield several names and repeats
/// are kept.
pub fn parse_roster(grid: &Grid, allowed_names: &[String], vocabulary: &ShiftVocabulary) -> ParsedRoster {
    let mut parsed = ParsedRoster::default();

    for row in grid.rows() {
        let texts: Vec<String> = row.iter().map(|c| c.display_text()).collect();

        for (i, cell) in texts.iter().enumerate() {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Some(shift) = vocabulary.match_prefix(trimmed) else {
                continue;
            };

            let assignment = parsed.entry(shift.label());
            for subsequent in &texts[i + 1..] {
                let subsequent = subsequent.trim();
                if subsequent.is_empty() {
                    continue;
                }
                if vocabulary.starts_shift(subsequent) {
                    break;
                }
                for name in allowed_names {
                    if subsequent.contains(name.as_str()) {
                        assignment.names.push(name.clone());
                    }
                }
            }
        }
    }

    debug!("Parsed {} shift labels from roster", parsed.len());
    parsed
}
