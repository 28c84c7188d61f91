// src/reconcile.rs
use std::collections::{BTreeMap, HashSet};

use tracing::{info, warn};

use crate::config::ReconcileSettings;
use crate::error::{ReconcileError, Result};
use crate::grid::Grid;
use crate::locator::AttendanceLayout;
use crate::parser::{parse_roster, truncate_after_blank_run};
use crate::projection::{Projection, TransferCounter};
use crate::vocabulary::code_from_label;
use crate::workbook::SpreadsheetIo;
use crate::writer::{apply_updates, AttendanceUpdate, BatchSummary};

// --- Processing Log ---

/// Append-only, human-readable record of a run. Lines are mirrored to tracing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingLog {
    lines: Vec<String>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.lines.push(line);
    }

    pub fn warn(&mut self, line: impl Into<String>) {
        let line = line.into();
        warn!("{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

// --- Inputs & Outputs ---

/// An uploaded file: its name and raw bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A loaded roster grid and the day it covers.
#[derive(Debug, Clone)]
pub struct RosterInput {
    pub name: String,
    pub grid: Grid,
    pub day: u32,
}

/// Outcome of reconciling rosters into an in-memory attendance grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub employees: Vec<String>,
    pub month_length: u32,
    pub standard_updates: Vec<AttendanceUpdate>,
    pub rest_updates: Vec<AttendanceUpdate>,
    pub summary: BatchSummary,
}

/// What a successful run hands back to the transport.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub logs: Vec<String>,
    pub file_content: Vec<u8>,
    pub original_filename: String,
}

// --- Orchestrator ---

pub struct Reconciler<'io> {
    settings: &'io ReconcileSettings,
    io: &'io dyn SpreadsheetIo,
}

impl<'io> Reconciler<'io> {
    pub fn new(settings: &'io ReconcileSettings, io: &'io dyn SpreadsheetIo) -> Self {
        Self { settings, io }
    }

    /// Full run over raw files: load, reconcile, serialize.
    ///
    /// Log lines produced before a failure stay in `log` so the caller can surface them.
    pub fn process_files(
        &self,
        rosters: &[SourceFile],
        days: &[u32],
        attendance: &SourceFile,
        log: &mut ProcessingLog,
    ) -> Result<ProcessingResult> {
        log.push("--- Processing roster files (sorted by day) ---");
        if rosters.len() != days.len() {
            return Err(ReconcileError::ArgumentMismatch {
                files: rosters.len(),
                days: days.len(),
            });
        }

        log.push(format!("Loading attendance sheet: {}", attendance.name));
        let mut grid = self.io.load(&attendance.bytes)?;
        log.push("Attendance sheet loaded.");

        let mut inputs = Vec::with_capacity(rosters.len());
        for (file, &day) in rosters.iter().zip(days) {
            inputs.push(RosterInput {
                name: file.name.clone(),
                grid: self.io.load(&file.bytes)?,
                day,
            });
        }

        self.reconcile(inputs, &mut grid, log)?;

        log.push("Serializing updated attendance sheet...");
        let file_content = self.io.serialize(&grid)?;
        log.push("--- Processing finished successfully ---");

        Ok(ProcessingResult {
            logs: log.lines().to_vec(),
            file_content,
            original_filename: attendance.name.clone(),
        })
    }

    /// Applies every roster to `attendance` in ascending day order.
    pub fn reconcile(
        &self,
        mut rosters: Vec<RosterInput>,
        attendance: &mut Grid,
        log: &mut ProcessingLog,
    ) -> Result<ReconcileOutcome> {
        log.push("Step 1/4: Reading employees and month length from attendance sheet...");
        let layout = AttendanceLayout::locate(attendance, &self.settings.headers)?;
        let employees = layout.employee_names(attendance);
        let month_length = layout.month_length(attendance)?;
        log.push(format!(
            "Found {} employees; last day of month is {}.",
            employees.len(),
            month_length
        ));
        let allowed = self.allowed_names(&employees);

        // stable: equal days keep upload order
        rosters.sort_by_key(|r| r.day);
        log.push("Roster files sorted by day.");

        log.push("Step 2/4: Parsing rosters and collecting attendance updates...");
        let mut standard_updates = Vec::new();
        let mut rostered_by_day: BTreeMap<u32, HashSet<String>> = BTreeMap::new();
        for roster in rosters {
            self.collect_roster(
                roster,
                &allowed,
                month_length,
                &mut standard_updates,
                &mut rostered_by_day,
                log,
            );
        }
        log.push("All rosters parsed.");

        log.push(format!(
            "Step 3/4: Collecting '{}' updates for unrostered employees...",
            self.settings.rest_code
        ));
        let rest_updates = self.collect_rest_updates(&employees, &rostered_by_day, log);

        log.push("Step 4/4: Applying updates to attendance sheet...");
        let summary = apply_updates(
            self.io,
            attendance,
            layout,
            &standard_updates,
            &rest_updates,
            log,
        )?;
        log.push(format!(
            "Batch update done: {} cells written, {} rest entries skipped (cell occupied), {} unknown employees skipped.",
            summary.written, summary.skipped_occupied, summary.skipped_unknown_employee
        ));

        Ok(ReconcileOutcome {
            employees,
            month_length,
            standard_updates,
            rest_updates,
            summary,
        })
    }

    /// Sheet names, further narrowed by the configured allow-list when one is set.
    fn allowed_names(&self, employees: &[String]) -> Vec<String> {
        if self.settings.allowed_names.is_empty() {
            return employees.to_vec();
        }
        employees
            .iter()
            .filter(|e| self.settings.allowed_names.contains(*e))
            .cloned()
            .collect()
    }

    fn collect_roster(
        &self,
        roster: RosterInput,
        allowed: &[String],
        month_length: u32,
        standard_updates: &mut Vec<AttendanceUpdate>,
        rostered_by_day: &mut BTreeMap<u32, HashSet<String>>,
        log: &mut ProcessingLog,
    ) {
        let day = roster.day;
        log.push(format!("  -> Processing {} (day {})", roster.name, day));

        let grid = truncate_after_blank_run(roster.grid);
        let parsed = parse_roster(&grid, allowed, &self.settings.vocabulary);
        let mut transfers = TransferCounter::new();

        for assignment in parsed.assignments() {
            // rest-fill coverage is keyed by the roster's own day, whatever the projection does
            rostered_by_day
                .entry(day)
                .or_default()
                .extend(assignment.names.iter().cloned());

            let Some(code) = code_from_label(&assignment.label) else {
                continue;
            };
            log.push(format!(
                "    - Shift '{}': {} people",
                code,
                assignment.names.len()
            ));

            for name in &assignment.names {
                let prior = if code == self.settings.rules.transfer_code {
                    transfers.next(name)
                } else {
                    0
                };
                match self.settings.rules.project(code, day, prior, month_length) {
                    Projection::Day(target) => {
                        log.push(format!("      - [collect] {} day {} -> {}", name, target, code));
                        standard_updates.push(AttendanceUpdate::new(name.clone(), target, code));
                    }
                    Projection::OutOfRange(target) => {
                        log.warn(format!(
                            "      - **skipped**: {} day {} is past the end of the month.",
                            name, target
                        ));
                    }
                }
            }
        }
    }

    fn collect_rest_updates(
        &self,
        employees: &[String],
        rostered_by_day: &BTreeMap<u32, HashSet<String>>,
        log: &mut ProcessingLog,
    ) -> Vec<AttendanceUpdate> {
        let rest_code = &self.settings.rest_code;
        let mut updates = Vec::new();
        for (&day, rostered) in rostered_by_day {
            log.push(format!(
                "  -> Day {}: {} employees rostered",
                day,
                rostered.len()
            ));
            for name in employees.iter().filter(|n| !rostered.contains(*n)) {
                log.push(format!(
                    "    - [collect] {} day {} -> '{}' (if empty)",
                    name, day, rest_code
                ));
                updates.push(AttendanceUpdate::new(name.clone(), day, rest_code.clone()));
            }
        }
        updates
    }
}
