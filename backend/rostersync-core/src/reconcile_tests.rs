// src/reconcile_tests.rs

#[cfg(test)]
mod tests {
    use crate::config::ReconcileSettings;
    use crate::error::ReconcileError;
    use crate::grid::{CellValue, Grid};
    use crate::reconcile::*;
    use crate::vocabulary::ShiftVocabulary;
    use crate::workbook::{CsvWorkbook, SpreadsheetIo};
    use crate::writer::AttendanceUpdate;

    const MONTH_LENGTH: u32 = 30;
    // Rows of the employees in `attendance_grid`
    const ZHANG_ROW: usize = 3;
    const LI_ROW: usize = 4;

    // Helper: attendance sheet with a two-line header and one column per day
    fn attendance_rows() -> Vec<Vec<String>> {
        let width = 2 + MONTH_LENGTH as usize;
        let mut title = vec![String::new(); width];
        title[0] = "考勤表".to_string();
        let mut header = vec![String::new(); width];
        header[0] = "序号".to_string();
        header[1] = "姓名".to_string();
        header[2] = "日     期".to_string();
        let mut days = vec![String::new(); 2];
        days.extend((1..=MONTH_LENGTH).map(|d| d.to_string()));
        let mut zhang = vec![String::new(); width];
        zhang[0] = "1".to_string();
        zhang[1] = "张三".to_string();
        let mut li = vec![String::new(); width];
        li[0] = "2".to_string();
        li[1] = "李四".to_string();
        vec![title, header, days, zhang, li]
    }

    fn attendance_grid() -> Grid {
        Grid::from_strings(attendance_rows())
    }

    fn attendance_csv() -> String {
        attendance_rows()
            .iter()
            .map(|r| r.join(","))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn cell(grid: &Grid, row: usize, day: u32) -> CellValue {
        grid.cell(row, 1 + day as usize).cloned().unwrap_or_default()
    }

    fn settings() -> ReconcileSettings {
        ReconcileSettings {
            vocabulary: ShiftVocabulary::from_pairs([("乘", "乘"), ("白班", "白"), ("大夜", "下")])
                .unwrap(),
            ..ReconcileSettings::default()
        }
    }

    fn roster(name: &str, day: u32, rows: Vec<Vec<&str>>) -> RosterInput {
        RosterInput {
            name: name.to_string(),
            grid: Grid::from_strings(rows),
            day,
        }
    }

    #[test]
    fn repeated_transfer_rolls_to_next_day_and_others_rest() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        let mut log = ProcessingLog::new();

        let outcome = reconciler
            .reconcile(
                vec![roster(
                    "day5.csv",
                    5,
                    vec![vec!["乘务 A组", "张三"], vec!["乘务 B组", "张三"]],
                )],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert_eq!(outcome.employees, vec!["张三", "李四"]);
        assert_eq!(outcome.month_length, MONTH_LENGTH);
        assert_eq!(
            outcome.standard_updates,
            vec![
                AttendanceUpdate::new("张三", 5, "乘"),
                AttendanceUpdate::new("张三", 6, "乘"),
            ]
        );
        assert_eq!(outcome.rest_updates, vec![AttendanceUpdate::new("李四", 5, "休")]);

        assert_eq!(cell(&grid, ZHANG_ROW, 5), CellValue::text("乘"));
        assert_eq!(cell(&grid, ZHANG_ROW, 6), CellValue::text("乘"));
        assert_eq!(cell(&grid, LI_ROW, 5), CellValue::text("休"));
        assert!(cell(&grid, LI_ROW, 6).is_blank());
        assert_eq!(io.recalculations(), 1);
    }

    #[test]
    fn transfer_counter_resets_for_each_file() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        let mut log = ProcessingLog::new();

        let outcome = reconciler
            .reconcile(
                vec![
                    roster("a.csv", 5, vec![vec!["乘", "张三"]]),
                    roster("b.csv", 8, vec![vec!["乘", "张三"]]),
                ],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert_eq!(
            outcome.standard_updates,
            vec![
                AttendanceUpdate::new("张三", 5, "乘"),
                AttendanceUpdate::new("张三", 8, "乘"),
            ]
        );
    }

    #[test]
    fn overnight_past_month_end_is_dropped_but_still_counts_as_rostered() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        let mut log = ProcessingLog::new();

        let outcome = reconciler
            .reconcile(
                vec![
                    roster("d30.csv", 30, vec![vec!["大夜", "张三"]]),
                    roster("d29.csv", 29, vec![vec!["大夜", "李四"]]),
                ],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert_eq!(outcome.standard_updates, vec![AttendanceUpdate::new("李四", 30, "下")]);
        assert!(log
            .lines()
            .iter()
            .any(|l| l.contains("skipped") && l.contains("张三") && l.contains("31")));

        // 张三 is rostered on 30 even though nothing was written for him
        assert_eq!(
            outcome.rest_updates,
            vec![
                AttendanceUpdate::new("张三", 29, "休"),
                AttendanceUpdate::new("李四", 30, "休"),
            ]
        );
        // the rest entry for 李四 on day 30 loses to the overnight shift
        assert_eq!(cell(&grid, LI_ROW, 30), CellValue::text("下"));
        assert_eq!(cell(&grid, ZHANG_ROW, 29), CellValue::text("休"));
        assert!(cell(&grid, ZHANG_ROW, 30).is_blank());
        assert_eq!(outcome.summary.skipped_occupied, 1);
    }

    #[test]
    fn rest_fill_keeps_existing_values() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        grid.set_text(LI_ROW, 1 + 5, "事");
        let mut log = ProcessingLog::new();

        reconciler
            .reconcile(
                vec![roster("d5.csv", 5, vec![vec!["白班", "张三"]])],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert_eq!(cell(&grid, ZHANG_ROW, 5), CellValue::text("白"));
        assert_eq!(cell(&grid, LI_ROW, 5), CellValue::text("事"));
    }

    #[test]
    fn standard_updates_overwrite_existing_values() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        grid.set_text(ZHANG_ROW, 1 + 5, "休");
        let mut log = ProcessingLog::new();

        reconciler
            .reconcile(
                vec![roster("d5.csv", 5, vec![vec!["白班", "张三"]])],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert_eq!(cell(&grid, ZHANG_ROW, 5), CellValue::text("白"));
    }

    #[test]
    fn rosters_are_processed_in_day_order() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        let mut log = ProcessingLog::new();

        let outcome = reconciler
            .reconcile(
                vec![
                    roster("late.csv", 12, vec![vec!["白班", "李四"]]),
                    roster("early.csv", 3, vec![vec!["白班", "张三"]]),
                ],
                &mut grid,
                &mut log,
            )
            .unwrap();

        let days: Vec<u32> = outcome.standard_updates.iter().map(|u| u.day).collect();
        assert_eq!(days, vec![3, 12]);
        let early = log.lines().iter().position(|l| l.contains("early.csv")).unwrap();
        let late = log.lines().iter().position(|l| l.contains("late.csv")).unwrap();
        assert!(early < late);
    }

    #[test]
    fn roster_without_shift_blocks_adds_no_rest_entries() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        let mut log = ProcessingLog::new();

        let outcome = reconciler
            .reconcile(
                vec![roster("notes.csv", 7, vec![vec!["通知", "张三"]])],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert!(outcome.standard_updates.is_empty());
        assert!(outcome.rest_updates.is_empty());
        assert_eq!(io.recalculations(), 0);
    }

    #[test]
    fn empty_shift_block_rests_everyone_that_day() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        let mut log = ProcessingLog::new();

        let outcome = reconciler
            .reconcile(
                vec![roster("d7.csv", 7, vec![vec!["白班", "外援"]])],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert_eq!(
            outcome.rest_updates,
            vec![
                AttendanceUpdate::new("张三", 7, "休"),
                AttendanceUpdate::new("李四", 7, "休"),
            ]
        );
    }

    #[test]
    fn configured_allow_list_narrows_matches() {
        let settings = ReconcileSettings {
            allowed_names: vec!["张三".to_string()],
            ..settings()
        };
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut grid = attendance_grid();
        let mut log = ProcessingLog::new();

        let outcome = reconciler
            .reconcile(
                vec![roster("d5.csv", 5, vec![vec!["白班", "张三", "李四"]])],
                &mut grid,
                &mut log,
            )
            .unwrap();

        assert_eq!(outcome.standard_updates, vec![AttendanceUpdate::new("张三", 5, "白")]);
        assert_eq!(outcome.rest_updates, vec![AttendanceUpdate::new("李四", 5, "休")]);
    }

    #[test]
    fn missing_date_header_fails_before_rosters_are_parsed() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut rows = attendance_rows();
        rows[1][2] = "日期".to_string();
        let mut grid = Grid::from_strings(rows);
        let mut log = ProcessingLog::new();

        let err = reconciler
            .reconcile(
                vec![roster("d5.csv", 5, vec![vec!["白班", "张三"]])],
                &mut grid,
                &mut log,
            )
            .unwrap_err();

        assert!(matches!(err, ReconcileError::StructureNotFound(_)));
        assert!(!log.lines().iter().any(|l| l.contains("d5.csv")));
        assert!(cell(&grid, ZHANG_ROW, 5).is_blank());
        assert_eq!(io.recalculations(), 0);
    }

    #[test]
    fn mismatched_counts_fail_before_loading() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut log = ProcessingLog::new();

        let err = reconciler
            .process_files(
                &[
                    SourceFile::new("a.csv", "白班,张三"),
                    SourceFile::new("b.csv", "白班,李四"),
                ],
                &[5],
                &SourceFile::new("kaoqin.csv", attendance_csv()),
                &mut log,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::ArgumentMismatch { files: 2, days: 1 }
        ));
        assert_eq!(log.lines().len(), 1);
    }

    #[test]
    fn undecodable_roster_is_an_io_failure() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut log = ProcessingLog::new();

        let err = reconciler
            .process_files(
                &[SourceFile::new("d5.csv", vec![0xff, 0xfe, b',', 0x80, b'\n'])],
                &[5],
                &SourceFile::new("kaoqin.csv", attendance_csv()),
                &mut log,
            )
            .unwrap_err();

        assert!(matches!(err, ReconcileError::Csv(_)));
        assert!(log.lines().iter().any(|l| l == "Attendance sheet loaded."));
        assert_eq!(io.recalculations(), 0);
    }

    #[test]
    fn process_files_round_trips_csv() {
        let settings = settings();
        let io = CsvWorkbook::new();
        let reconciler = Reconciler::new(&settings, &io);
        let mut log = ProcessingLog::new();

        let result = reconciler
            .process_files(
                &[SourceFile::new("d5.csv", "值班表,,\n大夜,张三,\n")],
                &[5],
                &SourceFile::new("kaoqin.csv", attendance_csv()),
                &mut log,
            )
            .unwrap();

        assert_eq!(result.original_filename, "kaoqin.csv");
        assert_eq!(result.logs, log.lines());
        let out = io.load(&result.file_content).unwrap();
        assert_eq!(cell(&out, ZHANG_ROW, 6), CellValue::text("下"));
        assert_eq!(cell(&out, LI_ROW, 5), CellValue::text("休"));
        assert!(cell(&out, ZHANG_ROW, 5).is_blank());
        assert_eq!(out.cell(1, 2), Some(&CellValue::text("日     期")));
    }
}
