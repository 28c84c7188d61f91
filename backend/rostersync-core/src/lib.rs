// src/lib.rs
pub mod config;
pub mod error;
pub mod grid;
pub mod locator;
pub mod parser;
pub mod projection;
pub mod reconcile;
pub mod server;
pub mod store;
pub mod vocabulary;
pub mod workbook;
pub mod writer;

mod reconcile_tests;

pub use config::{AppConfig, ReconcileSettings, SheetHeaders};
pub use error::{ConfigError, ReconcileError};
pub use grid::{CellValue, Grid};
pub use reconcile::{ProcessingLog, ProcessingResult, Reconciler, RosterInput, SourceFile};
pub use store::{InMemoryResultStore, ResultStore};
pub use workbook::{CsvWorkbook, SpreadsheetIo};
