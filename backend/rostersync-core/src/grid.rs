// src/grid.rs
use std::borrow::Cow;
use std::fmt;

// --- Raw Grid ---

/// A single typed cell as produced by the spreadsheet provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Blank,
    Text(String),
    /// `raw` holds the source text of a loaded number so it can be written back unchanged.
    Number { value: f64, raw: Option<String> },
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// A number with no source text, rendered from its value.
    pub fn number(value: f64) -> Self {
        CellValue::Number { value, raw: None }
    }

    /// Text content if this is a text cell, trimmed.
    pub fn trimmed_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.trim()),
            _ => None,
        }
    }

    /// Numeric value truncated to an integer, like a spreadsheet day index.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Number { value, .. } if value.is_finite() => Some(value.trunc() as i64),
            _ => None,
        }
    }

    /// Blank, or a text cell holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Blank => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number { .. } => false,
        }
    }

    /// Renders the cell the way a roster scan sees it: integral numbers lose their fraction.
    pub fn display_text(&self) -> String {
        self.to_string()
    }

    /// Text to write back out: loaded cells keep their source text verbatim.
    pub fn source_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Blank => Cow::Borrowed(""),
            CellValue::Text(s) => Cow::Borrowed(s),
            CellValue::Number { raw: Some(raw), .. } => Cow::Borrowed(raw),
            CellValue::Number { raw: None, .. } => Cow::Owned(self.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Blank => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number { value, .. }
                if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 =>
            {
                write!(f, "{}", *value as i64)
            }
            CellValue::Number { value, .. } => write!(f, "{}", value),
        }
    }
}

/// Rows of cells. Rows may have different lengths; missing cells read as blank.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    /// Builds a grid from string rows; empty strings become blanks and numeric strings numbers.
    pub fn from_strings<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|c| parse_cell(c.as_ref())).collect())
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Writes a text value, growing the grid as needed.
    pub fn set_text(&mut self, row: usize, col: usize, value: &str) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let target = &mut self.rows[row];
        if target.len() <= col {
            target.resize(col + 1, CellValue::Blank);
        }
        target[col] = CellValue::Text(value.to_string());
    }

    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }
}

/// Classifies raw cell text: empty is blank, anything `f64` accepts is a number.
/// Numbers remember `raw` so serialization round-trips `007` or `1.50` untouched.
pub fn parse_cell(raw: &str) -> CellValue {
    if raw.is_empty() {
        return CellValue::Blank;
    }
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => CellValue::Number {
            value,
            raw: Some(raw.to_string()),
        },
        _ => CellValue::Text(raw.to_string()),
    }
}
