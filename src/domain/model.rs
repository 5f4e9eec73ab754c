use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Label of the synthetic row appended to the Application Code report.
pub const TOTAL_KEY: &str = "Total";

/// The three columns the reports are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "Recruiter Code")]
    RecruiterCode,
    #[serde(rename = "Application Code")]
    ApplicationCode,
    #[serde(rename = "Applications Received Date")]
    ReceivedDate,
}

impl Column {
    pub const ALL: [Column; 3] = [
        Column::RecruiterCode,
        Column::ApplicationCode,
        Column::ReceivedDate,
    ];

    /// Header text as it appears in both the input and output spreadsheets.
    pub fn header(self) -> &'static str {
        match self {
            Column::RecruiterCode => "Recruiter Code",
            Column::ApplicationCode => "Application Code",
            Column::ReceivedDate => "Applications Received Date",
        }
    }

    /// Name of the output sheet holding this column's report.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Column::RecruiterCode => "Recruiter Code Counts",
            Column::ApplicationCode => "Application Code Counts",
            Column::ReceivedDate => "Applications Received by Date",
        }
    }
}

/// A non-empty scalar read from a spreadsheet cell. Empty cells are `None` at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// String form used as a frequency key, or `None` when the value counts as blank
    /// (empty text, zero, NaN, `false`).
    pub fn tally_key(&self) -> Option<String> {
        match self {
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) if *n == 0.0 || n.is_nan() => None,
            CellValue::Number(n) => Some(number_text(*n)),
            CellValue::Bool(false) => None,
            CellValue::Bool(true) => Some("true".to_string()),
        }
    }
}

/// Text form of a number as it shows up in the reports: plain decimals, switching to
/// exponent notation (`1e+21`, `1.5e-7`) at or above 1e21 and below 1e-6.
pub fn number_text(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return n.to_string();
    }

    let exponent_form = format!("{:e}", n);
    match exponent_form.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{}e+{}", mantissa, power),
        _ => exponent_form,
    }
}

/// A received-date cell: either a spreadsheet serial day count or text taken verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum DateValue {
    Serial(f64),
    Literal(String),
}

impl DateValue {
    /// Every number is a serial, even zero; text and `true` are literals.
    pub fn from_cell(cell: &CellValue) -> Option<Self> {
        match cell {
            CellValue::Number(n) => Some(DateValue::Serial(*n)),
            other => other.tally_key().map(DateValue::Literal),
        }
    }
}

/// Position of each known column in a sheet's header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    recruiter_code: Option<usize>,
    application_code: Option<usize>,
    received_date: Option<usize>,
}

impl ColumnLayout {
    /// 依標題列找出欄位位置；重複的標題取第一個
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Self {
        let find = |column: Column| {
            headers
                .iter()
                .position(|header| header.as_ref() == column.header())
        };

        Self {
            recruiter_code: find(Column::RecruiterCode),
            application_code: find(Column::ApplicationCode),
            received_date: find(Column::ReceivedDate),
        }
    }

    pub fn index(&self, column: Column) -> Option<usize> {
        match column {
            Column::RecruiterCode => self.recruiter_code,
            Column::ApplicationCode => self.application_code,
            Column::ReceivedDate => self.received_date,
        }
    }

    pub fn missing_columns(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|column| self.index(*column).is_none())
            .collect()
    }
}

/// One input row, reduced to the three columns the reports use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub recruiter_code: Option<String>,
    pub application_code: Option<String>,
    pub received_date: Option<DateValue>,
}

impl Record {
    pub fn from_cells(layout: &ColumnLayout, cells: &[Option<CellValue>]) -> Self {
        let cell = |column: Column| {
            layout
                .index(column)
                .and_then(|idx| cells.get(idx))
                .and_then(Option::as_ref)
        };

        Self {
            recruiter_code: cell(Column::RecruiterCode).and_then(CellValue::tally_key),
            application_code: cell(Column::ApplicationCode).and_then(CellValue::tally_key),
            received_date: cell(Column::ReceivedDate).and_then(DateValue::from_cell),
        }
    }

    /// Builds a record from `(header, value)` pairs; unknown headers are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, CellValue)>,
    {
        let (headers, cells): (Vec<&str>, Vec<Option<CellValue>>) = pairs
            .into_iter()
            .map(|(header, value)| (header, Some(value)))
            .unzip();
        Self::from_cells(&ColumnLayout::resolve(&headers), &cells)
    }
}

/// Occurrence counts keyed by value, in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: IndexMap<String, u64>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: impl Into<String>) {
        *self.counts.entry(key.into()).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, u64) -> bool) {
        self.counts.retain(|key, count| keep(key, *count));
    }
}

impl<K: Into<String>> FromIterator<K> for FrequencyTable {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut table = FrequencyTable::new();
        for key in iter {
            table.increment(key);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub key: String,
    pub count: u64,
}

/// Ordered (key, count) rows for one column, optionally ending in a `Total` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub column: Column,
    pub rows: Vec<ReportRow>,
    pub has_total: bool,
}

impl Report {
    /// Rows without the synthetic total.
    pub fn entries(&self) -> &[ReportRow] {
        if self.has_total {
            &self.rows[..self.rows.len().saturating_sub(1)]
        } else {
            &self.rows
        }
    }

    pub fn total(&self) -> Option<u64> {
        if self.has_total {
            self.rows.last().map(|row| row.count)
        } else {
            None
        }
    }

    pub fn pairs(&self) -> Vec<(&str, u64)> {
        self.rows
            .iter()
            .map(|row| (row.key.as_str(), row.count))
            .collect()
    }

    pub fn sheet_name(&self) -> &'static str {
        self.column.sheet_name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSet {
    pub recruiter_codes: Report,
    pub application_codes: Report,
    pub received_by_date: Report,
}

impl ReportSet {
    /// Reports in output sheet order.
    pub fn reports(&self) -> [&Report; 3] {
        [
            &self.recruiter_codes,
            &self.application_codes,
            &self.received_by_date,
        ]
    }
}

/// What one run of the engine hands to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutcome {
    pub reports: ReportSet,
    pub output_path: String,
    pub records_read: usize,
}
