use crate::core::aggregate::SERIAL_UNIX_EPOCH_OFFSET;
use crate::domain::model::{number_text, CellValue, Column, ColumnLayout, Record};
use crate::utils::error::{Result, TallyError};
use crate::utils::validation::spreadsheet_extension;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

/// Header row plus data rows of one sheet. `None` marks an empty cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<CellValue>>>,
}

impl SheetTable {
    /// 第一列當標題，其餘全空的列略過
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<Option<CellValue>>>,
    {
        let mut rows = rows.into_iter();
        let headers = rows
            .next()
            .map(|header| header.iter().map(header_text).collect())
            .unwrap_or_default();
        let rows = rows
            .filter(|row| row.iter().any(Option::is_some))
            .collect();

        Self { headers, rows }
    }

    pub fn into_records(self) -> Vec<Record> {
        let layout = ColumnLayout::resolve(&self.headers);

        let missing: Vec<&str> = layout
            .missing_columns()
            .into_iter()
            .map(Column::header)
            .collect();
        if !missing.is_empty() {
            tracing::warn!("Input has no column named {:?}; its report will be empty", missing);
        }

        self.rows
            .iter()
            .map(|row| Record::from_cells(&layout, row))
            .collect()
    }
}

fn header_text(cell: &Option<CellValue>) -> String {
    match cell {
        None => String::new(),
        Some(CellValue::Text(text)) => text.trim_start_matches('\u{feff}').to_string(),
        Some(CellValue::Number(n)) => number_text(*n),
        Some(CellValue::Bool(b)) => b.to_string().to_uppercase(),
    }
}

/// Reads the first sheet of `path` into records. The format is picked by extension.
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    Ok(read_first_sheet(path)?.into_records())
}

pub fn read_first_sheet(path: &Path) -> Result<SheetTable> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    match spreadsheet_extension(file_name)?.as_str() {
        "csv" => read_csv(path),
        _ => read_workbook(path),
    }
}

fn read_workbook(path: &Path) -> Result<SheetTable> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TallyError::EmptyWorkbookError {
            path: path.display().to_string(),
        })?;

    let range = workbook.worksheet_range(&sheet_name)?;
    let (height, width) = range.get_size();
    tracing::debug!("Reading sheet '{}' ({}x{})", sheet_name, height, width);

    Ok(SheetTable::from_rows(
        range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>()),
    ))
}

fn cell_from_data(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        // 日期格式的儲存格仍以序號回報
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        // ODS 的日期是 ISO 字串，轉回序號
        Data::DateTimeIso(s) => Some(
            iso_to_serial(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::Number),
        ),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}

/// `2021-04-01T10:30:00` or `2021-04-01` as a serial day count with the time as a fraction.
fn iso_to_serial(text: &str) -> Option<f64> {
    let datetime = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;

    let seconds = datetime.and_utc().timestamp() as f64;
    Some(seconds / 86_400.0 + SERIAL_UNIX_EPOCH_OFFSET)
}

fn read_csv(path: &Path) -> Result<SheetTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let rows = reader
        .records()
        .map(|record| record.map(|fields| fields.iter().map(cell_from_csv).collect::<Vec<_>>()))
        .collect::<std::result::Result<Vec<Vec<Option<CellValue>>>, csv::Error>>()?;

    tracing::debug!("Read {} CSV rows from {}", rows.len(), path.display());
    Ok(SheetTable::from_rows(rows))
}

fn cell_from_csv(field: &str) -> Option<CellValue> {
    if field.is_empty() {
        return None;
    }

    let trimmed = field.trim();
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return Some(CellValue::Number(n));
        }
    }

    if trimmed.eq_ignore_ascii_case("true") {
        Some(CellValue::Bool(true))
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(CellValue::Bool(false))
    } else {
        Some(CellValue::Text(field.to_string()))
    }
}
