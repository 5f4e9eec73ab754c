//! Frequency reports over the Recruiter Code, Application Code and
//! Applications Received Date columns.

use crate::domain::model::{
    number_text, Column, DateValue, FrequencyTable, Record, Report, ReportRow, ReportSet,
    TOTAL_KEY,
};
use chrono::{DateTime, Datelike};

/// Day offset between the spreadsheet serial epoch and 1970-01-01.
pub const SERIAL_UNIX_EPOCH_OFFSET: f64 = 25569.0;

/// Recruiter codes are only reported when they occur more often than this.
pub const RECRUITER_CODE_THRESHOLD: u64 = 1;

const SECONDS_PER_DAY: i64 = 86_400;

/// Turns a received-date cell into the key it is counted under.
///
/// Serials become `YYYY-MM-DD` (time of day dropped); literals pass through untouched,
/// so mixed formats in the input show up as separate keys.
pub fn normalize_date(value: &DateValue) -> String {
    match value {
        DateValue::Serial(serial) => serial_to_iso_date(*serial).unwrap_or_else(|| {
            tracing::debug!("Serial {} is outside the calendar range, keeping it verbatim", serial);
            number_text(*serial)
        }),
        DateValue::Literal(text) => text.clone(),
    }
}

fn serial_to_iso_date(serial: f64) -> Option<String> {
    let days = (serial - SERIAL_UNIX_EPOCH_OFFSET).floor();
    if !days.is_finite() || days.abs() > i64::MAX as f64 / SECONDS_PER_DAY as f64 {
        return None;
    }

    let seconds = (days as i64).checked_mul(SECONDS_PER_DAY)?;
    let date = DateTime::from_timestamp(seconds, 0)?.date_naive();

    // 四位數以外的年份用正負號加六位數
    let year = match date.year() {
        year @ 0..=9999 => format!("{:04}", year),
        year if year < 0 => format!("-{:06}", -year),
        year => format!("+{:06}", year),
    };
    Some(format!("{}-{:02}-{:02}", year, date.month(), date.day()))
}

/// Key a record contributes to `column`'s table, if any.
pub fn tally_key(record: &Record, column: Column) -> Option<String> {
    match column {
        Column::RecruiterCode => record.recruiter_code.clone(),
        Column::ApplicationCode => record.application_code.clone(),
        Column::ReceivedDate => record.received_date.as_ref().map(normalize_date),
    }
}

pub fn tally(records: &[Record], column: Column) -> FrequencyTable {
    records
        .iter()
        .filter_map(|record| tally_key(record, column))
        .collect()
}

/// Keeps only entries whose count is strictly greater than `min_count`.
pub fn filter_by_threshold(mut table: FrequencyTable, min_count: u64) -> FrequencyTable {
    table.retain(|_, count| count > min_count);
    table
}

pub fn build_report(column: Column, table: &FrequencyTable, append_total: bool) -> Report {
    let mut rows: Vec<ReportRow> = table
        .iter()
        .map(|(key, count)| ReportRow {
            key: key.to_string(),
            count,
        })
        .collect();

    if append_total {
        rows.push(ReportRow {
            key: TOTAL_KEY.to_string(),
            count: table.total(),
        });
    }

    Report {
        column,
        rows,
        has_total: append_total,
    }
}

pub fn aggregate(records: &[Record]) -> ReportSet {
    let recruiter_codes = filter_by_threshold(
        tally(records, Column::RecruiterCode),
        RECRUITER_CODE_THRESHOLD,
    );
    let application_codes = tally(records, Column::ApplicationCode);
    let received_by_date = tally(records, Column::ReceivedDate);

    tracing::debug!(
        "Tallied {} duplicate recruiter codes, {} application codes, {} dates",
        recruiter_codes.len(),
        application_codes.len(),
        received_by_date.len()
    );

    ReportSet {
        recruiter_codes: build_report(Column::RecruiterCode, &recruiter_codes, false),
        application_codes: build_report(Column::ApplicationCode, &application_codes, true),
        received_by_date: build_report(Column::ReceivedDate, &received_by_date, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CellValue;

    fn text(column: &'static str, value: &str) -> Record {
        Record::from_pairs([(column, CellValue::Text(value.to_string()))])
    }

    #[test]
    fn test_normalize_serial_date() {
        assert_eq!(normalize_date(&DateValue::Serial(44287.0)), "2021-04-01");
        assert_eq!(normalize_date(&DateValue::Serial(25569.0)), "1970-01-01");
    }

    #[test]
    fn test_normalize_drops_time_of_day() {
        assert_eq!(normalize_date(&DateValue::Serial(44287.99)), "2021-04-01");
        assert_eq!(normalize_date(&DateValue::Serial(25568.5)), "1969-12-31");
    }

    #[test]
    fn test_normalize_literal_passes_through() {
        let literal = DateValue::Literal("5/1/2021".to_string());
        assert_eq!(normalize_date(&literal), "5/1/2021");
    }

    #[test]
    fn test_normalize_out_of_range_serial_falls_back() {
        assert_eq!(normalize_date(&DateValue::Serial(1e300)), "1e+300");
        assert_eq!(normalize_date(&DateValue::Serial(f64::INFINITY)), "Infinity");
    }

    #[test]
    fn test_normalize_years_outside_four_digits() {
        assert_eq!(normalize_date(&DateValue::Serial(2958465.0)), "9999-12-31");
        assert_eq!(normalize_date(&DateValue::Serial(2958466.0)), "+010000-01-01");
        assert_eq!(normalize_date(&DateValue::Serial(-700000.0)), "-000017-06-18");
        assert_eq!(normalize_date(&DateValue::Serial(-693959.0)), "0000-01-01");
    }

    #[test]
    fn test_recruiter_codes_keep_duplicates_only() {
        let records = vec![
            text("Recruiter Code", "R1"),
            text("Recruiter Code", "R1"),
            text("Recruiter Code", "R2"),
        ];

        let reports = aggregate(&records);
        assert_eq!(reports.recruiter_codes.pairs(), vec![("R1", 2)]);
        assert_eq!(reports.recruiter_codes.total(), None);
    }

    #[test]
    fn test_application_codes_end_with_total() {
        let records = vec![
            text("Application Code", "A1"),
            text("Application Code", "A2"),
            text("Application Code", "A1"),
        ];

        let reports = aggregate(&records);
        assert_eq!(
            reports.application_codes.pairs(),
            vec![("A1", 2), ("A2", 1), ("Total", 3)]
        );
    }

    #[test]
    fn test_dates_mix_serials_and_literals() {
        let date = |value: CellValue| Record::from_pairs([("Applications Received Date", value)]);
        let records = vec![
            date(CellValue::Number(44287.0)),
            date(CellValue::Number(44287.0)),
            date(CellValue::Text("2021-04-02".to_string())),
        ];

        let reports = aggregate(&records);
        assert_eq!(
            reports.received_by_date.pairs(),
            vec![("2021-04-01", 2), ("2021-04-02", 1)]
        );
        assert!(!reports.received_by_date.has_total);
    }

    #[test]
    fn test_blank_values_are_not_counted() {
        let records = vec![
            text("Application Code", "A1"),
            text("Application Code", ""),
            Record::default(),
        ];

        let table = tally(&records, Column::ApplicationCode);
        assert_eq!(table.len(), 1);
        assert_eq!(table.total(), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let table: FrequencyTable = ["a", "b", "b", "c", "c", "c"].into_iter().collect();
        let filtered = filter_by_threshold(table, 2);
        assert_eq!(filtered.iter().collect::<Vec<_>>(), vec![("c", 3)]);
    }

    #[test]
    fn test_empty_input_gives_total_of_zero() {
        let reports = aggregate(&[]);
        assert!(reports.recruiter_codes.rows.is_empty());
        assert_eq!(reports.application_codes.pairs(), vec![("Total", 0)]);
        assert!(reports.received_by_date.rows.is_empty());
    }
}
