use crate::domain::model::{Report, ReportSet};
use crate::utils::error::Result;
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub const COUNT_HEADER: &str = "Count";

/// Serializes the three reports as sheets of one `.xlsx` workbook, in memory.
pub fn write_workbook(reports: &ReportSet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for report in reports.reports() {
        let worksheet = workbook.add_worksheet().set_name(report.sheet_name())?;
        write_report(worksheet, report, &header_format)?;
    }

    let buffer = workbook.save_to_buffer()?;
    tracing::debug!("Workbook serialized ({} bytes)", buffer.len());
    Ok(buffer)
}

fn write_report(worksheet: &mut Worksheet, report: &Report, header_format: &Format) -> Result<()> {
    worksheet.write_string_with_format(0, 0, report.column.header(), header_format)?;
    worksheet.write_string_with_format(0, 1, COUNT_HEADER, header_format)?;

    for (idx, row) in report.rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        worksheet.write_string(row_num, 0, &row.key)?;
        worksheet.write_number(row_num, 1, row.count as f64)?;
    }

    worksheet.set_column_width(0, 30.0)?;
    Ok(())
}
