//! HTML pages for the upload form, the report summary and errors.

use crate::domain::model::{Report, ReportSet};

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:48rem;color:#222}\
table{border-collapse:collapse;margin-bottom:2rem;min-width:20rem}\
th,td{border:1px solid #ccc;padding:.3rem .8rem;text-align:left}\
th{background:#f2f2f2}tr.total td{font-weight:bold}\
td.count{text-align:right}.error{color:#a40000}";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

pub fn render_upload_form() -> String {
    page(
        "Upload Spreadsheet",
        "<h1>Upload Spreadsheet</h1>\n\
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".xlsx,.xlsm,.xlsb,.xls,.ods,.csv\" required>\n\
         <button type=\"submit\">Upload</button>\n\
         </form>",
    )
}

fn render_table(report: &Report) -> String {
    let mut html = format!(
        "<h2>{}</h2>\n<table>\n<tr><th>{}</th><th>Count</th></tr>\n",
        escape_html(report.sheet_name()),
        escape_html(report.column.header())
    );

    if report.entries().is_empty() {
        html.push_str("<tr><td colspan=\"2\">No entries</td></tr>\n");
    }

    for row in report.entries() {
        html.push_str(&format!(
            "<tr><td>{}</td><td class=\"count\">{}</td></tr>\n",
            escape_html(&row.key),
            row.count
        ));
    }

    if let (true, Some(row)) = (report.has_total, report.rows.last()) {
        html.push_str(&format!(
            "<tr class=\"total\"><td>{}</td><td class=\"count\">{}</td></tr>\n",
            escape_html(&row.key),
            row.count
        ));
    }

    html.push_str("</table>");
    html
}

pub fn render_result(reports: &ReportSet, download_path: &str) -> String {
    let tables: Vec<String> = reports.reports().into_iter().map(render_table).collect();
    let body = format!(
        "<h1>Counts</h1>\n{}\n\
         <p><a href=\"{}\">Download counts spreadsheet</a></p>\n\
         <p><a href=\"/\">Upload another file</a></p>",
        tables.join("\n"),
        escape_html(download_path)
    );
    page("Counts", &body)
}

pub fn render_error(message: &str, suggestion: &str) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n<p class=\"error\">{}</p>\n<p>{}</p>\n\
         <p><a href=\"/\">Back to upload</a></p>",
        escape_html(message),
        escape_html(suggestion)
    );
    page("Error", &body)
}
