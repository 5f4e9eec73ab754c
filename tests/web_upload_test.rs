use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use calamine::{open_workbook_auto, Reader};
use sheet_tally::{build_router, AppConfig, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "sheet-tally-test-boundary";

const APPLICANTS_CSV: &str = "Recruiter Code,Application Code,Applications Received Date\n\
R1,A1,44287\n\
R1,A2,44287\n\
R2,A1,2021-04-02\n";

fn test_app(temp_dir: &TempDir) -> (Router, AppConfig) {
    let mut config = AppConfig::default();
    config.storage.public_dir = temp_dir.path().join("public").display().to_string();
    config.storage.upload_dir = temp_dir.path().join("uploads").display().to_string();
    (build_router(AppState::new(config.clone())), config)
}

fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

#[tokio::test]
async fn test_upload_form() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (app, _) = test_app(&temp_dir);

    let response = app.oneshot(get("/")).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("enctype=\"multipart/form-data\""));
    assert!(html.contains("name=\"file\""));
    Ok(())
}

#[tokio::test]
async fn test_upload_renders_counts_and_writes_workbook() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (app, config) = test_app(&temp_dir);

    let response = app
        .clone()
        .oneshot(multipart_request("file", "applicants.csv", APPLICANTS_CSV.as_bytes()))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("<tr><td>R1</td><td class=\"count\">2</td></tr>"));
    assert!(!html.contains("<td>R2</td>"));
    assert!(html.contains("<tr><td>A1</td><td class=\"count\">2</td></tr>"));
    assert!(html.contains("<tr class=\"total\"><td>Total</td><td class=\"count\">3</td></tr>"));
    assert!(html.contains("<tr><td>2021-04-01</td><td class=\"count\">2</td></tr>"));
    assert!(html.contains("<tr><td>2021-04-02</td><td class=\"count\">1</td></tr>"));
    assert!(html.contains("href=\"/counts.xlsx\""));

    // 輸出檔已寫入，暫存的上傳檔已刪除
    let output = std::path::Path::new(&config.storage.public_dir).join("counts.xlsx");
    assert!(output.exists());
    let leftovers = std::fs::read_dir(&config.storage.upload_dir)?.count();
    assert_eq!(leftovers, 0);

    // 靜態路徑與下載路徑都能取得同一份檔案
    let response = app.clone().oneshot(get("/counts.xlsx")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let static_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&static_bytes[..2], b"PK");

    let response = app.oneshot(get("/download")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"counts.xlsx\""
    );
    let download_bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(download_bytes, static_bytes);

    Ok(())
}

#[tokio::test]
async fn test_download_before_any_upload_is_not_found() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (app, _) = test_app(&temp_dir);

    let response = app.oneshot(get("/download")).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await?.contains("Upload a spreadsheet first"));
    Ok(())
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (app, _) = test_app(&temp_dir);

    let response = app
        .oneshot(multipart_request("attachment", "applicants.csv", APPLICANTS_CSV.as_bytes()))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await?.contains("No file was uploaded."));
    Ok(())
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (app, config) = test_app(&temp_dir);

    let response = app
        .oneshot(multipart_request("file", "notes.txt", b"Recruiter Code\nR1\n"))
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await?.contains("Files of type &#39;txt&#39; are not supported."));
    assert!(!std::path::Path::new(&config.storage.public_dir)
        .join("counts.xlsx")
        .exists());
    Ok(())
}

#[tokio::test]
async fn test_corrupt_workbook_keeps_previous_report() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (app, config) = test_app(&temp_dir);

    let response = app
        .clone()
        .oneshot(multipart_request("file", "applicants.csv", APPLICANTS_CSV.as_bytes()))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let output = std::path::Path::new(&config.storage.public_dir).join("counts.xlsx");
    let before = std::fs::read(&output)?;

    let response = app
        .oneshot(multipart_request("file", "applicants.xlsx", b"not a zip archive"))
        .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await?.contains("could not be read as a spreadsheet"));
    assert_eq!(std::fs::read(&output)?, before);
    assert_eq!(std::fs::read_dir(&config.storage.upload_dir)?.count(), 0);
    Ok(())
}

fn recruiter_rows(path: &std::path::Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook.worksheet_range("Recruiter Code Counts")?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_simultaneous_uploads_run_one_after_another() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let (app, config) = test_app(&temp_dir);

    let first = format!("Recruiter Code\n{}", "R1\n".repeat(400));
    let second = "Recruiter Code\nR2\nR2\nR2\n";

    let (first_response, second_response) = tokio::join!(
        app.clone()
            .oneshot(multipart_request("file", "first.csv", first.as_bytes())),
        app.clone()
            .oneshot(multipart_request("file", "second.csv", second.as_bytes())),
    );
    let first_response = first_response?;
    let second_response = second_response?;
    assert_eq!(first_response.status(), StatusCode::OK);
    assert_eq!(second_response.status(), StatusCode::OK);

    let first_html = body_text(first_response).await?;
    let second_html = body_text(second_response).await?;
    assert!(first_html.contains("<tr><td>R1</td><td class=\"count\">400</td></tr>"));
    assert!(second_html.contains("<tr><td>R2</td><td class=\"count\">3</td></tr>"));

    // 最後的輸出檔必須完整對應其中一次上傳
    let output = std::path::Path::new(&config.storage.public_dir).join("counts.xlsx");
    let rows = recruiter_rows(&output)?;
    let header = vec!["Recruiter Code".to_string(), "Count".to_string()];
    let from_first = vec![header.clone(), vec!["R1".to_string(), "400".to_string()]];
    let from_second = vec![header, vec!["R2".to_string(), "3".to_string()]];
    assert!(rows == from_first || rows == from_second, "unexpected rows: {:?}", rows);

    assert_eq!(std::fs::read_dir(&config.storage.upload_dir)?.count(), 0);
    Ok(())
}
