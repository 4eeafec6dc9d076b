// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `utsp serve`: upload page that validates IFC files and answers with the
//! HTML report, with the spreadsheet and annotated models as downloads

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;
use log::{info, warn};
use utsp_parser::ParsedModel;
use utsp_report::{annotate, excel_to_buffer, AnnotateOptions, ExcelLayout, HtmlReport};
use utsp_rules::{validate_model, FileRecord, ValidationConfig};

use crate::cli::ServeArgs;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

struct AppState {
    config: ValidationConfig,
}

/// Any handler failure, rendered as a 500 page
struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        warn!("Request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Validering feilet: {:#}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// One uploaded file
struct Upload {
    filename: String,
    data: Vec<u8>,
}

/// Results for one request
#[derive(Default)]
struct Validated {
    records: Vec<FileRecord>,
    /// `(download name, content)` per successfully validated file
    annotated: Vec<(String, Vec<u8>)>,
    /// `(file name, reason)` per rejected file
    failed: Vec<(String, String)>,
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn data_link(mime: &str, download: &str, bytes: &[u8], label: &str) -> String {
    format!(
        "<a download=\"{}\" href=\"data:{};base64,{}\">{}</a>",
        escape_html(download),
        mime,
        STANDARD.encode(bytes),
        escape_html(label)
    )
}

/// Parse and validate one upload through a temporary file
///
/// The temporary file is removed when it goes out of scope, on every path.
fn validate_upload(upload: &Upload, config: &ValidationConfig) -> Result<(FileRecord, Vec<u8>)> {
    let mut tmp = tempfile::Builder::new().suffix(".ifc").tempfile()?;
    tmp.write_all(&upload.data)?;
    tmp.flush()?;

    let model = ParsedModel::open(tmp.path())?;
    let record = validate_model(&model, &upload.filename, config);
    let annotated = annotate(&model, &record, &AnnotateOptions::new().with_colors(true))?;
    info!(
        "{}: {} elements, {} annotated",
        upload.filename,
        record.summary().total,
        annotated.updated
    );
    Ok((record, annotated.content))
}

fn validate_uploads(uploads: &[Upload], config: &ValidationConfig) -> Validated {
    let mut validated = Validated::default();
    for upload in uploads {
        match validate_upload(upload, config) {
            Ok((record, content)) => {
                let stem = Path::new(&upload.filename)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "modell".to_string());
                validated
                    .annotated
                    .push((format!("{}_validert.ifc", stem), content));
                validated.records.push(record);
            }
            Err(e) => {
                warn!("{}: {:#}", upload.filename, e);
                validated.failed.push((upload.filename.clone(), format!("{:#}", e)));
            }
        }
    }
    validated
}

/// Report page with the downloads and failures above it
fn render_page(validated: &Validated) -> Result<String> {
    let stamp = Local::now().format("%Y%m%d_%H%M").to_string();
    let mut banner = String::from("<div class=\"banner\">\n<h2>Nedlastinger</h2>\n");

    if !validated.records.is_empty() {
        let workbook = excel_to_buffer(&validated.records, ExcelLayout::Combined)
            .context("Excel-rapporten kunne ikke lages")?;
        banner.push_str(&data_link(
            XLSX_MIME,
            &format!("A4_Utsp_validering_{}.xlsx", stamp),
            &workbook,
            "Excel-rapport",
        ));
        let standalone = HtmlReport::new(&validated.records).render()?;
        banner.push_str(&data_link(
            "text/html",
            &format!("A4_Utsp_validering_{}.html", stamp),
            standalone.as_bytes(),
            "HTML-rapport",
        ));
        for (name, content) in &validated.annotated {
            banner.push_str(&data_link("application/octet-stream", name, content, name));
        }
    }
    for (filename, reason) in &validated.failed {
        banner.push_str(&format!(
            "\n<p class=\"failed\">Kunne ikke lese {}: {}</p>",
            escape_html(filename),
            escape_html(reason)
        ));
    }
    banner.push_str("\n</div>");

    Ok(HtmlReport::new(&validated.records)
        .with_banner(banner)
        .render()?)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("upload.html"))
}

async fn health() -> &'static str {
    "ok"
}

async fn validate(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> std::result::Result<Html<String>, AppError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if !filename.to_ascii_lowercase().ends_with(".ifc") {
            info!("Ignoring upload {}", filename);
            continue;
        }
        let data = field.bytes().await?.to_vec();
        uploads.push(Upload { filename, data });
    }
    if uploads.is_empty() {
        return Err(AppError(anyhow::anyhow!("Ingen IFC-filer lastet opp")));
    }
    info!("Validating {} uploaded files", uploads.len());

    // Parsing is CPU bound; keep it off the async workers
    let page = tokio::task::spawn_blocking(move || {
        let validated = validate_uploads(&uploads, &state.config);
        render_page(&validated)
    })
    .await??;

    Ok(Html(page))
}

fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/validate", post(validate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

pub async fn run(args: &ServeArgs) -> Result<()> {
    let state = Arc::new(AppState {
        config: args.rules.config(),
    });
    let app = router(state, args.max_upload_mb.saturating_mul(1024 * 1024));

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("Kunne ikke lytte på {}", args.addr))?;
    info!("Listening on http://{}", args.addr);
    println!("A4_Utsp validering: http://{}", args.addr);

    axum::serve(listener, app).await.context("Serveren stoppet")?;
    Ok(())
}
