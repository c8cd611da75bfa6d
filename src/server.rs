use actix_web::error::ResponseError;
use actix_web::http::{header::ContentType, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{get, post, web, App, HttpResponse, HttpServer};
use serde::Deserialize;
use tracing::info;

use crate::domain::{DisplayMode, ProfilerError, Strategy};
use crate::model::{load_table, Profile, UploadedFile};
use crate::report::{self, ReportState};

// Accept the whole 10 MB upload plus the query overhead; the size check in
// the model owns the user-facing limit.
const PAYLOAD_LIMIT: usize = 12 * 1024 * 1024;

impl ResponseError for ProfilerError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::html())
            .body(report::render_error(&self.to_string()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ProfilerError::UnsupportedFileType | ProfilerError::UnknownSheet(_) => {
                StatusCode::BAD_REQUEST
            }
            ProfilerError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProfilerError::CsvParse(_)
            | ProfilerError::ExcelParse(_)
            | ProfilerError::EmptyTable => StatusCode::UNPROCESSABLE_ENTITY,
            ProfilerError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Control state as it arrives on the query string.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub filename: String,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub minimal: Option<bool>,
    #[serde(default)]
    pub sheet: Option<String>,
    /// Comma separated list of histogram columns.
    #[serde(default)]
    pub hist: Option<String>,
    #[serde(default)]
    pub cat: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub corr_table: Option<bool>,
}

impl ReportQuery {
    fn into_state(self) -> (String, ReportState) {
        let state = ReportState {
            strategy: self
                .strategy
                .as_deref()
                .map(Strategy::from_param)
                .unwrap_or_default(),
            mode: self
                .mode
                .as_deref()
                .map(DisplayMode::from_param)
                .unwrap_or_default(),
            minimal_checkbox: self.minimal.unwrap_or(false),
            sheet: self.sheet,
            hist_columns: self
                .hist
                .map(|h| {
                    h.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            cat_column: self.cat,
            scatter_x: self.x,
            scatter_y: self.y,
            scatter_color: self.color,
            corr_table: self.corr_table.unwrap_or(false),
        };
        (self.filename, state)
    }
}

#[get("/")]
async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(ContentType::html())
        .body(report::render_index())
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Recompute the full report for the posted file and control state.
#[post("/report")]
async fn generate_report(
    query: web::Query<ReportQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, ProfilerError> {
    let (filename, state) = query.into_inner().into_state();
    info!(
        "Report request: \"{}\" ({} bytes), {:?}/{:?}",
        filename,
        body.len(),
        state.strategy,
        state.mode
    );

    let file = UploadedFile::new(filename, body.to_vec());
    let table = load_table(&file, state.sheet.as_deref())?;
    let profile = Profile::from_table(&file.filename, &table)?;

    Ok(HttpResponse::Ok()
        .insert_header(ContentType::html())
        .body(report::render_report(&profile, &state)))
}

pub fn create_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(Logger::default())
        .app_data(web::PayloadConfig::new(PAYLOAD_LIMIT))
        .service(index)
        .service(health)
        .service(generate_report)
}

pub async fn start_server(bind_address: &str) -> std::io::Result<()> {
    info!("Listening on http://{bind_address}");
    HttpServer::new(|| create_app()).bind(bind_address)?.run().await
}
