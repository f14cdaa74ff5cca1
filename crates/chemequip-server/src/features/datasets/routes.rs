//! Dataset API routes
//!
//! - `POST /api/v1/datasets/upload` - Upload a CSV file (multipart, field `file`)
//! - `GET /api/v1/datasets` - The caller's datasets, newest first
//! - `GET /api/v1/datasets/:id` - One dataset with its equipment
//! - `GET /api/v1/datasets/:id/equipment` - Equipment rows only
//! - `GET /api/v1/datasets/:id/summary` - Statistics recomputed from the rows
//! - `GET /api/v1/datasets/:id/report` - PDF report download

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chemequip_ingest::IngestError;
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{
    commands::{UploadDatasetCommand, UploadDatasetError},
    locks::UserLocks,
    queries::{
        DatasetSummaryError, DatasetSummaryQuery, GenerateReportError, GenerateReportQuery,
        GetDatasetError, GetDatasetQuery, ListDatasetEquipmentError, ListDatasetEquipmentQuery,
        ListDatasetsError, ListDatasetsQuery,
    },
};
use crate::api::response::{codes, ApiResponse, ErrorResponse};
use crate::auth::AuthUser;
use crate::config::IngestConfig;
use crate::features::FeatureState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub const REPORT_DIGEST_HEADER: &str = "x-report-digest";

pub fn datasets_routes(ingest: &IngestConfig) -> Router<FeatureState> {
    Router::new()
        .route(
            "/upload",
            post(upload_dataset).layer(DefaultBodyLimit::max(
                ingest.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/", get(list_datasets))
        .route("/:id", get(get_dataset))
        .route("/:id/equipment", get(list_dataset_equipment))
        .route("/:id/summary", get(dataset_summary))
        .route("/:id/report", get(download_report))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// `POST /api/v1/datasets/upload`
///
/// - `201 Created` - Dataset stored, body carries its summary
/// - `400 Bad Request` - Wrong file type, bad header or invalid rows
/// - `413 Payload Too Large` - File over the configured limit
#[tracing::instrument(skip(pool, settings, locks, user, multipart), fields(user_id = %user.user_id))]
async fn upload_dataset(
    State(pool): State<SqlitePool>,
    State(settings): State<IngestConfig>,
    State(locks): State<UserLocks>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Response, DatasetsApiError> {
    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(DatasetsApiError::multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(DatasetsApiError::multipart)?;
        upload = Some((filename, content_type, data.to_vec()));
    }

    let (filename, content_type, content) = upload.ok_or(DatasetsApiError::MissingFile)?;

    let command = UploadDatasetCommand {
        user_id: user.user_id,
        filename,
        content_type,
        content,
    };
    let response = super::commands::upload::handle(pool, settings, locks, command).await?;

    tracing::info!(
        dataset_id = %response.id,
        equipment_count = response.equipment_count,
        "Dataset uploaded via API"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// `GET /api/v1/datasets?page=1&per_page=20`
#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn list_datasets(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Query(mut query): Query<ListDatasetsQuery>,
) -> Result<Response, DatasetsApiError> {
    query.user_id = user.user_id;
    let page = super::queries::list::handle(pool, query).await?;
    Ok(ApiResponse::success_with_meta(page.items, json!({ "pagination": page.pagination })).into_response())
}

#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn get_dataset(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(dataset_id): Path<Uuid>,
) -> Result<Response, DatasetsApiError> {
    let query = GetDatasetQuery {
        user_id: user.user_id,
        dataset_id,
    };
    let response = super::queries::get::handle(pool, query).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn list_dataset_equipment(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(dataset_id): Path<Uuid>,
) -> Result<Response, DatasetsApiError> {
    let query = ListDatasetEquipmentQuery {
        user_id: user.user_id,
        dataset_id,
    };
    let response = super::queries::equipment::handle(pool, query).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn dataset_summary(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(dataset_id): Path<Uuid>,
) -> Result<Response, DatasetsApiError> {
    let query = DatasetSummaryQuery {
        user_id: user.user_id,
        dataset_id,
    };
    let response = super::queries::summary::handle(pool, query).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[derive(Debug, Deserialize)]
struct ReportParams {
    timestamp: Option<bool>,
}

/// `GET /api/v1/datasets/:id/report?timestamp=false`
///
/// Responds with `application/pdf` as an attachment named
/// `Report_<stem>.pdf`; the content digest travels in `X-Report-Digest`.
#[tracing::instrument(skip(pool, user), fields(user_id = %user.user_id))]
async fn download_report(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(dataset_id): Path<Uuid>,
    Query(params): Query<ReportParams>,
) -> Result<Response, DatasetsApiError> {
    let query = GenerateReportQuery {
        user_id: user.user_id,
        dataset_id,
        include_timestamp: params.timestamp.unwrap_or(true),
    };
    let report = super::queries::report::handle(pool, query).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.filename))
        .map_err(|e| DatasetsApiError::Report(GenerateReportError::Render(e.to_string())))?;
    let digest = HeaderValue::from_str(report.digest.as_str())
        .map_err(|e| DatasetsApiError::Report(GenerateReportError::Render(e.to_string())))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
            (header::HeaderName::from_static(REPORT_DIGEST_HEADER), digest),
        ],
        report.bytes,
    )
        .into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum DatasetsApiError {
    MissingFile,
    Multipart { status: StatusCode, message: String },
    Upload(UploadDatasetError),
    List(ListDatasetsError),
    Get(GetDatasetError),
    Equipment(ListDatasetEquipmentError),
    Summary(DatasetSummaryError),
    Report(GenerateReportError),
}

impl DatasetsApiError {
    fn multipart(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<UploadDatasetError> for DatasetsApiError {
    fn from(err: UploadDatasetError) -> Self {
        Self::Upload(err)
    }
}

impl From<ListDatasetsError> for DatasetsApiError {
    fn from(err: ListDatasetsError) -> Self {
        Self::List(err)
    }
}

impl From<GetDatasetError> for DatasetsApiError {
    fn from(err: GetDatasetError) -> Self {
        Self::Get(err)
    }
}

impl From<ListDatasetEquipmentError> for DatasetsApiError {
    fn from(err: ListDatasetEquipmentError) -> Self {
        Self::Equipment(err)
    }
}

impl From<DatasetSummaryError> for DatasetsApiError {
    fn from(err: DatasetSummaryError) -> Self {
        Self::Summary(err)
    }
}

impl From<GenerateReportError> for DatasetsApiError {
    fn from(err: GenerateReportError) -> Self {
        Self::Report(err)
    }
}

fn internal_error(context: &str, err: &dyn std::fmt::Display) -> Response {
    tracing::error!(error = %err, "{}", context);
    ErrorResponse::new(codes::INTERNAL_ERROR, "An internal error occurred")
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}

fn not_found(err: &dyn std::fmt::Display) -> Response {
    ErrorResponse::new(codes::NOT_FOUND, err.to_string()).into_response_with(StatusCode::NOT_FOUND)
}

fn ingest_error(err: &IngestError) -> Response {
    if err.is_too_large() {
        return ErrorResponse::new(codes::PAYLOAD_TOO_LARGE, err.to_string())
            .into_response_with(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let details = match err {
        IngestError::InvalidHeader { expected, found } => Some(json!({ "expected": expected, "found": found })),
        IngestError::InvalidRow(issue) => Some(json!({ "row": issue })),
        IngestError::NoValidRows { skipped, issues } => Some(json!({ "skipped": skipped, "issues": issues })),
        _ => None,
    };
    let body = match details {
        Some(details) => ErrorResponse::with_details(codes::VALIDATION_ERROR, err.to_string(), details),
        None => ErrorResponse::new(codes::VALIDATION_ERROR, err.to_string()),
    };
    body.into_response_with(StatusCode::BAD_REQUEST)
}

impl IntoResponse for DatasetsApiError {
    fn into_response(self) -> Response {
        match self {
            DatasetsApiError::MissingFile => {
                ErrorResponse::new(codes::VALIDATION_ERROR, "multipart field 'file' is required")
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            DatasetsApiError::Multipart { status, message } if status == StatusCode::PAYLOAD_TOO_LARGE => {
                ErrorResponse::new(codes::PAYLOAD_TOO_LARGE, message).into_response_with(status)
            },
            DatasetsApiError::Multipart { message, .. } => {
                ErrorResponse::new(codes::VALIDATION_ERROR, message).into_response_with(StatusCode::BAD_REQUEST)
            },

            DatasetsApiError::Upload(ref err @ UploadDatasetError::Filename(_)) => {
                ErrorResponse::new(codes::VALIDATION_ERROR, err.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            DatasetsApiError::Upload(UploadDatasetError::Ingest(ref err)) => ingest_error(err),
            DatasetsApiError::Upload(
                ref err @ (UploadDatasetError::Internal(_) | UploadDatasetError::Database(_)),
            ) => internal_error("Dataset upload failed", err),

            DatasetsApiError::List(ref err @ ListDatasetsError::Pagination(_)) => {
                ErrorResponse::new(codes::VALIDATION_ERROR, err.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            DatasetsApiError::List(ref err @ ListDatasetsError::Database(_)) => {
                internal_error("Dataset listing failed", err)
            },

            DatasetsApiError::Get(ref err @ GetDatasetError::NotFound(_)) => not_found(err),
            DatasetsApiError::Get(ref err @ GetDatasetError::Database(_)) => {
                internal_error("Dataset lookup failed", err)
            },

            DatasetsApiError::Equipment(ref err @ ListDatasetEquipmentError::NotFound(_)) => not_found(err),
            DatasetsApiError::Equipment(ref err @ ListDatasetEquipmentError::Database(_)) => {
                internal_error("Equipment lookup failed", err)
            },

            DatasetsApiError::Summary(ref err @ DatasetSummaryError::NotFound(_)) => not_found(err),
            DatasetsApiError::Summary(ref err @ DatasetSummaryError::Database(_)) => {
                internal_error("Summary computation failed", err)
            },

            DatasetsApiError::Report(ref err @ GenerateReportError::NotFound(_)) => not_found(err),
            DatasetsApiError::Report(
                ref err @ (GenerateReportError::Render(_) | GenerateReportError::Database(_)),
            ) => internal_error("Report generation failed", err),
        }
    }
}

impl std::fmt::Display for DatasetsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetsApiError::MissingFile => write!(f, "multipart field 'file' is required"),
            DatasetsApiError::Multipart { message, .. } => write!(f, "{}", message),
            DatasetsApiError::Upload(e) => write!(f, "{}", e),
            DatasetsApiError::List(e) => write!(f, "{}", e),
            DatasetsApiError::Get(e) => write!(f, "{}", e),
            DatasetsApiError::Equipment(e) => write!(f, "{}", e),
            DatasetsApiError::Summary(e) => write!(f, "{}", e),
            DatasetsApiError::Report(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_structure() {
        let _router = datasets_routes(&IngestConfig::default());
    }

    #[test]
    fn test_too_large_maps_to_413() {
        let err = DatasetsApiError::from(UploadDatasetError::Ingest(IngestError::TooLarge {
            size: 20,
            limit: 10,
        }));
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_ingest_errors_map_to_400() {
        let err = DatasetsApiError::from(UploadDatasetError::Ingest(IngestError::NoDataRows));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err = DatasetsApiError::from(UploadDatasetError::Ingest(IngestError::InvalidExtension {
            filename: "plant.txt".into(),
        }));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_status() {
        let id = Uuid::new_v4();
        let err = DatasetsApiError::from(GenerateReportError::NotFound(id));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_display() {
        let err = DatasetsApiError::MissingFile;
        assert_eq!(err.to_string(), "multipart field 'file' is required");
    }
}
