//! Request handlers for the upload and read endpoints.

use std::path::Path;

use axum::extract::{Multipart, Path as UrlPath, Query, State};
use axum::Json;
use opstats_core::error::OpstatsError;
use opstats_core::models::{AggregateResult, Measurement, ResultFilter};
use opstats_data::ingest::IngestCoordinator;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

/// Acknowledgement returned on a committed upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
}

/// `POST /api/csv/upload`
///
/// Accepts a multipart form with one file part. The file must be non-empty
/// and carry a `.csv` extension (case-insensitive) before the pipeline runs.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue; // ordinary form field, not a file
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {e}")))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let Some((original_name, bytes)) = upload else {
        return Err(OpstatsError::NoFileUploaded.into());
    };
    if original_name.is_empty() || bytes.is_empty() {
        return Err(OpstatsError::NoFileUploaded.into());
    }
    if !has_csv_extension(&original_name) {
        return Err(OpstatsError::NotCsv.into());
    }

    let outcome = IngestCoordinator::new(state.store.clone())
        .ingest(&original_name, &bytes)
        .await?;

    Ok(Json(UploadResponse {
        message: "File processed successfully".to_string(),
        file_name: outcome.file_name,
    }))
}

/// `GET /api/results/filter`
///
/// All query parameters are optional; supplied ones are ANDed together.
pub async fn filter_results(
    State(state): State<AppState>,
    Query(filter): Query<ResultFilter>,
) -> Result<Json<Vec<AggregateResult>>, ApiError> {
    let results = state.store.filter_results(&filter).await?;
    Ok(Json(results))
}

/// `GET /api/results/last/:file_name`
///
/// Up to the 10 most recent measurements for the file, newest first.
pub async fn latest_measurements(
    State(state): State<AppState>,
    UrlPath(file_name): UrlPath<String>,
) -> Result<Json<Vec<Measurement>>, ApiError> {
    let rows = state.store.latest_measurements(&file_name).await?;
    Ok(Json(rows))
}

fn has_csv_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}
