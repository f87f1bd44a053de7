use super::AppState;
use crate::{Result, types::DataQuery};
use axum::{
    extract::{Query, State},
    http::{HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
};

const X_FILENAME: HeaderName = HeaderName::from_static("x-filename");

/// Serve a slice as an attachment - this is what the ticket URLs point to
pub async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Response> {
    if let Some(format) = &query.format {
        tracing::debug!("ignoring requested format {}, using the resolved one", format);
    }

    let slice = state.slices.extract(&query.id, query.range()).await?;
    let bytes = slice.read_bytes().await?;
    let file_name = slice.file_name().to_string();
    let content_type = slice.format().content_type();
    drop(slice);

    let headers = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
        (header::ACCESS_CONTROL_EXPOSE_HEADERS, X_FILENAME.to_string()),
        (X_FILENAME, file_name),
    ];

    Ok((StatusCode::OK, headers, bytes).into_response())
}
