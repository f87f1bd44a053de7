use super::{AppState, request_host};
use crate::{
    Result,
    types::{DataKind, HtsgetResponse, TicketQuery},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};

pub async fn get_reads(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TicketQuery>,
    headers: HeaderMap,
) -> Result<Json<HtsgetResponse>> {
    let host = request_host(&headers, &state.fallback_host);
    let response = state
        .tickets
        .tickets(DataKind::Read, &id, query.into_range(), &host)
        .await?;

    Ok(Json(response))
}
