use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::{service::EntryService, types::ApiRequest};
use crate::shared::{AppError, AppState};

/// Single dispatch entry point.
///
/// POST /
/// Consumes a request envelope with a `method` discriminator and routes it to
/// the matching operation. Errors are logged here and rendered uniformly.
#[instrument(name = "dispatch", skip(state, payload))]
pub async fn dispatch(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Response, AppError> {
    let request = match ApiRequest::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            error!(error = %err, "Rejected request envelope");
            return Err(err);
        }
    };

    let method = request.method_name();
    info!(method, "Dispatching request");

    // Use injected repository from app state
    let service = EntryService::new(Arc::clone(&state.entry_repository));
    let result = route_request(&service, request).await;

    match &result {
        Ok(_) => info!(method, "Request completed"),
        Err(err) => error!(method, error = %err, "Request failed"),
    }
    result
}

async fn route_request(
    service: &EntryService,
    request: ApiRequest,
) -> Result<Response, AppError> {
    let response = match request {
        ApiRequest::GetAll => Json(service.get_all().await?).into_response(),
        ApiRequest::PostBatch {
            date,
            players,
            teams,
        } => Json(service.save_batch(&date, players, teams).await?).into_response(),
        ApiRequest::GetDatesNoScored => {
            Json(service.dates_without_outcome().await?).into_response()
        }
        ApiRequest::PostBackfill { data } => Json(service.backfill(data).await?).into_response(),
        ApiRequest::DeleteAll => Json(service.delete_all().await?).into_response(),
        ApiRequest::GetMinMax => Json(service.min_max().await?).into_response(),
        ApiRequest::GetDate { date } => {
            Json(service.entries_for_date(&date).await?).into_response()
        }
        ApiRequest::DeleteDate { date } => Json(service.delete_date(&date).await?).into_response(),
        ApiRequest::DeleteGame { date, home, away } => {
            Json(service.delete_game(&date, &home, &away).await?).into_response()
        }
    };
    Ok(response)
}

/// Liveness probe, exempt from the envelope contract.
pub async fn health() -> &'static str {
    "ok"
}
