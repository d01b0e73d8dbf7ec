//! Read-only handlers: signals, the review map, and the review page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    Extension, Json,
};
use tubesig_core::{ReviewSet, Signal};
use tubesig_pipeline::html::SIGNALS_VAR;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// GET /api/signals: signals with their verdicts inlined.
pub(super) async fn list_signals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<Signal>>> {
    let signals = state.store.read().await.inlined_signals();
    ApiResponse::new(&req_id, signals)
}

/// GET /api/opus4-analysis: the review map keyed by review id.
pub(super) async fn get_analysis(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ReviewSet>> {
    let reviews = state.store.read().await.reviews().clone();
    ApiResponse::new(&req_id, reviews)
}

/// GET /: the review page with current signals embedded.
pub(super) async fn review_page(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let rid = &req_id.0;
    let (page, signals) = {
        let store = state.store.read().await;
        (store.paths().page.clone(), store.inlined_signals())
    };

    let Some(page) = page else {
        return Err(ApiError::new(rid, "unavailable", "no review page configured"));
    };

    let html = tokio::fs::read_to_string(&page).await.map_err(|e| {
        tracing::error!(path = %page.display(), error = %e, "failed to read review page");
        ApiError::new(rid, "internal_error", "failed to read review page")
    })?;

    let rendered = tubesig_pipeline::inject_data_script(&html, SIGNALS_VAR, &signals).map_err(|e| {
        tracing::error!(error = %e, "failed to embed signals into review page");
        ApiError::new(rid, "internal_error", "failed to render review page")
    })?;

    Ok(Html(rendered))
}
