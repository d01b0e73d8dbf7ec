//! Verdict write handlers.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tubesig_core::{Review, ReviewStatus};

use crate::middleware::RequestId;
use crate::store::SetReviewError;

use super::{map_store_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ReviewRequest {
    pub status: ReviewStatus,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ReviewChange {
    pub review_id: String,
    pub review: Review,
    /// Verdict that was replaced, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Review>,
}

/// PUT /api/reviews/{review_id}: store a verdict for a known signal.
pub(super) async fn put_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(review_id): Path<String>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewChange>>, ApiError> {
    let rid = &req_id.0;
    let review = Review {
        status: body.status,
        reason: body.reason.trim().to_owned(),
    };

    let previous = state
        .store
        .write()
        .await
        .set_review(&review_id, review.clone())
        .await
        .map_err(|e| match e {
            SetReviewError::UnknownSignal => ApiError::new(
                rid,
                "not_found",
                format!("no signal with review id '{review_id}'"),
            ),
            SetReviewError::Persist(err) => map_store_error(rid, &err),
        })?;

    tracing::info!(review_id = %review_id, status = %review.status, "review stored");
    Ok(ApiResponse::new(
        &req_id,
        ReviewChange {
            review_id,
            review,
            previous,
        },
    ))
}

/// DELETE /api/reviews/{review_id}: withdraw a verdict.
pub(super) async fn delete_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(review_id): Path<String>,
) -> Result<Json<ApiResponse<ReviewChange>>, ApiError> {
    let rid = &req_id.0;
    let removed = state
        .store
        .write()
        .await
        .remove_review(&review_id)
        .await
        .map_err(|e| map_store_error(rid, &e))?;

    let Some(review) = removed else {
        return Err(ApiError::new(
            rid,
            "not_found",
            format!("no review stored for '{review_id}'"),
        ));
    };

    tracing::info!(review_id = %review_id, "review removed");
    Ok(ApiResponse::new(
        &req_id,
        ReviewChange {
            review_id,
            review,
            previous: None,
        },
    ))
}
