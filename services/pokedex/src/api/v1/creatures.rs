//! Creature API endpoints.
//!
//! Every endpoint answers with the creature envelope as the JSON body. The
//! `{ident}` segment may be a number, a store id or a name.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::request_context::RequestContext;
use crate::creatures::{CreatureDraft, CreaturePatch, Envelope, ResponseCode};
use crate::state::AppState;

/// Create creature routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(create_creature)).route(
        "/{ident}",
        get(get_creature)
            .patch(update_creature)
            .delete(delete_creature),
    )
}

/// HTTP status carried alongside an envelope.
fn status_for(code: ResponseCode) -> StatusCode {
    match code {
        ResponseCode::Created => StatusCode::CREATED,
        ResponseCode::Found | ResponseCode::Updated | ResponseCode::Deleted => StatusCode::OK,
        ResponseCode::NotFound | ResponseCode::DeleteNoop => StatusCode::NOT_FOUND,
        ResponseCode::CreateConflict
        | ResponseCode::UpdateConflict
        | ResponseCode::DeleteConflict => StatusCode::CONFLICT,
        ResponseCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn envelope_response(envelope: Envelope) -> Response {
    (status_for(envelope.code), Json(envelope)).into_response()
}

/// Unwraps and validates a JSON body.
fn validated<T: Validate>(
    payload: Result<Json<T>, JsonRejection>,
    ctx: &RequestContext,
) -> Result<T, ApiError> {
    let Json(body) =
        payload.map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;
    body.validate()
        .map_err(|e| ApiError::from(e).with_request_id(ctx.request_id.clone()))?;
    Ok(body)
}

/// Create a creature.
///
/// POST /v1/creatures
async fn create_creature(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CreatureDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let draft = validated(payload, &ctx)?;
    let envelope = state.creatures().create(draft).await;
    tracing::debug!(request_id = %ctx.request_id, code = %envelope.code, "create");
    Ok(envelope_response(envelope))
}

/// Look a creature up by number, id or name.
///
/// GET /v1/creatures/{ident}
async fn get_creature(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(ident): Path<String>,
) -> Response {
    let envelope = state.creatures().find_one(&ident).await;
    tracing::debug!(request_id = %ctx.request_id, %ident, code = %envelope.code, "find_one");
    envelope_response(envelope)
}

/// Partially update a creature.
///
/// PATCH /v1/creatures/{ident}
async fn update_creature(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(ident): Path<String>,
    payload: Result<Json<CreaturePatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let patch = validated(payload, &ctx)?;
    let envelope = state.creatures().update(&ident, patch).await;
    tracing::debug!(request_id = %ctx.request_id, %ident, code = %envelope.code, "update");
    Ok(envelope_response(envelope))
}

/// Delete a creature.
///
/// DELETE /v1/creatures/{ident}
async fn delete_creature(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(ident): Path<String>,
) -> Response {
    let envelope = state.creatures().remove(&ident).await;
    tracing::debug!(request_id = %ctx.request_id, %ident, code = %envelope.code, "remove");
    envelope_response(envelope)
}
