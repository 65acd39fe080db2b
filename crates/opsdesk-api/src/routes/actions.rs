//! Operator action routes
//!
//! A successful action refreshes the affected list so the change shows up
//! without waiting for a realtime event.

use crate::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::Json;
use opsdesk_core::{ListKind, MemberAction, WithdrawalAction};
use serde_json::{json, Value};

async fn refresh_after(state: &AppState, kind: ListKind) {
    if let Ok(view) = state.lists.get(kind) {
        view.refresh().await;
    }
}

fn done(message: String) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

pub async fn api_member_action(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Json(action): Json<MemberAction>,
) -> Result<Json<Value>, ApiError> {
    let message = state.actions.member_action(user_id, &action).await?;
    refresh_after(&state, ListKind::Members).await;
    Ok(done(message))
}

pub async fn api_withdrawal_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(action): Json<WithdrawalAction>,
) -> Result<Json<Value>, ApiError> {
    let message = state.actions.withdrawal_action(&id, &action).await?;
    refresh_after(&state, ListKind::Withdrawals).await;
    Ok(done(message))
}

pub async fn api_delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<u64>,
) -> Result<Json<Value>, ApiError> {
    let message = state.actions.delete_product(product_id).await?;
    refresh_after(&state, ListKind::Products).await;
    Ok(done(message))
}
