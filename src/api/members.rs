use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::auth::Claims;
use crate::domain::CirculationError;
use crate::infrastructure::AppState;
use crate::models::member::{NewMember, ProfileUpdate};
use crate::services::member_service;

pub async fn register(
    State(state): State<AppState>,
    claims: Claims,
    Json(input): Json<NewMember>,
) -> Result<(StatusCode, Json<Value>), CirculationError> {
    let member = member_service::register_member(state.db(), claims.member_id(), input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "member": member }))))
}

pub async fn get_me(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, CirculationError> {
    let member = member_service::get_member(state.db(), claims.member_id()).await?;
    Ok(Json(json!({ "member": member })))
}

pub async fn update_me(
    State(state): State<AppState>,
    claims: Claims,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Value>, CirculationError> {
    let member = member_service::update_profile(state.db(), claims.member_id(), update).await?;
    Ok(Json(json!({
        "message": "Profile updated successfully",
        "member": member
    })))
}

pub async fn current_borrowings(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, CirculationError> {
    let borrowings = member_service::current_borrowings(state.db(), claims.member_id()).await?;
    Ok(Json(json!({ "borrowings": borrowings })))
}

pub async fn history(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, CirculationError> {
    let borrowings = member_service::borrowing_history(state.db(), claims.member_id()).await?;
    Ok(Json(json!({ "borrowings": borrowings })))
}

pub async fn stats(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, CirculationError> {
    let stats = member_service::stats(state.db(), claims.member_id()).await?;
    Ok(Json(json!({ "stats": stats })))
}
