use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use app_error::{AppError, AppResult};
use app_middleware::Claims;
use app_models::{ItemsResponse, LoginInput, SignupInput};

use crate::service::{AccountService, ItemService};

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// The original surface accepted bodies leniently, so decoding is done by
// hand: an absent body reads as an empty object and malformed JSON is a
// validation failure, never a content-type dispute.
fn decode_json<T: DeserializeOwned>(body: &Bytes) -> AppResult<T> {
    let raw: &[u8] = if body.is_empty() { b"{}" } else { body.as_ref() };

    serde_json::from_slice(raw)
        .map_err(|e| AppError::validation("body", &format!("invalid JSON: {}", e)))
}

pub async fn signup(
    Extension(accounts): Extension<Arc<AccountService>>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let input: SignupInput = decode_json(&body)?;
    let token = accounts.signup(input).await?;
    Ok((StatusCode::CREATED, token))
}

pub async fn login(
    Extension(accounts): Extension<Arc<AccountService>>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let input: LoginInput = decode_json(&body)?;
    let token = accounts.login(input).await?;
    Ok((StatusCode::OK, token))
}

// get user items and name
pub async fn get_items(
    Extension(items): Extension<Arc<ItemService>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ItemsResponse>> {
    let (items, name) = items.list(&claims.sub).await?;
    Ok(Json(ItemsResponse { items, name }))
}

// add item
pub async fn add_item(
    Extension(items): Extension<Arc<ItemService>>,
    Extension(claims): Extension<Claims>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let payload = if body.is_empty() {
        None
    } else {
        Some(decode_json::<Value>(&body)?)
    };

    let items = items.append(&claims.sub, payload).await?;
    Ok((StatusCode::CREATED, Json(items)))
}

// toggle item done state
pub async fn toggle_item(
    Extension(items): Extension<Arc<ItemService>>,
    Extension(claims): Extension<Claims>,
    Path(index): Path<usize>,
) -> AppResult<impl IntoResponse> {
    let items = items.toggle_done(&claims.sub, index).await?;
    Ok(Json(items))
}

// remove item
pub async fn remove_item(
    Extension(items): Extension<Arc<ItemService>>,
    Extension(claims): Extension<Claims>,
    Path(index): Path<usize>,
) -> AppResult<impl IntoResponse> {
    let items = items.remove(&claims.sub, index).await?;
    Ok(Json(items))
}
