use axum::{extract::{Path, State}, Json};
use super::AppState;
use crate::auth;
use crate::{Address, AdminLoginRequest, LoginRequest, Result, SignupRequest, StorefrontError, User};

pub async fn signup(State(s): State<AppState>, Json(r): Json<SignupRequest>) -> Result<Json<User>> {
    Ok(Json(auth::signup(s.accounts.as_ref(), r).await?))
}

pub async fn login(State(s): State<AppState>, Json(r): Json<LoginRequest>) -> Result<Json<User>> {
    Ok(Json(auth::login(s.accounts.as_ref(), r).await?))
}

pub async fn admin_login(State(s): State<AppState>, Json(r): Json<AdminLoginRequest>) -> Result<Json<User>> {
    Ok(Json(auth::admin_login(s.accounts.as_ref(), r).await?))
}

/// Stores the customer's default delivery address used to prefill checkout.
pub async fn update_address(State(s): State<AppState>, Path(id): Path<String>, Json(address): Json<Address>) -> Result<Json<User>> {
    if !s.accounts.set_user_address(&id, &address).await? { return Err(StorefrontError::UserNotFound); }
    let user = s.accounts.find_user(&id).await?.ok_or(StorefrontError::UserNotFound)?;
    tracing::info!(user_id = %id, "default address updated");
    Ok(Json(user.to_user()))
}
