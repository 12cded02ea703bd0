use anyhow::Context;
use axum::{
    extract::State,
    http::header::SET_COOKIE,
    middleware::from_fn_with_state,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Extension, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    extractors::Payload,
    middleware::{require_session, SessionUser},
    repo_types::NewUser,
    session::{clear_session_cookie, session_cookie},
};
use crate::{error::AppError, pages, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(pages::register_form).post(register))
        .route("/login", get(pages::login_form).post(login))
        .route("/logout", get(logout))
}

pub fn profile_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/userProfile", get(profile))
        .route_layer(from_fn_with_state(state, require_session))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Payload(payload): Payload<RegisterRequest>,
) -> Result<Response, AppError> {
    let reg = payload.validate().inspect_err(|_| warn!("registration with missing fields"))?;

    if state.store.find_by_mobile(&reg.mobile_number).await?.is_some() {
        warn!(mobile_number = %reg.mobile_number, "mobile number already registered");
        return Err(AppError::MobileNumberTaken);
    }

    let password_hash = state.hasher.hash(&reg.password).await?;

    let user = state
        .store
        .create(NewUser {
            user_name: reg.user_name,
            mobile_number: reg.mobile_number,
            profile_pic: reg.profile_pic,
            password_hash,
        })
        .await?;

    let token = state.keys.issue(user.id)?;
    let cookie = session_cookie(&state.config, &token).context("build session cookie")?;

    info!(user_id = %user.id, "user registered");
    Ok((
        [(SET_COOKIE, cookie)],
        Html(pages::registration_success()),
    )
        .into_response())
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<LoginRequest>,
) -> Result<Response, AppError> {
    let creds = payload.validate().inspect_err(|_| warn!("login with missing fields"))?;

    let Some(user) = state.store.find_by_mobile(&creds.mobile_number).await? else {
        state.hasher.verify_unknown(&creds.password).await?;
        warn!("login unknown mobile number");
        return Err(AppError::InvalidCredentials);
    };

    if !state.hasher.verify(&creds.password, &user.password_hash).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.keys.issue(user.id)?;
    let cookie = session_cookie(&state.config, &token).context("build session cookie")?;

    info!(user_id = %user.id, "user logged in");
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/userProfile")).into_response())
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    Extension(SessionUser(user_id)): Extension<SessionUser>,
) -> Result<Html<String>, AppError> {
    let Some(user) = state.store.find_by_id(user_id).await? else {
        warn!(%user_id, "session refers to missing user");
        return Err(AppError::NotFound);
    };
    Ok(Html(pages::profile(&user)))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    let cookie = clear_session_cookie(&state.config).context("build clearing cookie")?;
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/login")).into_response())
}
