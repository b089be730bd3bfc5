use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use vcscore_protocol::{AdminRequestError, ApiError, NewCompanyRequest};

use crate::server_security::AdminToken;
use crate::store::CompanyStore;

pub const COMPANIES_ROUTE: &str = "/api/companies";

pub struct AdminState {
    pub store: CompanyStore,
    pub token: AdminToken,
}

pub fn router(state: Arc<AdminState>) -> Router {
    Router::new()
        .route(COMPANIES_ROUTE, get(list_companies).post(create_company))
        .with_state(state)
}

async fn list_companies(State(state): State<Arc<AdminState>>) -> Response {
    Json(state.store.read_all().await).into_response()
}

async fn create_company(
    State(state): State<Arc<AdminState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !is_authorized(&headers, &state.token) {
        log::warn!("Rejected unauthorized company write");
        return error_response(StatusCode::FORBIDDEN, "Unauthorized");
    }

    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };
    let record = match request.into_record() {
        Ok(record) => record,
        Err(err) => return error_response(StatusCode::BAD_REQUEST, err.to_string()),
    };

    if let Err(err) = state.store.append(record.clone()).await {
        log::error!("Failed to persist company {}: {err:#}", record.name);
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save company");
    }
    log::info!("Added company {} ({})", record.name, record.score);
    (StatusCode::CREATED, Json(record)).into_response()
}

fn is_authorized(headers: &HeaderMap, token: &AdminToken) -> bool {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return false;
    };
    let Ok(value) = value.to_str() else {
        return false;
    };
    token.authorizes(value)
}

/// A `score` that is present but not a number counts as missing.
fn parse_request(body: &[u8]) -> Result<NewCompanyRequest, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| format!("Invalid JSON body: {err}"))?;
    if value.get("score").is_some_and(|score| !score.is_number()) {
        return Err(AdminRequestError::MissingNameOrScore.to_string());
    }
    if value.get("name").is_some_and(|name| !name.is_string()) {
        return Err(AdminRequestError::MissingNameOrScore.to_string());
    }
    serde_json::from_value(value).map_err(|err| format!("Invalid request body: {err}"))
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ApiError::new(message))).into_response()
}
