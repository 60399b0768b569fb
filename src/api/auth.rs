use std::collections::HashMap;

use axum::{
    extract::{Query, Request},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::backend::CurrentSession;
use crate::errors::AppError;

/// Resolve the caller's session once per request.
///
/// Takes `Authorization: Bearer <token>`, or an `access_token` query
/// parameter for WebSocket upgrades, which cannot set headers from a
/// browser. The resolved `CurrentSession` is inserted as a request
/// extension; the token itself is validated by the backend on first use.
pub async fn require_auth(mut req: Request, next: Next) -> Response {
    let from_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(CurrentSession::from_authorization);

    let session = from_header.or_else(|| token_from_query(req.uri()).map(CurrentSession::new));

    match session {
        Some(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        None => AppError::not_authenticated().into_response(),
    }
}

/// The percent-decoded `access_token` query parameter, if non-empty.
fn token_from_query(uri: &Uri) -> Option<String> {
    let Query(mut params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.remove("access_token").filter(|v| !v.is_empty())
}
