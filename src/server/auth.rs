use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;

use crate::app::App;
use crate::server::error::ApiError;
use crate::types::account::AccessClaims;

/// Claims of a request carrying a valid `Authorization: Bearer` token.
///
/// Rejects with 401 and never redirects; the page routes use the cookie instead.
pub struct Authenticated(pub AccessClaims);

impl FromRequestParts<Arc<App>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, app: &Arc<App>) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        let claims = app.tokens.validate_bearer(header, App::now())?;
        Ok(Authenticated(claims))
    }
}
