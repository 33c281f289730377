//! Current-user middleware
//!
//! A bearer token, when present, is verified against the configured RSA
//! public key and its subject becomes the current user. Without a token
//! the configured default user is used. Handlers that need a user take
//! [`CurrentUser`] as an extractor and answer 401 when there is none.
//! Page parameters are extracted leniently as well, see [`PageQuery`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::{error::ApiError, models::PageQuery, settings::AuthSettings, state::AppState};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User uid
    pub sub: String,
    /// Expiration time
    pub exp: u64,
}

/// The user a request acts on behalf of
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: String,
}

/// Resolves the current user of a request
#[derive(Clone)]
pub struct Authenticator {
    decoding_key: Option<DecodingKey>,
    default_user: Option<String>,
}

impl Authenticator {
    pub fn new(decoding_key: Option<DecodingKey>, default_user: Option<String>) -> Self {
        Self {
            decoding_key,
            default_user: default_user.filter(|uid| !uid.is_empty()),
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self, String> {
        let decoding_key = match settings.jwt_public_key.as_deref() {
            Some(key) => {
                // Either inline PEM or a path to a PEM file
                let pem = if key.starts_with("-----BEGIN") {
                    key.to_string()
                } else {
                    std::fs::read_to_string(key)
                        .map_err(|e| format!("Failed to read public key file: {}", e))?
                };
                let key = DecodingKey::from_rsa_pem(pem.trim().as_bytes())
                    .map_err(|e| format!("Invalid public key: {}", e))?;
                Some(key)
            }
            None => None,
        };

        Ok(Self::new(decoding_key, settings.default_user_uid.clone()))
    }

    /// The current user for an optional bearer token
    ///
    /// A token that fails verification is rejected outright rather than
    /// falling back to the default user.
    pub fn resolve(&self, token: Option<&str>) -> Result<Option<CurrentUser>, ApiError> {
        match (token, &self.decoding_key) {
            (Some(token), Some(key)) => {
                let validation = Validation::new(Algorithm::RS256);
                let data = jsonwebtoken::decode::<Claims>(token, key, &validation).map_err(|e| {
                    warn!("Rejected bearer token: {}", e);
                    ApiError::Unauthorized
                })?;
                Ok(Some(CurrentUser {
                    uid: data.claims.sub,
                }))
            }
            (token, _) => {
                if token.is_some() {
                    debug!("Ignoring bearer token, no verification key configured");
                }
                Ok(self.default_user.clone().map(|uid| CurrentUser { uid }))
            }
        }
    }
}

/// Insert the [`CurrentUser`], if any, into the request extensions
pub async fn current_user_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req.headers().typed_get::<Authorization<Bearer>>();
    let user = state.auth.resolve(bearer.as_ref().map(|b| b.token()))?;

    if let Some(user) = user {
        req.extensions_mut().insert(user);
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Page parameters never reject a request
///
/// A query string that does not deserialize at all, such as a repeated
/// `pageNo`, is treated as if no parameters were sent.
#[async_trait]
impl<S> FromRequestParts<S> for PageQuery
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match Query::<PageQuery>::try_from_uri(&parts.uri) {
            Ok(Query(query)) => Ok(query),
            Err(e) => {
                debug!("Ignoring unreadable query string: {}", e);
                Ok(PageQuery::default())
            }
        }
    }
}
